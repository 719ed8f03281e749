//! Evaluation inputs: the `{"test_cases": [[...], ...]}` file format and
//! the standard input vectors used before deployment.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::CircuitConfig;
use crate::error::{Error, Result};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCases {
    pub test_cases: Vec<Vec<i32>>,
}

impl TestCases {
    /// All mid-range, alternating high/low, all high, scaled to the
    /// circuit's input range.
    pub fn standard(config: &CircuitConfig) -> Self {
        let span = i64::from(config.input_max) - i64::from(config.input_min);
        let at = |permille: i64| (i64::from(config.input_min) + span * permille / 1000) as i32;
        let n = config.num_features;
        let alternating = (0..n)
            .map(|i| if i % 2 == 0 { at(800) } else { at(200) })
            .collect();
        Self {
            test_cases: vec![vec![at(500); n], alternating, vec![at(900); n]],
        }
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::Malformed(format!("test cases: {}", e)))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_json(&text)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let mut text = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Malformed(e.to_string()))?;
        text.push('\n');
        std::fs::write(path, text).map_err(|e| Error::io(path, e))
    }
}

/// Parse a comma-separated input vector such as `500,500,...`.
pub fn parse_input(text: &str) -> Result<Vec<i32>> {
    text.split(',')
        .map(|part| {
            part.trim()
                .parse::<i32>()
                .map_err(|_| Error::InputShape(format!("'{}' is not an integer", part.trim())))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_cases() {
        let cases = TestCases::standard(&CircuitConfig::standard());
        assert_eq!(cases.test_cases.len(), 3);
        assert_eq!(cases.test_cases[0], vec![500; 25]);
        let mut alternating: Vec<i32> = [800, 200].repeat(12);
        alternating.push(800);
        assert_eq!(cases.test_cases[1], alternating);
        assert_eq!(cases.test_cases[2], vec![900; 25]);
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test_cases.json");
        let cases = TestCases::standard(&CircuitConfig::standard());
        cases.save(&path).unwrap();
        assert_eq!(TestCases::load(&path).unwrap(), cases);
    }

    #[test]
    fn test_parse_input() {
        assert_eq!(parse_input("1, 2,3").unwrap(), vec![1, 2, 3]);
        let err = parse_input("1,x").unwrap_err();
        assert_eq!(err.kind(), "InputShapeError");
    }
}
