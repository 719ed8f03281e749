use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Fixed-topology circuit parameters: replaces every hardcoded capacity.
///
/// The downstream evaluator compiles these numbers into its circuit, so a
/// compiled artifact must match them exactly. Changing the tree depth or the
/// feature count is a single change here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CircuitConfig {
    /// Short identifier used in logs (e.g. "personality").
    pub name: String,
    /// Bumped whenever the circuit layout changes.
    pub version: u32,
    /// Length of an input vector.
    pub num_features: usize,
    /// Length of a leaf classification vector.
    pub num_classes: usize,
    /// Number of internal slots in the artifact.
    pub internal_capacity: usize,
    /// Number of leaf slots in the artifact.
    pub leaf_capacity: usize,
    /// Depth of the complete tree the circuit evaluates.
    pub max_depth: usize,
    /// Smallest accepted input value.
    pub input_min: i32,
    /// Largest accepted input value.
    pub input_max: i32,
}

impl Default for CircuitConfig {
    fn default() -> Self {
        Self::standard()
    }
}

#[derive(Deserialize)]
struct ConfigFile {
    circuit: Option<CircuitSection>,
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct CircuitSection {
    name: Option<String>,
    version: Option<u32>,
    num_features: Option<usize>,
    num_classes: Option<usize>,
    internal_capacity: Option<usize>,
    leaf_capacity: Option<usize>,
    max_depth: Option<usize>,
    input_min: Option<i32>,
    input_max: Option<i32>,
}

impl CircuitConfig {
    /// Built-in 25-feature, 8-class, depth-3 circuit.
    pub fn standard() -> Self {
        Self {
            name: "personality".to_string(),
            version: 1,
            num_features: 25,
            num_classes: 8,
            internal_capacity: 7,
            leaf_capacity: 8,
            max_depth: 3,
            input_min: 0,
            input_max: 1000,
        }
    }

    /// Load a configuration from a TOML file with a `[circuit]` table.
    /// Keys that are absent keep their built-in values.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::parse_toml(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn parse_toml(content: &str) -> std::result::Result<Self, String> {
        let file: ConfigFile = toml::from_str(content).map_err(|e| e.to_string())?;
        let section = file.circuit.unwrap_or_default();
        let base = Self::standard();
        let config = Self {
            name: section.name.unwrap_or(base.name),
            version: section.version.unwrap_or(base.version),
            num_features: section.num_features.unwrap_or(base.num_features),
            num_classes: section.num_classes.unwrap_or(base.num_classes),
            internal_capacity: section.internal_capacity.unwrap_or(base.internal_capacity),
            leaf_capacity: section.leaf_capacity.unwrap_or(base.leaf_capacity),
            max_depth: section.max_depth.unwrap_or(base.max_depth),
            input_min: section.input_min.unwrap_or(base.input_min),
            input_max: section.input_max.unwrap_or(base.input_max),
        };
        config.check().map_err(|e| match e {
            Error::Config(msg) => msg,
            other => other.to_string(),
        })?;
        Ok(config)
    }

    /// Reject parameter combinations no fixed-topology circuit can have.
    pub fn check(&self) -> Result<()> {
        let err = |msg: String| Err(Error::Config(msg));
        if self.num_features == 0 {
            return err("num_features must be > 0".to_string());
        }
        // The contract stores feature indices as u8.
        if self.num_features > 256 {
            return err(format!(
                "num_features {} does not fit an 8-bit feature index",
                self.num_features
            ));
        }
        if self.num_classes == 0 {
            return err("num_classes must be > 0".to_string());
        }
        if self.max_depth == 0 || self.max_depth > 16 {
            return err(format!("max_depth {} outside 1..=16", self.max_depth));
        }
        let complete = (1usize << self.max_depth) - 1;
        if self.internal_capacity != complete {
            return err(format!(
                "internal_capacity {} does not match a complete tree of depth {} ({})",
                self.internal_capacity, self.max_depth, complete
            ));
        }
        if self.leaf_capacity != self.internal_capacity + 1 {
            return err(format!(
                "leaf_capacity {} must equal internal_capacity + 1 ({})",
                self.leaf_capacity,
                self.internal_capacity + 1
            ));
        }
        if self.input_min > self.input_max {
            return err(format!(
                "input range [{}, {}] is empty",
                self.input_min, self.input_max
            ));
        }
        Ok(())
    }
}
