//! Human-readable names for feature indices, taken from the survey
//! question set. Used in reports only; never affects compilation.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

#[derive(Clone, Debug, Deserialize)]
pub struct Question {
    pub question_id: usize,
    pub question_text: String,
    #[serde(default)]
    pub answers: Vec<String>,
}

#[derive(Clone, Debug, Default)]
pub struct FeatureLabels {
    labels: BTreeMap<usize, String>,
}

impl FeatureLabels {
    pub fn from_questions(questions: Vec<Question>) -> Self {
        Self {
            labels: questions
                .into_iter()
                .map(|q| (q.question_id, q.question_text))
                .collect(),
        }
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let questions: Vec<Question> = serde_json::from_str(text)
            .map_err(|e| Error::Malformed(format!("question set: {}", e)))?;
        Ok(Self::from_questions(questions))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_json(&text)
    }

    pub fn get(&self, feature: usize) -> Option<&str> {
        self.labels.get(&feature).map(String::as_str)
    }

    /// `"3"` or `"3 (How important is on-chain privacy to you?)"`.
    pub fn describe(&self, feature: usize) -> String {
        match self.get(feature) {
            Some(label) => format!("{} ({})", feature, label),
            None => feature.to_string(),
        }
    }
}
