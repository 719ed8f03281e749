//! The compiled artifact: the only persisted form of a model.
//!
//! ```text
//! {
//!   "internals": [ {"feature": int, "threshold": int}, ... ],
//!   "leaves":    [ {"classification": [0|1; NUM_CLASSES]}, ... ]
//! }
//! ```
//!
//! Writes are whole-file. The serialized form is deterministic, so the same
//! artifact always produces the same bytes and the same content hash.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::hash::ContentHash;

// ─── Records ───────────────────────────────────────────────────────

/// One internal slot: route left when `input[feature] <= threshold`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternalRecord {
    pub feature: usize,
    pub threshold: i32,
}

impl InternalRecord {
    /// Neutral filler for unused internal slots.
    pub fn padding() -> Self {
        Self {
            feature: 0,
            threshold: 0,
        }
    }
}

/// One leaf slot: a one-hot class vector, or all zeros for padding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeafRecord {
    pub classification: Vec<u8>,
}

impl LeafRecord {
    /// One-hot leaf for `class` out of `num_classes`.
    pub fn one_hot(class: usize, num_classes: usize) -> Self {
        let mut classification = vec![0u8; num_classes];
        if class < num_classes {
            classification[class] = 1;
        }
        Self { classification }
    }

    /// All-zero filler for unused leaf slots.
    pub fn padding(num_classes: usize) -> Self {
        Self {
            classification: vec![0u8; num_classes],
        }
    }

    pub fn is_padding(&self) -> bool {
        self.classification.iter().all(|&b| b == 0)
    }

    /// The selected class when the vector is one-hot.
    pub fn class(&self) -> Option<usize> {
        let mut found = None;
        for (i, &bit) in self.classification.iter().enumerate() {
            match bit {
                0 => {}
                1 if found.is_none() => found = Some(i),
                _ => return None,
            }
        }
        found
    }
}

// ─── Artifact ──────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompiledArtifact {
    pub internals: Vec<InternalRecord>,
    pub leaves: Vec<LeafRecord>,
}

impl CompiledArtifact {
    /// Leaves that carry a class (non-padding).
    pub fn real_leaf_count(&self) -> usize {
        self.leaves.iter().filter(|l| !l.is_padding()).count()
    }

    /// Distinct feature indices referenced by internal slots.
    pub fn features_used(&self) -> BTreeSet<usize> {
        self.internals.iter().map(|r| r.feature).collect()
    }

    /// Canonical JSON: two-space indentation, trailing newline.
    pub fn to_json(&self) -> String {
        let mut out = serde_json::to_string_pretty(self)
            .expect("artifact records always serialize");
        out.push('\n');
        out
    }

    /// Parse an artifact. Missing fields and wrong types are `Malformed`;
    /// structural problems are left to the validator.
    pub fn from_json(text: &str) -> Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|e| Error::Malformed(e.to_string()))?;
        Self::from_value(value)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| Error::Malformed("artifact must be a JSON object".to_string()))?;
        let missing: Vec<&str> = ["internals", "leaves"]
            .into_iter()
            .filter(|k| !obj.contains_key(*k))
            .collect();
        if !missing.is_empty() {
            return Err(Error::Malformed(format!(
                "missing required field(s): {}",
                missing.join(", ")
            )));
        }
        serde_json::from_value(value).map_err(|e| Error::Malformed(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_json(&text)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
        }
        std::fs::write(path, self.to_json()).map_err(|e| Error::io(path, e))
    }

    /// BLAKE3 hash of the canonical JSON.
    pub fn content_hash(&self) -> ContentHash {
        ContentHash::of_bytes(self.to_json().as_bytes())
    }
}
