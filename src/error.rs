//! Error kinds shared by every compiler stage.

use std::path::PathBuf;

use thiserror::Error;

/// A feature index found outside `[0, num_features - 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeatureOffender {
    /// Position of the internal record in the artifact.
    pub slot: usize,
    /// The out-of-range feature index stored there.
    pub feature: usize,
}

/// Errors produced while compiling, validating, or evaluating a model.
#[derive(Debug, Error)]
pub enum Error {
    /// Leaf/internal relationship or leaf encoding violated.
    #[error("structure error: {0}")]
    Structure(String),

    #[error("feature index out of range (0..{num_features}): {}", format_offenders(.offenders))]
    FeatureRange {
        num_features: usize,
        offenders: Vec<FeatureOffender>,
    },

    /// Evaluation input has the wrong length or a value out of range.
    #[error("input shape error: {0}")]
    InputShape(String),

    /// The evaluator ended on a padding leaf or a slot past the arrays.
    #[error("evaluation reached unreachable leaf slot {leaf}")]
    UnreachableLeaf { leaf: usize },

    #[error(
        "tree needs {internals} internal / {leaves} leaf slots but the circuit has {internal_capacity} / {leaf_capacity}"
    )]
    CapacityExceeded {
        internals: usize,
        leaves: usize,
        internal_capacity: usize,
        leaf_capacity: usize,
    },

    /// Input document is missing fields or is not valid JSON.
    #[error("malformed input: {0}")]
    Malformed(String),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("invalid circuit configuration: {0}")]
    Config(String),

    #[error("cannot access '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Short kind name, as printed in reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Structure(_) => "StructureError",
            Error::FeatureRange { .. } => "FeatureRangeError",
            Error::InputShape(_) => "InputShapeError",
            Error::UnreachableLeaf { .. } => "UnreachableLeafError",
            Error::CapacityExceeded { .. } => "CapacityExceededError",
            Error::Malformed(_) => "MalformedError",
            Error::Encoding(_) => "EncodingError",
            Error::Config(_) => "ConfigError",
            Error::Io { .. } => "IoError",
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

fn format_offenders(offenders: &[FeatureOffender]) -> String {
    offenders
        .iter()
        .map(|o| format!("slot {} -> {}", o.slot, o.feature))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type for treeforge operations.
pub type Result<T> = std::result::Result<T, Error>;
