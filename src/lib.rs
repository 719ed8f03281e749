pub mod artifact;
pub mod cases;
pub mod circuit;
pub mod compile;
pub mod config;
pub mod diagnostic;
pub mod error;
pub mod eval;
pub mod flatten;
pub mod hash;
pub mod labels;
pub mod normalize;
pub mod secret;
pub mod tree;
pub mod validate;

// Re-exports: the pipeline surface used by the CLI and tests
pub use artifact::{CompiledArtifact, InternalRecord, LeafRecord};
pub use compile::{compile, Compilation, CompileOptions};
pub use config::CircuitConfig;
pub use error::{Error, Result};
pub use eval::{evaluate, evaluate_stored};
pub use flatten::{flatten, Layout, Slot, ThresholdMode};
pub use normalize::{normalize, OverflowPolicy};
pub use tree::Node;
pub use validate::{validate, validate_json, ValidationReport};
