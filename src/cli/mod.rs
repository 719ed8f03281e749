pub mod compile;
pub mod encode;
pub mod eval;
pub mod hash;
pub mod validate;
pub mod verify;

use std::path::{Path, PathBuf};
use std::process;

use treeforge::cases::{parse_input, TestCases};
use treeforge::tree::array::ArrayTree;
use treeforge::{CircuitConfig, CompiledArtifact, Error, Node};

/// Print an error and exit with status 1.
pub fn fail(err: Error) -> ! {
    eprintln!("error: {}", err);
    process::exit(1);
}

/// The circuit configuration from `--config`, or the built-in one.
pub fn load_config(path: Option<&Path>) -> CircuitConfig {
    let config = match path {
        Some(path) => CircuitConfig::load(path).unwrap_or_else(|e| fail(e)),
        None => CircuitConfig::standard(),
    };
    if let Err(e) = config.check() {
        fail(e);
    }
    config
}

pub fn load_artifact(path: &Path) -> CompiledArtifact {
    CompiledArtifact::load(path).unwrap_or_else(|e| fail(e))
}

/// A tree in nested form, or in array form when `array` is set.
pub fn load_tree(path: &Path, array: bool, config: &CircuitConfig) -> Node {
    let tree = if array {
        ArrayTree::load(path).and_then(|array| array.to_node(config.num_classes))
    } else {
        Node::load(path)
    };
    tree.unwrap_or_else(|e| fail(e))
}

/// Inputs from `--input`, else `--cases`, else the standard cases.
pub fn resolve_cases(
    input: Option<&str>,
    cases: Option<&PathBuf>,
    config: &CircuitConfig,
) -> Vec<Vec<i32>> {
    if let Some(text) = input {
        return vec![parse_input(text).unwrap_or_else(|e| fail(e))];
    }
    match cases {
        Some(path) => TestCases::load(path).unwrap_or_else(|e| fail(e)).test_cases,
        None => TestCases::standard(config).test_cases,
    }
}

/// Compact rendering of an input vector for reports.
pub fn format_input(input: &[i32]) -> String {
    let parts: Vec<String> = input.iter().map(|v| v.to_string()).collect();
    format!("[{}]", parts.join(","))
}
