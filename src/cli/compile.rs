use std::path::PathBuf;

use clap::Args;
use treeforge::{compile, CompileOptions, OverflowPolicy, ThresholdMode};

use super::{fail, load_config, load_tree};

#[derive(Args)]
pub struct CompileArgs {
    /// Tree JSON (nested nodes, or array form with --array)
    pub input: PathBuf,
    /// Input is the children_left/children_right array export
    #[arg(long)]
    pub array: bool,
    /// Output artifact (default: <input>.compiled.json)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// What to do when the tree exceeds the circuit's capacity
    #[arg(long, value_enum, default_value_t = OverflowPolicy::Reject)]
    pub overflow: OverflowPolicy,
    /// How fractional thresholds become integers
    #[arg(long, value_enum, default_value_t = ThresholdMode::Truncate)]
    pub thresholds: ThresholdMode,
    /// Reject incomplete trees instead of expanding them to the circuit's depth
    #[arg(long)]
    pub no_complete: bool,
    /// Circuit configuration TOML (default: built-in)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

pub fn cmd_compile(args: CompileArgs) {
    let config = load_config(args.config.as_deref());
    let tree = load_tree(&args.input, args.array, &config);

    let options = CompileOptions {
        thresholds: args.thresholds,
        overflow: args.overflow,
        complete: !args.no_complete,
    };

    let compiled = compile(&tree, &config, &options).unwrap_or_else(|e| fail(e));

    let out_path = args
        .output
        .unwrap_or_else(|| args.input.with_extension("compiled.json"));
    if let Err(e) = compiled.artifact.save(&out_path) {
        fail(e);
    }

    eprintln!(
        "Compiled -> {} ({} internal, {} leaves, {})",
        out_path.display(),
        compiled.logical_internals,
        compiled.logical_leaves,
        compiled.artifact.content_hash()
    );
    if compiled.truncated {
        eprintln!(
            "warning: tree exceeded capacity and was truncated; the artifact no longer classifies like the tree"
        );
    }
}
