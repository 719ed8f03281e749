use std::path::PathBuf;
use std::process;

use clap::Args;
use treeforge::diagnostic::render_diagnostics;
use treeforge::labels::FeatureLabels;
use treeforge::{validate_json, Error};

use super::{fail, load_config};

#[derive(Args)]
pub struct ValidateArgs {
    /// Compiled artifact JSON
    pub artifact: PathBuf,
    /// Question file used to label feature indices in the summary
    #[arg(long, value_name = "PATH")]
    pub labels: Option<PathBuf>,
    /// Circuit configuration TOML (default: built-in)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

pub fn cmd_validate(args: ValidateArgs) {
    let config = load_config(args.config.as_deref());
    let labels = args
        .labels
        .as_deref()
        .map(|path| FeatureLabels::load(path).unwrap_or_else(|e| fail(e)));

    let source = std::fs::read_to_string(&args.artifact)
        .unwrap_or_else(|e| fail(Error::io(&args.artifact, e)));
    let filename = args.artifact.to_string_lossy().to_string();

    let report = validate_json(&source, &config).unwrap_or_else(|e| fail(e));
    render_diagnostics(&report.diagnostics, &filename, &source);

    match report.failure {
        None => {
            println!("{}", report.summary.render(labels.as_ref()));
            eprintln!("Validation: OK");
        }
        Some(err) => {
            eprintln!("error: validation failed: {}", err);
            process::exit(1);
        }
    }
}
