use std::path::PathBuf;
use std::process;

use clap::Args;
use treeforge::eval::evaluate_batch;
use treeforge::Layout;

use super::{format_input, load_artifact, load_config, resolve_cases};

#[derive(Args)]
pub struct EvalArgs {
    /// Compiled artifact JSON
    pub artifact: PathBuf,
    /// A single comma-separated input vector
    #[arg(long, conflicts_with = "cases")]
    pub input: Option<String>,
    /// Test-case file ({"test_cases": [[...], ...]}); default: standard cases
    #[arg(long, value_name = "PATH")]
    pub cases: Option<PathBuf>,
    /// Circuit configuration TOML (default: built-in)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

pub fn cmd_eval(args: EvalArgs) {
    let config = load_config(args.config.as_deref());
    let artifact = load_artifact(&args.artifact);
    let inputs = resolve_cases(args.input.as_deref(), args.cases.as_ref(), &config);

    let layout = Layout::for_artifact(&artifact, &config);
    let results = evaluate_batch(&artifact, &layout, &inputs, &config);

    let mut failed = 0;
    for (i, (input, result)) in inputs.iter().zip(results).enumerate() {
        match result {
            Ok(class) => println!("case {}: class {}", i, class),
            Err(e) => {
                failed += 1;
                eprintln!("case {}: error: {} {}", i, e, format_input(input));
            }
        }
    }
    if failed > 0 {
        eprintln!("error: {} of {} cases failed", failed, inputs.len());
        process::exit(1);
    }
}
