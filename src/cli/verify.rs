use std::path::PathBuf;
use std::process;

use clap::Args;
use treeforge::circuit::{decode_class, simulate};
use treeforge::{compile, evaluate, CompileOptions, Error, Layout, ThresholdMode};

use super::{fail, format_input, load_artifact, load_config, load_tree, resolve_cases};

#[derive(Args)]
pub struct VerifyArgs {
    /// Compiled artifact JSON
    pub artifact: PathBuf,
    /// Test-case file ({"test_cases": [[...], ...]}); default: standard cases
    #[arg(long, value_name = "PATH")]
    pub cases: Option<PathBuf>,
    /// Source tree; its own layout drives the reference evaluator
    #[arg(long, value_name = "PATH")]
    pub tree: Option<PathBuf>,
    /// The source tree is in array form
    #[arg(long, requires = "tree")]
    pub array: bool,
    /// Threshold mode the artifact was compiled with
    #[arg(long, value_enum, default_value_t = ThresholdMode::Truncate)]
    pub thresholds: ThresholdMode,
    /// Circuit configuration TOML (default: built-in)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

pub fn cmd_verify(args: VerifyArgs) {
    let config = load_config(args.config.as_deref());
    let artifact = load_artifact(&args.artifact);
    let inputs = resolve_cases(None, args.cases.as_ref(), &config);

    eprintln!("Verifying {}...", args.artifact.display());

    let layout = match args.tree {
        Some(ref path) => {
            let tree = load_tree(path, args.array, &config);
            let options = CompileOptions {
                thresholds: args.thresholds,
                ..CompileOptions::default()
            };
            let compiled = compile(&tree, &config, &options).unwrap_or_else(|e| fail(e));
            if compiled.artifact != artifact {
                fail(Error::Structure(format!(
                    "'{}' was not compiled from '{}' with these options",
                    args.artifact.display(),
                    path.display()
                )));
            }
            compiled.layout
        }
        None => Layout::for_artifact(&artifact, &config),
    };

    let mut failures = 0;
    for (i, input) in inputs.iter().enumerate() {
        let bits = simulate(&artifact, input, &config).unwrap_or_else(|e| fail(e));
        let circuit = decode_class(&bits);

        match evaluate(&artifact, &layout, input, &config) {
            Ok(reference) if circuit == Some(reference) => {
                println!("case {}: class {}", i, reference);
            }
            Ok(reference) => {
                failures += 1;
                println!(
                    "case {}: MISMATCH reference {} circuit {} (bits {:?}) {}",
                    i,
                    reference,
                    describe(circuit),
                    bits,
                    format_input(input)
                );
            }
            Err(e) => {
                failures += 1;
                println!(
                    "case {}: REFERENCE ERROR {} circuit {} {}",
                    i,
                    e,
                    describe(circuit),
                    format_input(input)
                );
            }
        }
    }

    if failures > 0 {
        eprintln!(
            "error: verification failed on {} of {} cases",
            failures,
            inputs.len()
        );
        process::exit(1);
    }
    eprintln!("Verification: OK");
}

fn describe(class: Option<usize>) -> String {
    match class {
        Some(c) => c.to_string(),
        None => "none".to_string(),
    }
}
