use std::path::PathBuf;

use clap::Args;
use treeforge::cases::parse_input;
use treeforge::secret::{encode_model, encode_sample};

use super::{fail, load_artifact, load_config};

#[derive(Args)]
pub struct EncodeArgs {
    /// Compiled artifact JSON
    pub artifact: PathBuf,
    /// Also encode this comma-separated input vector
    #[arg(long)]
    pub sample: Option<String>,
    /// Circuit configuration TOML (default: built-in)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

pub fn cmd_encode(args: EncodeArgs) {
    let config = load_config(args.config.as_deref());
    let artifact = load_artifact(&args.artifact);

    let model = encode_model(&artifact, &config).unwrap_or_else(|e| fail(e));
    println!("model  ({} bits): {}", model.len(), model.to_hex());

    if let Some(text) = args.sample {
        let input = parse_input(&text).unwrap_or_else(|e| fail(e));
        let sample = encode_sample(&input, &config).unwrap_or_else(|e| fail(e));
        println!("sample ({} bits): {}", sample.len(), sample.to_hex());
    }
}
