use std::path::PathBuf;

use clap::Args;

use super::load_artifact;

#[derive(Args)]
pub struct HashArgs {
    /// Compiled artifact JSON
    pub artifact: PathBuf,
    /// Show the full 256-bit hash instead of the short form
    #[arg(long)]
    pub full: bool,
}

pub fn cmd_hash(args: HashArgs) {
    let artifact = load_artifact(&args.artifact);
    let hash = artifact.content_hash();
    if args.full {
        println!("{} {}", hash.to_hex(), args.artifact.display());
    } else {
        println!("{} {}", hash, args.artifact.display());
    }
}
