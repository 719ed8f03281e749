mod cli;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(
    name = "treeforge",
    version,
    about = "Decision-tree compiler for fixed-topology circuits"
)]
struct Cli {
    /// Raise the log level (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a tree into a fixed-capacity artifact
    Compile(cli::compile::CompileArgs),
    /// Run the structural validator on a stored artifact
    Validate(cli::validate::ValidateArgs),
    /// Classify inputs with the reference evaluator
    Eval(cli::eval::EvalArgs),
    /// Cross-check the reference evaluator against the circuit simulator
    Verify(cli::verify::VerifyArgs),
    /// Show the artifact's content hash (BLAKE3)
    Hash(cli::hash::HashArgs),
    /// Encode the artifact and a sample as circuit secret inputs
    Encode(cli::encode::EncodeArgs),
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    match cli.command {
        Command::Compile(args) => cli::compile::cmd_compile(args),
        Command::Validate(args) => cli::validate::cmd_validate(args),
        Command::Eval(args) => cli::eval::cmd_eval(args),
        Command::Verify(args) => cli::verify::cmd_verify(args),
        Command::Hash(args) => cli::hash::cmd_hash(args),
        Command::Encode(args) => cli::encode::cmd_encode(args),
    }
}
