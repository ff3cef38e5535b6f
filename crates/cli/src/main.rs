mod cmd;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cmd::ResolveArgs;

/// lake - evaluate Lakefile directories
#[derive(Parser)]
#[command(name = "lake")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Log at debug level (RUST_LOG takes precedence)
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Resolve a directory and print its stores, targets and defaults
  Eval(ResolveArgs),

  /// Resolve a directory as a package and print every named value
  Values(ResolveArgs),

  /// Print declarations in the order they are evaluated
  Order(ResolveArgs),
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let default_filter = if cli.verbose { "debug" } else { "warn" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  match cli.command {
    Commands::Eval(args) => cmd::cmd_eval(&args),
    Commands::Values(args) => cmd::cmd_values(&args),
    Commands::Order(args) => cmd::cmd_order(&args),
  }
}
