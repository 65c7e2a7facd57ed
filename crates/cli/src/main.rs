mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cmd::RunArgs;
use output::OutputFormat;

/// xcpack - cross-compile and package Go programs
#[derive(Parser)]
#[command(name = "xcpack")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Run tasks against a Go project (default: the `default` alias)
  Run(RunArgs),

  /// List registered tasks and aliases
  Tasks {
    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },

  /// Show the selected target platforms
  Platforms {
    /// Comma separated operating systems
    #[arg(long, env = "GOOS", default_value = "")]
    os: String,

    /// Comma separated architectures
    #[arg(long, env = "GOARCH", default_value = "")]
    arch: String,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },

  /// Write the merged, default-filled settings to .xcpack.json
  Config {
    /// Project working directory
    #[arg(long, default_value = ".")]
    wd: PathBuf,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "info" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  match cli.command {
    Commands::Run(args) => cmd::cmd_run(args, cli.verbose),
    Commands::Tasks { output } => cmd::cmd_tasks(output),
    Commands::Platforms { os, arch, output } => cmd::cmd_platforms(&os, &arch, output),
    Commands::Config { wd } => cmd::cmd_config(&wd),
  }
}
