mod cmd;

use anyhow::Result;
use clap::Parser;

/// Daiso: run and inspect small transformer models.
#[derive(Parser)]
#[command(name = "daiso", version, about)]
struct Cli {
    #[command(subcommand)]
    command: cmd::Command,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    cmd::run(cli.command)
}
