pub mod create_dummy;
pub mod info;
pub mod run;

use clap::Subcommand;

#[derive(Subcommand)]
pub enum Command {
    /// Generate tokens from a model file.
    Run(run::RunArgs),

    /// Print the header of a model file.
    Info(info::InfoArgs),

    /// Write a model file with random or zero weights.
    CreateDummy(create_dummy::CreateDummyArgs),
}

pub fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Run(args) => run::run(args),
        Command::Info(args) => info::run(args),
        Command::CreateDummy(args) => create_dummy::run(args),
    }
}
