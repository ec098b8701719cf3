use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::oci::DEFAULT_ENDPOINT;
use crate::state::Command;

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)] // read from Cargo.toml
pub struct Cli {
    /// Fig yaml file to read the services config from
    #[arg(
        env = "FIGFILE",
        short = 'f',
        long = "file",
        value_name = "path",
        default_value = "./fig.yml"
    )]
    pub manifest: PathBuf,

    /// URL of the docker daemon
    #[arg(
        env = "DOCKERURL",
        short = 'H',
        long = "host",
        value_name = "url",
        default_value = DEFAULT_ENDPOINT
    )]
    pub endpoint: String,

    #[arg(value_enum, ignore_case = true)]
    pub command: CliCommand,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum CliCommand {
    /// Start all services and process configuration updates
    Start,
    /// Process configuration updates (alias to `start`)
    Reload,
    /// Stop all services
    Stop,
    /// Restart all services and process configuration updates
    Restart,
}

impl From<CliCommand> for Command {
    fn from(value: CliCommand) -> Self {
        match value {
            CliCommand::Start | CliCommand::Reload => Command::Start,
            CliCommand::Stop => Command::Stop,
            CliCommand::Restart => Command::Restart,
        }
    }
}

pub fn parse() -> Cli {
    Parser::parse()
}
