//! CLI command implementations

mod generate;
mod index;
mod search;
mod train;
mod validate;

use crate::cli::LogLevel;
use crate::config::{Cli, Command};

/// Execute a CLI command based on the parsed arguments
pub fn run_command(cli: Cli) -> Result<(), String> {
    let log_level = LogLevel::from_flags(cli.quiet, cli.verbose);

    match cli.command {
        Command::Train(args) => train::run_train(args, log_level),
        Command::Index(args) => index::run_index(args, log_level),
        Command::Search(args) => search::run_search(args, log_level),
        Command::Generate(args) => generate::run_generate(args, log_level),
        Command::Validate(args) => validate::run_validate(args, log_level),
    }
}
