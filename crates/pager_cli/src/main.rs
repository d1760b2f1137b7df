//! `pager` binary entry point.
//!
//! # Responsibility
//! - Parse arguments, start logging and run one command per process.
//! - Map failures to exit codes: 17 for conflicts, 1 for anything else.

mod cli;
mod commands;

use cli::Cli;
use log::{error, info};
use std::process::ExitCode;

const EXIT_CONFLICT: u8 = 17;
const EXIT_FAILURE: u8 = 1;

fn main() -> ExitCode {
    let cli = match Cli::try_parse_ordered() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::from(EXIT_FAILURE)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    if let Err(err) = pager_core::init_logging(&cli.global.log_config()) {
        eprintln!("pager: {err}");
        return ExitCode::from(EXIT_FAILURE);
    }

    let name = cli.command.name();
    match commands::run(&cli.command, &cli.global.db) {
        Ok(()) => {
            info!("event=command module=cli status=ok command={name}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("event=command module=cli status=error command={name} error={err}");
            eprintln!("pager: {err}");
            if err.is_conflict() {
                ExitCode::from(EXIT_CONFLICT)
            } else {
                ExitCode::from(EXIT_FAILURE)
            }
        }
    }
}
