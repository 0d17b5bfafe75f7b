mod args;
mod commands;
mod exit;
mod logging;
mod presenter;

use clap::Parser;

use crate::args::Cli;
use crate::exit::{SUCCESS, USAGE};
use crate::logging::init_logging;

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = if err.use_stderr() { USAGE } else { SUCCESS };
            let _ = err.print();
            std::process::exit(code);
        }
    };
    init_logging(cli.log_level);

    let result = if cli.list_ports {
        commands::list_ports(&cli)
    } else {
        commands::capture(&cli)
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            log::debug!("exiting with code {}", err.code);
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}
