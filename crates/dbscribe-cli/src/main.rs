//! dbscribe CLI - database table structures rendered through templates

use clap::Parser;
use dbscribe_cli::{logging, run, Args};
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = Args::parse();
    logging::init(args.verbose, args.quiet);

    match run::run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("dbscribe: error: {e:#}");
            ExitCode::from(run::exit_code(&e))
        }
    }
}
