// Entrypoint for the CLI application.
// - Keeps `main` small: parse arguments, set up logging and hand off to
//   the command dispatcher.
// - Any failure is printed as a single red line and exits with status 1.

use clap::Parser;
use meritt_cli::{cli::Args, logging, ui};
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            ui::error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    logging::init_logger(args.wants_verbose())?;
    args.run()?;
    Ok(())
}
