//! stacksynth CLI entry point
//!
//! Parses arguments, runs the selected command, and turns any failure into a
//! user-friendly message on stderr with exit status 1.

use anyhow::Result;
use clap::Parser;
use stacksynth::cli;
use stacksynth::core::error::user_friendly_error;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute() {
        Ok(()) => Ok(()),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
