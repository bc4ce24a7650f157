//! Low-level writing logic for output routing

use super::config::OutputMode;
use std::io::{self, Write};

/// Write output based on the current mode and output type
pub fn write_output(
    mode: OutputMode,
    is_display: bool,
    args: std::fmt::Arguments,
) -> io::Result<()> {
    match (mode, is_display) {
        (OutputMode::Cli, true) => {
            print!("{args}");
            io::stdout().flush()
        }
        (OutputMode::Quiet, true) => Ok(()),
        (_, false) => {
            eprint!("{args}");
            io::stderr().flush()
        }
    }
}

/// Write output with newline based on the current mode and output type
pub fn writeln_output(
    mode: OutputMode,
    is_display: bool,
    args: std::fmt::Arguments,
) -> io::Result<()> {
    match (mode, is_display) {
        (OutputMode::Cli, true) => {
            println!("{args}");
            io::stdout().flush()
        }
        (OutputMode::Quiet, true) => Ok(()),
        (_, false) => {
            eprintln!("{args}");
            io::stderr().flush()
        }
    }
}
