//! Vitrine CLI binary.
//!
//! Whatever goes wrong, stdout still carries a JSON array: the empty list `[]`
//! is printed and the process exits with status 1.

use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::process;

use clap::Parser;
use clap::error::ErrorKind;
use env_logger::{Builder, Target};
use log::{LevelFilter, error};

use vitrine::cli::args::*;
use vitrine::cli::commands::*;
use vitrine::cli::output::output_empty_list;

fn main() {
    // Parse command line arguments using clap
    let args = match VitrineArgs::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            let _ = e.print();
            output_empty_list();
            process::exit(1);
        }
    };

    let log_level = match args.verbosity() {
        0 => LevelFilter::Error, // Quiet mode
        1 => LevelFilter::Warn,  // Default
        2 => LevelFilter::Info,  // Verbose
        _ => LevelFilter::Debug, // Very verbose (3+)
    };

    Builder::new()
        .filter_level(log_level)
        .target(Target::Stderr)
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .init();

    // Execute the command
    match panic::catch_unwind(AssertUnwindSafe(|| execute_command(args))) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            error!("Error in recommendation engine: {e}");
            output_empty_list();
            process::exit(1);
        }
        Err(_) => {
            error!("Recommendation engine panicked");
            output_empty_list();
            process::exit(1);
        }
    }
}
