//! Seed script entry point.
//!
//! # Responsibility
//! - Initialize logging once, run the demo scenario on a transient
//!   in-memory store, and exit non-zero on failure.

use log::error;
use shelterdb_core::{default_log_level, init_logging, seed, StoreUrl};
use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(err) = init_logging(default_log_level()) {
        eprintln!("shelterdb: failed to initialize logging: {err}");
        return ExitCode::FAILURE;
    }

    match seed::run(&StoreUrl::Memory) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=app_exit module=cli status=error error={err}");
            ExitCode::FAILURE
        }
    }
}
