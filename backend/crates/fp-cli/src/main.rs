//! fpctl - florida server control panel
//!
//! # Examples
//!
//! ```bash
//! # Is the server up?
//! fpctl status
//!
//! # Start on a custom port with extra arguments
//! fpctl start --port 8080 --params="--verbose"
//!
//! # Move to the other build (restarts if running)
//! fpctl switch 16.0.3
//!
//! # Stop, confirming the interruption
//! fpctl stop --yes
//! ```

use fp_cli::{Cli, report_error, run};

use std::process::ExitCode;

use clap::Parser;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&e);
            ExitCode::FAILURE
        }
    }
}
