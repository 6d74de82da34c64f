//! CLI command handling.
//!
//! Provides subcommands for:
//! - Waiting for an address to become reachable (`wait`)
//! - Running the container smoke workflow (`run`)
//! - Checking that a container engine is available (`doctor`)
//! - Generating shell completions (`completion`)

mod completion;
mod doctor;
mod run;
mod wait;

pub use completion::Completion;
pub use doctor::run_doctor_command;
pub use run::{RunCommand, run_run_command};
pub use wait::{TimingArgs, WaitCommand, run_wait_command};

use std::path::PathBuf;

use clap::{ColorChoice, Parser, Subcommand, ValueEnum};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(name = "dockwait")]
#[command(about = "Wait for services to become reachable and smoke test containers")]
#[command(
    long_about = "dockwait polls an address until it answers or a deadline passes.\nExamples:\n  dockwait wait http://127.0.0.1:8080/ --timeout 30  # Wait for an HTTP service\n  dockwait run --image my-app:latest  # Run, wait, smoke test, clean up"
)]
#[command(version)]
#[command(color = ColorChoice::Auto)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Settings file (TOML). Environment variables still override it.
    #[arg(short, long, global = true, env = "DOCKWAIT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON on stderr
    #[arg(long, global = true)]
    pub json_logs: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Poll an address until it answers or the timeout passes
    Wait(WaitCommand),

    /// Run a container, wait for it, smoke test it, and remove it
    Run(RunCommand),

    /// Check that a container engine is installed and running
    Doctor,

    /// Generate shell completion scripts
    Completion(Completion),
}

/// How results are printed on stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    /// Print `value` in this format.
    pub fn print<T>(&self, value: &T) -> anyhow::Result<()>
    where
        T: Serialize + std::fmt::Display,
    {
        match self {
            OutputFormat::Text => println!("{value}"),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        }
        Ok(())
    }
}

/// Completes on Ctrl-C. Never completes if the handler cannot be installed.
///
/// Once polled, the process no longer exits on Ctrl-C by default; the caller
/// decides what stops. `run` uses it to cut the current step short and still
/// remove the container, so further Ctrl-C presses during cleanup are ignored.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Could not listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
