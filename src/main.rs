use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use dockwait::cli::{Cli, Command, run_doctor_command, run_run_command, run_wait_command};
use dockwait::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    if let Command::Completion(completion) = &cli.command {
        return completion.run();
    }

    init_tracing(cli.json_logs);

    let ok = match cli.command {
        Command::Wait(cmd) => {
            let config = Config::load_readiness(cli.config.as_deref())?;
            run_wait_command(cmd, config).await?
        }
        Command::Run(cmd) => {
            let config = Config::load(cli.config.as_deref())?;
            run_run_command(cmd, config).await?
        }
        Command::Doctor => run_doctor_command().await?,
        Command::Completion(_) => true,
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

/// Logs go to stderr so stdout only carries results.
fn init_tracing(json: bool) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("dockwait=info"));

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}
