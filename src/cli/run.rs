//! `dockwait run`: the container smoke workflow.

use clap::Args;

use crate::cli::{OutputFormat, TimingArgs, shutdown_signal};
use crate::config::Config;
use crate::container::{DockerEngine, check_engine};
use crate::workflow::Workflow;

#[derive(Args, Debug, Clone, Default)]
pub struct RunCommand {
    /// Image to run [env: APP_IMAGE]
    #[arg(long)]
    pub image: Option<String>,

    /// Container name; an existing container with this name is replaced
    #[arg(long)]
    pub name: Option<String>,

    /// Host port on 127.0.0.1, 0 lets the engine pick one
    #[arg(long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Port the application listens on inside the container
    #[arg(long, value_name = "PORT")]
    pub container_port: Option<u16>,

    /// Path requested by the readiness probe and smoke checks
    #[arg(long)]
    pub path: Option<String>,

    /// Text the response body must contain
    #[arg(long)]
    pub marker: Option<String>,

    /// Leave the container running afterwards
    #[arg(long)]
    pub keep: bool,

    /// Fail instead of pulling a missing image
    #[arg(long)]
    pub no_pull: bool,

    #[command(flatten)]
    pub timing: TimingArgs,

    /// Result format on stdout
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,
}

impl RunCommand {
    /// Layer these flags over the resolved config.
    pub fn apply(&self, config: &mut Config) {
        self.timing.apply(&mut config.readiness);

        let container = &mut config.container;
        if let Some(image) = &self.image {
            container.image = Some(image.clone());
        }
        if let Some(name) = &self.name {
            container.name = name.clone();
        }
        if let Some(port) = self.port {
            container.host_port = port;
        }
        if let Some(port) = self.container_port {
            container.container_port = port;
        }
        if self.keep {
            container.keep = true;
        }
        if self.no_pull {
            container.auto_pull = false;
        }

        if let Some(path) = &self.path {
            config.smoke.path = path.clone();
        }
        if let Some(marker) = &self.marker {
            config.smoke.marker = Some(marker.clone());
        }
    }
}

/// Returns whether the workflow passed.
pub async fn run_run_command(cmd: RunCommand, mut config: Config) -> anyhow::Result<bool> {
    cmd.apply(&mut config);

    let engine = match DockerEngine::connect().await {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("{e}");
            eprintln!("{}", check_engine().await);
            return Ok(false);
        }
    };

    let workflow = Workflow::from_config(engine, &config)?;
    let report = workflow.run_until(shutdown_signal()).await;

    cmd.output.print(&report)?;
    Ok(report.status.is_success())
}
