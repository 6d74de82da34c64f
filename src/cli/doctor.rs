//! `dockwait doctor`: is a container engine usable here?

use crate::container::check_engine;

/// Returns whether the engine is available.
pub async fn run_doctor_command() -> anyhow::Result<bool> {
    let detection = check_engine().await;
    println!("{detection}");
    Ok(detection.status.is_ok())
}
