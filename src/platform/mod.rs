//! Platform adapters: the production implementations of the capability
//! seams, backed by the same host commands the stock gateway image ships
//! with (qmicli, route, ping, ntpd, openvpn, the LED handler helper).

pub mod host;
pub mod led;
pub mod qmi;
pub mod time;

use anyhow::Context;
use tokio::process::Command;
use tracing::{debug, error};

/// Run a host command and require a zero exit status.
pub(crate) async fn run_checked(program: &str, args: &[&str]) -> anyhow::Result<()> {
    if !run_status(program, args).await? {
        anyhow::bail!("{} {} failed", program, args.join(" "));
    }
    Ok(())
}

/// Run a host command, returning whether it exited zero.
pub(crate) async fn run_status(program: &str, args: &[&str]) -> anyhow::Result<bool> {
    debug!("Run: {} {}", program, args.join(" "));
    let status = Command::new(program)
        .args(args)
        .status()
        .await
        .with_context(|| format!("failed to spawn {}", program))?;

    if !status.success() {
        error!("{} {} exited with {}", program, args.join(" "), status);
    }
    Ok(status.success())
}

/// Run a host command and capture stdout, requiring a zero exit status.
pub(crate) async fn run_capture(program: &str, args: &[&str]) -> anyhow::Result<String> {
    debug!("Run: {} {}", program, args.join(" "));
    let output = Command::new(program)
        .args(args)
        .output()
        .await
        .with_context(|| format!("failed to spawn {}", program))?;

    if !output.status.success() {
        anyhow::bail!(
            "{} {} exited with {}: {}",
            program,
            args.join(" "),
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
