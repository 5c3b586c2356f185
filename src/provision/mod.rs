//! Remote-management provisioner.
//!
//! Once a session is up, the modem's management service (OTA updates,
//! remote reboot) has to be authorized over the AT control channel. The
//! command sequence is fixed and ordered; every command must come back with
//! a terminal `OK` before the next one is sent, and the first rejection
//! aborts the whole sequence.

pub mod serial;

use anyhow::Context;
use tracing::{debug, info};

/// Terminal response to a single AT command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AtResponse {
    Ok,
    Error(String),
}

/// One request/terminal-response exchange on the modem's AT interface.
#[allow(async_fn_in_trait)]
pub trait AtChannel {
    async fn exchange(&mut self, command: &str) -> anyhow::Result<AtResponse>;
}

/// The whole provisioning pass, as seen by the supervisor.
#[allow(async_fn_in_trait)]
pub trait Provision {
    async fn provision(&self) -> anyhow::Result<()>;
}

/// The fixed management-service authorization sequence: auto-accept the
/// management session, update download, update install; set the polling
/// period; auto-accept remote reboot and uninstall; then open a one-shot
/// management session.
pub fn management_commands(polling_period_min: u32) -> Vec<String> {
    vec![
        "at+wdsc=0,0".to_string(),
        "at+wdsc=1,0".to_string(),
        "at+wdsc=2,0".to_string(),
        format!("at+wdsc=3,{}", polling_period_min),
        "at+wdsc=5,0".to_string(),
        "at+wdsc=6,0".to_string(),
        "at+wdss=1,1".to_string(),
    ]
}

/// Issue `commands` in order, requiring an affirmative terminal response
/// for each. Any rejection or channel failure aborts the sequence.
pub async fn run_sequence<C: AtChannel>(
    channel: &mut C,
    commands: &[String],
) -> anyhow::Result<()> {
    for command in commands {
        debug!("AT {}", command);
        let response = channel
            .exchange(command)
            .await
            .with_context(|| format!("AT exchange failed for {:?}", command))?;
        match response {
            AtResponse::Ok => {}
            AtResponse::Error(line) => {
                anyhow::bail!("command {:?} rejected: {}", command, line);
            }
        }
    }
    Ok(())
}

/// Production provisioner: opens the serial AT device, runs the sequence,
/// and closes the channel on exit either way (the port is dropped).
pub struct AtProvisioner {
    device: String,
    commands: Vec<String>,
}

impl AtProvisioner {
    pub fn new(device: String, polling_period_min: u32) -> Self {
        Self {
            device,
            commands: management_commands(polling_period_min),
        }
    }
}

impl Provision for AtProvisioner {
    async fn provision(&self) -> anyhow::Result<()> {
        info!("Remote-management provisioning on {}", self.device);
        let mut channel = serial::SerialAt::open(&self.device)
            .with_context(|| format!("failed to open AT device {}", self.device))?;
        run_sequence(&mut channel, &self.commands).await
    }
}
