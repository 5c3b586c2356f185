//! Reconnection supervisor: the state machine that keeps the WAN uplink
//! alive.
//!
//! One sequential loop owns everything: it powers the radio, establishes
//! the data session, applies the host network configuration, provisions the
//! remote-management profile, and then heartbeats the uplink with an ICMP
//! probe. Every failed probe tears the whole stack down (radio included)
//! and rebuilds it with an escalating back-off, so transient radio glitches
//! recover quickly while a persistent failure backs off far enough not to
//! starve an OTA update that might be the actual fix.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::modem::power::RadioPower;
use crate::modem::session::SessionManager;
use crate::modem::{ModemControl, ModemProfile};
use crate::net::configure::NetworkConfigurator;
use crate::net::probe::ConnectivityVerifier;
use crate::net::HostOps;
use crate::provision::Provision;

/// Settle time between tearing the radio down and re-initializing it.
/// Without it, radio and data connection init fails. Hardware constraint.
pub const REBUILD_SETTLE: Duration = Duration::from_secs(5);

/// Settle time between stopping a stale session and reconfiguring the
/// profile. Same driver constraint as the other settle delays.
pub const RECONFIGURE_SETTLE: Duration = Duration::from_secs(2);

/// Poll period for the trusted-time gate.
pub const TIME_SYNC_POLL: Duration = Duration::from_secs(2);

/// Link state as the supervisor sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Establishing,
    Connected,
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkState::Disconnected => write!(f, "disconnected"),
            LinkState::Establishing => write!(f, "establishing"),
            LinkState::Connected => write!(f, "connected"),
        }
    }
}

/// LED command sent to the external status indicator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedCommand {
    pub name: String,
    pub mode: LedMode,
    pub rgb: (u8, u8, u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedMode {
    Steady,
    Blink,
}

/// External LED status indicator collaborator.
#[allow(async_fn_in_trait)]
pub trait Indicator {
    async fn indicate(&self, command: &LedCommand) -> anyhow::Result<()>;
}

/// External time-sync collaborator: a single pollable boolean. The
/// supervisor never initiates synchronization, it only polls.
#[allow(async_fn_in_trait)]
pub trait TimeSync {
    async fn is_synced(&self) -> bool;
}

/// Escalating back-off over a fixed, configured table of delays. The stage
/// saturates at the last entry and resets to zero exactly once per
/// successful heartbeat.
#[derive(Debug)]
pub struct ReconnectBackoff {
    table: Vec<Duration>,
    stage: usize,
}

impl ReconnectBackoff {
    pub fn new(table: Vec<Duration>) -> anyhow::Result<Self> {
        if table.is_empty() {
            anyhow::bail!("back-off table must not be empty");
        }
        Ok(Self { table, stage: 0 })
    }

    pub fn stage(&self) -> usize {
        self.stage
    }

    /// Delay for the current stage; advances the stage unless already at
    /// the last entry.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.table[self.stage];
        if self.stage < self.table.len() - 1 {
            self.stage += 1;
        }
        delay
    }

    pub fn reset(&mut self) {
        self.stage = 0;
    }
}

/// Attempt failures are retried from the top of the reconnect loop; only
/// hardware-invariant violations (a session that won't stop) are fatal and
/// take the process down.
#[derive(Debug)]
pub enum LinkError {
    Retry(anyhow::Error),
    Fatal(anyhow::Error),
}

/// Supervisor knobs derived from the config file.
#[derive(Debug, Clone)]
pub struct SupervisorSettings {
    pub backoff: Vec<Duration>,
    pub heartbeat: Duration,
    pub vpn_config: PathBuf,
    pub led_name: String,
    pub led_rgb: (u8, u8, u8),
}

impl SupervisorSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            backoff: config
                .supervisor
                .backoff_secs
                .iter()
                .map(|s| Duration::from_secs(*s))
                .collect(),
            heartbeat: Duration::from_secs(config.supervisor.heartbeat_secs),
            vpn_config: PathBuf::from(&config.vpn.config),
            led_name: config.led.name.clone(),
            led_rgb: (config.led.red, config.led.green, config.led.blue),
        }
    }
}

pub struct Supervisor<M, H, L, T, P> {
    modem: Arc<M>,
    host: Arc<H>,
    power: RadioPower<M>,
    session: SessionManager<M>,
    configurator: NetworkConfigurator<M, H>,
    verifier: ConnectivityVerifier<H>,
    indicator: L,
    time_sync: T,
    provisioner: P,
    backoff: ReconnectBackoff,
    heartbeat: Duration,
    vpn_config: PathBuf,
    led_connected: LedCommand,
    led_not_connected: LedCommand,
    state: LinkState,
}

impl<M, H, L, T, P> Supervisor<M, H, L, T, P>
where
    M: ModemControl,
    H: HostOps,
    L: Indicator,
    T: TimeSync,
    P: Provision,
{
    pub fn new(
        modem: Arc<M>,
        host: Arc<H>,
        indicator: L,
        time_sync: T,
        provisioner: P,
        profile: ModemProfile,
        settings: SupervisorSettings,
    ) -> anyhow::Result<Self> {
        let backoff = ReconnectBackoff::new(settings.backoff)?;
        Ok(Self {
            power: RadioPower::new(modem.clone()),
            session: SessionManager::new(modem.clone(), profile),
            configurator: NetworkConfigurator::new(modem.clone(), host.clone()),
            verifier: ConnectivityVerifier::new(host.clone()),
            modem,
            host,
            indicator,
            time_sync,
            provisioner,
            backoff,
            heartbeat: settings.heartbeat,
            vpn_config: settings.vpn_config,
            led_connected: LedCommand {
                name: settings.led_name.clone(),
                mode: LedMode::Steady,
                rgb: settings.led_rgb,
            },
            led_not_connected: LedCommand {
                name: settings.led_name,
                mode: LedMode::Blink,
                rgb: settings.led_rgb,
            },
            state: LinkState::Disconnected,
        })
    }

    /// Run the supervision loop for the process lifetime. Returns only on a
    /// fatal hardware-invariant violation.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        self.indicate(false).await;
        self.set_state(LinkState::Establishing);
        Self::check(self.open_link().await)?;

        loop {
            let mut connected = self.probe_link().await;

            while !connected {
                self.set_state(LinkState::Establishing);
                self.indicate(false).await;

                Self::check(self.close_link().await)?;

                tokio::time::sleep(REBUILD_SETTLE).await;

                Self::check(self.open_link().await)?;

                let stage = self.backoff.stage();
                let delay = self.backoff.next_delay();
                debug!(
                    "Reconnect stage {}, {}s before new attempt",
                    stage,
                    delay.as_secs()
                );
                tokio::time::sleep(delay).await;

                connected = self.probe_link().await;
            }

            // A heartbeat only counts once the clock is trusted; everything
            // downstream of the VPN depends on correct timestamps.
            while !self.time_sync.is_synced().await {
                tokio::time::sleep(TIME_SYNC_POLL).await;
            }

            self.set_state(LinkState::Connected);
            self.indicate(true).await;

            if let Err(e) = self.host.spawn_vpn(&self.vpn_config).await {
                error!("Failed to launch VPN tunnel: {:#}", e);
            }

            self.backoff.reset();

            info!(
                "Successful heartbeat, next one in {}s",
                self.heartbeat.as_secs()
            );
            tokio::time::sleep(self.heartbeat).await;
        }
    }

    /// Bring the whole uplink up: radio, session, host network
    /// configuration, remote-management profile.
    async fn open_link(&self) -> Result<(), LinkError> {
        self.power.ensure_on().await.map_err(LinkError::Retry)?;

        // A stop that fails leaves the session half-torn-down; nothing
        // recovers from that short of a process restart.
        self.session
            .stop_if_active()
            .await
            .map_err(LinkError::Fatal)?;

        tokio::time::sleep(RECONFIGURE_SETTLE).await;

        self.session.configure().await.map_err(LinkError::Retry)?;
        self.session.start().await.map_err(LinkError::Retry)?;

        let netcfg = self
            .configurator
            .apply(self.session.profile())
            .await
            .map_err(LinkError::Retry)?;
        info!(
            "Uplink configured: {} {} via {}, dns {}{}",
            netcfg.family,
            netcfg.address,
            netcfg.gateway,
            netcfg.dns1,
            netcfg
                .dns2
                .map(|d| format!(" {}", d))
                .unwrap_or_default(),
        );

        self.provisioner
            .provision()
            .await
            .map_err(LinkError::Retry)?;

        Ok(())
    }

    /// Tear the uplink down: stop the session, power the radio off.
    async fn close_link(&self) -> Result<(), LinkError> {
        self.session
            .stop_if_active()
            .await
            .map_err(LinkError::Fatal)?;
        self.power.ensure_off().await.map_err(LinkError::Retry)?;
        Ok(())
    }

    /// Ground-truth reachability check, independent of what the modem
    /// reports.
    async fn probe_link(&self) -> bool {
        let family = self
            .modem
            .address_family(self.session.profile().index)
            .await
            .ok();
        self.verifier.probe(family).await
    }

    async fn indicate(&self, connected: bool) {
        let command = if connected {
            &self.led_connected
        } else {
            &self.led_not_connected
        };
        if let Err(e) = self.indicator.indicate(command).await {
            warn!("LED indication failed: {:#}", e);
        }
    }

    fn set_state(&mut self, state: LinkState) {
        if self.state != state {
            info!("Link {} -> {}", self.state, state);
            self.state = state;
        }
    }

    /// Attempt failures stay inside the loop; fatal errors escape it.
    fn check(result: Result<(), LinkError>) -> anyhow::Result<()> {
        match result {
            Ok(()) => Ok(()),
            Err(LinkError::Retry(e)) => {
                warn!("Link attempt failed: {:#}", e);
                Ok(())
            }
            Err(LinkError::Fatal(e)) => Err(e),
        }
    }

    #[cfg(test)]
    fn backoff_stage(&self) -> usize {
        self.backoff.stage()
    }
}
