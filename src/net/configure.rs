//! Network configurator: takes the addressing a freshly connected session
//! was assigned and applies it to the host (default route + resolver file).

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::info;

use super::{AddressFamily, HostOps, NetworkConfig};
use crate::modem::{ModemControl, ModemProfile, SessionState};

/// Settle time between reading the assigned addresses and committing the
/// route change. The modem driver needs this; committing immediately after
/// the read has been seen to install a dead route. Hardware constraint.
pub const ROUTE_SETTLE: Duration = Duration::from_secs(5);

pub struct NetworkConfigurator<M, H> {
    modem: Arc<M>,
    host: Arc<H>,
}

impl<M: ModemControl, H: HostOps> NetworkConfigurator<M, H> {
    pub fn new(modem: Arc<M>, host: Arc<H>) -> Self {
        Self { modem, host }
    }

    /// Read the session's assigned addressing and apply it to the host.
    ///
    /// The session must report connected. Every step here is all-or-nothing:
    /// a read or route failure aborts the whole apply, and the caller falls
    /// back into the reconnect loop rather than running half-configured.
    pub async fn apply(&self, profile: &ModemProfile) -> anyhow::Result<NetworkConfig> {
        let state = self
            .modem
            .session_state(profile.index)
            .await
            .context("failed to query session state")?;
        if state != SessionState::Connected {
            anyhow::bail!("cannot configure network: session is {}", state);
        }

        let family = self
            .modem
            .address_family(profile.index)
            .await
            .context("failed to determine session address family")?;

        let assignment = self
            .modem
            .ip_assignment(profile.index, family)
            .await
            .with_context(|| format!("failed to read {} assignment", family))?;

        info!(
            "Session addressing: addr={} gw={} dns1={} dns2={}",
            assignment.address,
            assignment.gateway,
            assignment.dns1,
            assignment
                .dns2
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string()),
        );

        tokio::time::sleep(ROUTE_SETTLE).await;

        self.host
            .install_default_route(family, assignment.gateway)
            .await
            .with_context(|| format!("failed to install default route via {}", assignment.gateway))?;

        let contents = render_resolv_conf(assignment.dns1, assignment.dns2);
        self.host
            .write_resolver(&contents)
            .await
            .context("failed to write resolver configuration")?;

        Ok(NetworkConfig {
            family,
            address: assignment.address,
            gateway: assignment.gateway,
            dns1: assignment.dns1,
            dns2: assignment.dns2,
        })
    }
}

/// Render the resolver file: one `nameserver` line per configured server,
/// dns1 first, dns2 omitted when the network didn't hand one out.
pub fn render_resolv_conf(dns1: std::net::IpAddr, dns2: Option<std::net::IpAddr>) -> String {
    let mut contents = format!("nameserver {}\n", dns1);
    if let Some(dns2) = dns2 {
        contents.push_str(&format!("nameserver {}\n", dns2));
    }
    contents
}
