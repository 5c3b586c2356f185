//! Host-side network state: address families, the applied configuration,
//! and the capability seam for everything that mutates the host (routing
//! table, resolver file, ICMP probes, the VPN process).

pub mod configure;
pub mod probe;
#[cfg(test)]
pub mod testutil;

use std::fmt;
use std::net::IpAddr;
use std::path::Path;

/// IP address family of the active data session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressFamily {
    Ipv4,
    Ipv6,
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressFamily::Ipv4 => write!(f, "IPv4"),
            AddressFamily::Ipv6 => write!(f, "IPv6"),
        }
    }
}

/// The configuration applied to the host for one session. Transient: built
/// from the modem's report, applied, then dropped. Never persisted.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    pub family: AddressFamily,
    pub address: IpAddr,
    pub gateway: IpAddr,
    pub dns1: IpAddr,
    pub dns2: Option<IpAddr>,
}

/// Operations that mutate or observe the host system on behalf of the
/// supervisor. The production implementation shells out the same way the
/// stock gateway image does ([`crate::platform::host`]); tests record calls.
#[allow(async_fn_in_trait)]
pub trait HostOps {
    /// Install the default route via `gateway` in the family-appropriate
    /// route table. All-or-nothing: any failure aborts the whole network
    /// configuration.
    async fn install_default_route(
        &self,
        family: AddressFamily,
        gateway: IpAddr,
    ) -> anyhow::Result<()>;

    /// Overwrite the system resolver file with `contents`.
    async fn write_resolver(&self, contents: &str) -> anyhow::Result<()>;

    /// Send `count` ICMP echo requests to `target`; true iff the probe
    /// reports success.
    async fn ping(&self, target: IpAddr, count: u32) -> anyhow::Result<bool>;

    /// Launch the VPN tunnel process, fire-and-forget. Its supervision is
    /// somebody else's problem.
    async fn spawn_vpn(&self, config: &Path) -> anyhow::Result<()>;
}
