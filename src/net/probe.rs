//! Connectivity verifier: the ground-truth reachability check.
//!
//! Deliberately independent of the modem's own session reporting — the
//! modem can claim "connected" while the uplink is dead, so the supervisor
//! trusts this probe over the modem's status.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

use tracing::{error, info, warn};

use super::{AddressFamily, HostOps};

/// Echo requests per probe.
pub const PROBE_COUNT: u32 = 4;

/// Well-known public resolvers used as probe targets.
pub const PROBE_TARGET_V4: IpAddr = IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8));
pub const PROBE_TARGET_V6: IpAddr =
    IpAddr::V6(Ipv6Addr::new(0x2001, 0x4860, 0x4860, 0, 0, 0, 0, 0x8888));

pub struct ConnectivityVerifier<H> {
    host: Arc<H>,
}

impl<H: HostOps> ConnectivityVerifier<H> {
    pub fn new(host: Arc<H>) -> Self {
        Self { host }
    }

    /// Probe the uplink with ICMP echoes toward the family-appropriate
    /// public resolver. When the session family cannot be determined, fall
    /// back to the IPv4 probe.
    pub async fn probe(&self, family: Option<AddressFamily>) -> bool {
        let target = match family {
            Some(AddressFamily::Ipv4) => PROBE_TARGET_V4,
            Some(AddressFamily::Ipv6) => PROBE_TARGET_V6,
            None => {
                warn!("Couldn't get session type, assuming IPv4");
                PROBE_TARGET_V4
            }
        };

        match self.host.ping(target, PROBE_COUNT).await {
            Ok(true) => {
                info!("Probe of {} succeeded", target);
                true
            }
            Ok(false) => {
                error!("Probe of {} failed", target);
                false
            }
            Err(e) => {
                error!("Probe of {} could not run: {:#}", target, e);
                false
            }
        }
    }
}
