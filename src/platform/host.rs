//! Host network operations via the stock gateway commands: `route` for the
//! default route, a plain overwrite of `/etc/resolv.conf`, `ping`/`ping6`
//! for the reachability probe, and a detached `openvpn` for the tunnel.

use std::net::IpAddr;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::info;

use super::{run_checked, run_status};
use crate::net::{AddressFamily, HostOps};

const ROUTE_BIN: &str = "/sbin/route";
const RESOLV_CONF: &str = "/etc/resolv.conf";
const RESOLV_MODE: u32 = 0o644;

pub struct ShellHost {
    resolv_path: PathBuf,
}

impl ShellHost {
    pub fn new() -> Self {
        Self {
            resolv_path: PathBuf::from(RESOLV_CONF),
        }
    }
}

impl HostOps for ShellHost {
    async fn install_default_route(
        &self,
        family: AddressFamily,
        gateway: IpAddr,
    ) -> anyhow::Result<()> {
        let gateway = gateway.to_string();
        match family {
            AddressFamily::Ipv4 => {
                run_checked(ROUTE_BIN, &["add", "default", "gw", &gateway]).await
            }
            AddressFamily::Ipv6 => {
                run_checked(ROUTE_BIN, &["-A", "inet6", "add", "default", "gw", &gateway]).await
            }
        }
    }

    async fn write_resolver(&self, contents: &str) -> anyhow::Result<()> {
        use std::os::unix::fs::PermissionsExt;

        tokio::fs::write(&self.resolv_path, contents)
            .await
            .with_context(|| format!("failed to write {:?}", self.resolv_path))?;
        tokio::fs::set_permissions(
            &self.resolv_path,
            std::fs::Permissions::from_mode(RESOLV_MODE),
        )
        .await
        .with_context(|| format!("failed to chmod {:?}", self.resolv_path))?;
        Ok(())
    }

    async fn ping(&self, target: IpAddr, count: u32) -> anyhow::Result<bool> {
        let program = match target {
            IpAddr::V4(_) => "ping",
            IpAddr::V6(_) => "ping6",
        };
        run_status(program, &["-c", &count.to_string(), &target.to_string()]).await
    }

    async fn spawn_vpn(&self, config: &Path) -> anyhow::Result<()> {
        info!("Launching VPN tunnel with {:?}", config);
        tokio::process::Command::new("openvpn")
            .arg("--config")
            .arg(config)
            .spawn()
            .context("failed to spawn openvpn")?;
        Ok(())
    }
}
