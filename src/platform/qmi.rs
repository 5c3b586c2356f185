//! Modem control over QMI, driven through `qmicli` against the modem's
//! control device. The text output is stable key/value lines; the parse
//! helpers below pull single fields out of it.

use std::net::IpAddr;

use anyhow::Context;

use super::run_capture;
use crate::modem::{BearerType, IpAssignment, ModemControl, SessionState};
use crate::net::AddressFamily;

const QMICLI_BIN: &str = "qmicli";

pub struct QmiModem {
    device: String,
}

impl QmiModem {
    pub fn new(device: String) -> Self {
        Self { device }
    }

    async fn qmicli(&self, arg: &str) -> anyhow::Result<String> {
        run_capture(QMICLI_BIN, &["--device", &self.device, "--device-open-proxy", arg]).await
    }
}

impl ModemControl for QmiModem {
    async fn radio_powered(&self) -> anyhow::Result<bool> {
        let output = self.qmicli("--dms-get-operating-mode").await?;
        let mode = parse_field(&output, "Mode")
            .context("no operating mode in qmicli output")?;
        Ok(mode == "online")
    }

    async fn set_radio_power(&self, on: bool) -> anyhow::Result<()> {
        let arg = if on {
            "--dms-set-operating-mode=online"
        } else {
            "--dms-set-operating-mode=low-power"
        };
        self.qmicli(arg).await.map(|_| ())
    }

    async fn session_state(&self, _profile: u8) -> anyhow::Result<SessionState> {
        let output = self.qmicli("--wds-get-packet-service-status").await?;
        let status = parse_field(&output, "Connection status")
            .context("no connection status in qmicli output")?;
        match status {
            "connected" => Ok(SessionState::Connected),
            "connecting" | "authenticating" => Ok(SessionState::Connecting),
            _ => Ok(SessionState::Disconnected),
        }
    }

    async fn set_bearer(&self, profile: u8, bearer: BearerType) -> anyhow::Result<()> {
        let pdp_type = match bearer {
            BearerType::Ipv4 => "IP",
            BearerType::Ipv6 => "IPV6",
            BearerType::Ipv4v6 => "IPV4V6",
        };
        self.qmicli(&format!(
            "--wds-modify-profile=3gpp,{},pdp-type={}",
            profile, pdp_type
        ))
        .await
        .map(|_| ())
    }

    async fn set_apn(&self, profile: u8, apn: &str) -> anyhow::Result<()> {
        self.qmicli(&format!("--wds-modify-profile=3gpp,{},apn={}", profile, apn))
            .await
            .map(|_| ())
    }

    async fn start_session(&self, profile: u8) -> anyhow::Result<()> {
        self.qmicli(&format!(
            "--wds-start-network=3gpp-profile={},autoconnect=yes",
            profile
        ))
        .await
        .map(|_| ())
    }

    async fn stop_session(&self, _profile: u8) -> anyhow::Result<()> {
        self.qmicli("--wds-stop-network=disable-autoconnect")
            .await
            .map(|_| ())
    }

    async fn address_family(&self, _profile: u8) -> anyhow::Result<AddressFamily> {
        let output = self.qmicli("--wds-get-current-settings").await?;
        let family = parse_field(&output, "IP Family")
            .context("no IP family in qmicli output")?;
        match family {
            "IPv4" => Ok(AddressFamily::Ipv4),
            "IPv6" => Ok(AddressFamily::Ipv6),
            other => Err(anyhow::anyhow!("unrecognized IP family {:?}", other)),
        }
    }

    async fn ip_assignment(
        &self,
        _profile: u8,
        family: AddressFamily,
    ) -> anyhow::Result<IpAssignment> {
        let output = self.qmicli("--wds-get-current-settings").await?;
        parse_current_settings(&output, family)
    }

    async fn reset_byte_counter(&self) -> anyhow::Result<()> {
        self.qmicli("--wds-reset-packet-statistics").await.map(|_| ())
    }
}

/// Pull a `Key: value` (or `Key: 'value'`) field out of qmicli output.
fn parse_field<'a>(output: &'a str, key: &str) -> Option<&'a str> {
    output.lines().find_map(|line| {
        let line = line.trim();
        let rest = line.strip_prefix(key)?.trim_start().strip_prefix(':')?;
        Some(rest.trim().trim_matches('\''))
    })
}

fn parse_current_settings(output: &str, family: AddressFamily) -> anyhow::Result<IpAssignment> {
    let prefix = match family {
        AddressFamily::Ipv4 => "IPv4",
        AddressFamily::Ipv6 => "IPv6",
    };
    let get = |key: &str| -> anyhow::Result<IpAddr> {
        let field = format!("{} {}", prefix, key);
        let value = parse_field(output, &field)
            .with_context(|| format!("no {:?} in qmicli output", field))?;
        value
            .parse::<IpAddr>()
            .with_context(|| format!("bad {:?} address {:?}", field, value))
    };

    // The secondary DNS is optional; some networks hand out only one.
    let dns2 = parse_field(output, &format!("{} secondary DNS", prefix))
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse::<IpAddr>().ok());

    Ok(IpAssignment {
        address: get("address")?,
        gateway: get("gateway address")?,
        dns1: get("primary DNS")?,
        dns2,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CURRENT_SETTINGS: &str = "\
[/dev/cdc-wdm0] Current settings retrieved:
           IP Family: IPv4
        IPv4 address: 100.71.84.226
    IPv4 subnet mask: 255.255.255.240
IPv4 gateway address: 100.71.84.225
    IPv4 primary DNS: 10.177.0.34
  IPv4 secondary DNS: 10.177.0.210
                 MTU: 1500
             Domains: none
";

    #[test]
    fn parses_quoted_and_plain_fields() {
        let output = "[/dev/cdc-wdm0] Operating mode retrieved:\n\tMode: 'online'\n";
        assert_eq!(parse_field(output, "Mode"), Some("online"));
        assert_eq!(parse_field(CURRENT_SETTINGS, "IP Family"), Some("IPv4"));
        assert_eq!(parse_field(CURRENT_SETTINGS, "MTU"), Some("1500"));
        assert_eq!(parse_field(CURRENT_SETTINGS, "missing"), None);
    }

    #[test]
    fn parses_ipv4_assignment() {
        let assignment =
            parse_current_settings(CURRENT_SETTINGS, AddressFamily::Ipv4).unwrap();
        assert_eq!(assignment.address.to_string(), "100.71.84.226");
        assert_eq!(assignment.gateway.to_string(), "100.71.84.225");
        assert_eq!(assignment.dns1.to_string(), "10.177.0.34");
        assert_eq!(assignment.dns2.unwrap().to_string(), "10.177.0.210");
    }

    #[test]
    fn missing_secondary_dns_is_none() {
        let output = "\
    IP Family: IPv4
 IPv4 address: 10.0.0.2
IPv4 gateway address: 10.0.0.1
IPv4 primary DNS: 8.8.8.8
";
        let assignment = parse_current_settings(output, AddressFamily::Ipv4).unwrap();
        assert_eq!(assignment.dns2, None);
    }

    #[test]
    fn missing_gateway_is_an_error() {
        let output = "IP Family: IPv4\nIPv4 address: 10.0.0.2\n";
        assert!(parse_current_settings(output, AddressFamily::Ipv4).is_err());
    }
}
