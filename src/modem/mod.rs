//! Modem-side types and the control-plane capability seam.
//!
//! Everything the supervisor needs from the cellular modem goes through the
//! [`ModemControl`] trait: radio power, the packet-data session on one
//! profile, and the addressing the network gave us. The production
//! implementation lives in [`crate::platform::qmi`]; tests substitute fakes.

pub mod power;
pub mod session;
#[cfg(test)]
pub mod testutil;

use std::fmt;
use std::net::IpAddr;

use crate::net::AddressFamily;

/// PDP bearer type requested when configuring the data profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BearerType {
    Ipv4,
    Ipv6,
    Ipv4v6,
}

impl BearerType {
    /// Parse the config-file spelling ("ipv4" | "ipv6" | "ipv4v6").
    pub fn parse(s: &str) -> anyhow::Result<Self> {
        match s {
            "ipv4" => Ok(BearerType::Ipv4),
            "ipv6" => Ok(BearerType::Ipv6),
            "ipv4v6" => Ok(BearerType::Ipv4v6),
            other => Err(anyhow::anyhow!("unknown bearer type {:?}", other)),
        }
    }
}

impl fmt::Display for BearerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BearerType::Ipv4 => write!(f, "ipv4"),
            BearerType::Ipv6 => write!(f, "ipv6"),
            BearerType::Ipv4v6 => write!(f, "ipv4v6"),
        }
    }
}

/// Data session state as reported by the modem.
///
/// Always re-queried at each decision point; the modem can change this
/// underneath us (driver resets, network-side teardown), so nothing caches
/// it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Disconnected => write!(f, "disconnected"),
            SessionState::Connecting => write!(f, "connecting"),
            SessionState::Connected => write!(f, "connected"),
        }
    }
}

/// The one data profile this gateway uses. Immutable for the process
/// lifetime.
#[derive(Debug, Clone)]
pub struct ModemProfile {
    pub index: u8,
    pub bearer: BearerType,
    pub apn: String,
}

impl ModemProfile {
    pub fn from_config(cfg: &crate::config::ModemConfig) -> anyhow::Result<Self> {
        Ok(Self {
            index: cfg.profile_index,
            bearer: BearerType::parse(&cfg.bearer)?,
            apn: cfg.apn.clone(),
        })
    }
}

/// Addressing handed out by the network for a connected session.
#[derive(Debug, Clone)]
pub struct IpAssignment {
    pub address: IpAddr,
    pub gateway: IpAddr,
    pub dns1: IpAddr,
    pub dns2: Option<IpAddr>,
}

/// Control-plane operations on the cellular modem.
///
/// All methods re-query or act on the hardware; none cache. Errors are
/// reported as-is and classified by the caller (most are retried from the
/// top of the reconnect loop).
#[allow(async_fn_in_trait)]
pub trait ModemControl {
    async fn radio_powered(&self) -> anyhow::Result<bool>;
    async fn set_radio_power(&self, on: bool) -> anyhow::Result<()>;

    async fn session_state(&self, profile: u8) -> anyhow::Result<SessionState>;
    async fn set_bearer(&self, profile: u8, bearer: BearerType) -> anyhow::Result<()>;
    async fn set_apn(&self, profile: u8, apn: &str) -> anyhow::Result<()>;
    async fn start_session(&self, profile: u8) -> anyhow::Result<()>;
    async fn stop_session(&self, profile: u8) -> anyhow::Result<()>;

    /// Address family of the connected session. Errors when the modem
    /// cannot tell (the verifier then falls back to an IPv4 probe).
    async fn address_family(&self, profile: u8) -> anyhow::Result<AddressFamily>;
    async fn ip_assignment(&self, profile: u8, family: AddressFamily)
        -> anyhow::Result<IpAssignment>;

    /// Reset the session byte counters so traffic accounting starts from
    /// the new session.
    async fn reset_byte_counter(&self) -> anyhow::Result<()>;
}
