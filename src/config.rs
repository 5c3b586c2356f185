use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub modem: ModemConfig,
    pub supervisor: SupervisorConfig,
    pub provisioning: ProvisioningConfig,
    pub vpn: VpnConfig,
    pub led: LedConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModemConfig {
    pub device: String,
    pub profile_index: u8,
    pub bearer: String,
    pub apn: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SupervisorConfig {
    /// Seconds to wait at each stage of the reconnect process. The last
    /// entry is long on purpose: a tight reconnect loop can mask a false
    /// negative and interfere with an OTA update in progress.
    pub backoff_secs: Vec<u64>,
    /// Period between two connectivity checks aka heartbeats.
    pub heartbeat_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProvisioningConfig {
    pub serial_device: String,
    pub polling_period_min: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VpnConfig {
    pub config: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LedConfig {
    pub helper: String,
    pub name: String,
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file {:?}: {}", path, e))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file: {}", e))?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            modem: ModemConfig {
                device: "/dev/cdc-wdm0".to_string(),
                profile_index: 1,
                bearer: "ipv4".to_string(),
                apn: "wireless.twilio.com".to_string(),
            },
            supervisor: SupervisorConfig {
                backoff_secs: vec![5, 15, 180],
                heartbeat_secs: 600,
            },
            provisioning: ProvisioningConfig {
                serial_device: "/dev/ttyAT".to_string(),
                polling_period_min: 15,
            },
            vpn: VpnConfig {
                config: "/home/root/client_hub.ovpn".to_string(),
            },
            led: LedConfig {
                helper: "ledshandler".to_string(),
                name: "RGB_D2".to_string(),
                red: 0x03,
                green: 0x00,
                blue: 0x36,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}
