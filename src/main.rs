mod config;
mod modem;
mod net;
mod platform;
mod provision;
mod supervisor;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use modem::ModemProfile;
use platform::{host::ShellHost, led::LedClient, qmi::QmiModem, time::NtpdTimeSync};
use provision::AtProvisioner;
use supervisor::{Supervisor, SupervisorSettings};

#[derive(Parser)]
#[command(name = "wanlink")]
#[command(about = "Cellular WAN uplink supervisor for embedded gateways")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "wanlink.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = config::Config::load(&cli.config).unwrap_or_else(|e| {
        eprintln!("Warning: Failed to load config from {:?}: {}", cli.config, e);
        eprintln!("Using default configuration");
        config::Config::default()
    });

    // Initialize tracing/logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .init();

    info!("wanlink v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Profile {}: {} bearer, APN {}",
        config.modem.profile_index, config.modem.bearer, config.modem.apn
    );

    let profile = ModemProfile::from_config(&config.modem)?;
    let settings = SupervisorSettings::from_config(&config);

    let modem = Arc::new(QmiModem::new(config.modem.device.clone()));
    let host = Arc::new(ShellHost::new());
    let indicator = LedClient::new(&config.led);
    let time_sync = NtpdTimeSync::new();
    let provisioner = AtProvisioner::new(
        config.provisioning.serial_device.clone(),
        config.provisioning.polling_period_min,
    );

    let mut supervisor = Supervisor::new(
        modem, host, indicator, time_sync, provisioner, profile, settings,
    )?;

    // Runs for the process lifetime; returns only on an unrecoverable
    // hardware state.
    supervisor.run().await
}
