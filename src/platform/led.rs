//! Client for the external LED handler. The handler owns the LED driver;
//! this side only hands it (led, mode, color) commands.

use super::run_checked;
use crate::config::LedConfig;
use crate::supervisor::{Indicator, LedCommand, LedMode};

pub struct LedClient {
    helper: String,
}

impl LedClient {
    pub fn new(config: &LedConfig) -> Self {
        Self {
            helper: config.helper.clone(),
        }
    }
}

impl Indicator for LedClient {
    async fn indicate(&self, command: &LedCommand) -> anyhow::Result<()> {
        let mode = match command.mode {
            LedMode::Steady => "On",
            LedMode::Blink => "Blink",
        };
        let (red, green, blue) = command.rgb;
        run_checked(
            &self.helper,
            &[
                &command.name,
                mode,
                &red.to_string(),
                &green.to_string(),
                &blue.to_string(),
            ],
        )
        .await
    }
}
