//! Radio power controller: query before acting, so repeated calls with the
//! radio already in the target state touch no hardware.

use std::sync::Arc;
use tracing::info;

use super::ModemControl;

pub struct RadioPower<M> {
    modem: Arc<M>,
}

impl<M: ModemControl> RadioPower<M> {
    pub fn new(modem: Arc<M>) -> Self {
        Self { modem }
    }

    /// Power the radio on if it is not already.
    pub async fn ensure_on(&self) -> anyhow::Result<()> {
        if !self.modem.radio_powered().await? {
            info!("Turn radio ON");
            self.modem.set_radio_power(true).await?;
        }
        Ok(())
    }

    /// Power the radio off if it is not already.
    pub async fn ensure_off(&self) -> anyhow::Result<()> {
        if self.modem.radio_powered().await? {
            info!("Turn radio OFF");
            self.modem.set_radio_power(false).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modem::testutil::FakeModem;

    #[tokio::test]
    async fn ensure_on_is_idempotent() {
        let modem = Arc::new(FakeModem::new().powered(true));
        let power = RadioPower::new(modem.clone());

        power.ensure_on().await.unwrap();
        assert!(modem.calls().is_empty());
    }

    #[tokio::test]
    async fn ensure_on_powers_up_when_off() {
        let modem = Arc::new(FakeModem::new().powered(false));
        let power = RadioPower::new(modem.clone());

        power.ensure_on().await.unwrap();
        assert_eq!(modem.calls(), vec![crate::modem::testutil::Call::SetPower(true)]);
        assert!(modem.is_powered());
    }

    #[tokio::test]
    async fn ensure_off_is_idempotent() {
        let modem = Arc::new(FakeModem::new().powered(false));
        let power = RadioPower::new(modem.clone());

        power.ensure_off().await.unwrap();
        assert!(modem.calls().is_empty());
    }
}
