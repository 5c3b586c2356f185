//! Data session manager: owns the one packet-data profile and drives its
//! lifecycle on the modem.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{error, info};

use super::{ModemControl, ModemProfile, SessionState};

/// Settle time between modem configuration steps. Issuing the calls
/// back-to-back makes the modem drivers either not work at all or
/// misbehave, so every step waits this long before the next one. Hardware
/// constraint, do not tune away.
pub const MODEM_SETTLE: Duration = Duration::from_secs(2);

pub struct SessionManager<M> {
    modem: Arc<M>,
    profile: ModemProfile,
}

impl<M: ModemControl> SessionManager<M> {
    pub fn new(modem: Arc<M>, profile: ModemProfile) -> Self {
        Self { modem, profile }
    }

    pub fn profile(&self) -> &ModemProfile {
        &self.profile
    }

    /// Re-query the session state from the modem. Never cached: the state
    /// can change asynchronously underneath us.
    pub async fn state(&self) -> anyhow::Result<SessionState> {
        self.modem.session_state(self.profile.index).await
    }

    /// Stop the session if it is in use. A failing stop leaves a
    /// half-torn-down session that nothing can recover from short of a
    /// process restart, so the error is propagated as fatal by the caller.
    pub async fn stop_if_active(&self) -> anyhow::Result<()> {
        let state = self.state().await?;
        if state != SessionState::Disconnected {
            info!("Session {}, disconnect", state);
            self.modem
                .stop_session(self.profile.index)
                .await
                .context("failed to stop active session")?;
        }
        Ok(())
    }

    /// Configure bearer type then APN, with the mandatory settle delay
    /// between the steps.
    pub async fn configure(&self) -> anyhow::Result<()> {
        self.modem
            .set_bearer(self.profile.index, self.profile.bearer)
            .await
            .context("failed to set bearer type")?;

        tokio::time::sleep(MODEM_SETTLE).await;

        self.modem
            .set_apn(self.profile.index, &self.profile.apn)
            .await
            .with_context(|| format!("failed to set APN {:?}", self.profile.apn))?;

        tokio::time::sleep(MODEM_SETTLE).await;
        Ok(())
    }

    /// Start the session. On failure the session is stopped again so a
    /// half-started session is never left behind; on success the byte
    /// counters are reset so traffic accounting starts from this session.
    pub async fn start(&self) -> anyhow::Result<()> {
        info!("Connect");
        let result = self.modem.start_session(self.profile.index).await;

        tokio::time::sleep(MODEM_SETTLE).await;

        match result {
            Ok(()) => {
                self.modem
                    .reset_byte_counter()
                    .await
                    .context("failed to reset session byte counter")?;
                Ok(())
            }
            Err(e) => {
                error!("Couldn't start session: {:#}", e);
                if let Err(stop_err) = self.modem.stop_session(self.profile.index).await {
                    error!("Stop after failed start also failed: {:#}", stop_err);
                }
                Err(e.context("session start failed"))
            }
        }
    }
}
