//! Trusted-time gate. The system clock counts as trusted once one ntpd
//! one-shot has succeeded since process start; after that the answer stays
//! true for the process lifetime.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::info;

use super::run_status;
use crate::supervisor::TimeSync;

const NTPD_BIN: &str = "/usr/sbin/ntpd";
const NTP_SERVER: &str = "pool.ntp.org";

pub struct NtpdTimeSync {
    synced: AtomicBool,
}

impl NtpdTimeSync {
    pub fn new() -> Self {
        Self {
            synced: AtomicBool::new(false),
        }
    }
}

impl TimeSync for NtpdTimeSync {
    async fn is_synced(&self) -> bool {
        if self.synced.load(Ordering::Relaxed) {
            return true;
        }

        match run_status(NTPD_BIN, &["-d", "-q", "-n", "-p", NTP_SERVER]).await {
            Ok(true) => {
                info!("Time updated successfully");
                self.synced.store(true, Ordering::Relaxed);
                true
            }
            _ => false,
        }
    }
}
