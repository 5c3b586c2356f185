//! Scriptable in-memory modem for unit tests.

use std::collections::VecDeque;
use std::net::IpAddr;
use std::sync::Mutex;

use super::{BearerType, IpAssignment, ModemControl, SessionState};
use crate::net::AddressFamily;

/// Every hardware-touching call the fake saw, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    SetPower(bool),
    SetBearer(BearerType),
    SetApn(String),
    Start,
    Stop,
    ResetBytes,
}

struct Inner {
    powered: bool,
    session: SessionState,
    /// Scripted outcomes for `start_session`; once drained, `start_default`
    /// applies.
    start_results: VecDeque<bool>,
    start_default: bool,
    fail_stop: bool,
    family: Option<AddressFamily>,
    assignment: IpAssignment,
    log: Vec<Call>,
}

pub struct FakeModem {
    inner: Mutex<Inner>,
}

impl FakeModem {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                powered: false,
                session: SessionState::Disconnected,
                start_results: VecDeque::new(),
                start_default: true,
                fail_stop: false,
                family: Some(AddressFamily::Ipv4),
                assignment: IpAssignment {
                    address: "10.94.3.7".parse::<IpAddr>().unwrap(),
                    gateway: "10.94.3.1".parse::<IpAddr>().unwrap(),
                    dns1: "10.10.0.1".parse::<IpAddr>().unwrap(),
                    dns2: Some("10.10.0.2".parse::<IpAddr>().unwrap()),
                },
                log: Vec::new(),
            }),
        }
    }

    pub fn powered(mut self, on: bool) -> Self {
        self.inner.get_mut().unwrap().powered = on;
        self
    }

    pub fn session(mut self, state: SessionState) -> Self {
        self.inner.get_mut().unwrap().session = state;
        self
    }

    /// Script the next `start_session` outcomes (true = success).
    pub fn start_results(mut self, results: &[bool]) -> Self {
        self.inner.get_mut().unwrap().start_results = results.iter().copied().collect();
        self
    }

    /// Outcome of `start_session` once the scripted results are drained.
    pub fn start_default(mut self, ok: bool) -> Self {
        self.inner.get_mut().unwrap().start_default = ok;
        self
    }

    pub fn fail_stop(mut self) -> Self {
        self.inner.get_mut().unwrap().fail_stop = true;
        self
    }

    pub fn family(mut self, family: Option<AddressFamily>) -> Self {
        self.inner.get_mut().unwrap().family = family;
        self
    }

    pub fn assignment(mut self, assignment: IpAssignment) -> Self {
        self.inner.get_mut().unwrap().assignment = assignment;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.lock().unwrap().log.clone()
    }

    pub fn is_powered(&self) -> bool {
        self.inner.lock().unwrap().powered
    }
}

impl ModemControl for FakeModem {
    async fn radio_powered(&self) -> anyhow::Result<bool> {
        Ok(self.inner.lock().unwrap().powered)
    }

    async fn set_radio_power(&self, on: bool) -> anyhow::Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.powered = on;
        inner.log.push(Call::SetPower(on));
        Ok(())
    }

    async fn session_state(&self, _profile: u8) -> anyhow::Result<SessionState> {
        Ok(self.inner.lock().unwrap().session)
    }

    async fn set_bearer(&self, _profile: u8, bearer: BearerType) -> anyhow::Result<()> {
        self.inner.lock().unwrap().log.push(Call::SetBearer(bearer));
        Ok(())
    }

    async fn set_apn(&self, _profile: u8, apn: &str) -> anyhow::Result<()> {
        self.inner
            .lock()
            .unwrap()
            .log
            .push(Call::SetApn(apn.to_string()));
        Ok(())
    }

    async fn start_session(&self, _profile: u8) -> anyhow::Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.log.push(Call::Start);
        let default = inner.start_default;
        let ok = inner.start_results.pop_front().unwrap_or(default);
        if ok {
            inner.session = SessionState::Connected;
            Ok(())
        } else {
            Err(anyhow::anyhow!("start session rejected by network"))
        }
    }

    async fn stop_session(&self, _profile: u8) -> anyhow::Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.log.push(Call::Stop);
        if inner.fail_stop {
            Err(anyhow::anyhow!("stop session failed"))
        } else {
            inner.session = SessionState::Disconnected;
            Ok(())
        }
    }

    async fn address_family(&self, _profile: u8) -> anyhow::Result<AddressFamily> {
        self.inner
            .lock()
            .unwrap()
            .family
            .ok_or_else(|| anyhow::anyhow!("session type unavailable"))
    }

    async fn ip_assignment(
        &self,
        _profile: u8,
        _family: AddressFamily,
    ) -> anyhow::Result<IpAssignment> {
        Ok(self.inner.lock().unwrap().assignment.clone())
    }

    async fn reset_byte_counter(&self) -> anyhow::Result<()> {
        self.inner.lock().unwrap().log.push(Call::ResetBytes);
        Ok(())
    }
}
