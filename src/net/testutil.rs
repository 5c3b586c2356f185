//! Recording host-operations fake for unit tests.

use std::collections::VecDeque;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::{AddressFamily, HostOps};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    Route(AddressFamily, IpAddr),
    Resolver(String),
    Ping(IpAddr, u32),
    Vpn(PathBuf),
}

struct Inner {
    /// Scripted ping verdicts; once drained, `ping_default` applies.
    ping_results: VecDeque<bool>,
    ping_default: bool,
    fail_route: bool,
    log: Vec<HostCall>,
}

pub struct FakeHost {
    inner: Mutex<Inner>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                ping_results: VecDeque::new(),
                ping_default: true,
                fail_route: false,
                log: Vec::new(),
            }),
        }
    }

    pub fn ping_results(mut self, results: &[bool]) -> Self {
        self.inner.get_mut().unwrap().ping_results = results.iter().copied().collect();
        self
    }

    /// Ping verdict once the scripted results are drained.
    pub fn ping_default(mut self, ok: bool) -> Self {
        self.inner.get_mut().unwrap().ping_default = ok;
        self
    }

    pub fn fail_route(mut self) -> Self {
        self.inner.get_mut().unwrap().fail_route = true;
        self
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.inner.lock().unwrap().log.clone()
    }

    pub fn resolver_writes(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                HostCall::Resolver(contents) => Some(contents),
                _ => None,
            })
            .collect()
    }

    pub fn vpn_launches(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, HostCall::Vpn(_)))
            .count()
    }

    pub fn ping_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, HostCall::Ping(..)))
            .count()
    }
}

impl HostOps for FakeHost {
    async fn install_default_route(
        &self,
        family: AddressFamily,
        gateway: IpAddr,
    ) -> anyhow::Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.log.push(HostCall::Route(family, gateway));
        if inner.fail_route {
            Err(anyhow::anyhow!("route install failed"))
        } else {
            Ok(())
        }
    }

    async fn write_resolver(&self, contents: &str) -> anyhow::Result<()> {
        self.inner
            .lock()
            .unwrap()
            .log
            .push(HostCall::Resolver(contents.to_string()));
        Ok(())
    }

    async fn ping(&self, target: IpAddr, count: u32) -> anyhow::Result<bool> {
        let mut inner = self.inner.lock().unwrap();
        inner.log.push(HostCall::Ping(target, count));
        let default = inner.ping_default;
        Ok(inner.ping_results.pop_front().unwrap_or(default))
    }

    async fn spawn_vpn(&self, config: &Path) -> anyhow::Result<()> {
        self.inner
            .lock()
            .unwrap()
            .log
            .push(HostCall::Vpn(config.to_path_buf()));
        Ok(())
    }
}
