//! Serial AT control channel.
//!
//! Provisioning is a short, strictly sequential exchange on the supervisor's
//! single control flow, so the port I/O here is plain blocking `serialport`
//! reads with a per-command timeout.

use std::io::{Read, Write};
use std::time::Duration;

use anyhow::Context;
use tracing::trace;

use super::{AtChannel, AtResponse};

const BAUD_RATE: u32 = 115_200;
const RESPONSE_TIMEOUT: Duration = Duration::from_secs(5);

pub struct SerialAt {
    port: Box<dyn serialport::SerialPort>,
}

impl SerialAt {
    pub fn open(device: &str) -> anyhow::Result<Self> {
        let port = serialport::new(device, BAUD_RATE)
            .timeout(RESPONSE_TIMEOUT)
            .open()
            .with_context(|| format!("failed to open serial port {}", device))?;
        Ok(Self { port })
    }

    /// Read until a terminal response line shows up or the port times out.
    fn read_terminal(&mut self) -> anyhow::Result<AtResponse> {
        let mut collected = String::new();
        let mut buf = [0u8; 256];

        loop {
            let n = self
                .port
                .read(&mut buf)
                .context("timed out waiting for AT terminal response")?;
            collected.push_str(&String::from_utf8_lossy(&buf[..n]));

            for line in collected.lines() {
                let line = line.trim();
                if line == "OK" {
                    return Ok(AtResponse::Ok);
                }
                if line == "ERROR"
                    || line.starts_with("+CME ERROR")
                    || line.starts_with("+CMS ERROR")
                {
                    return Ok(AtResponse::Error(line.to_string()));
                }
            }
        }
    }
}

impl AtChannel for SerialAt {
    async fn exchange(&mut self, command: &str) -> anyhow::Result<AtResponse> {
        trace!("-> {}", command);
        self.port
            .write_all(command.as_bytes())
            .with_context(|| format!("failed to write AT command {:?}", command))?;
        self.port
            .write_all(b"\r")
            .context("failed to terminate AT command")?;
        self.port.flush().context("failed to flush AT command")?;

        let response = self.read_terminal()?;
        trace!("<- {:?}", response);
        Ok(response)
    }
}
