//! Local print agent client.
//!
//! The agent is a small HTTP service on the workstation that forwards raw
//! command scripts to a connected label printer.

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use hazard_label::LabelError;
use serde::{Deserialize, Serialize};

/// Default agent endpoint.
pub const DEFAULT_AGENT_ADDR: ([u8; 4], u16) = ([127, 0, 0, 1], 9100);
/// Upper bound for agent detection so the simulation fallback stays reachable.
pub const DEFAULT_DETECT_TIMEOUT: Duration = Duration::from_millis(750);

/// Printer reported by the agent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AgentDevice {
    pub name: String,
    pub uid: String,
    pub connection: String,
    pub device_type: String,
    pub provider: String,
    pub manufacturer: String,
}

/// A channel that can deliver a command script to a physical printer.
pub trait PrintAgent {
    /// Default printer, or `None` when no agent answers.
    fn detect(&self) -> impl Future<Output = Option<AgentDevice>> + Send;

    /// Sends `script` to `device` once. Failures are not retried.
    fn send(
        &self,
        device: &AgentDevice,
        script: &str,
    ) -> impl Future<Output = Result<(), LabelError>> + Send;
}

/// Agent that never answers. Thermal jobs always fall back to simulation.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoAgent;

impl PrintAgent for NoAgent {
    async fn detect(&self) -> Option<AgentDevice> {
        None
    }

    async fn send(&self, _device: &AgentDevice, _script: &str) -> Result<(), LabelError> {
        Err(LabelError::DeviceCommunicationFailure {
            message: "no print agent configured".to_string(),
        })
    }
}

/// HTTP client for the workstation print agent.
#[derive(Clone, Debug)]
pub struct BrowserPrintAgent {
    addr: SocketAddr,
    detect_timeout: Duration,
    http: reqwest::Client,
}

impl Default for BrowserPrintAgent {
    fn default() -> Self {
        Self::new(SocketAddr::from(DEFAULT_AGENT_ADDR))
    }
}

impl BrowserPrintAgent {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            detect_timeout: DEFAULT_DETECT_TIMEOUT,
            http: reqwest::Client::new(),
        }
    }

    pub fn with_detect_timeout(mut self, timeout: Duration) -> Self {
        self.detect_timeout = timeout;
        self
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn default_printer(&self) -> Result<AgentDevice, reqwest::Error> {
        self.http
            .get(self.url("/default?type=printer"))
            .timeout(self.detect_timeout)
            .send()
            .await?
            .error_for_status()?
            .json::<AgentDevice>()
            .await
    }
}

#[derive(Serialize)]
struct WriteRequest<'a> {
    device: &'a AgentDevice,
    data: &'a str,
}

impl PrintAgent for BrowserPrintAgent {
    async fn detect(&self) -> Option<AgentDevice> {
        match self.default_printer().await {
            Ok(device) => {
                log::debug!("print agent at {} reports '{}'", self.addr, device.name);
                Some(device)
            }
            Err(err) if err.is_timeout() => {
                log::debug!("print agent at {} timed out", self.addr);
                None
            }
            Err(err) => {
                log::debug!("print agent at {} unavailable: {}", self.addr, err);
                None
            }
        }
    }

    async fn send(&self, device: &AgentDevice, script: &str) -> Result<(), LabelError> {
        let response = self
            .http
            .post(self.url("/write"))
            .json(&WriteRequest {
                device,
                data: script,
            })
            .send()
            .await
            .map_err(|e| LabelError::DeviceCommunicationFailure {
                message: e.to_string(),
            })?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LabelError::DeviceCommunicationFailure {
                message: format!("agent rejected write ({}): {}", status, body.trim()),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_json_uses_agent_field_names() {
        let device: AgentDevice = serde_json::from_str(
            r#"{"deviceType":"printer","uid":"usb-1","name":"ZD421","connection":"usb"}"#,
        )
        .expect("device json should parse");
        assert_eq!(device.device_type, "printer");
        assert_eq!(device.uid, "usb-1");
        assert!(device.provider.is_empty());
    }

    #[tokio::test]
    async fn closed_port_means_no_agent() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind should pass");
        let addr = listener.local_addr().expect("local addr should pass");
        drop(listener);
        let agent = BrowserPrintAgent::new(addr).with_detect_timeout(Duration::from_millis(200));
        assert_eq!(agent.detect().await, None);
    }
}
