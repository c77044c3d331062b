use serde::{Deserialize, Serialize};
use std::path::Path;

/// Server configuration.
///
/// `robot_name` is the model string every request header must carry; a
/// mismatch is answered with a no-matching-robot error. The port is fixed
/// per deployment; the connection manager binds it on every local address.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DcpServerConfig {
    pub robot_name: String,
    pub port: u16,
    pub dof: usize,
    /// Also serve on 127.0.0.1. Off in deployments where the loopback is
    /// reserved for the pendant bridge.
    pub bind_loopback: bool,
    /// Listener reconciliation tick.
    pub reconcile_interval_ms: u64,
    /// How long an in-flight request frame may stay incomplete before it is
    /// answered with a connection-timeout error.
    pub request_timeout_ms: u64,
    /// Bounded wait for one backend facade call.
    pub backend_timeout_ms: u64,
}

impl DcpServerConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.robot_name.is_empty() {
            return Err("Robot name cannot be empty.".to_string());
        }
        if self.robot_name.len() > dcp_protocol::frame::ROBOT_NAME_LEN {
            return Err(format!(
                "Robot name must fit in {} bytes.",
                dcp_protocol::frame::ROBOT_NAME_LEN
            ));
        }
        if self.port == 0 {
            return Err("Port number must be greater than 0.".to_string());
        }
        if self.dof == 0 || self.dof > 9 {
            return Err("DOF must be between 1 and 9.".to_string());
        }
        if self.request_timeout_ms == 0 || self.backend_timeout_ms == 0 {
            return Err("Timeouts must be greater than 0.".to_string());
        }
        Ok(())
    }

    /// Loads a configuration from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<DcpServerConfig, String> {
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|e| format!("could not read config file: {}", e))?;
        let config: DcpServerConfig =
            serde_json::from_str(&text).map_err(|e| format!("could not parse config: {}", e))?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for DcpServerConfig {
    fn default() -> Self {
        Self {
            robot_name: "NTX-ARM6".to_string(),
            port: 6066,
            dof: 6,
            bind_loopback: true,
            reconcile_interval_ms: 2000,
            request_timeout_ms: 10_000,
            backend_timeout_ms: 1000,
        }
    }
}
