use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::common::SmsPort;

pub const DEFAULT_CONFIG_PATH: &str = "config/sms.json";
/// UDP port the loopback relay listens on.
pub const DEFAULT_RELAY_PORT: u16 = 0x5345;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Phone number written into the source field of outbound datagrams.
    pub local_address: String,
    /// Where the relay lives, `host:port`.
    pub relay_addr: String,
    /// Local socket for the client side.
    pub bind_addr: String,
    /// SMS port the session sends on and listens to.
    pub port: SmsPort,
    /// Port used by the `relay` subcommand.
    pub relay_port: u16,
    /// Use the in-process loopback transport instead of UDP.
    pub offline: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            local_address: "5550100".to_string(),
            relay_addr: format!("127.0.0.1:{DEFAULT_RELAY_PORT}"),
            bind_addr: "0.0.0.0:0".to_string(),
            port: SmsPort::default(),
            relay_port: DEFAULT_RELAY_PORT,
            offline: false,
        }
    }
}

impl AppConfig {
    /// Override fields from `SMS_LOCAL_ADDRESS`, `SMS_RELAY_ADDR` and `SMS_PORT`.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(address) = lookup("SMS_LOCAL_ADDRESS") {
            self.local_address = address;
        }
        if let Some(relay) = lookup("SMS_RELAY_ADDR") {
            self.relay_addr = relay;
        }
        if let Some(port) = lookup("SMS_PORT") {
            match port.parse() {
                Ok(port) => self.port = port,
                Err(err) => log::warn!("Ignoring SMS_PORT: {err}"),
            }
        }
    }
}

pub fn load_config(path: &str) -> AppConfig {
    let path = Path::new(path);
    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<AppConfig>(&content) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("Failed to parse config file {}: {err}", path.display());
                AppConfig::default()
            }
        },
        Err(err) => {
            log::info!(
                "Config file {} not found ({err}); using defaults",
                path.display()
            );
            AppConfig::default()
        }
    }
}

pub fn save_config(path: &str, config: &AppConfig) -> std::io::Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(config)?;
    fs::write(path, json)
}
