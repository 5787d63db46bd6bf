//! Configuration types for the smokex-monitor service

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::units::TemperatureUnit;
use crate::MonitorError;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

impl Config {
    pub fn validate(&self) -> crate::Result<()> {
        if self.polling.interval_seconds == 0 {
            return Err(MonitorError::Config(
                "polling.interval_seconds must be greater than zero".to_string(),
            ));
        }
        if self.polling.offline_after_failures == 0 {
            return Err(MonitorError::Config(
                "polling.offline_after_failures must be at least 1".to_string(),
            ));
        }
        if let DeviceConfig::Http {
            base_url,
            timeout_seconds,
        } = &self.device
        {
            if base_url.is_empty() {
                return Err(MonitorError::Config(
                    "device.base_url must not be empty".to_string(),
                ));
            }
            if *timeout_seconds == 0 {
                return Err(MonitorError::Config(
                    "device.timeout_seconds must be greater than zero".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Where telemetry comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DeviceConfig {
    /// A receiver reachable over HTTP
    #[serde(rename = "http")]
    Http {
        #[serde(default = "default_base_url")]
        base_url: String,
        #[serde(default = "default_timeout")]
        timeout_seconds: u64,
    },
    /// Canned fixture payloads, for running without hardware
    #[serde(rename = "mock")]
    Mock {
        #[serde(default = "default_mock_delay")]
        delay_ms: u64,
    },
}

impl DeviceConfig {
    /// Switch to the fixture device, keeping an already configured delay
    pub fn into_mock(self) -> Self {
        match self {
            DeviceConfig::Mock { .. } => self,
            DeviceConfig::Http { .. } => DeviceConfig::Mock {
                delay_ms: default_mock_delay(),
            },
        }
    }

    /// Point at a receiver, keeping an already configured timeout
    pub fn with_base_url(self, base_url: String) -> Self {
        let timeout_seconds = match self {
            DeviceConfig::Http {
                timeout_seconds, ..
            } => timeout_seconds,
            DeviceConfig::Mock { .. } => default_timeout(),
        };
        DeviceConfig::Http {
            base_url,
            timeout_seconds,
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        DeviceConfig::Http {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_interval")]
    pub interval_seconds: u64,
    /// Series points kept per probe
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    #[serde(default = "default_offline_after")]
    pub offline_after_failures: u32,
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_interval(),
            history_capacity: default_history_capacity(),
            offline_after_failures: default_offline_after(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default)]
    pub unit: TemperatureUnit,
}

/// Dashboard configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_dashboard_port")]
    pub port: u16,
    #[serde(default = "default_event_log_size")]
    pub event_log_size: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: default_dashboard_port(),
            event_log_size: default_event_log_size(),
        }
    }
}

fn default_base_url() -> String {
    "http://192.168.4.1".to_string()
}

fn default_timeout() -> u64 {
    5
}

fn default_mock_delay() -> u64 {
    500
}

fn default_interval() -> u64 {
    5
}

fn default_history_capacity() -> usize {
    100
}

fn default_offline_after() -> u32 {
    3
}

fn default_true() -> bool {
    true
}

fn default_dashboard_port() -> u16 {
    11120
}

fn default_event_log_size() -> usize {
    50
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        MonitorError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    config.validate()?;
    Ok(config)
}
