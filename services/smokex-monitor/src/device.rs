//! Smoke X receiver HTTP API client

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::io::{HttpClient, HttpResponse};
use crate::settings::{DeviceCommand, MqttConfig, PairingStatus, RfParams, WlanConfig};
use crate::telemetry::{self, DeviceStatus, ProbeSamples};
use crate::{MonitorError, Result};

/// The receiver's HTTP API
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait DeviceApi: Send + Sync {
    /// `GET /status`
    async fn status(&self) -> Result<DeviceStatus>;

    /// `GET /data`
    async fn data(&self) -> Result<ProbeSamples>;

    async fn wlan_config(&self) -> Result<WlanConfig>;

    async fn set_wlan_config(&self, config: &WlanConfig) -> Result<()>;

    async fn mqtt_config(&self) -> Result<MqttConfig>;

    async fn set_mqtt_config(&self, config: &MqttConfig) -> Result<()>;

    async fn rf_params(&self) -> Result<RfParams>;

    async fn set_rf_params(&self, params: &RfParams) -> Result<()>;

    async fn pairing_status(&self) -> Result<PairingStatus>;

    async fn send_command(&self, command: &DeviceCommand) -> Result<()>;
}

/// [`DeviceApi`] over any [`HttpClient`], real or fixture-backed
pub struct HttpDeviceApi {
    base_url: String,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for HttpDeviceApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpDeviceApi")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl HttpDeviceApi {
    pub fn new(base_url: &str, http: Arc<dyn HttpClient>) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        tracing::debug!("Created HttpDeviceApi at {}", base_url);
        Self { base_url, http }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_body(&self, path: &str) -> Result<String> {
        let response = self.http.get(&self.url(path)).await?;
        check_status(response).map(|r| r.body)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let body = self.get_body(path).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn post_json<T: Serialize + Sync>(&self, path: &str, value: &T) -> Result<()> {
        let body = serde_json::to_string(value)?;
        let response = self.http.post_json(&self.url(path), &body).await?;
        check_status(response)?;
        Ok(())
    }
}

fn check_status(response: HttpResponse) -> Result<HttpResponse> {
    if !response.is_success() {
        return Err(MonitorError::Device {
            status: response.status,
            body: response.body,
        });
    }
    Ok(response)
}

#[async_trait]
impl DeviceApi for HttpDeviceApi {
    async fn status(&self) -> Result<DeviceStatus> {
        let body = self.get_body("/status").await?;
        telemetry::parse_status(&body)
    }

    async fn data(&self) -> Result<ProbeSamples> {
        let body = self.get_body("/data").await?;
        telemetry::parse_data(&body)
    }

    async fn wlan_config(&self) -> Result<WlanConfig> {
        self.get_json("/wlan-config").await
    }

    async fn set_wlan_config(&self, config: &WlanConfig) -> Result<()> {
        config.validate()?;
        tracing::info!("Updating WLAN config (ssid '{}')", config.ssid);
        self.post_json("/wlan-config", config).await
    }

    async fn mqtt_config(&self) -> Result<MqttConfig> {
        self.get_json("/mqtt-config").await
    }

    async fn set_mqtt_config(&self, config: &MqttConfig) -> Result<()> {
        config.validate()?;
        tracing::info!("Updating MQTT config (uri '{}')", config.uri);
        self.post_json("/mqtt-config", config).await
    }

    async fn rf_params(&self) -> Result<RfParams> {
        self.get_json("/rf-params").await
    }

    async fn set_rf_params(&self, params: &RfParams) -> Result<()> {
        params.validate()?;
        tracing::info!("Updating RF params ({} Hz)", params.frequency);
        self.post_json("/rf-params", params).await
    }

    async fn pairing_status(&self) -> Result<PairingStatus> {
        self.get_json("/pairing-status").await
    }

    async fn send_command(&self, command: &DeviceCommand) -> Result<()> {
        tracing::info!("Sending command {:?}", command);
        self.post_json("/cmd", command).await
    }
}
