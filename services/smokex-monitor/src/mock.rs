//! Fixture-backed receiver for development without hardware
//!
//! [`FixtureHttpClient`] answers the same routes as the receiver firmware
//! from in-memory JSON, so it plugs in underneath
//! [`HttpDeviceApi`](crate::device::HttpDeviceApi) in place of the real
//! HTTP client. Configuration writes are kept and read back; `unpair` clears
//! the pairing like the firmware does.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::debug;

use crate::io::{HttpClient, HttpResponse};

/// Base URL the fixture device answers on
pub const FIXTURE_BASE_URL: &str = "http://fixture.local";

const PROBE_1_HISTORY: [f64; 102] = [
    70.1, 70.1, 70.1, 70.1, 70.2, 70.2, 70.2, 70.2, 70.2, 70.2, 70.4, 70.5, 70.5, 70.5,
    70.6, 70.7, 70.8, 70.9, 70.9, 70.9, 71.0, 71.0, 70.9, 70.9, 70.8, 70.7, 70.7, 70.7,
    70.7, 70.6, 70.6, 70.6, 70.5, 70.5, 70.5, 70.4, 70.5, 70.5, 70.4, 70.4, 70.4, 70.4,
    70.4, 70.4, 70.4, 70.4, 70.4, 70.4, 70.4, 70.4, 70.3, 70.3, 70.3, 70.2, 70.3, 70.3,
    70.2, 70.2, 70.2, 70.2, 70.2, 70.2, 70.2, 70.2, 70.2, 70.2, 70.2, 70.2, 70.2, 70.2,
    70.2, 71.3, 72.6, 70.0, 64.2, 71.7, 72.0, 72.0, 72.1, 72.5, 72.7, 73.2, 73.4, 74.2,
    74.0, 74.8, 74.9, 75.7, 76.3, 76.7, 77.4, 77.8, 78.7, 79.6, 79.8, 80.3, 80.9, 81.5,
    82.0, 82.8, 83.3, 84.0,
];

const PROBE_2_HISTORY: [f64; 102] = [
    70.1, 70.1, 70.0, 70.1, 70.1, 70.2, 70.2, 70.2, 70.2, 70.2, 70.3, 70.4, 70.4, 70.5,
    70.6, 70.7, 70.7, 70.7, 70.7, 70.9, 71.0, 70.9, 70.9, 70.8, 70.7, 70.7, 70.7, 70.7,
    70.6, 70.6, 70.5, 70.5, 70.5, 70.5, 70.5, 70.4, 70.4, 70.4, 70.4, 70.4, 70.4, 70.4,
    70.4, 70.4, 70.3, 70.4, 70.4, 70.3, 70.4, 70.3, 70.3, 70.3, 70.3, 70.2, 70.2, 70.2,
    70.2, 70.2, 70.2, 70.2, 70.2, 70.2, 70.2, 70.2, 70.2, 70.2, 70.2, 70.2, 70.2, 70.2,
    70.2, 72.2, 73.4, 73.9, 74.4, 74.1, 76.6, 80.7, 87.6, 96.9, 110.5, 126.1, 147.4, 168.9,
    183.1, 180.4, 179.8, 179.9, 180.3, 180.9, 181.5, 181.9, 182.1, 182.3, 182.3, 182.1,
    181.7, 181.3, 180.9, 180.4, 180.0, 179.4,
];

/// Simulated device state
#[derive(Debug)]
struct FixtureState {
    status: Value,
    data: Value,
    wlan: Value,
    mqtt: Value,
    rf: Value,
    pairing: Value,
}

impl Default for FixtureState {
    fn default() -> Self {
        Self {
            status: json!({
                "wifi": 1,
                "paired": true,
                "num_probes": 4,
                "probe1": 160.4,
                "probe2": 162.4,
                "probe3": 163.4,
                "probe4": 164.4,
                "billows": true,
                "billows_target": 225,
            }),
            data: json!({
                "probe_1": probe(84.0, &PROBE_1_HISTORY),
                "probe_2": probe(179.0, &PROBE_2_HISTORY),
                "probe_3": probe(70.0, &reversed(&PROBE_1_HISTORY)),
                "probe_4": probe(70.0, &reversed(&PROBE_2_HISTORY)),
                "billows": false,
            }),
            wlan: json!({
                "mode": 1,
                "authType": 5,
                "ssid": "fun_wifi_thing",
                "username": "a_username",
                "password": "a_password",
            }),
            mqtt: json!({
                "uri": "mqtt://your.mqtt.broker",
                "identity": "your_identity",
                "username": "your_username",
                "password": "your_password",
                "ca_cert": "-----BEGIN CERTIFICATE-----\nPaste Certificate Here\n-----END CERTIFICATE-----",
                "enabled": true,
                "ha_discovery": true,
                "ha_base_topic": "homeassistant",
                "ha_status_topic": "homeassistant/status",
                "ha_birth_payload": "online",
                "state_topic": "homeassistant/smoke-x/state",
            }),
            rf: json!({
                "frequency": 915_000_000,
                "txPower": 10,
                "bandwidth": 125_000,
                "spreadingFactor": 7,
                "codingRate": 5,
                "implicitHeader": false,
                "enableCRC": true,
                "messageLength": 20,
                "preambleLength": 10,
                "syncWord": 0x12,
            }),
            pairing: json!({
                "isPaired": true,
                "deviceId": "|ABC12",
                "currentFrequency": 915_000_000,
                "deviceModel": "X4",
            }),
        }
    }
}

fn reversed(history: &[f64]) -> Vec<f64> {
    history.iter().rev().copied().collect()
}

fn probe(current: f64, history: &[f64]) -> Value {
    json!({
        "current_temp": current,
        "alarm_max": 120,
        "alarm_min": 35,
        "history": history,
    })
}

fn respond(status: u16, body: impl Into<String>) -> HttpResponse {
    HttpResponse {
        status,
        body: body.into(),
    }
}

impl FixtureState {
    fn get(&self, path: &str) -> HttpResponse {
        let value = match path {
            "/status" => &self.status,
            "/data" => &self.data,
            "/wlan-config" => &self.wlan,
            "/mqtt-config" => &self.mqtt,
            "/rf-params" => &self.rf,
            "/pairing-status" => &self.pairing,
            _ => return respond(404, "Not Found"),
        };
        respond(200, value.to_string())
    }

    fn post(&mut self, path: &str, body: &str) -> HttpResponse {
        let parsed: Value = match serde_json::from_str(body) {
            Ok(v) => v,
            Err(_) => {
                debug!("Fixture: invalid JSON posted to {}", path);
                return respond(400, "Invalid JSON");
            }
        };

        let target = match path {
            "/wlan-config" => &mut self.wlan,
            "/mqtt-config" => &mut self.mqtt,
            "/rf-params" => &mut self.rf,
            "/cmd" => return self.command(&parsed),
            _ => return respond(404, "Not Found"),
        };
        *target = parsed;
        respond(200, "Post control value successfully")
    }

    fn command(&mut self, parsed: &Value) -> HttpResponse {
        let command = parsed["command"].as_str().unwrap_or_default();
        debug!("Fixture processing command '{}'", command);

        match command {
            "startTx" | "stopTx" | "startRx" | "stopRx" => {}
            "unpair" => {
                self.pairing["isPaired"] = json!(false);
                self.pairing["deviceId"] = json!("");
                self.pairing["currentFrequency"] = json!(0);
                self.status["paired"] = json!(false);
            }
            _ => return respond(400, "Unknown command received"),
        }
        respond(200, "Command successfully applied")
    }
}

/// [`HttpClient`] that serves the development fixtures
#[derive(Debug)]
pub struct FixtureHttpClient {
    state: Mutex<FixtureState>,
    delay: Duration,
}

impl FixtureHttpClient {
    /// Every response is held back by `delay`, like a slow receiver
    pub fn new(delay: Duration) -> Self {
        Self {
            state: Mutex::new(FixtureState::default()),
            delay,
        }
    }
}

fn path_of(url: &str) -> crate::Result<String> {
    let parsed = reqwest::Url::parse(url)
        .map_err(|e| crate::MonitorError::Http(format!("Invalid URL {}: {}", url, e)))?;
    Ok(parsed.path().to_string())
}

#[async_trait]
impl HttpClient for FixtureHttpClient {
    async fn get(&self, url: &str) -> crate::Result<HttpResponse> {
        let path = path_of(url)?;
        tokio::time::sleep(self.delay).await;
        Ok(self.state.lock().await.get(&path))
    }

    async fn post_json(&self, url: &str, body: &str) -> crate::Result<HttpResponse> {
        let path = path_of(url)?;
        tokio::time::sleep(self.delay).await;
        Ok(self.state.lock().await.post(&path, body))
    }
}
