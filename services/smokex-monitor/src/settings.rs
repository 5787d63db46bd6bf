//! Device configuration payloads: WLAN, MQTT, LoRa radio, pairing and commands
//!
//! Field names follow the device's JSON. Every `validate` mirrors the limits
//! the firmware enforces, so an out-of-range value is rejected before any
//! request leaves the host.

use serde::{Deserialize, Deserializer, Serialize};

use crate::{MonitorError, Result};

const WLAN_SSID_MAX: usize = 32;
const WLAN_USERNAME_MAX: usize = 128;
const WLAN_PASSWORD_MAX: usize = 64;

const MQTT_FIELD_MAX: usize = 128;
const MQTT_TOPIC_MAX: usize = 128;
const MQTT_CERT_MAX: usize = 4096;

const RF_FREQUENCY_HZ: (u32, u32) = (137_000_000, 1_020_000_000);
const RF_BANDWIDTH_HZ: (u32, u32) = (7_800, 500_000);
const RF_SPREADING_FACTOR: (u8, u8) = (6, 12);
const RF_TX_POWER: (u8, u8) = (2, 17);
const RF_CODING_RATE: (u8, u8) = (5, 8);
const RF_PREAMBLE: (u16, u16) = (6, u16::MAX);

/// WLAN station/AP settings (`/wlan-config`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WlanConfig {
    pub mode: u8,
    pub auth_type: u8,
    pub ssid: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl WlanConfig {
    pub fn validate(&self) -> Result<()> {
        check_len("ssid", &self.ssid, WLAN_SSID_MAX)?;
        check_len("username", &self.username, WLAN_USERNAME_MAX)?;
        check_len("password", &self.password, WLAN_PASSWORD_MAX)
    }
}

/// MQTT broker and Home Assistant discovery settings (`/mqtt-config`).
///
/// Older firmware omits the discovery fields, hence the struct-level default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    pub uri: String,
    pub identity: String,
    pub username: String,
    pub password: String,
    pub ca_cert: String,
    pub enabled: bool,
    pub ha_discovery: bool,
    pub ha_base_topic: String,
    pub ha_status_topic: String,
    pub ha_birth_payload: String,
    pub state_topic: String,
}

impl MqttConfig {
    pub fn validate(&self) -> Result<()> {
        check_len("uri", &self.uri, MQTT_FIELD_MAX)?;
        check_len("identity", &self.identity, MQTT_FIELD_MAX)?;
        check_len("username", &self.username, MQTT_FIELD_MAX)?;
        check_len("password", &self.password, MQTT_FIELD_MAX)?;
        check_len("ca_cert", &self.ca_cert, MQTT_CERT_MAX)?;
        check_len("ha_base_topic", &self.ha_base_topic, MQTT_TOPIC_MAX)?;
        check_len("ha_status_topic", &self.ha_status_topic, MQTT_TOPIC_MAX)?;
        check_len("ha_birth_payload", &self.ha_birth_payload, MQTT_TOPIC_MAX)?;
        check_len("state_topic", &self.state_topic, MQTT_TOPIC_MAX)
    }
}

/// LoRa radio parameters (`/rf-params`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RfParams {
    pub frequency: u32,
    pub tx_power: u8,
    pub bandwidth: u32,
    pub spreading_factor: u8,
    pub coding_rate: u8,
    pub implicit_header: bool,
    #[serde(rename = "enableCRC")]
    pub enable_crc: bool,
    pub message_length: u8,
    pub preamble_length: u16,
    pub sync_word: u8,
}

impl Default for RfParams {
    fn default() -> Self {
        Self {
            frequency: 910_500_000,
            tx_power: 12,
            bandwidth: 125_000,
            spreading_factor: 9,
            coding_rate: 5,
            implicit_header: false,
            enable_crc: true,
            message_length: 30,
            preamble_length: 10,
            sync_word: 0x12,
        }
    }
}

impl RfParams {
    pub fn validate(&self) -> Result<()> {
        check_range("frequency", self.frequency, RF_FREQUENCY_HZ)?;
        check_range("txPower", self.tx_power, RF_TX_POWER)?;
        check_range("bandwidth", self.bandwidth, RF_BANDWIDTH_HZ)?;
        check_range("spreadingFactor", self.spreading_factor, RF_SPREADING_FACTOR)?;
        check_range("codingRate", self.coding_rate, RF_CODING_RATE)?;
        check_range("preambleLength", self.preamble_length, RF_PREAMBLE)
    }
}

/// Pairing state of the receiver with its transmitter (`/pairing-status`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairingStatus {
    /// The firmware encodes this as 0/1, the development fixtures as a bool
    #[serde(deserialize_with = "bool_or_int")]
    pub is_paired: bool,
    pub device_id: String,
    pub current_frequency: u32,
    pub device_model: String,
}

/// Commands accepted by `/cmd`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum DeviceCommand {
    StartTx {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        #[serde(
            rename = "repeatInterval",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        repeat_interval_ms: Option<u32>,
    },
    StopTx,
    StartRx,
    StopRx,
    /// Forget the paired transmitter and listen for a new sync
    Unpair,
}

fn check_len(field: &str, value: &str, max: usize) -> Result<()> {
    if value.len() > max {
        return Err(MonitorError::InvalidValue(format!(
            "{} is {} bytes, limit is {}",
            field,
            value.len(),
            max
        )));
    }
    Ok(())
}

fn check_range<T>(field: &str, value: T, (min, max): (T, T)) -> Result<()>
where
    T: PartialOrd + std::fmt::Display,
{
    if value < min || value > max {
        return Err(MonitorError::InvalidValue(format!(
            "{} {} outside {}..={}",
            field, value, min, max
        )));
    }
    Ok(())
}

fn bool_or_int<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Int(i) => i != 0,
    })
}
