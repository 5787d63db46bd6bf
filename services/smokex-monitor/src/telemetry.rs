//! Device telemetry model and parsing of the `/status` and `/data` payloads

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{MonitorError, Result};

/// Largest probe count any receiver model reports (X4)
pub const MAX_PROBES: u8 = 4;

/// 1-based probe channel number
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProbeId(u8);

impl ProbeId {
    /// Returns `None` for channel 0, which no device uses
    pub fn new(id: u8) -> Option<Self> {
        (id >= 1).then_some(Self(id))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// All probe ids a device declaring `num_probes` channels reports
    pub fn range(num_probes: u8) -> impl Iterator<Item = ProbeId> {
        (1..=num_probes).map(ProbeId)
    }
}

impl fmt::Display for ProbeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "probe {}", self.0)
    }
}

/// Snapshot of the device status endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceStatus {
    pub wifi_connected: bool,
    pub paired: bool,
    pub num_probes: u8,
    pub billows_active: bool,
    pub billows_target: Option<f64>,
}

/// One probe's reading as reported by the data endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeSample {
    pub probe_id: ProbeId,
    pub current_temp: f64,
    pub alarm_max: f64,
    pub alarm_min: f64,
    /// Device-side rolling window, oldest first. Sensor faults are NaN.
    pub history: Vec<f64>,
}

/// Probe samples keyed by channel, as decoded from one `/data` response
pub type ProbeSamples = BTreeMap<ProbeId, ProbeSample>;

#[derive(Debug, Deserialize)]
struct StatusPayload {
    wifi: u8,
    paired: bool,
    num_probes: u8,
    billows: bool,
    #[serde(default)]
    billows_target: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ProbePayload {
    current_temp: Option<f64>,
    alarm_max: f64,
    alarm_min: f64,
    history: Vec<Option<f64>>,
}

/// Decode the body of `GET /status`
pub fn parse_status(body: &str) -> Result<DeviceStatus> {
    let payload: StatusPayload = serde_json::from_str(body)?;

    let wifi_connected = match payload.wifi {
        0 => false,
        1 => true,
        other => {
            return Err(MonitorError::MalformedResponse(format!(
                "wifi flag must be 0 or 1, got {}",
                other
            )))
        }
    };

    if payload.num_probes > MAX_PROBES {
        return Err(MonitorError::MalformedResponse(format!(
            "num_probes {} exceeds {}",
            payload.num_probes, MAX_PROBES
        )));
    }

    Ok(DeviceStatus {
        wifi_connected,
        paired: payload.paired,
        num_probes: payload.num_probes,
        billows_active: payload.billows,
        billows_target: payload.billows_target,
    })
}

/// Decode the body of `GET /data`.
///
/// Any probe entry that does not match the schema fails the whole payload.
/// Keys other than `probe_<n>` and `billows` are ignored.
pub fn parse_data(body: &str) -> Result<ProbeSamples> {
    let root: serde_json::Map<String, serde_json::Value> = serde_json::from_str(body)?;

    match root.get("billows") {
        Some(serde_json::Value::Bool(_)) => {}
        Some(other) => {
            return Err(MonitorError::MalformedResponse(format!(
                "billows must be a boolean, got {}",
                other
            )))
        }
        None => {
            return Err(MonitorError::MalformedResponse(
                "missing billows flag".to_string(),
            ))
        }
    }

    let mut samples = ProbeSamples::new();
    for (key, value) in &root {
        let Some(suffix) = key.strip_prefix("probe_") else {
            if key != "billows" {
                tracing::debug!("Ignoring unknown data key '{}'", key);
            }
            continue;
        };

        // Only canonical suffixes, so `probe_01` or `probe_+1` cannot alias `probe_1`
        let probe_id = suffix
            .parse::<u8>()
            .ok()
            .and_then(ProbeId::new)
            .filter(|id| id.get().to_string() == suffix)
            .ok_or_else(|| MonitorError::MalformedResponse(format!("bad probe key '{}'", key)))?;

        let payload = ProbePayload::deserialize(value).map_err(|e| {
            MonitorError::MalformedResponse(format!("{}: {}", key, e))
        })?;

        // NaN thresholds fail this comparison as well
        let ordered = payload.alarm_min <= payload.alarm_max;
        if !ordered {
            return Err(MonitorError::MalformedResponse(format!(
                "{}: alarm_min {} above alarm_max {}",
                key, payload.alarm_min, payload.alarm_max
            )));
        }

        let previous = samples.insert(
            probe_id,
            ProbeSample {
                probe_id,
                current_temp: payload.current_temp.unwrap_or(f64::NAN),
                alarm_max: payload.alarm_max,
                alarm_min: payload.alarm_min,
                history: payload
                    .history
                    .into_iter()
                    .map(|v| v.unwrap_or(f64::NAN))
                    .collect(),
            },
        );
        if previous.is_some() {
            return Err(MonitorError::MalformedResponse(format!(
                "{} reported twice",
                probe_id
            )));
        }
    }

    Ok(samples)
}
