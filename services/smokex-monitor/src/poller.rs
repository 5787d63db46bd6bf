//! One fetch cycle against the receiver: `/status` then `/data`

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::device::DeviceApi;
use crate::telemetry::{DeviceStatus, ProbeSamples};
use crate::MonitorError;

/// Why a poll produced no usable data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FetchFailure {
    Timeout(String),
    NetworkError(String),
    MalformedResponse(String),
}

impl From<&MonitorError> for FetchFailure {
    fn from(err: &MonitorError) -> Self {
        let detail = err.to_string();
        match err {
            MonitorError::Timeout(_) => FetchFailure::Timeout(detail),
            MonitorError::Json(_) | MonitorError::MalformedResponse(_) => {
                FetchFailure::MalformedResponse(detail)
            }
            MonitorError::Http(_)
            | MonitorError::Device { .. }
            | MonitorError::Io(_)
            | MonitorError::Config(_)
            | MonitorError::InvalidValue(_) => FetchFailure::NetworkError(detail),
        }
    }
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchFailure::Timeout(d) => write!(f, "timeout ({})", d),
            FetchFailure::NetworkError(d) => write!(f, "network error ({})", d),
            FetchFailure::MalformedResponse(d) => write!(f, "malformed response ({})", d),
        }
    }
}

/// Outcome of a single poll
#[derive(Debug, Clone, PartialEq)]
pub enum PollResult {
    Success {
        status: DeviceStatus,
        samples: ProbeSamples,
    },
    Failure(FetchFailure),
}

/// Identity of one fetch-reduce-merge pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollCycle {
    pub id: u64,
    pub started_epoch_ms: u64,
}

/// Fetches fresh telemetry from the receiver
pub struct Poller {
    api: Arc<dyn DeviceApi>,
}

impl Poller {
    pub fn new(api: Arc<dyn DeviceApi>) -> Self {
        Self { api }
    }

    /// Run one fetch. Either endpoint failing fails the whole poll.
    pub async fn poll(&self) -> PollResult {
        let status = match self.api.status().await {
            Ok(status) => status,
            Err(e) => return failed("/status", &e),
        };

        let samples = match self.api.data().await {
            Ok(samples) => samples,
            Err(e) => return failed("/data", &e),
        };

        tracing::debug!(
            "Polled {} probe(s), {} sample(s) reported",
            status.num_probes,
            samples.len()
        );
        PollResult::Success { status, samples }
    }
}

fn failed(endpoint: &str, err: &MonitorError) -> PollResult {
    let failure = FetchFailure::from(err);
    tracing::debug!("Poll of {} failed: {}", endpoint, failure);
    PollResult::Failure(failure)
}
