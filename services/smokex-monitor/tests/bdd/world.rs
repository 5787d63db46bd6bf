//! BDD test world for smokex-monitor

use std::sync::Arc;

use cucumber::World;
use smokex_monitor::device::HttpDeviceApi;
use smokex_monitor::poller::PollResult;
use smokex_monitor::reducer::ProbeStates;
use smokex_monitor::telemetry::{DeviceStatus, ProbeSamples};

#[derive(Debug, Default, World)]
pub struct SmokexWorld {
    // Reducer testing
    pub status: Option<DeviceStatus>,
    pub samples: ProbeSamples,
    pub view: ProbeStates,
    pub previous_view: Option<ProbeStates>,
    pub last_result: Option<PollResult>,

    // Series testing
    pub existing_series: Vec<f64>,
    pub incoming_series: Vec<f64>,
    pub merged_series: Option<Vec<f64>>,
    pub merge_capacity: usize,

    // Fixture receiver testing
    pub device: Option<Arc<HttpDeviceApi>>,
}
