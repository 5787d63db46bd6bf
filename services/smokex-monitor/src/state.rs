//! Shared state: the last committed poll cycle and the alarm event log

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::poller::{FetchFailure, PollCycle, PollResult};
use crate::reducer::{self, AlarmState, AlarmTransition, ProbeStates};
use crate::telemetry::{DeviceStatus, ProbeId};
use crate::units::TemperatureUnit;

/// How reachable the receiver has been lately
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connectivity {
    /// No poll has completed yet
    Connecting,
    Online,
    /// Recent polls failed; the data shown is the last known
    Stale,
    Offline,
}

impl fmt::Display for Connectivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Connectivity::Connecting => write!(f, "connecting"),
            Connectivity::Online => write!(f, "online"),
            Connectivity::Stale => write!(f, "stale"),
            Connectivity::Offline => write!(f, "offline"),
        }
    }
}

/// An alarm transition, stamped with the cycle that produced it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlarmEvent {
    pub cycle_id: u64,
    pub timestamp_epoch_ms: u64,
    pub probe_id: ProbeId,
    pub previous: AlarmState,
    pub current: AlarmState,
    pub current_temp: Option<f64>,
}

/// Shared state written by the poll loop and read by the dashboard
#[derive(Debug)]
pub struct SharedState {
    pub device: Option<DeviceStatus>,
    pub probes: ProbeStates,
    pub last_cycle: Option<PollCycle>,
    pub last_success_epoch_ms: Option<u64>,
    pub last_failure: Option<FetchFailure>,
    pub consecutive_failures: u32,
    pub offline_after_failures: u32,
    pub events: VecDeque<AlarmEvent>,
    pub event_log_size: usize,
    pub started_at: Instant,
}

impl SharedState {
    pub fn new(offline_after_failures: u32, event_log_size: usize) -> Self {
        Self {
            device: None,
            probes: ProbeStates::new(),
            last_cycle: None,
            last_success_epoch_ms: None,
            last_failure: None,
            consecutive_failures: 0,
            offline_after_failures,
            events: VecDeque::with_capacity(event_log_size),
            event_log_size,
            started_at: Instant::now(),
        }
    }

    /// Install one cycle's reduced probe states, returning the alarm
    /// transitions it caused. The previous map is replaced, never patched.
    pub fn commit(
        &mut self,
        cycle: PollCycle,
        result: &PollResult,
        probes: ProbeStates,
    ) -> Vec<AlarmTransition> {
        let changes = reducer::transitions(&self.probes, &probes);

        match result {
            PollResult::Success { status, .. } => {
                self.device = Some(status.clone());
                self.consecutive_failures = 0;
                self.last_success_epoch_ms = Some(cycle.started_epoch_ms);
            }
            PollResult::Failure(failure) => {
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                self.last_failure = Some(failure.clone());
            }
        }

        self.probes = probes;
        self.last_cycle = Some(cycle);

        for change in &changes {
            self.add_event(AlarmEvent {
                cycle_id: cycle.id,
                timestamp_epoch_ms: cycle.started_epoch_ms,
                probe_id: change.probe_id,
                previous: change.previous,
                current: change.current,
                current_temp: change.current_temp,
            });
        }

        changes
    }

    pub fn connectivity(&self) -> Connectivity {
        if self.consecutive_failures >= self.offline_after_failures {
            Connectivity::Offline
        } else if self.consecutive_failures > 0 {
            if self.last_success_epoch_ms.is_some() {
                Connectivity::Stale
            } else {
                Connectivity::Offline
            }
        } else if self.last_success_epoch_ms.is_some() {
            Connectivity::Online
        } else {
            Connectivity::Connecting
        }
    }

    fn add_event(&mut self, event: AlarmEvent) {
        if self.event_log_size == 0 {
            return;
        }
        if self.events.len() >= self.event_log_size {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    /// Read-only view for rendering, in the requested unit
    pub fn snapshot(&self, unit: TemperatureUnit) -> Snapshot {
        let convert = |v: f64| unit.convert(v);

        Snapshot {
            cycle_id: self.last_cycle.map(|c| c.id),
            last_poll_epoch_ms: self.last_cycle.map(|c| c.started_epoch_ms),
            last_success_epoch_ms: self.last_success_epoch_ms,
            connectivity: self.connectivity(),
            consecutive_failures: self.consecutive_failures,
            last_failure: self.last_failure.clone(),
            unit,
            device: self.device.clone().map(|d| DeviceStatus {
                billows_target: d.billows_target.map(convert),
                ..d
            }),
            probes: self
                .probes
                .values()
                .map(|p| ProbeView {
                    probe_id: p.probe_id,
                    alarm_state: p.alarm_state,
                    current_temp: p.current_temp.map(convert),
                    alarm_max: p.alarm_max.map(convert),
                    alarm_min: p.alarm_min.map(convert),
                    series: p.series.iter().copied().map(convert).collect(),
                })
                .collect(),
            uptime_seconds: self.started_at.elapsed().as_secs(),
        }
    }
}

/// One probe as the dashboard renders it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeView {
    pub probe_id: ProbeId,
    pub alarm_state: AlarmState,
    pub current_temp: Option<f64>,
    pub alarm_max: Option<f64>,
    pub alarm_min: Option<f64>,
    /// Sensor faults serialize as `null`
    pub series: Vec<f64>,
}

/// Everything the dashboard shows, taken from one committed cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub cycle_id: Option<u64>,
    pub last_poll_epoch_ms: Option<u64>,
    pub last_success_epoch_ms: Option<u64>,
    pub connectivity: Connectivity,
    pub consecutive_failures: u32,
    pub last_failure: Option<FetchFailure>,
    pub unit: TemperatureUnit,
    pub device: Option<DeviceStatus>,
    pub probes: Vec<ProbeView>,
    pub uptime_seconds: u64,
}

/// Thread-safe shared state handle
pub type StateHandle = Arc<RwLock<SharedState>>;

pub fn new_state_handle(offline_after_failures: u32, event_log_size: usize) -> StateHandle {
    Arc::new(RwLock::new(SharedState::new(
        offline_after_failures,
        event_log_size,
    )))
}
