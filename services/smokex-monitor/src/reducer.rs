//! Derives per-probe display state from poll results
//!
//! [`Reducer::reduce`] is a pure function of the previous state map and the
//! latest [`PollResult`]. The returned map is built from scratch every cycle
//! so a probe's value and its chart series always come from the same poll.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::poller::PollResult;
use crate::series;
use crate::telemetry::{ProbeId, ProbeSample};

/// Reading relative to the probe's configured thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlarmState {
    Normal,
    Over,
    Under,
    Unknown,
}

impl fmt::Display for AlarmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlarmState::Normal => write!(f, "Normal"),
            AlarmState::Over => write!(f, "Over"),
            AlarmState::Under => write!(f, "Under"),
            AlarmState::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Classify a reading. A non-finite reading is a sensor fault.
pub fn classify(current: f64, alarm_min: f64, alarm_max: f64) -> AlarmState {
    if !current.is_finite() {
        AlarmState::Unknown
    } else if current > alarm_max {
        AlarmState::Over
    } else if current < alarm_min {
        AlarmState::Under
    } else {
        AlarmState::Normal
    }
}

/// What the rendering layer shows for one probe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeDisplayState {
    pub probe_id: ProbeId,
    /// `None` until the device has reported this probe at least once
    pub current_temp: Option<f64>,
    pub alarm_state: AlarmState,
    pub alarm_max: Option<f64>,
    pub alarm_min: Option<f64>,
    pub series: Vec<f64>,
}

/// Display state for every known probe
pub type ProbeStates = BTreeMap<ProbeId, ProbeDisplayState>;

/// A probe whose alarm state differs between two committed cycles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlarmTransition {
    pub probe_id: ProbeId,
    pub previous: AlarmState,
    pub current: AlarmState,
    pub current_temp: Option<f64>,
}

/// Turns poll results into [`ProbeStates`]
#[derive(Debug, Clone, Copy)]
pub struct Reducer {
    capacity: usize,
}

impl Reducer {
    /// `capacity` bounds every probe's chart series
    pub fn new(capacity: usize) -> Self {
        Self { capacity }
    }

    pub fn reduce(&self, previous: &ProbeStates, result: &PollResult) -> ProbeStates {
        let (status, samples) = match result {
            PollResult::Success { status, samples } => (status, samples),
            // Keep the last known state; a fetch failure must not reset alarms
            PollResult::Failure(_) => return previous.clone(),
        };

        for id in samples.keys() {
            if id.get() > status.num_probes {
                tracing::debug!(
                    "Ignoring sample for {} beyond num_probes {}",
                    id,
                    status.num_probes
                );
            }
        }

        ProbeId::range(status.num_probes)
            .map(|id| {
                let prior = previous.get(&id);
                let state = match samples.get(&id) {
                    Some(sample) => self.from_sample(sample, prior),
                    None => self.without_sample(id, prior),
                };
                (id, state)
            })
            .collect()
    }

    fn from_sample(
        &self,
        sample: &ProbeSample,
        prior: Option<&ProbeDisplayState>,
    ) -> ProbeDisplayState {
        let existing = prior.map(|p| p.series.as_slice()).unwrap_or_default();

        ProbeDisplayState {
            probe_id: sample.probe_id,
            current_temp: Some(sample.current_temp),
            alarm_state: classify(sample.current_temp, sample.alarm_min, sample.alarm_max),
            alarm_max: Some(sample.alarm_max),
            alarm_min: Some(sample.alarm_min),
            series: series::merge(existing, &sample.history, self.capacity),
        }
    }

    fn without_sample(&self, id: ProbeId, prior: Option<&ProbeDisplayState>) -> ProbeDisplayState {
        match prior {
            Some(p) => ProbeDisplayState {
                probe_id: id,
                current_temp: p.current_temp,
                alarm_state: AlarmState::Unknown,
                alarm_max: p.alarm_max,
                alarm_min: p.alarm_min,
                series: series::merge(&p.series, &[], self.capacity),
            },
            None => ProbeDisplayState {
                probe_id: id,
                current_temp: None,
                alarm_state: AlarmState::Unknown,
                alarm_max: None,
                alarm_min: None,
                series: Vec::new(),
            },
        }
    }
}

/// Probes in `next` whose alarm state differs from `previous`.
/// A probe new to `next` counts as coming from `Unknown`.
pub fn transitions(previous: &ProbeStates, next: &ProbeStates) -> Vec<AlarmTransition> {
    next.values()
        .filter_map(|state| {
            let before = previous
                .get(&state.probe_id)
                .map_or(AlarmState::Unknown, |p| p.alarm_state);
            (before != state.alarm_state).then(|| AlarmTransition {
                probe_id: state.probe_id,
                previous: before,
                current: state.alarm_state,
                current_temp: state.current_temp,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poller::FetchFailure;
    use crate::telemetry::{DeviceStatus, ProbeSamples};
    use proptest::prelude::*;

    fn id(n: u8) -> ProbeId {
        ProbeId::new(n).unwrap()
    }

    fn status(num_probes: u8) -> DeviceStatus {
        DeviceStatus {
            wifi_connected: true,
            paired: true,
            num_probes,
            billows_active: false,
            billows_target: None,
        }
    }

    fn sample(n: u8, current: f64, history: Vec<f64>) -> ProbeSample {
        ProbeSample {
            probe_id: id(n),
            current_temp: current,
            alarm_max: 120.0,
            alarm_min: 35.0,
            history,
        }
    }

    fn success(num_probes: u8, samples: Vec<ProbeSample>) -> PollResult {
        PollResult::Success {
            status: status(num_probes),
            samples: samples.into_iter().map(|s| (s.probe_id, s)).collect(),
        }
    }

    fn failure() -> PollResult {
        PollResult::Failure(FetchFailure::NetworkError("unreachable".to_string()))
    }

    #[test]
    fn classify_boundaries_are_normal() {
        assert_eq!(classify(35.0, 35.0, 120.0), AlarmState::Normal);
        assert_eq!(classify(120.0, 35.0, 120.0), AlarmState::Normal);
        assert_eq!(classify(120.1, 35.0, 120.0), AlarmState::Over);
        assert_eq!(classify(34.9, 35.0, 120.0), AlarmState::Under);
        assert_eq!(classify(f64::NAN, 35.0, 120.0), AlarmState::Unknown);
    }

    #[test]
    fn reading_within_thresholds_is_normal() {
        let states = Reducer::new(50).reduce(
            &ProbeStates::new(),
            &success(1, vec![sample(1, 84.0, vec![83.3, 84.0])]),
        );
        let probe = &states[&id(1)];
        assert_eq!(probe.alarm_state, AlarmState::Normal);
        assert_eq!(probe.current_temp, Some(84.0));
        assert_eq!(probe.series, vec![83.3, 84.0]);
    }

    #[test]
    fn reading_above_max_is_over() {
        let states = Reducer::new(50).reduce(
            &ProbeStates::new(),
            &success(2, vec![sample(1, 84.0, vec![]), sample(2, 179.0, vec![])]),
        );
        assert_eq!(states[&id(2)].alarm_state, AlarmState::Over);
    }

    #[test]
    fn failure_after_success_keeps_state() {
        let reducer = Reducer::new(50);
        let first = reducer.reduce(
            &ProbeStates::new(),
            &success(1, vec![sample(1, 84.0, vec![84.0])]),
        );
        let second = reducer.reduce(&first, &failure());
        assert_eq!(second, first);
        assert_eq!(second[&id(1)].alarm_state, AlarmState::Normal);
        assert_eq!(second[&id(1)].current_temp, Some(84.0));
    }

    #[test]
    fn oversized_history_is_trimmed_to_capacity() {
        let history: Vec<f64> = (0..100).map(|i| 60.0 + f64::from(i)).collect();
        let states = Reducer::new(50).reduce(
            &ProbeStates::new(),
            &success(1, vec![sample(1, 84.0, history.clone())]),
        );
        assert_eq!(states[&id(1)].series, history[50..].to_vec());
    }

    #[test]
    fn missing_sample_is_unknown_and_carries_value() {
        let reducer = Reducer::new(50);
        let all = (1..=4).map(|n| sample(n, 70.0, vec![70.0])).collect();
        let first = reducer.reduce(&ProbeStates::new(), &success(4, all));

        let three = (1..=3).map(|n| sample(n, 71.0, vec![71.0])).collect();
        let second = reducer.reduce(&first, &success(4, three));

        let probe4 = &second[&id(4)];
        assert_eq!(probe4.alarm_state, AlarmState::Unknown);
        assert_eq!(probe4.current_temp, Some(70.0));
        assert_eq!(probe4.series, vec![70.0]);
        assert_eq!(second[&id(3)].current_temp, Some(71.0));
    }

    #[test]
    fn missing_sample_without_history_is_absent() {
        let states = Reducer::new(50).reduce(
            &ProbeStates::new(),
            &success(4, (1..=3).map(|n| sample(n, 71.0, vec![])).collect()),
        );
        let probe4 = &states[&id(4)];
        assert_eq!(probe4.alarm_state, AlarmState::Unknown);
        assert_eq!(probe4.current_temp, None);
        assert!(probe4.series.is_empty());
    }

    #[test]
    fn samples_beyond_num_probes_are_ignored() {
        let states = Reducer::new(50).reduce(
            &ProbeStates::new(),
            &success(1, vec![sample(1, 70.0, vec![]), sample(2, 70.0, vec![])]),
        );
        assert_eq!(states.len(), 1);
        assert!(!states.contains_key(&id(2)));
    }

    #[test]
    fn shrinking_probe_count_drops_probes() {
        let reducer = Reducer::new(50);
        let four = reducer.reduce(
            &ProbeStates::new(),
            &success(4, (1..=4).map(|n| sample(n, 70.0, vec![])).collect()),
        );
        let two = reducer.reduce(
            &four,
            &success(2, (1..=2).map(|n| sample(n, 70.0, vec![])).collect()),
        );
        assert_eq!(two.keys().copied().collect::<Vec<_>>(), vec![id(1), id(2)]);
    }

    #[test]
    fn empty_history_keeps_previous_series() {
        let reducer = Reducer::new(50);
        let first = reducer.reduce(
            &ProbeStates::new(),
            &success(1, vec![sample(1, 70.0, vec![69.0, 70.0])]),
        );
        let second = reducer.reduce(&first, &success(1, vec![sample(1, 71.0, vec![])]));
        assert_eq!(second[&id(1)].series, vec![69.0, 70.0]);
        assert_eq!(second[&id(1)].current_temp, Some(71.0));
    }

    #[test]
    fn transitions_report_changes_only() {
        let reducer = Reducer::new(50);
        let first = reducer.reduce(
            &ProbeStates::new(),
            &success(2, vec![sample(1, 84.0, vec![]), sample(2, 100.0, vec![])]),
        );
        let second = reducer.reduce(
            &first,
            &success(2, vec![sample(1, 84.0, vec![]), sample(2, 179.0, vec![])]),
        );

        let changes = transitions(&first, &second);
        assert_eq!(
            changes,
            vec![AlarmTransition {
                probe_id: id(2),
                previous: AlarmState::Normal,
                current: AlarmState::Over,
                current_temp: Some(179.0),
            }]
        );
    }

    #[test]
    fn first_reading_transitions_from_unknown() {
        let next = Reducer::new(50).reduce(
            &ProbeStates::new(),
            &success(1, vec![sample(1, 20.0, vec![])]),
        );
        let changes = transitions(&ProbeStates::new(), &next);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].previous, AlarmState::Unknown);
        assert_eq!(changes[0].current, AlarmState::Under);
    }

    fn finite_temp() -> impl Strategy<Value = f64> {
        -40.0f64..600.0
    }

    fn probe_sample(n: u8) -> impl Strategy<Value = ProbeSample> {
        (
            finite_temp(),
            finite_temp(),
            finite_temp(),
            prop::collection::vec(finite_temp(), 0..120),
        )
            .prop_map(move |(current, a, b, history)| ProbeSample {
                probe_id: id(n),
                current_temp: current,
                alarm_max: a.max(b),
                alarm_min: a.min(b),
                history,
            })
    }

    fn full_poll() -> impl Strategy<Value = PollResult> {
        (1u8..=4).prop_flat_map(|num| {
            (1..=num)
                .map(probe_sample)
                .collect::<Vec<_>>()
                .prop_map(move |samples| {
                    let samples: ProbeSamples =
                        samples.into_iter().map(|s| (s.probe_id, s)).collect();
                    PollResult::Success {
                        status: status(num),
                        samples,
                    }
                })
        })
    }

    proptest! {
        #[test]
        fn alarm_state_matches_thresholds_regardless_of_previous(
            earlier in full_poll(),
            result in full_poll(),
        ) {
            let reducer = Reducer::new(50);
            let previous = reducer.reduce(&ProbeStates::new(), &earlier);
            let from_empty = reducer.reduce(&ProbeStates::new(), &result);
            let from_previous = reducer.reduce(&previous, &result);

            let PollResult::Success { samples, .. } = &result else { unreachable!() };
            for (id, sample) in samples {
                let expected = classify(sample.current_temp, sample.alarm_min, sample.alarm_max);
                prop_assert_eq!(from_previous[id].alarm_state, expected);
                prop_assert_eq!(from_empty[id].alarm_state, expected);
                prop_assert_eq!(from_previous[id].current_temp, Some(sample.current_temp));
            }
        }

        #[test]
        fn failure_returns_previous_unchanged(earlier in full_poll(), capacity in 1usize..80) {
            let reducer = Reducer::new(capacity);
            let previous = reducer.reduce(&ProbeStates::new(), &earlier);
            let after = reducer.reduce(&previous, &failure());
            prop_assert_eq!(after, previous);
        }

        #[test]
        fn reduce_is_deterministic(earlier in full_poll(), result in full_poll()) {
            let reducer = Reducer::new(50);
            let previous = reducer.reduce(&ProbeStates::new(), &earlier);
            prop_assert_eq!(
                reducer.reduce(&previous, &result),
                reducer.reduce(&previous, &result)
            );
        }
    }
}
