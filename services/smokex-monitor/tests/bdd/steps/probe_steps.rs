//! BDD step definitions for probe alarm reduction

use cucumber::{given, then, when};

use smokex_monitor::poller::{FetchFailure, PollResult};
use smokex_monitor::reducer::{AlarmState, ProbeDisplayState, Reducer};
use smokex_monitor::telemetry::{DeviceStatus, ProbeId, ProbeSample};

use crate::world::SmokexWorld;

const HISTORY_CAPACITY: usize = 100;

fn probe_id(n: u8) -> ProbeId {
    ProbeId::new(n).expect("probe numbers start at 1")
}

fn parse_alarm(s: &str) -> AlarmState {
    match s {
        "normal" => AlarmState::Normal,
        "over" => AlarmState::Over,
        "under" => AlarmState::Under,
        "unknown" => AlarmState::Unknown,
        other => panic!("Unknown alarm state: {}", other),
    }
}

fn probe(world: &SmokexWorld, n: u8) -> &ProbeDisplayState {
    world
        .view
        .get(&probe_id(n))
        .unwrap_or_else(|| panic!("probe {} not in view model: {:?}", n, world.view))
}

pub fn apply(world: &mut SmokexWorld, result: PollResult) {
    let next = Reducer::new(HISTORY_CAPACITY).reduce(&world.view, &result);
    world.previous_view = Some(std::mem::replace(&mut world.view, next));
    world.last_result = Some(result);
}

#[given(expr = "a receiver reporting {int} probe(s)")]
fn receiver_reporting(world: &mut SmokexWorld, count: u8) {
    world.status = Some(DeviceStatus {
        wifi_connected: true,
        paired: true,
        num_probes: count,
        billows_active: false,
        billows_target: None,
    });
    world.samples.clear();
}

#[given(expr = "probe {int} reads {float} with alarm range {float} to {float}")]
fn probe_reads(world: &mut SmokexWorld, n: u8, current: f64, min: f64, max: f64) {
    let id = probe_id(n);
    world.samples.insert(
        id,
        ProbeSample {
            probe_id: id,
            current_temp: current,
            alarm_max: max,
            alarm_min: min,
            history: vec![current],
        },
    );
}

#[given(expr = "probe {int} reports a sensor fault with alarm range {float} to {float}")]
fn probe_faults(world: &mut SmokexWorld, n: u8, min: f64, max: f64) {
    let id = probe_id(n);
    world.samples.insert(
        id,
        ProbeSample {
            probe_id: id,
            current_temp: f64::NAN,
            alarm_max: max,
            alarm_min: min,
            history: vec![f64::NAN],
        },
    );
}

#[given(expr = "probe {int} stops reporting")]
fn probe_stops(world: &mut SmokexWorld, n: u8) {
    world.samples.remove(&probe_id(n));
}

fn succeed(world: &mut SmokexWorld) {
    let status = world.status.clone().expect("receiver status not set");
    let samples = world.samples.clone();
    apply(world, PollResult::Success { status, samples });
}

#[given("a successful poll")]
fn earlier_poll(world: &mut SmokexWorld) {
    succeed(world);
}

#[when("the poll succeeds")]
fn poll_succeeds(world: &mut SmokexWorld) {
    succeed(world);
}

#[when("the poll times out")]
fn poll_times_out(world: &mut SmokexWorld) {
    apply(
        world,
        PollResult::Failure(FetchFailure::Timeout("GET /status".to_string())),
    );
}

#[when("the poll returns a malformed response")]
fn poll_malformed(world: &mut SmokexWorld) {
    apply(
        world,
        PollResult::Failure(FetchFailure::MalformedResponse(
            "probe_1: missing field `history`".to_string(),
        )),
    );
}

#[then(expr = "probe {int} should be {word}")]
fn probe_alarm_is(world: &mut SmokexWorld, n: u8, state: String) {
    assert_eq!(probe(world, n).alarm_state, parse_alarm(&state));
}

#[then(expr = "probe {int} should show {float}")]
fn probe_shows(world: &mut SmokexWorld, n: u8, temp: f64) {
    assert_eq!(probe(world, n).current_temp, Some(temp));
}

#[then(expr = "probe {int} should show no temperature")]
fn probe_shows_nothing(world: &mut SmokexWorld, n: u8) {
    assert_eq!(probe(world, n).current_temp, None);
}

#[then(expr = "probe {int} should show a sensor fault")]
fn probe_shows_fault(world: &mut SmokexWorld, n: u8) {
    let current = probe(world, n).current_temp.expect("no temperature");
    assert!(current.is_nan(), "expected a fault, got {}", current);
}

#[then(expr = "the view model should list {int} probe(s)")]
fn view_lists(world: &mut SmokexWorld, count: usize) {
    assert_eq!(world.view.len(), count);
}

#[then("the view model should be unchanged")]
fn view_unchanged(world: &mut SmokexWorld) {
    let previous = world.previous_view.as_ref().expect("no previous view");
    assert_eq!(&world.view, previous);
}
