//! BDD step definitions for chart series merging

use cucumber::{given, then, when};

use smokex_monitor::series::merge;

use crate::world::SmokexWorld;

fn ramp(start: f64, len: usize) -> Vec<f64> {
    (0..len).map(|i| start + i as f64).collect()
}

/// Element-wise equality where two faults compare equal
fn same(a: &[f64], b: &[f64]) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .zip(b)
            .all(|(x, y)| x == y || (x.is_nan() && y.is_nan()))
}

#[given(expr = "an existing series of {int} point(s)")]
fn existing_series(world: &mut SmokexWorld, len: usize) {
    world.existing_series = ramp(100.0, len);
}

#[given(expr = "an incoming series of {int} point(s)")]
fn incoming_series(world: &mut SmokexWorld, len: usize) {
    world.incoming_series = ramp(500.0, len);
}

#[given("an empty incoming series")]
fn empty_incoming(world: &mut SmokexWorld) {
    world.incoming_series.clear();
}

#[given(expr = "a sensor fault at position {int} of the incoming series")]
fn incoming_fault(world: &mut SmokexWorld, index: usize) {
    world.incoming_series[index] = f64::NAN;
}

#[when(expr = "the series are merged with capacity {int}")]
fn merged(world: &mut SmokexWorld, capacity: usize) {
    world.merge_capacity = capacity;
    world.merged_series = Some(merge(
        &world.existing_series,
        &world.incoming_series,
        capacity,
    ));
}

fn merged_series(world: &SmokexWorld) -> &[f64] {
    world.merged_series.as_deref().expect("series not merged")
}

#[then(expr = "the merged series should have {int} point(s)")]
fn merged_len(world: &mut SmokexWorld, len: usize) {
    assert_eq!(merged_series(world).len(), len);
}

#[then("the merged series should equal the incoming series")]
fn equals_incoming(world: &mut SmokexWorld) {
    assert!(same(merged_series(world), &world.incoming_series));
}

#[then("the merged series should equal the existing series")]
fn equals_existing(world: &mut SmokexWorld) {
    assert!(same(merged_series(world), &world.existing_series));
}

#[then(expr = "the merged series should be the last {int} incoming point(s)")]
fn incoming_tail(world: &mut SmokexWorld, len: usize) {
    let incoming = &world.incoming_series;
    let tail = &incoming[incoming.len() - len..];
    assert!(
        same(merged_series(world), tail),
        "expected the last {} incoming points",
        len
    );
}

#[then("the merged series should end with the last incoming point")]
fn ends_with_incoming(world: &mut SmokexWorld) {
    assert_eq!(merged_series(world).last(), world.incoming_series.last());
}

#[then(expr = "position {int} of the merged series should be a sensor fault")]
fn merged_fault(world: &mut SmokexWorld, index: usize) {
    assert!(merged_series(world)[index].is_nan());
}

#[then("merging the same incoming series again should not change it")]
fn idempotent(world: &mut SmokexWorld) {
    let once = merged_series(world).to_vec();
    let twice = merge(&once, &world.incoming_series, world.merge_capacity);
    assert!(same(&once, &twice));
}
