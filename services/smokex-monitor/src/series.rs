//! Per-probe chart history
//!
//! The device keeps its own rolling window of readings and sends the whole
//! window with every `/data` response, so the retained series is replaced by
//! the incoming window rather than reconciled point by point. Non-finite
//! values mark sensor faults and are kept so the chart can show the gap.

/// Merge the device's reported window into the retained series.
///
/// A non-empty `incoming` replaces `existing`; an empty one keeps `existing`.
/// Either way at most the newest `capacity` entries survive.
pub fn merge(existing: &[f64], incoming: &[f64], capacity: usize) -> Vec<f64> {
    let source = if incoming.is_empty() {
        existing
    } else {
        incoming
    };
    tail(source, capacity).to_vec()
}

fn tail(values: &[f64], capacity: usize) -> &[f64] {
    &values[values.len().saturating_sub(capacity)..]
}
