//! Hand-written arrival timelines for reproducible runs.

use crate::config::BusConfig;

/// Two stations with interleaved arrivals, used as a regression fixture.
pub fn two_node_timelines() -> Vec<Vec<f64>> {
    vec![
        vec![5.0, 6.0, 7.0, 8.0, 60.0, 80.0, 88.0, 89.0, 99.0, 100.0],
        vec![6.0, 14.0, 16.0, 18.0, 27.0, 30.0, 66.0, 68.0],
    ]
}

/// Configuration the two-node fixture is run with: no propagation delay,
/// frames lasting 7 time units and a horizon of 400.
pub fn two_node_config() -> BusConfig {
    BusConfig::default()
        .with_horizon(400.0)
        .with_transmission_duration(7.0)
        .with_propagation_delay(0.0)
        .with_backoff_unit(1.0)
}
