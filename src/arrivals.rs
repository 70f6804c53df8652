//! Poisson arrival timelines.

use log::debug;

use crate::config::BusConfig;
use crate::error::{Result, SimError};
use crate::node::Timeline;
use crate::random::UniformSource;

/// Exponential inter-arrival gap for `rate` packets per second.
pub fn exponential_gap<S: UniformSource>(source: &mut S, rate: f64) -> f64 {
    let u = source.next_uniform();
    -(1.0 - u).ln() / rate
}

/// Consecutive zero-length gaps tolerated before a source is declared
/// stuck. A healthy `[0, 1)` source draws an exact zero about once in 2^53
/// draws.
pub const MAX_ZERO_GAPS: usize = 64;

/// Generates one arrival timeline per node.
#[derive(Debug, Clone, Copy)]
pub struct ArrivalGenerator {
    rate: f64,
    until: f64,
}

impl ArrivalGenerator {
    /// Arrivals at `rate` packets per second, generated until a timestamp
    /// reaches `horizon + margin`.
    pub fn new(rate: f64, horizon: f64, margin: f64) -> Result<Self> {
        if !(rate.is_finite() && rate > 0.0) {
            return Err(SimError::InvalidParameter {
                name: "arrival_rate",
                value: rate,
            });
        }
        if !(horizon.is_finite() && horizon > 0.0) {
            return Err(SimError::InvalidParameter {
                name: "horizon",
                value: horizon,
            });
        }
        if !(margin.is_finite() && margin >= 0.0) {
            return Err(SimError::InvalidParameter {
                name: "arrival_margin",
                value: margin,
            });
        }
        Ok(Self {
            rate,
            until: horizon + margin,
        })
    }

    pub fn from_config(config: &BusConfig) -> Result<Self> {
        Self::new(config.arrival_rate, config.horizon, config.arrival_margin)
    }

    /// One node's timeline. The last timestamp is always at or past
    /// `horizon + margin`, so the run can reach its horizon before any
    /// generated timeline runs dry.
    ///
    /// Fails with [`SimError::StalledArrivals`] when the source keeps
    /// yielding gaps that do not advance time.
    pub fn timeline<S: UniformSource>(&self, source: &mut S) -> Result<Timeline> {
        let mut arrivals = Vec::with_capacity((self.rate * self.until) as usize + 1);
        let mut time = 0.0;
        let mut zero_gaps = 0;
        while time < self.until {
            let next = time + exponential_gap(source, self.rate);
            if next > time {
                zero_gaps = 0;
            } else {
                zero_gaps += 1;
                if zero_gaps >= MAX_ZERO_GAPS {
                    return Err(SimError::StalledArrivals { gaps: zero_gaps });
                }
            }
            time = next;
            arrivals.push(time);
        }
        Ok(Timeline::from_sorted(arrivals))
    }

    pub fn generate<S: UniformSource>(
        &self,
        node_count: usize,
        source: &mut S,
    ) -> Result<Vec<Timeline>> {
        let timelines = (0..node_count)
            .map(|_| self.timeline(source))
            .collect::<Result<Vec<Timeline>>>()?;
        debug!(
            "generated {} arrivals for {} nodes",
            timelines.iter().map(Timeline::len).sum::<usize>(),
            node_count
        );
        Ok(timelines)
    }
}
