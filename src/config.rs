//! Run configuration.
//!
//! Every simulation receives its parameters as one immutable [`BusConfig`]
//! value, so independent runs can execute side by side without sharing
//! state. The defaults reproduce the reference study: 1500-bit frames on a
//! 1 Mbit/s bus, 5e-8 s of propagation delay between adjacent stations and
//! a 512-bit backoff slot.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

pub const DEFAULT_FRAME_LENGTH_BITS: f64 = 1500.0;
pub const DEFAULT_BIT_RATE: f64 = 1_000_000.0;
pub const DEFAULT_PROP_DELAY: f64 = 0.000_000_05;
pub const BACKOFF_SLOT_BITS: f64 = 512.0;
pub const DEFAULT_HORIZON: f64 = 1000.0;
pub const DEFAULT_ARRIVAL_MARGIN: f64 = 2.0;
pub const DEFAULT_RETRY_LIMIT: u32 = 10;

/// Carrier-sense discipline applied to waiting stations after a clean send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SensingMode {
    /// 1-persistent: wait at the edge of the busy period, then transmit.
    Persistent,
    /// Back off and sense again later instead of waiting.
    NonPersistent,
}

impl fmt::Display for SensingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensingMode::Persistent => write!(f, "persistent"),
            SensingMode::NonPersistent => write!(f, "non-persistent"),
        }
    }
}

impl FromStr for SensingMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "persistent" | "1-persistent" => Ok(SensingMode::Persistent),
            "non-persistent" | "nonpersistent" => Ok(SensingMode::NonPersistent),
            other => Err(format!("unknown sensing mode: {}", other)),
        }
    }
}

/// Comparison used when deciding whether a pending packet falls inside the
/// sender's detection window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollisionWindow {
    /// `head <= sender_time + offset`
    Inclusive,
    /// `head < sender_time + offset`
    Exclusive,
}

impl CollisionWindow {
    pub fn contains(self, head: f64, window_end: f64) -> bool {
        match self {
            CollisionWindow::Inclusive => head <= window_end,
            CollisionWindow::Exclusive => head < window_end,
        }
    }
}

/// Baseline the sender uses when it backs off after a collision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SenderDetection {
    /// Wait until the furthest conflicting station could have been heard.
    FurthestConflict,
    /// Back off from the sender's own start time.
    Immediate,
}

/// Edge-case policies of the contention rules.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentionPolicy {
    /// A head packet is dropped when its retry counter reaches this value.
    pub retry_limit: u32,
    pub window: CollisionWindow,
    pub sender_detection: SenderDetection,
}

impl Default for ContentionPolicy {
    fn default() -> Self {
        Self {
            retry_limit: DEFAULT_RETRY_LIMIT,
            window: CollisionWindow::Inclusive,
            sender_detection: SenderDetection::FurthestConflict,
        }
    }
}

/// Parameters of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Simulated time `Tsim`, in seconds.
    pub horizon: f64,

    /// Frame length in bits, used for throughput.
    pub frame_length_bits: f64,

    /// Time the medium stays busy for one frame, in seconds.
    pub transmission_duration: f64,

    /// Propagation delay between adjacent node indices, in seconds.
    pub propagation_delay_per_hop: f64,

    /// Length of one backoff slot, in seconds.
    pub backoff_unit: f64,

    /// Mean packet arrival rate per node, in packets per second.
    pub arrival_rate: f64,

    /// Arrivals are generated up to `horizon + arrival_margin`.
    pub arrival_margin: f64,

    pub sensing: SensingMode,

    pub policy: ContentionPolicy,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self::from_link(DEFAULT_FRAME_LENGTH_BITS, DEFAULT_BIT_RATE)
    }
}

impl BusConfig {
    /// Derive frame timing from a frame length and a link bit rate.
    pub fn from_link(frame_length_bits: f64, bit_rate: f64) -> Self {
        Self {
            horizon: DEFAULT_HORIZON,
            frame_length_bits,
            transmission_duration: frame_length_bits / bit_rate,
            propagation_delay_per_hop: DEFAULT_PROP_DELAY,
            backoff_unit: BACKOFF_SLOT_BITS / bit_rate,
            arrival_rate: 7.0,
            arrival_margin: DEFAULT_ARRIVAL_MARGIN,
            sensing: SensingMode::Persistent,
            policy: ContentionPolicy::default(),
        }
    }

    pub fn with_horizon(mut self, horizon: f64) -> Self {
        self.horizon = horizon;
        self
    }

    pub fn with_arrival_rate(mut self, rate: f64) -> Self {
        self.arrival_rate = rate;
        self
    }

    pub fn with_sensing(mut self, sensing: SensingMode) -> Self {
        self.sensing = sensing;
        self
    }

    pub fn with_propagation_delay(mut self, delay: f64) -> Self {
        self.propagation_delay_per_hop = delay;
        self
    }

    pub fn with_transmission_duration(mut self, duration: f64) -> Self {
        self.transmission_duration = duration;
        self
    }

    pub fn with_backoff_unit(mut self, unit: f64) -> Self {
        self.backoff_unit = unit;
        self
    }

    pub fn with_policy(mut self, policy: ContentionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Propagation offset between two stations on the bus.
    pub fn propagation_offset(&self, a: usize, b: usize) -> f64 {
        self.propagation_delay_per_hop * a.abs_diff(b) as f64
    }

    /// Reject parameter sets the engine cannot run on.
    pub fn validate(&self, node_count: usize) -> Result<()> {
        if node_count == 0 {
            return Err(SimError::InvalidNodeCount);
        }
        positive("horizon", self.horizon)?;
        positive("frame_length_bits", self.frame_length_bits)?;
        positive("transmission_duration", self.transmission_duration)?;
        positive("backoff_unit", self.backoff_unit)?;
        positive("arrival_rate", self.arrival_rate)?;
        non_negative("propagation_delay_per_hop", self.propagation_delay_per_hop)?;
        non_negative("arrival_margin", self.arrival_margin)?;
        if self.policy.retry_limit == 0 {
            return Err(SimError::InvalidParameter {
                name: "retry_limit",
                value: 0.0,
            });
        }
        Ok(())
    }
}

fn positive(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SimError::InvalidParameter { name, value })
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SimError::InvalidParameter { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_link() {
        let config = BusConfig::default();
        assert!((config.transmission_duration - 0.0015).abs() < 1e-12);
        assert!((config.backoff_unit - 0.000512).abs() < 1e-12);
        assert_eq!(config.policy.retry_limit, 10);
        assert_eq!(config.sensing, SensingMode::Persistent);
        assert!(config.validate(20).is_ok());
    }

    #[test]
    fn from_link_derives_timing_from_bit_rate() {
        let config = BusConfig::from_link(1000.0, 10_000_000.0);
        assert_eq!(config.frame_length_bits, 1000.0);
        assert!((config.transmission_duration - 0.0001).abs() < 1e-15);
        assert!((config.backoff_unit - 0.0000512).abs() < 1e-15);
        assert_eq!(BusConfig::default(), BusConfig::from_link(1500.0, 1_000_000.0));
    }

    #[test]
    fn rejects_contract_violations() {
        let config = BusConfig::default();
        assert!(matches!(config.validate(0), Err(SimError::InvalidNodeCount)));

        let bad_rate = config.clone().with_arrival_rate(0.0);
        assert!(matches!(
            bad_rate.validate(4),
            Err(SimError::InvalidParameter { name: "arrival_rate", .. })
        ));

        let bad_horizon = config.clone().with_horizon(-1.0);
        assert!(matches!(
            bad_horizon.validate(4),
            Err(SimError::InvalidParameter { name: "horizon", .. })
        ));

        let nan_delay = config.clone().with_propagation_delay(f64::NAN);
        assert!(nan_delay.validate(4).is_err());

        let zero_delay = config.with_propagation_delay(0.0);
        assert!(zero_delay.validate(4).is_ok());
    }

    #[test]
    fn window_comparison() {
        assert!(CollisionWindow::Inclusive.contains(6.0, 6.0));
        assert!(!CollisionWindow::Exclusive.contains(6.0, 6.0));
        assert!(CollisionWindow::Exclusive.contains(5.9, 6.0));
    }

    #[test]
    fn sensing_mode_parses() {
        assert_eq!("persistent".parse::<SensingMode>(), Ok(SensingMode::Persistent));
        assert_eq!(
            "Non-Persistent".parse::<SensingMode>(),
            Ok(SensingMode::NonPersistent)
        );
        assert!("p-persistent".parse::<SensingMode>().is_err());
    }

    #[test]
    fn propagation_offset_uses_index_distance() {
        let config = BusConfig::default().with_propagation_delay(2.0);
        assert_eq!(config.propagation_offset(1, 4), 6.0);
        assert_eq!(config.propagation_offset(4, 1), 6.0);
        assert_eq!(config.propagation_offset(3, 3), 0.0);
    }
}
