use std::collections::VecDeque;
use std::fmt;

use log::debug;

use crate::config::{BusConfig, SensingMode};
use crate::random::UniformSource;

/// Pending packet arrival times of one station, oldest first.
///
/// Only the head is ever rescheduled, and only to a later time. Packets
/// queued behind it keep their own arrival times, so a pop can expose a
/// head that is older than the one removed; every caller that pops moves
/// the new head past the current busy or detection time before the next
/// event is picked.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    arrivals: VecDeque<f64>,
}

impl Timeline {
    /// Build from timestamps the caller guarantees are non-decreasing.
    pub(crate) fn from_sorted(arrivals: Vec<f64>) -> Self {
        Self {
            arrivals: arrivals.into(),
        }
    }

    /// Build from arbitrary timestamps, or `None` if they are out of order.
    pub fn from_arrivals(arrivals: Vec<f64>) -> Option<Self> {
        if arrivals.windows(2).all(|w| w[0] <= w[1]) {
            Some(Self::from_sorted(arrivals))
        } else {
            None
        }
    }

    pub fn peek(&self) -> Option<f64> {
        self.arrivals.front().copied()
    }

    pub fn pop(&mut self) -> Option<f64> {
        self.arrivals.pop_front()
    }

    /// Move the head to `time` if that is later than the current head.
    pub fn advance_head(&mut self, time: f64) {
        if let Some(head) = self.arrivals.front_mut() {
            if time > *head {
                *head = time;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.arrivals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrivals.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.arrivals.iter().copied()
    }
}

/// Uniform binary exponential backoff: a slot count in `0..2^retries`.
pub fn backoff_slots<S: UniformSource>(source: &mut S, retries: u32) -> u64 {
    let window = 1u64 << retries.min(62);
    let slots = (source.next_uniform() * window as f64) as u64;
    slots.min(window - 1)
}

/// What happened to a station's head packet after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
    Rescheduled,
    Dropped,
}

impl fmt::Display for RetryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryOutcome::Rescheduled => write!(f, "Rescheduled"),
            RetryOutcome::Dropped => write!(f, "Dropped"),
        }
    }
}

/// One station on the bus.
#[derive(Debug, Clone)]
pub struct Node {
    id: usize,
    timeline: Timeline,
    collision_retries: u32,
    sensing_retries: u32,
    num_success: usize,
    num_fail: usize,
    num_dropped: usize,
}

impl Node {
    pub fn new(id: usize, timeline: Timeline) -> Node {
        Node {
            id,
            timeline,
            collision_retries: 0,
            sensing_retries: 0,
            num_success: 0,
            num_fail: 0,
            num_dropped: 0,
        }
    }

    pub fn get_id(&self) -> usize {
        self.id
    }

    /// Earliest pending arrival, `None` once the timeline is exhausted.
    pub fn head(&self) -> Option<f64> {
        self.timeline.peek()
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn collision_retries(&self) -> u32 {
        self.collision_retries
    }

    pub fn sensing_retries(&self) -> u32 {
        self.sensing_retries
    }

    /// (successful sends, collided attempts, dropped packets)
    pub fn get_stats(&self) -> (usize, usize, usize) {
        (self.num_success, self.num_fail, self.num_dropped)
    }

    /// Head packet went through; the next one starts with clean counters.
    pub fn tx_success(&mut self) {
        self.timeline.pop();
        self.num_success += 1;
        self.collision_retries = 0;
        self.sensing_retries = 0;
    }

    /// Head packet collided. The collision becomes visible to this station
    /// at `detected_at`; it retries after a binary exponential backoff from
    /// there, or drops the packet once the retry ceiling is hit.
    pub fn tx_collision<S: UniformSource>(
        &mut self,
        detected_at: f64,
        config: &BusConfig,
        source: &mut S,
    ) -> RetryOutcome {
        self.num_fail += 1;
        if config.sensing == SensingMode::NonPersistent {
            self.sensing_retries = 0;
        }

        self.collision_retries += 1;
        let outcome = if self.collision_retries >= config.policy.retry_limit {
            self.drop_head("collision");
            self.collision_retries = 0;
            RetryOutcome::Dropped
        } else {
            RetryOutcome::Rescheduled
        };

        let slots = backoff_slots(source, self.collision_retries);
        self.timeline
            .advance_head(detected_at + slots as f64 * config.backoff_unit);
        outcome
    }

    /// 1-persistent sensing: wait for the medium and go the instant it frees.
    pub fn sense_persistent(&mut self, busy_until: f64) {
        self.timeline.advance_head(busy_until);
    }

    /// Non-persistent sensing: while the head falls inside the busy period,
    /// back off and sense again. Returns how many packets were dropped.
    ///
    /// Each back-off is taken from the head's own time. After a drop the
    /// next packet senses from its arrival time, so a stale backlog burns
    /// through its retries instead of going out behind one back-off.
    pub fn sense_non_persistent<S: UniformSource>(
        &mut self,
        busy_until: f64,
        config: &BusConfig,
        source: &mut S,
    ) -> usize {
        let mut dropped = 0;
        while let Some(head) = self.timeline.peek() {
            if head >= busy_until {
                break;
            }

            self.sensing_retries += 1;
            if self.sensing_retries >= config.policy.retry_limit {
                self.drop_head("sensing");
                self.sensing_retries = 0;
                dropped += 1;
            }

            let Some(head) = self.timeline.peek() else {
                break;
            };
            let slots = backoff_slots(source, self.sensing_retries);
            self.timeline
                .advance_head(head + slots as f64 * config.backoff_unit);
        }
        dropped
    }

    fn drop_head(&mut self, reason: &str) {
        if let Some(time) = self.timeline.pop() {
            self.num_dropped += 1;
            debug!(
                "node {} dropped packet from {:.6} after {} retry ceiling",
                self.id, time, reason
            );
        }
    }
}
