//! Contention loop of the shared bus.
//!
//! Each step picks the station whose pending packet is earliest, checks
//! whether any other station started inside the propagation shadow of that
//! transmission, and applies the collision or the clean-send rules. The
//! loop stops once the earliest pending packet is at or past the horizon.

use std::fmt;

use log::{debug, info, trace};

use crate::arrivals::ArrivalGenerator;
use crate::config::{BusConfig, SenderDetection, SensingMode};
use crate::error::{Result, SimError};
use crate::node::{Node, RetryOutcome, Timeline};
use crate::random::UniformSource;
use crate::stats::SimResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    Success,
    Collision,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventType::Success => write!(f, "Success"),
            EventType::Collision => write!(f, "Collision"),
        }
    }
}

/// One processed contention step.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    event_type: EventType,
    sender: usize,
    time: f64,
    conflicts: Vec<usize>,
}

impl Event {
    pub fn new(event_type: EventType, sender: usize, time: f64, conflicts: Vec<usize>) -> Event {
        Event {
            event_type,
            sender,
            time,
            conflicts,
        }
    }

    pub fn success(sender: usize, time: f64) -> Event {
        Event::new(EventType::Success, sender, time, Vec::new())
    }

    pub fn collision(sender: usize, time: f64, conflicts: Vec<usize>) -> Event {
        Event::new(EventType::Collision, sender, time, conflicts)
    }

    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    pub fn get_sender(&self) -> usize {
        self.sender
    }

    pub fn get_time(&self) -> f64 {
        self.time
    }

    pub fn conflicts(&self) -> &[usize] {
        &self.conflicts
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>12.6} node {:>3} {}", self.time, self.sender, self.event_type)?;
        if !self.conflicts.is_empty() {
            write!(f, " with {:?}", self.conflicts)?;
        }
        Ok(())
    }
}

pub struct Scheduler {
    config: BusConfig,
    node_list: Vec<Node>,
    attempted: usize,
    successful: usize,
    events: usize,
    now: f64,
    trace: Option<Vec<Event>>,
}

impl Scheduler {
    /// Bus with one station per timeline, station `i` at position `i`.
    pub fn new(config: &BusConfig, timelines: Vec<Timeline>) -> Result<Scheduler> {
        config.validate(timelines.len())?;
        let node_list = timelines
            .into_iter()
            .enumerate()
            .map(|(id, timeline)| Node::new(id, timeline))
            .collect();

        Ok(Scheduler {
            config: config.clone(),
            node_list,
            attempted: 0,
            successful: 0,
            events: 0,
            now: 0.0,
            trace: None,
        })
    }

    /// Record every processed event.
    pub fn with_trace(mut self) -> Scheduler {
        self.trace = Some(Vec::new());
        self
    }

    pub fn nodes(&self) -> &[Node] {
        &self.node_list
    }

    pub fn trace(&self) -> &[Event] {
        self.trace.as_deref().unwrap_or(&[])
    }

    /// Start time of the last processed event.
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Station with the globally earliest pending packet, lowest index on
    /// ties. `None` when every timeline is exhausted.
    pub fn next_sender(&self) -> Option<(usize, f64)> {
        let mut next: Option<(usize, f64)> = None;
        for node in self.node_list.iter() {
            if let Some(head) = node.head() {
                match next {
                    Some((_, best)) if head >= best => {}
                    _ => next = Some((node.get_id(), head)),
                }
            }
        }
        next
    }

    /// Stations whose head packet starts before they could hear `sender`.
    pub fn conflicting_nodes(&self, sender: usize, time: f64) -> Vec<usize> {
        self.node_list
            .iter()
            .filter(|node| node.get_id() != sender)
            .filter_map(|node| {
                let head = node.head()?;
                let window_end = time + self.config.propagation_offset(node.get_id(), sender);
                self.config
                    .policy
                    .window
                    .contains(head, window_end)
                    .then_some(node.get_id())
            })
            .collect()
    }

    /// Process one contention step. Returns `false` once the horizon is
    /// reached or no station has anything left to send.
    pub fn handle_next_event<S: UniformSource>(&mut self, source: &mut S) -> bool {
        let (sender, time) = match self.next_sender() {
            Some(next) => next,
            None => return false,
        };
        if time >= self.config.horizon {
            return false;
        }

        self.now = time;
        self.events += 1;

        let conflicts = self.conflicting_nodes(sender, time);
        let event = if conflicts.is_empty() {
            self.handle_success(sender, time, source);
            Event::success(sender, time)
        } else {
            self.handle_collision(sender, time, &conflicts, source);
            Event::collision(sender, time, conflicts)
        };

        trace!("{}", event);
        if let Some(events) = self.trace.as_mut() {
            events.push(event);
        }
        true
    }

    fn handle_collision<S: UniformSource>(
        &mut self,
        sender: usize,
        time: f64,
        conflicts: &[usize],
        source: &mut S,
    ) {
        self.attempted += conflicts.len() + 1;

        let mut furthest = 0.0f64;
        for &index in conflicts {
            let offset = self.config.propagation_offset(index, sender);
            furthest = furthest.max(offset);
            let outcome = self.node_list[index].tx_collision(time + offset, &self.config, source);
            if outcome == RetryOutcome::Dropped {
                debug!("node {} gave up after collision at {:.6}", index, time);
            }
        }

        let baseline = match self.config.policy.sender_detection {
            SenderDetection::FurthestConflict => furthest,
            SenderDetection::Immediate => 0.0,
        };
        let outcome = self.node_list[sender].tx_collision(time + baseline, &self.config, source);
        if outcome == RetryOutcome::Dropped {
            debug!("sender {} gave up after collision at {:.6}", sender, time);
        }
    }

    fn handle_success<S: UniformSource>(&mut self, sender: usize, time: f64, source: &mut S) {
        self.attempted += 1;
        self.successful += 1;
        self.node_list[sender].tx_success();

        let busy_from_sender = time + self.config.transmission_duration;
        for index in 0..self.node_list.len() {
            let busy_until = busy_from_sender + self.config.propagation_offset(index, sender);
            let node = &mut self.node_list[index];
            match self.config.sensing {
                SensingMode::NonPersistent if index != sender => {
                    node.sense_non_persistent(busy_until, &self.config, source);
                }
                // the sender cannot sense its own frame, its next packet
                // simply queues behind it
                _ => node.sense_persistent(busy_until),
            }
        }
    }

    pub fn result(&self) -> SimResult {
        SimResult {
            node_count: self.node_list.len(),
            attempted: self.attempted,
            successful: self.successful,
            dropped: self.node_list.iter().map(|n| n.get_stats().2).sum(),
            events: self.events,
            horizon: self.config.horizon,
            frame_length_bits: self.config.frame_length_bits,
        }
    }

    /// Drive the loop to the horizon.
    pub fn run<S: UniformSource>(&mut self, source: &mut S) -> SimResult {
        info!(
            "simulating {} nodes for {}s ({} sensing)",
            self.node_list.len(),
            self.config.horizon,
            self.config.sensing
        );

        while self.handle_next_event(source) {}

        let result = self.result();
        info!(
            "finished after {} events: {} of {} attempts succeeded, {} dropped, efficiency {}, throughput {:.1} bit/s",
            result.events,
            result.successful,
            result.attempted,
            result.dropped,
            result.efficiency(),
            result.throughput()
        );
        self.log_node_stats();
        result
    }

    fn log_node_stats(&self) {
        for node in self.node_list.iter() {
            let (success, fail, dropped) = node.get_stats();
            debug!(
                "node {} success: {} collided: {} dropped: {}",
                node.get_id(),
                success,
                fail,
                dropped
            );
        }
    }
}

/// Generate Poisson arrivals for `node_count` stations and run to the
/// horizon. Parameters are checked before any draw is taken.
pub fn run_simulation<S: UniformSource>(
    config: &BusConfig,
    node_count: usize,
    source: &mut S,
) -> Result<SimResult> {
    config.validate(node_count)?;
    let timelines = ArrivalGenerator::from_config(config)?.generate(node_count, source)?;
    let mut scheduler = Scheduler::new(config, timelines)?;
    Ok(scheduler.run(source))
}

/// Run on caller-supplied arrival timestamps, one list per station.
pub fn run_with_timelines<S: UniformSource>(
    config: &BusConfig,
    arrivals: Vec<Vec<f64>>,
    source: &mut S,
) -> Result<SimResult> {
    let mut scheduler = Scheduler::new(config, timelines_from(arrivals)?)?;
    Ok(scheduler.run(source))
}

/// Check and wrap per-station arrival lists.
pub fn timelines_from(arrivals: Vec<Vec<f64>>) -> Result<Vec<Timeline>> {
    arrivals
        .into_iter()
        .enumerate()
        .map(|(node, list)| Timeline::from_arrivals(list).ok_or(SimError::UnsortedTimeline { node }))
        .collect()
}
