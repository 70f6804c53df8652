//! Parameter sweeps over node count and arrival rate.
//!
//! Every (node count, rate, repetition) cell is an independent run on its
//! own derived random stream, so cells execute in parallel and the sweep
//! still reproduces bit-for-bit from a single seed.

use log::info;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::BusConfig;
use crate::error::{Result, SimError};
use crate::random::RandomStream;
use crate::scheduler::run_simulation;
use crate::stats::{Efficiency, SimResult};
use crate::theoretical::expected_throughput;

/// Grid of runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepPlan {
    pub node_counts: Vec<usize>,
    /// Per-node arrival rates in packets per second.
    pub arrival_rates: Vec<f64>,
    /// Runs averaged per grid point.
    pub repetitions: usize,
}

impl Default for SweepPlan {
    fn default() -> Self {
        Self {
            node_counts: vec![20, 40, 60, 80, 100],
            arrival_rates: vec![7.0, 10.0, 20.0],
            repetitions: 1,
        }
    }
}

impl SweepPlan {
    fn cell_count(&self) -> usize {
        self.node_counts.len() * self.arrival_rates.len() * self.repetitions
    }

    fn validate(&self, config: &BusConfig) -> Result<()> {
        if self.repetitions == 0 {
            return Err(SimError::InvalidParameter {
                name: "repetitions",
                value: 0.0,
            });
        }
        for &nodes in &self.node_counts {
            for &rate in &self.arrival_rates {
                config.clone().with_arrival_rate(rate).validate(nodes)?;
            }
        }
        Ok(())
    }
}

/// Averaged outcome of one grid point.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepPoint {
    pub node_count: usize,
    pub arrival_rate: f64,
    /// Mean efficiency over repetitions that attempted anything.
    pub efficiency: Efficiency,
    /// Mean throughput in bits per second.
    pub throughput: f64,
    /// Analytical throughput for the same load, in bits per second.
    pub theoretical_throughput: f64,
    pub runs: Vec<SimResult>,
}

impl SweepPoint {
    fn from_runs(config: &BusConfig, node_count: usize, arrival_rate: f64, runs: Vec<SimResult>) -> Self {
        let ratios: Vec<f64> = runs.iter().filter_map(|r| r.efficiency().ratio()).collect();
        let efficiency = if ratios.is_empty() {
            Efficiency::NoAttempts
        } else {
            Efficiency::Ratio(ratios.iter().sum::<f64>() / ratios.len() as f64)
        };
        let throughput = runs.iter().map(SimResult::throughput).sum::<f64>() / runs.len() as f64;
        let theoretical_throughput =
            expected_throughput(&config.clone().with_arrival_rate(arrival_rate), node_count);

        Self {
            node_count,
            arrival_rate,
            efficiency,
            throughput,
            theoretical_throughput,
            runs,
        }
    }
}

/// Run the whole grid. Points come back ordered by node count, then rate.
pub fn run_sweep(config: &BusConfig, plan: &SweepPlan, stream: &RandomStream) -> Result<Vec<SweepPoint>> {
    plan.validate(config)?;
    info!(
        "sweeping {} node counts x {} rates x {} repetitions ({} sensing)",
        plan.node_counts.len(),
        plan.arrival_rates.len(),
        plan.repetitions,
        config.sensing
    );

    let runs: Vec<SimResult> = (0..plan.cell_count())
        .into_par_iter()
        .map(|cell| {
            let reps = plan.repetitions;
            let rates = plan.arrival_rates.len();
            let node_count = plan.node_counts[cell / (rates * reps)];
            let rate = plan.arrival_rates[(cell / reps) % rates];
            let cell_config = config.clone().with_arrival_rate(rate);
            let mut cell_stream = stream.derive(cell as u64);
            run_simulation(&cell_config, node_count, &mut cell_stream)
        })
        .collect::<Result<Vec<_>>>()?;

    let mut runs = runs.into_iter();
    let mut points = Vec::with_capacity(plan.node_counts.len() * plan.arrival_rates.len());
    for &node_count in &plan.node_counts {
        for &rate in &plan.arrival_rates {
            let cell_runs: Vec<SimResult> = runs.by_ref().take(plan.repetitions).collect();
            let point = SweepPoint::from_runs(config, node_count, rate, cell_runs);
            info!(
                "nodes {:>4} rate {:>6.1}: efficiency {}, throughput {:.1} bit/s (theory {:.1})",
                point.node_count,
                point.arrival_rate,
                point.efficiency,
                point.throughput,
                point.theoretical_throughput
            );
            points.push(point);
        }
    }
    Ok(points)
}
