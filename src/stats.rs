use std::fmt;

/// Fraction of attempts that succeeded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Efficiency {
    Ratio(f64),
    /// Nothing was attempted before the horizon.
    NoAttempts,
}

impl Efficiency {
    pub fn ratio(self) -> Option<f64> {
        match self {
            Efficiency::Ratio(r) => Some(r),
            Efficiency::NoAttempts => None,
        }
    }
}

impl fmt::Display for Efficiency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Efficiency::Ratio(r) => write!(f, "{}", r),
            Efficiency::NoAttempts => write!(f, "n/a"),
        }
    }
}

/// Aggregate counters of one finished run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimResult {
    pub node_count: usize,
    /// Transmission attempts, collided ones included.
    pub attempted: usize,
    pub successful: usize,
    /// Packets discarded at the retry ceiling.
    pub dropped: usize,
    /// Number of contention events processed.
    pub events: usize,
    pub horizon: f64,
    pub frame_length_bits: f64,
}

impl SimResult {
    pub fn efficiency(&self) -> Efficiency {
        if self.attempted == 0 {
            Efficiency::NoAttempts
        } else {
            Efficiency::Ratio(self.successful as f64 / self.attempted as f64)
        }
    }

    /// Delivered bits per simulated second.
    pub fn throughput(&self) -> f64 {
        self.successful as f64 * self.frame_length_bits / self.horizon
    }

    pub fn collisions(&self) -> usize {
        self.attempted - self.successful
    }
}

impl fmt::Display for SimResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "*******************Simulation results*******************")?;
        writeln!(f, "nodes: {}", self.node_count)?;
        writeln!(f, "attempted: {}", self.attempted)?;
        writeln!(f, "successful: {}", self.successful)?;
        writeln!(f, "dropped: {}", self.dropped)?;
        writeln!(f, "efficiency: {}", self.efficiency())?;
        writeln!(f, "throughput: {} bit/s", self.throughput())?;
        write!(f, "*******************Simulation results*******************")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(attempted: usize, successful: usize) -> SimResult {
        SimResult {
            node_count: 2,
            attempted,
            successful,
            dropped: 0,
            events: attempted,
            horizon: 20.0,
            frame_length_bits: 1500.0,
        }
    }

    #[test]
    fn efficiency_and_throughput() {
        let r = result(25, 5);
        assert_eq!(r.efficiency(), Efficiency::Ratio(0.2));
        assert_eq!(r.throughput(), 375.0);
        assert_eq!(r.collisions(), 20);
    }

    #[test]
    fn empty_run_has_no_efficiency() {
        let r = result(0, 0);
        assert_eq!(r.efficiency(), Efficiency::NoAttempts);
        assert_eq!(r.efficiency().ratio(), None);
        assert_eq!(r.throughput(), 0.0);
        assert_eq!(r.efficiency().to_string(), "n/a");
    }
}
