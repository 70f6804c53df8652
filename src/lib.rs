//! Discrete-event simulation of CSMA contention on a shared bus.
//!
//! Stations sit at positions `0..N` along one medium. Each has a queue of
//! Poisson packet arrivals; the engine repeatedly lets the station with the
//! earliest pending packet transmit, detects collisions inside the
//! propagation shadow, applies binary exponential backoff, and updates the
//! other stations with either 1-persistent or non-persistent carrier
//! sensing. A run reports efficiency (successful / attempted) and
//! throughput (delivered bits per simulated second).
//!
//! ```no_run
//! use rust_csma::{run_simulation, BusConfig, RandomStream, SensingMode};
//!
//! let config = BusConfig::default()
//!     .with_arrival_rate(10.0)
//!     .with_sensing(SensingMode::NonPersistent);
//! let mut stream = RandomStream::from_u64(42);
//! let result = run_simulation(&config, 40, &mut stream)?;
//! println!("{}", result.efficiency());
//! # Ok::<(), rust_csma::SimError>(())
//! ```

pub mod arrivals;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod node;
pub mod random;
pub mod report;
pub mod scenario;
pub mod scheduler;
pub mod stats;
pub mod sweep;
pub mod theoretical;

pub use config::{BusConfig, CollisionWindow, ContentionPolicy, SenderDetection, SensingMode};
pub use error::{Result, SimError};
pub use random::{ConstantSource, RandomStream, UniformSource};
pub use scheduler::{run_simulation, run_with_timelines, Event, EventType, Scheduler};
pub use stats::{Efficiency, SimResult};
pub use sweep::{run_sweep, SweepPlan, SweepPoint};
