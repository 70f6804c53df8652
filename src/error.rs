use thiserror::Error;

/// Errors surfaced before a run starts or while persisting results.
///
/// The event loop itself has no failure path: drops, empty queues and
/// zero-attempt runs are protocol outcomes, not errors.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("node count must be at least 1")]
    InvalidNodeCount,

    #[error("invalid parameter `{name}`: {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("random source stalled: {gaps} zero-length arrival gaps in a row")]
    StalledArrivals { gaps: usize },

    #[error("timeline of node {node} is not ordered by arrival time")]
    UnsortedTimeline { node: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("scenario error: {0}")]
    Scenario(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;
