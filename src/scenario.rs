//! YAML scenario files.
//!
//! ```yaml
//! meta:
//!   name: reference
//!   description: node count sweep, 1-persistent
//! seed: 42
//! bus:
//!   horizon: 1000.0
//!   sensing: non-persistent
//!   policy:
//!     retry_limit: 10
//! sweep:
//!   node_counts: [20, 40, 60, 80, 100]
//!   arrival_rates: [7.0, 10.0, 20.0]
//! ```
//!
//! Every section and field is optional; anything left out keeps its
//! default.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::BusConfig;
use crate::error::Result;
use crate::sweep::SweepPlan;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioMeta {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub meta: ScenarioMeta,
    /// Seed for the sweep's root stream (None = fresh entropy).
    pub seed: Option<u64>,
    pub bus: BusConfig,
    pub sweep: SweepPlan,
}

impl Scenario {
    pub fn from_yaml_str(text: &str) -> Result<Scenario> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

pub fn load(path: &Path) -> Result<Scenario> {
    let text = fs::read_to_string(path)?;
    Scenario::from_yaml_str(&text)
}
