use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::network::Topology;
use crate::types::{Cost, NodeId, RoutingParams, DEFAULT_INFINITY};

/// A full simulation run: the network, the scheduled link changes, and how
/// the simulated links behave.
///
/// In the JSON form a `null` cost means "no link".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub name: String,
    #[serde(default = "default_infinity")]
    pub infinity: Cost,
    pub costs: Vec<Vec<Option<Cost>>>,
    #[serde(default)]
    pub link_changes: Vec<LinkChangeConfig>,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkChangeConfig {
    /// Virtual time of the change.
    pub at: u64,
    pub a: NodeId,
    pub b: NodeId,
    /// New cost for both directions; `null` takes the link down.
    pub cost: Option<Cost>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Base delivery delay of every packet, in ticks.
    pub propagation_delay: u64,
    /// Extra random delay in `[0, max_jitter]` ticks.
    pub max_jitter: u64,
    pub seed: u64,
    /// Delivery budget; a run still busy after this many deliveries is
    /// reported as not converged.
    pub max_events: u64,
}

fn default_infinity() -> Cost {
    DEFAULT_INFINITY
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            propagation_delay: 1,
            max_jitter: 0,
            seed: 0,
            max_events: 100_000,
        }
    }
}

impl Default for ScenarioConfig {
    /// The classic three-router lab network: 0-1 costs 4, 0-2 costs 1,
    /// 1-2 costs 50, and at T=40 link 0-1 jumps to 60.
    fn default() -> Self {
        Self {
            name: "lab-3".to_string(),
            infinity: DEFAULT_INFINITY,
            costs: vec![
                vec![Some(0), Some(4), Some(1)],
                vec![Some(4), Some(0), Some(50)],
                vec![Some(1), Some(50), Some(0)],
            ],
            link_changes: vec![LinkChangeConfig {
                at: 40,
                a: 0,
                b: 1,
                cost: Some(60),
            }],
            simulation: SimulationConfig::default(),
        }
    }
}

impl ScenarioConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        let config: ScenarioConfig = serde_json::from_str(&content)
            .with_context(|| format!("parsing scenario {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), content)?;
        Ok(())
    }

    pub fn num_nodes(&self) -> usize {
        self.costs.len()
    }

    pub fn params(&self) -> RoutingParams {
        RoutingParams::new(self.num_nodes(), self.infinity)
    }

    fn resolve(&self, cost: Option<Cost>) -> Cost {
        cost.unwrap_or(self.infinity)
    }

    pub fn topology(&self) -> Result<Topology> {
        self.validate()?;
        let matrix = self
            .costs
            .iter()
            .map(|row| row.iter().map(|&c| self.resolve(c)).collect())
            .collect();
        Topology::from_matrix(self.params(), matrix)
    }

    /// Link changes with `null` resolved to the infinity sentinel.
    pub fn resolved_link_changes(&self) -> Vec<(u64, NodeId, NodeId, Cost)> {
        self.link_changes
            .iter()
            .map(|c| (c.at, c.a, c.b, self.resolve(c.cost)))
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        let n = self.num_nodes();
        if n == 0 {
            bail!("scenario '{}' has no routers", self.name);
        }
        if self.infinity == 0 {
            bail!("infinity must be positive");
        }

        let mut max_link = 0;
        for (i, row) in self.costs.iter().enumerate() {
            if row.len() != n {
                bail!("row {} has {} entries, expected {}", i, row.len(), n);
            }
            max_link = row.iter().flatten().copied().fold(max_link, Cost::max);
        }

        for change in &self.link_changes {
            if change.a >= n || change.b >= n {
                bail!("link change {}-{} names a router outside 0..{}", change.a, change.b, n);
            }
            if change.a == change.b {
                bail!("link change at T={} connects router {} to itself", change.at, change.a);
            }
            if let Some(cost) = change.cost {
                max_link = max_link.max(cost);
            }
        }

        // Longest simple path crosses n-1 links; it must stay below infinity.
        let bound = (max_link as u64).saturating_mul(n.saturating_sub(1) as u64);
        if bound >= self.infinity as u64 {
            bail!(
                "infinity {} is not above the longest possible path cost {}",
                self.infinity,
                bound
            );
        }
        Ok(())
    }
}
