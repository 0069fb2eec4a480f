use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dims::Dims3;
use crate::error::HarnessError;

/// Process count → candidate 3D process grids. The first grid is the default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcsTable {
    grids: BTreeMap<u32, Vec<Dims3>>,
}

impl Default for ProcsTable {
    fn default() -> Self {
        let entries: &[(u32, &[(u64, u64, u64)])] = &[
            (4, &[(2, 2, 1)]),
            (6, &[(3, 2, 1)]),
            (8, &[(2, 2, 2), (4, 2, 1)]),
            (9, &[(1, 3, 3)]),
            (10, &[(5, 2, 1)]),
            (12, &[(3, 2, 2), (4, 3, 1)]),
            (14, &[(7, 2, 1)]),
            (16, &[(2, 2, 4), (4, 4, 1)]),
            (32, &[(2, 4, 4), (8, 4, 1)]),
            (64, &[(4, 4, 4), (8, 4, 2)]),
            (128, &[(4, 4, 8), (8, 8, 2), (16, 4, 2)]),
        ];

        let grids = entries
            .iter()
            .map(|(n, confs)| (*n, confs.iter().map(|&c| Dims3::from(c)).collect()))
            .collect();

        Self { grids }
    }
}

impl ProcsTable {
    /// Empty table, for building custom configurations.
    pub fn new() -> Self {
        Self {
            grids: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, count: u32, grids: Vec<Dims3>) {
        self.grids.insert(count, grids);
    }

    pub fn contains(&self, count: u32) -> bool {
        self.grids.get(&count).is_some_and(|g| !g.is_empty())
    }

    /// Candidate grids for `count` processes.
    pub fn grids(&self, count: u32) -> Result<&[Dims3], HarnessError> {
        match self.grids.get(&count) {
            Some(g) if !g.is_empty() => Ok(g),
            _ => Err(HarnessError::UnknownProcessCount {
                count,
                available: self.counts(),
            }),
        }
    }

    /// Default (first) grid for `count` processes.
    pub fn default_grid(&self, count: u32) -> Result<Dims3, HarnessError> {
        self.grids(count).map(|g| g[0])
    }

    /// Configured process counts in ascending order.
    pub fn counts(&self) -> Vec<u32> {
        self.grids
            .iter()
            .filter(|(_, g)| !g.is_empty())
            .map(|(n, _)| *n)
            .collect()
    }
}
