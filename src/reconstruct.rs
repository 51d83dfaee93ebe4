//! The tip-to-root traversal engine
//!
//! Walks the phylogeny in strict post-order: each leaf starts resolved with
//! its observed range grid, each internal node resolves once both children
//! have been propagated up their own branches and combined. The root's grid
//! is the whole-tree ancestral-range reconstruction. Everything is validated
//! before the first propagation step runs, so a bad configuration never
//! costs a partial run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::grid::Grid;
use crate::movement::{propagate, RateParameters};
use crate::phylogeny::{NodeId, Phylogeny};
use crate::speciation::combine;

/// Converts a branch length into a whole number of movement steps:
/// `round(length / step_size)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepRule {
    pub step_size: f64,
}

impl StepRule {
    pub fn per_unit(step_size: f64) -> Self {
        Self { step_size }
    }

    /// One movement step per unit of branch length.
    pub fn unit() -> Self {
        Self { step_size: 1.0 }
    }

    /// Step count for one branch. `node` names the branch's lower endpoint
    /// for error reporting. A zero or non-finite step size fails as an
    /// invalid rule; a finite negative count (negative step size) fails as
    /// a negative step count.
    pub fn steps_for(&self, node: &str, branch_length: f64) -> Result<u64, ModelError> {
        let raw = (branch_length / self.step_size).round();
        if !raw.is_finite() {
            return Err(ModelError::InvalidStepRule {
                node: node.to_string(),
                length: branch_length,
                step_size: self.step_size,
            });
        }
        if raw < 0.0 {
            return Err(ModelError::NegativeStepCount {
                node: node.to_string(),
                length: branch_length,
                steps: raw as i64,
            });
        }
        Ok(raw as u64)
    }
}

/// Output of a reconstruction: one intensity grid per internal node,
/// keyed by node label, with the root's label recorded separately.
#[derive(Debug, Clone)]
pub struct Reconstruction {
    pub node_grids: BTreeMap<String, Grid>,
    pub root_label: String,
}

impl Reconstruction {
    pub fn root_grid(&self) -> &Grid {
        &self.node_grids[&self.root_label]
    }
}

/// Runs reconstructions against one fixed environment and parameter set.
/// The environment and rates are shared read-only by every branch.
pub struct Reconstructor {
    environment: Grid,
    rates: RateParameters,
    steps: StepRule,
}

impl Reconstructor {
    pub fn new(environment: Grid, rates: RateParameters, steps: StepRule) -> Self {
        Self {
            environment,
            rates,
            steps,
        }
    }

    /// Reconstruct ancestral ranges for `tree` from the observed `tips`
    /// (leaf label -> 0/1 range grid).
    pub fn reconstruct(
        &self,
        tree: &Phylogeny,
        tips: &BTreeMap<String, Grid>,
    ) -> Result<Reconstruction, ModelError> {
        let branch_steps = self.validate(tree, tips)?;

        let mut states: Vec<Option<Grid>> = vec![None; tree.len()];
        let mut node_grids = BTreeMap::new();
        for id in tree.post_order() {
            let node = tree.node(id);
            match node.children {
                None => {
                    states[id] = Some(tips[&node.label].clone());
                }
                Some((left, right)) => {
                    let arrived_left = self.propagate_child(tree, &mut states, left, &branch_steps)?;
                    let arrived_right =
                        self.propagate_child(tree, &mut states, right, &branch_steps)?;
                    let parent_grid = combine(&arrived_left, &arrived_right, &node.label)?;
                    node_grids.insert(node.label.clone(), parent_grid.clone());
                    states[id] = Some(parent_grid);
                }
            }
        }

        Ok(Reconstruction {
            node_grids,
            root_label: tree.node(tree.root()).label.clone(),
        })
    }

    /// Propagate a resolved child's grid up its branch by the branch's own
    /// step count.
    fn propagate_child(
        &self,
        tree: &Phylogeny,
        states: &mut [Option<Grid>],
        child: NodeId,
        branch_steps: &[u64],
    ) -> Result<Grid, ModelError> {
        let label = &tree.node(child).label;
        let grid = states[child]
            .take()
            .ok_or_else(|| ModelError::InvalidTopology {
                node: label.clone(),
                reason: "node visited before its children were resolved".to_string(),
            })?;
        propagate(&grid, &self.environment, self.rates, branch_steps[child])
    }

    /// Pre-flight checks: every leaf has a tip grid of the run's dimensions,
    /// and every branch maps to a valid step count. Returns per-node step
    /// counts indexed by node id (the root entry is unused).
    fn validate(
        &self,
        tree: &Phylogeny,
        tips: &BTreeMap<String, Grid>,
    ) -> Result<Vec<u64>, ModelError> {
        let root = tree.node(tree.root());
        if root.is_leaf() {
            return Err(ModelError::InvalidTopology {
                node: root.label.clone(),
                reason: "tree has no internal node; a reconstruction needs at least one speciation event"
                    .to_string(),
            });
        }

        for id in tree.leaves() {
            let label = &tree.node(id).label;
            let tip = tips.get(label).ok_or_else(|| ModelError::InvalidTopology {
                node: label.clone(),
                reason: "no tip grid supplied for this leaf".to_string(),
            })?;
            self.environment
                .check_same_dims(tip, &format!("tip grid for {label}"))?;
        }

        let mut branch_steps = vec![0; tree.len()];
        for id in 0..tree.len() {
            let node = tree.node(id);
            if node.parent.is_some() {
                branch_steps[id] = self.steps.steps_for(&node.label, node.branch_length)?;
            }
        }
        Ok(branch_steps)
    }
}
