//! Strictly binary rooted phylogenies
//!
//! Trees are stored as a flat arena of nodes with preorder ids; the nested
//! [`TreeSpec`] form is what scenarios deserialize. Construction validates
//! everything the traversal relies on, so downstream code can assume a
//! well-formed binary tree.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::ModelError;

pub type NodeId = usize;

/// One node of a built phylogeny. `branch_length` is the length of the edge
/// above this node (unused for the root).
#[derive(Debug, Clone)]
pub struct PhyloNode {
    pub label: String,
    pub branch_length: f64,
    pub parent: Option<NodeId>,
    pub children: Option<(NodeId, NodeId)>,
}

impl PhyloNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }
}

/// Nested tree description as it appears in scenario files. A node is either
/// a leaf (has `label`, no `children`) or an internal node with exactly two
/// children. `branch_length` defaults to 0 and is ignored on the root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeSpec {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub branch_length: f64,
    #[serde(default)]
    pub children: Vec<TreeSpec>,
}

impl TreeSpec {
    pub fn leaf(label: &str, branch_length: f64) -> Self {
        Self {
            label: Some(label.to_string()),
            branch_length,
            children: Vec::new(),
        }
    }

    pub fn internal(branch_length: f64, left: TreeSpec, right: TreeSpec) -> Self {
        Self {
            label: None,
            branch_length,
            children: vec![left, right],
        }
    }
}

/// A validated, rooted, strictly binary tree.
#[derive(Debug, Clone)]
pub struct Phylogeny {
    nodes: Vec<PhyloNode>,
    root: NodeId,
}

impl Phylogeny {
    /// Build and validate a phylogeny from its nested description.
    ///
    /// Internal nodes get deterministic preorder names `node00`, `node01`,
    /// ... (the root is always `node00`); leaves keep their spec labels.
    /// Fails on nodes with one or more than two children, leaves without a
    /// label, duplicate labels, and negative or non-finite branch lengths.
    pub fn from_spec(spec: &TreeSpec) -> Result<Self, ModelError> {
        let mut tree = Phylogeny {
            nodes: Vec::new(),
            root: 0,
        };
        tree.push_subtree(spec, None)?;

        let mut seen = HashSet::new();
        for node in &tree.nodes {
            if !seen.insert(node.label.as_str()) {
                return Err(ModelError::InvalidTopology {
                    node: node.label.clone(),
                    reason: "duplicate node label".to_string(),
                });
            }
        }
        Ok(tree)
    }

    fn push_subtree(
        &mut self,
        spec: &TreeSpec,
        parent: Option<NodeId>,
    ) -> Result<NodeId, ModelError> {
        let id = self.nodes.len();
        let label = match &spec.label {
            Some(label) => label.clone(),
            None if spec.children.is_empty() => {
                return Err(ModelError::InvalidTopology {
                    node: format!("node{id:02}"),
                    reason: "leaf without a label".to_string(),
                })
            }
            None => format!("node{id:02}"),
        };
        if !spec.branch_length.is_finite() || spec.branch_length < 0.0 {
            return Err(ModelError::InvalidTopology {
                node: label,
                reason: format!("branch length {} is not a non-negative number", spec.branch_length),
            });
        }
        self.nodes.push(PhyloNode {
            label: label.clone(),
            branch_length: spec.branch_length,
            parent,
            children: None,
        });

        match spec.children.len() {
            0 => {}
            2 => {
                let left = self.push_subtree(&spec.children[0], Some(id))?;
                let right = self.push_subtree(&spec.children[1], Some(id))?;
                self.nodes[id].children = Some((left, right));
            }
            n => {
                return Err(ModelError::InvalidTopology {
                    node: label,
                    reason: format!("{n} children; binary speciation requires 0 or 2"),
                })
            }
        }
        Ok(id)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, id: NodeId) -> &PhyloNode {
        &self.nodes[id]
    }

    pub fn leaves(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).filter(|&id| self.nodes[id].is_leaf())
    }

    pub fn internal_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).filter(|&id| !self.nodes[id].is_leaf())
    }

    /// Node ids in strict post-order: both children before their parent,
    /// left child's subtree before the right child's, root last.
    pub fn post_order(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![(self.root, false)];
        while let Some((id, children_done)) = stack.pop() {
            if children_done {
                order.push(id);
                continue;
            }
            stack.push((id, true));
            if let Some((left, right)) = self.nodes[id].children {
                stack.push((right, false));
                stack.push((left, false));
            }
        }
        order
    }
}
