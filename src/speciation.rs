//! The speciation function: combining sibling grids at an internal node
//!
//! Each sibling's propagated grid is first divided by its own maximum, so
//! neither lineage dominates just because it started from a larger range,
//! and magnitudes stay stable across deep trees. The element-wise product
//! then favors cells where both lineages' possibility fields overlap: the
//! ancestral range is the intersection-weighted overlap of the descendants,
//! not their union. Normalization does discard relative confidence between
//! long and short branches; that is a known property of the model, kept
//! as-is.

use crate::error::ModelError;
use crate::grid::Grid;

/// Combine two sibling grids into their parent's grid. `node` names the
/// parent for error reporting.
pub fn combine(a: &Grid, b: &Grid, node: &str) -> Result<Grid, ModelError> {
    a.check_same_dims(b, &format!("combine at {node}"))?;
    let degenerate = || ModelError::DegenerateNormalization {
        node: node.to_string(),
    };
    let a_norm = a.normalized().ok_or_else(degenerate)?;
    let b_norm = b.normalized().ok_or_else(degenerate)?;

    let (rows, cols) = a.dims();
    Ok(Grid::from_fn(rows, cols, |r, c| {
        a_norm.get(r, c) * b_norm.get(r, c)
    }))
}
