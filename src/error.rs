//! Error types shared across the reconstruction pipeline

use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong while building inputs or running a
/// reconstruction. All variants carry enough context (node label, file
/// path) to point at the offending piece of input; none are recoverable.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Two grids that must share the run's fixed dimensions do not.
    #[error("{context}: expected a {}x{} grid, got {}x{}", expected.0, expected.1, found.0, found.1)]
    DimensionMismatch {
        expected: (usize, usize),
        found: (usize, usize),
        context: String,
    },

    /// The tree is not a strictly binary rooted tree, or a leaf has no
    /// matching tip grid.
    #[error("invalid topology at {node}: {reason}")]
    InvalidTopology { node: String, reason: String },

    /// A grid arriving at a speciation node is all zero, so dividing by
    /// its maximum is undefined. The model has no principled recovery.
    #[error("cannot normalize all-zero grid at {node}")]
    DegenerateNormalization { node: String },

    /// A branch length mapped to a negative number of movement steps.
    #[error("branch above {node} (length {length}) yields negative step count {steps}")]
    NegativeStepCount {
        node: String,
        length: f64,
        steps: i64,
    },

    /// A step rule produced no finite step count at all, e.g. a zero or
    /// non-finite step size.
    #[error("branch above {node} (length {length}): step size {step_size} yields no finite step count")]
    InvalidStepRule {
        node: String,
        length: f64,
        step_size: f64,
    },

    /// Reading or writing a grid file failed at the OS level.
    #[error("grid file {path}: {source}")]
    GridIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A grid file contained a token that is not a number.
    #[error("grid file {path}, line {line}: cannot parse {token:?} as a number")]
    GridParse {
        path: PathBuf,
        line: usize,
        token: String,
    },

    /// A grid file contained a cell that is not a non-negative number.
    /// Intensities and suitabilities are bounded below by zero.
    #[error("grid file {path}, line {line}: value {value} is not a non-negative number")]
    NegativeCell {
        path: PathBuf,
        line: usize,
        value: f64,
    },

    /// A grid file's rows do not all have the same number of cells.
    #[error("grid file {path}, line {line}: {found} values, expected {expected}")]
    RaggedGrid {
        path: PathBuf,
        line: usize,
        expected: usize,
        found: usize,
    },
}
