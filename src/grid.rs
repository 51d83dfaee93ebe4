//! Rectangular intensity grids and their on-disk text format
//!
//! A [`Grid`] holds per-cell, non-negative occupancy intensities in row-major
//! order. Tip ranges are 0/1 indicator grids; everything the engine produces
//! from them is an unnormalized intensity field.

use std::fs;
use std::path::Path;

use crate::error::ModelError;

/// 2D array of non-negative intensities with fixed dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<f64>,
}

impl Grid {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![0.0; rows * cols],
        }
    }

    /// Build a grid by evaluating `f(row, col)` for every cell.
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> f64) -> Self {
        let mut cells = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for col in 0..cols {
                cells.push(f(row, col));
            }
        }
        Self { rows, cols, cells }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.cells[row * self.cols + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.cells[row * self.cols + col] = value;
    }

    /// Largest cell value. Zero for an all-zero grid.
    pub fn max_value(&self) -> f64 {
        self.cells.iter().fold(0.0_f64, |acc, &v| acc.max(v))
    }

    /// Cell holding the maximum value, first in row-major order on ties.
    pub fn argmax(&self) -> (usize, usize) {
        let mut best = (0, 0);
        let mut best_value = f64::NEG_INFINITY;
        for row in 0..self.rows {
            for col in 0..self.cols {
                let v = self.get(row, col);
                if v > best_value {
                    best_value = v;
                    best = (row, col);
                }
            }
        }
        best
    }

    /// Divide every cell by the grid maximum, so the new maximum is 1.
    /// Returns `None` for an all-zero grid, where the division is undefined.
    pub fn normalized(&self) -> Option<Grid> {
        let max = self.max_value();
        if max == 0.0 {
            return None;
        }
        let mut out = self.clone();
        for cell in &mut out.cells {
            *cell /= max;
        }
        Some(out)
    }

    /// Sum of the up-to-8 neighbors of `(row, col)`, excluding the cell
    /// itself. The 3x3 block is clamped at the grid boundary, so interior
    /// cells sum 8 values, edge cells 5 and corner cells 3. Summation runs
    /// in row-major order, which fixes the floating-point result.
    pub fn neighborhood_sum(&self, row: usize, col: usize) -> f64 {
        let row_start = row.saturating_sub(1);
        let row_end = (row + 1).min(self.rows - 1);
        let col_start = col.saturating_sub(1);
        let col_end = (col + 1).min(self.cols - 1);
        let mut sum = 0.0;
        for r in row_start..=row_end {
            for c in col_start..=col_end {
                sum += self.cells[r * self.cols + c];
            }
        }
        sum - self.cells[row * self.cols + col]
    }

    /// Check that `other` has the same dimensions as `self`.
    pub fn check_same_dims(&self, other: &Grid, context: &str) -> Result<(), ModelError> {
        if self.dims() != other.dims() {
            return Err(ModelError::DimensionMismatch {
                expected: self.dims(),
                found: other.dims(),
                context: context.to_string(),
            });
        }
        Ok(())
    }

    /// Read a grid from delimited text: one row per line, whitespace-separated
    /// cell values. Blank lines are ignored. Cells must be non-negative
    /// numbers.
    pub fn read_from(path: &Path) -> Result<Grid, ModelError> {
        let text = fs::read_to_string(path).map_err(|source| ModelError::GridIo {
            path: path.to_path_buf(),
            source,
        })?;
        let mut cells = Vec::new();
        let mut cols = None;
        let mut rows = 0;
        for (line_index, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let mut width = 0;
            for token in line.split_whitespace() {
                let value: f64 = token.parse().map_err(|_| ModelError::GridParse {
                    path: path.to_path_buf(),
                    line: line_index + 1,
                    token: token.to_string(),
                })?;
                // NaN also fails this comparison
                if !(value >= 0.0) {
                    return Err(ModelError::NegativeCell {
                        path: path.to_path_buf(),
                        line: line_index + 1,
                        value,
                    });
                }
                cells.push(value);
                width += 1;
            }
            let expected = *cols.get_or_insert(width);
            if width != expected {
                return Err(ModelError::RaggedGrid {
                    path: path.to_path_buf(),
                    line: line_index + 1,
                    expected,
                    found: width,
                });
            }
            rows += 1;
        }
        Ok(Grid {
            rows,
            cols: cols.unwrap_or(0),
            cells,
        })
    }

    /// Write the grid in the same delimited-text format `read_from` accepts.
    pub fn write_to(&self, path: &Path) -> Result<(), ModelError> {
        let mut text = String::new();
        for row in 0..self.rows {
            for col in 0..self.cols {
                if col > 0 {
                    text.push(' ');
                }
                text.push_str(&self.get(row, col).to_string());
            }
            text.push('\n');
        }
        fs::write(path, text).map_err(|source| ModelError::GridIo {
            path: path.to_path_buf(),
            source,
        })
    }
}
