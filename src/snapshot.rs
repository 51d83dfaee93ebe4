//! Persisting reconstruction output
//!
//! A run writes into `<output_dir>/<scenario_name>/`: one delimited-text
//! grid file per internal node (named after the node's label) plus a
//! `metadata.json` describing the run, so output directories are
//! self-describing when inspected later.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::movement::RateParameters;
use crate::reconstruct::{Reconstruction, StepRule};

#[derive(Debug, Serialize)]
struct RunMetadata<'a> {
    scenario: &'a str,
    generated_at: DateTime<Utc>,
    alpha: f64,
    beta: f64,
    step_size: f64,
    grid_rows: usize,
    grid_cols: usize,
    root_node: &'a str,
    internal_nodes: Vec<&'a str>,
}

pub struct SnapshotWriter {
    output_dir: PathBuf,
}

impl SnapshotWriter {
    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    /// Write every internal-node grid and the run metadata. Returns the
    /// directory the run was written to.
    pub fn write_run(
        &self,
        scenario_name: &str,
        rates: RateParameters,
        steps: StepRule,
        reconstruction: &Reconstruction,
    ) -> Result<PathBuf> {
        let dir = self.output_dir.join(scenario_name);
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create output dir {}", dir.display()))?;

        for (label, grid) in &reconstruction.node_grids {
            let path = dir.join(format!("{label}.txt"));
            grid.write_to(&path)
                .with_context(|| format!("failed to write grid for node {label}"))?;
        }

        let (grid_rows, grid_cols) = reconstruction.root_grid().dims();
        let metadata = RunMetadata {
            scenario: scenario_name,
            generated_at: Utc::now(),
            alpha: rates.alpha,
            beta: rates.beta,
            step_size: steps.step_size,
            grid_rows,
            grid_cols,
            root_node: &reconstruction.root_label,
            internal_nodes: reconstruction.node_grids.keys().map(String::as_str).collect(),
        };
        let metadata_path = dir.join("metadata.json");
        let json = serde_json::to_string_pretty(&metadata)?;
        fs::write(&metadata_path, json)
            .with_context(|| format!("failed to write {}", metadata_path.display()))?;

        Ok(dir)
    }
}
