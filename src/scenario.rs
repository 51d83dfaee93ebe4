//! Scenario files: everything one reconstruction run needs
//!
//! A scenario is a YAML document naming the environment grid, the observed
//! tip ranges (as paths to delimited-text grid files) and the tree, plus the
//! movement rates and the step-size granularity.

use std::collections::BTreeMap;
use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::grid::Grid;
use crate::movement::RateParameters;
use crate::phylogeny::{Phylogeny, TreeSpec};
use crate::reconstruct::StepRule;

fn default_step_size() -> f64 {
    1.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub description: Option<String>,
    pub alpha: f64,
    pub beta: f64,
    /// Branch-length units per movement step.
    #[serde(default = "default_step_size")]
    pub step_size: f64,
    /// Path to the environment grid, relative to the loader's base dir.
    pub environment: PathBuf,
    pub tips: Vec<TipRange>,
    pub tree: TreeSpec,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TipRange {
    pub label: String,
    /// Path to the 0/1 range grid for this tip.
    pub range: PathBuf,
}

impl Scenario {
    pub fn rates(&self) -> RateParameters {
        RateParameters::new(self.alpha, self.beta)
    }

    pub fn step_rule(&self) -> StepRule {
        StepRule::per_unit(self.step_size)
    }

    /// Non-fatal issues worth telling the user about before a run.
    pub fn warnings(&self) -> Vec<String> {
        self.rates().domain_warnings()
    }
}

/// Fully loaded inputs for one reconstruction run.
#[derive(Debug)]
pub struct RunInputs {
    pub tree: Phylogeny,
    pub environment: Grid,
    pub tips: BTreeMap<String, Grid>,
    pub rates: RateParameters,
    pub steps: StepRule,
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("failed to read scenario file {}", path.display()))?;
        let scenario: Scenario = serde_yaml::from_str(&data)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(scenario)
    }

    /// Resolve the scenario's grid paths, read the grids and build the tree.
    pub fn build_inputs(&self, scenario: &Scenario) -> Result<RunInputs> {
        if !(scenario.step_size.is_finite() && scenario.step_size > 0.0) {
            bail!(
                "scenario '{}': step_size must be a positive number, got {}",
                scenario.name,
                scenario.step_size
            );
        }

        let environment = Grid::read_from(&self.base_dir.join(&scenario.environment))
            .with_context(|| format!("scenario '{}': environment grid", scenario.name))?;

        let mut tips = BTreeMap::new();
        for tip in &scenario.tips {
            let grid = Grid::read_from(&self.base_dir.join(&tip.range))
                .with_context(|| format!("scenario '{}': tip '{}'", scenario.name, tip.label))?;
            if tips.insert(tip.label.clone(), grid).is_some() {
                bail!(
                    "scenario '{}': tip '{}' is listed twice",
                    scenario.name,
                    tip.label
                );
            }
        }

        let tree = Phylogeny::from_spec(&scenario.tree)
            .with_context(|| format!("scenario '{}': tree", scenario.name))?;

        Ok(RunInputs {
            tree,
            environment,
            tips,
            rates: scenario.rates(),
            steps: scenario.step_rule(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL_YAML: &str = "\
name: minimal
alpha: 0.4
beta: 0.9
environment: env.txt
tips:
  - label: A
    range: a.txt
  - label: B
    range: b.txt
tree:
  children:
    - label: A
      branch_length: 2.0
    - label: B
      branch_length: 3.0
";

    #[test]
    fn minimal_scenario_parses_with_defaults() {
        let scenario: Scenario = serde_yaml::from_str(MINIMAL_YAML).unwrap();
        assert_eq!(scenario.name, "minimal");
        assert_eq!(scenario.step_size, 1.0);
        assert!(scenario.description.is_none());
        assert_eq!(scenario.tips.len(), 2);
        assert_eq!(scenario.tree.children.len(), 2);
        assert!(scenario.warnings().is_empty());
    }

    #[test]
    fn out_of_range_rates_produce_warnings() {
        let yaml = MINIMAL_YAML.replace("alpha: 0.4", "alpha: 1.4");
        let scenario: Scenario = serde_yaml::from_str(&yaml).unwrap();
        let warnings = scenario.warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("alpha"));
    }

    #[test]
    fn inputs_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("env.txt"), "1 1\n1 1\n").unwrap();
        fs::write(dir.path().join("a.txt"), "1 0\n0 0\n").unwrap();
        fs::write(dir.path().join("b.txt"), "0 0\n0 1\n").unwrap();
        fs::write(dir.path().join("run.yaml"), MINIMAL_YAML).unwrap();

        let loader = ScenarioLoader::new(dir.path());
        let scenario = loader.load("run.yaml").unwrap();
        let inputs = loader.build_inputs(&scenario).unwrap();

        assert_eq!(inputs.environment.dims(), (2, 2));
        assert_eq!(inputs.tips.len(), 2);
        assert_eq!(inputs.tips["A"].get(0, 0), 1.0);
        assert_eq!(inputs.tree.leaves().count(), 2);
        assert_eq!(inputs.rates, RateParameters::new(0.4, 0.9));
    }

    #[test]
    fn zero_step_size_is_rejected() {
        let dir = tempfile::tempdir().unwrap();

        let yaml = format!("{MINIMAL_YAML}step_size: 0.0\n");
        let scenario: Scenario = serde_yaml::from_str(&yaml).unwrap();
        let loader = ScenarioLoader::new(dir.path());
        let err = loader.build_inputs(&scenario).unwrap_err();
        assert!(err.to_string().contains("step_size"));
    }

    #[test]
    fn missing_grid_file_carries_tip_context() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("env.txt"), "1\n").unwrap();

        let scenario: Scenario = serde_yaml::from_str(MINIMAL_YAML).unwrap();
        let loader = ScenarioLoader::new(dir.path());
        let err = loader.build_inputs(&scenario).unwrap_err();
        assert!(format!("{err:#}").contains("tip 'A'"));
    }
}
