//! Defines the `ModelParameters` struct, which represents the contents of `model.toml`.
use crate::input::{deserialise_positive, input_err_msg, read_toml};
use crate::network::{BusID, LoadID};
use crate::optimisation::{SolverBackend, SolverOptions};
use crate::units::Hours;
use anyhow::{Context, Result, ensure};
use log::warn;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const MODEL_PARAMETERS_FILE_NAME: &str = "model.toml";

macro_rules! define_unit_param_default {
    ($name:ident, $type: ty, $value: expr) => {
        fn $name() -> $type {
            <$type>::new($value)
        }
    };
}

macro_rules! define_param_default {
    ($name:ident, $type: ty, $value: expr) => {
        fn $name() -> $type {
            $value
        }
    };
}

define_unit_param_default!(default_snapshot_weighting, Hours, 1.0);
define_unit_param_default!(default_bus, BusID, "electricity");
define_unit_param_default!(default_load_id, LoadID, "demand");
define_param_default!(default_snapshot_column, String, "snapshot".into());
define_param_default!(default_load_column, String, "STATE_DEMAND".into());
define_param_default!(default_cost_scale, f64, 1e6);
define_param_default!(default_cost_unit, String, "Million Rupees per Year".into());

/// Represents the contents of the entire model file.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ModelParameters {
    /// Path to the CSV file containing demand and availability time series.
    ///
    /// Relative paths are resolved against the model directory.
    pub timeseries_file: PathBuf,
    /// Name of the time series column holding snapshot timestamps
    #[serde(default = "default_snapshot_column")]
    pub snapshot_column: String,
    /// The duration represented by each snapshot
    #[serde(default = "default_snapshot_weighting")]
    pub snapshot_weighting: Hours,
    /// The name of the single bus
    #[serde(default = "default_bus")]
    pub bus: BusID,
    /// The demand attached to the bus
    #[serde(default)]
    pub load: LoadParameters,
    /// The solver used for the optimisation
    #[serde(default)]
    pub solver: SolverBackend,
    /// Options passed to the solver
    #[serde(default)]
    pub solver_options: SolverOptions,
    /// The total system cost is divided by this when reported
    #[serde(default = "default_cost_scale")]
    #[serde(deserialize_with = "deserialise_positive")]
    pub cost_scale: f64,
    /// The unit label for the reported total system cost
    #[serde(default = "default_cost_unit")]
    pub cost_unit: String,
}

/// The `[load]` section of the model file
#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LoadParameters {
    /// A unique identifier for the load
    #[serde(default = "default_load_id")]
    pub id: LoadID,
    /// Name of the time series column holding demand (MW)
    #[serde(default = "default_load_column")]
    pub column: String,
}

impl Default for LoadParameters {
    fn default() -> Self {
        Self {
            id: default_load_id(),
            column: default_load_column(),
        }
    }
}

/// Check that the `snapshot_weighting` parameter is valid
fn check_snapshot_weighting(value: Hours) -> Result<()> {
    ensure!(
        value.is_finite() && value > Hours(0.0),
        "snapshot_weighting must be a finite number greater than zero"
    );

    Ok(())
}

impl ModelParameters {
    /// Read a model file from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `model_dir` - Folder containing model configuration files
    ///
    /// # Returns
    ///
    /// The model file contents as a [`ModelParameters`] struct or an error if the file is invalid
    pub fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<ModelParameters> {
        let file_path = model_dir.as_ref().join(MODEL_PARAMETERS_FILE_NAME);
        let model_params: ModelParameters = read_toml(&file_path)?;

        model_params
            .validate()
            .with_context(|| input_err_msg(file_path))?;

        Ok(model_params)
    }

    /// The path to the time series file, resolved against the model directory
    pub fn timeseries_path(&self, model_dir: &Path) -> PathBuf {
        model_dir.join(&self.timeseries_file)
    }

    /// Validate parameters after reading in file
    fn validate(&self) -> Result<()> {
        // snapshot_weighting
        check_snapshot_weighting(self.snapshot_weighting)?;

        // cost_scale already validated with deserialise_positive

        self.solver_options.validate()?;

        if self.snapshot_column == self.load.column {
            warn!(
                "The load column is the same as the snapshot column ({})",
                self.snapshot_column
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use crate::optimisation::SolverAlgorithm;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_model_file(dir_path: &Path, contents: &str) {
        let mut file = File::create(dir_path.join(MODEL_PARAMETERS_FILE_NAME)).unwrap();
        writeln!(file, "{contents}").unwrap();
    }

    #[test]
    fn test_model_params_from_path_defaults() {
        let dir = tempdir().unwrap();
        write_model_file(dir.path(), "timeseries_file = \"data.csv\"");

        let model_params = ModelParameters::from_path(dir.path()).unwrap();
        assert_eq!(model_params.timeseries_file, PathBuf::from("data.csv"));
        assert_eq!(model_params.snapshot_column, "snapshot");
        assert_eq!(model_params.snapshot_weighting, Hours(1.0));
        assert_eq!(model_params.bus, "electricity".into());
        assert_eq!(model_params.load, LoadParameters::default());
        assert_eq!(model_params.solver, SolverBackend::Highs);
        assert_eq!(model_params.solver_options, SolverOptions::default());
        assert_approx_eq!(f64, model_params.cost_scale, 1e6);
        assert_eq!(model_params.cost_unit, "Million Rupees per Year");
        assert_eq!(
            model_params.timeseries_path(dir.path()),
            dir.path().join("data.csv")
        );
    }

    #[test]
    fn test_model_params_from_path() {
        let dir = tempdir().unwrap();
        write_model_file(
            dir.path(),
            "timeseries_file = \"data.csv\"
snapshot_column = \"time\"
snapshot_weighting = 2.0
bus = \"grid\"
solver = \"highs\"
cost_scale = 1e3
cost_unit = \"Thousand Euros per Year\"

[load]
id = \"load\"
column = \"DEMAND\"

[solver_options]
solver = \"ipm\"
random_seed = 42",
        );

        let model_params = ModelParameters::from_path(dir.path()).unwrap();
        assert_eq!(model_params.snapshot_column, "time");
        assert_eq!(model_params.snapshot_weighting, Hours(2.0));
        assert_eq!(model_params.bus, "grid".into());
        assert_eq!(model_params.load.id, "load".into());
        assert_eq!(model_params.load.column, "DEMAND");
        assert_eq!(
            model_params.solver_options.solver,
            Some(SolverAlgorithm::InteriorPoint)
        );
        assert_eq!(model_params.solver_options.random_seed, Some(42));
        assert_approx_eq!(f64, model_params.cost_scale, 1e3);
    }

    #[rstest]
    #[case("solver = \"cplex\"")]
    #[case("cost_scale = 0")]
    #[case("unknown_key = 1")]
    #[case("[solver_options]\ntime_limit = 10.0")]
    #[case("[solver_options]\nthreads = 0")]
    #[case("[solver_options]\nrandom_seed = -1")]
    #[case("[solver_options]\nprimal_feasibility_tolerance = 0.0")]
    #[case("[solver_options]\nprimal_feasibility_tolerance = -1e-7")]
    #[case("[solver_options]\nprimal_feasibility_tolerance = nan")]
    #[case("[solver_options]\ndual_feasibility_tolerance = 1e-12")]
    #[case("[solver_options]\ndual_feasibility_tolerance = inf")]
    fn test_model_params_from_path_invalid(#[case] extra: &str) {
        let dir = tempdir().unwrap();
        write_model_file(
            dir.path(),
            &format!("timeseries_file = \"data.csv\"\n{extra}"),
        );
        assert!(ModelParameters::from_path(dir.path()).is_err());
    }

    #[test]
    fn test_model_params_from_path_missing_timeseries_file() {
        let dir = tempdir().unwrap();
        write_model_file(dir.path(), "bus = \"electricity\"");
        assert!(ModelParameters::from_path(dir.path()).is_err());
    }

    #[rstest]
    #[case(0.5, true)]
    #[case(1.0, true)]
    #[case(0.0, false)]
    #[case(-1.0, false)]
    #[case(f64::INFINITY, false)]
    #[case(f64::NAN, false)]
    fn test_check_snapshot_weighting(#[case] value: f64, #[case] expected_valid: bool) {
        let result = check_snapshot_weighting(Hours(value));
        if expected_valid {
            assert!(result.is_ok());
        } else {
            assert_error!(
                result,
                "snapshot_weighting must be a finite number greater than zero"
            );
        }
    }
}
