//! The model represents the static input data provided by the user.
use crate::input::carrier::read_carriers;
use crate::input::generator::read_generators;
use crate::input::input_err_msg;
use crate::input::timeseries::TimeSeriesTable;
use crate::network::{Network, NetworkBuilder};
use crate::optimisation::Solution;
use crate::snapshot::SnapshotInfo;
use crate::units::Power;
use anyhow::{Context, Result};
use log::info;
use std::path::{Path, PathBuf};

pub mod parameters;
pub use parameters::ModelParameters;

/// Model definition
#[derive(Debug)]
pub struct Model {
    /// Path to model folder
    pub model_path: PathBuf,
    /// Parameters from the model TOML file
    pub parameters: ModelParameters,
    /// The assembled network, ready to be optimised
    pub network: Network,
}

impl Model {
    /// Read a model from the specified directory and assemble its network.
    ///
    /// # Arguments
    ///
    /// * `model_dir` - Folder containing model configuration files
    pub fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<Model> {
        let model_dir = model_dir.as_ref();
        let parameters = ModelParameters::from_path(model_dir)?;

        let timeseries_path = parameters.timeseries_path(model_dir);
        let table = TimeSeriesTable::from_path(&timeseries_path, &parameters.snapshot_column)?;
        info!(
            "Read {} snapshots from {}",
            table.len(),
            timeseries_path.display()
        );
        let network = assemble_network(&parameters, &table)
            .with_context(|| input_err_msg(&timeseries_path))?;

        Ok(Model {
            model_path: model_dir.to_path_buf(),
            network: add_components(model_dir, network, &parameters, &table)?,
            parameters,
        })
    }

    /// Solve the capacity expansion problem for this model.
    ///
    /// # Arguments
    ///
    /// * `log_to_console` - Whether the solver should print its own log
    pub fn solve(&self, log_to_console: bool) -> Result<Solution> {
        let mut options = self.parameters.solver_options.clone();
        options.log_to_console = log_to_console;
        self.network.optimise(self.parameters.solver, &options)
    }
}

/// Start building the network: the bus, the snapshots and the load
fn assemble_network(
    parameters: &ModelParameters,
    table: &TimeSeriesTable,
) -> Result<NetworkBuilder> {
    let mut builder = NetworkBuilder::new();
    builder.add_bus(parameters.bus.clone())?;

    let snapshots = SnapshotInfo::new(table.snapshots().to_vec(), parameters.snapshot_weighting)
        .context("Invalid snapshots")?;
    builder.set_snapshots(snapshots)?;

    let demand = table
        .column(&parameters.load.column)?
        .into_iter()
        .map(Power)
        .collect();
    builder.add_load(parameters.load.id.clone(), &parameters.bus, demand)?;

    Ok(builder)
}

/// Add carriers and generators to the network and finish building it
fn add_components(
    model_dir: &Path,
    mut builder: NetworkBuilder,
    parameters: &ModelParameters,
    table: &TimeSeriesTable,
) -> Result<Network> {
    let carriers = read_carriers(model_dir)?;
    let carriers_path = model_dir.join("carriers.csv");
    for carrier in carriers {
        builder
            .add_carrier(carrier)
            .with_context(|| input_err_msg(&carriers_path))?;
    }

    let generators = read_generators(model_dir)?;
    let generators_path = model_dir.join("generators.csv");
    for generator in generators {
        let config = generator
            .into_config(&parameters.bus, table)
            .with_context(|| input_err_msg(&generators_path))?;
        builder
            .add_generator(config)
            .with_context(|| input_err_msg(&generators_path))?;
    }

    builder.build()
}
