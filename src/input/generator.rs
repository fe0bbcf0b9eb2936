//! Code for reading generators from a CSV file.
use super::*;
use crate::carrier::CarrierID;
use crate::generator::{CapacityConfig, GeneratorConfig, GeneratorID, availability_from_raw};
use crate::input::timeseries::TimeSeriesTable;
use crate::network::BusID;
use crate::units::{Dimensionless, MoneyPerEnergy, MoneyPerPower, Power};
use log::warn;
use serde::Deserialize;
use std::path::Path;

const GENERATORS_FILE_NAME: &str = "generators.csv";

/// A row of the generators CSV file
#[derive(PartialEq, Debug, Clone, Deserialize)]
pub struct GeneratorRaw {
    /// A unique identifier for the generator
    pub id: GeneratorID,
    /// The category of energy source
    pub carrier: CarrierID,
    /// Nameplate capacity (MW)
    pub p_nom: Power,
    /// Minimum capacity, if extendable
    pub p_nom_min: Option<Power>,
    /// Maximum capacity, if extendable
    pub p_nom_max: Option<Power>,
    /// Whether capacity is chosen by the optimisation
    pub p_nom_extendable: bool,
    /// Annualised cost per MW of capacity
    pub capital_cost: MoneyPerPower,
    /// Cost per MWh dispatched
    pub marginal_cost: MoneyPerEnergy,
    /// Ratio of electrical output to primary energy input
    pub efficiency: Dimensionless,
    /// Time series column holding raw availability (MW), for variable generators
    pub p_max_pu_column: Option<String>,
    /// Capacity that raw availability is divided by (defaults to `p_nom`)
    pub p_max_pu_normalisation: Option<Power>,
}

impl GeneratorRaw {
    /// Convert into a [`GeneratorConfig`], looking up availability in the time series table
    pub fn into_config(self, bus: &BusID, table: &TimeSeriesTable) -> Result<GeneratorConfig> {
        let p_max_pu = match &self.p_max_pu_column {
            Some(column) => {
                let raw = table.column(column)?;
                let normalisation = self.p_max_pu_normalisation.unwrap_or(self.p_nom);
                let profile = availability_from_raw(&raw, normalisation).with_context(|| {
                    format!("Invalid availability in column {column} for generator {}", self.id)
                })?;
                Some(profile)
            }
            None => {
                if self.p_max_pu_normalisation.is_some() {
                    warn!(
                        "p_max_pu_normalisation is ignored for generator {} as it has no \
                        p_max_pu_column",
                        self.id
                    );
                }
                None
            }
        };

        Ok(GeneratorConfig {
            id: self.id,
            bus: bus.clone(),
            carrier: self.carrier,
            capacity: CapacityConfig {
                p_nom: self.p_nom,
                p_nom_min: self.p_nom_min,
                p_nom_max: self.p_nom_max,
                p_nom_extendable: self.p_nom_extendable,
            },
            capital_cost: self.capital_cost,
            marginal_cost: self.marginal_cost,
            efficiency: self.efficiency,
            p_max_pu,
        })
    }
}

/// Read generators from a CSV file.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
///
/// # Returns
///
/// The rows of the generators file, in order, or an error
pub fn read_generators(model_dir: &Path) -> Result<Vec<GeneratorRaw>> {
    let file_path = model_dir.join(GENERATORS_FILE_NAME);
    Ok(read_csv(&file_path)?.collect())
}
