//! Generators supply energy to a bus. Their nameplate capacity can be either fixed or chosen by the
//! optimisation within bounds.
use crate::carrier::CarrierID;
use crate::id::{define_id_getter, define_id_type};
use crate::network::BusID;
use crate::units::{Dimensionless, MoneyPerEnergy, MoneyPerPower, Power};
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use log::warn;

define_id_type! {GeneratorID}

/// A map of [`Generator`]s, keyed by generator ID
pub type GeneratorMap = IndexMap<GeneratorID, Generator>;

/// How the nameplate capacity of a generator is specified in input data.
///
/// Bounds are optional. Whether they are used at all depends on `p_nom_extendable`.
#[derive(PartialEq, Debug, Clone)]
pub struct CapacityConfig {
    /// Nameplate capacity. A reference value only, when the capacity is extendable.
    pub p_nom: Power,
    /// Minimum capacity, if extendable (defaults to zero)
    pub p_nom_min: Option<Power>,
    /// Maximum capacity, if extendable (defaults to unbounded)
    pub p_nom_max: Option<Power>,
    /// Whether the capacity is a decision variable of the optimisation
    pub p_nom_extendable: bool,
}

impl CapacityConfig {
    /// Check the configuration and convert it into a [`NominalCapacity`].
    ///
    /// Bounds given for a non-extendable generator are ignored.
    pub fn resolve(&self) -> Result<NominalCapacity> {
        ensure!(
            self.p_nom.is_finite() && self.p_nom >= Power(0.0),
            "p_nom must be a finite number greater than or equal to zero"
        );

        if !self.p_nom_extendable {
            if self.p_nom_min.is_some() || self.p_nom_max.is_some() {
                warn!(
                    "p_nom_min and p_nom_max are ignored when p_nom_extendable is false; \
                    capacity will be fixed at {} MW",
                    self.p_nom
                );
            }

            return Ok(NominalCapacity::Fixed(self.p_nom));
        }

        let min = self.p_nom_min.unwrap_or(Power(0.0));
        let max = self.p_nom_max.unwrap_or(Power(f64::INFINITY));
        ensure!(
            min.is_finite() && min >= Power(0.0),
            "p_nom_min must be a finite number greater than or equal to zero"
        );
        ensure!(
            !max.value().is_nan() && min <= max,
            "p_nom_min ({min}) must be less than or equal to p_nom_max ({max})"
        );

        Ok(NominalCapacity::Extendable {
            reference: self.p_nom,
            min,
            max,
        })
    }
}

/// The nameplate capacity of a generator, once validated
#[derive(PartialEq, Debug, Clone, Copy)]
pub enum NominalCapacity {
    /// Capacity is a fixed constant
    Fixed(Power),
    /// Capacity is a decision variable bounded by `min` and `max`
    Extendable {
        /// The input value of `p_nom`, kept for reporting
        reference: Power,
        /// Lower bound on capacity
        min: Power,
        /// Upper bound on capacity (may be infinite)
        max: Power,
    },
}

impl NominalCapacity {
    /// Whether the capacity is a decision variable
    pub fn is_extendable(&self) -> bool {
        matches!(self, Self::Extendable { .. })
    }

    /// The capacity given in input data
    pub fn reference(&self) -> Power {
        match *self {
            Self::Fixed(p_nom) => p_nom,
            Self::Extendable { reference, .. } => reference,
        }
    }

    /// The range of values the optimised capacity may take
    pub fn bounds(&self) -> (Power, Power) {
        match *self {
            Self::Fixed(p_nom) => (p_nom, p_nom),
            Self::Extendable { min, max, .. } => (min, max),
        }
    }
}

/// The maximum output of a generator at each snapshot, as a fraction of its capacity
#[derive(PartialEq, Debug, Clone)]
pub enum Availability {
    /// Can always run at full capacity
    Dispatchable,
    /// Output is limited by a per-snapshot profile (e.g. wind speed or irradiance)
    Variable(Vec<Dimensionless>),
}

impl Availability {
    /// Get the availability ceiling (`p_max_pu`) at the given snapshot index
    pub fn get(&self, snapshot: usize) -> Dimensionless {
        match self {
            Self::Dispatchable => Dimensionless(1.0),
            Self::Variable(profile) => profile[snapshot],
        }
    }
}

/// Convert a raw availability series into a fraction of capacity.
///
/// The normalisation constant is fixed. It is not updated if the optimised capacity of the
/// generator differs from it.
///
/// # Arguments
///
/// * `raw` - Available power at each snapshot
/// * `normalisation` - The capacity the raw series corresponds to
pub fn availability_from_raw(raw: &[f64], normalisation: Power) -> Result<Vec<Dimensionless>> {
    ensure!(
        normalisation.is_finite() && normalisation > Power(0.0),
        "Normalisation capacity for availability must be a finite number greater than zero"
    );

    let profile: Vec<_> = raw
        .iter()
        .map(|&value| Power(value) / normalisation)
        .collect();

    for (snapshot, value) in profile.iter().enumerate() {
        ensure!(
            value.is_finite() && *value >= Dimensionless(0.0),
            "Availability must be a finite number greater than or equal to zero (found {} at \
            snapshot {snapshot})",
            raw[snapshot]
        );
    }

    if let Some(max) = profile.iter().copied().reduce(|a, b| if b > a { b } else { a })
        && max > Dimensionless(1.0)
    {
        warn!(
            "Availability exceeds capacity (maximum fraction is {max}). Check the normalisation \
            capacity ({normalisation} MW)."
        );
    }

    Ok(profile)
}

/// The parameters for a generator, as supplied by the caller of the model builder
#[derive(PartialEq, Debug, Clone)]
pub struct GeneratorConfig {
    /// A unique identifier for the generator
    pub id: GeneratorID,
    /// The bus the generator supplies
    pub bus: BusID,
    /// The category of energy source
    pub carrier: CarrierID,
    /// Nameplate capacity and bounds
    pub capacity: CapacityConfig,
    /// Annualised cost per MW of capacity
    pub capital_cost: MoneyPerPower,
    /// Cost per MWh dispatched
    pub marginal_cost: MoneyPerEnergy,
    /// Ratio of electrical output to primary energy input
    pub efficiency: Dimensionless,
    /// Availability ceiling at each snapshot, for variable generators
    pub p_max_pu: Option<Vec<Dimensionless>>,
}

/// A generator attached to the network
#[derive(PartialEq, Debug, Clone)]
pub struct Generator {
    /// A unique identifier for the generator
    pub id: GeneratorID,
    /// The bus the generator supplies
    pub bus: BusID,
    /// The category of energy source
    pub carrier: CarrierID,
    /// Nameplate capacity
    pub capacity: NominalCapacity,
    /// Annualised cost per MW of capacity
    pub capital_cost: MoneyPerPower,
    /// Cost per MWh dispatched
    pub marginal_cost: MoneyPerEnergy,
    /// Ratio of electrical output to primary energy input
    pub efficiency: Dimensionless,
    /// Availability ceiling at each snapshot
    pub availability: Availability,
}
define_id_getter! {Generator, GeneratorID}

impl Generator {
    /// Validate a [`GeneratorConfig`] and create a [`Generator`] from it.
    ///
    /// The caller is responsible for checking the length of the availability profile and that the
    /// bus and carrier exist.
    pub fn from_config(config: GeneratorConfig) -> Result<Self> {
        let id = config.id;
        let capacity = config
            .capacity
            .resolve()
            .with_context(|| format!("Invalid capacity for generator {id}"))?;
        ensure!(
            config.capital_cost.is_finite(),
            "capital_cost for generator {id} must be finite"
        );
        ensure!(
            config.marginal_cost.is_finite(),
            "marginal_cost for generator {id} must be finite"
        );
        ensure!(
            config.efficiency.is_finite() && config.efficiency > Dimensionless(0.0),
            "efficiency for generator {id} must be a finite number greater than zero"
        );

        let availability = match config.p_max_pu {
            None => Availability::Dispatchable,
            Some(profile) => {
                ensure!(
                    profile
                        .iter()
                        .all(|value| value.is_finite() && *value >= Dimensionless(0.0)),
                    "p_max_pu for generator {id} must be finite and greater than or equal to zero"
                );
                Availability::Variable(profile)
            }
        };

        Ok(Self {
            id,
            bus: config.bus,
            carrier: config.carrier,
            capacity,
            capital_cost: config.capital_cost,
            marginal_cost: config.marginal_cost,
            efficiency: config.efficiency,
            availability,
        })
    }

    /// Whether output is limited by a per-snapshot availability profile
    pub fn is_variable(&self) -> bool {
        matches!(self.availability, Availability::Variable(_))
    }

    /// The maximum output at the given snapshot for a given capacity
    pub fn max_output(&self, snapshot: usize, capacity: Power) -> Power {
        capacity * self.availability.get(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_error, generator_config};
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    fn capacity_config(
        p_nom_min: Option<f64>,
        p_nom_max: Option<f64>,
        p_nom_extendable: bool,
    ) -> CapacityConfig {
        CapacityConfig {
            p_nom: Power(100.0),
            p_nom_min: p_nom_min.map(Power),
            p_nom_max: p_nom_max.map(Power),
            p_nom_extendable,
        }
    }

    #[test]
    fn test_resolve_fixed() {
        assert_eq!(
            capacity_config(None, None, false).resolve().unwrap(),
            NominalCapacity::Fixed(Power(100.0))
        );

        // Bounds are ignored
        assert_eq!(
            capacity_config(Some(200.0), Some(50.0), false)
                .resolve()
                .unwrap(),
            NominalCapacity::Fixed(Power(100.0))
        );
    }

    #[test]
    fn test_resolve_extendable() {
        assert_eq!(
            capacity_config(Some(10.0), Some(150.0), true)
                .resolve()
                .unwrap(),
            NominalCapacity::Extendable {
                reference: Power(100.0),
                min: Power(10.0),
                max: Power(150.0)
            }
        );

        // Default bounds
        let capacity = capacity_config(None, None, true).resolve().unwrap();
        assert_eq!(capacity.bounds(), (Power(0.0), Power(f64::INFINITY)));
        assert!(capacity.is_extendable());
        assert_eq!(capacity.reference(), Power(100.0));

        // p_nom may lie outside the bounds
        assert!(capacity_config(Some(200.0), None, true).resolve().is_ok());
    }

    #[rstest]
    #[case(Some(-1.0), None)]
    #[case(Some(f64::INFINITY), None)]
    #[case(Some(20.0), Some(10.0))]
    #[case(None, Some(-5.0))]
    #[case(None, Some(f64::NAN))]
    fn test_resolve_extendable_invalid(#[case] min: Option<f64>, #[case] max: Option<f64>) {
        assert!(capacity_config(min, max, true).resolve().is_err());
    }

    #[test]
    fn test_resolve_invalid_p_nom() {
        let mut config = capacity_config(None, None, false);
        config.p_nom = Power(-1.0);
        assert!(config.resolve().is_err());
        config.p_nom = Power(f64::NAN);
        assert!(config.resolve().is_err());
    }

    #[test]
    fn test_availability_from_raw() {
        let profile = availability_from_raw(&[0.0, 895.0, 1790.0], Power(1790.0)).unwrap();
        assert_eq!(profile.len(), 3);
        assert_approx_eq!(f64, profile[0].value(), 0.0);
        assert_approx_eq!(f64, profile[1].value(), 0.5);
        assert_approx_eq!(f64, profile[2].value(), 1.0);

        // Values above the normalisation capacity are allowed
        let profile = availability_from_raw(&[2000.0], Power(1000.0)).unwrap();
        assert_approx_eq!(f64, profile[0].value(), 2.0);
    }

    #[test]
    fn test_availability_from_raw_invalid() {
        assert_error!(
            availability_from_raw(&[1.0], Power(0.0)),
            "Normalisation capacity for availability must be a finite number greater than zero"
        );
        assert!(availability_from_raw(&[-1.0], Power(10.0)).is_err());
        assert!(availability_from_raw(&[f64::NAN], Power(10.0)).is_err());
    }

    #[rstest]
    fn test_from_config(generator_config: GeneratorConfig) {
        let generator = Generator::from_config(generator_config).unwrap();
        assert!(!generator.is_variable());
        assert_eq!(generator.availability.get(0), Dimensionless(1.0));
        assert_eq!(generator.max_output(0, Power(50.0)), Power(50.0));
    }

    #[rstest]
    fn test_from_config_variable(mut generator_config: GeneratorConfig) {
        generator_config.p_max_pu = Some(vec![Dimensionless(0.5), Dimensionless(0.25)]);
        let generator = Generator::from_config(generator_config).unwrap();
        assert!(generator.is_variable());
        assert_eq!(generator.max_output(1, Power(80.0)), Power(20.0));
    }

    #[rstest]
    #[case(0.0)]
    #[case(-0.5)]
    #[case(f64::NAN)]
    fn test_from_config_bad_efficiency(mut generator_config: GeneratorConfig, #[case] value: f64) {
        generator_config.efficiency = Dimensionless(value);
        assert!(Generator::from_config(generator_config).is_err());
    }

    #[rstest]
    fn test_from_config_bad_costs(generator_config: GeneratorConfig) {
        let mut config = generator_config.clone();
        config.capital_cost = MoneyPerPower(f64::INFINITY);
        assert!(Generator::from_config(config).is_err());

        let mut config = generator_config;
        config.marginal_cost = MoneyPerEnergy(f64::NAN);
        assert!(Generator::from_config(config).is_err());
    }
}
