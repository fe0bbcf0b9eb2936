//! Carriers are categories of energy source (e.g. gas or wind) with associated emissions.
use crate::id::{define_id_getter, define_id_type};
use crate::units::EmissionsPerEnergy;
use anyhow::{Result, ensure};
use indexmap::IndexMap;
use serde::Deserialize;

define_id_type! {CarrierID}

/// A map of [`Carrier`]s, keyed by carrier ID
pub type CarrierMap = IndexMap<CarrierID, Carrier>;

/// A named category of energy source or technology
#[derive(PartialEq, Debug, Clone, Deserialize)]
pub struct Carrier {
    /// A unique identifier for the carrier (e.g. "thermal")
    pub id: CarrierID,
    /// The colour used when displaying this carrier
    pub color: String,
    /// CO2 emitted per unit of primary energy (tonnes per MWh)
    pub co2_emissions: EmissionsPerEnergy,
}
define_id_getter! {Carrier, CarrierID}

impl Carrier {
    /// Check that the carrier's parameters are valid
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.co2_emissions.is_finite() && self.co2_emissions >= EmissionsPerEnergy(0.0),
            "co2_emissions for carrier {} must be a finite number greater than or equal to zero",
            self.id
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, true)]
    #[case(0.9, true)]
    #[case(-0.1, false)]
    #[case(f64::INFINITY, false)]
    #[case(f64::NAN, false)]
    fn test_validate(#[case] co2_emissions: f64, #[case] expected_valid: bool) {
        let carrier = Carrier {
            id: "gas".into(),
            color: "aquamarine".into(),
            co2_emissions: EmissionsPerEnergy(co2_emissions),
        };
        assert_eq!(carrier.validate().is_ok(), expected_valid);
    }
}
