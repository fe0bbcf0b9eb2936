//! Fixtures for tests

use crate::carrier::Carrier;
use crate::generator::{CapacityConfig, GeneratorConfig};
use crate::network::{Network, NetworkBuilder};
use crate::snapshot::{Snapshot, SnapshotInfo};
use crate::units::{Dimensionless, EmissionsPerEnergy, Hours, MoneyPerEnergy, MoneyPerPower, Power};
use chrono::{NaiveDate, TimeDelta};
use rstest::fixture;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

/// Three hourly snapshots, starting at midnight on 1 March 2023
#[fixture]
pub fn snapshots() -> Vec<Snapshot> {
    let start = NaiveDate::from_ymd_opt(2023, 3, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    (0..3)
        .map(|hour| Snapshot(start + TimeDelta::hours(hour)))
        .collect()
}

#[fixture]
pub fn snapshot_info(snapshots: Vec<Snapshot>) -> SnapshotInfo {
    SnapshotInfo::new(snapshots[..2].to_vec(), Hours(1.0)).unwrap()
}

#[fixture]
pub fn carriers() -> Vec<Carrier> {
    [
        ("thermal", "#235ebc", 0.9),
        ("wind", "dodgerblue", 0.0),
        ("battery storage", "#ace37f", 0.0),
    ]
    .into_iter()
    .map(|(id, color, co2_emissions)| Carrier {
        id: id.into(),
        color: color.into(),
        co2_emissions: EmissionsPerEnergy(co2_emissions),
    })
    .collect()
}

#[fixture]
pub fn generator_config() -> GeneratorConfig {
    GeneratorConfig {
        id: "thermal".into(),
        bus: "electricity".into(),
        carrier: "thermal".into(),
        capacity: CapacityConfig {
            p_nom: Power(0.0),
            p_nom_min: None,
            p_nom_max: None,
            p_nom_extendable: true,
        },
        capital_cost: MoneyPerPower(10.0),
        marginal_cost: MoneyPerEnergy(2.0),
        efficiency: Dimensionless(0.35),
        p_max_pu: None,
    }
}

#[fixture]
pub fn wind_generator_config() -> GeneratorConfig {
    GeneratorConfig {
        id: "wind".into(),
        bus: "electricity".into(),
        carrier: "wind".into(),
        capacity: CapacityConfig {
            p_nom: Power(0.0),
            p_nom_min: None,
            p_nom_max: Some(Power(100.0)),
            p_nom_extendable: true,
        },
        capital_cost: MoneyPerPower(1.0),
        marginal_cost: MoneyPerEnergy(0.0),
        efficiency: Dimensionless(1.0),
        p_max_pu: Some(vec![Dimensionless(0.5), Dimensionless(1.0)]),
    }
}

/// Assemble a small network with the given demand at each snapshot
fn build_network(
    carriers: Vec<Carrier>,
    snapshot_info: SnapshotInfo,
    generators: [GeneratorConfig; 2],
    demand: [f64; 2],
) -> Network {
    let mut builder = NetworkBuilder::new();
    builder.add_bus("electricity".into()).unwrap();
    builder.set_snapshots(snapshot_info).unwrap();
    for carrier in carriers {
        builder.add_carrier(carrier).unwrap();
    }
    builder
        .add_load(
            "demand".into(),
            &"electricity".into(),
            demand.into_iter().map(Power).collect(),
        )
        .unwrap();
    for generator in generators {
        builder.add_generator(generator).unwrap();
    }
    builder.build().unwrap()
}

/// A network with two extendable generators and two snapshots.
///
/// With demand of 100 then 50 MW, wind is built to its maximum of 100 MW (giving 50 then 100 MW of
/// availability) and thermal is built to 50 MW to cover the first snapshot. The total cost is
/// 10 * 50 + 1 * 100 capital plus 2 * 50 operating, i.e. 700.
#[fixture]
pub fn network(
    carriers: Vec<Carrier>,
    snapshot_info: SnapshotInfo,
    generator_config: GeneratorConfig,
    wind_generator_config: GeneratorConfig,
) -> Network {
    build_network(
        carriers,
        snapshot_info,
        [generator_config, wind_generator_config],
        [100.0, 50.0],
    )
}

/// The same as [`network`], but with no demand
#[fixture]
pub fn zero_demand_network(
    carriers: Vec<Carrier>,
    snapshot_info: SnapshotInfo,
    generator_config: GeneratorConfig,
    wind_generator_config: GeneratorConfig,
) -> Network {
    build_network(
        carriers,
        snapshot_info,
        [generator_config, wind_generator_config],
        [0.0, 0.0],
    )
}
