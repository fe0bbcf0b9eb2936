//! The energy-balance network: a single bus with a demand sink and a set of generators.
//!
//! Networks are assembled with a [`NetworkBuilder`]. The snapshots must be registered before any
//! component with a time-varying attribute is added, and every time series must have exactly one
//! value per snapshot.
use crate::carrier::{Carrier, CarrierID, CarrierMap};
use crate::generator::{Generator, GeneratorConfig, GeneratorID, GeneratorMap};
use crate::id::{IDCollection, define_id_getter, define_id_type, insert_unique};
use crate::optimisation::{Solution, SolverBackend, SolverOptions, perform_optimisation};
use crate::snapshot::SnapshotInfo;
use crate::units::Power;
use anyhow::{Context, Result, bail, ensure};
use indexmap::{IndexMap, IndexSet};
use log::{debug, warn};

define_id_type! {BusID}
define_id_type! {LoadID}

/// An aggregation node at which supply and demand must balance
#[derive(PartialEq, Debug, Clone)]
pub struct Bus {
    /// A unique identifier for the bus (e.g. "electricity")
    pub id: BusID,
}

/// A fixed demand attached to a bus
#[derive(PartialEq, Debug, Clone)]
pub struct Load {
    /// A unique identifier for the load
    pub id: LoadID,
    /// The bus the load draws from
    pub bus: BusID,
    /// Power demanded at each snapshot
    pub p_set: Vec<Power>,
}
define_id_getter! {Load, LoadID}

/// Accumulates the components of a [`Network`]
#[derive(Default)]
pub struct NetworkBuilder {
    bus: Option<Bus>,
    carriers: CarrierMap,
    snapshots: Option<SnapshotInfo>,
    loads: IndexMap<LoadID, Load>,
    generators: GeneratorMap,
}

impl NetworkBuilder {
    /// Create a new, empty [`NetworkBuilder`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the (single) bus
    pub fn add_bus(&mut self, id: BusID) -> Result<()> {
        if let Some(bus) = &self.bus {
            bail!(
                "Cannot add bus {id}: network already has a bus ({}) and only one is supported",
                bus.id
            );
        }
        self.bus = Some(Bus { id });

        Ok(())
    }

    /// Register the snapshots. Must be called before adding loads or generators.
    pub fn set_snapshots(&mut self, snapshots: SnapshotInfo) -> Result<()> {
        ensure!(self.snapshots.is_none(), "Snapshots have already been set");
        debug!("Registered {} snapshots", snapshots.len());
        self.snapshots = Some(snapshots);

        Ok(())
    }

    /// Declare a carrier
    pub fn add_carrier(&mut self, carrier: Carrier) -> Result<()> {
        carrier.validate()?;
        insert_unique(&mut self.carriers, carrier).context("Invalid carrier")
    }

    /// Add a fixed demand to the bus.
    ///
    /// # Arguments
    ///
    /// * `id` - Load ID
    /// * `bus` - The bus the load is attached to
    /// * `p_set` - Power demanded at each snapshot
    pub fn add_load(&mut self, id: LoadID, bus: &BusID, p_set: Vec<Power>) -> Result<()> {
        let snapshots = self.get_snapshots()?;
        snapshots
            .check_series_length(&p_set)
            .with_context(|| format!("Invalid demand series for load {id}"))?;
        ensure!(
            p_set.iter().all(|p| p.is_finite()),
            "Demand for load {id} must be finite"
        );
        let bus = self.get_bus_id(bus)?;

        insert_unique(&mut self.loads, Load { id, bus, p_set })
    }

    /// Add a generator to the bus.
    ///
    /// The generator's carrier must already have been declared.
    pub fn add_generator(&mut self, config: GeneratorConfig) -> Result<()> {
        let snapshots = self.get_snapshots()?;
        if let Some(profile) = &config.p_max_pu {
            snapshots
                .check_series_length(profile)
                .with_context(|| format!("Invalid p_max_pu for generator {}", config.id))?;
        }

        let bus = self.get_bus_id(&config.bus)?;
        let carrier = self
            .carriers
            .get_id(&config.carrier)
            .with_context(|| format!("Invalid carrier for generator {}", config.id))?;
        let generator = Generator {
            bus,
            carrier,
            ..Generator::from_config(config)?
        };

        insert_unique(&mut self.generators, generator)
    }

    /// Check that the network is complete and return it
    pub fn build(self) -> Result<Network> {
        let bus = self.bus.context("Network has no bus")?;
        let snapshots = self.snapshots.context("Snapshots have not been set")?;

        if self.loads.is_empty() {
            warn!("Network has no loads: demand is zero at every snapshot");
        }

        for carrier_id in find_unused_carriers(&self.carriers, &self.generators) {
            warn!("Carrier {carrier_id} is declared but not used by any component");
        }

        Ok(Network {
            bus,
            carriers: self.carriers,
            snapshots,
            loads: self.loads,
            generators: self.generators,
        })
    }

    fn get_snapshots(&self) -> Result<&SnapshotInfo> {
        self.snapshots
            .as_ref()
            .context("Snapshots must be set before adding time-varying attributes")
    }

    fn get_bus_id(&self, id: &BusID) -> Result<BusID> {
        let bus = self.bus.as_ref().context("A bus must be added first")?;
        ensure!(&bus.id == id, "Unknown bus: {id}");

        Ok(bus.id.clone())
    }
}

/// Get the IDs of carriers that are not referenced by any generator
fn find_unused_carriers<'a>(
    carriers: &'a CarrierMap,
    generators: &GeneratorMap,
) -> impl Iterator<Item = &'a CarrierID> {
    let used: IndexSet<_> = generators.values().map(|g| g.carrier.clone()).collect();
    carriers.keys().filter(move |id| !used.contains(*id))
}

/// A fully assembled energy-balance network
#[derive(PartialEq, Debug, Clone)]
pub struct Network {
    /// The bus
    pub bus: Bus,
    /// All declared carriers, including those without components
    pub carriers: CarrierMap,
    /// The snapshots
    pub snapshots: SnapshotInfo,
    /// Demand sinks
    pub loads: IndexMap<LoadID, Load>,
    /// Generators
    pub generators: GeneratorMap,
}

impl Network {
    /// Total demand at the given snapshot index
    pub fn demand(&self, snapshot: usize) -> Power {
        self.loads.values().map(|load| load.p_set[snapshot]).sum()
    }

    /// Look up a generator by ID
    pub fn generator(&self, id: &GeneratorID) -> Option<&Generator> {
        self.generators.get(id)
    }

    /// Find the optimal capacities and dispatch for this network
    pub fn optimise(&self, backend: SolverBackend, options: &SolverOptions) -> Result<Solution> {
        perform_optimisation(self, backend, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_error, carriers, generator_config, network, snapshot_info};
    use crate::units::{Dimensionless, Hours};
    use rstest::{fixture, rstest};

    /// A builder with a bus, carriers and two snapshots
    #[fixture]
    fn builder(carriers: Vec<Carrier>, snapshot_info: SnapshotInfo) -> NetworkBuilder {
        let mut builder = NetworkBuilder::new();
        builder.add_bus("electricity".into()).unwrap();
        builder.set_snapshots(snapshot_info).unwrap();
        for carrier in carriers {
            builder.add_carrier(carrier).unwrap();
        }
        builder
    }

    #[rstest]
    fn test_build(network: Network) {
        assert_eq!(network.snapshots.len(), 2);
        assert_eq!(network.generators.len(), 2);
        assert_eq!(network.demand(0), Power(100.0));
        assert_eq!(network.demand(1), Power(50.0));
        assert!(network.generator(&"wind".into()).unwrap().is_variable());
    }

    #[test]
    fn test_add_second_bus() {
        let mut builder = NetworkBuilder::new();
        builder.add_bus("electricity".into()).unwrap();
        assert!(builder.add_bus("heat".into()).is_err());
    }

    #[rstest]
    fn test_set_snapshots_twice(snapshot_info: SnapshotInfo) {
        let mut builder = NetworkBuilder::new();
        builder.set_snapshots(snapshot_info.clone()).unwrap();
        assert_error!(
            builder.set_snapshots(snapshot_info),
            "Snapshots have already been set"
        );
    }

    #[test]
    fn test_add_load_before_snapshots() {
        let mut builder = NetworkBuilder::new();
        builder.add_bus("electricity".into()).unwrap();
        assert_error!(
            builder.add_load("demand".into(), &"electricity".into(), vec![Power(1.0)]),
            "Snapshots must be set before adding time-varying attributes"
        );
    }

    #[rstest]
    fn test_add_generator_before_snapshots(
        carriers: Vec<Carrier>,
        generator_config: GeneratorConfig,
    ) {
        let mut builder = NetworkBuilder::new();
        builder.add_bus("electricity".into()).unwrap();
        for carrier in carriers {
            builder.add_carrier(carrier).unwrap();
        }
        assert_error!(
            builder.add_generator(generator_config),
            "Snapshots must be set before adding time-varying attributes"
        );
    }

    #[rstest]
    fn test_add_load_misaligned(mut builder: NetworkBuilder) {
        assert_error!(
            builder.add_load("demand".into(), &"electricity".into(), vec![Power(1.0)]),
            "Invalid demand series for load demand"
        );
    }

    #[rstest]
    fn test_add_load_unknown_bus(mut builder: NetworkBuilder) {
        assert_error!(
            builder.add_load("demand".into(), &"heat".into(), vec![Power(1.0); 2]),
            "Unknown bus: heat"
        );
    }

    #[rstest]
    fn test_add_load_duplicate(mut builder: NetworkBuilder) {
        builder
            .add_load("demand".into(), &"electricity".into(), vec![Power(1.0); 2])
            .unwrap();
        assert!(
            builder
                .add_load("demand".into(), &"electricity".into(), vec![Power(1.0); 2])
                .is_err()
        );
    }

    #[rstest]
    fn test_add_generator_misaligned(
        mut builder: NetworkBuilder,
        mut generator_config: GeneratorConfig,
    ) {
        generator_config.p_max_pu = Some(vec![Dimensionless(1.0); 3]);
        assert_error!(
            builder.add_generator(generator_config),
            "Invalid p_max_pu for generator thermal"
        );
    }

    #[rstest]
    fn test_add_generator_unknown_carrier(
        mut builder: NetworkBuilder,
        mut generator_config: GeneratorConfig,
    ) {
        generator_config.carrier = "nuclear".into();
        assert_error!(
            builder.add_generator(generator_config),
            "Invalid carrier for generator thermal"
        );
    }

    #[rstest]
    fn test_add_generator_duplicate(
        mut builder: NetworkBuilder,
        generator_config: GeneratorConfig,
    ) {
        builder.add_generator(generator_config.clone()).unwrap();
        assert_error!(
            builder.add_generator(generator_config),
            "Duplicate ID found: thermal"
        );
    }

    #[rstest]
    fn test_add_carrier_duplicate(mut builder: NetworkBuilder, carriers: Vec<Carrier>) {
        assert_error!(builder.add_carrier(carriers[0].clone()), "Invalid carrier");
    }

    #[test]
    fn test_build_incomplete() {
        assert_error!(NetworkBuilder::new().build(), "Network has no bus");

        let mut builder = NetworkBuilder::new();
        builder.add_bus("electricity".into()).unwrap();
        assert_error!(builder.build(), "Snapshots have not been set");
    }

    #[rstest]
    fn test_find_unused_carriers(network: Network) {
        let unused: Vec<_> = find_unused_carriers(&network.carriers, &network.generators).collect();
        assert_eq!(unused, [&CarrierID::new("battery storage")]);

        // Unused carriers are kept as declarations
        assert!(network.carriers.contains_key("battery storage"));
    }

    #[rstest]
    fn test_demand_multiple_loads(mut builder: NetworkBuilder) {
        builder
            .add_load(
                "demand1".into(),
                &"electricity".into(),
                vec![Power(1.0), Power(2.0)],
            )
            .unwrap();
        builder
            .add_load(
                "demand2".into(),
                &"electricity".into(),
                vec![Power(3.0), Power(4.0)],
            )
            .unwrap();
        let network = builder.build().unwrap();
        assert_eq!(network.demand(0), Power(4.0));
        assert_eq!(network.demand(1), Power(6.0));
        assert_eq!(network.snapshots.weighting(), Hours(1.0));
    }
}
