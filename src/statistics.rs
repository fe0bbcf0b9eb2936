//! Summary statistics for an optimised network, grouped by carrier.
use crate::carrier::CarrierID;
use crate::generator::Generator;
use crate::network::Network;
use crate::optimisation::{GeneratorSolution, Solution};
use crate::units::{Dimensionless, Emissions, Energy, Hours, Money, MoneyPerEnergy, Power};
use indexmap::IndexMap;

/// Statistics for all generators of a single carrier
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CarrierStatistics {
    /// Total optimised capacity
    pub optimal_capacity: Power,
    /// Total nameplate capacity given in the input data
    pub installed_capacity: Power,
    /// Energy dispatched over all snapshots
    pub supply: Energy,
    /// Supply as a fraction of what the optimised capacity could produce running flat out
    pub capacity_factor: Dimensionless,
    /// Available energy which was not dispatched (variable generators only)
    pub curtailment: Option<Energy>,
    /// Annualised capital cost at the optimised capacity
    pub capital_expenditure: Money,
    /// Cost of dispatch
    pub operational_expenditure: Money,
    /// Income from selling supply at marginal prices
    pub revenue: Money,
    /// Average price received per unit of supply, if anything was supplied
    pub market_value: Option<MoneyPerEnergy>,
    /// CO2 emitted
    pub emissions: Emissions,
}

/// Energy dispatched by a generator over all snapshots
pub fn supply(result: &GeneratorSolution, weighting: Hours) -> Energy {
    result.dispatch.iter().map(|p| *p * weighting).sum()
}

/// Energy that a variable generator could have produced but did not
pub fn curtailment(generator: &Generator, result: &GeneratorSolution, weighting: Hours) -> Energy {
    result
        .dispatch
        .iter()
        .enumerate()
        .map(|(snapshot, p)| (generator.max_output(snapshot, result.p_nom_opt) - *p) * weighting)
        .sum()
}

/// Income from supplying energy at the marginal price of each snapshot
pub fn revenue(result: &GeneratorSolution, prices: &[MoneyPerEnergy], weighting: Hours) -> Money {
    result
        .dispatch
        .iter()
        .zip(prices)
        .map(|(p, price)| *price * (*p * weighting))
        .sum()
}

/// Ratio of energy supplied to the maximum energy a capacity could supply
pub fn capacity_factor(supply: Energy, capacity: Power, duration: Hours) -> Dimensionless {
    let potential = capacity * duration;
    if potential <= Energy(0.0) {
        return Dimensionless(0.0);
    }

    supply / potential
}

/// Calculate statistics for each carrier which has at least one generator.
///
/// Carriers are returned in the order in which they were declared.
pub fn calculate_statistics(
    network: &Network,
    solution: &Solution,
) -> IndexMap<CarrierID, CarrierStatistics> {
    let weighting = network.snapshots.weighting();
    let prices = solution.marginal_prices();

    let mut stats: IndexMap<CarrierID, CarrierStatistics> = IndexMap::new();
    for carrier in network.carriers.values() {
        let generators = network
            .generators
            .values()
            .filter(|generator| generator.carrier == carrier.id)
            .filter_map(|generator| {
                solution
                    .generator(&generator.id)
                    .map(|result| (generator, result))
            });

        let mut entry: Option<CarrierStatistics> = None;
        for (generator, result) in generators {
            let stat = entry.get_or_insert_default();
            let energy = supply(result, weighting);
            stat.optimal_capacity = stat.optimal_capacity + result.p_nom_opt;
            stat.installed_capacity = stat.installed_capacity + generator.capacity.reference();
            stat.supply = stat.supply + energy;
            if generator.is_variable() {
                let curtailed = curtailment(generator, result, weighting);
                stat.curtailment = Some(stat.curtailment.unwrap_or_default() + curtailed);
            }
            stat.capital_expenditure =
                stat.capital_expenditure + generator.capital_cost * result.p_nom_opt;
            stat.operational_expenditure =
                stat.operational_expenditure + generator.marginal_cost * energy;
            stat.revenue = stat.revenue + revenue(result, prices, weighting);
            stat.emissions =
                stat.emissions + carrier.co2_emissions * (energy / generator.efficiency);
        }

        if let Some(mut stat) = entry {
            stat.capacity_factor = capacity_factor(
                stat.supply,
                stat.optimal_capacity,
                network.snapshots.total_duration(),
            );
            stat.market_value = (stat.supply > Energy(0.0)).then_some(stat.revenue / stat.supply);
            stats.insert(carrier.id.clone(), stat);
        }
    }

    stats
}
