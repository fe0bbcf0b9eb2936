//! Code for performing the capacity expansion optimisation.
//!
//! The problem is a linear program which chooses the capacity of each extendable generator and the
//! dispatch of every generator at every snapshot, so as to minimise the sum of annualised capital
//! costs and operating costs while meeting demand at every snapshot.
use crate::generator::{GeneratorID, NominalCapacity};
use crate::network::Network;
use crate::units::{Energy, Money, MoneyPerEnergy, Power};
use anyhow::{Context, Result, anyhow, ensure};
use highs::{HighsModelStatus, RowProblem as Problem, Sense};
use indexmap::IndexMap;
use log::{debug, info};
use serde::Deserialize;
use serde_string_enum::DeserializeLabeledStringEnum;
use strum::Display;

/// A decision variable in the optimisation
///
/// Note that this type does **not** include the value of the variable; it just refers to a
/// particular column of the problem.
type Variable = highs::Col;

/// The solver used to solve the optimisation problem
#[derive(DeserializeLabeledStringEnum, Debug, PartialEq, Clone, Copy, Default, Display)]
pub enum SolverBackend {
    /// The HiGHS solver
    #[default]
    #[string = "highs"]
    #[strum(serialize = "highs")]
    Highs,
}

/// The algorithm HiGHS should use
#[derive(DeserializeLabeledStringEnum, Debug, PartialEq, Clone, Copy)]
pub enum SolverAlgorithm {
    /// Let HiGHS decide
    #[string = "choose"]
    Choose,
    /// Simplex method
    #[string = "simplex"]
    Simplex,
    /// Interior point method
    #[string = "ipm"]
    InteriorPoint,
}

impl SolverAlgorithm {
    fn as_option_str(self) -> &'static str {
        match self {
            Self::Choose => "choose",
            Self::Simplex => "simplex",
            Self::InteriorPoint => "ipm",
        }
    }
}

/// Options passed through to the solver.
///
/// No time limit is set: the solve always runs to completion.
#[derive(Debug, Default, PartialEq, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SolverOptions {
    /// Whether to run presolve (solver default if absent)
    pub presolve: Option<bool>,
    /// The algorithm to use (solver default if absent)
    pub solver: Option<SolverAlgorithm>,
    /// Number of threads available to the solver
    pub threads: Option<i32>,
    /// Seed for the solver's random number generator
    pub random_seed: Option<i32>,
    /// Primal feasibility tolerance
    pub primal_feasibility_tolerance: Option<f64>,
    /// Dual feasibility tolerance
    pub dual_feasibility_tolerance: Option<f64>,
    /// Whether the solver should write its own log to the console
    #[serde(skip)]
    pub log_to_console: bool,
}

/// The smallest feasibility tolerance HiGHS accepts
const MIN_FEASIBILITY_TOLERANCE: f64 = 1e-10;

impl SolverOptions {
    /// Check that the options hold values HiGHS will accept
    pub fn validate(&self) -> Result<()> {
        if let Some(threads) = self.threads {
            ensure!(threads > 0, "solver_options.threads must be greater than zero");
        }
        if let Some(seed) = self.random_seed {
            ensure!(seed >= 0, "solver_options.random_seed must not be negative");
        }
        check_feasibility_tolerance(
            "primal_feasibility_tolerance",
            self.primal_feasibility_tolerance,
        )?;
        check_feasibility_tolerance("dual_feasibility_tolerance", self.dual_feasibility_tolerance)?;

        Ok(())
    }
}

fn check_feasibility_tolerance(name: &str, value: Option<f64>) -> Result<()> {
    if let Some(value) = value {
        ensure!(
            value.is_finite() && value >= MIN_FEASIBILITY_TOLERANCE,
            "solver_options.{name} must be finite and at least {MIN_FEASIBILITY_TOLERANCE:e}"
        );
    }

    Ok(())
}

/// A map for easy lookup of variables in the problem.
///
/// The entries are ordered (see [`IndexMap`]) by the order in which columns were added to the
/// problem. All dispatch variables are added before any capacity variables.
#[derive(Default)]
struct VariableMap {
    /// Dispatch of each generator at each snapshot index
    dispatch: IndexMap<(GeneratorID, usize), Variable>,
    /// Capacity of each extendable generator
    capacity: IndexMap<GeneratorID, Variable>,
}

impl VariableMap {
    /// Get the dispatch [`Variable`] for the given generator and snapshot
    fn dispatch_var(&self, generator_id: &GeneratorID, snapshot: usize) -> Variable {
        *self
            .dispatch
            .get(&(generator_id.clone(), snapshot))
            .expect("No dispatch variable found for given params")
    }
}

/// The optimised capacity and dispatch of a single generator
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorSolution {
    /// Optimised nameplate capacity
    pub p_nom_opt: Power,
    /// Power output at each snapshot
    pub dispatch: Vec<Power>,
}

/// The solution to the capacity expansion problem
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    generators: IndexMap<GeneratorID, GeneratorSolution>,
    marginal_prices: Vec<MoneyPerEnergy>,
    capital_expenditure: Money,
    operational_expenditure: Money,
}

impl Solution {
    /// Total annualised system cost: capital plus operating costs
    pub fn objective(&self) -> Money {
        self.capital_expenditure + self.operational_expenditure
    }

    /// Annualised capital cost of all generators at their optimised capacities
    pub fn capital_expenditure(&self) -> Money {
        self.capital_expenditure
    }

    /// Cost of dispatch over all snapshots
    pub fn operational_expenditure(&self) -> Money {
        self.operational_expenditure
    }

    /// Get the solution for a particular generator
    pub fn generator(&self, id: &GeneratorID) -> Option<&GeneratorSolution> {
        self.generators.get(id)
    }

    /// Iterate over the solutions for each generator, in the order generators were added
    pub fn iter_generators(&self) -> impl Iterator<Item = (&GeneratorID, &GeneratorSolution)> {
        self.generators.iter()
    }

    /// The marginal price of electricity at each snapshot (per MWh).
    ///
    /// This is the shadow price of the energy balance constraint.
    pub fn marginal_prices(&self) -> &[MoneyPerEnergy] {
        &self.marginal_prices
    }
}

/// Perform the capacity expansion optimisation.
///
/// # Arguments
///
/// * `network` - The assembled network
/// * `backend` - The solver to use
/// * `options` - Options to pass through to the solver
///
/// # Returns
///
/// The optimal capacities and dispatch, or an error if the problem could not be solved to
/// optimality (e.g. because it is infeasible).
pub fn perform_optimisation(
    network: &Network,
    backend: SolverBackend,
    options: &SolverOptions,
) -> Result<Solution> {
    options.validate().context("Invalid solver options")?;

    info!(
        "Solving capacity expansion problem for {} generators and {} snapshots with {backend}",
        network.generators.len(),
        network.snapshots.len()
    );

    // Set up problem
    let mut problem = Problem::default();
    let variables = add_variables(&mut problem, network);

    // Add constraints
    add_energy_balance_constraints(&mut problem, &variables, network);
    add_availability_constraints(&mut problem, &variables, network);
    debug!(
        "Problem has {} columns and {} rows",
        problem.num_cols(),
        problem.num_rows()
    );

    let mut model = problem.optimise(Sense::Minimise);
    apply_solver_options(&mut model, options);

    // Solve model
    let solved = model.solve();
    match solved.status() {
        HighsModelStatus::Optimal => Ok(Solution::from_highs(
            network,
            &variables,
            &solved.get_solution(),
        )),
        status => Err(anyhow!("Could not solve: {status:?}")),
    }
}

/// Pass the user-provided options through to HiGHS
fn apply_solver_options(model: &mut highs::Model, options: &SolverOptions) {
    model.set_option("output_flag", options.log_to_console);
    model.set_option("log_to_console", options.log_to_console);

    if let Some(presolve) = options.presolve {
        model.set_option("presolve", if presolve { "on" } else { "off" });
    }
    if let Some(solver) = options.solver {
        model.set_option("solver", solver.as_option_str());
    }
    if let Some(threads) = options.threads {
        model.set_option("threads", threads);
    }
    if let Some(seed) = options.random_seed {
        model.set_option("random_seed", seed);
    }
    if let Some(tolerance) = options.primal_feasibility_tolerance {
        model.set_option("primal_feasibility_tolerance", tolerance);
    }
    if let Some(tolerance) = options.dual_feasibility_tolerance {
        model.set_option("dual_feasibility_tolerance", tolerance);
    }
}

/// Add variables to the optimisation problem.
///
/// Dispatch variables for fixed-capacity generators are bounded directly by their availability.
/// Dispatch of extendable generators is limited by [`add_availability_constraints`] instead.
///
/// # Returns
///
/// A [`VariableMap`] with the problem's variables as values.
fn add_variables(problem: &mut Problem, network: &Network) -> VariableMap {
    let mut variables = VariableMap::default();
    let weighting = network.snapshots.weighting().value();

    for generator in network.generators.values() {
        let coeff = generator.marginal_cost.value() * weighting;
        for snapshot in 0..network.snapshots.len() {
            let var = match generator.capacity {
                NominalCapacity::Fixed(p_nom) => {
                    let max = generator.max_output(snapshot, p_nom).value();
                    problem.add_column(coeff, 0.0..=max)
                }
                NominalCapacity::Extendable { .. } => problem.add_column(coeff, 0.0..),
            };

            let existing = variables
                .dispatch
                .insert((generator.id.clone(), snapshot), var)
                .is_some();
            assert!(!existing, "Duplicate entry for var");
        }
    }

    for generator in network.generators.values() {
        if let NominalCapacity::Extendable { min, max, .. } = generator.capacity {
            let var = problem.add_column(generator.capital_cost.value(), min.value()..=max.value());
            variables.capacity.insert(generator.id.clone(), var);
        }
    }

    variables
}

/// Add energy balance constraints: at every snapshot, supply must equal demand.
///
/// These must be the first rows of the problem, as their duals are read back as prices.
fn add_energy_balance_constraints(
    problem: &mut Problem,
    variables: &VariableMap,
    network: &Network,
) {
    assert!(
        problem.num_rows() == 0,
        "Energy balance constraints must be added before other constraints"
    );

    let mut terms = Vec::new();
    for snapshot in 0..network.snapshots.len() {
        terms.extend(
            network
                .generators
                .keys()
                .map(|id| (variables.dispatch_var(id, snapshot), 1.0)),
        );

        let demand = network.demand(snapshot).value();
        problem.add_row(demand..=demand, terms.drain(0..));
    }
}

/// Limit the dispatch of extendable generators by their (variable) capacity.
///
/// For every snapshot: dispatch - p_max_pu * capacity <= 0
fn add_availability_constraints(problem: &mut Problem, variables: &VariableMap, network: &Network) {
    for (id, capacity_var) in &variables.capacity {
        let generator = &network.generators[id];
        for snapshot in 0..network.snapshots.len() {
            let p_max_pu = generator.availability.get(snapshot).value();
            problem.add_row(
                ..=0.0,
                [
                    (variables.dispatch_var(id, snapshot), 1.0),
                    (*capacity_var, -p_max_pu),
                ],
            );
        }
    }
}

impl Solution {
    /// Read the solution back from HiGHS
    fn from_highs(network: &Network, variables: &VariableMap, solution: &highs::Solution) -> Self {
        let columns = solution.columns();
        let (dispatch_values, capacity_values) = columns.split_at(variables.dispatch.len());

        let mut generators: IndexMap<GeneratorID, GeneratorSolution> = network
            .generators
            .values()
            .map(|generator| {
                let p_nom_opt = match generator.capacity {
                    NominalCapacity::Fixed(p_nom) => p_nom,
                    NominalCapacity::Extendable { .. } => Power(0.0),
                };
                let solution = GeneratorSolution {
                    p_nom_opt,
                    dispatch: Vec::with_capacity(network.snapshots.len()),
                };
                (generator.id.clone(), solution)
            })
            .collect();

        for ((id, _), value) in variables.dispatch.keys().zip(dispatch_values) {
            generators[id].dispatch.push(Power(*value));
        }
        for (id, value) in variables.capacity.keys().zip(capacity_values) {
            generators[id].p_nom_opt = Power(*value);
        }

        // Energy balance rows come first. Their duals are per snapshot, so divide by the weighting
        // to get prices per MWh.
        let weighting = network.snapshots.weighting().value();
        let marginal_prices = solution
            .dual_rows()
            .iter()
            .take(network.snapshots.len())
            .map(|dual| MoneyPerEnergy(dual / weighting))
            .collect();

        let hours = network.snapshots.weighting();
        let mut capital_expenditure = Money(0.0);
        let mut operational_expenditure = Money(0.0);
        for (id, result) in &generators {
            let generator = &network.generators[id];
            capital_expenditure = capital_expenditure + generator.capital_cost * result.p_nom_opt;
            let energy: Energy = result.dispatch.iter().map(|p| *p * hours).sum();
            operational_expenditure = operational_expenditure + generator.marginal_cost * energy;
        }

        Self {
            generators,
            marginal_prices,
            capital_expenditure,
            operational_expenditure,
        }
    }
}
