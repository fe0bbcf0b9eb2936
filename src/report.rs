//! Code for printing the results of an optimisation to the console.
use crate::model::Model;
use crate::network::Network;
use crate::optimisation::Solution;
use crate::statistics::{CarrierStatistics, calculate_statistics};
use crate::units::Money;

/// Column headings for the statistics table
const STATISTICS_HEADINGS: [&str; 11] = [
    "carrier",
    "optimal capacity (MW)",
    "installed capacity (MW)",
    "supply (MWh)",
    "capacity factor",
    "curtailment (MWh)",
    "capex",
    "opex",
    "revenue",
    "market value (per MWh)",
    "CO2 emissions (t)",
];

/// Format the total system cost, scaled into the reporting unit
pub fn format_total_cost(total: Money, cost_scale: f64, cost_unit: &str) -> String {
    format!(
        "Total System Cost in {cost_unit}: {}",
        total.value() / cost_scale
    )
}

/// Format the table of optimised capacities, one generator per line
pub fn format_capacities(network: &Network, solution: &Solution) -> String {
    let width = network
        .generators
        .keys()
        .map(|id| id.0.len())
        .max()
        .unwrap_or_default()
        .max("generator".len());

    let mut out = format!("The optimised capacities in MW:\n{:<width$}  p_nom_opt\n", "generator");
    for (id, result) in solution.iter_generators() {
        out.push_str(&format!("{:<width$}  {:.3}\n", id.0, result.p_nom_opt.value()));
    }

    out
}

/// Format one row of the statistics table
fn statistics_row(stat: &CarrierStatistics) -> [String; 10] {
    let optional =
        |value: Option<f64>| value.map_or_else(|| "-".to_string(), |v| format!("{v:.3}"));
    [
        format!("{:.3}", stat.optimal_capacity.value()),
        format!("{:.3}", stat.installed_capacity.value()),
        format!("{:.3}", stat.supply.value()),
        format!("{:.4}", stat.capacity_factor.value()),
        optional(stat.curtailment.map(|c| c.value())),
        format!("{:.3}", stat.capital_expenditure.value()),
        format!("{:.3}", stat.operational_expenditure.value()),
        format!("{:.3}", stat.revenue.value()),
        optional(stat.market_value.map(|m| m.value())),
        format!("{:.3}", stat.emissions.value()),
    ]
}

/// Format the statistics table, one carrier per line
pub fn format_statistics(network: &Network, solution: &Solution) -> String {
    let rows: Vec<Vec<String>> = calculate_statistics(network, solution)
        .iter()
        .map(|(id, stat)| {
            let mut row = vec![id.to_string()];
            row.extend(statistics_row(stat));
            row
        })
        .collect();

    // Width of each column is the widest of its heading and values
    let widths: Vec<usize> = STATISTICS_HEADINGS
        .iter()
        .enumerate()
        .map(|(i, heading)| {
            rows.iter()
                .map(|row| row[i].len())
                .fold(heading.len(), usize::max)
        })
        .collect();

    let mut out = "Statistics:\n".to_string();
    out.push_str(&format_line(STATISTICS_HEADINGS.into_iter(), &widths));
    out.push('\n');
    for row in &rows {
        out.push_str(&format_line(row.iter().map(String::as_str), &widths));
        out.push('\n');
    }

    out
}

/// Right-align cells to the given column widths
fn format_line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let line = cells
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:>width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    line.trim_end().to_string()
}

/// Print the full report for a solved model
pub fn print_report(model: &Model, solution: &Solution) {
    let parameters = &model.parameters;
    println!(
        "{}",
        format_total_cost(
            solution.objective(),
            parameters.cost_scale,
            &parameters.cost_unit
        )
    );
    println!();
    print!("{}", format_capacities(&model.network, solution));
    println!();
    print!("{}", format_statistics(&model.network, solution));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::network;
    use crate::optimisation::{SolverBackend, SolverOptions};
    use rstest::rstest;

    fn solve(network: &Network) -> Solution {
        network
            .optimise(SolverBackend::Highs, &SolverOptions::default())
            .unwrap()
    }

    #[test]
    fn test_format_total_cost() {
        assert_eq!(
            format_total_cost(Money(2.5e6), 1e6, "Million Rupees per Year"),
            "Total System Cost in Million Rupees per Year: 2.5"
        );
    }

    #[rstest]
    fn test_format_capacities(network: Network) {
        let solution = solve(&network);
        assert_eq!(
            format_capacities(&network, &solution),
            "The optimised capacities in MW:\n\
            generator  p_nom_opt\n\
            thermal    50.000\n\
            wind       100.000\n"
        );
    }

    #[rstest]
    fn test_format_statistics(network: Network) {
        let solution = solve(&network);
        let table = format_statistics(&network, &solution);
        let lines: Vec<_> = table.lines().collect();

        // Title, headings and one line per carrier with generators
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "Statistics:");
        assert!(lines[1].trim_start().starts_with("carrier"));
        assert!(lines[2].trim_start().starts_with("thermal"));
        assert!(lines[3].trim_start().starts_with("wind"));

        // No curtailment for dispatchable generators
        assert!(lines[2].contains(" - "));
    }
}
