//! Per-region energy sums for one filter selection.

use std::collections::BTreeMap;
use std::fmt;

use super::filter::FilterSelection;
use crate::data::record::Table;
use crate::render::format::format_thousands;

/// Summed energy per region plus the grand total over the same rows.
///
/// Regions without matching rows are absent rather than zero.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedResult {
    /// Selection the sums were computed for.
    pub selection: FilterSelection,
    /// Summed `total_energy` per region (kWh).
    pub by_region: BTreeMap<String, f64>,
    /// Sum over every matching row (kWh).
    pub total: f64,
    /// Number of matching rows.
    pub matched_rows: usize,
}

impl AggregatedResult {
    /// Sum for one region, if it had matching rows.
    pub fn get(&self, region: &str) -> Option<f64> {
        self.by_region.get(region).copied()
    }

    /// Largest regional sum, `None` when nothing matched.
    pub fn max_value(&self) -> Option<f64> {
        self.by_region.values().copied().reduce(f64::max)
    }

    /// Returns `true` if no row matched the selection.
    pub fn is_empty(&self) -> bool {
        self.matched_rows == 0
    }
}

impl fmt::Display for AggregatedResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .by_region
            .keys()
            .map(|k| k.chars().count())
            .max()
            .unwrap_or(0)
            .max("Region".len());
        writeln!(f, "{:<width$}  {:>18}", "Region", "Energy (kWh)")?;
        for (region, value) in &self.by_region {
            writeln!(f, "{region:<width$}  {:>18}", format_thousands(*value))?;
        }
        Ok(())
    }
}

/// Filters `table` by `selection` and sums `total_energy` by region.
///
/// Pure function of its inputs: region order is the `BTreeMap` order and the
/// grand total is accumulated in row order.
pub fn aggregate(table: &Table, selection: &FilterSelection) -> AggregatedResult {
    let mut by_region: BTreeMap<String, f64> = BTreeMap::new();
    let mut total = 0.0;
    let mut matched_rows = 0;

    for record in table.records().iter().filter(|r| selection.matches(r)) {
        *by_region.entry(record.region.clone()).or_insert(0.0) += record.total_energy;
        total += record.total_energy;
        matched_rows += 1;
    }

    AggregatedResult {
        selection: selection.clone(),
        by_region,
        total,
        matched_rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::record::Record;

    fn example_table() -> Table {
        Table::from_records([
            Record::new("Lazio", "3kW", "TD", "Residente", 100.0),
            Record::new("Lazio", "3kW", "TD", "Residente", 50.0),
            Record::new("Lombardia", "3kW", "TD", "Residente", 30.0),
            Record::new("Lombardia", "3kW", "TD", "Non residente", 999.0),
            Record::new("Sicilia", "6kW", "TD", "Residente", 7.0),
        ])
    }

    #[test]
    fn sums_by_region() {
        let selection = FilterSelection::new("3kW", "TD", "Residente");
        let result = aggregate(&example_table(), &selection);
        assert_eq!(result.get("Lazio"), Some(150.0));
        assert_eq!(result.get("Lombardia"), Some(30.0));
        assert_eq!(result.total, 180.0);
        assert_eq!(result.matched_rows, 3);
    }

    #[test]
    fn absent_regions_are_omitted() {
        let selection = FilterSelection::new("3kW", "TD", "Residente");
        let result = aggregate(&example_table(), &selection);
        assert_eq!(result.by_region.len(), 2);
        assert_eq!(result.get("Sicilia"), None);
    }

    #[test]
    fn match_is_case_sensitive() {
        let selection = FilterSelection::new("3kw", "TD", "Residente");
        let result = aggregate(&example_table(), &selection);
        assert!(result.is_empty());
        assert_eq!(result.total, 0.0);
        assert_eq!(result.max_value(), None);
    }

    #[test]
    fn grand_total_equals_sum_of_regions() {
        let selection = FilterSelection::new("3kW", "TD", "Residente");
        let result = aggregate(&example_table(), &selection);
        let regional: f64 = result.by_region.values().sum();
        assert_eq!(regional, result.total);
    }

    #[test]
    fn aggregation_is_pure() {
        let table = example_table();
        let selection = FilterSelection::new("3kW", "TD", "Residente");
        assert_eq!(aggregate(&table, &selection), aggregate(&table, &selection));
    }

    #[test]
    fn max_is_largest_region() {
        let selection = FilterSelection::new("3kW", "TD", "Residente");
        let result = aggregate(&example_table(), &selection);
        assert_eq!(result.max_value(), Some(150.0));
    }

    #[test]
    fn display_lists_regions() {
        let selection = FilterSelection::new("3kW", "TD", "Residente");
        let text = aggregate(&example_table(), &selection).to_string();
        assert!(text.contains("Lazio"));
        assert!(text.contains("150.00"));
    }
}
