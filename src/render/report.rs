//! Plain-text summary of one filtered view.

use std::fmt;

use super::format::format_thousands;
use crate::analysis::aggregate::AggregatedResult;
use crate::data::geometry::GeometryCollection;

/// Selection, grand total, per-region sums, and join diagnostics.
#[derive(Debug, Clone)]
pub struct DashboardReport {
    /// The aggregate being reported.
    pub result: AggregatedResult,
    /// Aggregated regions with no matching geometry feature.
    pub unmatched_regions: Vec<String>,
    /// Geometry regions drawn without data.
    pub regions_without_data: usize,
}

impl DashboardReport {
    /// Joins `result` against `geometry` to collect the diagnostics.
    pub fn new(result: &AggregatedResult, geometry: &GeometryCollection) -> Self {
        let unmatched_regions = result
            .by_region
            .keys()
            .filter(|region| !geometry.contains_key(region))
            .cloned()
            .collect();
        let regions_without_data = geometry
            .iter()
            .filter(|(key, _)| result.get(key).is_none())
            .count();
        Self {
            result: result.clone(),
            unmatched_regions,
            regions_without_data,
        }
    }

    /// Grand total with thousands separators and two decimals.
    pub fn formatted_total(&self) -> String {
        format_thousands(self.result.total)
    }
}

impl fmt::Display for DashboardReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.result.selection;
        writeln!(f, "--- Filtered energy consumption ---")?;
        writeln!(f, "Power tier:   {}", s.power_tier)?;
        writeln!(f, "Tariff:       {}", s.tariff)?;
        writeln!(f, "Residency:    {}", s.residency)?;
        writeln!(f, "Matched rows: {}", self.result.matched_rows)?;
        writeln!(f, "Total energy: {} kWh", self.formatted_total())?;
        writeln!(f)?;
        write!(f, "{}", self.result)?;
        if self.regions_without_data > 0 {
            writeln!(f, "\n{} map regions without data", self.regions_without_data)?;
        }
        if !self.unmatched_regions.is_empty() {
            writeln!(
                f,
                "Regions missing from the map: {}",
                self.unmatched_regions.join(", ")
            )?;
        }
        Ok(())
    }
}
