//! API response and query types.

use serde::{Deserialize, Serialize};

use crate::analysis::aggregate::AggregatedResult;
use crate::analysis::filter::{FilterRequest, FilterSelection};
use crate::render::format::format_thousands;

/// Query string shared by all endpoints; absent stages take their first
/// option.
#[derive(Debug, Default, Deserialize)]
pub struct FilterQuery {
    pub power_tier: Option<String>,
    pub tariff: Option<String>,
    pub residency: Option<String>,
}

impl From<FilterQuery> for FilterRequest {
    fn from(q: FilterQuery) -> Self {
        // `?tariff=` means "not chosen", same as omitting it
        let chosen = |v: Option<String>| v.filter(|s| !s.is_empty());
        Self {
            power_tier: chosen(q.power_tier),
            tariff: chosen(q.tariff),
            residency: chosen(q.residency),
        }
    }
}

/// Sum for one region.
#[derive(Debug, Serialize)]
pub struct RegionTotal {
    pub region: String,
    /// kWh.
    pub total_energy: f64,
}

/// Response of `GET /aggregate`.
#[derive(Debug, Serialize)]
pub struct AggregateResponse {
    pub selection: FilterSelection,
    /// Regions in name order.
    pub regions: Vec<RegionTotal>,
    /// Grand total (kWh).
    pub total: f64,
    /// Grand total with thousands separators, e.g. `"1,234.50"`.
    pub total_formatted: String,
    pub matched_rows: usize,
}

impl From<&AggregatedResult> for AggregateResponse {
    fn from(r: &AggregatedResult) -> Self {
        Self {
            selection: r.selection.clone(),
            regions: r
                .by_region
                .iter()
                .map(|(region, &total_energy)| RegionTotal {
                    region: region.clone(),
                    total_energy,
                })
                .collect(),
            total: r.total,
            total_formatted: format_thousands(r.total),
            matched_rows: r.matched_rows,
        }
    }
}

/// Structured error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn empty_query_values_are_unset() {
        let req = FilterRequest::from(FilterQuery {
            power_tier: Some("3kW".into()),
            tariff: Some(String::new()),
            residency: None,
        });
        assert_eq!(req.power_tier.as_deref(), Some("3kW"));
        assert!(req.tariff.is_none());
        assert!(req.residency.is_none());
    }

    #[test]
    fn aggregate_response_formats_total() {
        let result = AggregatedResult {
            selection: FilterSelection::new("3kW", "TD", "Residente"),
            by_region: BTreeMap::from([("Lazio".to_string(), 1234.5)]),
            total: 1234.5,
            matched_rows: 2,
        };
        let resp = AggregateResponse::from(&result);
        assert_eq!(resp.total_formatted, "1,234.50");
        assert_eq!(resp.regions.len(), 1);
        assert_eq!(resp.regions[0].region, "Lazio");
    }
}
