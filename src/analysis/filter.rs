//! Cascading option lists for power tier, tariff, and residency.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::data::record::{Record, Table};
use crate::error::{DashboardError, FilterStage};

/// A fully resolved `(power tier, tariff, residency)` triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FilterSelection {
    pub power_tier: String,
    pub tariff: String,
    pub residency: String,
}

impl FilterSelection {
    pub fn new(
        power_tier: impl Into<String>,
        tariff: impl Into<String>,
        residency: impl Into<String>,
    ) -> Self {
        Self {
            power_tier: power_tier.into(),
            tariff: tariff.into(),
            residency: residency.into(),
        }
    }

    /// Returns `true` if the record matches all three fields exactly.
    pub fn matches(&self, record: &Record) -> bool {
        record.power_tier == self.power_tier
            && record.tariff == self.tariff
            && record.residency == self.residency
    }
}

/// Partially specified selection; `None` stages take their first option.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterRequest {
    pub power_tier: Option<String>,
    pub tariff: Option<String>,
    pub residency: Option<String>,
}

impl FilterRequest {
    fn requested(&self, stage: FilterStage) -> Option<&str> {
        match stage {
            FilterStage::PowerTier => self.power_tier.as_deref(),
            FilterStage::Tariff => self.tariff.as_deref(),
            FilterStage::Residency => self.residency.as_deref(),
        }
    }
}

/// The option lists that were valid while resolving a selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub power_tiers: Vec<String>,
    pub tariffs: Vec<String>,
    pub residencies: Vec<String>,
}

impl FilterOptions {
    /// Options of one stage.
    pub fn for_stage(&self, stage: FilterStage) -> &[String] {
        match stage {
            FilterStage::PowerTier => &self.power_tiers,
            FilterStage::Tariff => &self.tariffs,
            FilterStage::Residency => &self.residencies,
        }
    }
}

/// Result of [`FilterSelector::resolve`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedFilters {
    pub options: FilterOptions,
    pub selection: FilterSelection,
}

/// Derives the cascading option lists from a table.
pub struct FilterSelector<'a> {
    table: &'a Table,
}

impl<'a> FilterSelector<'a> {
    pub fn new(table: &'a Table) -> Self {
        Self { table }
    }

    /// Distinct power tiers across the whole table, ascending.
    pub fn power_tiers(&self) -> Vec<String> {
        distinct(self.table.records().iter(), |r| &r.power_tier)
    }

    /// Distinct tariffs among rows with `power_tier`, ascending.
    pub fn tariffs(&self, power_tier: &str) -> Vec<String> {
        distinct(
            self.table
                .records()
                .iter()
                .filter(|r| r.power_tier == power_tier),
            |r| &r.tariff,
        )
    }

    /// Distinct residency types among rows with both `power_tier` and
    /// `tariff`, ascending.
    pub fn residencies(&self, power_tier: &str, tariff: &str) -> Vec<String> {
        distinct(
            self.table
                .records()
                .iter()
                .filter(|r| r.power_tier == power_tier && r.tariff == tariff),
            |r| &r.residency,
        )
    }

    /// Resolves a request stage by stage, defaulting each unset stage to its
    /// first option.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::EmptyFilterResult`] when a stage has no
    /// options and [`DashboardError::UnknownOption`] when a requested value
    /// is not among them.
    pub fn resolve(&self, request: &FilterRequest) -> Result<ResolvedFilters, DashboardError> {
        let power_tiers = self.power_tiers();
        let power_tier = pick(FilterStage::PowerTier, &power_tiers, request)?;

        let tariffs = self.tariffs(&power_tier);
        let tariff = pick(FilterStage::Tariff, &tariffs, request)?;

        let residencies = self.residencies(&power_tier, &tariff);
        let residency = pick(FilterStage::Residency, &residencies, request)?;

        Ok(ResolvedFilters {
            options: FilterOptions {
                power_tiers,
                tariffs,
                residencies,
            },
            selection: FilterSelection {
                power_tier,
                tariff,
                residency,
            },
        })
    }
}

fn distinct<'r>(
    records: impl Iterator<Item = &'r Record>,
    field: impl Fn(&'r Record) -> &'r String,
) -> Vec<String> {
    records
        .map(field)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .cloned()
        .collect()
}

fn pick(
    stage: FilterStage,
    options: &[String],
    request: &FilterRequest,
) -> Result<String, DashboardError> {
    let Some(first) = options.first() else {
        return Err(DashboardError::EmptyFilterResult(stage));
    };
    match request.requested(stage) {
        None => Ok(first.clone()),
        Some(value) if options.iter().any(|o| o == value) => Ok(value.to_string()),
        Some(value) => Err(DashboardError::UnknownOption {
            stage,
            value: value.to_string(),
            available: options.to_vec(),
        }),
    }
}
