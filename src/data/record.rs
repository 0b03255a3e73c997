//! Consumption records and the loaded table.

use serde::Deserialize;

/// One row of the consumption table.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Title-cased region name, never empty.
    pub region: String,
    /// Contract-power bracket (e.g. `"3kW"`).
    pub power_tier: String,
    /// Billing-rate class.
    pub tariff: String,
    /// Residency classification.
    pub residency: String,
    /// Consumed energy (kWh); 0 when the source value was unparseable.
    pub total_energy: f64,
}

impl Record {
    /// Creates a record from already-normalised fields.
    pub fn new(
        region: impl Into<String>,
        power_tier: impl Into<String>,
        tariff: impl Into<String>,
        residency: impl Into<String>,
        total_energy: f64,
    ) -> Self {
        Self {
            region: region.into(),
            power_tier: power_tier.into(),
            tariff: tariff.into(),
            residency: residency.into(),
            total_energy,
        }
    }
}

/// Header names of the five required columns.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColumnNames {
    /// Region name column.
    pub region: String,
    /// Power tier column.
    pub power_tier: String,
    /// Tariff column.
    pub tariff: String,
    /// Residency type column.
    pub residency: String,
    /// Total energy column (decimal number).
    pub total_energy: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            region: "region".to_string(),
            power_tier: "power_tier".to_string(),
            tariff: "tariff".to_string(),
            residency: "residency".to_string(),
            total_energy: "total_energy".to_string(),
        }
    }
}

impl ColumnNames {
    /// Headers of the Italian regional consumption exports.
    pub fn italian() -> Self {
        Self {
            region: "regione".to_string(),
            power_tier: "potenza_imp".to_string(),
            tariff: "tariffa".to_string(),
            residency: "residenza".to_string(),
            total_energy: "energia_tot".to_string(),
        }
    }

    /// Column names in validation order.
    pub fn required(&self) -> [&str; 5] {
        [
            &self.region,
            &self.power_tier,
            &self.tariff,
            &self.residency,
            &self.total_energy,
        ]
    }
}

/// Counters collected while loading a table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    /// Data rows read from the file (header excluded).
    pub rows_read: usize,
    /// Rows dropped because the region was empty.
    pub rows_dropped: usize,
    /// Energy values that could not be parsed and were set to 0.
    pub energy_coerced: usize,
}

/// Ordered collection of validated records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    records: Vec<Record>,
    stats: LoadStats,
}

impl Table {
    /// Wraps already-validated records.
    pub fn new(records: Vec<Record>, stats: LoadStats) -> Self {
        Self { records, stats }
    }

    /// Builds a table from records, keeping only those with a region.
    pub fn from_records(records: impl IntoIterator<Item = Record>) -> Self {
        let mut stats = LoadStats::default();
        let records = records
            .into_iter()
            .inspect(|_| stats.rows_read += 1)
            .filter(|r| !r.region.trim().is_empty())
            .collect::<Vec<_>>();
        stats.rows_dropped = stats.rows_read - records.len();
        Self { records, stats }
    }

    /// All records in file order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Loader counters.
    pub fn stats(&self) -> LoadStats {
        self.stats
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the table has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
