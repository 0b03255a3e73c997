//! CSV loading: header validation, text normalisation, decimal coercion.

use std::fs;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, info, warn};

use super::record::{ColumnNames, LoadStats, Record, Table};
use crate::error::DashboardError;

/// How to read the consumption CSV.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderOptions {
    /// Field separator byte.
    pub delimiter: u8,
    /// Decimal separator of the energy column.
    pub decimal: char,
    /// Header names of the required columns.
    pub columns: ColumnNames,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            delimiter: b';',
            decimal: ',',
            columns: ColumnNames::default(),
        }
    }
}

/// Positions of the required columns within a header row.
struct ColumnIndex {
    region: usize,
    power_tier: usize,
    tariff: usize,
    residency: usize,
    total_energy: usize,
}

impl ColumnIndex {
    fn resolve(headers: &StringRecord, columns: &ColumnNames) -> Result<Self, DashboardError> {
        let position = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim_start_matches('\u{feff}').trim() == name)
        };

        let missing: Vec<String> = columns
            .required()
            .into_iter()
            .filter(|name| position(*name).is_none())
            .map(str::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(DashboardError::MissingColumns(missing));
        }

        let [region, power_tier, tariff, residency, total_energy] =
            columns.required().map(|name| position(name).unwrap_or_default());
        Ok(Self {
            region,
            power_tier,
            tariff,
            residency,
            total_energy,
        })
    }
}

/// Parses CSV bytes into a [`Table`].
///
/// # Errors
///
/// Returns [`DashboardError::MissingColumns`] when a required header is
/// absent and [`DashboardError::Csv`] for malformed content.
pub fn load_table(bytes: &[u8], options: &LoaderOptions) -> Result<Table, DashboardError> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(options.delimiter)
        .flexible(true)
        .trim(Trim::Headers)
        .from_reader(bytes);

    let headers = rdr.headers()?.clone();
    let index = ColumnIndex::resolve(&headers, &options.columns)?;

    let mut stats = LoadStats::default();
    let mut records = Vec::new();
    for row in rdr.records() {
        let row = row?;
        stats.rows_read += 1;

        let field = |i: usize| row.get(i).unwrap_or("").trim();

        let region = title_case(field(index.region));
        if region.is_empty() {
            stats.rows_dropped += 1;
            continue;
        }

        let raw_energy = field(index.total_energy);
        let total_energy = parse_decimal(raw_energy, options.decimal).unwrap_or_else(|| {
            stats.energy_coerced += 1;
            debug!(line = stats.rows_read + 1, value = raw_energy, "energy value coerced to 0");
            0.0
        });

        records.push(Record {
            region,
            power_tier: field(index.power_tier).to_string(),
            tariff: field(index.tariff).to_string(),
            residency: field(index.residency).to_string(),
            total_energy,
        });
    }

    if stats.rows_dropped > 0 {
        warn!(rows = stats.rows_dropped, "dropped rows without region");
    }
    if stats.energy_coerced > 0 {
        warn!(rows = stats.energy_coerced, "unparseable energy values set to 0");
    }
    info!(
        rows_read = stats.rows_read,
        rows_kept = records.len(),
        "loaded consumption table"
    );

    Ok(Table::new(records, stats))
}

/// Reads and parses a CSV file.
///
/// # Errors
///
/// Returns [`DashboardError::Io`] if the file cannot be read, otherwise the
/// errors of [`load_table`].
pub fn load_table_file(path: &Path, options: &LoaderOptions) -> Result<Table, DashboardError> {
    let bytes = fs::read(path).map_err(|source| DashboardError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_table(&bytes, options)
}

/// Parses a decimal number written with `decimal` as separator.
///
/// Returns `None` for empty, malformed, or non-finite values.
pub fn parse_decimal(raw: &str, decimal: char) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let normalized = if decimal == '.' {
        raw.to_string()
    } else {
        raw.replace(decimal, ".")
    };
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Upper-cases the first letter of every alphabetic run and lower-cases the
/// rest, so region names written in any case compare equal.
///
/// ```
/// use energy_map::data::loader::title_case;
///
/// assert_eq!(title_case("emilia-romagna"), "Emilia-Romagna");
/// assert_eq!(title_case("VALLE D'AOSTA"), "Valle D'Aosta");
/// ```
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}
