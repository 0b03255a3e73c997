//! CSV export of per-region sums.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::analysis::aggregate::AggregatedResult;

/// Column header of the regional export.
const HEADER: [&str; 2] = ["region", "total_energy"];

/// Exports the per-region sums to a CSV file at the given path.
///
/// Uses the same separators as the input (`;` fields, `,` decimals) so the
/// file opens in the same spreadsheet locale.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(result: &AggregatedResult, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(result, buf)
}

/// Writes the per-region sums as CSV to any writer.
///
/// One row per region in name order. Produces deterministic output for
/// identical inputs.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(result: &AggregatedResult, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_writer(writer);

    wtr.write_record(HEADER)?;
    for (region, value) in &result.by_region {
        let value = format!("{value:.2}").replace('.', ",");
        wtr.write_record([region.as_str(), value.as_str()])?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::aggregate::aggregate;
    use crate::analysis::filter::FilterSelection;
    use crate::data::loader::{LoaderOptions, load_table};
    use crate::data::record::{Record, Table};

    fn result() -> AggregatedResult {
        let table = Table::from_records([
            Record::new("Lombardia", "3kW", "TD", "Residente", 30.25),
            Record::new("Lazio", "3kW", "TD", "Residente", 100.0),
            Record::new("Lazio", "3kW", "TD", "Residente", 50.0),
        ]);
        aggregate(&table, &FilterSelection::new("3kW", "TD", "Residente"))
    }

    #[test]
    fn rows_are_sorted_by_region() {
        let mut buf = Vec::new();
        write_csv(&result(), &mut buf).ok();
        let output = String::from_utf8(buf).ok();
        let lines: Vec<&str> = output.as_deref().unwrap_or("").lines().collect();
        assert_eq!(
            lines,
            vec!["region;total_energy", "Lazio;150,00", "Lombardia;30,25"]
        );
    }

    #[test]
    fn deterministic_output() {
        let mut buf1 = Vec::new();
        let mut buf2 = Vec::new();
        write_csv(&result(), &mut buf1).ok();
        write_csv(&result(), &mut buf2).ok();
        assert_eq!(buf1, buf2);
    }

    #[test]
    fn export_reads_back_with_the_loader_number_format() {
        let mut buf = Vec::new();
        write_csv(&result(), &mut buf).ok();

        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(b';')
            .from_reader(buf.as_slice());
        let mut total = 0.0;
        for record in rdr.records() {
            let rec = record.expect("every row should parse");
            let value = crate::data::loader::parse_decimal(&rec[1], ',');
            assert!(value.is_some(), "column 1 should parse as decimal");
            total += value.unwrap_or_default();
        }
        assert_eq!(total, 180.25);
        // the loader rejects the export: it has none of the record columns
        assert!(load_table(&buf, &LoaderOptions::default()).is_err());
    }
}
