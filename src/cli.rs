//! Command-line argument parsing.

use std::env;
use std::path::PathBuf;

use crate::analysis::filter::FilterRequest;

/// Parsed command-line options.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CliOptions {
    pub csv: Option<PathBuf>,
    pub geojson: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub preset: Option<String>,
    pub filters: FilterRequest,
    pub list_options: bool,
    pub svg_out: Option<PathBuf>,
    pub csv_out: Option<PathBuf>,
    pub tui: bool,
    pub serve: bool,
    pub port: Option<u16>,
    /// `--help` was given; the remaining arguments were not parsed.
    pub help: bool,
}

/// Parses `std::env::args`.
///
/// # Errors
///
/// Returns a message describing the first invalid argument.
pub fn parse_args() -> Result<CliOptions, String> {
    let args: Vec<String> = env::args().skip(1).collect();
    parse_args_from(args)
}

/// Parses an argument list without the program name.
///
/// # Errors
///
/// Returns a message describing the first invalid argument.
pub fn parse_args_from(args: Vec<String>) -> Result<CliOptions, String> {
    let mut i = 0usize;
    let mut opts = CliOptions::default();

    while i < args.len() {
        match args[i].as_str() {
            "--csv" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --csv (expected a CSV path)")?;
                set_once(&mut opts.csv, PathBuf::from(path), "--csv")?;
            }
            "--geojson" => {
                i += 1;
                let path =
                    args.next_or_err(i, "missing value for --geojson (expected a GeoJSON path)")?;
                set_once(&mut opts.geojson, PathBuf::from(path), "--geojson")?;
            }
            "--config" => {
                i += 1;
                let path =
                    args.next_or_err(i, "missing value for --config (expected a TOML path)")?;
                set_once(&mut opts.config, PathBuf::from(path), "--config")?;
            }
            "--preset" => {
                i += 1;
                let name =
                    args.next_or_err(i, "missing value for --preset (expected a preset name)")?;
                set_once(&mut opts.preset, name.to_string(), "--preset")?;
            }
            "--power-tier" => {
                i += 1;
                let v = args.next_or_err(i, "missing value for --power-tier")?;
                set_once(&mut opts.filters.power_tier, v.to_string(), "--power-tier")?;
            }
            "--tariff" => {
                i += 1;
                let v = args.next_or_err(i, "missing value for --tariff")?;
                set_once(&mut opts.filters.tariff, v.to_string(), "--tariff")?;
            }
            "--residency" => {
                i += 1;
                let v = args.next_or_err(i, "missing value for --residency")?;
                set_once(&mut opts.filters.residency, v.to_string(), "--residency")?;
            }
            "--svg-out" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --svg-out (expected a file path)")?;
                set_once(&mut opts.svg_out, PathBuf::from(path), "--svg-out")?;
            }
            "--csv-out" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --csv-out (expected a file path)")?;
                set_once(&mut opts.csv_out, PathBuf::from(path), "--csv-out")?;
            }
            "--port" => {
                i += 1;
                let raw = args.next_or_err(i, "missing value for --port (expected a u16)")?;
                let port = raw
                    .parse::<u16>()
                    .map_err(|_| format!("--port value \"{raw}\" is not a valid u16"))?;
                set_once(&mut opts.port, port, "--port")?;
            }
            "--list-options" => opts.list_options = true,
            "--tui" => opts.tui = true,
            "--serve" => opts.serve = true,
            "--help" | "-h" => {
                return Ok(CliOptions {
                    help: true,
                    ..CliOptions::default()
                });
            }
            other => return Err(format!("unknown argument: {other}")),
        }
        i += 1;
    }

    if opts.config.is_some() && opts.preset.is_some() {
        return Err(
            "arguments `--config` and `--preset` are mutually exclusive; choose one source"
                .to_string(),
        );
    }
    if opts.tui && opts.serve {
        return Err("arguments `--tui` and `--serve` are mutually exclusive".to_string());
    }

    Ok(opts)
}

fn set_once<T>(slot: &mut Option<T>, value: T, flag: &str) -> Result<(), String> {
    if slot.replace(value).is_some() {
        return Err(format!("{flag} provided more than once"));
    }
    Ok(())
}

trait SliceArgExt {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String>;
}

impl SliceArgExt for [String] {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String> {
        self.get(index)
            .map(String::as_str)
            .ok_or_else(|| err.to_string())
    }
}

pub fn print_usage() {
    eprintln!("energy-map: regional energy consumption dashboard");
    eprintln!();
    eprintln!("Usage: energy-map --csv <path> [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --csv <path>             Consumption CSV (`;` fields, `,` decimals)");
    eprintln!("  --geojson <path>         Region GeoJSON (default: italy_regions.geojson)");
    eprintln!("  --config <path>          Load settings from a TOML file");
    eprintln!("  --preset <name>          Built-in settings (default, italian)");
    eprintln!("  --power-tier <value>     Power tier filter (default: first option)");
    eprintln!("  --tariff <value>         Tariff filter (default: first option)");
    eprintln!("  --residency <value>      Residency filter (default: first option)");
    eprintln!("  --list-options           Print the cascading options and exit");
    eprintln!("  --svg-out <path>         Write the choropleth as SVG");
    eprintln!("  --csv-out <path>         Write the per-region sums as CSV");
    eprintln!("  --tui                    Interactive terminal dashboard (feature `tui`)");
    eprintln!("  --serve                  Serve the HTTP API (feature `api`)");
    eprintln!("  --port <u16>             API port (default: from config, 3000)");
    eprintln!("  --help                   Show this help message");
}
