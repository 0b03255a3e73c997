//! energy-map entry point: CLI wiring and config-driven dashboard construction.

use std::process;

use tracing::error;

use energy_map::cli::{self, CliOptions};
use energy_map::config::DashboardConfig;
use energy_map::dashboard::{InputPaths, Session};
use energy_map::data::DataStore;
use energy_map::error::DashboardError;
use energy_map::io::export::export_csv;
use energy_map::logging;
use energy_map::render::svg::write_svg;

/// Loads the configuration: `--config` takes priority, then `--preset`,
/// then the default preset. CLI paths override the file.
fn load_config(cli: &CliOptions) -> Result<DashboardConfig, Vec<String>> {
    let mut config = if let Some(ref path) = cli.config {
        DashboardConfig::from_toml_file(path).map_err(|e| vec![e.to_string()])?
    } else if let Some(ref name) = cli.preset {
        DashboardConfig::from_preset(name).map_err(|e| vec![e.to_string()])?
    } else {
        DashboardConfig::default_preset()
    };

    if let Some(ref csv) = cli.csv {
        config.input.csv_path = Some(csv.clone());
    }
    if let Some(ref geojson) = cli.geojson {
        config.geometry.path = geojson.clone();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let errors = config.validate();
    if errors.is_empty() {
        Ok(config)
    } else {
        Err(errors.iter().map(ToString::to_string).collect())
    }
}

/// Prints a pipeline error and exits; empty cascades exit cleanly.
fn report_and_exit(e: &DashboardError) -> ! {
    if e.is_warning() {
        eprintln!("warning: {e}");
        process::exit(0);
    }
    error!("{e}");
    eprintln!("error: {e}");
    process::exit(1);
}

fn main() {
    let cli = match cli::parse_args() {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("error: {e}");
            cli::print_usage();
            process::exit(2);
        }
    };
    if cli.help {
        cli::print_usage();
        return;
    }

    let config = match load_config(&cli) {
        Ok(cfg) => cfg,
        Err(errors) => {
            for e in &errors {
                eprintln!("{e}");
            }
            process::exit(1);
        }
    };

    // the TUI owns the terminal, so it only logs to a file
    if !cli.tui || config.logging.file.is_some() {
        if let Err(e) = logging::init_tracing(&config.logging) {
            eprintln!("error: cannot open log file: {e}");
            process::exit(1);
        }
    }

    let Some(csv_path) = config.input.csv_path.clone() else {
        eprintln!("warning: load a CSV file to continue (--csv <path>)");
        process::exit(1);
    };
    let paths = InputPaths::new(csv_path, &config);
    let mut store = DataStore::new(config.loader_options());

    #[cfg(feature = "tui")]
    if cli.tui {
        if let Err(e) = energy_map::tui::run(store, paths, &config) {
            report_and_exit(&e);
        }
        return;
    }
    #[cfg(not(feature = "tui"))]
    if cli.tui {
        eprintln!("error: --tui requires the `tui` feature");
        process::exit(1);
    }

    let session = Session::load(&mut store, &paths).unwrap_or_else(|e| report_and_exit(&e));

    #[cfg(feature = "api")]
    if cli.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        let state = Arc::new(energy_map::api::AppState {
            session,
            style: config.map_style(),
        });
        let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
        let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
            eprintln!("error: failed to create tokio runtime: {e}");
            process::exit(1);
        });
        if let Err(e) = rt.block_on(energy_map::api::serve(state, addr)) {
            eprintln!("error: API server failed: {e}");
            process::exit(1);
        }
        return;
    }
    #[cfg(not(feature = "api"))]
    if cli.serve {
        eprintln!("error: --serve requires the `api` feature");
        process::exit(1);
    }

    if cli.list_options {
        let resolved = session
            .resolve(&cli.filters)
            .unwrap_or_else(|e| report_and_exit(&e));
        let o = &resolved.options;
        println!("power tiers: {}", o.power_tiers.join(" | "));
        println!("tariffs ({}): {}", resolved.selection.power_tier, o.tariffs.join(" | "));
        println!(
            "residencies ({}, {}): {}",
            resolved.selection.power_tier,
            resolved.selection.tariff,
            o.residencies.join(" | ")
        );
        return;
    }

    let view = session
        .view(&cli.filters)
        .unwrap_or_else(|e| report_and_exit(&e));
    println!("{}", view.report);

    if let Some(ref path) = cli.svg_out {
        let style = config.map_style();
        if let Err(e) = write_svg(&view.choropleth(&session.geometry, &style), path) {
            error!("{e}");
            eprintln!("error: failed to write SVG: {e}");
            process::exit(1);
        }
        eprintln!("Map written to {}", path.display());
    }

    if let Some(ref path) = cli.csv_out {
        if let Err(e) = export_csv(&view.result, path) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Regional totals written to {}", path.display());
    }
}
