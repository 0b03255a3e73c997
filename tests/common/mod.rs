//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use energy_map::config::DashboardConfig;

/// Path of a file under `tests/fixtures`.
pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Sample consumption table (`;` fields, `,` decimals).
pub fn sample_csv() -> PathBuf {
    fixture("sample.csv")
}

/// Four sample regions: Lombardia, Lazio, Molise, Sicilia.
pub fn sample_geojson() -> PathBuf {
    fixture("regions.geojson")
}

/// Default preset with the geometry pointed at the sample regions.
pub fn sample_config() -> DashboardConfig {
    let mut config = DashboardConfig::default_preset();
    config.geometry.path = sample_geojson();
    config
}

/// Fresh per-test scratch directory under the system temp dir.
pub fn scratch_dir(test: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("energy-map-{test}-{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

/// Writes `content` to `name` inside `dir` and returns the path.
pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("write scratch file");
    path
}
