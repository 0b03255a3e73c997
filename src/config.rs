//! TOML-based dashboard configuration and preset definitions.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::data::loader::LoaderOptions;
use crate::data::record::ColumnNames;
use crate::render::scale::ColorScale;
use crate::render::svg::MapStyle;

/// Top-level dashboard configuration parsed from TOML.
///
/// All fields have defaults matching the `default` preset. Load from
/// TOML with [`DashboardConfig::from_toml_file`] or use
/// [`DashboardConfig::default_preset`] for the built-in default.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DashboardConfig {
    /// CSV location and number format.
    #[serde(default)]
    pub input: InputConfig,
    /// Header names of the five required columns.
    #[serde(default)]
    pub columns: ColumnNames,
    /// Region-boundary file and join property.
    #[serde(default)]
    pub geometry: GeometryConfig,
    /// Choropleth rendering parameters.
    #[serde(default)]
    pub map: MapConfig,
    /// Log level and destination.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// HTTP API parameters.
    #[serde(default)]
    pub server: ServerConfig,
}

/// CSV location and number format.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputConfig {
    /// CSV file to load when `--csv` is not given.
    pub csv_path: Option<PathBuf>,
    /// Field separator (single ASCII character).
    pub delimiter: String,
    /// Decimal separator of the energy column (single character).
    pub decimal: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            csv_path: None,
            delimiter: ";".to_string(),
            decimal: ",".to_string(),
        }
    }
}

/// Region-boundary file and join property.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeometryConfig {
    /// GeoJSON file path.
    pub path: PathBuf,
    /// Feature property holding the region name.
    pub feature_id_key: String,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("italy_regions.geojson"),
            feature_id_key: "reg_name".to_string(),
        }
    }
}

/// Choropleth rendering parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MapConfig {
    /// SVG width in pixels.
    pub width: u32,
    /// SVG height in pixels.
    pub height: u32,
    /// Sequential colour scale: `"reds"`, `"blues"` or `"greens"`.
    pub color_scale: String,
    /// Title of the colour bar.
    pub legend_title: String,
    /// Fill for regions without data, as `#rrggbb`.
    pub no_data_color: String,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 900,
            color_scale: "reds".to_string(),
            legend_title: "Energia (kWh)".to_string(),
            no_data_color: "#e5e5e5".to_string(),
        }
    }
}

/// Log level and destination.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`.
    pub level: String,
    /// Write logs to this file instead of stderr.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// HTTP API parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Listening port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 3000 }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"input.delimiter"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}: {}", self.field, self.message)
    }
}

impl DashboardConfig {
    /// Returns the default configuration (English column headers).
    pub fn default_preset() -> Self {
        Self {
            input: InputConfig::default(),
            columns: ColumnNames::default(),
            geometry: GeometryConfig::default(),
            map: MapConfig::default(),
            logging: LoggingConfig::default(),
            server: ServerConfig::default(),
        }
    }

    /// Returns the Italian preset: the headers used by the regional
    /// consumption exports (`regione`, `potenza_imp`, ...).
    pub fn italian() -> Self {
        Self {
            columns: ColumnNames::italian(),
            ..Self::default_preset()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["default", "italian"];

    /// Loads a configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "default" => Ok(Self::default_preset()),
            "italian" => Ok(Self::italian()),
            _ => Err(ConfigError {
                field: "preset".to_string(),
                message: format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            }),
        }
    }

    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "config".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let input = &self.input;
        if single_char(&input.delimiter).filter(char::is_ascii).is_none() {
            errors.push(ConfigError {
                field: "input.delimiter".into(),
                message: format!(
                    "must be a single ASCII character, got \"{}\"",
                    input.delimiter
                ),
            });
        }
        match single_char(&input.decimal) {
            None => errors.push(ConfigError {
                field: "input.decimal".into(),
                message: format!("must be a single character, got \"{}\"", input.decimal),
            }),
            Some(c) if input.delimiter.starts_with(c) => errors.push(ConfigError {
                field: "input.decimal".into(),
                message: "must differ from input.delimiter".into(),
            }),
            Some(_) => {}
        }

        let cols = &self.columns;
        for (field, name) in [
            ("columns.region", &cols.region),
            ("columns.power_tier", &cols.power_tier),
            ("columns.tariff", &cols.tariff),
            ("columns.residency", &cols.residency),
            ("columns.total_energy", &cols.total_energy),
        ] {
            if name.trim().is_empty() {
                errors.push(ConfigError {
                    field: field.into(),
                    message: "must not be empty".into(),
                });
            }
        }

        if self.geometry.feature_id_key.trim().is_empty() {
            errors.push(ConfigError {
                field: "geometry.feature_id_key".into(),
                message: "must not be empty".into(),
            });
        }

        let map = &self.map;
        if map.width < 100 || map.height < 100 {
            errors.push(ConfigError {
                field: "map.width".into(),
                message: "map.width and map.height must be >= 100".into(),
            });
        }
        if ColorScale::from_name(&map.color_scale).is_none() {
            errors.push(ConfigError {
                field: "map.color_scale".into(),
                message: format!(
                    "must be one of {}, got \"{}\"",
                    ColorScale::NAMES.join(", "),
                    map.color_scale
                ),
            });
        }
        if !is_hex_color(&map.no_data_color) {
            errors.push(ConfigError {
                field: "map.no_data_color".into(),
                message: format!("must be #rrggbb, got \"{}\"", map.no_data_color),
            });
        }

        errors
    }

    /// Builds loader options from the `[input]` and `[columns]` sections.
    ///
    /// Call after [`validate`](Self::validate); invalid separators fall back
    /// to `;` and `,`.
    pub fn loader_options(&self) -> LoaderOptions {
        let delimiter = single_char(&self.input.delimiter)
            .filter(char::is_ascii)
            .map_or(b';', |c| c as u8);
        let decimal = single_char(&self.input.decimal).unwrap_or(',');
        LoaderOptions {
            delimiter,
            decimal,
            columns: self.columns.clone(),
        }
    }

    /// Builds the SVG style from the `[map]` section.
    pub fn map_style(&self) -> MapStyle {
        MapStyle {
            width: self.map.width,
            height: self.map.height,
            scale: ColorScale::from_name(&self.map.color_scale).unwrap_or_default(),
            legend_title: self.map.legend_title.clone(),
            no_data_color: self.map.no_data_color.clone(),
        }
    }
}

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

fn is_hex_color(s: &str) -> bool {
    s.len() == 7 && s.starts_with('#') && s[1..].chars().all(|c| c.is_ascii_hexdigit())
}
