//! The load → filter → aggregate pipeline shared by every front end.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use crate::analysis::aggregate::{AggregatedResult, aggregate};
use crate::analysis::filter::{FilterRequest, FilterSelector, ResolvedFilters};
use crate::config::DashboardConfig;
use crate::data::cache::DataStore;
use crate::data::geometry::GeometryCollection;
use crate::data::record::Table;
use crate::error::DashboardError;
use crate::render::report::DashboardReport;
use crate::render::svg::{Choropleth, MapStyle};

/// Where the two inputs come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputPaths {
    /// Consumption CSV.
    pub csv: PathBuf,
    /// Region GeoJSON.
    pub geojson: PathBuf,
    /// GeoJSON property holding the region name.
    pub feature_id_key: String,
}

impl InputPaths {
    /// Combines a CSV path with the `[geometry]` section of `config`.
    pub fn new(csv: impl Into<PathBuf>, config: &DashboardConfig) -> Self {
        Self {
            csv: csv.into(),
            geojson: config.geometry.path.clone(),
            feature_id_key: config.geometry.feature_id_key.clone(),
        }
    }
}

/// Immutable inputs of one dashboard session.
#[derive(Debug, Clone)]
pub struct Session {
    pub table: Arc<Table>,
    pub geometry: Arc<GeometryCollection>,
}

impl Session {
    /// Loads (or reuses) both inputs through `store`.
    ///
    /// # Errors
    ///
    /// Returns the first loader error: the table is loaded before the
    /// geometry.
    pub fn load(store: &mut DataStore, paths: &InputPaths) -> Result<Self, DashboardError> {
        let table = store.table_from_path(&paths.csv)?;
        let geometry = store.geometry(&paths.geojson, &paths.feature_id_key)?;
        Ok(Self { table, geometry })
    }

    /// Drops cached geometry for `paths` and loads both inputs again.
    ///
    /// The table needs no explicit invalidation: changed bytes hash to a new
    /// key, which replaces the path's previous entry.
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load).
    pub fn reload(store: &mut DataStore, paths: &InputPaths) -> Result<Self, DashboardError> {
        store.invalidate_geometry(&paths.geojson, &paths.feature_id_key);
        info!(csv = %paths.csv.display(), geojson = %paths.geojson.display(), "reloading inputs");
        Self::load(store, paths)
    }

    /// Resolves the cascading options for `request`.
    ///
    /// # Errors
    ///
    /// See [`FilterSelector::resolve`].
    pub fn resolve(&self, request: &FilterRequest) -> Result<ResolvedFilters, DashboardError> {
        FilterSelector::new(&self.table).resolve(request)
    }

    /// Resolves `request` and aggregates the matching rows.
    ///
    /// # Errors
    ///
    /// See [`FilterSelector::resolve`].
    pub fn view(&self, request: &FilterRequest) -> Result<DashboardView, DashboardError> {
        let resolved = self.resolve(request)?;
        let result = aggregate(&self.table, &resolved.selection);
        let report = DashboardReport::new(&result, &self.geometry);
        Ok(DashboardView {
            resolved,
            result,
            report,
        })
    }
}

/// Everything shown for one selection state.
#[derive(Debug, Clone)]
pub struct DashboardView {
    pub resolved: ResolvedFilters,
    pub result: AggregatedResult,
    pub report: DashboardReport,
}

impl DashboardView {
    /// Choropleth of this view over `geometry`.
    pub fn choropleth<'a>(
        &'a self,
        geometry: &'a GeometryCollection,
        style: &'a MapStyle,
    ) -> Choropleth<'a> {
        Choropleth::new(geometry, &self.result, style)
    }
}

/// Convenience for one-shot callers: loads both inputs into a fresh store.
///
/// # Errors
///
/// Same as [`Session::load`].
pub fn load_session(config: &DashboardConfig, csv: &Path) -> Result<Session, DashboardError> {
    let mut store = DataStore::new(config.loader_options());
    Session::load(&mut store, &InputPaths::new(csv, config))
}
