//! TUI application state: loaded inputs, cascading selections, current view.

use crate::analysis::filter::{FilterOptions, FilterRequest, FilterSelector};
use crate::config::DashboardConfig;
use crate::dashboard::{DashboardView, InputPaths, Session};
use crate::data::cache::DataStore;
use crate::data::geometry::RegionRaster;
use crate::error::{DashboardError, FilterStage};
use crate::render::scale::ColorScale;

/// Sampling grid used for the terminal map.
const RASTER_COLS: usize = 180;
const RASTER_ROWS: usize = 180;

/// TUI application state.
pub struct App {
    store: DataStore,
    paths: InputPaths,
    session: Session,
    /// Region cells for the map canvas, computed once per geometry load.
    pub rasters: Vec<RegionRaster>,
    /// Option lists of the current cascade state.
    pub options: FilterOptions,
    /// Selected value per stage, in cascade order.
    selected: [Option<String>; 3],
    /// Stage receiving Up/Down.
    pub focus: FilterStage,
    /// Aggregate for the current selection, `None` while the cascade is empty.
    pub view: Option<DashboardView>,
    /// Warning of the last recomputation or reload.
    pub warning: Option<String>,
    /// Colour scale of the map.
    pub scale: ColorScale,
    /// Whether the user has requested quit.
    pub quit: bool,
}

impl App {
    /// Loads both inputs and selects the first option of every stage.
    ///
    /// # Errors
    ///
    /// Returns the loader error if either input cannot be loaded.
    pub fn new(
        mut store: DataStore,
        paths: InputPaths,
        config: &DashboardConfig,
    ) -> Result<Self, DashboardError> {
        let session = Session::load(&mut store, &paths)?;
        let rasters = session.geometry.rasterize(RASTER_COLS, RASTER_ROWS);
        let mut app = Self {
            store,
            paths,
            session,
            rasters,
            options: FilterOptions::default(),
            selected: [None, None, None],
            focus: FilterStage::PowerTier,
            view: None,
            warning: None,
            scale: config.map_style().scale,
            quit: false,
        };
        app.recompute();
        Ok(app)
    }

    /// Loaded session (table and geometry).
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Re-derives the cascade from the current selections and aggregates.
    ///
    /// A selection that is no longer valid falls back to the first option.
    pub fn recompute(&mut self) {
        let selector = FilterSelector::new(&self.session.table);
        self.options = FilterOptions::default();
        self.view = None;
        self.warning = None;

        self.options.power_tiers = selector.power_tiers();
        let Some(power_tier) = settle(&self.options.power_tiers, &mut self.selected[0]) else {
            self.warn_empty(FilterStage::PowerTier);
            return;
        };

        self.options.tariffs = selector.tariffs(&power_tier);
        let Some(tariff) = settle(&self.options.tariffs, &mut self.selected[1]) else {
            self.warn_empty(FilterStage::Tariff);
            return;
        };

        self.options.residencies = selector.residencies(&power_tier, &tariff);
        let Some(residency) = settle(&self.options.residencies, &mut self.selected[2]) else {
            self.warn_empty(FilterStage::Residency);
            return;
        };

        let request = FilterRequest {
            power_tier: Some(power_tier),
            tariff: Some(tariff),
            residency: Some(residency),
        };
        match self.session.view(&request) {
            Ok(view) => self.view = Some(view),
            Err(e) => self.warning = Some(e.to_string()),
        }
    }

    fn warn_empty(&mut self, stage: FilterStage) {
        self.warning = Some(DashboardError::EmptyFilterResult(stage).to_string());
    }

    /// Index of the selected value within its option list.
    pub fn selected_index(&self, stage: FilterStage) -> Option<usize> {
        let value = self.selected[stage_index(stage)].as_ref()?;
        self.options.for_stage(stage).iter().position(|o| o == value)
    }

    /// Selected value of one stage.
    pub fn selected_value(&self, stage: FilterStage) -> Option<&str> {
        self.selected[stage_index(stage)].as_deref()
    }

    /// Moves focus to the next list, wrapping around.
    pub fn focus_next(&mut self) {
        self.focus = match self.focus {
            FilterStage::PowerTier => FilterStage::Tariff,
            FilterStage::Tariff => FilterStage::Residency,
            FilterStage::Residency => FilterStage::PowerTier,
        };
    }

    /// Moves focus to the previous list, wrapping around.
    pub fn focus_prev(&mut self) {
        self.focus = match self.focus {
            FilterStage::PowerTier => FilterStage::Residency,
            FilterStage::Tariff => FilterStage::PowerTier,
            FilterStage::Residency => FilterStage::Tariff,
        };
    }

    /// Selects the next option of the focused list.
    pub fn select_next(&mut self) {
        self.step_selection(1);
    }

    /// Selects the previous option of the focused list.
    pub fn select_prev(&mut self) {
        self.step_selection(-1);
    }

    fn step_selection(&mut self, delta: isize) {
        let options = self.options.for_stage(self.focus);
        if options.is_empty() {
            return;
        }
        let len = options.len() as isize;
        let current = self.selected_index(self.focus).unwrap_or(0) as isize;
        let next = (current + delta).rem_euclid(len) as usize;
        self.selected[stage_index(self.focus)] = Some(options[next].clone());
        self.recompute();
    }

    /// Reloads both files from disk, keeping the selections that remain
    /// valid. On failure the previous data stays on screen with a warning.
    pub fn reload(&mut self) {
        match Session::reload(&mut self.store, &self.paths) {
            Ok(session) => {
                self.rasters = session.geometry.rasterize(RASTER_COLS, RASTER_ROWS);
                self.session = session;
                self.recompute();
            }
            Err(e) => self.warning = Some(format!("reload failed: {e}")),
        }
    }
}

fn stage_index(stage: FilterStage) -> usize {
    match stage {
        FilterStage::PowerTier => 0,
        FilterStage::Tariff => 1,
        FilterStage::Residency => 2,
    }
}

/// Keeps `current` if it is still an option, otherwise takes the first.
fn settle(options: &[String], current: &mut Option<String>) -> Option<String> {
    let value = current
        .take()
        .filter(|v| options.contains(v))
        .or_else(|| options.first().cloned());
    current.clone_from(&value);
    value
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use super::*;

    const CSV: &str = "region;power_tier;tariff;residency;total_energy\n\
                       Lazio;3kW;TD;Residente;100\n\
                       Lazio;3kW;TD;Residente;50\n\
                       Lombardia;3kW;TD;Residente;30\n\
                       Lombardia;3kW;D2;Non residente;5\n\
                       Sicilia;6kW;TD;Residente;7\n";

    const GEO: &str = r#"{"type":"FeatureCollection","features":[
        {"type":"Feature","properties":{"reg_name":"Lazio"},
         "geometry":{"type":"Polygon","coordinates":[[[0,0],[2,0],[2,2],[0,2],[0,0]]]}},
        {"type":"Feature","properties":{"reg_name":"Lombardia"},
         "geometry":{"type":"Polygon","coordinates":[[[2,0],[4,0],[4,2],[2,2],[2,0]]]}}]}"#;

    fn fixture(name: &str) -> (PathBuf, PathBuf) {
        let dir = std::env::temp_dir().join(format!("energy-map-tui-{name}-{}", std::process::id()));
        fs::create_dir_all(&dir).expect("temp dir");
        let csv = dir.join("data.csv");
        let geo = dir.join("regions.geojson");
        fs::write(&csv, CSV).expect("write csv");
        fs::write(&geo, GEO).expect("write geojson");
        (csv, geo)
    }

    fn app(name: &str) -> App {
        let (csv, geo) = fixture(name);
        let mut config = DashboardConfig::default_preset();
        config.geometry.path = geo;
        let store = DataStore::new(config.loader_options());
        App::new(store, InputPaths::new(csv, &config), &config).expect("app loads")
    }

    #[test]
    fn starts_with_first_options() {
        let app = app("first");
        assert_eq!(app.selected_value(FilterStage::PowerTier), Some("3kW"));
        assert_eq!(app.selected_value(FilterStage::Tariff), Some("D2"));
        assert_eq!(app.selected_value(FilterStage::Residency), Some("Non residente"));
        let view = app.view.as_ref().expect("view");
        assert_eq!(view.result.total, 5.0);
        assert!(!app.rasters.is_empty());
    }

    #[test]
    fn changing_tariff_cascades_to_residency() {
        let mut app = app("cascade");
        app.focus_next();
        assert_eq!(app.focus, FilterStage::Tariff);
        app.select_next();
        assert_eq!(app.selected_value(FilterStage::Tariff), Some("TD"));
        assert_eq!(app.selected_value(FilterStage::Residency), Some("Residente"));
        let view = app.view.as_ref().expect("view");
        assert_eq!(view.result.get("Lazio"), Some(150.0));
        assert_eq!(view.result.total, 180.0);
    }

    #[test]
    fn kept_selection_survives_upstream_change() {
        let mut app = app("keep");
        app.focus_next();
        app.select_next(); // tariff TD
        app.focus_prev();
        app.select_next(); // power tier 6kW: only TD exists
        assert_eq!(app.selected_value(FilterStage::PowerTier), Some("6kW"));
        assert_eq!(app.selected_value(FilterStage::Tariff), Some("TD"));
        assert_eq!(app.options.tariffs, vec!["TD"]);
    }

    #[test]
    fn selection_wraps_around() {
        let mut app = app("wrap");
        app.select_prev();
        assert_eq!(app.selected_value(FilterStage::PowerTier), Some("6kW"));
        app.select_next();
        assert_eq!(app.selected_value(FilterStage::PowerTier), Some("3kW"));
    }

    #[test]
    fn reload_picks_up_new_csv() {
        let (csv, geo) = fixture("reload");
        let mut config = DashboardConfig::default_preset();
        config.geometry.path = geo;
        let store = DataStore::new(config.loader_options());
        let mut app = App::new(store, InputPaths::new(&csv, &config), &config).expect("loads");

        fs::write(&csv, "region;power_tier;tariff;residency;total_energy\nLazio;1kW;X;Y;2\n")
            .expect("rewrite csv");
        app.reload();
        assert!(app.warning.is_none());
        assert_eq!(app.options.power_tiers, vec!["1kW"]);
        assert_eq!(app.view.as_ref().map(|v| v.result.total), Some(2.0));
    }

    #[test]
    fn failed_reload_keeps_previous_data() {
        let (csv, geo) = fixture("reload-fail");
        let mut config = DashboardConfig::default_preset();
        config.geometry.path = geo.clone();
        let store = DataStore::new(config.loader_options());
        let mut app = App::new(store, InputPaths::new(&csv, &config), &config).expect("loads");

        fs::remove_file(&geo).expect("remove geojson");
        app.reload();
        assert!(app.warning.as_deref().unwrap_or("").contains("not found"));
        assert!(app.view.is_some());
    }
}
