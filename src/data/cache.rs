//! Explicit memoisation of loaded inputs, keyed by input identity.

use std::collections::HashMap;
use std::fs;
use std::hash::Hash;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use super::geometry::{GeometryCollection, load_geometry};
use super::loader::{LoaderOptions, load_table};
use super::record::Table;
use crate::error::DashboardError;

/// Key → immutable result map with manual invalidation.
///
/// Values are shared as `Arc` so callers can keep using a result after it
/// has been evicted.
#[derive(Debug)]
pub struct LoadCache<K, V> {
    entries: HashMap<K, Arc<V>>,
}

impl<K, V> Default for LoadCache<K, V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash, V> LoadCache<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached value for `key`, or runs `load` and caches its
    /// result. Failed loads are not cached.
    ///
    /// # Errors
    ///
    /// Propagates the error returned by `load`.
    pub fn get_or_try_insert_with<E>(
        &mut self,
        key: K,
        load: impl FnOnce() -> Result<V, E>,
    ) -> Result<Arc<V>, E> {
        if let Some(value) = self.entries.get(&key) {
            return Ok(Arc::clone(value));
        }
        let value = Arc::new(load()?);
        self.entries.insert(key, Arc::clone(&value));
        Ok(value)
    }

    /// Drops one entry. Returns `true` if it was present.
    pub fn invalidate(&mut self, key: &K) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Content hash identifying one table upload.
pub type TableKey = blake3::Hash;

/// Memoised loaders for the consumption table and the region geometry.
///
/// Tables are keyed by a hash of their bytes, so a changed file is a new
/// key; the entry a path pointed at before is dropped once no other path
/// uses it. Geometry is keyed by path and property name and must be
/// invalidated when the file changes on disk.
#[derive(Debug)]
pub struct DataStore {
    options: LoaderOptions,
    tables: LoadCache<TableKey, Table>,
    /// Key each table path last loaded to.
    table_keys: HashMap<PathBuf, TableKey>,
    geometries: LoadCache<(PathBuf, String), GeometryCollection>,
}

impl DataStore {
    /// Creates an empty store that parses tables with `options`.
    pub fn new(options: LoaderOptions) -> Self {
        Self {
            options,
            tables: LoadCache::new(),
            table_keys: HashMap::new(),
            geometries: LoadCache::new(),
        }
    }

    /// Parses `bytes` as a table, reusing the cached result for identical
    /// content.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`load_table`].
    pub fn table_from_bytes(&mut self, bytes: &[u8]) -> Result<Arc<Table>, DashboardError> {
        let key = blake3::hash(bytes);
        debug!(key = %key.to_hex(), "table lookup");
        let options = &self.options;
        self.tables
            .get_or_try_insert_with(key, || load_table(bytes, options))
    }

    /// Reads `path` and delegates to [`table_from_bytes`](Self::table_from_bytes).
    ///
    /// When the content of `path` changed since its last load, the previous
    /// table is evicted unless another path still refers to it.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::Io`] if the file cannot be read.
    pub fn table_from_path(&mut self, path: &Path) -> Result<Arc<Table>, DashboardError> {
        let bytes = fs::read(path).map_err(|source| DashboardError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table = self.table_from_bytes(&bytes)?;
        let key = blake3::hash(&bytes);
        if let Some(previous) = self.table_keys.insert(path.to_path_buf(), key) {
            let shared = self.table_keys.values().any(|k| *k == previous);
            if previous != key && !shared {
                debug!(path = %path.display(), key = %previous.to_hex(), "evicting stale table");
                self.tables.invalidate(&previous);
            }
        }
        Ok(table)
    }

    /// Loads the geometry at `path`, reusing a previous result for the same
    /// path and property key.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`load_geometry`].
    pub fn geometry(
        &mut self,
        path: &Path,
        feature_id_key: &str,
    ) -> Result<Arc<GeometryCollection>, DashboardError> {
        let key = (path.to_path_buf(), feature_id_key.to_string());
        debug!(path = %path.display(), "geometry lookup");
        self.geometries
            .get_or_try_insert_with(key, || load_geometry(path, feature_id_key))
    }

    /// Forgets the cached geometry for `path`.
    pub fn invalidate_geometry(&mut self, path: &Path, feature_id_key: &str) -> bool {
        self.geometries
            .invalidate(&(path.to_path_buf(), feature_id_key.to_string()))
    }

    /// Number of cached `(tables, geometries)`.
    pub fn cached(&self) -> (usize, usize) {
        (self.tables.len(), self.geometries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &[u8] = b"region;power_tier;tariff;residency;total_energy\nLazio;3kW;TD;R;1\n";

    #[test]
    fn cache_loads_once_per_key() {
        let mut cache: LoadCache<&str, u32> = LoadCache::new();
        let mut calls = 0;
        for _ in 0..3 {
            let v = cache.get_or_try_insert_with("a", || {
                calls += 1;
                Ok::<_, ()>(7)
            });
            assert_eq!(v.map(|v| *v), Ok(7));
        }
        assert_eq!(calls, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn failed_loads_are_not_cached() {
        let mut cache: LoadCache<&str, u32> = LoadCache::new();
        assert!(cache.get_or_try_insert_with("a", || Err("boom")).is_err());
        assert!(cache.is_empty());
        assert_eq!(cache.get_or_try_insert_with("a", || Ok::<_, &str>(1)).ok().map(|v| *v), Some(1));
    }

    #[test]
    fn invalidate_forces_reload() {
        let mut cache: LoadCache<&str, u32> = LoadCache::new();
        let _ = cache.get_or_try_insert_with("a", || Ok::<_, ()>(1));
        assert!(cache.invalidate(&"a"));
        assert!(!cache.invalidate(&"a"));
        let v = cache.get_or_try_insert_with("a", || Ok::<_, ()>(2));
        assert_eq!(v.map(|v| *v), Ok(2));
    }

    #[test]
    fn identical_bytes_share_one_table() {
        let mut store = DataStore::new(LoaderOptions::default());
        let a = store.table_from_bytes(CSV).expect("loads");
        let b = store.table_from_bytes(CSV).expect("loads");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(store.cached(), (1, 0));
    }

    #[test]
    fn clear_drops_every_entry() {
        let mut cache: LoadCache<u8, u8> = LoadCache::new();
        let _ = cache.get_or_try_insert_with(1, || Ok::<_, ()>(1));
        let _ = cache.get_or_try_insert_with(2, || Ok::<_, ()>(2));
        cache.clear();
        assert!(cache.is_empty());
    }

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("energy-map-cache-{name}-{}", std::process::id()));
        fs::create_dir_all(&dir).expect("temp dir");
        dir
    }

    #[test]
    fn rewritten_file_replaces_its_table() {
        let dir = scratch("rewrite");
        let path = dir.join("data.csv");
        let mut store = DataStore::new(LoaderOptions::default());
        for i in 0..10 {
            let csv = format!("region;power_tier;tariff;residency;total_energy\nLazio;3kW;TD;R;{i}\n");
            fs::write(&path, csv).expect("write csv");
            let table = store.table_from_path(&path).expect("loads");
            assert_eq!(table.records()[0].total_energy, f64::from(i));
            assert_eq!(store.cached(), (1, 0));
        }
    }

    #[test]
    fn table_shared_by_two_paths_survives_one_rewrite() {
        let dir = scratch("shared");
        let (a, b) = (dir.join("a.csv"), dir.join("b.csv"));
        fs::write(&a, CSV).expect("write a");
        fs::write(&b, CSV).expect("write b");
        let mut store = DataStore::new(LoaderOptions::default());
        let first = store.table_from_path(&a).expect("loads a");
        store.table_from_path(&b).expect("loads b");

        fs::write(&a, "region;power_tier;tariff;residency;total_energy\nLazio;3kW;TD;R;9\n")
            .expect("rewrite a");
        store.table_from_path(&a).expect("reloads a");
        assert_eq!(store.cached(), (2, 0));
        let again = store.table_from_path(&b).expect("loads b");
        assert!(Arc::ptr_eq(&first, &again));
    }

    #[test]
    fn missing_geometry_is_not_cached() {
        let mut store = DataStore::new(LoaderOptions::default());
        let err = store.geometry(Path::new("missing.geojson"), "reg_name");
        assert!(matches!(err, Err(DashboardError::GeometryNotFound(_))));
        assert_eq!(store.cached(), (0, 0));
    }
}
