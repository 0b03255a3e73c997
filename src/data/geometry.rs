//! Region boundaries loaded from a GeoJSON FeatureCollection.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

use geo::{BoundingRect, Contains, Coord, MultiPolygon, Point, Polygon, Rect};
use geojson::{Feature, GeoJson, Value};
use tracing::{info, warn};

use super::loader::title_case;
use crate::error::DashboardError;

/// Polygons of one region plus its label as written in the file.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionShape {
    /// Property value as written in the file.
    pub label: String,
    /// Every polygon carrying this label, holes included.
    pub shape: MultiPolygon<f64>,
    /// Bounding box of `shape`.
    pub bounds: Rect<f64>,
}

impl RegionShape {
    /// Returns `true` if `(x, y)` lies strictly inside one of the polygons
    /// and outside its holes.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let min = self.bounds.min();
        let max = self.bounds.max();
        if x < min.x || x > max.x || y < min.y || y > max.y {
            return false;
        }
        self.shape.contains(&Point::new(x, y))
    }
}

/// Sample points of one region on a regular grid.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionRaster {
    /// Normalised region key.
    pub key: String,
    /// Grid cell centres that fall inside the region.
    pub points: Vec<(f64, f64)>,
}

/// Region geometries keyed by title-cased region name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometryCollection {
    regions: BTreeMap<String, RegionShape>,
    bounds: Option<Rect<f64>>,
}

impl GeometryCollection {
    /// Parses GeoJSON text, reading region names from `feature_id_key`.
    ///
    /// # Errors
    ///
    /// Returns a message if the text is not a GeoJSON FeatureCollection.
    pub fn from_geojson_str(content: &str, feature_id_key: &str) -> Result<Self, String> {
        let geojson: GeoJson = content.parse().map_err(|e: geojson::Error| e.to_string())?;
        Self::from_geojson(geojson, feature_id_key)
    }

    /// Collects the areal features of a parsed document.
    ///
    /// Features without the property or with a non-areal geometry are
    /// skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns a message if the document is not a FeatureCollection.
    pub fn from_geojson(geojson: GeoJson, feature_id_key: &str) -> Result<Self, String> {
        let GeoJson::FeatureCollection(collection) = geojson else {
            return Err("expected a FeatureCollection".to_string());
        };

        let mut out = Self::default();
        for (i, feature) in collection.features.into_iter().enumerate() {
            let Some(label) = feature_label(&feature, feature_id_key) else {
                warn!(feature = i, key = feature_id_key, "feature without region name skipped");
                continue;
            };
            let Some(geometry) = feature.geometry else {
                warn!(feature = i, region = %label, "feature without geometry skipped");
                continue;
            };
            let converted = match geometry.value {
                value @ Value::Polygon(_) => Polygon::<f64>::try_from(value).map(|p| vec![p]),
                value @ Value::MultiPolygon(_) => MultiPolygon::<f64>::try_from(value).map(|m| m.0),
                _ => {
                    warn!(feature = i, region = %label, "non-polygon geometry skipped");
                    continue;
                }
            };
            match converted {
                Ok(polygons) => out.insert(label, polygons),
                Err(e) => warn!(feature = i, region = %label, error = %e, "invalid polygon skipped"),
            }
        }
        Ok(out)
    }

    fn insert(&mut self, label: String, polygons: Vec<Polygon<f64>>) {
        let key = title_case(label.trim());
        let (label, mut shape) = match self.regions.remove(&key) {
            Some(existing) => (existing.label, existing.shape),
            None => (label, MultiPolygon::new(Vec::new())),
        };
        shape.0.extend(polygons);
        let Some(bounds) = shape.bounding_rect() else {
            return;
        };
        self.bounds = Some(match self.bounds {
            Some(all) => union(all, bounds),
            None => bounds,
        });
        self.regions.insert(key, RegionShape { label, shape, bounds });
    }

    /// Looks up a region by its normalised name.
    pub fn get(&self, key: &str) -> Option<&RegionShape> {
        self.regions.get(key)
    }

    /// Iterates `(key, shape)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RegionShape)> {
        self.regions.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns `true` if a region with this normalised name exists.
    pub fn contains_key(&self, key: &str) -> bool {
        self.regions.contains_key(key)
    }

    /// Number of distinct regions.
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Returns `true` if no region was loaded.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Bounding box of all regions, `None` when empty.
    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.bounds
    }

    /// Samples every region on a `cols` x `rows` grid spanning the overall
    /// bounds and returns the cell centres inside each region.
    pub fn rasterize(&self, cols: usize, rows: usize) -> Vec<RegionRaster> {
        let Some(bounds) = self.bounds else {
            return Vec::new();
        };
        if cols == 0 || rows == 0 {
            return Vec::new();
        }
        let origin = bounds.min();
        let dx = bounds.width() / cols as f64;
        let dy = bounds.height() / rows as f64;

        self.regions
            .iter()
            .map(|(key, shape)| {
                let (low, high) = (shape.bounds.min().y, shape.bounds.max().y);
                let mut points = Vec::new();
                for row in 0..rows {
                    let y = origin.y + (row as f64 + 0.5) * dy;
                    if y < low || y > high {
                        continue;
                    }
                    for col in 0..cols {
                        let x = origin.x + (col as f64 + 0.5) * dx;
                        if shape.contains(x, y) {
                            points.push((x, y));
                        }
                    }
                }
                RegionRaster {
                    key: key.clone(),
                    points,
                }
            })
            .collect()
    }
}

fn union(a: Rect<f64>, b: Rect<f64>) -> Rect<f64> {
    Rect::new(
        Coord {
            x: a.min().x.min(b.min().x),
            y: a.min().y.min(b.min().y),
        },
        Coord {
            x: a.max().x.max(b.max().x),
            y: a.max().y.max(b.max().y),
        },
    )
}

fn feature_label(feature: &Feature, key: &str) -> Option<String> {
    let label = match feature.property(key)? {
        serde_json::Value::String(s) => s.trim().to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!label.is_empty()).then_some(label)
}

/// Reads and parses a GeoJSON file.
///
/// # Errors
///
/// Returns [`DashboardError::GeometryNotFound`] if the path does not exist,
/// [`DashboardError::Io`] if it cannot be opened, and
/// [`DashboardError::GeometryParse`] for content that is not valid GeoJSON,
/// including bytes that are not UTF-8.
pub fn load_geometry(path: &Path, feature_id_key: &str) -> Result<GeometryCollection, DashboardError> {
    let file = File::open(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => DashboardError::GeometryNotFound(path.to_path_buf()),
        _ => DashboardError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;
    let parse_error = |message: String| DashboardError::GeometryParse {
        path: path.to_path_buf(),
        message,
    };
    let geojson = GeoJson::from_reader(BufReader::new(file)).map_err(|e| parse_error(e.to_string()))?;
    let geometry = GeometryCollection::from_geojson(geojson, feature_id_key).map_err(parse_error)?;
    info!(
        path = %path.display(),
        regions = geometry.len(),
        "loaded region geometry"
    );
    Ok(geometry)
}
