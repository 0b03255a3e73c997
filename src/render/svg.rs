//! SVG choropleth drawn with plotters: regions filled by their summed
//! energy and labelled with their value, plus a stepped colour bar.

use std::fs;
use std::iter;
use std::ops::Range;
use std::path::Path;

use geo::{InteriorPoint, LineString, Rect};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use super::format::format_thousands;
use super::scale::{ColorScale, Rgb};
use crate::analysis::aggregate::AggregatedResult;
use crate::data::geometry::GeometryCollection;
use crate::error::DashboardError;

/// Horizontal space reserved for the colour bar.
const LEGEND_WIDTH: u32 = 140;
/// Padding around the map and the legend.
const PADDING: u32 = 16;
/// Number of swatches in the colour bar.
const LEGEND_STEPS: i32 = 9;
/// Used when `no_data_color` is not `#rrggbb`.
const FALLBACK_NO_DATA: Rgb = Rgb(229, 229, 229);

/// Rendering parameters for [`Choropleth`].
#[derive(Debug, Clone, PartialEq)]
pub struct MapStyle {
    pub width: u32,
    pub height: u32,
    pub scale: ColorScale,
    pub legend_title: String,
    /// Fill for regions without aggregated data.
    pub no_data_color: String,
}

impl Default for MapStyle {
    fn default() -> Self {
        Self {
            width: 800,
            height: 900,
            scale: ColorScale::Reds,
            legend_title: "Energia (kWh)".to_string(),
            no_data_color: "#e5e5e5".to_string(),
        }
    }
}

type Area<'b> = DrawingArea<SVGBackend<'b>, Shift>;

/// A renderable choropleth joining an aggregate to region geometry.
pub struct Choropleth<'a> {
    geometry: &'a GeometryCollection,
    result: &'a AggregatedResult,
    style: &'a MapStyle,
}

impl<'a> Choropleth<'a> {
    pub fn new(
        geometry: &'a GeometryCollection,
        result: &'a AggregatedResult,
        style: &'a MapStyle,
    ) -> Self {
        Self {
            geometry,
            result,
            style,
        }
    }

    /// Draws the map and its legend into an SVG document.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::Render`] if the backend rejects a drawing
    /// operation.
    pub fn render(&self) -> Result<String, DashboardError> {
        let mut svg = String::new();
        {
            let root =
                SVGBackend::with_string(&mut svg, (self.style.width, self.style.height)).into_drawing_area();
            root.fill(&WHITE).map_err(render_error)?;
            let (map, legend) = root.split_horizontally(self.style.width.saturating_sub(LEGEND_WIDTH));
            self.draw_regions(&map)?;
            self.draw_legend(&legend)?;
            root.present().map_err(render_error)?;
        }
        Ok(svg)
    }

    fn draw_regions(&self, area: &Area<'_>) -> Result<(), DashboardError> {
        let Some(bounds) = self.geometry.bounds() else {
            let at = (PADDING as i32, 2 * PADDING as i32);
            let font = ("sans-serif", 14).into_font();
            area.draw(&Text::new("no region geometry loaded", at, font))
                .map_err(render_error)?;
            return Ok(());
        };
        let (w, h) = area.dim_in_pixel();
        let inner = |side: u32| side.saturating_sub(2 * PADDING).max(1);
        let (lon, lat) = fit_ranges(bounds, inner(w), inner(h));
        let mut chart = ChartBuilder::on(area)
            .margin(PADDING)
            .build_cartesian_2d(lon, lat)
            .map_err(render_error)?;

        let max = self.result.max_value().unwrap_or(0.0);
        let no_data = Rgb::from_hex(&self.style.no_data_color).unwrap_or(FALLBACK_NO_DATA);

        // Larger regions first so enclaves stay visible.
        let mut shapes: Vec<_> = self.geometry.iter().collect();
        shapes.sort_by(|(_, a), (_, b)| rect_area(b.bounds).total_cmp(&rect_area(a.bounds)));

        for (key, shape) in &shapes {
            let fill = match self.result.get(key) {
                Some(v) => self.style.scale.color_for(v, max),
                None => no_data,
            };
            for polygon in &shape.shape.0 {
                let exterior = ring_points(polygon.exterior());
                chart
                    .draw_series(iter::once(Polygon::new(exterior.clone(), color(fill).filled())))
                    .map_err(render_error)?;
                for hole in polygon.interiors() {
                    chart
                        .draw_series(iter::once(Polygon::new(ring_points(hole), WHITE.filled())))
                        .map_err(render_error)?;
                }
                chart
                    .draw_series(iter::once(PathElement::new(exterior, WHITE.stroke_width(1))))
                    .map_err(render_error)?;
            }
        }

        let label_style = TextStyle::from(("sans-serif", 11).into_font())
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Center));
        for (key, shape) in &shapes {
            let value = self.result.get(key).unwrap_or(0.0);
            let anchor = shape
                .shape
                .interior_point()
                .map_or_else(|| shape.bounds.center().x_y(), |p| p.x_y());
            let text = format!("{}: {} kWh", shape.label, format_thousands(value));
            chart
                .draw_series(iter::once(Text::new(text, anchor, label_style.clone())))
                .map_err(render_error)?;
        }
        Ok(())
    }

    fn draw_legend(&self, area: &Area<'_>) -> Result<(), DashboardError> {
        let max = self.result.max_value().unwrap_or(0.0).max(0.0);
        let (_, h) = area.dim_in_pixel();
        let x = PADDING as i32;
        let top = PADDING as i32 + 40;
        let step = ((f64::from(h) * 0.4).max(60.0) as i32 / LEGEND_STEPS).max(1);
        let bar_h = step * LEGEND_STEPS;
        let bar_w = 18;
        let font = ("sans-serif", 12).into_font();

        area.draw(&Text::new(
            self.style.legend_title.clone(),
            (x, top - 24),
            font.clone().style(FontStyle::Bold),
        ))
        .map_err(render_error)?;
        for i in 0..LEGEND_STEPS {
            let t = 1.0 - f64::from(i) / f64::from(LEGEND_STEPS - 1);
            let y = top + i * step;
            let swatch = color(self.style.scale.color_at(t)).filled();
            area.draw(&Rectangle::new([(x, y), (x + bar_w, y + step)], swatch))
                .map_err(render_error)?;
        }
        area.draw(&Rectangle::new(
            [(x, top), (x + bar_w, top + bar_h)],
            RGBColor(153, 153, 153).stroke_width(1),
        ))
        .map_err(render_error)?;

        let label_style = TextStyle::from(font).pos(Pos::new(HPos::Left, VPos::Center));
        for (frac, value) in [(0.0, max), (0.5, max / 2.0), (1.0, 0.0)] {
            let y = top + (frac * f64::from(bar_h)) as i32;
            area.draw(&Text::new(
                format_thousands(value),
                (x + bar_w + 6, y),
                label_style.clone(),
            ))
            .map_err(render_error)?;
        }
        Ok(())
    }
}

/// Writes the choropleth SVG to `path`.
///
/// # Errors
///
/// Returns [`DashboardError::Render`] if drawing fails and
/// [`DashboardError::Io`] if the file cannot be written.
pub fn write_svg(choropleth: &Choropleth<'_>, path: &Path) -> Result<(), DashboardError> {
    let svg = choropleth.render()?;
    fs::write(path, svg).map_err(|source| DashboardError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Lon/lat ranges centred on `bounds` whose shape matches a `width` x
/// `height` pixel box once longitude is scaled by the cosine of the middle
/// latitude.
fn fit_ranges(bounds: Rect<f64>, width: u32, height: u32) -> (Range<f64>, Range<f64>) {
    let center = bounds.center();
    let x_stretch = center.y.to_radians().cos().abs().max(0.1);
    let span_x = (bounds.width() * x_stretch).max(f64::EPSILON);
    let span_y = bounds.height().max(f64::EPSILON);
    let (w, h) = (f64::from(width), f64::from(height));
    let scale = (w / span_x).min(h / span_y);
    let half_lon = w / scale / x_stretch / 2.0;
    let half_lat = h / scale / 2.0;
    (
        center.x - half_lon..center.x + half_lon,
        center.y - half_lat..center.y + half_lat,
    )
}

fn ring_points(ring: &LineString<f64>) -> Vec<(f64, f64)> {
    ring.coords().map(|c| (c.x, c.y)).collect()
}

fn rect_area(rect: Rect<f64>) -> f64 {
    rect.width() * rect.height()
}

fn color(rgb: Rgb) -> RGBColor {
    RGBColor(rgb.0, rgb.1, rgb.2)
}

fn render_error(e: impl std::fmt::Display) -> DashboardError {
    DashboardError::Render(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::aggregate::aggregate;
    use crate::analysis::filter::FilterSelection;
    use crate::data::record::{Record, Table};

    const GEO: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            { "type": "Feature", "properties": { "reg_name": "Lazio" },
              "geometry": { "type": "Polygon", "coordinates": [[[12,41],[14,41],[14,43],[12,43],[12,41]]] } },
            { "type": "Feature", "properties": { "reg_name": "Lombardia" },
              "geometry": { "type": "Polygon", "coordinates": [[[9,45],[11,45],[11,46],[9,46],[9,45]]] } },
            { "type": "Feature", "properties": { "reg_name": "Molise" },
              "geometry": { "type": "Polygon", "coordinates": [[[14,41],[15,41],[15,42],[14,42],[14,41]]] } }
        ]
    }"#;

    fn render() -> String {
        let geometry =
            GeometryCollection::from_geojson_str(GEO, "reg_name").expect("fixture parses");
        let table = Table::from_records([
            Record::new("Lazio", "3kW", "TD", "Residente", 150.0),
            Record::new("Lombardia", "3kW", "TD", "Residente", 30.0),
        ]);
        let result = aggregate(&table, &FilterSelection::new("3kW", "TD", "Residente"));
        let style = MapStyle::default();
        Choropleth::new(&geometry, &result, &style)
            .render()
            .expect("renders")
            .to_ascii_lowercase()
    }

    #[test]
    fn one_polygon_per_region() {
        let svg = render();
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert_eq!(svg.matches("<polygon").count(), 3);
    }

    #[test]
    fn max_region_gets_darkest_color() {
        let svg = render();
        let darkest = ColorScale::Reds.color_at(1.0).to_hex();
        assert!(svg.contains(&format!(r#"fill="{darkest}""#)));
        assert!(svg.contains("lazio: 150.00 kwh"));
    }

    #[test]
    fn regions_without_data_use_no_data_fill() {
        let svg = render();
        assert!(svg.contains(r##"fill="#e5e5e5""##));
        assert!(svg.contains("molise: 0.00 kwh"));
    }

    #[test]
    fn legend_is_labelled() {
        let svg = render();
        assert!(svg.contains("energia (kwh)"));
        assert!(svg.contains("75.00"));
        assert!(svg.contains("150.00"));
    }

    #[test]
    fn polygon_points_stay_inside_canvas() {
        let svg = render();
        let lists = svg.split(" points=\"").skip(1).map(|s| s.split('"').next().unwrap_or(""));
        for list in lists {
            for pair in list.split_whitespace() {
                let (x, y) = pair.split_once(',').expect("x,y pair");
                let x: f64 = x.parse().expect("x");
                let y: f64 = y.parse().expect("y");
                assert!((0.0..=800.0).contains(&x), "x out of range: {x}");
                assert!((0.0..=900.0).contains(&y), "y out of range: {y}");
            }
        }
    }

    #[test]
    fn fitted_ranges_cover_bounds_at_pixel_aspect() {
        let bounds = Rect::new((6.0, 36.0), (19.0, 47.0));
        let (lon, lat) = fit_ranges(bounds, 600, 800);
        assert!(lon.start <= 6.0 && lon.end >= 19.0);
        assert!(lat.start <= 36.0 && lat.end >= 47.0);
        let stretch = 41.5_f64.to_radians().cos();
        let aspect = (lon.end - lon.start) * stretch / (lat.end - lat.start);
        assert!((aspect - 600.0 / 800.0).abs() < 1e-9);
    }

    #[test]
    fn empty_geometry_still_renders_legend() {
        let geometry = GeometryCollection::default();
        let result = aggregate(&Table::default(), &FilterSelection::new("a", "b", "c"));
        let style = MapStyle::default();
        let svg = Choropleth::new(&geometry, &result, &style).render().expect("renders");
        assert!(svg.contains("no region geometry loaded"));
        assert!(svg.contains("Energia (kWh)"));
    }

    #[test]
    fn write_svg_reports_unwritable_path() {
        let geometry = GeometryCollection::default();
        let result = aggregate(&Table::default(), &FilterSelection::new("a", "b", "c"));
        let style = MapStyle::default();
        let chart = Choropleth::new(&geometry, &result, &style);
        let err = write_svg(&chart, Path::new("no/such/dir/map.svg"));
        assert!(matches!(err, Err(DashboardError::Io { .. })));
    }
}
