use geo::{BoundingRect, Contains, Coord, MapCoords, MultiPolygon, Point, Polygon, Rect};
use geojson::GeoJson;
use ratatui::layout::Rect as TuiRect;
use ratatui::style::Color;
use ratatui::widgets::canvas::{Canvas, Context, Line, Points};
use ratatui::widgets::{Block, Borders};
use ratatui::Frame;
use reqwest::blocking::Client;
use serde_json::{Map, Value};
use std::cell::{Cell, Ref, RefCell};
use std::{fs, str::FromStr, time::Duration};
use tracing::{info, warn};

use crate::{charts::MapChart, config::MapConfig, data::HoursBin, error::MapError};

/// Szerokość geograficzna, wokół której spłaszczamy mapę
const CENTER_LAT: f64 = 52.0;
const LON_RANGE: [f64; 2] = [-25.0, 45.0];
const LAT_RANGE: [f64; 2] = [34.0, 72.0];
/// Fragmenty mniejsze niż ten ułamek największego wielokąta są pomijane
const MIN_FRAGMENT: f64 = 0.05;

/// Liczy pole (w przybliżeniu płaskim) wielokąta wzorem shoelace’a.
fn poly_area(poly: &Polygon<f64>) -> f64 {
    let coords = &poly.exterior().0;
    let mut sum = 0.0;
    for window in coords.windows(2) {
        let a = window[0];
        let b = window[1];
        sum += a.x * b.y - b.x * a.y;
    }
    (sum * 0.5).abs()
}

fn project(lon: f64, lat: f64) -> (f64, f64) {
    (lon * CENTER_LAT.to_radians().cos(), lat)
}

fn unproject(x: f64, y: f64) -> (f64, f64) {
    (x / CENTER_LAT.to_radians().cos(), y)
}

/// Tekstowa właściwość obiektu GeoJSON (pusta, gdy jej brak)
fn property(props: Option<&Map<String, Value>>, key: &str) -> String {
    props
        .and_then(|p| p.get(key))
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string()
}

struct Shape {
    iso2: String,
    name: String,
    polygons: MultiPolygon<f64>,
    bbox: Rect<f64>,
}

#[derive(Default)]
struct FillCache {
    size: (u16, u16),
    points: Vec<Vec<(f64, f64)>>,
}

/// Kraje Europy gotowe do rysowania na kanwie
pub struct MapView {
    shapes: Vec<Shape>,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
    fill: RefCell<FillCache>,
    last_area: Cell<Option<TuiRect>>,
}

impl MapView {
    /// Reads the GeoJSON from disk, downloading it first when the file is missing.
    pub fn load(config: &MapConfig, timeout: Duration) -> Result<Self, MapError> {
        let path = &config.geojson_path;
        if path.exists() {
            return Self::new(GeoJson::from_str(&fs::read_to_string(path)?)?);
        }

        info!(url = %config.geojson_url, "Downloading map of Europe");
        let client = Client::builder().timeout(timeout).build()?;
        let txt = client.get(&config.geojson_url).send()?.error_for_status()?.text()?;
        // Zapisujemy tylko poprawny GeoJSON
        let raw = GeoJson::from_str(&txt)?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        if let Err(e) = fs::write(path, &txt) {
            warn!(path = %path.display(), error = %e, "Cannot store downloaded map");
        }
        Self::new(raw)
    }

    pub fn new(raw: GeoJson) -> Result<Self, MapError> {
        let mut shapes = Vec::new();

        if let GeoJson::FeatureCollection(fc) = raw {
            for feature in fc.features {
                let props = feature.properties.as_ref();
                let (iso2, name) = (property(props, "ISO2"), property(props, "NAME"));

                if let Some(gj) = feature.geometry {
                    let geom: geo::Geometry<f64> = gj.value.try_into()?;
                    let mut mp = match geom {
                        geo::Geometry::Polygon(p) => MultiPolygon(vec![p]),
                        geo::Geometry::MultiPolygon(m) => m,
                        _ => continue,
                    };

                    // Filtrujemy drobne fragmenty, jeśli jest ich wiele
                    if mp.0.len() > 1 {
                        let max_area = mp.0.iter().map(poly_area).fold(0.0, f64::max);
                        let filtered: Vec<Polygon<f64>> = mp
                            .0
                            .iter()
                            .filter(|poly| poly_area(poly) >= max_area * MIN_FRAGMENT)
                            .cloned()
                            .collect();
                        if !filtered.is_empty() {
                            mp = MultiPolygon(filtered);
                        }
                    }

                    let polygons = mp.map_coords(|c| {
                        let (x, y) = project(c.x, c.y);
                        Coord { x, y }
                    });
                    let Some(bbox) = polygons.bounding_rect() else { continue };
                    shapes.push(Shape { iso2, name, polygons, bbox });
                }
            }
        }

        let (minx, miny) = project(LON_RANGE[0], LAT_RANGE[0]);
        let (maxx, maxy) = project(LON_RANGE[1], LAT_RANGE[1]);
        info!(shapes = shapes.len(), "Map of Europe ready");

        Ok(Self {
            shapes,
            x_bounds: [minx, maxx],
            y_bounds: [miny, maxy],
            fill: RefCell::default(),
            last_area: Cell::new(None),
        })
    }

    /// Liczba obiektów (np. krajów)
    pub fn feature_count(&self) -> usize {
        self.shapes.len()
    }

    pub fn name_of(&self, iso2: &str) -> Option<&str> {
        self.shapes.iter().find(|s| s.iso2 == iso2).map(|s| s.name.as_str())
    }

    /// ISO2 of the shape under a geographic point.
    pub fn country_at(&self, lon: f64, lat: f64) -> Option<&str> {
        let (x, y) = project(lon, lat);
        self.shape_at(x, y).map(|s| s.iso2.as_str())
    }

    /// ISO2 of the shape under a terminal cell of the last rendered frame.
    pub fn country_at_cell(&self, column: u16, row: u16) -> Option<&str> {
        let inner = self.last_area.get()?;
        if column < inner.x || row < inner.y || column >= inner.right() || row >= inner.bottom() {
            return None;
        }
        let fx = (f64::from(column - inner.x) + 0.5) / f64::from(inner.width);
        let fy = (f64::from(row - inner.y) + 0.5) / f64::from(inner.height);
        let x = self.x_bounds[0] + fx * (self.x_bounds[1] - self.x_bounds[0]);
        let y = self.y_bounds[1] - fy * (self.y_bounds[1] - self.y_bounds[0]);
        let (lon, lat) = unproject(x, y);
        self.country_at(lon, lat)
    }

    fn shape_at(&self, x: f64, y: f64) -> Option<&Shape> {
        let point = Point::new(x, y);
        self.shapes
            .iter()
            .find(|s| in_bbox(&s.bbox, x, y) && s.polygons.contains(&point))
    }

    /// Braille dots inside each shape, recomputed only when the area changes.
    fn fill_points(&self, cols: u16, rows: u16) -> Ref<'_, Vec<Vec<(f64, f64)>>> {
        if self.fill.borrow().size != (cols, rows) {
            let mut points = vec![Vec::new(); self.shapes.len()];
            let (nx, ny) = (usize::from(cols) * 2, usize::from(rows) * 4);
            let dx = (self.x_bounds[1] - self.x_bounds[0]) / nx as f64;
            let dy = (self.y_bounds[1] - self.y_bounds[0]) / ny as f64;
            for i in 0..nx {
                for j in 0..ny {
                    let x = self.x_bounds[0] + (i as f64 + 0.5) * dx;
                    let y = self.y_bounds[0] + (j as f64 + 0.5) * dy;
                    let point = Point::new(x, y);
                    if let Some(idx) = self
                        .shapes
                        .iter()
                        .position(|s| in_bbox(&s.bbox, x, y) && s.polygons.contains(&point))
                    {
                        points[idx].push((x, y));
                    }
                }
            }
            *self.fill.borrow_mut() = FillCache { size: (cols, rows), points };
        }
        Ref::map(self.fill.borrow(), |cache| &cache.points)
    }

    /// Rysuje mapę: wypełnienie wg przedziału, granice, a na końcu wybrany kraj
    pub fn render(
        &self,
        f: &mut Frame,
        area: TuiRect,
        title: &str,
        chart: Option<&MapChart>,
        active: Option<&str>,
    ) {
        let block = Block::default().title(title.to_string()).borders(Borders::ALL);
        let inner = block.inner(area);
        self.last_area.set(Some(inner));
        let fill = self.fill_points(inner.width, inner.height);

        let canvas = Canvas::default()
            .block(block)
            .x_bounds(self.x_bounds)
            .y_bounds(self.y_bounds)
            .paint(|ctx| {
                // 1) Wypełnienie kolorem przedziału
                for (shape, coords) in self.shapes.iter().zip(fill.iter()) {
                    let bin = chart.map(|c| c.bin_for_code(&shape.iso2)).unwrap_or(HoursBin::NoData);
                    let (r, g, b) = bin.rgb();
                    ctx.draw(&Points { coords: coords.as_slice(), color: Color::Rgb(r, g, b) });
                }
                ctx.layer();

                // 2) Granice wszystkich krajów
                for shape in &self.shapes {
                    draw_outline(ctx, &shape.polygons, Color::DarkGray);
                }

                // 3) Podświetlamy aktywny kraj
                if let Some(sel) = active {
                    for shape in self.shapes.iter().filter(|s| s.iso2 == sel) {
                        draw_outline(ctx, &shape.polygons, Color::White);
                    }
                }
            });
        f.render_widget(canvas, area);
    }
}

fn in_bbox(bbox: &Rect<f64>, x: f64, y: f64) -> bool {
    let (min, max) = (bbox.min(), bbox.max());
    x >= min.x && x <= max.x && y >= min.y && y <= max.y
}

fn draw_outline(ctx: &mut Context<'_>, mp: &MultiPolygon<f64>, color: Color) {
    for poly in &mp.0 {
        for window in poly.exterior().0.windows(2) {
            let a = window[0];
            let b = window[1];
            ctx.draw(&Line { x1: a.x, y1: a.y, x2: b.x, y2: b.y, color });
        }
        if let (Some(first), Some(last)) = (poly.exterior().0.first(), poly.exterior().0.last()) {
            ctx.draw(&Line { x1: last.x, y1: last.y, x2: first.x, y2: first.y, color });
        }
    }
}
