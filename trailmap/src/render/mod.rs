//! Static SVG figure of the fetched layers.

use std::collections::BTreeMap;
use std::path::Path;

use geo::BoundingRect;
use geo_types::{Coord, Geometry, LineString, MultiPolygon, Polygon, Rect};
use log::{debug, info, warn};
use svg::node::element;
use svg::Document;
use trailmap_types::geo::impls::projection::GeodesyProjection;
use trailmap_types::Reproject;

use crate::color::Color;
use crate::error::{Result, TrailmapError};
use crate::layer::FeatureLayer;
use crate::mileage::Mileage;

mod style;

pub use style::{LayerStyle, StyleTable, MASK_LAYER};

const TITLE_HEIGHT: f64 = 40.0;
const MARGIN: f64 = 20.0;

/// Title of the figure for the computed mileage.
pub fn figure_title(mileage: &Mileage) -> String {
    format!(
        "{:.3} Miles of Trail Within Area of Interest Based on {} Projection",
        mileage.miles(),
        mileage.crs().code().to_uppercase()
    )
}

/// Rendered figure.
#[derive(Debug, Clone)]
pub struct Figure {
    document: Document,
    title: String,
    drawn_layers: Vec<String>,
    skipped_layers: Vec<String>,
}

impl Figure {
    /// Figure title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Layers that were drawn, in drawing order.
    pub fn drawn_layers(&self) -> &[String] {
        &self.drawn_layers
    }

    /// Layers without a style, which were not drawn.
    pub fn skipped_layers(&self) -> &[String] {
        &self.skipped_layers
    }

    /// The SVG document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Writes the SVG document to the file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        svg::save(path, &self.document)?;
        Ok(())
    }
}

/// Draws feature layers into an SVG document in a projected coordinate system.
#[derive(Debug, Clone)]
pub struct SvgRenderer {
    width: u32,
    height: u32,
    styles: StyleTable,
}

impl SvgRenderer {
    /// Creates a renderer producing images of the given size in pixels.
    pub fn new(width: u32, height: u32, styles: StyleTable) -> Self {
        Self {
            width,
            height,
            styles,
        }
    }

    /// Style table of the renderer.
    pub fn styles(&self) -> &StyleTable {
        &self.styles
    }

    /// Renders the figure.
    ///
    /// The map is drawn in the coordinate system the mileage was measured in and is fitted to
    /// the `mask` (the area of interest, in geographic coordinates), which is also drawn as the
    /// bottom layer. Layers that have no style are skipped with a warning.
    pub fn render(
        &self,
        layers: &BTreeMap<String, FeatureLayer>,
        mask: &MultiPolygon,
        mileage: &Mileage,
    ) -> Result<Figure> {
        let projection: GeodesyProjection<Coord, Coord> = mileage.crs().get_projection()?;
        let projected_mask = mask.reproject(&projection)?;
        let extent = projected_mask.bounding_rect().ok_or_else(|| {
            TrailmapError::Configuration("area of interest has no extent to draw".to_string())
        })?;
        let viewport = Viewport::fit(
            extent,
            self.width as f64,
            self.height as f64 - TITLE_HEIGHT,
            TITLE_HEIGHT,
        );

        let mut skipped_layers = vec![];
        for name in layers.keys() {
            if self.styles.get(name).is_none() {
                warn!("Layer {name} has no style and will not be drawn");
                skipped_layers.push(name.clone());
            }
        }

        let mut drawn_layers = vec![];
        let mut map = element::Group::new().set("id", "map");
        for (name, style) in self.styles.iter() {
            let mut geometries: Vec<Geometry> = vec![];
            if name == MASK_LAYER {
                geometries.push(projected_mask.clone().into());
            }
            if let Some(layer) = layers.get(name) {
                for geometry in layer.geometries() {
                    geometries.push(geometry.reproject(&projection)?);
                }
            }

            if geometries.is_empty() {
                debug!("Nothing to draw for layer {name}");
                continue;
            }

            let mut group = element::Group::new().set("id", name);
            for geometry in &geometries {
                for node in draw_geometry(geometry, style, &viewport) {
                    group = group.add(node);
                }
            }

            map = map.add(group);
            drawn_layers.push(name.to_string());
        }

        let title = figure_title(mileage);
        let document = Document::new()
            .set("viewBox", (0, 0, self.width, self.height))
            .set("width", self.width)
            .set("height", self.height)
            .add(
                element::Rectangle::new()
                    .set("width", "100%")
                    .set("height", "100%")
                    .set("fill", Color::WHITE.to_svg()),
            )
            .add(map)
            .add(
                element::Text::new(title.clone())
                    .set("x", self.width as f64 / 2.0)
                    .set("y", TITLE_HEIGHT * 0.65)
                    .set("text-anchor", "middle")
                    .set("font-family", "sans-serif")
                    .set("font-size", 16)
                    .set("fill", Color::BLACK.to_svg()),
            );

        info!(
            "Rendered {} layers ({} skipped) in {}",
            drawn_layers.len(),
            skipped_layers.len(),
            mileage.crs()
        );

        Ok(Figure {
            document,
            title,
            drawn_layers,
            skipped_layers,
        })
    }
}

/// Maps projected coordinates into image pixels, north up.
#[derive(Debug, Clone, Copy)]
struct Viewport {
    min_x: f64,
    max_y: f64,
    scale: f64,
    offset_x: f64,
    offset_y: f64,
}

impl Viewport {
    fn fit(extent: Rect, width: f64, height: f64, top: f64) -> Self {
        let available_width = (width - 2.0 * MARGIN).max(1.0);
        let available_height = (height - 2.0 * MARGIN).max(1.0);

        let scale_x = available_width / extent.width();
        let scale_y = available_height / extent.height();
        let scale = match (scale_x.is_finite(), scale_y.is_finite()) {
            (true, true) => scale_x.min(scale_y),
            (true, false) => scale_x,
            (false, true) => scale_y,
            (false, false) => 1.0,
        };

        Self {
            min_x: extent.min().x,
            max_y: extent.max().y,
            scale,
            offset_x: MARGIN + (available_width - extent.width() * scale) / 2.0,
            offset_y: top + MARGIN + (available_height - extent.height() * scale) / 2.0,
        }
    }

    fn to_screen(&self, coord: Coord) -> (f64, f64) {
        (
            self.offset_x + (coord.x - self.min_x) * self.scale,
            self.offset_y + (self.max_y - coord.y) * self.scale,
        )
    }
}

fn draw_geometry(geometry: &Geometry, style: &LayerStyle, viewport: &Viewport) -> Vec<Box<dyn svg::Node>> {
    let mut nodes: Vec<Box<dyn svg::Node>> = vec![];
    match geometry {
        Geometry::Point(point) => nodes.push(Box::new(circle(point.0, style, viewport))),
        Geometry::MultiPoint(points) => {
            for point in points {
                nodes.push(Box::new(circle(point.0, style, viewport)));
            }
        }
        Geometry::Line(line) => {
            nodes.push(Box::new(line_path(&[LineString::from(*line)], style, viewport)))
        }
        Geometry::LineString(line) => {
            nodes.push(Box::new(line_path(std::slice::from_ref(line), style, viewport)))
        }
        Geometry::MultiLineString(lines) => {
            nodes.push(Box::new(line_path(&lines.0, style, viewport)))
        }
        Geometry::Polygon(polygon) => nodes.push(Box::new(polygon_path(
            std::slice::from_ref(polygon),
            style,
            viewport,
        ))),
        Geometry::MultiPolygon(polygons) => {
            nodes.push(Box::new(polygon_path(&polygons.0, style, viewport)))
        }
        Geometry::Rect(rect) => nodes.push(Box::new(polygon_path(
            &[rect.to_polygon()],
            style,
            viewport,
        ))),
        Geometry::Triangle(triangle) => nodes.push(Box::new(polygon_path(
            &[triangle.to_polygon()],
            style,
            viewport,
        ))),
        Geometry::GeometryCollection(collection) => {
            for part in collection {
                nodes.extend(draw_geometry(part, style, viewport));
            }
        }
    }

    nodes
}

fn circle(coord: Coord, style: &LayerStyle, viewport: &Viewport) -> element::Circle {
    let (x, y) = viewport.to_screen(coord);
    element::Circle::new()
        .set("cx", x)
        .set("cy", y)
        .set("r", style.point_radius)
        .set("fill", style.color.to_svg())
        .set("fill-opacity", style.color.opacity())
}

fn line_path(lines: &[LineString], style: &LayerStyle, viewport: &Viewport) -> element::Path {
    let mut data = String::new();
    for line in lines {
        append_ring(&mut data, line, viewport, false);
    }

    let mut path = element::Path::new()
        .set("d", data)
        .set("fill", "none")
        .set("stroke", style.color.to_svg())
        .set("stroke-opacity", style.color.opacity())
        .set("stroke-width", style.line_width)
        .set("stroke-linecap", "round")
        .set("stroke-linejoin", "round");
    if let Some((dash, gap)) = style.dash {
        path = path.set("stroke-dasharray", format!("{dash} {gap}"));
    }

    path
}

fn polygon_path(polygons: &[Polygon], style: &LayerStyle, viewport: &Viewport) -> element::Path {
    let mut data = String::new();
    for polygon in polygons {
        append_ring(&mut data, polygon.exterior(), viewport, true);
        for interior in polygon.interiors() {
            append_ring(&mut data, interior, viewport, true);
        }
    }

    element::Path::new()
        .set("d", data)
        .set("fill", style.color.to_svg())
        .set("fill-opacity", style.color.opacity())
        .set("fill-rule", "evenodd")
        .set("stroke", "none")
}

fn append_ring(data: &mut String, ring: &LineString, viewport: &Viewport, close: bool) {
    for (index, coord) in ring.coords().enumerate() {
        let (x, y) = viewport.to_screen(*coord);
        let command = if index == 0 { 'M' } else { 'L' };
        data.push_str(&format!("{command}{x:.2},{y:.2} "));
    }

    if close && ring.0.len() > 1 {
        data.push_str("Z ");
    }
}
