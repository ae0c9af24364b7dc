use crate::color::Color;

/// Name of the pseudo layer drawn from the area of interest itself.
pub const MASK_LAYER: &str = "mask";

/// How the features of one layer are drawn.
///
/// Polygons are filled with the color, lines are stroked with it and points are drawn as
/// small filled circles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerStyle {
    /// Fill and stroke color.
    pub color: Color,
    /// Stroke width of lines, in pixels.
    pub line_width: f64,
    /// Dash and gap lengths of lines, in pixels. Solid if `None`.
    pub dash: Option<(f64, f64)>,
    /// Radius of points, in pixels.
    pub point_radius: f64,
}

impl LayerStyle {
    /// Style with 1px lines.
    pub const fn new(color: Color) -> Self {
        Self {
            color,
            line_width: 1.0,
            dash: None,
            point_radius: 1.5,
        }
    }

    /// Sets the line width.
    pub const fn with_line_width(mut self, line_width: f64) -> Self {
        self.line_width = line_width;
        self
    }

    /// Makes lines dashed.
    pub const fn dashed(mut self, dash: f64, gap: f64) -> Self {
        self.dash = Some((dash, gap));
        self
    }
}

/// Known layers and their styles, in drawing order (bottom first).
#[derive(Debug, Clone, PartialEq)]
pub struct StyleTable {
    styles: Vec<(String, LayerStyle)>,
}

impl StyleTable {
    /// Empty table.
    pub fn new() -> Self {
        Self { styles: vec![] }
    }

    /// Styles of the default layers. Trails are drawn on top of everything else.
    pub fn builtin() -> Self {
        Self::new()
            .with_style(MASK_LAYER, LayerStyle::new(Color::from_hex("#ECF2D4")))
            .with_style("water", LayerStyle::new(Color::from_hex("#9FD9E9")))
            .with_style("parks", LayerStyle::new(Color::from_hex("#CEDFC2")))
            .with_style("buildings", LayerStyle::new(Color::from_hex("#D4D1CB")))
            .with_style(
                "streets",
                LayerStyle::new(Color::WHITE).with_line_width(0.6),
            )
            .with_style(
                "roads",
                LayerStyle::new(Color::from_hex("#F9E9A0")).with_line_width(1.5),
            )
            .with_style(
                "highways",
                LayerStyle::new(Color::from_hex("#F3CD71")).with_line_width(2.0),
            )
            .with_style(
                "trails",
                LayerStyle::new(Color::from_hex("#BA6461"))
                    .with_line_width(0.6)
                    .dashed(3.0, 2.0),
            )
    }

    /// Sets the style of a layer. A new layer is drawn above all the existing ones, a replaced
    /// one keeps its position.
    pub fn with_style(mut self, name: impl Into<String>, style: LayerStyle) -> Self {
        let name = name.into();
        match self.styles.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = style,
            None => self.styles.push((name, style)),
        }

        self
    }

    /// Style of the layer, if it is known.
    pub fn get(&self, name: &str) -> Option<&LayerStyle> {
        self.styles
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, style)| style)
    }

    /// Iterates over the styles in drawing order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &LayerStyle)> {
        self.styles.iter().map(|(name, style)| (name.as_str(), style))
    }
}

impl Default for StyleTable {
    fn default() -> Self {
        Self::builtin()
    }
}
