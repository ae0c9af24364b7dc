use log::debug;

use super::{Feature, FeatureLayer};

/// Unpaved surfaces on which a `highway=footway` still counts as a trail.
pub const FOOTWAY_SURFACES: &[&str] = &[
    "gravel",
    "dirt",
    "grass",
    "compacted",
    "earth",
    "ground",
    "rock",
];

/// Keeps only the trail-like features of the layer.
///
/// `highway=path` is kept unless its surface is `concrete`. `highway=footway` is kept only
/// on one of the [`FOOTWAY_SURFACES`]. Everything else is removed.
pub fn filter_trails(mut layer: FeatureLayer) -> FeatureLayer {
    let before = layer.len();
    layer.retain(is_trail);
    debug!(
        "Trail filter kept {} of {before} features of layer {}",
        layer.len(),
        layer.name()
    );

    layer
}

fn is_trail(feature: &Feature) -> bool {
    let surface = feature.tag("surface");
    match feature.tag("highway") {
        Some("path") => surface != Some("concrete"),
        Some("footway") => surface.is_some_and(|surface| FOOTWAY_SURFACES.contains(&surface)),
        _ => false,
    }
}
