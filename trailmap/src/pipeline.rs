//! The whole run: resolve the area, pick a projection, fetch, measure and draw.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{info, warn};
use reqwest::blocking::Client;
use trailmap_types::geo::Crs;

use crate::area::{AreaOfInterest, AreaResolver, ResolvedArea};
use crate::catalog::ProjectionCatalog;
use crate::config::Config;
use crate::error::{Result, TrailmapError};
use crate::fetch::FeatureFetcher;
use crate::layer::{clip_layer, filter_trails, FeatureLayer, FeatureLayersPayload};
use crate::mileage::{Mileage, MileageCalculator};
use crate::provider::{Geocoder, MapDataProvider, NominatimGeocoder, OverpassProvider};
use crate::render::{Figure, StyleTable, SvgRenderer};

/// Constructor for a [`TrailMileageMap`].
///
/// Anything not set explicitly is created from the [`Config`]: the geocoder and the map data
/// provider talk to the public Nominatim and Overpass services, and the catalog is either
/// loaded from `catalog_path` or the built-in one.
///
/// ```no_run
/// use trailmap::{AreaOfInterest, FeatureLayersPayload, TrailMileageMapBuilder};
///
/// let map = TrailMileageMapBuilder::new().build()?;
/// let area = AreaOfInterest::bbox(37.335, 37.25, -107.81, -107.915)?;
/// let report = map.create_and_save(&area, &FeatureLayersPayload::builtin()?)?;
/// println!("{:.3} miles", report.mileage().miles());
/// # Ok::<(), trailmap::TrailmapError>(())
/// ```
#[derive(Default)]
pub struct TrailMileageMapBuilder {
    config: Config,
    geocoder: Option<Box<dyn Geocoder>>,
    map_data_provider: Option<Box<dyn MapDataProvider>>,
    catalog: Option<ProjectionCatalog>,
    styles: Option<StyleTable>,
}

impl TrailMileageMapBuilder {
    /// Builder with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration.
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Uses a custom geocoder for place names.
    pub fn with_geocoder(mut self, geocoder: impl Geocoder + 'static) -> Self {
        self.geocoder = Some(Box::new(geocoder));
        self
    }

    /// Uses a custom source of map features.
    pub fn with_map_data_provider(mut self, provider: impl MapDataProvider + 'static) -> Self {
        self.map_data_provider = Some(Box::new(provider));
        self
    }

    /// Uses the given projection catalog.
    pub fn with_catalog(mut self, catalog: ProjectionCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Uses the given layer styles.
    pub fn with_styles(mut self, styles: StyleTable) -> Self {
        self.styles = Some(styles);
        self
    }

    /// Consumes the builder and creates the map generator.
    pub fn build(self) -> Result<TrailMileageMap> {
        let Self {
            config,
            geocoder,
            map_data_provider,
            catalog,
            styles,
        } = self;

        config.validate()?;

        let catalog = match (catalog, &config.catalog_path) {
            (Some(catalog), _) => catalog,
            (None, Some(path)) => ProjectionCatalog::from_path(path)?,
            (None, None) => ProjectionCatalog::builtin()?,
        };

        let client = if geocoder.is_none() || map_data_provider.is_none() {
            Some(http_client(&config)?)
        } else {
            None
        };

        let geocoder: Box<dyn Geocoder> = match (geocoder, &client) {
            (Some(geocoder), _) => geocoder,
            (None, Some(client)) => Box::new(NominatimGeocoder::new(
                config.nominatim_url.clone(),
                client.clone(),
            )),
            (None, None) => {
                return Err(TrailmapError::Configuration(
                    "no geocoder available".into(),
                ))
            }
        };

        let map_data_provider: Box<dyn MapDataProvider> = match (map_data_provider, client) {
            (Some(provider), _) => provider,
            (None, Some(client)) => Box::new(
                OverpassProvider::new(config.overpass_url.clone(), client)
                    .with_timeout_secs(config.overpass_timeout_secs)
                    .with_max_query_vertices(config.max_query_vertices),
            ),
            (None, None) => {
                return Err(TrailmapError::Configuration(
                    "no map data provider available".into(),
                ))
            }
        };

        let renderer = SvgRenderer::new(
            config.image_width,
            config.image_height,
            styles.unwrap_or_default(),
        );

        Ok(TrailMileageMap {
            config,
            geocoder,
            map_data_provider,
            catalog,
            renderer,
        })
    }
}

fn http_client(config: &Config) -> Result<Client> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(config.request_timeout_secs.map(Duration::from_secs))
        .build()
        .map_err(|err| TrailmapError::Configuration(format!("failed to create HTTP client: {err}")))
}

/// Creates trail mileage maps.
pub struct TrailMileageMap {
    config: Config,
    geocoder: Box<dyn Geocoder>,
    map_data_provider: Box<dyn MapDataProvider>,
    catalog: ProjectionCatalog,
    renderer: SvgRenderer,
}

impl TrailMileageMap {
    /// Configuration of the generator.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Projection catalog in use.
    pub fn catalog(&self) -> &ProjectionCatalog {
        &self.catalog
    }

    /// Runs the whole pipeline and returns the result without writing anything.
    ///
    /// Stages run in order: the area is resolved, a projection is selected for its centroid,
    /// all layers are fetched (any failing layer aborts the run), layers are clipped to the
    /// area, the trail layer is filtered and measured and finally the figure is rendered.
    pub fn create(
        &self,
        area: &AreaOfInterest,
        payload: &FeatureLayersPayload,
    ) -> Result<TrailMileageReport> {
        if payload.is_empty() {
            return Err(TrailmapError::Configuration(
                "feature layers payload has no layers".to_string(),
            ));
        }

        let area = AreaResolver::new(self.geocoder.as_ref()).resolve(area)?;
        let crs = self.catalog.select(&area.centroid()).clone();

        let fetched =
            FeatureFetcher::new(self.map_data_provider.as_ref()).fetch_all(&area, payload)?;

        let mut layers = BTreeMap::new();
        for (name, layer) in fetched {
            let layer = if self.config.clip_to_area {
                clip_layer(layer, area.geometry())
            } else {
                layer
            };

            let layer = if self.config.filter_trails && name == self.config.trail_layer {
                filter_trails(layer)
            } else {
                layer
            };

            layers.insert(name, layer);
        }

        let trail_layer = match layers.get(&self.config.trail_layer) {
            Some(layer) => layer.clone(),
            None => {
                warn!(
                    "Trail layer {} is not in the payload, no trail miles to count",
                    self.config.trail_layer
                );
                FeatureLayer::new(self.config.trail_layer.clone(), vec![])
            }
        };

        let mileage = MileageCalculator::new(&crs)?.calculate(&trail_layer)?;
        let figure = self.renderer.render(&layers, area.geometry(), &mileage)?;

        Ok(TrailMileageReport {
            area,
            crs,
            mileage,
            layers,
            figure,
            output_path: None,
        })
    }

    /// Runs the pipeline and writes the figure to `{output_dir}/{area}-trails.svg`.
    ///
    /// Nothing is written if any stage fails.
    pub fn create_and_save(
        &self,
        area: &AreaOfInterest,
        payload: &FeatureLayersPayload,
    ) -> Result<TrailMileageReport> {
        let mut report = self.create(area, payload)?;

        let path = self.output_path(area);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        report.figure.save(&path)?;
        info!("Figure written to {}", path.display());

        report.output_path = Some(path);
        Ok(report)
    }

    /// Path the figure for the area is written to.
    pub fn output_path(&self, area: &AreaOfInterest) -> PathBuf {
        self.config
            .output_dir
            .join(format!("{}-trails.svg", area.slug()))
    }
}

/// Result of a run.
#[derive(Debug, Clone)]
pub struct TrailMileageReport {
    area: ResolvedArea,
    crs: Crs,
    mileage: Mileage,
    layers: BTreeMap<String, FeatureLayer>,
    figure: Figure,
    output_path: Option<PathBuf>,
}

impl TrailMileageReport {
    /// The resolved area of interest.
    pub fn area(&self) -> &ResolvedArea {
        &self.area
    }

    /// Projection selected for the area.
    pub fn crs(&self) -> &Crs {
        &self.crs
    }

    /// Measured trail length.
    pub fn mileage(&self) -> &Mileage {
        &self.mileage
    }

    /// Fetched layers after clipping and filtering.
    pub fn layers(&self) -> &BTreeMap<String, FeatureLayer> {
        &self.layers
    }

    /// The rendered figure.
    pub fn figure(&self) -> &Figure {
        &self.figure
    }

    /// Where the figure was written, if it was.
    pub fn output_path(&self) -> Option<&Path> {
        self.output_path.as_deref()
    }
}
