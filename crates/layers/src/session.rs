//! One interactive map: base layers, overlays, markers, heatmaps, viewport
//! and the drawing session, all owned here and mutated through `&mut self`.

use std::sync::Arc;

use tracing::{error, info, warn};

use compute::analysis::SpatialAnalysis;
use drawing::session::DrawingSession;
use formats::map_config::{MapConfig, SubdomainSpec, TileLayerConfig};
use foundation::bounds::LatLngBounds;
use foundation::geo::LatLng;
use foundation::math::crs::{self, MapCrs};
use runtime::clock::Clock;
use runtime::watchdog::Watchdog;
use streaming::baidu::{BaiduLayerOptions, create_layer, detect_kind, is_baidu_layer};
use streaming::ogc::OgcTileSource;
use streaming::source::TileSource;

use crate::annotation::{ANNOTATION_LAYER_ID, annotation_source};
use crate::config::{DEFAULT_SUBDOMAINS, LayerConfig};
use crate::heatmap::{HeatPoint, Heatmap, HeatmapError, HeatmapOptions};
use crate::layer::Layer;
use crate::marker::{Marker, MarkerConfig};
use crate::orchestrator::{LayerError, LayerOrchestrator};
use crate::registry::Registry;
use crate::surface::{RenderSurface, SurfaceItem};

pub const DEFAULT_LAYER_ID: &str = "default";
pub const FALLBACK_LAYER_ID: &str = "fallback";
/// How long the default base layer gets to report its first load.
pub const BASE_LAYER_TIMEOUT_MS: i64 = 10_000;
pub const FIT_PADDING_PX: f64 = 20.0;
/// Minimum zoom applied to Baidu base layers.
pub const BAIDU_MIN_ZOOM: u8 = 3;

const DEFAULT_VIEWPORT_PX: [f64; 2] = [1024.0, 768.0];

/// OpenStreetMap, used when the configured base layer cannot load.
pub fn fallback_layer_config() -> TileLayerConfig {
    TileLayerConfig {
        name: "OpenStreetMap (备用)".to_string(),
        url: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
        attribution: "© OpenStreetMap contributors".to_string(),
        max_zoom: 19,
        subdomains: Some(SubdomainSpec::List(vec!["a".into(), "b".into(), "c".into()])),
        visible: true,
        layer_type: None,
        layers: None,
        format: None,
        transparent: None,
        version: None,
    }
}

/// Overrides for the configured view. `None` keeps the config value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionOptions {
    pub center: Option<LatLng>,
    pub zoom: Option<u8>,
    pub min_zoom: Option<u8>,
    pub max_zoom: Option<u8>,
    pub use_baidu_projection: bool,
    pub force_standard_crs: bool,
}

/// Load signals reported by the renderer for a tile layer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TileEvent {
    Loaded,
    TileError,
}

pub struct MapSession<S: RenderSurface> {
    config: MapConfig,
    surface: S,
    crs: MapCrs,
    orchestrator: LayerOrchestrator,
    clock: Arc<dyn Clock>,
    layers: Registry<Layer>,
    markers: Registry<Marker>,
    heatmaps: Registry<Heatmap>,
    drawing: DrawingSession,
    watchdog: Watchdog,
    fell_back: bool,
    center: LatLng,
    zoom: u8,
    min_zoom: u8,
    max_zoom: u8,
    viewport_px: [f64; 2],
    destroyed: bool,
}

impl<S: RenderSurface> std::fmt::Debug for MapSession<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapSession")
            .field("crs", &self.crs.code())
            .field("layers", &self.layers.ids())
            .field("markers", &self.markers.ids())
            .field("heatmaps", &self.heatmaps.ids())
            .field("center", &self.center)
            .field("zoom", &self.zoom)
            .field("destroyed", &self.destroyed)
            .finish()
    }
}

impl<S: RenderSurface> MapSession<S> {
    /// Picks the CRS, attaches the default base layer (plus its label overlay)
    /// and arms the base-layer watchdog.
    pub fn init(
        config: MapConfig,
        options: SessionOptions,
        mut surface: S,
        orchestrator: LayerOrchestrator,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let center = options.center.unwrap_or(LatLng::new(
            config.default_center[0],
            config.default_center[1],
        ));
        let min_zoom = options.min_zoom.unwrap_or(config.min_zoom);
        let max_zoom = options.max_zoom.unwrap_or(config.max_zoom).max(min_zoom);
        let zoom = options
            .zoom
            .unwrap_or(config.default_zoom)
            .clamp(min_zoom, max_zoom);

        let default_layer = config
            .default_tile_layer()
            .map(|(_, layer)| layer.clone());
        let baidu_base = default_layer
            .as_ref()
            .is_some_and(|l| is_baidu_layer(&l.name, &l.url));
        let needs_baidu =
            options.use_baidu_projection || (baidu_base && !options.force_standard_crs);

        let map_crs = if needs_baidu {
            match crs::baidu() {
                Ok(baidu) => MapCrs::Baidu(baidu),
                Err(err) => {
                    error!("Baidu CRS unavailable, using Web Mercator: {err}");
                    MapCrs::WebMercator
                }
            }
        } else {
            MapCrs::WebMercator
        };
        surface.set_crs(map_crs.code());
        surface.set_view(center, zoom);
        info!("map session initialised with {}", map_crs.code());

        let drawing = DrawingSession::new(clock.clone());
        let mut session = Self {
            config,
            surface,
            crs: map_crs,
            orchestrator,
            clock,
            layers: Registry::new(),
            markers: Registry::new(),
            heatmaps: Registry::new(),
            drawing,
            watchdog: Watchdog::new(BASE_LAYER_TIMEOUT_MS),
            fell_back: false,
            center,
            zoom,
            min_zoom,
            max_zoom,
            viewport_px: DEFAULT_VIEWPORT_PX,
            destroyed: false,
        };

        match default_layer {
            Some(layer) => {
                session.add_tile_layer_from_config(DEFAULT_LAYER_ID, &layer);
                session.watchdog.arm(session.clock.now());
                session.add_annotation(&layer);
            }
            None => warn!("map config has no tile layers"),
        }
        session.surface.attach(SurfaceItem::Drawings);
        session
    }

    pub fn crs(&self) -> MapCrs {
        self.crs
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn has_fallen_back(&self) -> bool {
        self.fell_back
    }

    fn alive(&self, op: &str) -> bool {
        if self.destroyed {
            warn!("{op} ignored: map session destroyed");
        }
        !self.destroyed
    }

    /// Drops `id` from every registry and from the surface.
    fn evict(&mut self, id: &str) {
        if self.layers.remove(id).is_some() {
            self.surface.detach(&SurfaceItem::Layer(id.to_string()));
        }
        if self.markers.remove(id).is_some() {
            self.surface.detach(&SurfaceItem::Marker(id.to_string()));
        }
        if self.heatmaps.remove(id).is_some() {
            self.surface.detach(&SurfaceItem::Heatmap(id.to_string()));
        }
    }

    fn insert_layer(&mut self, id: &str, layer: Layer) {
        self.evict(id);
        self.layers.insert(id, layer);
        self.surface.attach(SurfaceItem::Layer(id.to_string()));
    }

    // Layers

    /// Resolves `config` and registers it under its id, replacing whatever
    /// held that id before.
    pub async fn add_layer(&mut self, config: LayerConfig) -> Result<String, LayerError> {
        if !self.alive("add_layer") {
            return Err(LayerError::SessionDestroyed);
        }
        let layer = match self.orchestrator.resolve(&config).await {
            Ok(layer) => layer,
            Err(err) => {
                error!("failed to add layer {}: {err}", config.id);
                return Err(err);
            }
        };
        info!(
            "layer {} ({}) added as {}",
            config.id,
            config.source.protocol(),
            layer.kind_name()
        );
        self.insert_layer(&config.id, layer);
        Ok(config.id)
    }

    /// Adds a layer described by a config-file entry: WMS, Baidu, or plain XYZ.
    pub fn add_tile_layer_from_config(&mut self, id: &str, config: &TileLayerConfig) -> bool {
        if !self.alive("add_tile_layer_from_config") {
            return false;
        }
        let layer = self.layer_from_tile_config(config);
        info!("tile layer {id} ({}) added", config.name);
        self.insert_layer(id, layer);
        true
    }

    fn layer_from_tile_config(&self, config: &TileLayerConfig) -> Layer {
        if config.is_wms() {
            let mut src = OgcTileSource::wms(&config.url, config.layers.clone().unwrap_or_default());
            if let Some(format) = &config.format {
                src.format = format.clone();
            }
            src.transparent = config.transparent != Some(false);
            if let Some(version) = &config.version {
                src.version = version.clone();
            }
            src.attribution = config.attribution.clone();
            src.max_zoom = config.max_zoom;
            return Layer::ogc(&config.name, src);
        }

        if is_baidu_layer(&config.name, &config.url) {
            let options =
                BaiduLayerOptions::new(detect_kind(&config.name, &config.url)).named(&config.name);
            let sources = create_layer(&options, self.clock.now())
                .sources()
                .iter()
                .cloned()
                .map(|s| s.with_zoom_range(BAIDU_MIN_ZOOM, config.max_zoom))
                .collect();
            return Layer::tile_group(&config.name, sources);
        }

        let mut src = TileSource::new(&config.url)
            .with_zoom_range(0, config.max_zoom)
            .with_attribution(config.attribution.clone())
            .with_subdomains(DEFAULT_SUBDOMAINS);
        if config.subdomains.is_some() {
            src.subdomains = config.subdomain_list();
        }
        Layer::tiles(&config.name, src)
    }

    fn add_annotation(&mut self, base: &TileLayerConfig) {
        if let Some(src) = annotation_source(base) {
            info!("adding label overlay for {}", base.name);
            self.insert_layer(ANNOTATION_LAYER_ID, Layer::tiles(format!("{} 注记", base.name), src));
        }
    }

    pub fn remove_tile_layer(&mut self, id: &str) -> bool {
        if !self.alive("remove_tile_layer") {
            return false;
        }
        if self.layers.remove(id).is_some() {
            self.surface.detach(&SurfaceItem::Layer(id.to_string()));
            info!("layer {id} removed");
            true
        } else {
            warn!("no layer {id} to remove");
            false
        }
    }

    pub fn clear_all_tile_layers(&mut self) {
        for id in self.layers.clear() {
            self.surface.detach(&SurfaceItem::Layer(id));
        }
        info!("all tile layers cleared");
    }

    pub fn layer(&self, id: &str) -> Option<&Layer> {
        self.layers.get(id)
    }

    pub fn layer_ids(&self) -> Vec<&str> {
        self.layers.ids()
    }

    // Base layer health

    /// Reports a load signal for `layer_id`. Only the default base layer is
    /// watched. Returns true when this switched to the fallback layer.
    pub fn handle_tile_event(&mut self, layer_id: &str, event: TileEvent) -> bool {
        if self.destroyed || layer_id != DEFAULT_LAYER_ID || !self.layers.contains(layer_id) {
            return false;
        }
        match event {
            TileEvent::Loaded => {
                self.watchdog.clear();
                false
            }
            TileEvent::TileError => {
                self.watchdog.trip();
                self.switch_to_fallback()
            }
        }
    }

    /// Fires the base-layer timeout if it has expired.
    pub fn poll(&mut self) -> bool {
        if self.destroyed || !self.watchdog.poll(self.clock.now()) {
            return false;
        }
        warn!("default layer did not load within {BASE_LAYER_TIMEOUT_MS} ms");
        self.switch_to_fallback()
    }

    fn switch_to_fallback(&mut self) -> bool {
        if self.fell_back {
            return false;
        }
        self.fell_back = true;
        for id in [DEFAULT_LAYER_ID, ANNOTATION_LAYER_ID] {
            if self.layers.remove(id).is_some() {
                self.surface.detach(&SurfaceItem::Layer(id.to_string()));
            }
        }
        warn!("switching to fallback layer OpenStreetMap");
        self.add_tile_layer_from_config(FALLBACK_LAYER_ID, &fallback_layer_config())
    }

    // Markers

    /// Places a marker, using the configured `default` icon when none is given.
    pub fn add_marker(&mut self, id: &str, config: MarkerConfig) -> bool {
        if !self.alive("add_marker") {
            return false;
        }
        let marker = Marker::from_config(config, self.config.icon("default"));
        self.evict(id);
        self.markers.insert(id, marker);
        self.surface.attach(SurfaceItem::Marker(id.to_string()));
        info!("marker {id} added");
        true
    }

    pub fn remove_marker(&mut self, id: &str) -> bool {
        if self.markers.remove(id).is_none() {
            return false;
        }
        self.surface.detach(&SurfaceItem::Marker(id.to_string()));
        true
    }

    pub fn get_marker(&self, id: &str) -> Option<&Marker> {
        self.markers.get(id)
    }

    pub fn clear_markers(&mut self) {
        for id in self.markers.clear() {
            self.surface.detach(&SurfaceItem::Marker(id));
        }
    }

    // Heatmaps

    /// Adds a heatmap from `[lat, lng, intensity?]` rows, replacing any
    /// heatmap with the same id. Returns the number of points.
    pub fn add_heatmap(
        &mut self,
        id: &str,
        rows: &[Vec<f64>],
        options: HeatmapOptions,
    ) -> Result<usize, HeatmapError> {
        let points = HeatPoint::parse_rows(rows)?;
        if !self.alive("add_heatmap") {
            return Ok(0);
        }
        let count = points.len();
        self.evict(id);
        self.heatmaps.insert(id, Heatmap::new(points, options));
        self.surface.attach(SurfaceItem::Heatmap(id.to_string()));
        info!("heatmap {id} added with {count} points");
        Ok(count)
    }

    /// Replaces the points of an existing heatmap. Returns false if there is
    /// no heatmap `id`.
    pub fn update_heatmap(&mut self, id: &str, rows: &[Vec<f64>]) -> Result<bool, HeatmapError> {
        let points = HeatPoint::parse_rows(rows)?;
        let Some(heatmap) = self.heatmaps.get_mut(id) else {
            return Ok(false);
        };
        heatmap.points = points;
        info!("heatmap {id} updated with {} points", heatmap.points.len());
        Ok(true)
    }

    pub fn remove_heatmap(&mut self, id: &str) -> bool {
        if self.heatmaps.remove(id).is_none() {
            return false;
        }
        self.surface.detach(&SurfaceItem::Heatmap(id.to_string()));
        info!("heatmap {id} removed");
        true
    }

    pub fn clear_heatmaps(&mut self) {
        for id in self.heatmaps.clear() {
            self.surface.detach(&SurfaceItem::Heatmap(id));
        }
    }

    pub fn get_heatmap(&self, id: &str) -> Option<&Heatmap> {
        self.heatmaps.get(id)
    }

    // Viewport

    /// Moves the view, keeping the current zoom when `zoom` is `None`.
    pub fn set_center(&mut self, center: LatLng, zoom: Option<u8>) {
        if !self.alive("set_center") {
            return;
        }
        self.center = center;
        if let Some(z) = zoom {
            self.zoom = z.clamp(self.min_zoom, self.max_zoom);
        }
        self.surface.set_view(self.center, self.zoom);
    }

    pub fn center(&self) -> LatLng {
        self.center
    }

    pub fn set_zoom(&mut self, zoom: u8) {
        if !self.alive("set_zoom") {
            return;
        }
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
        self.surface.set_view(self.center, self.zoom);
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn set_viewport_size(&mut self, width_px: f64, height_px: f64) {
        self.viewport_px = [width_px, height_px];
    }

    /// Extent of every marker and finished drawing.
    pub fn content_bounds(&self) -> Option<LatLngBounds> {
        let positions: Vec<LatLng> = self.markers.iter().map(|(_, m)| m.position).collect();
        SpatialAnalysis::union_bounds(
            SpatialAnalysis::bounds_of(&positions)
                .into_iter()
                .chain(self.drawing.group().bounds()),
        )
    }

    /// Frames all markers and drawings, or returns to the configured view
    /// when there are none.
    pub fn fit_bounds(&mut self) {
        if !self.alive("fit_bounds") {
            return;
        }
        match self.content_bounds() {
            Some(bounds) => {
                self.zoom = SpatialAnalysis::fit_zoom(
                    &self.crs,
                    &bounds,
                    self.viewport_px,
                    FIT_PADDING_PX,
                    self.min_zoom,
                    self.max_zoom,
                );
                self.center = bounds.center();
            }
            None => {
                self.center = LatLng::new(self.config.default_center[0], self.config.default_center[1]);
                self.zoom = self.config.default_zoom.clamp(self.min_zoom, self.max_zoom);
            }
        }
        self.surface.set_view(self.center, self.zoom);
    }

    // Drawing

    pub fn drawing(&self) -> &DrawingSession {
        &self.drawing
    }

    pub fn drawing_mut(&mut self) -> &mut DrawingSession {
        &mut self.drawing
    }

    /// Tears the map down. Later calls warn and do nothing.
    pub fn destroy(&mut self) {
        if !self.alive("destroy") {
            return;
        }
        self.drawing.stop();
        self.drawing.clear_drawings();
        self.layers.clear();
        self.markers.clear();
        self.heatmaps.clear();
        self.watchdog.clear();
        self.surface.clear();
        self.destroyed = true;
        info!("map session destroyed");
    }
}
