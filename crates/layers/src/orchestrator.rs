use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use formats::vector_chunk::{VectorChunk, VectorChunkError};
use streaming::ogc::{OgcService, OgcTileSource, WfsRequest};
use streaming::source::{DEFAULT_MAX_ZOOM, DEFAULT_MIN_ZOOM, TileSource};

use crate::config::{
    DEFAULT_SUBDOMAINS, DataOptions, LayerConfig, LayerSource, OgcOptions, TiledOptions, WfsOptions,
};
use crate::fetch::{FetchError, LocalAssets, ResourceFetcher};
use crate::layer::Layer;

#[derive(Debug)]
pub enum LayerError {
    MissingUrl { protocol: &'static str },
    MissingData { protocol: &'static str },
    MissingTypeName,
    NoAssetRoot,
    Fetch(FetchError),
    InvalidGeoJson(VectorChunkError),
    SessionDestroyed,
}

impl std::fmt::Display for LayerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayerError::MissingUrl { protocol } => write!(f, "{protocol} layer requires a url"),
            LayerError::MissingData { protocol } => {
                write!(f, "{protocol} layer requires data or a url")
            }
            LayerError::MissingTypeName => write!(f, "wfs layer requires a typeName"),
            LayerError::NoAssetRoot => write!(f, "no asset directory configured for local files"),
            LayerError::Fetch(e) => write!(f, "{e}"),
            LayerError::InvalidGeoJson(e) => write!(f, "invalid GeoJSON: {e}"),
            LayerError::SessionDestroyed => write!(f, "map session has been destroyed"),
        }
    }
}

impl std::error::Error for LayerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LayerError::Fetch(e) => Some(e),
            LayerError::InvalidGeoJson(e) => Some(e),
            _ => None,
        }
    }
}

impl From<FetchError> for LayerError {
    fn from(value: FetchError) -> Self {
        LayerError::Fetch(value)
    }
}

impl From<VectorChunkError> for LayerError {
    fn from(value: VectorChunkError) -> Self {
        LayerError::InvalidGeoJson(value)
    }
}

/// Turns a [`LayerConfig`] into a [`Layer`], fetching remote data when the
/// protocol needs it.
#[derive(Clone)]
pub struct LayerOrchestrator {
    fetcher: Arc<dyn ResourceFetcher>,
    assets: Option<LocalAssets>,
}

impl LayerOrchestrator {
    pub fn new(fetcher: Arc<dyn ResourceFetcher>) -> Self {
        Self {
            fetcher,
            assets: None,
        }
    }

    pub fn with_assets(mut self, assets: LocalAssets) -> Self {
        self.assets = Some(assets);
        self
    }

    pub async fn resolve(&self, config: &LayerConfig) -> Result<Layer, LayerError> {
        let protocol = config.source.protocol();
        match &config.source {
            LayerSource::Xyz(o) | LayerSource::Wmts(o) => {
                Ok(Layer::tiles(&config.name, tiled_source(o, protocol, false)?))
            }
            LayerSource::Tms(o) => Ok(Layer::tiles(&config.name, tiled_source(o, protocol, true)?)),
            LayerSource::Wms(o) => Ok(Layer::ogc(
                &config.name,
                ogc_source(o, OgcService::Wms, protocol)?,
            )),
            LayerSource::Wcs(o) => Ok(Layer::ogc(
                &config.name,
                ogc_source(o, OgcService::Wcs, protocol)?,
            )),
            LayerSource::Wfs(o) => {
                let url = wfs_request(o)?.url();
                debug!("wfs GetFeature {url}");
                let body = self.fetcher.fetch_json(&url).await?;
                Ok(Layer::features(&config.name, VectorChunk::from_geojson_value(&body)?))
            }
            LayerSource::Geojson(o) => {
                let body = self.load_data(o, protocol, false).await?;
                Ok(Layer::features(&config.name, VectorChunk::from_geojson_value(&body)?))
            }
            LayerSource::LocalJson(o) => {
                let body = self.load_data(o, protocol, true).await?;
                Ok(Layer::features(&config.name, VectorChunk::from_geojson_value(&body)?))
            }
        }
    }

    async fn load_data(
        &self,
        options: &DataOptions,
        protocol: &'static str,
        local: bool,
    ) -> Result<Value, LayerError> {
        if let Some(data) = &options.data {
            return Ok(data.clone());
        }
        let Some(url) = options.url.as_deref() else {
            return Err(LayerError::MissingData { protocol });
        };
        if !local || is_remote(url) {
            return Ok(self.fetcher.fetch_json(url).await?);
        }
        let assets = self.assets.as_ref().ok_or(LayerError::NoAssetRoot)?;
        Ok(assets.read_json(url).await?)
    }
}

fn is_remote(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

fn tiled_source(o: &TiledOptions, protocol: &'static str, tms: bool) -> Result<TileSource, LayerError> {
    let url = o.url.as_deref().ok_or(LayerError::MissingUrl { protocol })?;
    let mut src = TileSource::new(url)
        .with_tms(tms)
        .with_zoom_range(
            o.min_zoom.unwrap_or(DEFAULT_MIN_ZOOM),
            o.max_zoom.unwrap_or(DEFAULT_MAX_ZOOM),
        )
        .with_attribution(o.attribution.clone().unwrap_or_default())
        .with_subdomains(DEFAULT_SUBDOMAINS);
    if let Some(spec) = &o.subdomains {
        src.subdomains = spec.to_vec();
    }
    src.options = o.options.clone();
    Ok(src)
}

fn ogc_source(
    o: &OgcOptions,
    service: OgcService,
    protocol: &'static str,
) -> Result<OgcTileSource, LayerError> {
    let url = o.url.as_deref().ok_or(LayerError::MissingUrl { protocol })?;
    let mut src = OgcTileSource::new(service, url, o.layers.clone().unwrap_or_default());
    if let Some(styles) = &o.styles {
        src.styles = styles.clone();
    }
    if let Some(format) = &o.format {
        src.format = format.clone();
    }
    if let Some(transparent) = o.transparent {
        src.transparent = transparent;
    }
    if let Some(version) = &o.version {
        src.version = version.clone();
    }
    if let Some(crs) = &o.crs {
        src.crs = crs.clone();
    }
    if let Some(max_zoom) = o.max_zoom {
        src.max_zoom = max_zoom;
    }
    src.attribution = o.attribution.clone().unwrap_or_default();
    src.extra = o.options.clone();
    Ok(src)
}

fn wfs_request(o: &WfsOptions) -> Result<WfsRequest, LayerError> {
    let url = o.url.as_deref().ok_or(LayerError::MissingUrl { protocol: "wfs" })?;
    let type_name = o.type_name.as_deref().ok_or(LayerError::MissingTypeName)?;
    let mut req = WfsRequest::new(url, type_name);
    if let Some(version) = &o.version {
        req.version = version.clone();
    }
    if let Some(format) = &o.output_format {
        req.output_format = format.clone();
    }
    req.max_features = o.max_features;
    Ok(req)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;
    use serde_json::json;
    use streaming::tile::TileCoord;

    use super::*;
    use crate::fetch::MemoryFetcher;
    use crate::layer::LayerData;

    fn orchestrator(fetcher: &MemoryFetcher) -> LayerOrchestrator {
        LayerOrchestrator::new(Arc::new(fetcher.clone()))
    }

    fn cfg(json: serde_json::Value) -> LayerConfig {
        serde_json::from_value(json).unwrap()
    }

    const COLLECTION: &str = r#"{"type": "FeatureCollection", "features": [
        {"type": "Feature", "properties": {"name": "a"}, "geometry": {"type": "Point", "coordinates": [116.4, 39.9]}},
        {"type": "Feature", "properties": {}, "geometry": {"type": "LineString", "coordinates": [[0, 0], [1, 1]]}}
    ]}"#;

    #[tokio::test]
    async fn tms_layers_flip_rows_and_default_zoom_range() {
        let o = orchestrator(&MemoryFetcher::new());
        let layer = o
            .resolve(&cfg(json!({"id": "t", "name": "T", "type": "tms", "url": "https://h/{z}/{x}/{y}.png"})))
            .await
            .unwrap();
        let src = &layer.tile_sources()[0];
        assert!(src.tms);
        assert_eq!((src.min_zoom, src.max_zoom), (0, 18));
        assert_eq!(
            layer.tile_urls(TileCoord::new(3, 2, 0)).unwrap(),
            vec!["https://h/3/2/7.png"]
        );
    }

    #[tokio::test]
    async fn wms_and_wcs_defaults_differ() {
        let o = orchestrator(&MemoryFetcher::new());
        let wms = o
            .resolve(&cfg(json!({"id": "w", "name": "W", "type": "wms", "url": "http://h/wms", "layers": "a"})))
            .await
            .unwrap();
        let wcs = o
            .resolve(&cfg(json!({"id": "c", "name": "C", "type": "wcs", "url": "http://h/wcs", "layers": "dem"})))
            .await
            .unwrap();
        match (&wms.data, &wcs.data) {
            (LayerData::Ogc(wms), LayerData::Ogc(wcs)) => {
                assert_eq!(wms.version, "1.1.1");
                assert!(wms.transparent);
                assert_eq!(wcs.version, "1.0.0");
                assert!(!wcs.transparent);
                assert!(wcs.tile_url(TileCoord::new(1, 0, 0)).unwrap().contains("request=GetCoverage"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn wfs_fetches_and_parses_features() {
        let fetcher = MemoryFetcher::new();
        let url = "http://h/wfs?service=WFS&version=1.1.0&request=GetFeature&typeName=ns%3Aroads&outputFormat=application%2Fjson&srsName=EPSG%3A4326";
        fetcher.insert_json(url, serde_json::from_str(COLLECTION).unwrap());
        let layer = orchestrator(&fetcher)
            .resolve(&cfg(json!({"id": "w", "name": "Roads", "type": "wfs", "url": "http://h/wfs", "typeName": "ns:roads"})))
            .await
            .unwrap();
        assert_eq!(layer.feature_count(), 2);
    }

    #[tokio::test]
    async fn wfs_http_failure_is_reported() {
        let fetcher = MemoryFetcher::new();
        let err = orchestrator(&fetcher)
            .resolve(&cfg(json!({"id": "w", "name": "W", "type": "wfs", "url": "http://h/wfs", "typeName": "x"})))
            .await
            .unwrap_err();
        assert!(matches!(err, LayerError::Fetch(FetchError::Status { status: 404, .. })));
        assert!(err.to_string().contains("HTTP 404"));
    }

    #[tokio::test]
    async fn geojson_prefers_inline_data_and_rejects_garbage() {
        let o = orchestrator(&MemoryFetcher::new());
        let inline = o
            .resolve(&cfg(json!({"id": "g", "name": "G", "type": "geojson",
                "data": {"type": "Point", "coordinates": [1.0, 2.0]}, "url": "http://unused"})))
            .await
            .unwrap();
        assert_eq!(inline.feature_count(), 1);

        let missing = o
            .resolve(&cfg(json!({"id": "g", "name": "G", "type": "geojson"})))
            .await
            .unwrap_err();
        assert!(matches!(missing, LayerError::MissingData { protocol: "geojson" }));

        let garbage = o
            .resolve(&cfg(json!({"id": "g", "name": "G", "type": "geojson", "data": {"hello": 1}})))
            .await
            .unwrap_err();
        assert!(matches!(garbage, LayerError::InvalidGeoJson(_)));
    }

    #[tokio::test]
    async fn local_json_reads_under_asset_root() {
        let dir = tempfile::tempdir().unwrap();
        let mut f = std::fs::File::create(dir.path().join("roads.json")).unwrap();
        f.write_all(COLLECTION.as_bytes()).unwrap();

        let config = cfg(json!({"id": "l", "name": "L", "type": "local-json", "url": "/roads.json"}));
        let without_root = orchestrator(&MemoryFetcher::new()).resolve(&config).await.unwrap_err();
        assert!(matches!(without_root, LayerError::NoAssetRoot));

        let o = orchestrator(&MemoryFetcher::new()).with_assets(LocalAssets::new(dir.path()));
        assert_eq!(o.resolve(&config).await.unwrap().feature_count(), 2);
    }

    #[tokio::test]
    async fn tiled_layers_need_a_url() {
        let err = orchestrator(&MemoryFetcher::new())
            .resolve(&cfg(json!({"id": "x", "name": "X", "type": "wmts"})))
            .await
            .unwrap_err();
        assert!(matches!(err, LayerError::MissingUrl { protocol: "wmts" }));
    }
}
