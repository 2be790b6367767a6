//! Protocol-tagged layer descriptions accepted by [`crate::MapSession::add_layer`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use formats::map_config::SubdomainSpec;

/// Subdomains used when a tile layer names none.
pub const DEFAULT_SUBDOMAINS: &str = "abc";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerConfig {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub source: LayerSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum LayerSource {
    Xyz(TiledOptions),
    Tms(TiledOptions),
    Wms(OgcOptions),
    Wmts(TiledOptions),
    Wfs(WfsOptions),
    Wcs(OgcOptions),
    Geojson(DataOptions),
    LocalJson(DataOptions),
}

impl LayerSource {
    pub fn protocol(&self) -> &'static str {
        match self {
            LayerSource::Xyz(_) => "xyz",
            LayerSource::Tms(_) => "tms",
            LayerSource::Wms(_) => "wms",
            LayerSource::Wmts(_) => "wmts",
            LayerSource::Wfs(_) => "wfs",
            LayerSource::Wcs(_) => "wcs",
            LayerSource::Geojson(_) => "geojson",
            LayerSource::LocalJson(_) => "local-json",
        }
    }
}

/// XYZ, TMS and WMTS endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TiledOptions {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub min_zoom: Option<u8>,
    #[serde(default)]
    pub max_zoom: Option<u8>,
    #[serde(default)]
    pub subdomains: Option<SubdomainSpec>,
    #[serde(default)]
    pub attribution: Option<String>,
    /// Extra template values such as `{layer}` or `{TileMatrixSet}`.
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

/// WMS and WCS endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OgcOptions {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub layers: Option<String>,
    #[serde(default)]
    pub styles: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub transparent: Option<bool>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub crs: Option<String>,
    #[serde(default)]
    pub attribution: Option<String>,
    #[serde(default)]
    pub max_zoom: Option<u8>,
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WfsOptions {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub type_name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub output_format: Option<String>,
    #[serde(default)]
    pub max_features: Option<u32>,
}

/// Inline GeoJSON or a location to load it from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataOptions {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub url: Option<String>,
}

impl LayerConfig {
    pub fn new(id: impl Into<String>, name: impl Into<String>, source: LayerSource) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            source,
        }
    }

    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
