//! OGC web-service request URLs: per-tile WMS `GetMap` / WCS `GetCoverage`
//! and one-shot WFS `GetFeature`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::source::TileUrlError;
use crate::tile::{MAX_TILE_ZOOM, TileCoord};

pub const WMS_DEFAULT_VERSION: &str = "1.1.1";
pub const WCS_DEFAULT_VERSION: &str = "1.0.0";
pub const WFS_DEFAULT_VERSION: &str = "1.1.0";
pub const DEFAULT_IMAGE_FORMAT: &str = "image/png";
pub const DEFAULT_TILE_CRS: &str = "EPSG:3857";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OgcService {
    Wms,
    Wcs,
}

impl OgcService {
    pub fn service_name(self) -> &'static str {
        match self {
            OgcService::Wms => "WMS",
            OgcService::Wcs => "WCS",
        }
    }

    pub fn request_name(self) -> &'static str {
        match self {
            OgcService::Wms => "GetMap",
            OgcService::Wcs => "GetCoverage",
        }
    }

    pub fn default_version(self) -> &'static str {
        match self {
            OgcService::Wms => WMS_DEFAULT_VERSION,
            OgcService::Wcs => WCS_DEFAULT_VERSION,
        }
    }
}

/// Percent-encodes a query component, leaving `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
pub fn encode_component(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for b in value.bytes() {
        match b {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => out.push(b as char),
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

fn join_query(base_url: &str, params: &[(String, String)]) -> String {
    let query = params
        .iter()
        .map(|(k, v)| format!("{}={}", encode_component(k), encode_component(v)))
        .collect::<Vec<_>>()
        .join("&");
    let sep = if base_url.contains('?') { '&' } else { '?' };
    format!("{base_url}{sep}{query}")
}

/// WMS 1.3.0 and later name the CRS parameter `crs`; older versions use `srs`.
fn uses_crs_key(version: &str) -> bool {
    let mut parts = version.split('.').map(|p| p.parse::<u32>().unwrap_or(0));
    let major = parts.next().unwrap_or(0);
    let minor = parts.next().unwrap_or(0);
    (major, minor) >= (1, 3)
}

/// Per-tile image request against a WMS or WCS endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OgcTileSource {
    pub base_url: String,
    pub service: OgcService,
    pub layers: String,
    #[serde(default)]
    pub styles: String,
    pub format: String,
    pub transparent: bool,
    pub version: String,
    pub crs: String,
    pub tile_size: u32,
    #[serde(default)]
    pub attribution: String,
    pub max_zoom: u8,
    /// Extra vendor parameters appended after the standard ones.
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

impl OgcTileSource {
    pub fn new(service: OgcService, base_url: impl Into<String>, layers: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            service,
            layers: layers.into(),
            styles: String::new(),
            format: DEFAULT_IMAGE_FORMAT.to_string(),
            transparent: service == OgcService::Wms,
            version: service.default_version().to_string(),
            crs: DEFAULT_TILE_CRS.to_string(),
            tile_size: 256,
            attribution: String::new(),
            max_zoom: 18,
            extra: BTreeMap::new(),
        }
    }

    pub fn wms(base_url: impl Into<String>, layers: impl Into<String>) -> Self {
        Self::new(OgcService::Wms, base_url, layers)
    }

    pub fn wcs(base_url: impl Into<String>, layers: impl Into<String>) -> Self {
        Self::new(OgcService::Wcs, base_url, layers)
    }

    /// Fails for zooms past `max_zoom` or [`MAX_TILE_ZOOM`].
    pub fn tile_url(&self, coord: TileCoord) -> Result<String, TileUrlError> {
        let max = self.max_zoom.min(MAX_TILE_ZOOM);
        if coord.z > max {
            return Err(TileUrlError::ZoomOutOfRange {
                z: coord.z,
                min: 0,
                max,
            });
        }

        let size = self.tile_size.to_string();
        let crs_key = if uses_crs_key(&self.version) { "crs" } else { "srs" };
        let mut params: Vec<(String, String)> = vec![
            ("service".into(), self.service.service_name().into()),
            ("request".into(), self.service.request_name().into()),
            ("layers".into(), self.layers.clone()),
            ("styles".into(), self.styles.clone()),
            ("format".into(), self.format.clone()),
            ("transparent".into(), self.transparent.to_string()),
            ("version".into(), self.version.clone()),
            ("width".into(), size.clone()),
            ("height".into(), size),
            (crs_key.into(), self.crs.clone()),
        ];
        params.extend(self.extra.iter().map(|(k, v)| (k.clone(), v.clone())));

        let b = coord.bounds_3857();
        let bbox = format!("{},{},{},{}", b.min[0], b.min[1], b.max[0], b.max[1]);
        Ok(format!("{}&bbox={}", join_query(&self.base_url, &params), bbox))
    }
}

/// One-shot `GetFeature` request returning GeoJSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WfsRequest {
    pub base_url: String,
    pub type_name: String,
    pub version: String,
    pub output_format: String,
    pub max_features: Option<u32>,
}

impl WfsRequest {
    pub fn new(base_url: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            type_name: type_name.into(),
            version: WFS_DEFAULT_VERSION.to_string(),
            output_format: "application/json".to_string(),
            max_features: None,
        }
    }

    pub fn url(&self) -> String {
        let mut params: Vec<(String, String)> = vec![
            ("service".into(), "WFS".into()),
            ("version".into(), self.version.clone()),
            ("request".into(), "GetFeature".into()),
            ("typeName".into(), self.type_name.clone()),
            ("outputFormat".into(), self.output_format.clone()),
            ("srsName".into(), "EPSG:4326".into()),
        ];
        if let Some(max) = self.max_features {
            params.push(("maxFeatures".into(), max.to_string()));
        }
        join_query(&self.base_url, &params)
    }
}
