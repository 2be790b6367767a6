//! The map configuration file: default view, named base layers and marker
//! icons.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Placeholder substituted with the Tianditu credential in layer URLs.
pub const TIANDITU_KEY_PLACEHOLDER: &str = "{tianditu_key}";
pub const DEFAULT_TIANDITU_KEY: &str = "17763402f97aa5d363379927f5ce70a6";
/// Environment variable overriding [`DEFAULT_TIANDITU_KEY`].
pub const TIANDITU_KEY_ENV: &str = "TIANDITU_KEY";

pub fn tianditu_key() -> String {
    std::env::var(TIANDITU_KEY_ENV)
        .ok()
        .filter(|k| !k.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_TIANDITU_KEY.to_string())
}

/// Subdomains given either as `"abc"` or `["a", "b", "c"]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubdomainSpec {
    Chars(String),
    List(Vec<String>),
}

impl SubdomainSpec {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            SubdomainSpec::Chars(s) => s.chars().map(|c| c.to_string()).collect(),
            SubdomainSpec::List(v) => v.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileLayerConfig {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub attribution: String,
    #[serde(default = "default_layer_max_zoom")]
    pub max_zoom: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subdomains: Option<SubdomainSpec>,
    #[serde(default)]
    pub visible: bool,
    /// `"wms"` for WMS layers; absent for plain XYZ.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub layer_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layers: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transparent: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

fn default_layer_max_zoom() -> u8 {
    18
}

impl TileLayerConfig {
    pub fn is_wms(&self) -> bool {
        self.layer_type
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case("wms"))
    }

    pub fn subdomain_list(&self) -> Vec<String> {
        self.subdomains.as_ref().map(SubdomainSpec::to_vec).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IconConfig {
    pub icon_url: String,
    pub icon_retina_url: String,
    pub shadow_url: String,
    pub icon_size: [i32; 2],
    pub icon_anchor: [i32; 2],
    pub popup_anchor: [i32; 2],
    pub shadow_size: [i32; 2],
}

impl IconConfig {
    /// The stock marker icon served from the Leaflet CDN.
    pub fn stock() -> Self {
        let base = "https://cdnjs.cloudflare.com/ajax/libs/leaflet/1.9.4/images";
        Self {
            icon_url: format!("{base}/marker-icon.png"),
            icon_retina_url: format!("{base}/marker-icon-2x.png"),
            shadow_url: format!("{base}/marker-shadow.png"),
            icon_size: [25, 41],
            icon_anchor: [12, 41],
            popup_anchor: [1, -34],
            shadow_size: [41, 41],
        }
    }
}

/// Map configuration. `tile_layers` keeps file order, which decides the
/// default layer when none is marked visible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapConfig {
    /// `[lat, lng]`.
    pub default_center: [f64; 2],
    pub default_zoom: u8,
    pub min_zoom: u8,
    pub max_zoom: u8,
    #[serde(with = "ordered_entries")]
    pub tile_layers: Vec<(String, TileLayerConfig)>,
    #[serde(default)]
    pub icons: BTreeMap<String, IconConfig>,
}

#[derive(Debug)]
pub enum MapConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(serde_json::Error),
    NoTileLayers,
    InvalidZoomRange { min: u8, max: u8 },
}

impl std::fmt::Display for MapConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MapConfigError::Io { path, source } => {
                write!(f, "failed to read map config {}: {source}", path.display())
            }
            MapConfigError::Parse(e) => write!(f, "failed to parse map config: {e}"),
            MapConfigError::NoTileLayers => write!(f, "map config defines no tile layers"),
            MapConfigError::InvalidZoomRange { min, max } => {
                write!(f, "minZoom {min} is greater than maxZoom {max}")
            }
        }
    }
}

impl std::error::Error for MapConfigError {}

impl MapConfig {
    /// Reads, validates and resolves credentials using [`tianditu_key`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MapConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| MapConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text, &tianditu_key())
    }

    pub fn from_json_str(text: &str, tianditu_key: &str) -> Result<Self, MapConfigError> {
        let mut config: MapConfig = serde_json::from_str(text).map_err(MapConfigError::Parse)?;
        if config.tile_layers.is_empty() {
            return Err(MapConfigError::NoTileLayers);
        }
        if config.min_zoom > config.max_zoom {
            return Err(MapConfigError::InvalidZoomRange {
                min: config.min_zoom,
                max: config.max_zoom,
            });
        }
        config.substitute_key(tianditu_key);
        Ok(config)
    }

    pub fn substitute_key(&mut self, key: &str) {
        for (_, layer) in &mut self.tile_layers {
            if layer.url.contains(TIANDITU_KEY_PLACEHOLDER) {
                layer.url = layer.url.replace(TIANDITU_KEY_PLACEHOLDER, key);
            }
        }
    }

    pub fn tile_layer(&self, id: &str) -> Option<&TileLayerConfig> {
        self.tile_layers
            .iter()
            .find(|(layer_id, _)| layer_id == id)
            .map(|(_, layer)| layer)
    }

    /// First layer marked `visible`, else the first layer in file order.
    pub fn default_tile_layer(&self) -> Option<(&str, &TileLayerConfig)> {
        self.tile_layers
            .iter()
            .find(|(_, layer)| layer.visible)
            .or_else(|| self.tile_layers.first())
            .map(|(id, layer)| (id.as_str(), layer))
    }

    /// Icon by id, falling back to `default`, then to the stock icon.
    pub fn icon(&self, id: &str) -> IconConfig {
        self.icons
            .get(id)
            .or_else(|| self.icons.get("default"))
            .cloned()
            .unwrap_or_else(IconConfig::stock)
    }
}

/// (De)serializes a JSON object as an ordered list of entries.
mod ordered_entries {
    use std::fmt;
    use std::marker::PhantomData;

    use serde::de::{DeserializeOwned, MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serialize, Serializer};

    pub fn serialize<S, V>(entries: &[(String, V)], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        V: Serialize,
    {
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (k, v) in entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D, V>(deserializer: D) -> Result<Vec<(String, V)>, D::Error>
    where
        D: Deserializer<'de>,
        V: DeserializeOwned,
    {
        struct EntriesVisitor<V>(PhantomData<V>);

        impl<'de, V: DeserializeOwned> Visitor<'de> for EntriesVisitor<V> {
            type Value = Vec<(String, V)>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object of named entries")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut out: Vec<(String, V)> = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((k, v)) = access.next_entry::<String, V>()? {
                    if let Some(slot) = out.iter_mut().find(|(existing, _)| *existing == k) {
                        slot.1 = v;
                    } else {
                        out.push((k, v));
                    }
                }
                Ok(out)
            }
        }

        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;

    use super::*;

    const SAMPLE: &str = r#"{
        "defaultCenter": [39.9, 116.4],
        "defaultZoom": 10,
        "minZoom": 3,
        "maxZoom": 18,
        "tileLayers": {
            "tdt_img": {
                "name": "天地图影像",
                "url": "http://t{s}.tianditu.gov.cn/img_w/wmts?LAYER=img&tk={tianditu_key}",
                "attribution": "天地图",
                "maxZoom": 18,
                "subdomains": ["0", "1", "2"],
                "visible": false
            },
            "osm": {
                "name": "OpenStreetMap",
                "url": "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png",
                "attribution": "© OpenStreetMap contributors",
                "maxZoom": 19,
                "subdomains": "abc",
                "visible": true
            },
            "baidu": {
                "name": "百度地图",
                "url": "http://online{s}.map.bdimg.com/onlinelabel/?qt=tile&x={x}&y={y}&z={z}",
                "maxZoom": 18,
                "visible": true
            }
        },
        "icons": {
            "default": {
                "iconUrl": "/icons/pin.png",
                "iconRetinaUrl": "/icons/pin@2x.png",
                "shadowUrl": "/icons/shadow.png",
                "iconSize": [25, 41],
                "iconAnchor": [12, 41],
                "popupAnchor": [1, -34],
                "shadowSize": [41, 41]
            }
        }
    }"#;

    #[test]
    fn keeps_file_order_and_picks_first_visible() {
        let config = MapConfig::from_json_str(SAMPLE, "KEY").unwrap();
        let ids: Vec<&str> = config.tile_layers.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["tdt_img", "osm", "baidu"]);
        let (id, layer) = config.default_tile_layer().unwrap();
        assert_eq!(id, "osm");
        assert_eq!(layer.subdomain_list(), vec!["a", "b", "c"]);
    }

    #[test]
    fn falls_back_to_first_layer_when_none_visible() {
        let mut config = MapConfig::from_json_str(SAMPLE, "KEY").unwrap();
        for (_, layer) in &mut config.tile_layers {
            layer.visible = false;
        }
        assert_eq!(config.default_tile_layer().unwrap().0, "tdt_img");
    }

    #[test]
    fn substitutes_tianditu_key() {
        let config = MapConfig::from_json_str(SAMPLE, "KEY").unwrap();
        let layer = config.tile_layer("tdt_img").unwrap();
        assert!(layer.url.ends_with("tk=KEY"));
        assert!(!layer.url.contains(TIANDITU_KEY_PLACEHOLDER));
    }

    #[test]
    fn icon_lookup_falls_back() {
        let config = MapConfig::from_json_str(SAMPLE, "KEY").unwrap();
        assert_eq!(config.icon("missing").icon_url, "/icons/pin.png");
        let mut bare = config.clone();
        bare.icons.clear();
        assert_eq!(bare.icon("default"), IconConfig::stock());
    }

    #[test]
    fn rejects_inverted_zoom_range_and_empty_layers() {
        let inverted = SAMPLE.replace("\"minZoom\": 3", "\"minZoom\": 19");
        assert!(matches!(
            MapConfig::from_json_str(&inverted, "K"),
            Err(MapConfigError::InvalidZoomRange { min: 19, max: 18 })
        ));
        let empty = r#"{"defaultCenter": [0, 0], "defaultZoom": 1, "minZoom": 0, "maxZoom": 5, "tileLayers": {}}"#;
        assert!(matches!(
            MapConfig::from_json_str(empty, "K"),
            Err(MapConfigError::NoTileLayers)
        ));
    }

    #[test]
    fn loads_from_disk_and_round_trips() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let config = MapConfig::load(file.path()).unwrap();
        assert_eq!(config.default_center, [39.9, 116.4]);

        let text = serde_json::to_string(&config).unwrap();
        let again = MapConfig::from_json_str(&text, "unused").unwrap();
        assert_eq!(again, config);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = MapConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, MapConfigError::Io { .. }));
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }
}
