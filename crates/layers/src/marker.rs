use serde::{Deserialize, Serialize};

use foundation::geo::LatLng;
use formats::map_config::IconConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerConfig {
    /// `[lat, lng]`.
    pub position: [f64; 2],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popup: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<IconConfig>,
    #[serde(default)]
    pub draggable: bool,
}

impl MarkerConfig {
    pub fn at(position: LatLng) -> Self {
        Self {
            position: [position.lat, position.lng],
            title: None,
            popup: None,
            icon: None,
            draggable: false,
        }
    }

    pub fn titled(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn latlng(&self) -> LatLng {
        LatLng::new(self.position[0], self.position[1])
    }
}

/// A placed marker with its icon resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub position: LatLng,
    pub title: Option<String>,
    pub popup: Option<String>,
    pub icon: IconConfig,
    pub draggable: bool,
}

impl Marker {
    /// Uses `fallback_icon` when the config brings none.
    pub fn from_config(config: MarkerConfig, fallback_icon: IconConfig) -> Self {
        Self {
            position: config.latlng(),
            title: config.title,
            popup: config.popup,
            icon: config.icon.unwrap_or(fallback_icon),
            draggable: config.draggable,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn missing_icon_takes_the_fallback() {
        let cfg: MarkerConfig =
            serde_json::from_str(r#"{"position": [39.9, 116.4], "title": "天安门"}"#).unwrap();
        let marker = Marker::from_config(cfg, IconConfig::stock());
        assert_eq!(marker.position, LatLng::new(39.9, 116.4));
        assert_eq!(marker.title.as_deref(), Some("天安门"));
        assert_eq!(marker.icon.icon_size, [25, 41]);
        assert!(!marker.draggable);
    }
}
