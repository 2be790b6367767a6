//! Label overlays drawn above imagery and vector base layers.

use formats::map_config::{TIANDITU_KEY_PLACEHOLDER, TileLayerConfig, tianditu_key};
use streaming::baidu::{BAIDU_IMAGERY_ANNOTATION_URL, BAIDU_SUBDOMAINS};
use streaming::source::TileSource;

use crate::config::DEFAULT_SUBDOMAINS;

/// Registry id the overlay is stored under.
pub const ANNOTATION_LAYER_ID: &str = "annotation";

pub const AUTONAVI_ANNOTATION_URL: &str =
    "https://webst0{s}.is.autonavi.com/appmaptile?style=8&x={x}&y={y}&z={z}";

/// Imagery, satellite and vector base maps get a label overlay.
pub fn needs_annotation(layer: &TileLayerConfig) -> bool {
    ["影像", "卫星", "矢量"].iter().any(|k| layer.name.contains(k))
        || ["img_w", "vec_w", "style=6", "vtile"]
            .iter()
            .any(|k| layer.url.contains(k))
}

/// Label tile URL matching a base layer URL, if the provider has one.
pub fn annotation_url(url: &str) -> Option<String> {
    if url.contains("tianditu.gov.cn/img_w") {
        Some(url.replacen("/img_w/", "/cia_w/", 1).replacen("LAYER=img", "LAYER=cia", 1))
    } else if url.contains("tianditu.gov.cn/vec_w") {
        Some(url.replacen("/vec_w/", "/cva_w/", 1).replacen("LAYER=vec", "LAYER=cva", 1))
    } else if url.contains("autonavi.com") && url.contains("style=6") {
        Some(AUTONAVI_ANNOTATION_URL.to_string())
    } else if url.contains("bdimg.com") {
        Some(BAIDU_IMAGERY_ANNOTATION_URL.to_string())
    } else {
        None
    }
}

/// The overlay tile source for `layer`, sharing its attribution, max zoom
/// and subdomains.
pub fn annotation_source(layer: &TileLayerConfig) -> Option<TileSource> {
    if !needs_annotation(layer) {
        return None;
    }
    let mut url = annotation_url(&layer.url)?;
    if url.contains(TIANDITU_KEY_PLACEHOLDER) {
        url = url.replace(TIANDITU_KEY_PLACEHOLDER, &tianditu_key());
    }

    let fallback_subdomains = if url == BAIDU_IMAGERY_ANNOTATION_URL {
        BAIDU_SUBDOMAINS
    } else {
        DEFAULT_SUBDOMAINS
    };
    let mut src = TileSource::new(url)
        .with_zoom_range(0, layer.max_zoom)
        .with_attribution(layer.attribution.clone())
        .with_subdomains(fallback_subdomains);
    if layer.subdomains.is_some() {
        src.subdomains = layer.subdomain_list();
    }
    Some(src)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use streaming::tile::TileCoord;

    use super::*;

    fn layer(name: &str, url: &str) -> TileLayerConfig {
        serde_json::from_value(serde_json::json!({
            "name": name, "url": url, "attribution": "© src", "maxZoom": 17
        }))
        .unwrap()
    }

    #[test]
    fn tianditu_imagery_maps_to_cia() {
        let base = layer(
            "天地图影像",
            "https://t{s}.tianditu.gov.cn/img_w/wmts?LAYER=img&tk=abc&TILEMATRIX={z}&TILEROW={y}&TILECOL={x}",
        );
        let src = annotation_source(&base).unwrap();
        assert_eq!(
            src.url_template,
            "https://t{s}.tianditu.gov.cn/cia_w/wmts?LAYER=cia&tk=abc&TILEMATRIX={z}&TILEROW={y}&TILECOL={x}"
        );
        assert_eq!(src.max_zoom, 17);
        assert_eq!(src.attribution, "© src");
    }

    #[test]
    fn tianditu_vector_maps_to_cva() {
        let url = annotation_url("https://t0.tianditu.gov.cn/vec_w/wmts?LAYER=vec").unwrap();
        assert_eq!(url, "https://t0.tianditu.gov.cn/cva_w/wmts?LAYER=cva");
    }

    #[test]
    fn autonavi_satellite_uses_style_eight() {
        let mut base = layer(
            "高德卫星",
            "https://webst0{s}.is.autonavi.com/appmaptile?style=6&x={x}&y={y}&z={z}",
        );
        base.subdomains = Some(formats::map_config::SubdomainSpec::Chars("1234".into()));
        let src = annotation_source(&base).unwrap();
        assert_eq!(src.url_template, AUTONAVI_ANNOTATION_URL);
        assert_eq!(src.subdomains, vec!["1", "2", "3", "4"]);
        assert_eq!(
            src.tile_url(TileCoord::new(3, 1, 1)).unwrap(),
            "https://webst03.is.autonavi.com/appmaptile?style=8&x=1&y=1&z=3"
        );
    }

    #[test]
    fn baidu_imagery_gets_its_label_tiles() {
        let base = layer("百度影像", "http://shangetu{s}.map.bdimg.com/it/u=x={x};y={y};z={z}");
        let src = annotation_source(&base).unwrap();
        assert_eq!(src.url_template, BAIDU_IMAGERY_ANNOTATION_URL);
        assert_eq!(src.subdomains.len(), 10);
    }

    #[test]
    fn plain_street_maps_get_nothing() {
        let osm = layer("OpenStreetMap", "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png");
        assert!(!needs_annotation(&osm));
        assert_eq!(annotation_source(&osm), None);

        let named_only = layer("某矢量底图", "https://example.com/{z}/{x}/{y}.png");
        assert!(needs_annotation(&named_only));
        assert_eq!(annotation_source(&named_only), None);
    }
}
