//! Baidu Maps tile endpoints.
//!
//! Every Baidu layer counts rows from the bottom of its grid, so the sources
//! built here always have `tms` set.

use serde::{Deserialize, Serialize};

use foundation::time::Timestamp;

use crate::source::{TileSource, split_subdomains};

pub const BAIDU_SUBDOMAINS: &str = "0123456789";
pub const BAIDU_CUSTOM_SUBDOMAINS: &str = "012";
pub const BAIDU_DEFAULT_ATTRIBUTION: &str = "© 百度地图";
pub const BAIDU_DEFAULT_CUSTOM_STYLE: &str = "midnight";

/// Satellite annotation overlay paired with Baidu imagery base layers.
pub const BAIDU_IMAGERY_ANNOTATION_URL: &str =
    "http://online{s}.map.bdimg.com/tile/?qt=tile&x={x}&y={y}&z={z}&styles=sl&udt=20190507";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaiduKind {
    /// Street map.
    #[default]
    Vec,
    /// Satellite imagery without labels.
    ImgD,
    /// Labels drawn over imagery.
    ImgZ,
    /// Styled street map (`customid`).
    Custom,
    /// Live traffic.
    Time,
    /// Imagery plus labels, as a two-layer group.
    Img,
}

impl BaiduKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BaiduKind::Vec => "vec",
            BaiduKind::ImgD => "img_d",
            BaiduKind::ImgZ => "img_z",
            BaiduKind::Custom => "custom",
            BaiduKind::Time => "time",
            BaiduKind::Img => "img",
        }
    }
}

impl std::str::FromStr for BaiduKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vec" => Ok(BaiduKind::Vec),
            "img_d" => Ok(BaiduKind::ImgD),
            "img_z" => Ok(BaiduKind::ImgZ),
            "custom" => Ok(BaiduKind::Custom),
            "time" => Ok(BaiduKind::Time),
            "img" => Ok(BaiduKind::Img),
            other => Err(format!(
                "unknown baidu layer kind {other:?} (expected vec, img_d, img_z, custom, time or img)"
            )),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BaiduLayerOptions {
    #[serde(default)]
    pub kind: BaiduKind,
    /// Used as the attribution when set.
    #[serde(default)]
    pub name: Option<String>,
    /// Large-label style variants (`ph`, `sh`).
    #[serde(default)]
    pub bigfont: bool,
    #[serde(default)]
    pub customid: Option<String>,
}

impl BaiduLayerOptions {
    pub fn new(kind: BaiduKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BaiduLayer {
    Single(TileSource),
    Group(Vec<TileSource>),
}

impl BaiduLayer {
    pub fn sources(&self) -> &[TileSource] {
        match self {
            BaiduLayer::Single(src) => std::slice::from_ref(src),
            BaiduLayer::Group(srcs) => srcs,
        }
    }
}

fn baidu_source(url: String, subdomains: &str, opts: &BaiduLayerOptions) -> TileSource {
    let attribution = opts
        .name
        .clone()
        .unwrap_or_else(|| BAIDU_DEFAULT_ATTRIBUTION.to_string());
    let mut src = TileSource::new(url).with_tms(true).with_attribution(attribution);
    src.subdomains = split_subdomains(subdomains);
    src
}

/// Builds the tile source(s) for a Baidu layer kind. `now` stamps the
/// traffic layer URL.
pub fn create_layer(opts: &BaiduLayerOptions, now: Timestamp) -> BaiduLayer {
    match opts.kind {
        BaiduKind::Vec => {
            let style = if opts.bigfont { "ph" } else { "pl" };
            BaiduLayer::Single(baidu_source(
                format!(
                    "http://online{{s}}.map.bdimg.com/onlinelabel/?qt=tile&x={{x}}&y={{y}}&z={{z}}&styles={style}&scaler=1&p=1"
                ),
                BAIDU_SUBDOMAINS,
                opts,
            ))
        }
        BaiduKind::ImgD => BaiduLayer::Single(baidu_source(
            "http://shangetu{s}.map.bdimg.com/it/u=x={x};y={y};z={z};v=009;type=sate&fm=46".to_string(),
            BAIDU_SUBDOMAINS,
            opts,
        )),
        BaiduKind::ImgZ => {
            let style = if opts.bigfont { "sh" } else { "sl" };
            BaiduLayer::Single(baidu_source(
                format!(
                    "http://online{{s}}.map.bdimg.com/tile/?qt=tile&x={{x}}&y={{y}}&z={{z}}&styles={style}&v=020"
                ),
                BAIDU_SUBDOMAINS,
                opts,
            ))
        }
        BaiduKind::Custom => {
            let customid = opts
                .customid
                .as_deref()
                .unwrap_or(BAIDU_DEFAULT_CUSTOM_STYLE);
            BaiduLayer::Single(baidu_source(
                format!(
                    "http://api{{s}}.map.bdimg.com/customimage/tile?&x={{x}}&y={{y}}&z={{z}}&scale=1&customid={customid}"
                ),
                BAIDU_CUSTOM_SUBDOMAINS,
                opts,
            ))
        }
        BaiduKind::Time => BaiduLayer::Single(baidu_source(
            format!(
                "http://its.map.baidu.com:8002/traffic/TrafficTileService?x={{x}}&y={{y}}&level={{z}}&time={}&label=web2D&v=017",
                now.millis()
            ),
            BAIDU_SUBDOMAINS,
            opts,
        )),
        BaiduKind::Img => {
            let part = |kind, name: &str| BaiduLayerOptions {
                kind,
                name: Some(name.to_string()),
                bigfont: opts.bigfont,
                customid: None,
            };
            let base = create_layer(&part(BaiduKind::ImgD, "影像底图"), now);
            let labels = create_layer(&part(BaiduKind::ImgZ, "影像注记"), now);
            BaiduLayer::Group(
                base.sources()
                    .iter()
                    .chain(labels.sources())
                    .cloned()
                    .collect(),
            )
        }
    }
}

/// Whether a configured tile layer points at Baidu.
pub fn is_baidu_layer(name: &str, url: &str) -> bool {
    name.contains("百度") || url.contains("bdimg.com")
}

/// Baidu kind to use for a configured layer: imagery when the name or URL
/// says so, the street map otherwise.
pub fn detect_kind(name: &str, url: &str) -> BaiduKind {
    if name.contains("影像") || url.contains("shangetu") {
        BaiduKind::Img
    } else {
        BaiduKind::Vec
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::TileCoord;

    #[test]
    fn vec_layer_flips_rows_and_rotates_subdomains() {
        let layer = create_layer(&BaiduLayerOptions::default(), Timestamp(0));
        let BaiduLayer::Single(src) = layer else {
            panic!("vec should be a single source");
        };
        assert!(src.tms);
        assert_eq!(src.subdomains.len(), 10);
        assert_eq!(src.attribution, BAIDU_DEFAULT_ATTRIBUTION);
        assert_eq!(
            src.tile_url(TileCoord::new(3, 1, 2)).unwrap(),
            "http://online3.map.bdimg.com/onlinelabel/?qt=tile&x=1&y=5&z=3&styles=pl&scaler=1&p=1"
        );
    }

    #[test]
    fn bigfont_switches_styles() {
        let mut opts = BaiduLayerOptions::new(BaiduKind::ImgZ);
        opts.bigfont = true;
        let layer = create_layer(&opts, Timestamp(0));
        assert!(layer.sources()[0].url_template.contains("styles=sh"));
    }

    #[test]
    fn custom_defaults_to_midnight_on_three_hosts() {
        let layer = create_layer(&BaiduLayerOptions::new(BaiduKind::Custom).named("夜间"), Timestamp(0));
        let src = &layer.sources()[0];
        assert!(src.url_template.ends_with("customid=midnight"));
        assert_eq!(src.subdomains, vec!["0", "1", "2"]);
        assert_eq!(src.attribution, "夜间");
    }

    #[test]
    fn traffic_url_carries_timestamp() {
        let layer = create_layer(&BaiduLayerOptions::new(BaiduKind::Time), Timestamp(1_700_000_000_000));
        let url = layer.sources()[0].tile_url(TileCoord::new(0, 0, 0)).unwrap();
        assert!(url.contains("level=0&time=1700000000000&label=web2D"), "{url}");
    }

    #[test]
    fn img_is_base_plus_labels() {
        let layer = create_layer(&BaiduLayerOptions::new(BaiduKind::Img), Timestamp(0));
        let BaiduLayer::Group(parts) = &layer else {
            panic!("img should be a group");
        };
        assert_eq!(parts.len(), 2);
        assert!(parts[0].url_template.contains("shangetu"));
        assert_eq!(parts[0].attribution, "影像底图");
        assert!(parts[1].url_template.contains("styles=sl"));
        assert_eq!(parts[1].attribution, "影像注记");
    }

    #[test]
    fn detection_rules() {
        assert!(is_baidu_layer("百度地图", "http://x"));
        assert!(is_baidu_layer("streets", "http://online1.map.bdimg.com/x"));
        assert!(!is_baidu_layer("OSM", "https://tile.openstreetmap.org"));
        assert_eq!(detect_kind("百度影像", ""), BaiduKind::Img);
        assert_eq!(detect_kind("", "http://shangetu1.map.bdimg.com"), BaiduKind::Img);
        assert_eq!(detect_kind("百度地图", "http://online1.map.bdimg.com"), BaiduKind::Vec);
    }

    #[test]
    fn kind_parsing() {
        assert_eq!("img_d".parse::<BaiduKind>().unwrap(), BaiduKind::ImgD);
        assert!("sat".parse::<BaiduKind>().is_err());
    }
}
