use formats::vector_chunk::VectorChunk;
use streaming::ogc::OgcTileSource;
use streaming::source::{TileSource, TileUrlError};
use streaming::tile::TileCoord;

/// Renderable content of a registered layer.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerData {
    /// One or more stacked raster sources (a Baidu imagery group has two).
    Tiles(Vec<TileSource>),
    Ogc(OgcTileSource),
    Features(VectorChunk),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub name: String,
    pub data: LayerData,
}

impl Layer {
    pub fn tiles(name: impl Into<String>, source: TileSource) -> Self {
        Self {
            name: name.into(),
            data: LayerData::Tiles(vec![source]),
        }
    }

    pub fn tile_group(name: impl Into<String>, sources: Vec<TileSource>) -> Self {
        Self {
            name: name.into(),
            data: LayerData::Tiles(sources),
        }
    }

    pub fn ogc(name: impl Into<String>, source: OgcTileSource) -> Self {
        Self {
            name: name.into(),
            data: LayerData::Ogc(source),
        }
    }

    pub fn features(name: impl Into<String>, chunk: VectorChunk) -> Self {
        Self {
            name: name.into(),
            data: LayerData::Features(chunk),
        }
    }

    pub fn is_raster(&self) -> bool {
        !matches!(self.data, LayerData::Features(_))
    }

    pub fn kind_name(&self) -> &'static str {
        match &self.data {
            LayerData::Tiles(sources) if sources.len() > 1 => "tile-group",
            LayerData::Tiles(_) => "tiles",
            LayerData::Ogc(_) => "ogc",
            LayerData::Features(_) => "features",
        }
    }

    pub fn tile_sources(&self) -> &[TileSource] {
        match &self.data {
            LayerData::Tiles(sources) => sources,
            _ => &[],
        }
    }

    pub fn feature_count(&self) -> usize {
        match &self.data {
            LayerData::Features(chunk) => chunk.len(),
            _ => 0,
        }
    }

    /// Request URLs for one tile address, one per stacked source.
    pub fn tile_urls(&self, coord: TileCoord) -> Result<Vec<String>, TileUrlError> {
        match &self.data {
            LayerData::Tiles(sources) => sources.iter().map(|s| s.tile_url(coord)).collect(),
            LayerData::Ogc(source) => Ok(vec![source.tile_url(coord)?]),
            LayerData::Features(_) => Ok(Vec::new()),
        }
    }
}
