use foundation::geo::LatLng;
use foundation::shape::Shape;

use crate::style::PathStyle;

/// Transient layer shown while a shape is being drawn.
#[derive(Debug, Clone, PartialEq)]
pub enum TempLayer {
    /// Marker on a committed vertex.
    Vertex { at: LatLng, style: PathStyle },
    /// Dashed outline from the committed vertices to the cursor.
    Preview { shape: Shape, style: PathStyle },
    /// Live measurement readout following the cursor.
    Tooltip { at: LatLng, text: String },
}

/// Ordered set of temporary layers. At most one preview and one tooltip
/// exist at a time; vertex markers accumulate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TempLayers {
    layers: Vec<TempLayer>,
}

impl TempLayers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_vertex(&mut self, at: LatLng, style: PathStyle) {
        self.layers.push(TempLayer::Vertex { at, style });
    }

    /// Replaces the current preview, keeping vertex markers and tooltip.
    pub fn set_preview(&mut self, shape: Shape, style: PathStyle) {
        self.clear_previews();
        self.layers.push(TempLayer::Preview { shape, style });
    }

    pub fn set_tooltip(&mut self, at: LatLng, text: impl Into<String>) {
        self.layers.retain(|l| !matches!(l, TempLayer::Tooltip { .. }));
        self.layers.push(TempLayer::Tooltip {
            at,
            text: text.into(),
        });
    }

    pub fn clear_previews(&mut self) {
        self.layers.retain(|l| !matches!(l, TempLayer::Preview { .. }));
    }

    pub fn clear(&mut self) {
        self.layers.clear();
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TempLayer> {
        self.layers.iter()
    }

    pub fn preview(&self) -> Option<&Shape> {
        self.layers.iter().find_map(|l| match l {
            TempLayer::Preview { shape, .. } => Some(shape),
            _ => None,
        })
    }

    pub fn tooltip(&self) -> Option<&str> {
        self.layers.iter().find_map(|l| match l {
            TempLayer::Tooltip { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn vertex_count(&self) -> usize {
        self.layers
            .iter()
            .filter(|l| matches!(l, TempLayer::Vertex { .. }))
            .count()
    }
}
