//! The rendering seam between a [`crate::MapSession`] and whatever draws it.

use foundation::geo::LatLng;

/// Something a session can put on the map.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SurfaceItem {
    Layer(String),
    Marker(String),
    Heatmap(String),
    /// The shared group holding finished drawings.
    Drawings,
}

pub trait RenderSurface {
    fn attach(&mut self, item: SurfaceItem);
    /// Returns false when the item was not attached.
    fn detach(&mut self, item: &SurfaceItem) -> bool;
    fn contains(&self, item: &SurfaceItem) -> bool;
    fn set_view(&mut self, center: LatLng, zoom: u8);
    fn set_crs(&mut self, code: &str);
    fn clear(&mut self);
}

/// Headless surface that records what is attached, in attach order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InMemorySurface {
    items: Vec<SurfaceItem>,
    view: Option<(LatLng, u8)>,
    crs: Option<String>,
}

impl InMemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[SurfaceItem] {
        &self.items
    }

    pub fn view(&self) -> Option<(LatLng, u8)> {
        self.view
    }

    pub fn crs(&self) -> Option<&str> {
        self.crs.as_deref()
    }

    pub fn layer_ids(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter_map(|item| match item {
                SurfaceItem::Layer(id) => Some(id.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl RenderSurface for InMemorySurface {
    fn attach(&mut self, item: SurfaceItem) {
        if !self.items.contains(&item) {
            self.items.push(item);
        }
    }

    fn detach(&mut self, item: &SurfaceItem) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i != item);
        self.items.len() != before
    }

    fn contains(&self, item: &SurfaceItem) -> bool {
        self.items.contains(item)
    }

    fn set_view(&mut self, center: LatLng, zoom: u8) {
        self.view = Some((center, zoom));
    }

    fn set_crs(&mut self, code: &str) {
        self.crs = Some(code.to_string());
    }

    fn clear(&mut self) {
        self.items.clear();
    }
}
