use compute::analysis::SpatialAnalysis;
use compute::measure::{UnitLabels, line_midpoint, vertex_centroid};
use formats::drawing_feature::{DrawingFeature, to_feature};
use foundation::bounds::LatLngBounds;
use foundation::geo::LatLng;
use foundation::ids::DrawingId;
use foundation::shape::{DrawnShape, Shape};

use crate::style::{PathStyle, finished_style};

#[derive(Debug, Clone, PartialEq)]
pub struct GroupedDrawing {
    pub drawing: DrawnShape,
    pub style: PathStyle,
    /// ISO-8601 instant the drawing was finished (or its imported `createdAt`).
    pub created_at: String,
}

/// Text label pinned to a measurement drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasureLabel {
    pub drawing_id: DrawingId,
    pub at: LatLng,
    pub text: String,
}

/// Layer group holding every committed drawing. Ids are unique: adding a
/// drawing under an existing id replaces the old one and its label.
#[derive(Debug, Clone, Default)]
pub struct DrawingGroup {
    drawings: Vec<GroupedDrawing>,
    labels: Vec<MeasureLabel>,
}

impl DrawingGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, drawing: DrawnShape, created_at: impl Into<String>) {
        let style = finished_style(&drawing.drawing_type);
        self.add_styled(drawing, style, created_at);
    }

    /// Adds `drawing` with an explicit style instead of its mode's palette.
    pub fn add_styled(&mut self, drawing: DrawnShape, style: PathStyle, created_at: impl Into<String>) {
        self.remove(&drawing.id);
        self.drawings.push(GroupedDrawing {
            drawing,
            style,
            created_at: created_at.into(),
        });
    }

    /// Pins `text` to the drawing: line midpoint vertex for lines, vertex
    /// centroid for polygons. Other shapes get no label.
    pub fn add_measure_label(&mut self, drawing: &DrawnShape, text: impl Into<String>) {
        let at = match &drawing.shape {
            Shape::Line(points) => line_midpoint(points),
            Shape::Polygon(points) => vertex_centroid(points),
            _ => return,
        };
        self.labels.push(MeasureLabel {
            drawing_id: drawing.id.clone(),
            at,
            text: text.into(),
        });
    }

    pub fn remove(&mut self, id: &DrawingId) -> bool {
        let before = self.drawings.len();
        self.drawings.retain(|d| &d.drawing.id != id);
        self.labels.retain(|l| &l.drawing_id != id);
        self.drawings.len() != before
    }

    pub fn get(&self, id: &DrawingId) -> Option<&GroupedDrawing> {
        self.drawings.iter().find(|d| &d.drawing.id == id)
    }

    pub fn drawings(&self) -> &[GroupedDrawing] {
        &self.drawings
    }

    pub fn labels(&self) -> &[MeasureLabel] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.drawings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drawings.is_empty()
    }

    pub fn clear(&mut self) {
        self.drawings.clear();
        self.labels.clear();
    }

    pub fn bounds(&self) -> Option<LatLngBounds> {
        SpatialAnalysis::union_bounds(self.drawings.iter().filter_map(|d| d.drawing.shape.bounds()))
    }

    /// Features in insertion order.
    pub fn export(&self, labels: UnitLabels) -> Vec<DrawingFeature> {
        self.drawings
            .iter()
            .map(|d| to_feature(&d.drawing, &d.created_at, labels))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{FINISHED_COLOR, MEASURE_COLOR};

    fn line(id: &str, mode: &str) -> DrawnShape {
        DrawnShape::new(
            DrawingId::new(id),
            Shape::Line(vec![
                LatLng::new(0.0, 0.0),
                LatLng::new(0.0, 1.0),
                LatLng::new(0.0, 2.0),
            ]),
            mode,
        )
    }

    #[test]
    fn same_id_replaces_drawing_and_label() {
        let mut group = DrawingGroup::new();
        let d = line("drawing_1_0", "measure-distance");
        group.add(d.clone(), "2023-11-14T22:13:20.000Z");
        group.add_measure_label(&d, "222.39 km");
        assert_eq!(group.labels()[0].at, LatLng::new(0.0, 1.0));
        assert_eq!(group.drawings()[0].style.color, MEASURE_COLOR);

        group.add(line("drawing_1_0", "line"), "2023-11-14T22:13:21.000Z");
        assert_eq!(group.len(), 1);
        assert!(group.labels().is_empty());
        assert_eq!(group.drawings()[0].style.color, FINISHED_COLOR);
    }

    #[test]
    fn export_keeps_insertion_order_and_timestamps() {
        let mut group = DrawingGroup::new();
        group.add(line("drawing_2_5", "line"), "b");
        group.add(line("drawing_1_9", "line"), "a");
        let features = group.export(UnitLabels::Symbols);
        let ids: Vec<&str> = features.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["drawing_2_5", "drawing_1_9"]);
        assert_eq!(features[0].properties.created_at, "b");
        let b = group.bounds().unwrap();
        assert_eq!(b.east(), 2.0);
    }

    #[test]
    fn points_get_no_measure_label() {
        let mut group = DrawingGroup::new();
        let p = DrawnShape::new(DrawingId::new("p"), Shape::Point(LatLng::new(1.0, 1.0)), "point");
        group.add_measure_label(&p, "x");
        assert!(group.labels().is_empty());
        assert!(!group.remove(&DrawingId::new("missing")));
    }
}
