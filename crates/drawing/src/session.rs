use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use compute::measure::{UnitLabels, area_label, distance_label};
use formats::drawing_feature::{DrawingFeature, from_feature, to_feature};
use foundation::bounds::LatLngBounds;
use foundation::geo::LatLng;
use foundation::ids::DrawingIdSequence;
use foundation::math::geodesy::haversine_m;
use foundation::shape::{DrawnShape, Shape};
use runtime::clock::{Clock, iso8601};
use runtime::event_bus::{Event, EventBus};

use crate::group::DrawingGroup;
use crate::mode::{Cursor, DrawingMode, PointerEvent, PointerKind, PointerSubscriptions};
use crate::preview::TempLayers;
use crate::style::{DrawOptions, finished_style, preview_style, vertex_style};

/// Lifecycle notifications, also recorded on the session's event bus.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawingEvent {
    Started(DrawingMode),
    Finished {
        feature: DrawingFeature,
        mode: DrawingMode,
    },
    Cancelled(DrawingMode),
}

pub type ModeHook = Box<dyn FnMut(DrawingMode)>;
pub type EndHook = Box<dyn FnMut(&DrawnShape, &DrawingFeature, DrawingMode)>;

#[derive(Default)]
pub struct DrawingCallbacks {
    pub on_draw_start: Option<ModeHook>,
    pub on_draw_end: Option<EndHook>,
    pub on_draw_cancel: Option<ModeHook>,
}

impl std::fmt::Debug for DrawingCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawingCallbacks")
            .field("on_draw_start", &self.on_draw_start.is_some())
            .field("on_draw_end", &self.on_draw_end.is_some())
            .field("on_draw_cancel", &self.on_draw_cancel.is_some())
            .finish()
    }
}

/// Turns pointer events into finished drawings.
///
/// A mode stays active across shapes until [`DrawingSession::stop`] or another
/// [`DrawingSession::start`]. Committed vertices and temporary layers are
/// cleared whenever a shape finishes or the mode changes.
pub struct DrawingSession {
    mode: DrawingMode,
    vertices: Vec<LatLng>,
    temp: TempLayers,
    ids: DrawingIdSequence,
    group: DrawingGroup,
    unit_labels: UnitLabels,
    clock: Arc<dyn Clock>,
    callbacks: DrawingCallbacks,
    events: EventBus<DrawingEvent>,
}

impl std::fmt::Debug for DrawingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawingSession")
            .field("mode", &self.mode)
            .field("vertices", &self.vertices)
            .field("temp", &self.temp.len())
            .field("drawings", &self.group.len())
            .field("callbacks", &self.callbacks)
            .finish()
    }
}

impl DrawingSession {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            mode: DrawingMode::None,
            vertices: Vec::new(),
            temp: TempLayers::new(),
            ids: DrawingIdSequence::new(),
            group: DrawingGroup::new(),
            unit_labels: UnitLabels::default(),
            clock,
            callbacks: DrawingCallbacks::default(),
            events: EventBus::new(),
        }
    }

    pub fn with_unit_labels(mut self, unit_labels: UnitLabels) -> Self {
        self.unit_labels = unit_labels;
        self
    }

    pub fn set_callbacks(&mut self, callbacks: DrawingCallbacks) {
        self.callbacks = callbacks;
    }

    pub fn mode(&self) -> DrawingMode {
        self.mode
    }

    pub fn cursor(&self) -> Cursor {
        self.mode.cursor()
    }

    pub fn subscriptions(&self) -> PointerSubscriptions {
        self.mode.subscriptions()
    }

    pub fn vertices(&self) -> &[LatLng] {
        &self.vertices
    }

    pub fn temp_layers(&self) -> &TempLayers {
        &self.temp
    }

    pub fn group(&self) -> &DrawingGroup {
        &self.group
    }

    pub fn unit_labels(&self) -> UnitLabels {
        self.unit_labels
    }

    pub fn events(&self) -> &[Event<DrawingEvent>] {
        self.events.events()
    }

    pub fn drain_events(&mut self) -> Vec<Event<DrawingEvent>> {
        self.events.drain()
    }

    /// Enters `mode`, stopping the current one first. Returns the pointer
    /// events the new mode listens to.
    pub fn start(&mut self, mode: DrawingMode) -> PointerSubscriptions {
        self.stop();
        if !mode.is_active() {
            return PointerSubscriptions::NONE;
        }
        self.mode = mode;
        info!("drawing mode {mode} started");
        self.events.emit(DrawingEvent::Started(mode));
        if let Some(hook) = self.callbacks.on_draw_start.as_mut() {
            hook(mode);
        }
        mode.subscriptions()
    }

    /// Leaves the active mode, discarding the shape in progress. No-op (and
    /// no cancel notification) when nothing is active.
    pub fn stop(&mut self) -> bool {
        if !self.mode.is_active() {
            return false;
        }
        let previous = self.mode;
        self.mode = DrawingMode::None;
        self.reset();
        info!("drawing mode {previous} stopped");
        self.events.emit(DrawingEvent::Cancelled(previous));
        if let Some(hook) = self.callbacks.on_draw_cancel.as_mut() {
            hook(previous);
        }
        true
    }

    /// Feeds one pointer event. Returns the feature when the event finished
    /// a shape. Events the active mode is not subscribed to are ignored.
    pub fn handle(&mut self, event: PointerEvent) -> Option<DrawingFeature> {
        if !self.mode.subscriptions().accepts(event.kind) {
            return None;
        }
        match event.kind {
            PointerKind::Click => self.on_click(event.at),
            PointerKind::DoubleClick => self.on_double_click(),
            PointerKind::Move => {
                self.on_move(event.at);
                None
            }
        }
    }

    pub fn export_drawings(&self) -> Vec<DrawingFeature> {
        self.group.export(self.unit_labels)
    }

    /// Adds a circle without going through a pointer mode. Returns `None`
    /// when the radius is not a positive finite number.
    pub fn draw_circle(
        &mut self,
        center: LatLng,
        radius_m: f64,
        options: &DrawOptions,
    ) -> Option<DrawingFeature> {
        if !(radius_m.is_finite() && radius_m > 0.0) {
            warn!("circle radius {radius_m} must be positive");
            return None;
        }
        Some(self.add_shape(Shape::Circle { center, radius_m }, "circle", options))
    }

    /// Adds a polygon from at least three vertices.
    pub fn draw_polygon(&mut self, points: Vec<LatLng>, options: &DrawOptions) -> Option<DrawingFeature> {
        if points.len() < 3 {
            warn!("polygon needs 3 vertices, have {}", points.len());
            return None;
        }
        Some(self.add_shape(Shape::Polygon(points), "polygon", options))
    }

    /// Adds an unfilled polyline from at least two vertices.
    pub fn draw_polyline(&mut self, points: Vec<LatLng>, options: &DrawOptions) -> Option<DrawingFeature> {
        if points.len() < 2 {
            warn!("polyline needs 2 vertices, have {}", points.len());
            return None;
        }
        Some(self.add_shape(Shape::Line(points), "line", options))
    }

    /// Restores previously exported features. Entries that fail to parse are
    /// logged and skipped. A missing `createdAt` is stamped with the current
    /// time. Returns the number imported.
    pub fn import_drawings(&mut self, features: impl IntoIterator<Item = Value>) -> usize {
        let mut imported = 0;
        for (index, value) in features.into_iter().enumerate() {
            let parsed = DrawingFeature::from_value(value)
                .and_then(|feature| from_feature(&feature).map(|drawing| (feature, drawing)));
            let (feature, drawing) = match parsed {
                Ok(pair) => pair,
                Err(e) => {
                    warn!("skipping drawing feature {index}: {e}");
                    continue;
                }
            };
            let created_at = match feature.properties.created_at.as_str() {
                "" => iso8601(self.clock.now()),
                given => given.to_string(),
            };
            self.group.add(drawing.clone(), created_at);
            let label = match drawing.drawing_type.as_str() {
                "measure-distance" => feature.properties.length.as_ref(),
                "measure-area" => feature.properties.area.as_ref(),
                _ => None,
            };
            if let Some(text) = label {
                self.group.add_measure_label(&drawing, text.clone());
            }
            imported += 1;
        }
        info!("{imported} drawings imported");
        imported
    }

    pub fn clear_drawings(&mut self) {
        self.group.clear();
    }

    fn add_shape(&mut self, shape: Shape, drawing_type: &str, options: &DrawOptions) -> DrawingFeature {
        let now = self.clock.now();
        let drawing = DrawnShape::new(self.ids.next(now.millis()), shape, drawing_type);
        let created_at = iso8601(now);
        let style = finished_style(drawing_type).with_overrides(options);
        self.group.add_styled(drawing.clone(), style, created_at.clone());
        info!("drawing {} added as {drawing_type}", drawing.id);
        to_feature(&drawing, &created_at, self.unit_labels)
    }

    fn reset(&mut self) {
        self.temp.clear();
        self.vertices.clear();
    }

    fn commit_vertex(&mut self, at: LatLng) {
        self.vertices.push(at);
        self.temp.push_vertex(at, vertex_style(self.mode));
    }

    fn on_click(&mut self, at: LatLng) -> Option<DrawingFeature> {
        match self.mode {
            DrawingMode::Point => self.finalize(Shape::Point(at)),
            DrawingMode::Rectangle | DrawingMode::Circle => match self.vertices.first().copied() {
                Some(anchor) => {
                    let shape = anchored_shape(self.mode, anchor, at);
                    self.finalize(shape)
                }
                None => {
                    self.commit_vertex(at);
                    None
                }
            },
            mode if mode.is_multi_vertex() => {
                self.commit_vertex(at);
                None
            }
            _ => None,
        }
    }

    fn on_double_click(&mut self) -> Option<DrawingFeature> {
        let mode = self.mode;
        let required = mode.min_vertices();
        if self.vertices.len() < required {
            warn!(
                "{mode} needs {required} vertices to finish, have {}",
                self.vertices.len()
            );
            return None;
        }
        let points = self.vertices.clone();
        let shape = match mode {
            DrawingMode::Line | DrawingMode::MeasureDistance => Shape::Line(points),
            DrawingMode::Polygon | DrawingMode::MeasureArea => Shape::Polygon(points),
            _ => return None,
        };
        self.finalize(shape)
    }

    fn on_move(&mut self, at: LatLng) {
        let mode = self.mode;
        let Some(first) = self.vertices.first().copied() else {
            return;
        };
        match mode {
            DrawingMode::Rectangle | DrawingMode::Circle => {
                let shape = anchored_shape(mode, first, at);
                self.temp.set_preview(shape, preview_style(mode, true));
            }
            DrawingMode::Line | DrawingMode::MeasureDistance => {
                let mut points = self.vertices.clone();
                points.push(at);
                if mode == DrawingMode::MeasureDistance {
                    let text = format!(
                        "{}: {}",
                        self.unit_labels.distance_caption(),
                        distance_label(&points, self.unit_labels)
                    );
                    self.temp.set_tooltip(at, text);
                }
                self.temp
                    .set_preview(Shape::Line(points), preview_style(mode, false));
            }
            DrawingMode::Polygon | DrawingMode::MeasureArea => {
                if self.vertices.len() < 2 {
                    self.temp
                        .set_preview(Shape::Line(vec![first, at]), preview_style(mode, false));
                    return;
                }
                let mut points = self.vertices.clone();
                points.push(at);
                if mode == DrawingMode::MeasureArea {
                    let text = format!(
                        "{}: {}",
                        self.unit_labels.area_caption(),
                        area_label(&points, self.unit_labels)
                    );
                    self.temp.set_tooltip(at, text);
                }
                self.temp
                    .set_preview(Shape::Polygon(points), preview_style(mode, true));
            }
            DrawingMode::None | DrawingMode::Point => {}
        }
    }

    fn finalize(&mut self, shape: Shape) -> Option<DrawingFeature> {
        let mode = self.mode;
        let now = self.clock.now();
        let id = self.ids.next(now.millis());
        let drawing = DrawnShape::new(id, shape, mode.as_str());
        let created_at = iso8601(now);

        self.group.add(drawing.clone(), created_at.clone());
        match (&drawing.shape, mode) {
            (Shape::Line(points), DrawingMode::MeasureDistance) => {
                let text = distance_label(points, self.unit_labels);
                self.group.add_measure_label(&drawing, text);
            }
            (Shape::Polygon(points), DrawingMode::MeasureArea) => {
                let text = area_label(points, self.unit_labels);
                self.group.add_measure_label(&drawing, text);
            }
            _ => {}
        }

        let feature = to_feature(&drawing, &created_at, self.unit_labels);
        info!("drawing {} finished in {mode} mode as {}", drawing.id, drawing.kind());
        debug!("drawing feature {}", feature.to_value());

        self.events.emit(DrawingEvent::Finished {
            feature: feature.clone(),
            mode,
        });
        if let Some(hook) = self.callbacks.on_draw_end.as_mut() {
            hook(&drawing, &feature, mode);
        }

        self.reset();
        Some(feature)
    }
}

/// Rectangle spanned by, or circle centered on, the anchor through `at`.
fn anchored_shape(mode: DrawingMode, anchor: LatLng, at: LatLng) -> Shape {
    if mode == DrawingMode::Circle {
        Shape::Circle {
            center: anchor,
            radius_m: haversine_m(anchor, at),
        }
    } else {
        Shape::Rectangle(LatLngBounds::from_corners(anchor, at))
    }
}
