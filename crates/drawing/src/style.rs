//! Stroke and fill palette for drawings, previews and vertex markers.

use serde::{Deserialize, Serialize};

use crate::mode::DrawingMode;

pub const FINISHED_COLOR: &str = "#3388ff";
pub const MEASURE_COLOR: &str = "#ff6600";
pub const PREVIEW_DASH: &str = "5, 5";
/// Screen radius of the circle marker dropped on each committed vertex.
pub const VERTEX_RADIUS_PX: f64 = 4.0;

#[derive(Debug, Clone, PartialEq)]
pub struct PathStyle {
    pub color: String,
    pub weight: f64,
    pub opacity: f64,
    /// Fill color; `None` fills with `color`.
    pub fill_color: Option<String>,
    /// `None` draws an unfilled path.
    pub fill_opacity: Option<f64>,
    pub dash_array: Option<String>,
}

/// Caller overrides for shapes added through the programmatic draw calls.
/// Unset fields keep the default style.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DrawOptions {
    pub color: Option<String>,
    pub weight: Option<f64>,
    pub opacity: Option<f64>,
    pub fill_color: Option<String>,
    pub fill_opacity: Option<f64>,
    pub dash_array: Option<String>,
}

impl PathStyle {
    fn stroke(color: &str, weight: f64, opacity: f64) -> Self {
        Self {
            color: color.to_string(),
            weight,
            opacity,
            fill_color: None,
            fill_opacity: None,
            dash_array: None,
        }
    }

    fn filled(self, fill_opacity: f64) -> Self {
        Self {
            fill_opacity: Some(fill_opacity),
            ..self
        }
    }

    fn dashed(self) -> Self {
        Self {
            dash_array: Some(PREVIEW_DASH.to_string()),
            ..self
        }
    }

    pub fn is_filled(&self) -> bool {
        self.fill_opacity.is_some()
    }

    pub fn fill(&self) -> &str {
        self.fill_color.as_deref().unwrap_or(&self.color)
    }

    /// Applies `options` on top of this style. Fill settings only take
    /// effect on filled styles.
    pub fn with_overrides(mut self, options: &DrawOptions) -> Self {
        if let Some(color) = &options.color {
            self.color = color.clone();
        }
        if let Some(weight) = options.weight {
            self.weight = weight;
        }
        if let Some(opacity) = options.opacity {
            self.opacity = opacity;
        }
        if self.is_filled() {
            if let Some(fill) = &options.fill_color {
                self.fill_color = Some(fill.clone());
            }
            if let Some(fill_opacity) = options.fill_opacity {
                self.fill_opacity = Some(fill_opacity);
            }
        }
        if let Some(dash) = &options.dash_array {
            self.dash_array = Some(dash.clone());
        }
        self
    }
}

/// Accent color of a mode's vertex markers and previews.
pub fn mode_color(mode: DrawingMode) -> &'static str {
    match mode {
        DrawingMode::Line => "#ff0000",
        DrawingMode::Polygon => "#0000ff",
        DrawingMode::Rectangle => "#00ff00",
        DrawingMode::Circle => "#ff00ff",
        DrawingMode::MeasureDistance | DrawingMode::MeasureArea => MEASURE_COLOR,
        DrawingMode::None | DrawingMode::Point => FINISHED_COLOR,
    }
}

pub fn vertex_style(mode: DrawingMode) -> PathStyle {
    PathStyle::stroke(mode_color(mode), 3.0, 1.0).filled(0.8)
}

/// Dashed preview from the committed vertices to the cursor. `filled`
/// selects the area form (polygon, rectangle, circle).
pub fn preview_style(mode: DrawingMode, filled: bool) -> PathStyle {
    let color = mode_color(mode);
    if mode.is_measure() {
        // Measure previews are never filled.
        return PathStyle::stroke(color, 3.0, 0.8).dashed();
    }
    let style = PathStyle::stroke(color, 2.0, 0.6).dashed();
    if filled { style.filled(0.1) } else { style }
}

/// Style of a committed drawing, keyed by the mode string that produced it.
pub fn finished_style(drawing_type: &str) -> PathStyle {
    match drawing_type {
        "measure-distance" => PathStyle::stroke(MEASURE_COLOR, 3.0, 1.0),
        "measure-area" => PathStyle::stroke(MEASURE_COLOR, 3.0, 1.0).filled(0.3),
        "line" => PathStyle::stroke(FINISHED_COLOR, 3.0, 1.0),
        _ => PathStyle::stroke(FINISHED_COLOR, 3.0, 1.0).filled(0.2),
    }
}
