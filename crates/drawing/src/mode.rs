use serde::{Deserialize, Serialize};

use foundation::geo::LatLng;

/// Interactive drawing tool. `None` means no tool is active.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DrawingMode {
    #[default]
    None,
    Point,
    Line,
    Polygon,
    Rectangle,
    Circle,
    MeasureDistance,
    MeasureArea,
}

impl DrawingMode {
    pub const ALL: [DrawingMode; 8] = [
        DrawingMode::None,
        DrawingMode::Point,
        DrawingMode::Line,
        DrawingMode::Polygon,
        DrawingMode::Rectangle,
        DrawingMode::Circle,
        DrawingMode::MeasureDistance,
        DrawingMode::MeasureArea,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DrawingMode::None => "none",
            DrawingMode::Point => "point",
            DrawingMode::Line => "line",
            DrawingMode::Polygon => "polygon",
            DrawingMode::Rectangle => "rectangle",
            DrawingMode::Circle => "circle",
            DrawingMode::MeasureDistance => "measure-distance",
            DrawingMode::MeasureArea => "measure-area",
        }
    }

    pub fn is_active(self) -> bool {
        self != DrawingMode::None
    }

    pub fn is_measure(self) -> bool {
        matches!(self, DrawingMode::MeasureDistance | DrawingMode::MeasureArea)
    }

    /// Modes that collect a vertex per click and finish on double-click.
    pub fn is_multi_vertex(self) -> bool {
        matches!(
            self,
            DrawingMode::Line
                | DrawingMode::Polygon
                | DrawingMode::MeasureDistance
                | DrawingMode::MeasureArea
        )
    }

    /// Vertices required before a double-click may finish the shape.
    pub fn min_vertices(self) -> usize {
        match self {
            DrawingMode::Line | DrawingMode::MeasureDistance => 2,
            DrawingMode::Polygon | DrawingMode::MeasureArea => 3,
            _ => 0,
        }
    }

    /// Pointer events the mode listens to while active.
    pub fn subscriptions(self) -> PointerSubscriptions {
        match self {
            DrawingMode::None => PointerSubscriptions::NONE,
            DrawingMode::Point => PointerSubscriptions {
                click: true,
                double_click: false,
                pointer_move: false,
            },
            DrawingMode::Rectangle | DrawingMode::Circle => PointerSubscriptions {
                click: true,
                double_click: false,
                pointer_move: true,
            },
            DrawingMode::Line
            | DrawingMode::Polygon
            | DrawingMode::MeasureDistance
            | DrawingMode::MeasureArea => PointerSubscriptions::ALL,
        }
    }

    pub fn cursor(self) -> Cursor {
        if self.is_active() {
            Cursor::Crosshair
        } else {
            Cursor::Default
        }
    }
}

impl std::fmt::Display for DrawingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDrawingMode(pub String);

impl std::fmt::Display for UnknownDrawingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown drawing mode: {}", self.0)
    }
}

impl std::error::Error for UnknownDrawingMode {}

impl std::str::FromStr for DrawingMode {
    type Err = UnknownDrawingMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DrawingMode::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| UnknownDrawingMode(s.to_string()))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Cursor {
    #[default]
    Default,
    Crosshair,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointerKind {
    #[serde(rename = "click")]
    Click,
    #[serde(rename = "dblclick")]
    DoubleClick,
    #[serde(rename = "move")]
    Move,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub at: LatLng,
}

impl PointerEvent {
    pub fn click(at: LatLng) -> Self {
        Self {
            kind: PointerKind::Click,
            at,
        }
    }

    pub fn double_click(at: LatLng) -> Self {
        Self {
            kind: PointerKind::DoubleClick,
            at,
        }
    }

    pub fn moved(at: LatLng) -> Self {
        Self {
            kind: PointerKind::Move,
            at,
        }
    }
}

/// Set of pointer event kinds a mode is bound to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct PointerSubscriptions {
    pub click: bool,
    pub double_click: bool,
    pub pointer_move: bool,
}

impl PointerSubscriptions {
    pub const NONE: Self = Self {
        click: false,
        double_click: false,
        pointer_move: false,
    };

    pub const ALL: Self = Self {
        click: true,
        double_click: true,
        pointer_move: true,
    };

    pub fn accepts(self, kind: PointerKind) -> bool {
        match kind {
            PointerKind::Click => self.click,
            PointerKind::DoubleClick => self.double_click,
            PointerKind::Move => self.pointer_move,
        }
    }

    pub fn is_empty(self) -> bool {
        self == Self::NONE
    }
}
