//! Scripted drawing sessions: mode changes and pointer events in, finished
//! features out.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use compute::measure::UnitLabels;
use drawing::mode::{DrawingMode, PointerEvent};
use drawing::session::DrawingSession;
use foundation::geo::LatLng;
use runtime::clock::ManualClock;

/// One scripted step. Coordinates are `[lat, lng]`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Start(DrawingMode),
    Stop,
    Click([f64; 2]),
    Dblclick([f64; 2]),
    Move([f64; 2]),
    /// Advances the session clock by this many milliseconds.
    Wait(i64),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub start_ms: i64,
    pub steps: Vec<Step>,
}

fn at(p: [f64; 2]) -> LatLng {
    LatLng::new(p[0], p[1])
}

/// Runs `script` and returns the exported drawings as GeoJSON values.
pub fn run(script: &Script, labels: UnitLabels) -> Vec<Value> {
    let clock = ManualClock::new(script.start_ms);
    let mut session = DrawingSession::new(Arc::new(clock.clone())).with_unit_labels(labels);

    for (index, step) in script.steps.iter().enumerate() {
        debug!("step {index}: {step:?}");
        match step {
            Step::Start(mode) => {
                session.start(*mode);
            }
            Step::Stop => {
                session.stop();
            }
            Step::Click(p) => {
                session.handle(PointerEvent::click(at(*p)));
            }
            Step::Dblclick(p) => {
                session.handle(PointerEvent::double_click(at(*p)));
            }
            Step::Move(p) => {
                session.handle(PointerEvent::moved(at(*p)));
            }
            Step::Wait(ms) => clock.advance(*ms),
        }
    }

    session
        .export_drawings()
        .iter()
        .map(|feature| feature.to_value())
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn measures_a_line_from_a_script() {
        let script: Script = serde_json::from_str(
            r#"{
                "start_ms": 1000,
                "steps": [
                    {"start": "measure-distance"},
                    {"click": [0.0, 0.0]},
                    {"move": [0.0, 0.005]},
                    {"click": [0.0, 0.009]},
                    {"wait": 5},
                    {"dblclick": [0.0, 0.009]},
                    "stop"
                ]
            }"#,
        )
        .unwrap();

        let features = run(&script, UnitLabels::Symbols);
        assert_eq!(features.len(), 1);
        let f = &features[0];
        assert_eq!(f["id"], "drawing_1_1005");
        assert_eq!(f["geometry"]["type"], "LineString");
        assert_eq!(f["properties"]["drawingType"], "measure-distance");
        assert_eq!(f["properties"]["length"], "1.00 km");
    }

    #[test]
    fn unfinished_shapes_export_nothing() {
        let script = Script {
            start_ms: 0,
            steps: vec![
                Step::Start(DrawingMode::Polygon),
                Step::Click([0.0, 0.0]),
                Step::Click([0.0, 1.0]),
                Step::Dblclick([0.0, 1.0]),
                Step::Start(DrawingMode::Line),
            ],
        };
        assert!(run(&script, UnitLabels::Symbols).is_empty());
    }
}
