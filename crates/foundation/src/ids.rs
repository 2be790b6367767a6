use serde::{Deserialize, Serialize};

/// Identifier of a finished drawing, `drawing_<counter>_<timestamp_ms>`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DrawingId(String);

impl DrawingId {
    pub fn new(id: impl Into<String>) -> Self {
        DrawingId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DrawingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Monotonic id minting for drawings.
///
/// The counter never goes backwards, so ids stay unique even when two
/// drawings finish within the same millisecond.
#[derive(Debug, Default, Clone)]
pub struct DrawingIdSequence {
    counter: u64,
}

impl DrawingIdSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self, timestamp_ms: i64) -> DrawingId {
        self.counter += 1;
        DrawingId(format!("drawing_{}_{}", self.counter, timestamp_ms))
    }

    pub fn counter(&self) -> u64 {
        self.counter
    }
}
