use euclid::default::Point2D;
use serde::{Deserialize, Serialize};

pub type ConnectionId = u16;
pub type CommandId = u16;
pub type StrokeId = u64;

/// Canvas coordinate. Every participant has its own viewport; coordinates
/// live in the shared canvas space, not in any one viewport.
pub type Point = Point2D<f32>;

/// One committed freehand drawing action. Immutable once logged; `id` is
/// assigned by the room's store at append time and is the tie-break
/// authority for ordering concurrent commits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub id: StrokeId,
    pub points: Vec<Point>,
    pub color: String,
    pub width: f32,
}

/// The room's shared image. At most one per room; a new upload replaces it
/// entirely, a move rewrites `position` only.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageState {
    pub data: Vec<u8>,
    pub position: Point,
}

impl std::fmt::Debug for ImageState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageState")
            .field("size", &self.data.len())
            .field("position", &self.position)
            .finish()
    }
}

/// Transcript entries carry no sender identity; delivery order is the only
/// attribution the core provides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub text: String,
}
