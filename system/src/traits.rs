use crate::types::{ChatMessage, ImageState, Stroke};

/// Read access to a canvas replica, shared by the server-leader and the
/// client-follower sides. Redraw order is the stroke slice order.
pub trait CanvasReadable {
    fn strokes(&self) -> &[Stroke];
    fn image(&self) -> Option<&ImageState>;
    fn transcript(&self) -> &[ChatMessage];
}
