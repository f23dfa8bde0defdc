use serde::Serialize;

use crate::traits::CanvasReadable;
use crate::types::{ChatMessage, ImageState, Stroke};

/// What a rendering collaborator consumes: redraw the strokes in order over
/// the image, list the transcript. Redrawing twice with the same material
/// must produce the same visual result.
#[derive(Debug, Clone, Serialize)]
pub struct CanvasMaterial {
    pub strokes: Vec<Stroke>,
    pub image: Option<ImageState>,
    pub transcript: Vec<ChatMessage>,
}

pub trait Materialize<R: CanvasReadable> {
    fn readable(&self) -> &R;

    fn materialize_canvas(&self) -> CanvasMaterial {
        let readable = self.readable();
        CanvasMaterial {
            strokes: readable.strokes().to_vec(),
            image: readable.image().cloned(),
            transcript: readable.transcript().to_vec(),
        }
    }
}
