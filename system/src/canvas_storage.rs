use crate::message::CanvasError;
use crate::traits::CanvasReadable;
use crate::types::*;
use serde::{Deserialize, Serialize};

/// Authoritative canvas state of one room: the ordered stroke log, the
/// optional shared image, and the chat transcript. The stroke log is
/// append-only except for undo truncation, and its order is the single
/// source of truth for redraw order.
///
/// The storage knows nothing about connections or broadcast; callers are
/// expected to serialize mutations per room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanvasStorage {
    stroke_log: Vec<Stroke>,
    stroke_id_source: StrokeId,
    image: Option<ImageState>,
    transcript: Vec<ChatMessage>,
}

impl CanvasStorage {
    pub fn new() -> Self {
        Self {
            stroke_log: Vec::new(),
            stroke_id_source: 0,
            image: None,
            transcript: Vec::new(),
        }
    }

    /// Stamps the next stroke id and appends. Ids increase monotonically
    /// from 1 and never repeat within a room, even across undos.
    pub fn append_stroke(&mut self, points: Vec<Point>, color: String, width: f32) -> StrokeId {
        self.stroke_id_source += 1;
        let id = self.stroke_id_source;
        self.stroke_log.push(Stroke {
            id,
            points,
            color,
            width,
        });
        id
    }

    /// Pops the tail of the stroke log. `NotFound` on an empty log leaves
    /// state unchanged.
    pub fn undo_last(&mut self) -> Result<StrokeId, CanvasError> {
        self.stroke_log
            .pop()
            .map(|stroke| stroke.id)
            .ok_or(CanvasError::NotFound)
    }

    /// Replaces the image unconditionally. Last writer wins.
    pub fn set_image(&mut self, data: Vec<u8>, position: Point) {
        self.image = Some(ImageState { data, position });
    }

    /// Rewrites the image position only. `NoImage` must not create one.
    pub fn move_image(&mut self, position: Point) -> Result<(), CanvasError> {
        match self.image.as_mut() {
            Some(image) => {
                image.position = position;
                Ok(())
            }
            None => Err(CanvasError::NoImage),
        }
    }

    pub fn append_chat(&mut self, text: String) -> usize {
        self.transcript.push(ChatMessage { text });
        self.transcript.len() - 1
    }

    /// Replays a stroke already stamped by the room's authority, preserving
    /// its id. Follower-side counterpart of `append_stroke`.
    pub fn apply_committed(&mut self, stroke: Stroke) {
        if stroke.id > self.stroke_id_source {
            self.stroke_id_source = stroke.id;
        }
        self.stroke_log.push(stroke);
    }

    /// Removes the tail stroke confirmed by the authority. The id must match
    /// the local tail; a mismatch means this replica has diverged.
    pub fn remove_committed(&mut self, stroke_id: StrokeId) -> Result<(), CanvasError> {
        match self.stroke_log.last() {
            Some(stroke) if stroke.id == stroke_id => {
                self.stroke_log.pop();
                Ok(())
            }
            _ => Err(CanvasError::NotFound),
        }
    }

    pub fn strokes(&self) -> &[Stroke] {
        &self.stroke_log
    }

    pub fn image(&self) -> Option<&ImageState> {
        self.image.as_ref()
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn snapshot(&self) -> CanvasSnapshot {
        self.into()
    }
}

impl CanvasReadable for CanvasStorage {
    fn strokes(&self) -> &[Stroke] {
        &self.stroke_log
    }

    fn image(&self) -> Option<&ImageState> {
        self.image.as_ref()
    }

    fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }
}

/// Point-in-time state of a room's canvas, sent once to a newly joined
/// session so it can reconstruct state without replaying history. Opaque on
/// the wire.
#[derive(Clone, Serialize, Deserialize)]
pub struct CanvasSnapshot {
    content: Vec<u8>,
}

impl std::fmt::Debug for CanvasSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CanvasSnapshot")
            .field("size", &self.content.len())
            .finish()
    }
}

impl From<&CanvasStorage> for CanvasSnapshot {
    fn from(storage: &CanvasStorage) -> Self {
        CanvasSnapshot {
            content: bincode::serialize(storage).expect("canvas state must serialize"),
        }
    }
}

impl From<&CanvasSnapshot> for CanvasStorage {
    fn from(snapshot: &CanvasSnapshot) -> Self {
        bincode::deserialize(&snapshot.content).expect("snapshot produced by CanvasStorage")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_assigns_monotonic_stroke_ids() {
        let mut storage = CanvasStorage::new();
        let first = storage.append_stroke(vec![Point::new(0.0, 0.0)], "black".into(), 2.0);
        let second = storage.append_stroke(vec![Point::new(1.0, 1.0)], "red".into(), 4.0);
        assert_eq!(first, 1);
        assert_eq!(second, 2);

        // Ids are not reused after an undo.
        storage.undo_last().expect("log is non-empty");
        let third = storage.append_stroke(vec![Point::new(2.0, 2.0)], "black".into(), 2.0);
        assert_eq!(third, 3);
    }

    #[test]
    fn it_rejects_undo_on_empty_log() {
        let mut storage = CanvasStorage::new();
        assert_eq!(storage.undo_last(), Err(CanvasError::NotFound));
        assert!(storage.strokes().is_empty());
    }

    #[test]
    fn it_rejects_move_without_image() {
        let mut storage = CanvasStorage::new();
        assert_eq!(
            storage.move_image(Point::new(50.0, 50.0)),
            Err(CanvasError::NoImage)
        );
        assert!(storage.image().is_none());
    }

    #[test]
    fn it_moves_image_without_touching_data() {
        let mut storage = CanvasStorage::new();
        storage.set_image(vec![1, 2, 3], Point::new(0.0, 0.0));
        storage
            .move_image(Point::new(50.0, 50.0))
            .expect("image exists");

        let image = storage.image().expect("image exists");
        assert_eq!(image.position, Point::new(50.0, 50.0));
        assert_eq!(image.data, vec![1, 2, 3]);
    }

    #[test]
    fn it_replaces_image_wholesale() {
        let mut storage = CanvasStorage::new();
        storage.set_image(vec![1], Point::new(10.0, 10.0));
        storage.set_image(vec![2, 2], Point::new(0.0, 0.0));

        let image = storage.image().expect("image exists");
        assert_eq!(image.data, vec![2, 2]);
        assert_eq!(image.position, Point::new(0.0, 0.0));
    }

    #[test]
    fn it_restores_state_from_snapshot() {
        let mut storage = CanvasStorage::new();
        storage.append_stroke(vec![Point::new(0.0, 0.0)], "black".into(), 2.0);
        storage.set_image(vec![9, 9], Point::new(5.0, 5.0));
        storage.append_chat("hello".into());

        let restored = CanvasStorage::from(&storage.snapshot());
        assert_eq!(format!("{:?}", restored), format!("{:?}", storage));

        // The id source travels with the snapshot.
        let mut restored = restored;
        assert_eq!(
            restored.append_stroke(vec![Point::new(1.0, 1.0)], "red".into(), 1.0),
            2
        );
    }

    #[test]
    fn it_detects_divergent_committed_removal() {
        let mut storage = CanvasStorage::new();
        storage.apply_committed(Stroke {
            id: 7,
            points: vec![Point::new(0.0, 0.0)],
            color: "black".into(),
            width: 2.0,
        });
        assert_eq!(storage.remove_committed(3), Err(CanvasError::NotFound));
        assert_eq!(storage.strokes().len(), 1);
        assert_eq!(storage.remove_committed(7), Ok(()));
        assert!(storage.strokes().is_empty());
    }
}
