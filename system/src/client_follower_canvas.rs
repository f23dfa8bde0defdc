use crate::canvas_storage::{CanvasSnapshot, CanvasStorage};
use crate::materialize::Materialize;
use crate::message::EditEvent;

/// ReplayError means this replica no longer agrees with the authority and
/// must rejoin to obtain a fresh snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplayError {
    LogDiverged,
    ImageMissing,
}

/// The receiving side of a room's canvas: a pure fold over the confirmed
/// event stream. It never originates authoritative decisions — an undo is
/// applied only once the authority names the removed stroke, so two clients
/// undoing near-simultaneously cannot diverge.
pub struct ClientFollowerCanvas {
    storage: CanvasStorage,
}

impl Materialize<CanvasStorage> for ClientFollowerCanvas {
    fn readable(&self) -> &CanvasStorage {
        &self.storage
    }
}

impl ClientFollowerCanvas {
    /// Builds local state wholesale from a join snapshot.
    pub fn new(snapshot: &CanvasSnapshot) -> Self {
        Self {
            storage: snapshot.into(),
        }
    }

    pub fn handle_event(&mut self, event: EditEvent) -> Result<(), ReplayError> {
        match event {
            EditEvent::ChatAppended { text } => {
                self.storage.append_chat(text);
                Ok(())
            }
            EditEvent::StrokeCommitted(stroke) => {
                self.storage.apply_committed(stroke);
                Ok(())
            }
            EditEvent::StrokeRemoved { stroke_id } => self
                .storage
                .remove_committed(stroke_id)
                .map_err(|_| ReplayError::LogDiverged),
            EditEvent::ImageUploaded(image) => {
                self.storage.set_image(image.data, image.position);
                Ok(())
            }
            EditEvent::ImageMoved { position } => self
                .storage
                .move_image(position)
                .map_err(|_| ReplayError::ImageMissing),
        }
    }
}
