use crate::canvas_storage::{CanvasSnapshot, CanvasStorage};
use crate::materialize::Materialize;
use crate::message::{CanvasError, EditCommand, EditEvent};

/// The authority side of a room's canvas. Every edit command becomes exactly
/// one store call; the returned event is the confirmed mutation to fan out.
/// Rejected edits leave the store untouched and are never broadcast.
pub struct ServerLeaderCanvas {
    storage: CanvasStorage,
}

impl Materialize<CanvasStorage> for ServerLeaderCanvas {
    fn readable(&self) -> &CanvasStorage {
        &self.storage
    }
}

impl ServerLeaderCanvas {
    pub fn new() -> Self {
        Self {
            storage: CanvasStorage::new(),
        }
    }

    pub fn process_edit(&mut self, command: EditCommand) -> Result<EditEvent, CanvasError> {
        match command {
            EditCommand::Chat { text } => {
                self.storage.append_chat(text.clone());
                Ok(EditEvent::ChatAppended { text })
            }
            EditCommand::DrawCommit {
                points,
                color,
                width,
            } => {
                let id = self
                    .storage
                    .append_stroke(points.clone(), color.clone(), width);
                Ok(EditEvent::StrokeCommitted(crate::Stroke {
                    id,
                    points,
                    color,
                    width,
                }))
            }
            EditCommand::Undo => {
                let stroke_id = self.storage.undo_last()?;
                Ok(EditEvent::StrokeRemoved { stroke_id })
            }
            EditCommand::ImageUpload { data, position } => {
                self.storage.set_image(data.clone(), position);
                Ok(EditEvent::ImageUploaded(crate::ImageState {
                    data,
                    position,
                }))
            }
            EditCommand::ImageMove { position } => {
                self.storage.move_image(position)?;
                Ok(EditEvent::ImageMoved { position })
            }
        }
    }

    pub fn snapshot(&self) -> CanvasSnapshot {
        self.storage.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Point;

    #[test]
    fn it_confirms_commit_with_stamped_id() {
        let mut leader = ServerLeaderCanvas::new();
        let event = leader
            .process_edit(EditCommand::DrawCommit {
                points: vec![Point::new(0.0, 0.0), Point::new(10.0, 10.0)],
                color: "black".into(),
                width: 2.0,
            })
            .expect("commit is always valid");

        match event {
            EditEvent::StrokeCommitted(stroke) => assert_eq!(stroke.id, 1),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn it_rejects_image_move_before_upload() {
        let mut leader = ServerLeaderCanvas::new();
        let result = leader.process_edit(EditCommand::ImageMove {
            position: Point::new(5.0, 5.0),
        });
        assert_eq!(result.unwrap_err(), CanvasError::NoImage);
        assert!(leader.readable().image().is_none());
    }

    #[test]
    fn it_reports_not_found_for_undo_on_empty_log() {
        let mut leader = ServerLeaderCanvas::new();
        let result = leader.process_edit(EditCommand::Undo);
        assert_eq!(result.unwrap_err(), CanvasError::NotFound);
    }
}
