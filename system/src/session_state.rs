use std::collections::VecDeque;

use crate::canvas_storage::{CanvasSnapshot, CanvasStorage};
use crate::client_follower_canvas::{ClientFollowerCanvas, ReplayError};
use crate::materialize::{CanvasMaterial, Materialize};
use crate::message::{LiveEvent, RoomEvent, RoomSnapshot, SystemEvent};

/// Client-side session state: the follower canvas plus everything a renderer
/// polls between frames. Applies incremental events in arrival order; a
/// `JoinedRoom` replaces all local state wholesale.
pub struct SessionState {
    room_snapshot: RoomSnapshot,
    canvas: ClientFollowerCanvas,
    pending_live_events: VecDeque<LiveEvent>,
}

impl SessionState {
    pub fn new(canvas_snapshot: &CanvasSnapshot, room_snapshot: RoomSnapshot) -> Self {
        Self {
            canvas: ClientFollowerCanvas::new(canvas_snapshot),
            room_snapshot,
            pending_live_events: VecDeque::new(),
        }
    }

    pub fn handle_system_event(&mut self, event: SystemEvent) -> Result<(), ReplayError> {
        match event {
            SystemEvent::JoinedRoom {
                room_snapshot,
                canvas_snapshot,
                ..
            } => {
                self.canvas = ClientFollowerCanvas::new(&canvas_snapshot);
                self.room_snapshot = room_snapshot;
                self.pending_live_events.clear();
                Ok(())
            }
            SystemEvent::LeftRoom => Ok(()),
            SystemEvent::RoomEvent(room_event) => self.handle_room_event(room_event),
        }
    }

    pub fn handle_room_event(&mut self, event: RoomEvent) -> Result<(), ReplayError> {
        match event {
            RoomEvent::Edit(edit) => self.canvas.handle_event(edit),
            RoomEvent::Live(live) => {
                if self.pending_live_events.len() > 100 {
                    log::warn!("live events must be consumed");
                }
                self.pending_live_events.push_back(live);
                Ok(())
            }
            RoomEvent::RoomStateChanged(room_snapshot) => {
                self.room_snapshot = room_snapshot;
                Ok(())
            }
        }
    }

    pub fn participant_count(&self) -> usize {
        self.room_snapshot.participant_count()
    }

    pub fn room_snapshot(&self) -> &RoomSnapshot {
        &self.room_snapshot
    }

    pub fn consume_live_events(&mut self) -> Vec<LiveEvent> {
        self.pending_live_events.drain(..).collect()
    }

    pub fn materialize(&self) -> CanvasMaterial {
        self.canvas.materialize_canvas()
    }

    pub fn materialize_json(&self) -> String {
        serde_json::to_string(&self.materialize()).expect("must succeed")
    }
}

impl Materialize<CanvasStorage> for SessionState {
    fn readable(&self) -> &CanvasStorage {
        self.canvas.readable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{EditEvent, LiveCommand, RoomEvent};
    use crate::{CanvasStorage, Point};

    fn fresh_session() -> SessionState {
        SessionState::new(
            &CanvasStorage::new().snapshot(),
            RoomSnapshot {
                connections: vec![1],
            },
        )
    }

    #[test]
    fn it_queues_live_events_until_consumed() {
        let mut session = fresh_session();
        session
            .handle_room_event(RoomEvent::Live(LiveEvent::from_command(
                2,
                LiveCommand::DrawAppend {
                    points: vec![Point::new(1.0, 1.0)],
                },
            )))
            .expect("live events always apply");

        assert_eq!(session.consume_live_events().len(), 1);
        assert!(session.consume_live_events().is_empty());
        // Nothing cosmetic reaches the durable canvas.
        assert!(session.materialize().strokes.is_empty());
    }

    #[test]
    fn it_tracks_roster_changes() {
        let mut session = fresh_session();
        assert_eq!(session.participant_count(), 1);
        session
            .handle_room_event(RoomEvent::RoomStateChanged(RoomSnapshot {
                connections: vec![1, 2],
            }))
            .expect("roster change always applies");
        assert_eq!(session.participant_count(), 2);
    }

    #[test]
    fn it_folds_edits_into_the_transcript() {
        let mut session = fresh_session();
        session
            .handle_room_event(RoomEvent::Edit(EditEvent::ChatAppended {
                text: "hi".into(),
            }))
            .expect("chat always applies");
        assert_eq!(session.materialize().transcript.len(), 1);
    }
}
