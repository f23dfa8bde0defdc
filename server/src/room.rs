use tokio::sync::mpsc::{channel, Sender};

use system::{
    CommandId, CommandResult, ConnectionId, IdentifiableEvent, LiveEvent, RoomCommand, RoomEvent,
    RoomSnapshot, ServerLeaderCanvas, SystemError, SystemEvent,
};

use crate::connection::{ConnectionCommand, ConnectionEvent};
use crate::connection_tx_storage::{ConnectionTx, ConnectionTxStorage};
use crate::server::{ServerCommand, ServerTx};

pub type RoomTx = Sender<RoomMessage>;

#[derive(Debug)]
pub enum RoomMessage {
    Join {
        connection_id: ConnectionId,
        command_id: CommandId,
        tx: ConnectionTx,
    },
    Leave {
        connection_id: ConnectionId,
    },
    Command {
        from: ConnectionId,
        command_id: CommandId,
        command: RoomCommand,
    },
}

/// One worker task per room: the single sequence point for that room's
/// mutations, and the owner of its fan-out. Rooms share nothing, so a room's
/// worker never waits on another room.
struct RoomWorker {
    room_name: String,
    canvas: ServerLeaderCanvas,
    connections: Vec<ConnectionId>,
    connection_txs: ConnectionTxStorage,
    srv_tx: ServerTx,
}

impl RoomWorker {
    fn new(room_name: String, srv_tx: ServerTx) -> Self {
        Self {
            room_name,
            canvas: ServerLeaderCanvas::new(),
            connections: Vec::new(),
            connection_txs: ConnectionTxStorage::new(),
            srv_tx,
        }
    }

    fn handle_message(&mut self, message: RoomMessage) {
        match message {
            RoomMessage::Join {
                connection_id,
                command_id,
                tx,
            } => {
                self.connections.push(connection_id);
                self.connection_txs.insert(connection_id, tx);

                // Both snapshots are taken in the same message turn, so a
                // joiner cannot observe a stroke appended between them.
                let room_snapshot = self.snapshot();
                let canvas_snapshot = self.canvas.snapshot();
                self.send(
                    &connection_id,
                    IdentifiableEvent::ByMyself {
                        command_id,
                        result: CommandResult::SystemEvent(SystemEvent::JoinedRoom {
                            room_name: self.room_name.clone(),
                            room_snapshot: room_snapshot.clone(),
                            canvas_snapshot,
                        }),
                    },
                );
                self.broadcast(
                    RoomEvent::RoomStateChanged(room_snapshot),
                    Some(&connection_id),
                );
            }
            RoomMessage::Leave { connection_id } => {
                self.connections.retain(|c| *c != connection_id);
                self.connection_txs.remove(&connection_id);
                self.broadcast(RoomEvent::RoomStateChanged(self.snapshot()), None);
            }
            RoomMessage::Command {
                from,
                command_id,
                command,
            } => match command {
                RoomCommand::Live(live) => {
                    // Cosmetic relay; the canvas never sees it.
                    let event = LiveEvent::from_command(from, live);
                    self.broadcast(RoomEvent::Live(event.clone()), Some(&from));
                    self.send(
                        &from,
                        IdentifiableEvent::ByMyself {
                            command_id,
                            result: CommandResult::SystemEvent(SystemEvent::RoomEvent(
                                RoomEvent::Live(event),
                            )),
                        },
                    );
                }
                RoomCommand::Edit(edit) => match self.canvas.process_edit(edit) {
                    Ok(event) => {
                        self.broadcast(RoomEvent::Edit(event.clone()), Some(&from));
                        self.send(
                            &from,
                            IdentifiableEvent::ByMyself {
                                command_id,
                                result: CommandResult::SystemEvent(SystemEvent::RoomEvent(
                                    RoomEvent::Edit(event),
                                )),
                            },
                        );
                    }
                    Err(canvas_error) => {
                        // Rejected edits reach the sender only.
                        self.send(
                            &from,
                            IdentifiableEvent::ByMyself {
                                command_id,
                                result: CommandResult::Error(SystemError::from(canvas_error)),
                            },
                        );
                    }
                },
            },
        }
    }

    fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            connections: self.connections.clone(),
        }
    }

    fn broadcast(&mut self, room_event: RoomEvent, without: Option<&ConnectionId>) {
        let mut stalled = Vec::new();
        for connection_id in &self.connections {
            if without.map_or(false, |c| c == connection_id) {
                continue;
            }
            let event = ConnectionEvent::IdentifiableEvent(IdentifiableEvent::BySystem {
                system_event: SystemEvent::RoomEvent(room_event.clone()),
            });
            if !self.connection_txs.send(connection_id, event) {
                stalled.push(*connection_id);
            }
        }
        for connection_id in stalled {
            self.drop_member(connection_id);
        }
    }

    fn send(&mut self, to: &ConnectionId, event: IdentifiableEvent) {
        if !self
            .connection_txs
            .send(to, ConnectionEvent::IdentifiableEvent(event))
        {
            self.drop_member(*to);
        }
    }

    /// A peer that cannot receive is torn down instead of stalling the room.
    fn drop_member(&mut self, connection_id: ConnectionId) {
        log::warn!(
            "Dropping connection {} from room {}",
            connection_id,
            self.room_name
        );
        self.connections.retain(|c| *c != connection_id);
        self.connection_txs.remove(&connection_id);
        if self
            .srv_tx
            .try_send(ServerCommand::Connection(ConnectionCommand::Disconnect {
                from: connection_id,
            }))
            .is_err()
        {
            log::warn!("Server is unavailable for disconnect notification");
        }
    }
}

pub fn spawn_room(room_name: String, srv_tx: ServerTx) -> RoomTx {
    let (room_tx, mut room_rx) = channel::<RoomMessage>(64);

    tokio::spawn(async move {
        let mut worker = RoomWorker::new(room_name, srv_tx);
        log::info!("Room worker started: {}", worker.room_name);

        // The channel closes when the directory drops the room's handle.
        while let Some(message) = room_rx.recv().await {
            worker.handle_message(message);
        }
        log::info!("Room worker terminated: {}", worker.room_name);
    });

    room_tx
}
