use std::collections::HashMap;

use tokio::sync::mpsc::{channel, Sender};
use tokio::sync::oneshot;

use system::{
    CommandId, CommandResult, ConnectionId, FatalError, IdentifiableCommand, IdentifiableEvent,
    SystemCommand, SystemError, SystemEvent,
};

use crate::connection::{ConnectionCommand, ConnectionEvent};
use crate::connection_tx_storage::ConnectionTxStorage;
use crate::room::{spawn_room, RoomMessage};
use crate::server_state::ServerState;

pub type ServerTx = Sender<ServerCommand>;

#[derive(Debug)]
pub enum ServerCommand {
    Connection(ConnectionCommand),
    ListRooms {
        tx: oneshot::Sender<HashMap<String, usize>>,
    },
}

/// Central routing task: owns the room directory and the connection roster.
/// Canvas mutation and room fan-out happen in the room workers, so no room
/// blocks another here.
struct Server {
    srv_tx: ServerTx,
    server_state: ServerState,
    connections: ConnectionTxStorage,
}

impl Server {
    fn new(srv_tx: ServerTx) -> Self {
        Self {
            srv_tx,
            server_state: ServerState::new(),
            connections: ConnectionTxStorage::new(),
        }
    }

    async fn handle_server_command(&mut self, command: ServerCommand) {
        match command {
            ServerCommand::Connection(command) => self.handle_connection_command(command).await,
            ServerCommand::ListRooms { tx } => {
                // Best-effort snapshot for the lobby; the requester may be gone.
                let _ = tx.send(self.server_state.room_counts());
            }
        }
    }

    async fn handle_connection_command(&mut self, command: ConnectionCommand) {
        match command {
            ConnectionCommand::Connect { tx } => {
                let connection_id = self.server_state.create_connection();
                self.connections.insert(connection_id, tx);
                self.connections
                    .send(&connection_id, ConnectionEvent::Connected { connection_id });
            }
            ConnectionCommand::Disconnect { from } => {
                self.leave_room(&from);
                if self.connections.remove(&from).is_some() {
                    log::info!("Connection closed: {}", from);
                }
            }
            ConnectionCommand::IdentifiableCommand {
                from,
                command:
                    IdentifiableCommand {
                        command_id,
                        system_command,
                    },
            } => match self.handle_system_command(&from, command_id, system_command) {
                Ok(Some(system_event)) => {
                    self.connections.send(
                        &from,
                        ConnectionEvent::IdentifiableEvent(IdentifiableEvent::ByMyself {
                            command_id,
                            result: CommandResult::SystemEvent(system_event),
                        }),
                    );
                }
                // The room worker replies with an atomically taken snapshot
                // or the command's confirmed event.
                Ok(None) => {}
                Err(system_error) => match system_error {
                    SystemError::FatalError(ref fatal_error) => {
                        log::warn!(
                            "Disconnecting a connection due to fatal error: {}",
                            fatal_error.reason
                        );
                        self.disconnect(&from);
                    }
                    system_error => {
                        self.connections.send(
                            &from,
                            ConnectionEvent::IdentifiableEvent(IdentifiableEvent::ByMyself {
                                command_id,
                                result: CommandResult::Error(system_error),
                            }),
                        );
                    }
                },
            },
        }
    }

    fn handle_system_command(
        &mut self,
        from: &ConnectionId,
        command_id: CommandId,
        command: SystemCommand,
    ) -> Result<Option<SystemEvent>, SystemError> {
        match command {
            SystemCommand::JoinRoom {
                room_name,
                password,
            } => {
                if room_name.is_empty() {
                    return Err(SystemError::FatalError(FatalError {
                        reason: "room name must not be empty".into(),
                    }));
                }
                if self.server_state.connection_location(from).is_some() {
                    return Err(SystemError::FatalError(FatalError {
                        reason: "connection is already in a room".into(),
                    }));
                }
                let tx = self.connections.get(from).cloned().ok_or_else(|| {
                    SystemError::FatalError(FatalError {
                        reason: "connection is not registered".into(),
                    })
                })?;

                if !self.server_state.has_room(&room_name) {
                    let room_tx = spawn_room(room_name.clone(), self.srv_tx.clone());
                    self.server_state
                        .create_room(room_name.clone(), password, room_tx);
                } else if !self.server_state.verify_password(&room_name, &password) {
                    return Err(SystemError::AuthError);
                }

                let mut room_tx = self.server_state.join_room(from, &room_name);
                if room_tx
                    .try_send(RoomMessage::Join {
                        connection_id: *from,
                        command_id,
                        tx,
                    })
                    .is_err()
                {
                    // Roll the roster back so the directory doesn't keep a
                    // ghost member.
                    self.server_state.leave_room(from);
                    return Err(SystemError::FatalError(FatalError {
                        reason: "room is unavailable".into(),
                    }));
                }
                Ok(None)
            }
            SystemCommand::LeaveRoom => {
                if self.leave_room(from) {
                    Ok(Some(SystemEvent::LeftRoom))
                } else {
                    Err(SystemError::FatalError(FatalError {
                        reason: "cannot leave room".into(),
                    }))
                }
            }
            SystemCommand::RoomCommand(room_command) => {
                if let Some(mut room_tx) = self.server_state.room_tx_of(from) {
                    if room_tx
                        .try_send(RoomMessage::Command {
                            from: *from,
                            command_id,
                            command: room_command,
                        })
                        .is_err()
                    {
                        // Lossy under load; the sender gets no reply.
                        log::warn!("Room worker backlogged, command from {} dropped", from);
                    }
                    Ok(None)
                } else {
                    Err(SystemError::FatalError(FatalError {
                        reason: "connection isn't in any room".into(),
                    }))
                }
            }
        }
    }

    /// Removes the connection from its room, if any. The last member's leave
    /// retires the room: the directory drops the handle and the worker's
    /// channel closes behind the final message.
    fn leave_room(&mut self, connection_id: &ConnectionId) -> bool {
        if let Some((room_name, mut room_tx, retired)) = self.server_state.leave_room(connection_id)
        {
            if room_tx
                .try_send(RoomMessage::Leave {
                    connection_id: *connection_id,
                })
                .is_err()
            {
                log::warn!("Room worker is already gone: {}", room_name);
            }
            if retired {
                log::info!("Room retired: {}", room_name);
            }
            true
        } else {
            false
        }
    }

    fn disconnect(&mut self, connection_id: &ConnectionId) {
        self.leave_room(connection_id);
        self.connections.send(
            connection_id,
            ConnectionEvent::Disconnected {
                connection_id: *connection_id,
            },
        );
        self.connections.remove(connection_id);
    }
}

pub fn spawn_server() -> ServerTx {
    let (srv_tx, mut srv_rx) = channel::<ServerCommand>(16);

    let loop_tx = srv_tx.clone();
    tokio::spawn(async move {
        let mut server = Box::new(Server::new(loop_tx));

        while let Some(command) = srv_rx.recv().await {
            server.handle_server_command(command).await;
        }
    });

    return srv_tx;
}
