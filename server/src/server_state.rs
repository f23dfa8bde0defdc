use crate::room::RoomTx;
use std::collections::HashMap;
use std::num::Wrapping;
use system::ConnectionId;

/// Directory entry for one active room. The worker task ends when this
/// handle (the last clone of its sender) is dropped.
pub struct RoomHandle {
    pub tx: RoomTx,
    pub password: Option<String>,
    pub connections: Vec<ConnectionId>,
}

pub struct ServerState {
    connection_id_source: Wrapping<ConnectionId>,
    connection_locations: HashMap<ConnectionId, String>,
    rooms: HashMap<String, RoomHandle>,
}

impl ServerState {
    pub fn new() -> Self {
        Self {
            connection_id_source: Wrapping(0),
            connection_locations: HashMap::new(),
            rooms: HashMap::new(),
        }
    }

    pub fn create_connection(&mut self) -> ConnectionId {
        self.connection_id_source += Wrapping(1);
        self.connection_id_source.0
    }

    pub fn has_room(&self, room_name: &str) -> bool {
        self.rooms.contains_key(room_name)
    }

    /// Plaintext compare against the password fixed at creation. `None`
    /// joins `None` (open room); anything else must match exactly.
    pub fn verify_password(&self, room_name: &str, password: &Option<String>) -> bool {
        self.rooms
            .get(room_name)
            .map(|handle| &handle.password == password)
            .unwrap_or(false)
    }

    pub fn create_room(&mut self, room_name: String, password: Option<String>, tx: RoomTx) {
        log::info!("Room created: {}", room_name);
        self.rooms.insert(
            room_name,
            RoomHandle {
                tx,
                password,
                connections: Vec::new(),
            },
        );
    }

    pub fn join_room(&mut self, connection_id: &ConnectionId, room_name: &str) -> RoomTx {
        let handle = self.rooms.get_mut(room_name).expect("room must exist");
        handle.connections.push(*connection_id);
        self.connection_locations
            .insert(*connection_id, room_name.to_owned());
        log::info!("Connection {} joined room {}", connection_id, room_name);
        handle.tx.clone()
    }

    /// Removes the connection from its room. Returns the room's name, its
    /// worker sender, and whether this was the last member (room retired).
    pub fn leave_room(
        &mut self,
        connection_id: &ConnectionId,
    ) -> Option<(String, RoomTx, bool)> {
        let room_name = self.connection_locations.remove(connection_id)?;
        let handle = self.rooms.get_mut(&room_name)?;
        handle.connections.retain(|c| c != connection_id);
        let tx = handle.tx.clone();
        let retired = handle.connections.is_empty();
        if retired {
            self.rooms.remove(&room_name);
        }
        Some((room_name, tx, retired))
    }

    pub fn connection_location(&self, connection_id: &ConnectionId) -> Option<&String> {
        self.connection_locations.get(connection_id)
    }

    pub fn room_tx_of(&self, connection_id: &ConnectionId) -> Option<RoomTx> {
        self.connection_location(connection_id)
            .and_then(|room_name| self.rooms.get(room_name))
            .map(|handle| handle.tx.clone())
    }

    pub fn room_counts(&self) -> HashMap<String, usize> {
        self.rooms
            .iter()
            .map(|(room_name, handle)| (room_name.clone(), handle.connections.len()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room_tx() -> RoomTx {
        tokio::sync::mpsc::channel(1).0
    }

    #[test]
    fn it_retires_room_when_all_connections_leave() {
        let mut state = ServerState::new();
        state.create_room("alpha".into(), None, room_tx());

        let c1 = state.create_connection();
        let c2 = state.create_connection();
        state.join_room(&c1, "alpha");
        state.join_room(&c2, "alpha");
        assert_eq!(state.room_counts().get("alpha"), Some(&2));

        let (_, _, retired) = state.leave_room(&c1).expect("was joined");
        assert!(!retired);
        let (_, _, retired) = state.leave_room(&c2).expect("was joined");
        assert!(retired);
        assert!(state.room_counts().is_empty());
    }

    #[test]
    fn it_verifies_password_without_touching_roster() {
        let mut state = ServerState::new();
        state.create_room("beta".into(), Some("x".into()), room_tx());

        assert!(state.verify_password("beta", &Some("x".into())));
        assert!(!state.verify_password("beta", &Some("y".into())));
        assert!(!state.verify_password("beta", &None));
        assert_eq!(state.room_counts().get("beta"), Some(&0));
    }

    #[test]
    fn it_treats_absent_password_as_open_room() {
        let mut state = ServerState::new();
        state.create_room("open".into(), None, room_tx());

        assert!(state.verify_password("open", &None));
        assert!(!state.verify_password("open", &Some("x".into())));
    }

    #[test]
    fn it_leaves_unjoined_connections_alone() {
        let mut state = ServerState::new();
        let c1 = state.create_connection();
        assert!(state.leave_room(&c1).is_none());
        assert!(state.room_tx_of(&c1).is_none());
    }
}
