use crate::connection::ConnectionEvent;
use std::collections::HashMap;
use system::ConnectionId;

pub type ConnectionTx = tokio::sync::mpsc::Sender<ConnectionEvent>;

pub struct ConnectionTxStorage {
    connection_txs: HashMap<ConnectionId, ConnectionTx>,
}

impl ConnectionTxStorage {
    pub fn new() -> Self {
        Self {
            connection_txs: HashMap::new(),
        }
    }

    pub fn insert(&mut self, connection_id: ConnectionId, tx: ConnectionTx) {
        self.connection_txs.insert(connection_id, tx);
    }

    pub fn get(&self, connection_id: &ConnectionId) -> Option<&ConnectionTx> {
        self.connection_txs.get(connection_id)
    }

    /// Bounded, non-blocking delivery. Returns false when the peer's queue
    /// is full or closed; the caller treats that peer as disconnected rather
    /// than letting it stall anyone else.
    pub fn send(&mut self, to: &ConnectionId, message: ConnectionEvent) -> bool {
        if let Some(tx) = self.connection_txs.get_mut(&to) {
            match tx.try_send(message) {
                Ok(()) => true,
                Err(err) => {
                    log::warn!("Connection {} cannot receive: {}", to, err);
                    false
                }
            }
        } else {
            log::warn!("Unknown connection: {}", to);
            false
        }
    }

    pub fn remove(&mut self, connection_id: &ConnectionId) -> Option<ConnectionTx> {
        self.connection_txs.remove(connection_id)
    }
}
