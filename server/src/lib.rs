pub extern crate actix_web;

pub mod connection;
mod connection_tx_storage;
pub mod handlers;
mod room;
pub mod server;
mod server_state;
