mod canvas_storage;
mod client_follower_canvas;
pub mod materialize;
mod message;
mod server_leader_canvas;
mod session_state;
mod traits;
mod types;

pub use canvas_storage::*;
pub use client_follower_canvas::*;
pub use materialize::*;
pub use message::*;
pub use server_leader_canvas::*;
pub use session_state::*;
pub use traits::*;
pub use types::*;

pub extern crate bincode;
pub extern crate euclid;
pub extern crate serde;
pub extern crate serde_json;
