use crate::canvas_storage::CanvasSnapshot;
use crate::types::*;
use serde::{Deserialize, Serialize};

/// FatalError makes connection be closed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FatalError {
    pub reason: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IdentifiableCommand {
    pub command_id: CommandId,
    pub system_command: SystemCommand,
}

#[derive(Debug, Serialize, Deserialize)]
pub enum IdentifiableEvent {
    ByMyself {
        command_id: CommandId,
        result: CommandResult,
    },
    BySystem {
        system_event: SystemEvent,
    },
}

#[derive(Debug, Serialize, Deserialize)]
pub enum CommandResult {
    SystemEvent(SystemEvent),
    Error(SystemError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SystemCommand {
    /// Creates the room when the name is unseen; the first joiner's password
    /// becomes the room's password (`None` = open room).
    JoinRoom {
        room_name: String,
        password: Option<String>,
    },
    LeaveRoom,
    RoomCommand(RoomCommand),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SystemEvent {
    JoinedRoom {
        room_name: String,
        room_snapshot: RoomSnapshot,
        canvas_snapshot: CanvasSnapshot,
    },
    LeftRoom,
    RoomEvent(RoomEvent),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SystemError {
    /// Wrong room password. Join refused, reported to the requester only.
    AuthError,
    /// Image operation with no image present. No state change.
    NoImage,
    /// Undo against an empty stroke log. No state change.
    NotFound,
    FatalError(FatalError),
}

impl From<CanvasError> for SystemError {
    fn from(e: CanvasError) -> Self {
        match e {
            CanvasError::NoImage => SystemError::NoImage,
            CanvasError::NotFound => SystemError::NotFound,
        }
    }
}

/// Store-level rejection of an edit. Never broadcast; the sender alone is
/// told, as `SystemError`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CanvasError {
    NoImage,
    NotFound,
}

/// Room-scoped commands, only valid while joined. Live commands are cosmetic
/// feedback relayed as-is and never stored; edit commands mutate the room's
/// canvas under its serialization discipline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RoomCommand {
    Live(LiveCommand),
    Edit(EditCommand),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LiveCommand {
    DrawBegin { color: String, width: f32 },
    DrawAppend { points: Vec<Point> },
    /// Viewport hint for peers re-deriving local layout; the core stores no
    /// canvas dimensions.
    Resize { width: f32, height: f32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EditCommand {
    Chat { text: String },
    DrawCommit { points: Vec<Point>, color: String, width: f32 },
    /// Removes the most recent stroke in the room's log regardless of who
    /// drew it. Shared undo keeps the log a strict sequence.
    Undo,
    ImageUpload { data: Vec<u8>, position: Point },
    ImageMove { position: Point },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RoomEvent {
    Live(LiveEvent),
    Edit(EditEvent),
    RoomStateChanged(RoomSnapshot),
}

/// Relay of another participant's in-flight interaction, stamped with its
/// origin. Lossy by contract: may be dropped under backpressure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LiveEvent {
    DrawStarted {
        from: ConnectionId,
        color: String,
        width: f32,
    },
    DrawProgressed {
        from: ConnectionId,
        points: Vec<Point>,
    },
    ViewportResized {
        from: ConnectionId,
        width: f32,
        height: f32,
    },
}

impl LiveEvent {
    pub fn from_command(from: ConnectionId, command: LiveCommand) -> Self {
        match command {
            LiveCommand::DrawBegin { color, width } => {
                LiveEvent::DrawStarted { from, color, width }
            }
            LiveCommand::DrawAppend { points } => LiveEvent::DrawProgressed { from, points },
            LiveCommand::Resize { width, height } => LiveEvent::ViewportResized {
                from,
                width,
                height,
            },
        }
    }
}

/// A confirmed, store-applied mutation. The only thing followers ever fold
/// into their local state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EditEvent {
    ChatAppended { text: String },
    StrokeCommitted(Stroke),
    StrokeRemoved { stroke_id: StrokeId },
    ImageUploaded(ImageState),
    ImageMoved { position: Point },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub connections: Vec<ConnectionId>,
}

impl RoomSnapshot {
    pub fn participant_count(&self) -> usize {
        self.connections.len()
    }
}
