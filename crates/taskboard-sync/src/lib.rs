pub mod drag;
pub mod editor;
pub mod realtime;
pub mod scope;
pub mod store;
pub mod traits;

pub use drag::{DragCoordinator, DragOrigin, DropResolution, DropTarget, MoveIntent, Point};
pub use editor::{EditorState, TaskEditor};
pub use realtime::{
    ChatMessage, ConversationFeed, InProcessChannel, RealtimeChannel, RealtimeEvent, Topic,
};
pub use scope::{ScopedTask, TaskScope};
pub use store::{BoardStore, MoveOutcome};
pub use traits::*;
