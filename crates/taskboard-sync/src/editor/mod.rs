pub mod state;
pub mod task_editor;

pub use state::EditorState;
pub use task_editor::TaskEditor;
