pub mod assignee;
pub mod attachment;
pub mod board;
pub mod board_list;
pub mod comment;
pub mod editable;
pub mod field_update;
pub mod label;
pub mod position;
pub mod snapshot;
pub mod task;

pub use assignee::{TaskAssignee, UserId};
pub use attachment::{AttachmentId, FileAttachment, NewAttachment};
pub use board::{Board, BoardId};
pub use board_list::{BoardList, BoardListId, ListUpdate, NewBoardList};
pub use comment::{CommentId, TaskComment};
pub use editable::{TaskDraft, TaskPatch};
pub use field_update::FieldUpdate;
pub use label::{BoardLabel, LabelId, LabelUpdate, NewBoardLabel, TaskLabel};
pub use position::{
    plan_list_move, plan_task_move, ListMove, ListMovePlan, ListPosition, TaskMove, TaskMovePlan,
    TaskPosition,
};
pub use snapshot::{BoardSnapshot, ListBucket};
pub use task::{NewTask, Task, TaskId, TaskUpdate};
