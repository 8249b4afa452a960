//! Contracts of the remote board service.
//!
//! The REST and WebSocket clients live outside this crate. Each trait returns
//! the canonical entity as persisted by the server; the store and editor
//! reconcile their local copies against it.

use async_trait::async_trait;
use std::sync::Arc;
use taskboard_core::BoardResult;
use taskboard_domain::{
    AttachmentId, BoardId, BoardLabel, BoardList, BoardListId, BoardSnapshot, CommentId,
    FileAttachment, LabelId, LabelUpdate, ListPosition, ListUpdate, NewAttachment,
    NewBoardLabel, NewBoardList, NewTask, Task, TaskAssignee, TaskComment, TaskId, TaskLabel,
    TaskPosition, TaskUpdate, UserId,
};
use uuid::Uuid;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BoardClient: Send + Sync {
    /// Fetch lists, tasks and labels of a board in one snapshot.
    async fn fetch_board(&self, board_id: BoardId) -> BoardResult<BoardSnapshot>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskClient: Send + Sync {
    async fn create(&self, task: NewTask) -> BoardResult<Task>;
    async fn update(&self, id: TaskId, update: TaskUpdate) -> BoardResult<Task>;
    async fn delete(&self, id: TaskId) -> BoardResult<()>;

    /// Reassign list and position of several tasks in one call.
    async fn update_positions(&self, positions: Vec<TaskPosition>) -> BoardResult<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BoardListClient: Send + Sync {
    async fn create(&self, list: NewBoardList) -> BoardResult<BoardList>;
    async fn update(&self, id: BoardListId, update: ListUpdate) -> BoardResult<BoardList>;
    async fn delete(&self, id: BoardListId) -> BoardResult<()>;
    async fn update_positions(&self, positions: Vec<ListPosition>) -> BoardResult<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BoardLabelClient: Send + Sync {
    async fn create(&self, label: NewBoardLabel) -> BoardResult<BoardLabel>;
    async fn update(&self, id: LabelId, update: LabelUpdate) -> BoardResult<BoardLabel>;
    async fn delete(&self, id: LabelId) -> BoardResult<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskLabelClient: Send + Sync {
    async fn create(&self, task_id: TaskId, label_id: LabelId) -> BoardResult<TaskLabel>;
    async fn delete(&self, id: Uuid) -> BoardResult<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskAssigneeClient: Send + Sync {
    async fn create(&self, task_id: TaskId, user_id: UserId) -> BoardResult<TaskAssignee>;
    async fn delete(&self, id: Uuid) -> BoardResult<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskCommentClient: Send + Sync {
    async fn list_by_task(&self, task_id: TaskId) -> BoardResult<Vec<TaskComment>>;
    async fn create(&self, task_id: TaskId, content: String) -> BoardResult<TaskComment>;
    async fn update(&self, id: CommentId, content: String) -> BoardResult<TaskComment>;
    async fn delete(&self, id: CommentId) -> BoardResult<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AttachmentClient: Send + Sync {
    async fn list_by_task(&self, task_id: TaskId) -> BoardResult<Vec<FileAttachment>>;
    async fn upload(&self, task_id: TaskId, file: NewAttachment) -> BoardResult<FileAttachment>;
    async fn delete(&self, id: AttachmentId) -> BoardResult<()>;
}

/// Every remote collaborator the board needs, injected as one bundle.
#[derive(Clone)]
pub struct RemoteClients {
    pub boards: Arc<dyn BoardClient>,
    pub tasks: Arc<dyn TaskClient>,
    pub lists: Arc<dyn BoardListClient>,
    pub labels: Arc<dyn BoardLabelClient>,
    pub task_labels: Arc<dyn TaskLabelClient>,
    pub assignees: Arc<dyn TaskAssigneeClient>,
    pub comments: Arc<dyn TaskCommentClient>,
    pub attachments: Arc<dyn AttachmentClient>,
}

impl RemoteClients {
    /// Bundle a single backend object that implements every client trait.
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: BoardClient
            + TaskClient
            + BoardListClient
            + BoardLabelClient
            + TaskLabelClient
            + TaskAssigneeClient
            + TaskCommentClient
            + AttachmentClient
            + 'static,
    {
        Self {
            boards: backend.clone(),
            tasks: backend.clone(),
            lists: backend.clone(),
            labels: backend.clone(),
            task_labels: backend.clone(),
            assignees: backend.clone(),
            comments: backend.clone(),
            attachments: backend,
        }
    }
}
