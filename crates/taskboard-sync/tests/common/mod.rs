#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Arc, Mutex};
use taskboard_core::{BoardError, BoardResult};
use taskboard_domain::{
    AttachmentId, Board, BoardId, BoardLabel, BoardList, BoardListId, BoardSnapshot, CommentId,
    FileAttachment, LabelId, LabelUpdate, ListPosition, ListUpdate, NewAttachment,
    NewBoardLabel, NewBoardList, NewTask, Task, TaskAssignee, TaskComment, TaskId, TaskLabel,
    TaskPosition, TaskUpdate, UserId,
};
use taskboard_sync::{
    AttachmentClient, BoardClient, BoardLabelClient, BoardListClient, BoardStore, RemoteClients,
    TaskAssigneeClient, TaskClient, TaskCommentClient, TaskLabelClient,
};
use tokio::sync::Notify;
use uuid::Uuid;

/// Holds a remote call open until the test releases it.
#[derive(Default)]
pub struct Gate {
    pub entered: Notify,
    pub release: Notify,
}

impl Gate {
    async fn pass(&self) {
        self.entered.notify_one();
        self.release.notified().await;
    }
}

#[derive(Default)]
struct ServerState {
    board: BoardSnapshot,
    comments: Vec<TaskComment>,
    attachments: Vec<FileAttachment>,
    position_calls: Vec<Vec<TaskPosition>>,
    fail_positions: bool,
    fail_next_positions: bool,
    fail_uploads: bool,
    upload_gate: Option<Arc<Gate>>,
    update_gate: Option<Arc<Gate>>,
    /// Taken by the next position update only.
    position_gate: Option<Arc<Gate>>,
    comment_author: UserId,
}

/// In-memory stand-in for the remote board service.
#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<ServerState>,
}

impl FakeBackend {
    pub fn new(board: BoardSnapshot) -> Arc<Self> {
        let backend = Self::default();
        backend.with(|s| s.board = board);
        Arc::new(backend)
    }

    /// Board with one list per name; list `i` holds `tasks_per_list[i]` tasks.
    pub fn seeded(names: &[&str], tasks_per_list: &[usize]) -> Arc<Self> {
        let board = Board::new(Uuid::new_v4(), Uuid::new_v4(), "Demo Day".to_string());
        let mut lists = Vec::new();
        let mut tasks = Vec::new();
        for (i, name) in names.iter().enumerate() {
            let list = BoardList::new(board.id, name.to_string(), i as i32);
            let count = tasks_per_list.get(i).copied().unwrap_or(0);
            for n in 0..count {
                tasks.push(Task::new(list.id, format!("{} #{}", name, n + 1), n as i32));
            }
            lists.push(list);
        }
        Self::new(BoardSnapshot::from_parts(board, lists, tasks, vec![]))
    }

    fn with<R>(&self, f: impl FnOnce(&mut ServerState) -> R) -> R {
        let mut state = self.state.lock().unwrap();
        f(&mut state)
    }

    pub fn board(&self) -> BoardSnapshot {
        self.with(|s| s.board.clone())
    }

    pub fn store(self: &Arc<Self>) -> BoardStore {
        let store = BoardStore::new(RemoteClients::from_backend(self.clone()));
        store.load_board(self.board());
        store
    }

    pub fn position_calls(&self) -> Vec<Vec<TaskPosition>> {
        self.with(|s| s.position_calls.clone())
    }

    pub fn fail_positions(&self) {
        self.with(|s| s.fail_positions = true);
    }

    /// Reject only the next task position update.
    pub fn fail_next_positions(&self) {
        self.with(|s| s.fail_next_positions = true);
    }

    /// Hold the next task position update open; later ones pass straight
    /// through.
    pub fn gate_next_positions(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        self.with(|s| s.position_gate = Some(gate.clone()));
        gate
    }

    pub fn fail_uploads(&self) {
        self.with(|s| s.fail_uploads = true);
    }

    pub fn gate_uploads(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        self.with(|s| s.upload_gate = Some(gate.clone()));
        gate
    }

    pub fn gate_updates(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        self.with(|s| s.update_gate = Some(gate.clone()));
        gate
    }

    pub fn add_label(&self, name: &str) -> BoardLabel {
        self.with(|s| {
            let board_id = s.board.board_id().unwrap();
            let label = BoardLabel::new(board_id, name.to_string(), "#0ea5e9".to_string());
            s.board.upsert_label(label.clone());
            label
        })
    }

    pub fn set_comment_author(&self, author: UserId) {
        self.with(|s| s.comment_author = author);
    }

    pub fn comments(&self) -> Vec<TaskComment> {
        self.with(|s| s.comments.clone())
    }
}

#[async_trait]
impl BoardClient for FakeBackend {
    async fn fetch_board(&self, board_id: BoardId) -> BoardResult<BoardSnapshot> {
        self.with(|s| match s.board.board_id() {
            Some(id) if id == board_id => Ok(s.board.clone()),
            _ => Err(BoardError::remote("404 Not Found")),
        })
    }
}

#[async_trait]
impl TaskClient for FakeBackend {
    async fn create(&self, new_task: NewTask) -> BoardResult<Task> {
        self.with(|s| {
            let mut task = Task::new(new_task.board_list_id, new_task.title, new_task.position);
            task.description = new_task.description;
            task.due_date = new_task.due_date;
            s.board.upsert_task(task.clone())?;
            Ok(task)
        })
    }

    async fn update(&self, id: TaskId, update: TaskUpdate) -> BoardResult<Task> {
        let gate = self.with(|s| s.update_gate.clone());
        if let Some(gate) = gate {
            gate.pass().await;
        }
        self.with(|s| {
            let mut task = s
                .board
                .task(id)
                .cloned()
                .ok_or_else(|| BoardError::remote("404 Not Found"))?;
            task.title = update.title;
            task.description = update.description;
            task.due_date = update.due_date;
            task.board_list_id = update.board_list_id;
            task.updated_at = Utc::now();
            s.board.upsert_task(task.clone())?;
            Ok(task)
        })
    }

    async fn delete(&self, id: TaskId) -> BoardResult<()> {
        self.with(|s| {
            s.board
                .remove_task(id)
                .map(|_| ())
                .ok_or_else(|| BoardError::remote("404 Not Found"))
        })
    }

    async fn update_positions(&self, positions: Vec<TaskPosition>) -> BoardResult<()> {
        let gate = self.with(|s| s.position_gate.take());
        if let Some(gate) = gate {
            gate.pass().await;
        }
        self.with(|s| {
            s.position_calls.push(positions.clone());
            if s.fail_positions || std::mem::take(&mut s.fail_next_positions) {
                return Err(BoardError::remote("503 Service Unavailable"));
            }
            s.board.place_tasks(&positions);
            Ok(())
        })
    }
}

#[async_trait]
impl BoardListClient for FakeBackend {
    async fn create(&self, new_list: NewBoardList) -> BoardResult<BoardList> {
        self.with(|s| {
            let list = BoardList::new(new_list.board_id, new_list.name, new_list.position);
            s.board.upsert_list(list.clone());
            Ok(list)
        })
    }

    async fn update(&self, id: BoardListId, update: ListUpdate) -> BoardResult<BoardList> {
        self.with(|s| {
            let mut list = s
                .board
                .bucket(id)
                .map(|b| b.list.clone())
                .ok_or_else(|| BoardError::remote("404 Not Found"))?;
            list.update_name(update.name);
            list.update_position(update.position);
            s.board.upsert_list(list.clone());
            Ok(list)
        })
    }

    async fn delete(&self, id: BoardListId) -> BoardResult<()> {
        self.with(|s| {
            s.board.remove_list(id);
            Ok(())
        })
    }

    async fn update_positions(&self, positions: Vec<ListPosition>) -> BoardResult<()> {
        self.with(|s| {
            s.board.place_lists(&positions);
            Ok(())
        })
    }
}

#[async_trait]
impl BoardLabelClient for FakeBackend {
    async fn create(&self, new_label: NewBoardLabel) -> BoardResult<BoardLabel> {
        self.with(|s| {
            let label = BoardLabel::new(new_label.board_id, new_label.name, new_label.color);
            s.board.upsert_label(label.clone());
            Ok(label)
        })
    }

    async fn update(&self, id: LabelId, update: LabelUpdate) -> BoardResult<BoardLabel> {
        self.with(|s| {
            let mut label = s
                .board
                .label(id)
                .cloned()
                .ok_or_else(|| BoardError::remote("404 Not Found"))?;
            label.name = update.name;
            label.color = update.color;
            s.board.upsert_label(label.clone());
            Ok(label)
        })
    }

    async fn delete(&self, id: LabelId) -> BoardResult<()> {
        self.with(|s| {
            s.board.remove_label(id);
            Ok(())
        })
    }
}

#[async_trait]
impl TaskLabelClient for FakeBackend {
    async fn create(&self, task_id: TaskId, label_id: LabelId) -> BoardResult<TaskLabel> {
        Ok(TaskLabel::new(task_id, label_id))
    }

    async fn delete(&self, _id: Uuid) -> BoardResult<()> {
        Ok(())
    }
}

#[async_trait]
impl TaskAssigneeClient for FakeBackend {
    async fn create(&self, task_id: TaskId, user_id: UserId) -> BoardResult<TaskAssignee> {
        Ok(TaskAssignee::new(task_id, user_id))
    }

    async fn delete(&self, _id: Uuid) -> BoardResult<()> {
        Ok(())
    }
}

#[async_trait]
impl TaskCommentClient for FakeBackend {
    async fn list_by_task(&self, task_id: TaskId) -> BoardResult<Vec<TaskComment>> {
        self.with(|s| {
            Ok(s.comments
                .iter()
                .filter(|c| c.task_id == task_id)
                .cloned()
                .collect())
        })
    }

    async fn create(&self, task_id: TaskId, content: String) -> BoardResult<TaskComment> {
        self.with(|s| {
            let comment = TaskComment::new(task_id, s.comment_author, content);
            s.comments.push(comment.clone());
            Ok(comment)
        })
    }

    async fn update(&self, id: CommentId, content: String) -> BoardResult<TaskComment> {
        self.with(|s| {
            let comment = s
                .comments
                .iter_mut()
                .find(|c| c.id == id)
                .ok_or_else(|| BoardError::remote("404 Not Found"))?;
            comment.update_content(content);
            Ok(comment.clone())
        })
    }

    async fn delete(&self, id: CommentId) -> BoardResult<()> {
        self.with(|s| {
            s.comments.retain(|c| c.id != id);
            Ok(())
        })
    }
}

#[async_trait]
impl AttachmentClient for FakeBackend {
    async fn list_by_task(&self, task_id: TaskId) -> BoardResult<Vec<FileAttachment>> {
        self.with(|s| {
            Ok(s.attachments
                .iter()
                .filter(|a| a.task_id == task_id)
                .cloned()
                .collect())
        })
    }

    async fn upload(&self, task_id: TaskId, file: NewAttachment) -> BoardResult<FileAttachment> {
        let gate = self.with(|s| s.upload_gate.clone());
        if let Some(gate) = gate {
            gate.pass().await;
        }
        self.with(|s| {
            if s.fail_uploads {
                return Err(BoardError::remote("413 Payload Too Large"));
            }
            let mut stored = file.placeholder(task_id);
            stored.url = Some(format!("https://files.example.test/{}", stored.id));
            s.attachments.push(stored.clone());
            Ok(stored)
        })
    }

    async fn delete(&self, id: AttachmentId) -> BoardResult<()> {
        self.with(|s| {
            s.attachments.retain(|a| a.id != id);
            Ok(())
        })
    }
}
