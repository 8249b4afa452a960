use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    assignee::{TaskAssignee, UserId},
    board_list::BoardListId,
    label::{LabelId, TaskLabel},
};

pub type TaskId = Uuid;

/// A work card as cached by the board. Comments and attachments are not part
/// of this shape; they are fetched when a task is opened for editing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub board_list_id: BoardListId,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub position: i32,
    #[serde(default)]
    pub labels: Vec<TaskLabel>,
    #[serde(default)]
    pub assignees: Vec<TaskAssignee>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn new(board_list_id: BoardListId, title: String, position: i32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            board_list_id,
            title,
            description: None,
            due_date: None,
            position,
            labels: Vec::new(),
            assignees: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn move_to_list(&mut self, board_list_id: BoardListId, position: i32) {
        if self.board_list_id != board_list_id || self.position != position {
            self.board_list_id = board_list_id;
            self.position = position;
            self.updated_at = Utc::now();
        }
    }

    pub fn update_description(&mut self, description: Option<String>) {
        self.description = description;
        self.updated_at = Utc::now();
    }

    pub fn has_label(&self, label_id: LabelId) -> bool {
        self.labels.iter().any(|l| l.label_id == label_id)
    }

    pub fn has_assignee(&self, user_id: UserId) -> bool {
        self.assignees.iter().any(|a| a.user_id == user_id)
    }

    pub fn label_ids(&self) -> Vec<LabelId> {
        self.labels.iter().map(|l| l.label_id).collect()
    }
}

/// Payload for creating a task on the remote service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub position: i32,
    pub board_list_id: BoardListId,
    pub due_date: Option<DateTime<Utc>>,
}

impl NewTask {
    pub fn new(board_list_id: BoardListId, title: String) -> Self {
        Self {
            title,
            description: None,
            position: 0,
            board_list_id,
            due_date: None,
        }
    }
}

/// Payload for the single task-update endpoint. The remote service replaces
/// all four fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdate {
    pub title: String,
    pub description: Option<String>,
    pub board_list_id: BoardListId,
    pub due_date: Option<DateTime<Utc>>,
}

impl From<&Task> for TaskUpdate {
    fn from(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            board_list_id: task.board_list_id,
            due_date: task.due_date,
        }
    }
}
