use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{board::BoardId, task::TaskId};

pub type LabelId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardLabel {
    pub id: LabelId,
    pub board_id: BoardId,
    pub name: String,
    pub color: String,
}

impl BoardLabel {
    pub fn new(board_id: BoardId, name: String, color: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            board_id,
            name,
            color,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBoardLabel {
    pub board_id: BoardId,
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelUpdate {
    pub name: String,
    pub color: String,
}

/// Join entity attaching a board label to a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskLabel {
    pub id: Uuid,
    pub task_id: TaskId,
    pub label_id: LabelId,
}

impl TaskLabel {
    pub fn new(task_id: TaskId, label_id: LabelId) -> Self {
        Self {
            id: Uuid::new_v4(),
            task_id,
            label_id,
        }
    }
}
