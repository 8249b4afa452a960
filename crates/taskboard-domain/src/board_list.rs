use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::board::BoardId;

pub type BoardListId = Uuid;

/// A named column of a board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardList {
    pub id: BoardListId,
    pub board_id: BoardId,
    pub name: String,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BoardList {
    pub fn new(board_id: BoardId, name: String, position: i32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            board_id,
            name,
            position,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn update_position(&mut self, position: i32) {
        if self.position != position {
            self.position = position;
            self.updated_at = Utc::now();
        }
    }

    pub fn update_name(&mut self, name: String) {
        self.name = name;
        self.updated_at = Utc::now();
    }
}

/// Payload for creating a list on the remote service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBoardList {
    pub board_id: BoardId,
    pub name: String,
    pub position: i32,
}

/// Payload for updating a list on the remote service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUpdate {
    pub name: String,
    pub position: i32,
}
