use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::task::TaskId;

pub type UserId = Uuid;

/// Join entity linking a task to a user. Its existence means "assigned".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskAssignee {
    pub id: Uuid,
    pub task_id: TaskId,
    pub user_id: UserId,
}

impl TaskAssignee {
    pub fn new(task_id: TaskId, user_id: UserId) -> Self {
        Self {
            id: Uuid::new_v4(),
            task_id,
            user_id,
        }
    }
}
