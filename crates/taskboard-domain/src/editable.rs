use chrono::{DateTime, Utc};
use taskboard_core::{BoardError, BoardResult, Editable};

use crate::{board_list::BoardListId, FieldUpdate, Task, TaskUpdate};

/// The batched part of a task edit: title, description and due date. These
/// fields are only written to the remote service on an explicit save.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
}

/// A single field-level edit to a draft.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: FieldUpdate<String>,
    pub due_date: FieldUpdate<DateTime<Utc>>,
}

impl TaskDraft {
    pub fn apply_patch(&mut self, patch: TaskPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        patch.description.apply_to(&mut self.description);
        patch.due_date.apply_to(&mut self.due_date);
    }

    /// Checks run before any remote call.
    pub fn validate(&self) -> BoardResult<()> {
        if self.title.trim().is_empty() {
            return Err(BoardError::validation("Title is required"));
        }
        Ok(())
    }

    pub fn differs_from(&self, task: &Task) -> bool {
        self.title != task.title
            || self.description != task.description
            || self.due_date != task.due_date
    }

    pub fn to_update(&self, board_list_id: BoardListId) -> TaskUpdate {
        TaskUpdate {
            title: self.title.trim().to_string(),
            // An emptied description box clears the field.
            description: self
                .description
                .as_ref()
                .map(|d| d.trim())
                .filter(|d| !d.is_empty())
                .map(str::to_string),
            board_list_id,
            due_date: self.due_date,
        }
    }
}

impl Editable<Task> for TaskDraft {
    fn from_entity(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            due_date: task.due_date,
        }
    }

    fn apply_to(self, task: &mut Task) {
        task.title = self.title;
        task.description = self.description;
        task.due_date = self.due_date;
        task.updated_at = Utc::now();
    }
}
