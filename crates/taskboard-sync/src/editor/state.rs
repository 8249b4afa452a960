use taskboard_core::Editable;
use taskboard_domain::{
    FileAttachment, LabelId, Task, TaskAssignee, TaskComment, TaskDraft, TaskLabel, UserId,
};

/// Everything the task edit surface renders.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorState {
    /// The task as last confirmed by the remote service.
    pub task: Task,
    /// Unsaved title, description and due date.
    pub draft: TaskDraft,
    pub labels: Vec<TaskLabel>,
    pub assignees: Vec<TaskAssignee>,
    pub comments: Vec<TaskComment>,
    pub attachments: Vec<FileAttachment>,
    /// Most recent failure, shown at the top of the editor.
    pub error: Option<String>,
    /// A save is in flight; the save action is disabled meanwhile.
    pub saving: bool,
    /// Uploads in flight.
    pub uploading: usize,
}

impl EditorState {
    pub fn new(task: Task) -> Self {
        Self {
            draft: TaskDraft::from_entity(&task),
            labels: task.labels.clone(),
            assignees: task.assignees.clone(),
            task,
            comments: Vec::new(),
            attachments: Vec::new(),
            error: None,
            saving: false,
            uploading: 0,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.draft.differs_from(&self.task)
    }

    pub fn has_label(&self, label_id: LabelId) -> bool {
        self.labels.iter().any(|l| l.label_id == label_id)
    }

    pub fn has_assignee(&self, user_id: UserId) -> bool {
        self.assignees.iter().any(|a| a.user_id == user_id)
    }
}
