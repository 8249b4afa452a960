//! Editing surface for a single task.
//!
//! Title, description and due date are edited in a draft and written in one
//! explicit save. Labels, assignees, comments and attachments each have
//! their own remote endpoint: edits to them show up locally at once, go
//! straight to that endpoint, and are undone on their own if it fails. A
//! failing sub-resource never touches the others.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use taskboard_core::{BoardError, BoardResult, Editable};
use taskboard_domain::{
    AttachmentId, CommentId, FieldUpdate, FileAttachment, LabelId, NewAttachment, Task,
    TaskAssignee, TaskComment, TaskDraft, TaskId, TaskLabel, TaskPatch, UserId,
};
use tokio::sync::Mutex;

use super::state::EditorState;
use crate::scope::TaskScope;
use crate::store::BoardStore;

pub struct TaskEditor {
    task_id: TaskId,
    current_user: UserId,
    store: BoardStore,
    state: Arc<Mutex<EditorState>>,
    scope: TaskScope,
}

impl TaskEditor {
    /// Open a cached task for editing. Comments and attachments are fetched
    /// fresh; a failed fetch is reported in the error field and leaves that
    /// section empty.
    pub async fn open(
        store: &BoardStore,
        task_id: TaskId,
        current_user: UserId,
    ) -> BoardResult<Self> {
        let task = store
            .task(task_id)
            .ok_or_else(|| BoardError::not_found(format!("task {}", task_id)))?;
        let scope = TaskScope::new();
        let remote = store.remote().clone();

        let (comments, attachments) = scope
            .spawn(async move {
                futures::join!(
                    remote.comments.list_by_task(task_id),
                    remote.attachments.list_by_task(task_id)
                )
            })
            .join()
            .await?;

        let mut state = EditorState::new(task);
        match comments {
            Ok(comments) => state.comments = comments,
            Err(e) => {
                tracing::error!("Failed to load comments for task {}: {}", task_id, e);
                state.error = Some(format!("Failed to load comments: {}", e));
            }
        }
        match attachments {
            Ok(attachments) => state.attachments = attachments,
            Err(e) => {
                tracing::error!("Failed to load attachments for task {}: {}", task_id, e);
                state.error = Some(format!("Failed to load attachments: {}", e));
            }
        }

        Ok(Self {
            task_id,
            current_user,
            store: store.clone(),
            state: Arc::new(Mutex::new(state)),
            scope,
        })
    }

    pub fn task_id(&self) -> TaskId {
        self.task_id
    }

    pub async fn state(&self) -> EditorState {
        self.state.lock().await.clone()
    }

    pub async fn error(&self) -> Option<String> {
        self.state.lock().await.error.clone()
    }

    pub async fn clear_error(&self) {
        self.state.lock().await.error = None;
    }

    pub fn close(&self) {
        self.scope.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.scope.is_cancelled()
    }

    // Batched fields

    pub async fn edit(&self, patch: TaskPatch) {
        self.state.lock().await.draft.apply_patch(patch);
    }

    pub async fn set_title(&self, title: String) {
        self.edit(TaskPatch {
            title: Some(title),
            ..TaskPatch::default()
        })
        .await;
    }

    pub async fn set_description(&self, description: Option<String>) {
        self.edit(TaskPatch {
            description: FieldUpdate::from(description),
            ..TaskPatch::default()
        })
        .await;
    }

    pub async fn set_due_date(&self, due_date: Option<DateTime<Utc>>) {
        self.edit(TaskPatch {
            due_date: FieldUpdate::from(due_date),
            ..TaskPatch::default()
        })
        .await;
    }

    /// Write title, description and due date in one call, then push the
    /// result into the board store. Only one save runs at a time.
    pub async fn save_changes(&self) -> BoardResult<Task> {
        self.ensure_open()?;

        let (sent, fallback_list) = {
            let mut state = self.state.lock().await;
            if state.saving {
                return Err(BoardError::Busy("save already in progress".to_string()));
            }
            if let Err(e) = state.draft.validate() {
                state.error = Some(e.to_string());
                return Err(e);
            }
            state.saving = true;
            (state.draft.clone(), state.task.board_list_id)
        };

        // A move that is still in flight settles first, so the update
        // carries the list the task actually ended up in.
        let _writes = self.store.lock_position_writes().await;
        let list_id = self
            .store
            .task(self.task_id)
            .map(|t| t.board_list_id)
            .unwrap_or(fallback_list);
        let result = self
            .store
            .remote()
            .tasks
            .update(self.task_id, sent.to_update(list_id))
            .await;

        // Placement is owned by the store's move path; take whatever the
        // cache holds now rather than what it held before the call.
        let current = self.store.task(self.task_id);
        let mut state = self.state.lock().await;
        state.saving = false;
        match result {
            Ok(mut task) => {
                task.labels = state.labels.clone();
                task.assignees = state.assignees.clone();
                if let Some(current) = &current {
                    task.board_list_id = current.board_list_id;
                    task.position = current.position;
                }
                if state.draft == sent {
                    state.draft = TaskDraft::from_entity(&task);
                }
                state.task = task.clone();
                drop(state);

                match current {
                    Some(_) => self.store.update_task(task.clone())?,
                    None => tracing::debug!("Task {} left the board during save", task.id),
                }
                tracing::info!("Saved task: {} (id: {})", task.title, task.id);
                Ok(task)
            }
            Err(e) => {
                drop(state);
                self.fail("save changes", &e).await;
                Err(e)
            }
        }
    }

    /// Delete the task through the store. Returns whether the editor should
    /// close.
    pub async fn delete_task(&self) -> bool {
        if self.store.remove_task(self.task_id).await {
            self.close();
            true
        } else {
            self.state.lock().await.error = Some("Failed to delete task".to_string());
            false
        }
    }

    // Labels and assignees

    /// Attach the label if missing, detach it if present. Returns whether the
    /// label is attached afterwards.
    pub async fn toggle_label(&self, label_id: LabelId) -> BoardResult<bool> {
        self.ensure_open()?;
        if self.store.snapshot().label(label_id).is_none() {
            let err = BoardError::not_found(format!("label {}", label_id));
            self.state.lock().await.error = Some(err.to_string());
            return Err(err);
        }

        let existing = {
            let mut state = self.state.lock().await;
            match state.labels.iter().position(|l| l.label_id == label_id) {
                Some(idx) => Some(state.labels.remove(idx)),
                None => {
                    state.labels.push(TaskLabel::new(self.task_id, label_id));
                    None
                }
            }
        };

        let client = &self.store.remote().task_labels;
        match existing {
            None => match client.create(self.task_id, label_id).await {
                Ok(link) => {
                    self.put_label(label_id, Some(link.clone())).await;
                    self.sync_store(|task| {
                        task.labels.retain(|l| l.label_id != label_id);
                        task.labels.push(link);
                    })
                    .await;
                    Ok(true)
                }
                Err(e) => {
                    self.put_label(label_id, None).await;
                    self.fail("add label", &e).await;
                    Err(e)
                }
            },
            Some(link) => match client.delete(link.id).await {
                Ok(()) => {
                    self.sync_store(|task| task.labels.retain(|l| l.label_id != label_id))
                        .await;
                    Ok(false)
                }
                Err(e) => {
                    self.put_label(label_id, Some(link)).await;
                    self.fail("remove label", &e).await;
                    Err(e)
                }
            },
        }
    }

    async fn put_label(&self, label_id: LabelId, link: Option<TaskLabel>) {
        let mut state = self.state.lock().await;
        let slot = state.labels.iter().position(|l| l.label_id == label_id);
        match (slot, link) {
            (Some(idx), Some(link)) => state.labels[idx] = link,
            (Some(idx), None) => {
                state.labels.remove(idx);
            }
            (None, Some(link)) => state.labels.push(link),
            (None, None) => {}
        }
    }

    /// Assign the user if unassigned, unassign otherwise. Returns whether the
    /// user is assigned afterwards.
    pub async fn toggle_assignee(&self, user_id: UserId) -> BoardResult<bool> {
        self.ensure_open()?;

        let existing = {
            let mut state = self.state.lock().await;
            match state.assignees.iter().position(|a| a.user_id == user_id) {
                Some(idx) => Some(state.assignees.remove(idx)),
                None => {
                    state
                        .assignees
                        .push(TaskAssignee::new(self.task_id, user_id));
                    None
                }
            }
        };

        let client = &self.store.remote().assignees;
        match existing {
            None => match client.create(self.task_id, user_id).await {
                Ok(link) => {
                    self.put_assignee(user_id, Some(link.clone())).await;
                    self.sync_store(|task| {
                        task.assignees.retain(|a| a.user_id != user_id);
                        task.assignees.push(link);
                    })
                    .await;
                    Ok(true)
                }
                Err(e) => {
                    self.put_assignee(user_id, None).await;
                    self.fail("assign user", &e).await;
                    Err(e)
                }
            },
            Some(link) => match client.delete(link.id).await {
                Ok(()) => {
                    self.sync_store(|task| task.assignees.retain(|a| a.user_id != user_id))
                        .await;
                    Ok(false)
                }
                Err(e) => {
                    self.put_assignee(user_id, Some(link)).await;
                    self.fail("unassign user", &e).await;
                    Err(e)
                }
            },
        }
    }

    async fn put_assignee(&self, user_id: UserId, link: Option<TaskAssignee>) {
        let mut state = self.state.lock().await;
        let slot = state.assignees.iter().position(|a| a.user_id == user_id);
        match (slot, link) {
            (Some(idx), Some(link)) => state.assignees[idx] = link,
            (Some(idx), None) => {
                state.assignees.remove(idx);
            }
            (None, Some(link)) => state.assignees.push(link),
            (None, None) => {}
        }
    }

    // Comments

    pub async fn add_comment(&self, content: &str) -> BoardResult<TaskComment> {
        self.ensure_open()?;
        let content = self.require_text(content, "Comment").await?;

        let pending = TaskComment::new(self.task_id, self.current_user, content.clone());
        let pending_id = pending.id;
        self.state.lock().await.comments.push(pending);

        match self
            .store
            .remote()
            .comments
            .create(self.task_id, content)
            .await
        {
            Ok(comment) => {
                let mut state = self.state.lock().await;
                match state.comments.iter_mut().find(|c| c.id == pending_id) {
                    Some(slot) => *slot = comment.clone(),
                    None => state.comments.push(comment.clone()),
                }
                Ok(comment)
            }
            Err(e) => {
                self.state
                    .lock()
                    .await
                    .comments
                    .retain(|c| c.id != pending_id);
                self.fail("add comment", &e).await;
                Err(e)
            }
        }
    }

    pub async fn edit_comment(
        &self,
        comment_id: CommentId,
        content: &str,
    ) -> BoardResult<TaskComment> {
        self.ensure_open()?;
        let content = self.require_text(content, "Comment").await?;

        let previous = {
            let mut state = self.state.lock().await;
            let Some(comment) = state.comments.iter_mut().find(|c| c.id == comment_id) else {
                return Err(BoardError::not_found(format!("comment {}", comment_id)));
            };
            let previous = comment.clone();
            comment.update_content(content.clone());
            previous
        };

        match self
            .store
            .remote()
            .comments
            .update(comment_id, content)
            .await
        {
            Ok(comment) => {
                self.put_comment(comment.clone()).await;
                Ok(comment)
            }
            Err(e) => {
                self.put_comment(previous).await;
                self.fail("edit comment", &e).await;
                Err(e)
            }
        }
    }

    /// Replace a comment in place; a comment deleted meanwhile stays deleted.
    async fn put_comment(&self, comment: TaskComment) {
        let mut state = self.state.lock().await;
        if let Some(slot) = state.comments.iter_mut().find(|c| c.id == comment.id) {
            *slot = comment;
        }
    }

    pub async fn delete_comment(&self, comment_id: CommentId) -> BoardResult<()> {
        self.ensure_open()?;
        let (index, removed) = {
            let mut state = self.state.lock().await;
            let Some(index) = state.comments.iter().position(|c| c.id == comment_id) else {
                return Err(BoardError::not_found(format!("comment {}", comment_id)));
            };
            (index, state.comments.remove(index))
        };

        match self.store.remote().comments.delete(comment_id).await {
            Ok(()) => Ok(()),
            Err(e) => {
                {
                    let mut state = self.state.lock().await;
                    let index = index.min(state.comments.len());
                    state.comments.insert(index, removed);
                }
                self.fail("delete comment", &e).await;
                Err(e)
            }
        }
    }

    // Attachments

    pub async fn add_attachment(&self, file: NewAttachment) -> BoardResult<FileAttachment> {
        self.ensure_open()?;
        if file.file_name.trim().is_empty() {
            let err = BoardError::validation("File name cannot be empty");
            self.state.lock().await.error = Some(err.to_string());
            return Err(err);
        }

        let pending = file.placeholder(self.task_id);
        let pending_id = pending.id;
        {
            let mut state = self.state.lock().await;
            state.attachments.push(pending);
            state.uploading += 1;
        }

        let result = self
            .store
            .remote()
            .attachments
            .upload(self.task_id, file)
            .await;

        let mut state = self.state.lock().await;
        state.uploading = state.uploading.saturating_sub(1);
        match result {
            Ok(attachment) => {
                match state.attachments.iter_mut().find(|a| a.id == pending_id) {
                    Some(slot) => *slot = attachment.clone(),
                    None => state.attachments.push(attachment.clone()),
                }
                tracing::info!(
                    "Uploaded {} to task {}",
                    attachment.file_name,
                    self.task_id
                );
                Ok(attachment)
            }
            Err(e) => {
                state.attachments.retain(|a| a.id != pending_id);
                drop(state);
                self.fail("upload attachment", &e).await;
                Err(e)
            }
        }
    }

    pub async fn remove_attachment(&self, attachment_id: AttachmentId) -> BoardResult<()> {
        self.ensure_open()?;
        let (index, removed) = {
            let mut state = self.state.lock().await;
            let Some(index) = state
                .attachments
                .iter()
                .position(|a| a.id == attachment_id)
            else {
                return Err(BoardError::not_found(format!(
                    "attachment {}",
                    attachment_id
                )));
            };
            (index, state.attachments.remove(index))
        };

        match self.store.remote().attachments.delete(attachment_id).await {
            Ok(()) => Ok(()),
            Err(e) => {
                {
                    let mut state = self.state.lock().await;
                    let index = index.min(state.attachments.len());
                    state.attachments.insert(index, removed);
                }
                self.fail("remove attachment", &e).await;
                Err(e)
            }
        }
    }

    // Helpers

    fn ensure_open(&self) -> BoardResult<()> {
        if self.is_closed() {
            return Err(BoardError::Cancelled(format!(
                "editor for task {} is closed",
                self.task_id
            )));
        }
        Ok(())
    }

    async fn require_text(&self, text: &str, what: &str) -> BoardResult<String> {
        let text = text.trim();
        if text.is_empty() {
            let err = BoardError::validation(format!("{} cannot be empty", what));
            self.state.lock().await.error = Some(err.to_string());
            return Err(err);
        }
        Ok(text.to_string())
    }

    async fn fail(&self, action: &str, err: &BoardError) {
        tracing::error!("Failed to {} on task {}: {}", action, self.task_id, err);
        self.state.lock().await.error = Some(format!("Failed to {}: {}", action, err));
    }

    /// Apply a confirmed sub-resource change to the store's copy of the task.
    /// The remote write already happened, so a failure here only surfaces as
    /// the editor error.
    async fn sync_store(&self, edit: impl FnOnce(&mut Task)) {
        let result = match self.store.task(self.task_id) {
            Some(mut task) => {
                edit(&mut task);
                self.store.update_task(task)
            }
            None => Err(BoardError::not_found(format!("task {}", self.task_id))),
        };
        if let Err(e) = result {
            self.fail("sync board", &e).await;
        }
    }
}

impl Drop for TaskEditor {
    fn drop(&mut self) {
        self.scope.cancel();
    }
}
