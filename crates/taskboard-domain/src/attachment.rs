use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::task::TaskId;

pub type AttachmentId = Uuid;

/// A file stored by the remote service and linked to a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAttachment {
    pub id: AttachmentId,
    pub task_id: TaskId,
    pub file_name: String,
    pub content_type: String,
    pub size: u64,
    pub url: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

/// An upload that has not reached the remote service yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAttachment {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl NewAttachment {
    pub fn new(file_name: String, content_type: String, bytes: Vec<u8>) -> Self {
        Self {
            file_name,
            content_type,
            bytes,
        }
    }

    /// Local stand-in shown while the upload is in flight. It has no url
    /// until the remote service returns the stored file.
    pub fn placeholder(&self, task_id: TaskId) -> FileAttachment {
        FileAttachment {
            id: Uuid::new_v4(),
            task_id,
            file_name: self.file_name.clone(),
            content_type: self.content_type.clone(),
            size: self.bytes.len() as u64,
            url: None,
            uploaded_at: Utc::now(),
        }
    }
}
