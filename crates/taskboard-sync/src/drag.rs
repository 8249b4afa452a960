//! Drag-and-drop coordination for task cards.
//!
//! Pointer gestures come in as down/move/hover/up calls. A press only becomes
//! a drag once the pointer travels past a small threshold, so a plain click
//! never moves anything. The sortable widget's collision heuristic decides
//! which slot is hovered; this module only records its answer. A gesture
//! yields at most one move intent, and only on release.

use taskboard_core::{BoardError, BoardResult, SyncConfig, DEFAULT_DRAG_THRESHOLD_PX};
use taskboard_domain::{BoardListId, BoardSnapshot, TaskId};

use crate::store::{BoardStore, MoveOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A slot reported by the sortable widget: insert at `index` of `list_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropTarget {
    pub list_id: BoardListId,
    pub index: usize,
}

/// Where the dragged task sat when the gesture started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragOrigin {
    pub task_id: TaskId,
    pub list_id: BoardListId,
    pub index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveIntent {
    pub task_id: TaskId,
    pub target_list_id: BoardListId,
    pub target_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropResolution {
    /// No gesture was in progress.
    Idle,
    /// Released before passing the threshold.
    Click(TaskId),
    /// Released outside every drop target.
    NoTarget(TaskId),
    /// Released on the slot it started from.
    SamePosition(TaskId),
    Move(MoveIntent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DragState {
    Idle,
    Pending {
        origin: DragOrigin,
        start: Point,
    },
    Dragging {
        origin: DragOrigin,
        hover: Option<DropTarget>,
    },
}

#[derive(Debug)]
pub struct DragCoordinator {
    state: DragState,
    threshold_px: i32,
}

impl DragCoordinator {
    pub fn new() -> Self {
        Self::with_threshold(DEFAULT_DRAG_THRESHOLD_PX)
    }

    pub fn with_threshold(threshold_px: i32) -> Self {
        Self {
            state: DragState::Idle,
            threshold_px: threshold_px.max(0),
        }
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        Self::with_threshold(config.effective_drag_threshold_px())
    }

    /// Press on a task card. Captures the card's current list and index.
    pub fn pointer_down(
        &mut self,
        snapshot: &BoardSnapshot,
        task_id: TaskId,
        at: Point,
    ) -> BoardResult<()> {
        let (list_idx, index) = snapshot
            .locate_task(task_id)
            .ok_or_else(|| BoardError::not_found(format!("task {}", task_id)))?;
        let origin = DragOrigin {
            task_id,
            list_id: snapshot.lists[list_idx].id(),
            index,
        };
        self.state = DragState::Pending { origin, start: at };
        Ok(())
    }

    /// Returns whether a drag is in progress after this movement.
    pub fn pointer_move(&mut self, at: Point) -> bool {
        if let DragState::Pending { origin, start } = self.state {
            let dx = (at.x - start.x).abs();
            let dy = (at.y - start.y).abs();
            if dx > self.threshold_px || dy > self.threshold_px {
                tracing::debug!("Started dragging task {}", origin.task_id);
                self.state = DragState::Dragging {
                    origin,
                    hover: None,
                };
            }
        }
        self.is_dragging()
    }

    /// Record the slot currently under the pointer, or `None` when the
    /// pointer left every drop target. Ignored unless dragging.
    pub fn hover(&mut self, target: Option<DropTarget>) {
        if let DragState::Dragging { hover, .. } = &mut self.state {
            *hover = target;
        }
    }

    pub fn pointer_up(&mut self) -> DropResolution {
        let state = std::mem::replace(&mut self.state, DragState::Idle);
        match state {
            DragState::Idle => DropResolution::Idle,
            DragState::Pending { origin, .. } => DropResolution::Click(origin.task_id),
            DragState::Dragging { origin, hover: None } => {
                DropResolution::NoTarget(origin.task_id)
            }
            DragState::Dragging {
                origin,
                hover: Some(target),
            } => {
                if target.list_id == origin.list_id && target.index == origin.index {
                    DropResolution::SamePosition(origin.task_id)
                } else {
                    DropResolution::Move(MoveIntent {
                        task_id: origin.task_id,
                        target_list_id: target.list_id,
                        target_index: target.index,
                    })
                }
            }
        }
    }

    pub fn cancel(&mut self) {
        self.state = DragState::Idle;
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    pub fn origin(&self) -> Option<DragOrigin> {
        match self.state {
            DragState::Idle => None,
            DragState::Pending { origin, .. } | DragState::Dragging { origin, .. } => Some(origin),
        }
    }

    /// Release the pointer and forward the resulting intent, if any, to the
    /// store. Anything other than a real move stays local.
    pub async fn finish(&mut self, store: &BoardStore) -> BoardResult<MoveOutcome> {
        match self.pointer_up() {
            DropResolution::Move(intent) => {
                store
                    .move_task(intent.task_id, intent.target_list_id, intent.target_index)
                    .await
            }
            other => {
                tracing::debug!("Drop resolved locally: {:?}", other);
                Ok(MoveOutcome::Unchanged)
            }
        }
    }
}

impl Default for DragCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
