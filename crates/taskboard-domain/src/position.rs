//! Reorder planning for tasks and lists.
//!
//! Planning is pure: it reads a snapshot and describes the move as the full
//! set of placements before and after, for every sibling whose position
//! changes. Positions are always re-derived from list order, so a settled
//! list holds dense positions `0..n`. The same placements feed the remote
//! bulk position update, the optimistic apply, and the compensating revert.

use serde::{Deserialize, Serialize};
use taskboard_core::{BoardError, BoardResult};

use crate::{BoardListId, BoardSnapshot, TaskId};

/// One entry of a task bulk position update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPosition {
    pub id: TaskId,
    pub board_list_id: BoardListId,
    pub position: i32,
}

/// One entry of a list bulk position update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPosition {
    pub id: BoardListId,
    pub position: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TaskMovePlan {
    /// The task already sits at the requested list and index.
    Unchanged,
    Move(TaskMove),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskMove {
    pub task_id: TaskId,
    pub from_list: BoardListId,
    pub from_index: usize,
    pub to_list: BoardListId,
    pub to_index: usize,
    pub before: Vec<TaskPosition>,
    pub after: Vec<TaskPosition>,
}

impl TaskMove {
    pub fn apply(&self, snapshot: &mut BoardSnapshot) {
        snapshot.place_tasks(&self.after);
    }

    /// Compensating action. When the affected lists still look exactly like
    /// `after`, every sibling goes back to its `before` placement. Otherwise
    /// other writes landed in the meantime, so only the moved task returns to
    /// its origin index and the touched lists are renumbered from their
    /// current order.
    pub fn revert(&self, snapshot: &mut BoardSnapshot) {
        if self.is_settled_in(snapshot) {
            snapshot.place_tasks(&self.before);
            return;
        }
        if !snapshot.reinsert_task(self.task_id, self.from_list, self.from_index) {
            snapshot.renumber_tasks(self.from_list);
        }
        snapshot.renumber_tasks(self.to_list);
    }

    fn is_settled_in(&self, snapshot: &BoardSnapshot) -> bool {
        [self.from_list, self.to_list].iter().all(|list_id| {
            let Some(bucket) = snapshot.bucket(*list_id) else {
                return false;
            };
            let expected = self.after.iter().filter(|p| p.board_list_id == *list_id);
            bucket.tasks.len() == expected.clone().count()
                && bucket.tasks.iter().zip(expected).all(|(task, p)| {
                    task.id == p.id
                        && task.board_list_id == p.board_list_id
                        && task.position == p.position
                })
        })
    }

    pub fn position_updates(&self) -> Vec<TaskPosition> {
        self.after.clone()
    }

    pub fn is_cross_list(&self) -> bool {
        self.from_list != self.to_list
    }
}

/// Plan moving `task_id` to `target_index` of `target_list_id`. The index is
/// clamped to the end of the target list.
pub fn plan_task_move(
    snapshot: &BoardSnapshot,
    task_id: TaskId,
    target_list_id: BoardListId,
    target_index: usize,
) -> BoardResult<TaskMovePlan> {
    let (source_idx, task_idx) = snapshot
        .locate_task(task_id)
        .ok_or_else(|| BoardError::not_found(format!("task {}", task_id)))?;
    let target = snapshot
        .bucket(target_list_id)
        .ok_or_else(|| BoardError::not_found(format!("list {}", target_list_id)))?;
    let source = &snapshot.lists[source_idx];
    let from_list = source.id();

    let mut source_ids = source.task_ids();
    source_ids.remove(task_idx);

    let (to_index, after) = if from_list == target_list_id {
        let to_index = target_index.min(source_ids.len());
        if to_index == task_idx {
            return Ok(TaskMovePlan::Unchanged);
        }
        source_ids.insert(to_index, task_id);
        (to_index, dense_task_positions(from_list, &source_ids))
    } else {
        let mut target_ids = target.task_ids();
        let to_index = target_index.min(target_ids.len());
        target_ids.insert(to_index, task_id);

        let mut after = dense_task_positions(from_list, &source_ids);
        after.extend(dense_task_positions(target_list_id, &target_ids));
        (to_index, after)
    };

    let before = after
        .iter()
        .filter_map(|p| snapshot.task(p.id))
        .map(|t| TaskPosition {
            id: t.id,
            board_list_id: t.board_list_id,
            position: t.position,
        })
        .collect();

    Ok(TaskMovePlan::Move(TaskMove {
        task_id,
        from_list,
        from_index: task_idx,
        to_list: target_list_id,
        to_index,
        before,
        after,
    }))
}

fn dense_task_positions(list_id: BoardListId, ids: &[TaskId]) -> Vec<TaskPosition> {
    ids.iter()
        .enumerate()
        .map(|(i, id)| TaskPosition {
            id: *id,
            board_list_id: list_id,
            position: i as i32,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListMovePlan {
    Unchanged,
    Move(ListMove),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListMove {
    pub list_id: BoardListId,
    pub from_index: usize,
    pub to_index: usize,
    pub before: Vec<ListPosition>,
    pub after: Vec<ListPosition>,
}

impl ListMove {
    pub fn apply(&self, snapshot: &mut BoardSnapshot) {
        snapshot.place_lists(&self.after);
    }

    /// Same contract as [`TaskMove::revert`]: exact restore when the board
    /// order is still `after`, otherwise only this list returns to its origin.
    pub fn revert(&self, snapshot: &mut BoardSnapshot) {
        let settled = snapshot.lists.len() == self.after.len()
            && snapshot
                .lists
                .iter()
                .zip(&self.after)
                .all(|(b, p)| b.id() == p.id && b.list.position == p.position);
        if settled {
            snapshot.place_lists(&self.before);
        } else {
            snapshot.reinsert_list(self.list_id, self.from_index);
        }
    }

    pub fn position_updates(&self) -> Vec<ListPosition> {
        self.after.clone()
    }
}

pub fn plan_list_move(
    snapshot: &BoardSnapshot,
    list_id: BoardListId,
    target_index: usize,
) -> BoardResult<ListMovePlan> {
    let current = snapshot
        .lists
        .iter()
        .position(|b| b.id() == list_id)
        .ok_or_else(|| BoardError::not_found(format!("list {}", list_id)))?;

    let mut ids: Vec<BoardListId> = snapshot.lists.iter().map(|b| b.id()).collect();
    ids.remove(current);
    let to_index = target_index.min(ids.len());
    if to_index == current {
        return Ok(ListMovePlan::Unchanged);
    }
    ids.insert(to_index, list_id);

    let after = ids
        .iter()
        .enumerate()
        .map(|(i, id)| ListPosition {
            id: *id,
            position: i as i32,
        })
        .collect();
    let before = snapshot
        .lists
        .iter()
        .map(|b| ListPosition {
            id: b.id(),
            position: b.list.position,
        })
        .collect();

    Ok(ListMovePlan::Move(ListMove {
        list_id,
        from_index: current,
        to_index,
        before,
        after,
    }))
}
