//! Point-in-time capture of one board.
//!
//! `BoardSnapshot` is what the board store caches and publishes to its
//! subscribers: the board itself, its lists in position order, each list's
//! tasks in position order, and the board's labels. It is pure data with no
//! knowledge of the remote service.

use serde::{Deserialize, Serialize};
use taskboard_core::{BoardError, BoardResult};

use crate::{
    position::{ListPosition, TaskPosition},
    Board, BoardId, BoardLabel, BoardList, BoardListId, LabelId, Task, TaskId,
};

/// A list together with its tasks, ordered by `(position, id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListBucket {
    #[serde(flatten)]
    pub list: BoardList,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl ListBucket {
    pub fn new(list: BoardList) -> Self {
        Self {
            list,
            tasks: Vec::new(),
        }
    }

    pub fn id(&self) -> BoardListId {
        self.list.id
    }

    pub fn task_ids(&self) -> Vec<TaskId> {
        self.tasks.iter().map(|t| t.id).collect()
    }

    pub fn positions(&self) -> Vec<i32> {
        self.tasks.iter().map(|t| t.position).collect()
    }

    pub fn index_of(&self, task_id: TaskId) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == task_id)
    }

    fn sort_tasks(&mut self) {
        self.tasks.sort_by_key(|t| (t.position, t.id));
    }

    fn insert_sorted(&mut self, task: Task) {
        let key = (task.position, task.id);
        let idx = self.tasks.partition_point(|t| (t.position, t.id) < key);
        self.tasks.insert(idx, task);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    #[serde(default)]
    pub board: Option<Board>,

    /// Lists ordered by `(position, id)`.
    #[serde(default)]
    pub lists: Vec<ListBucket>,

    #[serde(default)]
    pub labels: Vec<BoardLabel>,
}

impl BoardSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from flat collections as a REST API returns them.
    /// Tasks whose list is not among `lists` are dropped.
    pub fn from_parts(
        board: Board,
        lists: Vec<BoardList>,
        tasks: Vec<Task>,
        labels: Vec<BoardLabel>,
    ) -> Self {
        let mut snapshot = Self {
            board: Some(board),
            lists: lists.into_iter().map(ListBucket::new).collect(),
            labels,
        };
        for task in tasks {
            if let Some(bucket) = snapshot.bucket_mut(task.board_list_id) {
                bucket.tasks.push(task);
            }
        }
        snapshot.normalize();
        snapshot
    }

    /// Restore ordering of lists and of each list's tasks.
    pub fn normalize(&mut self) {
        self.lists.sort_by_key(|b| (b.list.position, b.list.id));
        for bucket in &mut self.lists {
            bucket.sort_tasks();
        }
    }

    pub fn board_id(&self) -> Option<BoardId> {
        self.board.as_ref().map(|b| b.id)
    }

    pub fn is_empty(&self) -> bool {
        self.board.is_none() && self.lists.is_empty() && self.labels.is_empty()
    }

    pub fn bucket(&self, list_id: BoardListId) -> Option<&ListBucket> {
        self.lists.iter().find(|b| b.list.id == list_id)
    }

    fn bucket_mut(&mut self, list_id: BoardListId) -> Option<&mut ListBucket> {
        self.lists.iter_mut().find(|b| b.list.id == list_id)
    }

    /// `(list index, task index)` of the first bucket holding the task.
    pub fn locate_task(&self, task_id: TaskId) -> Option<(usize, usize)> {
        self.lists
            .iter()
            .enumerate()
            .find_map(|(li, b)| b.index_of(task_id).map(|ti| (li, ti)))
    }

    pub fn task(&self, task_id: TaskId) -> Option<&Task> {
        self.locate_task(task_id)
            .map(|(li, ti)| &self.lists[li].tasks[ti])
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.lists.iter().flat_map(|b| b.tasks.iter())
    }

    pub fn task_count(&self) -> usize {
        self.lists.iter().map(|b| b.tasks.len()).sum()
    }

    /// Position for a task appended to the end of a list.
    pub fn next_task_position(&self, list_id: BoardListId) -> Option<i32> {
        self.bucket(list_id).map(|b| {
            b.tasks
                .iter()
                .map(|t| t.position + 1)
                .max()
                .unwrap_or(0)
        })
    }

    pub fn next_list_position(&self) -> i32 {
        self.lists
            .iter()
            .map(|b| b.list.position + 1)
            .max()
            .unwrap_or(0)
    }

    /// Insert or replace a task in the list named by its `board_list_id`,
    /// dropping every other cached copy. Fails without touching the cache
    /// when that list is unknown.
    pub fn upsert_task(&mut self, task: Task) -> BoardResult<()> {
        if self.bucket(task.board_list_id).is_none() {
            return Err(BoardError::not_found(format!(
                "list {} for task {}",
                task.board_list_id, task.id
            )));
        }
        self.take_all_copies(task.id);
        if let Some(bucket) = self.bucket_mut(task.board_list_id) {
            bucket.insert_sorted(task);
        }
        Ok(())
    }

    pub fn remove_task(&mut self, task_id: TaskId) -> Option<Task> {
        self.take_all_copies(task_id).into_iter().next()
    }

    fn take_all_copies(&mut self, task_id: TaskId) -> Vec<Task> {
        let mut taken = Vec::new();
        for bucket in &mut self.lists {
            while let Some(idx) = bucket.index_of(task_id) {
                taken.push(bucket.tasks.remove(idx));
            }
        }
        taken
    }

    /// Move each named task to its list and position. Placements naming a
    /// task or list that is no longer cached are skipped.
    pub fn place_tasks(&mut self, placements: &[TaskPosition]) {
        let mut moving = Vec::with_capacity(placements.len());
        for placement in placements {
            if self.bucket(placement.board_list_id).is_none() {
                continue;
            }
            if let Some(task) = self.remove_task(placement.id) {
                moving.push((task, placement));
            }
        }
        for (mut task, placement) in moving {
            task.move_to_list(placement.board_list_id, placement.position);
            if let Some(bucket) = self.bucket_mut(placement.board_list_id) {
                bucket.insert_sorted(task);
            }
        }
    }

    /// Rewrite a list's task positions to `0..n` in their current order.
    pub fn renumber_tasks(&mut self, list_id: BoardListId) {
        if let Some(bucket) = self.bucket_mut(list_id) {
            let id = bucket.id();
            for (i, task) in bucket.tasks.iter_mut().enumerate() {
                task.move_to_list(id, i as i32);
            }
        }
    }

    /// Take a task from wherever it sits and insert it at `index` of
    /// `list_id` (clamped), renumbering both lists densely. Returns false and
    /// leaves the cache alone when either the task or the list is gone.
    pub fn reinsert_task(&mut self, task_id: TaskId, list_id: BoardListId, index: usize) -> bool {
        if self.bucket(list_id).is_none() {
            return false;
        }
        let Some((list_idx, task_idx)) = self.locate_task(task_id) else {
            return false;
        };
        let current = self.lists[list_idx].id();
        let task = self.lists[list_idx].tasks.remove(task_idx);
        self.renumber_tasks(current);
        if let Some(bucket) = self.bucket_mut(list_id) {
            let index = index.min(bucket.tasks.len());
            bucket.tasks.insert(index, task);
        }
        self.renumber_tasks(list_id);
        true
    }

    /// Insert a list, or replace its metadata while keeping its tasks.
    pub fn upsert_list(&mut self, list: BoardList) {
        match self.bucket_mut(list.id) {
            Some(bucket) => bucket.list = list,
            None => self.lists.push(ListBucket::new(list)),
        }
        self.lists.sort_by_key(|b| (b.list.position, b.list.id));
    }

    pub fn remove_list(&mut self, list_id: BoardListId) -> Option<ListBucket> {
        let idx = self.lists.iter().position(|b| b.list.id == list_id)?;
        Some(self.lists.remove(idx))
    }

    /// Put a removed bucket back, tasks included.
    pub fn restore_list(&mut self, bucket: ListBucket) {
        if self.bucket(bucket.id()).is_none() {
            self.lists.push(bucket);
            self.lists.sort_by_key(|b| (b.list.position, b.list.id));
        }
    }

    pub fn place_lists(&mut self, placements: &[ListPosition]) {
        for placement in placements {
            if let Some(bucket) = self.bucket_mut(placement.id) {
                bucket.list.update_position(placement.position);
            }
        }
        self.lists.sort_by_key(|b| (b.list.position, b.list.id));
    }

    /// Move a list to `index` of the board order (clamped) and renumber every
    /// list densely. Returns false when the list is gone.
    pub fn reinsert_list(&mut self, list_id: BoardListId, index: usize) -> bool {
        let Some(current) = self.lists.iter().position(|b| b.id() == list_id) else {
            return false;
        };
        let bucket = self.lists.remove(current);
        let index = index.min(self.lists.len());
        self.lists.insert(index, bucket);
        for (i, bucket) in self.lists.iter_mut().enumerate() {
            bucket.list.update_position(i as i32);
        }
        true
    }

    pub fn label(&self, label_id: LabelId) -> Option<&BoardLabel> {
        self.labels.iter().find(|l| l.id == label_id)
    }

    pub fn upsert_label(&mut self, label: BoardLabel) {
        match self.labels.iter_mut().find(|l| l.id == label.id) {
            Some(existing) => *existing = label,
            None => self.labels.push(label),
        }
    }

    /// Remove a label and every task's join entity pointing at it.
    pub fn remove_label(&mut self, label_id: LabelId) -> Option<BoardLabel> {
        let idx = self.labels.iter().position(|l| l.id == label_id)?;
        for bucket in &mut self.lists {
            for task in &mut bucket.tasks {
                task.labels.retain(|l| l.label_id != label_id);
            }
        }
        Some(self.labels.remove(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TaskLabel;
    use uuid::Uuid;

    fn board_with_lists(names: &[&str]) -> BoardSnapshot {
        let board = Board::new(Uuid::new_v4(), Uuid::new_v4(), "Board".to_string());
        let lists = names
            .iter()
            .enumerate()
            .map(|(i, name)| BoardList::new(board.id, name.to_string(), i as i32))
            .collect();
        BoardSnapshot::from_parts(board, lists, vec![], vec![])
    }

    #[test]
    fn test_from_parts_orders_lists_and_tasks() {
        let board = Board::new(Uuid::new_v4(), Uuid::new_v4(), "Board".to_string());
        let done = BoardList::new(board.id, "Done".to_string(), 2);
        let todo = BoardList::new(board.id, "Todo".to_string(), 0);
        let second = Task::new(todo.id, "second".to_string(), 1);
        let first = Task::new(todo.id, "first".to_string(), 0);
        let orphan = Task::new(Uuid::new_v4(), "orphan".to_string(), 0);

        let snapshot = BoardSnapshot::from_parts(
            board,
            vec![done.clone(), todo.clone()],
            vec![second, first, orphan],
            vec![],
        );

        assert_eq!(snapshot.lists[0].list.name, "Todo");
        assert_eq!(snapshot.lists[1].list.name, "Done");
        let titles: Vec<_> = snapshot.lists[0]
            .tasks
            .iter()
            .map(|t| t.title.as_str())
            .collect();
        assert_eq!(titles, vec!["first", "second"]);
        assert_eq!(snapshot.task_count(), 2);
    }

    #[test]
    fn test_upsert_moves_task_between_buckets() {
        let mut snapshot = board_with_lists(&["Todo", "Doing"]);
        let todo = snapshot.lists[0].id();
        let doing = snapshot.lists[1].id();

        let mut task = Task::new(todo, "Write README".to_string(), 0);
        snapshot.upsert_task(task.clone()).unwrap();
        assert_eq!(snapshot.bucket(todo).unwrap().tasks.len(), 1);

        task.board_list_id = doing;
        snapshot.upsert_task(task.clone()).unwrap();
        assert!(snapshot.bucket(todo).unwrap().tasks.is_empty());
        assert_eq!(snapshot.bucket(doing).unwrap().task_ids(), vec![task.id]);
        assert_eq!(snapshot.task_count(), 1);
    }

    #[test]
    fn test_upsert_unknown_list_leaves_cache() {
        let mut snapshot = board_with_lists(&["Todo"]);
        let before = snapshot.clone();
        let task = Task::new(Uuid::new_v4(), "Lost".to_string(), 0);

        let err = snapshot.upsert_task(task).unwrap_err();
        assert!(matches!(err, BoardError::NotFound(_)));
        assert_eq!(snapshot, before);
    }

    #[test]
    fn test_next_positions() {
        let mut snapshot = board_with_lists(&["Todo", "Doing"]);
        let todo = snapshot.lists[0].id();
        assert_eq!(snapshot.next_task_position(todo), Some(0));
        snapshot
            .upsert_task(Task::new(todo, "a".to_string(), 4))
            .unwrap();
        assert_eq!(snapshot.next_task_position(todo), Some(5));
        assert_eq!(snapshot.next_task_position(Uuid::new_v4()), None);
        assert_eq!(snapshot.next_list_position(), 2);
    }

    #[test]
    fn test_remove_label_strips_join_entities() {
        let mut snapshot = board_with_lists(&["Todo"]);
        let todo = snapshot.lists[0].id();
        let board_id = snapshot.board_id().unwrap();
        let label = BoardLabel::new(board_id, "frontend".to_string(), "#3b82f6".to_string());
        snapshot.upsert_label(label.clone());

        let mut task = Task::new(todo, "Navbar".to_string(), 0);
        task.labels.push(TaskLabel::new(task.id, label.id));
        snapshot.upsert_task(task.clone()).unwrap();

        let removed = snapshot.remove_label(label.id).unwrap();
        assert_eq!(removed.name, "frontend");
        assert!(snapshot.labels.is_empty());
        assert!(snapshot.task(task.id).unwrap().labels.is_empty());
    }

    #[test]
    fn test_remove_and_restore_list_keeps_tasks() {
        let mut snapshot = board_with_lists(&["Todo", "Doing"]);
        let doing = snapshot.lists[1].id();
        snapshot
            .upsert_task(Task::new(doing, "Deploy".to_string(), 0))
            .unwrap();

        let bucket = snapshot.remove_list(doing).unwrap();
        assert_eq!(snapshot.lists.len(), 1);
        assert_eq!(snapshot.task_count(), 0);

        snapshot.restore_list(bucket);
        assert_eq!(snapshot.lists[1].id(), doing);
        assert_eq!(snapshot.task_count(), 1);
    }

    #[test]
    fn test_partial_deserialization() {
        let snapshot: BoardSnapshot = serde_json::from_str(r#"{"lists": []}"#).unwrap();
        assert!(snapshot.is_empty());
    }
}
