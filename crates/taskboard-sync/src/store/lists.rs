//! List and label operations of the board store.

use std::sync::Arc;
use taskboard_core::{BoardError, BoardResult};
use taskboard_domain::{
    plan_list_move, BoardLabel, BoardList, BoardListId, LabelId, LabelUpdate, ListMovePlan,
    ListUpdate, NewBoardLabel, NewBoardList,
};

use super::board_store::{BoardStore, MoveOutcome};

fn require_name(name: &str, what: &str) -> BoardResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(BoardError::validation(format!("{} name is required", what)));
    }
    Ok(name.to_string())
}

impl BoardStore {
    pub async fn create_list(&self, name: &str) -> BoardResult<BoardList> {
        let name = require_name(name, "List")?;
        let snapshot = self.snapshot();
        let board_id = snapshot
            .board_id()
            .ok_or_else(|| BoardError::not_found("no board loaded"))?;
        let new_list = NewBoardList {
            board_id,
            name,
            position: snapshot.next_list_position(),
        };

        let list = self.inner.remote.lists.create(new_list).await.map_err(|e| {
            tracing::error!("Failed to create list: {}", e);
            e
        })?;
        tracing::info!("Created list: {} (id: {})", list.name, list.id);
        let canonical = list.clone();
        self.inner
            .state
            .send_modify(|snap| Arc::make_mut(snap).upsert_list(canonical));
        Ok(list)
    }

    /// Rename optimistically; the old name comes back if the remote rejects it.
    pub async fn rename_list(&self, list_id: BoardListId, name: &str) -> BoardResult<BoardList> {
        let name = require_name(name, "List")?;
        let previous = self
            .snapshot()
            .bucket(list_id)
            .map(|b| b.list.clone())
            .ok_or_else(|| BoardError::not_found(format!("list {}", list_id)))?;

        let mut renamed = previous.clone();
        renamed.update_name(name.clone());
        let optimistic = renamed.clone();
        self.inner
            .state
            .send_modify(|snap| Arc::make_mut(snap).upsert_list(optimistic));

        let update = ListUpdate {
            name,
            position: previous.position,
        };
        match self.inner.remote.lists.update(list_id, update).await {
            Ok(list) => {
                let canonical = list.clone();
                self.inner
                    .state
                    .send_modify(|snap| Arc::make_mut(snap).upsert_list(canonical));
                tracing::info!("Renamed list {} to: {}", list_id, list.name);
                Ok(list)
            }
            Err(e) => {
                tracing::warn!("Rolling back rename of list {}: {}", list_id, e);
                self.inner.state.send_if_modified(|snap| {
                    if snap.bucket(list_id).is_none() {
                        return false;
                    }
                    Arc::make_mut(snap).upsert_list(previous);
                    true
                });
                Err(e)
            }
        }
    }

    /// Delete a list and, with it, its cached tasks.
    pub async fn delete_list(&self, list_id: BoardListId) -> BoardResult<()> {
        if self.snapshot().bucket(list_id).is_none() {
            return Err(BoardError::not_found(format!("list {}", list_id)));
        }
        self.inner.remote.lists.delete(list_id).await.map_err(|e| {
            tracing::error!("Failed to delete list {}: {}", list_id, e);
            e
        })?;
        self.inner
            .state
            .send_if_modified(|snap| Arc::make_mut(snap).remove_list(list_id).is_some());
        tracing::info!("Deleted list {}", list_id);
        Ok(())
    }

    /// Reorder a list. Same discipline as task moves: local first, one bulk
    /// position update, revert on failure.
    pub async fn move_list(
        &self,
        list_id: BoardListId,
        target_index: usize,
    ) -> BoardResult<MoveOutcome> {
        let _writes = self.lock_position_writes().await;
        let mut plan = Ok(ListMovePlan::Unchanged);
        self.inner.state.send_if_modified(|snap| {
            plan = plan_list_move(snap, list_id, target_index);
            match &plan {
                Ok(ListMovePlan::Move(mv)) => {
                    mv.apply(Arc::make_mut(snap));
                    true
                }
                _ => false,
            }
        });

        let mv = match plan? {
            ListMovePlan::Unchanged => return Ok(MoveOutcome::Unchanged),
            ListMovePlan::Move(mv) => mv,
        };

        tracing::info!("Moving list {} to index {}", list_id, mv.to_index);
        match self
            .inner
            .remote
            .lists
            .update_positions(mv.position_updates())
            .await
        {
            Ok(()) => Ok(MoveOutcome::Moved(self.snapshot())),
            Err(e) => {
                tracing::warn!("Rolling back move of list {}: {}", list_id, e);
                self.inner
                    .state
                    .send_modify(|snap| mv.revert(Arc::make_mut(snap)));
                Err(e)
            }
        }
    }

    pub async fn create_label(&self, name: &str, color: &str) -> BoardResult<BoardLabel> {
        let name = require_name(name, "Label")?;
        let board_id = self
            .snapshot()
            .board_id()
            .ok_or_else(|| BoardError::not_found("no board loaded"))?;
        let new_label = NewBoardLabel {
            board_id,
            name,
            color: color.to_string(),
        };

        let label = self.inner.remote.labels.create(new_label).await.map_err(|e| {
            tracing::error!("Failed to create label: {}", e);
            e
        })?;
        tracing::info!("Created label: {} (id: {})", label.name, label.id);
        self.put_label(label.clone());
        Ok(label)
    }

    pub async fn update_label(
        &self,
        label_id: LabelId,
        name: &str,
        color: &str,
    ) -> BoardResult<BoardLabel> {
        let name = require_name(name, "Label")?;
        if self.snapshot().label(label_id).is_none() {
            return Err(BoardError::not_found(format!("label {}", label_id)));
        }
        let update = LabelUpdate {
            name,
            color: color.to_string(),
        };

        let label = self
            .inner
            .remote
            .labels
            .update(label_id, update)
            .await
            .map_err(|e| {
                tracing::error!("Failed to update label {}: {}", label_id, e);
                e
            })?;
        self.put_label(label.clone());
        Ok(label)
    }

    /// Delete a label; cached tasks lose their link to it.
    pub async fn delete_label(&self, label_id: LabelId) -> BoardResult<()> {
        self.inner.remote.labels.delete(label_id).await.map_err(|e| {
            tracing::error!("Failed to delete label {}: {}", label_id, e);
            e
        })?;
        self.inner
            .state
            .send_if_modified(|snap| Arc::make_mut(snap).remove_label(label_id).is_some());
        tracing::info!("Deleted label {}", label_id);
        Ok(())
    }

    fn put_label(&self, label: BoardLabel) {
        self.inner
            .state
            .send_modify(|snap| Arc::make_mut(snap).upsert_label(label));
    }
}

#[cfg(test)]
mod tests {
    use crate::store::board_store::tests::one_task_per_list;
    use crate::store::{BoardStore, MoveOutcome};
    use crate::traits::mocks::MockRemote;
    use taskboard_core::BoardError;
    use taskboard_domain::{BoardLabel, BoardList, TaskLabel};

    #[tokio::test]
    async fn test_create_list_appends_at_end() {
        let mut remote = MockRemote::new();
        remote
            .lists
            .expect_create()
            .withf(|l| l.name == "Judging" && l.position == 2)
            .times(1)
            .returning(|l| Ok(BoardList::new(l.board_id, l.name, l.position)));
        let store = BoardStore::new(remote.into_clients());
        store.load_board(one_task_per_list(&["Todo", "Done"]));

        store.create_list("  Judging ").await.unwrap();
        let names: Vec<_> = store
            .snapshot()
            .lists
            .iter()
            .map(|b| b.list.name.clone())
            .collect();
        assert_eq!(names, vec!["Todo", "Done", "Judging"]);
    }

    #[tokio::test]
    async fn test_rename_list_rolls_back_on_failure() {
        let mut remote = MockRemote::new();
        remote
            .lists
            .expect_update()
            .times(1)
            .returning(|_, _| Err(BoardError::remote("403 Forbidden")));
        let store = BoardStore::new(remote.into_clients());
        store.load_board(one_task_per_list(&["Todo"]));
        let list_id = store.snapshot().lists[0].id();

        assert!(store.rename_list(list_id, "Backlog").await.is_err());
        assert_eq!(store.snapshot().lists[0].list.name, "Todo");
        assert_eq!(store.snapshot().task_count(), 1);
    }

    #[tokio::test]
    async fn test_move_list_sends_bulk_update() {
        let mut remote = MockRemote::new();
        remote
            .lists
            .expect_update_positions()
            .withf(|updates| updates.len() == 3)
            .times(1)
            .returning(|_| Ok(()));
        let store = BoardStore::new(remote.into_clients());
        store.load_board(one_task_per_list(&["Todo", "Doing", "Done"]));
        let done = store.snapshot().lists[2].id();

        let outcome = store.move_list(done, 0).await.unwrap();
        let MoveOutcome::Moved(snap) = outcome else {
            panic!("expected a confirmed move");
        };
        assert_eq!(snap.lists[0].id(), done);
        let positions: Vec<_> = snap.lists.iter().map(|b| b.list.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_move_list_failure_restores_order() {
        let mut remote = MockRemote::new();
        remote
            .lists
            .expect_update_positions()
            .returning(|_| Err(BoardError::remote("timeout")));
        let store = BoardStore::new(remote.into_clients());
        store.load_board(one_task_per_list(&["Todo", "Doing"]));
        let before: Vec<_> = store.snapshot().lists.iter().map(|b| b.id()).collect();

        assert!(store.move_list(before[1], 0).await.is_err());
        let after: Vec<_> = store.snapshot().lists.iter().map(|b| b.id()).collect();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_delete_list_drops_tasks() {
        let mut remote = MockRemote::new();
        remote.lists.expect_delete().times(1).returning(|_| Ok(()));
        let store = BoardStore::new(remote.into_clients());
        store.load_board(one_task_per_list(&["Todo", "Doing"]));
        let doing = store.snapshot().lists[1].id();

        store.delete_list(doing).await.unwrap();
        assert_eq!(store.snapshot().lists.len(), 1);
        assert_eq!(store.snapshot().task_count(), 1);
    }

    #[tokio::test]
    async fn test_delete_label_unlinks_tasks() {
        let mut snapshot = one_task_per_list(&["Todo"]);
        let board_id = snapshot.board_id().unwrap();
        let label = BoardLabel::new(board_id, "design".to_string(), "#f472b6".to_string());
        snapshot.labels.push(label.clone());
        let task_id = snapshot.lists[0].tasks[0].id;
        snapshot.lists[0].tasks[0]
            .labels
            .push(TaskLabel::new(task_id, label.id));

        let mut remote = MockRemote::new();
        remote.labels.expect_delete().times(1).returning(|_| Ok(()));
        let store = BoardStore::new(remote.into_clients());
        store.load_board(snapshot);

        store.delete_label(label.id).await.unwrap();
        assert!(store.snapshot().labels.is_empty());
        assert!(store.task(task_id).unwrap().labels.is_empty());
    }

    #[tokio::test]
    async fn test_create_label_blank_name_skips_remote() {
        let mut remote = MockRemote::new();
        remote.labels.expect_create().never();
        let store = BoardStore::new(remote.into_clients());
        store.load_board(one_task_per_list(&["Todo"]));

        let err = store.create_label(" ", "#000000").await.unwrap_err();
        assert!(matches!(err, BoardError::Validation(_)));
    }

    fn store_with_label(remote: MockRemote) -> (BoardStore, BoardLabel) {
        let mut snapshot = one_task_per_list(&["Todo"]);
        let board_id = snapshot.board_id().unwrap();
        let label = BoardLabel::new(board_id, "design".to_string(), "#f472b6".to_string());
        snapshot.labels.push(label.clone());
        let store = BoardStore::new(remote.into_clients());
        store.load_board(snapshot);
        (store, label)
    }

    #[tokio::test]
    async fn test_update_label_replaces_cached_label() {
        let mut remote = MockRemote::new();
        remote
            .labels
            .expect_update()
            .withf(|_, update| update.name == "research" && update.color == "#a855f7")
            .times(1)
            .returning(|id, update| {
                let mut label = BoardLabel::new(uuid::Uuid::new_v4(), update.name, update.color);
                label.id = id;
                Ok(label)
            });
        let (store, label) = store_with_label(remote);

        let updated = store
            .update_label(label.id, "  research ", "#a855f7")
            .await
            .unwrap();
        assert_eq!(updated.id, label.id);
        let snapshot = store.snapshot();
        assert_eq!(snapshot.labels.len(), 1);
        assert_eq!(snapshot.label(label.id).unwrap().name, "research");
        assert_eq!(snapshot.label(label.id).unwrap().color, "#a855f7");
    }

    #[tokio::test]
    async fn test_update_label_rejects_before_remote() {
        let mut remote = MockRemote::new();
        remote.labels.expect_update().never();
        let (store, label) = store_with_label(remote);

        let unknown = store
            .update_label(uuid::Uuid::new_v4(), "research", "#a855f7")
            .await
            .unwrap_err();
        assert!(matches!(unknown, BoardError::NotFound(_)));

        let blank = store.update_label(label.id, "  ", "#a855f7").await.unwrap_err();
        assert!(matches!(blank, BoardError::Validation(_)));
        assert_eq!(store.snapshot().label(label.id).unwrap().name, "design");
    }

    #[tokio::test]
    async fn test_update_label_failure_keeps_cache() {
        let mut remote = MockRemote::new();
        remote
            .labels
            .expect_update()
            .times(1)
            .returning(|_, _| Err(BoardError::remote("500 Internal Server Error")));
        let (store, label) = store_with_label(remote);

        assert!(store.update_label(label.id, "research", "#a855f7").await.is_err());
        assert_eq!(store.snapshot().label(label.id).unwrap(), &label);
    }
}
