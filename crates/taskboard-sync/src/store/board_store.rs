//! In-memory source of truth for the board being viewed.
//!
//! The store mirrors the remote service; it never owns durability. Every
//! mutation publishes a new snapshot on a `watch` channel. Snapshots are
//! shared as `Arc`s and copied on write, so a subscriber holding an older
//! snapshot never observes a later mutation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use taskboard_core::{BoardError, BoardResult};
use taskboard_domain::{
    plan_task_move, BoardListId, BoardSnapshot, NewTask, Task, TaskId, TaskMovePlan,
};
use tokio::sync::{watch, Mutex, MutexGuard};

use crate::scope::TaskScope;
use crate::traits::RemoteClients;

#[derive(Debug, Clone, PartialEq)]
pub enum MoveOutcome {
    /// Nothing moved and no remote call was made.
    Unchanged,
    /// The move was confirmed by the remote service.
    Moved(Arc<BoardSnapshot>),
}

/// Handle to one board's cache. Clones share the same cache.
///
/// Create one per mounted board and call [`BoardStore::teardown`] when the
/// board goes away; stores never share state with each other.
#[derive(Clone)]
pub struct BoardStore {
    pub(super) inner: Arc<StoreInner>,
}

pub(super) struct StoreInner {
    pub(super) state: watch::Sender<Arc<BoardSnapshot>>,
    pub(super) remote: RemoteClients,
    scope: TaskScope,
    /// Bumped by every full snapshot replacement.
    generation: AtomicU64,
    /// Held from planning a reorder or task save until its remote call
    /// settles, so those writes reach the service in the order they were
    /// planned.
    position_writes: Mutex<()>,
}

impl BoardStore {
    pub fn new(remote: RemoteClients) -> Self {
        let (state, _) = watch::channel(Arc::new(BoardSnapshot::new()));
        Self {
            inner: Arc::new(StoreInner {
                state,
                remote,
                scope: TaskScope::new(),
                generation: AtomicU64::new(0),
                position_writes: Mutex::new(()),
            }),
        }
    }

    pub fn remote(&self) -> &RemoteClients {
        &self.inner.remote
    }

    pub fn snapshot(&self) -> Arc<BoardSnapshot> {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<BoardSnapshot>> {
        self.inner.state.subscribe()
    }

    pub fn task(&self, task_id: TaskId) -> Option<Task> {
        self.inner.state.borrow().task(task_id).cloned()
    }

    pub fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::SeqCst)
    }

    /// Wait for in-flight reorders and task saves to settle. Snapshot state
    /// is never behind this lock; it only orders remote writes that carry
    /// list membership or positions.
    pub(crate) async fn lock_position_writes(&self) -> MutexGuard<'_, ()> {
        self.inner.position_writes.lock().await
    }

    /// Replace the whole cached board. The caller has already fetched it.
    pub fn load_board(&self, mut snapshot: BoardSnapshot) {
        snapshot.normalize();
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        tracing::info!(
            "Loaded board {:?}: {} list(s), {} task(s)",
            snapshot.board_id(),
            snapshot.lists.len(),
            snapshot.task_count()
        );
        self.inner.state.send_replace(Arc::new(snapshot));
    }

    /// Reconcile one task after the caller has written it remotely. The task
    /// lands in the list its `board_list_id` names; any other cached copy is
    /// dropped.
    pub fn update_task(&self, task: Task) -> BoardResult<()> {
        let task_id = task.id;
        let mut result = Ok(());
        self.inner.state.send_if_modified(|snap| {
            if snap.bucket(task.board_list_id).is_none() {
                result = Err(BoardError::not_found(format!(
                    "list {} for task {}",
                    task.board_list_id, task.id
                )));
                return false;
            }
            result = Arc::make_mut(snap).upsert_task(task);
            result.is_ok()
        });
        if let Err(e) = &result {
            tracing::error!("Failed to reconcile task {}: {}", task_id, e);
        }
        result
    }

    /// Delete a task remotely, then drop it from the cache. Returns whether
    /// the delete went through; on failure the cache is untouched.
    pub async fn remove_task(&self, task_id: TaskId) -> bool {
        match self.inner.remote.tasks.delete(task_id).await {
            Ok(()) => {
                self.inner.state.send_if_modified(|snap| {
                    if snap.task(task_id).is_none() {
                        return false;
                    }
                    Arc::make_mut(snap).remove_task(task_id).is_some()
                });
                tracing::info!("Deleted task {}", task_id);
                true
            }
            Err(e) => {
                tracing::error!("Failed to delete task {}: {}", task_id, e);
                false
            }
        }
    }

    /// Move a task to `target_index` of `target_list_id`.
    ///
    /// This is the only path that changes task positions. The move is
    /// applied locally first, then every task of the source and destination
    /// lists is sent in one bulk position update. If that call fails, the
    /// affected tasks are put back where they were and the error returned.
    /// Concurrent moves queue behind each other and are planned against the
    /// snapshot their predecessor left.
    pub async fn move_task(
        &self,
        task_id: TaskId,
        target_list_id: BoardListId,
        target_index: usize,
    ) -> BoardResult<MoveOutcome> {
        let _writes = self.lock_position_writes().await;
        let mut plan = Ok(TaskMovePlan::Unchanged);
        self.inner.state.send_if_modified(|snap| {
            plan = plan_task_move(snap, task_id, target_list_id, target_index);
            match &plan {
                Ok(TaskMovePlan::Move(mv)) => {
                    mv.apply(Arc::make_mut(snap));
                    true
                }
                _ => false,
            }
        });

        let mv = match plan? {
            TaskMovePlan::Unchanged => {
                tracing::debug!("Task {} already at requested slot", task_id);
                return Ok(MoveOutcome::Unchanged);
            }
            TaskMovePlan::Move(mv) => mv,
        };

        tracing::info!(
            "Moving task {} to list {} at index {}",
            task_id,
            mv.to_list,
            mv.to_index
        );
        match self
            .inner
            .remote
            .tasks
            .update_positions(mv.position_updates())
            .await
        {
            Ok(()) => Ok(MoveOutcome::Moved(self.snapshot())),
            Err(e) => {
                tracing::warn!("Rolling back move of task {}: {}", task_id, e);
                self.inner
                    .state
                    .send_modify(|snap| mv.revert(Arc::make_mut(snap)));
                Err(e)
            }
        }
    }

    /// Create a task at the end of a list.
    pub async fn create_task(
        &self,
        list_id: BoardListId,
        mut new_task: NewTask,
    ) -> BoardResult<Task> {
        if new_task.title.trim().is_empty() {
            return Err(BoardError::validation("Title is required"));
        }
        let position = self
            .snapshot()
            .next_task_position(list_id)
            .ok_or_else(|| BoardError::not_found(format!("list {}", list_id)))?;
        new_task.board_list_id = list_id;
        new_task.position = position;

        let task = self.inner.remote.tasks.create(new_task).await.map_err(|e| {
            tracing::error!("Failed to create task in list {}: {}", list_id, e);
            e
        })?;
        tracing::info!("Created task: {} (id: {})", task.title, task.id);
        self.update_task(task.clone())?;
        Ok(task)
    }

    /// Refetch the board from the remote service. Returns `false` when the
    /// result was discarded because a newer snapshot was loaded meanwhile.
    pub async fn refresh(&self) -> BoardResult<bool> {
        let board_id = self
            .snapshot()
            .board_id()
            .ok_or_else(|| BoardError::not_found("no board loaded"))?;
        let generation = self.generation();
        let boards = self.inner.remote.boards.clone();

        let fetched = self
            .inner
            .scope
            .spawn(async move { boards.fetch_board(board_id).await })
            .join()
            .await??;

        if self.inner.scope.is_cancelled() || self.generation() != generation {
            tracing::debug!("Discarding stale fetch of board {}", board_id);
            return Ok(false);
        }
        self.load_board(fetched);
        Ok(true)
    }

    /// Cancel in-flight fetches. Results arriving afterwards are dropped.
    pub fn teardown(&self) {
        tracing::info!("Tearing down board store {:?}", self.snapshot().board_id());
        self.inner.scope.cancel();
    }

    pub fn is_torn_down(&self) -> bool {
        self.inner.scope.is_cancelled()
    }
}
