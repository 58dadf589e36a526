//! This module turns user intents into store operations, and keeps the loaded tasks consistent
//! with the store.
//!
//! The store is always the source of truth: local state is only changed once the store has
//! accepted a change, or when a fetch returns.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::NaiveDate;

use crate::document::{Fields, Value};
use crate::error::SyncError;
use crate::task::{fields, NewTask, Task, TaskId};
use crate::traits::DocumentStore;

pub mod view_state;
use view_state::{state_channel, StateSender, StateReceiver, StateUpdate};
pub use view_state::{ListScope, TaskListState};

/// Identifies a fetch. Only the latest fetch may replace the loaded tasks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FetchTicket(u64);

/// Hands out increasing [`FetchTicket`]s. Taking a new ticket supersedes every previous one.
#[derive(Debug, Default)]
pub struct FetchSequence {
    latest: AtomicU64,
}

impl FetchSequence {
    pub fn next(&self) -> FetchTicket {
        FetchTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: FetchTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }
}

/// What happened to the result of a fetch
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The loaded tasks have been replaced
    Applied,
    /// A newer fetch has been started meanwhile, this result has been discarded
    Superseded,
}


/// The task sync layer.
///
/// Every operation is logged, recorded as the `last_error` of the state in case it fails, and
/// returns its error to the caller.
pub struct TaskSync<S: DocumentStore> {
    store: S,
    collection: String,

    state: StateSender,
    fetches: FetchSequence,
}

impl<S: DocumentStore> TaskSync<S> {
    /// Create a sync layer that uses the default collection (see [`crate::config::COLLECTION_NAME`])
    pub fn new(store: S) -> Self {
        Self::with_collection(store, crate::config::default_collection())
    }

    pub fn with_collection<T: ToString>(store: S, collection: T) -> Self {
        let (state, _) = state_channel();
        Self {
            store,
            collection: collection.to_string(),
            state,
            fetches: FetchSequence::default(),
        }
    }

    pub fn store(&self) -> &S { &self.store }
    pub fn collection(&self) -> &str { &self.collection }

    /// Returns a copy of the current state
    pub fn state(&self) -> TaskListState {
        self.state.borrow().clone()
    }

    /// Get notified whenever the state changes
    pub fn subscribe(&self) -> StateReceiver {
        self.state.subscribe()
    }

    fn update(&self, update: StateUpdate) {
        self.state.send_modify(|state| state.apply(update));
    }

    /// Apply `update` unless `ticket` has been superseded. Returns whether it has been applied
    fn update_if_current(&self, ticket: FetchTicket, update: StateUpdate) -> bool {
        let fetches = &self.fetches;
        self.state.send_if_modified(|state| {
            if fetches.is_current(ticket) == false {
                return false;
            }
            state.apply(update);
            true
        })
    }

    fn fail(&self, err: SyncError) -> SyncError {
        self.update(StateUpdate::OperationFailed(err.to_string()));
        err
    }


    /// Add a task to the store.
    ///
    /// The loaded tasks are not changed: fetch them again to see the new task.
    pub async fn create_task(&self, new_task: NewTask) -> Result<TaskId, SyncError> {
        if let Err(reason) = new_task.validate() {
            log::error!("Not adding task {:?}: {}", new_task.title, reason);
            return Err(self.fail(SyncError::InvalidTask(reason)));
        }

        match self.store.create(&self.collection, new_task.to_fields()).await {
            Err(err) => {
                log::error!("Error adding task {:?}: {}", new_task.title, err);
                Err(self.fail(err.into()))
            },
            Ok(id) => {
                log::info!("Task {:?} added successfully ({})", new_task.title, id);
                self.update(StateUpdate::OperationSucceeded);
                Ok(id)
            },
        }
    }

    /// Load every task, ordered by start date. Tasks without a start date come first.
    pub async fn load_all(&self) -> Result<FetchOutcome, SyncError> {
        self.fetch(ListScope::All).await
    }

    /// Load the tasks that start on `day` (see [`crate::calendar::day_bounds_utc`])
    pub async fn load_day(&self, day: NaiveDate) -> Result<FetchOutcome, SyncError> {
        self.fetch(ListScope::Day(day)).await
    }

    /// Load the current scope again
    pub async fn refresh(&self) -> Result<FetchOutcome, SyncError> {
        let scope = self.state.borrow().scope();
        self.fetch(scope).await
    }

    /// Take a new ticket and record its scope, under the same lock as [`Self::update_if_current`]
    fn start_fetch(&self, scope: ListScope) -> FetchTicket {
        let fetches = &self.fetches;
        let mut ticket = FetchTicket(0);
        self.state.send_modify(|state| {
            ticket = fetches.next();
            state.apply(StateUpdate::FetchStarted(scope));
        });
        ticket
    }

    async fn fetch(&self, scope: ListScope) -> Result<FetchOutcome, SyncError> {
        let ticket = self.start_fetch(scope);
        log::debug!("Fetching {} ({:?})", scope, ticket);

        let result = self.store.query(&self.collection, &scope.query()).await
            .map(|documents| {
                let mut tasks: Vec<Task> = documents.iter().map(Task::from_document).collect();
                sort_by_start(&mut tasks);
                tasks
            });

        let update = match &result {
            Ok(tasks) => StateUpdate::FetchSucceeded(tasks.clone()),
            Err(err) => StateUpdate::FetchFailed(err.to_string()),
        };
        if self.update_if_current(ticket, update) == false {
            match &result {
                Ok(tasks) => log::debug!("Discarding {} tasks from a superseded fetch of {}", tasks.len(), scope),
                Err(err) => log::debug!("Ignoring the failure of a superseded fetch of {}: {}", scope, err),
            }
            return Ok(FetchOutcome::Superseded);
        }

        match result {
            Ok(tasks) => {
                log::debug!("Loaded {} tasks ({})", tasks.len(), scope);
                Ok(FetchOutcome::Applied)
            },
            Err(err) => {
                log::error!("Error fetching {}: {}", scope, err);
                Err(err.into())
            },
        }
    }

    /// Flip the completion of a loaded task, and return its new value
    pub async fn toggle_completion(&self, id: &TaskId) -> Result<bool, SyncError> {
        let completed = !self.loaded_completion(id)?;
        self.write_completion(id, completed).await?;
        Ok(completed)
    }

    /// Set the completion of a loaded task. Nothing is sent to the store if it already has this value
    pub async fn set_completion(&self, id: &TaskId, completed: bool) -> Result<(), SyncError> {
        if self.loaded_completion(id)? == completed {
            log::debug!("Task {} already has completion {}", id, completed);
            return Ok(());
        }
        self.write_completion(id, completed).await
    }

    /// Delete a task from the store, then from the loaded tasks
    pub async fn delete_task(&self, id: &TaskId) -> Result<(), SyncError> {
        if let Err(err) = self.store.delete(&self.collection, id).await {
            log::error!("Error deleting task {}: {}", id, err);
            return Err(self.fail(err.into()));
        }
        log::info!("Task {} deleted", id);
        self.update(StateUpdate::TaskRemoved(id.clone()));
        Ok(())
    }

    fn loaded_completion(&self, id: &TaskId) -> Result<bool, SyncError> {
        let completed = self.state.borrow().task(id).map(|t| t.completed());
        match completed {
            Some(c) => Ok(c),
            None => {
                log::error!("Task {} is not loaded", id);
                Err(self.fail(SyncError::UnknownTask(id.clone())))
            },
        }
    }

    async fn write_completion(&self, id: &TaskId, completed: bool) -> Result<(), SyncError> {
        let mut change = Fields::new();
        change.insert(fields::COMPLETED.to_string(), Value::Boolean(completed));

        if let Err(err) = self.store.update(&self.collection, id, change).await {
            log::error!("Error updating task {}: {}", id, err);
            return Err(self.fail(err.into()));
        }
        self.update(StateUpdate::CompletionChanged{ id: id.clone(), completed });
        Ok(())
    }
}


/// Order tasks by start date (tasks without one first), then by id
pub fn sort_by_start(tasks: &mut [Task]) {
    tasks.sort_by(|l, r| {
        l.start_date().cmp(&r.start_date())
            .then_with(|| l.id().cmp(r.id()))
    });
}
