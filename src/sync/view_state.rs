//! The state the presentation layer renders from

use std::fmt::{Display, Error, Formatter};

use chrono::NaiveDate;

use crate::calendar::day_bounds_utc;
use crate::document::{Direction, FieldOp, Query};
use crate::task::{fields, Task, TaskFilter, TaskId};

/// What the loaded list represents
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListScope {
    /// Every task
    All,
    /// Tasks that start on a given calendar day
    Day(NaiveDate),
}

impl ListScope {
    /// The store query that fetches this scope, ordered by start date
    pub fn query(&self) -> Query {
        let query = Query::new().order_by(fields::START_DATE, Direction::Ascending);
        match self {
            ListScope::All => query,
            ListScope::Day(day) => {
                let bounds = day_bounds_utc(*day);
                query
                    .filter(fields::START_DATE, FieldOp::GreaterOrEqual, *bounds.start())
                    .filter(fields::START_DATE, FieldOp::LessOrEqual, *bounds.end())
            },
        }
    }
}

impl Default for ListScope {
    fn default() -> Self {
        ListScope::All
    }
}

impl Display for ListScope {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        match self {
            ListScope::All => write!(f, "all tasks"),
            ListScope::Day(day) => write!(f, "tasks of {}", day),
        }
    }
}


/// A change to the [`TaskListState`]
#[derive(Clone, Debug, PartialEq)]
pub enum StateUpdate {
    /// A fetch for this scope has been sent
    FetchStarted(ListScope),
    /// The latest fetch returned these tasks
    FetchSucceeded(Vec<Task>),
    /// The latest fetch failed
    FetchFailed(String),
    /// The completion of a task has been changed on the store
    CompletionChanged{ id: TaskId, completed: bool },
    /// A task has been deleted from the store
    TaskRemoved(TaskId),
    /// Another operation succeeded
    OperationSucceeded,
    /// Another operation failed
    OperationFailed(String),
}


/// The loaded tasks, and what is going on with them.
///
/// It is owned by a [`TaskSync`](super::TaskSync), that changes it with [`TaskListState::apply`] only.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TaskListState {
    tasks: Vec<Task>,
    loading: bool,
    scope: ListScope,
    last_error: Option<String>,
}

impl TaskListState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tasks(&self) -> &[Task]      { &self.tasks }
    pub fn loading(&self) -> bool       { self.loading }
    pub fn scope(&self) -> ListScope    { self.scope }
    /// The last error that happened, if the last operation failed
    pub fn last_error(&self) -> Option<&str> { self.last_error.as_deref() }

    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id() == id)
    }

    /// The loaded tasks that `filter` accepts, in list order
    pub fn visible_tasks(&self, filter: &TaskFilter) -> Vec<&Task> {
        self.tasks.iter().filter(|t| filter.accepts(t)).collect()
    }

    pub fn apply(&mut self, update: StateUpdate) {
        match update {
            StateUpdate::FetchStarted(scope) => {
                self.scope = scope;
                self.loading = true;
            },
            StateUpdate::FetchSucceeded(tasks) => {
                self.tasks = tasks;
                self.loading = false;
                self.last_error = None;
            },
            StateUpdate::FetchFailed(error) => {
                self.loading = false;
                self.last_error = Some(error);
            },
            StateUpdate::CompletionChanged{ id, completed } => {
                match self.tasks.iter_mut().find(|t| t.id() == &id) {
                    Some(task) => task.set_completed(completed),
                    None => log::debug!("Task {} is not loaded anymore, not updating it", id),
                }
                self.last_error = None;
            },
            StateUpdate::TaskRemoved(id) => {
                self.tasks.retain(|t| t.id() != &id);
                self.last_error = None;
            },
            StateUpdate::OperationSucceeded => {
                self.last_error = None;
            },
            StateUpdate::OperationFailed(error) => {
                self.last_error = Some(error);
            },
        }
    }
}


/// See [`state_channel`]
pub type StateSender = tokio::sync::watch::Sender<TaskListState>;
/// See [`state_channel`]
pub type StateReceiver = tokio::sync::watch::Receiver<TaskListState>;

/// Create a channel that publishes the current [`TaskListState`]
pub fn state_channel() -> (StateSender, StateReceiver) {
    tokio::sync::watch::channel(TaskListState::default())
}
