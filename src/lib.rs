//! This crate keeps a task list in sync with a remote document database.
//!
//! The remote database is abstracted by the [`DocumentStore`](traits::DocumentStore) trait.
//! The [`store`] module provides a Cloud Firestore client, and an in-memory store that is useful for tests.
//!
//! A [`TaskSync`](sync::TaskSync) turns user intents (create a task, list the tasks of a day, toggle a completion...)
//! into store operations, and publishes the resulting [`TaskListState`](sync::TaskListState) to the presentation layer. \
//! The store always is the source of truth: the published state only reflects what the store has accepted or returned.

pub mod traits;

pub mod document;
pub use document::{Document, DocumentId, Value};
pub mod task;
pub use task::{Task, TaskId, NewTask, Category, Priority};
pub mod calendar;
pub mod error;
pub use error::{StoreError, SyncError};
pub mod sync;
pub use sync::TaskSync;

pub mod store;
mod resource;
pub use resource::Resource;
pub mod mock_behaviour;

pub mod config;
pub mod utils;
