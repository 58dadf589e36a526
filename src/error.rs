//! Errors returned by the stores and the sync layer

use std::fmt::{Display, Formatter};

use thiserror::Error;

use crate::task::TaskId;

/// The kind of remote operation that failed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreOperation {
    Create,
    Query,
    Update,
    Delete,
}

impl Display for StoreOperation {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Query => write!(f, "query"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// A failed remote operation.
///
/// Network failures, rejected requests and missing documents all end up here:
/// callers are not expected to tell them apart.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("remote {operation} failed: {message}")]
pub struct StoreError {
    operation: StoreOperation,
    message: String,
}

impl StoreError {
    pub fn new<S: ToString>(operation: StoreOperation, message: S) -> Self {
        Self { operation, message: message.to_string() }
    }

    pub fn operation(&self) -> StoreOperation { self.operation }
    pub fn message(&self) -> &str { &self.message }
}

/// Errors returned by [`TaskSync`](crate::sync::TaskSync) operations
#[derive(Clone, Debug, Error, PartialEq)]
pub enum SyncError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("invalid task: {0}")]
    InvalidTask(String),
    #[error("task {0} is not in the loaded list")]
    UnknownTask(TaskId),
}
