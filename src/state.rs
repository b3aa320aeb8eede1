//! The consumer-facing view of a controller

use std::fmt;
use std::sync::Arc;

use crate::error::Error;

/// The lifecycle phase of a controller, derived from its [`FetchState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No result, no failure and nothing in flight
    Idle,
    /// A retrieval is in flight
    Pending,
    /// A result is held
    Resolved,
    /// A failure is held
    Rejected,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Pending => "pending",
            Phase::Resolved => "resolved",
            Phase::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

/// The `(result, failure, pending)` triple exposed to the consumer
///
/// Values are shared, cloning a `FetchState` is cheap and does not require `T: Clone`.
pub struct FetchState<T> {
    /// The last successfully retrieved and parsed payload
    pub result: Option<Arc<T>>,
    /// The reason the last attempt failed
    pub failure: Option<Arc<Error>>,
    /// True while a retrieval is in flight
    pub pending: bool,
}

impl<T> FetchState<T> {
    /// Returns true if there is no result, no failure and no retrieval in flight
    pub fn is_clean(&self) -> bool {
        !self.pending && self.result.is_none() && self.failure.is_none()
    }

    pub fn phase(&self) -> Phase {
        if self.pending {
            Phase::Pending
        } else if self.failure.is_some() {
            Phase::Rejected
        } else if self.result.is_some() {
            Phase::Resolved
        } else {
            Phase::Idle
        }
    }

    /// Borrow the result, if any
    pub fn result(&self) -> Option<&T> {
        self.result.as_deref()
    }

    /// Borrow the failure, if any
    pub fn failure(&self) -> Option<&Error> {
        self.failure.as_deref()
    }
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        Self {
            result: None,
            failure: None,
            pending: false,
        }
    }
}

impl<T> Clone for FetchState<T> {
    fn clone(&self) -> Self {
        Self {
            result: self.result.clone(),
            failure: self.failure.clone(),
            pending: self.pending,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for FetchState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchState")
            .field("result", &self.result)
            .field("failure", &self.failure)
            .field("pending", &self.pending)
            .finish()
    }
}
