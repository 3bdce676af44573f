// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::error::PersistenceError;

/// Cancellation and deadline state for one caller operation.
///
/// Clones share the cancellation flag, so cancelling any clone cancels all
/// of them. The context is only consulted before a transaction begins; a
/// transaction already in flight runs to completion.
#[derive(Debug, Clone, Default)]
pub struct OperationContext {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl OperationContext {
    /// Creates a context with no deadline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of this context that expires at `deadline`.
    #[must_use]
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        Self {
            cancelled: Arc::clone(&self.cancelled),
            deadline: Some(deadline),
        }
    }

    /// Returns a copy of this context that expires after `timeout`.
    ///
    /// A timeout too large to represent leaves the context without a deadline.
    #[must_use]
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        Self {
            cancelled: Arc::clone(&self.cancelled),
            deadline: Instant::now().checked_add(timeout),
        }
    }

    /// Cancels this context and every clone of it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Returns true if the context has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Returns the deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns the time left before the deadline, if one is set.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Fails if the context is cancelled or past its deadline.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError::Cancelled` or `PersistenceError::DeadlineExceeded`.
    pub fn check(&self) -> Result<(), PersistenceError> {
        if self.is_cancelled() {
            return Err(PersistenceError::Cancelled);
        }
        if let Some(deadline) = self.deadline
            && Instant::now() >= deadline
        {
            return Err(PersistenceError::DeadlineExceeded);
        }
        Ok(())
    }
}
