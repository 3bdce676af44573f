// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Transaction executor.
//!
//! [`run_in_transaction`] and [`run_in_transaction_result`] run a caller
//! function inside a transaction on any Diesel connection:
//!
//! - the operation context is checked, then the transaction begins; if
//!   either fails the function is never invoked and the error is a
//!   `BeginTransaction`
//! - an error from the function is returned unchanged and the work is
//!   rolled back
//! - a panic in the function rolls back and then resumes unwinding
//! - on success the transaction commits; a commit failure is a
//!   `CommitTransaction` and still hands back the computed value
//!
//! Rollback runs on every exit path and is a no-op when the transaction is
//! already finalized, including when the function finalized it itself.
//! Nesting is supported: an inner call uses a savepoint and never touches
//! the enclosing transaction.
//!
//! The `write` variants begin through the backend's write hook. Audited
//! mutations read before they write, and `SQLite` in WAL mode cannot
//! upgrade a read transaction once another writer has committed, so a
//! `SQLite` write transaction takes its lock with `BEGIN IMMEDIATE`.
//!
//! A connection must not be shared between threads while a transaction is
//! open on it; concurrent callers each check out their own connection.

use std::num::NonZeroU32;
use std::panic::{AssertUnwindSafe, catch_unwind, resume_unwind};

use diesel::QueryResult;
use diesel::connection::{Connection, TransactionManager};
use tracing::{debug, warn};

use crate::backend::AuditBackend;
use crate::context::OperationContext;
use crate::error::PersistenceError;

/// A transaction failure, optionally carrying a value computed before it.
///
/// `uncommitted` is only set when the caller function succeeded but the
/// commit did not: the value exists, but nothing it describes is durable.
#[derive(Debug)]
pub struct TransactionFailure<T> {
    /// What went wrong.
    pub error: PersistenceError,
    /// The value the function produced, if the failure happened after it.
    pub uncommitted: Option<T>,
}

impl<T> TransactionFailure<T> {
    const fn new(error: PersistenceError) -> Self {
        Self {
            error,
            uncommitted: None,
        }
    }

    const fn with_value(error: PersistenceError, value: T) -> Self {
        Self {
            error,
            uncommitted: Some(value),
        }
    }
}

impl<T> std::fmt::Display for TransactionFailure<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.error.fmt(f)
    }
}

impl<T: std::fmt::Debug> std::error::Error for TransactionFailure<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl<T> From<TransactionFailure<T>> for PersistenceError {
    fn from(failure: TransactionFailure<T>) -> Self {
        failure.error
    }
}

/// Runs `f` in a transaction on `conn`, discarding its result value.
///
/// # Errors
///
/// Returns `BeginTransaction` if the context is done or the transaction
/// cannot start, `f`'s own error unchanged, or `CommitTransaction` if the
/// commit fails.
pub fn run_in_transaction<C, F>(
    ctx: &OperationContext,
    conn: &mut C,
    f: F,
) -> Result<(), PersistenceError>
where
    C: Connection,
    F: FnOnce(&mut C) -> Result<(), PersistenceError>,
{
    run_in_transaction_result(ctx, conn, f).map_err(PersistenceError::from)
}

/// Runs `f` in a transaction on `conn` and returns its value.
///
/// # Errors
///
/// As [`run_in_transaction`]. When the commit fails the failure carries
/// `f`'s value in [`TransactionFailure::uncommitted`].
pub fn run_in_transaction_result<C, T, F>(
    ctx: &OperationContext,
    conn: &mut C,
    f: F,
) -> Result<T, TransactionFailure<T>>
where
    C: Connection,
    F: FnOnce(&mut C) -> Result<T, PersistenceError>,
{
    execute(
        ctx,
        conn,
        <C::TransactionManager as TransactionManager<C>>::begin_transaction,
        f,
    )
}

/// Runs `f` in a transaction that will write, discarding its result value.
///
/// The transaction is begun with [`AuditBackend::begin_write_transaction`],
/// so on backends that lock lazily the write lock is taken up front.
///
/// # Errors
///
/// As [`run_in_transaction`].
pub fn run_in_write_transaction<C, F>(
    ctx: &OperationContext,
    conn: &mut C,
    f: F,
) -> Result<(), PersistenceError>
where
    C: AuditBackend,
    F: FnOnce(&mut C) -> Result<(), PersistenceError>,
{
    run_in_write_transaction_result(ctx, conn, f).map_err(PersistenceError::from)
}

/// Runs `f` in a transaction that will write and returns its value.
///
/// # Errors
///
/// As [`run_in_transaction_result`].
pub fn run_in_write_transaction_result<C, T, F>(
    ctx: &OperationContext,
    conn: &mut C,
    f: F,
) -> Result<T, TransactionFailure<T>>
where
    C: AuditBackend,
    F: FnOnce(&mut C) -> Result<T, PersistenceError>,
{
    execute(ctx, conn, C::begin_write_transaction, f)
}

fn execute<C, T, B, F>(
    ctx: &OperationContext,
    conn: &mut C,
    begin: B,
    f: F,
) -> Result<T, TransactionFailure<T>>
where
    C: Connection,
    B: FnOnce(&mut C) -> QueryResult<()>,
    F: FnOnce(&mut C) -> Result<T, PersistenceError>,
{
    let begin_failed = |cause: PersistenceError| {
        TransactionFailure::new(PersistenceError::BeginTransaction(Box::new(cause)))
    };

    ctx.check().map_err(begin_failed)?;
    let start_depth: u32 = transaction_depth(conn).map_err(begin_failed)?;
    begin(conn).map_err(|e| begin_failed(e.into()))?;
    debug!(depth = start_depth + 1, "Transaction started");

    let value: T = match catch_unwind(AssertUnwindSafe(|| f(conn))) {
        Ok(Ok(value)) => value,
        Ok(Err(err)) => {
            rollback_if_open(conn, start_depth);
            return Err(TransactionFailure::new(err));
        }
        Err(panic) => {
            rollback_if_open(conn, start_depth);
            resume_unwind(panic);
        }
    };

    let commit_failed = |cause: PersistenceError, value: T| {
        TransactionFailure::with_value(PersistenceError::CommitTransaction(Box::new(cause)), value)
    };

    match transaction_depth(conn) {
        Ok(depth) if depth > start_depth => {}
        Ok(_) => {
            // Finalized inside `f`; there is nothing left to commit.
            return Err(commit_failed(
                diesel::result::Error::NotInTransaction.into(),
                value,
            ));
        }
        Err(err) => {
            rollback_if_open(conn, start_depth);
            return Err(commit_failed(err, value));
        }
    }

    if let Err(err) = <C::TransactionManager as TransactionManager<C>>::commit_transaction(conn) {
        rollback_if_open(conn, start_depth);
        return Err(commit_failed(err.into(), value));
    }
    debug!(depth = start_depth + 1, "Transaction committed");

    rollback_if_open(conn, start_depth);
    Ok(value)
}

/// Returns the number of transactions currently open on `conn`.
fn transaction_depth<C: Connection>(conn: &mut C) -> Result<u32, PersistenceError> {
    let depth: Option<NonZeroU32> =
        <C::TransactionManager as TransactionManager<C>>::transaction_manager_status_mut(conn)
            .transaction_depth()?;
    Ok(depth.map_or(0, NonZeroU32::get))
}

/// Rolls back the transaction opened at `start_depth` if it is still open.
///
/// An unknown depth means the transaction manager is in an error state, in
/// which case a rollback is still attempted.
fn rollback_if_open<C: Connection>(conn: &mut C, start_depth: u32) {
    if let Ok(depth) = transaction_depth(conn)
        && depth <= start_depth
    {
        return;
    }

    match <C::TransactionManager as TransactionManager<C>>::rollback_transaction(conn) {
        Ok(()) => debug!(depth = start_depth + 1, "Transaction rolled back"),
        Err(err) => warn!(error = %err, "Transaction rollback failed"),
    }
}
