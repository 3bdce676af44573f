// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Audited commands.
//!
//! A command describes one create, update or delete of a single row: which
//! pool and recorder to use, who is acting, and how to read and mutate the
//! row. The driving functions in this module run a command inside one
//! transaction together with the change event that describes it.
//!
//! The driving functions are generic over the command and never inspect the
//! backend. Only the connection type, the row type and the recorder vary.
//!
//! ## Failure semantics
//!
//! Any error from `get_before`, `execute` or the recorder is returned as-is
//! and the transaction is rolled back. Either the mutation and its change
//! event are both committed, or neither is.

mod entity;

use cmsdb_audit::{AuditContext, ChangeEvent, Operation, StateSnapshot};
use serde::Serialize;
use tracing::info;

use crate::backend::{AuditBackend, ConnectionPool, PooledConn};
use crate::context::OperationContext;
use crate::error::PersistenceError;
use crate::recorder::ChangeRecorder;
use crate::transaction::{run_in_write_transaction, run_in_write_transaction_result};

pub use entity::{
    ApplyFn, EntityCreate, EntityDelete, EntityUpdate, FetchFn, InsertFn, RemoveFn,
};

/// A command that inserts one row.
pub trait CreateCommand {
    /// The backend connection the command runs on.
    type Conn: AuditBackend;
    /// The row produced by the insert.
    type Row: Serialize;
    /// The parameters of the insert.
    type Params: Serialize;

    /// The operation context governing the call.
    fn context(&self) -> &OperationContext;
    /// Who is performing the mutation.
    fn audit_context(&self) -> &AuditContext;
    /// The pool the command checks its connection out of.
    fn connection(&self) -> &ConnectionPool<Self::Conn>;
    /// The recorder that writes the change event.
    fn recorder(&self) -> &dyn ChangeRecorder<Self::Conn>;
    /// The table the row is inserted into.
    fn table_name(&self) -> &str;
    /// The insert parameters.
    fn params(&self) -> &Self::Params;

    /// Inserts the row and returns it as stored.
    ///
    /// # Errors
    ///
    /// Returns any error raised by the insert.
    fn execute(
        &self,
        ctx: &OperationContext,
        tx: &mut Self::Conn,
    ) -> Result<Self::Row, PersistenceError>;

    /// Returns the identifier of an inserted row.
    fn get_id(&self, row: &Self::Row) -> String;
}

/// A command that updates one existing row.
pub trait UpdateCommand {
    /// The backend connection the command runs on.
    type Conn: AuditBackend;
    /// The row as stored before the update.
    type Row: Serialize;
    /// The parameters of the update.
    type Params: Serialize;

    /// The operation context governing the call.
    fn context(&self) -> &OperationContext;
    /// Who is performing the mutation.
    fn audit_context(&self) -> &AuditContext;
    /// The pool the command checks its connection out of.
    fn connection(&self) -> &ConnectionPool<Self::Conn>;
    /// The recorder that writes the change event.
    fn recorder(&self) -> &dyn ChangeRecorder<Self::Conn>;
    /// The table the row lives in.
    fn table_name(&self) -> &str;
    /// The update parameters.
    fn params(&self) -> &Self::Params;

    /// Returns the identifier of the row being updated.
    fn get_id(&self) -> String;

    /// Reads the row before it is modified.
    ///
    /// # Errors
    ///
    /// Returns `RecordNotFound` if the row does not exist.
    fn get_before(
        &self,
        ctx: &OperationContext,
        tx: &mut Self::Conn,
    ) -> Result<Self::Row, PersistenceError>;

    /// Applies the update.
    ///
    /// # Errors
    ///
    /// Returns any error raised by the update.
    fn execute(&self, ctx: &OperationContext, tx: &mut Self::Conn)
    -> Result<(), PersistenceError>;
}

/// A command that deletes one existing row.
pub trait DeleteCommand {
    /// The backend connection the command runs on.
    type Conn: AuditBackend;
    /// The row as stored before the delete.
    type Row: Serialize;

    /// The operation context governing the call.
    fn context(&self) -> &OperationContext;
    /// Who is performing the mutation.
    fn audit_context(&self) -> &AuditContext;
    /// The pool the command checks its connection out of.
    fn connection(&self) -> &ConnectionPool<Self::Conn>;
    /// The recorder that writes the change event.
    fn recorder(&self) -> &dyn ChangeRecorder<Self::Conn>;
    /// The table the row lives in.
    fn table_name(&self) -> &str;

    /// Returns the identifier of the row being deleted.
    fn get_id(&self) -> String;

    /// Reads the row before it is deleted.
    ///
    /// # Errors
    ///
    /// Returns `RecordNotFound` if the row does not exist.
    fn get_before(
        &self,
        ctx: &OperationContext,
        tx: &mut Self::Conn,
    ) -> Result<Self::Row, PersistenceError>;

    /// Deletes the row.
    ///
    /// # Errors
    ///
    /// Returns any error raised by the delete.
    fn execute(&self, ctx: &OperationContext, tx: &mut Self::Conn)
    -> Result<(), PersistenceError>;
}

/// Runs a create command and records a `CREATE` event.
///
/// The event has no before snapshot; its after snapshot is the inserted row.
///
/// # Errors
///
/// Returns `BeginTransaction` if the context is done or no connection or
/// transaction can be obtained, the command's or recorder's error unchanged,
/// or `CommitTransaction` if the commit fails. Nothing is written on error.
pub fn create<Cmd: CreateCommand>(cmd: &Cmd) -> Result<Cmd::Row, PersistenceError> {
    let ctx: &OperationContext = cmd.context();
    let mut conn: PooledConn<Cmd::Conn> = checkout(ctx, cmd.connection())?;

    let (row, event): (Cmd::Row, ChangeEvent) =
        run_in_write_transaction_result(ctx, &mut *conn, |tx| {
            let row: Cmd::Row = cmd.execute(ctx, tx)?;
            let event: ChangeEvent = ChangeEvent::new(
                Operation::Create,
                cmd.table_name(),
                cmd.get_id(&row),
                None,
                Some(StateSnapshot::capture(&row)?),
                cmd.audit_context().clone(),
            );
            cmd.recorder().record(tx, &event)?;
            Ok((row, event))
        })?;

    log_committed(&event);
    Ok(row)
}

/// Runs an update command and records an `UPDATE` event.
///
/// The before snapshot is the row read by `get_before`; the after snapshot
/// is the update parameters. If `get_before` fails nothing is modified.
///
/// # Errors
///
/// As [`create`].
pub fn update<Cmd: UpdateCommand>(cmd: &Cmd) -> Result<(), PersistenceError> {
    let ctx: &OperationContext = cmd.context();
    let mut conn: PooledConn<Cmd::Conn> = checkout(ctx, cmd.connection())?;

    let mut recorded: Option<ChangeEvent> = None;
    run_in_write_transaction(ctx, &mut *conn, |tx| {
        let before: Cmd::Row = cmd.get_before(ctx, tx)?;
        cmd.execute(ctx, tx)?;
        let event: ChangeEvent = ChangeEvent::new(
            Operation::Update,
            cmd.table_name(),
            cmd.get_id(),
            Some(StateSnapshot::capture(&before)?),
            Some(StateSnapshot::capture(cmd.params())?),
            cmd.audit_context().clone(),
        );
        cmd.recorder().record(tx, &event)?;
        recorded = Some(event);
        Ok(())
    })?;

    if let Some(event) = &recorded {
        log_committed(event);
    }
    Ok(())
}

/// Runs a delete command and records a `DELETE` event.
///
/// The before snapshot is the row read by `get_before`; there is no after
/// snapshot. If `get_before` fails nothing is deleted.
///
/// # Errors
///
/// As [`create`].
pub fn delete<Cmd: DeleteCommand>(cmd: &Cmd) -> Result<(), PersistenceError> {
    let ctx: &OperationContext = cmd.context();
    let mut conn: PooledConn<Cmd::Conn> = checkout(ctx, cmd.connection())?;

    let mut recorded: Option<ChangeEvent> = None;
    run_in_write_transaction(ctx, &mut *conn, |tx| {
        let before: Cmd::Row = cmd.get_before(ctx, tx)?;
        cmd.execute(ctx, tx)?;
        let event: ChangeEvent = ChangeEvent::new(
            Operation::Delete,
            cmd.table_name(),
            cmd.get_id(),
            Some(StateSnapshot::capture(&before)?),
            None,
            cmd.audit_context().clone(),
        );
        cmd.recorder().record(tx, &event)?;
        recorded = Some(event);
        Ok(())
    })?;

    if let Some(event) = &recorded {
        log_committed(event);
    }
    Ok(())
}

/// Checks a connection out of `pool`, bounded by the context deadline.
///
/// Failing to obtain a connection means the transaction cannot begin.
fn checkout<C: AuditBackend>(
    ctx: &OperationContext,
    pool: &ConnectionPool<C>,
) -> Result<PooledConn<C>, PersistenceError> {
    let begin_failed = |cause: PersistenceError| PersistenceError::BeginTransaction(Box::new(cause));

    ctx.check().map_err(begin_failed)?;
    let conn = match ctx.remaining() {
        Some(remaining) => pool.get_timeout(remaining),
        None => pool.get(),
    };
    conn.map_err(|e| begin_failed(e.into()))
}

fn log_committed(event: &ChangeEvent) {
    info!(
        event_id = %event.event_id,
        table = %event.table_name,
        record_id = %event.record_id,
        operation = %event.operation,
        "Audited mutation committed"
    );
}
