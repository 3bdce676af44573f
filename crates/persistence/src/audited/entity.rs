// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Generic entity commands.
//!
//! Each entity builds its commands from these three types by supplying the
//! store operations as function pointers. The store operations are the
//! per-backend query code; the commands adapt them to the command traits.

use cmsdb_audit::AuditContext;
use cmsdb_domain::CanonicalId;
use serde::Serialize;

use super::{CreateCommand, DeleteCommand, UpdateCommand};
use crate::backend::{AuditBackend, ConnectionPool, Database};
use crate::context::OperationContext;
use crate::error::PersistenceError;
use crate::recorder::ChangeRecorder;

/// Inserts a row under a given identifier.
pub type InsertFn<C, P> = fn(&mut C, &CanonicalId, &P) -> Result<(), PersistenceError>;

/// Reads a row by identifier.
pub type FetchFn<C, R> = fn(&mut C, &CanonicalId) -> Result<Option<R>, PersistenceError>;

/// Applies update parameters, returning the number of rows changed.
pub type ApplyFn<C, P> = fn(&mut C, &P) -> Result<usize, PersistenceError>;

/// Deletes a row by identifier, returning the number of rows removed.
pub type RemoveFn<C> = fn(&mut C, &CanonicalId) -> Result<usize, PersistenceError>;

/// Fails with `RecordNotFound` when a mutation touched no row.
fn expect_affected(affected: usize, table: &str, id: &CanonicalId) -> Result<(), PersistenceError> {
    if affected == 0 {
        return Err(PersistenceError::record_not_found(table, id));
    }
    Ok(())
}

/// Creates a row with a freshly generated identifier.
///
/// The row is inserted and then read back inside the same transaction, so
/// the stored form (timestamps, defaults) is what gets recorded.
pub struct EntityCreate<'a, C: AuditBackend, P, R> {
    db: &'a Database<C>,
    ctx: &'a OperationContext,
    audit: &'a AuditContext,
    table: &'static str,
    id: CanonicalId,
    params: P,
    insert: InsertFn<C, P>,
    fetch: FetchFn<C, R>,
}

impl<'a, C: AuditBackend, P, R> EntityCreate<'a, C, P, R> {
    /// Builds a create command for `table`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        db: &'a Database<C>,
        ctx: &'a OperationContext,
        audit: &'a AuditContext,
        table: &'static str,
        params: P,
        insert: InsertFn<C, P>,
        fetch: FetchFn<C, R>,
    ) -> Self {
        Self {
            db,
            ctx,
            audit,
            table,
            id: CanonicalId::generate(),
            params,
            insert,
            fetch,
        }
    }

    /// The identifier the row will be inserted under.
    #[must_use]
    pub const fn id(&self) -> &CanonicalId {
        &self.id
    }
}

impl<C: AuditBackend, P: Serialize, R: Serialize> CreateCommand for EntityCreate<'_, C, P, R>
where
    R: AsRef<CanonicalId>,
{
    type Conn = C;
    type Row = R;
    type Params = P;

    fn context(&self) -> &OperationContext {
        self.ctx
    }

    fn audit_context(&self) -> &AuditContext {
        self.audit
    }

    fn connection(&self) -> &ConnectionPool<C> {
        self.db.pool()
    }

    fn recorder(&self) -> &dyn ChangeRecorder<C> {
        self.db.recorder()
    }

    fn table_name(&self) -> &str {
        self.table
    }

    fn params(&self) -> &P {
        &self.params
    }

    fn execute(&self, _ctx: &OperationContext, tx: &mut C) -> Result<R, PersistenceError> {
        (self.insert)(tx, &self.id, &self.params)?;
        (self.fetch)(tx, &self.id)?
            .ok_or_else(|| PersistenceError::record_not_found(self.table, &self.id))
    }

    fn get_id(&self, row: &R) -> String {
        row.as_ref().to_string()
    }
}

/// Updates the row identified by `id` with `params`.
pub struct EntityUpdate<'a, C: AuditBackend, P, R> {
    db: &'a Database<C>,
    ctx: &'a OperationContext,
    audit: &'a AuditContext,
    table: &'static str,
    id: CanonicalId,
    params: P,
    fetch: FetchFn<C, R>,
    apply: ApplyFn<C, P>,
}

impl<'a, C: AuditBackend, P, R> EntityUpdate<'a, C, P, R> {
    /// Builds an update command for the row `id` in `table`.
    #[allow(clippy::too_many_arguments)]
    pub const fn new(
        db: &'a Database<C>,
        ctx: &'a OperationContext,
        audit: &'a AuditContext,
        table: &'static str,
        id: CanonicalId,
        params: P,
        fetch: FetchFn<C, R>,
        apply: ApplyFn<C, P>,
    ) -> Self {
        Self {
            db,
            ctx,
            audit,
            table,
            id,
            params,
            fetch,
            apply,
        }
    }
}

impl<C: AuditBackend, P: Serialize, R: Serialize> UpdateCommand for EntityUpdate<'_, C, P, R> {
    type Conn = C;
    type Row = R;
    type Params = P;

    fn context(&self) -> &OperationContext {
        self.ctx
    }

    fn audit_context(&self) -> &AuditContext {
        self.audit
    }

    fn connection(&self) -> &ConnectionPool<C> {
        self.db.pool()
    }

    fn recorder(&self) -> &dyn ChangeRecorder<C> {
        self.db.recorder()
    }

    fn table_name(&self) -> &str {
        self.table
    }

    fn params(&self) -> &P {
        &self.params
    }

    fn get_id(&self) -> String {
        self.id.to_string()
    }

    fn get_before(&self, _ctx: &OperationContext, tx: &mut C) -> Result<R, PersistenceError> {
        (self.fetch)(tx, &self.id)?
            .ok_or_else(|| PersistenceError::record_not_found(self.table, &self.id))
    }

    fn execute(&self, _ctx: &OperationContext, tx: &mut C) -> Result<(), PersistenceError> {
        let affected: usize = (self.apply)(tx, &self.params)?;
        expect_affected(affected, self.table, &self.id)
    }
}

/// Deletes the row identified by `id`.
pub struct EntityDelete<'a, C: AuditBackend, R> {
    db: &'a Database<C>,
    ctx: &'a OperationContext,
    audit: &'a AuditContext,
    table: &'static str,
    id: CanonicalId,
    fetch: FetchFn<C, R>,
    remove: RemoveFn<C>,
}

impl<'a, C: AuditBackend, R> EntityDelete<'a, C, R> {
    /// Builds a delete command for the row `id` in `table`.
    pub const fn new(
        db: &'a Database<C>,
        ctx: &'a OperationContext,
        audit: &'a AuditContext,
        table: &'static str,
        id: CanonicalId,
        fetch: FetchFn<C, R>,
        remove: RemoveFn<C>,
    ) -> Self {
        Self {
            db,
            ctx,
            audit,
            table,
            id,
            fetch,
            remove,
        }
    }
}

impl<C: AuditBackend, R: Serialize> DeleteCommand for EntityDelete<'_, C, R> {
    type Conn = C;
    type Row = R;

    fn context(&self) -> &OperationContext {
        self.ctx
    }

    fn audit_context(&self) -> &AuditContext {
        self.audit
    }

    fn connection(&self) -> &ConnectionPool<C> {
        self.db.pool()
    }

    fn recorder(&self) -> &dyn ChangeRecorder<C> {
        self.db.recorder()
    }

    fn table_name(&self) -> &str {
        self.table
    }

    fn get_id(&self) -> String {
        self.id.to_string()
    }

    fn get_before(&self, _ctx: &OperationContext, tx: &mut C) -> Result<R, PersistenceError> {
        (self.fetch)(tx, &self.id)?
            .ok_or_else(|| PersistenceError::record_not_found(self.table, &self.id))
    }

    fn execute(&self, _ctx: &OperationContext, tx: &mut C) -> Result<(), PersistenceError> {
        let affected: usize = (self.remove)(tx, &self.id)?;
        expect_affected(affected, self.table, &self.id)
    }
}
