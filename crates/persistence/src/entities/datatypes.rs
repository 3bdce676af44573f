// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Datatypes: the schemas content nodes are instances of.

use cmsdb_audit::AuditContext;
use cmsdb_domain::{
    CanonicalId, Datatype, DatatypeUpdate, NewDatatype, validate_datatype_update,
    validate_new_datatype,
};
use diesel::prelude::*;

use super::DATATYPES;
use crate::audited::{self, EntityCreate, EntityDelete, EntityUpdate};
use crate::backend::{AuditBackend, Database, PooledConn};
use crate::context::OperationContext;
use crate::error::PersistenceError;
use crate::rows::now_text;

backend_store! {
    /// Datatype queries for one backend connection.
    #[allow(clippy::missing_errors_doc)]
    pub trait DatatypeStore {
        /// Inserts a datatype under `id`.
        fn insert_datatype(
            conn: &mut Self,
            id: &CanonicalId,
            params: &NewDatatype,
        ) -> Result<(), PersistenceError> {
            let now: String = now_text()?;
            diesel::insert_into(schema::datatypes::table)
                .values((
                    schema::datatypes::id.eq(id.as_str()),
                    schema::datatypes::parent_id.eq(rows::opt_id(params.parent_id.as_ref())),
                    schema::datatypes::label.eq(&params.label),
                    schema::datatypes::kind.eq(&params.kind),
                    schema::datatypes::author_id.eq(rows::opt_id(params.author_id.as_ref())),
                    schema::datatypes::created_at.eq(&now),
                    schema::datatypes::updated_at.eq(&now),
                ))
                .execute(conn)?;
            Ok(())
        }

        /// Reads a datatype by identifier.
        fn find_datatype(
            conn: &mut Self,
            id: &CanonicalId,
        ) -> Result<Option<Datatype>, PersistenceError> {
            schema::datatypes::table
                .filter(schema::datatypes::id.eq(id.as_str()))
                .first::<rows::DatatypeRow>(conn)
                .optional()?
                .map(rows::DatatypeRow::into_domain)
                .transpose()
        }

        /// Overwrites the mutable columns of a datatype.
        fn update_datatype_row(
            conn: &mut Self,
            params: &DatatypeUpdate,
        ) -> Result<usize, PersistenceError> {
            let now: String = now_text()?;
            Ok(diesel::update(
                schema::datatypes::table.filter(schema::datatypes::id.eq(params.id.as_str())),
            )
            .set((
                schema::datatypes::parent_id.eq(rows::opt_id(params.parent_id.as_ref())),
                schema::datatypes::label.eq(&params.label),
                schema::datatypes::kind.eq(&params.kind),
                schema::datatypes::updated_at.eq(&now),
            ))
            .execute(conn)?)
        }

        /// Deletes a datatype.
        fn delete_datatype_row(conn: &mut Self, id: &CanonicalId) -> Result<usize, PersistenceError> {
            Ok(diesel::delete(
                schema::datatypes::table.filter(schema::datatypes::id.eq(id.as_str())),
            )
            .execute(conn)?)
        }

        /// Lists all datatypes in identifier order.
        fn select_datatypes(conn: &mut Self) -> Result<Vec<Datatype>, PersistenceError> {
            schema::datatypes::table
                .order(schema::datatypes::id.asc())
                .load::<rows::DatatypeRow>(conn)?
                .into_iter()
                .map(rows::DatatypeRow::into_domain)
                .collect()
        }

        /// Counts datatypes.
        fn count_datatype_rows(conn: &mut Self) -> Result<i64, PersistenceError> {
            Ok(schema::datatypes::table.count().get_result::<i64>(conn)?)
        }
    }
}

/// Creates a datatype.
///
/// # Errors
///
/// Returns `Validation` for malformed params, `ForeignKeyViolation` if the
/// parent does not exist, or any transaction or recording error.
pub fn create_datatype<C: AuditBackend>(
    db: &Database<C>,
    ctx: &OperationContext,
    audit: &AuditContext,
    params: NewDatatype,
) -> Result<Datatype, PersistenceError> {
    validate_new_datatype(&params)?;
    let cmd = EntityCreate::new(
        db,
        ctx,
        audit,
        DATATYPES,
        params,
        C::insert_datatype,
        C::find_datatype,
    );
    audited::create(&cmd)
}

/// Reads a datatype by identifier.
///
/// # Errors
///
/// Returns `RecordNotFound` if the datatype does not exist.
pub fn get_datatype<C: AuditBackend>(
    db: &Database<C>,
    id: &CanonicalId,
) -> Result<Datatype, PersistenceError> {
    let mut conn: PooledConn<C> = db.connection()?;
    conn.find_datatype(id)?
        .ok_or_else(|| PersistenceError::record_not_found(DATATYPES, id))
}

/// Updates a datatype.
///
/// # Errors
///
/// Returns `Validation` for malformed params, `RecordNotFound` if the
/// datatype does not exist, or any transaction or recording error.
pub fn update_datatype<C: AuditBackend>(
    db: &Database<C>,
    ctx: &OperationContext,
    audit: &AuditContext,
    params: DatatypeUpdate,
) -> Result<(), PersistenceError> {
    validate_datatype_update(&params)?;
    let cmd = EntityUpdate::new(
        db,
        ctx,
        audit,
        DATATYPES,
        params.id.clone(),
        params,
        C::find_datatype,
        C::update_datatype_row,
    );
    audited::update(&cmd)
}

/// Deletes a datatype.
///
/// # Errors
///
/// Returns `RecordNotFound` if the datatype does not exist,
/// `ForeignKeyViolation` while fields, content or child datatypes still
/// reference it, or any transaction or recording error.
pub fn delete_datatype<C: AuditBackend>(
    db: &Database<C>,
    ctx: &OperationContext,
    audit: &AuditContext,
    id: &CanonicalId,
) -> Result<(), PersistenceError> {
    let cmd = EntityDelete::new(
        db,
        ctx,
        audit,
        DATATYPES,
        id.clone(),
        C::find_datatype,
        C::delete_datatype_row,
    );
    audited::delete(&cmd)
}

/// Lists all datatypes.
///
/// # Errors
///
/// Returns an error if the query fails or a stored row is malformed.
pub fn list_datatypes<C: AuditBackend>(
    db: &Database<C>,
) -> Result<Vec<Datatype>, PersistenceError> {
    db.connection()?.select_datatypes()
}

/// Counts datatypes.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count_datatypes<C: AuditBackend>(db: &Database<C>) -> Result<i64, PersistenceError> {
    db.connection()?.count_datatype_rows()
}
