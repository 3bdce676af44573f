// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Fields: the typed slots of a datatype.
//!
//! A field always belongs to exactly one datatype and never moves to
//! another; `sort_order` positions it among its siblings.

use cmsdb_audit::AuditContext;
use cmsdb_domain::{
    CanonicalId, Field, FieldUpdate, NewField, validate_field_update, validate_new_field,
};
use diesel::prelude::*;

use super::FIELDS;
use crate::audited::{self, EntityCreate, EntityDelete, EntityUpdate};
use crate::backend::{AuditBackend, Database, PooledConn};
use crate::context::OperationContext;
use crate::error::PersistenceError;
use crate::rows::now_text;

backend_store! {
    /// Field queries for one backend connection.
    #[allow(clippy::missing_errors_doc)]
    pub trait FieldStore {
        /// Inserts a field under `id`.
        fn insert_field(
            conn: &mut Self,
            id: &CanonicalId,
            params: &NewField,
        ) -> Result<(), PersistenceError> {
            let now: String = now_text()?;
            diesel::insert_into(schema::fields::table)
                .values((
                    schema::fields::id.eq(id.as_str()),
                    schema::fields::datatype_id.eq(params.datatype_id.as_str()),
                    schema::fields::label.eq(&params.label),
                    schema::fields::kind.eq(&params.kind),
                    schema::fields::data.eq(&params.data),
                    schema::fields::sort_order.eq(rows::store_int(params.sort_order)?),
                    schema::fields::author_id.eq(rows::opt_id(params.author_id.as_ref())),
                    schema::fields::created_at.eq(&now),
                    schema::fields::updated_at.eq(&now),
                ))
                .execute(conn)?;
            Ok(())
        }

        /// Reads a field by identifier.
        fn find_field(conn: &mut Self, id: &CanonicalId) -> Result<Option<Field>, PersistenceError> {
            schema::fields::table
                .filter(schema::fields::id.eq(id.as_str()))
                .first::<rows::FieldRow>(conn)
                .optional()?
                .map(rows::FieldRow::into_domain)
                .transpose()
        }

        /// Overwrites the mutable columns of a field.
        fn update_field_row(conn: &mut Self, params: &FieldUpdate) -> Result<usize, PersistenceError> {
            let now: String = now_text()?;
            Ok(diesel::update(
                schema::fields::table.filter(schema::fields::id.eq(params.id.as_str())),
            )
            .set((
                schema::fields::label.eq(&params.label),
                schema::fields::kind.eq(&params.kind),
                schema::fields::data.eq(&params.data),
                schema::fields::sort_order.eq(rows::store_int(params.sort_order)?),
                schema::fields::updated_at.eq(&now),
            ))
            .execute(conn)?)
        }

        /// Deletes a field.
        fn delete_field_row(conn: &mut Self, id: &CanonicalId) -> Result<usize, PersistenceError> {
            Ok(
                diesel::delete(schema::fields::table.filter(schema::fields::id.eq(id.as_str())))
                    .execute(conn)?,
            )
        }

        /// Lists all fields in identifier order.
        fn select_fields(conn: &mut Self) -> Result<Vec<Field>, PersistenceError> {
            schema::fields::table
                .order(schema::fields::id.asc())
                .load::<rows::FieldRow>(conn)?
                .into_iter()
                .map(rows::FieldRow::into_domain)
                .collect()
        }

        /// Lists the fields of one datatype by sort order.
        fn select_fields_for_datatype(
            conn: &mut Self,
            datatype_id: &CanonicalId,
        ) -> Result<Vec<Field>, PersistenceError> {
            schema::fields::table
                .filter(schema::fields::datatype_id.eq(datatype_id.as_str()))
                .order((schema::fields::sort_order.asc(), schema::fields::id.asc()))
                .load::<rows::FieldRow>(conn)?
                .into_iter()
                .map(rows::FieldRow::into_domain)
                .collect()
        }

        /// Counts fields.
        fn count_field_rows(conn: &mut Self) -> Result<i64, PersistenceError> {
            Ok(schema::fields::table.count().get_result::<i64>(conn)?)
        }
    }
}

/// Creates a field.
///
/// # Errors
///
/// Returns `Validation` for malformed params, `ValueOutOfRange` if the sort
/// order does not fit the backend, `ForeignKeyViolation` if the datatype
/// does not exist, or any transaction or recording error.
pub fn create_field<C: AuditBackend>(
    db: &Database<C>,
    ctx: &OperationContext,
    audit: &AuditContext,
    params: NewField,
) -> Result<Field, PersistenceError> {
    validate_new_field(&params)?;
    let cmd = EntityCreate::new(
        db,
        ctx,
        audit,
        FIELDS,
        params,
        C::insert_field,
        C::find_field,
    );
    audited::create(&cmd)
}

/// Reads a field by identifier.
///
/// # Errors
///
/// Returns `RecordNotFound` if the field does not exist.
pub fn get_field<C: AuditBackend>(
    db: &Database<C>,
    id: &CanonicalId,
) -> Result<Field, PersistenceError> {
    let mut conn: PooledConn<C> = db.connection()?;
    conn.find_field(id)?
        .ok_or_else(|| PersistenceError::record_not_found(FIELDS, id))
}

/// Updates a field.
///
/// # Errors
///
/// Returns `Validation` for malformed params, `RecordNotFound` if the field
/// does not exist, or any transaction or recording error.
pub fn update_field<C: AuditBackend>(
    db: &Database<C>,
    ctx: &OperationContext,
    audit: &AuditContext,
    params: FieldUpdate,
) -> Result<(), PersistenceError> {
    validate_field_update(&params)?;
    let cmd = EntityUpdate::new(
        db,
        ctx,
        audit,
        FIELDS,
        params.id.clone(),
        params,
        C::find_field,
        C::update_field_row,
    );
    audited::update(&cmd)
}

/// Deletes a field.
///
/// # Errors
///
/// Returns `RecordNotFound` if the field does not exist, or any transaction
/// or recording error.
pub fn delete_field<C: AuditBackend>(
    db: &Database<C>,
    ctx: &OperationContext,
    audit: &AuditContext,
    id: &CanonicalId,
) -> Result<(), PersistenceError> {
    let cmd = EntityDelete::new(
        db,
        ctx,
        audit,
        FIELDS,
        id.clone(),
        C::find_field,
        C::delete_field_row,
    );
    audited::delete(&cmd)
}

/// Lists all fields.
///
/// # Errors
///
/// Returns an error if the query fails or a stored row is malformed.
pub fn list_fields<C: AuditBackend>(db: &Database<C>) -> Result<Vec<Field>, PersistenceError> {
    db.connection()?.select_fields()
}

/// Lists the fields of one datatype by sort order.
///
/// # Errors
///
/// Returns an error if the query fails or a stored row is malformed.
pub fn list_fields_for_datatype<C: AuditBackend>(
    db: &Database<C>,
    datatype_id: &CanonicalId,
) -> Result<Vec<Field>, PersistenceError> {
    db.connection()?.select_fields_for_datatype(datatype_id)
}

/// Counts fields.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count_fields<C: AuditBackend>(db: &Database<C>) -> Result<i64, PersistenceError> {
    db.connection()?.count_field_rows()
}
