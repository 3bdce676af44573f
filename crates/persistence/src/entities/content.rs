// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Content nodes.
//!
//! A node belongs to a route and is an instance of a datatype. The tree
//! pointers (`parent_id`, `first_child_id`, `next_sibling_id`,
//! `prev_sibling_id`) are stored as plain data; keeping them consistent is
//! the caller's concern.

use cmsdb_audit::AuditContext;
use cmsdb_domain::{CanonicalId, ContentNode, ContentNodeUpdate, NewContentNode};
use diesel::prelude::*;

use super::CONTENT_DATA;
use crate::audited::{self, EntityCreate, EntityDelete, EntityUpdate};
use crate::backend::{AuditBackend, Database, PooledConn};
use crate::context::OperationContext;
use crate::error::PersistenceError;
use crate::rows::now_text;

backend_store! {
    /// Content node queries for one backend connection.
    #[allow(clippy::missing_errors_doc)]
    pub trait ContentStore {
        /// Inserts a content node under `id`.
        fn insert_content(
            conn: &mut Self,
            id: &CanonicalId,
            params: &NewContentNode,
        ) -> Result<(), PersistenceError> {
            let now: String = now_text()?;
            diesel::insert_into(schema::content_data::table)
                .values((
                    schema::content_data::id.eq(id.as_str()),
                    schema::content_data::route_id.eq(params.route_id.as_str()),
                    schema::content_data::datatype_id.eq(params.datatype_id.as_str()),
                    schema::content_data::parent_id.eq(rows::opt_id(params.parent_id.as_ref())),
                    schema::content_data::first_child_id
                        .eq(rows::opt_id(params.first_child_id.as_ref())),
                    schema::content_data::next_sibling_id
                        .eq(rows::opt_id(params.next_sibling_id.as_ref())),
                    schema::content_data::prev_sibling_id
                        .eq(rows::opt_id(params.prev_sibling_id.as_ref())),
                    schema::content_data::status.eq(rows::store_int(params.status)?),
                    schema::content_data::author_id.eq(rows::opt_id(params.author_id.as_ref())),
                    schema::content_data::created_at.eq(&now),
                    schema::content_data::updated_at.eq(&now),
                ))
                .execute(conn)?;
            Ok(())
        }

        /// Reads a content node by identifier.
        fn find_content(
            conn: &mut Self,
            id: &CanonicalId,
        ) -> Result<Option<ContentNode>, PersistenceError> {
            schema::content_data::table
                .filter(schema::content_data::id.eq(id.as_str()))
                .first::<rows::ContentRow>(conn)
                .optional()?
                .map(rows::ContentRow::into_domain)
                .transpose()
        }

        /// Overwrites the tree pointers and status of a content node.
        fn update_content_row(
            conn: &mut Self,
            params: &ContentNodeUpdate,
        ) -> Result<usize, PersistenceError> {
            let now: String = now_text()?;
            Ok(diesel::update(
                schema::content_data::table
                    .filter(schema::content_data::id.eq(params.id.as_str())),
            )
            .set((
                schema::content_data::parent_id.eq(rows::opt_id(params.parent_id.as_ref())),
                schema::content_data::first_child_id
                    .eq(rows::opt_id(params.first_child_id.as_ref())),
                schema::content_data::next_sibling_id
                    .eq(rows::opt_id(params.next_sibling_id.as_ref())),
                schema::content_data::prev_sibling_id
                    .eq(rows::opt_id(params.prev_sibling_id.as_ref())),
                schema::content_data::status.eq(rows::store_int(params.status)?),
                schema::content_data::updated_at.eq(&now),
            ))
            .execute(conn)?)
        }

        /// Deletes a content node.
        fn delete_content_row(conn: &mut Self, id: &CanonicalId) -> Result<usize, PersistenceError> {
            Ok(diesel::delete(
                schema::content_data::table.filter(schema::content_data::id.eq(id.as_str())),
            )
            .execute(conn)?)
        }

        /// Lists all content nodes in identifier order.
        fn select_content(conn: &mut Self) -> Result<Vec<ContentNode>, PersistenceError> {
            schema::content_data::table
                .order(schema::content_data::id.asc())
                .load::<rows::ContentRow>(conn)?
                .into_iter()
                .map(rows::ContentRow::into_domain)
                .collect()
        }

        /// Lists the content nodes of one route in identifier order.
        fn select_content_for_route(
            conn: &mut Self,
            route_id: &CanonicalId,
        ) -> Result<Vec<ContentNode>, PersistenceError> {
            schema::content_data::table
                .filter(schema::content_data::route_id.eq(route_id.as_str()))
                .order(schema::content_data::id.asc())
                .load::<rows::ContentRow>(conn)?
                .into_iter()
                .map(rows::ContentRow::into_domain)
                .collect()
        }

        /// Counts content nodes.
        fn count_content_rows(conn: &mut Self) -> Result<i64, PersistenceError> {
            Ok(schema::content_data::table.count().get_result::<i64>(conn)?)
        }
    }
}

/// Creates a content node.
///
/// # Errors
///
/// Returns `ValueOutOfRange` if the status does not fit the backend,
/// `ForeignKeyViolation` if the route or datatype does not exist, or any
/// transaction or recording error.
pub fn create_content<C: AuditBackend>(
    db: &Database<C>,
    ctx: &OperationContext,
    audit: &AuditContext,
    params: NewContentNode,
) -> Result<ContentNode, PersistenceError> {
    let cmd = EntityCreate::new(
        db,
        ctx,
        audit,
        CONTENT_DATA,
        params,
        C::insert_content,
        C::find_content,
    );
    audited::create(&cmd)
}

/// Reads a content node by identifier.
///
/// # Errors
///
/// Returns `RecordNotFound` if the node does not exist.
pub fn get_content<C: AuditBackend>(
    db: &Database<C>,
    id: &CanonicalId,
) -> Result<ContentNode, PersistenceError> {
    let mut conn: PooledConn<C> = db.connection()?;
    conn.find_content(id)?
        .ok_or_else(|| PersistenceError::record_not_found(CONTENT_DATA, id))
}

/// Updates a content node.
///
/// # Errors
///
/// Returns `RecordNotFound` if the node does not exist, or any transaction
/// or recording error.
pub fn update_content<C: AuditBackend>(
    db: &Database<C>,
    ctx: &OperationContext,
    audit: &AuditContext,
    params: ContentNodeUpdate,
) -> Result<(), PersistenceError> {
    let cmd = EntityUpdate::new(
        db,
        ctx,
        audit,
        CONTENT_DATA,
        params.id.clone(),
        params,
        C::find_content,
        C::update_content_row,
    );
    audited::update(&cmd)
}

/// Deletes a content node.
///
/// Nodes pointing at the deleted node keep their pointers.
///
/// # Errors
///
/// Returns `RecordNotFound` if the node does not exist, or any transaction
/// or recording error.
pub fn delete_content<C: AuditBackend>(
    db: &Database<C>,
    ctx: &OperationContext,
    audit: &AuditContext,
    id: &CanonicalId,
) -> Result<(), PersistenceError> {
    let cmd = EntityDelete::new(
        db,
        ctx,
        audit,
        CONTENT_DATA,
        id.clone(),
        C::find_content,
        C::delete_content_row,
    );
    audited::delete(&cmd)
}

/// Lists all content nodes.
///
/// # Errors
///
/// Returns an error if the query fails or a stored row is malformed.
pub fn list_content<C: AuditBackend>(
    db: &Database<C>,
) -> Result<Vec<ContentNode>, PersistenceError> {
    db.connection()?.select_content()
}

/// Lists the content nodes of one route.
///
/// # Errors
///
/// Returns an error if the query fails or a stored row is malformed.
pub fn list_content_for_route<C: AuditBackend>(
    db: &Database<C>,
    route_id: &CanonicalId,
) -> Result<Vec<ContentNode>, PersistenceError> {
    db.connection()?.select_content_for_route(route_id)
}

/// Counts content nodes.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count_content<C: AuditBackend>(db: &Database<C>) -> Result<i64, PersistenceError> {
    db.connection()?.count_content_rows()
}
