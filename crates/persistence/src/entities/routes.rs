// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Routes.
//!
//! A route is an addressable page. Its slug is unique and human-readable,
//! but the route is always updated, deleted and audited by its canonical
//! identifier; the slug is only a lookup key.

use cmsdb_audit::AuditContext;
use cmsdb_domain::{
    CanonicalId, NewRoute, Route, RouteUpdate, validate_new_route, validate_route_update,
};
use diesel::prelude::*;

use super::ROUTES;
use crate::audited::{self, EntityCreate, EntityDelete, EntityUpdate};
use crate::backend::{AuditBackend, Database, PooledConn};
use crate::context::OperationContext;
use crate::error::PersistenceError;
use crate::rows::now_text;

backend_store! {
    /// Route queries for one backend connection.
    #[allow(clippy::missing_errors_doc)]
    pub trait RouteStore {
        /// Inserts a route under `id`.
        fn insert_route(
            conn: &mut Self,
            id: &CanonicalId,
            params: &NewRoute,
        ) -> Result<(), PersistenceError> {
            let now: String = now_text()?;
            diesel::insert_into(schema::routes::table)
                .values((
                    schema::routes::id.eq(id.as_str()),
                    schema::routes::slug.eq(&params.slug),
                    schema::routes::title.eq(&params.title),
                    schema::routes::status.eq(rows::store_int(params.status)?),
                    schema::routes::author_id.eq(rows::opt_id(params.author_id.as_ref())),
                    schema::routes::created_at.eq(&now),
                    schema::routes::updated_at.eq(&now),
                ))
                .execute(conn)?;
            Ok(())
        }

        /// Reads a route by identifier.
        fn find_route(conn: &mut Self, id: &CanonicalId) -> Result<Option<Route>, PersistenceError> {
            schema::routes::table
                .filter(schema::routes::id.eq(id.as_str()))
                .first::<rows::RouteRow>(conn)
                .optional()?
                .map(rows::RouteRow::into_domain)
                .transpose()
        }

        /// Reads a route by slug.
        fn find_route_by_slug(conn: &mut Self, slug: &str) -> Result<Option<Route>, PersistenceError> {
            schema::routes::table
                .filter(schema::routes::slug.eq(slug))
                .first::<rows::RouteRow>(conn)
                .optional()?
                .map(rows::RouteRow::into_domain)
                .transpose()
        }

        /// Overwrites the mutable columns of a route.
        fn update_route_row(conn: &mut Self, params: &RouteUpdate) -> Result<usize, PersistenceError> {
            let now: String = now_text()?;
            Ok(diesel::update(
                schema::routes::table.filter(schema::routes::id.eq(params.id.as_str())),
            )
            .set((
                schema::routes::slug.eq(&params.slug),
                schema::routes::title.eq(&params.title),
                schema::routes::status.eq(rows::store_int(params.status)?),
                schema::routes::author_id.eq(rows::opt_id(params.author_id.as_ref())),
                schema::routes::updated_at.eq(&now),
            ))
            .execute(conn)?)
        }

        /// Deletes a route.
        fn delete_route_row(conn: &mut Self, id: &CanonicalId) -> Result<usize, PersistenceError> {
            Ok(
                diesel::delete(schema::routes::table.filter(schema::routes::id.eq(id.as_str())))
                    .execute(conn)?,
            )
        }

        /// Lists all routes in identifier order.
        fn select_routes(conn: &mut Self) -> Result<Vec<Route>, PersistenceError> {
            schema::routes::table
                .order(schema::routes::id.asc())
                .load::<rows::RouteRow>(conn)?
                .into_iter()
                .map(rows::RouteRow::into_domain)
                .collect()
        }

        /// Counts routes.
        fn count_route_rows(conn: &mut Self) -> Result<i64, PersistenceError> {
            Ok(schema::routes::table.count().get_result::<i64>(conn)?)
        }
    }
}

/// Creates a route.
///
/// # Errors
///
/// Returns `Validation` for a malformed slug or title, `UniqueViolation` if
/// the slug is taken, or any transaction or recording error.
pub fn create_route<C: AuditBackend>(
    db: &Database<C>,
    ctx: &OperationContext,
    audit: &AuditContext,
    params: NewRoute,
) -> Result<Route, PersistenceError> {
    validate_new_route(&params)?;
    let cmd = EntityCreate::new(
        db,
        ctx,
        audit,
        ROUTES,
        params,
        C::insert_route,
        C::find_route,
    );
    audited::create(&cmd)
}

/// Reads a route by identifier.
///
/// # Errors
///
/// Returns `RecordNotFound` if the route does not exist.
pub fn get_route<C: AuditBackend>(
    db: &Database<C>,
    id: &CanonicalId,
) -> Result<Route, PersistenceError> {
    let mut conn: PooledConn<C> = db.connection()?;
    conn.find_route(id)?
        .ok_or_else(|| PersistenceError::record_not_found(ROUTES, id))
}

/// Reads a route by slug.
///
/// # Errors
///
/// Returns `NotFound` if no route has the slug.
pub fn get_route_by_slug<C: AuditBackend>(
    db: &Database<C>,
    slug: &str,
) -> Result<Route, PersistenceError> {
    let mut conn: PooledConn<C> = db.connection()?;
    conn.find_route_by_slug(slug)?
        .ok_or_else(|| PersistenceError::NotFound(format!("Route with slug '{slug}'")))
}

/// Updates a route, addressed by its canonical identifier.
///
/// # Errors
///
/// Returns `Validation` for malformed params, `RecordNotFound` if the route
/// does not exist, or any transaction or recording error.
pub fn update_route<C: AuditBackend>(
    db: &Database<C>,
    ctx: &OperationContext,
    audit: &AuditContext,
    params: RouteUpdate,
) -> Result<(), PersistenceError> {
    validate_route_update(&params)?;
    let cmd = EntityUpdate::new(
        db,
        ctx,
        audit,
        ROUTES,
        params.id.clone(),
        params,
        C::find_route,
        C::update_route_row,
    );
    audited::update(&cmd)
}

/// Deletes a route.
///
/// # Errors
///
/// Returns `RecordNotFound` if the route does not exist,
/// `ForeignKeyViolation` if content still references it, or any transaction
/// or recording error.
pub fn delete_route<C: AuditBackend>(
    db: &Database<C>,
    ctx: &OperationContext,
    audit: &AuditContext,
    id: &CanonicalId,
) -> Result<(), PersistenceError> {
    let cmd = EntityDelete::new(
        db,
        ctx,
        audit,
        ROUTES,
        id.clone(),
        C::find_route,
        C::delete_route_row,
    );
    audited::delete(&cmd)
}

/// Lists all routes.
///
/// # Errors
///
/// Returns an error if the query fails or a stored row is malformed.
pub fn list_routes<C: AuditBackend>(db: &Database<C>) -> Result<Vec<Route>, PersistenceError> {
    db.connection()?.select_routes()
}

/// Counts routes.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count_routes<C: AuditBackend>(db: &Database<C>) -> Result<i64, PersistenceError> {
    db.connection()?.count_route_rows()
}
