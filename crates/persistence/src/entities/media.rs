// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Media assets.
//!
//! Size and dimensions are optional counters. On 32-bit backends a value
//! above `i32::MAX` (a file over 2 GiB) is rejected with `ValueOutOfRange`.

use cmsdb_audit::AuditContext;
use cmsdb_domain::{
    CanonicalId, Media, MediaUpdate, NewMedia, validate_media_update, validate_new_media,
};
use diesel::prelude::*;

use super::MEDIA;
use crate::audited::{self, EntityCreate, EntityDelete, EntityUpdate};
use crate::backend::{AuditBackend, Database, PooledConn};
use crate::context::OperationContext;
use crate::error::PersistenceError;
use crate::rows::now_text;

backend_store! {
    /// Media queries for one backend connection.
    #[allow(clippy::missing_errors_doc)]
    pub trait MediaStore {
        /// Inserts a media asset under `id`.
        fn insert_media(
            conn: &mut Self,
            id: &CanonicalId,
            params: &NewMedia,
        ) -> Result<(), PersistenceError> {
            let now: String = now_text()?;
            diesel::insert_into(schema::media::table)
                .values((
                    schema::media::id.eq(id.as_str()),
                    schema::media::name.eq(&params.name),
                    schema::media::display_name.eq(params.display_name.as_deref()),
                    schema::media::mimetype.eq(&params.mimetype),
                    schema::media::url.eq(&params.url),
                    schema::media::size.eq(rows::store_opt_int(params.size)?),
                    schema::media::width.eq(rows::store_opt_int(params.width)?),
                    schema::media::height.eq(rows::store_opt_int(params.height)?),
                    schema::media::author_id.eq(rows::opt_id(params.author_id.as_ref())),
                    schema::media::created_at.eq(&now),
                    schema::media::updated_at.eq(&now),
                ))
                .execute(conn)?;
            Ok(())
        }

        /// Reads a media asset by identifier.
        fn find_media(conn: &mut Self, id: &CanonicalId) -> Result<Option<Media>, PersistenceError> {
            schema::media::table
                .filter(schema::media::id.eq(id.as_str()))
                .first::<rows::MediaRow>(conn)
                .optional()?
                .map(rows::MediaRow::into_domain)
                .transpose()
        }

        /// Overwrites the metadata columns of a media asset.
        fn update_media_row(conn: &mut Self, params: &MediaUpdate) -> Result<usize, PersistenceError> {
            let now: String = now_text()?;
            Ok(diesel::update(
                schema::media::table.filter(schema::media::id.eq(params.id.as_str())),
            )
            .set((
                schema::media::display_name.eq(params.display_name.as_deref()),
                schema::media::url.eq(&params.url),
                schema::media::size.eq(rows::store_opt_int(params.size)?),
                schema::media::width.eq(rows::store_opt_int(params.width)?),
                schema::media::height.eq(rows::store_opt_int(params.height)?),
                schema::media::updated_at.eq(&now),
            ))
            .execute(conn)?)
        }

        /// Deletes a media asset.
        fn delete_media_row(conn: &mut Self, id: &CanonicalId) -> Result<usize, PersistenceError> {
            Ok(
                diesel::delete(schema::media::table.filter(schema::media::id.eq(id.as_str())))
                    .execute(conn)?,
            )
        }

        /// Lists all media assets in identifier order.
        fn select_media(conn: &mut Self) -> Result<Vec<Media>, PersistenceError> {
            schema::media::table
                .order(schema::media::id.asc())
                .load::<rows::MediaRow>(conn)?
                .into_iter()
                .map(rows::MediaRow::into_domain)
                .collect()
        }

        /// Counts media assets.
        fn count_media_rows(conn: &mut Self) -> Result<i64, PersistenceError> {
            Ok(schema::media::table.count().get_result::<i64>(conn)?)
        }
    }
}

/// Registers a media asset.
///
/// # Errors
///
/// Returns `Validation` for malformed params or negative dimensions,
/// `ValueOutOfRange` if a counter does not fit the backend, or any
/// transaction or recording error.
pub fn create_media<C: AuditBackend>(
    db: &Database<C>,
    ctx: &OperationContext,
    audit: &AuditContext,
    params: NewMedia,
) -> Result<Media, PersistenceError> {
    validate_new_media(&params)?;
    let cmd = EntityCreate::new(
        db,
        ctx,
        audit,
        MEDIA,
        params,
        C::insert_media,
        C::find_media,
    );
    audited::create(&cmd)
}

/// Reads a media asset by identifier.
///
/// # Errors
///
/// Returns `RecordNotFound` if the asset does not exist.
pub fn get_media<C: AuditBackend>(
    db: &Database<C>,
    id: &CanonicalId,
) -> Result<Media, PersistenceError> {
    let mut conn: PooledConn<C> = db.connection()?;
    conn.find_media(id)?
        .ok_or_else(|| PersistenceError::record_not_found(MEDIA, id))
}

/// Updates a media asset's metadata.
///
/// # Errors
///
/// Returns `Validation` for malformed params, `RecordNotFound` if the asset
/// does not exist, or any transaction or recording error.
pub fn update_media<C: AuditBackend>(
    db: &Database<C>,
    ctx: &OperationContext,
    audit: &AuditContext,
    params: MediaUpdate,
) -> Result<(), PersistenceError> {
    validate_media_update(&params)?;
    let cmd = EntityUpdate::new(
        db,
        ctx,
        audit,
        MEDIA,
        params.id.clone(),
        params,
        C::find_media,
        C::update_media_row,
    );
    audited::update(&cmd)
}

/// Deletes a media asset.
///
/// # Errors
///
/// Returns `RecordNotFound` if the asset does not exist, or any transaction
/// or recording error.
pub fn delete_media<C: AuditBackend>(
    db: &Database<C>,
    ctx: &OperationContext,
    audit: &AuditContext,
    id: &CanonicalId,
) -> Result<(), PersistenceError> {
    let cmd = EntityDelete::new(
        db,
        ctx,
        audit,
        MEDIA,
        id.clone(),
        C::find_media,
        C::delete_media_row,
    );
    audited::delete(&cmd)
}

/// Lists all media assets.
///
/// # Errors
///
/// Returns an error if the query fails or a stored row is malformed.
pub fn list_media<C: AuditBackend>(db: &Database<C>) -> Result<Vec<Media>, PersistenceError> {
    db.connection()?.select_media()
}

/// Counts media assets.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count_media<C: AuditBackend>(db: &Database<C>) -> Result<i64, PersistenceError> {
    db.connection()?.count_media_rows()
}
