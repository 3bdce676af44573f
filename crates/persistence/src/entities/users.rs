// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! User accounts.
//!
//! Passwords are hashed with bcrypt before the create command is built, so
//! neither the plaintext nor the hash ever reaches a change-event snapshot.

use cmsdb_audit::AuditContext;
use cmsdb_domain::{
    CanonicalId, NewUser, Role, User, UserUpdate, validate_new_user, validate_user_update,
};
use diesel::prelude::*;
use serde::Serialize;
use tracing::debug;

use super::USERS;
use crate::audited::{self, EntityCreate, EntityDelete, EntityUpdate};
use crate::backend::{AuditBackend, Database, PooledConn};
use crate::context::OperationContext;
use crate::error::PersistenceError;
use crate::rows::now_text;

/// bcrypt work factor. Tests use the minimum to stay fast.
const BCRYPT_COST: u32 = if cfg!(test) {
    4 // bcrypt's minimum cost (`bcrypt::MIN_COST` is private)
} else {
    bcrypt::DEFAULT_COST
};

/// A user as written to storage: the create parameters with the password
/// replaced by its hash.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct NewUserRecord {
    pub username: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing)]
    pub password_hash: String,
}

impl std::fmt::Debug for NewUserRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUserRecord")
            .field("username", &self.username)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("password_hash", &"<redacted>")
            .finish()
    }
}

impl NewUserRecord {
    /// Hashes the password of `params`.
    ///
    /// # Errors
    ///
    /// Returns `PasswordHash` if hashing fails.
    pub fn hash(params: NewUser) -> Result<Self, PersistenceError> {
        let password_hash: String = bcrypt::hash(&params.password, BCRYPT_COST)?;
        Ok(Self {
            username: params.username,
            name: params.name,
            email: params.email,
            role: params.role,
            password_hash,
        })
    }
}

backend_store! {
    /// User queries for one backend connection.
    #[allow(clippy::missing_errors_doc)]
    pub trait UserStore {
        /// Inserts a user under `id`.
        fn insert_user(
            conn: &mut Self,
            id: &CanonicalId,
            params: &NewUserRecord,
        ) -> Result<(), PersistenceError> {
            let now: String = now_text()?;
            diesel::insert_into(schema::users::table)
                .values((
                    schema::users::id.eq(id.as_str()),
                    schema::users::username.eq(&params.username),
                    schema::users::name.eq(&params.name),
                    schema::users::email.eq(&params.email),
                    schema::users::role.eq(params.role.as_str()),
                    schema::users::password_hash.eq(&params.password_hash),
                    schema::users::is_active.eq(true),
                    schema::users::created_at.eq(&now),
                    schema::users::updated_at.eq(&now),
                ))
                .execute(conn)?;
            Ok(())
        }

        /// Reads a user by identifier.
        fn find_user(conn: &mut Self, id: &CanonicalId) -> Result<Option<User>, PersistenceError> {
            schema::users::table
                .filter(schema::users::id.eq(id.as_str()))
                .first::<rows::UserRow>(conn)
                .optional()?
                .map(rows::UserRow::into_domain)
                .transpose()
        }

        /// Reads a user by username.
        fn find_user_by_username(
            conn: &mut Self,
            username: &str,
        ) -> Result<Option<User>, PersistenceError> {
            schema::users::table
                .filter(schema::users::username.eq(username))
                .first::<rows::UserRow>(conn)
                .optional()?
                .map(rows::UserRow::into_domain)
                .transpose()
        }

        /// Reads the password hash and active flag of a user.
        fn find_user_credentials(
            conn: &mut Self,
            username: &str,
        ) -> Result<Option<(String, bool)>, PersistenceError> {
            Ok(schema::users::table
                .filter(schema::users::username.eq(username))
                .select((schema::users::password_hash, schema::users::is_active))
                .first::<(String, bool)>(conn)
                .optional()?)
        }

        /// Overwrites the profile columns of a user. The password is untouched.
        fn update_user_row(conn: &mut Self, params: &UserUpdate) -> Result<usize, PersistenceError> {
            let now: String = now_text()?;
            Ok(diesel::update(
                schema::users::table.filter(schema::users::id.eq(params.id.as_str())),
            )
            .set((
                schema::users::username.eq(&params.username),
                schema::users::name.eq(&params.name),
                schema::users::email.eq(&params.email),
                schema::users::role.eq(params.role.as_str()),
                schema::users::is_active.eq(params.is_active),
                schema::users::updated_at.eq(&now),
            ))
            .execute(conn)?)
        }

        /// Deletes a user.
        fn delete_user_row(conn: &mut Self, id: &CanonicalId) -> Result<usize, PersistenceError> {
            Ok(
                diesel::delete(schema::users::table.filter(schema::users::id.eq(id.as_str())))
                    .execute(conn)?,
            )
        }

        /// Lists all users in identifier order.
        fn select_users(conn: &mut Self) -> Result<Vec<User>, PersistenceError> {
            schema::users::table
                .order(schema::users::id.asc())
                .load::<rows::UserRow>(conn)?
                .into_iter()
                .map(rows::UserRow::into_domain)
                .collect()
        }

        /// Counts users.
        fn count_user_rows(conn: &mut Self) -> Result<i64, PersistenceError> {
            Ok(schema::users::table.count().get_result::<i64>(conn)?)
        }
    }
}

/// Creates a user.
///
/// # Errors
///
/// Returns `Validation` for malformed params, `PasswordHash` if hashing
/// fails, `UniqueViolation` if the username is taken, or any transaction or
/// recording error.
pub fn create_user<C: AuditBackend>(
    db: &Database<C>,
    ctx: &OperationContext,
    audit: &AuditContext,
    params: NewUser,
) -> Result<User, PersistenceError> {
    validate_new_user(&params)?;
    let record: NewUserRecord = NewUserRecord::hash(params)?;
    let cmd = EntityCreate::new(
        db,
        ctx,
        audit,
        USERS,
        record,
        C::insert_user,
        C::find_user,
    );
    audited::create(&cmd)
}

/// Reads a user by identifier.
///
/// # Errors
///
/// Returns `RecordNotFound` if the user does not exist.
pub fn get_user<C: AuditBackend>(
    db: &Database<C>,
    id: &CanonicalId,
) -> Result<User, PersistenceError> {
    let mut conn: PooledConn<C> = db.connection()?;
    conn.find_user(id)?
        .ok_or_else(|| PersistenceError::record_not_found(USERS, id))
}

/// Reads a user by username.
///
/// # Errors
///
/// Returns `NotFound` if no user has the username.
pub fn get_user_by_username<C: AuditBackend>(
    db: &Database<C>,
    username: &str,
) -> Result<User, PersistenceError> {
    let mut conn: PooledConn<C> = db.connection()?;
    conn.find_user_by_username(username)?
        .ok_or_else(|| PersistenceError::NotFound(format!("User '{username}'")))
}

/// Checks a username and password.
///
/// Unknown and inactive users never verify.
///
/// # Errors
///
/// Returns an error if the query fails or the stored hash is malformed.
pub fn verify_user_password<C: AuditBackend>(
    db: &Database<C>,
    username: &str,
    password: &str,
) -> Result<bool, PersistenceError> {
    let mut conn: PooledConn<C> = db.connection()?;
    let Some((password_hash, is_active)) = conn.find_user_credentials(username)? else {
        debug!(username, "Password check for unknown user");
        return Ok(false);
    };
    if !is_active {
        debug!(username, "Password check for inactive user");
        return Ok(false);
    }
    Ok(bcrypt::verify(password, &password_hash)?)
}

/// Updates a user's profile, addressed by its canonical identifier.
///
/// # Errors
///
/// Returns `Validation` for malformed params, `RecordNotFound` if the user
/// does not exist, or any transaction or recording error.
pub fn update_user<C: AuditBackend>(
    db: &Database<C>,
    ctx: &OperationContext,
    audit: &AuditContext,
    params: UserUpdate,
) -> Result<(), PersistenceError> {
    validate_user_update(&params)?;
    let cmd = EntityUpdate::new(
        db,
        ctx,
        audit,
        USERS,
        params.id.clone(),
        params,
        C::find_user,
        C::update_user_row,
    );
    audited::update(&cmd)
}

/// Deletes a user.
///
/// # Errors
///
/// Returns `RecordNotFound` if the user does not exist, or any transaction
/// or recording error.
pub fn delete_user<C: AuditBackend>(
    db: &Database<C>,
    ctx: &OperationContext,
    audit: &AuditContext,
    id: &CanonicalId,
) -> Result<(), PersistenceError> {
    let cmd = EntityDelete::new(
        db,
        ctx,
        audit,
        USERS,
        id.clone(),
        C::find_user,
        C::delete_user_row,
    );
    audited::delete(&cmd)
}

/// Lists all users.
///
/// # Errors
///
/// Returns an error if the query fails or a stored row is malformed.
pub fn list_users<C: AuditBackend>(db: &Database<C>) -> Result<Vec<User>, PersistenceError> {
    db.connection()?.select_users()
}

/// Counts users.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count_users<C: AuditBackend>(db: &Database<C>) -> Result<i64, PersistenceError> {
    db.connection()?.count_user_rows()
}
