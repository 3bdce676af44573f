// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Transactional, audited persistence for cmsdb.
//!
//! Every create, update and delete of an entity runs through one generic
//! mechanism:
//!
//! 1. [`run_in_transaction`] / [`run_in_transaction_result`] open a
//!    transaction, run a function against it and commit, rolling back on
//!    any error or panic. Audited mutations use the `write` variants, which
//!    begin through the backend's write hook.
//! 2. An entity operation is expressed as a command implementing
//!    [`CreateCommand`], [`UpdateCommand`] or [`DeleteCommand`].
//! 3. [`audited::create`], [`audited::update`] and [`audited::delete`] drive
//!    a command: snapshot the state before and after, apply the mutation and
//!    hand a [`ChangeEvent`](cmsdb_audit::ChangeEvent) to the backend's
//!    [`ChangeRecorder`], all inside one transaction. Either the mutation and
//!    its change event both land, or neither does.
//!
//! ## Database Backend Support
//!
//! - **`SQLite`** (default): Used for development, unit tests, and integration tests
//! - **`MariaDB`/`MySQL`**: Validated via explicit opt-in tests
//! - **`PostgreSQL`**: Validated via explicit opt-in tests
//!
//! All three are compiled in. The driving functions never branch on the
//! backend: only the connection type, the row types and the recorder vary,
//! and those are selected by the connection type parameter of
//! [`Database`]. Runtime selection from a URL happens once, in
//! [`Persistence`].
//!
//! To run the external backend validation tests:
//! ```bash
//! cargo xtask test-mariadb
//! cargo xtask test-postgres
//! ```
//!
//! ### Migration Strategy
//!
//! Due to `SQL` syntax differences between backends, we maintain separate
//! migration directories:
//!
//! - `migrations/`: `SQLite`-specific (default)
//! - `migrations_mysql/`: `MySQL`/`MariaDB`-specific
//! - `migrations_postgres/`: `PostgreSQL`-specific
//!
//! All produce the same schema apart from counter widths (64-bit on
//! `SQLite`, 32-bit elsewhere) and the change-log column types.
//!
//! ## Testing Philosophy
//!
//! - Standard tests (`cargo test`) run against in-memory `SQLite` only
//! - Backend validation tests are explicitly marked `#[ignore]`
//! - External database tests never run automatically
//! - All infrastructure is orchestrated by `xtask`, not embedded in tests
//! - Tests fail fast if required infrastructure is missing

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

/// Declares a store trait and implements it for every backend connection.
///
/// Each operation is written once. The macro emits the trait and one impl
/// each for `SqliteConnection`, `MysqlConnection` and `PgConnection`, with
/// the body copied verbatim into every impl. Inside a body:
///
/// - `schema` names the backend's module in `diesel_schema`
/// - `rows` names the backend's module in `rows`
/// - the connection parameter is `&mut Self`, the concrete connection
///
/// Diesel resolves query types against a concrete backend, so the impls are
/// fully monomorphic. The macro only duplicates bodies and substitutes the
/// two module aliases; it contains no logic or dispatch.
///
/// # Usage
///
/// ```ignore
/// backend_store! {
///     pub trait RouteStore {
///         fn count_route_rows(conn: &mut Self) -> Result<i64, PersistenceError> {
///             Ok(schema::routes::table.count().get_result(conn)?)
///         }
///     }
/// }
/// ```
macro_rules! backend_store {
    (
        $(#[$trait_meta:meta])*
        pub trait $store:ident {
            $(
                $(#[$fn_meta:meta])*
                fn $name:ident (
                    $conn:ident : &mut Self
                    $(, $param:ident : $param_ty:ty)* $(,)?
                ) -> $ret:ty
                $body:block
            )*
        }
    ) => {
        $(#[$trait_meta])*
        pub trait $store {
            $(
                $(#[$fn_meta])*
                fn $name(&mut self $(, $param: $param_ty)*) -> $ret;
            )*
        }

        backend_store!(@impl $store, diesel::SqliteConnection, sqlite,
            $( $name ($conn $(, $param : $param_ty)*) -> $ret $body )*);
        backend_store!(@impl $store, diesel::MysqlConnection, mysql,
            $( $name ($conn $(, $param : $param_ty)*) -> $ret $body )*);
        backend_store!(@impl $store, diesel::PgConnection, postgres,
            $( $name ($conn $(, $param : $param_ty)*) -> $ret $body )*);
    };
    (
        @impl $store:ident, $conn_ty:ty, $backend:ident,
        $( $name:ident ($conn:ident $(, $param:ident : $param_ty:ty)*) -> $ret:ty $body:block )*
    ) => {
        impl $store for $conn_ty {
            $(
                fn $name(&mut self $(, $param: $param_ty)*) -> $ret {
                    #[allow(unused_imports)]
                    use $crate::diesel_schema::$backend as schema;
                    #[allow(unused_imports)]
                    use $crate::rows::$backend as rows;
                    let $conn: &mut Self = self;
                    $body
                }
            )*
        }
    };
}

pub mod audited;
mod backend;
mod config;
mod context;
mod diesel_schema;
mod entities;
mod error;
mod recorder;
pub mod rows;
mod transaction;

#[cfg(test)]
mod tests;

pub use audited::{
    CreateCommand, DeleteCommand, EntityCreate, EntityDelete, EntityUpdate, UpdateCommand,
};
pub use backend::{AuditBackend, ConnectionPool, Database, PooledConn};
pub use config::{BackendKind, DatabaseConfig, DATABASE_URL_ENV, IN_MEMORY_URL, MAX_CONNECTIONS_ENV};
pub use context::OperationContext;
pub use entities::{
    CHANGE_EVENTS, CONTENT_DATA, ChangeEventStore, ContentStore, DATATYPES, DatatypeStore, FIELDS,
    FieldStore, MEDIA, MediaStore, NewUserRecord, ROUTES, RouteStore, USERS, UserStore,
    count_change_events, count_change_events_for_record, count_content, count_datatypes,
    count_fields, count_media, count_routes, count_users, create_content, create_datatype,
    create_field, create_media, create_route, create_user, delete_content, delete_datatype,
    delete_field, delete_media, delete_route, delete_user, get_content, get_datatype, get_field,
    get_media, get_route, get_route_by_slug, get_user, get_user_by_username,
    list_change_events_for_record, list_content, list_content_for_route, list_datatypes,
    list_fields, list_fields_for_datatype, list_media, list_recent_change_events, list_routes,
    list_users, update_content, update_datatype, update_field, update_media, update_route,
    update_user, verify_user_password,
};
pub use error::PersistenceError;
pub use recorder::{
    ChangeRecorder, MysqlRecorder, PostgresRecorder, SqliteRecorder, validate_record_id,
};
pub use transaction::{
    TransactionFailure, run_in_transaction, run_in_transaction_result, run_in_write_transaction,
    run_in_write_transaction_result,
};

use cmsdb_audit::ChangeEvent;
use cmsdb_domain::CanonicalId;
use diesel::{MysqlConnection, PgConnection, SqliteConnection};

/// A database of any supported backend, selected at runtime.
///
/// Backend dispatch happens here and nowhere else. Code that knows its
/// backend statically should use [`Database`] directly.
#[derive(Debug, Clone)]
pub enum Persistence {
    /// A `SQLite` file or in-memory database.
    Sqlite(Database<SqliteConnection>),
    /// A `MySQL` or `MariaDB` database.
    Mysql(Database<MysqlConnection>),
    /// A `PostgreSQL` database.
    Postgres(Database<PgConnection>),
}

impl Persistence {
    /// Opens the database `config` describes, applying migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn open(config: &DatabaseConfig) -> Result<Self, PersistenceError> {
        Ok(match config.backend {
            BackendKind::Sqlite => Self::Sqlite(Database::open(config)?),
            BackendKind::Mysql => Self::Mysql(Database::open(config)?),
            BackendKind::Postgres => Self::Postgres(Database::open(config)?),
        })
    }

    /// Creates a persistence adapter with a private in-memory `SQLite` database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn new_in_memory() -> Result<Self, PersistenceError> {
        Ok(Self::Sqlite(Database::in_memory()?))
    }

    /// Returns the active backend.
    #[must_use]
    pub const fn backend(&self) -> BackendKind {
        match self {
            Self::Sqlite(_) => BackendKind::Sqlite,
            Self::Mysql(_) => BackendKind::Mysql,
            Self::Postgres(_) => BackendKind::Postgres,
        }
    }

    /// Applies pending migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if a migration fails.
    pub fn migrate(&self) -> Result<(), PersistenceError> {
        match self {
            Self::Sqlite(db) => db.migrate(),
            Self::Mysql(db) => db.migrate(),
            Self::Postgres(db) => db.migrate(),
        }
    }

    /// Verifies that foreign key enforcement is enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if foreign key enforcement is not enabled.
    pub fn verify_foreign_key_enforcement(&self) -> Result<(), PersistenceError> {
        match self {
            Self::Sqlite(db) => db.verify_foreign_key_enforcement(),
            Self::Mysql(db) => db.verify_foreign_key_enforcement(),
            Self::Postgres(db) => db.verify_foreign_key_enforcement(),
        }
    }

    /// Lists the most recent change events, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a stored event is malformed.
    pub fn recent_change_events(&self, limit: i64) -> Result<Vec<ChangeEvent>, PersistenceError> {
        match self {
            Self::Sqlite(db) => list_recent_change_events(db, limit),
            Self::Mysql(db) => list_recent_change_events(db, limit),
            Self::Postgres(db) => list_recent_change_events(db, limit),
        }
    }

    /// Lists the change events of one record, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a stored event is malformed.
    pub fn change_events_for_record(
        &self,
        table_name: &str,
        record_id: &CanonicalId,
    ) -> Result<Vec<ChangeEvent>, PersistenceError> {
        match self {
            Self::Sqlite(db) => list_change_events_for_record(db, table_name, record_id),
            Self::Mysql(db) => list_change_events_for_record(db, table_name, record_id),
            Self::Postgres(db) => list_change_events_for_record(db, table_name, record_id),
        }
    }

    /// Returns the row count of every entity table and of the change log.
    ///
    /// # Errors
    ///
    /// Returns an error if a count query fails.
    pub fn table_counts(&self) -> Result<Vec<(&'static str, i64)>, PersistenceError> {
        match self {
            Self::Sqlite(db) => entities::table_counts(db),
            Self::Mysql(db) => entities::table_counts(db),
            Self::Postgres(db) => entities::table_counts(db),
        }
    }
}
