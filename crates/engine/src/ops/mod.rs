use std::path::{Path, PathBuf};

use migration::{Migrator, MigratorTrait};
use sea_orm::{
    DatabaseConnection, DbErr, RuntimeErr, SqlxSqliteConnector,
    sqlx::{
        ConnectOptions as _,
        sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    },
};

use crate::ResultEngine;

mod entries;

/// Run a block against a fresh connection, closing it whatever the outcome.
macro_rules! with_db {
    ($self:expr, |$db:ident| $body:expr) => {{
        let $db = $self.connect().await?;
        let result: $crate::ResultEngine<_> = async { $body }.await;
        if let Err(err) = $db.close().await {
            tracing::warn!("failed to close database connection: {err}");
        }
        result
    }};
}

pub(crate) use with_db;

#[derive(Debug)]
pub struct Engine {
    path: PathBuf,
    create_if_missing: bool,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Create the `entries` table if it is not there yet.
    pub async fn ensure_schema(&self) -> ResultEngine<()> {
        with_db!(self, |db| Ok(()))
    }

    async fn connect(&self) -> ResultEngine<DatabaseConnection> {
        // Snapshots are encrypted straight from the file, so no WAL side files.
        let options = SqliteConnectOptions::new()
            .filename(&self.path)
            .create_if_missing(self.create_if_missing)
            .journal_mode(SqliteJournalMode::Delete)
            .disable_statement_logging();
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|err| DbErr::Conn(RuntimeErr::SqlxError(err)))?;

        let db = SqlxSqliteConnector::from_sqlx_sqlite_pool(pool);
        Migrator::up(&db, None).await?;
        Ok(db)
    }
}

/// The builder for `Engine`
pub struct EngineBuilder {
    path: PathBuf,
    create_if_missing: bool,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data.db"),
            create_if_missing: true,
        }
    }
}

impl EngineBuilder {
    /// Pass the database file
    pub fn database_path(mut self, path: impl AsRef<Path>) -> EngineBuilder {
        self.path = path.as_ref().to_path_buf();
        self
    }

    /// Whether a missing database file is created on first use (default) or
    /// reported as an error.
    pub fn create_if_missing(mut self, create: bool) -> EngineBuilder {
        self.create_if_missing = create;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            path: self.path,
            create_if_missing: self.create_if_missing,
        })
    }
}
