//! DAILINK Database Crate
//!
//! Connection management, migrations, entities and repositories for the
//! backend's own SQLite store.

use cuid2::CuidConstructor;
use dailink_config::DatabaseConfig;
use once_cell::sync::Lazy;
use sqlx::SqlitePool;

pub mod connection;
pub mod entities;
pub mod migrations;
pub mod repos;
pub mod types;

pub use connection::prepare_database;
pub use migrations::run_migrations;

pub use repos::{
    BotRepository, CampaignRepository, CrmRepository, HscRunRepository,
    LinkedInAccountRepository, TransferMode, UserRepository,
};

pub use entities::*;

pub use types::{DatabaseError, DatabaseResult, HscRunError, HscRunResult};

static CUID: Lazy<CuidConstructor> = Lazy::new(CuidConstructor::new);

/// Fresh public identifier for externally visible rows.
pub fn new_public_id() -> String {
    CUID.create_id()
}

pub(crate) fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Connect and bring the schema up to date.
pub async fn initialize_database(config: &DatabaseConfig) -> anyhow::Result<SqlitePool> {
    let pool = prepare_database(config).await?;
    run_migrations(&pool).await?;
    Ok(pool)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub async fn memory_pool() -> SqlitePool {
        let config = DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
        };
        initialize_database(&config).await.unwrap()
    }

    /// Inserts a bare user row and returns its id.
    pub async fn insert_user(pool: &SqlitePool, email: &str, role: UserRole) -> i64 {
        let now = now_rfc3339();
        sqlx::query(
            "INSERT INTO users (public_id, email, role, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(new_public_id())
        .bind(email)
        .bind(role.as_str())
        .bind(&now)
        .bind(&now)
        .execute(pool)
        .await
        .unwrap()
        .last_insert_rowid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_ids_are_unique() {
        let a = new_public_id();
        let b = new_public_id();
        assert_ne!(a, b);
        assert!(!a.is_empty());
    }

    #[tokio::test]
    async fn initialize_database_runs_migrations() {
        let pool = test_support::memory_pool().await;
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
