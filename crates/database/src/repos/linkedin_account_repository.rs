//! Mirror rows for LinkedIn accounts connected through Unipile.

use sqlx::SqlitePool;

use crate::entities::{LinkedInAccount, UpsertLinkedInAccount};
use crate::now_rfc3339;
use crate::types::{DatabaseError, DatabaseResult};

const ACCOUNT_COLUMNS: &str = "id, account_id, user_id, name, status, provider, created_at, synced_at";

#[derive(Clone)]
pub struct LinkedInAccountRepository {
    pool: SqlitePool,
}

impl LinkedInAccountRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts or refreshes the mirror row. Ownership of an existing row
    /// is never transferred.
    pub async fn upsert(&self, account: &UpsertLinkedInAccount) -> DatabaseResult<LinkedInAccount> {
        sqlx::query(
            "INSERT INTO linkedin_accounts (account_id, user_id, name, status, provider, created_at, synced_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(account_id) DO UPDATE SET
                name = excluded.name,
                status = excluded.status,
                provider = excluded.provider,
                synced_at = excluded.synced_at",
        )
        .bind(&account.account_id)
        .bind(account.user_id)
        .bind(&account.name)
        .bind(&account.status)
        .bind(&account.provider)
        .bind(&account.created_at)
        .bind(now_rfc3339())
        .execute(&self.pool)
        .await?;

        self.find(&account.account_id).await
    }

    pub async fn find(&self, account_id: &str) -> DatabaseResult<LinkedInAccount> {
        sqlx::query_as::<_, LinkedInAccount>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM linkedin_accounts WHERE account_id = ?"
        ))
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DatabaseError::NotFound("linkedin account"))
    }

    pub async fn list_for_user(&self, user_id: i64) -> DatabaseResult<Vec<LinkedInAccount>> {
        let accounts = sqlx::query_as::<_, LinkedInAccount>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM linkedin_accounts WHERE user_id = ? ORDER BY created_at, id"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(accounts)
    }

    pub async fn list_all(&self) -> DatabaseResult<Vec<LinkedInAccount>> {
        let accounts = sqlx::query_as::<_, LinkedInAccount>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM linkedin_accounts ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(accounts)
    }

    /// Refreshes name and status from an upstream record.
    pub async fn refresh(&self, account_id: &str, name: &str, status: &str) -> DatabaseResult<bool> {
        let result = sqlx::query(
            "UPDATE linkedin_accounts SET name = ?, status = ?, synced_at = ? WHERE account_id = ?",
        )
        .bind(name)
        .bind(status)
        .bind(now_rfc3339())
        .bind(account_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(&self, account_id: &str) -> DatabaseResult<()> {
        let result = sqlx::query("DELETE FROM linkedin_accounts WHERE account_id = ?")
            .bind(account_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound("linkedin account"));
        }
        Ok(())
    }

    pub async fn count_for_user(&self, user_id: i64) -> DatabaseResult<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM linkedin_accounts WHERE user_id = ?")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}
