//! User repository for database operations.

use sqlx::SqlitePool;

use crate::entities::{User, UserRole};
use crate::now_rfc3339;
use crate::types::{DatabaseError, DatabaseResult};

const USER_COLUMNS: &str =
    "id, public_id, email, display_name, role, selected_account_id, created_at, updated_at";

/// Repository for user database operations
#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: i64) -> DatabaseResult<User> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(DatabaseError::NotFound("user"))
    }

    pub async fn find_by_public_id(&self, public_id: &str) -> DatabaseResult<User> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE public_id = ?"
        ))
        .bind(public_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DatabaseError::NotFound("user"))
    }

    pub async fn find_by_email(&self, email: &str) -> DatabaseResult<User> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ? COLLATE NOCASE"
        ))
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DatabaseError::NotFound("user"))
    }

    /// All users, oldest first.
    pub async fn list_all(&self) -> DatabaseResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    pub async fn set_role(&self, public_id: &str, role: UserRole) -> DatabaseResult<User> {
        let result = sqlx::query("UPDATE users SET role = ?, updated_at = ? WHERE public_id = ?")
            .bind(role.as_str())
            .bind(now_rfc3339())
            .bind(public_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound("user"));
        }
        self.find_by_public_id(public_id).await
    }

    /// Grants the admin role to the account registered under `email`.
    pub async fn promote_by_email(&self, email: &str) -> DatabaseResult<User> {
        let user = self.find_by_email(email).await?;
        self.set_role(&user.public_id, UserRole::Admin).await
    }

    /// Deletes the user; sessions and owned rows cascade.
    pub async fn delete(&self, public_id: &str) -> DatabaseResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE public_id = ?")
            .bind(public_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound("user"));
        }
        Ok(())
    }

    pub async fn set_selected_account(
        &self,
        user_id: i64,
        account_id: Option<&str>,
    ) -> DatabaseResult<User> {
        let result =
            sqlx::query("UPDATE users SET selected_account_id = ?, updated_at = ? WHERE id = ?")
                .bind(account_id)
                .bind(now_rfc3339())
                .bind(user_id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound("user"));
        }
        self.find_by_id(user_id).await
    }

    /// Clears the selection on every user that pointed at `account_id`.
    pub async fn clear_selected_account(&self, account_id: &str) -> DatabaseResult<u64> {
        let result = sqlx::query(
            "UPDATE users SET selected_account_id = NULL, updated_at = ? WHERE selected_account_id = ?",
        )
        .bind(now_rfc3339())
        .bind(account_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn count_admins(&self) -> DatabaseResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE role = 'admin'")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{insert_user, memory_pool};

    #[tokio::test]
    async fn promote_by_email_grants_admin() {
        let pool = memory_pool().await;
        insert_user(&pool, "ops@example.com", UserRole::User).await;
        let repo = UserRepository::new(pool);

        let user = repo.promote_by_email("OPS@example.com").await.unwrap();
        assert!(user.is_admin());
        assert_eq!(repo.count_admins().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn missing_user_is_not_found() {
        let repo = UserRepository::new(memory_pool().await);
        let err = repo.set_role("nope", UserRole::Admin).await.unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound("user")));
        assert!(matches!(
            repo.delete("nope").await.unwrap_err(),
            DatabaseError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn selected_account_round_trip_and_clear() {
        let pool = memory_pool().await;
        let alice = insert_user(&pool, "alice@example.com", UserRole::User).await;
        let bob = insert_user(&pool, "bob@example.com", UserRole::User).await;
        let repo = UserRepository::new(pool);

        let user = repo.set_selected_account(alice, Some("acc-1")).await.unwrap();
        assert_eq!(user.selected_account_id.as_deref(), Some("acc-1"));
        repo.set_selected_account(bob, Some("acc-2")).await.unwrap();

        assert_eq!(repo.clear_selected_account("acc-1").await.unwrap(), 1);
        assert_eq!(repo.find_by_id(alice).await.unwrap().selected_account_id, None);
        assert_eq!(
            repo.find_by_id(bob).await.unwrap().selected_account_id.as_deref(),
            Some("acc-2")
        );
    }

    #[tokio::test]
    async fn delete_removes_user() {
        let pool = memory_pool().await;
        insert_user(&pool, "gone@example.com", UserRole::User).await;
        let repo = UserRepository::new(pool);

        let user = repo.find_by_email("gone@example.com").await.unwrap();
        repo.delete(&user.public_id).await.unwrap();
        assert!(repo.list_all().await.unwrap().is_empty());
    }
}
