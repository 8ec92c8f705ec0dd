//! DaininBot credential sets, scoped to their owner.

use sqlx::SqlitePool;

use crate::entities::{CreateBot, DaininBot, UpdateBot};
use crate::types::{DatabaseError, DatabaseResult};
use crate::{new_public_id, now_rfc3339};

const BOT_COLUMNS: &str =
    "id, public_id, user_id, name, assistant_id, api_key, created_at, updated_at";

#[derive(Clone)]
pub struct BotRepository {
    pool: SqlitePool,
}

impl BotRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user_id: i64, request: &CreateBot) -> DatabaseResult<DaininBot> {
        let name = required("name", &request.name)?;
        let assistant_id = required("assistant_id", &request.assistant_id)?;
        let api_key = required("api_key", &request.api_key)?;

        let now = now_rfc3339();
        let public_id = new_public_id();
        sqlx::query(
            "INSERT INTO bots (public_id, user_id, name, assistant_id, api_key, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&public_id)
        .bind(user_id)
        .bind(name)
        .bind(assistant_id)
        .bind(api_key)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.find(user_id, &public_id).await
    }

    pub async fn list(&self, user_id: i64) -> DatabaseResult<Vec<DaininBot>> {
        let bots = sqlx::query_as::<_, DaininBot>(&format!(
            "SELECT {BOT_COLUMNS} FROM bots WHERE user_id = ? ORDER BY created_at, id"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(bots)
    }

    pub async fn find(&self, user_id: i64, public_id: &str) -> DatabaseResult<DaininBot> {
        sqlx::query_as::<_, DaininBot>(&format!(
            "SELECT {BOT_COLUMNS} FROM bots WHERE user_id = ? AND public_id = ?"
        ))
        .bind(user_id)
        .bind(public_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DatabaseError::NotFound("bot"))
    }

    pub async fn update(
        &self,
        user_id: i64,
        public_id: &str,
        request: &UpdateBot,
    ) -> DatabaseResult<DaininBot> {
        let bot = self.find(user_id, public_id).await?;

        let name = match &request.name {
            Some(value) => required("name", value)?,
            None => bot.name.as_str(),
        };
        let assistant_id = match &request.assistant_id {
            Some(value) => required("assistant_id", value)?,
            None => bot.assistant_id.as_str(),
        };
        let api_key = match &request.api_key {
            Some(value) => required("api_key", value)?,
            None => bot.api_key.as_str(),
        };

        sqlx::query(
            "UPDATE bots SET name = ?, assistant_id = ?, api_key = ?, updated_at = ? WHERE id = ?",
        )
        .bind(name)
        .bind(assistant_id)
        .bind(api_key)
        .bind(now_rfc3339())
        .bind(bot.id)
        .execute(&self.pool)
        .await?;

        self.find(user_id, public_id).await
    }

    pub async fn delete(&self, user_id: i64, public_id: &str) -> DatabaseResult<()> {
        let result = sqlx::query("DELETE FROM bots WHERE user_id = ? AND public_id = ?")
            .bind(user_id)
            .bind(public_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound("bot"));
        }
        Ok(())
    }
}

fn required<'a>(field: &str, value: &'a str) -> DatabaseResult<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DatabaseError::Validation(format!("{field} is required")));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::UserRole;
    use crate::test_support::{insert_user, memory_pool};

    fn bot() -> CreateBot {
        CreateBot {
            name: "Daisy".into(),
            assistant_id: "asst_123".into(),
            api_key: "sk-test-0123456789abcd".into(),
        }
    }

    #[tokio::test]
    async fn crud_is_scoped_to_owner() {
        let pool = memory_pool().await;
        let alice = insert_user(&pool, "alice@example.com", UserRole::User).await;
        let bob = insert_user(&pool, "bob@example.com", UserRole::User).await;
        let repo = BotRepository::new(pool);

        let created = repo.create(alice, &bot()).await.unwrap();
        assert_eq!(created.masked_api_key(), "sk-…abcd");
        assert!(repo.list(bob).await.unwrap().is_empty());
        assert!(repo.find(bob, &created.public_id).await.is_err());

        let updated = repo
            .update(
                alice,
                &created.public_id,
                &UpdateBot {
                    name: Some("Daisy v2".into()),
                    ..UpdateBot::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Daisy v2");
        assert_eq!(updated.api_key, created.api_key);

        assert!(repo.delete(bob, &created.public_id).await.is_err());
        repo.delete(alice, &created.public_id).await.unwrap();
        assert!(repo.list(alice).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn blank_fields_are_rejected() {
        let pool = memory_pool().await;
        let alice = insert_user(&pool, "alice@example.com", UserRole::User).await;
        let repo = BotRepository::new(pool);

        let err = repo
            .create(
                alice,
                &CreateBot {
                    api_key: " ".into(),
                    ..bot()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(message) if message.contains("api_key")));
    }
}
