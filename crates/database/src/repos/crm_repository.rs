//! CRM lists and their profile/company members.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use utoipa::ToSchema;

use crate::entities::{
    CrmCompany, CrmList, CrmListKind, CrmProfile, InsertSummary, NewCrmCompany, NewCrmProfile,
};
use crate::types::{DatabaseError, DatabaseResult};
use crate::{new_public_id, now_rfc3339};

const LIST_SELECT: &str = "SELECT l.id, l.public_id, l.user_id, l.account_id, l.name, l.kind,
        (SELECT COUNT(*) FROM crm_profiles p WHERE p.list_id = l.id)
        + (SELECT COUNT(*) FROM crm_companies c WHERE c.list_id = l.id) AS item_count,
        l.created_at, l.updated_at
     FROM crm_lists l";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TransferMode {
    Move,
    Copy,
}

#[derive(Clone)]
pub struct CrmRepository {
    pool: SqlitePool,
}

impl CrmRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_list(
        &self,
        user_id: i64,
        account_id: &str,
        name: &str,
        kind: CrmListKind,
    ) -> DatabaseResult<CrmList> {
        let name = validated_name(name)?;
        if account_id.trim().is_empty() {
            return Err(DatabaseError::Validation("account_id is required".into()));
        }

        let now = now_rfc3339();
        let public_id = new_public_id();
        sqlx::query(
            "INSERT INTO crm_lists (public_id, user_id, account_id, name, kind, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&public_id)
        .bind(user_id)
        .bind(account_id.trim())
        .bind(name)
        .bind(kind.as_str())
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.find_list(user_id, &public_id).await
    }

    /// Lists owned by `user_id`, optionally narrowed to one LinkedIn account.
    pub async fn lists(&self, user_id: i64, account_id: Option<&str>) -> DatabaseResult<Vec<CrmList>> {
        let lists = sqlx::query_as::<_, CrmList>(&format!(
            "{LIST_SELECT} WHERE l.user_id = ? AND (? IS NULL OR l.account_id = ?)
             ORDER BY l.created_at, l.id"
        ))
        .bind(user_id)
        .bind(account_id)
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(lists)
    }

    pub async fn list_all(&self) -> DatabaseResult<Vec<CrmList>> {
        let lists = sqlx::query_as::<_, CrmList>(&format!("{LIST_SELECT} ORDER BY l.id"))
            .fetch_all(&self.pool)
            .await?;
        Ok(lists)
    }

    pub async fn find_list(&self, user_id: i64, public_id: &str) -> DatabaseResult<CrmList> {
        sqlx::query_as::<_, CrmList>(&format!(
            "{LIST_SELECT} WHERE l.user_id = ? AND l.public_id = ?"
        ))
        .bind(user_id)
        .bind(public_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DatabaseError::NotFound("crm list"))
    }

    pub async fn rename_list(&self, user_id: i64, public_id: &str, name: &str) -> DatabaseResult<CrmList> {
        let name = validated_name(name)?;
        let result = sqlx::query(
            "UPDATE crm_lists SET name = ?, updated_at = ? WHERE user_id = ? AND public_id = ?",
        )
        .bind(name)
        .bind(now_rfc3339())
        .bind(user_id)
        .bind(public_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound("crm list"));
        }
        self.find_list(user_id, public_id).await
    }

    /// Deletes the list; members cascade and campaigns lose the reference.
    pub async fn delete_list(&self, user_id: i64, public_id: &str) -> DatabaseResult<()> {
        let result = sqlx::query("DELETE FROM crm_lists WHERE user_id = ? AND public_id = ?")
            .bind(user_id)
            .bind(public_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound("crm list"));
        }
        Ok(())
    }

    pub async fn add_profiles(
        &self,
        list: &CrmList,
        profiles: Vec<NewCrmProfile>,
    ) -> DatabaseResult<InsertSummary> {
        expect_kind(list, CrmListKind::People)?;
        let total = profiles.len() as u64;
        let unique = dedupe_by(profiles, |profile| profile.linkedin_id.trim().to_string())?;

        let now = now_rfc3339();
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;
        for profile in &unique {
            let result = sqlx::query(
                "INSERT OR IGNORE INTO crm_profiles
                    (list_id, linkedin_id, public_identifier, name, headline, profile_url, added_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(list.id)
            .bind(profile.linkedin_id.trim())
            .bind(&profile.public_identifier)
            .bind(&profile.name)
            .bind(&profile.headline)
            .bind(&profile.profile_url)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected();
        }
        touch_list(&mut tx, list.id, &now).await?;
        tx.commit().await?;

        Ok(InsertSummary {
            inserted,
            skipped: total - inserted,
        })
    }

    pub async fn add_companies(
        &self,
        list: &CrmList,
        companies: Vec<NewCrmCompany>,
    ) -> DatabaseResult<InsertSummary> {
        expect_kind(list, CrmListKind::Companies)?;
        let total = companies.len() as u64;
        let unique = dedupe_by(companies, |company| company.linkedin_id.trim().to_string())?;

        let now = now_rfc3339();
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;
        for company in &unique {
            let result = sqlx::query(
                "INSERT OR IGNORE INTO crm_companies
                    (list_id, linkedin_id, name, industry, company_url, added_at)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(list.id)
            .bind(company.linkedin_id.trim())
            .bind(&company.name)
            .bind(&company.industry)
            .bind(&company.company_url)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected();
        }
        touch_list(&mut tx, list.id, &now).await?;
        tx.commit().await?;

        Ok(InsertSummary {
            inserted,
            skipped: total - inserted,
        })
    }

    pub async fn profiles(&self, list_id: i64) -> DatabaseResult<Vec<CrmProfile>> {
        let profiles = sqlx::query_as::<_, CrmProfile>(
            "SELECT id, list_id, linkedin_id, public_identifier, name, headline, profile_url, added_at
             FROM crm_profiles WHERE list_id = ? ORDER BY added_at, id",
        )
        .bind(list_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(profiles)
    }

    pub async fn companies(&self, list_id: i64) -> DatabaseResult<Vec<CrmCompany>> {
        let companies = sqlx::query_as::<_, CrmCompany>(
            "SELECT id, list_id, linkedin_id, name, industry, company_url, added_at
             FROM crm_companies WHERE list_id = ? ORDER BY added_at, id",
        )
        .bind(list_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(companies)
    }

    pub async fn remove_profile(&self, list_id: i64, linkedin_id: &str) -> DatabaseResult<()> {
        let result = sqlx::query("DELETE FROM crm_profiles WHERE list_id = ? AND linkedin_id = ?")
            .bind(list_id)
            .bind(linkedin_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound("crm profile"));
        }
        Ok(())
    }

    pub async fn remove_company(&self, list_id: i64, linkedin_id: &str) -> DatabaseResult<()> {
        let result = sqlx::query("DELETE FROM crm_companies WHERE list_id = ? AND linkedin_id = ?")
            .bind(list_id)
            .bind(linkedin_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound("crm company"));
        }
        Ok(())
    }

    /// Copies (or moves) the named profiles from `source` into `target`.
    /// Ids missing from `source` or already in `target` count as skipped.
    pub async fn transfer_profiles(
        &self,
        source: &CrmList,
        target: &CrmList,
        linkedin_ids: &[String],
        mode: TransferMode,
    ) -> DatabaseResult<InsertSummary> {
        expect_kind(source, CrmListKind::People)?;
        expect_kind(target, CrmListKind::People)?;
        if source.id == target.id {
            return Err(DatabaseError::Validation(
                "source and target list must differ".into(),
            ));
        }

        let total = linkedin_ids.len() as u64;
        let mut seen = HashSet::new();
        let now = now_rfc3339();
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;

        for linkedin_id in linkedin_ids.iter().map(|id| id.trim()) {
            if linkedin_id.is_empty() || !seen.insert(linkedin_id) {
                continue;
            }
            let result = sqlx::query(
                "INSERT OR IGNORE INTO crm_profiles
                    (list_id, linkedin_id, public_identifier, name, headline, profile_url, added_at)
                 SELECT ?, linkedin_id, public_identifier, name, headline, profile_url, ?
                 FROM crm_profiles WHERE list_id = ? AND linkedin_id = ?",
            )
            .bind(target.id)
            .bind(&now)
            .bind(source.id)
            .bind(linkedin_id)
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected();

            if mode == TransferMode::Move {
                sqlx::query("DELETE FROM crm_profiles WHERE list_id = ? AND linkedin_id = ?")
                    .bind(source.id)
                    .bind(linkedin_id)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        touch_list(&mut tx, target.id, &now).await?;
        if mode == TransferMode::Move {
            touch_list(&mut tx, source.id, &now).await?;
        }
        tx.commit().await?;

        Ok(InsertSummary {
            inserted,
            skipped: total - inserted,
        })
    }

    pub async fn count_lists(&self, user_id: i64, account_id: Option<&str>) -> DatabaseResult<i64> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM crm_lists WHERE user_id = ? AND (? IS NULL OR account_id = ?)",
        )
        .bind(user_id)
        .bind(account_id)
        .bind(account_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// (profiles, companies) across the user's lists.
    pub async fn count_members(
        &self,
        user_id: i64,
        account_id: Option<&str>,
    ) -> DatabaseResult<(i64, i64)> {
        let counts: (i64, i64) = sqlx::query_as(
            "SELECT
                (SELECT COUNT(*) FROM crm_profiles p JOIN crm_lists l ON l.id = p.list_id
                  WHERE l.user_id = ? AND (? IS NULL OR l.account_id = ?)),
                (SELECT COUNT(*) FROM crm_companies c JOIN crm_lists l ON l.id = c.list_id
                  WHERE l.user_id = ? AND (? IS NULL OR l.account_id = ?))",
        )
        .bind(user_id)
        .bind(account_id)
        .bind(account_id)
        .bind(user_id)
        .bind(account_id)
        .bind(account_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(counts)
    }
}

fn validated_name(name: &str) -> DatabaseResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DatabaseError::Validation("name must not be empty".into()));
    }
    Ok(name)
}

fn expect_kind(list: &CrmList, kind: CrmListKind) -> DatabaseResult<()> {
    if list.kind != kind {
        return Err(DatabaseError::Validation(format!(
            "list '{}' holds {}, not {}",
            list.name,
            list.kind.as_str(),
            kind.as_str()
        )));
    }
    Ok(())
}

/// Drops later entries whose key repeats an earlier one, keeping order.
fn dedupe_by<T>(items: Vec<T>, key: impl Fn(&T) -> String) -> DatabaseResult<Vec<T>> {
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(items.len());
    for item in items {
        let id = key(&item);
        if id.is_empty() {
            return Err(DatabaseError::Validation("linkedin_id is required".into()));
        }
        if seen.insert(id) {
            unique.push(item);
        }
    }
    Ok(unique)
}

async fn touch_list(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    list_id: i64,
    now: &str,
) -> DatabaseResult<()> {
    sqlx::query("UPDATE crm_lists SET updated_at = ? WHERE id = ?")
        .bind(now)
        .bind(list_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::UserRole;
    use crate::test_support::{insert_user, memory_pool};

    fn profile(id: &str) -> NewCrmProfile {
        NewCrmProfile {
            linkedin_id: id.to_string(),
            public_identifier: Some(format!("{id}-public")),
            name: format!("Person {id}"),
            headline: Some("VP Sales".to_string()),
            profile_url: None,
        }
    }

    async fn setup() -> (CrmRepository, i64, i64) {
        let pool = memory_pool().await;
        let alice = insert_user(&pool, "alice@example.com", UserRole::User).await;
        let bob = insert_user(&pool, "bob@example.com", UserRole::User).await;
        (CrmRepository::new(pool), alice, bob)
    }

    #[tokio::test]
    async fn created_list_appears_in_account_lists() {
        let (repo, alice, _) = setup().await;
        repo.create_list(alice, "acc-1", "  Prospects ", CrmListKind::People)
            .await
            .unwrap();
        repo.create_list(alice, "acc-2", "Other", CrmListKind::Companies)
            .await
            .unwrap();

        let lists = repo.lists(alice, Some("acc-1")).await.unwrap();
        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0].name, "Prospects");
        assert_eq!(lists[0].item_count, 0);
        assert_eq!(repo.lists(alice, None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn blank_name_is_rejected() {
        let (repo, alice, _) = setup().await;
        let err = repo
            .create_list(alice, "acc-1", "   ", CrmListKind::People)
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));
    }

    #[tokio::test]
    async fn lists_are_scoped_to_owner() {
        let (repo, alice, bob) = setup().await;
        let list = repo
            .create_list(alice, "acc-1", "Mine", CrmListKind::People)
            .await
            .unwrap();

        assert!(matches!(
            repo.find_list(bob, &list.public_id).await.unwrap_err(),
            DatabaseError::NotFound(_)
        ));
        assert!(repo.delete_list(bob, &list.public_id).await.is_err());
        assert!(repo.lists(bob, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn add_profiles_skips_batch_and_existing_duplicates() {
        let (repo, alice, _) = setup().await;
        let list = repo
            .create_list(alice, "acc-1", "Leads", CrmListKind::People)
            .await
            .unwrap();

        let first = repo
            .add_profiles(&list, vec![profile("a"), profile("b"), profile("a")])
            .await
            .unwrap();
        assert_eq!(first, InsertSummary { inserted: 2, skipped: 1 });

        let second = repo
            .add_profiles(&list, vec![profile("b"), profile("c")])
            .await
            .unwrap();
        assert_eq!(second, InsertSummary { inserted: 1, skipped: 1 });

        let stored = repo.profiles(list.id).await.unwrap();
        let ids: Vec<&str> = stored.iter().map(|p| p.linkedin_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(repo.find_list(alice, &list.public_id).await.unwrap().item_count, 3);
    }

    #[tokio::test]
    async fn kind_mismatch_is_a_validation_error() {
        let (repo, alice, _) = setup().await;
        let companies = repo
            .create_list(alice, "acc-1", "Accounts", CrmListKind::Companies)
            .await
            .unwrap();

        let err = repo
            .add_profiles(&companies, vec![profile("a")])
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));

        let summary = repo
            .add_companies(
                &companies,
                vec![NewCrmCompany {
                    linkedin_id: "co-1".into(),
                    name: "Acme".into(),
                    industry: Some("Software".into()),
                    company_url: None,
                }],
            )
            .await
            .unwrap();
        assert_eq!(summary.inserted, 1);
        repo.remove_company(companies.id, "co-1").await.unwrap();
        assert!(repo.companies(companies.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn move_and_copy_profiles_between_lists() {
        let (repo, alice, _) = setup().await;
        let source = repo
            .create_list(alice, "acc-1", "Source", CrmListKind::People)
            .await
            .unwrap();
        let target = repo
            .create_list(alice, "acc-1", "Target", CrmListKind::People)
            .await
            .unwrap();
        repo.add_profiles(&source, vec![profile("a"), profile("b"), profile("c")])
            .await
            .unwrap();
        repo.add_profiles(&target, vec![profile("c")]).await.unwrap();

        let copied = repo
            .transfer_profiles(&source, &target, &["a".into()], TransferMode::Copy)
            .await
            .unwrap();
        assert_eq!(copied, InsertSummary { inserted: 1, skipped: 0 });
        assert_eq!(repo.profiles(source.id).await.unwrap().len(), 3);

        let moved = repo
            .transfer_profiles(
                &source,
                &target,
                &["b".into(), "c".into(), "missing".into()],
                TransferMode::Move,
            )
            .await
            .unwrap();
        assert_eq!(moved, InsertSummary { inserted: 1, skipped: 2 });

        let remaining: Vec<String> = repo
            .profiles(source.id)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.linkedin_id)
            .collect();
        assert_eq!(remaining, vec!["a".to_string()]);
        assert_eq!(repo.profiles(target.id).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn deleting_list_cascades_members() {
        let (repo, alice, _) = setup().await;
        let list = repo
            .create_list(alice, "acc-1", "Temp", CrmListKind::People)
            .await
            .unwrap();
        repo.add_profiles(&list, vec![profile("a")]).await.unwrap();
        assert_eq!(repo.count_members(alice, None).await.unwrap(), (1, 0));

        repo.delete_list(alice, &list.public_id).await.unwrap();
        assert_eq!(repo.count_members(alice, None).await.unwrap(), (0, 0));
        assert_eq!(repo.count_lists(alice, Some("acc-1")).await.unwrap(), 0);
    }
}
