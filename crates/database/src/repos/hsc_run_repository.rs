//! HSC runs, their stage machine and analysed items.
//!
//! Every stage change is one conditional `UPDATE ... WHERE stage IN (...)`,
//! so concurrent callers racing on the same transition see exactly one
//! winner.

use sqlx::SqlitePool;
use tracing::debug;

use crate::entities::hsc_run::HscRunRow;
use crate::entities::{
    CreateHscRun, HscRun, HscRunItem, HscStage, NewHscRunItem, SearchFilters, UpdateHscRun,
};
use crate::types::{DatabaseError, DatabaseResult, HscRunError, HscRunResult};
use crate::{new_public_id, now_rfc3339};

const RUN_COLUMNS: &str = "id, public_id, user_id, account_id, name, stage, progress, keywords,
    search_url, filters, champion_keywords, cursor, pages_processed, run_epoch, last_error, created_at,
    updated_at";

const ITEM_COLUMNS: &str =
    "id, run_id, linkedin_id, public_identifier, name, headline, is_champion, status, error, created_at";

fn decode_run(row: HscRunRow) -> DatabaseResult<HscRun> {
    let filters: SearchFilters = serde_json::from_str(&row.filters)
        .map_err(|err| DatabaseError::Corrupt(format!("hsc run filters: {err}")))?;
    let champion_keywords: Vec<String> = serde_json::from_str(&row.champion_keywords)
        .map_err(|err| DatabaseError::Corrupt(format!("hsc champion keywords: {err}")))?;

    Ok(HscRun {
        id: row.id,
        public_id: row.public_id,
        user_id: row.user_id,
        account_id: row.account_id,
        name: row.name,
        stage: row.stage,
        progress: row.progress,
        keywords: row.keywords,
        search_url: row.search_url,
        filters,
        champion_keywords,
        cursor: row.cursor,
        pages_processed: row.pages_processed,
        run_epoch: row.run_epoch,
        last_error: row.last_error,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

#[derive(Clone)]
pub struct HscRunRepository {
    pool: SqlitePool,
}

impl HscRunRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user_id: i64, request: &CreateHscRun) -> DatabaseResult<HscRun> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(DatabaseError::Validation("name must not be empty".into()));
        }
        if request.account_id.trim().is_empty() {
            return Err(DatabaseError::Validation("account_id is required".into()));
        }
        let keywords = non_blank(request.keywords.as_deref());
        let search_url = non_blank(request.search_url.as_deref());
        if keywords.is_none() && search_url.is_none() {
            return Err(DatabaseError::Validation(
                "either keywords or search_url is required".into(),
            ));
        }

        let now = now_rfc3339();
        let public_id = new_public_id();
        sqlx::query(
            "INSERT INTO hsc_runs
                (public_id, user_id, account_id, name, stage, progress, keywords, search_url,
                 filters, champion_keywords, pages_processed, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, 0, ?, ?, ?, ?, 0, ?, ?)",
        )
        .bind(&public_id)
        .bind(user_id)
        .bind(request.account_id.trim())
        .bind(name)
        .bind(HscStage::PreparingRun.as_str())
        .bind(keywords)
        .bind(search_url)
        .bind(encode_json(&request.filters)?)
        .bind(encode_json(&clean_keywords(&request.champion_keywords))?)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.find(user_id, &public_id).await
    }

    pub async fn list(&self, user_id: i64, account_id: Option<&str>) -> DatabaseResult<Vec<HscRun>> {
        let rows = sqlx::query_as::<_, HscRunRow>(&format!(
            "SELECT {RUN_COLUMNS} FROM hsc_runs
             WHERE user_id = ? AND (? IS NULL OR account_id = ?)
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .bind(account_id)
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(decode_run).collect()
    }

    pub async fn list_all(&self) -> DatabaseResult<Vec<HscRun>> {
        let rows = sqlx::query_as::<_, HscRunRow>(&format!(
            "SELECT {RUN_COLUMNS} FROM hsc_runs ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(decode_run).collect()
    }

    pub async fn find(&self, user_id: i64, public_id: &str) -> DatabaseResult<HscRun> {
        let row = sqlx::query_as::<_, HscRunRow>(&format!(
            "SELECT {RUN_COLUMNS} FROM hsc_runs WHERE user_id = ? AND public_id = ?"
        ))
        .bind(user_id)
        .bind(public_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DatabaseError::NotFound("hsc run"))?;
        decode_run(row)
    }

    pub async fn find_by_id(&self, id: i64) -> DatabaseResult<HscRun> {
        let row = sqlx::query_as::<_, HscRunRow>(&format!(
            "SELECT {RUN_COLUMNS} FROM hsc_runs WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DatabaseError::NotFound("hsc run"))?;
        decode_run(row)
    }

    /// Edits name, query and filters. Refused while the run is `running`.
    pub async fn update(
        &self,
        user_id: i64,
        public_id: &str,
        request: &UpdateHscRun,
    ) -> HscRunResult<HscRun> {
        let run = self.find(user_id, public_id).await?;

        let name = match request.name.as_deref().map(str::trim) {
            Some("") => {
                return Err(DatabaseError::Validation("name must not be empty".into()).into());
            }
            Some(name) => name,
            None => run.name.as_str(),
        };
        let keywords = match &request.keywords {
            Some(value) => non_blank(Some(value.as_str())),
            None => run.keywords.as_deref(),
        };
        let search_url = match &request.search_url {
            Some(value) => non_blank(Some(value.as_str())),
            None => run.search_url.as_deref(),
        };
        if keywords.is_none() && search_url.is_none() {
            return Err(DatabaseError::Validation(
                "either keywords or search_url is required".into(),
            )
            .into());
        }
        let filters = request.filters.as_ref().unwrap_or(&run.filters);
        let champion_keywords = request
            .champion_keywords
            .as_ref()
            .map(|keywords| clean_keywords(keywords))
            .unwrap_or_else(|| run.champion_keywords.clone());

        let result = sqlx::query(
            "UPDATE hsc_runs SET name = ?, keywords = ?, search_url = ?, filters = ?,
                champion_keywords = ?, updated_at = ?
             WHERE id = ? AND stage != 'running'",
        )
        .bind(name)
        .bind(keywords)
        .bind(search_url)
        .bind(encode_json(filters)?)
        .bind(encode_json(&champion_keywords)?)
        .bind(now_rfc3339())
        .bind(run.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(HscRunError::Running);
        }
        Ok(self.find_by_id(run.id).await?)
    }

    /// Moves the run to `target` if its current stage allows it.
    pub async fn transition(&self, id: i64, target: HscStage) -> HscRunResult<HscRun> {
        let sources = HscStage::sources_of(target);
        if sources.is_empty() {
            let current = self.find_by_id(id).await?.stage;
            return Err(HscRunError::InvalidTransition { current, target });
        }

        let placeholders = vec!["?"; sources.len()].join(", ");
        let extra = match target {
            HscStage::Running => ", last_error = NULL, run_epoch = run_epoch + 1",
            HscStage::Completed => ", progress = 100",
            _ => "",
        };
        let sql = format!(
            "UPDATE hsc_runs SET stage = ?, updated_at = ?{extra} WHERE id = ? AND stage IN ({placeholders})"
        );

        let mut query = sqlx::query(&sql)
            .bind(target.as_str())
            .bind(now_rfc3339())
            .bind(id);
        for source in &sources {
            query = query.bind(source.as_str());
        }
        let result = query.execute(&self.pool).await?;

        let run = self.find_by_id(id).await?;
        if result.rows_affected() == 0 {
            return Err(HscRunError::InvalidTransition {
                current: run.stage,
                target,
            });
        }
        debug!(run = %run.public_id, stage = %target, "hsc run stage changed");
        Ok(run)
    }

    /// Records a processed page while the run is still `running` under
    /// `epoch`. Returns false when the run was stopped or restarted meanwhile.
    pub async fn record_page(
        &self,
        id: i64,
        epoch: i64,
        cursor: Option<&str>,
        pages_processed: i64,
        progress: i64,
    ) -> DatabaseResult<bool> {
        let result = sqlx::query(
            "UPDATE hsc_runs SET cursor = ?, pages_processed = ?, progress = ?, updated_at = ?
             WHERE id = ? AND stage = 'running' AND run_epoch = ?",
        )
        .bind(cursor)
        .bind(pages_processed)
        .bind(progress.clamp(0, 99))
        .bind(now_rfc3339())
        .bind(id)
        .bind(epoch)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Completes the run if `epoch` still owns it.
    pub async fn complete(&self, id: i64, epoch: i64) -> DatabaseResult<bool> {
        let result = sqlx::query(
            "UPDATE hsc_runs SET stage = 'completed', progress = 100, updated_at = ?
             WHERE id = ? AND stage = 'running' AND run_epoch = ?",
        )
        .bind(now_rfc3339())
        .bind(id)
        .bind(epoch)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Stores `message` and stops a run still owned by `epoch`; the cursor is
    /// kept for resume.
    pub async fn fail(&self, id: i64, epoch: i64, message: &str) -> DatabaseResult<bool> {
        let result = sqlx::query(
            "UPDATE hsc_runs SET last_error = ?, stage = 'stopped', updated_at = ?
             WHERE id = ? AND stage = 'running' AND run_epoch = ?",
        )
        .bind(message)
        .bind(now_rfc3339())
        .bind(id)
        .bind(epoch)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Deletes the run and its items. Refused while `running`.
    pub async fn delete(&self, user_id: i64, public_id: &str) -> HscRunResult<()> {
        let run = self.find(user_id, public_id).await?;
        let result = sqlx::query("DELETE FROM hsc_runs WHERE id = ? AND stage != 'running'")
            .bind(run.id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(HscRunError::Running);
        }
        Ok(())
    }

    /// Inserts an item unless the run already holds that LinkedIn id.
    pub async fn insert_item(&self, run_id: i64, item: &NewHscRunItem) -> DatabaseResult<bool> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO hsc_run_items
                (run_id, linkedin_id, public_identifier, name, headline, is_champion, status, error, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(run_id)
        .bind(&item.linkedin_id)
        .bind(&item.public_identifier)
        .bind(&item.name)
        .bind(&item.headline)
        .bind(item.is_champion)
        .bind(item.status.as_str())
        .bind(&item.error)
        .bind(now_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn has_item(&self, run_id: i64, linkedin_id: &str) -> DatabaseResult<bool> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM hsc_run_items WHERE run_id = ? AND linkedin_id = ?",
        )
        .bind(run_id)
        .bind(linkedin_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }

    pub async fn items(&self, run_id: i64, champions_only: bool) -> DatabaseResult<Vec<HscRunItem>> {
        let items = sqlx::query_as::<_, HscRunItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM hsc_run_items
             WHERE run_id = ? AND (? = 0 OR is_champion = 1)
             ORDER BY id"
        ))
        .bind(run_id)
        .bind(champions_only)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    /// (total, running) runs owned by the user.
    pub async fn count(&self, user_id: i64, account_id: Option<&str>) -> DatabaseResult<(i64, i64)> {
        let counts: (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(CASE WHEN stage = 'running' THEN 1 ELSE 0 END), 0)
             FROM hsc_runs WHERE user_id = ? AND (? IS NULL OR account_id = ?)",
        )
        .bind(user_id)
        .bind(account_id)
        .bind(account_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(counts)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn clean_keywords(keywords: &[String]) -> Vec<String> {
    keywords
        .iter()
        .map(|keyword| keyword.trim())
        .filter(|keyword| !keyword.is_empty())
        .map(str::to_string)
        .collect()
}

fn encode_json<T: serde::Serialize>(value: &T) -> DatabaseResult<String> {
    serde_json::to_string(value).map_err(|err| DatabaseError::Corrupt(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{HscItemStatus, UserRole};
    use crate::test_support::{insert_user, memory_pool};

    fn new_run() -> CreateHscRun {
        let mut filters = SearchFilters::new();
        filters.insert("location".into(), vec!["102277331".into()]);
        CreateHscRun {
            account_id: "acc-1".into(),
            name: "CFOs in SF".into(),
            keywords: Some("cfo".into()),
            search_url: None,
            filters,
            champion_keywords: vec![" Finance ".into(), "".into()],
        }
    }

    async fn setup() -> (HscRunRepository, i64) {
        let pool = memory_pool().await;
        let alice = insert_user(&pool, "alice@example.com", UserRole::User).await;
        (HscRunRepository::new(pool), alice)
    }

    #[tokio::test]
    async fn create_decodes_json_columns() {
        let (repo, alice) = setup().await;
        let run = repo.create(alice, &new_run()).await.unwrap();

        assert_eq!(run.stage, HscStage::PreparingRun);
        assert_eq!(run.progress, 0);
        assert_eq!(run.filters["location"], vec!["102277331".to_string()]);
        assert_eq!(run.champion_keywords, vec!["Finance".to_string()]);
    }

    #[tokio::test]
    async fn create_requires_keywords_or_url() {
        let (repo, alice) = setup().await;
        let err = repo
            .create(
                alice,
                &CreateHscRun {
                    keywords: Some("  ".into()),
                    ..new_run()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));
    }

    #[tokio::test]
    async fn transitions_follow_stage_machine() {
        let (repo, alice) = setup().await;
        let run = repo.create(alice, &new_run()).await.unwrap();

        let err = repo.transition(run.id, HscStage::Completed).await.unwrap_err();
        assert!(matches!(
            err,
            HscRunError::InvalidTransition {
                current: HscStage::PreparingRun,
                target: HscStage::Completed
            }
        ));

        let running = repo.transition(run.id, HscStage::Running).await.unwrap();
        assert_eq!(running.stage, HscStage::Running);

        // A second start loses the race.
        assert!(repo.transition(run.id, HscStage::Running).await.is_err());

        repo.transition(run.id, HscStage::Stopped).await.unwrap();
        repo.transition(run.id, HscStage::Running).await.unwrap();
        let done = repo.transition(run.id, HscStage::Completed).await.unwrap();
        assert_eq!(done.progress, 100);

        assert!(repo.transition(run.id, HscStage::Running).await.is_err());
        assert!(repo.transition(run.id, HscStage::PreparingRun).await.is_err());
    }

    #[tokio::test]
    async fn running_runs_cannot_be_edited_or_deleted() {
        let (repo, alice) = setup().await;
        let run = repo.create(alice, &new_run()).await.unwrap();
        repo.transition(run.id, HscStage::Running).await.unwrap();

        let update = UpdateHscRun {
            name: Some("Renamed".into()),
            ..UpdateHscRun::default()
        };
        assert!(matches!(
            repo.update(alice, &run.public_id, &update).await.unwrap_err(),
            HscRunError::Running
        ));
        assert!(matches!(
            repo.delete(alice, &run.public_id).await.unwrap_err(),
            HscRunError::Running
        ));

        repo.transition(run.id, HscStage::Stopped).await.unwrap();
        let renamed = repo.update(alice, &run.public_id, &update).await.unwrap();
        assert_eq!(renamed.name, "Renamed");
        repo.delete(alice, &run.public_id).await.unwrap();
    }

    #[tokio::test]
    async fn record_page_and_fail_only_touch_running_runs() {
        let (repo, alice) = setup().await;
        let run = repo.create(alice, &new_run()).await.unwrap();

        assert!(!repo.record_page(run.id, 0, Some("c1"), 1, 50).await.unwrap());

        let running = repo.transition(run.id, HscStage::Running).await.unwrap();
        assert!(repo
            .record_page(run.id, running.run_epoch, Some("c1"), 1, 150)
            .await
            .unwrap());
        let stored = repo.find_by_id(run.id).await.unwrap();
        assert_eq!(stored.cursor.as_deref(), Some("c1"));
        assert_eq!(stored.progress, 99);

        assert!(repo.fail(run.id, running.run_epoch, "search failed").await.unwrap());
        let stopped = repo.find_by_id(run.id).await.unwrap();
        assert_eq!(stopped.stage, HscStage::Stopped);
        assert_eq!(stopped.last_error.as_deref(), Some("search failed"));
        assert_eq!(stopped.cursor.as_deref(), Some("c1"));

        let resumed = repo.transition(run.id, HscStage::Running).await.unwrap();
        assert_eq!(resumed.last_error, None);
    }

    #[tokio::test]
    async fn restart_fences_off_the_previous_epoch() {
        let (repo, alice) = setup().await;
        let run = repo.create(alice, &new_run()).await.unwrap();
        assert_eq!(run.run_epoch, 0);

        let first = repo.transition(run.id, HscStage::Running).await.unwrap();
        repo.transition(run.id, HscStage::Stopped).await.unwrap();
        let second = repo.transition(run.id, HscStage::Running).await.unwrap();
        assert_eq!(first.run_epoch, 1);
        assert_eq!(second.run_epoch, 2);

        assert!(!repo
            .record_page(run.id, first.run_epoch, Some("stale"), 5, 50)
            .await
            .unwrap());
        assert!(!repo.fail(run.id, first.run_epoch, "stale").await.unwrap());
        assert!(!repo.complete(run.id, first.run_epoch).await.unwrap());

        let current = repo.find_by_id(run.id).await.unwrap();
        assert_eq!(current.stage, HscStage::Running);
        assert_eq!(current.cursor, None);
        assert_eq!(current.pages_processed, 0);

        assert!(repo.complete(run.id, second.run_epoch).await.unwrap());
        let done = repo.find_by_id(run.id).await.unwrap();
        assert_eq!(done.stage, HscStage::Completed);
        assert_eq!(done.progress, 100);
    }

    #[tokio::test]
    async fn items_are_unique_per_run() {
        let (repo, alice) = setup().await;
        let run = repo.create(alice, &new_run()).await.unwrap();
        let item = NewHscRunItem {
            linkedin_id: "li-1".into(),
            public_identifier: None,
            name: "Ada".into(),
            headline: Some("Finance lead".into()),
            is_champion: true,
            status: HscItemStatus::Analyzed,
            error: None,
        };

        assert!(repo.insert_item(run.id, &item).await.unwrap());
        assert!(!repo.insert_item(run.id, &item).await.unwrap());
        assert!(repo.has_item(run.id, "li-1").await.unwrap());

        let other = NewHscRunItem {
            linkedin_id: "li-2".into(),
            is_champion: false,
            status: HscItemStatus::Error,
            error: Some("profile unavailable".into()),
            ..item
        };
        repo.insert_item(run.id, &other).await.unwrap();

        assert_eq!(repo.items(run.id, false).await.unwrap().len(), 2);
        let champions = repo.items(run.id, true).await.unwrap();
        assert_eq!(champions.len(), 1);
        assert_eq!(champions[0].linkedin_id, "li-1");
        assert_eq!(repo.count(alice, None).await.unwrap(), (1, 0));
    }
}
