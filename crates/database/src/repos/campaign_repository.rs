//! Campaigns and their action logs.

use sqlx::SqlitePool;

use crate::entities::{
    Campaign, CampaignAction, CampaignLog, CampaignStats, CampaignStatus, CreateCampaign,
    LogStatus, NewCampaignLog, UpdateCampaign,
};
use crate::types::{DatabaseError, DatabaseResult};
use crate::{new_public_id, now_rfc3339};

const CAMPAIGN_SELECT: &str = "SELECT c.id, c.public_id, c.user_id, c.account_id, c.name, c.status,
        c.crm_list_id, l.public_id AS crm_list, c.message_template, c.created_at, c.updated_at
     FROM campaigns c LEFT JOIN crm_lists l ON l.id = c.crm_list_id";

#[derive(Clone)]
pub struct CampaignRepository {
    pool: SqlitePool,
}

impl CampaignRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user_id: i64, request: &CreateCampaign) -> DatabaseResult<Campaign> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(DatabaseError::Validation("name must not be empty".into()));
        }
        if request.account_id.trim().is_empty() {
            return Err(DatabaseError::Validation("account_id is required".into()));
        }

        let now = now_rfc3339();
        let public_id = new_public_id();
        sqlx::query(
            "INSERT INTO campaigns
                (public_id, user_id, account_id, name, status, crm_list_id, message_template, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&public_id)
        .bind(user_id)
        .bind(request.account_id.trim())
        .bind(name)
        .bind(CampaignStatus::Draft.as_str())
        .bind(request.crm_list_id)
        .bind(&request.message_template)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.find(user_id, &public_id).await
    }

    pub async fn list(&self, user_id: i64, account_id: Option<&str>) -> DatabaseResult<Vec<Campaign>> {
        let campaigns = sqlx::query_as::<_, Campaign>(&format!(
            "{CAMPAIGN_SELECT} WHERE c.user_id = ? AND (? IS NULL OR c.account_id = ?)
             ORDER BY c.created_at DESC, c.id DESC"
        ))
        .bind(user_id)
        .bind(account_id)
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(campaigns)
    }

    pub async fn list_all(&self) -> DatabaseResult<Vec<Campaign>> {
        let campaigns = sqlx::query_as::<_, Campaign>(&format!("{CAMPAIGN_SELECT} ORDER BY c.id"))
            .fetch_all(&self.pool)
            .await?;
        Ok(campaigns)
    }

    pub async fn find(&self, user_id: i64, public_id: &str) -> DatabaseResult<Campaign> {
        sqlx::query_as::<_, Campaign>(&format!(
            "{CAMPAIGN_SELECT} WHERE c.user_id = ? AND c.public_id = ?"
        ))
        .bind(user_id)
        .bind(public_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DatabaseError::NotFound("campaign"))
    }

    /// Unscoped lookup for admin operations.
    pub async fn find_any(&self, public_id: &str) -> DatabaseResult<Campaign> {
        sqlx::query_as::<_, Campaign>(&format!("{CAMPAIGN_SELECT} WHERE c.public_id = ?"))
            .bind(public_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(DatabaseError::NotFound("campaign"))
    }

    pub async fn update(
        &self,
        campaign: &Campaign,
        request: &UpdateCampaign,
    ) -> DatabaseResult<Campaign> {
        let name = match request.name.as_deref().map(str::trim) {
            Some("") => {
                return Err(DatabaseError::Validation("name must not be empty".into()));
            }
            Some(name) => name,
            None => campaign.name.as_str(),
        };
        let crm_list_id = request.crm_list_id.or(campaign.crm_list_id);
        let template = request
            .message_template
            .as_ref()
            .or(campaign.message_template.as_ref());

        sqlx::query(
            "UPDATE campaigns SET name = ?, crm_list_id = ?, message_template = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(name)
        .bind(crm_list_id)
        .bind(template)
        .bind(now_rfc3339())
        .bind(campaign.id)
        .execute(&self.pool)
        .await?;

        self.find(campaign.user_id, &campaign.public_id).await
    }

    pub async fn set_status(
        &self,
        campaign: &Campaign,
        status: CampaignStatus,
    ) -> DatabaseResult<Campaign> {
        sqlx::query("UPDATE campaigns SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(now_rfc3339())
            .bind(campaign.id)
            .execute(&self.pool)
            .await?;

        self.find(campaign.user_id, &campaign.public_id).await
    }

    pub async fn delete(&self, campaign: &Campaign) -> DatabaseResult<()> {
        let result = sqlx::query("DELETE FROM campaigns WHERE id = ?")
            .bind(campaign.id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound("campaign"));
        }
        Ok(())
    }

    pub async fn append_log(&self, campaign_id: i64, log: &NewCampaignLog) -> DatabaseResult<CampaignLog> {
        if log.target_id.trim().is_empty() {
            return Err(DatabaseError::Validation("target_id is required".into()));
        }

        let result = sqlx::query(
            "INSERT INTO campaign_logs (campaign_id, target_id, action, status, detail, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(campaign_id)
        .bind(log.target_id.trim())
        .bind(log.action.as_str())
        .bind(log.status.as_str())
        .bind(&log.detail)
        .bind(now_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|err| DatabaseError::from_insert(err, "campaign log"))?;

        let log = sqlx::query_as::<_, CampaignLog>(
            "SELECT id, campaign_id, target_id, action, status, detail, created_at
             FROM campaign_logs WHERE id = ?",
        )
        .bind(result.last_insert_rowid())
        .fetch_one(&self.pool)
        .await?;
        Ok(log)
    }

    /// Newest first.
    pub async fn logs(&self, campaign_id: i64, limit: i64) -> DatabaseResult<Vec<CampaignLog>> {
        let logs = sqlx::query_as::<_, CampaignLog>(
            "SELECT id, campaign_id, target_id, action, status, detail, created_at
             FROM campaign_logs WHERE campaign_id = ?
             ORDER BY id DESC LIMIT ?",
        )
        .bind(campaign_id)
        .bind(limit.clamp(1, 1000))
        .fetch_all(&self.pool)
        .await?;
        Ok(logs)
    }

    pub async fn stats(&self, campaign_id: i64) -> DatabaseResult<CampaignStats> {
        let rows: Vec<(CampaignAction, LogStatus, i64)> = sqlx::query_as(
            "SELECT action, status, COUNT(*) FROM campaign_logs
             WHERE campaign_id = ? GROUP BY action, status",
        )
        .bind(campaign_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(fold_stats(rows))
    }

    /// Log counters across every campaign the user owns.
    pub async fn user_stats(&self, user_id: i64, account_id: Option<&str>) -> DatabaseResult<CampaignStats> {
        let rows: Vec<(CampaignAction, LogStatus, i64)> = sqlx::query_as(
            "SELECT g.action, g.status, COUNT(*) FROM campaign_logs g
             JOIN campaigns c ON c.id = g.campaign_id
             WHERE c.user_id = ? AND (? IS NULL OR c.account_id = ?)
             GROUP BY g.action, g.status",
        )
        .bind(user_id)
        .bind(account_id)
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(fold_stats(rows))
    }

    /// (total, active) campaigns owned by the user.
    pub async fn count(&self, user_id: i64, account_id: Option<&str>) -> DatabaseResult<(i64, i64)> {
        let counts: (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(CASE WHEN status = 'active' THEN 1 ELSE 0 END), 0)
             FROM campaigns WHERE user_id = ? AND (? IS NULL OR account_id = ?)",
        )
        .bind(user_id)
        .bind(account_id)
        .bind(account_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(counts)
    }
}

fn fold_stats(rows: Vec<(CampaignAction, LogStatus, i64)>) -> CampaignStats {
    let mut stats = CampaignStats::default();
    for (action, status, count) in rows {
        if status == LogStatus::Error {
            stats.errors += count;
            continue;
        }
        match action {
            CampaignAction::InvitationSent => stats.invitations_sent += count,
            CampaignAction::MessageSent => stats.messages_sent += count,
            CampaignAction::ReplyReceived => stats.replies += count,
            CampaignAction::ProfileViewed => stats.profiles_viewed += count,
        }
    }
    stats
}
