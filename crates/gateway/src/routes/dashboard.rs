use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{routes::crm::AccountFilter, util::require_bearer, ApiError, AppState};

#[derive(Debug, Default, Serialize, ToSchema)]
pub struct DashboardStats {
    pub accounts: i64,
    pub lists: i64,
    pub profiles: i64,
    pub companies: i64,
    pub campaigns: i64,
    pub active_campaigns: i64,
    pub invitations_sent: i64,
    pub messages_sent: i64,
    pub replies: i64,
    pub hsc_runs: i64,
    pub running_hsc_runs: i64,
    /// replies / messages_sent, 0 when nothing was sent.
    pub reply_rate: f64,
}

pub fn reply_rate(replies: i64, messages_sent: i64) -> f64 {
    if messages_sent <= 0 {
        return 0.0;
    }
    replies as f64 / messages_sent as f64
}

#[utoipa::path(
    get,
    path = "/api/dashboard/stats",
    tag = "Dashboard",
    security(("bearerAuth" = [])),
    params(AccountFilter),
    responses(
        (status = 200, description = "Totals for the current user", body = DashboardStats),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse)
    )
)]
pub async fn dashboard_stats(
    State(state): State<AppState>,
    Query(filter): Query<AccountFilter>,
    headers: HeaderMap,
) -> Result<Json<DashboardStats>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;
    let account_id = filter
        .account_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty());

    let accounts = state.accounts().count_for_user(user.id).await?;
    let lists = state.crm().count_lists(user.id, account_id).await?;
    let (profiles, companies) = state.crm().count_members(user.id, account_id).await?;
    let (campaigns, active_campaigns) = state.campaigns().count(user.id, account_id).await?;
    let logs = state.campaigns().user_stats(user.id, account_id).await?;
    let (hsc_runs, running_hsc_runs) = state.hsc_runs().count(user.id, account_id).await?;

    Ok(Json(DashboardStats {
        accounts,
        lists,
        profiles,
        companies,
        campaigns,
        active_campaigns,
        invitations_sent: logs.invitations_sent,
        messages_sent: logs.messages_sent,
        replies: logs.replies,
        hsc_runs,
        running_hsc_runs,
        reply_rate: reply_rate(logs.replies, logs.messages_sent),
    }))
}
