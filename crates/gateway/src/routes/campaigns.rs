use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use dailink_database::{
    Campaign, CampaignLog, CampaignStats, CampaignStatus, CreateCampaign, DatabaseError,
    NewCampaignLog, UpdateCampaign, User,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    routes::crm::AccountFilter,
    util::require_bearer,
    ApiError, AppState,
};

const DEFAULT_LOG_LIMIT: i64 = 100;
const MAX_LOG_LIMIT: i64 = 1000;

#[derive(Debug, Serialize, ToSchema)]
pub struct CampaignsResponse {
    pub campaigns: Vec<Campaign>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCampaignRequest {
    pub account_id: String,
    pub name: String,
    /// Public id of a CRM list on the same account.
    pub crm_list_id: Option<String>,
    pub message_template: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateCampaignRequest {
    pub name: Option<String>,
    pub crm_list_id: Option<String>,
    pub message_template: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub status: CampaignStatus,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct LogsQuery {
    /// Defaults to 100.
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LogsResponse {
    pub logs: Vec<CampaignLog>,
}

/// Campaign for `public_id`; admins may reach any campaign.
async fn load_campaign(state: &AppState, user: &User, public_id: &str) -> Result<Campaign, ApiError> {
    let found = if user.is_admin() {
        state.campaigns().find_any(public_id).await
    } else {
        state.campaigns().find(user.id, public_id).await
    };
    found.map_err(|err| match err {
        DatabaseError::NotFound(_) => ApiError::not_found("campaign not found"),
        other => other.into(),
    })
}

/// Internal id of the owner's list `list_id`, which must sit on `account_id`.
async fn resolve_list(
    state: &AppState,
    owner_id: i64,
    account_id: &str,
    list_id: Option<&str>,
) -> Result<Option<i64>, ApiError> {
    let Some(list_id) = list_id.map(str::trim).filter(|id| !id.is_empty()) else {
        return Ok(None);
    };
    let list = state.crm().find_list(owner_id, list_id).await?;
    if list.account_id != account_id {
        return Err(ApiError::bad_request(
            "crm list belongs to a different linkedin account",
        ));
    }
    Ok(Some(list.id))
}

#[utoipa::path(
    get,
    path = "/api/campaigns",
    tag = "Campaigns",
    security(("bearerAuth" = [])),
    params(AccountFilter),
    responses(
        (status = 200, description = "Campaigns owned by the user", body = CampaignsResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_campaigns(
    State(state): State<AppState>,
    Query(filter): Query<AccountFilter>,
    headers: HeaderMap,
) -> Result<Json<CampaignsResponse>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;

    let campaigns = state
        .campaigns()
        .list(user.id, filter.account_id.as_deref())
        .await?;
    Ok(Json(CampaignsResponse { campaigns }))
}

#[utoipa::path(
    post,
    path = "/api/campaigns",
    tag = "Campaigns",
    security(("bearerAuth" = [])),
    request_body = CreateCampaignRequest,
    responses(
        (status = 201, description = "Campaign created as draft", body = Campaign),
        (status = 400, description = "Invalid name or list", body = crate::error::ErrorResponse),
        (status = 404, description = "Account or list not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_campaign(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateCampaignRequest>,
) -> Result<(StatusCode, Json<Campaign>), ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;
    let account = state.require_account(&user, payload.account_id.trim()).await?;

    let crm_list_id = resolve_list(
        &state,
        user.id,
        &account.account_id,
        payload.crm_list_id.as_deref(),
    )
    .await?;
    let campaign = state
        .campaigns()
        .create(
            user.id,
            &CreateCampaign {
                account_id: account.account_id,
                name: payload.name,
                crm_list_id,
                message_template: payload.message_template,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(campaign)))
}

#[utoipa::path(
    get,
    path = "/api/campaigns/{campaign_id}",
    tag = "Campaigns",
    security(("bearerAuth" = [])),
    params(("campaign_id" = String, Path, description = "Campaign public id")),
    responses(
        (status = 200, description = "Campaign", body = Campaign),
        (status = 404, description = "Campaign not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_campaign(
    State(state): State<AppState>,
    Path(campaign_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Campaign>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;

    Ok(Json(load_campaign(&state, &user, &campaign_id).await?))
}

#[utoipa::path(
    put,
    path = "/api/campaigns/{campaign_id}",
    tag = "Campaigns",
    security(("bearerAuth" = [])),
    params(("campaign_id" = String, Path, description = "Campaign public id")),
    request_body = UpdateCampaignRequest,
    responses(
        (status = 200, description = "Campaign updated", body = Campaign),
        (status = 400, description = "Invalid name or list", body = crate::error::ErrorResponse),
        (status = 404, description = "Campaign or list not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_campaign(
    State(state): State<AppState>,
    Path(campaign_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<UpdateCampaignRequest>,
) -> Result<Json<Campaign>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;

    let campaign = load_campaign(&state, &user, &campaign_id).await?;
    let crm_list_id = resolve_list(
        &state,
        campaign.user_id,
        &campaign.account_id,
        payload.crm_list_id.as_deref(),
    )
    .await?;
    let updated = state
        .campaigns()
        .update(
            &campaign,
            &UpdateCampaign {
                name: payload.name,
                crm_list_id,
                message_template: payload.message_template,
            },
        )
        .await?;
    Ok(Json(updated))
}

#[utoipa::path(
    put,
    path = "/api/campaigns/{campaign_id}/status",
    tag = "Campaigns",
    security(("bearerAuth" = [])),
    params(("campaign_id" = String, Path, description = "Campaign public id")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = Campaign),
        (status = 404, description = "Campaign not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_status(
    State(state): State<AppState>,
    Path(campaign_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<Campaign>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;

    let campaign = load_campaign(&state, &user, &campaign_id).await?;
    let updated = state.campaigns().set_status(&campaign, payload.status).await?;
    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/api/campaigns/{campaign_id}",
    tag = "Campaigns",
    security(("bearerAuth" = [])),
    params(("campaign_id" = String, Path, description = "Campaign public id")),
    responses(
        (status = 204, description = "Campaign and its logs deleted"),
        (status = 404, description = "Campaign not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_campaign(
    State(state): State<AppState>,
    Path(campaign_id): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;

    let campaign = load_campaign(&state, &user, &campaign_id).await?;
    state.campaigns().delete(&campaign).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/campaigns/{campaign_id}/logs",
    tag = "Campaigns",
    security(("bearerAuth" = [])),
    params(
        ("campaign_id" = String, Path, description = "Campaign public id"),
        LogsQuery
    ),
    responses(
        (status = 200, description = "Newest logs first", body = LogsResponse),
        (status = 404, description = "Campaign not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_logs(
    State(state): State<AppState>,
    Path(campaign_id): Path<String>,
    Query(query): Query<LogsQuery>,
    headers: HeaderMap,
) -> Result<Json<LogsResponse>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;

    let campaign = load_campaign(&state, &user, &campaign_id).await?;
    let limit = query.limit.unwrap_or(DEFAULT_LOG_LIMIT).clamp(1, MAX_LOG_LIMIT);
    let logs = state.campaigns().logs(campaign.id, limit).await?;
    Ok(Json(LogsResponse { logs }))
}

#[utoipa::path(
    post,
    path = "/api/campaigns/{campaign_id}/logs",
    tag = "Campaigns",
    security(("bearerAuth" = [])),
    params(("campaign_id" = String, Path, description = "Campaign public id")),
    request_body = NewCampaignLog,
    responses(
        (status = 201, description = "Log entry recorded", body = CampaignLog),
        (status = 400, description = "Missing target", body = crate::error::ErrorResponse),
        (status = 404, description = "Campaign not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn append_log(
    State(state): State<AppState>,
    Path(campaign_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<NewCampaignLog>,
) -> Result<(StatusCode, Json<CampaignLog>), ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;

    let campaign = load_campaign(&state, &user, &campaign_id).await?;
    let log = state.campaigns().append_log(campaign.id, &payload).await?;
    Ok((StatusCode::CREATED, Json(log)))
}

#[utoipa::path(
    get,
    path = "/api/campaigns/{campaign_id}/stats",
    tag = "Campaigns",
    security(("bearerAuth" = [])),
    params(("campaign_id" = String, Path, description = "Campaign public id")),
    responses(
        (status = 200, description = "Counters per action", body = CampaignStats),
        (status = 404, description = "Campaign not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn campaign_stats(
    State(state): State<AppState>,
    Path(campaign_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<CampaignStats>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;

    let campaign = load_campaign(&state, &user, &campaign_id).await?;
    Ok(Json(state.campaigns().stats(campaign.id).await?))
}
