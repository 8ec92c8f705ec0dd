use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use dailink_database::{
    CreateHscRun, HscRun, HscRunItem, HscStage, InsertSummary, SearchFilters, UpdateHscRun,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::{
    routes::crm::AccountFilter,
    services::crm::export_run_items,
    util::{require_bearer, require_text},
    ApiError, AppState,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct RunsResponse {
    pub runs: Vec<HscRun>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateRunRequest {
    pub account_id: String,
    pub name: String,
    pub keywords: Option<String>,
    pub search_url: Option<String>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub filters: SearchFilters,
    #[serde(default)]
    pub champion_keywords: Vec<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateRunRequest {
    pub name: Option<String>,
    pub keywords: Option<String>,
    pub search_url: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub filters: Option<SearchFilters>,
    pub champion_keywords: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ItemsQuery {
    #[serde(default)]
    pub champions_only: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ItemsResponse {
    pub items: Vec<HscRunItem>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ExportRequest {
    /// Public id of a people list owned by the user.
    pub list_id: String,
    #[serde(default)]
    pub champions_only: bool,
}

#[utoipa::path(
    get,
    path = "/api/hsc-runs",
    tag = "HSC",
    security(("bearerAuth" = [])),
    params(AccountFilter),
    responses(
        (status = 200, description = "HSC runs owned by the user", body = RunsResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_runs(
    State(state): State<AppState>,
    Query(filter): Query<AccountFilter>,
    headers: HeaderMap,
) -> Result<Json<RunsResponse>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;

    let runs = state
        .hsc_runs()
        .list(user.id, filter.account_id.as_deref())
        .await?;
    Ok(Json(RunsResponse { runs }))
}

#[utoipa::path(
    post,
    path = "/api/hsc-runs",
    tag = "HSC",
    security(("bearerAuth" = [])),
    request_body = CreateRunRequest,
    responses(
        (status = 201, description = "Run created in preparing-run", body = HscRun),
        (status = 400, description = "Neither keywords nor search url", body = crate::error::ErrorResponse),
        (status = 404, description = "Account not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_run(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateRunRequest>,
) -> Result<(StatusCode, Json<HscRun>), ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;
    let account = state.require_account(&user, payload.account_id.trim()).await?;

    let run = state
        .hsc_runs()
        .create(
            user.id,
            &CreateHscRun {
                account_id: account.account_id,
                name: payload.name,
                keywords: payload.keywords,
                search_url: payload.search_url,
                filters: payload.filters,
                champion_keywords: payload.champion_keywords,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(run)))
}

#[utoipa::path(
    get,
    path = "/api/hsc-runs/{run_id}",
    tag = "HSC",
    security(("bearerAuth" = [])),
    params(("run_id" = String, Path, description = "Run public id")),
    responses(
        (status = 200, description = "HSC run", body = HscRun),
        (status = 404, description = "Run not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_run(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<HscRun>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;

    Ok(Json(state.hsc_runs().find(user.id, &run_id).await?))
}

#[utoipa::path(
    put,
    path = "/api/hsc-runs/{run_id}",
    tag = "HSC",
    security(("bearerAuth" = [])),
    params(("run_id" = String, Path, description = "Run public id")),
    request_body = UpdateRunRequest,
    responses(
        (status = 200, description = "Run updated", body = HscRun),
        (status = 400, description = "Invalid name or query", body = crate::error::ErrorResponse),
        (status = 404, description = "Run not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Run is running", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_run(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<UpdateRunRequest>,
) -> Result<Json<HscRun>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;

    let request = UpdateHscRun {
        name: payload.name,
        keywords: payload.keywords,
        search_url: payload.search_url,
        filters: payload.filters,
        champion_keywords: payload.champion_keywords,
    };
    Ok(Json(state.hsc_runs().update(user.id, &run_id, &request).await?))
}

#[utoipa::path(
    delete,
    path = "/api/hsc-runs/{run_id}",
    tag = "HSC",
    security(("bearerAuth" = [])),
    params(("run_id" = String, Path, description = "Run public id")),
    responses(
        (status = 204, description = "Run and its items deleted"),
        (status = 404, description = "Run not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Run is running", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_run(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;

    state.hsc_runs().delete(user.id, &run_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/hsc-runs/{run_id}/start",
    tag = "HSC",
    security(("bearerAuth" = [])),
    params(("run_id" = String, Path, description = "Run public id")),
    responses(
        (status = 202, description = "Run started or resumed", body = HscRun),
        (status = 404, description = "Run or its LinkedIn account not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Run cannot start from its current stage", body = crate::error::ErrorResponse),
        (status = 503, description = "Unipile is not configured", body = crate::error::ErrorResponse)
    )
)]
pub async fn start_run(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<HscRun>), ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;

    let runner = state.hsc_runner()?;
    let run = state.hsc_runs().find(user.id, &run_id).await?;
    state.require_account(&user, &run.account_id).await?;
    let run = state.hsc_runs().transition(run.id, HscStage::Running).await?;
    info!(run = %run.public_id, user = %user.public_id, epoch = run.run_epoch, "hsc run started");
    runner.spawn(run.id, run.run_epoch);

    Ok((StatusCode::ACCEPTED, Json(run)))
}

#[utoipa::path(
    post,
    path = "/api/hsc-runs/{run_id}/stop",
    tag = "HSC",
    security(("bearerAuth" = [])),
    params(("run_id" = String, Path, description = "Run public id")),
    responses(
        (status = 200, description = "Run stopped", body = HscRun),
        (status = 404, description = "Run not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Run is not running", body = crate::error::ErrorResponse)
    )
)]
pub async fn stop_run(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<HscRun>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;

    let run = state.hsc_runs().find(user.id, &run_id).await?;
    let run = state.hsc_runs().transition(run.id, HscStage::Stopped).await?;
    info!(run = %run.public_id, "hsc run stopped");
    Ok(Json(run))
}

#[utoipa::path(
    get,
    path = "/api/hsc-runs/{run_id}/items",
    tag = "HSC",
    security(("bearerAuth" = [])),
    params(
        ("run_id" = String, Path, description = "Run public id"),
        ItemsQuery
    ),
    responses(
        (status = 200, description = "Analyzed items", body = ItemsResponse),
        (status = 404, description = "Run not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_items(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
    Query(query): Query<ItemsQuery>,
    headers: HeaderMap,
) -> Result<Json<ItemsResponse>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;

    let run = state.hsc_runs().find(user.id, &run_id).await?;
    let items = state.hsc_runs().items(run.id, query.champions_only).await?;
    Ok(Json(ItemsResponse { items }))
}

#[utoipa::path(
    post,
    path = "/api/hsc-runs/{run_id}/export",
    tag = "HSC",
    security(("bearerAuth" = [])),
    params(("run_id" = String, Path, description = "Run public id")),
    request_body = ExportRequest,
    responses(
        (status = 200, description = "Items copied into the CRM list", body = InsertSummary),
        (status = 400, description = "Target is not a people list", body = crate::error::ErrorResponse),
        (status = 404, description = "Run or list not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn export_items(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<ExportRequest>,
) -> Result<Json<InsertSummary>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;
    let list_id = require_text("list_id", &payload.list_id)?;

    let run = state.hsc_runs().find(user.id, &run_id).await?;
    let summary = export_run_items(&state, &user, &run, list_id, payload.champions_only).await?;
    Ok(Json(summary))
}
