use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use dailink_unipile::ConnectOutcome;
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::{
    services::accounts::{self as account_service, CombinedLinkedInAccount, SyncSummary},
    util::{require_bearer, require_text},
    ApiError, AppState,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct AccountsResponse {
    pub accounts: Vec<CombinedLinkedInAccount>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ConnectRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckpointRequest {
    pub account_id: String,
    pub code: String,
}

/// `status` is `connected` or `checkpoint`; `account` is present once the
/// account is usable.
#[derive(Debug, Serialize, ToSchema)]
pub struct ConnectResponse {
    pub status: String,
    pub account_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkpoint_type: Option<String>,
    pub account: Option<CombinedLinkedInAccount>,
}

#[utoipa::path(
    get,
    path = "/api/accounts",
    tag = "Accounts",
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "LinkedIn accounts visible to the user", body = AccountsResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 502, description = "Unipile request failed", body = crate::error::ErrorResponse),
        (status = 503, description = "Unipile is not configured", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_accounts(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<AccountsResponse>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;

    let accounts = account_service::list_combined(&state, &user).await?;
    Ok(Json(AccountsResponse { accounts }))
}

#[utoipa::path(
    post,
    path = "/api/accounts/connect",
    tag = "Accounts",
    security(("bearerAuth" = [])),
    request_body = ConnectRequest,
    responses(
        (status = 200, description = "Account connected or checkpoint raised", body = ConnectResponse),
        (status = 400, description = "Missing credentials", body = crate::error::ErrorResponse),
        (status = 502, description = "Unipile request failed", body = crate::error::ErrorResponse),
        (status = 503, description = "Unipile is not configured", body = crate::error::ErrorResponse)
    )
)]
pub async fn connect_account(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<ConnectRequest>,
) -> Result<Json<ConnectResponse>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;
    let username = require_text("username", &payload.username)?;
    require_text("password", &payload.password)?;

    let outcome = state
        .unipile()?
        .connect_linkedin(username, &payload.password)
        .await?;
    finish_connect(&state, &user, outcome).await
}

#[utoipa::path(
    post,
    path = "/api/accounts/checkpoint",
    tag = "Accounts",
    security(("bearerAuth" = [])),
    request_body = CheckpointRequest,
    responses(
        (status = 200, description = "Checkpoint answered", body = ConnectResponse),
        (status = 400, description = "Missing code", body = crate::error::ErrorResponse),
        (status = 502, description = "Unipile request failed", body = crate::error::ErrorResponse),
        (status = 503, description = "Unipile is not configured", body = crate::error::ErrorResponse)
    )
)]
pub async fn solve_checkpoint(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CheckpointRequest>,
) -> Result<Json<ConnectResponse>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;
    let account_id = require_text("account_id", &payload.account_id)?;
    let code = require_text("code", &payload.code)?;

    let outcome = state.unipile()?.solve_checkpoint(account_id, code).await?;
    finish_connect(&state, &user, outcome).await
}

async fn finish_connect(
    state: &AppState,
    user: &dailink_database::User,
    outcome: ConnectOutcome,
) -> Result<Json<ConnectResponse>, ApiError> {
    let response = match outcome {
        ConnectOutcome::Connected { account_id } => {
            let account = account_service::mirror_connected(state, user, &account_id).await?;
            ConnectResponse {
                status: "connected".to_string(),
                account_id,
                checkpoint_type: None,
                account: Some(account),
            }
        }
        ConnectOutcome::Checkpoint {
            account_id,
            checkpoint_type,
        } => {
            info!(account_id = %account_id, checkpoint = %checkpoint_type, "linkedin checkpoint raised");
            ConnectResponse {
                status: "checkpoint".to_string(),
                account_id,
                checkpoint_type: Some(checkpoint_type),
                account: None,
            }
        }
    };
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/accounts/sync",
    tag = "Accounts",
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Mirror refreshed", body = SyncSummary),
        (status = 502, description = "Unipile request failed", body = crate::error::ErrorResponse),
        (status = 503, description = "Unipile is not configured", body = crate::error::ErrorResponse)
    )
)]
pub async fn sync_accounts(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SyncSummary>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;

    let owner = (!user.is_admin()).then_some(user.id);
    let summary = account_service::sync_mirror(state.accounts(), state.unipile()?, owner).await?;
    Ok(Json(summary))
}

#[utoipa::path(
    delete,
    path = "/api/accounts/{account_id}",
    tag = "Accounts",
    security(("bearerAuth" = [])),
    params(("account_id" = String, Path, description = "Unipile account id")),
    responses(
        (status = 204, description = "Account disconnected"),
        (status = 404, description = "Account not found", body = crate::error::ErrorResponse),
        (status = 502, description = "Unipile request failed", body = crate::error::ErrorResponse),
        (status = 503, description = "Unipile is not configured", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_account(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;

    let account = state.require_account(&user, &account_id).await?;
    account_service::disconnect(&state, &account).await?;
    Ok(StatusCode::NO_CONTENT)
}
