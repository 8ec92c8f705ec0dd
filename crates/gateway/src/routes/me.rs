use axum::{extract::State, http::HeaderMap, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{util::require_bearer, ApiError, AppState};

#[derive(Debug, Serialize, ToSchema)]
pub struct SelectedAccountResponse {
    pub account_id: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SelectAccountRequest {
    /// `null` clears the selection.
    pub account_id: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/me/selected-account",
    tag = "Me",
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Currently selected LinkedIn account", body = SelectedAccountResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_selected_account(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SelectedAccountResponse>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;
    Ok(Json(SelectedAccountResponse {
        account_id: user.selected_account_id,
    }))
}

#[utoipa::path(
    put,
    path = "/api/me/selected-account",
    tag = "Me",
    security(("bearerAuth" = [])),
    request_body = SelectAccountRequest,
    responses(
        (status = 200, description = "Selection stored", body = SelectedAccountResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 404, description = "Account not visible to the user", body = crate::error::ErrorResponse)
    )
)]
pub async fn set_selected_account(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<SelectAccountRequest>,
) -> Result<Json<SelectedAccountResponse>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;

    let account_id = payload
        .account_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty());
    if let Some(account_id) = account_id {
        state.require_account(&user, account_id).await?;
    }

    let user = state.users().set_selected_account(user.id, account_id).await?;
    Ok(Json(SelectedAccountResponse {
        account_id: user.selected_account_id,
    }))
}
