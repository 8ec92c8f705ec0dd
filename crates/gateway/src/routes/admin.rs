use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use dailink_database::{User, UserRole};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::{
    routes::auth::UserResponse,
    util::{require_admin, require_bearer},
    ApiError, AppState,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct UsersResponse {
    pub users: Vec<User>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRoleRequest {
    pub role: UserRole,
}

#[utoipa::path(
    get,
    path = "/api/admin/users",
    tag = "Admin",
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "All users", body = UsersResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Admin role required", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<UsersResponse>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;
    require_admin(&user)?;

    let users = state.users().list_all().await?;
    Ok(Json(UsersResponse { users }))
}

#[utoipa::path(
    put,
    path = "/api/admin/users/{user_id}/role",
    tag = "Admin",
    security(("bearerAuth" = [])),
    params(("user_id" = String, Path, description = "User public identifier")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = UserResponse),
        (status = 403, description = "Admin role required", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Would remove the last admin", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_role(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<UpdateRoleRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let token = require_bearer(&headers)?;
    let (admin, _) = state.authenticate(&token).await?;
    require_admin(&admin)?;

    let target = state.users().find_by_public_id(&user_id).await?;
    if target.is_admin() && payload.role != UserRole::Admin && state.users().count_admins().await? <= 1 {
        return Err(ApiError::conflict("cannot demote the last admin"));
    }

    let user = state.users().set_role(&user_id, payload.role).await?;
    info!(admin = %admin.public_id, user = %user.public_id, role = %user.role, "user role changed");
    Ok(Json(UserResponse { user }))
}

#[utoipa::path(
    delete,
    path = "/api/admin/users/{user_id}",
    tag = "Admin",
    security(("bearerAuth" = [])),
    params(("user_id" = String, Path, description = "User public identifier")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 400, description = "Admins cannot delete themselves", body = crate::error::ErrorResponse),
        (status = 403, description = "Admin role required", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let token = require_bearer(&headers)?;
    let (admin, _) = state.authenticate(&token).await?;
    require_admin(&admin)?;

    if admin.public_id == user_id {
        return Err(ApiError::bad_request("cannot delete your own account"));
    }

    state.users().delete(&user_id).await?;
    info!(admin = %admin.public_id, user = %user_id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}
