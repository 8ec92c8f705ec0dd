use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use dailink_database::{
    CrmCompany, CrmList, CrmListKind, CrmProfile, InsertSummary, NewCrmCompany, NewCrmProfile,
    TransferMode,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    services::crm::{normalize_company, normalize_profile},
    util::{require_bearer, require_text},
    ApiError, AppState,
};

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct AccountFilter {
    /// Restrict results to one LinkedIn account.
    pub account_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListsResponse {
    pub lists: Vec<CrmList>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateListRequest {
    pub account_id: String,
    pub name: String,
    #[serde(default)]
    pub kind: CrmListKind,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RenameListRequest {
    pub name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfilesResponse {
    pub profiles: Vec<CrmProfile>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CompaniesResponse {
    pub companies: Vec<CrmCompany>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddProfilesRequest {
    pub profiles: Vec<NewCrmProfile>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddCompaniesRequest {
    pub companies: Vec<NewCrmCompany>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TransferRequest {
    pub target_list_id: String,
    pub linkedin_ids: Vec<String>,
    pub mode: TransferMode,
}

#[utoipa::path(
    get,
    path = "/api/crm/lists",
    tag = "CRM",
    security(("bearerAuth" = [])),
    params(AccountFilter),
    responses(
        (status = 200, description = "CRM lists owned by the user", body = ListsResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_lists(
    State(state): State<AppState>,
    Query(filter): Query<AccountFilter>,
    headers: HeaderMap,
) -> Result<Json<ListsResponse>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;

    let lists = state.crm().lists(user.id, filter.account_id.as_deref()).await?;
    Ok(Json(ListsResponse { lists }))
}

#[utoipa::path(
    post,
    path = "/api/crm/lists",
    tag = "CRM",
    security(("bearerAuth" = [])),
    request_body = CreateListRequest,
    responses(
        (status = 201, description = "List created", body = CrmList),
        (status = 400, description = "Missing name", body = crate::error::ErrorResponse),
        (status = 404, description = "Account not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateListRequest>,
) -> Result<(StatusCode, Json<CrmList>), ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;
    let account = state.require_account(&user, payload.account_id.trim()).await?;

    let list = state
        .crm()
        .create_list(user.id, &account.account_id, &payload.name, payload.kind)
        .await?;
    Ok((StatusCode::CREATED, Json(list)))
}

#[utoipa::path(
    get,
    path = "/api/crm/lists/{list_id}",
    tag = "CRM",
    security(("bearerAuth" = [])),
    params(("list_id" = String, Path, description = "List public id")),
    responses(
        (status = 200, description = "CRM list", body = CrmList),
        (status = 404, description = "List not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_list(
    State(state): State<AppState>,
    Path(list_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<CrmList>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;

    Ok(Json(state.crm().find_list(user.id, &list_id).await?))
}

#[utoipa::path(
    put,
    path = "/api/crm/lists/{list_id}",
    tag = "CRM",
    security(("bearerAuth" = [])),
    params(("list_id" = String, Path, description = "List public id")),
    request_body = RenameListRequest,
    responses(
        (status = 200, description = "List renamed", body = CrmList),
        (status = 400, description = "Empty name", body = crate::error::ErrorResponse),
        (status = 404, description = "List not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn rename_list(
    State(state): State<AppState>,
    Path(list_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<RenameListRequest>,
) -> Result<Json<CrmList>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;
    let name = require_text("name", &payload.name)?;

    Ok(Json(state.crm().rename_list(user.id, &list_id, name).await?))
}

#[utoipa::path(
    delete,
    path = "/api/crm/lists/{list_id}",
    tag = "CRM",
    security(("bearerAuth" = [])),
    params(("list_id" = String, Path, description = "List public id")),
    responses(
        (status = 204, description = "List and its members deleted"),
        (status = 404, description = "List not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_list(
    State(state): State<AppState>,
    Path(list_id): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;

    state.crm().delete_list(user.id, &list_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/crm/lists/{list_id}/profiles",
    tag = "CRM",
    security(("bearerAuth" = [])),
    params(("list_id" = String, Path, description = "List public id")),
    responses(
        (status = 200, description = "Profiles in the list", body = ProfilesResponse),
        (status = 404, description = "List not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_profiles(
    State(state): State<AppState>,
    Path(list_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<ProfilesResponse>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;

    let list = state.crm().find_list(user.id, &list_id).await?;
    let profiles = state.crm().profiles(list.id).await?;
    Ok(Json(ProfilesResponse { profiles }))
}

#[utoipa::path(
    post,
    path = "/api/crm/lists/{list_id}/profiles",
    tag = "CRM",
    security(("bearerAuth" = [])),
    params(("list_id" = String, Path, description = "List public id")),
    request_body = AddProfilesRequest,
    responses(
        (status = 200, description = "Profiles added; duplicates skipped", body = InsertSummary),
        (status = 400, description = "Invalid profile or wrong list kind", body = crate::error::ErrorResponse),
        (status = 404, description = "List not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn add_profiles(
    State(state): State<AppState>,
    Path(list_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<AddProfilesRequest>,
) -> Result<Json<InsertSummary>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;

    let list = state.crm().find_list(user.id, &list_id).await?;
    let profiles = payload.profiles.into_iter().map(normalize_profile).collect();
    Ok(Json(state.crm().add_profiles(&list, profiles).await?))
}

#[utoipa::path(
    delete,
    path = "/api/crm/lists/{list_id}/profiles/{linkedin_id}",
    tag = "CRM",
    security(("bearerAuth" = [])),
    params(
        ("list_id" = String, Path, description = "List public id"),
        ("linkedin_id" = String, Path, description = "LinkedIn member id")
    ),
    responses(
        (status = 204, description = "Profile removed"),
        (status = 404, description = "List or profile not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn remove_profile(
    State(state): State<AppState>,
    Path((list_id, linkedin_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;

    let list = state.crm().find_list(user.id, &list_id).await?;
    state.crm().remove_profile(list.id, &linkedin_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/crm/lists/{list_id}/profiles/transfer",
    tag = "CRM",
    security(("bearerAuth" = [])),
    params(("list_id" = String, Path, description = "Source list public id")),
    request_body = TransferRequest,
    responses(
        (status = 200, description = "Profiles copied or moved", body = InsertSummary),
        (status = 400, description = "Lists are the same or not people lists", body = crate::error::ErrorResponse),
        (status = 404, description = "List not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn transfer_profiles(
    State(state): State<AppState>,
    Path(list_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<TransferRequest>,
) -> Result<Json<InsertSummary>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;

    let source = state.crm().find_list(user.id, &list_id).await?;
    let target = state
        .crm()
        .find_list(user.id, payload.target_list_id.trim())
        .await?;
    let summary = state
        .crm()
        .transfer_profiles(&source, &target, &payload.linkedin_ids, payload.mode)
        .await?;
    Ok(Json(summary))
}

#[utoipa::path(
    get,
    path = "/api/crm/lists/{list_id}/companies",
    tag = "CRM",
    security(("bearerAuth" = [])),
    params(("list_id" = String, Path, description = "List public id")),
    responses(
        (status = 200, description = "Companies in the list", body = CompaniesResponse),
        (status = 404, description = "List not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_companies(
    State(state): State<AppState>,
    Path(list_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<CompaniesResponse>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;

    let list = state.crm().find_list(user.id, &list_id).await?;
    let companies = state.crm().companies(list.id).await?;
    Ok(Json(CompaniesResponse { companies }))
}

#[utoipa::path(
    post,
    path = "/api/crm/lists/{list_id}/companies",
    tag = "CRM",
    security(("bearerAuth" = [])),
    params(("list_id" = String, Path, description = "List public id")),
    request_body = AddCompaniesRequest,
    responses(
        (status = 200, description = "Companies added; duplicates skipped", body = InsertSummary),
        (status = 400, description = "Invalid company or wrong list kind", body = crate::error::ErrorResponse),
        (status = 404, description = "List not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn add_companies(
    State(state): State<AppState>,
    Path(list_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<AddCompaniesRequest>,
) -> Result<Json<InsertSummary>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;

    let list = state.crm().find_list(user.id, &list_id).await?;
    let companies = payload.companies.into_iter().map(normalize_company).collect();
    Ok(Json(state.crm().add_companies(&list, companies).await?))
}

#[utoipa::path(
    delete,
    path = "/api/crm/lists/{list_id}/companies/{linkedin_id}",
    tag = "CRM",
    security(("bearerAuth" = [])),
    params(
        ("list_id" = String, Path, description = "List public id"),
        ("linkedin_id" = String, Path, description = "LinkedIn company id")
    ),
    responses(
        (status = 204, description = "Company removed"),
        (status = 404, description = "List or company not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn remove_company(
    State(state): State<AppState>,
    Path((list_id, linkedin_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;

    let list = state.crm().find_list(user.id, &list_id).await?;
    state.crm().remove_company(list.id, &linkedin_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
