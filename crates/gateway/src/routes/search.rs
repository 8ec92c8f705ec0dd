use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use dailink_database::{
    Campaign, CampaignAction, DatabaseError, LogStatus, NewCampaignLog, SearchFilters, User,
};
use dailink_unipile::{
    InvitationSent, Page, Post, Reaction, SearchCategory, SearchPage, SearchQuery, UserProfile,
};
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::{IntoParams, ToSchema};

use crate::{
    util::{require_bearer, require_text},
    ApiError, AppState,
};

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SearchRequest {
    pub keywords: Option<String>,
    /// `people`, `companies`, `posts` or `jobs`; defaults to `people`.
    #[schema(value_type = Option<String>)]
    pub category: Option<SearchCategory>,
    /// A LinkedIn search URL; takes precedence over keywords and filters.
    pub search_url: Option<String>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub filters: SearchFilters,
    pub cursor: Option<String>,
    pub limit: Option<u32>,
}

impl SearchRequest {
    fn query(&self) -> Result<SearchQuery, ApiError> {
        if let Some(url) = self.search_url.as_deref().map(str::trim) {
            if !url.is_empty() {
                return Ok(SearchQuery::Url(url.to_string()));
            }
        }

        let keywords = self
            .keywords
            .as_deref()
            .map(str::trim)
            .filter(|keywords| !keywords.is_empty())
            .map(str::to_string);
        let has_filters = self.filters.values().any(|ids| !ids.is_empty());
        if keywords.is_none() && !has_filters {
            return Err(ApiError::bad_request(
                "provide a search_url, keywords or at least one filter",
            ));
        }

        Ok(SearchQuery::Classic {
            category: self.category.unwrap_or_default(),
            keywords,
            filters: self.filters.clone(),
        })
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct CursorQuery {
    pub cursor: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct InvitationRequest {
    pub provider_id: String,
    pub message: Option<String>,
    /// Campaign to record the invitation against.
    pub campaign_id: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CommentRequest {
    pub text: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReactionRequest {
    #[schema(value_type = String, example = "like")]
    pub reaction: Reaction,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ActionResponse {
    pub status: String,
}

impl ActionResponse {
    fn done() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/accounts/{account_id}/search",
    tag = "Search",
    security(("bearerAuth" = [])),
    params(("account_id" = String, Path, description = "Unipile account id")),
    request_body = SearchRequest,
    responses(
        (status = 200, description = "One page of search results", body = Object),
        (status = 400, description = "Nothing to search for", body = crate::error::ErrorResponse),
        (status = 404, description = "Account not found", body = crate::error::ErrorResponse),
        (status = 502, description = "Unipile request failed", body = crate::error::ErrorResponse)
    )
)]
pub async fn search(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<SearchRequest>,
) -> Result<Json<SearchPage>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;
    state.require_account(&user, &account_id).await?;

    let query = payload.query()?;
    let page = state
        .unipile()?
        .search(&account_id, &query, payload.cursor.as_deref(), payload.limit)
        .await?;
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/api/accounts/{account_id}/profiles/{identifier}",
    tag = "Search",
    security(("bearerAuth" = [])),
    params(
        ("account_id" = String, Path, description = "Unipile account id"),
        ("identifier" = String, Path, description = "Provider id or public identifier")
    ),
    responses(
        (status = 200, description = "LinkedIn profile", body = Object),
        (status = 404, description = "Account not found", body = crate::error::ErrorResponse),
        (status = 502, description = "Unipile request failed", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_profile(
    State(state): State<AppState>,
    Path((account_id, identifier)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Json<UserProfile>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;
    state.require_account(&user, &account_id).await?;

    let profile = state.unipile()?.get_profile(&account_id, &identifier).await?;
    Ok(Json(profile))
}

#[utoipa::path(
    get,
    path = "/api/accounts/{account_id}/profiles/{identifier}/posts",
    tag = "Search",
    security(("bearerAuth" = [])),
    params(
        ("account_id" = String, Path, description = "Unipile account id"),
        ("identifier" = String, Path, description = "Provider id or public identifier"),
        CursorQuery
    ),
    responses(
        (status = 200, description = "One page of the profile's posts", body = Object),
        (status = 404, description = "Account not found", body = crate::error::ErrorResponse),
        (status = 502, description = "Unipile request failed", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_profile_posts(
    State(state): State<AppState>,
    Path((account_id, identifier)): Path<(String, String)>,
    Query(query): Query<CursorQuery>,
    headers: HeaderMap,
) -> Result<Json<Page<Post>>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;
    state.require_account(&user, &account_id).await?;

    let page = state
        .unipile()?
        .list_user_posts(&account_id, &identifier, query.cursor.as_deref())
        .await?;
    Ok(Json(page))
}

#[utoipa::path(
    post,
    path = "/api/accounts/{account_id}/invitations",
    tag = "Search",
    security(("bearerAuth" = [])),
    params(("account_id" = String, Path, description = "Unipile account id")),
    request_body = InvitationRequest,
    responses(
        (status = 201, description = "Invitation sent", body = Object),
        (status = 400, description = "Missing provider id or campaign on another account", body = crate::error::ErrorResponse),
        (status = 404, description = "Account or campaign not found", body = crate::error::ErrorResponse),
        (status = 502, description = "Unipile request failed", body = crate::error::ErrorResponse)
    )
)]
pub async fn send_invitation(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<InvitationRequest>,
) -> Result<(StatusCode, Json<InvitationSent>), ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;
    state.require_account(&user, &account_id).await?;
    let provider_id = require_text("provider_id", &payload.provider_id)?;

    let campaign = match payload.campaign_id.as_deref() {
        Some(campaign_id) => {
            let campaign = campaign_for(&state, &user, campaign_id).await?;
            if campaign.account_id != account_id {
                return Err(ApiError::bad_request(
                    "campaign belongs to another linkedin account",
                ));
            }
            Some(campaign)
        }
        None => None,
    };

    let message = payload
        .message
        .as_deref()
        .map(str::trim)
        .filter(|message| !message.is_empty());
    let result = state
        .unipile()?
        .send_invitation(&account_id, provider_id, message)
        .await;

    if let Some(campaign) = &campaign {
        let log = NewCampaignLog {
            target_id: provider_id.to_string(),
            action: CampaignAction::InvitationSent,
            status: if result.is_ok() {
                LogStatus::Success
            } else {
                LogStatus::Error
            },
            detail: result.as_ref().err().map(ToString::to_string),
        };
        if let Err(err) = state.campaigns().append_log(campaign.id, &log).await {
            warn!(campaign = %campaign.public_id, error = %err, "failed to log invitation");
        }
    }

    Ok((StatusCode::CREATED, Json(result?)))
}

async fn campaign_for(state: &AppState, user: &User, public_id: &str) -> Result<Campaign, ApiError> {
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

#[utoipa::path(
    get,
    path = "/api/accounts/{account_id}/posts/{post_id}",
    tag = "Search",
    security(("bearerAuth" = [])),
    params(
        ("account_id" = String, Path, description = "Unipile account id"),
        ("post_id" = String, Path, description = "Post id or activity urn")
    ),
    responses(
        (status = 200, description = "Post detail", body = Object),
        (status = 404, description = "Account not found", body = crate::error::ErrorResponse),
        (status = 502, description = "Unipile request failed", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_post(
    State(state): State<AppState>,
    Path((account_id, post_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Json<Post>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;
    state.require_account(&user, &account_id).await?;

    let post = state.unipile()?.get_post(&account_id, &post_id).await?;
    Ok(Json(post))
}

#[utoipa::path(
    post,
    path = "/api/accounts/{account_id}/posts/{post_id}/comments",
    tag = "Search",
    security(("bearerAuth" = [])),
    params(
        ("account_id" = String, Path, description = "Unipile account id"),
        ("post_id" = String, Path, description = "Post id or activity urn")
    ),
    request_body = CommentRequest,
    responses(
        (status = 201, description = "Comment posted", body = ActionResponse),
        (status = 400, description = "Empty comment", body = crate::error::ErrorResponse),
        (status = 502, description = "Unipile request failed", body = crate::error::ErrorResponse)
    )
)]
pub async fn comment_post(
    State(state): State<AppState>,
    Path((account_id, post_id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(payload): Json<CommentRequest>,
) -> Result<(StatusCode, Json<ActionResponse>), ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;
    state.require_account(&user, &account_id).await?;
    let text = require_text("text", &payload.text)?;

    state
        .unipile()?
        .comment_post(&account_id, &post_id, text)
        .await?;
    Ok((StatusCode::CREATED, Json(ActionResponse::done())))
}

#[utoipa::path(
    post,
    path = "/api/accounts/{account_id}/posts/{post_id}/reactions",
    tag = "Search",
    security(("bearerAuth" = [])),
    params(
        ("account_id" = String, Path, description = "Unipile account id"),
        ("post_id" = String, Path, description = "Post id or activity urn")
    ),
    request_body = ReactionRequest,
    responses(
        (status = 201, description = "Reaction added", body = ActionResponse),
        (status = 502, description = "Unipile request failed", body = crate::error::ErrorResponse)
    )
)]
pub async fn react_post(
    State(state): State<AppState>,
    Path((account_id, post_id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(payload): Json<ReactionRequest>,
) -> Result<(StatusCode, Json<ActionResponse>), ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;
    state.require_account(&user, &account_id).await?;

    state
        .unipile()?
        .react_post(&account_id, &post_id, payload.reaction)
        .await?;
    Ok((StatusCode::CREATED, Json(ActionResponse::done())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_url_wins_over_keywords() {
        let request = SearchRequest {
            keywords: Some("cfo".into()),
            search_url: Some(" https://www.linkedin.com/search/results/people/?keywords=cfo ".into()),
            ..SearchRequest::default()
        };
        assert_eq!(
            request.query().unwrap(),
            SearchQuery::Url("https://www.linkedin.com/search/results/people/?keywords=cfo".into())
        );
    }

    #[test]
    fn empty_search_is_rejected() {
        let request = SearchRequest {
            keywords: Some("   ".into()),
            ..SearchRequest::default()
        };
        assert_eq!(request.query().unwrap_err().status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn filters_alone_make_a_classic_search() {
        let mut filters = SearchFilters::new();
        filters.insert("location".into(), vec!["105015875".into()]);
        let request = SearchRequest {
            filters,
            ..SearchRequest::default()
        };
        match request.query().unwrap() {
            SearchQuery::Classic {
                category, keywords, ..
            } => {
                assert_eq!(category, SearchCategory::People);
                assert!(keywords.is_none());
            }
            other => panic!("unexpected query {other:?}"),
        }
    }
}
