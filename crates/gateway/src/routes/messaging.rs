use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use dailink_unipile::{Chat, ChatStarted, Message, MessageSent, Page};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::{
    util::{require_bearer, require_text},
    ApiError, AppState,
};

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct PagingQuery {
    pub cursor: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SendMessageRequest {
    pub text: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StartChatRequest {
    pub attendee_ids: Vec<String>,
    pub text: String,
}

#[utoipa::path(
    get,
    path = "/api/accounts/{account_id}/chats",
    tag = "Messaging",
    security(("bearerAuth" = [])),
    params(
        ("account_id" = String, Path, description = "Unipile account id"),
        PagingQuery
    ),
    responses(
        (status = 200, description = "One page of chats", body = Object),
        (status = 404, description = "Account not found", body = crate::error::ErrorResponse),
        (status = 502, description = "Unipile request failed", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_chats(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
    Query(paging): Query<PagingQuery>,
    headers: HeaderMap,
) -> Result<Json<Page<Chat>>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;
    state.require_account(&user, &account_id).await?;

    let page = state
        .unipile()?
        .list_chats(&account_id, paging.cursor.as_deref(), paging.limit)
        .await?;
    Ok(Json(page))
}

#[utoipa::path(
    post,
    path = "/api/accounts/{account_id}/chats",
    tag = "Messaging",
    security(("bearerAuth" = [])),
    params(("account_id" = String, Path, description = "Unipile account id")),
    request_body = StartChatRequest,
    responses(
        (status = 201, description = "Chat started", body = Object),
        (status = 400, description = "Empty text or no attendees", body = crate::error::ErrorResponse),
        (status = 404, description = "Account not found", body = crate::error::ErrorResponse),
        (status = 502, description = "Unipile request failed", body = crate::error::ErrorResponse)
    )
)]
pub async fn start_chat(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<StartChatRequest>,
) -> Result<(StatusCode, Json<ChatStarted>), ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;
    state.require_account(&user, &account_id).await?;
    let text = require_text("text", &payload.text)?;

    let started = state
        .unipile()?
        .start_chat(&account_id, &payload.attendee_ids, text)
        .await?;
    Ok((StatusCode::CREATED, Json(started)))
}

#[utoipa::path(
    get,
    path = "/api/chats/{chat_id}/messages",
    tag = "Messaging",
    security(("bearerAuth" = [])),
    params(
        ("chat_id" = String, Path, description = "Unipile chat id"),
        PagingQuery
    ),
    responses(
        (status = 200, description = "One page of messages", body = Object),
        (status = 502, description = "Unipile request failed", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_messages(
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
    Query(paging): Query<PagingQuery>,
    headers: HeaderMap,
) -> Result<Json<Page<Message>>, ApiError> {
    let token = require_bearer(&headers)?;
    state.authenticate(&token).await?;

    let page = state
        .unipile()?
        .list_messages(&chat_id, paging.cursor.as_deref(), paging.limit)
        .await?;
    Ok(Json(page))
}

#[utoipa::path(
    post,
    path = "/api/chats/{chat_id}/messages",
    tag = "Messaging",
    security(("bearerAuth" = [])),
    params(("chat_id" = String, Path, description = "Unipile chat id")),
    request_body = SendMessageRequest,
    responses(
        (status = 201, description = "Message sent", body = Object),
        (status = 400, description = "Empty text", body = crate::error::ErrorResponse),
        (status = 502, description = "Unipile request failed", body = crate::error::ErrorResponse)
    )
)]
pub async fn send_message(
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<MessageSent>), ApiError> {
    let token = require_bearer(&headers)?;
    state.authenticate(&token).await?;
    let text = require_text("text", &payload.text)?;

    let sent = state.unipile()?.send_message(&chat_id, text).await?;
    Ok((StatusCode::CREATED, Json(sent)))
}
