use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use dailink_assistant::Reply;
use dailink_database::{CreateBot, DaininBot, UpdateBot};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::{
    util::{require_bearer, require_text},
    ApiError, AppState,
};

/// Bot as returned to clients; the API key is masked.
#[derive(Debug, Serialize, ToSchema)]
pub struct BotResponse {
    pub public_id: String,
    pub name: String,
    pub assistant_id: String,
    pub api_key: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<DaininBot> for BotResponse {
    fn from(bot: DaininBot) -> Self {
        Self {
            api_key: bot.masked_api_key(),
            public_id: bot.public_id,
            name: bot.name,
            assistant_id: bot.assistant_id,
            created_at: bot.created_at,
            updated_at: bot.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BotsResponse {
    pub bots: Vec<BotResponse>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBotRequest {
    pub name: String,
    pub assistant_id: String,
    pub api_key: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateBotRequest {
    pub name: Option<String>,
    pub assistant_id: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionOpened {
    pub thread_id: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BotMessageRequest {
    pub text: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BotReply {
    pub thread_id: String,
    pub run_id: String,
    pub text: String,
}

impl From<Reply> for BotReply {
    fn from(reply: Reply) -> Self {
        Self {
            thread_id: reply.thread_id,
            run_id: reply.run_id,
            text: reply.text,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/bots",
    tag = "Bots",
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Bots owned by the user", body = BotsResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_bots(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<BotsResponse>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;

    let bots = state.bots().list(user.id).await?;
    Ok(Json(BotsResponse {
        bots: bots.into_iter().map(BotResponse::from).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/bots",
    tag = "Bots",
    security(("bearerAuth" = [])),
    request_body = CreateBotRequest,
    responses(
        (status = 201, description = "Bot created", body = BotResponse),
        (status = 400, description = "Missing field", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_bot(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateBotRequest>,
) -> Result<(StatusCode, Json<BotResponse>), ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;

    let bot = state
        .bots()
        .create(
            user.id,
            &CreateBot {
                name: payload.name,
                assistant_id: payload.assistant_id,
                api_key: payload.api_key,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(bot.into())))
}

#[utoipa::path(
    get,
    path = "/api/bots/{bot_id}",
    tag = "Bots",
    security(("bearerAuth" = [])),
    params(("bot_id" = String, Path, description = "Bot public id")),
    responses(
        (status = 200, description = "Bot", body = BotResponse),
        (status = 404, description = "Bot not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_bot(
    State(state): State<AppState>,
    Path(bot_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<BotResponse>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;

    Ok(Json(state.bots().find(user.id, &bot_id).await?.into()))
}

#[utoipa::path(
    put,
    path = "/api/bots/{bot_id}",
    tag = "Bots",
    security(("bearerAuth" = [])),
    params(("bot_id" = String, Path, description = "Bot public id")),
    request_body = UpdateBotRequest,
    responses(
        (status = 200, description = "Bot updated", body = BotResponse),
        (status = 400, description = "Blank field", body = crate::error::ErrorResponse),
        (status = 404, description = "Bot not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_bot(
    State(state): State<AppState>,
    Path(bot_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<UpdateBotRequest>,
) -> Result<Json<BotResponse>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;

    let bot = state
        .bots()
        .update(
            user.id,
            &bot_id,
            &UpdateBot {
                name: payload.name,
                assistant_id: payload.assistant_id,
                api_key: payload.api_key,
            },
        )
        .await?;
    Ok(Json(bot.into()))
}

#[utoipa::path(
    delete,
    path = "/api/bots/{bot_id}",
    tag = "Bots",
    security(("bearerAuth" = [])),
    params(("bot_id" = String, Path, description = "Bot public id")),
    responses(
        (status = 204, description = "Bot deleted"),
        (status = 404, description = "Bot not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_bot(
    State(state): State<AppState>,
    Path(bot_id): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;

    state.bots().delete(user.id, &bot_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/bots/{bot_id}/sessions",
    tag = "Bots",
    security(("bearerAuth" = [])),
    params(("bot_id" = String, Path, description = "Bot public id")),
    responses(
        (status = 201, description = "Assistant thread opened", body = SessionOpened),
        (status = 404, description = "Bot not found", body = crate::error::ErrorResponse),
        (status = 502, description = "Assistant request failed", body = crate::error::ErrorResponse)
    )
)]
pub async fn open_session(
    State(state): State<AppState>,
    Path(bot_id): Path<String>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<SessionOpened>), ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;

    let bot = state.bots().find(user.id, &bot_id).await?;
    let thread = state.assistant_for(&bot)?.create_thread().await?;
    info!(bot = %bot.public_id, thread = %thread.id, "bot session opened");
    Ok((
        StatusCode::CREATED,
        Json(SessionOpened {
            thread_id: thread.id,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/bots/{bot_id}/sessions/{thread_id}/messages",
    tag = "Bots",
    security(("bearerAuth" = [])),
    params(
        ("bot_id" = String, Path, description = "Bot public id"),
        ("thread_id" = String, Path, description = "Assistant thread id")
    ),
    request_body = BotMessageRequest,
    responses(
        (status = 200, description = "Assistant reply", body = BotReply),
        (status = 400, description = "Empty text", body = crate::error::ErrorResponse),
        (status = 404, description = "Bot not found", body = crate::error::ErrorResponse),
        (status = 502, description = "Assistant request failed", body = crate::error::ErrorResponse)
    )
)]
pub async fn send_bot_message(
    State(state): State<AppState>,
    Path((bot_id, thread_id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(payload): Json<BotMessageRequest>,
) -> Result<Json<BotReply>, ApiError> {
    let token = require_bearer(&headers)?;
    let (user, _) = state.authenticate(&token).await?;
    let text = require_text("text", &payload.text)?;

    let bot = state.bots().find(user.id, &bot_id).await?;
    let reply = state
        .assistant_for(&bot)?
        .ask(&bot.assistant_id, Some(&thread_id), text)
        .await?;
    Ok(Json(reply.into()))
}
