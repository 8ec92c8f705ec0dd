mod error;
mod middleware;
mod state;
mod util;

pub mod docs;
pub mod routes;
pub mod services;

pub use error::{ApiError, ErrorResponse};
pub use state::AppState;

use axum::{
    http::header::{AUTHORIZATION, CONTENT_TYPE},
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::docs::ApiDoc;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health::health_check))
        // Auth routes
        .route("/api/auth/register", post(routes::auth::register))
        .route("/api/auth/login", post(routes::auth::login))
        .route("/api/auth/logout", post(routes::auth::logout))
        .route("/api/auth/me", get(routes::auth::me))
        // Admin routes
        .route("/api/admin/users", get(routes::admin::list_users))
        .route(
            "/api/admin/users/:user_id/role",
            put(routes::admin::update_role),
        )
        .route(
            "/api/admin/users/:user_id",
            delete(routes::admin::delete_user),
        )
        // Current user
        .route(
            "/api/me/selected-account",
            get(routes::me::get_selected_account),
        )
        .route(
            "/api/me/selected-account",
            put(routes::me::set_selected_account),
        )
        // LinkedIn accounts
        .route("/api/accounts", get(routes::accounts::list_accounts))
        .route(
            "/api/accounts/connect",
            post(routes::accounts::connect_account),
        )
        .route(
            "/api/accounts/checkpoint",
            post(routes::accounts::solve_checkpoint),
        )
        .route("/api/accounts/sync", post(routes::accounts::sync_accounts))
        .route(
            "/api/accounts/:account_id",
            delete(routes::accounts::delete_account),
        )
        // Messaging
        .route(
            "/api/accounts/:account_id/chats",
            get(routes::messaging::list_chats),
        )
        .route(
            "/api/accounts/:account_id/chats",
            post(routes::messaging::start_chat),
        )
        .route(
            "/api/chats/:chat_id/messages",
            get(routes::messaging::list_messages),
        )
        .route(
            "/api/chats/:chat_id/messages",
            post(routes::messaging::send_message),
        )
        // Search, profiles and posts
        .route(
            "/api/accounts/:account_id/search",
            post(routes::search::search),
        )
        .route(
            "/api/accounts/:account_id/profiles/:identifier",
            get(routes::search::get_profile),
        )
        .route(
            "/api/accounts/:account_id/profiles/:identifier/posts",
            get(routes::search::list_profile_posts),
        )
        .route(
            "/api/accounts/:account_id/invitations",
            post(routes::search::send_invitation),
        )
        .route(
            "/api/accounts/:account_id/posts/:post_id",
            get(routes::search::get_post),
        )
        .route(
            "/api/accounts/:account_id/posts/:post_id/comments",
            post(routes::search::comment_post),
        )
        .route(
            "/api/accounts/:account_id/posts/:post_id/reactions",
            post(routes::search::react_post),
        )
        // CRM lists
        .route("/api/crm/lists", get(routes::crm::list_lists))
        .route("/api/crm/lists", post(routes::crm::create_list))
        .route("/api/crm/lists/:list_id", get(routes::crm::get_list))
        .route("/api/crm/lists/:list_id", put(routes::crm::rename_list))
        .route("/api/crm/lists/:list_id", delete(routes::crm::delete_list))
        .route(
            "/api/crm/lists/:list_id/profiles",
            get(routes::crm::list_profiles),
        )
        .route(
            "/api/crm/lists/:list_id/profiles",
            post(routes::crm::add_profiles),
        )
        .route(
            "/api/crm/lists/:list_id/profiles/transfer",
            post(routes::crm::transfer_profiles),
        )
        .route(
            "/api/crm/lists/:list_id/profiles/:linkedin_id",
            delete(routes::crm::remove_profile),
        )
        .route(
            "/api/crm/lists/:list_id/companies",
            get(routes::crm::list_companies),
        )
        .route(
            "/api/crm/lists/:list_id/companies",
            post(routes::crm::add_companies),
        )
        .route(
            "/api/crm/lists/:list_id/companies/:linkedin_id",
            delete(routes::crm::remove_company),
        )
        // Campaigns
        .route("/api/campaigns", get(routes::campaigns::list_campaigns))
        .route("/api/campaigns", post(routes::campaigns::create_campaign))
        .route(
            "/api/campaigns/:campaign_id",
            get(routes::campaigns::get_campaign),
        )
        .route(
            "/api/campaigns/:campaign_id",
            put(routes::campaigns::update_campaign),
        )
        .route(
            "/api/campaigns/:campaign_id",
            delete(routes::campaigns::delete_campaign),
        )
        .route(
            "/api/campaigns/:campaign_id/status",
            put(routes::campaigns::update_status),
        )
        .route(
            "/api/campaigns/:campaign_id/logs",
            get(routes::campaigns::list_logs),
        )
        .route(
            "/api/campaigns/:campaign_id/logs",
            post(routes::campaigns::append_log),
        )
        .route(
            "/api/campaigns/:campaign_id/stats",
            get(routes::campaigns::campaign_stats),
        )
        .route(
            "/api/dashboard/stats",
            get(routes::dashboard::dashboard_stats),
        )
        // HSC runs
        .route("/api/hsc-runs", get(routes::hsc::list_runs))
        .route("/api/hsc-runs", post(routes::hsc::create_run))
        .route("/api/hsc-runs/:run_id", get(routes::hsc::get_run))
        .route("/api/hsc-runs/:run_id", put(routes::hsc::update_run))
        .route("/api/hsc-runs/:run_id", delete(routes::hsc::delete_run))
        .route("/api/hsc-runs/:run_id/start", post(routes::hsc::start_run))
        .route("/api/hsc-runs/:run_id/stop", post(routes::hsc::stop_run))
        .route("/api/hsc-runs/:run_id/items", get(routes::hsc::list_items))
        .route(
            "/api/hsc-runs/:run_id/export",
            post(routes::hsc::export_items),
        )
        // DaininBot
        .route("/api/bots", get(routes::bots::list_bots))
        .route("/api/bots", post(routes::bots::create_bot))
        .route("/api/bots/:bot_id", get(routes::bots::get_bot))
        .route("/api/bots/:bot_id", put(routes::bots::update_bot))
        .route("/api/bots/:bot_id", delete(routes::bots::delete_bot))
        .route(
            "/api/bots/:bot_id/sessions",
            post(routes::bots::open_session),
        )
        .route(
            "/api/bots/:bot_id/sessions/:thread_id/messages",
            post(routes::bots::send_bot_message),
        )
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(axum::middleware::from_fn(middleware::logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
}
