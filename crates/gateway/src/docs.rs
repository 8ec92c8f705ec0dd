use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(title = "DAILINK API", description = "LinkedIn outreach backend"),
    paths(
        crate::routes::health::health_check,
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::auth::me,
        crate::routes::admin::list_users,
        crate::routes::admin::update_role,
        crate::routes::admin::delete_user,
        crate::routes::me::get_selected_account,
        crate::routes::me::set_selected_account,
        crate::routes::accounts::list_accounts,
        crate::routes::accounts::connect_account,
        crate::routes::accounts::solve_checkpoint,
        crate::routes::accounts::sync_accounts,
        crate::routes::accounts::delete_account,
        crate::routes::messaging::list_chats,
        crate::routes::messaging::start_chat,
        crate::routes::messaging::list_messages,
        crate::routes::messaging::send_message,
        crate::routes::search::search,
        crate::routes::search::get_profile,
        crate::routes::search::list_profile_posts,
        crate::routes::search::send_invitation,
        crate::routes::search::get_post,
        crate::routes::search::comment_post,
        crate::routes::search::react_post,
        crate::routes::crm::list_lists,
        crate::routes::crm::create_list,
        crate::routes::crm::get_list,
        crate::routes::crm::rename_list,
        crate::routes::crm::delete_list,
        crate::routes::crm::list_profiles,
        crate::routes::crm::add_profiles,
        crate::routes::crm::remove_profile,
        crate::routes::crm::transfer_profiles,
        crate::routes::crm::list_companies,
        crate::routes::crm::add_companies,
        crate::routes::crm::remove_company,
        crate::routes::campaigns::list_campaigns,
        crate::routes::campaigns::create_campaign,
        crate::routes::campaigns::get_campaign,
        crate::routes::campaigns::update_campaign,
        crate::routes::campaigns::update_status,
        crate::routes::campaigns::delete_campaign,
        crate::routes::campaigns::list_logs,
        crate::routes::campaigns::append_log,
        crate::routes::campaigns::campaign_stats,
        crate::routes::dashboard::dashboard_stats,
        crate::routes::hsc::list_runs,
        crate::routes::hsc::create_run,
        crate::routes::hsc::get_run,
        crate::routes::hsc::update_run,
        crate::routes::hsc::delete_run,
        crate::routes::hsc::start_run,
        crate::routes::hsc::stop_run,
        crate::routes::hsc::list_items,
        crate::routes::hsc::export_items,
        crate::routes::bots::list_bots,
        crate::routes::bots::create_bot,
        crate::routes::bots::get_bot,
        crate::routes::bots::update_bot,
        crate::routes::bots::delete_bot,
        crate::routes::bots::open_session,
        crate::routes::bots::send_bot_message
    ),
    components(
        schemas(
            crate::error::ErrorResponse,
            crate::routes::health::HealthResponse,
            crate::routes::auth::RegisterRequest,
            crate::routes::auth::LoginRequest,
            crate::routes::auth::SessionResponse,
            crate::routes::auth::UserResponse,
            crate::routes::admin::UsersResponse,
            crate::routes::admin::UpdateRoleRequest,
            crate::routes::me::SelectedAccountResponse,
            crate::routes::me::SelectAccountRequest,
            crate::routes::accounts::AccountsResponse,
            crate::routes::accounts::ConnectRequest,
            crate::routes::accounts::CheckpointRequest,
            crate::routes::accounts::ConnectResponse,
            crate::services::accounts::CombinedLinkedInAccount,
            crate::services::accounts::SourceStatus,
            crate::services::accounts::SyncSummary,
            crate::routes::messaging::SendMessageRequest,
            crate::routes::messaging::StartChatRequest,
            crate::routes::search::SearchRequest,
            crate::routes::search::InvitationRequest,
            crate::routes::search::CommentRequest,
            crate::routes::search::ReactionRequest,
            crate::routes::search::ActionResponse,
            crate::routes::crm::ListsResponse,
            crate::routes::crm::CreateListRequest,
            crate::routes::crm::RenameListRequest,
            crate::routes::crm::ProfilesResponse,
            crate::routes::crm::CompaniesResponse,
            crate::routes::crm::AddProfilesRequest,
            crate::routes::crm::AddCompaniesRequest,
            crate::routes::crm::TransferRequest,
            crate::routes::campaigns::CampaignsResponse,
            crate::routes::campaigns::CreateCampaignRequest,
            crate::routes::campaigns::UpdateCampaignRequest,
            crate::routes::campaigns::UpdateStatusRequest,
            crate::routes::campaigns::LogsResponse,
            crate::routes::dashboard::DashboardStats,
            crate::routes::hsc::RunsResponse,
            crate::routes::hsc::CreateRunRequest,
            crate::routes::hsc::UpdateRunRequest,
            crate::routes::hsc::ItemsResponse,
            crate::routes::hsc::ExportRequest,
            crate::routes::bots::BotResponse,
            crate::routes::bots::BotsResponse,
            crate::routes::bots::CreateBotRequest,
            crate::routes::bots::UpdateBotRequest,
            crate::routes::bots::SessionOpened,
            crate::routes::bots::BotMessageRequest,
            crate::routes::bots::BotReply,
            dailink_database::User,
            dailink_database::UserRole,
            dailink_database::CrmList,
            dailink_database::CrmListKind,
            dailink_database::CrmProfile,
            dailink_database::CrmCompany,
            dailink_database::NewCrmProfile,
            dailink_database::NewCrmCompany,
            dailink_database::InsertSummary,
            dailink_database::TransferMode,
            dailink_database::Campaign,
            dailink_database::CampaignStatus,
            dailink_database::CampaignLog,
            dailink_database::CampaignAction,
            dailink_database::LogStatus,
            dailink_database::NewCampaignLog,
            dailink_database::CampaignStats,
            dailink_database::HscRun,
            dailink_database::HscStage,
            dailink_database::HscRunItem,
            dailink_database::HscItemStatus
        )
    ),
    tags(
        (name = "Health", description = "Service health endpoints"),
        (name = "Auth", description = "Registration, login and sessions"),
        (name = "Admin", description = "User and role administration"),
        (name = "Me", description = "Per-user preferences"),
        (name = "Accounts", description = "Connected LinkedIn accounts"),
        (name = "Messaging", description = "LinkedIn chats and messages"),
        (name = "Search", description = "Search, profiles, invitations and posts"),
        (name = "CRM", description = "Lead lists of people and companies"),
        (name = "Campaigns", description = "Outreach campaigns and their logs"),
        (name = "Dashboard", description = "Aggregated outreach statistics"),
        (name = "HSC", description = "Haystacks Champion search runs"),
        (name = "Bots", description = "DaininBot assistant sessions")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        let schemes = &mut components.security_schemes;

        let mut scheme = SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer));
        if let SecurityScheme::Http(http) = &mut scheme {
            http.bearer_format = Some("Bearer".to_string());
        }

        schemes.insert("bearerAuth".to_string(), scheme);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_registers_bearer_scheme_and_hsc_paths() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearerAuth"));
        assert!(doc.paths.paths.contains_key("/api/hsc-runs/{run_id}/start"));
        assert!(doc.paths.paths.contains_key("/api/crm/lists/{list_id}/profiles/transfer"));
    }
}
