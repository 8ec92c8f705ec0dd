//! Campaign and campaign log entities

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Campaign {
    #[serde(skip_serializing)]
    pub id: i64,
    pub public_id: String,
    #[serde(skip_serializing)]
    pub user_id: i64,
    pub account_id: String,
    pub name: String,
    pub status: CampaignStatus,
    #[serde(skip_serializing)]
    pub crm_list_id: Option<i64>,
    /// Public id of the attached CRM list, resolved by the repository.
    pub crm_list: Option<String>,
    pub message_template: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    #[default]
    Draft,
    Active,
    Paused,
    Completed,
}

impl CampaignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Draft => "draft",
            CampaignStatus::Active => "active",
            CampaignStatus::Paused => "paused",
            CampaignStatus::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CampaignLog {
    pub id: i64,
    #[serde(skip_serializing)]
    pub campaign_id: i64,
    pub target_id: String,
    pub action: CampaignAction,
    pub status: LogStatus,
    pub detail: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CampaignAction {
    InvitationSent,
    MessageSent,
    ReplyReceived,
    ProfileViewed,
}

impl CampaignAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignAction::InvitationSent => "invitation_sent",
            CampaignAction::MessageSent => "message_sent",
            CampaignAction::ReplyReceived => "reply_received",
            CampaignAction::ProfileViewed => "profile_viewed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LogStatus {
    Success,
    Error,
}

impl LogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogStatus::Success => "success",
            LogStatus::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCampaign {
    pub account_id: String,
    pub name: String,
    pub crm_list_id: Option<i64>,
    pub message_template: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCampaign {
    pub name: Option<String>,
    pub crm_list_id: Option<i64>,
    pub message_template: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewCampaignLog {
    pub target_id: String,
    pub action: CampaignAction,
    pub status: LogStatus,
    pub detail: Option<String>,
}

/// Per-action counters for one campaign or for a whole dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CampaignStats {
    pub invitations_sent: i64,
    pub messages_sent: i64,
    pub replies: i64,
    pub profiles_viewed: i64,
    pub errors: i64,
}
