//! Local mirror of LinkedIn accounts connected through Unipile

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LinkedInAccount {
    #[serde(skip_serializing)]
    pub id: i64,
    /// Unipile account id.
    pub account_id: String,
    #[serde(skip_serializing)]
    pub user_id: i64,
    pub name: String,
    pub status: String,
    pub provider: String,
    pub created_at: String,
    pub synced_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertLinkedInAccount {
    pub account_id: String,
    pub user_id: i64,
    pub name: String,
    pub status: String,
    pub provider: String,
    pub created_at: String,
}
