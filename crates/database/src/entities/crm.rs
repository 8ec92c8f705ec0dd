//! CRM list, profile and company entities

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CrmList {
    #[serde(skip_serializing)]
    pub id: i64,
    pub public_id: String,
    #[serde(skip_serializing)]
    pub user_id: i64,
    pub account_id: String,
    pub name: String,
    pub kind: CrmListKind,
    pub item_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CrmListKind {
    #[default]
    People,
    Companies,
}

impl CrmListKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CrmListKind::People => "people",
            CrmListKind::Companies => "companies",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CrmProfile {
    #[serde(skip_serializing)]
    pub id: i64,
    #[serde(skip_serializing)]
    pub list_id: i64,
    pub linkedin_id: String,
    pub public_identifier: Option<String>,
    pub name: String,
    pub headline: Option<String>,
    pub profile_url: Option<String>,
    pub added_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CrmCompany {
    #[serde(skip_serializing)]
    pub id: i64,
    #[serde(skip_serializing)]
    pub list_id: i64,
    pub linkedin_id: String,
    pub name: String,
    pub industry: Option<String>,
    pub company_url: Option<String>,
    pub added_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewCrmProfile {
    pub linkedin_id: String,
    pub public_identifier: Option<String>,
    pub name: String,
    pub headline: Option<String>,
    pub profile_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewCrmCompany {
    pub linkedin_id: String,
    pub name: String,
    pub industry: Option<String>,
    pub company_url: Option<String>,
}

/// Outcome of a de-duplicated batch insert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct InsertSummary {
    pub inserted: u64,
    pub skipped: u64,
}
