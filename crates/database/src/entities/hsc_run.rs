//! Haystacks Champion (HSC) run entities

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Saved-search filter references, keyed by Unipile search parameter
/// (`location`, `industry`, ...), each holding the referenced ids.
pub type SearchFilters = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HscRun {
    #[serde(skip_serializing)]
    pub id: i64,
    pub public_id: String,
    #[serde(skip_serializing)]
    pub user_id: i64,
    pub account_id: String,
    pub name: String,
    pub stage: HscStage,
    pub progress: i64,
    pub keywords: Option<String>,
    pub search_url: Option<String>,
    #[schema(value_type = Object)]
    pub filters: SearchFilters,
    pub champion_keywords: Vec<String>,
    pub cursor: Option<String>,
    pub pages_processed: i64,
    /// Bumped by every start; a runner only writes while it holds the
    /// current epoch.
    #[serde(skip_serializing, default)]
    pub run_epoch: i64,
    pub last_error: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "TEXT", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum HscStage {
    #[default]
    PreparingRun,
    Running,
    Stopped,
    Completed,
}

impl HscStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            HscStage::PreparingRun => "preparing-run",
            HscStage::Running => "running",
            HscStage::Stopped => "stopped",
            HscStage::Completed => "completed",
        }
    }

    /// Stages a run may move to from `self`.
    pub fn next_stages(&self) -> &'static [HscStage] {
        match self {
            HscStage::PreparingRun => &[HscStage::Running],
            HscStage::Running => &[HscStage::Stopped, HscStage::Completed],
            HscStage::Stopped => &[HscStage::Running],
            HscStage::Completed => &[],
        }
    }

    pub fn can_transition_to(&self, next: HscStage) -> bool {
        self.next_stages().contains(&next)
    }

    /// Stages from which `target` is reachable in one step.
    pub fn sources_of(target: HscStage) -> Vec<HscStage> {
        [
            HscStage::PreparingRun,
            HscStage::Running,
            HscStage::Stopped,
            HscStage::Completed,
        ]
        .into_iter()
        .filter(|stage| stage.can_transition_to(target))
        .collect()
    }
}

impl std::fmt::Display for HscStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw row; JSON columns are decoded in the repository.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct HscRunRow {
    pub id: i64,
    pub public_id: String,
    pub user_id: i64,
    pub account_id: String,
    pub name: String,
    pub stage: HscStage,
    pub progress: i64,
    pub keywords: Option<String>,
    pub search_url: Option<String>,
    pub filters: String,
    pub champion_keywords: String,
    pub cursor: Option<String>,
    pub pages_processed: i64,
    pub run_epoch: i64,
    pub last_error: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateHscRun {
    pub account_id: String,
    pub name: String,
    pub keywords: Option<String>,
    pub search_url: Option<String>,
    pub filters: SearchFilters,
    pub champion_keywords: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateHscRun {
    pub name: Option<String>,
    pub keywords: Option<String>,
    pub search_url: Option<String>,
    pub filters: Option<SearchFilters>,
    pub champion_keywords: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct HscRunItem {
    #[serde(skip_serializing)]
    pub id: i64,
    #[serde(skip_serializing)]
    pub run_id: i64,
    pub linkedin_id: String,
    pub public_identifier: Option<String>,
    pub name: String,
    pub headline: Option<String>,
    pub is_champion: bool,
    pub status: HscItemStatus,
    pub error: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum HscItemStatus {
    Analyzed,
    Error,
}

impl HscItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HscItemStatus::Analyzed => "analyzed",
            HscItemStatus::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewHscRunItem {
    pub linkedin_id: String,
    pub public_identifier: Option<String>,
    pub name: String,
    pub headline: Option<String>,
    pub is_champion: bool,
    pub status: HscItemStatus,
    pub error: Option<String>,
}
