//! DaininBot credential sets

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Assistant id and API key pair used to open chat sessions against the
/// assistants API. Never serialized as-is; responses go through a masked view.
#[derive(Debug, Clone, PartialEq, Deserialize, FromRow)]
pub struct DaininBot {
    pub id: i64,
    pub public_id: String,
    pub user_id: i64,
    pub name: String,
    pub assistant_id: String,
    pub api_key: String,
    pub created_at: String,
    pub updated_at: String,
}

impl DaininBot {
    /// `sk-abcdef1234` becomes `sk-…1234`.
    pub fn masked_api_key(&self) -> String {
        mask_secret(&self.api_key)
    }
}

pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "…".to_string();
    }
    let head: String = chars[..3].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}…{tail}")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBot {
    pub name: String,
    pub assistant_id: String,
    pub api_key: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateBot {
    pub name: Option<String>,
    pub assistant_id: Option<String>,
    pub api_key: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_keeps_prefix_and_last_four() {
        assert_eq!(mask_secret("sk-proj-abcdef987654"), "sk-…7654");
    }

    #[test]
    fn mask_hides_short_secrets_entirely() {
        assert_eq!(mask_secret("short"), "…");
    }
}
