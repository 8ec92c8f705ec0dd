//! Wire types for the Unipile REST API.
//!
//! Only the fields the backend acts on are typed; everything else Unipile
//! returns is kept in `extra` and passed through untouched.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const LINKEDIN_PROVIDER: &str = "LINKEDIN";

const RESERVED_SEARCH_KEYS: &[&str] = &["api", "category", "keywords", "url"];

/// One page of a cursor-paginated listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default, deserialize_with = "cursor_string")]
    pub cursor: Option<String>,
}

pub type SearchPage = Page<SearchItem>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub provider: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub sources: Vec<AccountSource>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSource {
    pub id: String,
    pub status: String,
}

impl Account {
    /// First non-`OK` source status, or `OK` when every source is healthy.
    pub fn status(&self) -> String {
        self.sources
            .iter()
            .find(|source| !source.status.eq_ignore_ascii_case("OK"))
            .map(|source| source.status.clone())
            .unwrap_or_else(|| "OK".to_string())
    }
}

/// Result of connecting an account or answering one of its checkpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConnectOutcome {
    Connected {
        account_id: String,
    },
    Checkpoint {
        account_id: String,
        checkpoint_type: String,
    },
}

impl ConnectOutcome {
    pub fn account_id(&self) -> &str {
        match self {
            ConnectOutcome::Connected { account_id }
            | ConnectOutcome::Checkpoint { account_id, .. } => account_id,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "object")]
pub(crate) enum ConnectResponse {
    AccountCreated {
        account_id: String,
    },
    AccountReconnected {
        account_id: String,
    },
    Checkpoint {
        account_id: String,
        checkpoint: CheckpointInfo,
    },
}

#[derive(Debug, Deserialize)]
pub(crate) struct CheckpointInfo {
    #[serde(rename = "type")]
    pub kind: String,
}

impl From<ConnectResponse> for ConnectOutcome {
    fn from(response: ConnectResponse) -> Self {
        match response {
            ConnectResponse::AccountCreated { account_id }
            | ConnectResponse::AccountReconnected { account_id } => {
                ConnectOutcome::Connected { account_id }
            }
            ConnectResponse::Checkpoint {
                account_id,
                checkpoint,
            } => ConnectOutcome::Checkpoint {
                account_id,
                checkpoint_type: checkpoint.kind,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    pub id: String,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub unread_count: Option<i64>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    #[serde(default)]
    pub chat_id: Option<String>,
    #[serde(default)]
    pub sender_id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageSent {
    #[serde(default)]
    pub message_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatStarted {
    pub chat_id: String,
    #[serde(default)]
    pub message_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub provider_id: String,
    #[serde(default)]
    pub public_identifier: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserProfile {
    pub fn display_name(&self) -> String {
        [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvitationSent {
    #[serde(default)]
    pub invitation_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    #[serde(default)]
    pub social_id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A people or company hit from a LinkedIn search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchItem {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub public_identifier: Option<String>,
    #[serde(default)]
    pub profile_url: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SearchItem {
    /// Identifier accepted by `GET /users/{identifier}`.
    pub fn profile_identifier(&self) -> &str {
        self.public_identifier.as_deref().unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchCategory {
    #[default]
    People,
    Companies,
    Posts,
    Jobs,
}

/// Search request body: a saved search URL or a classic keyword search
/// with parameter-id filters (`location`, `industry`, ...).
#[derive(Debug, Clone, PartialEq)]
pub enum SearchQuery {
    Url(String),
    Classic {
        category: SearchCategory,
        keywords: Option<String>,
        filters: BTreeMap<String, Vec<String>>,
    },
}

impl SearchQuery {
    pub(crate) fn to_body(&self) -> Value {
        match self {
            SearchQuery::Url(url) => serde_json::json!({ "url": url }),
            SearchQuery::Classic {
                category,
                keywords,
                filters,
            } => {
                let mut body = Map::new();
                body.insert("api".into(), Value::from("classic"));
                body.insert(
                    "category".into(),
                    serde_json::to_value(category).unwrap_or(Value::Null),
                );
                if let Some(keywords) = keywords.as_deref().map(str::trim) {
                    if !keywords.is_empty() {
                        body.insert("keywords".into(), Value::from(keywords));
                    }
                }
                for (key, ids) in filters {
                    if !ids.is_empty() && !RESERVED_SEARCH_KEYS.contains(&key.as_str()) {
                        body.insert(key.clone(), Value::from(ids.clone()));
                    }
                }
                Value::Object(body)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reaction {
    Like,
    Celebrate,
    Support,
    Love,
    Insightful,
    Funny,
}

/// Unipile sends cursors as strings, numbers or null depending on the endpoint.
fn cursor_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(cursor)) if !cursor.is_empty() => Some(cursor),
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}
