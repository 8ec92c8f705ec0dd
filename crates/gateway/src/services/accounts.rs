//! Merges Unipile account records with the local mirror.

use std::collections::HashMap;

use dailink_database::{
    DatabaseError, LinkedInAccount, LinkedInAccountRepository, UpsertLinkedInAccount, User,
};
use dailink_unipile::{Account, UnipileClient, UnipileError};
use serde::Serialize;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::{ApiError, AppState};

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SourceStatus {
    pub id: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CombinedLinkedInAccount {
    pub id: String,
    pub name: String,
    pub status: String,
    pub provider: String,
    pub created_at: String,
    /// Public id of the owning user.
    pub user_id: Option<String>,
    pub sources: Vec<SourceStatus>,
    pub synced_at: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct SyncSummary {
    pub updated: u64,
    pub missing: u64,
}

/// Upstream data wins for name and status; the mirror fills the gaps when
/// Unipile no longer knows the account.
pub fn combine(
    mirror: &LinkedInAccount,
    upstream: Option<&Account>,
    owner: Option<String>,
) -> CombinedLinkedInAccount {
    match upstream {
        Some(account) => CombinedLinkedInAccount {
            id: mirror.account_id.clone(),
            name: if account.name.trim().is_empty() {
                mirror.name.clone()
            } else {
                account.name.clone()
            },
            status: account.status(),
            provider: if account.provider.is_empty() {
                mirror.provider.clone()
            } else {
                account.provider.clone()
            },
            created_at: account
                .created_at
                .clone()
                .unwrap_or_else(|| mirror.created_at.clone()),
            user_id: owner,
            sources: account
                .sources
                .iter()
                .map(|source| SourceStatus {
                    id: source.id.clone(),
                    status: source.status.clone(),
                })
                .collect(),
            synced_at: mirror.synced_at.clone(),
        },
        None => CombinedLinkedInAccount {
            id: mirror.account_id.clone(),
            name: mirror.name.clone(),
            status: mirror.status.clone(),
            provider: mirror.provider.clone(),
            created_at: mirror.created_at.clone(),
            user_id: owner,
            sources: Vec::new(),
            synced_at: mirror.synced_at.clone(),
        },
    }
}

/// Accounts visible to `user`; admins see every mirrored account.
pub async fn list_combined(
    state: &AppState,
    user: &User,
) -> Result<Vec<CombinedLinkedInAccount>, ApiError> {
    let client = state.unipile()?;
    let mirrors = if user.is_admin() {
        state.accounts().list_all().await?
    } else {
        state.accounts().list_for_user(user.id).await?
    };

    let upstream: HashMap<String, Account> = client
        .list_accounts()
        .await?
        .items
        .into_iter()
        .map(|account| (account.id.clone(), account))
        .collect();

    let mut owners: HashMap<i64, Option<String>> = HashMap::new();
    let mut combined = Vec::with_capacity(mirrors.len());
    for mirror in &mirrors {
        if !owners.contains_key(&mirror.user_id) {
            let owner = match state.users().find_by_id(mirror.user_id).await {
                Ok(owner) => Some(owner.public_id),
                Err(DatabaseError::NotFound(_)) => None,
                Err(err) => return Err(err.into()),
            };
            owners.insert(mirror.user_id, owner);
        }
        let owner = owners.get(&mirror.user_id).cloned().flatten();
        combined.push(combine(mirror, upstream.get(&mirror.account_id), owner));
    }

    Ok(combined)
}

/// Mirrors a freshly connected account under `user`.
pub async fn mirror_connected(
    state: &AppState,
    user: &User,
    account_id: &str,
) -> Result<CombinedLinkedInAccount, ApiError> {
    let account = state.unipile()?.get_account(account_id).await?;
    let mirror = state
        .accounts()
        .upsert(&UpsertLinkedInAccount {
            account_id: account.id.clone(),
            user_id: user.id,
            name: account.name.clone(),
            status: account.status(),
            provider: account.provider.clone(),
            created_at: account
                .created_at
                .clone()
                .unwrap_or_else(|| chrono::Utc::now().to_rfc3339()),
        })
        .await?;

    if mirror.user_id != user.id {
        warn!(account_id, "connected account is already linked to another user");
        return Err(ApiError::conflict("account is linked to another user"));
    }

    info!(account_id, user = %user.public_id, "linkedin account mirrored");
    Ok(combine(&mirror, Some(&account), Some(user.public_id.clone())))
}

/// Refreshes name and status of mirror rows from Unipile. `owner` limits
/// the sync to one user's accounts.
pub async fn sync_mirror(
    accounts: &LinkedInAccountRepository,
    client: &UnipileClient,
    owner: Option<i64>,
) -> Result<SyncSummary, ApiError> {
    let mirrors = match owner {
        Some(user_id) => accounts.list_for_user(user_id).await?,
        None => accounts.list_all().await?,
    };
    let upstream: HashMap<String, Account> = client
        .list_accounts()
        .await?
        .items
        .into_iter()
        .map(|account| (account.id.clone(), account))
        .collect();

    let mut summary = SyncSummary::default();
    for mirror in &mirrors {
        match upstream.get(&mirror.account_id) {
            Some(account) => {
                let name = if account.name.trim().is_empty() {
                    mirror.name.as_str()
                } else {
                    account.name.as_str()
                };
                if accounts
                    .refresh(&mirror.account_id, name, &account.status())
                    .await?
                {
                    summary.updated += 1;
                }
            }
            None => {
                warn!(account_id = %mirror.account_id, "mirrored account missing upstream");
                summary.missing += 1;
            }
        }
    }

    info!(updated = summary.updated, missing = summary.missing, "account mirror synced");
    Ok(summary)
}

/// Deletes the account upstream and locally. An account Unipile already
/// forgot is still removed from the mirror.
pub async fn disconnect(state: &AppState, account: &LinkedInAccount) -> Result<(), ApiError> {
    match state.unipile()?.delete_account(&account.account_id).await {
        Ok(()) => {}
        Err(UnipileError::Api { status: 404, .. }) => {
            warn!(account_id = %account.account_id, "account already gone upstream");
        }
        Err(err) => return Err(err.into()),
    }

    state.accounts().delete(&account.account_id).await?;
    let cleared = state
        .users()
        .clear_selected_account(&account.account_id)
        .await?;
    info!(account_id = %account.account_id, cleared, "linkedin account disconnected");
    Ok(())
}
