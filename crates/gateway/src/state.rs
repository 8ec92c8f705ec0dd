use dailink_assistant::AssistantClient;
use dailink_auth::{AuthSession, Authenticator};
use dailink_config::{AssistantConfig, HscConfig};
use dailink_database::{
    BotRepository, CampaignRepository, CrmRepository, DatabaseError, DaininBot,
    HscRunRepository, LinkedInAccount, LinkedInAccountRepository, User, UserRepository,
};
use dailink_unipile::UnipileClient;
use sqlx::SqlitePool;

use crate::services::hsc::HscRunner;
use crate::ApiError;

#[derive(Clone)]
pub struct AppState {
    db_pool: SqlitePool,
    authenticator: Authenticator,
    unipile: Option<UnipileClient>,
    assistant: AssistantConfig,
    hsc: HscConfig,
    users: UserRepository,
    accounts: LinkedInAccountRepository,
    crm: CrmRepository,
    campaigns: CampaignRepository,
    bots: BotRepository,
    hsc_runs: HscRunRepository,
}

impl AppState {
    pub fn new(
        db_pool: SqlitePool,
        authenticator: Authenticator,
        unipile: Option<UnipileClient>,
        assistant: AssistantConfig,
        hsc: HscConfig,
    ) -> Self {
        Self {
            users: UserRepository::new(db_pool.clone()),
            accounts: LinkedInAccountRepository::new(db_pool.clone()),
            crm: CrmRepository::new(db_pool.clone()),
            campaigns: CampaignRepository::new(db_pool.clone()),
            bots: BotRepository::new(db_pool.clone()),
            hsc_runs: HscRunRepository::new(db_pool.clone()),
            db_pool,
            authenticator,
            unipile,
            assistant,
            hsc,
        }
    }

    pub fn db_pool(&self) -> &SqlitePool {
        &self.db_pool
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    pub fn users(&self) -> &UserRepository {
        &self.users
    }

    pub fn accounts(&self) -> &LinkedInAccountRepository {
        &self.accounts
    }

    pub fn crm(&self) -> &CrmRepository {
        &self.crm
    }

    pub fn campaigns(&self) -> &CampaignRepository {
        &self.campaigns
    }

    pub fn bots(&self) -> &BotRepository {
        &self.bots
    }

    pub fn hsc_runs(&self) -> &HscRunRepository {
        &self.hsc_runs
    }

    /// The Unipile client, or 503 when no API key was configured.
    pub fn unipile(&self) -> Result<&UnipileClient, ApiError> {
        self.unipile
            .as_ref()
            .ok_or_else(|| ApiError::service_unavailable("LinkedIn integration is not configured"))
    }

    pub fn assistant_for(&self, bot: &DaininBot) -> Result<AssistantClient, ApiError> {
        Ok(AssistantClient::new(&self.assistant, &bot.api_key)?)
    }

    pub fn hsc_runner(&self) -> Result<HscRunner, ApiError> {
        Ok(HscRunner::new(
            self.hsc_runs.clone(),
            self.unipile()?.clone(),
            self.hsc.clone(),
        ))
    }

    pub async fn authenticate(&self, token: &str) -> Result<(User, AuthSession), ApiError> {
        self.authenticator
            .authenticate_token(token)
            .await
            .map_err(ApiError::from)
    }

    /// Mirror row for `account_id` if `user` may act on it. Accounts owned
    /// by someone else read as not found unless the user is an admin.
    pub async fn require_account(
        &self,
        user: &User,
        account_id: &str,
    ) -> Result<LinkedInAccount, ApiError> {
        match self.accounts.find(account_id).await {
            Ok(account) if account.user_id == user.id || user.is_admin() => Ok(account),
            Ok(_) | Err(DatabaseError::NotFound(_)) => {
                Err(ApiError::not_found("linkedin account not found"))
            }
            Err(err) => Err(err.into()),
        }
    }
}
