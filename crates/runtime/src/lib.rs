use anyhow::{Context, Result};
use dailink_auth::Authenticator;
use dailink_config::{AppConfig, AssistantConfig, HscConfig};
use dailink_database::initialize_database;
use dailink_unipile::{UnipileClient, UnipileError};
use sqlx::SqlitePool;
use tracing::{info, warn};

pub mod telemetry {
    use anyhow::Result;
    use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

    pub fn init_tracing() -> Result<()> {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let subscriber = SubscriberBuilder::default()
            .with_env_filter(env_filter)
            .with_target(true)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|error| anyhow::anyhow!("failed to set tracing subscriber: {error}"))
    }
}

/// Everything the HTTP layer and the CLI commands share.
#[derive(Clone)]
pub struct BackendServices {
    pub db_pool: SqlitePool,
    pub authenticator: Authenticator,
    /// `None` when no Unipile key is configured; LinkedIn routes answer 503.
    pub unipile: Option<UnipileClient>,
    pub assistant: AssistantConfig,
    pub hsc: HscConfig,
}

impl BackendServices {
    pub async fn initialise(config: &AppConfig) -> Result<Self> {
        let db_pool = initialize_database(&config.database)
            .await
            .context("failed to initialise database")?;

        let authenticator = Authenticator::new(db_pool.clone(), config.auth.clone());

        let unipile = match UnipileClient::new(&config.unipile) {
            Ok(client) => {
                info!(base_url = %config.unipile.base_url, "unipile client ready");
                Some(client)
            }
            Err(UnipileError::MissingApiKey) => {
                warn!("UNIPILE_API_KEY is not set, LinkedIn features are disabled");
                None
            }
            Err(error) => return Err(error).context("failed to build unipile client"),
        };

        Ok(Self {
            db_pool,
            authenticator,
            unipile,
            assistant: config.assistant.clone(),
            hsc: config.hsc.clone(),
        })
    }
}

pub async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(?error, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received");
}
