//! Database repository implementations

pub mod bot_repository;
pub mod campaign_repository;
pub mod crm_repository;
pub mod hsc_run_repository;
pub mod linkedin_account_repository;
pub mod user_repository;

pub use bot_repository::BotRepository;
pub use campaign_repository::CampaignRepository;
pub use crm_repository::{CrmRepository, TransferMode};
pub use hsc_run_repository::HscRunRepository;
pub use linkedin_account_repository::LinkedInAccountRepository;
pub use user_repository::UserRepository;
