//! Domain entities for the database layer

pub mod bot;
pub mod campaign;
pub mod crm;
pub mod hsc_run;
pub mod linkedin_account;
pub mod user;

pub use bot::{mask_secret, CreateBot, DaininBot, UpdateBot};
pub use campaign::{
    Campaign, CampaignAction, CampaignLog, CampaignStats, CampaignStatus, CreateCampaign,
    LogStatus, NewCampaignLog, UpdateCampaign,
};
pub use crm::{
    CrmCompany, CrmList, CrmListKind, CrmProfile, InsertSummary, NewCrmCompany, NewCrmProfile,
};
pub use hsc_run::{
    CreateHscRun, HscItemStatus, HscRun, HscRunItem, HscStage, NewHscRunItem, SearchFilters,
    UpdateHscRun,
};
pub use linkedin_account::{LinkedInAccount, UpsertLinkedInAccount};
pub use user::{User, UserRole};
