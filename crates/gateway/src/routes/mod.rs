pub mod accounts;
pub mod admin;
pub mod auth;
pub mod bots;
pub mod campaigns;
pub mod crm;
pub mod dashboard;
pub mod health;
pub mod hsc;
pub mod me;
pub mod messaging;
pub mod search;
