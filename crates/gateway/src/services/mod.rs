//! Logic shared by several handlers or by the server binary.

pub mod accounts;
pub mod crm;
pub mod hsc;
