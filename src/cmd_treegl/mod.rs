pub mod build;
pub mod layout;
pub mod stat;
