pub mod auth;
pub mod catalog;
pub mod feed;
pub mod hires;
pub mod ledger;
pub mod mailer;
pub mod users;
