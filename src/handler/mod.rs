pub mod admin;
pub mod auth;
pub mod bids;
pub mod jobs;
pub mod messages;
pub mod payments;
pub mod reviews;
pub mod users;
