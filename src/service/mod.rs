pub mod error;
pub mod escrow_service;
pub mod payment_provider;
