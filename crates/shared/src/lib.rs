//! Shared types, errors, and configuration for SubTrack.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for type-safe entity references
//! - Currency codes and money amounts with decimal precision
//! - Application-wide error types
//! - Configuration management
//! - Outbound collaborators: JWT validation, email transport, exchange-rate client
//! - Retry-with-backoff helper shared by all outbound calls

pub mod auth;
pub mod config;
pub mod email;
pub mod error;
pub mod jwt;
pub mod rates_client;
pub mod retry;
pub mod types;


pub use auth::{Claims, Role};
pub use config::AppConfig;
pub use email::{
    EmailError, EmailRequest, EmailSender, EmailService, TEMPLATE_RENEWAL_DIGEST,
    TEMPLATE_RENEWAL_REMINDER,
};
pub use error::{AppError, AppResult};
pub use jwt::{JwtError, JwtService};
pub use rates_client::{ExchangeRateClient, FetchedRate, RateClientError};
pub use retry::{RetryPolicy, retry_with_backoff};
