//! # API Shared
//!
//! Shared utilities and definitions for the Dr. Jira APIs.
//!
//! Contains:
//! - Request/response DTOs with OpenAPI schemas (`dto` module)
//! - Shared services like `HealthService`
//! - Authentication utilities for the webhook endpoint
//!
//! Used by `api-rest`; kept free of core business logic.

pub mod auth;
pub mod dto;
pub mod health;

pub use auth::{bearer_token, validate_api_key, AuthError};
pub use dto::*;
pub use health::HealthService;
