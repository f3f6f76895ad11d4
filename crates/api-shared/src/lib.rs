//! # API Shared
//!
//! Shared utilities and definitions for the clinic APIs.
//!
//! Contains:
//! - Request/response types with OpenAPI schemas (`dto` module)
//! - Shared services like `HealthService`
//! - Authentication utilities
//!
//! Used by `api-rest` and `clinic-run`.

pub mod auth;
pub mod dto;
pub mod health;

pub use dto::*;
pub use health::HealthService;
