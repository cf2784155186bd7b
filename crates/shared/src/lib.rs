//! Shared types, errors, and configuration for the petty-cash back office.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for company/branch/user references
//! - Pagination types for list endpoints
//! - Application-wide error types
//! - Configuration management
//! - Request identity (JWT claims) and token validation

pub mod auth;
pub mod config;
pub mod error;
pub mod jwt;
pub mod types;

#[cfg(test)]
mod jwt_tests;

pub use auth::Claims;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use jwt::{JwtConfig, JwtError, JwtService};
