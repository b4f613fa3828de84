//! Authentication and authorization module.
//!
//! This module provides:
//! - JWT token creation and verification
//! - Authentication middleware for protected routes
//! - Role-based authorization guards
//!
//! # Example
//!
//! ```ignore
//! use axum_helpers::auth::{JwtAuth, JwtConfig, jwt_auth_middleware, require_admin};
//! use core_config::FromEnv;
//!
//! // Load config and create auth instance
//! let config = JwtConfig::from_env()?;
//! let auth = JwtAuth::new(&config);
//!
//! // Protect routes with JWT middleware and a role guard
//! let protected = Router::new()
//!     .route("/api/admin", get(handler))
//!     .route_layer(axum::middleware::from_fn(require_admin))
//!     .layer(axum::middleware::from_fn_with_state(auth, jwt_auth_middleware));
//! ```

pub mod config;
pub mod jwt;
pub mod middleware;

// Re-export commonly used types
pub use config::JwtConfig;
pub use jwt::{JwtAuth, JwtClaims, TokenError, TOKEN_TTL};
pub use middleware::{
    jwt_auth_middleware, require_admin, require_owner_or_admin, require_store_or_admin,
    CurrentUser,
};
