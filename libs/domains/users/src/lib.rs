//! Users Domain
//!
//! Accounts, authentication, and user administration over MongoDB.
//! Registration and login issue JWTs; administration routes are guarded
//! by role middleware.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────┐
//! │  Handlers / Auth        │  ← HTTP endpoints, token issuance
//! └───────────┬─────────────┘
//!             │
//! ┌───────────▼─────────────┐
//! │   Service               │  ← Registration rules, argon2 hashing
//! └───────────┬─────────────┘
//!             │
//! ┌───────────▼─────────────┐
//! │ Repository              │  ← Trait + MongoDB and in-memory impls
//! └───────────┬─────────────┘
//!             │
//! ┌───────────▼─────────────┐
//! │   Models                │  ← Entities, DTOs, roles
//! └─────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use axum_helpers::{JwtAuth, JwtConfig};
//! use domain_users::{
//!     auth_handlers, handlers,
//!     mongodb::MongoUserRepository,
//!     service::UserService,
//! };
//! use mongodb::Client;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::with_uri_str("mongodb://localhost:27017").await?;
//! let db = client.database("marketplace");
//!
//! let repository = MongoUserRepository::new(&db);
//! let service = UserService::new(repository);
//!
//! let jwt_auth = JwtAuth::new(&JwtConfig::new("change-me-to-a-32-byte-secret-key!!"));
//! let auth_router = auth_handlers::router(service.clone(), jwt_auth.clone());
//! let users_router = handlers::router(service, jwt_auth);
//! # Ok(())
//! # }
//! ```

pub mod auth_handlers;
pub mod error;
pub mod handlers;
pub mod models;
pub mod mongodb;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use auth_handlers::AuthApiDoc;
pub use error::{UserError, UserResult};
pub use handlers::UsersApiDoc;
pub use models::{
    ChangePasswordRequest, LoginRequest, Profile, RegisterRequest, Role, StoreInfo, UpdateUser,
    User, UserFilter, UserResponse,
};
pub use mongodb::MongoUserRepository;
pub use repository::{InMemoryUserRepository, UserRepository};
pub use service::UserService;
