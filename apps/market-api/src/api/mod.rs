//! API routes module

pub mod health;

use axum::Router;
use axum_helpers::JwtAuth;
use domain_products::{MongoProductRepository, ProductService};
use domain_users::{MongoUserRepository, UserService};

use crate::state::AppState;

/// Create all API routes.
/// Note: These are nested under /api by axum_helpers::create_router
pub fn routes(state: &AppState) -> Router {
    let jwt_auth = JwtAuth::new(&state.config.jwt);

    let user_service = UserService::new(MongoUserRepository::new(&state.db));
    let product_service = ProductService::new(MongoProductRepository::new(&state.db));

    Router::new()
        .nest(
            "/auth",
            domain_users::auth_handlers::router(user_service.clone(), jwt_auth.clone()),
        )
        .nest(
            "/users",
            domain_users::handlers::router(user_service, jwt_auth.clone()),
        )
        .nest(
            "/products",
            domain_products::handlers::router(product_service, jwt_auth),
        )
        .merge(health::router(state.clone()))
}
