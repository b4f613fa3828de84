use super::jwt::{JwtAuth, JwtClaims, TokenError};
use crate::errors::AppError;
use axum::{
    extract::{FromRequestParts, Path, Request, State},
    http::request::Parts,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use serde_json::json;
use uuid::Uuid;

/// Extract a bearer token from the Authorization header
fn extract_token_from_request(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer ").map(|s| s.to_string()))
}

/// JWT authentication middleware
///
/// Validates bearer tokens from the Authorization header and inserts
/// [`JwtClaims`] into request extensions on success.
///
/// Responses:
/// - 401 when no token is present
/// - 401 with `TOKEN_EXPIRED` when the token has expired
/// - 403 when the token fails verification
///
/// # Example
///
/// ```ignore
/// use axum::Router;
/// use axum::routing::get;
/// use axum_helpers::{JwtAuth, jwt_auth_middleware};
///
/// let protected_routes = Router::new()
///     .route("/api/protected", get(protected_handler))
///     .layer(axum::middleware::from_fn_with_state(
///         auth.clone(),
///         jwt_auth_middleware
///     ));
/// ```
pub async fn jwt_auth_middleware(
    State(auth): State<JwtAuth>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = match extract_token_from_request(&headers) {
        Some(t) => t,
        None => {
            tracing::debug!("No bearer token in Authorization header");
            return Err(AppError::Unauthorized("No token provided".to_string()));
        }
    };

    let claims = match auth.verify_token(&token) {
        Ok(c) => c,
        Err(TokenError::Expired) => {
            tracing::debug!("JWT verification failed: token expired");
            return Err(AppError::TokenExpired);
        }
        Err(TokenError::Invalid(e)) => {
            tracing::debug!("JWT verification failed: {}", e);
            return Err(AppError::Forbidden("Invalid token".to_string()));
        }
    };

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Extractor for the authenticated user's claims.
///
/// Reads [`JwtClaims`] from request extensions, which means the route must
/// be behind [`jwt_auth_middleware`]. Returns 401 otherwise.
///
/// # Example
/// ```ignore
/// async fn me(CurrentUser(claims): CurrentUser) -> String {
///     format!("Hello, {}", claims.username)
/// }
/// ```
pub struct CurrentUser(pub JwtClaims);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<JwtClaims>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}

fn claims_from_request(request: &Request) -> Result<JwtClaims, AppError> {
    request
        .extensions()
        .get::<JwtClaims>()
        .cloned()
        .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
}

fn forbidden_for_role(required: &str, role: &str) -> AppError {
    AppError::ForbiddenWithDetails(
        format!("Access denied. Required role: {}", required),
        json!({ "yourRole": role }),
    )
}

/// Guard allowing only users with the admin role.
///
/// Must run after [`jwt_auth_middleware`]. The 403 response echoes the
/// caller's role in `details.yourRole`.
pub async fn require_admin(request: Request, next: Next) -> Result<Response, AppError> {
    let claims = claims_from_request(&request)?;

    if claims.role != "admin" {
        tracing::debug!(role = %claims.role, "Admin-only route rejected");
        return Err(forbidden_for_role("admin", &claims.role));
    }

    Ok(next.run(request).await)
}

/// Guard allowing users with the store or admin role.
pub async fn require_store_or_admin(request: Request, next: Next) -> Result<Response, AppError> {
    let claims = claims_from_request(&request)?;

    if claims.role != "store" && claims.role != "admin" {
        tracing::debug!(role = %claims.role, "Store-only route rejected");
        return Err(forbidden_for_role("store or admin", &claims.role));
    }

    Ok(next.run(request).await)
}

/// Guard allowing the resource owner or an admin.
///
/// Compares the authenticated user's id against the `{id}` path parameter.
/// Intended for user-scoped routes like `/users/{id}`.
pub async fn require_owner_or_admin(
    Path(id): Path<Uuid>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = claims_from_request(&request)?;

    if claims.role != "admin" && claims.sub != id.to_string() {
        tracing::debug!(role = %claims.role, "Owner-only route rejected");
        return Err(AppError::ForbiddenWithDetails(
            "Access denied. You can only access your own resources".to_string(),
            json!({ "yourRole": claims.role }),
        ));
    }

    Ok(next.run(request).await)
}
