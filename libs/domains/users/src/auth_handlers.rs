//! HTTP handlers for registration, login, and the current session

use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use axum_helpers::{
    errors::responses::{
        BadRequestValidationResponse, InternalServerErrorResponse, UnauthorizedResponse,
    },
    jwt_auth_middleware, CurrentUser, JwtAuth, ValidatedJson,
};
use utoipa::OpenApi;

use crate::error::{UserError, UserResult};
use crate::models::{
    AuthPayload, AuthResponse, ChangePasswordRequest, ClaimsIdentity, LoginRequest,
    MessageResponse, ProfileResponse, RegisterRequest, UserResponse,
};
use crate::repository::UserRepository;
use crate::service::UserService;

/// OpenAPI documentation for the Auth API
#[derive(OpenApi)]
#[openapi(
    paths(register, login, profile, change_password),
    components(
        schemas(
            RegisterRequest, LoginRequest, ChangePasswordRequest, AuthResponse, AuthPayload,
            ClaimsIdentity, ProfileResponse, MessageResponse
        ),
        responses(
            BadRequestValidationResponse,
            UnauthorizedResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Auth", description = "Registration and session endpoints")
    )
)]
pub struct AuthApiDoc;

/// Shared state for the auth routes.
///
/// Unlike the user administration routes, these handlers issue tokens,
/// so they carry the signer alongside the service.
pub struct AuthState<R: UserRepository> {
    service: UserService<R>,
    jwt_auth: JwtAuth,
}

impl<R: UserRepository> Clone for AuthState<R> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            jwt_auth: self.jwt_auth.clone(),
        }
    }
}

/// Create the auth router. Register and login are public; profile and
/// change-password require a valid token.
pub fn router<R: UserRepository + 'static>(service: UserService<R>, jwt_auth: JwtAuth) -> Router {
    let state = AuthState {
        service,
        jwt_auth: jwt_auth.clone(),
    };

    let public_routes = Router::new()
        .route("/register", post(register))
        .route("/login", post(login));

    let protected_routes = Router::new()
        .route("/profile", get(profile))
        .route("/change-password", post(change_password))
        .route_layer(middleware::from_fn_with_state(
            jwt_auth,
            jwt_auth_middleware,
        ));

    public_routes.merge(protected_routes).with_state(state)
}

fn issue_token<R: UserRepository>(
    state: &AuthState<R>,
    user: &crate::models::User,
) -> UserResult<String> {
    state
        .jwt_auth
        .create_token(
            &user.id.to_string(),
            &user.email,
            &user.username,
            &user.role.to_string(),
        )
        .map_err(|err| {
            tracing::error!(error = %err, "failed to sign token");
            UserError::Internal("Failed to create token".to_string())
        })
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = AuthResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn register<R: UserRepository>(
    State(state): State<AuthState<R>>,
    ValidatedJson(input): ValidatedJson<RegisterRequest>,
) -> UserResult<(StatusCode, Json<AuthResponse>)> {
    let user = state.service.register(input).await?;
    let token = issue_token(&state, &user)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered successfully".to_string(),
            payload: AuthPayload {
                token,
                user: UserResponse::from(user),
            },
        }),
    ))
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn login<R: UserRepository>(
    State(state): State<AuthState<R>>,
    ValidatedJson(input): ValidatedJson<LoginRequest>,
) -> UserResult<Json<AuthResponse>> {
    let user = state.service.login(&input.email, &input.password).await?;
    let token = issue_token(&state, &user)?;

    Ok(Json(AuthResponse {
        message: "Login successful".to_string(),
        payload: AuthPayload {
            token,
            user: UserResponse::from(user),
        },
    }))
}

/// Return the identity carried by the caller's token
#[utoipa::path(
    get,
    path = "/profile",
    tag = "Auth",
    responses(
        (status = 200, description = "Current identity", body = ProfileResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn profile<R: UserRepository>(
    State(_state): State<AuthState<R>>,
    CurrentUser(claims): CurrentUser,
) -> UserResult<Json<ProfileResponse>> {
    let id = claims
        .sub
        .parse()
        .map_err(|_| UserError::Internal("Malformed token subject".to_string()))?;
    let role = claims
        .role
        .parse()
        .map_err(|_| UserError::Internal("Malformed token role".to_string()))?;

    Ok(Json(ProfileResponse {
        message: "Profile retrieved successfully".to_string(),
        payload: ClaimsIdentity {
            id,
            email: claims.email,
            username: claims.username,
            role,
        },
    }))
}

/// Change the caller's password
#[utoipa::path(
    post,
    path = "/change-password",
    tag = "Auth",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed successfully", body = MessageResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn change_password<R: UserRepository>(
    State(state): State<AuthState<R>>,
    CurrentUser(claims): CurrentUser,
    ValidatedJson(input): ValidatedJson<ChangePasswordRequest>,
) -> UserResult<Json<MessageResponse>> {
    let id = claims
        .sub
        .parse()
        .map_err(|_| UserError::Internal("Malformed token subject".to_string()))?;

    state
        .service
        .change_password(id, &input.current_password, &input.new_password)
        .await?;

    Ok(Json(MessageResponse {
        message: "Password changed successfully".to_string(),
    }))
}
