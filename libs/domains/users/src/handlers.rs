//! HTTP handlers for the user administration API

use axum::{
    extract::{Path, Query, State},
    middleware,
    routing::{get, patch},
    Json, Router,
};
use axum_helpers::{
    errors::responses::{
        BadRequestUuidResponse, BadRequestValidationResponse, ForbiddenResponse,
        InternalServerErrorResponse, NotFoundResponse, UnauthorizedResponse,
    },
    jwt_auth_middleware, require_admin, require_owner_or_admin, CurrentUser, JwtAuth, UuidPath,
    ValidatedJson,
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::{UserError, UserResult};
use crate::models::{
    ListUsersResponse, MessageResponse, Role, ToggleStatusPayload, ToggleStatusResponse,
    UpdateUser, UserEnvelope, UserFilter, UserResponse,
};
use crate::repository::UserRepository;
use crate::service::UserService;

/// OpenAPI documentation for the Users API
#[derive(OpenApi)]
#[openapi(
    paths(
        list_users,
        get_users_by_role,
        get_user,
        update_user,
        delete_user,
        toggle_status,
    ),
    components(
        schemas(
            UserResponse, UpdateUser, UserFilter, Role, UserEnvelope, ListUsersResponse,
            ToggleStatusResponse, MessageResponse
        ),
        responses(
            NotFoundResponse,
            BadRequestValidationResponse,
            BadRequestUuidResponse,
            UnauthorizedResponse,
            ForbiddenResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Users", description = "User administration endpoints")
    )
)]
pub struct UsersApiDoc;

/// Create the users router.
///
/// Everything requires a valid token; listing, role queries, and
/// status toggles are admin-only, while `/{id}` reads and updates are
/// open to the subject user as well.
pub fn router<R: UserRepository + 'static>(service: UserService<R>, jwt_auth: JwtAuth) -> Router {
    let shared_service = Arc::new(service);

    let admin_routes = Router::new()
        .route("/", get(list_users))
        .route("/role/{role}", get(get_users_by_role))
        .route("/{id}/toggle-status", patch(toggle_status))
        .route_layer(middleware::from_fn(require_admin));

    let owner_routes = Router::new()
        .route(
            "/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route_layer(middleware::from_fn(require_owner_or_admin));

    admin_routes
        .merge(owner_routes)
        .route_layer(middleware::from_fn_with_state(
            jwt_auth,
            jwt_auth_middleware,
        ))
        .with_state(shared_service)
}

/// List users (admin only)
#[utoipa::path(
    get,
    path = "",
    tag = "Users",
    params(UserFilter),
    responses(
        (status = 200, description = "List of users", body = ListUsersResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_users<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    Query(filter): Query<UserFilter>,
) -> UserResult<Json<ListUsersResponse>> {
    let limit = filter.limit;
    let offset = filter.offset;
    let (users, total) = service.list_users(filter).await?;

    Ok(Json(ListUsersResponse {
        message: "Users retrieved successfully".to_string(),
        payload: users.into_iter().map(UserResponse::from).collect(),
        total,
        limit,
        offset,
    }))
}

/// List users by role (admin only)
#[utoipa::path(
    get,
    path = "/role/{role}",
    tag = "Users",
    params(
        ("role" = String, Path, description = "Role name: user, store, or admin")
    ),
    responses(
        (status = 200, description = "Users with the given role", body = ListUsersResponse),
        (status = 400, description = "Unknown role"),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_users_by_role<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    Path(role): Path<String>,
) -> UserResult<Json<ListUsersResponse>> {
    let role: Role = role
        .parse()
        .map_err(|_| UserError::InvalidRole(role.clone()))?;

    let filter = UserFilter {
        role: Some(role),
        ..Default::default()
    };
    let limit = filter.limit;
    let offset = filter.offset;
    let (users, total) = service.list_users(filter).await?;

    Ok(Json(ListUsersResponse {
        message: "Users retrieved successfully".to_string(),
        payload: users.into_iter().map(UserResponse::from).collect(),
        total,
        limit,
        offset,
    }))
}

/// Get a user by ID (subject user or admin)
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Users",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User found", body = UserEnvelope),
        (status = 400, response = BadRequestUuidResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_user<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    UuidPath(id): UuidPath,
) -> UserResult<Json<UserEnvelope>> {
    let user = service.get_user(id).await?;
    Ok(Json(UserEnvelope {
        message: "User retrieved successfully".to_string(),
        payload: user.into(),
    }))
}

/// Update a user (subject user or admin; role changes admin only)
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Users",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    request_body = UpdateUser,
    responses(
        (status = 200, description = "User updated successfully", body = UserEnvelope),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_user<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    UuidPath(id): UuidPath,
    CurrentUser(claims): CurrentUser,
    ValidatedJson(input): ValidatedJson<UpdateUser>,
) -> UserResult<Json<UserEnvelope>> {
    // The owner-or-admin guard has already run, so a non-admin caller
    // is the subject user attempting to escalate their own role.
    if input.role.is_some() && claims.role != "admin" {
        return Err(UserError::CannotChangeOwnRole);
    }

    let user = service.update_user(id, input).await?;
    Ok(Json(UserEnvelope {
        message: "User updated successfully".to_string(),
        payload: user.into(),
    }))
}

/// Delete a user (admin only, never yourself)
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Users",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User deleted successfully", body = MessageResponse),
        (status = 400, response = BadRequestUuidResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_user<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    UuidPath(id): UuidPath,
    CurrentUser(claims): CurrentUser,
) -> UserResult<Json<MessageResponse>> {
    if claims.role != "admin" {
        return Err(UserError::AdminOnly { role: claims.role });
    }
    if claims.sub == id.to_string() {
        return Err(UserError::CannotTargetSelf(
            "You cannot delete your own account".to_string(),
        ));
    }

    service.delete_user(id).await?;
    Ok(Json(MessageResponse {
        message: "User deleted successfully".to_string(),
    }))
}

/// Toggle a user's active status (admin only, never yourself)
#[utoipa::path(
    patch,
    path = "/{id}/toggle-status",
    tag = "Users",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Status toggled", body = ToggleStatusResponse),
        (status = 400, response = BadRequestUuidResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn toggle_status<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    UuidPath(id): UuidPath,
    CurrentUser(claims): CurrentUser,
) -> UserResult<Json<ToggleStatusResponse>> {
    if claims.sub == id.to_string() {
        return Err(UserError::CannotTargetSelf(
            "You cannot change your own account status".to_string(),
        ));
    }

    let user = service.toggle_status(id).await?;
    let message = if user.is_active {
        "User activated successfully"
    } else {
        "User deactivated successfully"
    };

    Ok(Json(ToggleStatusResponse {
        message: message.to_string(),
        payload: ToggleStatusPayload {
            id: user.id,
            is_active: user.is_active,
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;
    use crate::repository::InMemoryUserRepository;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum_helpers::JwtConfig;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    const TEST_SECRET: &str = "test-secret-key-with-at-least-32-chars";

    fn jwt() -> JwtAuth {
        JwtAuth::new(&JwtConfig::new(TEST_SECRET))
    }

    fn seeded_user(email: &str, username: &str, role: Role) -> User {
        User::new(
            email.to_string(),
            username.to_string(),
            "not-a-real-hash".to_string(),
            role,
            None,
            None,
        )
    }

    async fn test_app(users: Vec<User>) -> Router {
        let repo = InMemoryUserRepository::new();
        for user in users {
            repo.create(user).await.unwrap();
        }
        router(UserService::new(repo), jwt())
    }

    fn token_for(user: &User) -> String {
        jwt()
            .create_token(
                &user.id.to_string(),
                &user.email,
                &user.username,
                &user.role.to_string(),
            )
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn get(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_list_without_token_returns_401() {
        let app = test_app(vec![]).await;
        let response = app.oneshot(get("/", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_list_with_user_role_returns_403() {
        let user = seeded_user("u@example.com", "plain", Role::User);
        let token = token_for(&user);
        let app = test_app(vec![user]).await;

        let response = app.oneshot(get("/", Some(&token))).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_list_with_admin_returns_users() {
        let admin = seeded_user("a@example.com", "admin", Role::Admin);
        let token = token_for(&admin);
        let app = test_app(vec![admin, seeded_user("u@example.com", "plain", Role::User)]).await;

        let response = app.oneshot(get("/", Some(&token))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["total"], 2);
        // The password hash never leaves the API
        assert!(body["payload"][0].get("password_hash").is_none());
    }

    #[tokio::test]
    async fn test_get_own_record_allowed() {
        let user = seeded_user("u@example.com", "plain", Role::User);
        let token = token_for(&user);
        let uri = format!("/{}", user.id);
        let app = test_app(vec![user]).await;

        let response = app.oneshot(get(&uri, Some(&token))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_get_foreign_record_forbidden_for_non_admin() {
        let user = seeded_user("u@example.com", "plain", Role::User);
        let other = seeded_user("o@example.com", "other", Role::User);
        let token = token_for(&user);
        let uri = format!("/{}", other.id);
        let app = test_app(vec![user, other]).await;

        let response = app.oneshot(get(&uri, Some(&token))).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_non_admin_cannot_change_own_role() {
        let user = seeded_user("u@example.com", "plain", Role::User);
        let token = token_for(&user);
        let uri = format!("/{}", user.id);
        let app = test_app(vec![user]).await;

        let response = app
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri(uri)
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(json!({"role": "admin"}).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_admin_cannot_delete_self() {
        let admin = seeded_user("a@example.com", "admin", Role::Admin);
        let token = token_for(&admin);
        let uri = format!("/{}", admin.id);
        let app = test_app(vec![admin]).await;

        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(uri)
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_non_admin_cannot_delete_own_account() {
        let user = seeded_user("u@example.com", "plain", Role::User);
        let token = token_for(&user);
        let uri = format!("/{}", user.id);
        let app = test_app(vec![user]).await;

        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(uri)
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        // Passes the owner guard but fails the admin requirement
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_admin_can_delete_other_user() {
        let admin = seeded_user("a@example.com", "admin", Role::Admin);
        let victim = seeded_user("v@example.com", "victim", Role::User);
        let token = token_for(&admin);
        let uri = format!("/{}", victim.id);
        let app = test_app(vec![admin, victim]).await;

        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(uri)
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_admin_cannot_toggle_own_status() {
        let admin = seeded_user("a@example.com", "admin", Role::Admin);
        let token = token_for(&admin);
        let uri = format!("/{}/toggle-status", admin.id);
        let app = test_app(vec![admin]).await;

        let response = app
            .oneshot(
                Request::builder()
                    .method("PATCH")
                    .uri(uri)
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_toggle_status_echoes_new_state() {
        let admin = seeded_user("a@example.com", "admin", Role::Admin);
        let target = seeded_user("t@example.com", "target", Role::User);
        let token = token_for(&admin);
        let uri = format!("/{}/toggle-status", target.id);
        let target_id = target.id;
        let app = test_app(vec![admin, target]).await;

        let response = app
            .oneshot(
                Request::builder()
                    .method("PATCH")
                    .uri(uri)
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["payload"]["id"], target_id.to_string());
        assert_eq!(body["payload"]["is_active"], false);
    }

    #[tokio::test]
    async fn test_unknown_role_path_returns_400() {
        let admin = seeded_user("a@example.com", "admin", Role::Admin);
        let token = token_for(&admin);
        let app = test_app(vec![admin]).await;

        let response = app
            .oneshot(get("/role/superuser", Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_role_path_filters_users() {
        let admin = seeded_user("a@example.com", "admin", Role::Admin);
        let store = seeded_user("s@example.com", "shop", Role::Store);
        let token = token_for(&admin);
        let app = test_app(vec![admin, store]).await;

        let response = app.oneshot(get("/role/store", Some(&token))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["payload"][0]["username"], "shop");
    }

    #[tokio::test]
    async fn test_get_missing_user_as_admin_returns_404() {
        let admin = seeded_user("a@example.com", "admin", Role::Admin);
        let token = token_for(&admin);
        let app = test_app(vec![admin]).await;

        let response = app
            .oneshot(get(&format!("/{}", Uuid::now_v7()), Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
