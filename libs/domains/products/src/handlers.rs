//! HTTP handlers for the Products API

use axum::{
    extract::{Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use axum_helpers::{
    errors::responses::{
        BadRequestUuidResponse, BadRequestValidationResponse, ForbiddenResponse,
        InternalServerErrorResponse, NotFoundResponse, UnauthorizedResponse,
    },
    jwt_auth_middleware, require_store_or_admin, CurrentUser, JwtAuth, UuidPath, ValidatedJson,
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::ProductResult;
use crate::models::{
    BulkCreateProducts, BulkCreateResponse, CreateProduct, DeleteProductResponse, Pagination,
    Product, ProductListResponse, ProductQuery, ProductResponse, SortBy, SortOrder, UpdateProduct,
};
use crate::repository::ProductRepository;
use crate::service::ProductService;

/// OpenAPI documentation for the Products API
#[derive(OpenApi)]
#[openapi(
    paths(
        list_products,
        get_product,
        create_product,
        bulk_create_products,
        update_product,
        delete_product,
    ),
    components(
        schemas(
            Product, CreateProduct, UpdateProduct, BulkCreateProducts, ProductQuery,
            SortBy, SortOrder, Pagination, ProductResponse, ProductListResponse,
            BulkCreateResponse, DeleteProductResponse
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
        (name = "Products", description = "Product catalog endpoints")
    )
)]
pub struct ApiDoc;

/// Create the products router.
///
/// Listing and lookup are public; mutations require a store or admin
/// token, with per-product ownership enforced by the service.
pub fn router<R: ProductRepository + 'static>(
    service: ProductService<R>,
    jwt_auth: JwtAuth,
) -> Router {
    let shared_service = Arc::new(service);

    let public = Router::new()
        .route("/", get(list_products))
        .route("/{id}", get(get_product));

    let protected = Router::new()
        .route("/create", post(create_product))
        .route("/bulk", post(bulk_create_products))
        .route("/{id}", put(update_product).delete(delete_product))
        .route_layer(middleware::from_fn(require_store_or_admin))
        .route_layer(middleware::from_fn_with_state(
            jwt_auth,
            jwt_auth_middleware,
        ));

    public.merge(protected).with_state(shared_service)
}

/// List products with filtering, sorting, and cursor pagination
#[utoipa::path(
    get,
    path = "",
    tag = "Products",
    params(ProductQuery),
    responses(
        (status = 200, description = "Page of products", body = ProductListResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_products<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    Query(query): Query<ProductQuery>,
) -> ProductResult<Json<ProductListResponse>> {
    let page_number = query.page.max(1);
    let limit = query.effective_limit();

    let page = service.list_products(query).await?;

    Ok(Json(ProductListResponse {
        message: "Products retrieved successfully".to_string(),
        payload: page.products,
        pagination: Pagination {
            total: page.total,
            page: page_number,
            limit,
            total_pages: page.total.div_ceil(limit as u64),
            has_next: page.has_next,
            has_prev: page_number > 1,
            next_cursor: page.next_cursor,
        },
    }))
}

/// Get a product by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Products",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product found", body = ProductResponse),
        (status = 400, response = BadRequestUuidResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_product<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    UuidPath(id): UuidPath,
) -> ProductResult<Json<ProductResponse>> {
    let product = service.get_product(id).await?;
    Ok(Json(ProductResponse {
        message: "Product retrieved successfully".to_string(),
        payload: product,
    }))
}

/// Create a new product
#[utoipa::path(
    post,
    path = "/create",
    tag = "Products",
    request_body = CreateProduct,
    responses(
        (status = 201, description = "Product created successfully", body = ProductResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_product<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    CurrentUser(claims): CurrentUser,
    ValidatedJson(input): ValidatedJson<CreateProduct>,
) -> ProductResult<impl IntoResponse> {
    let product = service.create_product(input, &claims).await?;
    Ok((
        StatusCode::CREATED,
        Json(ProductResponse {
            message: "Product created successfully".to_string(),
            payload: product,
        }),
    ))
}

/// Batch create products
#[utoipa::path(
    post,
    path = "/bulk",
    tag = "Products",
    request_body = BulkCreateProducts,
    responses(
        (status = 201, description = "Batch processed", body = BulkCreateResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn bulk_create_products<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    CurrentUser(claims): CurrentUser,
    Json(input): Json<BulkCreateProducts>,
) -> ProductResult<impl IntoResponse> {
    let result = service.bulk_create_products(input.products, &claims).await?;
    Ok((
        StatusCode::CREATED,
        Json(BulkCreateResponse {
            message: format!(
                "{} products created, {} invalid",
                result.created_count, result.invalid_count
            ),
            payload: result.products,
            created_count: result.created_count,
            invalid_count: result.invalid_count,
        }),
    ))
}

/// Update a product (owner or admin)
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Products",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body = UpdateProduct,
    responses(
        (status = 200, description = "Product updated successfully", body = ProductResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_product<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    UuidPath(id): UuidPath,
    CurrentUser(claims): CurrentUser,
    ValidatedJson(input): ValidatedJson<UpdateProduct>,
) -> ProductResult<Json<ProductResponse>> {
    let product = service.update_product(id, input, &claims).await?;
    Ok(Json(ProductResponse {
        message: "Product updated successfully".to_string(),
        payload: product,
    }))
}

/// Delete a product (owner or admin)
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Products",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product deleted successfully", body = DeleteProductResponse),
        (status = 400, response = BadRequestUuidResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_product<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    UuidPath(id): UuidPath,
    CurrentUser(claims): CurrentUser,
) -> ProductResult<Json<DeleteProductResponse>> {
    service.delete_product(id, &claims).await?;
    Ok(Json(DeleteProductResponse {
        message: "Product deleted successfully".to_string(),
        payload: id,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockProductRepository;
    use axum::body::Body;
    use axum::http::{header, Request};
    use axum_helpers::JwtConfig;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    const TEST_SECRET: &str = "test-secret-key-with-at-least-32-chars";

    fn test_app(repo: MockProductRepository) -> Router {
        let jwt_auth = JwtAuth::new(&JwtConfig::new(TEST_SECRET));
        router(ProductService::new(repo), jwt_auth)
    }

    fn token_for(id: Uuid, role: &str) -> String {
        JwtAuth::new(&JwtConfig::new(TEST_SECRET))
            .create_token(&id.to_string(), "store@example.com", "acme", role)
            .unwrap()
    }

    fn owned_product(name: &str, owner: Uuid) -> Product {
        Product::new(
            CreateProduct {
                name: name.to_string(),
                description: String::new(),
                price: 10.0,
                image: None,
                category: "electronics".to_string(),
                stock: 1,
                rating: 0.0,
                brand: None,
                is_active: true,
            },
            Some(owner),
            Some("acme".to_string()),
        )
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_list_products_returns_envelope_with_pagination() {
        let mut repo = MockProductRepository::new();
        let owner = Uuid::now_v7();
        let products = vec![owned_product("a", owner), owned_product("b", owner)];
        repo.expect_list().return_once(move |_| Ok(products));
        repo.expect_count().return_once(|_| Ok(2));

        let response = test_app(repo)
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Products retrieved successfully");
        assert_eq!(body["payload"].as_array().unwrap().len(), 2);
        assert_eq!(body["pagination"]["total"], 2);
        assert_eq!(body["pagination"]["has_next"], false);
        assert_eq!(body["pagination"]["has_prev"], false);
    }

    #[tokio::test]
    async fn test_get_unknown_product_returns_404() {
        let mut repo = MockProductRepository::new();
        repo.expect_get_by_id().return_once(|_| Ok(None));

        let response = test_app(repo)
            .oneshot(
                Request::builder()
                    .uri(format!("/{}", Uuid::now_v7()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_without_token_returns_401() {
        let repo = MockProductRepository::new();

        let response = test_app(repo)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/create")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({"name": "Widget", "price": 10.0, "category": "electronics"})
                            .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_with_user_role_returns_403_with_role_details() {
        let repo = MockProductRepository::new();
        let token = token_for(Uuid::now_v7(), "user");

        let response = test_app(repo)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/create")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({"name": "Widget", "price": 10.0, "category": "electronics"})
                            .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = body_json(response).await;
        assert_eq!(body["details"]["yourRole"], "user");
    }

    #[tokio::test]
    async fn test_create_with_store_role_stamps_owner() {
        let mut repo = MockProductRepository::new();
        repo.expect_create().return_once(|p| Ok(p));

        let store_id = Uuid::now_v7();
        let token = token_for(store_id, "store");

        let response = test_app(repo)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/create")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({"name": "Widget", "price": 10.0, "category": "electronics"})
                            .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["payload"]["owner_id"], store_id.to_string());
        assert_eq!(body["payload"]["owner_name"], "acme");
    }

    #[tokio::test]
    async fn test_create_with_invalid_body_returns_400() {
        let repo = MockProductRepository::new();
        let token = token_for(Uuid::now_v7(), "store");

        let response = test_app(repo)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/create")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        // rating above the allowed range
                        json!({"name": "Widget", "price": 10.0, "category": "electronics", "rating": 9.0})
                            .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_update_by_non_owner_returns_403() {
        let owner = Uuid::now_v7();
        let intruder = Uuid::now_v7();

        let mut repo = MockProductRepository::new();
        let existing = owned_product("Widget", owner);
        let id = existing.id;
        repo.expect_get_by_id().return_once(move |_| Ok(Some(existing)));

        let token = token_for(intruder, "store");
        let response = test_app(repo)
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri(format!("/{}", id))
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(json!({"price": 20.0}).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_delete_by_admin_returns_200() {
        let owner = Uuid::now_v7();

        let mut repo = MockProductRepository::new();
        let existing = owned_product("Widget", owner);
        let id = existing.id;
        repo.expect_get_by_id().return_once(move |_| Ok(Some(existing)));
        repo.expect_delete().return_once(|_| Ok(true));

        let token = token_for(Uuid::now_v7(), "admin");
        let response = test_app(repo)
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/{}", id))
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Product deleted successfully");
    }

    #[tokio::test]
    async fn test_bulk_create_reports_counts() {
        let mut repo = MockProductRepository::new();
        repo.expect_create_many()
            .withf(|products| products.len() == 1)
            .return_once(|products| Ok(products));

        let token = token_for(Uuid::now_v7(), "store");
        let response = test_app(repo)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/bulk")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({"products": [
                            {"name": "Widget", "price": 10.0, "category": "electronics"},
                            {"name": "", "price": 10.0, "category": "electronics"}
                        ]})
                        .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["created_count"], 1);
        assert_eq!(body["invalid_count"], 1);
    }
}
