//! Product Service - Business logic layer

use std::sync::Arc;

use axum_helpers::JwtClaims;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::error::{ProductError, ProductResult};
use crate::models::{
    BulkCreated, CreateProduct, Product, ProductPage, ProductQuery, UpdateProduct,
};
use crate::repository::ProductRepository;

/// Product service providing business logic operations
///
/// Validates input, enforces ownership rules, and orchestrates
/// repository operations.
pub struct ProductService<R: ProductRepository> {
    repository: Arc<R>,
}

impl<R: ProductRepository> ProductService<R> {
    /// Create a new ProductService with the given repository
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// List products with filtering, sorting, and cursor pagination
    #[instrument(skip(self))]
    pub async fn list_products(&self, query: ProductQuery) -> ProductResult<ProductPage> {
        query
            .validate()
            .map_err(|e| ProductError::Validation(e.to_string()))?;

        if let (Some(min), Some(max)) = (query.min_price, query.max_price) {
            if min > max {
                return Err(ProductError::InvalidPriceRange { min, max });
            }
        }

        let limit = query.effective_limit();

        let mut products = self.repository.list(query.clone()).await?;
        let has_next = products.len() as i64 > limit;
        if has_next {
            products.truncate(limit as usize);
        }

        let total = self.repository.count(query).await?;
        let next_cursor = products.last().map(|p| p.id);

        Ok(ProductPage {
            products,
            total,
            has_next,
            next_cursor,
        })
    }

    /// Get a product by ID
    #[instrument(skip(self))]
    pub async fn get_product(&self, id: Uuid) -> ProductResult<Product> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or(ProductError::NotFound(id))
    }

    /// Create a new product, stamped with the caller as owner
    #[instrument(skip(self, input, caller), fields(product_name = %input.name))]
    pub async fn create_product(
        &self,
        input: CreateProduct,
        caller: &JwtClaims,
    ) -> ProductResult<Product> {
        input
            .validate()
            .map_err(|e| ProductError::Validation(e.to_string()))?;

        let owner_id = parse_subject(caller)?;
        let product = Product::new(input, Some(owner_id), Some(caller.username.clone()));

        self.repository.create(product).await
    }

    /// Batch create: valid entries are inserted in one operation, invalid
    /// ones are counted and skipped.
    #[instrument(skip(self, inputs, caller), fields(count = inputs.len()))]
    pub async fn bulk_create_products(
        &self,
        inputs: Vec<CreateProduct>,
        caller: &JwtClaims,
    ) -> ProductResult<BulkCreated> {
        let owner_id = parse_subject(caller)?;

        let mut valid = Vec::with_capacity(inputs.len());
        let mut invalid_count = 0;
        for input in inputs {
            if input.validate().is_ok() {
                valid.push(Product::new(
                    input,
                    Some(owner_id),
                    Some(caller.username.clone()),
                ));
            } else {
                invalid_count += 1;
            }
        }

        let products = self.repository.create_many(valid).await?;
        let created_count = products.len();

        Ok(BulkCreated {
            products,
            created_count,
            invalid_count,
        })
    }

    /// Update a product; only its owning store or an admin may do so
    #[instrument(skip(self, input, caller))]
    pub async fn update_product(
        &self,
        id: Uuid,
        input: UpdateProduct,
        caller: &JwtClaims,
    ) -> ProductResult<Product> {
        input
            .validate()
            .map_err(|e| ProductError::Validation(e.to_string()))?;

        let existing = self
            .repository
            .get_by_id(id)
            .await?
            .ok_or(ProductError::NotFound(id))?;

        ensure_owner(&existing, caller)?;

        self.repository.update(id, input).await
    }

    /// Delete a product; only its owning store or an admin may do so
    #[instrument(skip(self, caller))]
    pub async fn delete_product(&self, id: Uuid, caller: &JwtClaims) -> ProductResult<()> {
        let existing = self
            .repository
            .get_by_id(id)
            .await?
            .ok_or(ProductError::NotFound(id))?;

        ensure_owner(&existing, caller)?;

        self.repository.delete(id).await?;
        Ok(())
    }
}

impl<R: ProductRepository> Clone for ProductService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

fn parse_subject(claims: &JwtClaims) -> ProductResult<Uuid> {
    claims
        .sub
        .parse()
        .map_err(|_| ProductError::Internal("Malformed token subject".to_string()))
}

/// Admins may modify any product; everyone else only their own
fn ensure_owner(product: &Product, caller: &JwtClaims) -> ProductResult<()> {
    if caller.role == "admin" {
        return Ok(());
    }

    let caller_id = parse_subject(caller)?;
    if product.owner_id != Some(caller_id) {
        return Err(ProductError::NotOwner);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockProductRepository;

    fn claims_for(id: Uuid, role: &str) -> JwtClaims {
        JwtClaims {
            sub: id.to_string(),
            email: "store@example.com".to_string(),
            username: "acme".to_string(),
            role: role.to_string(),
            exp: 0,
            iat: 0,
        }
    }

    fn create_input(name: &str, price: f64) -> CreateProduct {
        CreateProduct {
            name: name.to_string(),
            description: String::new(),
            price,
            image: None,
            category: "electronics".to_string(),
            stock: 1,
            rating: 0.0,
            brand: None,
            is_active: true,
        }
    }

    fn owned_product(name: &str, owner: Uuid) -> Product {
        Product::new(
            create_input(name, 10.0),
            Some(owner),
            Some("acme".to_string()),
        )
    }

    #[tokio::test]
    async fn test_list_truncates_extra_document_and_sets_has_next() {
        let mut repo = MockProductRepository::new();
        let owner = Uuid::now_v7();
        let products: Vec<Product> = (0..11)
            .map(|i| owned_product(&format!("p{}", i), owner))
            .collect();
        let last_page_id = products[9].id;

        let returned = products.clone();
        repo.expect_list().return_once(move |_| Ok(returned));
        repo.expect_count().return_once(|_| Ok(42));

        let service = ProductService::new(repo);
        let page = service.list_products(ProductQuery::default()).await.unwrap();

        assert_eq!(page.products.len(), 10);
        assert!(page.has_next);
        assert_eq!(page.total, 42);
        assert_eq!(page.next_cursor, Some(last_page_id));
    }

    #[tokio::test]
    async fn test_list_without_extra_document_has_no_next_page() {
        let mut repo = MockProductRepository::new();
        let owner = Uuid::now_v7();
        let products: Vec<Product> = (0..3)
            .map(|i| owned_product(&format!("p{}", i), owner))
            .collect();

        let returned = products.clone();
        repo.expect_list().return_once(move |_| Ok(returned));
        repo.expect_count().return_once(|_| Ok(3));

        let service = ProductService::new(repo);
        let page = service.list_products(ProductQuery::default()).await.unwrap();

        assert_eq!(page.products.len(), 3);
        assert!(!page.has_next);
    }

    #[tokio::test]
    async fn test_list_rejects_inverted_price_range_before_querying() {
        let repo = MockProductRepository::new();
        let service = ProductService::new(repo);

        let query = ProductQuery {
            min_price: Some(100.0),
            max_price: Some(10.0),
            ..Default::default()
        };

        let err = service.list_products(query).await.unwrap_err();
        assert!(matches!(err, ProductError::InvalidPriceRange { .. }));
    }

    #[tokio::test]
    async fn test_list_rejects_negative_min_price() {
        let repo = MockProductRepository::new();
        let service = ProductService::new(repo);

        let query = ProductQuery {
            min_price: Some(-5.0),
            ..Default::default()
        };

        let err = service.list_products(query).await.unwrap_err();
        assert!(matches!(err, ProductError::Validation(_)));
    }

    #[tokio::test]
    async fn test_create_stamps_owner_from_claims() {
        let owner = Uuid::now_v7();
        let mut repo = MockProductRepository::new();
        repo.expect_create().return_once(|p| Ok(p));

        let service = ProductService::new(repo);
        let product = service
            .create_product(create_input("Widget", 10.0), &claims_for(owner, "store"))
            .await
            .unwrap();

        assert_eq!(product.owner_id, Some(owner));
        assert_eq!(product.owner_name.as_deref(), Some("acme"));
    }

    #[tokio::test]
    async fn test_bulk_create_partitions_valid_and_invalid() {
        let owner = Uuid::now_v7();
        let mut repo = MockProductRepository::new();
        repo.expect_create_many()
            .withf(|products| products.len() == 2)
            .return_once(|products| Ok(products));

        let service = ProductService::new(repo);
        let inputs = vec![
            create_input("Widget", 10.0),
            create_input("", 10.0),   // empty name fails validation
            create_input("Gadget", 5.0),
        ];

        let result = service
            .bulk_create_products(inputs, &claims_for(owner, "store"))
            .await
            .unwrap();

        assert_eq!(result.created_count, 2);
        assert_eq!(result.invalid_count, 1);
    }

    #[tokio::test]
    async fn test_update_rejected_for_non_owner() {
        let owner = Uuid::now_v7();
        let intruder = Uuid::now_v7();

        let mut repo = MockProductRepository::new();
        let existing = owned_product("Widget", owner);
        repo.expect_get_by_id().return_once(move |_| Ok(Some(existing)));

        let service = ProductService::new(repo);
        let err = service
            .update_product(
                Uuid::now_v7(),
                UpdateProduct::default(),
                &claims_for(intruder, "store"),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ProductError::NotOwner));
    }

    #[tokio::test]
    async fn test_update_allowed_for_admin_over_foreign_product() {
        let owner = Uuid::now_v7();
        let admin = Uuid::now_v7();

        let mut repo = MockProductRepository::new();
        let existing = owned_product("Widget", owner);
        let updated = existing.clone();
        repo.expect_get_by_id().return_once(move |_| Ok(Some(existing)));
        repo.expect_update().return_once(move |_, _| Ok(updated));

        let service = ProductService::new(repo);
        let result = service
            .update_product(
                Uuid::now_v7(),
                UpdateProduct::default(),
                &claims_for(admin, "admin"),
            )
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_delete_allowed_for_owner() {
        let owner = Uuid::now_v7();

        let mut repo = MockProductRepository::new();
        let existing = owned_product("Widget", owner);
        let id = existing.id;
        repo.expect_get_by_id().return_once(move |_| Ok(Some(existing)));
        repo.expect_delete().return_once(|_| Ok(true));

        let service = ProductService::new(repo);
        let result = service.delete_product(id, &claims_for(owner, "store")).await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_delete_missing_product_is_not_found() {
        let mut repo = MockProductRepository::new();
        repo.expect_get_by_id().return_once(|_| Ok(None));

        let service = ProductService::new(repo);
        let err = service
            .delete_product(Uuid::now_v7(), &claims_for(Uuid::now_v7(), "admin"))
            .await
            .unwrap_err();

        assert!(matches!(err, ProductError::NotFound(_)));
    }
}
