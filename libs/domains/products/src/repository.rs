use async_trait::async_trait;
use uuid::Uuid;

use crate::error::ProductResult;
use crate::models::{Product, ProductQuery, UpdateProduct};

/// Repository trait for Product persistence
///
/// Implementations can use different storage backends; the router and
/// service are generic over this trait so tests can inject mocks.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Insert a new product
    async fn create(&self, product: Product) -> ProductResult<Product>;

    /// Insert a batch of products in a single operation
    async fn create_many(&self, products: Vec<Product>) -> ProductResult<Vec<Product>>;

    /// Get a product by ID
    async fn get_by_id(&self, id: Uuid) -> ProductResult<Option<Product>>;

    /// List products matching the query.
    ///
    /// Returns up to `effective_limit() + 1` documents so the caller can
    /// detect whether a further page exists.
    async fn list(&self, query: ProductQuery) -> ProductResult<Vec<Product>>;

    /// Count products matching the query filters (pagination ignored)
    async fn count(&self, query: ProductQuery) -> ProductResult<u64>;

    /// Update an existing product
    async fn update(&self, id: Uuid, input: UpdateProduct) -> ProductResult<Product>;

    /// Delete a product by ID
    async fn delete(&self, id: Uuid) -> ProductResult<bool>;
}
