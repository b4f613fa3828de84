use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Default limit for product listings
pub const DEFAULT_LIMIT: i64 = 10;
/// Maximum limit for product listings
pub const MAX_LIMIT: i64 = 100;

/// Sort field for product listings
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    Default,
    ToSchema,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum SortBy {
    Name,
    Price,
    #[default]
    CreatedAt,
    Category,
    Rating,
    Stock,
    Brand,
}

impl SortBy {
    /// Document field the sort key maps to
    pub fn field_name(&self) -> &'static str {
        match self {
            SortBy::Name => "name",
            SortBy::Price => "price",
            SortBy::CreatedAt => "created_at",
            SortBy::Category => "category",
            SortBy::Rating => "rating",
            SortBy::Stock => "stock",
            SortBy::Brand => "brand",
        }
    }
}

/// Sort direction for product listings
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    Default,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// MongoDB sort direction (1 ascending, -1 descending)
    pub fn direction(&self) -> i32 {
        match self {
            SortOrder::Asc => 1,
            SortOrder::Desc => -1,
        }
    }
}

/// Product entity - represents a product stored in MongoDB
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Product {
    /// Unique identifier (stored as _id in MongoDB)
    #[serde(rename = "_id", alias = "id")]
    pub id: Uuid,
    /// Product name
    pub name: String,
    /// Product description
    #[serde(default)]
    pub description: String,
    /// Price in the store currency
    pub price: f64,
    /// Image URL
    #[serde(default)]
    pub image: Option<String>,
    /// Product category
    pub category: String,
    /// Current stock quantity
    #[serde(default)]
    pub stock: i64,
    /// Average rating, 0 to 5
    #[serde(default)]
    pub rating: f64,
    /// Brand name
    #[serde(default = "default_brand")]
    pub brand: String,
    /// Whether the product is visible in listings
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Id of the store user who owns this product
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<Uuid>,
    /// Username of the owning store
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,
}

fn default_brand() -> String {
    "unbranded".to_string()
}

fn default_true() -> bool {
    true
}

/// DTO for creating a new product
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateProduct {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[validate(range(min = 0.0))]
    pub price: f64,
    pub image: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub stock: i64,
    #[validate(range(min = 0.0, max = 5.0))]
    #[serde(default)]
    pub rating: f64,
    pub brand: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// DTO for updating an existing product
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProduct {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 0.0))]
    pub price: Option<f64>,
    pub image: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub category: Option<String>,
    #[validate(range(min = 0))]
    pub stock: Option<i64>,
    #[validate(range(min = 0.0, max = 5.0))]
    pub rating: Option<f64>,
    pub brand: Option<String>,
    pub is_active: Option<bool>,
}

/// Batch create request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct BulkCreateProducts {
    pub products: Vec<CreateProduct>,
}

/// Query parameters for listing products
#[derive(Debug, Clone, Deserialize, Validate, ToSchema, IntoParams)]
pub struct ProductQuery {
    /// Page size, clamped to [1, 100]
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// Page number, informational only (cursor drives the scan)
    #[serde(default = "default_page")]
    pub page: i64,
    /// Sort field
    #[serde(default)]
    pub sort_by: SortBy,
    /// Sort direction
    #[serde(default)]
    pub order: SortOrder,
    /// Prefix search on product name
    pub search: Option<String>,
    /// Filter by category (exact match)
    pub category: Option<String>,
    /// Filter by brand (exact match)
    pub brand: Option<String>,
    /// Minimum price (inclusive)
    #[validate(range(min = 0.0))]
    pub min_price: Option<f64>,
    /// Maximum price (inclusive)
    #[validate(range(min = 0.0))]
    pub max_price: Option<f64>,
    /// Minimum rating (inclusive)
    #[validate(range(min = 0.0, max = 5.0))]
    pub min_rating: Option<f64>,
    /// Filter by active flag
    pub is_active: Option<bool>,
    /// Cursor: id of the last product of the previous page
    pub start_after: Option<Uuid>,
}

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

fn default_page() -> i64 {
    1
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            page: 1,
            sort_by: SortBy::default(),
            order: SortOrder::default(),
            search: None,
            category: None,
            brand: None,
            min_price: None,
            max_price: None,
            min_rating: None,
            is_active: None,
            start_after: None,
        }
    }
}

impl ProductQuery {
    /// Requested limit clamped to the allowed range
    pub fn effective_limit(&self) -> i64 {
        self.limit.clamp(1, MAX_LIMIT)
    }
}

/// One page of products as returned by the service layer
#[derive(Debug, Clone)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub total: u64,
    pub has_next: bool,
    pub next_cursor: Option<Uuid>,
}

/// Outcome of a batch create as computed by the service layer
#[derive(Debug, Clone)]
pub struct BulkCreated {
    pub products: Vec<Product>,
    pub created_count: usize,
    pub invalid_count: usize,
}

/// Pagination metadata for list responses
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Pagination {
    pub total: u64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<Uuid>,
}

/// Single-product response envelope
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductResponse {
    pub message: String,
    pub payload: Product,
}

/// Product list response envelope
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductListResponse {
    pub message: String,
    pub payload: Vec<Product>,
    pub pagination: Pagination,
}

/// Batch create response envelope
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BulkCreateResponse {
    pub message: String,
    pub payload: Vec<Product>,
    pub created_count: usize,
    pub invalid_count: usize,
}

/// Delete response envelope
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DeleteProductResponse {
    pub message: String,
    pub payload: Uuid,
}

impl Product {
    /// Create a new product from CreateProduct DTO, stamped with its owner
    pub fn new(input: CreateProduct, owner_id: Option<Uuid>, owner_name: Option<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            name: input.name,
            description: input.description,
            price: input.price,
            image: input.image,
            category: input.category,
            stock: input.stock,
            rating: input.rating,
            brand: input.brand.unwrap_or_else(default_brand),
            is_active: input.is_active,
            created_at: Utc::now(),
            updated_at: None,
            owner_id,
            owner_name,
        }
    }

    /// Apply updates from UpdateProduct DTO
    pub fn apply_update(&mut self, update: UpdateProduct) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(price) = update.price {
            self.price = price;
        }
        if let Some(image) = update.image {
            self.image = Some(image);
        }
        if let Some(category) = update.category {
            self.category = category;
        }
        if let Some(stock) = update.stock {
            self.stock = stock;
        }
        if let Some(rating) = update.rating {
            self.rating = rating;
        }
        if let Some(brand) = update.brand {
            self.brand = brand;
        }
        if let Some(is_active) = update.is_active {
            self.is_active = is_active;
        }
        self.updated_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_input(name: &str) -> CreateProduct {
        CreateProduct {
            name: name.to_string(),
            description: String::new(),
            price: 9.99,
            image: None,
            category: "electronics".to_string(),
            stock: 5,
            rating: 0.0,
            brand: None,
            is_active: true,
        }
    }

    #[test]
    fn test_new_product_defaults_brand() {
        let product = Product::new(create_input("Widget"), None, None);
        assert_eq!(product.brand, "unbranded");
        assert!(product.is_active);
        assert!(product.updated_at.is_none());
    }

    #[test]
    fn test_new_product_stamps_owner() {
        let owner = Uuid::now_v7();
        let product = Product::new(
            create_input("Widget"),
            Some(owner),
            Some("acme".to_string()),
        );
        assert_eq!(product.owner_id, Some(owner));
        assert_eq!(product.owner_name.as_deref(), Some("acme"));
    }

    #[test]
    fn test_apply_update_sets_updated_at() {
        let mut product = Product::new(create_input("Widget"), None, None);
        product.apply_update(UpdateProduct {
            price: Some(19.99),
            ..Default::default()
        });
        assert_eq!(product.price, 19.99);
        assert!(product.updated_at.is_some());
    }

    #[test]
    fn test_effective_limit_clamps() {
        let mut query = ProductQuery::default();
        assert_eq!(query.effective_limit(), 10);

        query.limit = 0;
        assert_eq!(query.effective_limit(), 1);

        query.limit = 500;
        assert_eq!(query.effective_limit(), 100);
    }

    #[test]
    fn test_sort_by_field_names() {
        assert_eq!(SortBy::CreatedAt.field_name(), "created_at");
        assert_eq!(SortBy::Price.field_name(), "price");
    }

    #[test]
    fn test_sort_by_deserializes_camel_case() {
        let query: ProductQuery =
            serde_json::from_str(r#"{"sort_by": "createdAt", "order": "asc"}"#).unwrap();
        assert_eq!(query.sort_by, SortBy::CreatedAt);
        assert_eq!(query.order, SortOrder::Asc);
    }

    #[test]
    fn test_create_product_rejects_out_of_range_rating() {
        let mut input = create_input("Widget");
        input.rating = 7.5;
        assert!(input.validate().is_err());
    }
}
