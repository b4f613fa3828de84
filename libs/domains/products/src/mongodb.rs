//! MongoDB implementation of ProductRepository

use async_trait::async_trait;
use mongodb::{
    bson::{doc, to_bson, Bson, Document},
    options::IndexOptions,
    Collection, Database, IndexModel,
};
use tracing::instrument;
use uuid::Uuid;

use crate::error::{ProductError, ProductResult};
use crate::models::{Product, ProductQuery, SortBy, SortOrder, UpdateProduct};
use crate::repository::ProductRepository;

/// Upper bound of the lexicographic prefix range used for name search.
/// U+F8FF is a high private-use code point, so `[term, term + U+F8FF]`
/// covers every string starting with `term`.
const PREFIX_RANGE_END: char = '\u{f8ff}';

/// MongoDB implementation of the ProductRepository
pub struct MongoProductRepository {
    collection: Collection<Product>,
}

impl MongoProductRepository {
    /// Create a new MongoProductRepository
    pub fn new(db: &Database) -> Self {
        let collection = db.collection::<Product>("products");
        Self { collection }
    }

    /// Create a new MongoProductRepository with a custom collection name
    pub fn with_collection(db: &Database, collection_name: &str) -> Self {
        let collection = db.collection::<Product>(collection_name);
        Self { collection }
    }

    /// Initialize indexes for optimal query performance
    pub async fn init_indexes(&self) -> ProductResult<()> {
        let indexes = vec![
            // Category + active flag for listing
            IndexModel::builder()
                .keys(doc! { "category": 1, "is_active": 1, "created_at": -1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_category_active".to_string())
                        .build(),
                )
                .build(),
            // Price range queries
            IndexModel::builder()
                .keys(doc! { "price": 1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_price".to_string())
                        .build(),
                )
                .build(),
            // Rating filter and sort
            IndexModel::builder()
                .keys(doc! { "rating": -1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_rating".to_string())
                        .build(),
                )
                .build(),
            // Brand filter
            IndexModel::builder()
                .keys(doc! { "brand": 1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_brand".to_string())
                        .build(),
                )
                .build(),
            // Name prefix search
            IndexModel::builder()
                .keys(doc! { "name": 1 })
                .options(IndexOptions::builder().name("idx_name".to_string()).build())
                .build(),
        ];

        self.collection.create_indexes(indexes).await?;
        tracing::info!("Product indexes created successfully");
        Ok(())
    }

    /// Get the underlying collection for advanced operations
    pub fn collection(&self) -> &Collection<Product> {
        &self.collection
    }

    /// Build a MongoDB filter document from the query.
    ///
    /// Only present filters contribute clauses; pagination is handled
    /// separately so `count` can reuse the same document.
    fn build_filter(query: &ProductQuery) -> Document {
        let mut doc = doc! {};

        // Prefix range on name, served by the idx_name index
        if let Some(ref search) = query.search {
            doc.insert(
                "name",
                doc! {
                    "$gte": search,
                    "$lte": format!("{}{}", search, PREFIX_RANGE_END),
                },
            );
        }

        if let Some(ref category) = query.category {
            doc.insert("category", category);
        }

        if let Some(ref brand) = query.brand {
            doc.insert("brand", brand);
        }

        // Price range
        if query.min_price.is_some() || query.max_price.is_some() {
            let mut price_filter = doc! {};
            if let Some(min) = query.min_price {
                price_filter.insert("$gte", min);
            }
            if let Some(max) = query.max_price {
                price_filter.insert("$lte", max);
            }
            doc.insert("price", price_filter);
        }

        if let Some(min_rating) = query.min_rating {
            doc.insert("rating", doc! { "$gte": min_rating });
        }

        if let Some(is_active) = query.is_active {
            doc.insert("is_active", is_active);
        }

        doc
    }

    /// Sort document: requested field plus `_id` as a deterministic tie-break
    fn build_sort(query: &ProductQuery) -> Document {
        let direction = query.order.direction();
        let mut sort = Document::new();
        sort.insert(query.sort_by.field_name(), direction);
        sort.insert("_id", direction);
        sort
    }

    /// BSON value of the anchor document's sort key
    fn sort_key_bson(product: &Product, sort_by: SortBy) -> Bson {
        match sort_by {
            SortBy::Name => Bson::String(product.name.clone()),
            SortBy::Price => Bson::Double(product.price),
            SortBy::CreatedAt => to_bson(&product.created_at).unwrap_or(Bson::Null),
            SortBy::Category => Bson::String(product.category.clone()),
            SortBy::Rating => Bson::Double(product.rating),
            SortBy::Stock => Bson::Int64(product.stock),
            SortBy::Brand => Bson::String(product.brand.clone()),
        }
    }

    /// Clause resuming the scan strictly after the anchor's (sort key, _id)
    /// position under the given order.
    fn cursor_clause(anchor: &Product, sort_by: SortBy, order: SortOrder) -> Document {
        let op = match order {
            SortOrder::Asc => "$gt",
            SortOrder::Desc => "$lt",
        };
        let field = sort_by.field_name();
        let key = Self::sort_key_bson(anchor, sort_by);
        let anchor_id = to_bson(&anchor.id).unwrap_or(Bson::Null);

        let mut past_key = Document::new();
        past_key.insert(field, doc! { op: key.clone() });

        let mut same_key = Document::new();
        same_key.insert(field, key);
        same_key.insert("_id", doc! { op: anchor_id });

        doc! { "$or": [past_key, same_key] }
    }
}

#[async_trait]
impl ProductRepository for MongoProductRepository {
    #[instrument(skip(self, product), fields(product_name = %product.name))]
    async fn create(&self, product: Product) -> ProductResult<Product> {
        self.collection.insert_one(&product).await?;

        tracing::info!(product_id = %product.id, "Product created successfully");
        Ok(product)
    }

    #[instrument(skip(self, products), fields(count = products.len()))]
    async fn create_many(&self, products: Vec<Product>) -> ProductResult<Vec<Product>> {
        if products.is_empty() {
            return Ok(products);
        }

        self.collection.insert_many(&products).await?;

        tracing::info!(count = products.len(), "Products created successfully");
        Ok(products)
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: Uuid) -> ProductResult<Option<Product>> {
        let filter = doc! { "_id": to_bson(&id).unwrap_or(Bson::Null) };
        let product = self.collection.find_one(filter).await?;
        Ok(product)
    }

    #[instrument(skip(self))]
    async fn list(&self, query: ProductQuery) -> ProductResult<Vec<Product>> {
        use futures_util::TryStreamExt;

        let mut filter = Self::build_filter(&query);

        if let Some(cursor_id) = query.start_after {
            let anchor_filter = doc! { "_id": to_bson(&cursor_id).unwrap_or(Bson::Null) };
            match self.collection.find_one(anchor_filter).await? {
                Some(anchor) => {
                    let clause = Self::cursor_clause(&anchor, query.sort_by, query.order);
                    filter = if filter.is_empty() {
                        clause
                    } else {
                        doc! { "$and": [filter, clause] }
                    };
                }
                // A cursor pointing at a deleted product restarts from the top
                None => {
                    tracing::debug!(cursor = %cursor_id, "Ignoring dangling pagination cursor")
                }
            }
        }

        // One extra document tells us whether a further page exists
        let options = mongodb::options::FindOptions::builder()
            .limit(query.effective_limit() + 1)
            .sort(Self::build_sort(&query))
            .build();

        let cursor = self.collection.find(filter).with_options(options).await?;
        let products: Vec<Product> = cursor.try_collect().await?;

        Ok(products)
    }

    #[instrument(skip(self))]
    async fn count(&self, query: ProductQuery) -> ProductResult<u64> {
        let filter = Self::build_filter(&query);
        let count = self.collection.count_documents(filter).await?;
        Ok(count)
    }

    #[instrument(skip(self, input))]
    async fn update(&self, id: Uuid, input: UpdateProduct) -> ProductResult<Product> {
        let filter = doc! { "_id": to_bson(&id).unwrap_or(Bson::Null) };
        let existing = self
            .collection
            .find_one(filter.clone())
            .await?
            .ok_or(ProductError::NotFound(id))?;

        let mut updated = existing;
        updated.apply_update(input);

        self.collection.replace_one(filter, &updated).await?;

        tracing::info!(product_id = %id, "Product updated successfully");
        Ok(updated)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Uuid) -> ProductResult<bool> {
        let filter = doc! { "_id": to_bson(&id).unwrap_or(Bson::Null) };
        let result = self.collection.delete_one(filter).await?;

        if result.deleted_count == 0 {
            return Err(ProductError::NotFound(id));
        }

        tracing::info!(product_id = %id, "Product deleted successfully");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreateProduct;

    fn sample_product(name: &str, price: f64) -> Product {
        Product::new(
            CreateProduct {
                name: name.to_string(),
                description: String::new(),
                price,
                image: None,
                category: "electronics".to_string(),
                stock: 3,
                rating: 4.0,
                brand: None,
                is_active: true,
            },
            None,
            None,
        )
    }

    #[test]
    fn test_build_filter_empty() {
        let query = ProductQuery::default();
        let doc = MongoProductRepository::build_filter(&query);
        assert!(doc.is_empty());
    }

    #[test]
    fn test_build_filter_search_prefix_range() {
        let query = ProductQuery {
            search: Some("lap".to_string()),
            ..Default::default()
        };
        let doc = MongoProductRepository::build_filter(&query);
        let name = doc.get_document("name").unwrap();
        assert_eq!(name.get_str("$gte").unwrap(), "lap");
        assert_eq!(name.get_str("$lte").unwrap(), "lap\u{f8ff}");
    }

    #[test]
    fn test_build_filter_price_range() {
        let query = ProductQuery {
            min_price: Some(10.0),
            max_price: Some(50.0),
            ..Default::default()
        };
        let doc = MongoProductRepository::build_filter(&query);
        let price = doc.get_document("price").unwrap();
        assert_eq!(price.get_f64("$gte").unwrap(), 10.0);
        assert_eq!(price.get_f64("$lte").unwrap(), 50.0);
    }

    #[test]
    fn test_build_filter_min_rating_and_active() {
        let query = ProductQuery {
            min_rating: Some(3.5),
            is_active: Some(true),
            ..Default::default()
        };
        let doc = MongoProductRepository::build_filter(&query);
        assert!(doc.contains_key("rating"));
        assert_eq!(doc.get_bool("is_active").unwrap(), true);
    }

    #[test]
    fn test_build_filter_ignores_pagination_fields() {
        let query = ProductQuery {
            limit: 25,
            page: 3,
            start_after: Some(Uuid::now_v7()),
            ..Default::default()
        };
        let doc = MongoProductRepository::build_filter(&query);
        assert!(doc.is_empty());
    }

    #[test]
    fn test_build_sort_has_id_tie_break() {
        let query = ProductQuery {
            sort_by: SortBy::Price,
            order: SortOrder::Asc,
            ..Default::default()
        };
        let sort = MongoProductRepository::build_sort(&query);
        let keys: Vec<&str> = sort.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["price", "_id"]);
        assert_eq!(sort.get_i32("price").unwrap(), 1);
        assert_eq!(sort.get_i32("_id").unwrap(), 1);
    }

    #[test]
    fn test_build_sort_default_is_created_at_desc() {
        let sort = MongoProductRepository::build_sort(&ProductQuery::default());
        assert_eq!(sort.get_i32("created_at").unwrap(), -1);
        assert_eq!(sort.get_i32("_id").unwrap(), -1);
    }

    #[test]
    fn test_cursor_clause_desc_uses_lt() {
        let anchor = sample_product("Widget", 20.0);
        let clause =
            MongoProductRepository::cursor_clause(&anchor, SortBy::Price, SortOrder::Desc);
        let branches = clause.get_array("$or").unwrap();
        assert_eq!(branches.len(), 2);

        let past_key = branches[0].as_document().unwrap();
        let price = past_key.get_document("price").unwrap();
        assert_eq!(price.get_f64("$lt").unwrap(), 20.0);

        // Equal sort keys fall through to the _id tie-break
        let same_key = branches[1].as_document().unwrap();
        assert_eq!(same_key.get_f64("price").unwrap(), 20.0);
        assert!(same_key.get_document("_id").unwrap().contains_key("$lt"));
    }

    #[test]
    fn test_cursor_clause_asc_uses_gt() {
        let anchor = sample_product("Widget", 20.0);
        let clause = MongoProductRepository::cursor_clause(&anchor, SortBy::Name, SortOrder::Asc);
        let branches = clause.get_array("$or").unwrap();

        let past_key = branches[0].as_document().unwrap();
        let name = past_key.get_document("name").unwrap();
        assert_eq!(name.get_str("$gt").unwrap(), "Widget");
    }
}
