//! # Product Repository
//!
//! Database operations for the product catalog (phones).
//!
//! ## Key Operations
//! - Filtered, paginated listing
//! - CRUD with a (name, color, variant) uniqueness rule
//!
//! ## What Does NOT Live Here
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  The `available` column is OWNED BY THE LEDGER ENGINE.                  │
//! │                                                                         │
//! │  Catalog management sets the opening stock at insert time; after       │
//! │  that, every mutation of `available` happens inside a ledger           │
//! │  transaction in response to sale line changes. `update()` below        │
//! │  deliberately does not write the column.                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Deleting a product is a hard delete; historical sale lines keep their
//! name/price snapshot and the schema nulls their reference (tombstone).

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::{page_bounds, push_catalog_filters, total_pages};
use dukaan_core::{CatalogFilter, NewProduct, Page, Product};

/// Every listing and point read selects the same columns in the same order.
const PRODUCT_COLUMNS: &str = "id, name, local_name, category_id, market_price_cents, \
     dealer_price_cents, image_url, available, color, variant, created_at, updated_at";

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists products with filters and pagination.
    ///
    /// ## Filters
    /// - `name` / `local_name`: substring match
    /// - `category_name`: resolved to a category id first; an unknown name
    ///   simply applies no category filter
    /// - `min_price_cents` / `max_price_cents`: either price column
    /// - `min_available`: minimum stock on hand
    /// - `colors` / `variants`: set membership
    ///
    /// ## Returns
    /// One [`Page`] of products ordered by name then color, plus the total
    /// row count across all pages.
    pub async fn list(&self, filter: &CatalogFilter) -> DbResult<Page<Product>> {
        debug!(page = filter.page, limit = filter.limit, "Listing products");

        let category_id = match &filter.category_name {
            Some(name) => self.category_id_by_name(name).await?,
            None => None,
        };

        // Count first so the page math is stable even if rows land between
        // the two statements
        let mut count_qb =
            QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM products WHERE 1=1");
        push_catalog_filters(&mut count_qb, filter, category_id.as_deref(), true);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let (page, limit, offset) = page_bounds(filter);

        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM products WHERE 1=1",
            PRODUCT_COLUMNS
        ));
        push_catalog_filters(&mut qb, filter, category_id.as_deref(), true);
        qb.push(" ORDER BY name, color, variant LIMIT ");
        qb.push_bind(limit);
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        let items: Vec<Product> = qb.build_query_as().fetch_all(&self.pool).await?;

        debug!(count = items.len(), total = total, "Product listing returned");

        Ok(Page {
            items,
            total,
            page,
            total_pages: total_pages(total, limit),
        })
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products WHERE id = ?1",
            PRODUCT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Inserted product with generated id and timestamps
    /// * `Err(DbError::UniqueViolation)` - (name, color, variant) taken
    pub async fn insert(&self, new: &NewProduct) -> DbResult<Product> {
        debug!(name = %new.name, color = %new.color, variant = %new.variant, "Inserting product");

        // Pre-check gives a friendlier error than the raw constraint message
        let existing: Option<String> = sqlx::query_scalar(
            "SELECT id FROM products WHERE name = ?1 AND color = ?2 AND variant = ?3",
        )
        .bind(&new.name)
        .bind(&new.color)
        .bind(&new.variant)
        .fetch_optional(&self.pool)
        .await?;

        if existing.is_some() {
            return Err(DbError::duplicate(
                "product (name, color, variant)",
                format!("{} / {} / {}", new.name, new.color, new.variant),
            ));
        }

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: new.name.clone(),
            local_name: new.local_name.clone(),
            category_id: new.category_id.clone(),
            market_price_cents: new.market_price_cents,
            dealer_price_cents: new.dealer_price_cents,
            image_url: new.image_url.clone(),
            available: new.available,
            color: new.color.clone(),
            variant: new.variant.clone(),
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            "INSERT INTO products (
                id, name, local_name, category_id,
                market_price_cents, dealer_price_cents, image_url,
                available, color, variant, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.local_name.as_deref())
        .bind(&product.category_id)
        .bind(product.market_price_cents)
        .bind(product.dealer_price_cents)
        .bind(product.image_url.as_deref())
        .bind(product.available)
        .bind(&product.color)
        .bind(&product.variant)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(product)
    }

    /// Updates an existing product's catalog fields.
    ///
    /// `available` is not written here; stock moves only through the
    /// ledger engine.
    ///
    /// ## Returns
    /// * `Ok(())` - Update successful
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE products SET
                name = ?2,
                local_name = ?3,
                category_id = ?4,
                market_price_cents = ?5,
                dealer_price_cents = ?6,
                color = ?7,
                variant = ?8,
                updated_at = ?9
            WHERE id = ?1",
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.local_name.as_deref())
        .bind(&product.category_id)
        .bind(product.market_price_cents)
        .bind(product.dealer_price_cents)
        .bind(&product.color)
        .bind(&product.variant)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Replaces the stored image reference.
    ///
    /// The actual asset lives on an external host; this column is an
    /// opaque URL.
    pub async fn set_image(&self, id: &str, image_url: Option<&str>) -> DbResult<()> {
        let now = Utc::now();

        let result =
            sqlx::query("UPDATE products SET image_url = ?2, updated_at = ?3 WHERE id = ?1")
                .bind(id)
                .bind(image_url)
                .bind(now)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Hard-deletes a product.
    ///
    /// Historical sale lines referencing it keep their snapshots; the
    /// schema sets their `product_id` to NULL.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts total products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn category_id_by_name(&self, name: &str) -> DbResult<Option<String>> {
        let id: Option<String> =
            sqlx::query_scalar("SELECT id FROM product_categories WHERE name = ?1")
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;

        Ok(id)
    }
}
