//! # Accessory Repository
//!
//! Database operations for the accessory catalog (covers, chargers,
//! handsfree, ...). Same surface as the product repository minus the
//! `variant` attribute; uniqueness is (name, color).
//!
//! As with products, `available` belongs to the ledger engine and is only
//! seeded here at insert time.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::{page_bounds, push_catalog_filters, total_pages};
use dukaan_core::{Accessory, CatalogFilter, NewAccessory, Page};

const ACCESSORY_COLUMNS: &str = "id, name, local_name, category_id, market_price_cents, \
     dealer_price_cents, image_url, available, color, created_at, updated_at";

/// Repository for accessory database operations.
#[derive(Debug, Clone)]
pub struct AccessoryRepository {
    pool: SqlitePool,
}

impl AccessoryRepository {
    /// Creates a new AccessoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        AccessoryRepository { pool }
    }

    /// Lists accessories with filters and pagination.
    /// The `variants` filter field is ignored for accessories.
    pub async fn list(&self, filter: &CatalogFilter) -> DbResult<Page<Accessory>> {
        debug!(page = filter.page, limit = filter.limit, "Listing accessories");

        let category_id = match &filter.category_name {
            Some(name) => self.category_id_by_name(name).await?,
            None => None,
        };

        let mut count_qb =
            QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM accessories WHERE 1=1");
        push_catalog_filters(&mut count_qb, filter, category_id.as_deref(), false);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let (page, limit, offset) = page_bounds(filter);

        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM accessories WHERE 1=1",
            ACCESSORY_COLUMNS
        ));
        push_catalog_filters(&mut qb, filter, category_id.as_deref(), false);
        qb.push(" ORDER BY name, color LIMIT ");
        qb.push_bind(limit);
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        let items: Vec<Accessory> = qb.build_query_as().fetch_all(&self.pool).await?;

        Ok(Page {
            items,
            total,
            page,
            total_pages: total_pages(total, limit),
        })
    }

    /// Gets an accessory by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Accessory>> {
        let accessory = sqlx::query_as::<_, Accessory>(&format!(
            "SELECT {} FROM accessories WHERE id = ?1",
            ACCESSORY_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(accessory)
    }

    /// Inserts a new accessory.
    pub async fn insert(&self, new: &NewAccessory) -> DbResult<Accessory> {
        debug!(name = %new.name, color = %new.color, "Inserting accessory");

        let existing: Option<String> =
            sqlx::query_scalar("SELECT id FROM accessories WHERE name = ?1 AND color = ?2")
                .bind(&new.name)
                .bind(&new.color)
                .fetch_optional(&self.pool)
                .await?;

        if existing.is_some() {
            return Err(DbError::duplicate(
                "accessory (name, color)",
                format!("{} / {}", new.name, new.color),
            ));
        }

        let now = Utc::now();
        let accessory = Accessory {
            id: Uuid::new_v4().to_string(),
            name: new.name.clone(),
            local_name: new.local_name.clone(),
            category_id: new.category_id.clone(),
            market_price_cents: new.market_price_cents,
            dealer_price_cents: new.dealer_price_cents,
            image_url: new.image_url.clone(),
            available: new.available,
            color: new.color.clone(),
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            "INSERT INTO accessories (
                id, name, local_name, category_id,
                market_price_cents, dealer_price_cents, image_url,
                available, color, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        )
        .bind(&accessory.id)
        .bind(&accessory.name)
        .bind(accessory.local_name.as_deref())
        .bind(&accessory.category_id)
        .bind(accessory.market_price_cents)
        .bind(accessory.dealer_price_cents)
        .bind(accessory.image_url.as_deref())
        .bind(accessory.available)
        .bind(&accessory.color)
        .bind(accessory.created_at)
        .bind(accessory.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(accessory)
    }

    /// Updates an existing accessory's catalog fields (not `available`).
    pub async fn update(&self, accessory: &Accessory) -> DbResult<()> {
        debug!(id = %accessory.id, "Updating accessory");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE accessories SET
                name = ?2,
                local_name = ?3,
                category_id = ?4,
                market_price_cents = ?5,
                dealer_price_cents = ?6,
                color = ?7,
                updated_at = ?8
            WHERE id = ?1",
        )
        .bind(&accessory.id)
        .bind(&accessory.name)
        .bind(accessory.local_name.as_deref())
        .bind(&accessory.category_id)
        .bind(accessory.market_price_cents)
        .bind(accessory.dealer_price_cents)
        .bind(&accessory.color)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Accessory", &accessory.id));
        }

        Ok(())
    }

    /// Replaces the stored image reference.
    pub async fn set_image(&self, id: &str, image_url: Option<&str>) -> DbResult<()> {
        let now = Utc::now();

        let result =
            sqlx::query("UPDATE accessories SET image_url = ?2, updated_at = ?3 WHERE id = ?1")
                .bind(id)
                .bind(image_url)
                .bind(now)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Accessory", id));
        }

        Ok(())
    }

    /// Hard-deletes an accessory; historical lines tombstone via the schema.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting accessory");

        let result = sqlx::query("DELETE FROM accessories WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Accessory", id));
        }

        Ok(())
    }

    /// Counts total accessories (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accessories")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn category_id_by_name(&self, name: &str) -> DbResult<Option<String>> {
        let id: Option<String> =
            sqlx::query_scalar("SELECT id FROM accessory_categories WHERE name = ?1")
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;

        Ok(id)
    }
}
