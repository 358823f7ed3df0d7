//! # Category Repository
//!
//! CRUD for the two category sets (product categories and accessory
//! categories). Deleting a category cascades to its items at the schema
//! level, so a delete here can empty part of the catalog; callers are
//! expected to confirm first.

use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use dukaan_core::{CatalogKind, Category};

fn table(kind: CatalogKind) -> &'static str {
    match kind {
        CatalogKind::Product => "product_categories",
        CatalogKind::Accessory => "accessory_categories",
    }
}

/// Repository for category operations, parameterized by catalog kind.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    /// Creates a new CategoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// Creates a category.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - name already taken in this set
    pub async fn create(&self, kind: CatalogKind, name: &str) -> DbResult<Category> {
        debug!(kind = ?kind, name = %name, "Creating category");

        let category = Category {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
        };

        sqlx::query(&format!(
            "INSERT INTO {} (id, name) VALUES (?1, ?2)",
            table(kind)
        ))
        .bind(&category.id)
        .bind(&category.name)
        .execute(&self.pool)
        .await?;

        Ok(category)
    }

    /// Lists all categories of a kind, by name.
    pub async fn list(&self, kind: CatalogKind) -> DbResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(&format!(
            "SELECT id, name FROM {} ORDER BY name",
            table(kind)
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    /// Looks a category up by its exact name.
    pub async fn get_by_name(&self, kind: CatalogKind, name: &str) -> DbResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(&format!(
            "SELECT id, name FROM {} WHERE name = ?1",
            table(kind)
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    /// Deletes a category. Items in it are deleted by the schema cascade.
    pub async fn delete(&self, kind: CatalogKind, id: &str) -> DbResult<()> {
        debug!(kind = ?kind, id = %id, "Deleting category");

        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = ?1", table(kind)))
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }

        Ok(())
    }
}
