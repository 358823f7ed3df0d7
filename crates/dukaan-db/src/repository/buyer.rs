//! # Buyer Repository
//!
//! Database operations for buyers.
//!
//! ## Buyer Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Buyer Lifecycle                                   │
//! │                                                                         │
//! │  create() ──► active buyer, opening udhar balance                      │
//! │      │                                                                  │
//! │      ├── update()          partial edits (name/phone/address)          │
//! │      │                                                                  │
//! │      └── toggle_active()   soft delete ⇄ restore (a NOT flip, so the   │
//! │                            same call reverses itself)                  │
//! │                                                                         │
//! │  The `outstanding_udhar_cents` column is owned by the ledger engine;   │
//! │  nothing in this repository writes it after create().                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use dukaan_core::{Buyer, BuyerUpdate, NewBuyer};

const BUYER_COLUMNS: &str = "id, name, phone, address, opening_udhar_cents, \
     outstanding_udhar_cents, is_active, created_at, updated_at";

/// Repository for buyer database operations.
#[derive(Debug, Clone)]
pub struct BuyerRepository {
    pool: SqlitePool,
}

impl BuyerRepository {
    /// Creates a new BuyerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BuyerRepository { pool }
    }

    /// Creates a buyer.
    ///
    /// `opening_udhar_cents` carries a balance over from a paper register;
    /// from then on the ledger engine owns the column.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - same name+phone already present,
    ///   or the phone belongs to another buyer
    pub async fn create(&self, new: &NewBuyer) -> DbResult<Buyer> {
        debug!(name = %new.name, "Creating buyer");

        let existing: Option<String> =
            sqlx::query_scalar("SELECT id FROM buyers WHERE name = ?1 AND phone IS ?2")
                .bind(&new.name)
                .bind(new.phone.as_deref())
                .fetch_optional(&self.pool)
                .await?;

        if existing.is_some() {
            return Err(DbError::duplicate("buyer", &new.name));
        }

        let now = Utc::now();
        let buyer = Buyer {
            id: Uuid::new_v4().to_string(),
            name: new.name.clone(),
            phone: new.phone.clone(),
            address: new.address.clone(),
            opening_udhar_cents: new.opening_udhar_cents,
            outstanding_udhar_cents: new.opening_udhar_cents,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            "INSERT INTO buyers (
                id, name, phone, address, opening_udhar_cents,
                outstanding_udhar_cents, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(&buyer.id)
        .bind(&buyer.name)
        .bind(buyer.phone.as_deref())
        .bind(buyer.address.as_deref())
        .bind(buyer.opening_udhar_cents)
        .bind(buyer.outstanding_udhar_cents)
        .bind(buyer.is_active)
        .bind(buyer.created_at)
        .bind(buyer.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(buyer)
    }

    /// Applies a partial update.
    ///
    /// Only the fields set on the update are written. An update with no
    /// fields set is rejected; a phone move onto another buyer's number is
    /// rejected before the constraint fires.
    pub async fn update(&self, id: &str, update: &BuyerUpdate) -> DbResult<()> {
        if update.is_empty() {
            return Err(DbError::invalid_input("no fields provided for update"));
        }

        debug!(id = %id, "Updating buyer");

        if let Some(phone) = &update.phone {
            let taken: Option<String> =
                sqlx::query_scalar("SELECT id FROM buyers WHERE phone = ?1 AND id != ?2")
                    .bind(phone)
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await?;

            if taken.is_some() {
                return Err(DbError::duplicate("phone", phone));
            }
        }

        // COALESCE keeps unset fields at their current value
        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE buyers SET
                name = COALESCE(?2, name),
                phone = COALESCE(?3, phone),
                address = COALESCE(?4, address),
                updated_at = ?5
            WHERE id = ?1",
        )
        .bind(id)
        .bind(update.name.as_deref())
        .bind(update.phone.as_deref())
        .bind(update.address.as_deref())
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Buyer", id));
        }

        Ok(())
    }

    /// Soft-deletes or restores a buyer by flipping `is_active`.
    ///
    /// The row (and its udhar history) always stays; deactivating a buyer
    /// never touches their balance.
    pub async fn toggle_active(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Toggling buyer active flag");

        let now = Utc::now();
        let result =
            sqlx::query("UPDATE buyers SET is_active = NOT is_active, updated_at = ?2 WHERE id = ?1")
                .bind(id)
                .bind(now)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Buyer", id));
        }

        Ok(())
    }

    /// Gets a buyer by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Buyer>> {
        let buyer = sqlx::query_as::<_, Buyer>(&format!(
            "SELECT {} FROM buyers WHERE id = ?1",
            BUYER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(buyer)
    }

    /// Lists active buyers.
    pub async fn list_active(&self) -> DbResult<Vec<Buyer>> {
        self.list_where("WHERE is_active = 1").await
    }

    /// Lists inactive (soft-deleted) buyers.
    pub async fn list_inactive(&self) -> DbResult<Vec<Buyer>> {
        self.list_where("WHERE is_active = 0").await
    }

    /// Lists all buyers regardless of the active flag.
    pub async fn list_all(&self) -> DbResult<Vec<Buyer>> {
        self.list_where("").await
    }

    async fn list_where(&self, clause: &str) -> DbResult<Vec<Buyer>> {
        let buyers = sqlx::query_as::<_, Buyer>(&format!(
            "SELECT {} FROM buyers {} ORDER BY name",
            BUYER_COLUMNS, clause
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(buyers)
    }
}
