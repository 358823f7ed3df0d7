//! # Transaction Repository (read side)
//!
//! Read queries over transaction headers and their line items. All writes
//! (create, delete, quantity and paid-amount changes) go through the
//! ledger engine in [`crate::ledger`], which owns the stock and udhar
//! bookkeeping those writes imply.

use sqlx::SqlitePool;

use crate::error::DbResult;
use dukaan_core::{CatalogKind, Transaction, TransactionItems, TransactionLine};

const TRANSACTION_COLUMNS: &str = "id, buyer_id, user_id, total_amount_cents, \
     paid_amount_cents, payment_method, is_udhar_payment, transaction_date";

/// The line tables differ only in the FK column name; queries alias it to
/// `item_id` so one row type covers both.
fn line_select(kind: CatalogKind) -> String {
    let (table, fk) = match kind {
        CatalogKind::Product => ("transaction_products", "product_id"),
        CatalogKind::Accessory => ("transaction_accessories", "accessory_id"),
    };
    format!(
        "SELECT id, transaction_id, {} AS item_id, name_snapshot, unit_price_cents, quantity \
         FROM {} WHERE transaction_id = ?1",
        fk, table
    )
}

/// Repository for transaction read operations.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    /// Creates a new TransactionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    /// Gets a transaction header by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Transaction>> {
        let txn = sqlx::query_as::<_, Transaction>(&format!(
            "SELECT {} FROM transactions WHERE id = ?1",
            TRANSACTION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(txn)
    }

    /// Lists all transactions, newest first.
    pub async fn list_all(&self) -> DbResult<Vec<Transaction>> {
        let txns = sqlx::query_as::<_, Transaction>(&format!(
            "SELECT {} FROM transactions ORDER BY transaction_date DESC",
            TRANSACTION_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(txns)
    }

    /// Lists a buyer's transactions, newest first.
    pub async fn list_for_buyer(&self, buyer_id: &str) -> DbResult<Vec<Transaction>> {
        let txns = sqlx::query_as::<_, Transaction>(&format!(
            "SELECT {} FROM transactions WHERE buyer_id = ?1 ORDER BY transaction_date DESC",
            TRANSACTION_COLUMNS
        ))
        .bind(buyer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(txns)
    }

    /// Gets the product and accessory lines of one transaction.
    ///
    /// Lines whose catalog item was deleted come back with `item_id: None`
    /// and their frozen snapshot intact.
    pub async fn items(&self, transaction_id: &str) -> DbResult<TransactionItems> {
        let products = self.lines(CatalogKind::Product, transaction_id).await?;
        let accessories = self.lines(CatalogKind::Accessory, transaction_id).await?;

        Ok(TransactionItems {
            products,
            accessories,
        })
    }

    async fn lines(
        &self,
        kind: CatalogKind,
        transaction_id: &str,
    ) -> DbResult<Vec<TransactionLine>> {
        let lines = sqlx::query_as::<_, TransactionLine>(&line_select(kind))
            .bind(transaction_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(lines)
    }
}
