//! # Ledger Engine
//!
//! The transactional core of Dukaan: composes sales, keeps catalog stock
//! counts and buyer udhar balances consistent, and reverses both exactly
//! when a transaction is deleted.
//!
//! ## Composition Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   create_transaction(draft)                             │
//! │                                                                         │
//! │  validate draft ── InvalidTransactionData? ──► return (no store I/O)   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN ───────────────────────────────────────────────┐                │
//! │  │  INSERT transaction header                         │                │
//! │  │  for each product line:                            │                │
//! │  │      guarded stock decrement ── short? ──► ROLLBACK + error         │
//! │  │      INSERT line (frozen name/price snapshot)      │                │
//! │  │  for each accessory line: (same)                   │                │
//! │  │  buyer set? outstanding_udhar += total - paid      │                │
//! │  COMMIT ──────────────────────────────────────────────┘                │
//! │                                                                         │
//! │  One database transaction per composed operation: a failure on the     │
//! │  fourth line rolls back the header, the first three lines and their    │
//! │  stock decrements in one stroke. There is no partial-failure window    │
//! │  and no compensating delete to run.                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Stock Guard
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Check-then-decrement as ONE statement:                                 │
//! │                                                                         │
//! │    UPDATE products SET available = available - q                        │
//! │    WHERE id = ? AND available >= q                                      │
//! │                                                                         │
//! │  Zero rows affected means the guard refused (or the item is gone);     │
//! │  a follow-up read tells the two apart. Because check and decrement     │
//! │  are the same row-level statement, two concurrent sales of the same    │
//! │  item serialize on the row lock and `available` can never go           │
//! │  negative. The schema CHECK backstops this.                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Udhar Accounting
//! Every transaction contributes `total - paid` to its buyer's balance:
//! a credit sale pushes the balance up, a pure udhar payment (total 0,
//! paid > 0) pulls it down. Delete reverses the same delta; a paid-amount
//! edit applies only the paid delta. Transactions without a buyer touch no
//! balance.

use chrono::Utc;
use sqlx::sqlite::SqliteConnection;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{LedgerError, LedgerResult};
use dukaan_core::validation::validate_quantity;
use dukaan_core::{
    BalanceDrift, CatalogKind, CoreError, LineDraft, Transaction, TransactionDraft,
    TransactionLine, UdharPaymentDraft,
};

// =============================================================================
// Table dispatch
// =============================================================================
// The product and accessory sides of the ledger are identical in shape;
// only the table and FK column names differ.

fn item_table(kind: CatalogKind) -> &'static str {
    match kind {
        CatalogKind::Product => "products",
        CatalogKind::Accessory => "accessories",
    }
}

fn line_table(kind: CatalogKind) -> &'static str {
    match kind {
        CatalogKind::Product => "transaction_products",
        CatalogKind::Accessory => "transaction_accessories",
    }
}

fn line_fk(kind: CatalogKind) -> &'static str {
    match kind {
        CatalogKind::Product => "product_id",
        CatalogKind::Accessory => "accessory_id",
    }
}

// =============================================================================
// Ledger Engine
// =============================================================================

/// The stock and udhar accounting engine.
///
/// Every public operation is atomic: it either commits all of its effects
/// (header rows, line rows, stock decrements, balance adjustments) or none
/// of them.
#[derive(Debug, Clone)]
pub struct LedgerEngine {
    pool: SqlitePool,
}

impl LedgerEngine {
    /// Creates a new LedgerEngine.
    pub fn new(pool: SqlitePool) -> Self {
        LedgerEngine { pool }
    }

    /// Composes a complete sale: one header plus its product and accessory
    /// lines.
    ///
    /// ## Errors
    /// * `InvalidTransactionData` - draft fails validation; nothing was
    ///   written
    /// * `InsufficientStock` - some line asked for more than is on hand;
    ///   the whole sale rolled back
    /// * `NotFound` - a referenced catalog item or the buyer is absent
    pub async fn create_transaction(&self, draft: &TransactionDraft) -> LedgerResult<Transaction> {
        draft.validate()?;

        debug!(
            buyer = ?draft.buyer_id,
            product_lines = draft.product_lines.len(),
            accessory_lines = draft.accessory_lines.len(),
            "Composing transaction"
        );

        let mut tx = self.pool.begin().await?;

        let txn = Transaction {
            id: Uuid::new_v4().to_string(),
            buyer_id: draft.buyer_id.clone(),
            user_id: draft.user_id.clone(),
            total_amount_cents: draft.total_amount_cents,
            paid_amount_cents: draft.paid_amount_cents,
            payment_method: draft.payment_method,
            is_udhar_payment: false,
            transaction_date: Utc::now(),
        };
        insert_header(&mut tx, &txn).await?;

        for line in &draft.product_lines {
            insert_line(&mut tx, CatalogKind::Product, &txn.id, line).await?;
        }
        for line in &draft.accessory_lines {
            insert_line(&mut tx, CatalogKind::Accessory, &txn.id, line).await?;
        }

        if let Some(buyer_id) = &txn.buyer_id {
            adjust_buyer_balance(
                &mut tx,
                buyer_id,
                txn.total_amount_cents - txn.paid_amount_cents,
            )
            .await?;
        }

        tx.commit().await?;

        info!(
            transaction_id = %txn.id,
            total = txn.total_amount_cents,
            paid = txn.paid_amount_cents,
            "Transaction created"
        );

        Ok(txn)
    }

    /// Records a pure udhar payment: a buyer paying down existing credit.
    ///
    /// The stored transaction has `total_amount = 0`, `is_udhar_payment`
    /// set, and no line items; the insert-side balance rule then reduces
    /// the buyer's balance by the paid amount.
    pub async fn pay_udhar(&self, draft: &UdharPaymentDraft) -> LedgerResult<Transaction> {
        draft.validate()?;

        debug!(buyer = ?draft.buyer_id, paid = draft.paid_amount_cents, "Recording udhar payment");

        let mut tx = self.pool.begin().await?;

        let txn = Transaction {
            id: Uuid::new_v4().to_string(),
            buyer_id: draft.buyer_id.clone(),
            user_id: draft.user_id.clone(),
            total_amount_cents: 0,
            paid_amount_cents: draft.paid_amount_cents,
            payment_method: draft.payment_method,
            is_udhar_payment: true,
            transaction_date: Utc::now(),
        };
        insert_header(&mut tx, &txn).await?;

        if let Some(buyer_id) = &txn.buyer_id {
            adjust_buyer_balance(&mut tx, buyer_id, -txn.paid_amount_cents).await?;
        }

        tx.commit().await?;

        info!(transaction_id = %txn.id, paid = txn.paid_amount_cents, "Udhar payment recorded");

        Ok(txn)
    }

    /// Deletes a transaction and reverses exactly the stock and balance
    /// effects it caused.
    ///
    /// Stock restoration is one bulk statement per line table (lines joined
    /// to their items, quantities summed); tombstoned lines (NULL item
    /// reference) restore nothing. The header delete cascades to the lines,
    /// and the whole reversal commits or rolls back together, so a
    /// transaction cannot be half-deleted or deleted twice.
    pub async fn delete_transaction(&self, id: &str) -> LedgerResult<()> {
        debug!(transaction_id = %id, "Deleting transaction");

        let mut tx = self.pool.begin().await?;

        let header = fetch_header(&mut tx, id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Transaction", id))?;

        restore_stock(&mut tx, CatalogKind::Product, id).await?;
        restore_stock(&mut tx, CatalogKind::Accessory, id).await?;

        if let Some(buyer_id) = &header.buyer_id {
            adjust_buyer_balance(
                &mut tx,
                buyer_id,
                -(header.total_amount_cents - header.paid_amount_cents),
            )
            .await?;
        }

        sqlx::query("DELETE FROM transactions WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(transaction_id = %id, "Transaction deleted, effects reversed");

        Ok(())
    }

    /// Changes a line's quantity, applying the net stock delta
    /// `available += old_quantity - new_quantity`.
    ///
    /// A partial quantity edit never needs a delete+reinsert. When the
    /// delta would drive `available` negative the edit is rejected with
    /// `InsufficientStock` and nothing changes; growing a line is bounded
    /// by stock on hand exactly like a fresh insert. Tombstoned lines
    /// (item deleted) update the line row only.
    pub async fn update_line_quantity(
        &self,
        kind: CatalogKind,
        line_id: &str,
        new_quantity: i64,
    ) -> LedgerResult<()> {
        validate_quantity(new_quantity).map_err(CoreError::from)?;

        debug!(kind = ?kind, line_id = %line_id, new_quantity, "Updating line quantity");

        let mut tx = self.pool.begin().await?;

        let line: Option<TransactionLine> = sqlx::query_as(&format!(
            "SELECT id, transaction_id, {} AS item_id, name_snapshot, unit_price_cents, quantity \
             FROM {} WHERE id = ?1",
            line_fk(kind),
            line_table(kind)
        ))
        .bind(line_id)
        .fetch_optional(&mut *tx)
        .await?;

        let line = line.ok_or_else(|| LedgerError::not_found("Line item", line_id))?;

        if let Some(item_id) = &line.item_id {
            let delta = line.quantity - new_quantity;
            if delta != 0 {
                let result = sqlx::query(&format!(
                    "UPDATE {} SET available = available + ?1, updated_at = ?2 \
                     WHERE id = ?3 AND available + ?1 >= 0",
                    item_table(kind)
                ))
                .bind(delta)
                .bind(Utc::now())
                .bind(item_id)
                .execute(&mut *tx)
                .await?;

                if result.rows_affected() == 0 {
                    let current: Option<(String, i64)> = sqlx::query_as(&format!(
                        "SELECT name, available FROM {} WHERE id = ?1",
                        item_table(kind)
                    ))
                    .bind(item_id)
                    .fetch_optional(&mut *tx)
                    .await?;

                    return Err(match current {
                        Some((name, available)) => {
                            LedgerError::insufficient_stock(name, available, new_quantity)
                        }
                        None => LedgerError::not_found(kind.label(), item_id),
                    });
                }
            }
        }

        sqlx::query(&format!(
            "UPDATE {} SET quantity = ?1 WHERE id = ?2",
            line_table(kind)
        ))
        .bind(new_quantity)
        .bind(line_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }

    /// Changes a transaction's paid amount, adjusting the buyer balance by
    /// the paid delta only.
    ///
    /// Paying more shrinks the balance, paying less grows it back. Kept
    /// for compatibility with registers that correct a payment after the
    /// fact; ordinary flows use [`Self::pay_udhar`].
    pub async fn update_paid_amount(
        &self,
        transaction_id: &str,
        new_paid_cents: i64,
    ) -> LedgerResult<()> {
        if new_paid_cents < 0 {
            return Err(CoreError::invalid_transaction("paid_amount must be non-negative").into());
        }

        debug!(transaction_id = %transaction_id, new_paid_cents, "Updating paid amount");

        let mut tx = self.pool.begin().await?;

        let header = fetch_header(&mut tx, transaction_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Transaction", transaction_id))?;

        sqlx::query("UPDATE transactions SET paid_amount_cents = ?1 WHERE id = ?2")
            .bind(new_paid_cents)
            .bind(transaction_id)
            .execute(&mut *tx)
            .await?;

        if let Some(buyer_id) = &header.buyer_id {
            adjust_buyer_balance(&mut tx, buyer_id, header.paid_amount_cents - new_paid_cents)
                .await?;
        }

        tx.commit().await?;

        Ok(())
    }

    /// Recomputes every buyer's balance from transaction history and
    /// reports stored-vs-computed mismatches.
    ///
    /// The recomputed value is the buyer's opening balance plus the sum of
    /// `total - paid` over their existing transactions. The incremental
    /// accounting above should keep this list empty; a non-empty result
    /// means drift (a bug, or out-of-band writes) and names the buyers to
    /// repair. Stock has no recoverable opening value in history, so its
    /// invariant is enforced by the guard and the schema CHECK instead.
    pub async fn reconcile_buyer_balances(&self) -> LedgerResult<Vec<BalanceDrift>> {
        let drifts: Vec<BalanceDrift> = sqlx::query_as(
            "SELECT b.id AS buyer_id,
                    b.outstanding_udhar_cents AS stored_cents,
                    b.opening_udhar_cents
                        + COALESCE(SUM(t.total_amount_cents - t.paid_amount_cents), 0)
                        AS computed_cents
             FROM buyers b
             LEFT JOIN transactions t ON t.buyer_id = b.id
             GROUP BY b.id
             HAVING stored_cents != computed_cents",
        )
        .fetch_all(&self.pool)
        .await?;

        if !drifts.is_empty() {
            info!(buyers = drifts.len(), "Udhar balance drift detected");
        }

        Ok(drifts)
    }
}

// =============================================================================
// Transaction-scoped helpers
// =============================================================================
// All helpers run on the caller's open transaction so their effects commit
// or roll back together.

async fn insert_header(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    txn: &Transaction,
) -> LedgerResult<()> {
    sqlx::query(
        "INSERT INTO transactions (
            id, buyer_id, user_id, total_amount_cents, paid_amount_cents,
            payment_method, is_udhar_payment, transaction_date
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )
    .bind(&txn.id)
    .bind(txn.buyer_id.as_deref())
    .bind(&txn.user_id)
    .bind(txn.total_amount_cents)
    .bind(txn.paid_amount_cents)
    .bind(txn.payment_method)
    .bind(txn.is_udhar_payment)
    .bind(txn.transaction_date)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

async fn fetch_header(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    id: &str,
) -> LedgerResult<Option<Transaction>> {
    let header = sqlx::query_as::<_, Transaction>(
        "SELECT id, buyer_id, user_id, total_amount_cents, paid_amount_cents, \
         payment_method, is_udhar_payment, transaction_date \
         FROM transactions WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(header)
}

/// Inserts one line: guarded stock decrement first, then the line row with
/// its frozen snapshot. A NULL item reference skips the stock side.
async fn insert_line(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    kind: CatalogKind,
    transaction_id: &str,
    line: &LineDraft,
) -> LedgerResult<()> {
    if let Some(item_id) = &line.item_id {
        take_stock(&mut *tx, kind, item_id, line.quantity).await?;
    }

    sqlx::query(&format!(
        "INSERT INTO {} (id, transaction_id, {}, name_snapshot, unit_price_cents, quantity) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        line_table(kind),
        line_fk(kind)
    ))
    .bind(Uuid::new_v4().to_string())
    .bind(transaction_id)
    .bind(line.item_id.as_deref())
    .bind(&line.name)
    .bind(line.unit_price_cents)
    .bind(line.quantity)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// The stock guard: check and decrement in one statement.
///
/// Zero rows affected means either the item is gone (`NotFound`) or the
/// guard refused (`InsufficientStock`); a follow-up read distinguishes
/// them and supplies the current `available` for the error.
async fn take_stock(
    conn: &mut SqliteConnection,
    kind: CatalogKind,
    item_id: &str,
    quantity: i64,
) -> LedgerResult<()> {
    let result = sqlx::query(&format!(
        "UPDATE {} SET available = available - ?1, updated_at = ?2 \
         WHERE id = ?3 AND available >= ?1",
        item_table(kind)
    ))
    .bind(quantity)
    .bind(Utc::now())
    .bind(item_id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        let current: Option<(String, i64)> = sqlx::query_as(&format!(
            "SELECT name, available FROM {} WHERE id = ?1",
            item_table(kind)
        ))
        .bind(item_id)
        .fetch_optional(&mut *conn)
        .await?;

        return Err(match current {
            Some((name, available)) => {
                LedgerError::insufficient_stock(name, available, quantity)
            }
            None => LedgerError::not_found(kind.label(), item_id),
        });
    }

    Ok(())
}

/// Bulk stock restoration for one line table of a transaction being
/// deleted: each still-referenced item gets the sum of its line quantities
/// back in a single correlated UPDATE, atomic with the header delete.
async fn restore_stock(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    kind: CatalogKind,
    transaction_id: &str,
) -> LedgerResult<()> {
    let items = item_table(kind);
    let lines = line_table(kind);
    let fk = line_fk(kind);

    sqlx::query(&format!(
        "UPDATE {items} SET
            available = available + (
                SELECT COALESCE(SUM(l.quantity), 0)
                FROM {lines} l
                WHERE l.transaction_id = ?1 AND l.{fk} = {items}.id
            ),
            updated_at = ?2
         WHERE id IN (
            SELECT {fk} FROM {lines}
            WHERE transaction_id = ?1 AND {fk} IS NOT NULL
         )",
    ))
    .bind(transaction_id)
    .bind(Utc::now())
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Applies a signed delta to a buyer's outstanding udhar balance.
async fn adjust_buyer_balance(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    buyer_id: &str,
    delta_cents: i64,
) -> LedgerResult<()> {
    if delta_cents != 0 {
        debug!(buyer_id = %buyer_id, delta_cents, "Adjusting udhar balance");
    }

    let result = sqlx::query(
        "UPDATE buyers SET
            outstanding_udhar_cents = outstanding_udhar_cents + ?1,
            updated_at = ?2
         WHERE id = ?3",
    )
    .bind(delta_cents)
    .bind(Utc::now())
    .bind(buyer_id)
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(LedgerError::not_found("Buyer", buyer_id));
    }

    Ok(())
}
