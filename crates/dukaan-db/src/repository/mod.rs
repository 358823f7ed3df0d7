//! # Repository Module
//!
//! Database repository implementations for Dukaan.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  Caller                                                                 │
//! │       │                                                                 │
//! │       │  db.products().list(&filter)                                   │
//! │       ▼                                                                 │
//! │  ProductRepository                                                     │
//! │  ├── list(&self, filter)                                               │
//! │  ├── get_by_id(&self, id)                                              │
//! │  ├── insert(&self, new)                                                │
//! │  └── update(&self, product)                                            │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Note: repositories never touch `available` or                         │
//! │  `outstanding_udhar_cents`; those columns belong to the ledger         │
//! │  engine (crate::ledger).                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Product CRUD and filtered listing
//! - [`accessory::AccessoryRepository`] - Accessory CRUD and filtered listing
//! - [`category::CategoryRepository`] - Category CRUD per catalog kind
//! - [`buyer::BuyerRepository`] - Buyer CRUD with soft delete/restore
//! - [`transaction::TransactionRepository`] - Transaction read side

pub mod accessory;
pub mod buyer;
pub mod category;
pub mod product;
pub mod transaction;

use sqlx::{QueryBuilder, Sqlite};

use dukaan_core::CatalogFilter;

/// Appends catalog listing filters to a query builder.
///
/// Shared by the product and accessory repositories; the two tables have
/// the same filterable columns except that only products carry `variant`.
/// A requested-but-unknown category name matches everything, mirroring the
/// listing behavior callers expect from a lenient filter form.
pub(crate) fn push_catalog_filters(
    qb: &mut QueryBuilder<'_, Sqlite>,
    filter: &CatalogFilter,
    category_id: Option<&str>,
    with_variants: bool,
) {
    if let Some(name) = &filter.name {
        qb.push(" AND name LIKE ");
        qb.push_bind(format!("%{}%", name));
    }

    if let Some(local_name) = &filter.local_name {
        qb.push(" AND local_name LIKE ");
        qb.push_bind(format!("%{}%", local_name));
    }

    if let Some(category_id) = category_id {
        qb.push(" AND category_id = ");
        qb.push_bind(category_id.to_string());
    }

    // Price filters match when either price column qualifies
    if let Some(min) = filter.min_price_cents {
        qb.push(" AND (market_price_cents >= ");
        qb.push_bind(min);
        qb.push(" OR dealer_price_cents >= ");
        qb.push_bind(min);
        qb.push(")");
    }

    if let Some(max) = filter.max_price_cents {
        qb.push(" AND (market_price_cents <= ");
        qb.push_bind(max);
        qb.push(" OR dealer_price_cents <= ");
        qb.push_bind(max);
        qb.push(")");
    }

    if let Some(min_available) = filter.min_available {
        qb.push(" AND available >= ");
        qb.push_bind(min_available);
    }

    if !filter.colors.is_empty() {
        qb.push(" AND color IN (");
        {
            let mut sep = qb.separated(", ");
            for color in &filter.colors {
                sep.push_bind(color.clone());
            }
        }
        qb.push(")");
    }

    if with_variants && !filter.variants.is_empty() {
        qb.push(" AND variant IN (");
        {
            let mut sep = qb.separated(", ");
            for variant in &filter.variants {
                sep.push_bind(variant.clone());
            }
        }
        qb.push(")");
    }
}

/// Computes pagination bounds from a filter: (page, limit, offset).
/// Page and limit are clamped to at least 1.
pub(crate) fn page_bounds(filter: &CatalogFilter) -> (u32, i64, i64) {
    let page = filter.page.max(1);
    let limit = i64::from(filter.limit.max(1));
    let offset = (i64::from(page) - 1) * limit;
    (page, limit, offset)
}

/// Computes the number of pages for a total row count.
pub(crate) fn total_pages(total: i64, limit: i64) -> u32 {
    ((total + limit - 1) / limit).max(0) as u32
}
