//! # dukaan-db: Database Layer and Ledger Engine for Dukaan
//!
//! This crate provides database access for the Dukaan back office.
//! It uses SQLite for local storage with sqlx for async operations, and
//! hosts the ledger engine that keeps stock counts and udhar balances
//! consistent.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Dukaan Data Flow                                 │
//! │                                                                         │
//! │  Caller (service surface, out of repo)                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     dukaan-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌───────────────┐   ┌──────────────┐    │   │
//! │  │   │   Database    │   │ Repositories  │   │ LedgerEngine │    │   │
//! │  │   │   (pool.rs)   │   │ product.rs    │   │ (ledger.rs)  │    │   │
//! │  │   │               │   │ accessory.rs  │   │              │    │   │
//! │  │   │ SqlitePool    │◄──│ category.rs   │   │ stock guard  │    │   │
//! │  │   │ Migrations    │   │ buyer.rs      │   │ udhar accts  │    │   │
//! │  │   │               │   │ transaction.rs│   │ composition  │    │   │
//! │  │   └───────────────┘   └───────────────┘   └──────────────┘    │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (WAL mode, foreign keys on)                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database and ledger error types
//! - [`repository`] - Repository implementations (product, buyer, etc.)
//! - [`ledger`] - The stock/udhar ledger engine
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dukaan_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/dukaan.db")).await?;
//!
//! // Repositories for plain CRUD
//! let page = db.products().list(&CatalogFilter::default()).await?;
//!
//! // The ledger engine for anything that moves stock or udhar
//! let txn = db.ledger().create_transaction(&draft).await?;
//! db.ledger().delete_transaction(&txn.id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod ledger;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult, LedgerError, LedgerResult};
pub use ledger::LedgerEngine;
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::accessory::AccessoryRepository;
pub use repository::buyer::BuyerRepository;
pub use repository::category::CategoryRepository;
pub use repository::product::ProductRepository;
pub use repository::transaction::TransactionRepository;
