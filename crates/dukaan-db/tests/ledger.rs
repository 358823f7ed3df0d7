//! Integration tests for the ledger engine: stock guarding, udhar
//! accounting, atomic composition and reversal, all against an in-memory
//! SQLite database.

use dukaan_core::{
    Accessory, Buyer, CatalogKind, CoreError, LineDraft, NewAccessory, NewBuyer, NewProduct,
    PaymentMethod, Product, TransactionDraft, UdharPaymentDraft,
};
use dukaan_db::{Database, DbConfig, DbError, LedgerError};

// =============================================================================
// Fixtures
// =============================================================================

async fn setup() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

async fn product_with_stock(db: &Database, name: &str, available: i64) -> Product {
    let category = match db
        .categories()
        .get_by_name(CatalogKind::Product, "Smartphones")
        .await
        .unwrap()
    {
        Some(c) => c,
        None => db
            .categories()
            .create(CatalogKind::Product, "Smartphones")
            .await
            .unwrap(),
    };

    db.products()
        .insert(&NewProduct {
            name: name.to_string(),
            local_name: None,
            category_id: category.id,
            market_price_cents: 3_000_000,
            dealer_price_cents: 2_600_000,
            image_url: None,
            available,
            color: "Black".to_string(),
            variant: "128GB".to_string(),
        })
        .await
        .unwrap()
}

async fn accessory_with_stock(db: &Database, name: &str, available: i64) -> Accessory {
    let category = match db
        .categories()
        .get_by_name(CatalogKind::Accessory, "Chargers")
        .await
        .unwrap()
    {
        Some(c) => c,
        None => db
            .categories()
            .create(CatalogKind::Accessory, "Chargers")
            .await
            .unwrap(),
    };

    db.accessories()
        .insert(&NewAccessory {
            name: name.to_string(),
            local_name: None,
            category_id: category.id,
            market_price_cents: 150_000,
            dealer_price_cents: 100_000,
            image_url: None,
            available,
            color: "White".to_string(),
        })
        .await
        .unwrap()
}

async fn buyer_with_udhar(db: &Database, name: &str, opening_cents: i64) -> Buyer {
    db.buyers()
        .create(&NewBuyer {
            name: name.to_string(),
            phone: None,
            address: None,
            opening_udhar_cents: opening_cents,
        })
        .await
        .unwrap()
}

fn product_line(product: &Product, quantity: i64) -> LineDraft {
    LineDraft {
        item_id: Some(product.id.clone()),
        name: product.name.clone(),
        unit_price_cents: product.market_price_cents,
        quantity,
    }
}

fn accessory_line(accessory: &Accessory, quantity: i64) -> LineDraft {
    LineDraft {
        item_id: Some(accessory.id.clone()),
        name: accessory.name.clone(),
        unit_price_cents: accessory.market_price_cents,
        quantity,
    }
}

fn draft(
    buyer_id: Option<&str>,
    total: i64,
    paid: i64,
    product_lines: Vec<LineDraft>,
    accessory_lines: Vec<LineDraft>,
) -> TransactionDraft {
    TransactionDraft {
        buyer_id: buyer_id.map(str::to_string),
        user_id: "staff-1".to_string(),
        total_amount_cents: total,
        paid_amount_cents: paid,
        payment_method: PaymentMethod::Cash,
        product_lines,
        accessory_lines,
    }
}

async fn available_of_product(db: &Database, id: &str) -> i64 {
    db.products().get_by_id(id).await.unwrap().unwrap().available
}

async fn available_of_accessory(db: &Database, id: &str) -> i64 {
    db.accessories()
        .get_by_id(id)
        .await
        .unwrap()
        .unwrap()
        .available
}

async fn balance_of(db: &Database, id: &str) -> i64 {
    db.buyers()
        .get_by_id(id)
        .await
        .unwrap()
        .unwrap()
        .outstanding_udhar_cents
}

// =============================================================================
// Stock guard and decrement
// =============================================================================

#[tokio::test]
async fn create_sale_decrements_stock_for_both_kinds() {
    let db = setup().await;
    let product = product_with_stock(&db, "Galaxy A16", 5).await;
    let accessory = accessory_with_stock(&db, "25W Charger", 10).await;

    let txn = db
        .ledger()
        .create_transaction(&draft(
            None,
            3_450_000,
            3_450_000,
            vec![product_line(&product, 3)],
            vec![accessory_line(&accessory, 4)],
        ))
        .await
        .unwrap();

    assert_eq!(available_of_product(&db, &product.id).await, 2);
    assert_eq!(available_of_accessory(&db, &accessory.id).await, 6);

    let items = db.transactions().items(&txn.id).await.unwrap();
    assert_eq!(items.products.len(), 1);
    assert_eq!(items.accessories.len(), 1);
    assert_eq!(items.products[0].quantity, 3);
}

#[tokio::test]
async fn oversell_rejected_and_stock_unchanged() {
    let db = setup().await;
    let product = product_with_stock(&db, "Redmi 14C", 2).await;

    let err = db
        .ledger()
        .create_transaction(&draft(
            None,
            100,
            100,
            vec![product_line(&product, 5)],
            vec![],
        ))
        .await
        .unwrap_err();

    match err {
        LedgerError::Core(CoreError::InsufficientStock {
            available,
            requested,
            ..
        }) => {
            assert_eq!(available, 2);
            assert_eq!(requested, 5);
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }

    assert_eq!(available_of_product(&db, &product.id).await, 2);
    // The header never survives a failed composition
    assert!(db.transactions().list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn failing_second_line_rolls_back_first_line() {
    let db = setup().await;
    let in_stock = product_with_stock(&db, "Vivo Y29", 5).await;
    let sold_out = product_with_stock(&db, "Nokia 105", 0).await;

    let err = db
        .ledger()
        .create_transaction(&draft(
            None,
            100,
            100,
            vec![product_line(&in_stock, 1), product_line(&sold_out, 1)],
            vec![],
        ))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        LedgerError::Core(CoreError::InsufficientStock { .. })
    ));

    // First line's decrement was rolled back with the rest
    assert_eq!(available_of_product(&db, &in_stock.id).await, 5);
    assert!(db.transactions().list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn missing_item_is_not_found() {
    let db = setup().await;

    let err = db
        .ledger()
        .create_transaction(&draft(
            None,
            100,
            100,
            vec![LineDraft {
                item_id: Some("no-such-product".to_string()),
                name: "Ghost".to_string(),
                unit_price_cents: 100,
                quantity: 1,
            }],
            vec![],
        ))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        LedgerError::Db(DbError::NotFound { .. })
    ));
}

#[tokio::test]
async fn invalid_draft_is_rejected_before_any_write() {
    let db = setup().await;
    let product = product_with_stock(&db, "Tecno Spark 30", 5).await;

    let mut bad = draft(None, 100, 100, vec![product_line(&product, 1)], vec![]);
    bad.user_id = "".to_string();

    let err = db.ledger().create_transaction(&bad).await.unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Core(CoreError::InvalidTransactionData { .. })
    ));

    assert_eq!(available_of_product(&db, &product.id).await, 5);
    assert!(db.transactions().list_all().await.unwrap().is_empty());
}

// =============================================================================
// Deletion reverses effects exactly
// =============================================================================

#[tokio::test]
async fn delete_restores_stock_and_balance_exactly_once() {
    let db = setup().await;
    let product = product_with_stock(&db, "Galaxy A36", 5).await;
    let buyer = buyer_with_udhar(&db, "Ahmed Khan", 0).await;

    let txn = db
        .ledger()
        .create_transaction(&draft(
            Some(&buyer.id),
            1_000,
            400,
            vec![product_line(&product, 3)],
            vec![],
        ))
        .await
        .unwrap();

    assert_eq!(available_of_product(&db, &product.id).await, 2);
    assert_eq!(balance_of(&db, &buyer.id).await, 600);

    db.ledger().delete_transaction(&txn.id).await.unwrap();

    assert_eq!(available_of_product(&db, &product.id).await, 5);
    assert_eq!(balance_of(&db, &buyer.id).await, 0);

    // No double reversal: the second delete finds nothing
    let err = db.ledger().delete_transaction(&txn.id).await.unwrap_err();
    assert!(matches!(err, LedgerError::Db(DbError::NotFound { .. })));
    assert_eq!(available_of_product(&db, &product.id).await, 5);
    assert_eq!(balance_of(&db, &buyer.id).await, 0);
}

#[tokio::test]
async fn delete_restores_multiple_lines_in_bulk() {
    let db = setup().await;
    let phone = product_with_stock(&db, "Infinix Hot 50", 8).await;
    let charger = accessory_with_stock(&db, "Car Charger", 12).await;
    let handsfree = accessory_with_stock(&db, "Wired Handsfree", 7).await;

    let txn = db
        .ledger()
        .create_transaction(&draft(
            None,
            500,
            500,
            vec![product_line(&phone, 2)],
            vec![accessory_line(&charger, 5), accessory_line(&handsfree, 3)],
        ))
        .await
        .unwrap();

    assert_eq!(available_of_product(&db, &phone.id).await, 6);
    assert_eq!(available_of_accessory(&db, &charger.id).await, 7);
    assert_eq!(available_of_accessory(&db, &handsfree.id).await, 4);

    db.ledger().delete_transaction(&txn.id).await.unwrap();

    assert_eq!(available_of_product(&db, &phone.id).await, 8);
    assert_eq!(available_of_accessory(&db, &charger.id).await, 12);
    assert_eq!(available_of_accessory(&db, &handsfree.id).await, 7);
}

// =============================================================================
// Udhar accounting
// =============================================================================

#[tokio::test]
async fn udhar_balance_tracks_sum_over_existing_transactions() {
    let db = setup().await;
    let product = product_with_stock(&db, "Redmi Note 14", 50).await;
    let buyer = buyer_with_udhar(&db, "Bilal Traders", 0).await;

    // Credit sale: +600
    let first = db
        .ledger()
        .create_transaction(&draft(
            Some(&buyer.id),
            1_000,
            400,
            vec![product_line(&product, 1)],
            vec![],
        ))
        .await
        .unwrap();
    assert_eq!(balance_of(&db, &buyer.id).await, 600);

    // Fully paid sale: no change
    db.ledger()
        .create_transaction(&draft(
            Some(&buyer.id),
            500,
            500,
            vec![product_line(&product, 1)],
            vec![],
        ))
        .await
        .unwrap();
    assert_eq!(balance_of(&db, &buyer.id).await, 600);

    // Deleting the credit sale removes its contribution
    db.ledger().delete_transaction(&first.id).await.unwrap();
    assert_eq!(balance_of(&db, &buyer.id).await, 0);

    assert!(db
        .ledger()
        .reconcile_buyer_balances()
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn pay_udhar_reduces_balance() {
    let db = setup().await;
    // 200.00 owed
    let buyer = buyer_with_udhar(&db, "Saeed Mobile", 20_000).await;

    let txn = db
        .ledger()
        .pay_udhar(&UdharPaymentDraft {
            buyer_id: Some(buyer.id.clone()),
            user_id: "staff-1".to_string(),
            paid_amount_cents: 5_000, // 50.00
            payment_method: PaymentMethod::Cash,
        })
        .await
        .unwrap();

    // 200.00 - 50.00 = 150.00
    assert_eq!(balance_of(&db, &buyer.id).await, 15_000);
    assert!(txn.is_udhar_payment);
    assert_eq!(txn.total_amount_cents, 0);

    // A payment transaction carries no lines
    let items = db.transactions().items(&txn.id).await.unwrap();
    assert!(items.products.is_empty());
    assert!(items.accessories.is_empty());
}

#[tokio::test]
async fn pay_udhar_requires_positive_amount() {
    let db = setup().await;
    let buyer = buyer_with_udhar(&db, "Farhan Bhai", 1_000).await;

    let err = db
        .ledger()
        .pay_udhar(&UdharPaymentDraft {
            buyer_id: Some(buyer.id.clone()),
            user_id: "staff-1".to_string(),
            paid_amount_cents: 0,
            payment_method: PaymentMethod::Cash,
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        LedgerError::Core(CoreError::InvalidTransactionData { .. })
    ));
    assert_eq!(balance_of(&db, &buyer.id).await, 1_000);
}

#[tokio::test]
async fn deleting_udhar_payment_restores_balance() {
    let db = setup().await;
    let buyer = buyer_with_udhar(&db, "Ahmed Khan", 10_000).await;

    let txn = db
        .ledger()
        .pay_udhar(&UdharPaymentDraft {
            buyer_id: Some(buyer.id.clone()),
            user_id: "staff-1".to_string(),
            paid_amount_cents: 4_000,
            payment_method: PaymentMethod::MobileWallet,
        })
        .await
        .unwrap();
    assert_eq!(balance_of(&db, &buyer.id).await, 6_000);

    db.ledger().delete_transaction(&txn.id).await.unwrap();
    assert_eq!(balance_of(&db, &buyer.id).await, 10_000);
}

#[tokio::test]
async fn cash_sale_without_buyer_touches_no_balance() {
    let db = setup().await;
    let product = product_with_stock(&db, "Nokia 110", 4).await;
    let buyer = buyer_with_udhar(&db, "Bystander", 7_500).await;

    db.ledger()
        .create_transaction(&draft(
            None,
            1_000,
            1_000,
            vec![product_line(&product, 1)],
            vec![],
        ))
        .await
        .unwrap();

    assert_eq!(balance_of(&db, &buyer.id).await, 7_500);
    assert!(db
        .ledger()
        .reconcile_buyer_balances()
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn update_paid_amount_applies_delta_only() {
    let db = setup().await;
    let product = product_with_stock(&db, "Itel Value 100", 10).await;
    let buyer = buyer_with_udhar(&db, "Bilal Traders", 0).await;

    let txn = db
        .ledger()
        .create_transaction(&draft(
            Some(&buyer.id),
            1_000,
            0,
            vec![product_line(&product, 1)],
            vec![],
        ))
        .await
        .unwrap();
    assert_eq!(balance_of(&db, &buyer.id).await, 1_000);

    // Buyer comes back and pays the open amount on the same receipt
    db.ledger()
        .update_paid_amount(&txn.id, 1_000)
        .await
        .unwrap();

    assert_eq!(balance_of(&db, &buyer.id).await, 0);
    let stored = db
        .transactions()
        .get_by_id(&txn.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.paid_amount_cents, 1_000);

    // Correcting back down grows the balance again
    db.ledger().update_paid_amount(&txn.id, 250).await.unwrap();
    assert_eq!(balance_of(&db, &buyer.id).await, 750);

    assert!(db
        .ledger()
        .reconcile_buyer_balances()
        .await
        .unwrap()
        .is_empty());
}

// =============================================================================
// Line quantity updates (net delta rule)
// =============================================================================

#[tokio::test]
async fn quantity_update_applies_net_delta_with_boundary() {
    let db = setup().await;
    let product = product_with_stock(&db, "Galaxy A16", 5).await;

    let txn = db
        .ledger()
        .create_transaction(&draft(
            None,
            100,
            100,
            vec![product_line(&product, 3)],
            vec![],
        ))
        .await
        .unwrap();
    assert_eq!(available_of_product(&db, &product.id).await, 2);

    let line_id = db.transactions().items(&txn.id).await.unwrap().products[0]
        .id
        .clone();

    // Growing to exactly the remaining stock succeeds: 2 - (5 - 3) = 0
    db.ledger()
        .update_line_quantity(CatalogKind::Product, &line_id, 5)
        .await
        .unwrap();
    assert_eq!(available_of_product(&db, &product.id).await, 0);

    // One past the boundary is refused and nothing moves
    let err = db
        .ledger()
        .update_line_quantity(CatalogKind::Product, &line_id, 6)
        .await
        .unwrap_err();
    match err {
        LedgerError::Core(CoreError::InsufficientStock {
            available,
            requested,
            ..
        }) => {
            assert_eq!(available, 0);
            assert_eq!(requested, 6);
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }
    assert_eq!(available_of_product(&db, &product.id).await, 0);
    let line = db.transactions().items(&txn.id).await.unwrap().products[0].clone();
    assert_eq!(line.quantity, 5);

    // Shrinking releases stock
    db.ledger()
        .update_line_quantity(CatalogKind::Product, &line_id, 1)
        .await
        .unwrap();
    assert_eq!(available_of_product(&db, &product.id).await, 4);
}

#[tokio::test]
async fn quantity_update_rejects_non_positive() {
    let db = setup().await;
    let accessory = accessory_with_stock(&db, "TWS Earbuds", 6).await;

    let txn = db
        .ledger()
        .create_transaction(&draft(
            None,
            100,
            100,
            vec![],
            vec![accessory_line(&accessory, 2)],
        ))
        .await
        .unwrap();
    let line_id = db.transactions().items(&txn.id).await.unwrap().accessories[0]
        .id
        .clone();

    let err = db
        .ledger()
        .update_line_quantity(CatalogKind::Accessory, &line_id, 0)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Core(CoreError::Validation(_))));
    assert_eq!(available_of_accessory(&db, &accessory.id).await, 4);
}

// =============================================================================
// Tombstones
// =============================================================================

#[tokio::test]
async fn deleted_item_tombstones_lines_and_keeps_snapshot() {
    let db = setup().await;
    let product = product_with_stock(&db, "Galaxy A36", 5).await;
    let buyer = buyer_with_udhar(&db, "Ahmed Khan", 0).await;

    let txn = db
        .ledger()
        .create_transaction(&draft(
            Some(&buyer.id),
            3_000_000,
            1_000_000,
            vec![product_line(&product, 2)],
            vec![],
        ))
        .await
        .unwrap();

    db.products().delete(&product.id).await.unwrap();

    let line = db.transactions().items(&txn.id).await.unwrap().products[0].clone();
    assert_eq!(line.item_id, None);
    assert_eq!(line.name_snapshot, "Galaxy A36");
    assert_eq!(line.unit_price_cents, 3_000_000);
    assert_eq!(line.quantity, 2);

    // Deleting the transaction still reverses the balance; the tombstoned
    // line has no stock to restore
    db.ledger().delete_transaction(&txn.id).await.unwrap();
    assert_eq!(balance_of(&db, &buyer.id).await, 0);
}

#[tokio::test]
async fn tombstoned_line_quantity_update_skips_stock() {
    let db = setup().await;
    let accessory = accessory_with_stock(&db, "Neckband", 9).await;

    let txn = db
        .ledger()
        .create_transaction(&draft(
            None,
            100,
            100,
            vec![],
            vec![accessory_line(&accessory, 3)],
        ))
        .await
        .unwrap();
    let line_id = db.transactions().items(&txn.id).await.unwrap().accessories[0]
        .id
        .clone();

    db.accessories().delete(&accessory.id).await.unwrap();

    // No stock side to touch, the line row still updates
    db.ledger()
        .update_line_quantity(CatalogKind::Accessory, &line_id, 7)
        .await
        .unwrap();
    let line = db.transactions().items(&txn.id).await.unwrap().accessories[0].clone();
    assert_eq!(line.quantity, 7);
    assert_eq!(line.item_id, None);
}

// =============================================================================
// Reconciliation oracle
// =============================================================================

#[tokio::test]
async fn reconcile_is_clean_after_mixed_operations() {
    let db = setup().await;
    let product = product_with_stock(&db, "Redmi Note 14", 40).await;
    let accessory = accessory_with_stock(&db, "Silicone Cover", 30).await;
    let karim = buyer_with_udhar(&db, "Karim", 0).await;
    let nadia = buyer_with_udhar(&db, "Nadia", 5_000).await;

    let t1 = db
        .ledger()
        .create_transaction(&draft(
            Some(&karim.id),
            2_000,
            500,
            vec![product_line(&product, 2)],
            vec![accessory_line(&accessory, 1)],
        ))
        .await
        .unwrap();
    db.ledger()
        .create_transaction(&draft(
            Some(&nadia.id),
            900,
            900,
            vec![],
            vec![accessory_line(&accessory, 3)],
        ))
        .await
        .unwrap();
    db.ledger()
        .pay_udhar(&UdharPaymentDraft {
            buyer_id: Some(nadia.id.clone()),
            user_id: "staff-2".to_string(),
            paid_amount_cents: 2_000,
            payment_method: PaymentMethod::BankTransfer,
        })
        .await
        .unwrap();
    db.ledger().update_paid_amount(&t1.id, 2_000).await.unwrap();
    db.ledger().delete_transaction(&t1.id).await.unwrap();

    // Karim ends where he started; Nadia keeps her opening 50.00 minus
    // the 20.00 payment. Stock reflects only the surviving sale.
    assert_eq!(balance_of(&db, &karim.id).await, 0);
    assert_eq!(balance_of(&db, &nadia.id).await, 3_000);
    assert_eq!(available_of_product(&db, &product.id).await, 40);
    assert_eq!(available_of_accessory(&db, &accessory.id).await, 27);

    assert!(db
        .ledger()
        .reconcile_buyer_balances()
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn reconcile_reports_out_of_band_drift() {
    let db = setup().await;
    let buyer = buyer_with_udhar(&db, "Karim", 0).await;
    let product = product_with_stock(&db, "Vivo Y29", 10).await;

    db.ledger()
        .create_transaction(&draft(
            Some(&buyer.id),
            1_000,
            0,
            vec![product_line(&product, 1)],
            vec![],
        ))
        .await
        .unwrap();

    // Simulate an out-of-band write corrupting the running balance
    sqlx::query("UPDATE buyers SET outstanding_udhar_cents = 9999 WHERE id = ?1")
        .bind(&buyer.id)
        .execute(db.pool())
        .await
        .unwrap();

    let drifts = db.ledger().reconcile_buyer_balances().await.unwrap();
    assert_eq!(drifts.len(), 1);
    assert_eq!(drifts[0].buyer_id, buyer.id);
    assert_eq!(drifts[0].stored_cents, 9_999);
    assert_eq!(drifts[0].computed_cents, 1_000);
    assert_eq!(drifts[0].drift().cents(), 8_999);
}
