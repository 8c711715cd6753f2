mod common;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use warehouse_api::{
    entities::{
        receipt_header::{Entity as ReceiptHeaderEntity, ReceiptStatus},
        receipt_line::Entity as ReceiptLineEntity,
        stock_movement::{self, Entity as StockMovementEntity},
        stock_unit::{self, Disposition, Entity as StockUnitEntity, StockStatus},
    },
    errors::ServiceError,
    services::putaway::PutawaySplit,
};

use common::*;

fn good_split(quantity: Decimal, location_id: i32) -> PutawaySplit {
    PutawaySplit {
        quantity,
        location_id,
        disposition: Disposition::Good,
        pallet_id: None,
    }
}

fn split(quantity: Decimal, location_id: i32, disposition: Disposition) -> PutawaySplit {
    PutawaySplit {
        quantity,
        location_id,
        disposition,
        pallet_id: None,
    }
}

/// Receives one line of `quantity` for a fresh item and returns the
/// receipt line, ready for putaway.
async fn received_line(
    db: &warehouse_api::db::DbPool,
    services: &warehouse_api::WarehouseServices,
    warehouse: &WarehouseFixture,
    item_code: &str,
    quantity: Decimal,
) -> i64 {
    create_item(db, item_code).await;
    let (header, lines) = services
        .receiving
        .create_receipt(
            format!("RCV-{}", item_code),
            warehouse.warehouse_id,
            None,
            vec![warehouse_api::services::receiving::ReceiptLineRequest {
                item_code: item_code.to_string(),
                expected_quantity: quantity,
                batch_number: Some("B-100".to_string()),
                expiry_date: Some(date("2026-03-01")),
                manufacture_date: Some(date("2025-09-01")),
                pallet_id: None,
            }],
        )
        .await
        .expect("create receipt");
    let line_id = lines[0].receipt_line_id;
    let confirmation = services
        .receiving
        .confirm_receipt(header.receipt_header_id, vec![(line_id, quantity)])
        .await
        .expect("confirm receipt");
    assert!(confirmation.success);
    line_id
}

async fn units_for_line(db: &warehouse_api::db::DbPool, line_id: i64) -> Vec<stock_unit::Model> {
    StockUnitEntity::find()
        .filter(stock_unit::Column::ReceiptLineId.eq(line_id))
        .all(db)
        .await
        .expect("query units")
}

#[tokio::test]
async fn full_good_putaway_relocates_staging_unit() {
    let db = setup_db().await;
    let services = build_services(db.clone());
    let warehouse = setup_warehouse(&db, 1).await;

    let line_id = received_line(&db, &services, &warehouse, "WIDGET-01", dec!(100)).await;

    let before = units_for_line(&db, line_id).await;
    assert_eq!(before.len(), 1);
    assert_eq!(before[0].location_id, warehouse.staging.location_id);
    assert_eq!(before[0].quantity_available, dec!(0));

    let outcome = services
        .putaway
        .putaway(
            line_id,
            vec![good_split(dec!(100), warehouse.storage.location_id)],
            Some("tester".to_string()),
        )
        .await
        .expect("putaway");
    assert!(outcome.success);

    // Relocated, not duplicated.
    let after = units_for_line(&db, line_id).await;
    assert_eq!(after.len(), 1);
    let unit = &after[0];
    assert_eq!(unit.location_id, warehouse.storage.location_id);
    assert_eq!(unit.stock_status(), Some(StockStatus::PutAway));
    assert_eq!(unit.quantity_on_hand, dec!(100));
    assert_eq!(unit.quantity_available, dec!(100));

    // One putaway movement from staging to storage.
    let movements = StockMovementEntity::find()
        .filter(stock_movement::Column::ReferenceId.eq(line_id))
        .all(&*db)
        .await
        .expect("query movements");
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].movement_type, "putaway");
    assert_eq!(
        movements[0].from_location_id,
        Some(warehouse.staging.location_id)
    );
    assert_eq!(movements[0].to_location_id, warehouse.storage.location_id);

    // Only line fully put away: header flips.
    let line = ReceiptLineEntity::find_by_id(line_id)
        .one(&*db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(line.quantity_put_away, dec!(100));
    let header = ReceiptHeaderEntity::find_by_id(line.receipt_header_id)
        .one(&*db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(ReceiptStatus::from_str(&header.status), Some(ReceiptStatus::PutAway));
}

#[tokio::test]
async fn split_putaway_preserves_total_quantity() {
    let db = setup_db().await;
    let services = build_services(db.clone());
    let warehouse = setup_warehouse(&db, 1).await;
    let missing_loc = create_location(&db, 1, "MISS-01", "Missing stock").await;

    let line_id = received_line(&db, &services, &warehouse, "WIDGET-02", dec!(100)).await;

    let outcome = services
        .putaway
        .putaway(
            line_id,
            vec![
                good_split(dec!(70), warehouse.storage.location_id),
                split(dec!(20), warehouse.damage.location_id, Disposition::Damage),
                split(dec!(10), missing_loc.location_id, Disposition::Missing),
            ],
            None,
        )
        .await
        .expect("putaway");
    assert!(outcome.success);

    let units = units_for_line(&db, line_id).await;
    assert_eq!(units.len(), 3);

    let total: Decimal = units.iter().map(|u| u.quantity_on_hand).sum();
    assert_eq!(total, dec!(100));

    let good = units
        .iter()
        .find(|u| u.disposition.as_deref() == Some("good"))
        .unwrap();
    assert_eq!(good.location_id, warehouse.storage.location_id);
    assert_eq!(good.quantity_on_hand, dec!(70));
    assert_eq!(good.quantity_available, dec!(70));

    let damaged = units
        .iter()
        .find(|u| u.disposition.as_deref() == Some("damage"))
        .unwrap();
    assert_eq!(damaged.quantity_on_hand, dec!(20));
    // Damage locations never contribute availability.
    assert_eq!(damaged.quantity_available, dec!(0));
    assert!(damaged.pallet_id.as_deref().unwrap().starts_with("DAM-"));

    let missing = units
        .iter()
        .find(|u| u.disposition.as_deref() == Some("missing"))
        .unwrap();
    assert_eq!(missing.quantity_available, dec!(0));
    assert!(missing.pallet_id.as_deref().unwrap().starts_with("MIS-"));

    assert_eq!(outcome.pallet_ids_by_disposition[&Disposition::Damage].len(), 1);

    let movements = StockMovementEntity::find()
        .filter(stock_movement::Column::ReferenceId.eq(line_id))
        .all(&*db)
        .await
        .expect("query movements");
    assert_eq!(movements.len(), 3);
    assert!(movements.iter().all(|m| m.movement_type == "putaway"));
}

#[tokio::test]
async fn mismatched_splits_are_rejected_before_any_mutation() {
    let db = setup_db().await;
    let services = build_services(db.clone());
    let warehouse = setup_warehouse(&db, 1).await;

    let line_id = received_line(&db, &services, &warehouse, "WIDGET-03", dec!(100)).await;

    let err = services
        .putaway
        .putaway(
            line_id,
            vec![good_split(dec!(90), warehouse.storage.location_id)],
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::QuantityMismatch(_)));

    // Nothing moved: the staging unit is untouched.
    let units = units_for_line(&db, line_id).await;
    assert_eq!(units.len(), 1);
    assert_eq!(units[0].location_id, warehouse.staging.location_id);
    assert_eq!(units[0].stock_status(), Some(StockStatus::Received));
}

#[tokio::test]
async fn resubmitting_identical_splits_does_not_double_count() {
    let db = setup_db().await;
    let services = build_services(db.clone());
    let warehouse = setup_warehouse(&db, 1).await;

    let line_id = received_line(&db, &services, &warehouse, "WIDGET-04", dec!(60)).await;

    let splits = vec![
        good_split(dec!(45), warehouse.storage.location_id),
        split(dec!(15), warehouse.damage.location_id, Disposition::Damage),
    ];

    let first = services
        .putaway
        .putaway(line_id, splits.clone(), None)
        .await
        .expect("first putaway");
    assert!(first.success);

    let second = services
        .putaway
        .putaway(line_id, splits, None)
        .await
        .expect("second putaway");
    assert!(second.success);

    let units = units_for_line(&db, line_id).await;
    assert_eq!(units.len(), 2, "retry must not create more units");
    let total: Decimal = units.iter().map(|u| u.quantity_on_hand).sum();
    assert_eq!(total, dec!(60), "retry must not change total on-hand");
}

#[tokio::test]
async fn missing_staging_unit_is_compensated() {
    let db = setup_db().await;
    let services = build_services(db.clone());
    let warehouse = setup_warehouse(&db, 1).await;

    // A received line with no staging unit behind it (upstream gap).
    create_item(&db, "WIDGET-05").await;
    let header = create_receipt_header(&db, 1, "RCV-GAP", "RECEIVED").await;
    let line = create_receipt_line(&db, header.receipt_header_id, "WIDGET-05", dec!(30), None, None).await;
    mark_line_received(&db, &line, dec!(30)).await;

    let outcome = services
        .putaway
        .putaway(
            line.receipt_line_id,
            vec![good_split(dec!(30), warehouse.storage.location_id)],
            None,
        )
        .await
        .expect("putaway");
    assert!(outcome.success);

    let units = units_for_line(&db, line.receipt_line_id).await;
    assert_eq!(units.len(), 1);
    assert_eq!(units[0].location_id, warehouse.storage.location_id);
    assert_eq!(units[0].quantity_on_hand, dec!(30));
    assert_eq!(units[0].stock_status(), Some(StockStatus::PutAway));
}

#[tokio::test]
async fn unknown_item_code_fails_with_not_found() {
    let db = setup_db().await;
    let services = build_services(db.clone());
    let warehouse = setup_warehouse(&db, 1).await;

    let header = create_receipt_header(&db, 1, "RCV-NOITEM", "RECEIVED").await;
    let line =
        create_receipt_line(&db, header.receipt_header_id, "GHOST-ITEM", dec!(10), None, None).await;
    mark_line_received(&db, &line, dec!(10)).await;

    let err = services
        .putaway
        .putaway(
            line.receipt_line_id,
            vec![good_split(dec!(10), warehouse.storage.location_id)],
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn unresolved_staging_location_is_a_hard_failure() {
    let db = setup_db().await;
    let services = build_services(db.clone());
    // Warehouse 9 has storage only, no staging-class location.
    let storage = create_location(&db, 9, "A-09-01", "Aisle A").await;

    create_item(&db, "WIDGET-06").await;
    let header = create_receipt_header(&db, 9, "RCV-NOSTG", "RECEIVED").await;
    let line =
        create_receipt_line(&db, header.receipt_header_id, "WIDGET-06", dec!(10), None, None).await;
    mark_line_received(&db, &line, dec!(10)).await;

    let err = services
        .putaway
        .putaway(
            line.receipt_line_id,
            vec![good_split(dec!(10), storage.location_id)],
            None,
        )
        .await
        .unwrap_err();
    match err {
        ServiceError::NotFound(msg) => assert!(msg.contains("staging")),
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn receipt_closes_only_after_full_putaway() {
    let db = setup_db().await;
    let services = build_services(db.clone());
    let warehouse = setup_warehouse(&db, 1).await;

    let line_id = received_line(&db, &services, &warehouse, "WIDGET-07", dec!(25)).await;
    let line = ReceiptLineEntity::find_by_id(line_id)
        .one(&*db)
        .await
        .unwrap()
        .unwrap();

    // Not yet put away: closing is rejected.
    let err = services
        .receiving
        .close_receipt(line.receipt_header_id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidStateTransition(_)));

    services
        .putaway
        .putaway(
            line_id,
            vec![good_split(dec!(25), warehouse.storage.location_id)],
            None,
        )
        .await
        .expect("putaway");

    let closed = services
        .receiving
        .close_receipt(line.receipt_header_id)
        .await
        .expect("close receipt");
    assert_eq!(ReceiptStatus::from_str(&closed.status), Some(ReceiptStatus::Complete));
}
