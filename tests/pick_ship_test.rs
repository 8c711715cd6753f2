mod common;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use warehouse_api::{
    entities::{
        demand_header::{Entity as DemandHeaderEntity, DemandStatus},
        stock_allocation::{self, AllocationStatus, Entity as StockAllocationEntity},
        stock_movement::{self, Entity as StockMovementEntity},
        stock_unit::{Entity as StockUnitEntity, StockStatus},
    },
    errors::ServiceError,
    services::picking::PickConfirmation,
    WarehouseServices,
};

use common::*;

/// Seeds one item with `on_hand` put-away stock, creates a demand for
/// `ordered`, and allocates it. Returns (header_id, allocation rows).
async fn allocated_demand(
    db: &warehouse_api::db::DbPool,
    services: &WarehouseServices,
    warehouse: &WarehouseFixture,
    item_code: &str,
    order_num: &str,
    on_hand: Decimal,
    ordered: Decimal,
) -> (i64, Vec<stock_allocation::Model>) {
    let item = create_item(db, item_code).await;
    create_put_away_unit(
        db,
        item.inventory_item_id,
        warehouse.warehouse_id,
        warehouse.storage.location_id,
        on_hand,
        None,
        None,
        None,
    )
    .await;

    let (header, lines) =
        create_demand(db, warehouse.warehouse_id, order_num, &[(item.inventory_item_id, ordered)]).await;
    let outcome = services
        .allocation
        .allocate_demand(header.demand_header_id)
        .await
        .expect("allocate demand");
    assert!(outcome.success);

    let allocations = StockAllocationEntity::find()
        .filter(stock_allocation::Column::DemandLineId.eq(lines[0].demand_line_id))
        .all(db)
        .await
        .expect("query allocations");
    (header.demand_header_id, allocations)
}

fn full_confirmations(allocations: &[stock_allocation::Model]) -> Vec<PickConfirmation> {
    allocations
        .iter()
        .map(|a| PickConfirmation {
            allocation_id: a.allocation_id,
            quantity_picked: a.quantity_allocated,
        })
        .collect()
}

#[tokio::test]
async fn confirmed_picks_relocate_stock_and_flip_header() {
    let db = setup_db().await;
    let services = build_services(db.clone());
    let warehouse = setup_warehouse(&db, 1).await;

    let (header_id, allocations) = allocated_demand(
        &db,
        &services,
        &warehouse,
        "PICKME-01",
        "SO-2001",
        dec!(40),
        dec!(40),
    )
    .await;

    let outcome = services
        .picking
        .confirm_picks(header_id, full_confirmations(&allocations), Some("picker".into()))
        .await
        .expect("confirm picks");
    assert_eq!(outcome.picked_count, allocations.len());
    assert!(outcome.errors.is_empty());
    assert_eq!(outcome.header_status, DemandStatus::Picked);

    // Backing unit moved to staging with picked status and no
    // remaining availability.
    let unit = StockUnitEntity::find_by_id(allocations[0].stock_unit_id)
        .one(&*db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(unit.location_id, warehouse.staging.location_id);
    assert_eq!(unit.stock_status(), Some(StockStatus::Picked));
    assert_eq!(unit.quantity_available, dec!(0));

    let movements = StockMovementEntity::find()
        .filter(stock_movement::Column::MovementType.eq("picking"))
        .all(&*db)
        .await
        .unwrap();
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].from_location_id, Some(warehouse.storage.location_id));
    assert_eq!(movements[0].to_location_id, warehouse.staging.location_id);

    let header = DemandHeaderEntity::find_by_id(header_id)
        .one(&*db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(DemandStatus::from_str(&header.status), Some(DemandStatus::Picked));
}

#[tokio::test]
async fn one_overpick_blocks_the_whole_batch() {
    let db = setup_db().await;
    let services = build_services(db.clone());
    let warehouse = setup_warehouse(&db, 1).await;

    let (header_id, allocations) = allocated_demand(
        &db,
        &services,
        &warehouse,
        "PICKME-02",
        "SO-2002",
        dec!(40),
        dec!(40),
    )
    .await;

    let mut confirmations = full_confirmations(&allocations);
    confirmations[0].quantity_picked += dec!(1);

    let err = services
        .picking
        .confirm_picks(header_id, confirmations, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::QuantityMismatch(_)));

    // Nothing was applied.
    let allocation = StockAllocationEntity::find_by_id(allocations[0].allocation_id)
        .one(&*db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(allocation.quantity_picked, dec!(0));
    assert_eq!(
        AllocationStatus::from_str(&allocation.status),
        Some(AllocationStatus::Allocated)
    );

    let header = DemandHeaderEntity::find_by_id(header_id)
        .one(&*db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        DemandStatus::from_str(&header.status),
        Some(DemandStatus::Allocated)
    );
}

#[tokio::test]
async fn picking_requires_allocated_header() {
    let db = setup_db().await;
    let services = build_services(db.clone());
    let warehouse = setup_warehouse(&db, 1).await;
    let item = create_item(&db, "PICKME-03").await;

    let (header, _) =
        create_demand(&db, warehouse.warehouse_id, "SO-2003", &[(item.inventory_item_id, dec!(5))]).await;

    let err = services
        .picking
        .confirm_picks(header.demand_header_id, vec![], None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidStateTransition(_)));
}

#[tokio::test]
async fn shipping_an_allocated_demand_is_rejected_with_guidance() {
    let db = setup_db().await;
    let services = build_services(db.clone());
    let warehouse = setup_warehouse(&db, 1).await;

    let (header_id, allocations) = allocated_demand(
        &db,
        &services,
        &warehouse,
        "SHIP-01",
        "SO-2004",
        dec!(100),
        dec!(40),
    )
    .await;

    let err = services.shipment.ship(header_id).await.unwrap_err();
    match err {
        ServiceError::InvalidStateTransition(msg) => {
            assert!(msg.contains("confirm picks first"))
        }
        other => panic!("expected InvalidStateTransition, got {:?}", other),
    }

    // Zero quantity changes.
    let unit = StockUnitEntity::find_by_id(allocations[0].stock_unit_id)
        .one(&*db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(unit.quantity_on_hand, dec!(100));
    assert_eq!(unit.quantity_allocated, dec!(40));
    assert_eq!(unit.quantity_shipped, dec!(0));
}

#[tokio::test]
async fn shipment_deducts_on_hand_and_releases_reservation() {
    let db = setup_db().await;
    let services = build_services(db.clone());
    let warehouse = setup_warehouse(&db, 1).await;

    let (header_id, allocations) = allocated_demand(
        &db,
        &services,
        &warehouse,
        "SHIP-02",
        "SO-2005",
        dec!(100),
        dec!(40),
    )
    .await;

    services
        .picking
        .confirm_picks(header_id, full_confirmations(&allocations), None)
        .await
        .expect("confirm picks");

    let outcome = services.shipment.ship(header_id).await.expect("ship");
    assert!(outcome.success);
    assert_eq!(outcome.header_status, DemandStatus::Shipped);
    assert_eq!(outcome.deducted_items.len(), 1);
    assert_eq!(outcome.deducted_items[0].quantity_deducted, dec!(40));

    let unit = StockUnitEntity::find_by_id(allocations[0].stock_unit_id)
        .one(&*db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(unit.quantity_on_hand, dec!(60));
    assert_eq!(unit.quantity_allocated, dec!(0));
    assert_eq!(unit.quantity_shipped, dec!(40));

    let allocation = StockAllocationEntity::find_by_id(allocations[0].allocation_id)
        .one(&*db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(allocation.quantity_shipped, dec!(40));
    assert_eq!(
        AllocationStatus::from_str(&allocation.status),
        Some(AllocationStatus::Shipped)
    );

    // Shipment is a deduction in place: no shipment movements.
    let movements = StockMovementEntity::find()
        .filter(stock_movement::Column::MovementType.eq("shipment"))
        .all(&*db)
        .await
        .unwrap();
    assert!(movements.is_empty());
}

#[tokio::test]
async fn shipment_shortage_accumulates_without_blocking_peers() {
    let db = setup_db().await;
    let services = build_services(db.clone());
    let warehouse = setup_warehouse(&db, 1).await;

    // Item A can only cover 6 of 10 ordered; item B is fully covered.
    let item_a = create_item(&db, "SHORT-01").await;
    let item_b = create_item(&db, "COVERED-01").await;
    create_put_away_unit(
        &db,
        item_a.inventory_item_id,
        1,
        warehouse.storage.location_id,
        dec!(6),
        None,
        None,
        None,
    )
    .await;
    create_put_away_unit(
        &db,
        item_b.inventory_item_id,
        1,
        warehouse.storage_b.location_id,
        dec!(20),
        None,
        None,
        None,
    )
    .await;

    let (header, lines) = create_demand(
        &db,
        1,
        "SO-2006",
        &[
            (item_a.inventory_item_id, dec!(10)),
            (item_b.inventory_item_id, dec!(20)),
        ],
    )
    .await;

    services
        .allocation
        .allocate_demand(header.demand_header_id)
        .await
        .expect("allocate demand");

    let line_ids: Vec<i64> = lines.iter().map(|l| l.demand_line_id).collect();
    let allocations = StockAllocationEntity::find()
        .filter(stock_allocation::Column::DemandLineId.is_in(line_ids))
        .all(&*db)
        .await
        .unwrap();
    services
        .picking
        .confirm_picks(header.demand_header_id, full_confirmations(&allocations), None)
        .await
        .expect("confirm picks");

    let outcome = services.shipment.ship(header.demand_header_id).await.expect("ship");
    assert!(!outcome.success);
    assert_eq!(outcome.errors.len(), 1);
    assert!(outcome.errors[0].contains(&item_a.inventory_item_id.to_string()));

    let short = outcome
        .deducted_items
        .iter()
        .find(|d| d.inventory_item_id == item_a.inventory_item_id)
        .unwrap();
    assert_eq!(short.quantity_deducted, dec!(6));
    let covered = outcome
        .deducted_items
        .iter()
        .find(|d| d.inventory_item_id == item_b.inventory_item_id)
        .unwrap();
    assert_eq!(covered.quantity_deducted, dec!(20));

    // Partial success leaves the header picked for a retry or manual fix.
    let header = DemandHeaderEntity::find_by_id(header.demand_header_id)
        .one(&*db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(DemandStatus::from_str(&header.status), Some(DemandStatus::Picked));
}
