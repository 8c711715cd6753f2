#![allow(dead_code)]

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ActiveValue::Set};
use std::sync::Arc;

use warehouse_api::{
    db::{establish_connection_with_config, run_migrations, DbConfig, DbPool},
    entities::{
        demand_header, demand_line, item_master, receipt_header, receipt_line, stock_location,
        stock_unit::{self, StockStatus},
    },
    services::{register_location, WarehouseServices},
};

/// One private in-memory store per test: a single-connection pool keeps
/// the sqlite database alive and isolated for the test's duration.
pub async fn setup_db() -> Arc<DbPool> {
    let config = DbConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
        ..Default::default()
    };
    let pool = establish_connection_with_config(&config)
        .await
        .expect("Failed to establish connection");
    run_migrations(&pool).await.expect("Failed to run migrations");
    Arc::new(pool)
}

pub fn build_services(db: Arc<DbPool>) -> WarehouseServices {
    WarehouseServices::build(db, None, vec![])
}

pub fn build_services_with_overrides(db: Arc<DbPool>, overrides: Vec<i32>) -> WarehouseServices {
    WarehouseServices::build(db, None, overrides)
}

pub async fn create_item(db: &DbPool, item_number: &str) -> item_master::Model {
    item_master::ActiveModel {
        item_number: Set(item_number.to_string()),
        description: Set(Some(format!("{} test item", item_number))),
        primary_uom_code: Set(Some("EA".to_string())),
        unit_weight: Set(None),
        status_code: Set(Some("ACTIVE".to_string())),
        created_at: Set(Utc::now()),
        updated_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create item")
}

pub async fn create_location(
    db: &DbPool,
    warehouse_id: i32,
    code: &str,
    name: &str,
) -> stock_location::Model {
    register_location(db, warehouse_id, code, name)
        .await
        .expect("Failed to register location")
}

/// Storage, staging, and damage locations for one warehouse.
pub struct WarehouseFixture {
    pub warehouse_id: i32,
    pub staging: stock_location::Model,
    pub storage: stock_location::Model,
    pub storage_b: stock_location::Model,
    pub damage: stock_location::Model,
}

pub async fn setup_warehouse(db: &DbPool, warehouse_id: i32) -> WarehouseFixture {
    WarehouseFixture {
        warehouse_id,
        staging: create_location(db, warehouse_id, "STG-01", "Inbound staging").await,
        storage: create_location(db, warehouse_id, "A-01-01", "Aisle A rack 1").await,
        storage_b: create_location(db, warehouse_id, "B-02-01", "Aisle B rack 2").await,
        damage: create_location(db, warehouse_id, "DMG-01", "Damaged goods cage").await,
    }
}

pub async fn create_receipt_header(
    db: &DbPool,
    warehouse_id: i32,
    receipt_num: &str,
    status: &str,
) -> receipt_header::Model {
    receipt_header::ActiveModel {
        receipt_num: Set(receipt_num.to_string()),
        warehouse_id: Set(warehouse_id),
        vendor_id: Set(None),
        status: Set(status.to_string()),
        received_at: Set(None),
        created_at: Set(Utc::now()),
        updated_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create receipt header")
}

pub async fn create_receipt_line(
    db: &DbPool,
    receipt_header_id: i64,
    item_code: &str,
    expected: Decimal,
    batch: Option<&str>,
    expiry: Option<NaiveDate>,
) -> receipt_line::Model {
    receipt_line::ActiveModel {
        receipt_header_id: Set(receipt_header_id),
        item_code: Set(item_code.to_string()),
        inventory_item_id: Set(None),
        expected_quantity: Set(expected),
        received_quantity: Set(Decimal::ZERO),
        quantity_put_away: Set(Decimal::ZERO),
        batch_number: Set(batch.map(str::to_string)),
        expiry_date: Set(expiry),
        manufacture_date: Set(None),
        pallet_id: Set(None),
        created_at: Set(Utc::now()),
        updated_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create receipt line")
}

pub async fn mark_line_received(db: &DbPool, line: &receipt_line::Model, received: Decimal) {
    let mut active: receipt_line::ActiveModel = line.clone().into();
    active.received_quantity = Set(received);
    active.updated_at = Set(Utc::now());
    active.update(db).await.expect("Failed to update receipt line");
}

pub async fn create_demand(
    db: &DbPool,
    warehouse_id: i32,
    order_num: &str,
    items: &[(i64, Decimal)],
) -> (demand_header::Model, Vec<demand_line::Model>) {
    let header = demand_header::ActiveModel {
        order_num: Set(order_num.to_string()),
        warehouse_id: Set(warehouse_id),
        status: Set("NEW".to_string()),
        created_at: Set(Utc::now()),
        updated_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create demand header");

    let mut lines = Vec::new();
    for (item_id, quantity) in items {
        lines.push(
            demand_line::ActiveModel {
                demand_header_id: Set(header.demand_header_id),
                inventory_item_id: Set(*item_id),
                ordered_quantity: Set(*quantity),
                created_at: Set(Utc::now()),
                updated_at: Set(Utc::now()),
                ..Default::default()
            }
            .insert(db)
            .await
            .expect("Failed to create demand line"),
        );
    }

    (header, lines)
}

/// Inserts a put-away stock unit with its derived availability in sync.
#[allow(clippy::too_many_arguments)]
pub async fn create_put_away_unit(
    db: &DbPool,
    item_id: i64,
    warehouse_id: i32,
    location_id: i32,
    on_hand: Decimal,
    batch: Option<&str>,
    expiry: Option<NaiveDate>,
    manufacture: Option<NaiveDate>,
) -> stock_unit::Model {
    stock_unit::ActiveModel {
        inventory_item_id: Set(item_id),
        warehouse_id: Set(warehouse_id),
        location_id: Set(location_id),
        pallet_id: Set(None),
        batch_number: Set(batch.map(str::to_string)),
        manufacture_date: Set(manufacture),
        expiry_date: Set(expiry),
        quantity_on_hand: Set(on_hand),
        quantity_allocated: Set(Decimal::ZERO),
        quantity_available: Set(on_hand),
        quantity_shipped: Set(Decimal::ZERO),
        status: Set(StockStatus::PutAway.as_str().to_string()),
        disposition: Set(None),
        receipt_line_id: Set(None),
        unit_weight: Set(None),
        version: Set(1),
        created_at: Set(Utc::now()),
        updated_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to create stock unit")
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("bad date literal")
}
