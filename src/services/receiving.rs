use chrono::{NaiveDate, Utc};
use futures::future::join_all;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use std::sync::Arc;
use tracing::{error, info, instrument};

use crate::{
    entities::{
        receipt_header::{self, Entity as ReceiptHeaderEntity, ReceiptStatus},
        receipt_line::{self, Entity as ReceiptLineEntity},
        stock_unit::{self, StockStatus},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{find_item_by_code, resolve_staging_location},
};

/// One expected line on an inbound notice.
#[derive(Debug, Clone)]
pub struct ReceiptLineRequest {
    pub item_code: String,
    pub expected_quantity: Decimal,
    pub batch_number: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    pub manufacture_date: Option<NaiveDate>,
    pub pallet_id: Option<String>,
}

/// Per-line outcome of a receipt confirmation.
#[derive(Debug, Clone)]
pub struct LineReceiptOutcome {
    pub receipt_line_id: i64,
    pub item_code: String,
    pub stock_unit_id: Option<i64>,
    pub error: Option<String>,
}

#[derive(Debug)]
pub struct ReceiptConfirmation {
    pub receipt_header_id: i64,
    pub lines: Vec<LineReceiptOutcome>,
    pub success: bool,
}

/// Inbound receiving: headers, expected lines, and the staging stock
/// units that putaway later relocates.
#[derive(Clone)]
pub struct ReceivingService {
    db: Arc<DatabaseConnection>,
    event_sender: Option<EventSender>,
}

impl ReceivingService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Option<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Creates a receipt header with its expected lines, status `New`.
    #[instrument(skip(self, lines))]
    pub async fn create_receipt(
        &self,
        receipt_num: String,
        warehouse_id: i32,
        vendor_id: Option<i64>,
        lines: Vec<ReceiptLineRequest>,
    ) -> Result<(receipt_header::Model, Vec<receipt_line::Model>), ServiceError> {
        let db = &*self.db;

        let header = receipt_header::ActiveModel {
            receipt_num: Set(receipt_num.clone()),
            warehouse_id: Set(warehouse_id),
            vendor_id: Set(vendor_id),
            status: Set(ReceiptStatus::New.as_str().to_string()),
            received_at: Set(None),
            created_at: Set(Utc::now()),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };
        let header = header.insert(db).await.map_err(|e| {
            error!("Failed to create receipt header: {}", e);
            ServiceError::db_error(e)
        })?;

        let mut created_lines = Vec::with_capacity(lines.len());
        for line in lines {
            if line.expected_quantity < Decimal::ZERO {
                return Err(ServiceError::ValidationError(format!(
                    "Expected quantity must be non-negative for item {}",
                    line.item_code
                )));
            }
            let model = receipt_line::ActiveModel {
                receipt_header_id: Set(header.receipt_header_id),
                item_code: Set(line.item_code),
                inventory_item_id: Set(None),
                expected_quantity: Set(line.expected_quantity),
                received_quantity: Set(Decimal::ZERO),
                quantity_put_away: Set(Decimal::ZERO),
                batch_number: Set(line.batch_number),
                expiry_date: Set(line.expiry_date),
                manufacture_date: Set(line.manufacture_date),
                pallet_id: Set(line.pallet_id),
                created_at: Set(Utc::now()),
                updated_at: Set(Utc::now()),
                ..Default::default()
            };
            created_lines.push(model.insert(db).await.map_err(ServiceError::db_error)?);
        }

        info!(
            "Receipt {} created with {} lines",
            receipt_num,
            created_lines.len()
        );
        Ok((header, created_lines))
    }

    /// Confirms physical receipt of the given quantities.
    ///
    /// Each line is validated against its expected quantity, resolved to
    /// an item, and materialized as a staging stock unit holding the full
    /// received quantity. Line failures are collected per entity; the
    /// header flips New → Received as soon as at least one line landed.
    #[instrument(skip(self, received))]
    pub async fn confirm_receipt(
        &self,
        receipt_header_id: i64,
        received: Vec<(i64, Decimal)>,
    ) -> Result<ReceiptConfirmation, ServiceError> {
        let db = &*self.db;

        let header = ReceiptHeaderEntity::find_by_id(receipt_header_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Receipt header {} not found", receipt_header_id))
            })?;

        let status = ReceiptStatus::from_str(&header.status).ok_or_else(|| {
            ServiceError::InternalError(format!("Unknown receipt status {}", header.status))
        })?;
        if status != ReceiptStatus::New {
            return Err(ServiceError::InvalidStateTransition(format!(
                "Receipt {} is {}, expected NEW",
                receipt_header_id,
                header.status
            )));
        }

        let staging = resolve_staging_location(db, header.warehouse_id).await?;

        let lines = ReceiptLineEntity::find()
            .filter(receipt_line::Column::ReceiptHeaderId.eq(receipt_header_id))
            .all(db)
            .await?;

        // Reference lookups are independent reads; fetch them concurrently.
        let item_lookups = join_all(
            lines
                .iter()
                .map(|line| find_item_by_code(db, line.item_code.clone())),
        )
        .await;

        let mut outcomes = Vec::with_capacity(received.len());
        for (line_id, quantity) in received {
            let Some((idx, line)) = lines
                .iter()
                .enumerate()
                .find(|(_, l)| l.receipt_line_id == line_id)
            else {
                outcomes.push(LineReceiptOutcome {
                    receipt_line_id: line_id,
                    item_code: String::new(),
                    stock_unit_id: None,
                    error: Some(format!("Receipt line {} not found", line_id)),
                });
                continue;
            };

            if quantity < Decimal::ZERO || quantity > line.expected_quantity {
                outcomes.push(LineReceiptOutcome {
                    receipt_line_id: line_id,
                    item_code: line.item_code.clone(),
                    stock_unit_id: None,
                    error: Some(format!(
                        "Received {} outside expected bound {} for line {}",
                        quantity, line.expected_quantity, line_id
                    )),
                });
                continue;
            }

            let item = match &item_lookups[idx] {
                Ok(item) => item.clone(),
                Err(e) => {
                    outcomes.push(LineReceiptOutcome {
                        receipt_line_id: line_id,
                        item_code: line.item_code.clone(),
                        stock_unit_id: None,
                        error: Some(e.to_string()),
                    });
                    continue;
                }
            };

            let outcome = self
                .receive_line(line, &item, quantity, header.warehouse_id, staging.location_id)
                .await;
            match outcome {
                Ok(stock_unit_id) => outcomes.push(LineReceiptOutcome {
                    receipt_line_id: line_id,
                    item_code: line.item_code.clone(),
                    stock_unit_id: Some(stock_unit_id),
                    error: None,
                }),
                Err(e) => outcomes.push(LineReceiptOutcome {
                    receipt_line_id: line_id,
                    item_code: line.item_code.clone(),
                    stock_unit_id: None,
                    error: Some(e.to_string()),
                }),
            }
        }

        let received_count = outcomes.iter().filter(|o| o.error.is_none()).count();
        let success = received_count > 0 && outcomes.iter().all(|o| o.error.is_none());

        if received_count > 0 {
            let mut active: receipt_header::ActiveModel = header.into();
            active.status = Set(ReceiptStatus::Received.as_str().to_string());
            active.received_at = Set(Some(Utc::now()));
            active.updated_at = Set(Utc::now());
            active.update(db).await.map_err(ServiceError::db_error)?;
        }

        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::ReceiptConfirmed {
                    receipt_header_id,
                    warehouse_id: staging.warehouse_id,
                    lines_received: received_count,
                })
                .await;
        }

        info!(
            "Receipt {} confirmed: {}/{} lines received",
            receipt_header_id,
            received_count,
            outcomes.len()
        );

        Ok(ReceiptConfirmation {
            receipt_header_id,
            lines: outcomes,
            success,
        })
    }

    /// Closes a fully put-away receipt, PutAway → Complete.
    #[instrument(skip(self))]
    pub async fn close_receipt(
        &self,
        receipt_header_id: i64,
    ) -> Result<receipt_header::Model, ServiceError> {
        let db = &*self.db;

        let header = ReceiptHeaderEntity::find_by_id(receipt_header_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Receipt header {} not found", receipt_header_id))
            })?;

        if ReceiptStatus::from_str(&header.status) != Some(ReceiptStatus::PutAway) {
            return Err(ServiceError::InvalidStateTransition(format!(
                "Receipt {} is {}, closing requires PUT_AWAY",
                receipt_header_id, header.status
            )));
        }

        let mut active: receipt_header::ActiveModel = header.into();
        active.status = Set(ReceiptStatus::Complete.as_str().to_string());
        active.updated_at = Set(Utc::now());
        let closed = active.update(db).await.map_err(ServiceError::db_error)?;

        info!("Receipt {} closed", receipt_header_id);
        Ok(closed)
    }

    async fn receive_line(
        &self,
        line: &receipt_line::Model,
        item: &crate::entities::item_master::Model,
        quantity: Decimal,
        warehouse_id: i32,
        staging_location_id: i32,
    ) -> Result<i64, ServiceError> {
        let db = &*self.db;

        // Staging units carry zero availability until put away.
        let unit = stock_unit::ActiveModel {
            inventory_item_id: Set(item.inventory_item_id),
            warehouse_id: Set(warehouse_id),
            location_id: Set(staging_location_id),
            pallet_id: Set(line.pallet_id.clone()),
            batch_number: Set(line.batch_number.clone()),
            manufacture_date: Set(line.manufacture_date),
            expiry_date: Set(line.expiry_date),
            quantity_on_hand: Set(quantity),
            quantity_allocated: Set(Decimal::ZERO),
            quantity_available: Set(Decimal::ZERO),
            quantity_shipped: Set(Decimal::ZERO),
            status: Set(StockStatus::Received.as_str().to_string()),
            disposition: Set(None),
            receipt_line_id: Set(Some(line.receipt_line_id)),
            unit_weight: Set(item.unit_weight),
            version: Set(1),
            created_at: Set(Utc::now()),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };
        let unit = unit.insert(db).await.map_err(ServiceError::db_error)?;

        let mut active: receipt_line::ActiveModel = line.clone().into();
        active.inventory_item_id = Set(Some(item.inventory_item_id));
        active.received_quantity = Set(quantity);
        active.updated_at = Set(Utc::now());
        active.update(db).await.map_err(ServiceError::db_error)?;

        Ok(unit.stock_unit_id)
    }
}
