use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::warn;

/// Events emitted by the lifecycle engines.
///
/// Quantity changes are already durable by the time an event is sent, so
/// consumers may treat these as after-the-fact notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    ReceiptConfirmed {
        receipt_header_id: i64,
        warehouse_id: i32,
        lines_received: usize,
    },
    StockPutAway {
        receipt_line_id: i64,
        inventory_item_id: i64,
        splits_applied: usize,
        total_quantity: Decimal,
    },
    StockRelocated {
        stock_unit_id: i64,
        from_location_id: Option<i32>,
        to_location_id: i32,
        quantity: Decimal,
    },
    InventoryAllocated {
        demand_line_id: i64,
        inventory_item_id: i64,
        quantity_allocated: Decimal,
        shortage: Decimal,
    },
    PicksConfirmed {
        demand_header_id: i64,
        picked_count: usize,
    },
    DemandShipped {
        demand_header_id: i64,
        items_deducted: usize,
        shipped_at: DateTime<Utc>,
    },
}

/// Cloneable handle for pushing events onto the application channel.
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of propagating a channel failure.
    /// Engine quantity paths must not fail because a consumer went away.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("Dropping event: {}", e);
        }
    }
}

/// Convenience constructor for an event channel pair.
pub fn channel(capacity: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(capacity);
    (EventSender::new(tx), rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn send_delivers_event() {
        let (sender, mut rx) = channel(8);
        sender
            .send(Event::PicksConfirmed {
                demand_header_id: 1,
                picked_count: 3,
            })
            .await
            .unwrap();
        assert!(matches!(
            rx.recv().await,
            Some(Event::PicksConfirmed { picked_count: 3, .. })
        ));
    }

    #[test]
    fn events_serialize_for_consumers() {
        let event = Event::InventoryAllocated {
            demand_line_id: 42,
            inventory_item_id: 7,
            quantity_allocated: dec!(12.5),
            shortage: dec!(0),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("InventoryAllocated"));
        assert!(json.contains("demand_line_id"));
    }

    #[tokio::test]
    async fn send_or_log_swallows_closed_channel() {
        let (sender, rx) = channel(1);
        drop(rx);
        // Must not panic or error out.
        sender
            .send_or_log(Event::StockRelocated {
                stock_unit_id: 9,
                from_location_id: Some(1),
                to_location_id: 2,
                quantity: dec!(5),
            })
            .await;
    }
}
