use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;

/// Domain events emitted after successful mutations. Consumers are
/// fire-and-forget; a failed send is logged and never fails the request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    CustomerCreated(i32),
    CustomerDeleted(i32),
    ProductCreated(i32),
    ProductDeleted(i32),
    ProductLinked {
        customer_id: i32,
        product_id: i32,
    },
    ProductUnlinked {
        customer_id: i32,
        product_id: i32,
    },
    StockReceived {
        customer_id: i32,
        product_id: i32,
        quantity: i32,
    },
    InventoryAdjusted {
        customer_id: i32,
        product_id: i32,
        old_quantity: i32,
        new_quantity: i32,
    },
    ShipmentBatchCreated {
        customer_id: i32,
        shipment_ids: Vec<i32>,
    },
    ShipmentUpdated {
        shipment_id: i32,
        quantity_delta: i32,
    },
    ShipmentReversed {
        shipment_id: i32,
        restored_quantity: i32,
    },
}

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
}

/// Drains the event channel, logging each event. Runs until every sender is
/// dropped.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        info!(?event, "domain event");
    }
    info!("event channel closed; processor exiting");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_and_drain() {
        let (tx, rx) = mpsc::channel(8);
        let sender = EventSender::new(tx);
        let handle = tokio::spawn(process_events(rx));

        sender
            .send(Event::StockReceived {
                customer_id: 1,
                product_id: 2,
                quantity: 5,
            })
            .await
            .unwrap();

        drop(sender);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn send_after_receiver_dropped_reports_error() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);
        assert!(sender.send(Event::CustomerCreated(1)).await.is_err());
    }
}
