use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Events emitted by the service layer. Consumed by a logging task today;
/// the enum is the seam for future outbound integrations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Catalog
    ProductCreated(Uuid),
    ProductUpdated(Uuid),
    ProductArchived(Uuid),
    ProductPriceChanged {
        product_id: Uuid,
        old_price: rust_decimal::Decimal,
        new_price: rust_decimal::Decimal,
    },

    // Commerce
    ClientCreated(i64),
    OrderCreated(i64),
    OrderStatusChanged {
        order_id: i64,
        old_status: String,
        new_status: String,
    },
    QuoteConverted {
        quote_id: i64,
        order_id: i64,
    },
    InvoiceIssued(i64),
    InvoicePaid(i64),
    WebOrderPlaced {
        web_order_id: Uuid,
        order_number: String,
    },
    WebOrderStatusChanged {
        web_order_id: Uuid,
        old_status: String,
        new_status: String,
    },

    // Stock
    StockMovementRecorded {
        movement_id: i64,
        product_id: Uuid,
        quantity: i32,
    },

    // HR / leave workflow
    LeaveRequestSubmitted(i64),
    LeaveRequestStatusChanged {
        leave_request_id: i64,
        old_status: String,
        new_status: String,
    },

    // Helpdesk
    TicketCreated(Uuid),
    TicketAssigned {
        ticket_id: Uuid,
        assignee_id: i64,
    },
    TicketStatusChanged {
        ticket_id: Uuid,
        old_status: String,
        new_status: String,
    },
    TicketSlaBreached {
        ticket_id: Uuid,
        kind: SlaBreachKind,
    },

    // Content
    BlogPostPublished(Uuid),
    ReviewModerated {
        review_id: i64,
        status: String,
    },

    // Finance
    TransactionMarkedOverdue(i64),
    TransactionPaid(i64),

    /// Catch-all with free-form metadata
    Generic {
        message: String,
        timestamp: DateTime<Utc>,
        metadata: serde_json::Value,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlaBreachKind {
    FirstResponse,
    Resolution,
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event, failing if the channel is closed or full.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("failed to send event: {e}"))
    }

    /// Sends an event; a full or closed channel is logged, never propagated.
    /// Event delivery must not fail the request that produced it.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("dropping event: {e}");
        }
    }
}

/// Build an event channel sized from configuration.
pub fn channel(capacity: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(capacity);
    (EventSender::new(tx), rx)
}

/// Consume events and log them. Spawned once at boot.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        info!(event = ?event, "domain event");
    }
    info!("event channel closed, consumer stopping");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn events_round_trip_through_the_channel() {
        let (sender, mut rx) = channel(8);
        let id = Uuid::new_v4();
        sender.send(Event::TicketCreated(id)).await.unwrap();

        match rx.recv().await {
            Some(Event::TicketCreated(received)) => assert_eq!(received, id),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn send_or_log_swallows_closed_channel() {
        let (sender, rx) = channel(1);
        drop(rx);
        // Must not panic or error out.
        sender.send_or_log(Event::ProductCreated(Uuid::new_v4())).await;
    }

    #[test]
    fn events_serialize_for_the_audit_log() {
        let event = Event::OrderStatusChanged {
            order_id: 1,
            old_status: "draft".into(),
            new_status: "confirmed".into(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("confirmed"));
    }
}
