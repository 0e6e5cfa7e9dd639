//! Order notifications
//!
//! Engine operations publish [`OrderNotification`]s on a broadcast channel
//! after their write commits. Delivery is fire-and-forget: a missing or slow
//! subscriber never affects the order.

pub mod worker;

pub use worker::NotificationWorker;

use serde::Serialize;
use shared::order::{Order, OrderStatus, PaymentStatus};
use tokio::sync::broadcast;
use uuid::Uuid;

/// What happened to the order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum NotificationKind {
    OrderPlaced,
    StatusChanged { from: OrderStatus, to: OrderStatus },
    PaymentSucceeded,
    PaymentFailed { reason: Option<String> },
    Refunded { amount: f64, status: PaymentStatus },
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderNotification {
    pub id: Uuid,
    pub order_number: String,
    pub customer_id: String,
    pub kind: NotificationKind,
    pub timestamp: i64,
}

impl OrderNotification {
    pub fn new(order: &Order, kind: NotificationKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_number: order.order_number.clone(),
            customer_id: order.customer_id.clone(),
            kind,
            timestamp: order.updated_at,
        }
    }
}

/// Sending half of the notification channel
#[derive(Clone)]
pub struct Notifier {
    tx: broadcast::Sender<OrderNotification>,
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OrderNotification> {
        self.tx.subscribe()
    }

    /// Publish without waiting; dropped when nobody is listening
    pub fn publish(&self, notification: OrderNotification) {
        if self.tx.send(notification).is_err() {
            tracing::trace!("No notification subscribers");
        }
    }
}

/// Delivers notifications to the outside world (email, SMS, push...)
#[async_trait::async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn dispatch(&self, notification: &OrderNotification) -> anyhow::Result<()>;
}

/// Default dispatcher: structured log line per notification
pub struct LogDispatcher;

#[async_trait::async_trait]
impl NotificationDispatcher for LogDispatcher {
    async fn dispatch(&self, notification: &OrderNotification) -> anyhow::Result<()> {
        tracing::info!(
            target: "notify",
            id = %notification.id,
            order_number = %notification.order_number,
            customer_id = %notification.customer_id,
            kind = ?notification.kind,
            "Order notification"
        );
        Ok(())
    }
}
