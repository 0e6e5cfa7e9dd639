//! Notification background worker
//!
//! Drains the broadcast channel into a [`NotificationDispatcher`].
//! Exits when the channel closes or on shutdown.

use super::{NotificationDispatcher, OrderNotification};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;

pub struct NotificationWorker {
    dispatcher: Arc<dyn NotificationDispatcher>,
}

impl NotificationWorker {
    pub fn new(dispatcher: Arc<dyn NotificationDispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Run the worker (until the channel closes or `shutdown` fires)
    pub async fn run(
        self,
        mut rx: broadcast::Receiver<OrderNotification>,
        shutdown: CancellationToken,
    ) {
        tracing::info!("Notification worker started");

        loop {
            let notification = tokio::select! {
                _ = shutdown.cancelled() => break,
                received = rx.recv() => match received {
                    Ok(n) => n,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Notification worker lagged, notifications dropped");
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                },
            };

            if let Err(e) = self.dispatcher.dispatch(&notification).await {
                tracing::error!(
                    order_number = %notification.order_number,
                    error = %e,
                    "Failed to dispatch notification"
                );
            }
        }

        tracing::info!("Notification worker stopping");
    }
}
