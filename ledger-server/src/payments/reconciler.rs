//! Payment Reconciler
//!
//! Applies asynchronous gateway callbacks to orders exactly once.
//!
//! The payment status is read together with the order version; the decision
//! is made against that snapshot and written with a version-conditioned
//! commit. When two deliveries of the same webhook race, the loser's commit
//! fails the version check, it re-reads, finds the payment settled and
//! returns a replay without touching the ledger.

use crate::core::{Config, LedgerError, LedgerResult, Resource};
use crate::ledger::LedgerDelta;
use crate::notify::{NotificationKind, Notifier, OrderNotification};
use crate::orders::state_machine::{self, DeliverySchedule};
use crate::orders::writer::{Mutation, OrderWriter};
use crate::store::{LedgerStorage, RetryPolicy, with_storage_retry};
use crate::utils::money::{MONEY_TOLERANCE, to_decimal, to_f64};
use crate::utils::validation::{MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, validate_required_text};
use serde::{Deserialize, Serialize};
use shared::error::ErrorCode;
use shared::order::{Order, OrderStatus, PaymentStatus};

/// Gateway verdict carried by a callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallbackOutcome {
    Success,
    Failure,
}

/// Payment gateway callback
///
/// Identifies the order by `order_number` or by the gateway payment id
/// registered through `begin_payment`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentCallback {
    #[serde(default)]
    pub order_number: Option<String>,
    #[serde(default)]
    pub gateway_payment_id: Option<String>,
    pub outcome: CallbackOutcome,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub failure_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileResult {
    /// The callback was applied, or had already been applied
    pub accepted: bool,
    pub order_number: String,
    pub payment_status: PaymentStatus,
    /// Duplicate delivery; nothing was written
    pub replayed: bool,
}

impl ReconcileResult {
    fn new(order: &Order, payment_status: PaymentStatus, accepted: bool, replayed: bool) -> Self {
        Self {
            accepted,
            order_number: order.order_number.clone(),
            payment_status,
            replayed,
        }
    }
}

pub struct PaymentReconciler {
    writer: OrderWriter,
    schedule: DeliverySchedule,
    notifier: Notifier,
}

impl PaymentReconciler {
    pub fn new(
        storage: LedgerStorage,
        policy: RetryPolicy,
        schedule: DeliverySchedule,
        notifier: Notifier,
    ) -> Self {
        Self {
            writer: OrderWriter::new(storage, policy),
            schedule,
            notifier,
        }
    }

    pub fn from_config(storage: LedgerStorage, config: &Config, notifier: Notifier) -> Self {
        Self::new(
            storage,
            RetryPolicy::from_config(config),
            DeliverySchedule::from_config(config),
            notifier,
        )
    }

    /// Create a reconciler with default settings (for testing)
    pub fn with_storage(storage: LedgerStorage) -> Self {
        Self::new(
            storage,
            RetryPolicy::default(),
            DeliverySchedule::default(),
            Notifier::new(64),
        )
    }

    /// Apply a gateway callback
    pub fn reconcile(&self, callback: &PaymentCallback) -> LedgerResult<ReconcileResult> {
        if callback.outcome == CallbackOutcome::Success {
            let transaction_id = callback.transaction_id.as_deref().unwrap_or_default();
            validate_required_text(
                transaction_id,
                "transaction_id",
                MAX_SHORT_TEXT_LEN,
                ErrorCode::ValidationFailed,
            )?;
        }
        if let Some(reason) = &callback.failure_reason
            && reason.len() > MAX_NOTE_LEN
        {
            return Err(LedgerError::validation(
                ErrorCode::ValidationFailed,
                format!("failure_reason is too long (max {MAX_NOTE_LEN})"),
            ));
        }

        let order_number = self.resolve_order_number(callback)?;
        let committed = self.writer.mutate(&order_number, |current, now| {
            apply_callback(current, callback, now, &self.schedule)
        })?;
        let result = committed.output;

        if committed.written {
            let order = &committed.order;
            tracing::info!(
                order_number = %order.order_number,
                payment_status = %order.payment.status,
                status = %order.status,
                sales_counted = order.sales_counted,
                "Payment callback applied"
            );
            let kind = match callback.outcome {
                CallbackOutcome::Success => NotificationKind::PaymentSucceeded,
                CallbackOutcome::Failure => NotificationKind::PaymentFailed {
                    reason: order.payment.failure_reason.clone(),
                },
            };
            self.notifier.publish(OrderNotification::new(order, kind));
        }
        Ok(result)
    }

    /// Register the gateway payment for an online order (pending → processing)
    pub fn begin_payment(&self, order_number: &str, gateway_payment_id: &str) -> LedgerResult<Order> {
        validate_required_text(
            gateway_payment_id,
            "gateway_payment_id",
            MAX_SHORT_TEXT_LEN,
            ErrorCode::ValidationFailed,
        )?;

        let owner = with_storage_retry(self.writer.policy(), "find_gateway_payment", || {
            Ok(self
                .writer
                .storage()
                .find_order_number_by_gateway_id(gateway_payment_id)?)
        })?;
        if let Some(owner) = owner
            && owner != order_number
        {
            return Err(LedgerError::validation(
                ErrorCode::InvalidRequest,
                format!("Gateway payment {} belongs to another order", gateway_payment_id),
            ));
        }

        let committed = self.writer.mutate(order_number, |current, now| {
            require_online(current)?;
            let status = current.payment.status;
            if status == PaymentStatus::Processing
                && current.payment.gateway_payment_id.as_deref() == Some(gateway_payment_id)
            {
                return Ok(Mutation::Skip(()));
            }
            require_open(current)?;
            require_payment_transition(status, PaymentStatus::Processing)?;

            let mut next = current.clone();
            next.payment.status = PaymentStatus::Processing;
            next.payment.gateway_payment_id = Some(gateway_payment_id.to_string());
            next.payment.updated_at = now;
            Ok(Mutation::write(next, None, ()))
        })?;

        tracing::info!(
            order_number,
            gateway_payment_id,
            replayed = !committed.written,
            "Payment started"
        );
        Ok(committed.order)
    }

    /// Allow another attempt after a failed payment (failed → pending)
    pub fn retry_payment(&self, order_number: &str) -> LedgerResult<Order> {
        let committed = self.writer.mutate(order_number, |current, now| {
            require_online(current)?;
            require_open(current)?;
            require_payment_transition(current.payment.status, PaymentStatus::Pending)?;

            let mut next = current.clone();
            next.payment.status = PaymentStatus::Pending;
            next.payment.failure_reason = None;
            next.payment.updated_at = now;
            Ok(Mutation::write(next, None, ()))
        })?;

        tracing::info!(order_number, "Payment reset for retry");
        Ok(committed.order)
    }

    /// Record a refund; never touches the sales ledger
    pub fn record_refund(&self, order_number: &str, amount: f64) -> LedgerResult<Order> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(LedgerError::validation(
                ErrorCode::InvalidRefundAmount,
                format!("Refund amount must be positive, got {amount}"),
            ));
        }

        let committed = self.writer.mutate(order_number, |current, now| {
            let status = current.payment.status;
            if !matches!(status, PaymentStatus::Paid | PaymentStatus::PartiallyRefunded) {
                return Err(LedgerError::InvalidPaymentTransition {
                    current: status,
                    requested: PaymentStatus::Refunded,
                });
            }

            let total = to_decimal(current.pricing.total);
            let refunded = to_decimal(current.payment.refunded_amount) + to_decimal(amount);
            if refunded - total >= MONEY_TOLERANCE {
                return Err(LedgerError::validation(
                    ErrorCode::InvalidRefundAmount,
                    format!(
                        "Refund of {:.2} exceeds the refundable balance of {:.2}",
                        amount,
                        to_f64(total - to_decimal(current.payment.refunded_amount))
                    ),
                ));
            }
            let target = if total - refunded < MONEY_TOLERANCE {
                PaymentStatus::Refunded
            } else {
                PaymentStatus::PartiallyRefunded
            };
            require_payment_transition(status, target)?;

            let mut next = current.clone();
            next.payment.status = target;
            next.payment.refunded_amount = to_f64(refunded);
            next.payment.updated_at = now;
            Ok(Mutation::write(next, None, target))
        })?;

        let order = committed.order;
        tracing::info!(
            order_number,
            amount,
            refunded_amount = order.payment.refunded_amount,
            payment_status = %order.payment.status,
            "Refund recorded"
        );
        self.notifier.publish(OrderNotification::new(
            &order,
            NotificationKind::Refunded {
                amount,
                status: committed.output,
            },
        ));
        Ok(order)
    }

    fn resolve_order_number(&self, callback: &PaymentCallback) -> LedgerResult<String> {
        if let Some(number) = callback.order_number.as_deref().filter(|n| !n.is_empty()) {
            return Ok(number.to_string());
        }
        let Some(gateway_id) = callback
            .gateway_payment_id
            .as_deref()
            .filter(|id| !id.is_empty())
        else {
            return Err(LedgerError::validation(
                ErrorCode::ValidationFailed,
                "Callback must carry an order number or a gateway payment id",
            ));
        };

        with_storage_retry(self.writer.policy(), "find_gateway_payment", || {
            Ok(self
                .writer
                .storage()
                .find_order_number_by_gateway_id(gateway_id)?)
        })?
        .ok_or_else(|| LedgerError::not_found(Resource::Order, gateway_id))
    }
}

/// Decide what a callback does to `current`
///
/// Pure; runs again on every optimistic-concurrency retry.
fn apply_callback(
    current: &Order,
    callback: &PaymentCallback,
    now: i64,
    schedule: &DeliverySchedule,
) -> LedgerResult<Mutation<ReconcileResult>> {
    require_online(current)?;
    let snapshot = current.payment.status;

    match callback.outcome {
        CallbackOutcome::Success => {
            if snapshot.is_settled() {
                tracing::info!(
                    order_number = %current.order_number,
                    payment_status = %snapshot,
                    transaction_id = ?callback.transaction_id,
                    "GatewayReplay: payment already settled"
                );
                return Ok(Mutation::Skip(ReconcileResult::new(current, snapshot, true, true)));
            }

            // A success after a failure is a late capture; the table allows it
            require_payment_transition(snapshot, PaymentStatus::Paid)?;
            let mut next = current.clone();
            next.payment.status = PaymentStatus::Paid;
            next.payment.transaction_id = callback.transaction_id.clone();
            next.payment.payment_date = Some(now);
            next.payment.failure_reason = None;
            next.payment.updated_at = now;

            let ledger = if matches!(next.status, OrderStatus::Cancelled | OrderStatus::Returned) {
                tracing::warn!(
                    order_number = %next.order_number,
                    status = %next.status,
                    "Payment captured for a closed order, refund required"
                );
                None
            } else {
                if next.status == OrderStatus::Pending {
                    next = state_machine::transition(
                        &next,
                        OrderStatus::Confirmed,
                        Some("Payment confirmed".to_string()),
                        now,
                        schedule,
                    )?
                    .order;
                }
                Some(LedgerDelta::Increment)
            };

            let result = ReconcileResult::new(&next, PaymentStatus::Paid, true, false);
            Ok(Mutation::write(next, ledger, result))
        }
        CallbackOutcome::Failure => match snapshot {
            PaymentStatus::Failed => {
                tracing::info!(
                    order_number = %current.order_number,
                    "GatewayReplay: payment already failed"
                );
                Ok(Mutation::Skip(ReconcileResult::new(current, snapshot, true, true)))
            }
            s if s.is_settled() => {
                tracing::warn!(
                    order_number = %current.order_number,
                    payment_status = %s,
                    "Failure callback for a settled payment ignored"
                );
                Ok(Mutation::Skip(ReconcileResult::new(current, s, false, false)))
            }
            _ => {
                require_payment_transition(snapshot, PaymentStatus::Failed)?;
                let mut next = current.clone();
                next.payment.status = PaymentStatus::Failed;
                next.payment.failed_at = Some(now);
                next.payment.failure_reason = callback.failure_reason.clone();
                next.payment.updated_at = now;
                let result = ReconcileResult::new(&next, PaymentStatus::Failed, true, false);
                Ok(Mutation::write(next, None, result))
            }
        },
    }
}

fn require_online(order: &Order) -> LedgerResult<()> {
    if order.is_cash_on_delivery() {
        return Err(LedgerError::validation(
            ErrorCode::PaymentInvalidMethod,
            format!(
                "Order {} is paid cash on delivery; gateway payments do not apply",
                order.order_number
            ),
        ));
    }
    Ok(())
}

fn require_open(order: &Order) -> LedgerResult<()> {
    if matches!(order.status, OrderStatus::Cancelled | OrderStatus::Returned) {
        return Err(LedgerError::validation(
            ErrorCode::InvalidRequest,
            format!("Order {} is {}", order.order_number, order.status),
        ));
    }
    Ok(())
}

fn require_payment_transition(current: PaymentStatus, requested: PaymentStatus) -> LedgerResult<()> {
    if !current.can_transition_to(requested) {
        return Err(LedgerError::InvalidPaymentTransition { current, requested });
    }
    Ok(())
}
