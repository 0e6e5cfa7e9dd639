//! Order state machine
//!
//! [`transition`] is pure: it takes the current document and returns the
//! next one plus the ledger effect the move implies. Persisting both is the
//! caller's job (see [`OrderWriter`](super::writer::OrderWriter)).

use crate::core::{Config, LedgerError, LedgerResult};
use crate::ledger::LedgerDelta;
use shared::order::{
    DeliveryInfo, Order, OrderStatus, PaymentMethod, PaymentStatus, StatusHistoryEntry,
};
use shared::util::DAY_MILLIS;

/// Delivery estimate rules applied when an order ships
#[derive(Debug, Clone)]
pub struct DeliverySchedule {
    /// Lower-cased cities or postal-code prefixes
    fast_zones: Vec<String>,
    fast_days: u32,
    standard_days: u32,
}

impl DeliverySchedule {
    pub fn new(fast_zones: Vec<String>, fast_days: u32, standard_days: u32) -> Self {
        Self {
            fast_zones: fast_zones.into_iter().map(|z| z.to_lowercase()).collect(),
            fast_days,
            standard_days,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.fast_delivery_zones.clone(),
            config.fast_delivery_days,
            config.standard_delivery_days,
        )
    }

    pub fn is_fast_zone(&self, delivery: &DeliveryInfo) -> bool {
        let city = delivery.city.trim().to_lowercase();
        let postal = delivery.postal_code.trim().to_lowercase();
        self.fast_zones
            .iter()
            .any(|zone| *zone == city || postal.starts_with(zone.as_str()))
    }

    /// Estimated delivery time for an order shipped at `shipped_at`
    pub fn estimate(&self, delivery: &DeliveryInfo, shipped_at: i64) -> i64 {
        let days = if self.is_fast_zone(delivery) {
            self.fast_days
        } else {
            self.standard_days
        };
        shipped_at + days as i64 * DAY_MILLIS
    }
}

impl Default for DeliverySchedule {
    fn default() -> Self {
        Self::new(Vec::new(), 2, 4)
    }
}

/// Result of a legal transition
#[derive(Debug, Clone)]
pub struct Transition {
    pub from: OrderStatus,
    pub order: Order,
    /// Ledger update that must commit together with `order`
    pub ledger: Option<LedgerDelta>,
}

/// Move `order` to `target`
///
/// Fails with [`LedgerError::InvalidTransition`] unless the move is in
/// [`OrderStatus::allowed_targets`]. On success exactly one history entry is
/// appended and the status side effects are applied:
///
/// - `shipped`: `shipped_at` and `estimated_delivery_at`
/// - `delivered`: `delivered_at`; cash on delivery is marked paid and counted
/// - `cancelled` / `returned`: timestamp; a counted order is decremented
pub fn transition(
    order: &Order,
    target: OrderStatus,
    note: Option<String>,
    now: i64,
    schedule: &DeliverySchedule,
) -> LedgerResult<Transition> {
    let from = order.status;
    if !from.can_transition_to(target) {
        return Err(LedgerError::InvalidTransition {
            current: from,
            requested: target,
        });
    }

    let mut next = order.clone();
    next.status = target;
    next.status_history.push(StatusHistoryEntry {
        status: target,
        timestamp: now,
        note,
    });

    let mut ledger = None;
    match target {
        OrderStatus::Shipped => {
            next.shipped_at = Some(now);
            next.estimated_delivery_at = Some(schedule.estimate(&next.delivery, now));
        }
        OrderStatus::Delivered => {
            next.delivered_at = Some(now);
            if next.payment.method == PaymentMethod::CashOnDelivery {
                collect_cash(&mut next, now)?;
                if !next.sales_counted {
                    ledger = Some(LedgerDelta::Increment);
                }
            }
        }
        OrderStatus::Cancelled | OrderStatus::Returned => {
            if target == OrderStatus::Cancelled {
                next.cancelled_at = Some(now);
            } else {
                next.returned_at = Some(now);
            }
            if next.sales_counted {
                ledger = Some(LedgerDelta::Decrement);
            }
        }
        _ => {}
    }

    Ok(Transition {
        from,
        order: next,
        ledger,
    })
}

/// Cash on delivery: the courier collected the payment
fn collect_cash(order: &mut Order, now: i64) -> LedgerResult<()> {
    let current = order.payment.status;
    if current.is_settled() {
        return Ok(());
    }
    if !current.can_transition_to(PaymentStatus::Paid) {
        return Err(LedgerError::InvalidPaymentTransition {
            current,
            requested: PaymentStatus::Paid,
        });
    }
    order.payment.status = PaymentStatus::Paid;
    order.payment.payment_date = Some(now);
    order.payment.updated_at = now;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::order::Pricing;

    const NOW: i64 = 1_709_632_800_000;

    fn order(method: PaymentMethod, status: OrderStatus) -> Order {
        let mut order = Order::new(
            "alice".to_string(),
            vec![],
            DeliveryInfo {
                recipient_name: "Alice".to_string(),
                phone: "555-0100".to_string(),
                address_line: "1 Main St".to_string(),
                city: "Springfield".to_string(),
                postal_code: "40210".to_string(),
            },
            Pricing::default(),
            method,
            NOW,
        );
        order.order_number = "ORD-20240305-000001".to_string();
        order.status = status;
        order
    }

    #[test]
    fn test_transition_legality_over_all_pairs() {
        let schedule = DeliverySchedule::default();
        for from in OrderStatus::ALL {
            for to in OrderStatus::ALL {
                let current = order(PaymentMethod::Online, from);
                let result = transition(&current, to, None, NOW, &schedule);
                if from.allowed_targets().contains(&to) {
                    let t = result.unwrap_or_else(|e| panic!("{from} -> {to}: {e}"));
                    assert_eq!(t.order.status, to);
                    assert_eq!(t.order.status_history.len(), current.status_history.len() + 1);
                } else {
                    assert!(
                        matches!(
                            result,
                            Err(LedgerError::InvalidTransition { current: c, requested: r })
                                if c == from && r == to
                        ),
                        "{from} -> {to} should be rejected"
                    );
                }
            }
        }
    }

    #[test]
    fn test_cancelled_to_shipped_rejected() {
        let current = order(PaymentMethod::Online, OrderStatus::Cancelled);
        let err = transition(&current, OrderStatus::Shipped, None, NOW, &DeliverySchedule::default())
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InvalidTransition {
                current: OrderStatus::Cancelled,
                requested: OrderStatus::Shipped
            }
        ));
    }

    #[test]
    fn test_shipped_sets_estimate_by_zone() {
        let fast = DeliverySchedule::new(vec!["Springfield".to_string()], 2, 4);
        let by_postal = DeliverySchedule::new(vec!["402".to_string()], 2, 4);
        let slow = DeliverySchedule::new(vec!["Shelbyville".to_string()], 2, 4);
        let current = order(PaymentMethod::Online, OrderStatus::ReadyToShip);

        for (schedule, days) in [(&fast, 2), (&by_postal, 2), (&slow, 4)] {
            let t = transition(&current, OrderStatus::Shipped, None, NOW, schedule).unwrap();
            assert_eq!(t.order.shipped_at, Some(NOW));
            assert_eq!(t.order.estimated_delivery_at, Some(NOW + days * DAY_MILLIS));
            assert!(t.ledger.is_none());
        }
    }

    #[test]
    fn test_cod_delivery_marks_paid_and_counts() {
        let current = order(PaymentMethod::CashOnDelivery, OrderStatus::OutForDelivery);
        let t = transition(&current, OrderStatus::Delivered, None, NOW, &DeliverySchedule::default())
            .unwrap();
        assert_eq!(t.order.payment.status, PaymentStatus::Paid);
        assert_eq!(t.order.payment.payment_date, Some(NOW));
        assert_eq!(t.order.delivered_at, Some(NOW));
        assert_eq!(t.ledger, Some(LedgerDelta::Increment));
    }

    #[test]
    fn test_online_delivery_has_no_ledger_effect() {
        let mut current = order(PaymentMethod::Online, OrderStatus::Shipped);
        current.payment.status = PaymentStatus::Paid;
        current.sales_counted = true;
        let t = transition(&current, OrderStatus::Delivered, None, NOW, &DeliverySchedule::default())
            .unwrap();
        assert!(t.ledger.is_none());
    }

    #[test]
    fn test_cancel_decrements_only_counted_orders() {
        let schedule = DeliverySchedule::default();
        let uncounted = order(PaymentMethod::Online, OrderStatus::Confirmed);
        let t = transition(&uncounted, OrderStatus::Cancelled, Some("changed mind".into()), NOW, &schedule)
            .unwrap();
        assert!(t.ledger.is_none());
        assert_eq!(t.order.cancelled_at, Some(NOW));
        assert_eq!(
            t.order.status_history.last().and_then(|h| h.note.as_deref()),
            Some("changed mind")
        );

        let mut counted = order(PaymentMethod::Online, OrderStatus::Confirmed);
        counted.sales_counted = true;
        let t = transition(&counted, OrderStatus::Cancelled, None, NOW, &schedule).unwrap();
        assert_eq!(t.ledger, Some(LedgerDelta::Decrement));

        let mut delivered = order(PaymentMethod::CashOnDelivery, OrderStatus::Delivered);
        delivered.sales_counted = true;
        let t = transition(&delivered, OrderStatus::Returned, None, NOW, &schedule).unwrap();
        assert_eq!(t.order.returned_at, Some(NOW));
        assert_eq!(t.ledger, Some(LedgerDelta::Decrement));
    }
}
