//! Sales ledger updater
//!
//! [`apply_delta`] is the only code path that moves product `sales_count`
//! and coupon usage counters. It runs inside the caller's write transaction,
//! next to the order write that flips `sales_counted`, so the marker and the
//! counters commit or roll back together.

use crate::store::{LedgerStorage, StorageResult};
use crate::utils::money::{to_decimal, to_f64};
use rust_decimal::Decimal;
use redb::WriteTransaction;
use serde::Serialize;
use shared::models::{Coupon, CouponUsage, UsageAction};
use shared::order::Order;

/// Direction of a ledger update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerDelta {
    /// Order became paid (online) or delivered (cash on delivery)
    Increment,
    /// A counted order was cancelled or returned
    Decrement,
}

impl LedgerDelta {
    pub fn sign(self) -> i64 {
        match self {
            LedgerDelta::Increment => 1,
            LedgerDelta::Decrement => -1,
        }
    }
}

/// Apply `delta` for `order`, guarded by its `sales_counted` marker
///
/// Increments only an uncounted order, decrements only a counted one; any
/// other call is a no-op returning `false`. On success the marker on `order`
/// is updated and the caller must persist `order` in the same transaction.
pub fn apply_delta(
    storage: &LedgerStorage,
    txn: &WriteTransaction,
    order: &mut Order,
    delta: LedgerDelta,
    now: i64,
) -> StorageResult<bool> {
    let redundant = match delta {
        LedgerDelta::Increment => order.sales_counted,
        LedgerDelta::Decrement => !order.sales_counted,
    };
    if redundant {
        tracing::debug!(
            order_number = %order.order_number,
            delta = ?delta,
            "Redundant ledger update skipped"
        );
        return Ok(false);
    }

    let sign = delta.sign();
    for item in &order.items {
        let change = sign * item.quantity as i64;
        match storage.adjust_sales_count(txn, &item.product_id, change, now)? {
            Some(adjustment) if adjustment.clamped => {
                tracing::warn!(
                    target: "ledger",
                    order_number = %order.order_number,
                    product_id = %item.product_id,
                    previous = adjustment.previous,
                    change,
                    "sales_count would go negative, clamped to zero"
                );
            }
            Some(_) => {}
            None => {
                tracing::warn!(
                    target: "ledger",
                    order_number = %order.order_number,
                    product_id = %item.product_id,
                    "Product missing, sales_count not adjusted"
                );
            }
        }
    }

    if let Some(code) = order.pricing.promo_code.clone() {
        apply_coupon(storage, txn, order, &code, delta, now)?;
    }

    match delta {
        LedgerDelta::Increment => {
            order.sales_counted = true;
            order.counted_at = Some(now);
        }
        LedgerDelta::Decrement => {
            order.sales_counted = false;
            order.counted_at = None;
        }
    }

    tracing::info!(
        target: "ledger",
        order_number = %order.order_number,
        delta = ?delta,
        items = order.items.len(),
        quantity = order.total_quantity(),
        "Sales ledger updated"
    );
    Ok(true)
}

/// Redeem or reverse the order's coupon
fn apply_coupon(
    storage: &LedgerStorage,
    txn: &WriteTransaction,
    order: &Order,
    code: &str,
    delta: LedgerDelta,
    now: i64,
) -> StorageResult<()> {
    let Some(mut coupon) = storage.get_coupon_txn(txn, code)? else {
        tracing::warn!(
            target: "ledger",
            order_number = %order.order_number,
            code,
            "Coupon missing, usage not recorded"
        );
        return Ok(());
    };

    let discount = to_decimal(order.pricing.discount);
    let given = to_decimal(coupon.total_discount_given);
    let action = match delta {
        LedgerDelta::Increment => {
            coupon.total_usage_count = coupon.total_usage_count.saturating_add(1);
            coupon.total_discount_given = to_f64(given + discount);
            UsageAction::Redeemed
        }
        LedgerDelta::Decrement => {
            if coupon.total_usage_count == 0 {
                tracing::warn!(
                    target: "ledger",
                    order_number = %order.order_number,
                    code,
                    "Coupon usage would go negative, clamped to zero"
                );
            }
            coupon.total_usage_count = coupon.total_usage_count.saturating_sub(1);
            coupon.total_discount_given = to_f64((given - discount).max(Decimal::ZERO));
            UsageAction::Reversed
        }
    };

    coupon.usage_history.push(usage_entry(order, action, now));
    if action == UsageAction::Redeemed {
        // Caps are enforced at checkout; a capture cannot be refused here
        for breach in limit_breaches(&coupon, &order.customer_id) {
            tracing::warn!(
                target: "ledger",
                order_number = %order.order_number,
                customer_id = %order.customer_id,
                code,
                breach = ?breach,
                total_usage = coupon.total_usage_count,
                "Coupon redeemed beyond its usage limit"
            );
        }
    }
    coupon.updated_at = now;
    storage.store_coupon(txn, &coupon)
}

/// Usage cap a coupon is currently over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LimitBreach {
    Total,
    PerCustomer,
}

pub(crate) fn limit_breaches(coupon: &Coupon, customer_id: &str) -> Vec<LimitBreach> {
    let mut breaches = Vec::new();
    if coupon
        .max_total_uses
        .is_some_and(|max| coupon.total_usage_count > max)
    {
        breaches.push(LimitBreach::Total);
    }
    if coupon
        .max_uses_per_customer
        .is_some_and(|max| coupon.customer_usage_count(customer_id) > max)
    {
        breaches.push(LimitBreach::PerCustomer);
    }
    breaches
}

/// Usage-history line for `order`
pub(crate) fn usage_entry(order: &Order, action: UsageAction, now: i64) -> CouponUsage {
    CouponUsage {
        order_number: order.order_number.clone(),
        customer_id: order.customer_id.clone(),
        discount_amount: order.pricing.discount,
        order_amount: order.pricing.total,
        timestamp: now,
        action,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::test_support::*;

    #[test]
    fn test_increment_then_decrement_round_trip() {
        let storage = LedgerStorage::open_in_memory().unwrap();
        seed_product(&storage, "p1", 0);
        seed_product(&storage, "p2", 5);
        let mut order = stored_order(&storage, &[("p1", 2), ("p2", 3)], None);

        let txn = storage.begin_write().unwrap();
        assert!(apply_delta(&storage, &txn, &mut order, LedgerDelta::Increment, NOW).unwrap());
        txn.commit().unwrap();
        assert!(order.sales_counted);
        assert_eq!(order.counted_at, Some(NOW));
        assert_eq!(sales_count(&storage, "p1"), 2);
        assert_eq!(sales_count(&storage, "p2"), 8);

        let txn = storage.begin_write().unwrap();
        assert!(apply_delta(&storage, &txn, &mut order, LedgerDelta::Decrement, NOW).unwrap());
        txn.commit().unwrap();
        assert!(!order.sales_counted);
        assert_eq!(sales_count(&storage, "p1"), 0);
        assert_eq!(sales_count(&storage, "p2"), 5);
    }

    #[test]
    fn test_guards_reject_redundant_updates() {
        let storage = LedgerStorage::open_in_memory().unwrap();
        seed_product(&storage, "p1", 0);
        let mut order = stored_order(&storage, &[("p1", 1)], None);

        let txn = storage.begin_write().unwrap();
        // Not counted yet: decrement is a no-op
        assert!(!apply_delta(&storage, &txn, &mut order, LedgerDelta::Decrement, NOW).unwrap());
        assert!(apply_delta(&storage, &txn, &mut order, LedgerDelta::Increment, NOW).unwrap());
        // Already counted: second increment is a no-op
        assert!(!apply_delta(&storage, &txn, &mut order, LedgerDelta::Increment, NOW).unwrap());
        txn.commit().unwrap();

        assert_eq!(sales_count(&storage, "p1"), 1);
    }

    #[test]
    fn test_coupon_redeemed_and_reversed() {
        let storage = LedgerStorage::open_in_memory().unwrap();
        seed_product(&storage, "p1", 0);
        seed_coupon(&storage, "SAVE10");
        let mut order = stored_order(&storage, &[("p1", 1)], Some(("SAVE10", 100.0)));

        let txn = storage.begin_write().unwrap();
        apply_delta(&storage, &txn, &mut order, LedgerDelta::Increment, NOW).unwrap();
        txn.commit().unwrap();
        let coupon = storage.get_coupon("SAVE10").unwrap().unwrap();
        assert_eq!(coupon.total_usage_count, 1);
        assert_eq!(coupon.total_discount_given, 100.0);
        assert_eq!(coupon.customer_usage_count(&order.customer_id), 1);

        let txn = storage.begin_write().unwrap();
        apply_delta(&storage, &txn, &mut order, LedgerDelta::Decrement, NOW).unwrap();
        txn.commit().unwrap();
        let coupon = storage.get_coupon("SAVE10").unwrap().unwrap();
        assert_eq!(coupon.total_usage_count, 0);
        assert_eq!(coupon.total_discount_given, 0.0);
        assert_eq!(coupon.usage_history.len(), 2);
        assert_eq!(coupon.usage_history[1].action, UsageAction::Reversed);
        assert_eq!(coupon.customer_usage_count(&order.customer_id), 0);
    }

    #[test]
    fn test_missing_product_is_skipped() {
        let storage = LedgerStorage::open_in_memory().unwrap();
        seed_product(&storage, "p1", 0);
        let mut order = stored_order(&storage, &[("p1", 1), ("ghost", 4)], None);

        let txn = storage.begin_write().unwrap();
        assert!(apply_delta(&storage, &txn, &mut order, LedgerDelta::Increment, NOW).unwrap());
        txn.commit().unwrap();

        assert_eq!(sales_count(&storage, "p1"), 1);
        assert!(storage.get_product("ghost").unwrap().is_none());
    }

    #[test]
    fn test_underflow_clamps_to_zero() {
        let storage = LedgerStorage::open_in_memory().unwrap();
        seed_product(&storage, "p1", 1);
        let mut order = stored_order(&storage, &[("p1", 3)], None);
        order.sales_counted = true;

        let txn = storage.begin_write().unwrap();
        apply_delta(&storage, &txn, &mut order, LedgerDelta::Decrement, NOW).unwrap();
        txn.commit().unwrap();

        assert_eq!(sales_count(&storage, "p1"), 0);
    }

    #[test]
    fn test_redemption_past_cap_is_recorded_and_flagged() {
        let storage = LedgerStorage::open_in_memory().unwrap();
        seed_product(&storage, "p1", 0);
        seed_coupon(&storage, "ONCE");
        let mut coupon = storage.get_coupon("ONCE").unwrap().unwrap();
        coupon.max_uses_per_customer = Some(1);
        coupon.max_total_uses = Some(1);
        let txn = storage.begin_write().unwrap();
        storage.store_coupon(&txn, &coupon).unwrap();
        txn.commit().unwrap();

        // Both passed checkout while the other was still unpaid
        let mut first = stored_order(&storage, &[("p1", 1)], Some(("ONCE", 10.0)));
        let mut second = stored_order(&storage, &[("p1", 1)], Some(("ONCE", 10.0)));

        let txn = storage.begin_write().unwrap();
        apply_delta(&storage, &txn, &mut first, LedgerDelta::Increment, NOW).unwrap();
        txn.commit().unwrap();
        let coupon = storage.get_coupon("ONCE").unwrap().unwrap();
        assert!(limit_breaches(&coupon, "alice").is_empty());

        let txn = storage.begin_write().unwrap();
        assert!(apply_delta(&storage, &txn, &mut second, LedgerDelta::Increment, NOW).unwrap());
        txn.commit().unwrap();

        let coupon = storage.get_coupon("ONCE").unwrap().unwrap();
        assert_eq!(coupon.total_usage_count, 2);
        assert_eq!(coupon.customer_usage_count("alice"), 2);
        assert_eq!(
            limit_breaches(&coupon, "alice"),
            vec![LimitBreach::Total, LimitBreach::PerCustomer]
        );
        assert_eq!(limit_breaches(&coupon, "bob"), vec![LimitBreach::Total]);
    }
}
