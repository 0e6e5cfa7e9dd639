//! Ledger recomputation
//!
//! Rebuilds every derived counter from the orders whose state qualifies for
//! counting. An order whose `sales_counted` marker disagrees with its state is
//! repaired in the same transaction (marker, `counted_at`, version, coupon
//! usage line). Runs as one write transaction: writers queue behind it, so
//! the counters it commits match the order set it scanned.

use super::updater::usage_entry;
use crate::store::{LedgerStorage, StorageResult};
use crate::utils::money::{differs, to_decimal, to_f64};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::models::{Coupon, CouponUsage, UsageAction};
use std::collections::HashMap;

/// Outcome of a recomputation sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecalculationReport {
    /// Products whose `sales_count` was rewritten
    pub products_updated: u64,
    /// Orders read during the sweep
    pub orders_scanned: u64,
    /// Orders whose `sales_counted` marker was rewritten to match their state
    #[serde(default)]
    pub orders_repaired: u64,
    /// Coupons whose usage totals were rewritten
    pub coupons_updated: u64,
    /// Individual counter values that disagreed with the recomputation
    pub drift_corrected: u64,
}

#[derive(Default)]
struct CouponTotals {
    uses: u32,
    discount: Decimal,
}

/// Recompute product and coupon counters from orders in a counted state
pub fn recalculate(storage: &LedgerStorage, now: i64) -> StorageResult<RecalculationReport> {
    let mut report = RecalculationReport::default();
    let txn = storage.begin_write()?;

    let mut sales: HashMap<String, u64> = HashMap::new();
    let mut coupon_totals: HashMap<String, CouponTotals> = HashMap::new();
    // code -> (usage line template, whether the order counts)
    let mut coupon_orders: HashMap<String, Vec<(CouponUsage, bool)>> = HashMap::new();

    for mut order in storage.all_orders_txn(&txn)? {
        report.orders_scanned += 1;
        let counted = order.qualifies_for_count();

        if order.sales_counted != counted {
            tracing::warn!(
                target: "ledger",
                order_number = %order.order_number,
                status = %order.status,
                payment_status = %order.payment.status,
                stored = order.sales_counted,
                expected = counted,
                "Ledger marker drift corrected"
            );
            order.sales_counted = counted;
            order.counted_at = counted.then_some(now);
            order.version += 1;
            order.updated_at = now;
            storage.store_order(&txn, &order)?;
            report.orders_repaired += 1;
            report.drift_corrected += 1;
        }
        if let Some(code) = &order.pricing.promo_code {
            coupon_orders
                .entry(code.clone())
                .or_default()
                .push((usage_entry(&order, UsageAction::Redeemed, now), counted));
        }
        if !counted {
            continue;
        }

        for item in &order.items {
            *sales.entry(item.product_id.clone()).or_default() += item.quantity as u64;
        }
        if let Some(code) = &order.pricing.promo_code {
            let totals = coupon_totals.entry(code.clone()).or_default();
            totals.uses += 1;
            totals.discount += to_decimal(order.pricing.discount);
        }
    }

    for mut product in storage.all_products_txn(&txn)? {
        let expected = sales.remove(&product.id).unwrap_or(0);
        if product.sales_count == expected {
            continue;
        }
        tracing::warn!(
            target: "ledger",
            product_id = %product.id,
            stored = product.sales_count,
            expected,
            "sales_count drift corrected"
        );
        product.sales_count = expected;
        product.updated_at = now;
        storage.store_product(&txn, &product)?;
        report.products_updated += 1;
        report.drift_corrected += 1;
    }

    for (product_id, quantity) in sales {
        tracing::warn!(
            target: "ledger",
            product_id = %product_id,
            quantity,
            "Counted orders reference a missing product"
        );
    }

    for mut coupon in storage.all_coupons_txn(&txn)? {
        let expected = coupon_totals.remove(&coupon.code).unwrap_or_default();
        let expected_discount = to_f64(expected.discount);

        let mut corrected = 0;
        for (mut line, counted) in coupon_orders.remove(&coupon.code).unwrap_or_default() {
            let net = order_usage_net(&coupon, &line.order_number);
            let expected = i64::from(counted);
            if net == expected {
                continue;
            }
            tracing::warn!(
                target: "ledger",
                code = %coupon.code,
                order_number = %line.order_number,
                net,
                expected,
                "Coupon usage history drift corrected"
            );
            line.action = if net < expected {
                UsageAction::Redeemed
            } else {
                UsageAction::Reversed
            };
            for _ in 0..(net - expected).abs() {
                coupon.usage_history.push(line.clone());
            }
            corrected += 1;
        }

        if coupon.total_usage_count != expected.uses {
            tracing::warn!(
                target: "ledger",
                code = %coupon.code,
                stored = coupon.total_usage_count,
                expected = expected.uses,
                "Coupon usage count drift corrected"
            );
            coupon.total_usage_count = expected.uses;
            corrected += 1;
        }
        if differs(coupon.total_discount_given, expected_discount) {
            tracing::warn!(
                target: "ledger",
                code = %coupon.code,
                stored = coupon.total_discount_given,
                expected = expected_discount,
                "Coupon discount total drift corrected"
            );
            coupon.total_discount_given = expected_discount;
            corrected += 1;
        }
        if corrected > 0 {
            coupon.updated_at = now;
            storage.store_coupon(&txn, &coupon)?;
            report.coupons_updated += 1;
            report.drift_corrected += corrected;
        }
    }

    txn.commit()?;

    tracing::info!(
        target: "ledger",
        products_updated = report.products_updated,
        orders_scanned = report.orders_scanned,
        orders_repaired = report.orders_repaired,
        coupons_updated = report.coupons_updated,
        drift_corrected = report.drift_corrected,
        "Sales ledger recalculated"
    );
    Ok(report)
}

/// Redemptions minus reversals recorded for one order
fn order_usage_net(coupon: &Coupon, order_number: &str) -> i64 {
    coupon
        .usage_history
        .iter()
        .filter(|u| u.order_number == order_number)
        .map(|u| match u.action {
            UsageAction::Redeemed => 1,
            UsageAction::Reversed => -1,
        })
        .sum()
}
