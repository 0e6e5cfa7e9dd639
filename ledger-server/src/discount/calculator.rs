//! Discount amount calculation
//!
//! Pure: never touches coupon counters.

use crate::utils::money::{round, to_decimal, to_f64};
use rust_decimal::Decimal;
use shared::models::{Coupon, DiscountType};
use shared::order::OrderSnapshot;

/// Discount a coupon gives on a snapshot, in `[0, subtotal]`
///
/// - Percentage: `subtotal * value / 100`, capped by `max_discount_amount`
/// - Fixed: `min(value, subtotal)`
pub fn compute_discount(coupon: &Coupon, snapshot: &OrderSnapshot) -> f64 {
    let subtotal = to_decimal(snapshot.subtotal).max(Decimal::ZERO);
    let value = to_decimal(coupon.discount_value);

    let raw = match coupon.discount_type {
        DiscountType::Percentage => {
            let amount = subtotal * value / Decimal::ONE_HUNDRED;
            match coupon.max_discount_amount {
                Some(cap) => amount.min(to_decimal(cap)),
                None => amount,
            }
        }
        DiscountType::FixedAmount => value.min(subtotal),
    };

    to_f64(round(raw).max(Decimal::ZERO).min(subtotal))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::PromotionKind;

    fn coupon(discount_type: DiscountType, value: f64, cap: Option<f64>) -> Coupon {
        Coupon {
            code: "C".to_string(),
            kind: PromotionKind::Offer,
            owner_id: "seller-1".to_string(),
            description: None,
            discount_type,
            discount_value: value,
            max_discount_amount: cap,
            minimum_order_amount: 0.0,
            valid_from: 0,
            valid_until: i64::MAX,
            max_total_uses: None,
            max_uses_per_customer: None,
            applicable_products: vec![],
            applicable_categories: vec![],
            excluded_products: vec![],
            is_active: true,
            total_usage_count: 0,
            total_discount_given: 0.0,
            usage_history: vec![],
            created_at: 0,
            updated_at: 0,
        }
    }

    fn snapshot(subtotal: f64) -> OrderSnapshot {
        OrderSnapshot {
            subtotal,
            items: vec![],
        }
    }

    #[test]
    fn test_percentage() {
        let c = coupon(DiscountType::Percentage, 10.0, None);
        assert_eq!(compute_discount(&c, &snapshot(1000.0)), 100.0);
        assert_eq!(compute_discount(&c, &snapshot(33.33)), 3.33);
    }

    #[test]
    fn test_percentage_cap() {
        let c = coupon(DiscountType::Percentage, 50.0, Some(20.0));
        assert_eq!(compute_discount(&c, &snapshot(100.0)), 20.0);
    }

    #[test]
    fn test_fixed_never_exceeds_subtotal() {
        let c = coupon(DiscountType::FixedAmount, 150.0, None);
        assert_eq!(compute_discount(&c, &snapshot(100.0)), 100.0);
        assert_eq!(compute_discount(&c, &snapshot(0.0)), 0.0);
    }

    #[test]
    fn test_bounds_over_many_values() {
        for subtotal in [0.0, 0.01, 9.99, 100.0, 12345.67] {
            for value in [0.0, 1.0, 15.5, 100.0, 250.0] {
                for discount_type in [DiscountType::Percentage, DiscountType::FixedAmount] {
                    let d = compute_discount(&coupon(discount_type, value, None), &snapshot(subtotal));
                    assert!(d >= 0.0 && d <= subtotal, "{d} not in [0, {subtotal}]");
                }
            }
        }
    }
}
