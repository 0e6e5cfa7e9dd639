//! Coupon / offer validation
//!
//! Checks run in a fixed order and the first failure wins:
//!
//! 1. active
//! 2. inside `[valid_from, valid_until]`
//! 3. total usage limit
//! 4. per-customer usage limit (net of reversals)
//! 5. minimum order amount
//! 6. applicability (products / categories)
//! 7. exclusions

use crate::utils::money::to_decimal;
use serde::Serialize;
use shared::models::Coupon;
use shared::order::OrderSnapshot;
use std::fmt;

/// Why a coupon was rejected
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum RejectReason {
    Inactive,
    NotYetValid,
    Expired,
    UsageLimitReached,
    CustomerLimitReached,
    MinimumNotMet { minimum: f64 },
    NotApplicable,
    ExcludedItem { product_id: String },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::Inactive => write!(f, "This coupon is not active"),
            RejectReason::NotYetValid => write!(f, "This coupon is not valid yet"),
            RejectReason::Expired => write!(f, "This coupon has expired"),
            RejectReason::UsageLimitReached => write!(f, "This coupon has reached its usage limit"),
            RejectReason::CustomerLimitReached => {
                write!(f, "You have reached the usage limit for this coupon")
            }
            RejectReason::MinimumNotMet { minimum } => {
                write!(f, "Minimum order amount of {:.2} required", minimum)
            }
            RejectReason::NotApplicable => {
                write!(f, "This coupon does not apply to any item in the order")
            }
            RejectReason::ExcludedItem { product_id } => {
                write!(f, "Product {} is excluded from this coupon", product_id)
            }
        }
    }
}

/// Outcome of [`validate`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Run every check, returning the first failure
pub fn check(
    coupon: &Coupon,
    snapshot: &OrderSnapshot,
    customer_id: &str,
    now: i64,
) -> Result<(), RejectReason> {
    if !coupon.is_active {
        return Err(RejectReason::Inactive);
    }
    if now < coupon.valid_from {
        return Err(RejectReason::NotYetValid);
    }
    if now > coupon.valid_until {
        return Err(RejectReason::Expired);
    }
    if let Some(max_total) = coupon.max_total_uses
        && coupon.total_usage_count >= max_total
    {
        return Err(RejectReason::UsageLimitReached);
    }
    if let Some(max_per_customer) = coupon.max_uses_per_customer
        && coupon.customer_usage_count(customer_id) >= max_per_customer
    {
        return Err(RejectReason::CustomerLimitReached);
    }
    if to_decimal(snapshot.subtotal) < to_decimal(coupon.minimum_order_amount) {
        return Err(RejectReason::MinimumNotMet {
            minimum: coupon.minimum_order_amount,
        });
    }

    let restricted =
        !coupon.applicable_products.is_empty() || !coupon.applicable_categories.is_empty();
    if restricted && !snapshot.items.iter().any(|item| is_applicable(coupon, item)) {
        return Err(RejectReason::NotApplicable);
    }

    if let Some(item) = snapshot
        .items
        .iter()
        .find(|item| coupon.excluded_products.contains(&item.product_id))
    {
        return Err(RejectReason::ExcludedItem {
            product_id: item.product_id.clone(),
        });
    }

    Ok(())
}

/// Validate a coupon against an order snapshot
pub fn validate(
    coupon: &Coupon,
    snapshot: &OrderSnapshot,
    customer_id: &str,
    now: i64,
) -> ValidationResult {
    match check(coupon, snapshot, customer_id, now) {
        Ok(()) => ValidationResult {
            valid: true,
            reason: None,
        },
        Err(reason) => ValidationResult {
            valid: false,
            reason: Some(reason.to_string()),
        },
    }
}

fn is_applicable(coupon: &Coupon, item: &shared::order::SnapshotItem) -> bool {
    coupon.applicable_products.contains(&item.product_id)
        || item
            .category_id
            .as_ref()
            .is_some_and(|c| coupon.applicable_categories.contains(c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{CouponUsage, DiscountType, PromotionKind, UsageAction};
    use shared::order::SnapshotItem;

    const NOW: i64 = 1_000_000;

    fn coupon() -> Coupon {
        Coupon {
            code: "SAVE10".to_string(),
            kind: PromotionKind::Coupon,
            owner_id: "seller-1".to_string(),
            description: None,
            discount_type: DiscountType::Percentage,
            discount_value: 10.0,
            max_discount_amount: None,
            minimum_order_amount: 0.0,
            valid_from: NOW - 1_000,
            valid_until: NOW + 1_000,
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

    fn snapshot(subtotal: f64, products: &[(&str, Option<&str>)]) -> OrderSnapshot {
        OrderSnapshot {
            subtotal,
            items: products
                .iter()
                .map(|(id, cat)| SnapshotItem {
                    product_id: id.to_string(),
                    category_id: cat.map(str::to_string),
                    quantity: 1,
                    line_total: subtotal / products.len() as f64,
                })
                .collect(),
        }
    }

    fn redeemed(customer: &str) -> CouponUsage {
        CouponUsage {
            order_number: "ORD-X".to_string(),
            customer_id: customer.to_string(),
            discount_amount: 10.0,
            order_amount: 100.0,
            timestamp: NOW - 10,
            action: UsageAction::Redeemed,
        }
    }

    #[test]
    fn test_valid_coupon() {
        let result = validate(&coupon(), &snapshot(100.0, &[("p1", None)]), "alice", NOW);
        assert!(result.valid);
        assert!(result.reason.is_none());
    }

    #[test]
    fn test_validity_window_is_inclusive() {
        let c = coupon();
        let s = snapshot(100.0, &[("p1", None)]);
        assert!(check(&c, &s, "alice", c.valid_from).is_ok());
        assert!(check(&c, &s, "alice", c.valid_until).is_ok());
        assert_eq!(check(&c, &s, "alice", c.valid_from - 1), Err(RejectReason::NotYetValid));
        assert_eq!(check(&c, &s, "alice", c.valid_until + 1), Err(RejectReason::Expired));
    }

    #[test]
    fn test_customer_limit_message() {
        let mut c = coupon();
        c.max_uses_per_customer = Some(1);
        c.usage_history.push(redeemed("alice"));

        let result = validate(&c, &snapshot(100.0, &[("p1", None)]), "alice", NOW);
        assert!(!result.valid);
        assert!(result.reason.unwrap().contains("usage limit"));

        // Another customer is unaffected
        assert!(validate(&c, &snapshot(100.0, &[("p1", None)]), "bob", NOW).valid);
    }

    #[test]
    fn test_reversed_redemption_frees_customer_slot() {
        let mut c = coupon();
        c.max_uses_per_customer = Some(1);
        c.usage_history.push(redeemed("alice"));
        c.usage_history.push(CouponUsage {
            action: UsageAction::Reversed,
            ..redeemed("alice")
        });
        assert!(check(&c, &snapshot(100.0, &[("p1", None)]), "alice", NOW).is_ok());
    }

    #[test]
    fn test_first_failing_check_wins() {
        let mut c = coupon();
        c.is_active = false;
        c.max_total_uses = Some(0);
        c.minimum_order_amount = 500.0;
        assert_eq!(
            check(&c, &snapshot(10.0, &[("p1", None)]), "alice", NOW),
            Err(RejectReason::Inactive)
        );

        c.is_active = true;
        assert_eq!(
            check(&c, &snapshot(10.0, &[("p1", None)]), "alice", NOW),
            Err(RejectReason::UsageLimitReached)
        );

        c.max_total_uses = None;
        assert_eq!(
            check(&c, &snapshot(10.0, &[("p1", None)]), "alice", NOW),
            Err(RejectReason::MinimumNotMet { minimum: 500.0 })
        );
    }

    #[test]
    fn test_applicability_by_product_or_category() {
        let mut c = coupon();
        c.applicable_products = vec!["p2".to_string()];
        c.applicable_categories = vec!["shoes".to_string()];

        assert_eq!(
            check(&c, &snapshot(100.0, &[("p1", Some("hats"))]), "alice", NOW),
            Err(RejectReason::NotApplicable)
        );
        assert!(check(&c, &snapshot(100.0, &[("p2", None)]), "alice", NOW).is_ok());
        assert!(check(&c, &snapshot(100.0, &[("p9", Some("shoes"))]), "alice", NOW).is_ok());
    }

    #[test]
    fn test_excluded_product_rejects() {
        let mut c = coupon();
        c.excluded_products = vec!["p3".to_string()];
        assert_eq!(
            check(&c, &snapshot(100.0, &[("p1", None), ("p3", None)]), "alice", NOW),
            Err(RejectReason::ExcludedItem {
                product_id: "p3".to_string()
            })
        );
    }
}
