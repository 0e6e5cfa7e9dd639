//! Catalog Service - products and coupons/offers
//!
//! Product upserts never touch `sales_count`; coupon creation never touches
//! the usage counters. Both are owned by the sales ledger.

use crate::core::{Config, LedgerError, LedgerResult, Resource};
use crate::discount::{self, ValidationResult};
use crate::store::{LedgerStorage, RetryPolicy, StorageError, with_storage_retry};
use crate::utils::money::MAX_PRICE;
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, validate_amount, validate_optional_text,
    validate_required_text,
};
use serde::{Deserialize, Serialize};
use shared::error::ErrorCode;
use shared::models::{Coupon, CouponCreate, DiscountType, Product, ProductUpsert};
use shared::order::OrderSnapshot;
use shared::util::now_millis;

/// Outcome of a coupon dry-run against a cart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouponCheck {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Discount the coupon would give (0 when invalid)
    pub discount: f64,
}

#[derive(Clone)]
pub struct CatalogService {
    storage: LedgerStorage,
    policy: RetryPolicy,
}

impl CatalogService {
    pub fn new(storage: LedgerStorage, policy: RetryPolicy) -> Self {
        Self { storage, policy }
    }

    pub fn from_config(storage: LedgerStorage, config: &Config) -> Self {
        Self::new(storage, RetryPolicy::from_config(config))
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Create or replace a product, preserving its `sales_count`
    pub fn upsert_product(&self, id: &str, data: ProductUpsert) -> LedgerResult<Product> {
        validate_required_text(id, "id", MAX_SHORT_TEXT_LEN, ErrorCode::ValidationFailed)?;
        validate_required_text(&data.name, "name", MAX_NAME_LEN, ErrorCode::ValidationFailed)?;
        validate_amount(data.price, "price", MAX_PRICE, ErrorCode::InvalidPrice)?;
        validate_optional_text(&data.category_id, "category_id", MAX_SHORT_TEXT_LEN)?;

        let product = with_storage_retry(&self.policy, "upsert_product", || {
            let now = now_millis();
            let txn = self.storage.begin_write()?;
            let sales_count = self
                .storage
                .get_product_txn(&txn, id)?
                .map(|p| p.sales_count)
                .unwrap_or(0);
            let product = Product {
                id: id.to_string(),
                name: data.name.trim().to_string(),
                price: data.price,
                category_id: data.category_id.clone(),
                is_active: data.is_active,
                sales_count,
                updated_at: now,
            };
            self.storage.store_product(&txn, &product)?;
            txn.commit().map_err(StorageError::from)?;
            Ok(product)
        })?;

        tracing::info!(
            product_id = %product.id,
            price = product.price,
            is_active = product.is_active,
            "Product saved"
        );
        Ok(product)
    }

    pub fn get_product(&self, id: &str) -> LedgerResult<Product> {
        with_storage_retry(&self.policy, "get_product", || {
            Ok(self.storage.get_product(id)?)
        })?
        .ok_or_else(|| LedgerError::not_found(Resource::Product, id))
    }

    // =========================================================================
    // Coupons
    // =========================================================================

    /// Create a coupon or offer; codes are unique after normalization
    pub fn create_coupon(&self, data: CouponCreate) -> LedgerResult<Coupon> {
        let code = Coupon::normalize_code(&data.code);
        validate_coupon_definition(&code, &data)?;

        let coupon = with_storage_retry(&self.policy, "create_coupon", || {
            let now = now_millis();
            let txn = self.storage.begin_write()?;
            if self.storage.get_coupon_txn(&txn, &code)?.is_some() {
                return Err(LedgerError::AlreadyExists {
                    resource: Resource::Coupon,
                    id: code.clone(),
                });
            }
            let coupon = Coupon {
                code: code.clone(),
                kind: data.kind,
                owner_id: data.owner_id.clone(),
                description: data.description.clone(),
                discount_type: data.discount_type,
                discount_value: data.discount_value,
                max_discount_amount: data.max_discount_amount,
                minimum_order_amount: data.minimum_order_amount.unwrap_or(0.0),
                valid_from: data.valid_from,
                valid_until: data.valid_until,
                max_total_uses: data.max_total_uses,
                max_uses_per_customer: data.max_uses_per_customer,
                applicable_products: data.applicable_products.clone(),
                applicable_categories: data.applicable_categories.clone(),
                excluded_products: data.excluded_products.clone(),
                is_active: data.is_active.unwrap_or(true),
                total_usage_count: 0,
                total_discount_given: 0.0,
                usage_history: Vec::new(),
                created_at: now,
                updated_at: now,
            };
            self.storage.store_coupon(&txn, &coupon)?;
            txn.commit().map_err(StorageError::from)?;
            Ok(coupon)
        })?;

        tracing::info!(
            code = %coupon.code,
            kind = ?coupon.kind,
            owner_id = %coupon.owner_id,
            "Coupon created"
        );
        Ok(coupon)
    }

    pub fn get_coupon(&self, code: &str) -> LedgerResult<Coupon> {
        let code = Coupon::normalize_code(code);
        with_storage_retry(&self.policy, "get_coupon", || {
            Ok(self.storage.get_coupon(&code)?)
        })?
        .ok_or_else(|| LedgerError::not_found(Resource::Coupon, code.clone()))
    }

    /// Check a code against a cart without redeeming it
    pub fn validate_coupon(
        &self,
        code: &str,
        snapshot: &OrderSnapshot,
        customer_id: &str,
    ) -> LedgerResult<CouponCheck> {
        let coupon = self.get_coupon(code)?;
        let ValidationResult { valid, reason } =
            discount::validate(&coupon, snapshot, customer_id, now_millis());
        let discount = if valid {
            discount::compute_discount(&coupon, snapshot)
        } else {
            0.0
        };
        Ok(CouponCheck {
            valid,
            reason,
            discount,
        })
    }
}

fn validate_coupon_definition(code: &str, data: &CouponCreate) -> LedgerResult<()> {
    let invalid = ErrorCode::InvalidCouponDefinition;
    validate_required_text(code, "code", MAX_SHORT_TEXT_LEN, invalid)?;
    validate_required_text(&data.owner_id, "owner_id", MAX_SHORT_TEXT_LEN, invalid)?;
    validate_optional_text(&data.description, "description", MAX_NOTE_LEN)?;

    match data.discount_type {
        DiscountType::Percentage => {
            if !(data.discount_value > 0.0 && data.discount_value <= 100.0) {
                return Err(LedgerError::validation(
                    invalid,
                    format!(
                        "Percentage discount must be in (0, 100], got {}",
                        data.discount_value
                    ),
                ));
            }
        }
        DiscountType::FixedAmount => {
            validate_amount(data.discount_value, "discount_value", MAX_PRICE, invalid)?;
            if data.discount_value == 0.0 {
                return Err(LedgerError::validation(
                    invalid,
                    "Fixed discount must be positive",
                ));
            }
        }
    }
    if let Some(cap) = data.max_discount_amount {
        validate_amount(cap, "max_discount_amount", MAX_PRICE, invalid)?;
    }
    if let Some(minimum) = data.minimum_order_amount {
        validate_amount(minimum, "minimum_order_amount", MAX_PRICE, invalid)?;
    }
    if data.valid_until < data.valid_from {
        return Err(LedgerError::validation(
            invalid,
            "valid_until must not be before valid_from",
        ));
    }
    if data.max_total_uses == Some(0) || data.max_uses_per_customer == Some(0) {
        return Err(LedgerError::validation(
            invalid,
            "Usage limits must be at least 1 when set",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::PromotionKind;
    use shared::order::SnapshotItem;

    fn service() -> CatalogService {
        CatalogService::new(LedgerStorage::open_in_memory().unwrap(), RetryPolicy::default())
    }

    fn coupon_create(code: &str) -> CouponCreate {
        CouponCreate {
            code: code.to_string(),
            kind: PromotionKind::Offer,
            owner_id: "seller-1".to_string(),
            description: Some("Spring sale".to_string()),
            discount_type: DiscountType::Percentage,
            discount_value: 20.0,
            max_discount_amount: Some(50.0),
            minimum_order_amount: None,
            valid_from: 0,
            valid_until: i64::MAX,
            max_total_uses: None,
            max_uses_per_customer: Some(1),
            applicable_products: vec![],
            applicable_categories: vec![],
            excluded_products: vec![],
            is_active: None,
        }
    }

    fn snapshot(subtotal: f64) -> OrderSnapshot {
        OrderSnapshot {
            subtotal,
            items: vec![SnapshotItem {
                product_id: "tee".to_string(),
                category_id: None,
                quantity: 1,
                line_total: subtotal,
            }],
        }
    }

    #[test]
    fn test_upsert_preserves_sales_count() {
        let catalog = service();
        let upsert = |price: f64| ProductUpsert {
            name: "Tee".to_string(),
            price,
            category_id: None,
            is_active: true,
        };
        catalog.upsert_product("tee", upsert(10.0)).unwrap();

        let storage = &catalog.storage;
        let txn = storage.begin_write().unwrap();
        storage.adjust_sales_count(&txn, "tee", 7, 0).unwrap();
        txn.commit().unwrap();

        let updated = catalog.upsert_product("tee", upsert(12.0)).unwrap();
        assert_eq!(updated.price, 12.0);
        assert_eq!(updated.sales_count, 7);
        assert_eq!(catalog.get_product("tee").unwrap().sales_count, 7);
    }

    #[test]
    fn test_upsert_rejects_bad_price() {
        let catalog = service();
        let err = catalog
            .upsert_product(
                "tee",
                ProductUpsert {
                    name: "Tee".to_string(),
                    price: -1.0,
                    category_id: None,
                    is_active: true,
                },
            )
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Validation {
                code: ErrorCode::InvalidPrice,
                ..
            }
        ));
    }

    #[test]
    fn test_create_coupon_normalizes_and_rejects_duplicates() {
        let catalog = service();
        let created = catalog.create_coupon(coupon_create(" spring20 ")).unwrap();
        assert_eq!(created.code, "SPRING20");
        assert!(created.is_active);
        assert_eq!(created.total_usage_count, 0);

        let dup = catalog.create_coupon(coupon_create("Spring20")).unwrap_err();
        assert!(matches!(
            dup,
            LedgerError::AlreadyExists {
                resource: Resource::Coupon,
                ..
            }
        ));
        assert_eq!(catalog.get_coupon("spring20").unwrap().code, "SPRING20");
    }

    #[test]
    fn test_create_coupon_rejects_bad_definitions() {
        let catalog = service();

        let mut over = coupon_create("OVER");
        over.discount_value = 150.0;
        let mut window = coupon_create("WINDOW");
        window.valid_from = 10;
        window.valid_until = 5;
        let mut blank = coupon_create("   ");
        blank.discount_value = 10.0;

        for bad in [over, window, blank] {
            assert!(matches!(
                catalog.create_coupon(bad).unwrap_err(),
                LedgerError::Validation {
                    code: ErrorCode::InvalidCouponDefinition,
                    ..
                }
            ));
        }
    }

    #[test]
    fn test_validate_coupon_dry_run() {
        let catalog = service();
        catalog.create_coupon(coupon_create("SPRING20")).unwrap();

        let check = catalog
            .validate_coupon("spring20", &snapshot(100.0), "alice")
            .unwrap();
        assert!(check.valid);
        assert_eq!(check.discount, 20.0);

        // Capped at max_discount_amount
        let capped = catalog
            .validate_coupon("SPRING20", &snapshot(1000.0), "alice")
            .unwrap();
        assert_eq!(capped.discount, 50.0);

        assert!(matches!(
            catalog
                .validate_coupon("NOPE", &snapshot(100.0), "alice")
                .unwrap_err(),
            LedgerError::NotFound { .. }
        ));
    }
}
