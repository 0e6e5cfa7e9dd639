//! Fixtures shared by the integration tests
#![allow(dead_code)]

use ledger_server::payments::{CallbackOutcome, PaymentCallback};
use ledger_server::store::RetryPolicy;
use ledger_server::{CatalogService, LedgerStorage, OrdersManager, PaymentReconciler};
use ledger_server::orders::CreateOrder;
use shared::models::{CouponCreate, DiscountType, ProductUpsert, PromotionKind};
use shared::order::{DeliveryInfo, Order, OrderItemInput, OrderStatus, PaymentMethod};

/// Every engine service over one storage
pub struct Engine {
    pub storage: LedgerStorage,
    pub orders: OrdersManager,
    pub payments: PaymentReconciler,
    pub catalog: CatalogService,
}

impl Engine {
    pub fn new(storage: LedgerStorage) -> Self {
        Self {
            orders: OrdersManager::with_storage(storage.clone()),
            payments: PaymentReconciler::with_storage(storage.clone()),
            catalog: CatalogService::new(storage.clone(), RetryPolicy::default()),
            storage,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(LedgerStorage::open_in_memory().unwrap())
    }

    pub fn product(&self, id: &str, price: f64) {
        self.catalog
            .upsert_product(
                id,
                ProductUpsert {
                    name: format!("Product {}", id),
                    price,
                    category_id: None,
                    is_active: true,
                },
            )
            .unwrap();
    }

    pub fn percentage_coupon(&self, code: &str, value: f64, per_customer: Option<u32>) {
        self.catalog
            .create_coupon(CouponCreate {
                code: code.to_string(),
                kind: PromotionKind::Coupon,
                owner_id: "seller-1".to_string(),
                description: None,
                discount_type: DiscountType::Percentage,
                discount_value: value,
                max_discount_amount: None,
                minimum_order_amount: None,
                valid_from: 0,
                valid_until: i64::MAX,
                max_total_uses: None,
                max_uses_per_customer: per_customer,
                applicable_products: vec![],
                applicable_categories: vec![],
                excluded_products: vec![],
                is_active: None,
            })
            .unwrap();
    }

    pub fn sales_count(&self, id: &str) -> u64 {
        self.catalog.get_product(id).unwrap().sales_count
    }

    pub fn order(
        &self,
        customer: &str,
        lines: &[(&str, u32)],
        method: PaymentMethod,
        promo: Option<&str>,
    ) -> Order {
        self.orders
            .create_order(CreateOrder {
                customer_id: customer.to_string(),
                items: lines
                    .iter()
                    .map(|(id, qty)| OrderItemInput {
                        product_id: id.to_string(),
                        quantity: *qty,
                        variant: Default::default(),
                        customization: None,
                    })
                    .collect(),
                delivery: delivery(),
                payment_method: method,
                promo_code: promo.map(str::to_string),
            })
            .unwrap()
    }

    /// Walk an order forward through `path`
    pub fn advance(&self, order_number: &str, path: &[OrderStatus]) -> Order {
        let mut order = self.orders.get_order(order_number).unwrap();
        for status in path {
            order = self
                .orders
                .transition_order_status(order_number, *status, None)
                .unwrap();
        }
        order
    }
}

pub fn delivery() -> DeliveryInfo {
    DeliveryInfo {
        recipient_name: "Alice".to_string(),
        phone: "555-0100".to_string(),
        address_line: "1 Main St".to_string(),
        city: "Springfield".to_string(),
        postal_code: "12345".to_string(),
    }
}

pub fn success(order_number: &str, transaction_id: &str) -> PaymentCallback {
    PaymentCallback {
        order_number: Some(order_number.to_string()),
        gateway_payment_id: None,
        outcome: CallbackOutcome::Success,
        transaction_id: Some(transaction_id.to_string()),
        failure_reason: None,
    }
}

pub fn failure(order_number: &str, reason: &str) -> PaymentCallback {
    PaymentCallback {
        order_number: Some(order_number.to_string()),
        gateway_payment_id: None,
        outcome: CallbackOutcome::Failure,
        transaction_id: None,
        failure_reason: Some(reason.to_string()),
    }
}

pub const TO_DELIVERED: [OrderStatus; 6] = [
    OrderStatus::Confirmed,
    OrderStatus::Processing,
    OrderStatus::ReadyToShip,
    OrderStatus::Shipped,
    OrderStatus::OutForDelivery,
    OrderStatus::Delivered,
];
