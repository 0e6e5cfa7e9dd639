//! OrdersManager - checkout, fulfilment transitions and ledger maintenance
//!
//! # Transition Flow
//!
//! ```text
//! transition_order_status(order_number, target)
//!     ├─ 1. Load order + version
//!     ├─ 2. state_machine::transition (pure) → next order + ledger delta
//!     ├─ 3. Begin write transaction
//!     ├─ 4. apply_delta (guarded by sales_counted)
//!     ├─ 5. Version check + write order
//!     ├─ 6. Commit (conflict → back to 1)
//!     └─ 7. Publish notification
//! ```

use super::checkout::{self, CheckoutSettings, CreateOrder};
use super::state_machine::{self, DeliverySchedule};
use super::writer::{Mutation, OrderWriter};
use crate::core::{Config, LedgerError, LedgerResult, Resource};
use crate::discount;
use crate::ledger::{self, LedgerDelta, RecalculationReport};
use crate::notify::{NotificationKind, Notifier, OrderNotification};
use crate::store::{LedgerStorage, RetryPolicy, StorageError, with_storage_retry};
use shared::error::ErrorCode;
use shared::models::Coupon;
use shared::order::{Order, OrderSnapshot, OrderStatus};
use shared::util::now_millis;
use std::collections::HashMap;

pub struct OrdersManager {
    writer: OrderWriter,
    checkout: CheckoutSettings,
    schedule: DeliverySchedule,
    notifier: Notifier,
}

impl std::fmt::Debug for OrdersManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrdersManager")
            .field("storage", &"<LedgerStorage>")
            .field("checkout", &self.checkout)
            .field("schedule", &self.schedule)
            .finish()
    }
}

impl OrdersManager {
    pub fn new(
        storage: LedgerStorage,
        policy: RetryPolicy,
        checkout: CheckoutSettings,
        schedule: DeliverySchedule,
        notifier: Notifier,
    ) -> Self {
        Self {
            writer: OrderWriter::new(storage, policy),
            checkout,
            schedule,
            notifier,
        }
    }

    pub fn from_config(storage: LedgerStorage, config: &Config, notifier: Notifier) -> Self {
        Self::new(
            storage,
            RetryPolicy::from_config(config),
            CheckoutSettings::from_config(config),
            DeliverySchedule::from_config(config),
            notifier,
        )
    }

    /// Create a manager with default settings (for testing)
    pub fn with_storage(storage: LedgerStorage) -> Self {
        Self::new(
            storage,
            RetryPolicy::default(),
            CheckoutSettings::default(),
            DeliverySchedule::default(),
            Notifier::new(64),
        )
    }

    pub fn storage(&self) -> &LedgerStorage {
        self.writer.storage()
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    // ========== Checkout ==========

    /// Create a pending, unpaid order
    ///
    /// Prices come from the catalog. A promo code must exist and pass
    /// validation; it is only redeemed once the order is counted.
    pub fn create_order(&self, req: CreateOrder) -> LedgerResult<Order> {
        checkout::validate_request(&req)?;
        let storage = self.storage();
        let policy = self.writer.policy();
        let now = now_millis();

        let products = with_storage_retry(policy, "load_products", || {
            let mut found = HashMap::new();
            for item in &req.items {
                if let Some(product) = storage.get_product(&item.product_id)? {
                    found.insert(product.id.clone(), product);
                }
            }
            Ok(found)
        })?;
        let items = checkout::build_items(&req.items, &products)?;
        let subtotal = checkout::subtotal(&items);

        let promo_code = req
            .promo_code
            .as_deref()
            .map(Coupon::normalize_code)
            .filter(|c| !c.is_empty());
        let discount = match &promo_code {
            Some(code) => {
                let coupon = self.load_coupon(code)?;
                let snapshot = OrderSnapshot::from_items(subtotal, &items);
                discount::check(&coupon, &snapshot, &req.customer_id, now).map_err(|reason| {
                    LedgerError::validation(ErrorCode::CouponNotApplicable, reason.to_string())
                })?;
                discount::compute_discount(&coupon, &snapshot)
            }
            None => 0.0,
        };

        let delivery_charge = self.checkout.delivery_charge_for(subtotal);
        let pricing = checkout::price(subtotal, delivery_charge, discount, promo_code);
        let order = Order::new(
            req.customer_id,
            items,
            req.delivery,
            pricing,
            req.payment_method,
            now,
        );

        let order = with_storage_retry(policy, "insert_order", || {
            let mut candidate = order.clone();
            let txn = storage.begin_write()?;
            storage.insert_order(&txn, &mut candidate, now)?;
            txn.commit().map_err(StorageError::from)?;
            Ok(candidate)
        })?;

        tracing::info!(
            order_number = %order.order_number,
            customer_id = %order.customer_id,
            total = order.pricing.total,
            promo_code = ?order.pricing.promo_code,
            "Order created"
        );
        self.notifier
            .publish(OrderNotification::new(&order, NotificationKind::OrderPlaced));
        Ok(order)
    }

    // ========== Queries ==========

    pub fn get_order(&self, order_number: &str) -> LedgerResult<Order> {
        self.writer.load(order_number)
    }

    pub fn list_orders_for_customer(&self, customer_id: &str) -> LedgerResult<Vec<Order>> {
        with_storage_retry(self.writer.policy(), "list_customer_orders", || {
            Ok(self.storage().list_customer_orders(customer_id)?)
        })
    }

    // ========== Fulfilment ==========

    /// Move an order to `target`, applying the ledger effect atomically
    pub fn transition_order_status(
        &self,
        order_number: &str,
        target: OrderStatus,
        note: Option<String>,
    ) -> LedgerResult<Order> {
        let committed = self.writer.mutate(order_number, |current, now| {
            let t = state_machine::transition(current, target, note.clone(), now, &self.schedule)?;
            Ok(Mutation::write(t.order, t.ledger, t.from))
        })?;

        let order = committed.order;
        let from = committed.output;
        tracing::info!(
            order_number = %order.order_number,
            from = %from,
            to = %target,
            payment_status = %order.payment.status,
            sales_counted = order.sales_counted,
            "Order status changed"
        );
        self.notifier.publish(OrderNotification::new(
            &order,
            NotificationKind::StatusChanged { from, to: target },
        ));
        Ok(order)
    }

    /// Administrative purge
    ///
    /// A counted order has its ledger contribution reversed in the same
    /// transaction, so derived counters stay reconstructable from the
    /// remaining orders.
    pub fn purge_order(&self, order_number: &str) -> LedgerResult<Order> {
        let storage = self.storage();
        let removed = with_storage_retry(self.writer.policy(), "purge_order", || {
            let now = now_millis();
            let txn = storage.begin_write()?;
            let Some(mut order) = storage.remove_order(&txn, order_number)? else {
                return Ok(None);
            };
            ledger::apply_delta(storage, &txn, &mut order, LedgerDelta::Decrement, now)?;
            txn.commit().map_err(StorageError::from)?;
            Ok(Some(order))
        })?
        .ok_or_else(|| LedgerError::not_found(Resource::Order, order_number))?;

        tracing::warn!(
            order_number = %removed.order_number,
            customer_id = %removed.customer_id,
            status = %removed.status,
            "Order purged"
        );
        Ok(removed)
    }

    // ========== Ledger ==========

    /// Recompute every derived counter from orders in a counted state
    pub fn recalculate_sales_ledger(&self) -> LedgerResult<RecalculationReport> {
        with_storage_retry(self.writer.policy(), "recalculate_sales_ledger", || {
            Ok(ledger::recalculate(self.storage(), now_millis())?)
        })
    }

    fn load_coupon(&self, code: &str) -> LedgerResult<Coupon> {
        with_storage_retry(self.writer.policy(), "load_coupon", || {
            Ok(self.storage().get_coupon(code)?)
        })?
        .ok_or_else(|| LedgerError::not_found(Resource::Coupon, code))
    }
}

#[cfg(test)]
mod tests;
