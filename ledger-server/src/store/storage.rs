//! redb-based storage layer for the commerce ledger
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `orders` | `order_number` | `Order` (JSON) | Order documents |
//! | `products` | `product_id` | `Product` (JSON) | Catalog slice with `sales_count` |
//! | `coupons` | `code` | `Coupon` (JSON) | Coupons / offers with usage counters |
//! | `gateway_index` | `gateway_payment_id` | `order_number` | Callback lookup |
//! | `customer_orders` | `(customer_id, order_number)` | `()` | Per-customer listing |
//! | `counters` | counter name | `u64` | Order number sequences |
//!
//! # Concurrency
//!
//! redb admits a single write transaction at a time, so read-modify-write of a
//! counter inside a write transaction is atomic with respect to every other
//! writer. Order documents are additionally guarded by `version`: writers read
//! the document outside the transaction, and [`LedgerStorage::compare_and_store_order`]
//! rejects the write if another writer got there first.

use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
    WriteTransaction,
};
use shared::models::{Coupon, Product};
use shared::order::Order;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Table for order documents: key = order_number, value = JSON-serialized Order
const ORDERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");

/// Table for products: key = product_id, value = JSON-serialized Product
const PRODUCTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("products");

/// Table for coupons and offers: key = normalized code, value = JSON-serialized Coupon
const COUPONS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("coupons");

/// Table mapping gateway payment ids to order numbers
const GATEWAY_INDEX_TABLE: TableDefinition<&str, &str> = TableDefinition::new("gateway_index");

/// Table indexing orders per customer: key = (customer_id, order_number)
const CUSTOMER_ORDERS_TABLE: TableDefinition<(&str, &str), ()> =
    TableDefinition::new("customer_orders");

/// Table for named counters: key = counter name, value = u64
const COUNTERS_TABLE: TableDefinition<&str, u64> = TableDefinition::new("counters");

const ORDER_SEQ_PREFIX: &str = "order_seq";

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Version conflict on order {order_number}: expected {expected}, found {found}")]
    VersionConflict {
        order_number: String,
        expected: u64,
        found: u64,
    },

    #[error("Gateway payment {gateway_payment_id} already belongs to order {owner}")]
    GatewayIdTaken {
        gateway_payment_id: String,
        owner: String,
    },
}

impl StorageError {
    /// I/O failures that may succeed when the operation is retried
    pub fn is_transient(&self) -> bool {
        match self {
            StorageError::Storage(e) => is_io(e),
            StorageError::Database(redb::DatabaseError::Storage(e)) => is_io(e),
            StorageError::Transaction(redb::TransactionError::Storage(e)) => is_io(e),
            StorageError::Table(redb::TableError::Storage(e)) => is_io(e),
            StorageError::Commit(redb::CommitError::Storage(e)) => is_io(e),
            _ => false,
        }
    }
}

fn is_io(e: &redb::StorageError) -> bool {
    matches!(e, redb::StorageError::Io(_))
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Result of a store-side `sales_count` adjustment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SalesAdjustment {
    pub previous: u64,
    pub current: u64,
    /// The decrement would have gone below zero and was clamped
    pub clamped: bool,
}

/// Row counts per table
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct StorageStats {
    pub orders: u64,
    pub products: u64,
    pub coupons: u64,
}

/// Ledger storage backed by redb
#[derive(Clone)]
pub struct LedgerStorage {
    db: Arc<Database>,
}

impl LedgerStorage {
    /// Open or create the database at the given path
    ///
    /// redb commits with `Durability::Immediate` by default: a commit is
    /// persistent as soon as `commit()` returns and the file is always in a
    /// consistent state.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database (tests and ephemeral runs)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StorageResult<Self> {
        let write_txn = db.begin_write()?;
        {
            // Create all tables if they don't exist
            let _ = write_txn.open_table(ORDERS_TABLE)?;
            let _ = write_txn.open_table(PRODUCTS_TABLE)?;
            let _ = write_txn.open_table(COUPONS_TABLE)?;
            let _ = write_txn.open_table(GATEWAY_INDEX_TABLE)?;
            let _ = write_txn.open_table(CUSTOMER_ORDERS_TABLE)?;
            let _ = write_txn.open_table(COUNTERS_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Begin a write transaction
    ///
    /// Blocks while another write transaction is open.
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Counters ==========

    /// Allocate the next order number: `ORD-{YYYYMMDD}-{seq:06}`
    ///
    /// The sequence restarts every UTC day and is allocated inside the
    /// caller's transaction, so an aborted insert does not burn a number.
    pub fn next_order_number(&self, txn: &WriteTransaction, now: i64) -> StorageResult<String> {
        let date = shared::util::date_stamp(now);
        let key = format!("{}:{}", ORDER_SEQ_PREFIX, date);

        let mut table = txn.open_table(COUNTERS_TABLE)?;
        let current = table.get(key.as_str())?.map(|g| g.value()).unwrap_or(0);
        let next = current + 1;
        table.insert(key.as_str(), next)?;

        Ok(format!("ORD-{}-{:06}", date, next))
    }

    // ========== Orders ==========

    /// Insert a new order, assigning its order number and first version
    pub fn insert_order(
        &self,
        txn: &WriteTransaction,
        order: &mut Order,
        now: i64,
    ) -> StorageResult<()> {
        order.order_number = self.next_order_number(txn, now)?;
        order.version = 1;
        self.store_order(txn, order)
    }

    /// Write an order document and maintain its secondary indexes
    pub fn store_order(&self, txn: &WriteTransaction, order: &Order) -> StorageResult<()> {
        let value = serde_json::to_vec(order)?;
        {
            let mut table = txn.open_table(ORDERS_TABLE)?;
            table.insert(order.order_number.as_str(), value.as_slice())?;
        }
        {
            let mut index = txn.open_table(CUSTOMER_ORDERS_TABLE)?;
            index.insert((order.customer_id.as_str(), order.order_number.as_str()), ())?;
        }
        if let Some(gateway_id) = order.payment.gateway_payment_id.as_deref() {
            let mut index = txn.open_table(GATEWAY_INDEX_TABLE)?;
            let owner = index.get(gateway_id)?.map(|v| v.value().to_string());
            if let Some(owner) = owner
                && owner != order.order_number
            {
                return Err(StorageError::GatewayIdTaken {
                    gateway_payment_id: gateway_id.to_string(),
                    owner,
                });
            }
            index.insert(gateway_id, order.order_number.as_str())?;
        }
        Ok(())
    }

    /// Write an order only if the stored version still equals `expected_version`
    ///
    /// On success the document is written with `version = expected_version + 1`.
    pub fn compare_and_store_order(
        &self,
        txn: &WriteTransaction,
        order: &mut Order,
        expected_version: u64,
    ) -> StorageResult<()> {
        let found = self
            .get_order_txn(txn, &order.order_number)?
            .ok_or_else(|| StorageError::OrderNotFound(order.order_number.clone()))?
            .version;
        if found != expected_version {
            return Err(StorageError::VersionConflict {
                order_number: order.order_number.clone(),
                expected: expected_version,
                found,
            });
        }

        order.version = expected_version + 1;
        self.store_order(txn, order)
    }

    /// Get an order by number
    pub fn get_order(&self, order_number: &str) -> StorageResult<Option<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;

        match table.get(order_number)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get an order by number (within transaction)
    pub fn get_order_txn(
        &self,
        txn: &WriteTransaction,
        order_number: &str,
    ) -> StorageResult<Option<Order>> {
        let table = txn.open_table(ORDERS_TABLE)?;

        match table.get(order_number)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Remove an order and its index entries
    pub fn remove_order(
        &self,
        txn: &WriteTransaction,
        order_number: &str,
    ) -> StorageResult<Option<Order>> {
        let Some(order) = self.get_order_txn(txn, order_number)? else {
            return Ok(None);
        };

        {
            let mut table = txn.open_table(ORDERS_TABLE)?;
            table.remove(order_number)?;
        }
        {
            let mut index = txn.open_table(CUSTOMER_ORDERS_TABLE)?;
            index.remove((order.customer_id.as_str(), order_number))?;
        }
        if let Some(gateway_id) = order.payment.gateway_payment_id.as_deref() {
            let mut index = txn.open_table(GATEWAY_INDEX_TABLE)?;
            index.remove(gateway_id)?;
        }

        Ok(Some(order))
    }

    /// All orders (within transaction)
    pub fn all_orders_txn(&self, txn: &WriteTransaction) -> StorageResult<Vec<Order>> {
        let table = txn.open_table(ORDERS_TABLE)?;

        let mut orders = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            orders.push(serde_json::from_slice(value.value())?);
        }
        Ok(orders)
    }

    /// Orders of one customer, newest first
    pub fn list_customer_orders(&self, customer_id: &str) -> StorageResult<Vec<Order>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(CUSTOMER_ORDERS_TABLE)?;
        let orders_table = read_txn.open_table(ORDERS_TABLE)?;

        let mut orders: Vec<Order> = Vec::new();
        for result in index.range((customer_id, "")..)? {
            let (key, _value) = result?;
            let (owner, order_number) = key.value();
            if owner != customer_id {
                break;
            }
            if let Some(value) = orders_table.get(order_number)? {
                orders.push(serde_json::from_slice(value.value())?);
            }
        }

        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    /// Resolve a gateway payment id to its order number
    pub fn find_order_number_by_gateway_id(
        &self,
        gateway_payment_id: &str,
    ) -> StorageResult<Option<String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(GATEWAY_INDEX_TABLE)?;
        Ok(table.get(gateway_payment_id)?.map(|g| g.value().to_string()))
    }

    // ========== Products ==========

    /// Get a product by id
    pub fn get_product(&self, product_id: &str) -> StorageResult<Option<Product>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PRODUCTS_TABLE)?;

        match table.get(product_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get a product by id (within transaction)
    pub fn get_product_txn(
        &self,
        txn: &WriteTransaction,
        product_id: &str,
    ) -> StorageResult<Option<Product>> {
        let table = txn.open_table(PRODUCTS_TABLE)?;

        match table.get(product_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Write a product
    pub fn store_product(&self, txn: &WriteTransaction, product: &Product) -> StorageResult<()> {
        let mut table = txn.open_table(PRODUCTS_TABLE)?;
        let value = serde_json::to_vec(product)?;
        table.insert(product.id.as_str(), value.as_slice())?;
        Ok(())
    }

    /// All products (within transaction)
    pub fn all_products_txn(&self, txn: &WriteTransaction) -> StorageResult<Vec<Product>> {
        let table = txn.open_table(PRODUCTS_TABLE)?;

        let mut products = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            products.push(serde_json::from_slice(value.value())?);
        }
        Ok(products)
    }

    /// Add `delta` to a product's `sales_count`, clamping at zero
    ///
    /// Returns `None` when the product does not exist.
    pub fn adjust_sales_count(
        &self,
        txn: &WriteTransaction,
        product_id: &str,
        delta: i64,
        now: i64,
    ) -> StorageResult<Option<SalesAdjustment>> {
        let Some(mut product) = self.get_product_txn(txn, product_id)? else {
            return Ok(None);
        };

        let previous = product.sales_count;
        let target = previous as i128 + delta as i128;
        let clamped = target < 0;
        product.sales_count = target.max(0) as u64;
        product.updated_at = now;
        self.store_product(txn, &product)?;

        Ok(Some(SalesAdjustment {
            previous,
            current: product.sales_count,
            clamped,
        }))
    }

    // ========== Coupons ==========

    /// Get a coupon by normalized code
    pub fn get_coupon(&self, code: &str) -> StorageResult<Option<Coupon>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(COUPONS_TABLE)?;

        match table.get(code)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Get a coupon by normalized code (within transaction)
    pub fn get_coupon_txn(
        &self,
        txn: &WriteTransaction,
        code: &str,
    ) -> StorageResult<Option<Coupon>> {
        let table = txn.open_table(COUPONS_TABLE)?;

        match table.get(code)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Write a coupon
    pub fn store_coupon(&self, txn: &WriteTransaction, coupon: &Coupon) -> StorageResult<()> {
        let mut table = txn.open_table(COUPONS_TABLE)?;
        let value = serde_json::to_vec(coupon)?;
        table.insert(coupon.code.as_str(), value.as_slice())?;
        Ok(())
    }

    /// All coupons (within transaction)
    pub fn all_coupons_txn(&self, txn: &WriteTransaction) -> StorageResult<Vec<Coupon>> {
        let table = txn.open_table(COUPONS_TABLE)?;

        let mut coupons = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            coupons.push(serde_json::from_slice(value.value())?);
        }
        Ok(coupons)
    }

    // ========== Stats ==========

    /// Row counts, used by the detailed health check
    pub fn get_stats(&self) -> StorageResult<StorageStats> {
        let read_txn = self.db.begin_read()?;
        let orders = read_txn.open_table(ORDERS_TABLE)?.len()?;
        let products = read_txn.open_table(PRODUCTS_TABLE)?.len()?;
        let coupons = read_txn.open_table(COUPONS_TABLE)?.len()?;

        Ok(StorageStats {
            orders,
            products,
            coupons,
        })
    }
}
