//! Product Model (sales-relevant slice)

use serde::{Deserialize, Serialize};

/// Product entity
///
/// `sales_count` is derived state owned by the sales ledger; catalog
/// upserts never overwrite it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    pub is_active: bool,
    #[serde(default)]
    pub sales_count: u64,
    pub updated_at: i64,
}

/// Upsert product payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductUpsert {
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}
