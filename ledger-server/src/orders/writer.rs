//! Version-conditioned order writes
//!
//! Every mutation of an existing order goes through [`OrderWriter::mutate`]:
//!
//! 1. read the order and its version (no transaction held)
//! 2. compute the next document with a pure function
//! 3. in one write transaction: apply the ledger delta, re-check the version,
//!    write the order, commit
//!
//! A version mismatch aborts the transaction (rolling back the ledger delta)
//! and the whole cycle is retried against the fresh document.

use crate::core::{LedgerError, LedgerResult, Resource};
use crate::ledger::{LedgerDelta, apply_delta};
use crate::store::{LedgerStorage, RetryPolicy, StorageError, with_storage_retry};
use shared::error::ErrorCode;
use shared::order::Order;
use shared::util::now_millis;

/// What a mutation function decided to do with the current document
pub enum Mutation<T> {
    /// Persist `order`, applying `ledger` in the same transaction
    Write {
        order: Order,
        ledger: Option<LedgerDelta>,
        output: T,
    },
    /// Nothing to persist (replay, no-op)
    Skip(T),
}

impl<T> Mutation<T> {
    pub fn write(order: Order, ledger: Option<LedgerDelta>, output: T) -> Self {
        Mutation::Write {
            order,
            ledger,
            output,
        }
    }
}

/// Outcome of [`OrderWriter::mutate`]
#[derive(Debug, Clone)]
pub struct Committed<T> {
    /// The document as committed, or as read when nothing was written
    pub order: Order,
    pub output: T,
    pub written: bool,
}

#[derive(Clone)]
pub struct OrderWriter {
    storage: LedgerStorage,
    policy: RetryPolicy,
}

impl OrderWriter {
    pub fn new(storage: LedgerStorage, policy: RetryPolicy) -> Self {
        Self { storage, policy }
    }

    pub fn storage(&self) -> &LedgerStorage {
        &self.storage
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Load an order, retrying transient storage failures
    pub fn load(&self, order_number: &str) -> LedgerResult<Order> {
        with_storage_retry(&self.policy, "load_order", || {
            Ok(self.storage.get_order(order_number)?)
        })?
        .ok_or_else(|| LedgerError::not_found(Resource::Order, order_number))
    }

    /// Read-compute-CAS loop over one order
    ///
    /// `f` receives the current document and the operation timestamp; it may
    /// run several times when other writers interleave, so it must be pure.
    pub fn mutate<T>(
        &self,
        order_number: &str,
        mut f: impl FnMut(&Order, i64) -> LedgerResult<Mutation<T>>,
    ) -> LedgerResult<Committed<T>> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let current = self.load(order_number)?;
            let now = now_millis();

            let (mut order, ledger, output) = match f(&current, now)? {
                Mutation::Skip(output) => {
                    return Ok(Committed {
                        order: current,
                        output,
                        written: false,
                    });
                }
                Mutation::Write {
                    order,
                    ledger,
                    output,
                } => (order, ledger, output),
            };
            order.updated_at = now;

            let result = with_storage_retry(&self.policy, "commit_order", || {
                let mut candidate = order.clone();
                self.commit(&mut candidate, current.version, ledger, now)?;
                Ok(candidate)
            });

            match result {
                Ok(committed) => {
                    return Ok(Committed {
                        order: committed,
                        output,
                        written: true,
                    });
                }
                Err(LedgerError::Storage(StorageError::VersionConflict { found, .. })) => {
                    if attempt >= self.policy.max_conflict_retries {
                        return Err(LedgerError::ConflictRetry {
                            order_number: order_number.to_string(),
                            attempts: attempt,
                        });
                    }
                    tracing::debug!(
                        order_number,
                        attempt,
                        expected = current.version,
                        found,
                        "Order changed underneath, retrying"
                    );
                }
                Err(LedgerError::Storage(StorageError::OrderNotFound(_))) => {
                    return Err(LedgerError::not_found(Resource::Order, order_number));
                }
                Err(LedgerError::Storage(StorageError::GatewayIdTaken {
                    gateway_payment_id,
                    ..
                })) => {
                    return Err(LedgerError::validation(
                        ErrorCode::InvalidRequest,
                        format!("Gateway payment {} belongs to another order", gateway_payment_id),
                    ));
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn commit(
        &self,
        order: &mut Order,
        expected_version: u64,
        ledger: Option<LedgerDelta>,
        now: i64,
    ) -> LedgerResult<()> {
        let txn = self.storage.begin_write()?;
        if let Some(delta) = ledger {
            apply_delta(&self.storage, &txn, order, delta, now)?;
        }
        self.storage
            .compare_and_store_order(&txn, order, expected_version)?;
        txn.commit().map_err(StorageError::from)?;
        Ok(())
    }
}
