//! In-memory `SwapStore` for tests and simulations.

use crate::domain::{Hash, PartialFillState, StoreError, SwapRecord};
use crate::ports::SwapStore;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Swap records kept in process memory.
#[derive(Default)]
pub struct InMemorySwapStore {
    records: RwLock<HashMap<Hash, SwapRecord>>,
    orders: RwLock<HashMap<Hash, PartialFillState>>,
}

impl InMemorySwapStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl SwapStore for InMemorySwapStore {
    fn get(&self, order_hash: &Hash) -> Result<Option<SwapRecord>, StoreError> {
        Ok(self.records.read().get(order_hash).cloned())
    }

    fn put(&self, record: &SwapRecord) -> Result<(), StoreError> {
        self.records
            .write()
            .insert(record.order_hash, record.clone());
        Ok(())
    }

    fn list(&self) -> Result<Vec<SwapRecord>, StoreError> {
        let mut records: Vec<_> = self.records.read().values().cloned().collect();
        records.sort_by_key(|r| (r.created_at, r.order_hash));
        Ok(records)
    }

    fn get_order(&self, order_hash: &Hash) -> Result<Option<PartialFillState>, StoreError> {
        Ok(self.orders.read().get(order_hash).cloned())
    }

    fn put_order(&self, state: &PartialFillState) -> Result<(), StoreError> {
        self.orders.write().insert(state.order_hash, state.clone());
        Ok(())
    }
}
