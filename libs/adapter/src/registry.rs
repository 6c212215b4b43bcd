//! Pair Registry
//!
//! Durable `PairKey → PoolHandle` association, populated lazily. Keys are
//! canonical, so `{A, B}` and `{B, A}` always hit the same entry. Entries
//! are never mutated once written; the only removal path is rolling back
//! the operation that inserted them.

use crate::engine::PoolFactory;
use crate::errors::{AdapterError, Result};
use crate::logging::LogEmoji;
use crate::transaction::Transactional;
use crate::types::{AssetId, PairKey, PoolHandle};
use std::collections::HashMap;
use tracing::{debug, info};

#[derive(Debug, Default, Clone)]
pub struct PairRegistry {
    entries: HashMap<PairKey, PoolHandle>,
    /// Keys inserted since the last commit, in insertion order
    journal: Vec<PairKey>,
}

impl PairRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pure lookup; never creates. Identical assets resolve to nothing.
    pub fn resolve(&self, a: AssetId, b: AssetId) -> Option<PoolHandle> {
        let key = PairKey::new(a, b).ok()?;
        self.get(&key)
    }

    pub fn get(&self, key: &PairKey) -> Option<PoolHandle> {
        self.entries.get(key).copied()
    }

    /// Idempotent creation
    ///
    /// Returns the cached handle when present, adopts a pool the factory
    /// already knows about, and only otherwise asks the factory to create
    /// one. Factory rejections surface as [`AdapterError::EngineFailure`].
    pub fn create<F: PoolFactory + ?Sized>(
        &mut self,
        factory: &mut F,
        a: AssetId,
        b: AssetId,
    ) -> Result<PoolHandle> {
        let key = PairKey::new(a, b)?;
        if let Some(handle) = self.get(&key) {
            debug!("Pair {} already registered as {}", key, handle);
            return Ok(handle);
        }
        if let Some(handle) = factory.get_pool(key) {
            self.insert(key, handle);
            info!("{} Adopted existing pool {} for {}", LogEmoji::POOL, handle, key);
            return Ok(handle);
        }

        let handle = factory
            .create_pool(key)
            .map_err(AdapterError::EngineFailure)?;
        self.insert(key, handle);
        info!("{} Created pool {} for {}", LogEmoji::POOL, handle, key);
        Ok(handle)
    }

    /// Resolve an existing pool, adopting it from the factory if only the
    /// factory knows it. Never creates.
    pub fn lookup<F: PoolFactory + ?Sized>(&mut self, factory: &F, key: PairKey) -> Result<PoolHandle> {
        if let Some(handle) = self.get(&key) {
            return Ok(handle);
        }
        let handle = factory
            .get_pool(key)
            .ok_or(AdapterError::PoolNotFound { pair: key })?;
        self.insert(key, handle);
        debug!("Adopted pool {} for {} during lookup", handle, key);
        Ok(handle)
    }

    /// Read-only counterpart of [`lookup`](Self::lookup): consults the
    /// factory but never writes
    pub fn peek<F: PoolFactory + ?Sized>(&self, factory: &F, key: PairKey) -> Result<PoolHandle> {
        self.get(&key)
            .or_else(|| factory.get_pool(key))
            .ok_or(AdapterError::PoolNotFound { pair: key })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, key: PairKey, handle: PoolHandle) {
        self.entries.insert(key, handle);
        self.journal.push(key);
    }

    /// Make every insert since the last commit permanent
    pub(crate) fn commit(&mut self) {
        self.journal.clear();
    }
}

impl Transactional for PairRegistry {
    type Checkpoint = usize;

    fn checkpoint(&self) -> usize {
        self.journal.len()
    }

    fn rollback(&mut self, checkpoint: usize) {
        while self.journal.len() > checkpoint {
            if let Some(key) = self.journal.pop() {
                self.entries.remove(&key);
            }
        }
    }
}
