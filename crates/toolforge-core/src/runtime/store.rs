// toolforge-core/src/runtime/store.rs
// ============================================================================
// Module: Toolforge In-Memory Store
// Description: Simple in-memory execution store for tests and examples.
// Purpose: Provide a deterministic store implementation without external deps.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! This module provides a simple in-memory implementation of
//! [`ExecutionStore`] for tests and local demos. It is not intended for
//! production use; durable stores live behind the same trait in host
//! integrations.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;

use crate::core::StoredExecutionBatch;
use crate::interfaces::ExecutionStore;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// In-memory execution store for tests and examples.
#[derive(Debug, Default, Clone)]
pub struct InMemoryExecutionStore {
    /// Batches in append order, protected by a mutex.
    batches: Arc<Mutex<Vec<StoredExecutionBatch>>>,
}

impl InMemoryExecutionStore {
    /// Creates a new in-memory execution store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            batches: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl ExecutionStore for InMemoryExecutionStore {
    fn append(&self, batch: &StoredExecutionBatch) -> Result<(), StoreError> {
        self.batches
            .lock()
            .map_err(|_| StoreError::Store("execution store mutex poisoned".to_string()))?
            .push(batch.clone());
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<StoredExecutionBatch>, StoreError> {
        let guard = self
            .batches
            .lock()
            .map_err(|_| StoreError::Store("execution store mutex poisoned".to_string()))?;
        Ok(guard.clone())
    }
}

// ============================================================================
// SECTION: Shared Store Wrapper
// ============================================================================

/// Shared execution store backed by an `Arc` trait object.
#[derive(Clone)]
pub struct SharedExecutionStore {
    /// Inner store implementation.
    inner: Arc<dyn ExecutionStore + Send + Sync>,
}

impl SharedExecutionStore {
    /// Wraps an execution store in a shared, clonable wrapper.
    #[must_use]
    pub fn from_store(store: impl ExecutionStore + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }

    /// Wraps an existing shared store.
    #[must_use]
    pub const fn new(store: Arc<dyn ExecutionStore + Send + Sync>) -> Self {
        Self {
            inner: store,
        }
    }
}

impl ExecutionStore for SharedExecutionStore {
    fn append(&self, batch: &StoredExecutionBatch) -> Result<(), StoreError> {
        self.inner.append(batch)
    }

    fn read_all(&self) -> Result<Vec<StoredExecutionBatch>, StoreError> {
        self.inner.read_all()
    }
}
