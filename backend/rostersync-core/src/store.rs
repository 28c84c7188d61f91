// src/store.rs
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use rand::{distributions::Alphanumeric, thread_rng, Rng};
use tracing::{debug, error};

use crate::reconcile::ProcessingResult;

const TRANSACTION_ID_LEN: usize = 32;

/// Holds finished results until the caller downloads them.
pub trait ResultStore: Send + Sync {
    fn put(&self, id: String, result: ProcessingResult);
    fn get(&self, id: &str) -> Option<ProcessingResult>;
    fn remove(&self, id: &str) -> Option<ProcessingResult>;

    /// Single retrieval: returns the result and evicts it.
    fn take(&self, id: &str) -> Option<ProcessingResult> {
        self.remove(id)
    }
}

pub fn new_transaction_id() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TRANSACTION_ID_LEN)
        .map(char::from)
        .collect()
}

#[derive(Clone, Default)]
pub struct InMemoryResultStore {
    results: Arc<Mutex<HashMap<String, ProcessingResult>>>,
}

impl InMemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        match self.results.lock() {
            Ok(results) => results.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn with_results<T>(&self, f: impl FnOnce(&mut HashMap<String, ProcessingResult>) -> T) -> T {
        let mut guard = match self.results.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                error!("Result store lock poisoned; continuing with inner state");
                poisoned.into_inner()
            }
        };
        f(&mut guard)
    }
}

impl ResultStore for InMemoryResultStore {
    fn put(&self, id: String, result: ProcessingResult) {
        debug!("Storing result {}", id);
        self.with_results(|r| r.insert(id, result));
    }

    fn get(&self, id: &str) -> Option<ProcessingResult> {
        self.with_results(|r| r.get(id).cloned())
    }

    fn remove(&self, id: &str) -> Option<ProcessingResult> {
        debug!("Evicting result {}", id);
        self.with_results(|r| r.remove(id))
    }
}
