use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::services::vector::DocumentIndex;

/// Memoises built indexes by (text fingerprint, chunk size) so re-uploading
/// the same document skips embedding. Oldest entries are evicted first.
pub struct IndexCache {
    capacity: usize,
    entries: Mutex<VecDeque<Arc<DocumentIndex>>>,
}

impl IndexCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn get(&self, fingerprint: &str, chunk_size: usize) -> Option<Arc<DocumentIndex>> {
        let entries = self.entries.lock().ok()?;
        entries
            .iter()
            .find(|doc| doc.fingerprint == fingerprint && doc.chunk_size == chunk_size)
            .cloned()
    }

    pub fn insert(&self, doc: Arc<DocumentIndex>) {
        if self.capacity == 0 {
            return;
        }
        let Ok(mut entries) = self.entries.lock() else {
            return;
        };

        entries.retain(|d| !(d.fingerprint == doc.fingerprint && d.chunk_size == doc.chunk_size));
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(doc);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
