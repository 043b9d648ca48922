//! Pinned objects
//!
//! Pinning keeps a live value addressable by a short decimal identifier across
//! requests. The table is owned by its session; entries live until removed.

use rustc_hash::FxHashMap;
use tracing::info;

use crate::error::{ReflectError, ReflectResult};
use crate::wrapper::{Reflective, Wrapped};

/// Identifier to object table
#[derive(Debug, Default, Clone)]
pub struct PinTable {
    entries: FxHashMap<String, Wrapped>,
}

impl PinTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pinned objects
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing is pinned
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Next free identifier, starting at `len + 1`
    fn next_id(&self) -> String {
        let mut candidate = self.entries.len() + 1;
        while self.entries.contains_key(&candidate.to_string()) {
            candidate += 1;
        }
        candidate.to_string()
    }

    /// Pin `object` under a fresh identifier
    pub fn pin(&mut self, object: Wrapped) -> String {
        let id = self.next_id();
        info!(id = %id, object = %object.object().print_string(), "pinned object");
        self.entries.insert(id.clone(), object);
        id
    }

    /// Pin `object` under a caller-chosen `id`; an id still in use is refused
    pub fn pin_as(&mut self, id: impl Into<String>, object: Wrapped) -> ReflectResult<()> {
        let id = id.into();
        if self.entries.contains_key(&id) {
            return Err(ReflectError::bad_request(format!("object id {} in use", id)));
        }
        self.entries.insert(id, object);
        Ok(())
    }

    /// Remove the entry for `id`
    pub fn unpin(&mut self, id: &str) -> ReflectResult<String> {
        self.entries
            .remove(id)
            .map(|_| id.to_string())
            .ok_or_else(|| ReflectError::not_found(format!("object {}", id)))
    }

    /// Object pinned under `id`
    pub fn get(&self, id: &str) -> ReflectResult<Wrapped> {
        self.entries
            .get(id)
            .cloned()
            .ok_or_else(|| ReflectError::not_found(format!("object {}", id)))
    }

    /// Every entry, numeric identifiers first in numeric order
    pub fn all(&self) -> Vec<(String, Wrapped)> {
        let mut entries: Vec<(String, Wrapped)> = self
            .entries
            .iter()
            .map(|(id, object)| (id.clone(), object.clone()))
            .collect();
        entries.sort_by(|(a, _), (b, _)| {
            match (a.parse::<u64>(), b.parse::<u64>()) {
                (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
                (Ok(_), Err(_)) => std::cmp::Ordering::Less,
                (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
                (Err(_), Err(_)) => a.cmp(b),
            }
        });
        entries
    }
}
