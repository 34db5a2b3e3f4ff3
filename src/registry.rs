//! Canonical dense integer identifiers for entity names.
//!
//! Every distinct entity name across all levels is assigned an index in
//! `[0, N)` exactly once; the mapping is a bijection and stable for the whole
//! run. The registry is frozen once ingestion finishes so that no component
//! can grow the index space mid-computation.

use std::collections::HashMap;

use log::{debug, trace};

use crate::error::{Error, Result};

#[derive(Debug, Default, Clone)]
pub struct IdRegistry {
    names: Vec<String>,
    index: HashMap<String, usize>,
    frozen: bool,
}

impl IdRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the existing index for `name` or allocate the next one.
    ///
    /// Fails once the registry has been frozen.
    pub fn intern(&mut self, name: &str) -> Result<usize> {
        if let Some(&idx) = self.index.get(name) {
            return Ok(idx);
        }
        if self.frozen {
            return Err(Error::RegistryFrozen(name.to_string()));
        }
        let idx = self.names.len();
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), idx);
        trace!("Interned entity '{}' as index {}", name, idx);
        Ok(idx)
    }

    /// Name for an allocated index. Total over `[0, len())`.
    pub fn lookup(&self, idx: usize) -> Option<&str> {
        self.names.get(idx).map(|s| s.as_str())
    }

    /// Index for a known name, without allocating.
    pub fn resolve(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Seal the registry; subsequent `intern` calls for new names are errors.
    pub fn freeze(&mut self) {
        debug!("Freezing id registry with {} entities", self.names.len());
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Number of allocated indices (N).
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterate `(index, name)` in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.names.iter().enumerate().map(|(i, n)| (i, n.as_str()))
    }
}
