use std::collections::HashMap;

use serde::Serialize;

/// What to do when an index sees a key it already holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DuplicatePolicy {
    FirstWins,
    LastWins,
}

/// Location of one payload inside an archive set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PackageEntry {
    pub archive: u32,
    pub offset: u64,
    pub compressed_size: u64,
    /// 0 when the index does not record it
    pub uncompressed_size: u64,
    /// Flavor specific: compression method for zip entries
    pub method: u16,
}

impl PackageEntry {
    pub fn new(archive: u32, offset: u64, compressed_size: u64, uncompressed_size: u64) -> Self {
        Self {
            archive,
            offset,
            compressed_size,
            uncompressed_size,
            method: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PackageIndex {
    policy: DuplicatePolicy,
    entries: HashMap<u64, PackageEntry>,
}

impl PackageIndex {
    pub fn new(policy: DuplicatePolicy) -> Self {
        Self {
            policy,
            entries: HashMap::new(),
        }
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Insert under the index's duplicate policy. Returns false when an
    /// existing entry was kept.
    pub fn insert(&mut self, key: u64, entry: PackageEntry) -> bool {
        match self.policy {
            DuplicatePolicy::FirstWins => {
                if self.entries.contains_key(&key) {
                    return false;
                }
                self.entries.insert(key, entry);
                true
            }
            DuplicatePolicy::LastWins => {
                self.entries.insert(key, entry);
                true
            }
        }
    }

    pub fn get(&self, key: u64) -> Option<&PackageEntry> {
        self.entries.get(&key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sorted by key
    pub fn entries(&self) -> Vec<(u64, PackageEntry)> {
        let mut entries: Vec<_> = self.entries.iter().map(|(k, v)| (*k, *v)).collect();
        entries.sort_by_key(|(key, _)| *key);
        entries
    }
}
