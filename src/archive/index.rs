use crate::archive::entry::Entry;
use std::collections::BTreeMap;

/// Name to entry mapping; the single authority on what an archive contains
#[derive(Debug, Default)]
pub struct DirectoryIndex {
    entries: BTreeMap<String, Entry>,
}

impl DirectoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, or replace a same-named one when `replace` is set
    ///
    /// Returns false, leaving the index untouched, if the name is taken and
    /// `replace` is not set.
    pub fn insert_or_replace(&mut self, entry: Entry, replace: bool) -> bool {
        if !replace && self.entries.contains_key(&entry.name) {
            return false;
        }
        self.entries.insert(entry.name.clone(), entry);
        true
    }

    pub fn remove(&mut self, name: &str) -> Option<Entry> {
        self.entries.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Split into persisted and pending entries
    ///
    /// Persisted entries come back in ascending `local_header_offset` order,
    /// the order they appear in the archive file. Pending entries keep index
    /// order.
    pub fn partition_mut(&mut self) -> (Vec<&mut Entry>, Vec<&mut Entry>) {
        let (mut existing, pending): (Vec<&mut Entry>, Vec<&mut Entry>) =
            self.entries.values_mut().partition(|entry| !entry.is_new);
        existing.sort_by_key(|entry| entry.local_header_offset);
        (existing, pending)
    }

    /// Swap in the entries produced by a successful save
    pub fn replace_all(&mut self, entries: Vec<Entry>) {
        self.entries = entries
            .into_iter()
            .map(|entry| (entry.name.clone(), entry))
            .collect();
    }
}
