//! Records loaded directly from the configuration document.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::record::Record;

pub struct LocalTable<R> {
    entries: RwLock<HashMap<String, R>>,
}

impl<R: Record> LocalTable<R> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn from_entries(entries: impl IntoIterator<Item = R>) -> Self {
        let table = Self::new();
        table.load(entries);
        table
    }

    /// Replace the whole table. Later duplicates win.
    pub fn load(&self, entries: impl IntoIterator<Item = R>) {
        let map: HashMap<String, R> = entries
            .into_iter()
            .map(|record| (record.id().to_owned(), record))
            .collect();
        *self.entries.write() = map;
    }

    pub fn lookup(&self, id: &str) -> Option<R> {
        self.entries.read().get(id).cloned()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<R: Record> Default for LocalTable<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::BandwidthProfileInfo;

    fn profile(id: &str, cir: u64) -> BandwidthProfileInfo {
        let mut p = BandwidthProfileInfo::new(id);
        p.committed_information_rate = cir;
        p
    }

    #[test]
    fn load_replaces_rather_than_merges() {
        let table = LocalTable::from_entries([profile("a", 1), profile("b", 2)]);
        assert_eq!(table.len(), 2);

        table.load([profile("c", 3)]);
        assert!(table.lookup("a").is_none());
        assert_eq!(table.lookup("c").map(|p| p.committed_information_rate), Some(3));
    }

    #[test]
    fn duplicate_ids_keep_the_last_entry() {
        let table = LocalTable::from_entries([profile("a", 1), profile("a", 9)]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.lookup("a").map(|p| p.committed_information_rate), Some(9));
    }

    #[test]
    fn clear_empties_table() {
        let table = LocalTable::from_entries([profile("a", 1)]);
        table.clear();
        assert!(table.is_empty());
        assert!(table.lookup("a").is_none());
    }
}
