//! Per-scope name tables.
//!
//! ABL names are case-insensitive. Entries keep the spelling they were defined with and
//! are hashed on their ASCII-lowercased bytes, so lookups need no allocation.

use std::hash::{Hash, Hasher};

use abl_compiler_syntax::{SymbolId, WidgetKind};
use hashbrown::HashTable;
use rustc_hash::FxHasher;
use smol_str::SmolStr;

/// Separate namespaces a scope keeps; the same name may be defined once in each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Variable,
    Routine,
    Buffer,
    /// Temp-tables and work-tables, mapped to their default buffer
    Table,
    Event,
    Widget(WidgetKind),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameEntry {
    pub namespace: Namespace,
    pub name: SmolStr,
    pub symbol: SymbolId,
}

#[derive(Debug, Default, Clone)]
pub struct NameTable {
    /// Entries in definition order
    entries: Vec<NameEntry>,
    entry_set: HashTable<usize>,
}

impl NameTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `symbol` under `name`, replacing (and returning) a previous definition of the
    /// same name in the same namespace. The replacing entry keeps the original position.
    pub fn insert(&mut self, namespace: Namespace, name: SmolStr, symbol: SymbolId) -> Option<SymbolId> {
        let hash = Self::hash_key(namespace, &name);
        if let Some(&existing) = self
            .entry_set
            .find(hash, |index| Self::matches(&self.entries[*index], namespace, &name))
        {
            let entry = &mut self.entries[existing];
            entry.name = name;
            return Some(std::mem::replace(&mut entry.symbol, symbol));
        }

        let index = self.entries.len();
        self.entries.push(NameEntry {
            namespace,
            name,
            symbol,
        });
        let entries = &self.entries;
        self.entry_set.insert_unique(hash, index, |index| {
            let entry = &entries[*index];
            Self::hash_key(entry.namespace, &entry.name)
        });
        None
    }

    pub fn lookup(&self, namespace: Namespace, name: &str) -> Option<SymbolId> {
        self.entry_set
            .find(Self::hash_key(namespace, name), |index| {
                Self::matches(&self.entries[*index], namespace, name)
            })
            .map(|index| self.entries[*index].symbol)
    }

    pub fn iter(&self) -> impl Iterator<Item = &NameEntry> {
        self.entries.iter()
    }

    pub fn in_namespace(&self, namespace: Namespace) -> impl Iterator<Item = &NameEntry> {
        self.entries
            .iter()
            .filter(move |entry| entry.namespace == namespace)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn matches(entry: &NameEntry, namespace: Namespace, name: &str) -> bool {
        entry.namespace == namespace && entry.name.eq_ignore_ascii_case(name)
    }

    fn hash_key(namespace: Namespace, name: &str) -> u64 {
        let mut hasher = FxHasher::default();
        namespace.hash(&mut hasher);
        for byte in name.bytes() {
            hasher.write_u8(byte.to_ascii_lowercase());
        }
        hasher.finish()
    }
}
