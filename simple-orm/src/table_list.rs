//! Accumulates the tables taking part in one statement.

use std::collections::HashMap;

use crate::{
    errors::{Error, Result},
    query::FromEntry,
};

/// Ordered list of `FROM` entries, deduplicated by alias.
///
/// Every dotted path of a query registers its joins here, so a path prefix
/// shared by several conditions is joined exactly once.
#[derive(Debug, Clone, Default)]
pub struct TableListBuilder {
    entries: Vec<FromEntry>,
    by_alias: HashMap<String, usize>,
}

impl TableListBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a list seeded with the given entries.
    pub fn with_tables<I>(tables: I) -> Result<Self>
    where
        I: IntoIterator<Item = FromEntry>,
    {
        let mut builder = Self::new();
        for table in tables {
            builder.add_table(table)?;
        }
        Ok(builder)
    }

    /// Looks an entry up by the alias of `entry`.
    pub fn get_table(&self, entry: &FromEntry) -> Option<&FromEntry> {
        self.by_alias.get(entry.key()).map(|&i| &self.entries[i])
    }

    /// Returns `true` if an entry with the same alias is already recorded.
    pub fn has_table(&self, entry: &FromEntry) -> bool {
        self.by_alias.contains_key(entry.key())
    }

    /// Adds an entry.
    ///
    /// Absent entries and entries already present under the same alias for the
    /// same table are ignored. An alias already used by a different table is
    /// a [`Error::Conflict`].
    pub fn add_table(&mut self, entry: impl Into<Option<FromEntry>>) -> Result<()> {
        let Some(entry) = entry.into() else {
            return Ok(());
        };

        if let Some(existing) = self.get_table(&entry) {
            if existing.table != entry.table {
                return Err(Error::conflict(format!(
                    "cannot add table '{}' with alias '{}', table '{}' already has that alias",
                    entry.table,
                    entry.key(),
                    existing.table
                )));
            }
            return Ok(());
        }

        self.by_alias.insert(entry.key().to_string(), self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    pub fn entries(&self) -> &[FromEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<FromEntry> {
        self.entries
    }
}
