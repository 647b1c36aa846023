//! Identifier interning.
//!
//! Every identifier the binder hands over arrives as a [`Name`]. Interning
//! goes through `&self`, so one interner is shared by reference between
//! the binder, the type core and whoever formats diagnostics.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::Name;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InternError {
    #[error("interner is full: {count} strings already stored, limit is {}", u32::MAX)]
    Full { count: usize },
}

/// Index 0 is always the empty string.
#[derive(Default)]
struct Table {
    ids: FxHashMap<&'static str, Name>,
    texts: Vec<&'static str>,
}

impl Table {
    fn seeded() -> Self {
        let mut table = Table::default();
        table.texts.push("");
        table.ids.insert("", Name::EMPTY);
        table
    }

    fn insert(&mut self, text: &str) -> Result<Name, InternError> {
        if let Some(&name) = self.ids.get(text) {
            return Ok(name);
        }
        let count = self.texts.len();
        let raw = u32::try_from(count).map_err(|_| InternError::Full { count })?;
        // Texts live for the whole session; leaking keeps lookups borrow-free.
        let stored: &'static str = Box::leak(Box::from(text));
        let name = Name::from_raw(raw);
        self.texts.push(stored);
        self.ids.insert(stored, name);
        Ok(name)
    }
}

/// Shared string interner.
pub struct StringInterner {
    table: RwLock<Table>,
}

impl StringInterner {
    pub fn new() -> Self {
        StringInterner {
            table: RwLock::new(Table::seeded()),
        }
    }

    /// Intern `text`, failing only once `u32::MAX` strings are stored.
    pub fn try_intern(&self, text: &str) -> Result<Name, InternError> {
        let known = self.table.read().ids.get(text).copied();
        match known {
            Some(name) => Ok(name),
            None => self.table.write().insert(text),
        }
    }

    /// Panics if the interner is full.
    pub fn intern(&self, text: &str) -> Name {
        match self.try_intern(text) {
            Ok(name) => name,
            Err(err) => panic!("{err}"),
        }
    }

    /// Panics if `name` did not come from this interner.
    pub fn lookup(&self, name: Name) -> &'static str {
        self.table.read().texts[name.index()]
    }

    /// Stored strings, counting the empty one.
    pub fn len(&self) -> usize {
        self.table.read().texts.len()
    }

    /// True while nothing beyond the empty string is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 1
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StringInterner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StringInterner({} strings)", self.len())
    }
}
