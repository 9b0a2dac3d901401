//! Extracted operand values.

use std::collections::BTreeMap;
use std::fmt;

/// Name → value mapping produced by field extraction and rewritten by macros.
///
/// Ordered so that debug output and comparisons are deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Operands {
    values: BTreeMap<String, i64>,
}

impl Operands {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<i64> {
        self.values.get(name).copied()
    }

    pub fn set(&mut self, name: &str, value: i64) {
        if let Some(slot) = self.values.get_mut(name) {
            *slot = value;
        } else {
            self.values.insert(name.to_string(), value);
        }
    }

    /// OR `bits` into `name`, creating it as zero first.
    pub fn merge_bits(&mut self, name: &str, bits: i64) {
        let current = self.get(name).unwrap_or(0);
        self.set(name, current | bits);
    }

    pub fn remove(&mut self, name: &str) -> Option<i64> {
        self.values.remove(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.values.iter().map(|(name, &value)| (name.as_str(), value))
    }
}

impl<'a> FromIterator<(&'a str, i64)> for Operands {
    fn from_iter<I: IntoIterator<Item = (&'a str, i64)>>(iter: I) -> Self {
        let mut operands = Self::new();
        for (name, value) in iter {
            operands.set(name, value);
        }
        operands
    }
}

impl fmt::Display for Operands {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        Ok(())
    }
}
