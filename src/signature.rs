/* src/signature.rs */

use std::collections::BTreeMap;
use std::fmt;

/// Order-independent identity of a logical request, used as the cache key.
///
/// Named arguments are kept in a `BTreeMap`, so signatures built from the same
/// arguments in any insertion order compare and hash equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestSignature {
    operation: &'static str,
    positional: Vec<String>,
    named: BTreeMap<String, String>,
}

impl RequestSignature {
    #[must_use]
    pub fn new(
        operation: &'static str,
        positional: Vec<String>,
        named: BTreeMap<String, String>,
    ) -> Self {
        Self {
            operation,
            positional,
            named,
        }
    }

    /// Builds a signature from unordered `(key, value)` pairs. A repeated key
    /// keeps its last value.
    #[cfg(test)]
    pub(crate) fn from_pairs<I, K, V>(
        operation: &'static str,
        positional: Vec<String>,
        named: I,
    ) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let named = named
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        Self::new(operation, positional, named)
    }

    #[must_use]
    pub fn positional(&self) -> &[String] {
        &self.positional
    }

    #[must_use]
    pub fn named(&self) -> &BTreeMap<String, String> {
        &self.named
    }
}

impl fmt::Display for RequestSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.operation, self.positional.join(", "))?;
        for (key, value) in &self.named {
            write!(f, " {key}={value}")?;
        }
        Ok(())
    }
}
