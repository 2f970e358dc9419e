/* src/operations.rs */

use crate::{error::ResolveError, payload::Payload};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use std::collections::BTreeMap;

/// Unreserved characters (RFC 3986) stay literal inside a path segment.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Named argument accepted by [`Operation::AddressTxs`] to page through
/// confirmed history.
pub const AFTER_TXID: &str = "after_txid";

/// The read-only lookups the proxy resolves. Each is a name, a path template
/// and optional post-processing; the engine does the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    TipHeight,
    BlockHash,
    Block,
    Transaction,
    AddressUtxo,
    AddressTxs,
}

impl Operation {
    pub const ALL: [Self; 6] = [
        Self::TipHeight,
        Self::BlockHash,
        Self::Block,
        Self::Transaction,
        Self::AddressUtxo,
        Self::AddressTxs,
    ];

    /// Stable name used in cache signatures and logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::TipHeight => "tip_height",
            Self::BlockHash => "block_height",
            Self::Block => "block",
            Self::Transaction => "tx",
            Self::AddressUtxo => "utxo",
            Self::AddressTxs => "address_txs",
        }
    }

    #[must_use]
    pub const fn arity(self) -> usize {
        match self {
            Self::TipHeight => 0,
            _ => 1,
        }
    }

    fn accepts_named(self, key: &str) -> bool {
        matches!(self, Self::AddressTxs) && key == AFTER_TXID
    }

    /// Builds the upstream path, escaping every user supplied segment.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::InvalidArguments`] on wrong arity, an empty
    /// segment, or a named argument the operation does not understand.
    pub fn path(
        self,
        positional: &[String],
        named: &BTreeMap<String, String>,
    ) -> Result<String, ResolveError> {
        if positional.len() != self.arity() {
            return Err(ResolveError::invalid_arguments(
                self.name(),
                format!(
                    "expected {} positional argument(s), got {}",
                    self.arity(),
                    positional.len()
                ),
            ));
        }
        if let Some(key) = named.keys().find(|key| !self.accepts_named(key)) {
            return Err(ResolveError::invalid_arguments(
                self.name(),
                format!("unexpected argument '{key}'"),
            ));
        }

        let segment = match positional.first() {
            Some(raw) => Some(self.encode(raw)?),
            None => None,
        };
        let arg = segment.as_deref().unwrap_or_default();

        let path = match self {
            Self::TipHeight => "/blocks/tip/height".to_owned(),
            Self::BlockHash => format!("/block-height/{arg}"),
            Self::Block => format!("/block/{arg}"),
            Self::Transaction => format!("/tx/{arg}"),
            Self::AddressUtxo => format!("/address/{arg}/utxo"),
            Self::AddressTxs => match named.get(AFTER_TXID) {
                Some(after) => format!("/address/{arg}/txs/chain/{}", self.encode(after)?),
                None => format!("/address/{arg}/txs"),
            },
        };

        Ok(path)
    }

    fn encode(self, raw: &str) -> Result<String, ResolveError> {
        if raw.trim().is_empty() {
            return Err(ResolveError::invalid_arguments(
                self.name(),
                "argument must not be empty",
            ));
        }
        Ok(utf8_percent_encode(raw, PATH_SEGMENT).to_string())
    }

    /// Applies the operation's optional shaping of the upstream payload.
    #[must_use]
    pub fn post_process(self, payload: Payload) -> Payload {
        match self {
            Self::TipHeight => payload.coerce_integer(),
            _ => payload,
        }
    }
}
