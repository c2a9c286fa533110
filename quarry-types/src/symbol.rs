//! Exchange-qualified ticker symbols.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::QuarryError;

/// Exchange suffixes accepted for equities.
const EXCHANGE_SUFFIXES: &[&str] = &["NS", "BO"];

/// Prefix marking a market index (e.g. `^NSEI`).
const INDEX_PREFIX: char = '^';

/// Display names used by the web application that map to provider symbols.
const ALIASES: &[(&str, &str)] = &[
    ("NIFTY 50", "^NSEI"),
    ("NIFTY", "^NSEI"),
    ("SENSEX", "^BSESN"),
    ("NIFTY BANK", "^NSEBANK"),
    ("ETERNAL", "ZOMATO.NS"),
];

/// Exchange-qualified ticker: `RELIANCE.NS`, `500325.BO`, or an index such as `^NSEI`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Parse a symbol that must already be in canonical form.
    ///
    /// # Errors
    /// Returns `InvalidSymbol` unless the input matches `^[A-Z0-9]+\.(NS|BO)$` or is an
    /// index symbol (`^` followed by `[A-Z0-9]+`).
    pub fn parse(input: &str) -> Result<Self, QuarryError> {
        let invalid = || QuarryError::InvalidSymbol(input.to_string());
        if let Some(body) = input.strip_prefix(INDEX_PREFIX) {
            if is_ticker_body(body) {
                return Ok(Self(input.to_string()));
            }
            return Err(invalid());
        }
        let (body, suffix) = input.rsplit_once('.').ok_or_else(invalid)?;
        if is_ticker_body(body) && EXCHANGE_SUFFIXES.contains(&suffix) {
            Ok(Self(input.to_string()))
        } else {
            Err(invalid())
        }
    }

    /// Normalize user input into a canonical symbol.
    ///
    /// Trims and upper-cases the input, resolves display aliases (`NIFTY 50`,
    /// `SENSEX`, ...) and defaults bare tickers to NSE by appending `.NS`.
    ///
    /// # Errors
    /// Returns `InvalidSymbol` when the normalized form still fails [`Symbol::parse`].
    pub fn normalize(input: &str) -> Result<Self, QuarryError> {
        let upper = input
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_uppercase();
        if let Some((_, target)) = ALIASES.iter().find(|(alias, _)| *alias == upper) {
            return Self::parse(target);
        }
        let candidate =
            if !upper.is_empty() && !upper.contains('.') && !upper.starts_with(INDEX_PREFIX) {
                format!("{upper}.NS")
            } else {
                upper
            };
        Self::parse(&candidate).map_err(|_| QuarryError::InvalidSymbol(input.to_string()))
    }

    /// Returns the symbol as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for market indices, which carry no financial statements.
    #[must_use]
    pub fn is_index(&self) -> bool {
        self.0.starts_with(INDEX_PREFIX)
    }
}

fn is_ticker_body(body: &str) -> bool {
    !body.is_empty()
        && body
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Symbol {
    type Error = QuarryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Symbol> for String {
    fn from(s: Symbol) -> Self {
        s.0
    }
}
