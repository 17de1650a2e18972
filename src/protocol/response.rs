/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Response line codecs.
//!
//! A response is a bare payload with no tag; the caller knows which command
//! it answers. An empty payload stands for "absent" (quote unavailable,
//! trade rejected), since zero and negative prices are valid values.

use super::constants::{CLOSED_STATE, DELIMITER, OPEN_STATE, strip_line_ending};
use super::error::ProtocolError;
use super::fields::integer;
use crate::order::Price;
use std::fmt;

/// Open/closed state of the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExchangeState {
    Open,
    Closed,
}

impl ExchangeState {
    /// Returns `true` if the state is [`Open`](Self::Open).
    #[inline]
    #[must_use]
    pub fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }

    #[must_use]
    pub fn token(self) -> &'static str {
        match self {
            Self::Open => OPEN_STATE,
            Self::Closed => CLOSED_STATE,
        }
    }

    /// Decodes a `GET_STATE` response.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidState`] for any other token.
    pub fn decode(line: &str) -> Result<Self, ProtocolError> {
        match strip_line_ending(line) {
            OPEN_STATE => Ok(Self::Open),
            CLOSED_STATE => Ok(Self::Closed),
            other => Err(ProtocolError::InvalidState(other.to_string())),
        }
    }
}

impl From<bool> for ExchangeState {
    fn from(open: bool) -> Self {
        if open { Self::Open } else { Self::Closed }
    }
}

impl fmt::Display for ExchangeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Encodes a `GET_TICKERS` response.
#[must_use]
pub fn encode_tickers<S: AsRef<str>>(tickers: &[S]) -> String {
    let mut line = String::new();
    for (i, ticker) in tickers.iter().enumerate() {
        if i > 0 {
            line.push(DELIMITER);
        }
        line.push_str(ticker.as_ref());
    }
    line
}

/// Decodes a `GET_TICKERS` response. Empty segments, including one left by
/// a trailing delimiter, are skipped.
#[must_use]
pub fn decode_tickers(line: &str) -> Vec<String> {
    strip_line_ending(line)
        .split(DELIMITER)
        .filter(|ticker| !ticker.is_empty())
        .map(str::to_string)
        .collect()
}

/// Encodes a price response; `None` becomes the empty line.
#[must_use]
pub fn encode_price(price: Option<Price>) -> String {
    price.map(|p| p.to_string()).unwrap_or_default()
}

/// Decodes a price response.
///
/// # Errors
///
/// Returns [`ProtocolError::InvalidInteger`] if the payload is neither empty
/// nor an integer.
pub fn decode_price(line: &str) -> Result<Option<Price>, ProtocolError> {
    match strip_line_ending(line) {
        "" => Ok(None),
        value => integer("price", value).map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_tokens() {
        assert_eq!(ExchangeState::decode("OPEN\n"), Ok(ExchangeState::Open));
        assert_eq!(ExchangeState::decode("CLOSED"), Ok(ExchangeState::Closed));
        assert!(ExchangeState::decode("open").is_err());
        assert_eq!(ExchangeState::from(true).to_string(), "OPEN");
    }

    #[test]
    fn test_tickers_trailing_delimiter() {
        assert_eq!(decode_tickers("IBM:MSFT:"), vec!["IBM", "MSFT"]);
        assert_eq!(encode_tickers(&["IBM", "MSFT"]), "IBM:MSFT");
        assert!(decode_tickers("").is_empty());
    }

    #[test]
    fn test_price_sentinel() {
        assert_eq!(encode_price(None), "");
        assert_eq!(decode_price(""), Ok(None));
        assert_eq!(decode_price("0"), Ok(Some(0)));
        assert_eq!(decode_price("-5\r\n"), Ok(Some(-5)));
        assert!(decode_price(" 100").is_err());
    }
}
