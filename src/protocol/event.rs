/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Market events published by the exchange.
//!
//! Events are transient notifications: they carry no sequence number or
//! identity, and a subscriber that misses one has to recover state through
//! the command channel.

use super::constants::{CLOSED_EVENT, DELIMITER, OPEN_EVENT, PRICE_CHANGE_EVENT};
use super::error::ProtocolError;
use super::fields::{expect_fields, integer, non_empty, split};
use crate::order::Price;
use std::fmt;
use std::str::FromStr;

/// A notification emitted by the exchange.
///
/// # Examples
///
/// ```
/// use exchange_net::protocol::ExchangeEvent;
///
/// let event = ExchangeEvent::price_changed("MSFT", 250);
/// assert_eq!(event.encode(), "PRICE_CHANGED:MSFT:250");
/// assert_eq!(ExchangeEvent::decode("PRICE_CHANGED:MSFT:250"), Ok(event));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExchangeEvent {
    /// The exchange opened for trading.
    Opened,

    /// The exchange closed.
    Closed,

    /// A ticker's price changed.
    PriceChanged {
        /// Ticker symbol.
        ticker: String,
        /// New price.
        price: Price,
    },
}

impl ExchangeEvent {
    #[must_use]
    pub fn price_changed(ticker: impl Into<String>, price: Price) -> Self {
        Self::PriceChanged {
            ticker: ticker.into(),
            price,
        }
    }

    /// Wire name of the event.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Opened => OPEN_EVENT,
            Self::Closed => CLOSED_EVENT,
            Self::PriceChanged { .. } => PRICE_CHANGE_EVENT,
        }
    }

    /// Encodes the event as a single line without the line terminator.
    #[must_use]
    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// Decodes one event line.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::UnknownEvent`] for an unrecognised tag and a
    /// field-level variant for malformed arguments.
    pub fn decode(line: &str) -> Result<Self, ProtocolError> {
        let (tag, fields) = split(line)?;
        match tag {
            OPEN_EVENT => {
                expect_fields(OPEN_EVENT, &fields, 0)?;
                Ok(Self::Opened)
            }
            CLOSED_EVENT => {
                expect_fields(CLOSED_EVENT, &fields, 0)?;
                Ok(Self::Closed)
            }
            PRICE_CHANGE_EVENT => {
                expect_fields(PRICE_CHANGE_EVENT, &fields, 2)?;
                Ok(Self::PriceChanged {
                    ticker: non_empty(PRICE_CHANGE_EVENT, "ticker", fields[0])?,
                    price: integer("price", fields[1])?,
                })
            }
            other => Err(ProtocolError::UnknownEvent(other.to_string())),
        }
    }

    /// Decodes a received datagram payload.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::NotUtf8`] if the payload is not text, or any
    /// error [`decode`](Self::decode) reports.
    pub fn decode_datagram(payload: &[u8]) -> Result<Self, ProtocolError> {
        let line = std::str::from_utf8(payload).map_err(|_| ProtocolError::NotUtf8)?;
        Self::decode(line)
    }
}

impl fmt::Display for ExchangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Opened | Self::Closed => f.write_str(self.name()),
            Self::PriceChanged { ticker, price } => {
                write!(f, "{PRICE_CHANGE_EVENT}{DELIMITER}{ticker}{DELIMITER}{price}")
            }
        }
    }
}

impl FromStr for ExchangeEvent {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}
