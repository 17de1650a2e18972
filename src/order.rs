/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Order and quote value types shared by the dispatch queue and the wire layer.
//!
//! The business meaning of an order belongs to the broker; this module only
//! carries the fields the protocol and the dispatch filters need.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Integer price in the exchange's smallest currency unit.
pub type Price = i64;

/// Unique identifier of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OrderId(Uuid);

impl OrderId {
    /// Generates a fresh random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Direction of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Buy shares.
    Buy,
    /// Sell shares.
    Sell,
}

/// An immutable order as seen by the exchange access layer.
///
/// Orders are created once and moved between owners; exactly one
/// [`OrderDispatchQueue`](crate::dispatch::OrderDispatchQueue) holds a given
/// order at a time.
///
/// # Examples
///
/// ```
/// use exchange_net::order::{Order, Side};
///
/// let order = Order::market(Side::Buy, "acct1", "GOOG", 10);
/// assert_eq!(order.ticker(), "GOOG");
/// assert!(order.stop_price().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    account_id: String,
    ticker: String,
    side: Side,
    shares: u32,
    stop_price: Option<Price>,
}

impl Order {
    /// Creates a market order with a fresh identifier.
    #[must_use]
    pub fn market(
        side: Side,
        account_id: impl Into<String>,
        ticker: impl Into<String>,
        shares: u32,
    ) -> Self {
        Self {
            id: OrderId::new(),
            account_id: account_id.into(),
            ticker: ticker.into(),
            side,
            shares,
            stop_price: None,
        }
    }

    /// Creates a stop order that becomes executable once the market reaches
    /// `stop_price`.
    #[must_use]
    pub fn stop(
        side: Side,
        account_id: impl Into<String>,
        ticker: impl Into<String>,
        shares: u32,
        stop_price: Price,
    ) -> Self {
        Self {
            stop_price: Some(stop_price),
            ..Self::market(side, account_id, ticker, shares)
        }
    }

    /// Returns a copy of this order carrying the given identifier.
    #[must_use]
    pub fn with_id(mut self, id: OrderId) -> Self {
        self.id = id;
        self
    }

    #[must_use]
    pub fn id(&self) -> OrderId {
        self.id
    }

    #[must_use]
    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    #[must_use]
    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    #[must_use]
    pub fn side(&self) -> Side {
        self.side
    }

    #[must_use]
    pub fn shares(&self) -> u32 {
        self.shares
    }

    /// Trigger price for stop orders, `None` for market orders.
    #[must_use]
    pub fn stop_price(&self) -> Option<Price> {
        self.stop_price
    }
}

/// A price snapshot for one ticker, always built fresh from a response.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StockQuote {
    /// Ticker symbol.
    pub ticker: String,
    /// Last known price.
    pub price: Price,
}

impl StockQuote {
    #[must_use]
    pub fn new(ticker: impl Into<String>, price: Price) -> Self {
        Self {
            ticker: ticker.into(),
            price,
        }
    }
}
