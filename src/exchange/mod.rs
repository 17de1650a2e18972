/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! The stock exchange capability.
//!
//! [`StockExchange`] is implemented both by a local exchange (for example
//! [`SimulatedExchange`]) and by the network proxy
//! [`ExchangeClient`](crate::client::ExchangeClient), so broker code does not
//! care where the exchange runs.

pub mod listener;
pub mod simulated;

pub use listener::{ExchangeListener, ListenerId, ListenerRegistry};
pub use simulated::SimulatedExchange;

use crate::order::{Order, Price, StockQuote};
use crate::protocol::ProtocolError;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Failures of an exchange operation.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// The command connection could not be used.
    #[error("connection error: {0}")]
    Connection(#[from] std::io::Error),

    /// No response arrived within the request timeout.
    #[error("no response within {0:?}")]
    Timeout(Duration),

    /// The peer sent something that could not be decoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The exchange refused to execute the trade.
    #[error("trade rejected: {0}")]
    TradeRejected(String),

    /// The ticker is not traded on this exchange.
    #[error("unknown ticker: {0}")]
    UnknownTicker(String),

    /// The client has been closed.
    #[error("exchange client is closed")]
    Closed,
}

impl ExchangeError {
    /// Returns `true` for transport failures that may succeed on a new
    /// connection.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Timeout(_))
    }
}

/// Operations and notifications offered by a stock exchange.
///
/// Query methods are asynchronous because the exchange may be remote. The
/// returned futures are `Send` so they can be awaited from spawned tasks.
pub trait StockExchange: Send + Sync + 'static {
    /// Returns `true` if the exchange is open for trading.
    fn is_open(&self) -> impl Future<Output = Result<bool, ExchangeError>> + Send;

    /// Returns every traded ticker.
    fn get_tickers(&self) -> impl Future<Output = Result<Vec<String>, ExchangeError>> + Send;

    /// Returns the current quote for `ticker`, or `None` if none is
    /// available.
    fn get_quote(
        &self,
        ticker: &str,
    ) -> impl Future<Output = Result<Option<StockQuote>, ExchangeError>> + Send;

    /// Executes `order` at the current price and returns the execution
    /// price.
    fn execute_trade(
        &self,
        order: &Order,
    ) -> impl Future<Output = Result<Price, ExchangeError>> + Send;

    /// Registers a listener for exchange events.
    fn add_listener(&self, listener: ExchangeListener) -> ListenerId;

    /// Removes a listener. Returns `false` if it was not registered.
    fn remove_listener(&self, id: ListenerId) -> bool;
}
