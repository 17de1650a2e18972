/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! In-memory exchange.
//!
//! Holds a price per ticker and an open/closed flag, executes trades at the
//! current price, and notifies listeners when its state or prices change.
//! It stands in for a real exchange when embedding the server or testing.

use super::listener::{ExchangeListener, ListenerId, ListenerRegistry};
use super::{ExchangeError, StockExchange};
use crate::order::{Order, Price, StockQuote};
use crate::protocol::ExchangeEvent;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// A local [`StockExchange`] driven by explicit calls.
///
/// # Examples
///
/// ```
/// use exchange_net::exchange::SimulatedExchange;
///
/// let exchange = SimulatedExchange::with_prices([("IBM", 100), ("MSFT", 250)]);
/// exchange.open();
/// assert!(exchange.is_open_now());
/// assert_eq!(exchange.price("IBM"), Some(100));
/// ```
#[derive(Debug, Default)]
pub struct SimulatedExchange {
    open: AtomicBool,
    prices: DashMap<String, Price>,
    listeners: ListenerRegistry,
}

impl SimulatedExchange {
    /// Creates a closed exchange with no tickers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a closed exchange trading the given tickers.
    #[must_use]
    pub fn with_prices<I, S>(prices: I) -> Self
    where
        I: IntoIterator<Item = (S, Price)>,
        S: Into<String>,
    {
        let exchange = Self::new();
        for (ticker, price) in prices {
            exchange.prices.insert(ticker.into(), price);
        }
        exchange
    }

    /// Opens the exchange and emits [`ExchangeEvent::Opened`].
    pub fn open(&self) {
        if !self.open.swap(true, Ordering::AcqRel) {
            debug!("simulated exchange opened");
            self.listeners.notify(&ExchangeEvent::Opened);
        }
    }

    /// Closes the exchange and emits [`ExchangeEvent::Closed`].
    pub fn close(&self) {
        if self.open.swap(false, Ordering::AcqRel) {
            debug!("simulated exchange closed");
            self.listeners.notify(&ExchangeEvent::Closed);
        }
    }

    /// Sets a ticker's price, adding the ticker if needed, and emits
    /// [`ExchangeEvent::PriceChanged`].
    pub fn set_price(&self, ticker: &str, price: Price) {
        self.prices.insert(ticker.to_string(), price);
        self.listeners.notify(&ExchangeEvent::price_changed(ticker, price));
    }

    /// Current price of `ticker`.
    #[must_use]
    pub fn price(&self, ticker: &str) -> Option<Price> {
        self.prices.get(ticker).map(|entry| *entry.value())
    }

    /// Synchronous view of the open flag.
    #[must_use]
    pub fn is_open_now(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl StockExchange for SimulatedExchange {
    async fn is_open(&self) -> Result<bool, ExchangeError> {
        Ok(self.is_open_now())
    }

    async fn get_tickers(&self) -> Result<Vec<String>, ExchangeError> {
        let mut tickers: Vec<String> = self.prices.iter().map(|e| e.key().clone()).collect();
        tickers.sort();
        Ok(tickers)
    }

    async fn get_quote(&self, ticker: &str) -> Result<Option<StockQuote>, ExchangeError> {
        Ok(self.price(ticker).map(|price| StockQuote::new(ticker, price)))
    }

    async fn execute_trade(&self, order: &Order) -> Result<Price, ExchangeError> {
        if !self.is_open_now() {
            return Err(ExchangeError::TradeRejected("exchange is closed".to_string()));
        }
        let price = self
            .price(order.ticker())
            .ok_or_else(|| ExchangeError::UnknownTicker(order.ticker().to_string()))?;
        debug!(
            order_id = %order.id(),
            ticker = order.ticker(),
            shares = order.shares(),
            price,
            "trade executed"
        );
        Ok(price)
    }

    fn add_listener(&self, listener: ExchangeListener) -> ListenerId {
        self.listeners.add(listener)
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }
}
