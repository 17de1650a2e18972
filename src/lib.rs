/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! # exchange-net
//!
//! Network access to a stock exchange for brokers.
//!
//! An exchange runs an [`ExchangeServer`](server::ExchangeServer) that
//! answers text commands over TCP and multicasts its events as UDP
//! datagrams. A broker talks to it through an
//! [`ExchangeClient`](client::ExchangeClient), which implements the same
//! [`StockExchange`](exchange::StockExchange) trait as a local exchange, and
//! holds its pending orders in an
//! [`OrderDispatchQueue`](dispatch::OrderDispatchQueue) that releases them
//! once market conditions allow.
//!
//! ## Modules
//!
//! - [`protocol`]: the line-oriented wire format shared by both ends
//! - [`exchange`]: the exchange capability, its listeners and a simulated exchange
//! - [`server`]: TCP command service and event publication
//! - [`client`]: the broker-side proxy
//! - [`dispatch`]: the filtered, ordered order queue
//! - [`config`]: addresses, ports and timeouts
//!
//! ## Example
//!
//! ```no_run
//! use exchange_net::client::ExchangeClient;
//! use exchange_net::config::{ClientConfig, ServerConfig};
//! use exchange_net::exchange::{SimulatedExchange, StockExchange};
//! use exchange_net::server::ExchangeServer;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let exchange = Arc::new(SimulatedExchange::with_prices([("IBM", 100)]));
//! let server = ExchangeServer::bind(exchange.clone(), &ServerConfig::default()).await?;
//!
//! let client = ExchangeClient::connect(&ClientConfig::default()).await?;
//! let quote = client.get_quote("IBM").await?;
//! assert_eq!(quote.map(|q| q.price), Some(100));
//!
//! client.close()?;
//! server.close()?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod dispatch;
pub mod exchange;
mod framing;
pub mod order;
pub mod protocol;
pub mod server;
mod shutdown;

pub use client::ExchangeClient;
pub use dispatch::{DispatchFilter, OrderDispatchQueue, ThresholdFilter};
pub use exchange::{ExchangeError, StockExchange};
pub use order::{Order, OrderId, Price, Side, StockQuote};
pub use server::ExchangeServer;
