/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Exchange-side network adapter.
//!
//! [`ExchangeServer`] wraps a local [`StockExchange`](crate::exchange::StockExchange):
//!
//! - every exchange event is encoded and sent as one UDP datagram
//! - one accept loop hands each TCP connection to its own task
//! - each connection task answers one line per command line
//! - `close` stops all of them and leaves the event group

pub mod core;
mod handler;
pub mod publisher;

pub use self::core::{ExchangeServer, ServerError};
pub use publisher::EventPublisher;
