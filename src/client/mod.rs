/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Broker-side network proxy of a remote exchange.
//!
//! [`ExchangeClient`] implements [`StockExchange`](crate::exchange::StockExchange)
//! by sending commands over one TCP connection and receiving events from
//! the exchange's UDP event group.
//!
//! Requests from concurrent callers are serialized through a bounded queue
//! drained by a single worker task, so at most one command is outstanding
//! on the connection and responses can never be handed to the wrong caller.
//! Each request is bounded by the configured timeout; a failed connection
//! is re-established on the next request.

pub mod core;
mod subscriber;
mod worker;

pub use self::core::ExchangeClient;
