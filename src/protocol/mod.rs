/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Text wire protocol shared by the exchange server and the broker client.
//!
//! This module is pure: it holds the protocol vocabulary and the
//! encode/decode functions, and performs no I/O. Encoding is total for
//! well-formed values; decoding reports a [`ProtocolError`] instead of
//! panicking.
//!
//! # Examples
//!
//! ```
//! use exchange_net::protocol::{Command, ExchangeEvent, ProtocolError};
//!
//! assert_eq!(Command::decode("GET_STATE"), Ok(Command::GetState));
//! assert!(matches!(
//!     ExchangeEvent::decode("NOPE"),
//!     Err(ProtocolError::UnknownEvent(_))
//! ));
//! ```

pub mod command;
pub mod constants;
pub mod error;
pub mod event;
mod fields;
pub mod response;

pub use command::Command;
pub use constants::DELIMITER;
pub use error::ProtocolError;
pub use event::ExchangeEvent;
pub use response::{ExchangeState, decode_price, decode_tickers, encode_price, encode_tickers};
