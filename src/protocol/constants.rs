/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Wire protocol vocabulary.
//!
//! Every message is a single ASCII line; fields are separated by
//! [`DELIMITER`]. Commands flow broker to exchange over TCP and are answered
//! by exactly one response line. Events flow exchange to brokers as UDP
//! datagrams and are never answered.
//!
//! ```text
//! GET_STATE                                   -> OPEN | CLOSED
//! GET_TICKERS                                 -> ticker:ticker:...
//! GET_QUOTE:ticker                            -> price
//! EXECUTE_TRADE:BUY|SELL:account:ticker:qty   -> execution_price
//!
//! OPENED
//! CLOSED
//! PRICE_CHANGED:ticker:price
//! ```

/// Field separator. Never valid inside a ticker or account identifier.
pub const DELIMITER: char = ':';

/// Request for the open/closed state of the exchange.
pub const GET_STATE_CMD: &str = "GET_STATE";

/// Request for the list of traded tickers.
pub const GET_TICKERS_CMD: &str = "GET_TICKERS";

/// Request for the current price of one ticker.
pub const GET_QUOTE_CMD: &str = "GET_QUOTE";

/// Request to execute a trade.
pub const EXECUTE_TRADE_CMD: &str = "EXECUTE_TRADE";

pub const BUY_ORDER: &str = "BUY";
pub const SELL_ORDER: &str = "SELL";

/// State token returned when the exchange is open.
pub const OPEN_STATE: &str = "OPEN";

/// State token returned when the exchange is closed.
pub const CLOSED_STATE: &str = "CLOSED";

/// Event emitted when the exchange opens.
pub const OPEN_EVENT: &str = "OPENED";

/// Event emitted when the exchange closes.
pub const CLOSED_EVENT: &str = "CLOSED";

/// Event emitted when a ticker's price moves.
pub const PRICE_CHANGE_EVENT: &str = "PRICE_CHANGED";

/// Upper bound on an encoded event datagram.
pub const MAX_DATAGRAM_SIZE: usize = 1024;

/// Upper bound on one command or response line, terminator excluded.
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

/// Removes a trailing `\n` or `\r\n` from a received line.
#[inline]
#[must_use]
pub fn strip_line_ending(line: &str) -> &str {
    line.trim_end_matches(['\r', '\n'])
}
