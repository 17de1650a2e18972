/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Command messages sent from a broker to the exchange.

use super::constants::{
    DELIMITER, EXECUTE_TRADE_CMD, GET_QUOTE_CMD, GET_STATE_CMD, GET_TICKERS_CMD,
};
use super::error::ProtocolError;
use super::fields::{expect_fields, integer, non_empty, parse_side, side_token, split};
use crate::order::{Order, Side};
use std::fmt;
use std::str::FromStr;

/// Requests a broker can submit over the command connection.
///
/// Each command is answered by exactly one response line.
///
/// # Examples
///
/// ```
/// use exchange_net::protocol::Command;
///
/// let command = Command::GetQuote { ticker: "IBM".to_string() };
/// assert_eq!(command.encode(), "GET_QUOTE:IBM");
/// assert_eq!(Command::decode("GET_QUOTE:IBM"), Ok(command));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Ask whether the exchange is open.
    GetState,

    /// Ask for every traded ticker.
    GetTickers,

    /// Ask for the current price of a ticker.
    GetQuote {
        /// Ticker symbol.
        ticker: String,
    },

    /// Execute a trade at the current market price.
    ExecuteTrade {
        /// Buy or sell.
        side: Side,
        /// Account placing the trade.
        account_id: String,
        /// Ticker symbol.
        ticker: String,
        /// Number of shares.
        shares: u32,
    },
}

impl Command {
    /// Builds the trade command for an order.
    #[must_use]
    pub fn execute_trade(order: &Order) -> Self {
        Self::ExecuteTrade {
            side: order.side(),
            account_id: order.account_id().to_string(),
            ticker: order.ticker().to_string(),
            shares: order.shares(),
        }
    }

    /// Wire name of the command.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::GetState => GET_STATE_CMD,
            Self::GetTickers => GET_TICKERS_CMD,
            Self::GetQuote { .. } => GET_QUOTE_CMD,
            Self::ExecuteTrade { .. } => EXECUTE_TRADE_CMD,
        }
    }

    /// Encodes the command as a single line without the line terminator.
    #[must_use]
    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// Checks that the command survives framing, i.e. that decoding its
    /// encoding gives it back.
    ///
    /// # Errors
    ///
    /// Returns the decoding error, or [`ProtocolError::NotRepresentable`]
    /// if the line decodes to a different command.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        let line = self.encode();
        if Self::decode(&line)? == *self {
            Ok(())
        } else {
            Err(ProtocolError::NotRepresentable(line))
        }
    }

    /// Decodes one command line. A trailing line terminator is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::UnknownCommand`] for an unrecognised tag and
    /// a field-level variant for malformed arguments.
    pub fn decode(line: &str) -> Result<Self, ProtocolError> {
        let (tag, fields) = split(line)?;
        match tag {
            GET_STATE_CMD => {
                expect_fields(GET_STATE_CMD, &fields, 0)?;
                Ok(Self::GetState)
            }
            GET_TICKERS_CMD => {
                expect_fields(GET_TICKERS_CMD, &fields, 0)?;
                Ok(Self::GetTickers)
            }
            GET_QUOTE_CMD => {
                expect_fields(GET_QUOTE_CMD, &fields, 1)?;
                Ok(Self::GetQuote {
                    ticker: non_empty(GET_QUOTE_CMD, "ticker", fields[0])?,
                })
            }
            EXECUTE_TRADE_CMD => {
                expect_fields(EXECUTE_TRADE_CMD, &fields, 4)?;
                Ok(Self::ExecuteTrade {
                    side: parse_side(fields[0])?,
                    account_id: non_empty(EXECUTE_TRADE_CMD, "account", fields[1])?,
                    ticker: non_empty(EXECUTE_TRADE_CMD, "ticker", fields[2])?,
                    shares: integer("shares", fields[3])?,
                })
            }
            other => Err(ProtocolError::UnknownCommand(other.to_string())),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GetState | Self::GetTickers => f.write_str(self.name()),
            Self::GetQuote { ticker } => write!(f, "{GET_QUOTE_CMD}{DELIMITER}{ticker}"),
            Self::ExecuteTrade {
                side,
                account_id,
                ticker,
                shares,
            } => write!(
                f,
                "{EXECUTE_TRADE_CMD}{d}{side}{d}{account_id}{d}{ticker}{d}{shares}",
                d = DELIMITER,
                side = side_token(*side),
            ),
        }
    }
}

impl FromStr for Command {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}
