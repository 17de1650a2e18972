/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Per-connection command handling.

use crate::exchange::StockExchange;
use crate::framing::{Line, read_line};
use crate::order::Order;
use crate::protocol::constants::MAX_LINE_LENGTH;
use crate::protocol::{Command, ExchangeState, ProtocolError, encode_price, encode_tickers};
use crate::shutdown::ShutdownSignal;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, info, trace, warn};

/// Serves one command connection until the peer disconnects, the socket
/// fails, or the server shuts down.
///
/// Each line is decoded and answered with exactly one line. Lines that do
/// not decode are logged and get no answer; the connection stays up.
pub(crate) async fn serve_connection<E: StockExchange>(
    socket: TcpStream,
    peer: SocketAddr,
    exchange: Arc<E>,
    mut shutdown: ShutdownSignal,
) {
    if let Err(e) = socket.set_nodelay(true) {
        debug!(%peer, error = %e, "could not disable Nagle");
    }

    let (reader, mut writer) = socket.into_split();
    let mut reader = BufReader::new(reader);

    loop {
        let line = tokio::select! {
            biased;
            _ = shutdown.wait() => {
                debug!(%peer, "closing connection on shutdown");
                break;
            }
            line = read_line(&mut reader, MAX_LINE_LENGTH) => line,
        };

        let line = match line {
            Ok(Line::Complete(line)) => line,
            Ok(Line::TooLong) => {
                warn!(
                    %peer,
                    error = %ProtocolError::LineTooLong(MAX_LINE_LENGTH),
                    "command ignored"
                );
                continue;
            }
            Ok(Line::Eof) => {
                debug!(%peer, "peer closed connection");
                break;
            }
            Err(e) => {
                warn!(%peer, error = %e, "command read failed");
                break;
            }
        };

        let command = match Command::decode(&line) {
            Ok(command) => command,
            Err(e) => {
                warn!(%peer, error = %e, %line, "command ignored");
                continue;
            }
        };
        trace!(%peer, %command, "command received");

        let mut response = respond(exchange.as_ref(), command).await;
        response.push('\n');
        if let Err(e) = writer.write_all(response.as_bytes()).await {
            warn!(%peer, error = %e, "response write failed");
            break;
        }
    }
}

/// Runs `command` against the exchange and encodes the response payload.
/// Domain failures become the empty payload.
pub(crate) async fn respond<E: StockExchange>(exchange: &E, command: Command) -> String {
    match command {
        Command::GetState => match exchange.is_open().await {
            Ok(open) => ExchangeState::from(open).to_string(),
            Err(e) => {
                warn!(error = %e, "state unavailable");
                String::new()
            }
        },
        Command::GetTickers => match exchange.get_tickers().await {
            Ok(tickers) => encode_tickers(&tickers),
            Err(e) => {
                warn!(error = %e, "ticker list unavailable");
                String::new()
            }
        },
        Command::GetQuote { ticker } => match exchange.get_quote(&ticker).await {
            Ok(quote) => encode_price(quote.map(|q| q.price)),
            Err(e) => {
                warn!(%ticker, error = %e, "quote unavailable");
                String::new()
            }
        },
        Command::ExecuteTrade {
            side,
            account_id,
            ticker,
            shares,
        } => {
            let order = Order::market(side, account_id, ticker, shares);
            match exchange.execute_trade(&order).await {
                Ok(price) => encode_price(Some(price)),
                Err(e) => {
                    info!(order_id = %order.id(), error = %e, "trade rejected");
                    String::new()
                }
            }
        }
    }
}
