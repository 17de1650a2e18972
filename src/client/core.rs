/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Core exchange client.

use super::subscriber::{EventSubscriber, bind_event_socket};
use super::worker::{self, CommandWorker, PendingOperation};
use crate::config::ClientConfig;
use crate::exchange::{
    ExchangeError, ExchangeListener, ListenerId, ListenerRegistry, StockExchange,
};
use crate::order::{Order, Price, StockQuote};
use crate::protocol::{Command, ExchangeState, decode_price, decode_tickers};
use crate::shutdown::Shutdown;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Broker-side proxy of a remote exchange.
///
/// Commands issued concurrently from any number of tasks are queued and
/// sent one at a time over a single TCP connection, so each caller gets
/// exactly the response to its own command. Events received on the event
/// group are delivered to the registered listeners.
///
/// # Examples
///
/// ```no_run
/// use exchange_net::client::ExchangeClient;
/// use exchange_net::config::ClientConfig;
/// use exchange_net::exchange::StockExchange;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = ExchangeClient::connect(&ClientConfig::default()).await?;
/// if client.is_open().await? {
///     let quote = client.get_quote("IBM").await?;
///     println!("{quote:?}");
/// }
/// client.close()?;
/// # Ok(())
/// # }
/// ```
pub struct ExchangeClient {
    requests: mpsc::Sender<PendingOperation>,
    listeners: Arc<ListenerRegistry>,
    command_addr: SocketAddr,
    event_addr: SocketAddr,
    shutdown: Shutdown,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl ExchangeClient {
    /// Connects to the exchange's command listener, subscribes to its event
    /// group and starts the command worker.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::Connection`] if either socket cannot be
    /// opened and [`ExchangeError::Timeout`] if the exchange does not accept
    /// the connection in time.
    pub async fn connect(config: &ClientConfig) -> Result<Self, ExchangeError> {
        let stream = worker::connect(config.command_addr, config.connect_timeout()).await?;
        let socket = bind_event_socket(config.event_group, config.event_port)?;

        let listeners = Arc::new(ListenerRegistry::new());
        let subscriber = EventSubscriber::new(socket, config.event_group, Arc::clone(&listeners));
        let event_addr = subscriber.local_addr()?;

        let shutdown = Shutdown::new();
        let (requests, pending) = mpsc::channel(config.queue_capacity.max(1));
        let worker = CommandWorker::new(
            config.command_addr,
            stream,
            config.request_timeout(),
            config.connect_timeout(),
        );
        let tasks = vec![
            worker.spawn(pending, shutdown.subscribe()),
            subscriber.spawn(shutdown.subscribe()),
        ];

        info!(
            command_addr = %config.command_addr,
            event_addr = %event_addr,
            "connected to exchange"
        );

        Ok(Self {
            requests,
            listeners,
            command_addr: config.command_addr,
            event_addr,
            shutdown,
            tasks: Mutex::new(tasks),
        })
    }

    /// Address of the exchange's command listener.
    #[must_use]
    pub fn command_addr(&self) -> SocketAddr {
        self.command_addr
    }

    /// Local address events are received on.
    #[must_use]
    pub fn event_addr(&self) -> SocketAddr {
        self.event_addr
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shutdown.is_signalled()
    }

    /// Sends `command` and waits for its raw response line.
    ///
    /// Commands are answered in the order they are submitted.
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::Protocol`] if the command cannot be framed
    /// (for example a field containing the delimiter), [`ExchangeError::Closed`]
    /// if the client is closed, and any transport failure of the round trip.
    pub async fn submit(&self, command: Command) -> Result<String, ExchangeError> {
        command.validate()?;
        if self.shutdown.is_signalled() {
            return Err(ExchangeError::Closed);
        }

        let (operation, response) = PendingOperation::new(command);
        self.requests
            .send(operation)
            .await
            .map_err(|_| ExchangeError::Closed)?;
        response.await.map_err(|_| ExchangeError::Closed)?
    }

    /// Stops the command worker and leaves the event group. Requests in
    /// flight or still queued fail with [`ExchangeError::Closed`].
    ///
    /// # Errors
    ///
    /// Returns [`ExchangeError::Closed`] on every call after the first.
    pub fn close(&self) -> Result<(), ExchangeError> {
        if !self.shutdown.signal() {
            return Err(ExchangeError::Closed);
        }
        info!(command_addr = %self.command_addr, "exchange client closed");
        Ok(())
    }

    /// Waits for the background tasks to finish after [`close`](Self::close).
    pub async fn wait(&self) {
        let tasks = std::mem::take(
            &mut *self.tasks.lock().unwrap_or_else(PoisonError::into_inner),
        );
        for task in tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "client task ended abnormally");
            }
        }
    }
}

impl StockExchange for ExchangeClient {
    async fn is_open(&self) -> Result<bool, ExchangeError> {
        let response = self.submit(Command::GetState).await?;
        Ok(ExchangeState::decode(&response)?.is_open())
    }

    async fn get_tickers(&self) -> Result<Vec<String>, ExchangeError> {
        let response = self.submit(Command::GetTickers).await?;
        Ok(decode_tickers(&response))
    }

    async fn get_quote(&self, ticker: &str) -> Result<Option<StockQuote>, ExchangeError> {
        let response = self
            .submit(Command::GetQuote {
                ticker: ticker.to_string(),
            })
            .await?;
        Ok(decode_price(&response)?.map(|price| StockQuote::new(ticker, price)))
    }

    async fn execute_trade(&self, order: &Order) -> Result<Price, ExchangeError> {
        let response = self.submit(Command::execute_trade(order)).await?;
        match decode_price(&response)? {
            Some(price) => Ok(price),
            None => {
                debug!(order = %order.id(), ticker = order.ticker(), "trade rejected");
                Err(ExchangeError::TradeRejected(order.id().to_string()))
            }
        }
    }

    fn add_listener(&self, listener: ExchangeListener) -> ListenerId {
        self.listeners.add(listener)
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }
}

impl Drop for ExchangeClient {
    fn drop(&mut self) {
        self.shutdown.signal();
    }
}

impl std::fmt::Debug for ExchangeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExchangeClient")
            .field("command_addr", &self.command_addr)
            .field("event_addr", &self.event_addr)
            .field("listeners", &self.listeners.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}
