/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Core exchange server.

use super::handler::serve_connection;
use super::publisher::EventPublisher;
use crate::config::ServerConfig;
use crate::exchange::{ListenerId, StockExchange};
use crate::protocol::ExchangeEvent;
use crate::shutdown::{Shutdown, ShutdownSignal};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Pause after a failed accept before trying again.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

/// Errors reported by [`ExchangeServer`].
#[derive(Debug, Error)]
pub enum ServerError {
    /// A socket could not be opened.
    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// [`ExchangeServer::close`] was already called.
    #[error("exchange server is already closed")]
    AlreadyClosed,
}

/// Network adapter exposing a local [`StockExchange`] to remote brokers.
///
/// Events of the wrapped exchange are multicast as datagrams; commands are
/// served over TCP with one task per connection.
///
/// # Examples
///
/// ```no_run
/// use exchange_net::config::ServerConfig;
/// use exchange_net::exchange::SimulatedExchange;
/// use exchange_net::server::ExchangeServer;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let exchange = Arc::new(SimulatedExchange::with_prices([("IBM", 100)]));
/// let server = ExchangeServer::bind(exchange.clone(), &ServerConfig::default()).await?;
///
/// exchange.open(); // multicast to every subscribed broker
///
/// server.close()?;
/// server.wait().await;
/// # Ok(())
/// # }
/// ```
pub struct ExchangeServer<E: StockExchange> {
    exchange: Arc<E>,
    publisher: Arc<EventPublisher>,
    listener_id: ListenerId,
    local_addr: SocketAddr,
    shutdown: Shutdown,
    accept_task: Mutex<Option<JoinHandle<()>>>,
}

impl<E: StockExchange> ExchangeServer<E> {
    /// Binds the command listener and the event publisher, starts the
    /// accept loop, and registers for the exchange's events.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Io`] if either socket cannot be opened.
    pub async fn bind(exchange: Arc<E>, config: &ServerConfig) -> Result<Self, ServerError> {
        let publisher = Arc::new(EventPublisher::new(config)?);
        let listener = TcpListener::bind(config.command_addr).await?;
        let local_addr = listener.local_addr()?;

        let shutdown = Shutdown::new();
        let accept_task = tokio::spawn(accept_loop(
            listener,
            Arc::clone(&exchange),
            shutdown.subscribe(),
        ));

        let listener_id = {
            let publisher = Arc::clone(&publisher);
            exchange.add_listener(Arc::new(move |event: &ExchangeEvent| {
                publisher.publish(event)
            }))
        };

        info!(
            command_addr = %local_addr,
            event_addr = %publisher.target(),
            "exchange server started"
        );

        Ok(Self {
            exchange,
            publisher,
            listener_id,
            local_addr,
            shutdown,
            accept_task: Mutex::new(Some(accept_task)),
        })
    }

    /// Address the command listener is bound to.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Destination of event datagrams.
    #[must_use]
    pub fn event_addr(&self) -> SocketAddr {
        self.publisher.target()
    }

    /// The wrapped exchange.
    #[must_use]
    pub fn exchange(&self) -> &Arc<E> {
        &self.exchange
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shutdown.is_signalled()
    }

    /// Stops publishing events, leaves the event group, stops the accept
    /// loop and closes every open command connection.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::AlreadyClosed`] on every call after the first.
    pub fn close(&self) -> Result<(), ServerError> {
        if !self.shutdown.signal() {
            return Err(ServerError::AlreadyClosed);
        }
        self.exchange.remove_listener(self.listener_id);
        self.publisher.close();
        info!(command_addr = %self.local_addr, "exchange server closed");
        Ok(())
    }

    /// Waits for the accept loop to finish. Returns immediately if it was
    /// already awaited.
    pub async fn wait(&self) {
        let task = self
            .accept_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!(error = %e, "accept loop ended abnormally");
            }
        }
    }
}

impl<E: StockExchange> Drop for ExchangeServer<E> {
    fn drop(&mut self) {
        if !self.shutdown.is_signalled() {
            let _ = self.close();
        }
    }
}

async fn accept_loop<E: StockExchange>(
    listener: TcpListener,
    exchange: Arc<E>,
    mut shutdown: ShutdownSignal,
) {
    let connection_shutdown = shutdown.clone();
    loop {
        tokio::select! {
            biased;
            _ = shutdown.wait() => break,
            accepted = listener.accept() => match accepted {
                Ok((socket, peer)) => {
                    debug!(%peer, "command connection accepted");
                    tokio::spawn(serve_connection(
                        socket,
                        peer,
                        Arc::clone(&exchange),
                        connection_shutdown.clone(),
                    ));
                }
                Err(e) => {
                    warn!(error = %e, "accept failed");
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
            },
        }
    }
    debug!("accept loop stopped");
}
