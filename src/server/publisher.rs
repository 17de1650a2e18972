/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! UDP publication of exchange events.

use crate::config::ServerConfig;
use crate::protocol::ExchangeEvent;
use std::io;
use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, trace, warn};

/// Sends each event as one datagram to the configured group.
///
/// Publishing is synchronous with the exchange's event callback but never
/// blocks: the socket is non-blocking, a failed send is logged and the
/// event is dropped.
#[derive(Debug)]
pub struct EventPublisher {
    socket: Mutex<Option<UdpSocket>>,
    target: SocketAddr,
    group: Option<Ipv4Addr>,
}

impl EventPublisher {
    /// Opens the publishing socket. For a multicast group the socket also
    /// joins the group, which keeps loopback delivery working on hosts that
    /// run subscribers next to the exchange.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket cannot be opened or configured.
    pub fn new(config: &ServerConfig) -> io::Result<Self> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
        socket.set_nonblocking(true)?;

        let mut group = None;
        if config.event_group.is_multicast() {
            socket.set_multicast_ttl_v4(config.multicast_ttl)?;
            socket.set_multicast_loop_v4(true)?;
            match socket.join_multicast_v4(&config.event_group, &Ipv4Addr::UNSPECIFIED) {
                Ok(()) => group = Some(config.event_group),
                Err(e) => {
                    warn!(group = %config.event_group, error = %e, "could not join event group")
                }
            }
        }

        Ok(Self {
            socket: Mutex::new(Some(socket)),
            target: config.event_addr(),
            group,
        })
    }

    /// Destination of published datagrams.
    #[must_use]
    pub fn target(&self) -> SocketAddr {
        self.target
    }

    /// Encodes and sends `event`. Failures are logged, never retried.
    pub fn publish(&self, event: &ExchangeEvent) {
        let line = event.encode();
        let socket = self.socket.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(socket) = socket.as_ref() else {
            trace!(event = event.name(), "publisher closed, event dropped");
            return;
        };
        match socket.send_to(line.as_bytes(), self.target) {
            Ok(_) => trace!(event = %line, target = %self.target, "event published"),
            Err(e) => warn!(event = event.name(), error = %e, "failed to publish event"),
        }
    }

    /// Leaves the group and closes the socket. Later events are dropped.
    pub fn close(&self) {
        let socket = self
            .socket
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let (Some(socket), Some(group)) = (socket, self.group) else {
            return;
        };
        if let Err(e) = socket.leave_multicast_v4(&group, &Ipv4Addr::UNSPECIFIED) {
            warn!(%group, error = %e, "failed to leave event group");
        }
        debug!(%group, "event publisher closed");
    }
}
