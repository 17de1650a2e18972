/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Event subscription.

use crate::exchange::ListenerRegistry;
use crate::protocol::ExchangeEvent;
use crate::protocol::constants::MAX_DATAGRAM_SIZE;
use crate::shutdown::ShutdownSignal;
use std::io;
use socket2::{Domain, Protocol, Socket, Type};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

/// Pause after a failed receive before trying again.
const RECEIVE_BACKOFF: Duration = Duration::from_millis(20);

/// Opens the socket events are received on. Must be called from within a
/// Tokio runtime.
///
/// A multicast `group` is joined on all interfaces with the socket bound to
/// the wildcard address and address reuse enabled, so every subscriber on a
/// host can share the event port. Any other address is bound directly.
pub(crate) fn bind_event_socket(group: Ipv4Addr, port: u16) -> io::Result<UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    let bind_addr = if group.is_multicast() {
        socket.set_reuse_address(true)?;
        #[cfg(all(unix, not(any(target_os = "solaris", target_os = "illumos"))))]
        socket.set_reuse_port(true)?;
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, port))
    } else {
        SocketAddr::from((group, port))
    };
    socket.bind(&bind_addr.into())?;
    socket.set_nonblocking(true)?;

    let socket = UdpSocket::from_std(socket.into())?;
    if group.is_multicast() {
        socket.join_multicast_v4(group, Ipv4Addr::UNSPECIFIED)?;
        debug!(%group, port, "joined event group");
    } else {
        debug!(addr = %socket.local_addr()?, "listening for unicast events");
    }
    Ok(socket)
}

/// Receives event datagrams and fans them out to the registered listeners.
pub(crate) struct EventSubscriber {
    socket: UdpSocket,
    group: Ipv4Addr,
    listeners: Arc<ListenerRegistry>,
}

impl EventSubscriber {
    pub(crate) fn new(
        socket: UdpSocket,
        group: Ipv4Addr,
        listeners: Arc<ListenerRegistry>,
    ) -> Self {
        Self {
            socket,
            group,
            listeners,
        }
    }

    /// Local address of the event socket.
    pub(crate) fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    pub(crate) fn spawn(self, shutdown: ShutdownSignal) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    async fn run(self, mut shutdown: ShutdownSignal) {
        let mut buf = [0u8; MAX_DATAGRAM_SIZE];
        loop {
            let received = tokio::select! {
                biased;
                _ = shutdown.wait() => break,
                received = self.socket.recv_from(&mut buf) => received,
            };

            match received {
                Ok((len, from)) => match ExchangeEvent::decode_datagram(&buf[..len]) {
                    Ok(event) => {
                        trace!(%event, %from, "event received");
                        self.listeners.notify(&event);
                    }
                    Err(e) => warn!(%from, error = %e, "discarding malformed event"),
                },
                Err(e) => {
                    warn!(error = %e, "event receive failed");
                    tokio::time::sleep(RECEIVE_BACKOFF).await;
                }
            }
        }

        if self.group.is_multicast() {
            if let Err(e) = self.socket.leave_multicast_v4(self.group, Ipv4Addr::UNSPECIFIED) {
                warn!(group = %self.group, error = %e, "failed to leave event group");
            }
        }
        debug!(group = %self.group, "event subscriber stopped");
    }
}
