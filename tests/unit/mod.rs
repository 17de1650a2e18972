mod broker_tests;
mod network_tests;

use exchange_net::config::{ClientConfig, ServerConfig};
use exchange_net::exchange::SimulatedExchange;
use exchange_net::server::ExchangeServer;
use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use std::sync::Arc;

pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Reserves a loopback UDP port for the event channel of one test.
pub(crate) fn free_udp_port() -> u16 {
    let socket = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
    socket.local_addr().unwrap().port()
}

/// A running exchange server on loopback, with events sent by unicast to
/// a port reserved for the test's client.
pub(crate) struct Fixture {
    pub exchange: Arc<SimulatedExchange>,
    pub server: ExchangeServer<SimulatedExchange>,
    pub client_config: ClientConfig,
}

/// Client settings for a hand-scripted command server at `command_addr`.
pub(crate) fn scripted_client_config(command_addr: SocketAddr) -> ClientConfig {
    ClientConfig {
        command_addr,
        event_group: Ipv4Addr::LOCALHOST,
        event_port: free_udp_port(),
        request_timeout_ms: 2_000,
        connect_timeout_ms: 1_000,
        ..ClientConfig::default()
    }
}

pub(crate) async fn start_exchange(prices: &[(&str, i64)]) -> Fixture {
    init_tracing();
    let exchange = Arc::new(SimulatedExchange::with_prices(prices.iter().copied()));
    let event_port = free_udp_port();

    let server_config = ServerConfig {
        command_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 0)),
        event_group: Ipv4Addr::LOCALHOST,
        event_port,
        ..ServerConfig::default()
    };
    let server = ExchangeServer::bind(exchange.clone(), &server_config)
        .await
        .unwrap();

    let client_config = ClientConfig {
        command_addr: server.local_addr(),
        event_group: Ipv4Addr::LOCALHOST,
        event_port,
        request_timeout_ms: 2_000,
        connect_timeout_ms: 1_000,
        ..ClientConfig::default()
    };

    Fixture {
        exchange,
        server,
        client_config,
    }
}
