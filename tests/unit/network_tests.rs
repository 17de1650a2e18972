#[cfg(test)]
mod tests {
    use crate::{free_udp_port, init_tracing, scripted_client_config, start_exchange};
    use exchange_net::client::ExchangeClient;
    use exchange_net::config::ClientConfig;
    use exchange_net::exchange::{ExchangeError, StockExchange};
    use exchange_net::order::{Order, Side};
    use exchange_net::protocol::ExchangeEvent;
    use exchange_net::server::ServerError;
    use std::net::Ipv4Addr;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::sync::{mpsc, oneshot};
    use tokio::time::timeout;

    async fn read_line(reader: &mut BufReader<tokio::net::tcp::OwnedReadHalf>) -> String {
        let mut line = String::new();
        timeout(Duration::from_secs(2), reader.read_line(&mut line))
            .await
            .unwrap()
            .unwrap();
        line
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_get_quote_round_trip() {
        let fixture = start_exchange(&[("IBM", 100)]).await;
        let client = ExchangeClient::connect(&fixture.client_config).await.unwrap();

        let quote = client.get_quote("IBM").await.unwrap().unwrap();
        assert_eq!(quote.ticker, "IBM");
        assert_eq!(quote.price, 100);

        assert_eq!(client.get_quote("NOPE").await.unwrap(), None);
        assert_eq!(client.get_tickers().await.unwrap(), vec!["IBM".to_string()]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_is_open_follows_exchange_state() {
        let fixture = start_exchange(&[("IBM", 100)]).await;
        let client = ExchangeClient::connect(&fixture.client_config).await.unwrap();

        assert!(!client.is_open().await.unwrap());
        fixture.exchange.open();
        assert!(client.is_open().await.unwrap());
        fixture.exchange.close();
        assert!(!client.is_open().await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_execute_trade() {
        let fixture = start_exchange(&[("IBM", 100)]).await;
        let client = ExchangeClient::connect(&fixture.client_config).await.unwrap();
        let order = Order::market(Side::Buy, "acct1", "IBM", 10);

        // closed exchange rejects the trade with an empty response
        assert!(matches!(
            client.execute_trade(&order).await,
            Err(ExchangeError::TradeRejected(_))
        ));

        fixture.exchange.open();
        assert_eq!(client.execute_trade(&order).await.unwrap(), 100);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_raw_trade_response_is_bare_price() {
        let fixture = start_exchange(&[("IBM", 100)]).await;
        fixture.exchange.open();

        let stream = TcpStream::connect(fixture.server.local_addr()).await.unwrap();
        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);

        writer
            .write_all(b"EXECUTE_TRADE:BUY:acct1:IBM:10\n")
            .await
            .unwrap();
        assert_eq!(read_line(&mut reader).await, "100\n");

        writer.write_all(b"GET_STATE\r\n").await.unwrap();
        assert_eq!(read_line(&mut reader).await, "OPEN\n");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_malformed_line_gets_no_response() {
        let fixture = start_exchange(&[("IBM", 100)]).await;

        let stream = TcpStream::connect(fixture.server.local_addr()).await.unwrap();
        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);

        writer.write_all(b"BOGUS:1\nGET_QUOTE\n").await.unwrap();
        writer.write_all(b"GET_QUOTE:IBM\n").await.unwrap();
        // the first line read answers the only valid command
        assert_eq!(read_line(&mut reader).await, "100\n");

        let client = ExchangeClient::connect(&fixture.client_config).await.unwrap();
        assert_eq!(client.get_quote("IBM").await.unwrap().unwrap().price, 100);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_calls_get_their_own_responses() {
        let fixture = start_exchange(&[("IBM", 100), ("MSFT", 200), ("GOOG", 300)]).await;
        let client = Arc::new(ExchangeClient::connect(&fixture.client_config).await.unwrap());

        let (ibm, msft) = tokio::join!(client.get_quote("IBM"), client.get_quote("MSFT"));
        assert_eq!(ibm.unwrap().unwrap().price, 100);
        assert_eq!(msft.unwrap().unwrap().price, 200);

        let mut handles = Vec::new();
        for round in 0..50 {
            let client = client.clone();
            handles.push(tokio::spawn(async move {
                let (ticker, price) = match round % 3 {
                    0 => ("IBM", 100),
                    1 => ("MSFT", 200),
                    _ => ("GOOG", 300),
                };
                let quote = client.get_quote(ticker).await.unwrap().unwrap();
                assert_eq!(quote.ticker, ticker);
                assert_eq!(quote.price, price);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_price_change_reaches_every_listener() {
        let fixture = start_exchange(&[("MSFT", 200)]).await;
        let client = ExchangeClient::connect(&fixture.client_config).await.unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        for n in 0..2 {
            let tx = tx.clone();
            client.add_listener(Arc::new(move |event: &ExchangeEvent| {
                let _ = tx.send((n, event.clone()));
            }));
        }
        let stray = Arc::new(AtomicBool::new(false));
        let removed = {
            let stray = stray.clone();
            client.add_listener(Arc::new(move |_event: &ExchangeEvent| {
                stray.store(true, Ordering::SeqCst)
            }))
        };
        assert!(client.remove_listener(removed));

        fixture.exchange.set_price("MSFT", 250);

        let expected = ExchangeEvent::price_changed("MSFT", 250);
        let mut seen = Vec::new();
        for _ in 0..2 {
            let (n, event) = timeout(Duration::from_secs(2), rx.recv())
                .await
                .unwrap()
                .unwrap();
            assert_eq!(event, expected);
            seen.push(n);
        }
        assert_eq!(seen, vec![0, 1]);
        assert!(!stray.load(Ordering::SeqCst));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_open_and_close_events() {
        let fixture = start_exchange(&[("IBM", 100)]).await;
        let client = ExchangeClient::connect(&fixture.client_config).await.unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        client.add_listener(Arc::new(move |event: &ExchangeEvent| {
            let _ = tx.send(event.clone());
        }));

        fixture.exchange.open();
        fixture.exchange.close();

        for expected in [ExchangeEvent::Opened, ExchangeEvent::Closed] {
            let event = timeout(Duration::from_secs(2), rx.recv())
                .await
                .unwrap()
                .unwrap();
            assert_eq!(event, expected);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_server_close_is_reported_once() {
        let fixture = start_exchange(&[("IBM", 100)]).await;
        assert_eq!(fixture.exchange.listener_count(), 1);

        fixture.server.close().unwrap();
        assert!(matches!(
            fixture.server.close(),
            Err(ServerError::AlreadyClosed)
        ));
        assert!(fixture.server.is_closed());
        assert_eq!(fixture.exchange.listener_count(), 0);
        fixture.server.wait().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_client_fails_after_server_closes() {
        let fixture = start_exchange(&[("IBM", 100)]).await;
        let client = ExchangeClient::connect(&fixture.client_config).await.unwrap();
        assert!(client.get_quote("IBM").await.unwrap().is_some());

        fixture.server.close().unwrap();
        fixture.server.wait().await;

        let first = timeout(Duration::from_secs(5), client.get_quote("IBM"))
            .await
            .unwrap();
        assert!(first.unwrap_err().is_transport());

        // the reconnect attempt fails too
        let second = timeout(Duration::from_secs(5), client.get_quote("IBM"))
            .await
            .unwrap();
        assert!(second.unwrap_err().is_transport());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_client_close() {
        let fixture = start_exchange(&[("IBM", 100)]).await;
        let client = ExchangeClient::connect(&fixture.client_config).await.unwrap();

        client.close().unwrap();
        assert!(matches!(client.close(), Err(ExchangeError::Closed)));
        assert!(client.is_closed());
        assert!(matches!(
            client.get_quote("IBM").await,
            Err(ExchangeError::Closed)
        ));
        timeout(Duration::from_secs(2), client.wait()).await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_unframeable_command_is_not_sent() {
        let fixture = start_exchange(&[("IBM", 100)]).await;
        let client = ExchangeClient::connect(&fixture.client_config).await.unwrap();

        assert!(matches!(
            client.get_quote("IBM:MSFT").await,
            Err(ExchangeError::Protocol(_))
        ));
        // the connection is still in step
        assert_eq!(client.get_quote("IBM").await.unwrap().unwrap().price, 100);
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let fixture = start_exchange(&[]).await;
        let config = fixture.client_config.clone();
        fixture.server.close().unwrap();
        fixture.server.wait().await;

        let error = ExchangeClient::connect(&config).await.unwrap_err();
        assert!(error.is_transport());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_second_call_waits_for_first_response() {
        init_tracing();
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let config = scripted_client_config(listener.local_addr().unwrap());

        let (arrived_tx, mut arrived) = mpsc::unbounded_channel();
        let (release_tx, release) = oneshot::channel::<()>();
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (reader, mut writer) = stream.into_split();
            let mut reader = BufReader::new(reader);

            let first = read_line(&mut reader).await;
            arrived_tx.send(first).unwrap();
            release.await.unwrap();
            writer.write_all(b"1\n").await.unwrap();

            let second = read_line(&mut reader).await;
            arrived_tx.send(second).unwrap();
            writer.write_all(b"2\n").await.unwrap();
        });

        let client = Arc::new(ExchangeClient::connect(&config).await.unwrap());
        let first = {
            let client = client.clone();
            tokio::spawn(async move { client.get_quote("AAA").await })
        };
        let first_line = timeout(Duration::from_secs(2), arrived.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first_line, "GET_QUOTE:AAA\n");

        let second = {
            let client = client.clone();
            tokio::spawn(async move { client.get_quote("BBB").await })
        };
        // the second command stays queued while the first is unanswered
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(arrived.try_recv().is_err());
        assert!(!first.is_finished());
        assert!(!second.is_finished());

        release_tx.send(()).unwrap();
        let first = timeout(Duration::from_secs(2), first).await.unwrap().unwrap();
        assert_eq!(first.unwrap().unwrap().price, 1);
        let second = timeout(Duration::from_secs(2), second).await.unwrap().unwrap();
        let second = second.unwrap().unwrap();
        assert_eq!((second.ticker.as_str(), second.price), ("BBB", 2));
        assert_eq!(arrived.recv().await.unwrap(), "GET_QUOTE:BBB\n");
        server.await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_timeout_drops_connection_and_reconnects() {
        init_tracing();
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let config = ClientConfig {
            request_timeout_ms: 200,
            ..scripted_client_config(listener.local_addr().unwrap())
        };

        let server = tokio::spawn(async move {
            // first connection answers too late
            let (stream, _) = listener.accept().await.unwrap();
            let slow = tokio::spawn(async move {
                let (reader, mut writer) = stream.into_split();
                let mut reader = BufReader::new(reader);
                read_line(&mut reader).await;
                tokio::time::sleep(Duration::from_millis(600)).await;
                let _ = writer.write_all(b"999\n").await;
                // keep the connection open so only the client can drop it
                tokio::time::sleep(Duration::from_secs(1)).await;
            });

            let (stream, _) = listener.accept().await.unwrap();
            let (reader, mut writer) = stream.into_split();
            let mut reader = BufReader::new(reader);
            assert_eq!(read_line(&mut reader).await, "GET_QUOTE:IBM\n");
            writer.write_all(b"7\n").await.unwrap();
            slow.await.unwrap();
        });

        let client = ExchangeClient::connect(&config).await.unwrap();
        let first = client.get_quote("IBM").await;
        assert!(matches!(
            first,
            Err(ExchangeError::Timeout(limit)) if limit == Duration::from_millis(200)
        ));

        tokio::time::sleep(Duration::from_millis(600)).await;
        let second = client.get_quote("IBM").await.unwrap().unwrap();
        assert_eq!(second.price, 7);
        server.await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_over_long_line_is_discarded() {
        let fixture = start_exchange(&[("IBM", 100)]).await;

        let stream = TcpStream::connect(fixture.server.local_addr()).await.unwrap();
        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);

        let mut flood = vec![b'A'; 200 * 1024];
        flood.push(b'\n');
        writer.write_all(&flood).await.unwrap();
        writer.write_all(b"GET_QUOTE:IBM\n").await.unwrap();
        assert_eq!(read_line(&mut reader).await, "100\n");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_subscribers_share_event_port() {
        init_tracing();
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let command_addr = listener.local_addr().unwrap();
        let accept = tokio::spawn(async move {
            let mut streams = Vec::new();
            for _ in 0..2 {
                streams.push(listener.accept().await.unwrap().0);
            }
            streams
        });

        let config = ClientConfig {
            command_addr,
            event_group: Ipv4Addr::new(239, 1, 1, 1),
            event_port: free_udp_port(),
            ..ClientConfig::default()
        };
        let first = ExchangeClient::connect(&config).await.unwrap();
        let second = ExchangeClient::connect(&config).await.unwrap();
        assert_eq!(first.event_addr().port(), config.event_port);
        assert_eq!(second.event_addr().port(), config.event_port);

        let streams = timeout(Duration::from_secs(2), accept).await.unwrap().unwrap();
        assert_eq!(streams.len(), 2);
    }
}
