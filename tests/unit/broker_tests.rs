#[cfg(test)]
mod tests {
    use crate::start_exchange;
    use exchange_net::client::ExchangeClient;
    use exchange_net::dispatch::{
        ByArrival, ByStopPriceAscending, OrderDispatchQueue, ThresholdFilter,
    };
    use exchange_net::exchange::StockExchange;
    use exchange_net::order::{Order, Side};
    use exchange_net::protocol::ExchangeEvent;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_price_events_release_stop_orders() {
        let fixture = start_exchange(&[("IBM", 90)]).await;
        fixture.exchange.open();
        let client = ExchangeClient::connect(&fixture.client_config).await.unwrap();

        let filter = Arc::new(ThresholdFilter::stop_buy(90));
        let queue = OrderDispatchQueue::new(ByStopPriceAscending, filter.clone()).unwrap();
        let (tx, mut released) = mpsc::unbounded_channel();
        queue.set_order_processor(move |order: Order| {
            let _ = tx.send(order);
        });

        {
            let filter = filter.clone();
            client.add_listener(Arc::new(move |event: &ExchangeEvent| {
                if let ExchangeEvent::PriceChanged { ticker, price } = event {
                    if ticker == "IBM" {
                        filter.set_threshold(*price);
                    }
                }
            }));
        }

        for stop in [120, 100, 95] {
            queue
                .enqueue(Order::stop(Side::Buy, "acct1", "IBM", 10, stop))
                .unwrap();
        }

        fixture.exchange.set_price("IBM", 100);

        let mut stops = Vec::new();
        for _ in 0..2 {
            let order = timeout(Duration::from_secs(2), released.recv())
                .await
                .unwrap()
                .unwrap();
            assert_eq!(client.execute_trade(&order).await.unwrap(), 100);
            stops.push(order.stop_price().unwrap());
        }
        assert_eq!(stops, vec![95, 100]);
        assert_eq!(queue.len(), 1);
        assert_eq!(filter.threshold(), 100);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_market_orders_wait_for_open() {
        let fixture = start_exchange(&[("IBM", 100)]).await;
        let client = ExchangeClient::connect(&fixture.client_config).await.unwrap();

        let filter = Arc::new(ThresholdFilter::market_open(client.is_open().await.unwrap()));
        let queue = OrderDispatchQueue::new(ByArrival, filter.clone()).unwrap();
        let (tx, mut released) = mpsc::unbounded_channel();
        queue.set_order_processor(move |order: Order| {
            let _ = tx.send(order);
        });

        {
            let filter = filter.clone();
            client.add_listener(Arc::new(move |event: &ExchangeEvent| match event {
                ExchangeEvent::Opened => filter.set_threshold(true),
                ExchangeEvent::Closed => filter.set_threshold(false),
                ExchangeEvent::PriceChanged { .. } => {}
            }));
        }

        let first = Order::market(Side::Sell, "acct1", "IBM", 5);
        let second = Order::market(Side::Buy, "acct2", "IBM", 7);
        queue.enqueue(first.clone()).unwrap();
        queue.enqueue(second.clone()).unwrap();
        assert!(
            timeout(Duration::from_millis(100), released.recv())
                .await
                .is_err()
        );

        fixture.exchange.open();
        for expected in [first, second] {
            let order = timeout(Duration::from_secs(2), released.recv())
                .await
                .unwrap()
                .unwrap();
            assert_eq!(order, expected);
            assert_eq!(client.execute_trade(&order).await.unwrap(), 100);
        }
        assert!(queue.is_empty());
    }
}
