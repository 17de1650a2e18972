/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Ranking strategies that decide which queued order is examined first.

use crate::order::{Order, Price};
use std::cmp::Reverse;

/// Maps an order to the key it is ranked by. Lower keys are dispatched
/// first; orders with equal keys keep their arrival order.
///
/// Any `Fn(&Order) -> K` closure with an `Ord` key is a ranking:
///
/// ```
/// use exchange_net::dispatch::OrderRanking;
/// use exchange_net::order::{Order, Side};
///
/// let by_shares = |order: &Order| std::cmp::Reverse(order.shares());
/// let big = Order::market(Side::Buy, "a", "IBM", 500);
/// let small = Order::market(Side::Buy, "a", "IBM", 5);
/// assert!(by_shares.rank(&big) < by_shares.rank(&small));
/// ```
pub trait OrderRanking: Send + Sync + 'static {
    /// Sort key produced for each order.
    type Key: Ord + Send + Sync + 'static;

    /// Computes the rank key of `order`.
    fn rank(&self, order: &Order) -> Self::Key;
}

impl<F, K> OrderRanking for F
where
    F: Fn(&Order) -> K + Send + Sync + 'static,
    K: Ord + Send + Sync + 'static,
{
    type Key = K;

    fn rank(&self, order: &Order) -> K {
        self(order)
    }
}

/// Plain first-in first-out ranking, used for market orders.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByArrival;

impl OrderRanking for ByArrival {
    type Key = ();

    fn rank(&self, _order: &Order) -> Self::Key {}
}

/// Lowest stop price first; orders without a stop price lead.
///
/// Suits stop-buy queues, where a rising market reaches the lowest stop
/// first.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByStopPriceAscending;

impl OrderRanking for ByStopPriceAscending {
    type Key = Price;

    fn rank(&self, order: &Order) -> Self::Key {
        order.stop_price().unwrap_or(Price::MIN)
    }
}

/// Highest stop price first; orders without a stop price lead.
///
/// Suits stop-sell queues, where a falling market reaches the highest stop
/// first.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByStopPriceDescending;

impl OrderRanking for ByStopPriceDescending {
    type Key = Reverse<Price>;

    fn rank(&self, order: &Order) -> Self::Key {
        Reverse(order.stop_price().unwrap_or(Price::MAX))
    }
}
