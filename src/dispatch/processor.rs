/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Callback receiving dispatched orders.

use crate::order::Order;

/// Receives each dispatched order exactly once.
///
/// Invoked on the queue's dispatch thread; a slow processor delays the
/// remaining orders of the same queue but never other queues.
pub trait OrderProcessor: Send + Sync + 'static {
    /// Handles one dispatched order.
    fn process(&self, order: Order);
}

impl<F> OrderProcessor for F
where
    F: Fn(Order) + Send + Sync + 'static,
{
    fn process(&self, order: Order) {
        self(order)
    }
}
