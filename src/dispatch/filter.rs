/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Dispatch filters decide whether the best-ranked order may execute now.

use crate::order::{Order, Price};
use crossbeam::channel::{Sender, TrySendError};
use std::fmt;
use std::sync::{Mutex, PoisonError, RwLock};
use tracing::trace;

/// Handle a filter uses to ask its queue for a new dispatch pass.
///
/// Firing is cheap and never blocks: if a pass is already pending the
/// request is merged into it.
#[derive(Clone)]
pub struct DispatchTrigger {
    wake: Sender<()>,
}

impl DispatchTrigger {
    pub(crate) fn new(wake: Sender<()>) -> Self {
        Self { wake }
    }

    /// Requests a dispatch pass.
    pub fn fire(&self) {
        match self.wake.try_send(()) {
            Ok(()) | Err(TrySendError::Full(())) => {}
            Err(TrySendError::Disconnected(())) => {
                trace!("dispatch trigger fired after queue shut down");
            }
        }
    }
}

impl fmt::Debug for DispatchTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchTrigger").finish_non_exhaustive()
    }
}

/// Eligibility predicate consulted on every dequeue.
///
/// The queue only guarantees ordering and at-most-once delivery; the filter
/// alone decides whether an order may leave the queue.
pub trait DispatchFilter: Send + Sync + 'static {
    /// Returns `true` if `order` may be dispatched now.
    fn check(&self, order: &Order) -> bool;

    /// Receives the trigger of the queue this filter was installed on.
    /// Filters whose verdict can change over time fire it after each change.
    fn bind(&self, trigger: DispatchTrigger) {
        let _ = trigger;
    }
}

type Predicate<T> = Box<dyn Fn(&T, &Order) -> bool + Send + Sync>;

/// A filter comparing each order against a mutable threshold, such as the
/// current market price or whether the market is open.
///
/// Changing the threshold re-triggers dispatch on the bound queue.
///
/// # Examples
///
/// ```
/// use exchange_net::dispatch::{DispatchFilter, ThresholdFilter};
/// use exchange_net::order::{Order, Side};
///
/// let filter = ThresholdFilter::stop_buy(90);
/// let order = Order::stop(Side::Buy, "acct1", "IBM", 10, 100);
/// assert!(!filter.check(&order));
///
/// filter.set_threshold(100);
/// assert!(filter.check(&order));
/// ```
pub struct ThresholdFilter<T> {
    threshold: RwLock<T>,
    predicate: Predicate<T>,
    trigger: Mutex<Option<DispatchTrigger>>,
}

impl<T: Clone + Send + Sync + 'static> ThresholdFilter<T> {
    /// Creates a filter from an initial threshold and a predicate over
    /// `(threshold, order)`.
    pub fn new<P>(initial: T, predicate: P) -> Self
    where
        P: Fn(&T, &Order) -> bool + Send + Sync + 'static,
    {
        Self {
            threshold: RwLock::new(initial),
            predicate: Box::new(predicate),
            trigger: Mutex::new(None),
        }
    }

    /// Current threshold value.
    #[must_use]
    pub fn threshold(&self) -> T {
        self.threshold
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the threshold and requests a dispatch pass.
    pub fn set_threshold(&self, value: T) {
        *self
            .threshold
            .write()
            .unwrap_or_else(PoisonError::into_inner) = value;

        let trigger = self
            .trigger
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(trigger) = trigger {
            trigger.fire();
        }
    }
}

impl ThresholdFilter<bool> {
    /// Passes every order while the market is open.
    #[must_use]
    pub fn market_open(open: bool) -> Self {
        Self::new(open, |open, _order| *open)
    }
}

impl ThresholdFilter<Price> {
    /// Passes a stop-buy order once the market price has risen to its stop
    /// price. Orders without a stop price always pass.
    #[must_use]
    pub fn stop_buy(market_price: Price) -> Self {
        Self::new(market_price, |price, order| {
            order.stop_price().is_none_or(|stop| stop <= *price)
        })
    }

    /// Passes a stop-sell order once the market price has fallen to its stop
    /// price. Orders without a stop price always pass.
    #[must_use]
    pub fn stop_sell(market_price: Price) -> Self {
        Self::new(market_price, |price, order| {
            order.stop_price().is_none_or(|stop| stop >= *price)
        })
    }
}

impl<T: Send + Sync + 'static> DispatchFilter for ThresholdFilter<T> {
    fn check(&self, order: &Order) -> bool {
        let threshold = self.threshold.read().unwrap_or_else(PoisonError::into_inner);
        (self.predicate)(&threshold, order)
    }

    fn bind(&self, trigger: DispatchTrigger) {
        *self.trigger.lock().unwrap_or_else(PoisonError::into_inner) = Some(trigger);
    }
}

impl<T: fmt::Debug> fmt::Debug for ThresholdFilter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThresholdFilter")
            .field("threshold", &self.threshold)
            .finish_non_exhaustive()
    }
}
