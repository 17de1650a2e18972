/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Core order dispatch queue.
//!
//! Orders are held in rank order under a single mutex. Dispatch passes run
//! on one dedicated thread per queue and are woken through a capacity-one
//! channel, so triggers that arrive while a pass is pending collapse into
//! it and at most one pass runs at a time.

use super::filter::{DispatchFilter, DispatchTrigger};
use super::processor::OrderProcessor;
use super::ranking::OrderRanking;
use crate::order::{Order, OrderId};
use crossbeam::channel::{self, Receiver};
use std::collections::{BTreeMap, HashSet};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::thread::{self, JoinHandle};
use thiserror::Error;
use tracing::{debug, error, trace, warn};

/// Errors reported by [`OrderDispatchQueue`].
#[derive(Debug, Error)]
pub enum DispatchError {
    /// An order with this id is already queued.
    #[error("order {0} is already queued")]
    DuplicateOrder(OrderId),

    /// The queue has been closed.
    #[error("dispatch queue is closed")]
    Closed,

    /// The dispatch thread could not be started.
    #[error("failed to start dispatch worker: {0}")]
    Worker(#[from] std::io::Error),
}

struct QueueState<K> {
    orders: BTreeMap<(K, u64), Order>,
    ids: HashSet<OrderId>,
    next_seq: u64,
}

struct Shared<R: OrderRanking> {
    ranking: R,
    filter: Arc<dyn DispatchFilter>,
    state: Mutex<QueueState<R::Key>>,
    processor: RwLock<Option<Arc<dyn OrderProcessor>>>,
    closed: AtomicBool,
}

impl<R: OrderRanking> Shared<R> {
    fn lock_state(&self) -> MutexGuard<'_, QueueState<R::Key>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Removes the best-ranked order if the filter accepts it.
    fn dequeue(&self) -> Option<Order> {
        let mut state = self.lock_state();
        let eligible = state
            .orders
            .first_key_value()
            .is_some_and(|(_, order)| self.filter.check(order));
        if !eligible {
            return None;
        }
        let (_, order) = state.orders.pop_first()?;
        state.ids.remove(&order.id());
        Some(order)
    }

    fn run_pass(&self) -> usize {
        let mut dispatched = 0;
        while !self.closed.load(Ordering::Acquire) {
            let Some(order) = self.dequeue() else {
                break;
            };
            dispatched += 1;

            let processor = self
                .processor
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .clone();
            let Some(processor) = processor else {
                trace!(order_id = %order.id(), "no processor installed, order discarded");
                continue;
            };

            let order_id = order.id();
            if panic::catch_unwind(AssertUnwindSafe(|| processor.process(order))).is_err() {
                error!(%order_id, "order processor panicked");
            }
        }
        dispatched
    }
}

fn run_worker<R: OrderRanking>(shared: Arc<Shared<R>>, wake: Receiver<()>) {
    while wake.recv().is_ok() {
        if shared.closed.load(Ordering::Acquire) {
            break;
        }
        let dispatched = shared.run_pass();
        trace!(dispatched, "dispatch pass finished");
    }
    debug!("order dispatch worker stopped");
}

/// A ranked queue of pending orders that hands eligible orders to an
/// [`OrderProcessor`].
///
/// On every enqueue and every threshold change of its filter the queue runs
/// a dispatch pass: it repeatedly takes the best-ranked order while the
/// filter accepts it and passes it to the processor. Each order is delivered
/// at most once and only while the filter accepts it.
///
/// # Examples
///
/// ```
/// use exchange_net::dispatch::{ByStopPriceAscending, OrderDispatchQueue, ThresholdFilter};
/// use exchange_net::order::{Order, Side};
/// use std::sync::Arc;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let filter = Arc::new(ThresholdFilter::stop_buy(90));
/// let queue = OrderDispatchQueue::new(ByStopPriceAscending, filter.clone())?;
/// queue.set_order_processor(|order: Order| println!("execute {}", order.id()));
///
/// queue.enqueue(Order::stop(Side::Buy, "acct1", "IBM", 10, 100))?;
/// filter.set_threshold(100); // the order is dispatched
/// # Ok(())
/// # }
/// ```
pub struct OrderDispatchQueue<R: OrderRanking> {
    shared: Arc<Shared<R>>,
    trigger: DispatchTrigger,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl<R: OrderRanking> OrderDispatchQueue<R> {
    /// Creates a queue ranking orders with `ranking` and gated by `filter`.
    /// The filter is bound to this queue so its threshold changes trigger
    /// dispatch.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Worker`] if the dispatch thread cannot be
    /// spawned.
    pub fn new<F: DispatchFilter>(ranking: R, filter: Arc<F>) -> Result<Self, DispatchError> {
        let (wake_tx, wake_rx) = channel::bounded(1);
        let trigger = DispatchTrigger::new(wake_tx);

        let shared = Arc::new(Shared {
            ranking,
            filter: filter.clone(),
            state: Mutex::new(QueueState {
                orders: BTreeMap::new(),
                ids: HashSet::new(),
                next_seq: 0,
            }),
            processor: RwLock::new(None),
            closed: AtomicBool::new(false),
        });

        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name("order-dispatch".into())
            .spawn(move || run_worker(worker_shared, wake_rx))?;

        filter.bind(trigger.clone());

        Ok(Self {
            shared,
            trigger,
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Adds an order and triggers dispatch.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::DuplicateOrder`] if an order with the same id
    /// is already queued (the queue is left unchanged), or
    /// [`DispatchError::Closed`] after [`close`](Self::close).
    pub fn enqueue(&self, order: Order) -> Result<(), DispatchError> {
        if self.shared.closed.load(Ordering::Acquire) {
            return Err(DispatchError::Closed);
        }
        {
            let mut state = self.shared.lock_state();
            if !state.ids.insert(order.id()) {
                warn!(order_id = %order.id(), "duplicate order rejected");
                return Err(DispatchError::DuplicateOrder(order.id()));
            }
            let seq = state.next_seq;
            state.next_seq += 1;
            let key = self.shared.ranking.rank(&order);
            state.orders.insert((key, seq), order);
        }
        self.dispatch_orders();
        Ok(())
    }

    /// Removes and returns the best-ranked order if the filter currently
    /// accepts it; otherwise leaves the queue untouched.
    pub fn dequeue(&self) -> Option<Order> {
        self.shared.dequeue()
    }

    /// Schedules a dispatch pass. Returns immediately; the pass runs on the
    /// queue's dispatch thread.
    pub fn dispatch_orders(&self) {
        self.trigger.fire();
    }

    /// Installs the processor invoked for each dispatched order, replacing
    /// any previous one.
    pub fn set_order_processor<P: OrderProcessor>(&self, processor: P) {
        *self
            .shared
            .processor
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(processor));
    }

    /// Removes the processor; dispatched orders are discarded until a new
    /// one is installed.
    pub fn clear_order_processor(&self) {
        *self
            .shared
            .processor
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Returns a trigger that requests dispatch on this queue.
    #[must_use]
    pub fn trigger(&self) -> DispatchTrigger {
        self.trigger.clone()
    }

    /// Number of queued orders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.lock_state().orders.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if an order with `id` is queued.
    #[must_use]
    pub fn contains(&self, id: OrderId) -> bool {
        self.shared.lock_state().ids.contains(&id)
    }

    /// Snapshot of the queued orders in rank order.
    #[must_use]
    pub fn pending(&self) -> Vec<Order> {
        self.shared.lock_state().orders.values().cloned().collect()
    }

    /// Stops the dispatch thread. Queued orders stay in the queue; further
    /// enqueues fail with [`DispatchError::Closed`]. Calling it again has no
    /// effect.
    pub fn close(&self) {
        if self.shared.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.trigger.fire();

        let worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(worker) = worker {
            // a processor closing its own queue cannot wait for itself
            if worker.thread().id() != thread::current().id() && worker.join().is_err() {
                error!("order dispatch worker panicked");
            }
        }
        debug!("order dispatch queue closed");
    }
}

impl<R: OrderRanking> Drop for OrderDispatchQueue<R> {
    fn drop(&mut self) {
        self.close();
    }
}
