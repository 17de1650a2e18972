/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Filtered order dispatch.
//!
//! An [`OrderDispatchQueue`] keeps pending orders ranked by an
//! [`OrderRanking`] and releases them to an [`OrderProcessor`] only while a
//! [`DispatchFilter`] accepts the best-ranked one. It runs inside the
//! exchange's order-matching path and never touches the network.
//!
//! # Architecture
//!
//! - The ranked set and its id index sit behind one mutex per queue
//! - Enqueue and filter threshold changes fire a [`DispatchTrigger`]
//! - A single dispatch thread per queue drains eligible orders
//! - Triggers fired while a pass is pending are merged into it

pub mod core;
pub mod filter;
pub mod processor;
pub mod ranking;

#[cfg(test)]
mod tests;

pub use self::core::{DispatchError, OrderDispatchQueue};
pub use filter::{DispatchFilter, DispatchTrigger, ThresholdFilter};
pub use processor::OrderProcessor;
pub use ranking::{ByArrival, ByStopPriceAscending, ByStopPriceDescending, OrderRanking};
