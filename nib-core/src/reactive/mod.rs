//! Reactive Primitives
//!
//! This module implements the reactive cell: a value container whose reads
//! are tracked so that derived cells recompute when what they read changes.
//!
//! # Concepts
//!
//! ## Plain cells
//!
//! A plain [`Cell`] holds whatever was last written to it. Writing a value
//! that differs from the current one notifies the cell's listeners.
//!
//! ## Derived cells
//!
//! A derived cell is built from a computation that receives a [`Get`]
//! capability. Each cell read through `Get` becomes a dependency. When a
//! dependency changes, the derived cell recomputes and writes the result to
//! itself, which notifies its own listeners in turn.
//!
//! Dependencies are rebuilt from scratch on every pass, so a computation that
//! branches only depends on the cells its latest run actually read.
//!
//! ## Listeners
//!
//! Listeners are one-shot callbacks waiting for a cell's next change. A cell
//! takes its listener set out before running them, so a listener that
//! re-registers lands in the fresh set and is not called twice for the same
//! change.
//!
//! ## Streams
//!
//! [`Cell::changes`] turns a cell into an endless [`Stream`](futures_util::Stream)
//! of its values.
//!
//! # Implementation Notes
//!
//! Everything is single-threaded. Cells are `Rc` handles with `RefCell`
//! state and are not `Send`. A write propagates synchronously and depth-first
//! and returns once every dependent has settled.

mod access;
mod cell;
mod changes;
mod listener;
mod same_value;
mod tracker;

pub use access::{cell, derived, read, write};
pub use cell::Cell;
pub use changes::Changes;
pub use listener::{Detach, Listener, ListenerId, ListenerSet};
pub use same_value::same_value;
pub use tracker::Get;
