//! Nib Core
//!
//! This crate provides the reactive cell ("nib"): a mutable value whose reads
//! are tracked so that derived cells recompute exactly when something they
//! read changes, with no manual subscription wiring.
//!
//! It implements:
//!
//! - Plain and derived cells with dynamic dependency tracking
//! - Same-value write suppression
//! - One-shot change listeners with detach handles
//! - An asynchronous stream of a cell's values
//!
//! # Architecture
//!
//! Everything lives in the `reactive` module; the most used items are
//! re-exported here.
//!
//! # Example
//!
//! ```rust
//! use nib_core::{cell, derived, read, write};
//!
//! let first = cell("foo".to_string());
//! let second = cell("bar".to_string());
//!
//! let (a, b) = (first.clone(), second.clone());
//! let both = derived(move |get| get.read(&a) + &get.read(&b));
//! assert_eq!(read(&both), "foobar");
//!
//! write(&first, "baz".to_string());
//! assert_eq!(read(&both), "bazbar");
//! ```

pub mod reactive;

pub use reactive::{cell, derived, read, write, Cell, Changes, Detach, Get};
