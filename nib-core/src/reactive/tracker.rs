//! Read Tracking
//!
//! A derived cell's computation receives a [`Get`], the read capability for
//! one recomputation pass. Reading a cell through it returns the cell's value
//! and subscribes the derived cell to that cell's next change.
//!
//! # Implementation
//!
//! Each read registers the derived cell's recompute hook on the dependency
//! under the derived cell's own [`ListenerId`] and pushes the returned
//! [`Detach`] handle onto the derived cell's dependency list. The next pass
//! drains that list and detaches everything before running the computation
//! again, so the dependency set is rebuilt from whatever is actually read.
//!
//! Handles are pushed as soon as each read happens. A computation that panics
//! halfway leaves the registrations made so far in place; the next successful
//! pass detaches them like any other.
//!
//! Registrations point at the derived cell through a per-pass [`Target`],
//! which holds it strongly: a dependency keeps its dependents alive for as
//! long as they are registered on it. During a derived cell's first pass the
//! cell does not exist yet, so the target starts unbound. A registration that
//! fires before it is bound is remembered, and the constructor recomputes
//! once the cell is built.

use std::cell::{Cell as Flag, RefCell};
use std::fmt;
use std::rc::Rc;

use smallvec::SmallVec;
use tracing::trace;

use super::cell::Cell;
use super::listener::{Detach, ListenerId};

/// Detach handles for the dependencies read during the last pass.
pub(crate) type Dependencies = SmallVec<[Detach; 4]>;

/// A derived cell, seen from the cells it depends on.
pub(crate) trait Recompute {
    fn recompute(&self);
}

/// The derived cell that registrations from one pass will recompute.
pub(crate) struct Target {
    cell: RefCell<Option<Rc<dyn Recompute>>>,
    missed: Flag<bool>,
}

impl Target {
    pub(crate) fn bound(cell: Rc<dyn Recompute>) -> Self {
        Self {
            cell: RefCell::new(Some(cell)),
            missed: Flag::new(false),
        }
    }

    pub(crate) fn unbound() -> Self {
        Self {
            cell: RefCell::new(None),
            missed: Flag::new(false),
        }
    }

    /// Bind the finished cell. Returns whether a registration fired before.
    pub(crate) fn bind(&self, cell: Rc<dyn Recompute>) -> bool {
        *self.cell.borrow_mut() = Some(cell);
        self.missed.replace(false)
    }

    fn fire(&self) {
        let cell = self.cell.borrow().clone();
        match cell {
            Some(cell) => cell.recompute(),
            None => self.missed.set(true),
        }
    }
}

/// The read capability handed to a derived cell's computation.
pub struct Get<'a> {
    listener: ListenerId,
    target: Rc<Target>,
    dependencies: &'a RefCell<Dependencies>,
}

impl<'a> Get<'a> {
    pub(crate) fn new(
        listener: ListenerId,
        target: Rc<Target>,
        dependencies: &'a RefCell<Dependencies>,
    ) -> Self {
        Self {
            listener,
            target,
            dependencies,
        }
    }

    /// Read `dep`'s current value and subscribe to its next change.
    pub fn read<U>(&self, dep: &Cell<U>) -> U
    where
        U: Clone + PartialEq + 'static,
    {
        self.track(dep);
        dep.get()
    }

    /// Borrow `dep`'s current value and subscribe to its next change.
    ///
    /// `f` must not write `dep`.
    pub fn with<U, R>(&self, dep: &Cell<U>, f: impl FnOnce(&U) -> R) -> R
    where
        U: Clone + PartialEq + 'static,
    {
        self.track(dep);
        dep.with(f)
    }

    fn track<U>(&self, dep: &Cell<U>)
    where
        U: Clone + PartialEq + 'static,
    {
        let target = self.target.clone();
        let detach = dep.listen(self.listener, Box::new(move |_: &U| target.fire()));
        trace!(listener = ?self.listener, "tracked dependency read");
        self.dependencies.borrow_mut().push(detach);
    }
}

impl fmt::Debug for Get<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Get")
            .field("listener", &self.listener)
            .field("tracked", &self.dependencies.borrow().len())
            .finish()
    }
}
