//! Cell Implementation
//!
//! A [`Cell`] holds a value of type `T`. It is either *plain*, holding
//! whatever was last written to it, or *derived*, holding the result of a
//! computation over other cells.
//!
//! # How Cells Work
//!
//! 1. A derived cell runs its computation once during construction. Every
//!    cell read through the [`Get`] capability subscribes the derived cell to
//!    that cell's next change.
//!
//! 2. Writing a value that is same-value equal to the
//!    current one does nothing. Otherwise the value is stored, the listener
//!    set is swapped for an empty one, and every listener from the old set
//!    runs with the new value.
//!
//! 3. A notified derived cell detaches from everything it read last time,
//!    runs its computation again and writes the result to itself through the
//!    same write path, which carries the change on to its own listeners.
//!
//! Propagation is synchronous and depth-first: `set` returns only after every
//! transitively dependent cell has recomputed.
//!
//! # Ownership
//!
//! A computation owns clones of the cells it reads, and a registration sitting
//! in a dependency's listener set owns the derived cell it recomputes. A
//! derived cell nobody holds keeps recomputing for as long as one of its
//! dependencies lives and it stays registered there. It is freed once every
//! registration pointing at it has been detached, or fired without the cell
//! registering again. A graph whose handles are all dropped and whose cells
//! never change again is not reclaimed.
//!
//! # Errors
//!
//! There are none to report. A computation that panics unwinds out of the
//! constructor or the `set` that triggered it, leaving the cell's value as it
//! was and its listeners un-notified. Cyclic dependencies are not detected and
//! recurse until the stack overflows.

use std::cell::RefCell;
use std::fmt::{self, Debug};
use std::rc::{Rc, Weak};

use tracing::trace;

use super::changes::Changes;
use super::listener::{Detach, Listener, ListenerId, ListenerSet, Notifier};
use super::same_value::same_value;
use super::tracker::{Dependencies, Get, Recompute, Target};

type Computation<T> = Box<dyn Fn(&Get<'_>) -> T>;

struct Inner<T> {
    /// Weak self-reference, handed out to detach handles and upgraded for
    /// each recomputation pass.
    this: Weak<Inner<T>>,

    value: RefCell<T>,

    listeners: RefCell<ListenerSet<T>>,

    /// Key under which this cell registers on its dependencies.
    listener: ListenerId,

    /// Present only for derived cells.
    compute: Option<Computation<T>>,

    /// Detach handles from the last computation pass.
    dependencies: RefCell<Dependencies>,
}

impl<T> Inner<T>
where
    T: Clone + PartialEq + 'static,
{
    fn assign(&self, value: T) {
        if same_value(&*self.value.borrow(), &value) {
            trace!(listener = ?self.listener, "write suppressed, value unchanged");
            return;
        }

        *self.value.borrow_mut() = value;

        let pending = self.listeners.borrow_mut().take();
        if pending.is_empty() {
            return;
        }

        trace!(listener = ?self.listener, count = pending.len(), "notifying listeners");

        // Listeners may write this cell again, so none of its borrows can be
        // held while they run.
        let current = self.value.borrow().clone();
        pending.notify(&current);
    }
}

impl<T> Recompute for Inner<T>
where
    T: Clone + PartialEq + 'static,
{
    fn recompute(&self) {
        let Some(compute) = self.compute.as_ref() else {
            return;
        };
        let Some(this) = self.this.upgrade() else {
            return;
        };

        let stale = std::mem::take(&mut *self.dependencies.borrow_mut());
        trace!(listener = ?self.listener, detached = stale.len(), "recomputing derived cell");
        for detach in stale {
            detach.detach();
        }

        let target = Rc::new(Target::bound(this));
        let value = compute(&Get::new(self.listener, target, &self.dependencies));
        self.assign(value);
    }
}

impl<T> Notifier for Inner<T> {
    fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.borrow_mut().remove(id)
    }
}

/// A reactive cell holding a value of type `T`.
///
/// Cloning a `Cell` clones the handle; both clones are the same cell.
/// Equality is identity.
///
/// # Example
///
/// ```rust
/// use nib_core::reactive::Cell;
///
/// let word = Cell::new("foo".to_string());
/// let len = word.map(|w| w.len());
/// let source = word.clone();
/// let caps = Cell::derive(move |get| get.read(&source).to_uppercase());
///
/// word.set("bing".to_string());
/// assert_eq!(len.get(), 4);
/// assert_eq!(caps.get(), "BING");
/// ```
pub struct Cell<T> {
    inner: Rc<Inner<T>>,
}

impl<T> Cell<T>
where
    T: Clone + PartialEq + 'static,
{
    /// Create a plain cell holding `value`.
    pub fn new(value: T) -> Self {
        let inner = Rc::new_cyclic(|this| Inner {
            this: this.clone(),
            value: RefCell::new(value),
            listeners: RefCell::new(ListenerSet::new()),
            listener: ListenerId::new(),
            compute: None,
            dependencies: RefCell::new(Dependencies::new()),
        });
        Self { inner }
    }

    /// Create a derived cell.
    ///
    /// `compute` runs once before this returns, and again whenever a cell it
    /// read on its latest run changes. If something it read already changed
    /// during that first run, it runs a second time before returning.
    pub fn derive<F>(compute: F) -> Self
    where
        F: Fn(&Get<'_>) -> T + 'static,
    {
        let target = Rc::new(Target::unbound());
        let inner = Rc::new_cyclic(|this: &Weak<Inner<T>>| {
            let listener = ListenerId::new();
            let dependencies = RefCell::new(Dependencies::new());
            let value = compute(&Get::new(listener, target.clone(), &dependencies));
            trace!(?listener, tracked = dependencies.borrow().len(), "derived cell created");

            Inner {
                this: this.clone(),
                value: RefCell::new(value),
                listeners: RefCell::new(ListenerSet::new()),
                listener,
                compute: Some(Box::new(compute)),
                dependencies,
            }
        });

        if target.bind(inner.clone()) {
            trace!(listener = ?inner.listener, "dependency changed during first pass");
            inner.recompute();
        }
        Self { inner }
    }

    /// Get a clone of the current value.
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Borrow the current value.
    ///
    /// `f` must not write this cell.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Write a new value and notify listeners if it changed.
    pub fn set(&self, value: T) {
        self.inner.assign(value);
    }

    /// Write `f(current)` through [`set`](Self::set).
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        let next = self.with(f);
        self.set(next);
    }

    /// Run `f` with the new value on this cell's next change.
    ///
    /// The registration is one-shot; call again from inside `f` to keep
    /// listening. The returned handle removes it early.
    pub fn on_next<F>(&self, f: F) -> Detach
    where
        F: FnOnce(&T) + 'static,
    {
        self.listen(ListenerId::new(), Box::new(f))
    }

    /// Derive a cell holding `f` applied to this cell's value.
    pub fn map<B, F>(&self, f: F) -> Cell<B>
    where
        B: Clone + PartialEq + 'static,
        F: Fn(&T) -> B + 'static,
    {
        let source = self.clone();
        Cell::derive(move |get| f(&get.read(&source)))
    }

    /// Stream of this cell's values: the current one, then one per change.
    pub fn changes(&self) -> Changes<T> {
        Changes::new(self.clone())
    }

    /// Same as [`read`](crate::read).
    pub fn read(cell: &Cell<T>) -> T {
        super::access::read(cell)
    }

    /// Same as [`write`](crate::write).
    pub fn write(cell: &Cell<T>, value: T) {
        super::access::write(cell, value)
    }

    pub(crate) fn listen(&self, id: ListenerId, listener: Listener<T>) -> Detach {
        self.inner.listeners.borrow_mut().insert(id, listener);
        let source: Weak<dyn Notifier> = self.inner.this.clone();
        Detach::new(source, id)
    }
}

impl<T> Cell<T> {
    /// Whether this cell was built from a computation.
    pub fn is_derived(&self) -> bool {
        self.inner.compute.is_some()
    }

    /// Number of registrations waiting for the next change.
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    /// Number of dependency reads recorded on the latest computation pass.
    pub fn dependency_count(&self) -> usize {
        self.inner.dependencies.borrow().len()
    }

    /// Whether both handles point at the same cell.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T> Clone for Cell<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> PartialEq for Cell<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<T> Eq for Cell<T> {}

impl<T> Debug for Cell<T>
where
    T: Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cell")
            .field("value", &*self.inner.value.borrow())
            .field("derived", &self.is_derived())
            .field("listener_count", &self.listener_count())
            .field("dependency_count", &self.dependency_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
