//! Free-standing cell accessors.
//!
//! These pass straight through to [`Cell`]'s own methods. They exist so that
//! reading and writing can be handed around as plain function values, e.g.
//! `items.iter().map(read)`. The same pair is available as `Cell::read` and
//! `Cell::write`.

use super::cell::Cell;
use super::tracker::Get;

/// Create a plain cell.
pub fn cell<T>(value: T) -> Cell<T>
where
    T: Clone + PartialEq + 'static,
{
    Cell::new(value)
}

/// Create a derived cell. See [`Cell::derive`].
pub fn derived<T, F>(compute: F) -> Cell<T>
where
    T: Clone + PartialEq + 'static,
    F: Fn(&Get<'_>) -> T + 'static,
{
    Cell::derive(compute)
}

/// Current value of `cell`.
pub fn read<T>(cell: &Cell<T>) -> T
where
    T: Clone + PartialEq + 'static,
{
    cell.get()
}

/// Write `value` to `cell`.
pub fn write<T>(cell: &Cell<T>, value: T)
where
    T: Clone + PartialEq + 'static,
{
    cell.set(value)
}
