//! Same-value equality used to suppress redundant writes.
//!
//! This is `PartialEq` with two corrections for floats: every NaN equals
//! every other NaN, and `0.0` differs from `-0.0`. Any other type compares
//! with its own `PartialEq`, so NaN nested inside a container still counts as
//! a change.

use std::any::Any;

/// Whether writing `b` over `a` counts as "no change".
pub fn same_value<T>(a: &T, b: &T) -> bool
where
    T: PartialEq + 'static,
{
    let (a_any, b_any) = (a as &dyn Any, b as &dyn Any);

    if let (Some(x), Some(y)) = (a_any.downcast_ref::<f64>(), b_any.downcast_ref::<f64>()) {
        return (x.is_nan() && y.is_nan()) || x.to_bits() == y.to_bits();
    }
    if let (Some(x), Some(y)) = (a_any.downcast_ref::<f32>(), b_any.downcast_ref::<f32>()) {
        return (x.is_nan() && y.is_nan()) || x.to_bits() == y.to_bits();
    }

    a == b
}
