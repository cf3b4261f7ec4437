//! # State Values
//!
//! The value domain of a state column.

use std::fmt::Debug;
use std::hash::Hash;

/// A value that can be stored in a state column.
///
/// Blanket-implemented for every type meeting the bounds, so integer
/// columns (`i16`, `i32`, `u8`, ...) and fieldless enums deriving
/// `Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug` work
/// without further ceremony. `Ord` keeps value sets deterministic.
pub trait StateValue: Copy + Eq + Ord + Hash + Debug + Send + Sync + 'static {}

impl<T> StateValue for T where T: Copy + Eq + Ord + Hash + Debug + Send + Sync + 'static {}
