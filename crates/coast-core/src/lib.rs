//! # coast-core — Foundational Types for coast
//!
//! Leaf crate of the coast workspace. It defines the value domain that state
//! managers operate over and the enumeration those values are declared in.
//! Every other crate in the workspace depends on `coast-core`; it depends on
//! nothing internal.
//!
//! ## Key Types
//!
//! 1. **`StateValue`.** The bound every state value satisfies. Integers and
//!    fieldless Rust enums both qualify through a blanket implementation.
//!
//! 2. **`Label` / `NameTitle`.** Human-readable labels attached to values,
//!    either plain text or a machine name paired with a display title.
//!
//! 3. **`LabeledEnum`.** An ordered registry of named values with labels,
//!    plus named groups of values for membership tests. Construction
//!    rejects duplicate names, duplicate values, and groups that reference
//!    undefined values.
//!
//! 4. **`EnumDefinition`.** The serde form of a `LabeledEnum`, loadable
//!    from YAML or JSON.
//!
//! 5. **`Timestamp`.** UTC-only timestamps with millisecond precision.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `coast-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod label;
pub mod labeled;
pub mod temporal;
pub mod value;

// Re-export primary types for ergonomic imports.
pub use error::{CoastError, EnumError};
pub use label::{Label, NameTitle};
pub use labeled::{EnumDefinition, EnumMember, LabeledEnum, LabeledEnumBuilder};
pub use temporal::Timestamp;
pub use value::StateValue;
