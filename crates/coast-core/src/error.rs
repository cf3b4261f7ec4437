//! # Error Types
//!
//! Errors raised while declaring enumerations and parsing definitions.
//! All errors use `thiserror` for derive-based `Display` and `Error`
//! implementations.
//!
//! Values are carried in their `Debug` rendering so that error types stay
//! free of the value type parameter.

use thiserror::Error;

/// Top-level error type for `coast-core`.
#[derive(Error, Debug)]
pub enum CoastError {
    /// An enumeration declaration was rejected.
    #[error("enumeration error: {0}")]
    Enum(#[from] EnumError),

    /// A declarative definition document could not be parsed.
    #[error("definition parse error: {0}")]
    Parse(String),
}

impl From<serde_yaml::Error> for CoastError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Parse(e.to_string())
    }
}

impl From<serde_json::Error> for CoastError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e.to_string())
    }
}

/// Error in a labeled enumeration declaration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnumError {
    /// A symbol name was declared twice.
    #[error("symbol {name:?} is declared more than once")]
    DuplicateName {
        /// The repeated symbol.
        name: String,
    },

    /// Two distinct symbols share one value.
    #[error("value {value} is declared by both {first:?} and {second:?}")]
    DuplicateValue {
        /// The shared value, in `Debug` form.
        value: String,
        /// The symbol declared first.
        first: String,
        /// The symbol that repeated the value.
        second: String,
    },

    /// A group references a value or symbol that is not a member.
    #[error("group {group:?} references undefined member {member}")]
    UndefinedGroupMember {
        /// The group being declared.
        group: String,
        /// The unresolved value or symbol, in `Debug` form.
        member: String,
    },

    /// A group was declared without members.
    #[error("group {group:?} has no members")]
    EmptyGroup {
        /// The empty group.
        group: String,
    },

    /// A symbol name is empty or contains whitespace.
    #[error("invalid symbol name {name:?}")]
    InvalidName {
        /// The rejected symbol.
        name: String,
    },
}
