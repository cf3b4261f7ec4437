//! # State Manager Errors
//!
//! Three families, split by when they surface:
//!
//! - [`ConfigError`]: declaration time. Fatal; a manager that fails to
//!   declare must not be used.
//! - [`TransitionError`]: invocation time. `NotPermitted` and
//!   `GuardRejected` are ordinary control flow for the caller (reject the
//!   user action); `Callback` carries the callback's own error unchanged.
//! - [`QueryError`]: lookups and filter building against names or values
//!   the manager does not know.
//!
//! Every variant names the manager it came from. Values appear in their
//! `Debug` rendering so error types stay free of type parameters.

use thiserror::Error;

use coast_core::{CoastError, EnumError};

/// Rejected state manager declaration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The state enumeration is invalid.
    #[error("invalid state enumeration: {0}")]
    Enum(#[from] EnumError),

    /// A declarative definition could not be parsed or built.
    #[error("invalid definition: {0}")]
    Definition(#[from] CoastError),

    /// A state or group name is already taken.
    #[error("{manager}: state name {name:?} is already declared")]
    NameConflict {
        manager: String,
        name: String,
    },

    /// A referenced state or group does not exist.
    #[error("{manager}: unknown state {name:?}")]
    UnknownState {
        manager: String,
        name: String,
    },

    /// A referenced value is not a member of the enumeration.
    #[error("{manager}: value {value} is not a declared state")]
    UnknownValue {
        manager: String,
        value: String,
    },

    /// A conditional state was based on a group or another conditional state.
    #[error("{manager}: conditional state {name:?} must be based on a direct or grouped state, not {base:?}")]
    InvalidConditionalBase {
        manager: String,
        name: String,
        base: String,
    },

    /// A state group listed another managed group.
    #[error("{manager}: group {group:?} cannot contain group {member:?}")]
    NestedGroup {
        manager: String,
        group: String,
        member: String,
    },

    /// A conditional member shares values with another member of its group,
    /// so its condition would never be tested.
    #[error("{manager}: values of {state:?} are already in group {group:?}")]
    ConditionalOverlap {
        manager: String,
        group: String,
        state: String,
    },

    /// A group was declared without members.
    #[error("{manager}: group {group:?} has no members")]
    EmptyGroup {
        manager: String,
        group: String,
    },

    /// A transition target is not a single direct state.
    #[error("{manager}: transition {transition:?} must target a direct state, not {target:?}")]
    InvalidTarget {
        manager: String,
        transition: String,
        target: String,
    },

    /// A transition declared no source states.
    #[error("{manager}: transition {transition:?} has no source states")]
    NoSources {
        manager: String,
        transition: String,
    },

    /// A transition name was declared twice.
    #[error("{manager}: transition {transition:?} is already declared")]
    DuplicateTransition {
        manager: String,
        transition: String,
    },

    /// Transition metadata used a reserved key.
    #[error("{manager}: transition {transition:?} uses reserved data key {key:?}")]
    ReservedDataKey {
        manager: String,
        transition: String,
        key: String,
    },

    /// A hook was attached to a transition that does not exist.
    #[error("{manager}: unknown transition {transition:?}")]
    UnknownTransition {
        manager: String,
        transition: String,
    },
}

/// Failed transition invocation.
#[derive(Error, Debug)]
pub enum TransitionError {
    /// The current state is not a source state of the transition.
    /// No mutation happened and no callback ran.
    #[error("{manager}: transition {transition:?} is not permitted from state {current}")]
    NotPermitted {
        manager: String,
        transition: String,
        /// Current state: its label title if it has one, else its value.
        current: String,
    },

    /// The guard returned `false`. No mutation happened and no callback ran.
    #[error("{manager}: guard rejected transition {transition:?}")]
    GuardRejected {
        manager: String,
        transition: String,
    },

    /// The post-transition callback failed. The state value was already
    /// changed and is not rolled back.
    #[error("{manager}: callback for transition {transition:?} failed: {source}")]
    Callback {
        manager: String,
        transition: String,
        #[source]
        source: anyhow::Error,
    },

    /// No transition with this name is declared.
    #[error("{manager}: unknown transition {transition:?}")]
    UnknownTransition {
        manager: String,
        transition: String,
    },
}

impl TransitionError {
    /// The transition this error concerns.
    pub fn transition(&self) -> &str {
        match self {
            Self::NotPermitted { transition, .. }
            | Self::GuardRejected { transition, .. }
            | Self::Callback { transition, .. }
            | Self::UnknownTransition { transition, .. } => transition,
        }
    }

    /// Whether the caller should treat this as a rejected action rather
    /// than a failure: the entity is untouched.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::NotPermitted { .. } | Self::GuardRejected { .. })
    }

    /// Recover the callback's original error.
    pub fn into_callback_error(self) -> Result<anyhow::Error, Self> {
        match self {
            Self::Callback { source, .. } => Ok(source),
            other => Err(other),
        }
    }
}

/// Failed state lookup or filter construction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// No state or group with this name.
    #[error("{manager}: unknown state {name:?}")]
    UnknownState {
        manager: String,
        name: String,
    },

    /// The entity holds a value that is not a declared state.
    #[error("{manager}: value {value} is not a declared state")]
    UnknownValue {
        manager: String,
        value: String,
    },

    /// A conditional state has no class-level filter, so it cannot be
    /// expressed as a storage predicate.
    #[error("{manager}: conditional state {state:?} has no class filter")]
    NoClassFilter {
        manager: String,
        state: String,
    },

    /// No transition with this name is declared.
    #[error("{manager}: unknown transition {transition:?}")]
    UnknownTransition {
        manager: String,
        transition: String,
    },
}
