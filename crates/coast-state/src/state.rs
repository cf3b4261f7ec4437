//! # Managed States
//!
//! Every name a [`StateManager`](crate::StateManager) answers to is a
//! [`ManagedState`]. There are four kinds:
//!
//! | kind          | origin                                    | matches when                         |
//! |---------------|-------------------------------------------|--------------------------------------|
//! | `Direct`      | enumeration member                        | value equals the member value        |
//! | `Grouped`     | enumeration group                         | value is in the group's value set    |
//! | `Conditional` | `conditional_state` on a direct/grouped   | base matches and the validator holds |
//! | `Group`       | `state_group` over managed states         | any member matches                   |
//!
//! Only `Direct` states can be transition targets. Conditional states are
//! evaluated against the entity, so they can be sources but never targets.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use coast_core::{Label, StateValue};

use crate::filter::Filter;

/// Instance-level condition of a conditional state.
pub type Validator<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

/// The values a direct or grouped state covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSet<V> {
    One(V),
    Many(BTreeSet<V>),
}

impl<V: StateValue> ValueSet<V> {
    pub fn contains(&self, value: &V) -> bool {
        match self {
            Self::One(v) => v == value,
            Self::Many(vs) => vs.contains(value),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = V> + '_ {
        let (one, many) = match self {
            Self::One(v) => (Some(*v), None),
            Self::Many(vs) => (None, Some(vs.iter().copied())),
        };
        one.into_iter().chain(many.into_iter().flatten())
    }

    /// `column = v` or `column IN (...)`.
    pub(crate) fn filter(&self, column: &str) -> Filter<V> {
        match self {
            Self::One(v) => Filter::Eq {
                column: column.to_string(),
                value: *v,
            },
            Self::Many(vs) => Filter::In {
                column: column.to_string(),
                values: vs.iter().copied().collect(),
            },
        }
    }

    pub(crate) fn overlaps(&self, other: &BTreeSet<V>) -> bool {
        self.iter().any(|v| other.contains(&v))
    }
}

/// What a managed state matches.
pub enum StateKind<E, V> {
    /// A single enumeration member.
    Direct(V),
    /// A group of values declared on the enumeration.
    Grouped(BTreeSet<V>),
    /// A direct or grouped state narrowed by a condition on the entity.
    Conditional {
        base: ValueSet<V>,
        validator: Validator<E>,
        /// Class-level counterpart of `validator`, used when building
        /// storage filters.
        class_filter: Option<Filter<V>>,
    },
    /// Managed states grouped by name. Never contains another `Group`.
    Group(Vec<String>),
}

/// A named state registered on a state manager.
pub struct ManagedState<E, V> {
    pub(crate) name: String,
    pub(crate) label: Option<Label>,
    pub(crate) kind: StateKind<E, V>,
}

impl<E, V: StateValue> ManagedState<E, V> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> Option<&Label> {
        self.label.as_ref()
    }

    pub fn kind(&self) -> &StateKind<E, V> {
        &self.kind
    }

    /// The member value of a direct state.
    pub fn value(&self) -> Option<V> {
        match self.kind {
            StateKind::Direct(v) => Some(v),
            _ => None,
        }
    }

    /// A single enumeration value with no condition.
    pub fn is_direct(&self) -> bool {
        matches!(self.kind, StateKind::Direct(_))
    }

    pub fn is_conditional(&self) -> bool {
        matches!(self.kind, StateKind::Conditional { .. })
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, StateKind::Group(_))
    }

    /// A single value, with or without a condition.
    pub fn is_scalar(&self) -> bool {
        match &self.kind {
            StateKind::Direct(_) => true,
            StateKind::Conditional { base, .. } => matches!(base, ValueSet::One(_)),
            StateKind::Grouped(_) | StateKind::Group(_) => false,
        }
    }

    /// Values covered by this state, ignoring conditions. `None` for
    /// managed groups, whose values live in their members.
    pub(crate) fn values(&self) -> Option<ValueSet<V>> {
        match &self.kind {
            StateKind::Direct(v) => Some(ValueSet::One(*v)),
            StateKind::Grouped(vs) => Some(ValueSet::Many(vs.clone())),
            StateKind::Conditional { base, .. } => Some(base.clone()),
            StateKind::Group(_) => None,
        }
    }

    /// Whether `value` (and, for conditional states, `entity`) matches.
    /// Managed groups are resolved by the manager.
    pub(crate) fn matches_scalar(&self, value: &V, entity: &E) -> bool {
        match &self.kind {
            StateKind::Direct(v) => v == value,
            StateKind::Grouped(vs) => vs.contains(value),
            StateKind::Conditional {
                base, validator, ..
            } => base.contains(value) && validator(entity),
            StateKind::Group(_) => false,
        }
    }
}

impl<E, V: fmt::Debug> fmt::Debug for ManagedState<E, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.kind {
            StateKind::Direct(v) => format!("Direct({v:?})"),
            StateKind::Grouped(vs) => format!("Grouped({vs:?})"),
            StateKind::Conditional {
                base, class_filter, ..
            } => format!(
                "Conditional({base:?}, class_filter: {})",
                class_filter.is_some()
            ),
            StateKind::Group(members) => format!("Group({members:?})"),
        };
        f.debug_struct("ManagedState")
            .field("name", &self.name)
            .field("label", &self.label)
            .field("kind", &kind)
            .finish()
    }
}
