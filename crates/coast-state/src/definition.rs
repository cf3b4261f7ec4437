//! # Declarative Machine Definitions
//!
//! A [`MachineDefinition`] describes a state manager as data: the
//! enumeration, managed groups and transitions. Guards, callbacks and
//! conditional states are code and are attached to the returned builder.
//!
//! ```yaml
//! name: Post.state
//! column: state
//! states:
//!   members:
//!     - { name: DRAFT, value: 0, label: Draft }
//!     - { name: PUBLISHED, value: 1, label: Published }
//!     - { name: ARCHIVED, value: 2, label: Archived }
//!   groups:
//!     LIVE: [PUBLISHED]
//! state_groups:
//!   - { name: ALL_BUT_ARCHIVED, members: [DRAFT, PUBLISHED] }
//! transitions:
//!   - { name: publish, from: [DRAFT], to: PUBLISHED, data: { title: Publish } }
//!   - { name: archive, from: ["*"], to: ARCHIVED }
//!   - { name: edit, from: [ALL_BUT_ARCHIVED] }
//! ```
//!
//! `from: ["*"]` permits any source state. A transition without `to` is a
//! requirement.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use coast_core::{CoastError, EnumDefinition, StateValue};

use crate::error::ConfigError;
use crate::manager::{Getter, Setter, StateManager, StateManagerBuilder};
use crate::transition::TransitionDef;

/// Source wildcard permitting any state.
pub const ANY_STATE: &str = "*";

/// Serde form of a state manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MachineDefinition<V> {
    pub name: String,
    pub column: String,
    pub states: EnumDefinition<V>,
    /// Managed groups, in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub state_groups: Vec<GroupDefinition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transitions: Vec<TransitionDefinition>,
}

/// A managed group of declared states.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupDefinition {
    pub name: String,
    pub members: Vec<String>,
}

/// One transition or requirement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransitionDefinition {
    pub name: String,
    /// Source state or group names; `"*"` for any state.
    pub from: Vec<String>,
    /// Target direct state. Absent for requirements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, Value>,
}

impl<V: StateValue + DeserializeOwned> MachineDefinition<V> {
    pub fn from_yaml(source: &str) -> Result<Self, CoastError> {
        Ok(serde_yaml::from_str(source)?)
    }

    pub fn from_json(source: &str) -> Result<Self, CoastError> {
        Ok(serde_json::from_str(source)?)
    }
}

impl<V: StateValue> MachineDefinition<V> {
    /// Declare the enumeration, managed groups and transitions.
    pub fn into_builder<E>(
        self,
        get: Getter<E, V>,
        set: Setter<E, V>,
    ) -> Result<StateManagerBuilder<E, V>, ConfigError> {
        self.into_builder_with(get, set, Ok)
    }

    /// Like [`into_builder`](Self::into_builder), running `prepare` after the
    /// enumeration is declared and before the groups, so groups and
    /// transitions can reference conditional states declared in code.
    pub fn into_builder_with<E, F>(
        self,
        get: Getter<E, V>,
        set: Setter<E, V>,
        prepare: F,
    ) -> Result<StateManagerBuilder<E, V>, ConfigError>
    where
        F: FnOnce(StateManagerBuilder<E, V>) -> Result<StateManagerBuilder<E, V>, ConfigError>,
    {
        let lenum = self.states.build()?;
        let mut builder = prepare(StateManager::builder(self.name, self.column, lenum, get, set))?;

        for group in self.state_groups {
            builder = builder.state_group(group.name, group.members)?;
        }
        for transition in self.transitions {
            builder = builder.transition(transition.into_def())?;
        }
        Ok(builder)
    }
}

impl TransitionDefinition {
    fn into_def<E, V>(self) -> TransitionDef<E, V> {
        let mut def = TransitionDef::new(self.name);
        def = if self.from.iter().any(|s| s == ANY_STATE) {
            def.from_any()
        } else {
            def.from_each(self.from)
        };
        if let Some(to) = self.to {
            def = def.to(to);
        }
        for (key, value) in self.data {
            def = def.data(key, value);
        }
        def
    }
}
