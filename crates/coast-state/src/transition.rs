//! # Transitions
//!
//! A transition is a named edge: a set of permitted source states, one
//! direct target state, an optional guard and an optional post-transition
//! callback.
//!
//! ```text
//! current ∈ sources? ──no──▶ NotPermitted      (no mutation, no callback)
//!        │yes
//! guard(entity, args)? ──no──▶ GuardRejected   (no mutation, no callback)
//!        │yes
//! field := target
//!        │
//! callback(entity, args) ──err──▶ Callback     (mutation kept)
//!        │ok
//! TransitionRecord
//! ```
//!
//! A transition without a target is a *requirement*: it gates an action on
//! the current state but leaves the state unchanged.
//!
//! Transitions are declared with [`TransitionDef`] and resolved against the
//! manager's states when registered, so every declaration error surfaces
//! before the manager exists.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use coast_core::{StateValue, Timestamp};

/// Guard predicate. Must return `true` for the transition to proceed.
pub type Guard<E> = Arc<dyn Fn(&E, &TransitionArgs) -> bool + Send + Sync>;

/// Post-transition callback, run after the state value has changed.
pub type Callback<E> = Arc<dyn Fn(&mut E, &TransitionArgs) -> anyhow::Result<()> + Send + Sync>;

/// Metadata key that always holds the transition name.
pub const NAME_KEY: &str = "name";

// ─── Arguments ───────────────────────────────────────────────────────

/// Caller-supplied arguments handed to guards and callbacks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransitionArgs(serde_json::Map<String, Value>);

impl TransitionArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an argument, builder style.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Value::as_bool)
    }

    /// Deserialize an argument into `T`. `None` if absent or mistyped.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.0
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ─── Records ─────────────────────────────────────────────────────────

/// Record of a completed transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord<V> {
    /// Transition name.
    pub transition: String,
    /// State value before the transition.
    pub from: V,
    /// State value after the transition; equal to `from` for requirements.
    pub to: V,
    /// When the state value changed.
    pub at: Timestamp,
}

impl<V: StateValue> TransitionRecord<V> {
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}

// ─── Declaration ─────────────────────────────────────────────────────

/// A reference to a state by name, or to an enumeration member by value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateRef<V> {
    Name(String),
    Value(V),
}

impl<V: fmt::Debug> fmt::Display for StateRef<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Value(v) => write!(f, "{v:?}"),
        }
    }
}

/// Sources of a transition declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sources<V> {
    /// Any current state is acceptable.
    Any,
    /// Only these states.
    Only(Vec<StateRef<V>>),
}

/// Declaration of a transition, resolved when registered on a manager.
pub struct TransitionDef<E, V> {
    pub(crate) name: String,
    pub(crate) sources: Sources<V>,
    pub(crate) target: Option<StateRef<V>>,
    pub(crate) guard: Option<Guard<E>>,
    pub(crate) callback: Option<Callback<E>>,
    pub(crate) data: BTreeMap<String, Value>,
}

impl<E, V> TransitionDef<E, V> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sources: Sources::Only(Vec::new()),
            target: None,
            guard: None,
            callback: None,
            data: BTreeMap::new(),
        }
    }

    /// Permit the transition from a state or group, by name.
    pub fn from(self, state: impl Into<String>) -> Self {
        self.push_source(StateRef::Name(state.into()))
    }

    /// Permit the transition from several states or groups.
    pub fn from_each<S: Into<String>>(mut self, states: impl IntoIterator<Item = S>) -> Self {
        for state in states {
            self = self.from(state);
        }
        self
    }

    /// Permit the transition from an enumeration value.
    pub fn from_value(self, value: V) -> Self {
        self.push_source(StateRef::Value(value))
    }

    /// Permit the transition from any state.
    pub fn from_any(mut self) -> Self {
        self.sources = Sources::Any;
        self
    }

    /// Target state, by name. Must be a direct state.
    pub fn to(mut self, state: impl Into<String>) -> Self {
        self.target = Some(StateRef::Name(state.into()));
        self
    }

    /// Target state, by enumeration value.
    pub fn to_value(mut self, value: V) -> Self {
        self.target = Some(StateRef::Value(value));
        self
    }

    pub fn guard(
        mut self,
        guard: impl Fn(&E, &TransitionArgs) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.guard = Some(Arc::new(guard));
        self
    }

    pub fn callback(
        mut self,
        callback: impl Fn(&mut E, &TransitionArgs) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.callback = Some(Arc::new(callback));
        self
    }

    /// Attach metadata, e.g. a display title. The `name` key is reserved.
    pub fn data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    fn push_source(mut self, source: StateRef<V>) -> Self {
        // An explicit source list narrows a previous `from_any()`.
        if matches!(self.sources, Sources::Any) {
            self.sources = Sources::Only(Vec::new());
        }
        if let Sources::Only(refs) = &mut self.sources {
            refs.push(source);
        }
        self
    }
}

// ─── Resolved Transition ─────────────────────────────────────────────

/// A transition registered on a manager.
pub struct Transition<E, V> {
    pub(crate) name: String,
    /// Permitted source values, each with every state that contributed
    /// it. `None` permits any state.
    pub(crate) sources: Option<BTreeMap<V, Vec<String>>>,
    pub(crate) target: Option<V>,
    pub(crate) guard: Option<Guard<E>>,
    pub(crate) callback: Option<Callback<E>>,
    pub(crate) data: BTreeMap<String, Value>,
}

impl<E, V: StateValue> Transition<E, V> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Permitted source values, or `None` if any state is permitted.
    pub fn source_values(&self) -> Option<Vec<V>> {
        self.sources.as_ref().map(|s| s.keys().copied().collect())
    }

    pub fn target(&self) -> Option<V> {
        self.target
    }

    /// A requirement gates on state without changing it.
    pub fn is_requirement(&self) -> bool {
        self.target.is_none()
    }

    pub fn has_guard(&self) -> bool {
        self.guard.is_some()
    }

    pub fn has_callback(&self) -> bool {
        self.callback.is_some()
    }

    /// Declared metadata; `data()["name"]` is always the transition name.
    pub fn data(&self) -> &BTreeMap<String, Value> {
        &self.data
    }

    /// Display title from metadata, if declared.
    pub fn title(&self) -> Option<&str> {
        self.data.get("title").and_then(Value::as_str)
    }
}

impl<E, V: fmt::Debug> fmt::Debug for Transition<E, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("name", &self.name)
            .field("sources", &self.sources)
            .field("target", &self.target)
            .field("guard", &self.guard.is_some())
            .field("callback", &self.callback.is_some())
            .field("data", &self.data)
            .finish()
    }
}
