//! # State Manager
//!
//! A [`StateManager`] binds a finite-state machine to one field of an entity
//! type. It is declared once through [`StateManagerBuilder`] and immutable
//! afterwards; per-entity state lives in the entity's own field.
//!
//! ## Declaration
//!
//! ```text
//! LabeledEnum ──▶ builder ──▶ conditional states ──▶ state groups ──▶ transitions ──▶ build()
//! ```
//!
//! Each builder step validates immediately and returns `Result<Self, _>`, so
//! a declaration error halts setup at the offending line.
//!
//! ## Binding
//!
//! The manager holds no reference to any entity. [`StateManager::view()`]
//! and [`StateManager::handle()`] create short-lived handles pairing the
//! shared registry with one entity for queries and transitions.
//!
//! Assigning the field directly bypasses every check. That is permitted;
//! transitions are the validated path, not the only one.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use coast_core::{Label, LabeledEnum, StateValue, Timestamp};

use crate::bound::{StateHandle, StateView};
use crate::error::{ConfigError, QueryError, TransitionError};
use crate::filter::Filter;
use crate::observer::TransitionObserver;
use crate::state::{ManagedState, StateKind, ValueSet, Validator};
use crate::transition::{
    Callback, Guard, Sources, StateRef, Transition, TransitionArgs, TransitionDef,
    TransitionRecord, NAME_KEY,
};

/// Reads the state field of an entity.
pub type Getter<E, V> = fn(&E) -> V;

/// Writes the state field of an entity.
pub type Setter<E, V> = fn(&mut E, V);

// ─── Conditional State Declaration ───────────────────────────────────

/// Declaration of a conditional state: an existing direct or grouped state
/// narrowed by a condition on the entity.
pub struct ConditionalState<E, V> {
    name: String,
    base: String,
    validator: Validator<E>,
    class_filter: Option<Filter<V>>,
    label: Option<Label>,
}

impl<E, V> ConditionalState<E, V> {
    pub fn new(
        name: impl Into<String>,
        base: impl Into<String>,
        validator: impl Fn(&E) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            base: base.into(),
            validator: Arc::new(validator),
            class_filter: None,
            label: None,
        }
    }

    /// Storage-side equivalent of the validator, conjoined with the base
    /// state's filter when the state is queried at class level.
    pub fn class_filter(mut self, filter: Filter<V>) -> Self {
        self.class_filter = Some(filter);
        self
    }

    pub fn label(mut self, label: impl Into<Label>) -> Self {
        self.label = Some(label.into());
        self
    }
}

// ─── StateManager ────────────────────────────────────────────────────

/// An immutable state machine over one field of `E`.
///
/// `Send + Sync`: one instance can be shared read-only by every request.
pub struct StateManager<E, V: StateValue> {
    name: String,
    column: String,
    lenum: LabeledEnum<V>,
    states: Vec<ManagedState<E, V>>,
    state_index: HashMap<String, usize>,
    /// Scalar states per value, most recently declared first, so
    /// conditional states win over the direct state they narrow.
    scalars_by_value: HashMap<V, Vec<usize>>,
    transitions: Vec<Transition<E, V>>,
    transition_index: HashMap<String, usize>,
    get: Getter<E, V>,
    set: Setter<E, V>,
    observers: Vec<Arc<dyn TransitionObserver<E, V>>>,
}

impl<E, V: StateValue> StateManager<E, V> {
    /// Start declaring a manager.
    ///
    /// - `name`: identifies the manager in errors and logs, e.g. `"Post.state"`.
    /// - `column`: the storage column used in filters, e.g. `"state"`.
    /// - `lenum`: the valid values. Every member becomes a direct state and
    ///   every group a grouped state, under the same names.
    /// - `get` / `set`: field accessors.
    pub fn builder(
        name: impl Into<String>,
        column: impl Into<String>,
        lenum: LabeledEnum<V>,
        get: Getter<E, V>,
        set: Setter<E, V>,
    ) -> StateManagerBuilder<E, V> {
        let initial: Vec<ManagedState<E, V>> = lenum
            .members()
            .iter()
            .map(|member| ManagedState {
                name: member.name.clone(),
                label: member.label.clone(),
                kind: StateKind::Direct(member.value),
            })
            .chain(lenum.groups().map(|(group, values)| ManagedState {
                name: group.to_string(),
                label: None,
                kind: StateKind::Grouped(values.clone()),
            }))
            .collect();

        let mut manager = StateManager {
            name: name.into(),
            column: column.into(),
            lenum,
            states: Vec::new(),
            state_index: HashMap::new(),
            scalars_by_value: HashMap::new(),
            transitions: Vec::new(),
            transition_index: HashMap::new(),
            get,
            set,
            observers: Vec::new(),
        };
        for state in initial {
            manager.push_state(state);
        }
        StateManagerBuilder { manager }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    /// The enumeration of valid values.
    pub fn lenum(&self) -> &LabeledEnum<V> {
        &self.lenum
    }

    pub fn state(&self, name: &str) -> Option<&ManagedState<E, V>> {
        self.state_index.get(name).map(|&i| &self.states[i])
    }

    /// All states in declaration order.
    pub fn states(&self) -> impl Iterator<Item = &ManagedState<E, V>> + '_ {
        self.states.iter()
    }

    pub fn transition(&self, name: &str) -> Option<&Transition<E, V>> {
        self.transition_index.get(name).map(|&i| &self.transitions[i])
    }

    /// All transitions in declaration order.
    pub fn transitions(&self) -> impl Iterator<Item = &Transition<E, V>> + '_ {
        self.transitions.iter()
    }

    /// Current value of the entity's state field.
    pub fn value_of(&self, entity: &E) -> V {
        (self.get)(entity)
    }

    /// Read-only handle for queries.
    pub fn view<'a>(&'a self, entity: &'a E) -> StateView<'a, E, V> {
        StateView::new(self, entity)
    }

    /// Exclusive handle for queries and transitions.
    pub fn handle<'a>(&'a self, entity: &'a mut E) -> StateHandle<'a, E, V> {
        StateHandle::new(self, entity)
    }

    // ── Class-level queries ──────────────────────────────────────────

    /// Storage filter selecting entities currently in state `name`.
    pub fn filter(&self, name: &str) -> Result<Filter<V>, QueryError> {
        let state = self.state(name).ok_or_else(|| self.unknown_state(name))?;
        self.state_filter(state)
    }

    /// Storage filter selecting entities not in state `name`.
    pub fn filter_not(&self, name: &str) -> Result<Filter<V>, QueryError> {
        Ok(self.filter(name)?.negate())
    }

    /// Constraint restricting the column to the enumeration's member values,
    /// for use in a table's CHECK clause.
    pub fn check_constraint(&self) -> Filter<V> {
        Filter::In {
            column: self.column.clone(),
            values: self.lenum.keys(),
        }
    }

    /// Bucket entities by direct state, in enumeration order.
    ///
    /// Empty buckets are dropped unless `keep_empty` is set.
    pub fn group_by<'e, I>(
        &self,
        items: I,
        keep_empty: bool,
    ) -> Result<Vec<(&ManagedState<E, V>, Vec<&'e E>)>, QueryError>
    where
        I: IntoIterator<Item = &'e E>,
        E: 'e,
    {
        let mut buckets: Vec<(&ManagedState<E, V>, Vec<&'e E>)> = self
            .states
            .iter()
            .filter(|s| s.is_direct())
            .map(|s| (s, Vec::new()))
            .collect();
        let positions: HashMap<V, usize> = buckets
            .iter()
            .enumerate()
            .filter_map(|(i, (s, _))| s.value().map(|v| (v, i)))
            .collect();

        for item in items {
            let value = (self.get)(item);
            let &i = positions
                .get(&value)
                .ok_or_else(|| QueryError::UnknownValue {
                    manager: self.name.clone(),
                    value: format!("{value:?}"),
                })?;
            buckets[i].1.push(item);
        }

        if !keep_empty {
            buckets.retain(|(_, items)| !items.is_empty());
        }
        Ok(buckets)
    }

    // ── Instance-level evaluation ────────────────────────────────────

    /// Whether `entity` is currently in `state`.
    pub(crate) fn is_in(&self, state: &ManagedState<E, V>, entity: &E) -> bool {
        let value = (self.get)(entity);
        match &state.kind {
            StateKind::Group(members) => members
                .iter()
                .filter_map(|m| self.state(m))
                .any(|m| m.matches_scalar(&value, entity)),
            _ => state.matches_scalar(&value, entity),
        }
    }

    /// The most specific scalar state the entity is in.
    pub(crate) fn best_match(&self, entity: &E) -> Option<&ManagedState<E, V>> {
        let value = (self.get)(entity);
        self.scalars_by_value
            .get(&value)?
            .iter()
            .map(|&i| &self.states[i])
            .find(|s| s.matches_scalar(&value, entity))
    }

    /// Source check only: is `entity` in one of the transition's source states?
    pub(crate) fn check_sources(
        &self,
        transition: &Transition<E, V>,
        entity: &E,
    ) -> Result<(), TransitionError> {
        let Some(sources) = &transition.sources else {
            return Ok(());
        };
        let value = (self.get)(entity);
        // Any contributing state may admit the value.
        let permitted = sources.get(&value).is_some_and(|names| {
            names
                .iter()
                .filter_map(|name| self.state(name))
                .any(|s| s.matches_scalar(&value, entity))
        });
        if permitted {
            Ok(())
        } else {
            Err(TransitionError::NotPermitted {
                manager: self.name.clone(),
                transition: transition.name.clone(),
                current: self.describe(&value),
            })
        }
    }

    /// Source check followed by the guard.
    pub(crate) fn validate(
        &self,
        transition: &Transition<E, V>,
        entity: &E,
        args: &TransitionArgs,
    ) -> Result<(), TransitionError> {
        self.check_sources(transition, entity)?;
        if let Some(guard) = &transition.guard {
            if !guard(entity, args) {
                return Err(TransitionError::GuardRejected {
                    manager: self.name.clone(),
                    transition: transition.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Run transition `name` on `entity`.
    ///
    /// On success the field holds the target value and the callback has run
    /// exactly once. Rejections leave the entity untouched. A callback error
    /// is returned after the field has already changed.
    pub fn fire(
        &self,
        entity: &mut E,
        name: &str,
        args: &TransitionArgs,
    ) -> Result<TransitionRecord<V>, TransitionError> {
        let transition = self
            .transition(name)
            .ok_or_else(|| TransitionError::UnknownTransition {
                manager: self.name.clone(),
                transition: name.to_string(),
            })?;

        if let Err(err) = self.validate(transition, entity, args) {
            for observer in &self.observers {
                observer.rejected(&self.name, entity, &err);
            }
            return Err(err);
        }

        for observer in &self.observers {
            observer.before(&self.name, entity, name);
        }

        let from = (self.get)(entity);
        if let Some(target) = transition.target {
            (self.set)(&mut *entity, target);
        }
        let record = TransitionRecord {
            transition: transition.name.clone(),
            from,
            to: transition.target.unwrap_or(from),
            at: Timestamp::now(),
        };

        if let Some(callback) = &transition.callback {
            if let Err(source) = callback(&mut *entity, args) {
                for observer in &self.observers {
                    observer.failed(&self.name, entity, name, &source);
                }
                return Err(TransitionError::Callback {
                    manager: self.name.clone(),
                    transition: transition.name.clone(),
                    source,
                });
            }
        }

        for observer in &self.observers {
            observer.after(&self.name, entity, &record);
        }
        Ok(record)
    }

    // ── Internals ────────────────────────────────────────────────────

    fn push_state(&mut self, state: ManagedState<E, V>) {
        let index = self.states.len();
        if state.is_scalar() {
            if let Some(ValueSet::One(v)) = state.values() {
                self.scalars_by_value.entry(v).or_default().insert(0, index);
            }
        }
        self.state_index.insert(state.name.clone(), index);
        self.states.push(state);
    }

    fn state_filter(&self, state: &ManagedState<E, V>) -> Result<Filter<V>, QueryError> {
        match &state.kind {
            StateKind::Direct(v) => Ok(ValueSet::One(*v).filter(&self.column)),
            StateKind::Grouped(vs) => Ok(ValueSet::Many(vs.clone()).filter(&self.column)),
            StateKind::Conditional {
                base, class_filter, ..
            } => match class_filter {
                Some(extra) => Ok(base.filter(&self.column).and(extra.clone())),
                None => Err(QueryError::NoClassFilter {
                    manager: self.name.clone(),
                    state: state.name.clone(),
                }),
            },
            StateKind::Group(members) => {
                let parts = members
                    .iter()
                    .map(|m| {
                        let member = self.state(m).ok_or_else(|| self.unknown_state(m))?;
                        self.state_filter(member)
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Filter::Or(parts))
            }
        }
    }

    /// Label title of a value, falling back to its `Debug` form.
    pub(crate) fn describe(&self, value: &V) -> String {
        match self.lenum.get(value) {
            Some(label) => label.title().to_string(),
            None => format!("{value:?}"),
        }
    }

    pub(crate) fn unknown_state(&self, name: &str) -> QueryError {
        QueryError::UnknownState {
            manager: self.name.clone(),
            name: name.to_string(),
        }
    }
}

impl<E, V: StateValue> std::fmt::Debug for StateManager<E, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateManager")
            .field("name", &self.name)
            .field("column", &self.column)
            .field("states", &self.states)
            .field("transitions", &self.transitions)
            .field("observers", &self.observers.len())
            .finish()
    }
}

// ─── Builder ─────────────────────────────────────────────────────────

/// Declares states and transitions on a [`StateManager`].
pub struct StateManagerBuilder<E, V: StateValue> {
    manager: StateManager<E, V>,
}

impl<E, V: StateValue> StateManagerBuilder<E, V> {
    /// Add a conditional state with no class filter and no label.
    pub fn conditional_state(
        self,
        name: impl Into<String>,
        base: impl Into<String>,
        validator: impl Fn(&E) -> bool + Send + Sync + 'static,
    ) -> Result<Self, ConfigError> {
        self.conditional(ConditionalState::new(name, base, validator))
    }

    /// Add a conditional state.
    ///
    /// The base must be a direct or grouped state of this manager.
    pub fn conditional(mut self, decl: ConditionalState<E, V>) -> Result<Self, ConfigError> {
        self.ensure_free(&decl.name)?;
        let m = &self.manager;
        let base = m.state(&decl.base).ok_or_else(|| ConfigError::UnknownState {
            manager: m.name.clone(),
            name: decl.base.clone(),
        })?;
        let values = match &base.kind {
            StateKind::Direct(_) | StateKind::Grouped(_) => base.values(),
            StateKind::Conditional { .. } | StateKind::Group(_) => None,
        };
        let Some(values) = values else {
            return Err(ConfigError::InvalidConditionalBase {
                manager: m.name.clone(),
                name: decl.name,
                base: decl.base,
            });
        };
        self.manager.push_state(ManagedState {
            name: decl.name,
            label: decl.label,
            kind: StateKind::Conditional {
                base: values,
                validator: decl.validator,
                class_filter: decl.class_filter,
            },
        });
        Ok(self)
    }

    /// Add a group of existing states, which may include conditional states.
    ///
    /// Groups cannot contain groups, and a conditional member may not share
    /// values with an earlier member: its condition would never be reached.
    pub fn state_group<S: Into<String>>(
        mut self,
        name: impl Into<String>,
        members: impl IntoIterator<Item = S>,
    ) -> Result<Self, ConfigError> {
        let name = name.into();
        self.ensure_free(&name)?;
        let members: Vec<String> = members.into_iter().map(Into::into).collect();
        let m = &self.manager;
        if members.is_empty() {
            return Err(ConfigError::EmptyGroup {
                manager: m.name.clone(),
                group: name,
            });
        }

        let mut resolved = Vec::with_capacity(members.len());
        for member in &members {
            let state = m.state(member).ok_or_else(|| ConfigError::UnknownState {
                manager: m.name.clone(),
                name: member.clone(),
            })?;
            if state.is_group() {
                return Err(ConfigError::NestedGroup {
                    manager: m.name.clone(),
                    group: name,
                    member: member.clone(),
                });
            }
            resolved.push(state);
        }

        let mut seen: BTreeSet<V> = BTreeSet::new();
        for state in resolved.iter().filter(|s| !s.is_conditional()) {
            if let Some(values) = state.values() {
                seen.extend(values.iter());
            }
        }
        for state in resolved.iter().filter(|s| s.is_conditional()) {
            if let Some(values) = state.values() {
                if values.overlaps(&seen) {
                    return Err(ConfigError::ConditionalOverlap {
                        manager: m.name.clone(),
                        group: name,
                        state: state.name.clone(),
                    });
                }
                seen.extend(values.iter());
            }
        }

        self.manager.push_state(ManagedState {
            name,
            label: None,
            kind: StateKind::Group(members),
        });
        Ok(self)
    }

    /// Register a transition.
    ///
    /// Sources must be known states, groups or member values; the target
    /// must be a direct state. A declaration without a target registers a
    /// requirement.
    pub fn transition(mut self, def: TransitionDef<E, V>) -> Result<Self, ConfigError> {
        let m = &self.manager;
        if m.transition_index.contains_key(&def.name) {
            return Err(ConfigError::DuplicateTransition {
                manager: m.name.clone(),
                transition: def.name,
            });
        }
        if def.data.contains_key(NAME_KEY) {
            return Err(ConfigError::ReservedDataKey {
                manager: m.name.clone(),
                transition: def.name,
                key: NAME_KEY.to_string(),
            });
        }

        let sources = self.resolve_sources(&def.name, &def.sources)?;
        let target = match &def.target {
            None => None,
            Some(target) => Some(self.resolve_target(&def.name, target)?),
        };

        let mut data = def.data;
        data.insert(NAME_KEY.to_string(), def.name.clone().into());

        let index = self.manager.transitions.len();
        self.manager
            .transition_index
            .insert(def.name.clone(), index);
        self.manager.transitions.push(Transition {
            name: def.name,
            sources,
            target,
            guard: def.guard,
            callback: def.callback,
            data,
        });
        Ok(self)
    }

    /// Register a requirement: an action permitted only from the given
    /// states, leaving the state unchanged.
    pub fn requires<S: Into<String>>(
        self,
        name: impl Into<String>,
        sources: impl IntoIterator<Item = S>,
    ) -> Result<Self, ConfigError> {
        self.transition(TransitionDef::new(name).from_each(sources))
    }

    /// Attach a guard to an already registered transition, replacing any
    /// existing one.
    pub fn with_guard(
        mut self,
        transition: &str,
        guard: impl Fn(&E, &TransitionArgs) -> bool + Send + Sync + 'static,
    ) -> Result<Self, ConfigError> {
        let guard: Guard<E> = Arc::new(guard);
        self.registered(transition)?.guard = Some(guard);
        Ok(self)
    }

    /// Attach a callback to an already registered transition, replacing any
    /// existing one.
    pub fn with_callback(
        mut self,
        transition: &str,
        callback: impl Fn(&mut E, &TransitionArgs) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Result<Self, ConfigError> {
        let callback: Callback<E> = Arc::new(callback);
        self.registered(transition)?.callback = Some(callback);
        Ok(self)
    }

    /// Notify `observer` around every transition.
    pub fn observer(mut self, observer: Arc<dyn TransitionObserver<E, V>>) -> Self {
        self.manager.observers.push(observer);
        self
    }

    /// Freeze the declaration.
    pub fn build(self) -> StateManager<E, V> {
        let m = self.manager;
        tracing::debug!(
            manager = %m.name,
            column = %m.column,
            states = m.states.len(),
            transitions = m.transitions.len(),
            "state manager declared"
        );
        m
    }

    fn ensure_free(&self, name: &str) -> Result<(), ConfigError> {
        if self.manager.state_index.contains_key(name) {
            return Err(ConfigError::NameConflict {
                manager: self.manager.name.clone(),
                name: name.to_string(),
            });
        }
        Ok(())
    }

    fn registered(&mut self, transition: &str) -> Result<&mut Transition<E, V>, ConfigError> {
        match self.manager.transition_index.get(transition) {
            Some(&i) => Ok(&mut self.manager.transitions[i]),
            None => Err(ConfigError::UnknownTransition {
                manager: self.manager.name.clone(),
                transition: transition.to_string(),
            }),
        }
    }

    /// Unroll source states into a value → contributing-states map. Groups
    /// expand to their members so conditional members keep their condition.
    fn resolve_sources(
        &self,
        transition: &str,
        sources: &Sources<V>,
    ) -> Result<Option<BTreeMap<V, Vec<String>>>, ConfigError> {
        let m = &self.manager;
        let refs = match sources {
            Sources::Any => return Ok(None),
            Sources::Only(refs) if refs.is_empty() => {
                return Err(ConfigError::NoSources {
                    manager: m.name.clone(),
                    transition: transition.to_string(),
                })
            }
            Sources::Only(refs) => refs,
        };

        let mut map = BTreeMap::new();
        for source in refs {
            match source {
                StateRef::Value(v) => {
                    let name = m.lenum.name_of(v).ok_or_else(|| ConfigError::UnknownValue {
                        manager: m.name.clone(),
                        value: format!("{v:?}"),
                    })?;
                    add_source(&mut map, *v, name);
                }
                StateRef::Name(name) => {
                    let state = m.state(name).ok_or_else(|| ConfigError::UnknownState {
                        manager: m.name.clone(),
                        name: name.clone(),
                    })?;
                    let scalars: Vec<&ManagedState<E, V>> = match &state.kind {
                        StateKind::Group(members) => {
                            members.iter().filter_map(|n| m.state(n)).collect()
                        }
                        _ => vec![state],
                    };
                    for scalar in scalars {
                        if let Some(values) = scalar.values() {
                            for v in values.iter() {
                                add_source(&mut map, v, &scalar.name);
                            }
                        }
                    }
                }
            }
        }
        Ok(Some(map))
    }

    fn resolve_target(&self, transition: &str, target: &StateRef<V>) -> Result<V, ConfigError> {
        let m = &self.manager;
        match target {
            StateRef::Value(v) if m.lenum.contains(v) => Ok(*v),
            StateRef::Value(v) => Err(ConfigError::UnknownValue {
                manager: m.name.clone(),
                value: format!("{v:?}"),
            }),
            StateRef::Name(name) => {
                let state = m.state(name).ok_or_else(|| ConfigError::UnknownState {
                    manager: m.name.clone(),
                    name: name.clone(),
                })?;
                state.value().ok_or_else(|| ConfigError::InvalidTarget {
                    manager: m.name.clone(),
                    transition: transition.to_string(),
                    target: name.clone(),
                })
            }
        }
    }
}

fn add_source<V: StateValue>(map: &mut BTreeMap<V, Vec<String>>, value: V, state: &str) {
    let states = map.entry(value).or_default();
    if !states.iter().any(|s| s == state) {
        states.push(state.to_string());
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{Placeholder, SqlPredicate};

    const DRAFT: i32 = 0;
    const PENDING: i32 = 1;
    const PUBLISHED: i32 = 2;

    #[derive(Debug, Clone)]
    struct Post {
        state: i32,
        recent: bool,
    }

    fn post(state: i32) -> Post {
        Post {
            state,
            recent: true,
        }
    }

    fn states() -> LabeledEnum<i32> {
        LabeledEnum::builder()
            .member("DRAFT", DRAFT, "Draft")
            .member("PENDING", PENDING, ("pending", "Pending"))
            .member("PUBLISHED", PUBLISHED, ("published", "Published"))
            .group("UNPUBLISHED", [DRAFT, PENDING])
            .build()
            .unwrap()
    }

    fn builder() -> StateManagerBuilder<Post, i32> {
        StateManager::builder(
            "Post.state",
            "state",
            states(),
            |p: &Post| p.state,
            |p: &mut Post, v| p.state = v,
        )
    }

    fn manager() -> StateManager<Post, i32> {
        builder()
            .conditional(
                ConditionalState::new("RECENT", "PUBLISHED", |p: &Post| p.recent)
                    .label(("recent", "Recently published"))
                    .class_filter(Filter::raw("published_at > now() - interval '1 hour'")),
            )
            .unwrap()
            .state_group("REDRAFTABLE", ["DRAFT", "PENDING", "RECENT"])
            .unwrap()
            .transition(TransitionDef::new("submit").from("DRAFT").to("PENDING"))
            .unwrap()
            .transition(TransitionDef::new("redraft").from("REDRAFTABLE").to("DRAFT"))
            .unwrap()
            .requires("rewind", ["PUBLISHED"])
            .unwrap()
            .build()
    }

    // ── Registration tests ───────────────────────────────────────────

    #[test]
    fn test_enum_members_and_groups_become_states() {
        let m = manager();
        assert!(m.state("DRAFT").unwrap().is_direct());
        assert_eq!(m.state("PUBLISHED").unwrap().value(), Some(PUBLISHED));
        assert!(matches!(
            m.state("UNPUBLISHED").unwrap().kind(),
            StateKind::Grouped(_)
        ));
        assert!(m.state("RECENT").unwrap().is_conditional());
        assert!(m.state("REDRAFTABLE").unwrap().is_group());
        let names: Vec<&str> = m.states().map(|s| s.name()).collect();
        assert_eq!(
            names,
            vec!["DRAFT", "PENDING", "PUBLISHED", "UNPUBLISHED", "RECENT", "REDRAFTABLE"]
        );
    }

    #[test]
    fn test_transition_data_carries_name() {
        let m = builder()
            .transition(
                TransitionDef::new("publish")
                    .from("UNPUBLISHED")
                    .to("PUBLISHED")
                    .data("title", "Publish"),
            )
            .unwrap()
            .build();
        let t = m.transition("publish").unwrap();
        assert_eq!(t.data()["name"], "publish");
        assert_eq!(t.title(), Some("Publish"));
        assert_eq!(t.source_values(), Some(vec![DRAFT, PENDING]));
        assert_eq!(t.target(), Some(PUBLISHED));
    }

    #[test]
    fn test_requirement_has_no_target() {
        let m = manager();
        let rewind = m.transition("rewind").unwrap();
        assert!(rewind.is_requirement());
        assert_eq!(rewind.source_values(), Some(vec![PUBLISHED]));
    }

    #[test]
    fn test_overlapping_sources_admit_value_in_either_order() {
        for published_first in [true, false] {
            let def = if published_first {
                TransitionDef::new("redraft").from("PUBLISHED").from("RECENT")
            } else {
                TransitionDef::new("redraft").from("RECENT").from("PUBLISHED")
            };
            let m = builder()
                .conditional_state("RECENT", "PUBLISHED", |p: &Post| p.recent)
                .unwrap()
                .transition(def.to("DRAFT"))
                .unwrap()
                .build();

            let mut stale = Post {
                state: PUBLISHED,
                recent: false,
            };
            let result = m.fire(&mut stale, "redraft", &TransitionArgs::new());
            assert!(result.is_ok(), "published_first={published_first}: {result:?}");
            assert_eq!(stale.state, DRAFT);
        }
    }

    #[test]
    fn test_conditional_only_source_keeps_condition() {
        let m = builder()
            .conditional_state("RECENT", "PUBLISHED", |p: &Post| p.recent)
            .unwrap()
            .transition(TransitionDef::new("redraft").from("RECENT").to("DRAFT"))
            .unwrap()
            .build();
        let mut stale = Post {
            state: PUBLISHED,
            recent: false,
        };
        let result = m.fire(&mut stale, "redraft", &TransitionArgs::new());
        assert!(matches!(result, Err(TransitionError::NotPermitted { .. })));
        assert_eq!(stale.state, PUBLISHED);
    }

    #[test]
    fn test_manager_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<StateManager<Post, i32>>();
    }

    // ── Configuration error tests ────────────────────────────────────

    #[test]
    fn test_target_must_be_direct_state() {
        let group = builder().transition(TransitionDef::new("t").from("DRAFT").to("UNPUBLISHED"));
        assert!(matches!(group, Err(ConfigError::InvalidTarget { .. })));

        let conditional = builder()
            .conditional_state("RECENT", "PUBLISHED", |p: &Post| p.recent)
            .unwrap()
            .transition(TransitionDef::new("t").from("DRAFT").to("RECENT"));
        assert!(matches!(conditional, Err(ConfigError::InvalidTarget { .. })));
    }

    #[test]
    fn test_unknown_target_and_source() {
        let target = builder().transition(TransitionDef::new("t").from("DRAFT").to("ARCHIVED"));
        assert!(matches!(target, Err(ConfigError::UnknownState { .. })));

        let source = builder().transition(TransitionDef::new("t").from("ARCHIVED").to("DRAFT"));
        assert!(matches!(source, Err(ConfigError::UnknownState { .. })));

        let value = builder().transition(TransitionDef::new("t").from_value(9).to("DRAFT"));
        assert!(matches!(value, Err(ConfigError::UnknownValue { .. })));

        let target_value = builder().transition(TransitionDef::new("t").from("DRAFT").to_value(9));
        assert!(matches!(target_value, Err(ConfigError::UnknownValue { .. })));
    }

    #[test]
    fn test_transition_without_sources_rejected() {
        let result = builder().transition(TransitionDef::new("t").to("DRAFT"));
        assert!(matches!(result, Err(ConfigError::NoSources { .. })));
    }

    #[test]
    fn test_duplicate_transition_rejected() {
        let result = builder()
            .transition(TransitionDef::new("submit").from("DRAFT").to("PENDING"))
            .unwrap()
            .transition(TransitionDef::new("submit").from("PENDING").to("DRAFT"));
        assert!(matches!(result, Err(ConfigError::DuplicateTransition { .. })));
    }

    #[test]
    fn test_reserved_data_key_rejected() {
        let result = builder().transition(
            TransitionDef::new("submit")
                .from("DRAFT")
                .to("PENDING")
                .data("name", "other"),
        );
        assert!(matches!(result, Err(ConfigError::ReservedDataKey { .. })));
    }

    #[test]
    fn test_state_name_conflict() {
        let result = builder().conditional_state("DRAFT", "PENDING", |_: &Post| true);
        assert!(matches!(result, Err(ConfigError::NameConflict { .. })));
    }

    #[test]
    fn test_conditional_base_must_be_direct_or_grouped() {
        let on_group = builder()
            .state_group("EDITABLE", ["DRAFT"])
            .unwrap()
            .conditional_state("X", "EDITABLE", |_: &Post| true);
        assert!(matches!(
            on_group,
            Err(ConfigError::InvalidConditionalBase { .. })
        ));

        let on_grouped = builder().conditional_state("X", "UNPUBLISHED", |_: &Post| true);
        assert!(on_grouped.is_ok());
    }

    #[test]
    fn test_group_rules() {
        let nested = builder()
            .state_group("A", ["DRAFT"])
            .unwrap()
            .state_group("B", ["A", "PENDING"]);
        assert!(matches!(nested, Err(ConfigError::NestedGroup { .. })));

        let overlap = builder()
            .conditional_state("RECENT", "PUBLISHED", |p: &Post| p.recent)
            .unwrap()
            .state_group("BAD", ["PUBLISHED", "RECENT"]);
        assert!(matches!(overlap, Err(ConfigError::ConditionalOverlap { .. })));

        let empty = builder().state_group("NONE", Vec::<String>::new());
        assert!(matches!(empty, Err(ConfigError::EmptyGroup { .. })));

        let unknown = builder().state_group("G", ["NOPE"]);
        assert!(matches!(unknown, Err(ConfigError::UnknownState { .. })));
    }

    #[test]
    fn test_hooks_require_registered_transition() {
        let result = builder().with_guard("publish", |_, _| true);
        assert!(matches!(result, Err(ConfigError::UnknownTransition { .. })));
    }

    // ── Filter tests ─────────────────────────────────────────────────

    #[test]
    fn test_filters_for_each_state_kind() {
        let m = manager();
        let render = |name: &str| {
            SqlPredicate::render(&m.filter(name).unwrap(), Placeholder::Numbered)
        };

        assert_eq!(render("DRAFT"), ("state = $1".to_string(), vec![DRAFT]));
        assert_eq!(
            render("UNPUBLISHED"),
            ("state IN ($1, $2)".to_string(), vec![DRAFT, PENDING])
        );
        assert_eq!(
            render("RECENT").0,
            "(state = $1 AND published_at > now() - interval '1 hour')"
        );
        assert_eq!(
            render("REDRAFTABLE").0,
            "(state = $1 OR state = $2 OR (state = $3 AND published_at > now() - interval '1 hour'))"
        );
    }

    #[test]
    fn test_filter_not_and_unknown() {
        let m = manager();
        let (sql, _) = SqlPredicate::render(&m.filter_not("DRAFT").unwrap(), Placeholder::Numbered);
        assert_eq!(sql, "NOT (state = $1)");
        assert!(matches!(
            m.filter("ARCHIVED"),
            Err(QueryError::UnknownState { .. })
        ));
    }

    #[test]
    fn test_conditional_without_class_filter_is_unqueryable() {
        let m = builder()
            .conditional_state("RECENT", "PUBLISHED", |p: &Post| p.recent)
            .unwrap()
            .build();
        assert!(matches!(
            m.filter("RECENT"),
            Err(QueryError::NoClassFilter { .. })
        ));
    }

    #[test]
    fn test_check_constraint() {
        let m = manager();
        let (sql, params) = SqlPredicate::render(&m.check_constraint(), Placeholder::Question);
        assert_eq!(sql, "state IN (?, ?, ?)");
        assert_eq!(params, vec![DRAFT, PENDING, PUBLISHED]);
    }

    // ── Grouping tests ───────────────────────────────────────────────

    #[test]
    fn test_group_by_in_enum_order() {
        let m = manager();
        let posts = vec![post(PUBLISHED), post(DRAFT), post(PUBLISHED)];
        let groups = m.group_by(&posts, false).unwrap();
        let summary: Vec<(&str, usize)> = groups
            .iter()
            .map(|(s, items)| (s.name(), items.len()))
            .collect();
        assert_eq!(summary, vec![("DRAFT", 1), ("PUBLISHED", 2)]);

        let all = m.group_by(&posts, true).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[1].0.name(), "PENDING");
        assert!(all[1].1.is_empty());
    }

    #[test]
    fn test_group_by_unknown_value() {
        let m = manager();
        let posts = vec![post(42)];
        assert!(matches!(
            m.group_by(&posts, false),
            Err(QueryError::UnknownValue { .. })
        ));
    }
}
