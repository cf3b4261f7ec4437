//! # Bound Handles
//!
//! A handle pairs the shared, immutable [`StateManager`] with one entity.
//! Handles are cheap (two references) and created per call:
//!
//! ```ignore
//! let view = POST_STATE.view(&post);
//! if view.is("PUBLISHED")? { ... }
//!
//! POST_STATE.handle(&mut post).transition("publish")?;
//! ```
//!
//! Queries read the entity's current field value on every call; nothing is
//! cached, so a direct assignment to the field is visible immediately.

use coast_core::{Label, StateValue};

use crate::error::{QueryError, TransitionError};
use crate::manager::StateManager;
use crate::state::ManagedState;
use crate::transition::{Transition, TransitionArgs, TransitionRecord};

/// Read-only view of one entity's state.
pub struct StateView<'a, E, V: StateValue> {
    manager: &'a StateManager<E, V>,
    entity: &'a E,
}

impl<'a, E, V: StateValue> StateView<'a, E, V> {
    pub(crate) fn new(manager: &'a StateManager<E, V>, entity: &'a E) -> Self {
        Self { manager, entity }
    }

    /// Current value of the state field.
    pub fn value(&self) -> V {
        self.manager.value_of(self.entity)
    }

    /// The most specific scalar state the entity is in: a matching
    /// conditional state if any, else the direct state.
    pub fn best_match(&self) -> Option<&'a ManagedState<E, V>> {
        self.manager.best_match(self.entity)
    }

    /// Label of the best matching state.
    pub fn label(&self) -> Option<&'a Label> {
        self.best_match().and_then(ManagedState::label)
    }

    /// Whether the entity is in state or group `name`.
    pub fn is(&self, name: &str) -> Result<bool, QueryError> {
        let state = self
            .manager
            .state(name)
            .ok_or_else(|| self.manager.unknown_state(name))?;
        Ok(self.manager.is_in(state, self.entity))
    }

    /// Every declared state and group with whether the entity is in it,
    /// in declaration order.
    pub fn membership(&self) -> Vec<(&'a str, bool)> {
        let manager = self.manager;
        manager
            .states()
            .map(|s| (s.name(), manager.is_in(s, self.entity)))
            .collect()
    }

    /// Names of all states and groups the entity is currently in.
    pub fn current(&self) -> Vec<&'a str> {
        self.membership()
            .into_iter()
            .filter_map(|(name, active)| active.then_some(name))
            .collect()
    }

    /// Whether transition `name` would succeed without arguments: the
    /// current state is a source and the guard passes.
    pub fn is_available(&self, name: &str) -> Result<bool, QueryError> {
        self.can(name, &TransitionArgs::default())
    }

    /// Whether the current state is a source of transition `name`.
    /// Guards are not evaluated.
    pub fn in_source_state(&self, name: &str) -> Result<bool, QueryError> {
        let transition = self.lookup(name)?;
        Ok(self.manager.check_sources(transition, self.entity).is_ok())
    }

    /// Whether transition `name` would pass both the source check and its
    /// guard with `args`.
    pub fn can(&self, name: &str, args: &TransitionArgs) -> Result<bool, QueryError> {
        let transition = self.lookup(name)?;
        Ok(self
            .manager
            .validate(transition, self.entity, args)
            .is_ok())
    }

    /// Transitions available without arguments, in declaration order.
    pub fn available_transitions(&self) -> Vec<&'a Transition<E, V>> {
        let manager = self.manager;
        let args = TransitionArgs::default();
        manager
            .transitions()
            .filter(|t| manager.validate(t, self.entity, &args).is_ok())
            .collect()
    }

    /// Explain why transition `name` is not permitted, if it is not.
    pub fn check(&self, name: &str, args: &TransitionArgs) -> Result<(), TransitionError> {
        let transition =
            self.manager
                .transition(name)
                .ok_or_else(|| TransitionError::UnknownTransition {
                    manager: self.manager.name().to_string(),
                    transition: name.to_string(),
                })?;
        self.manager.validate(transition, self.entity, args)
    }

    fn lookup(&self, name: &str) -> Result<&'a Transition<E, V>, QueryError> {
        self.manager
            .transition(name)
            .ok_or_else(|| QueryError::UnknownTransition {
                manager: self.manager.name().to_string(),
                transition: name.to_string(),
            })
    }
}

/// Exclusive handle: queries plus transitions.
pub struct StateHandle<'a, E, V: StateValue> {
    manager: &'a StateManager<E, V>,
    entity: &'a mut E,
}

impl<'a, E, V: StateValue> StateHandle<'a, E, V> {
    pub(crate) fn new(manager: &'a StateManager<E, V>, entity: &'a mut E) -> Self {
        Self { manager, entity }
    }

    /// Read-only view over the same entity.
    pub fn view(&self) -> StateView<'_, E, V> {
        StateView::new(self.manager, &*self.entity)
    }

    pub fn value(&self) -> V {
        self.manager.value_of(&*self.entity)
    }

    pub fn is(&self, name: &str) -> Result<bool, QueryError> {
        self.view().is(name)
    }

    pub fn entity(&self) -> &E {
        &*self.entity
    }

    /// Run transition `name` with no arguments.
    pub fn transition(&mut self, name: &str) -> Result<TransitionRecord<V>, TransitionError> {
        self.transition_with(name, &TransitionArgs::default())
    }

    /// Run transition `name`, passing `args` to its guard and callback.
    pub fn transition_with(
        &mut self,
        name: &str,
        args: &TransitionArgs,
    ) -> Result<TransitionRecord<V>, TransitionError> {
        self.manager.fire(&mut *self.entity, name, args)
    }
}
