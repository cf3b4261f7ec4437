//! # coast-state — Declarative State Managers
//!
//! Attaches a finite-state machine to one field of an entity type. The
//! machine is declared once, shared read-only, and evaluated against
//! whatever value the entity's field holds at the time of the call.
//!
//! ## Pieces
//!
//! - **Manager** (`manager.rs`): `StateManager` and its builder. Every
//!   enumeration member becomes a direct state, every enumeration group a
//!   grouped state; conditional states and managed groups are added on top.
//!
//! - **States** (`state.rs`): `ManagedState` and its four kinds.
//!
//! - **Transitions** (`transition.rs`): `TransitionDef` declarations,
//!   resolved `Transition`s, `TransitionArgs` and `TransitionRecord`.
//!
//! - **Handles** (`bound.rs`): `StateView` for queries, `StateHandle` for
//!   queries plus transitions. Both are created per call.
//!
//! - **Filters** (`filter.rs`): storage-neutral predicates for "entities in
//!   state X", rendered by any `PredicateBuilder`. `SqlPredicate` renders
//!   parameterised SQL.
//!
//! - **Observers** (`observer.rs`): transition lifecycle hooks;
//!   `TracingObserver` logs through `tracing`.
//!
//! - **Definitions** (`definition.rs`): `MachineDefinition`, the YAML/JSON
//!   form of a manager.
//!
//! ## Example
//!
//! ```ignore
//! let states = LabeledEnum::builder()
//!     .member("DRAFT", 0, "Draft")
//!     .member("PUBLISHED", 1, "Published")
//!     .build()?;
//!
//! let post_state = StateManager::builder("Post.state", "state", states, |p: &Post| p.state, |p: &mut Post, v| p.state = v)
//!     .transition(TransitionDef::new("publish").from("DRAFT").to("PUBLISHED")
//!         .guard(|p, _| !p.title.is_empty()))?
//!     .build();
//!
//! post_state.handle(&mut post).transition("publish")?;
//! assert!(post_state.view(&post).is("PUBLISHED")?);
//! ```

pub mod bound;
pub mod definition;
pub mod error;
pub mod filter;
pub mod manager;
pub mod observer;
pub mod state;
pub mod transition;

// ─── Manager re-exports ─────────────────────────────────────────────

pub use bound::{StateHandle, StateView};
pub use manager::{ConditionalState, Getter, Setter, StateManager, StateManagerBuilder};
pub use state::{ManagedState, StateKind, ValueSet};
pub use transition::{
    Sources, StateRef, Transition, TransitionArgs, TransitionDef, TransitionRecord,
};

// ─── Supporting re-exports ──────────────────────────────────────────

pub use definition::{GroupDefinition, MachineDefinition, TransitionDefinition};
pub use error::{ConfigError, QueryError, TransitionError};
pub use filter::{Filter, Placeholder, PredicateBuilder, SqlPredicate};
pub use observer::{TracingObserver, TransitionObserver};

pub use coast_core::{Label, LabeledEnum, NameTitle, StateValue};
