//! Compare-and-swap style status transitions.
//!
//! Background tasks and request-facing services share persisted status fields
//! without locks. Every write goes through a [`Transition`]: the writer states
//! which source states it expects and the target state, and the write only
//! happens if the *current* value still matches. A racing writer that already
//! moved the entity elsewhere makes the swap fail with
//! [`DomainError::StateConflict`] instead of silently overwriting.

use crate::error::{DomainError, DomainResult};

/// A status enum with a table of legal edges.
pub trait StateMachine: Copy + Eq + core::fmt::Debug + 'static {
    /// Entity name used in state-conflict errors.
    const ENTITY: &'static str;

    /// Whether `self -> next` is a legal edge.
    fn can_transition_to(self, next: Self) -> bool;
}

/// Expected source states + target state for one status write.
#[derive(Debug, Clone, Copy)]
pub struct Transition<S: 'static> {
    from: &'static [S],
    to: S,
}

impl<S: StateMachine> Transition<S> {
    pub const fn new(from: &'static [S], to: S) -> Self {
        Self { from, to }
    }

    pub fn from_states(&self) -> &'static [S] {
        self.from
    }

    pub fn target(&self) -> S {
        self.to
    }

    /// The "compare" half: validate `current` against the expectation and the
    /// edge table.
    pub fn check(&self, current: S) -> DomainResult<S> {
        if self.from.contains(&current) && current.can_transition_to(self.to) {
            Ok(self.to)
        } else {
            Err(DomainError::state_conflict(S::ENTITY, current, self.to))
        }
    }

    /// Compare-and-swap on a status slot. Returns the previous state.
    ///
    /// Callers must hold whatever guard protects `slot` for the whole call.
    pub fn apply(&self, slot: &mut S) -> DomainResult<S> {
        let previous = *slot;
        self.check(previous)?;
        *slot = self.to;
        Ok(previous)
    }
}
