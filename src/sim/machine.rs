//! Minimal typed state container
//!
//! Tracks the current state, the previous state and how long the current
//! state has been held. Transition rules live on the state type.

use std::fmt::Debug;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A state enum that knows its legal successors
pub trait MachineState: Copy + Eq + Debug {
    fn can_transition_to(self, next: Self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid state transition from {from:?} to {to:?}")]
pub struct InvalidTransition<S: Debug> {
    pub from: S,
    pub to: S,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateMachine<S> {
    current: S,
    previous: Option<S>,
    time_in_state: f32,
}

impl<S: MachineState> StateMachine<S> {
    pub fn new(initial: S) -> Self {
        Self {
            current: initial,
            previous: None,
            time_in_state: 0.0,
        }
    }

    #[inline]
    pub fn current(&self) -> S {
        self.current
    }

    #[inline]
    pub fn is(&self, state: S) -> bool {
        self.current == state
    }

    pub fn previous(&self) -> Option<S> {
        self.previous
    }

    pub fn time_in_state(&self) -> f32 {
        self.time_in_state
    }

    pub fn update(&mut self, dt: f32) {
        self.time_in_state += dt;
    }

    /// Move to `next` if the current state allows it
    pub fn transition(&mut self, next: S) -> Result<(), InvalidTransition<S>> {
        if !self.current.can_transition_to(next) {
            return Err(InvalidTransition {
                from: self.current,
                to: next,
            });
        }
        self.enter(next);
        Ok(())
    }

    /// Move to `next` without consulting the transition rules
    pub fn force(&mut self, next: S) {
        self.enter(next);
    }

    fn enter(&mut self, next: S) {
        self.previous = Some(self.current);
        self.current = next;
        self.time_in_state = 0.0;
    }
}
