//! Death and reset sequencing
//!
//! A failure (core overload, tower destroyed) plays a collapse, asks the
//! owner to reset the world, then waits out a short delay before play resumes.

use serde::{Deserialize, Serialize};

use super::machine::{MachineState, StateMachine};
use crate::tuning::DeathTuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathPhase {
    Alive,
    Collapsing,
    Resetting,
}

impl MachineState for DeathPhase {
    fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (DeathPhase::Alive, DeathPhase::Collapsing)
                | (DeathPhase::Collapsing, DeathPhase::Resetting)
                | (DeathPhase::Resetting, DeathPhase::Alive)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathSignal {
    /// Collapse finished; the owner should reset its world now
    ResetRequested,
    /// Reset delay over; play resumes
    Revived,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeathSequenceController {
    machine: StateMachine<DeathPhase>,
    deaths: u32,
    tuning: DeathTuning,
}

impl DeathSequenceController {
    pub fn new(tuning: DeathTuning) -> Self {
        Self {
            machine: StateMachine::new(DeathPhase::Alive),
            deaths: 0,
            tuning,
        }
    }

    pub fn phase(&self) -> DeathPhase {
        self.machine.current()
    }

    /// True while the sequence is running
    pub fn is_dying(&self) -> bool {
        !self.machine.is(DeathPhase::Alive)
    }

    pub fn deaths(&self) -> u32 {
        self.deaths
    }

    /// Start the sequence; ignored if already running
    pub fn trigger(&mut self) -> bool {
        if self.machine.transition(DeathPhase::Collapsing).is_err() {
            return false;
        }
        self.deaths += 1;
        true
    }

    pub fn update(&mut self, dt: f32) -> Option<DeathSignal> {
        self.machine.update(dt);
        match self.machine.current() {
            DeathPhase::Alive => None,
            DeathPhase::Collapsing => {
                if self.machine.time_in_state() < self.tuning.collapse_duration {
                    return None;
                }
                self.machine.transition(DeathPhase::Resetting).ok()?;
                Some(DeathSignal::ResetRequested)
            }
            DeathPhase::Resetting => {
                if self.machine.time_in_state() < self.tuning.reset_delay {
                    return None;
                }
                self.machine.transition(DeathPhase::Alive).ok()?;
                Some(DeathSignal::Revived)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_sequence() {
        let mut d = DeathSequenceController::new(DeathTuning::default());
        assert_eq!(d.update(1.0), None);
        assert!(d.trigger());
        assert!(!d.trigger());
        assert!(d.is_dying());
        assert_eq!(d.update(1.0), None);
        assert_eq!(d.update(0.6), Some(DeathSignal::ResetRequested));
        assert_eq!(d.phase(), DeathPhase::Resetting);
        assert_eq!(d.update(0.5), None);
        assert_eq!(d.update(0.5), Some(DeathSignal::Revived));
        assert!(!d.is_dying());
        assert_eq!(d.deaths(), 1);
        assert!(d.trigger());
    }
}
