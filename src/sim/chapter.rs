//! Ten-stage chapter progression
//!
//! Reaching a chapter's stabilization requirement opens a fixed transition
//! window. Stabilizations during the window do not count. When it closes the
//! controller either declares victory (chapter 10) or asks for a full-world
//! reset and moves on.

use serde::{Deserialize, Serialize};

pub const CHAPTER_COUNT: u32 = 10;
pub const TRANSITION_DURATION: f32 = 2.0;

/// Fixed per-chapter tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChapterConfig {
    pub chapter: u32,
    pub stabilizations_required: u32,
    pub system_decay_modifier: f32,
    pub chaos_recovery_modifier: f32,
    pub penalty_severity_modifier: f32,
    pub margin_of_error: f32,
}

const fn config(
    chapter: u32,
    stabilizations_required: u32,
    system_decay_modifier: f32,
    chaos_recovery_modifier: f32,
    penalty_severity_modifier: f32,
    margin_of_error: f32,
) -> ChapterConfig {
    ChapterConfig {
        chapter,
        stabilizations_required,
        system_decay_modifier,
        chaos_recovery_modifier,
        penalty_severity_modifier,
        margin_of_error,
    }
}

pub const CHAPTERS: [ChapterConfig; CHAPTER_COUNT as usize] = [
    config(1, 2, 1.00, 1.00, 1.0, 1.00),
    config(2, 4, 1.12, 0.95, 1.1, 0.96),
    config(3, 6, 1.24, 0.90, 1.2, 0.92),
    config(4, 9, 1.36, 0.85, 1.3, 0.88),
    config(5, 12, 1.48, 0.80, 1.4, 0.84),
    config(6, 15, 1.60, 0.75, 1.5, 0.80),
    config(7, 18, 1.72, 0.70, 1.6, 0.76),
    config(8, 22, 1.84, 0.65, 1.7, 0.72),
    config(9, 26, 1.96, 0.60, 1.8, 0.68),
    config(10, 30, 2.08, 0.55, 1.9, 0.64),
];

/// Configuration for a 1-based chapter index (clamped to the table)
pub fn chapter_config(chapter: u32) -> ChapterConfig {
    CHAPTERS[(chapter.clamp(1, CHAPTER_COUNT) - 1) as usize]
}

/// What a stabilization did to the tally
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tally {
    /// Transition window open; not counted
    Ignored,
    Counted,
    /// This stabilization met the requirement
    ChapterComplete { chapter: u32 },
}

/// Emitted when the transition window closes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChapterSignal {
    WorldResetRequested { next_chapter: u32 },
    ChapterStarted { chapter: u32 },
    Victory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapterController {
    current_chapter: u32,
    stabilizations_this_chapter: u32,
    is_in_transition: bool,
    transition_timer: f32,
    victorious: bool,
}

impl Default for ChapterController {
    fn default() -> Self {
        Self::new(1)
    }
}

impl ChapterController {
    pub fn new(chapter: u32) -> Self {
        Self {
            current_chapter: chapter.clamp(1, CHAPTER_COUNT),
            stabilizations_this_chapter: 0,
            is_in_transition: false,
            transition_timer: 0.0,
            victorious: false,
        }
    }

    pub fn current_chapter(&self) -> u32 {
        self.current_chapter
    }

    pub fn config(&self) -> ChapterConfig {
        chapter_config(self.current_chapter)
    }

    pub fn stabilizations_this_chapter(&self) -> u32 {
        self.stabilizations_this_chapter
    }

    pub fn is_in_transition(&self) -> bool {
        self.is_in_transition
    }

    pub fn is_victorious(&self) -> bool {
        self.victorious
    }

    /// Fraction of the current requirement met
    pub fn progress(&self) -> f32 {
        let required = self.config().stabilizations_required.max(1);
        self.stabilizations_this_chapter as f32 / required as f32
    }

    pub fn on_node_stabilized(&mut self) -> Tally {
        if self.is_in_transition || self.victorious {
            return Tally::Ignored;
        }
        self.stabilizations_this_chapter += 1;
        if self.stabilizations_this_chapter >= self.config().stabilizations_required {
            self.trigger_chapter_complete();
            return Tally::ChapterComplete {
                chapter: self.current_chapter,
            };
        }
        Tally::Counted
    }

    fn trigger_chapter_complete(&mut self) {
        log::info!("Chapter {} complete", self.current_chapter);
        self.is_in_transition = true;
        self.transition_timer = 0.0;
    }

    pub fn update(&mut self, dt: f32) -> Vec<ChapterSignal> {
        if !self.is_in_transition {
            return Vec::new();
        }
        self.transition_timer += dt;
        if self.transition_timer < TRANSITION_DURATION {
            return Vec::new();
        }
        self.is_in_transition = false;
        self.transition_timer = 0.0;

        if self.current_chapter >= CHAPTER_COUNT {
            self.victorious = true;
            log::info!("All {} chapters complete", CHAPTER_COUNT);
            return vec![ChapterSignal::Victory];
        }
        let next = self.current_chapter + 1;
        let mut signals = vec![ChapterSignal::WorldResetRequested { next_chapter: next }];
        self.start_chapter(next);
        signals.push(ChapterSignal::ChapterStarted { chapter: next });
        signals
    }

    /// Jump to a chapter (clamped) with a fresh tally
    pub fn start_chapter(&mut self, chapter: u32) {
        self.current_chapter = chapter.clamp(1, CHAPTER_COUNT);
        self.stabilizations_this_chapter = 0;
        self.is_in_transition = false;
        self.transition_timer = 0.0;
        self.victorious = false;
        log::info!("Chapter {} started", self.current_chapter);
    }

    /// Restart after a failure.
    ///
    /// A chapter already completed keeps its credit: the pending transition
    /// is cut short and the next chapter (or victory) follows instead.
    pub fn restart_chapter(&mut self) -> ChapterSignal {
        if !self.is_in_transition {
            self.start_chapter(self.current_chapter);
            return ChapterSignal::ChapterStarted {
                chapter: self.current_chapter,
            };
        }
        self.is_in_transition = false;
        self.transition_timer = 0.0;
        if self.current_chapter >= CHAPTER_COUNT {
            self.victorious = true;
            log::info!("All {} chapters complete", CHAPTER_COUNT);
            return ChapterSignal::Victory;
        }
        let next = self.current_chapter + 1;
        self.start_chapter(next);
        ChapterSignal::ChapterStarted { chapter: next }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_monotonic() {
        for pair in CHAPTERS.windows(2) {
            assert!(pair[1].stabilizations_required > pair[0].stabilizations_required);
            assert!(pair[1].system_decay_modifier > pair[0].system_decay_modifier);
            assert!(pair[1].chaos_recovery_modifier < pair[0].chaos_recovery_modifier);
            assert!(pair[1].penalty_severity_modifier > pair[0].penalty_severity_modifier);
            assert!(pair[1].margin_of_error < pair[0].margin_of_error);
        }
        for (i, c) in CHAPTERS.iter().enumerate() {
            assert_eq!(c.chapter, i as u32 + 1);
        }
    }

    #[test]
    fn test_index_clamped() {
        assert_eq!(chapter_config(0).chapter, 1);
        assert_eq!(chapter_config(42).chapter, 10);
        assert_eq!(ChapterController::new(99).current_chapter(), 10);
    }

    #[test]
    fn test_transition_window_ignores_stabilizations() {
        let mut c = ChapterController::new(1);
        assert_eq!(c.on_node_stabilized(), Tally::Counted);
        assert_eq!(c.on_node_stabilized(), Tally::ChapterComplete { chapter: 1 });
        assert!(c.is_in_transition());
        assert_eq!(c.on_node_stabilized(), Tally::Ignored);
        assert_eq!(c.stabilizations_this_chapter(), 2);

        assert!(c.update(1.9).is_empty());
        let signals = c.update(0.2);
        assert_eq!(
            signals,
            vec![
                ChapterSignal::WorldResetRequested { next_chapter: 2 },
                ChapterSignal::ChapterStarted { chapter: 2 },
            ]
        );
        assert_eq!(c.current_chapter(), 2);
        assert_eq!(c.stabilizations_this_chapter(), 0);
        assert!(!c.is_in_transition());
    }

    #[test]
    fn test_final_chapter_is_victory() {
        let mut c = ChapterController::new(10);
        for _ in 0..29 {
            assert_eq!(c.on_node_stabilized(), Tally::Counted);
        }
        assert_eq!(c.on_node_stabilized(), Tally::ChapterComplete { chapter: 10 });
        assert_eq!(c.update(2.0), vec![ChapterSignal::Victory]);
        assert!(c.is_victorious());
        assert_eq!(c.on_node_stabilized(), Tally::Ignored);
        assert_eq!(c.current_chapter(), 10);
    }

    #[test]
    fn test_restart_mid_chapter_clears_tally() {
        let mut c = ChapterController::new(2);
        c.on_node_stabilized();
        c.on_node_stabilized();
        assert_eq!(c.restart_chapter(), ChapterSignal::ChapterStarted { chapter: 2 });
        assert_eq!(c.current_chapter(), 2);
        assert_eq!(c.stabilizations_this_chapter(), 0);
    }

    #[test]
    fn test_restart_during_transition_keeps_completion() {
        let mut c = ChapterController::new(1);
        c.on_node_stabilized();
        assert_eq!(c.on_node_stabilized(), Tally::ChapterComplete { chapter: 1 });
        assert_eq!(c.restart_chapter(), ChapterSignal::ChapterStarted { chapter: 2 });
        assert_eq!(c.current_chapter(), 2);
        assert!(!c.is_in_transition());
        assert!(c.update(5.0).is_empty());

        let mut last = ChapterController::new(10);
        for _ in 0..30 {
            last.on_node_stabilized();
        }
        assert_eq!(last.restart_chapter(), ChapterSignal::Victory);
        assert!(last.is_victorious());
    }

    #[test]
    fn test_counter_never_exceeds_requirement() {
        let mut c = ChapterController::new(3);
        for _ in 0..50 {
            c.on_node_stabilized();
            assert!(c.stabilizations_this_chapter() <= c.config().stabilizations_required);
        }
    }
}
