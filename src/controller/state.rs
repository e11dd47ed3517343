//! Behavioral state and time-in-state tracking

use serde::{Deserialize, Serialize};

use crate::core::types::Seconds;

/// The bot's behavioral state
///
/// Transitions are driven by perception results and by recovery; any
/// transition is legal at this level, policy lives in the callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AiState {
    #[default]
    Exploring,
    SeekingKey,
    SeekingDoor,
    GoingToExit,
}

impl std::fmt::Display for AiState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AiState::Exploring => "Exploring",
            AiState::SeekingKey => "Seeking Key",
            AiState::SeekingDoor => "Seeking Door",
            AiState::GoingToExit => "Going To Exit",
        };
        write!(f, "{name}")
    }
}

/// Current state plus how long the bot has been in it
///
/// The duration accumulator feeds the state watchdog: a bot sitting in
/// one state past the configured ceiling is treated as a failed task.
#[derive(Debug, Clone, Default)]
pub struct StateTracker {
    current: AiState,
    last: AiState,
    time_in_state: Seconds,
}

impl StateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> AiState {
        self.current
    }

    pub fn time_in_state(&self) -> Seconds {
        self.time_in_state
    }

    /// Switch state. No validation; same-state writes keep the timer.
    pub fn set_state(&mut self, state: AiState) {
        self.current = state;
    }

    /// Accumulate time, resetting the timer when the state changed
    /// since the previous accumulation.
    pub fn accumulate(&mut self, dt: Seconds) {
        if self.current == self.last {
            self.time_in_state += dt;
        } else {
            self.time_in_state = 0.0;
            self.last = self.current;
        }
    }

    /// Zero the duration timer without touching the state
    pub fn reset_timer(&mut self) {
        self.time_in_state = 0.0;
        self.last = self.current;
    }

    /// Return to the initial state with a fresh timer
    pub fn reset(&mut self) {
        self.current = AiState::Exploring;
        self.last = AiState::Exploring;
        self.time_in_state = 0.0;
    }
}
