//! Input and pacing policy around a [`Game`].
//!
//! The engine has no clock and no notion of pausing. This module decides
//! which commands reach it and how often gravity should run; the caller
//! owns the actual timer.

use std::time::Duration;

use tracing::debug;

use crate::game::{Game, Snapshot};

// ============================================================================
// Configuration
// ============================================================================

// Timing (in milliseconds)
const BASE_TICK_MS: u64 = 1000;
const MIN_TICK_MS: u64 = 100;
const SPEED_INCREASE_PER_LEVEL: u64 = 100;

/// Delay between gravity steps at `level`.
pub fn gravity_interval(level: u32) -> Duration {
    let speed_reduction = u64::from(level) * SPEED_INCREASE_PER_LEVEL;
    let ms = BASE_TICK_MS.saturating_sub(speed_reduction).max(MIN_TICK_MS);
    Duration::from_millis(ms)
}

// ============================================================================
// Types
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Input {
    /// Start, pause/resume, or restart after game over.
    Enter,
    Left,
    Right,
    Rotate,
    SoftDrop,
}

/// Which screen the front-end should draw.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Screen {
    Start,
    Playing,
    Paused,
    GameOver,
}

// ============================================================================
// Controller
// ============================================================================

pub struct Controller {
    game: Game,
    started: bool,
    playing: bool,
}

impl Controller {
    pub fn new(game: Game) -> Self {
        Self {
            game,
            started: false,
            playing: false,
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        self.game.snapshot()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn screen(&self) -> Screen {
        if self.game.is_game_over() {
            Screen::GameOver
        } else if self.playing {
            Screen::Playing
        } else if self.started {
            Screen::Paused
        } else {
            Screen::Start
        }
    }

    /// Current gravity delay; follows the level as lines are cleared.
    pub fn gravity_interval(&self) -> Duration {
        gravity_interval(self.game.level())
    }

    pub fn handle(&mut self, input: Input) {
        match input {
            Input::Enter if self.game.is_game_over() => {
                self.game.reset();
                self.play();
            }
            Input::Enter if self.playing => self.pause(),
            Input::Enter => self.play(),
            // Gameplay keys are ignored unless a game is running.
            _ if !self.playing || self.game.is_game_over() => {}
            Input::Left => self.game.move_left(),
            Input::Right => self.game.move_right(),
            Input::Rotate => self.game.rotate(),
            Input::SoftDrop => self.game.step(),
        }
    }

    /// Gravity tick from the driver's timer.
    pub fn tick(&mut self) {
        if self.playing {
            self.game.step();
        }
    }

    fn play(&mut self) {
        self.started = true;
        self.playing = true;
        debug!("playing");
    }

    fn pause(&mut self) {
        self.playing = false;
        debug!("paused");
    }
}
