//! It's Alive! - ritual console gameplay core
//!
//! Core modules:
//! - `sim`: Deterministic ritual simulation (state machine, rituals, difficulty)
//! - `input`: Raw key/mesh input classification and debouncing
//! - `feedback`: State change → render/audio cue dispatch
//! - `game`: Per-frame session controller tying it all together
//! - `platform`: Browser/native platform abstraction
//! - `settings`: Player-tunable configuration

#[cfg(target_arch = "wasm32")]
pub mod audio;
pub mod feedback;
pub mod game;
pub mod input;
pub mod platform;
pub mod settings;
pub mod sim;

pub use feedback::{FeedbackCue, FeedbackDispatcher, FeedbackSink};
pub use game::Game;
pub use input::{InputClassifier, MeshHit, RawInput};
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Per-action debounce window (milliseconds)
    pub const DEBOUNCE_WINDOW_MS: f64 = 50.0;

    /// No step may ever be shorter than this (seconds)
    pub const MIN_STEP_TIME: f32 = 1.0;
    /// Time limit used when a ritual arrives with no steps (seconds)
    pub const FALLBACK_STEP_TIME: f32 = 5.0;
    /// Base per-step time limit for level 1 (seconds)
    pub const BASE_STEP_TIME: f32 = 5.0;

    /// Time discount per level above 1 (fraction of base)
    pub const LEVEL_TIME_DISCOUNT: f32 = 0.05;
    /// Lowest time multiplier the discount may reach
    pub const MIN_TIME_MULTIPLIER: f32 = 0.6;
    /// One extra step is appended every this many levels
    pub const LEVELS_PER_EXTRA_STEP: u32 = 3;
    /// Most extra steps a ritual can gain
    pub const MAX_EXTRA_STEPS: usize = 24;

    /// Madness at or above this makes the monster ANGRY
    pub const ANGRY_MADNESS: u32 = 3;
    /// Madness at or above this makes the monster NERVOUS
    pub const NERVOUS_MADNESS: u32 = 1;

    /// Largest frame delta fed to the simulation (seconds)
    pub const MAX_FRAME_DELTA: f32 = 0.1;

    /// Joystick hits closer than this to the stick centre use the default direction
    pub const JOYSTICK_DEAD_ZONE: f32 = 0.02;
}
