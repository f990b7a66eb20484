//! Difficulty scaling and ritual generation
//!
//! Level N's ritual is the base step list with a discounted time limit and
//! one extra step appended every few levels. Time limits never increase and
//! step counts never decrease as the level goes up.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::catalog::{BASE_STEPS, EXTRA_STEPS};
use super::ritual::Ritual;
use crate::consts::*;

/// Data-driven difficulty curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyConfig {
    /// Level 1 per-step time limit (seconds)
    pub base_step_time: f32,
    /// Fraction of base time removed per level above 1
    pub discount_per_level: f32,
    /// The multiplier never drops below this
    pub min_multiplier: f32,
    /// Append one extra step every this many levels (0 = never)
    pub levels_per_extra_step: u32,
    /// Hard floor for any step's time limit (seconds)
    pub min_step_time: f32,
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        Self {
            base_step_time: BASE_STEP_TIME,
            discount_per_level: LEVEL_TIME_DISCOUNT,
            min_multiplier: MIN_TIME_MULTIPLIER,
            levels_per_extra_step: LEVELS_PER_EXTRA_STEP,
            min_step_time: MIN_STEP_TIME,
        }
    }
}

impl DifficultyConfig {
    /// Time multiplier for `level` (1.0 at level 1, never above 1.0)
    pub fn time_multiplier(&self, level: u32) -> f32 {
        let above = level.max(1) - 1;
        let floor = self.min_multiplier.clamp(0.0, 1.0);
        let raw = 1.0 - self.discount_per_level * above as f32;
        if raw.is_finite() { raw.clamp(floor, 1.0) } else { floor }
    }

    /// Per-step time limit for `level`, clamped to `min_step_time`
    pub fn step_time(&self, level: u32) -> f32 {
        let t = self.base_step_time * self.time_multiplier(level);
        if t.is_finite() { t.max(self.min_step_time) } else { self.min_step_time }
    }

    /// Steps appended on top of the base list at `level`, at most `MAX_EXTRA_STEPS`
    pub fn extra_steps(&self, level: u32) -> usize {
        match self.levels_per_extra_step {
            0 => 0,
            n => (((level.max(1) - 1) / n) as usize).min(MAX_EXTRA_STEPS),
        }
    }
}

/// Builds rituals from a run seed
#[derive(Debug, Clone)]
pub struct RitualGenerator {
    seed: u64,
    config: DifficultyConfig,
}

impl RitualGenerator {
    pub fn new(seed: u64, config: DifficultyConfig) -> Self {
        Self { seed, config }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Ritual for `level` (level 0 is treated as 1)
    pub fn ritual_for_level(&self, level: u32) -> Ritual {
        ritual_for_level(level, self.seed, &self.config)
    }
}

/// Deterministic ritual for (`level`, `seed`)
pub fn ritual_for_level(level: u32, seed: u64, config: &DifficultyConfig) -> Ritual {
    let level = level.max(1);
    // Each level gets its own stream so variants don't depend on play order
    let mut rng = Pcg32::seed_from_u64(seed ^ u64::from(level).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    let time = config.step_time(level);

    let mut steps: Vec<_> = BASE_STEPS.iter().map(|t| t.build(&mut rng, time)).collect();
    for i in 0..config.extra_steps(level) {
        steps.push(EXTRA_STEPS[i % EXTRA_STEPS.len()].build(&mut rng, time));
    }

    Ritual::new(level, steps, config.base_step_time, config.time_multiplier(level))
}
