//! Ritual and step definitions
//!
//! A ritual is one level's ordered list of steps. Rituals are plain records
//! (level, steps, base time, multiplier) so they can be generated, written to
//! JSON, or handed in by tooling. Anything that arrives from outside is
//! validated or sanitized before the state machine uses it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Canonical input actions, independent of the device that produced them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InputAction {
    Up,
    Down,
    Left,
    Right,
    ButtonA,
    ButtonB,
    Start,
}

impl InputAction {
    pub const ALL: [InputAction; 7] = [
        InputAction::Up,
        InputAction::Down,
        InputAction::Left,
        InputAction::Right,
        InputAction::ButtonA,
        InputAction::ButtonB,
        InputAction::Start,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InputAction::Up => "UP",
            InputAction::Down => "DOWN",
            InputAction::Left => "LEFT",
            InputAction::Right => "RIGHT",
            InputAction::ButtonA => "BUTTON_A",
            InputAction::ButtonB => "BUTTON_B",
            InputAction::Start => "START",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(s))
    }

    /// True for the four stick/d-pad directions
    pub fn is_direction(&self) -> bool {
        matches!(
            self,
            InputAction::Up | InputAction::Down | InputAction::Left | InputAction::Right
        )
    }
}

/// Prop the surgeon handles during a step (drawn on the screen mesh)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SurgicalObject {
    Scalpel,
    Forceps,
    Syringe,
    Sutures,
    Electrodes,
    Brain,
    Heart,
    Lever,
}

/// One required action with its prompt and time limit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RitualStep {
    name: String,
    prompt: String,
    action: InputAction,
    /// Seconds the player has to perform the action
    time_limit: f32,
    #[serde(default)]
    object: Option<SurgicalObject>,
    #[serde(default)]
    animation: String,
}

impl RitualStep {
    /// Non-positive or non-finite time limits become `MIN_STEP_TIME`; any
    /// other floor is enforced by [`Ritual::sanitized`]
    pub fn new(
        name: impl Into<String>,
        prompt: impl Into<String>,
        action: InputAction,
        time_limit: f32,
    ) -> Self {
        Self {
            name: name.into(),
            prompt: prompt.into(),
            action,
            time_limit: if time_limit.is_finite() && time_limit > 0.0 {
                time_limit
            } else {
                MIN_STEP_TIME
            },
            object: None,
            animation: String::new(),
        }
    }

    pub fn with_object(mut self, object: SurgicalObject) -> Self {
        self.object = Some(object);
        self
    }

    pub fn with_animation(mut self, animation: impl Into<String>) -> Self {
        self.animation = animation.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn action(&self) -> InputAction {
        self.action
    }

    pub fn time_limit(&self) -> f32 {
        self.time_limit
    }

    pub fn object(&self) -> Option<SurgicalObject> {
        self.object
    }

    /// Surgeon animation key played by the 3D scene
    pub fn animation(&self) -> &str {
        &self.animation
    }
}

/// Problems found in a ritual definition
#[derive(Debug, Error)]
pub enum RitualError {
    #[error("ritual JSON is malformed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("ritual level must be at least 1")]
    InvalidLevel,
    #[error("ritual has no steps")]
    NoSteps,
    #[error("time multiplier {0} must be a positive finite number")]
    InvalidMultiplier(f32),
    #[error("step {step} time limit {value} is below the {min}s floor")]
    InvalidTimeLimit { step: usize, value: f32, min: f32 },
}

/// One level's ordered sequence of steps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ritual {
    level: u32,
    steps: Vec<RitualStep>,
    /// Undiscounted per-step time limit (seconds)
    base_time_limit: f32,
    /// Discount applied to `base_time_limit` for this level
    time_multiplier: f32,
}

impl Ritual {
    pub fn new(level: u32, steps: Vec<RitualStep>, base_time_limit: f32, time_multiplier: f32) -> Self {
        Self {
            level,
            steps,
            base_time_limit,
            time_multiplier,
        }
    }

    /// Minimal one-step ritual used when a definition has no steps
    pub fn fallback(level: u32, min_step_time: f32) -> Self {
        let time = FALLBACK_STEP_TIME.max(min_step_time);
        let step = RitualStep::new("Pull The Lever", "PULL THE LEVER!", InputAction::ButtonA, time)
            .with_object(SurgicalObject::Lever)
            .with_animation("surgeon_lever");
        Self::new(level.max(1), vec![step], time, 1.0)
    }

    /// Parse and validate a ritual definition against the default floor
    pub fn from_json(json: &str) -> Result<Self, RitualError> {
        Self::from_json_with_floor(json, MIN_STEP_TIME)
    }

    /// Parse and validate, rejecting step times below `min_step_time`
    pub fn from_json_with_floor(json: &str, min_step_time: f32) -> Result<Self, RitualError> {
        let ritual: Ritual = serde_json::from_str(json)?;
        ritual.validate(min_step_time)?;
        Ok(ritual)
    }

    pub fn to_json(&self) -> Result<String, RitualError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Report the first problem that would make this ritual unsafe to play
    pub fn validate(&self, min_step_time: f32) -> Result<(), RitualError> {
        if self.level == 0 {
            return Err(RitualError::InvalidLevel);
        }
        if self.steps.is_empty() {
            return Err(RitualError::NoSteps);
        }
        if !self.time_multiplier.is_finite() || self.time_multiplier <= 0.0 {
            return Err(RitualError::InvalidMultiplier(self.time_multiplier));
        }
        for (step, s) in self.steps.iter().enumerate() {
            if !s.time_limit.is_finite() || s.time_limit < min_step_time {
                return Err(RitualError::InvalidTimeLimit {
                    step,
                    value: s.time_limit,
                    min: min_step_time,
                });
            }
        }
        Ok(())
    }

    /// Repair whatever `validate` would reject
    ///
    /// Zero-step rituals become the one-step fallback; time limits below the
    /// floor are clamped up to it. The step order is never changed.
    pub fn sanitized(mut self, min_step_time: f32) -> Self {
        while let Err(err) = self.validate(min_step_time) {
            log::warn!("Repairing level {} ritual: {}", self.level, err);
            match err {
                RitualError::InvalidLevel => self.level = 1,
                RitualError::NoSteps => return Self::fallback(self.level, min_step_time),
                RitualError::InvalidMultiplier(_) => self.time_multiplier = 1.0,
                RitualError::InvalidTimeLimit { step, .. } => {
                    let s = &mut self.steps[step];
                    s.time_limit = clamp_time(s.time_limit, min_step_time);
                }
                RitualError::Parse(_) => break,
            }
        }
        if !self.base_time_limit.is_finite() || self.base_time_limit < min_step_time {
            self.base_time_limit = clamp_time(self.base_time_limit, min_step_time);
        }
        self
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn steps(&self) -> &[RitualStep] {
        &self.steps
    }

    pub fn step(&self, index: usize) -> Option<&RitualStep> {
        self.steps.get(index)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn base_time_limit(&self) -> f32 {
        self.base_time_limit
    }

    pub fn time_multiplier(&self) -> f32 {
        self.time_multiplier
    }
}

/// Raise a time limit to `min`, treating NaN/inf as the floor
fn clamp_time(value: f32, min: f32) -> f32 {
    if value.is_finite() { value.max(min) } else { min }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(action: InputAction, time: f32) -> RitualStep {
        RitualStep::new("Cut", "CUT!", action, time)
    }

    #[test]
    fn test_step_clamps_bad_time_limits() {
        assert_eq!(step(InputAction::Up, 0.0).time_limit(), MIN_STEP_TIME);
        assert_eq!(step(InputAction::Up, -3.0).time_limit(), MIN_STEP_TIME);
        assert_eq!(step(InputAction::Up, f32::NAN).time_limit(), MIN_STEP_TIME);
        assert_eq!(step(InputAction::Up, 4.5).time_limit(), 4.5);
        // Short but positive limits are kept; the floor is applied later
        assert_eq!(step(InputAction::Up, 0.4).time_limit(), 0.4);
    }

    #[test]
    fn test_from_json_with_floor() {
        let json = r#"{"level": 1, "steps": [
            {"name": "A", "prompt": "A!", "action": "UP", "time_limit": 0.7}
        ], "base_time_limit": 0.7, "time_multiplier": 1.0}"#;
        assert!(matches!(
            Ritual::from_json(json),
            Err(RitualError::InvalidTimeLimit { step: 0, .. })
        ));
        let ritual = Ritual::from_json_with_floor(json, 0.5).unwrap();
        assert_eq!(ritual.steps()[0].time_limit(), 0.7);
    }

    #[test]
    fn test_action_names() {
        for action in InputAction::ALL {
            assert_eq!(InputAction::from_str(action.as_str()), Some(action));
        }
        assert_eq!(InputAction::from_str("button_a"), Some(InputAction::ButtonA));
        assert_eq!(InputAction::from_str("kick"), None);
        assert!(InputAction::Left.is_direction());
        assert!(!InputAction::Start.is_direction());
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "level": 2,
            "steps": [
                {"name": "Incision", "prompt": "CUT!", "action": "DOWN", "time_limit": 4.0,
                 "object": "SCALPEL", "animation": "surgeon_cut"},
                {"name": "Zap", "prompt": "ZAP!", "action": "BUTTON_A", "time_limit": 3.0}
            ],
            "base_time_limit": 5.0,
            "time_multiplier": 0.95
        }"#;
        let ritual = Ritual::from_json(json).unwrap();
        assert_eq!(ritual.level(), 2);
        assert_eq!(ritual.len(), 2);
        assert_eq!(ritual.steps()[0].object(), Some(SurgicalObject::Scalpel));
        assert_eq!(ritual.steps()[1].object(), None);
        assert_eq!(ritual.steps()[1].animation(), "");

        let again = Ritual::from_json(&ritual.to_json().unwrap()).unwrap();
        assert_eq!(again, ritual);
    }

    #[test]
    fn test_from_json_rejects_bad_definitions() {
        let empty = r#"{"level": 1, "steps": [], "base_time_limit": 5.0, "time_multiplier": 1.0}"#;
        assert!(matches!(Ritual::from_json(empty), Err(RitualError::NoSteps)));

        let zero_time = r#"{"level": 1, "steps": [
            {"name": "A", "prompt": "A!", "action": "UP", "time_limit": 0.0}
        ], "base_time_limit": 5.0, "time_multiplier": 1.0}"#;
        assert!(matches!(
            Ritual::from_json(zero_time),
            Err(RitualError::InvalidTimeLimit { step: 0, .. })
        ));

        assert!(matches!(Ritual::from_json("{"), Err(RitualError::Parse(_))));
    }

    #[test]
    fn test_sanitize_zero_steps_uses_fallback() {
        let ritual = Ritual::new(3, Vec::new(), 5.0, 0.9).sanitized(MIN_STEP_TIME);
        assert_eq!(ritual.level(), 3);
        assert_eq!(ritual.len(), 1);
        assert_eq!(ritual.steps()[0].time_limit(), FALLBACK_STEP_TIME);
        assert!(ritual.validate(MIN_STEP_TIME).is_ok());
    }

    #[test]
    fn test_sanitize_clamps_to_configured_floor() {
        let ritual = Ritual::new(
            0,
            vec![step(InputAction::Up, 1.2), step(InputAction::Down, 4.0)],
            0.5,
            -1.0,
        )
        .sanitized(2.0);
        assert_eq!(ritual.level(), 1);
        assert_eq!(ritual.time_multiplier(), 1.0);
        assert_eq!(ritual.base_time_limit(), 2.0);
        assert_eq!(ritual.steps()[0].time_limit(), 2.0);
        assert_eq!(ritual.steps()[1].time_limit(), 4.0);
        assert_eq!(ritual.steps()[0].action(), InputAction::Up);
    }
}
