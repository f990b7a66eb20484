//! Game session controller
//!
//! Owns the state machine, input classifier and ritual generator for one
//! session. The render loop calls [`Game::frame`] once per animation frame:
//! the step timer advances first, then queued actions are applied in arrival
//! order.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::feedback::FeedbackDispatcher;
use crate::input::{InputClassifier, RawInput};
use crate::settings::Settings;
use crate::sim::{
    GamePhase, GameStateData, InputAction, InputOutcome, ListenerId, Ritual, RitualError,
    RitualGenerator, RitualStateMachine, RitualStep, StateChange, logic,
};

/// What happened during one [`Game::frame`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    /// The step timer ran out this frame
    pub timed_out: bool,
    /// Outcome of each queued action, in order
    pub outcomes: Vec<(InputAction, InputOutcome)>,
    /// Actions discarded because their step expired before they were applied
    pub dropped: usize,
}

pub struct Game {
    machine: RitualStateMachine,
    classifier: InputClassifier,
    generator: RitualGenerator,
    pending: VecDeque<InputAction>,
    max_frame_delta: f32,
    frame_count: u64,
}

impl Game {
    /// New session in IDLE with level 1 loaded
    pub fn new(seed: u64, settings: &Settings) -> Self {
        let generator = RitualGenerator::new(seed, settings.difficulty.clone());
        let machine = RitualStateMachine::with_min_step_time(
            generator.ritual_for_level(1),
            settings.difficulty.min_step_time,
        );
        log::info!("Session created with seed {}", seed);
        Self {
            machine,
            classifier: InputClassifier::new(settings.input.clone()),
            generator,
            pending: VecDeque::new(),
            max_frame_delta: settings.max_frame_delta,
            frame_count: 0,
        }
    }

    pub fn seed(&self) -> u64 {
        self.generator.seed()
    }

    pub fn machine(&self) -> &RitualStateMachine {
        &self.machine
    }

    pub fn current_state(&self) -> GamePhase {
        self.machine.current_state()
    }

    /// Owned snapshot for collaborators
    pub fn state_data(&self) -> GameStateData {
        self.machine.state_data()
    }

    pub fn current_step(&self) -> Option<&RitualStep> {
        self.machine.current_step()
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn pending_actions(&self) -> usize {
        self.pending.len()
    }

    pub fn on(&mut self, listener: impl FnMut(&StateChange) + 'static) -> ListenerId {
        self.machine.on(listener)
    }

    pub fn off(&mut self, id: ListenerId) -> bool {
        self.machine.off(id)
    }

    /// Route state changes through a feedback dispatcher
    pub fn attach_feedback(&mut self, dispatcher: Rc<RefCell<FeedbackDispatcher>>) -> ListenerId {
        self.machine
            .on(move |change| dispatcher.borrow_mut().dispatch(change))
    }

    /// Classify a raw event and queue the resulting action for the next frame
    pub fn submit_raw(&mut self, raw: &RawInput, now_ms: f64) -> Option<InputAction> {
        let action = self.classifier.submit(raw, now_ms)?;
        self.pending.push_back(action);
        Some(action)
    }

    /// Queue an already-canonical action for the next frame
    pub fn queue_action(&mut self, action: InputAction) {
        self.pending.push_back(action);
    }

    /// Apply an action immediately
    ///
    /// During a ritual it is checked against the live step. Outside one,
    /// START works as the menu button (start, retry, next level) and
    /// everything else is ignored.
    pub fn handle_input(&mut self, action: InputAction) -> InputOutcome {
        let phase = self.current_state();
        if phase == GamePhase::RitualStep || action != InputAction::Start {
            return logic::handle_input(&mut self.machine, action);
        }

        let handled = match phase {
            GamePhase::Idle => self.start(),
            GamePhase::MonsterMad => self.retry(),
            GamePhase::ItsAlive => self.next_level(),
            GamePhase::RitualStep => false,
        };
        if handled {
            InputOutcome::Control
        } else {
            InputOutcome::Ignored
        }
    }

    /// Advance one render frame by `dt` seconds
    pub fn frame(&mut self, dt: f32) -> FrameReport {
        self.frame_count += 1;
        let dt = if dt.is_finite() {
            dt.clamp(0.0, self.max_frame_delta)
        } else {
            0.0
        };

        let mut report = FrameReport {
            timed_out: self.machine.update_time(dt),
            ..Default::default()
        };

        if report.timed_out {
            // Anything queued was aimed at the step that just expired
            report.dropped = self.pending.len();
            self.pending.clear();
            if report.dropped > 0 {
                log::debug!("Dropped {} actions after timeout", report.dropped);
            }
            return report;
        }

        while let Some(action) = self.pending.pop_front() {
            let outcome = self.handle_input(action);
            report.outcomes.push((action, outcome));
        }
        report
    }

    /// IDLE → first step of the loaded ritual
    pub fn start(&mut self) -> bool {
        if self.current_state() != GamePhase::Idle {
            return false;
        }
        log::info!("Starting level {}", self.machine.data().level);
        logic::start_ritual_sequence(&mut self.machine)
    }

    /// MONSTER_MAD → first step again
    pub fn retry(&mut self) -> bool {
        logic::retry_ritual(&mut self.machine)
    }

    /// ITS_ALIVE → next level's ritual
    pub fn next_level(&mut self) -> bool {
        if self.current_state() != GamePhase::ItsAlive {
            return false;
        }
        let next = self.machine.data().level.saturating_add(1);
        let ritual = self.generator.ritual_for_level(next);
        logic::start_new_ritual(&mut self.machine, ritual)
    }

    /// Replace the loaded ritual with a JSON definition (IDLE only)
    ///
    /// Step times are checked against the session's minimum step time.
    pub fn load_ritual_json(&mut self, json: &str) -> Result<bool, RitualError> {
        let ritual = Ritual::from_json_with_floor(json, self.machine.min_step_time())?;
        if self.current_state() != GamePhase::Idle {
            log::warn!("Ignoring ritual definition outside IDLE");
            return Ok(false);
        }
        self.machine.load_ritual(ritual);
        Ok(true)
    }

    /// Manual reset back to IDLE; keeps the current level loaded
    pub fn reset(&mut self) -> bool {
        self.pending.clear();
        self.classifier.reset();
        self.machine.transition_to(GamePhase::Idle)
    }

    /// Drop back to level 1 in IDLE (title screen "new game")
    pub fn restart(&mut self) {
        if self.current_state() != GamePhase::Idle && !self.reset() {
            // Mid-ritual: fail the attempt first so IDLE becomes reachable
            self.machine.transition_to(GamePhase::MonsterMad);
            self.machine.transition_to(GamePhase::Idle);
        }
        self.machine.load_ritual(self.generator.ritual_for_level(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::MonsterState;

    fn game() -> Game {
        Game::new(7, &Settings::default())
    }

    fn play_correct(g: &mut Game) -> InputOutcome {
        let action = g.current_step().map(|s| s.action()).unwrap();
        g.handle_input(action)
    }

    fn wrong_action(g: &Game) -> InputAction {
        let expected = g.current_step().map(|s| s.action()).unwrap();
        InputAction::ALL.into_iter().find(|&a| a != expected).unwrap()
    }

    #[test]
    fn test_start_button_drives_menus() {
        let mut g = game();
        assert_eq!(g.current_state(), GamePhase::Idle);
        assert_eq!(g.handle_input(InputAction::ButtonA), InputOutcome::Ignored);
        assert_eq!(g.handle_input(InputAction::Start), InputOutcome::Control);
        assert_eq!(g.current_state(), GamePhase::RitualStep);

        let wrong = wrong_action(&g);
        assert_eq!(g.handle_input(wrong), InputOutcome::Failed);
        assert_eq!(g.handle_input(InputAction::Start), InputOutcome::Control);
        assert_eq!(g.current_state(), GamePhase::RitualStep);
        assert_eq!(g.state_data().mistake_count, 0);
    }

    #[test]
    fn test_clear_level_then_next() {
        let mut g = game();
        g.start();
        let steps = g.state_data().ritual.len();
        for _ in 1..steps {
            assert_eq!(play_correct(&mut g), InputOutcome::StepCleared);
        }
        assert_eq!(play_correct(&mut g), InputOutcome::RitualComplete);
        assert_eq!(g.state_data().monster_state, MonsterState::Alive);

        assert!(g.next_level());
        let data = g.state_data();
        assert_eq!(data.level, 2);
        assert_eq!(data.phase, GamePhase::RitualStep);
        assert_eq!(data.step_index, 0);
    }

    #[test]
    fn test_frame_applies_queue_after_timer() {
        let mut g = game();
        g.start();
        let first = g.current_step().map(|s| s.action()).unwrap();
        g.queue_action(first);
        let report = g.frame(0.05);
        assert!(!report.timed_out);
        assert_eq!(report.outcomes, vec![(first, InputOutcome::StepCleared)]);
        assert_eq!(g.state_data().step_index, 1);
        assert_eq!(g.pending_actions(), 0);
    }

    #[test]
    fn test_timeout_drops_queued_actions() {
        let mut g = Game::new(
            7,
            &Settings {
                max_frame_delta: 100.0,
                ..Default::default()
            },
        );
        g.start();
        let wrong = wrong_action(&g);
        g.queue_action(wrong);
        g.queue_action(InputAction::Start);
        let report = g.frame(60.0);
        assert!(report.timed_out);
        assert_eq!(report.dropped, 2);
        assert_eq!(g.current_state(), GamePhase::MonsterMad);
        // Timeout isn't a mistake
        assert_eq!(g.state_data().mistake_count, 0);
    }

    #[test]
    fn test_frame_delta_is_capped() {
        let mut g = game();
        g.start();
        let before = g.state_data().time_remaining;
        g.frame(30.0);
        let after = g.state_data().time_remaining;
        assert!((before - after - Settings::default().max_frame_delta).abs() < 1e-4);
        g.frame(f32::NAN);
        assert_eq!(g.state_data().time_remaining, after);
        assert_eq!(g.frame_count(), 2);
    }

    #[test]
    fn test_reset_and_restart() {
        let mut g = game();
        assert!(!g.reset());
        g.start();
        assert!(!g.reset());
        let wrong = wrong_action(&g);
        g.handle_input(wrong);
        assert!(g.reset());
        assert_eq!(g.current_state(), GamePhase::Idle);
        assert_eq!(g.state_data().madness_level, 0);

        g.start();
        for _ in 0..g.state_data().ritual.len() {
            play_correct(&mut g);
        }
        g.next_level();
        assert_eq!(g.state_data().level, 2);
        g.restart();
        assert_eq!(g.current_state(), GamePhase::Idle);
        assert_eq!(g.state_data().level, 1);
    }

    #[test]
    fn test_short_step_floor_from_settings() {
        let settings = Settings::from_json(
            r#"{"difficulty": {"base_step_time": 0.8, "min_step_time": 0.5}}"#,
        )
        .unwrap();
        let mut g = Game::new(3, &settings);
        assert_eq!(g.state_data().time_remaining, 0.8);
        g.start();
        assert_eq!(g.state_data().time_remaining, 0.8);
        assert_eq!(g.machine().min_step_time(), 0.5);
    }

    #[test]
    fn test_configured_frame_cap_is_used() {
        let settings = Settings::from_json(r#"{"max_frame_delta": 0.5}"#).unwrap();
        let mut g = Game::new(7, &settings);
        g.start();
        let before = g.state_data().time_remaining;
        g.frame(0.3);
        assert!((before - g.state_data().time_remaining - 0.3).abs() < 1e-4);
        g.frame(2.0);
        assert!((before - g.state_data().time_remaining - 0.8).abs() < 1e-4);
    }

    #[test]
    fn test_load_ritual_json() {
        let mut g = game();
        let json = r#"{"level": 4, "steps": [
            {"name": "Zap", "prompt": "ZAP!", "action": "BUTTON_B", "time_limit": 3.0}
        ], "base_time_limit": 5.0, "time_multiplier": 1.0}"#;
        assert!(g.load_ritual_json(json).unwrap());
        assert_eq!(g.state_data().level, 4);
        assert_eq!(g.state_data().ritual.len(), 1);

        assert!(matches!(g.load_ritual_json("{"), Err(RitualError::Parse(_))));
        g.start();
        assert!(!g.load_ritual_json(json).unwrap());
        assert_eq!(g.current_state(), GamePhase::RitualStep);
    }

    #[test]
    fn test_next_level_at_max_level() {
        let mut g = game();
        let json = format!(
            r#"{{"level": {}, "steps": [
                {{"name": "Zap", "prompt": "ZAP!", "action": "START", "time_limit": 3.0}}
            ], "base_time_limit": 5.0, "time_multiplier": 1.0}}"#,
            u32::MAX
        );
        g.load_ritual_json(&json).unwrap();
        g.start();
        assert_eq!(g.handle_input(InputAction::Start), InputOutcome::RitualComplete);
        assert!(g.next_level());
        assert_eq!(g.state_data().level, u32::MAX);
        assert_eq!(g.current_state(), GamePhase::RitualStep);
    }

    #[test]
    fn test_raw_input_is_queued() {
        let mut g = game();
        assert_eq!(g.submit_raw(&RawInput::Key("Enter".into()), 0.0), Some(InputAction::Start));
        assert_eq!(g.submit_raw(&RawInput::Key("Enter".into()), 5.0), None);
        assert_eq!(g.submit_raw(&RawInput::Miss, 6.0), None);
        assert_eq!(g.pending_actions(), 1);
        g.frame(0.016);
        assert_eq!(g.current_state(), GamePhase::RitualStep);
    }
}
