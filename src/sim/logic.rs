//! Ritual orchestration
//!
//! Thin functions that pair data updates on the state machine with the
//! matching transition. Input arriving outside `RitualStep` is ignored here.

use super::machine::{RitualStateMachine, StepAdvance};
use super::ritual::{InputAction, Ritual};
use super::state::GamePhase;

/// What a submitted action did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOutcome {
    /// No live step (or START used as a menu control by the session)
    Ignored,
    /// Correct, and another step is now live
    StepCleared,
    /// Correct, and that was the last step
    RitualComplete,
    /// Wrong action; the monster went mad
    Failed,
    /// START pressed outside a ritual and acted on by the session
    Control,
}

/// IDLE → RITUAL_STEP (also used after loading a new ritual)
pub fn start_ritual_sequence(machine: &mut RitualStateMachine) -> bool {
    machine.transition_to(GamePhase::RitualStep)
}

pub fn validate_action(action: InputAction, expected: InputAction) -> bool {
    action == expected
}

/// Advance past the current step and transition accordingly
pub fn complete_ritual_step(machine: &mut RitualStateMachine) -> Option<StepAdvance> {
    if machine.current_state() != GamePhase::RitualStep {
        return None;
    }
    let advance = machine.advance_step();
    let target = match advance {
        StepAdvance::RitualComplete => GamePhase::ItsAlive,
        StepAdvance::MoreRemain => GamePhase::RitualStep,
    };
    machine.transition_to(target);
    Some(advance)
}

/// Wrong-action failure: one mistake, then MONSTER_MAD
///
/// A step that already timed out this tick is no longer live, so a late
/// wrong action neither counts as a mistake nor transitions again.
pub fn handle_ritual_failure(machine: &mut RitualStateMachine) -> bool {
    if machine.current_state() != GamePhase::RitualStep {
        return false;
    }
    machine.register_mistake();
    machine.transition_to(GamePhase::MonsterMad)
}

/// Rewind to step one after the monster went mad
pub fn retry_ritual(machine: &mut RitualStateMachine) -> bool {
    if machine.current_state() != GamePhase::MonsterMad {
        log::warn!("Retry requested from {}", machine.current_state().as_str());
        return false;
    }
    machine.reset_to_first_step();
    machine.transition_to(GamePhase::RitualStep)
}

/// Load `ritual` and start it
pub fn start_new_ritual(machine: &mut RitualStateMachine, ritual: Ritual) -> bool {
    machine.load_ritual(ritual);
    start_ritual_sequence(machine)
}

/// Check `action` against the live step and apply the result
pub fn handle_input(machine: &mut RitualStateMachine, action: InputAction) -> InputOutcome {
    if machine.current_state() != GamePhase::RitualStep {
        return InputOutcome::Ignored;
    }
    let Some(expected) = machine.current_step().map(|s| s.action()) else {
        return InputOutcome::Ignored;
    };

    if validate_action(action, expected) {
        match complete_ritual_step(machine) {
            Some(StepAdvance::MoreRemain) => InputOutcome::StepCleared,
            Some(StepAdvance::RitualComplete) => InputOutcome::RitualComplete,
            None => InputOutcome::Ignored,
        }
    } else {
        log::debug!("Expected {}, got {}", expected.as_str(), action.as_str());
        handle_ritual_failure(machine);
        InputOutcome::Failed
    }
}
