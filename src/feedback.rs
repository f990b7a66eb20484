//! Feedback dispatch
//!
//! Turns state machine transitions into render/audio cues and hands them to
//! registered sinks. Sinks only ever see cue values built from snapshots.

use serde::Serialize;

use crate::sim::{GamePhase, InputAction, MonsterState, StateChange, SurgicalObject};

/// Something the screen, 3D scene or speakers should react to
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "cue", rename_all = "snake_case")]
pub enum FeedbackCue {
    /// A new step is live: show its prompt and play the surgeon animation
    StepPrompt {
        level: u32,
        step_index: usize,
        step_count: usize,
        name: String,
        prompt: String,
        action: InputAction,
        animation: String,
        object: Option<SurgicalObject>,
        time_limit: f32,
    },
    /// The step at `step_index` was performed correctly
    StepCleared { step_index: usize },
    /// EKG mood at the start of an attempt
    MonsterMood {
        state: MonsterState,
        heart_rate_bpm: u32,
    },
    /// Wrong action or timeout
    Flatline { timed_out: bool, mistakes: u32 },
    ItsAlive { level: u32 },
    /// Back to the title screen
    Reset,
}

/// Receiver of feedback cues (renderer, audio, test recorder...)
pub trait FeedbackSink {
    fn deliver(&mut self, cue: &FeedbackCue);
}

impl<F: FnMut(&FeedbackCue)> FeedbackSink for F {
    fn deliver(&mut self, cue: &FeedbackCue) {
        self(cue)
    }
}

/// Cues for one transition, in the order they should be presented
pub fn cues_for(change: &StateChange) -> Vec<FeedbackCue> {
    let data = &change.data;
    let mut cues = Vec::new();

    match change.phase {
        GamePhase::RitualStep => {
            if change.previous == GamePhase::RitualStep {
                cues.push(FeedbackCue::StepCleared {
                    step_index: data.step_index.saturating_sub(1),
                });
            } else {
                cues.push(FeedbackCue::MonsterMood {
                    state: data.monster_state,
                    heart_rate_bpm: data.monster_state.heart_rate_bpm(),
                });
            }
            if let Some(step) = data.current_step() {
                cues.push(FeedbackCue::StepPrompt {
                    level: data.level,
                    step_index: data.step_index,
                    step_count: data.ritual.len(),
                    name: step.name().to_string(),
                    prompt: step.prompt().to_string(),
                    action: step.action(),
                    animation: step.animation().to_string(),
                    object: step.object(),
                    time_limit: step.time_limit(),
                });
            }
        }
        GamePhase::MonsterMad => {
            cues.push(FeedbackCue::Flatline {
                timed_out: data.time_remaining <= 0.0,
                mistakes: data.mistake_count,
            });
        }
        GamePhase::ItsAlive => {
            cues.push(FeedbackCue::StepCleared {
                step_index: data.step_index.saturating_sub(1),
            });
            cues.push(FeedbackCue::ItsAlive { level: data.level });
        }
        GamePhase::Idle => cues.push(FeedbackCue::Reset),
    }

    cues
}

#[derive(Default)]
pub struct FeedbackDispatcher {
    sinks: Vec<Box<dyn FeedbackSink>>,
}

impl FeedbackDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_sink(&mut self, sink: impl FeedbackSink + 'static) {
        self.sinks.push(Box::new(sink));
    }

    pub fn dispatch(&mut self, change: &StateChange) {
        let cues = cues_for(change);
        for cue in &cues {
            for sink in self.sinks.iter_mut() {
                sink.deliver(cue);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::sim::{
        Ritual, RitualStateMachine, RitualStep, handle_input, start_ritual_sequence,
    };

    fn recorded_run(actions: &[InputAction]) -> Vec<FeedbackCue> {
        let ritual = Ritual::new(
            1,
            vec![
                RitualStep::new("Cut", "CUT!", InputAction::Down, 3.0),
                RitualStep::new("Zap", "ZAP!", InputAction::ButtonA, 3.0),
            ],
            5.0,
            1.0,
        );
        let mut machine = RitualStateMachine::new(ritual);
        let cues = Rc::new(RefCell::new(Vec::new()));

        let mut dispatcher = FeedbackDispatcher::new();
        let sink = cues.clone();
        dispatcher.add_sink(move |cue: &FeedbackCue| sink.borrow_mut().push(cue.clone()));
        machine.on(move |change| dispatcher.dispatch(change));

        start_ritual_sequence(&mut machine);
        for &a in actions {
            handle_input(&mut machine, a);
        }
        cues.take()
    }

    #[test]
    fn test_successful_run_cues() {
        let cues = recorded_run(&[InputAction::Down, InputAction::ButtonA]);
        assert!(matches!(cues[0], FeedbackCue::MonsterMood { state: MonsterState::Calm, .. }));
        assert!(matches!(&cues[1], FeedbackCue::StepPrompt { prompt, .. } if prompt == "CUT!"));
        assert_eq!(cues[2], FeedbackCue::StepCleared { step_index: 0 });
        assert!(matches!(&cues[3], FeedbackCue::StepPrompt { step_index: 1, .. }));
        assert_eq!(cues[4], FeedbackCue::StepCleared { step_index: 1 });
        assert_eq!(cues[5], FeedbackCue::ItsAlive { level: 1 });
        assert_eq!(cues.len(), 6);
    }

    #[test]
    fn test_wrong_action_flatlines() {
        let cues = recorded_run(&[InputAction::Up]);
        assert_eq!(
            cues.last(),
            Some(&FeedbackCue::Flatline {
                timed_out: false,
                mistakes: 1
            })
        );
    }

    #[test]
    fn test_cue_json_shape() {
        let json = serde_json::to_string(&FeedbackCue::ItsAlive { level: 2 }).unwrap();
        assert_eq!(json, r#"{"cue":"its_alive","level":2}"#);
    }
}
