//! Input classification
//!
//! Turns raw device events (keyboard codes, raycast hits on the console
//! mesh) into canonical [`InputAction`]s. Repeats of the same action inside
//! the debounce window are dropped; different actions never block each
//! other. The classifier knows nothing about the ritual in progress.

use std::collections::{BTreeMap, HashMap};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::sim::{InputAction, ListenerId};

/// Keyboard `code`/`key` values and the action they produce
pub const KEY_BINDINGS: &[(&str, InputAction)] = &[
    ("ArrowUp", InputAction::Up),
    ("KeyW", InputAction::Up),
    ("ArrowDown", InputAction::Down),
    ("KeyS", InputAction::Down),
    ("ArrowLeft", InputAction::Left),
    ("KeyA", InputAction::Left),
    ("ArrowRight", InputAction::Right),
    ("KeyD", InputAction::Right),
    ("KeyZ", InputAction::ButtonA),
    ("KeyJ", InputAction::ButtonA),
    ("Space", InputAction::ButtonA),
    ("KeyX", InputAction::ButtonB),
    ("KeyK", InputAction::ButtonB),
    ("Enter", InputAction::Start),
    ("NumpadEnter", InputAction::Start),
];

/// Console mesh regions that can be clicked/tapped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshZone {
    /// Joystick or d-pad; direction comes from the hit offset
    Stick,
    Button(InputAction),
}

/// Mesh name fragments (lowercase, separators removed), checked in order
const MESH_ZONES: &[(&str, MeshZone)] = &[
    ("joystick", MeshZone::Stick),
    ("dpad", MeshZone::Stick),
    ("stick", MeshZone::Stick),
    ("buttona", MeshZone::Button(InputAction::ButtonA)),
    ("btna", MeshZone::Button(InputAction::ButtonA)),
    ("buttonb", MeshZone::Button(InputAction::ButtonB)),
    ("btnb", MeshZone::Button(InputAction::ButtonB)),
    ("start", MeshZone::Button(InputAction::Start)),
];

/// A raycast hit on the console model, in the mesh's local 2D plane
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshHit {
    pub name: String,
    pub point: Vec2,
    pub center: Vec2,
}

impl MeshHit {
    pub fn new(name: impl Into<String>, point: Vec2, center: Vec2) -> Self {
        Self {
            name: name.into(),
            point,
            center,
        }
    }
}

/// Raw event from the platform layer
#[derive(Debug, Clone, PartialEq)]
pub enum RawInput {
    /// `KeyboardEvent.code` (or `.key` for arrows/Enter)
    Key(String),
    Mesh(MeshHit),
    /// Raycast hit nothing
    Miss,
}

/// Classifier tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Same-action repeats inside this window are dropped (milliseconds)
    pub debounce_ms: f64,
    /// Horizontal offsets are scaled by this before comparing axes (>1 favors left/right)
    pub horizontal_bias: f32,
    /// Stick hits closer than this to the centre resolve to `default_direction`
    pub dead_zone: f32,
    pub default_direction: InputAction,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEBOUNCE_WINDOW_MS,
            horizontal_bias: 1.0,
            dead_zone: JOYSTICK_DEAD_ZONE,
            default_direction: InputAction::Up,
        }
    }
}

/// Look up a keyboard code
pub fn action_for_key(code: &str) -> Option<InputAction> {
    KEY_BINDINGS
        .iter()
        .find(|(k, _)| *k == code)
        .map(|&(_, action)| action)
}

/// Which console part a mesh name belongs to
pub fn zone_for_mesh(name: &str) -> Option<MeshZone> {
    let normalized: String = name
        .chars()
        .filter(|c| !matches!(c, '_' | '-' | ' ' | '.'))
        .flat_map(char::to_lowercase)
        .collect();
    MESH_ZONES
        .iter()
        .find(|(needle, _)| normalized.contains(needle))
        .map(|&(_, zone)| zone)
}

/// Discrete direction for a stick hit `offset` from the stick centre (y up)
///
/// The axis with the larger (bias-scaled) magnitude wins; exact ties go to
/// the vertical axis.
pub fn resolve_direction(offset: Vec2, config: &InputConfig) -> InputAction {
    if !offset.is_finite() || offset.length() < config.dead_zone {
        return config.default_direction;
    }
    let horizontal = offset.x.abs() * config.horizontal_bias;
    if horizontal > offset.y.abs() {
        if offset.x > 0.0 {
            InputAction::Right
        } else {
            InputAction::Left
        }
    } else if offset.y > 0.0 {
        InputAction::Up
    } else {
        InputAction::Down
    }
}

type ActionListener = Box<dyn FnMut(InputAction)>;

pub struct InputClassifier {
    config: InputConfig,
    /// Time of the last accepted input per action (milliseconds)
    last_accepted: HashMap<InputAction, f64>,
    listeners: BTreeMap<ListenerId, ActionListener>,
    next_listener_id: ListenerId,
}

impl Default for InputClassifier {
    fn default() -> Self {
        Self::new(InputConfig::default())
    }
}

impl InputClassifier {
    pub fn new(config: InputConfig) -> Self {
        Self {
            config,
            last_accepted: HashMap::new(),
            listeners: BTreeMap::new(),
            next_listener_id: 1,
        }
    }

    pub fn on(&mut self, listener: impl FnMut(InputAction) + 'static) -> ListenerId {
        let id = self.next_listener_id;
        self.next_listener_id += 1;
        self.listeners.insert(id, Box::new(listener));
        id
    }

    pub fn off(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    /// Map a raw event to an action without debouncing
    pub fn classify(&self, raw: &RawInput) -> Option<InputAction> {
        match raw {
            RawInput::Key(code) => action_for_key(code),
            RawInput::Mesh(hit) => match zone_for_mesh(&hit.name)? {
                MeshZone::Stick => Some(resolve_direction(hit.point - hit.center, &self.config)),
                MeshZone::Button(action) => Some(action),
            },
            RawInput::Miss => None,
        }
    }

    /// Classify, debounce and emit. `now_ms` is the event timestamp.
    pub fn submit(&mut self, raw: &RawInput, now_ms: f64) -> Option<InputAction> {
        let Some(action) = self.classify(raw) else {
            log::trace!("Unmapped input {:?}", raw);
            return None;
        };

        // A timestamp earlier than the last accepted one means the clock
        // moved backwards; accept it rather than blocking until it catches up
        if let Some(&last) = self.last_accepted.get(&action) {
            let elapsed = now_ms - last;
            if (0.0..self.config.debounce_ms).contains(&elapsed) {
                log::trace!("Debounced {} ({:.1}ms)", action.as_str(), elapsed);
                return None;
            }
        }
        self.last_accepted.insert(action, now_ms);

        for listener in self.listeners.values_mut() {
            listener(action);
        }
        Some(action)
    }

    /// Forget debounce history (e.g. after a manual reset)
    pub fn reset(&mut self) {
        self.last_accepted.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    fn key(code: &str) -> RawInput {
        RawInput::Key(code.to_string())
    }

    fn stick(x: f32, y: f32) -> RawInput {
        RawInput::Mesh(MeshHit::new("Joystick_Top", Vec2::new(x, y), Vec2::ZERO))
    }

    #[test]
    fn test_key_table() {
        assert_eq!(action_for_key("ArrowUp"), Some(InputAction::Up));
        assert_eq!(action_for_key("KeyX"), Some(InputAction::ButtonB));
        assert_eq!(action_for_key("Enter"), Some(InputAction::Start));
        assert_eq!(action_for_key("KeyQ"), None);
    }

    #[test]
    fn test_mesh_zones() {
        assert_eq!(zone_for_mesh("Joystick_Top"), Some(MeshZone::Stick));
        assert_eq!(zone_for_mesh("D-Pad"), Some(MeshZone::Stick));
        assert_eq!(zone_for_mesh("Button_A.001"), Some(MeshZone::Button(InputAction::ButtonA)));
        assert_eq!(zone_for_mesh("btn-b"), Some(MeshZone::Button(InputAction::ButtonB)));
        assert_eq!(zone_for_mesh("StartButton"), Some(MeshZone::Button(InputAction::Start)));
        assert_eq!(zone_for_mesh("Screen"), None);
    }

    #[test]
    fn test_direction_resolution() {
        let cfg = InputConfig::default();
        assert_eq!(resolve_direction(Vec2::new(0.3, 0.1), &cfg), InputAction::Right);
        assert_eq!(resolve_direction(Vec2::new(-0.3, 0.1), &cfg), InputAction::Left);
        assert_eq!(resolve_direction(Vec2::new(0.1, 0.3), &cfg), InputAction::Up);
        assert_eq!(resolve_direction(Vec2::new(0.1, -0.3), &cfg), InputAction::Down);
        // Tie goes vertical
        assert_eq!(resolve_direction(Vec2::new(0.2, -0.2), &cfg), InputAction::Down);
        // Dead zone
        assert_eq!(resolve_direction(Vec2::new(0.001, -0.001), &cfg), cfg.default_direction);
        assert_eq!(resolve_direction(Vec2::new(f32::NAN, 1.0), &cfg), cfg.default_direction);
    }

    #[test]
    fn test_horizontal_bias() {
        let cfg = InputConfig {
            horizontal_bias: 1.5,
            ..Default::default()
        };
        assert_eq!(resolve_direction(Vec2::new(0.25, 0.3), &cfg), InputAction::Right);
        assert_eq!(resolve_direction(Vec2::new(0.1, 0.3), &cfg), InputAction::Up);
    }

    #[test]
    fn test_debounce_per_action() {
        let mut c = InputClassifier::default();
        assert_eq!(c.submit(&key("KeyZ"), 0.0), Some(InputAction::ButtonA));
        assert_eq!(c.submit(&key("Space"), 10.0), None);
        // A different action is not blocked
        assert_eq!(c.submit(&key("KeyX"), 20.0), Some(InputAction::ButtonB));
        assert_eq!(c.submit(&key("KeyZ"), 49.0), None);
        // Dropped inputs don't extend the window
        assert_eq!(c.submit(&key("KeyZ"), 50.0), Some(InputAction::ButtonA));

        c.reset();
        assert_eq!(c.submit(&key("KeyZ"), 51.0), Some(InputAction::ButtonA));
    }

    #[test]
    fn test_clock_going_backwards_does_not_block() {
        let mut c = InputClassifier::default();
        assert_eq!(c.submit(&key("KeyZ"), 10_000.0), Some(InputAction::ButtonA));
        assert_eq!(c.submit(&key("KeyZ"), 2_000.0), Some(InputAction::ButtonA));
        assert_eq!(c.submit(&key("KeyZ"), 2_020.0), None);
    }

    #[test]
    fn test_unmapped_input_emits_nothing() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut c = InputClassifier::default();
        let sink = seen.clone();
        c.on(move |a| sink.borrow_mut().push(a));

        assert_eq!(c.submit(&key("KeyQ"), 0.0), None);
        assert_eq!(c.submit(&RawInput::Miss, 0.0), None);
        assert_eq!(
            c.submit(&RawInput::Mesh(MeshHit::new("Screen", Vec2::ZERO, Vec2::ZERO)), 0.0),
            None
        );
        assert!(seen.borrow().is_empty());

        assert_eq!(c.submit(&stick(0.0, -0.5), 0.0), Some(InputAction::Down));
        assert_eq!(*seen.borrow(), vec![InputAction::Down]);
    }

    #[test]
    fn test_off_stops_emission() {
        let count = Rc::new(RefCell::new(0));
        let mut c = InputClassifier::default();
        let sink = count.clone();
        let id = c.on(move |_| *sink.borrow_mut() += 1);
        c.submit(&key("ArrowUp"), 0.0);
        assert!(c.off(id));
        c.submit(&key("ArrowDown"), 0.0);
        assert_eq!(*count.borrow(), 1);
    }
}
