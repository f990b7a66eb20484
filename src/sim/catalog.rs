//! Built-in ritual step templates
//!
//! Each template has a few (action, prompt) variants. Which variant a ritual
//! gets is decided by the seeded generator in `difficulty`, never by a global
//! RNG, so the same seed and level always produce the same ritual.

use rand::Rng;

use super::ritual::{InputAction, RitualStep, SurgicalObject};

/// A step shape with interchangeable action/prompt pairs
#[derive(Debug, Clone, Copy)]
pub struct StepTemplate {
    pub name: &'static str,
    pub animation: &'static str,
    pub object: Option<SurgicalObject>,
    pub variants: &'static [(InputAction, &'static str)],
}

impl StepTemplate {
    /// Instantiate with a variant picked by `rng`
    pub fn build<R: Rng>(&self, rng: &mut R, time_limit: f32) -> RitualStep {
        let (action, prompt) = if self.variants.len() > 1 {
            self.variants[rng.random_range(0..self.variants.len())]
        } else {
            self.variants[0]
        };
        let step = RitualStep::new(self.name, prompt, action, time_limit).with_animation(self.animation);
        match self.object {
            Some(object) => step.with_object(object),
            None => step,
        }
    }
}

/// Level 1 ritual, in mandatory order
pub const BASE_STEPS: &[StepTemplate] = &[
    StepTemplate {
        name: "Scrub In",
        animation: "surgeon_scrub",
        object: None,
        variants: &[
            (InputAction::ButtonA, "SCRUB IN! PRESS A"),
            (InputAction::ButtonB, "WASH YOUR HANDS! PRESS B"),
        ],
    },
    StepTemplate {
        name: "Incision",
        animation: "surgeon_cut",
        object: Some(SurgicalObject::Scalpel),
        variants: &[
            (InputAction::Down, "CUT DOWNWARD!"),
            (InputAction::Right, "SLICE ACROSS!"),
        ],
    },
    StepTemplate {
        name: "Insert Brain",
        animation: "surgeon_insert",
        object: Some(SurgicalObject::Brain),
        variants: &[
            (InputAction::Up, "LIFT THE BRAIN IN!"),
            (InputAction::ButtonA, "DROP THE BRAIN! PRESS A"),
        ],
    },
    StepTemplate {
        name: "Attach Electrodes",
        animation: "surgeon_wire",
        object: Some(SurgicalObject::Electrodes),
        variants: &[
            (InputAction::Left, "WIRE THE LEFT BOLT!"),
            (InputAction::Right, "WIRE THE RIGHT BOLT!"),
        ],
    },
    StepTemplate {
        name: "Pull The Lever",
        animation: "surgeon_lever",
        object: Some(SurgicalObject::Lever),
        variants: &[
            (InputAction::Down, "PULL THE LEVER!"),
            (InputAction::Start, "THROW THE SWITCH! PRESS START"),
        ],
    },
];

/// Steps appended as levels get harder, cycled in order
pub const EXTRA_STEPS: &[StepTemplate] = &[
    StepTemplate {
        name: "Inject Serum",
        animation: "surgeon_inject",
        object: Some(SurgicalObject::Syringe),
        variants: &[
            (InputAction::ButtonB, "INJECT THE SERUM! PRESS B"),
            (InputAction::Up, "FLICK THE SYRINGE!"),
        ],
    },
    StepTemplate {
        name: "Clamp Artery",
        animation: "surgeon_clamp",
        object: Some(SurgicalObject::Forceps),
        variants: &[
            (InputAction::Left, "CLAMP IT LEFT!"),
            (InputAction::ButtonA, "CLAMP! PRESS A"),
        ],
    },
    StepTemplate {
        name: "Jumpstart Heart",
        animation: "surgeon_shock",
        object: Some(SurgicalObject::Heart),
        variants: &[
            (InputAction::ButtonA, "CLEAR! PRESS A"),
            (InputAction::ButtonB, "SHOCK IT! PRESS B"),
        ],
    },
    StepTemplate {
        name: "Stitch Up",
        animation: "surgeon_stitch",
        object: Some(SurgicalObject::Sutures),
        variants: &[
            (InputAction::Up, "STITCH UPWARD!"),
            (InputAction::Down, "STITCH DOWNWARD!"),
        ],
    },
];

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    use super::*;

    #[test]
    fn test_templates_have_variants() {
        for t in BASE_STEPS.iter().chain(EXTRA_STEPS) {
            assert!(!t.variants.is_empty(), "{} has no variants", t.name);
            assert!(!t.animation.is_empty());
        }
    }

    #[test]
    fn test_build_picks_listed_variant() {
        let mut rng = Pcg32::seed_from_u64(7);
        for t in BASE_STEPS {
            let step = t.build(&mut rng, 4.0);
            assert_eq!(step.name(), t.name);
            assert_eq!(step.time_limit(), 4.0);
            assert_eq!(step.object(), t.object);
            assert!(
                t.variants
                    .iter()
                    .any(|&(a, p)| a == step.action() && p == step.prompt())
            );
        }
    }
}
