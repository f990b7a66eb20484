//! Audio cues using Web Audio API
//!
//! Procedurally generated EKG beeps, buzzes and fanfares - no external files
//! needed. Plugged into the game as a [`FeedbackSink`].

use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

use crate::feedback::{FeedbackCue, FeedbackSink};
use crate::settings::Settings;
use crate::sim::MonsterState;

/// Audio manager for the console
pub struct AudioManager {
    ctx: Option<AudioContext>,
    /// Volume and mute preferences
    settings: Settings,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioManager {
    pub fn new() -> Self {
        // Try to create audio context (may fail if not in secure context)
        let ctx = AudioContext::new().ok();
        if ctx.is_none() {
            log::warn!("Failed to create AudioContext - audio disabled");
        }
        Self {
            ctx,
            settings: Settings::default(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let mut audio = Self::new();
        audio.settings = settings.clone().normalized();
        audio
    }

    /// Resume audio context (required after user gesture)
    pub fn resume(&self) {
        if let Some(ctx) = &self.ctx {
            let _ = ctx.resume();
        }
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.settings.muted = muted;
    }

    fn play(&self, cue: &FeedbackCue) {
        let vol = self.settings.effective_volume();
        if vol <= 0.0 {
            return;
        }

        let Some(ctx) = &self.ctx else { return };

        // Resume context if suspended (browsers require user gesture)
        if ctx.state() == web_sys::AudioContextState::Suspended {
            let _ = ctx.resume();
        }

        match cue {
            FeedbackCue::StepPrompt { .. } => self.play_prompt_blip(ctx, vol),
            FeedbackCue::StepCleared { .. } => self.play_step_cleared(ctx, vol),
            FeedbackCue::MonsterMood { state, .. } => self.play_heartbeat(ctx, vol, *state),
            FeedbackCue::Flatline { .. } => self.play_flatline(ctx, vol),
            FeedbackCue::ItsAlive { .. } => self.play_its_alive(ctx, vol),
            FeedbackCue::Reset => self.play_reset(ctx, vol),
        }
    }

    // === Sound generators ===

    /// Create an oscillator with gain envelope
    fn create_osc(
        &self,
        ctx: &AudioContext,
        freq: f32,
        osc_type: OscillatorType,
    ) -> Option<(OscillatorNode, GainNode)> {
        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;

        osc.set_type(osc_type);
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&ctx.destination()).ok()?;

        Some((osc, gain))
    }

    /// Short square blip when a new prompt appears
    fn play_prompt_blip(&self, ctx: &AudioContext, vol: f32) {
        let Some((osc, gain)) = self.create_osc(ctx, 660.0, OscillatorType::Square) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(vol * 0.2, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.06)
            .ok();

        osc.start().ok();
        osc.stop_with_when(t + 0.08).ok();
    }

    /// Rising two-tone chirp
    fn play_step_cleared(&self, ctx: &AudioContext, vol: f32) {
        let Some((osc, gain)) = self.create_osc(ctx, 523.0, OscillatorType::Triangle) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(vol * 0.35, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.18)
            .ok();
        osc.frequency().set_value_at_time(523.0, t).ok();
        osc.frequency().set_value_at_time(784.0, t + 0.07).ok();

        osc.start().ok();
        osc.stop_with_when(t + 0.2).ok();
    }

    /// EKG beeps; more and higher the madder the monster
    fn play_heartbeat(&self, ctx: &AudioContext, vol: f32, state: MonsterState) {
        let bpm = state.heart_rate_bpm();
        if bpm == 0 {
            return;
        }
        let interval = 60.0 / bpm as f64;
        let freq = match state {
            MonsterState::Angry => 1200.0,
            MonsterState::Nervous => 1000.0,
            _ => 880.0,
        };
        let t = ctx.current_time();

        for beat in 0..3 {
            let start = t + beat as f64 * interval;
            if let Some((osc, gain)) = self.create_osc(ctx, freq, OscillatorType::Sine) {
                gain.gain().set_value_at_time(0.0, t).ok();
                gain.gain().set_value_at_time(vol * 0.3, start).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, start + 0.09)
                    .ok();
                osc.start_with_when(start).ok();
                osc.stop_with_when(start + 0.1).ok();
            }
        }
    }

    /// Long monotone flatline with a low buzz underneath
    fn play_flatline(&self, ctx: &AudioContext, vol: f32) {
        let t = ctx.current_time();

        if let Some((osc, gain)) = self.create_osc(ctx, 1000.0, OscillatorType::Sine) {
            gain.gain().set_value_at_time(vol * 0.3, t).ok();
            gain.gain().set_value_at_time(vol * 0.3, t + 1.4).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 1.6)
                .ok();
            osc.start().ok();
            osc.stop_with_when(t + 1.7).ok();
        }

        // Angry growl
        if let Some((osc, gain)) = self.create_osc(ctx, 90.0, OscillatorType::Sawtooth) {
            gain.gain().set_value_at_time(vol * 0.25, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.5)
                .ok();
            osc.frequency().set_value_at_time(90.0, t).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(45.0, t + 0.5)
                .ok();
            osc.start().ok();
            osc.stop_with_when(t + 0.55).ok();
        }
    }

    /// Lightning crack followed by a major arpeggio
    fn play_its_alive(&self, ctx: &AudioContext, vol: f32) {
        let t = ctx.current_time();

        // Electric crackle
        if let Some((osc, gain)) = self.create_osc(ctx, 100.0, OscillatorType::Sawtooth) {
            gain.gain().set_value_at_time(vol * 0.35, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.3)
                .ok();
            osc.frequency().set_value_at_time(100.0, t).ok();
            osc.frequency().set_value_at_time(3500.0, t + 0.02).ok();
            osc.frequency().set_value_at_time(150.0, t + 0.05).ok();
            osc.frequency().set_value_at_time(2500.0, t + 0.08).ok();
            osc.frequency().set_value_at_time(80.0, t + 0.12).ok();
            osc.start().ok();
            osc.stop_with_when(t + 0.3).ok();
        }

        // C E G C
        let notes = [523.25, 659.25, 783.99, 1046.5];
        for (i, freq) in notes.iter().enumerate() {
            let start = t + 0.3 + i as f64 * 0.12;
            if let Some((osc, gain)) = self.create_osc(ctx, *freq, OscillatorType::Square) {
                gain.gain().set_value_at_time(0.0, t).ok();
                gain.gain().set_value_at_time(vol * 0.2, start).ok();
                gain.gain()
                    .exponential_ramp_to_value_at_time(0.01, start + 0.25)
                    .ok();
                osc.start_with_when(start).ok();
                osc.stop_with_when(start + 0.3).ok();
            }
        }
    }

    /// Soft power-down click
    fn play_reset(&self, ctx: &AudioContext, vol: f32) {
        let Some((osc, gain)) = self.create_osc(ctx, 300.0, OscillatorType::Sine) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(vol * 0.25, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.2)
            .ok();
        osc.frequency().set_value_at_time(300.0, t).ok();
        osc.frequency()
            .exponential_ramp_to_value_at_time(80.0, t + 0.2)
            .ok();

        osc.start().ok();
        osc.stop_with_when(t + 0.25).ok();
    }
}

impl FeedbackSink for AudioManager {
    fn deliver(&mut self, cue: &FeedbackCue) {
        self.play(cue);
    }
}
