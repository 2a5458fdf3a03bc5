//! Audio collaborator contract
//!
//! The core only fires named effects and suspends/resumes output. Every call
//! is fire-and-forget: an unavailable or failing audio backend never
//! interrupts the game.

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundEffect {
    Jump,
    Collect,
    PowerUp,
    /// A crumbling platform gave way
    Crumble,
    Pause,
    Resume,
    MenuSelect,
    LevelComplete,
    GameOver,
    /// New best score
    HighScore,
}

impl SoundEffect {
    pub fn name(&self) -> &'static str {
        match self {
            SoundEffect::Jump => "jump",
            SoundEffect::Collect => "collect",
            SoundEffect::PowerUp => "powerup",
            SoundEffect::Crumble => "crumble",
            SoundEffect::Pause => "pause",
            SoundEffect::Resume => "resume",
            SoundEffect::MenuSelect => "menuSelect",
            SoundEffect::LevelComplete => "levelComplete",
            SoundEffect::GameOver => "gameOver",
            SoundEffect::HighScore => "highScore",
        }
    }
}

/// Anything that can play the game's sound effects
pub trait AudioSink {
    fn play(&mut self, effect: SoundEffect);

    /// Pause all output (pause menu, hidden tab)
    fn suspend(&mut self) {}

    fn resume(&mut self) {}
}

/// Silent sink, used when no audio backend is available
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play(&mut self, effect: SoundEffect) {
        log::trace!("(muted) {}", effect.name());
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::WebAudio;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    use super::{AudioSink, SoundEffect};
    use crate::settings::Settings;

    /// Web Audio backed sink with short procedural blips
    pub struct WebAudio {
        ctx: Option<AudioContext>,
        volume: f32,
    }

    impl WebAudio {
        pub fn new(settings: &Settings) -> Self {
            // May fail outside a secure context
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self {
                ctx,
                volume: settings.effective_volume(),
            }
        }

        pub fn set_volume(&mut self, volume: f32) {
            self.volume = volume.clamp(0.0, 1.0);
        }

        fn create_osc(
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

        /// One enveloped tone sliding from `from` to `to` Hz
        fn blip(&self, ctx: &AudioContext, from: f32, to: f32, secs: f64, osc_type: OscillatorType) {
            let Some((osc, gain)) = Self::create_osc(ctx, from, osc_type) else {
                return;
            };
            let t = ctx.current_time();
            gain.gain().set_value_at_time(self.volume * 0.4, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + secs)
                .ok();
            osc.frequency().set_value_at_time(from, t).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(to, t + secs)
                .ok();
            osc.start().ok();
            osc.stop_with_when(t + secs + 0.05).ok();
        }
    }

    impl AudioSink for WebAudio {
        fn play(&mut self, effect: SoundEffect) {
            if self.volume <= 0.0 {
                return;
            }
            let Some(ctx) = &self.ctx else { return };
            let (from, to, secs, wave) = match effect {
                SoundEffect::Jump => (300.0, 600.0, 0.12, OscillatorType::Square),
                SoundEffect::Collect => (880.0, 1320.0, 0.08, OscillatorType::Sine),
                SoundEffect::PowerUp => (440.0, 1760.0, 0.3, OscillatorType::Triangle),
                SoundEffect::Crumble => (120.0, 40.0, 0.25, OscillatorType::Sawtooth),
                SoundEffect::Pause => (500.0, 300.0, 0.1, OscillatorType::Sine),
                SoundEffect::Resume => (300.0, 500.0, 0.1, OscillatorType::Sine),
                SoundEffect::MenuSelect => (660.0, 660.0, 0.05, OscillatorType::Square),
                SoundEffect::LevelComplete => (523.0, 1046.0, 0.5, OscillatorType::Triangle),
                SoundEffect::GameOver => (400.0, 80.0, 0.8, OscillatorType::Sawtooth),
                SoundEffect::HighScore => (784.0, 1568.0, 0.6, OscillatorType::Triangle),
            };
            self.blip(ctx, from, to, secs, wave);
        }

        fn suspend(&mut self) {
            if let Some(ctx) = &self.ctx {
                let _ = ctx.suspend();
            }
        }

        fn resume(&mut self) {
            if let Some(ctx) = &self.ctx {
                let _ = ctx.resume();
            }
        }
    }
}
