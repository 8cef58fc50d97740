use std::time::{Duration, Instant};

use rand::Rng;
use rand::rngs::StdRng;

use crate::assets::PetAssets;
use crate::config::Tuning;
use crate::mood::Mood;
use crate::speech::SpeechDispatcher;
use crate::telemetry::TelemetrySnapshot;
use crate::ui::Area;

/// Movement, animation and idle chatter knobs taken from [`Tuning`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PetTuning {
    pub speed_x: f32,
    pub speed_y: f32,
    pub animation_divisor: u32,
    pub idle_roll_sides: u32,
    pub idle_cooldown: Duration,
}

impl From<&Tuning> for PetTuning {
    fn from(t: &Tuning) -> Self {
        Self {
            speed_x: t.speed_x,
            speed_y: t.speed_y,
            animation_divisor: t.animation_divisor.max(1),
            idle_roll_sides: t.idle_roll_sides.max(1),
            idle_cooldown: Duration::from_secs(t.idle_cooldown_secs),
        }
    }
}

/// The on-screen creature. Lives on the frame loop; all speech goes through
/// its dispatcher handle.
pub struct Pet {
    assets: PetAssets,
    speech: SpeechDispatcher,
    tuning: PetTuning,
    x: f32,
    y: f32,
    vx: f32,
    vy: f32,
    bounds: (u16, u16),
    frame: usize,
    ticks: u64,
    mood: Option<Mood>,
    transitions: u64,
    rng: StdRng,
    last_spoke: Instant,
}

impl Pet {
    /// Place the pet in the middle of `bounds`, heading in a random diagonal.
    pub fn new(assets: PetAssets, speech: &SpeechDispatcher, tuning: PetTuning, bounds: (u16, u16), mut rng: StdRng) -> Self {
        let speech = speech.with_script(assets.script.clone());
        let (w, h) = assets.sprite.size();
        let sign = |rng: &mut StdRng| if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
        let mut pet = Self {
            x: bounds.0.saturating_sub(w) as f32 / 2.0,
            y: bounds.1.saturating_sub(h) as f32 / 2.0,
            vx: tuning.speed_x * sign(&mut rng),
            vy: tuning.speed_y * sign(&mut rng),
            assets,
            speech,
            tuning,
            bounds,
            frame: 0,
            ticks: 0,
            mood: None,
            transitions: 0,
            rng,
            last_spoke: Instant::now(),
        };
        pet.clamp_into_bounds();
        pet
    }

    pub fn name(&self) -> &str {
        &self.assets.script.name
    }

    pub fn assets(&self) -> &PetAssets {
        &self.assets
    }

    pub fn speech(&self) -> &SpeechDispatcher {
        &self.speech
    }

    pub fn mood(&self) -> Mood {
        self.mood.clone().unwrap_or_default()
    }

    pub fn tint(&self) -> (u8, u8, u8) {
        self.mood().tint()
    }

    /// Number of mood changes so far.
    pub fn transitions(&self) -> u64 {
        self.transitions
    }

    pub fn frame_index(&self) -> usize {
        self.frame
    }

    pub fn velocity(&self) -> (f32, f32) {
        (self.vx, self.vy)
    }

    /// Cell rectangle currently covered by the sprite.
    pub fn area(&self) -> Area {
        let (w, h) = self.assets.sprite.size();
        Area::new(self.x.round() as u16, self.y.round() as u16, w, h)
    }

    /// Rows of the current animation frame.
    pub fn frame_rows(&self) -> &[String] {
        self.assets.sprite.frame(self.frame)
    }

    /// Resize the movement area and pull the pet back inside it.
    pub fn set_bounds(&mut self, width: u16, height: u16) {
        self.bounds = (width, height);
        self.clamp_into_bounds();
    }

    /// Switch mood. Same mood again is a no-op; a change updates the tint and,
    /// unless the pet is already talking or thinking, queues the mood's sound
    /// effect and its scripted reaction.
    pub fn set_mood(&mut self, mood: Mood, stats: &TelemetrySnapshot) -> bool {
        if self.mood.as_ref() == Some(&mood) {
            return false;
        }
        tracing::info!(pet = %self.name(), from = ?self.mood.as_ref().map(Mood::name), to = %mood, "mood changed");
        if self.speech.is_busy() {
            tracing::debug!(pet = %self.name(), mood = %mood, "still speaking, reaction skipped");
        } else {
            if let Some(clip) = self.assets.sound_for(&mood) {
                self.speech.play_effect(clip.to_path_buf());
            }
            if self.speech.say_for_mood(&mood, Some(*stats)).is_some() {
                self.last_spoke = Instant::now();
            }
        }
        self.mood = Some(mood);
        self.transitions += 1;
        true
    }

    /// One frame: move, animate, maybe chatter.
    pub fn tick(&mut self, now: Instant) {
        self.step_motion();

        self.ticks += 1;
        if self.ticks % u64::from(self.tuning.animation_divisor) == 0 {
            self.frame = (self.frame + 1) % self.assets.sprite.frame_count();
        }

        self.maybe_idle_chatter(now);
    }

    fn maybe_idle_chatter(&mut self, now: Instant) {
        if self.speech.is_busy() || now.saturating_duration_since(self.last_spoke) < self.tuning.idle_cooldown {
            return;
        }
        if !self.rng.gen_ratio(1, self.tuning.idle_roll_sides) {
            return;
        }
        let mood = self.mood();
        if self.speech.say_random_idle(&mut self.rng, &mood).is_some() {
            self.last_spoke = now;
        }
    }

    fn step_motion(&mut self) {
        self.x += self.vx;
        self.y += self.vy;
        let (max_x, max_y) = self.max_position();

        if self.x <= 0.0 {
            self.x = 0.0;
            self.vx = self.vx.abs();
        } else if self.x >= max_x {
            self.x = max_x;
            self.vx = -self.vx.abs();
        }
        if self.y <= 0.0 {
            self.y = 0.0;
            self.vy = self.vy.abs();
        } else if self.y >= max_y {
            self.y = max_y;
            self.vy = -self.vy.abs();
        }
    }

    fn max_position(&self) -> (f32, f32) {
        let (w, h) = self.assets.sprite.size();
        (
            self.bounds.0.saturating_sub(w) as f32,
            self.bounds.1.saturating_sub(h) as f32,
        )
    }

    fn clamp_into_bounds(&mut self) {
        let (max_x, max_y) = self.max_position();
        self.x = self.x.clamp(0.0, max_x);
        self.y = self.y.clamp(0.0, max_y);
    }
}
