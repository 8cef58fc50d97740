use std::path::PathBuf;
use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::frontend::{FrameView, Frontend, FrontendError};
use super::loop_control;
use crate::assets::{self, PetAssets};
use crate::config::PetConfig;
use crate::mood::{self, Mood};
use crate::pet::{Pet, PetTuning};
use crate::speech::{DisplayState, DisplayUpdate, SpeechDispatcher};
use crate::telemetry::{TelemetrySnapshot, TelemetrySource};
use crate::ui::{UiEffect, UiInput, UiState};

/// Bubble text shown while an explicit question is being answered.
pub const THINKING_TEXT: &str = "thinking...";

/// Bounded queue of frontend input events.
const INPUT_CHANNEL_CAP: usize = 256;

/// The frame loop. Owns the pet, the overlay state and the speech bubble;
/// nothing else writes to them.
pub struct Runtime {
    cfg: PetConfig,
    cfg_path: PathBuf,
    telemetry: Box<dyn TelemetrySource>,
    speech: SpeechDispatcher,
    display_rx: mpsc::Receiver<DisplayUpdate>,
    display: DisplayState,
    input_rx: mpsc::Receiver<UiInput>,
    pet: Pet,
    ui: UiState,
    snapshot: TelemetrySnapshot,
    surface: (u16, u16),
    frame_count: u64,
    quit: bool,
}

impl Runtime {
    /// Create a runtime for the pet named in `cfg`. Returns the runtime and the
    /// sender the frontend feeds input events into.
    pub fn new(
        cfg: PetConfig,
        cfg_path: PathBuf,
        telemetry: Box<dyn TelemetrySource>,
        speech: SpeechDispatcher,
        display_rx: mpsc::Receiver<DisplayUpdate>,
        surface: (u16, u16),
    ) -> (Self, mpsc::Sender<UiInput>) {
        let (input_tx, input_rx) = mpsc::channel(INPUT_CHANNEL_CAP);
        let pet = Pet::new(
            PetAssets::load(&cfg.last_pet),
            &speech,
            PetTuning::from(&cfg.tuning),
            surface,
            StdRng::from_entropy(),
        );
        let runtime = Self {
            cfg,
            cfg_path,
            telemetry,
            speech,
            display_rx,
            display: DisplayState::new(),
            input_rx,
            pet,
            ui: UiState::new(),
            snapshot: TelemetrySnapshot::default(),
            surface,
            frame_count: 0,
            quit: false,
        };
        (runtime, input_tx)
    }

    /// Drive frames until quit, cancellation, or a frontend failure.
    pub async fn run(&mut self, frontend: &mut dyn Frontend, token: CancellationToken) -> Result<(), FrontendError> {
        let period = self.cfg.tuning.tick_interval();
        let mut interval = loop_control::frame_interval(period);
        tracing::info!(pet = %self.pet.name(), fps = loop_control::fps(period), "frame loop started");

        let result = loop {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::info!(frames = self.frame_count, "shutdown signal received, leaving frame loop");
                    break Ok(());
                },
                _ = interval.tick() => {},
            }
            self.step(Instant::now());
            if self.quit {
                tracing::info!(frames = self.frame_count, "quit requested");
                break Ok(());
            }
            if let Err(e) = frontend.draw(&self.view()) {
                break Err(e);
            }
        };
        token.cancel();
        result
    }

    /// One frame: inputs, sample, classify, pet update, bubble update.
    pub fn step(&mut self, now: Instant) {
        self.frame_count += 1;

        for input in self.collect_inputs() {
            self.handle_input(input, now);
        }

        self.snapshot = self.telemetry.sample();
        let mood = mood::classify(&self.snapshot);
        self.pet.set_mood(mood, &self.snapshot);
        self.pet.tick(now);

        while let Ok(update) = self.display_rx.try_recv() {
            self.display.apply(update, now);
        }
        self.display.expire(now);
    }

    fn collect_inputs(&mut self) -> Vec<UiInput> {
        let mut inputs = Vec::new();
        while let Ok(input) = self.input_rx.try_recv() {
            inputs.push(input);
        }
        inputs
    }

    fn handle_input(&mut self, input: UiInput, now: Instant) {
        if let UiInput::Resize { width, height } = input {
            self.surface = (width, height);
            self.pet.set_bounds(width, height);
        }
        if let Some(effect) = self.ui.handle(input, self.pet.area(), self.surface) {
            self.apply_effect(effect, now);
        }
    }

    fn apply_effect(&mut self, effect: UiEffect, now: Instant) {
        match effect {
            UiEffect::AskPet(question) => self.ask_pet(&question, now),
            UiEffect::ToggleTheme => match self.cfg.toggle_theme(&self.cfg_path) {
                Ok(theme) => tracing::info!(theme = theme.as_str(), "theme toggled"),
                Err(e) => tracing::warn!(error = %e, "theme toggled but not saved"),
            },
            UiEffect::NextPet => self.next_pet(),
            UiEffect::Quit => self.quit = true,
        }
    }

    /// Queue a question for the AI and show the placeholder until it answers.
    pub fn ask_pet(&mut self, question: &str, now: Instant) {
        let mood = self.pet.mood();
        match self.pet.speech().ask_ai(question, &mood, Some(self.snapshot)) {
            Ok(seq) => {
                let wait = self.cfg.ai_config.timeout() + Duration::from_secs(self.cfg.tuning.reaction_display_secs);
                self.display.apply(DisplayUpdate { seq, text: THINKING_TEXT.to_owned(), duration: wait }, now);
            }
            Err(e) => tracing::warn!(error = %e, "question not queued"),
        }
    }

    fn next_pet(&mut self) {
        let Some(folder) = assets::next_pet(&self.cfg.tuning.pets_root, &self.cfg.last_pet) else {
            tracing::warn!(root = %self.cfg.tuning.pets_root.display(), "no pets to switch to");
            return;
        };
        tracing::info!(pet = %folder.display(), "switching pet");
        self.pet = Pet::new(
            PetAssets::load(&folder),
            &self.speech,
            PetTuning::from(&self.cfg.tuning),
            self.surface,
            StdRng::from_entropy(),
        );
        if let Err(e) = self.cfg.select_pet(folder, &self.cfg_path) {
            tracing::warn!(error = %e, "pet switched but not saved");
        }
    }

    pub fn view(&self) -> FrameView<'_> {
        FrameView {
            frame: self.frame_count,
            theme: self.cfg.current_theme,
            surface: self.surface,
            pet_name: self.pet.name(),
            pet_area: self.pet.area(),
            sprite_rows: self.pet.frame_rows(),
            mood: self.pet.mood(),
            tint: self.pet.tint(),
            bubble: self.display.text(),
            overlay: self.ui.mode(),
            telemetry: self.snapshot,
            speaking: self.pet.speech().is_busy(),
        }
    }

    pub fn pet(&self) -> &Pet {
        &self.pet
    }

    pub fn config(&self) -> &PetConfig {
        &self.cfg
    }

    pub fn bubble(&self) -> Option<&str> {
        self.display.text()
    }

    pub fn mood(&self) -> Mood {
        self.pet.mood()
    }

    pub fn quit_requested(&self) -> bool {
        self.quit
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::personality::PersonalityScript;
    use crate::speech::{SpeechCommand, SpeechQueue};
    use std::sync::atomic::Ordering;
    use crate::telemetry::{FixedSource, ScriptedSource};
    use crate::ui::{KeyInput, MenuAction, PointerButton, UiMode};

    const MELTING: TelemetrySnapshot = TelemetrySnapshot {
        cpu_usage: 50.0,
        gpu_usage: 40.0,
        gpu_temp: 60.0,
        cpu_temp: 90.0,
        mem_usage: 40.0,
        power_draw: 50.0,
    };

    struct Harness {
        runtime: Runtime,
        input_tx: mpsc::Sender<UiInput>,
        speech_rx: SpeechQueue,
        display_tx: mpsc::Sender<DisplayUpdate>,
        _dir: tempfile::TempDir,
    }

    fn write_pet(root: &std::path::Path, name: &str, reaction: &str) {
        let dir = root.join(name);
        std::fs::create_dir_all(&dir).unwrap();
        let script = serde_json::json!({
            "name": name,
            "idle_messages": [],
            "mood_reactions": {"MELTING": reaction},
        });
        std::fs::write(dir.join(assets::PERSONALITY_FILE), script.to_string()).unwrap();
    }

    fn harness(source: Box<dyn TelemetrySource>) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let pets = dir.path().join("pets");
        write_pet(&pets, "Clippy", "It's hot in here!");
        write_pet(&pets, "Rover", "Woof, too hot!");

        let mut cfg = PetConfig::default();
        cfg.tuning.pets_root = pets.clone();
        cfg.tuning.idle_roll_sides = u32::MAX;
        cfg.last_pet = pets.join("Clippy");

        let (speech, speech_rx) = SpeechDispatcher::channel(PersonalityScript::default(), 16, 3);
        let (display_tx, display_rx) = mpsc::channel(16);
        let (runtime, input_tx) = Runtime::new(
            cfg,
            dir.path().join("config.json"),
            source,
            speech,
            display_rx,
            (80, 24),
        );
        Harness { runtime, input_tx, speech_rx, display_tx, _dir: dir }
    }

    fn spoken(rx: &mut SpeechQueue) -> Vec<String> {
        let mut out = Vec::new();
        while let Ok(cmd) = rx.try_recv() {
            if let SpeechCommand::Speak(r) = cmd {
                out.push(r.text_or_prompt);
            }
        }
        out
    }

    /// Take everything queued and mark it as spoken, like the actor would.
    fn finish_speech(h: &mut Harness) -> Vec<String> {
        let lines = spoken(&mut h.speech_rx);
        h.runtime.pet().speech().pending_counter().fetch_sub(lines.len(), Ordering::SeqCst);
        lines
    }

    #[test]
    fn sustained_heat_reacts_once() {
        let mut h = harness(Box::new(FixedSource(MELTING)));
        let now = Instant::now();
        for _ in 0..30 {
            h.runtime.step(now);
        }
        assert_eq!(h.runtime.mood(), Mood::Melting);
        assert_eq!(spoken(&mut h.speech_rx), vec!["It's hot in here!"]);
        assert_eq!(h.runtime.frame_count(), 30);
    }

    #[test]
    fn mood_follows_telemetry() {
        let cool = TelemetrySnapshot { cpu_usage: 2.0, ..MELTING };
        let cool = TelemetrySnapshot { cpu_temp: 40.0, ..cool };
        let mut h = harness(Box::new(ScriptedSource::new(vec![MELTING, cool])));
        let now = Instant::now();
        h.runtime.step(now);
        assert_eq!(h.runtime.mood(), Mood::Melting);
        h.runtime.step(now);
        assert_eq!(h.runtime.mood(), Mood::Bored);
        assert_eq!(h.runtime.pet().transitions(), 2);
    }

    #[test]
    fn question_shows_placeholder_then_answer() {
        let mut h = harness(Box::new(FixedSource(TelemetrySnapshot { cpu_usage: 30.0, ..Default::default() })));
        let now = Instant::now();
        h.runtime.step(now);

        h.runtime.ask_pet("what's up?", now);
        assert_eq!(h.runtime.bubble(), Some(THINKING_TEXT));
        let seq = match h.speech_rx.try_recv().unwrap() {
            SpeechCommand::Speak(r) => {
                assert!(r.is_ai_query);
                r.seq
            }
            other => panic!("unexpected {other:?}"),
        };

        // a reply to an older request must not replace the placeholder
        h.display_tx
            .try_send(DisplayUpdate { seq: seq - 1, text: "stale".into(), duration: Duration::from_secs(5) })
            .unwrap();
        h.runtime.step(now);
        assert_eq!(h.runtime.bubble(), Some(THINKING_TEXT));

        h.display_tx
            .try_send(DisplayUpdate { seq, text: "All good!".into(), duration: Duration::from_secs(7) })
            .unwrap();
        h.runtime.step(now);
        assert_eq!(h.runtime.bubble(), Some("All good!"));

        h.runtime.step(now + Duration::from_secs(8));
        assert_eq!(h.runtime.bubble(), None);
    }

    #[test]
    fn menu_ask_flow_through_inputs() {
        let mut h = harness(Box::new(FixedSource(MELTING)));
        let now = Instant::now();
        h.runtime.step(now);
        spoken(&mut h.speech_rx);

        h.input_tx.try_send(UiInput::Key(KeyInput::Char('m'))).unwrap();
        h.runtime.step(now);
        let UiMode::MenuOpen(menu) = h.runtime.view().overlay.clone() else {
            panic!("menu not open");
        };
        let ask = menu.buttons().iter().find(|b| b.action == MenuAction::Ask).unwrap().area;

        h.input_tx
            .try_send(UiInput::Pointer { button: PointerButton::Primary, x: ask.x, y: ask.y })
            .unwrap();
        for c in "hi pet".chars() {
            h.input_tx.try_send(UiInput::Key(KeyInput::Char(c))).unwrap();
        }
        h.input_tx.try_send(UiInput::Key(KeyInput::Enter)).unwrap();
        h.runtime.step(now);

        assert_eq!(spoken(&mut h.speech_rx), vec!["hi pet"]);
        assert_eq!(h.runtime.bubble(), Some(THINKING_TEXT));
        assert_eq!(h.runtime.view().overlay, &UiMode::Idle);
    }

    #[test]
    fn theme_toggle_is_persisted() {
        let mut h = harness(Box::new(FixedSource(MELTING)));
        h.runtime.apply_effect(UiEffect::ToggleTheme, Instant::now());
        let saved = PetConfig::load(&h.runtime.cfg_path).unwrap();
        assert_eq!(saved.current_theme, crate::config::Theme::Light);
        assert_eq!(h.runtime.view().theme, crate::config::Theme::Light);
    }

    #[test]
    fn next_pet_switches_and_persists() {
        let mut h = harness(Box::new(FixedSource(MELTING)));
        let now = Instant::now();
        h.runtime.step(now);
        assert_eq!(h.runtime.pet().name(), "Clippy");
        assert_eq!(finish_speech(&mut h), vec!["It's hot in here!"]);

        h.runtime.apply_effect(UiEffect::NextPet, now);
        assert_eq!(h.runtime.pet().name(), "Rover");
        let saved = PetConfig::load(&h.runtime.cfg_path).unwrap();
        assert!(saved.last_pet.ends_with("Rover"));

        // the new pet announces its own mood on the next frame
        h.runtime.step(now);
        assert_eq!(finish_speech(&mut h), vec!["Woof, too hot!"]);
    }

    #[test]
    fn quit_key_stops_the_loop() {
        let mut h = harness(Box::new(FixedSource(MELTING)));
        h.input_tx.try_send(UiInput::Key(KeyInput::Char('q'))).unwrap();
        h.runtime.step(Instant::now());
        assert!(h.runtime.quit_requested());
    }

    #[test]
    fn resize_rebounds_pet() {
        let mut h = harness(Box::new(FixedSource(MELTING)));
        h.input_tx.try_send(UiInput::Resize { width: 12, height: 8 }).unwrap();
        h.runtime.step(Instant::now());
        let view = h.runtime.view();
        assert_eq!(view.surface, (12, 8));
        assert!(view.pet_area.right() <= 12 && view.pet_area.bottom() <= 8);
    }

    struct CountingFrontend {
        draws: u64,
        input_tx: mpsc::Sender<UiInput>,
    }

    impl Frontend for CountingFrontend {
        fn draw(&mut self, view: &FrameView<'_>) -> Result<(), FrontendError> {
            self.draws += 1;
            assert_eq!(view.frame, self.draws);
            if self.draws == 3 {
                let _ = self.input_tx.try_send(UiInput::Quit);
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn run_draws_until_quit() {
        let mut h = harness(Box::new(FixedSource(MELTING)));
        h.runtime.cfg.tuning.tick_ms = 1;
        let mut frontend = CountingFrontend { draws: 0, input_tx: h.input_tx.clone() };
        let token = CancellationToken::new();
        h.runtime.run(&mut frontend, token.clone()).await.unwrap();
        assert_eq!(frontend.draws, 3);
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn run_stops_on_cancel() {
        let mut h = harness(Box::new(FixedSource(MELTING)));
        let mut frontend = CountingFrontend { draws: 0, input_tx: h.input_tx.clone() };
        let token = CancellationToken::new();
        token.cancel();
        h.runtime.run(&mut frontend, token).await.unwrap();
        assert!(frontend.draws <= 1);
    }
}
