mod event;
mod tui;
mod widgets;

use std::sync::Arc;
use std::time::Duration;

use deskpet_core::config::{self, PetConfig};
use deskpet_core::personality::PersonalityScript;
use deskpet_core::runtime::{Runtime, ShutdownGuard};
use deskpet_core::speech::{AiBackend, CommandPlayer, CommandSynthesizer, ScratchDir, spawn_speech};
use deskpet_core::telemetry::HostProbe;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// How long the speech actor gets to wind down on exit.
const SPEECH_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Panic hook: restore terminal even on panic in raw mode
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = crossterm::terminal::disable_raw_mode();
        let _ = crossterm::execute!(
            std::io::stdout(),
            crossterm::event::DisableMouseCapture,
            crossterm::terminal::LeaveAlternateScreen
        );
        default_hook(info);
    }));

    // Tracing: write to file when RUST_LOG is set (raw mode breaks stderr)
    if std::env::var("RUST_LOG").is_ok() {
        let file = std::fs::File::create(std::env::temp_dir().join("deskpet.log"))?;
        tracing_subscriber::registry()
            .with(EnvFilter::from_default_env())
            .with(fmt::layer().json().with_target(true).with_writer(file))
            .init();
    }

    let cfg_path = config::config_path_from_env();
    let cfg = PetConfig::load_or_default(&cfg_path);
    tracing::info!(config = %cfg_path.display(), pet = %cfg.last_pet.display(), "starting deskpet");

    let shutdown = ShutdownGuard::new();
    shutdown.spawn_signal_listener();

    let scratch = ScratchDir::prepare_or_warn(&cfg.speech.scratch_dir);
    let ai = AiBackend::from_config(&cfg.ai_config);
    let synth = Arc::new(CommandSynthesizer::new(cfg.speech.synth_command.clone(), scratch.clone()));
    let sink = Arc::new(CommandPlayer::new(cfg.speech.player_command.clone()));
    // the pet installs its own script on the dispatcher it is given
    let speech = spawn_speech(&cfg, PersonalityScript::default(), ai, synth, sink, shutdown.token());

    let mut frontend = tui::TerminalFrontend::enter()?;
    let surface = frontend.stage_size()?;
    let (mut runtime, input_tx) = Runtime::new(
        cfg,
        cfg_path,
        Box::new(HostProbe::new()),
        speech.dispatcher,
        speech.display_rx,
        surface,
    );
    frontend.forward_input(input_tx);

    let result = runtime.run(&mut frontend, shutdown.token()).await;
    // keep going on failure: speech still has to stop and clips be purged
    let restored = frontend.restore();
    if let Err(e) = &restored {
        tracing::error!(error = %e, "terminal not restored");
    }

    shutdown.drain("speech", speech.task, SPEECH_DRAIN_TIMEOUT).await;
    scratch.purge();
    tracing::info!(frames = runtime.frame_count(), "deskpet stopped");

    restored?;
    result?;
    Ok(())
}
