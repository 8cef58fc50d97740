use crate::config::Theme;
use crate::mood::Mood;
use crate::telemetry::TelemetrySnapshot;
use crate::ui::{Area, UiMode};

/// Everything a frontend needs to draw one frame. Borrowed from the runtime.
#[derive(Debug)]
pub struct FrameView<'a> {
    pub frame: u64,
    pub theme: Theme,
    pub surface: (u16, u16),
    pub pet_name: &'a str,
    pub pet_area: Area,
    pub sprite_rows: &'a [String],
    pub mood: Mood,
    pub tint: (u8, u8, u8),
    pub bubble: Option<&'a str>,
    pub overlay: &'a UiMode,
    pub telemetry: TelemetrySnapshot,
    pub speaking: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum FrontendError {
    #[error("terminal io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("frontend closed")]
    Closed,
}

/// Presentation surface. Called on the frame loop once per frame.
pub trait Frontend {
    fn draw(&mut self, view: &FrameView<'_>) -> Result<(), FrontendError>;
}
