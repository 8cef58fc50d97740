//! Overlay state: control menu, question prompt and the mode machine that
//! switches between them. Pure state; drawing is the frontend's job.

mod geometry;
mod menu;
mod prompt;
mod state;

pub use geometry::Area;
pub use menu::{ControlMenu, GaugeBand, GaugeKind, MenuAction, MenuButton, gauge_band};
pub use prompt::{PROMPT_MAX_CHARS, PromptInput};
pub use state::{KeyInput, PointerButton, UiEffect, UiInput, UiMode, UiState};
