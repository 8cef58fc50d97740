//! Core of the desktop pet: telemetry, mood, the pet entity, the speech
//! pipeline, the overlay state machine and the frame loop that ties them
//! together. Drawing lives in the CLI crate behind [`runtime::Frontend`].

pub mod assets;
pub mod config;
pub mod mood;
pub mod personality;
pub mod pet;
pub mod runtime;
pub mod speech;
pub mod telemetry;
pub mod ui;
