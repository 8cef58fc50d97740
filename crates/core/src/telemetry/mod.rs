//! Hardware telemetry: a pull-based probe sampled once per frame.

mod probe;
mod system;
mod thermal;

pub use probe::{FixedSource, HostProbe, ScriptedSource};
pub use system::{CpuSampler, RamSnapshot};
pub use thermal::ThermalZone;

use serde::Serialize;

/// One poll of hardware metrics. Usage values are percentages (0–100),
/// temperatures are degrees Celsius.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct TelemetrySnapshot {
    pub cpu_usage: f32,
    pub gpu_usage: f32,
    pub gpu_temp: f32,
    pub cpu_temp: f32,
    pub mem_usage: f32,
    /// Watts. Simulated on most hosts.
    pub power_draw: f32,
}

impl TelemetrySnapshot {
    /// Hottest reported temperature.
    pub fn max_temp(&self) -> f32 {
        self.cpu_temp.max(self.gpu_temp)
    }

    /// Short `key: value` lines for prompt context.
    pub fn context_lines(&self) -> Vec<(String, String)> {
        vec![
            ("cpu".into(), format!("{:.0}%", self.cpu_usage)),
            ("gpu".into(), format!("{:.0}%", self.gpu_usage)),
            ("memory".into(), format!("{:.0}%", self.mem_usage)),
            ("cpu_temp".into(), format!("{:.0}C", self.cpu_temp)),
            ("gpu_temp".into(), format!("{:.0}C", self.gpu_temp)),
        ]
    }
}

/// Synchronous telemetry probe. Must be cheap: it runs on the frame loop.
pub trait TelemetrySource: Send {
    fn sample(&mut self) -> TelemetrySnapshot;
}
