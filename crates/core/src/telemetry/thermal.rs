use std::path::{Path, PathBuf};

/// Default sysfs path for the CPU thermal zone.
const THERMAL_ZONE_PATH: &str = "/sys/class/thermal/thermal_zone0/temp";

/// A sysfs thermal zone reporting millidegrees Celsius.
#[derive(Debug, Clone)]
pub struct ThermalZone {
    path: PathBuf,
}

impl ThermalZone {
    /// The first CPU thermal zone, if the host exposes one.
    pub fn detect() -> Option<Self> {
        let path = Path::new(THERMAL_ZONE_PATH);
        path.exists().then(|| Self::at(path))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Current temperature in °C; `None` when unreadable or unparsable.
    pub fn read_celsius(&self) -> Option<f32> {
        let raw = std::fs::read_to_string(&self.path).ok()?;
        parse_millidegrees(&raw)
    }
}

fn parse_millidegrees(raw: &str) -> Option<f32> {
    raw.trim().parse::<i64>().ok().map(|m| m as f32 / 1000.0)
}
