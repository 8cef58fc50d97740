use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::system::{CpuSampler, RamSnapshot};
use super::thermal::ThermalZone;
use super::{TelemetrySnapshot, TelemetrySource};

/// Largest per-sample step of a simulated channel.
const WALK_STEP: f32 = 1.5;

/// A bounded random walk standing in for a sensor the host does not expose.
/// Walking instead of redrawing keeps the mood from flickering every frame.
#[derive(Debug, Clone, Copy)]
struct SimChannel {
    value: f32,
    min: f32,
    max: f32,
}

impl SimChannel {
    fn new(rng: &mut impl Rng, min: f32, max: f32) -> Self {
        Self { value: rng.gen_range(min..max), min, max }
    }

    fn step(&mut self, rng: &mut impl Rng) -> f32 {
        self.value = (self.value + rng.gen_range(-WALK_STEP..=WALK_STEP)).clamp(self.min, self.max);
        self.value
    }
}

/// Probe for the local machine: real CPU and memory from procfs, real CPU
/// temperature when a thermal zone exists, simulated GPU and power channels.
pub struct HostProbe {
    cpu: CpuSampler,
    thermal: Option<ThermalZone>,
    rng: StdRng,
    cpu_temp: SimChannel,
    gpu_usage: SimChannel,
    gpu_temp: SimChannel,
    power: SimChannel,
}

impl HostProbe {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_rng(mut rng: StdRng) -> Self {
        let thermal = ThermalZone::detect();
        if thermal.is_none() {
            tracing::info!("no thermal zone found, cpu temperature is simulated");
        }
        Self {
            cpu: CpuSampler::new(),
            thermal,
            cpu_temp: SimChannel::new(&mut rng, 50.0, 90.0),
            gpu_usage: SimChannel::new(&mut rng, 10.0, 95.0),
            gpu_temp: SimChannel::new(&mut rng, 40.0, 80.0),
            power: SimChannel::new(&mut rng, 30.0, 100.0),
            rng,
        }
    }
}

impl Default for HostProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetrySource for HostProbe {
    fn sample(&mut self) -> TelemetrySnapshot {
        let cpu_usage = self.cpu.sample();
        let mem_usage = RamSnapshot::sample().usage_percent();

        // Without a sensor, blend the simulated reading with real load so the
        // pet still warms up when the machine is busy.
        let simulated = self.cpu_temp.step(&mut self.rng);
        let cpu_temp = self
            .thermal
            .as_ref()
            .and_then(ThermalZone::read_celsius)
            .unwrap_or((simulated + cpu_usage) / 2.0);

        let power = self.power.step(&mut self.rng);
        TelemetrySnapshot {
            cpu_usage,
            gpu_usage: self.gpu_usage.step(&mut self.rng),
            gpu_temp: self.gpu_temp.step(&mut self.rng),
            cpu_temp,
            mem_usage,
            power_draw: (power + mem_usage / 10.0) / 2.0,
        }
    }
}

/// Always returns the same snapshot.
#[derive(Debug, Clone, Copy)]
pub struct FixedSource(pub TelemetrySnapshot);

impl TelemetrySource for FixedSource {
    fn sample(&mut self) -> TelemetrySnapshot {
        self.0
    }
}

/// Replays a list of snapshots, repeating the last one once exhausted.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    frames: Vec<TelemetrySnapshot>,
    next: usize,
}

impl ScriptedSource {
    pub fn new(frames: Vec<TelemetrySnapshot>) -> Self {
        Self { frames, next: 0 }
    }
}

impl TelemetrySource for ScriptedSource {
    fn sample(&mut self) -> TelemetrySnapshot {
        let Some(last) = self.frames.len().checked_sub(1) else {
            return TelemetrySnapshot::default();
        };
        let snap = self.frames[self.next.min(last)];
        self.next = (self.next + 1).min(last);
        snap
    }
}
