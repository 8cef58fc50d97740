use std::time::{Duration, Instant};

/// Shortest `/proc/stat` window worth measuring. A single frame covers only a
/// few jiffies per core, which makes the reading jump by whole percents.
pub const MIN_CPU_WINDOW: Duration = Duration::from_millis(100);

/// Stateful CPU sampler. Computes usage from the delta between two reads of
/// `/proc/stat`. After the first reading, calls closer together than
/// [`MIN_CPU_WINDOW`] return the previous one.
#[derive(Debug)]
pub struct CpuSampler {
    prev_idle: u64,
    prev_total: u64,
    prev_read: Instant,
    last_pct: Option<f32>,
}

impl CpuSampler {
    pub fn new() -> Self {
        let (idle, total) = read_proc_stat();
        Self { prev_idle: idle, prev_total: total, prev_read: Instant::now(), last_pct: None }
    }

    /// CPU usage in percent (0–100) over the latest window.
    pub fn sample(&mut self) -> f32 {
        self.sample_at(Instant::now(), read_proc_stat)
    }

    fn sample_at(&mut self, now: Instant, read: impl FnOnce() -> (u64, u64)) -> f32 {
        let due = now.saturating_duration_since(self.prev_read) >= MIN_CPU_WINDOW;
        match self.last_pct {
            Some(pct) if !due => pct,
            _ => {
                let (idle, total) = read();
                self.prev_read = now;
                let pct = self.advance(idle, total);
                self.last_pct = Some(pct);
                pct
            }
        }
    }

    fn advance(&mut self, idle: u64, total: u64) -> f32 {
        let d_idle = idle.saturating_sub(self.prev_idle);
        let d_total = total.saturating_sub(self.prev_total);
        self.prev_idle = idle;
        self.prev_total = total;

        if d_total == 0 {
            return self.last_pct.unwrap_or(0.0);
        }
        let busy = 1.0 - (d_idle as f64 / d_total as f64);
        (busy.clamp(0.0, 1.0) * 100.0) as f32
    }
}

impl Default for CpuSampler {
    fn default() -> Self {
        Self::new()
    }
}

/// `(idle, total)` jiffies from the aggregate `cpu` line.
fn parse_proc_stat(content: &str) -> Option<(u64, u64)> {
    let line = content.lines().next()?;
    if !line.starts_with("cpu") {
        return None;
    }
    let vals: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .filter_map(|v| v.parse().ok())
        .collect();
    if vals.len() < 4 {
        return None;
    }
    // idle + iowait both count as not busy
    let idle = vals[3] + vals.get(4).copied().unwrap_or(0);
    Some((idle, vals.iter().sum()))
}

#[cfg(target_os = "linux")]
fn read_proc_stat() -> (u64, u64) {
    std::fs::read_to_string("/proc/stat")
        .ok()
        .and_then(|s| parse_proc_stat(&s))
        .unwrap_or((0, 0))
}

#[cfg(not(target_os = "linux"))]
fn read_proc_stat() -> (u64, u64) {
    (0, 0)
}

/// RAM usage snapshot.
#[derive(Debug, Clone, Copy)]
pub struct RamSnapshot {
    pub used_mb: u64,
    pub total_mb: u64,
}

impl RamSnapshot {
    /// Used memory in percent; 0 when the total is unknown.
    pub fn usage_percent(&self) -> f32 {
        if self.total_mb == 0 {
            return 0.0;
        }
        (self.used_mb as f64 / self.total_mb as f64 * 100.0) as f32
    }

    /// Sample current RAM usage from the system.
    pub fn sample() -> Self {
        let (total, available) = read_meminfo();
        Self::from_kb(total, available)
    }

    fn from_kb(total_kb: u64, avail_kb: u64) -> Self {
        Self {
            total_mb: total_kb / 1024,
            used_mb: total_kb.saturating_sub(avail_kb) / 1024,
        }
    }
}

/// `(MemTotal, MemAvailable)` in kB.
fn parse_meminfo(content: &str) -> (u64, u64) {
    let field = |line: &str| {
        line.split_whitespace()
            .nth(1)
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0)
    };
    let mut total_kb = 0;
    let mut avail_kb = 0;
    for line in content.lines() {
        if line.starts_with("MemTotal:") {
            total_kb = field(line);
        } else if line.starts_with("MemAvailable:") {
            avail_kb = field(line);
        }
    }
    (total_kb, avail_kb)
}

#[cfg(target_os = "linux")]
fn read_meminfo() -> (u64, u64) {
    std::fs::read_to_string("/proc/meminfo")
        .map(|s| parse_meminfo(&s))
        .unwrap_or((0, 0))
}

#[cfg(not(target_os = "linux"))]
fn read_meminfo() -> (u64, u64) {
    (0, 0)
}
