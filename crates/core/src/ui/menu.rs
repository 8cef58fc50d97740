use super::geometry::Area;
use crate::telemetry::TelemetrySnapshot;

/// Hardware gauges the menu can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GaugeKind {
    Cpu,
    Gpu,
    Memory,
    Power,
}

impl GaugeKind {
    pub fn label(self) -> &'static str {
        match self {
            GaugeKind::Cpu => "CPU",
            GaugeKind::Gpu => "GPU",
            GaugeKind::Memory => "Memory",
            GaugeKind::Power => "Power",
        }
    }

    /// Reading as a 0–100 percentage. Power is shown against a 100 W scale.
    pub fn percent(self, snapshot: &TelemetrySnapshot) -> f32 {
        let raw = match self {
            GaugeKind::Cpu => snapshot.cpu_usage,
            GaugeKind::Gpu => snapshot.gpu_usage,
            GaugeKind::Memory => snapshot.mem_usage,
            GaugeKind::Power => snapshot.power_draw,
        };
        raw.clamp(0.0, 100.0)
    }

    /// Text next to the bar.
    pub fn readout(self, snapshot: &TelemetrySnapshot) -> String {
        match self {
            GaugeKind::Power => format!("{:.0} W", snapshot.power_draw),
            _ => format!("{:.0}%", self.percent(snapshot)),
        }
    }
}

/// Colour band of a gauge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GaugeBand {
    Low,
    Elevated,
    Critical,
}

pub fn gauge_band(percent: f32) -> GaugeBand {
    if percent < 50.0 {
        GaugeBand::Low
    } else if percent < 80.0 {
        GaugeBand::Elevated
    } else {
        GaugeBand::Critical
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    ToggleTheme,
    ShowGauge(GaugeKind),
    NextPet,
    Ask,
    Quit,
}

const BUTTONS: [(MenuAction, &str); 8] = [
    (MenuAction::ToggleTheme, "Theme"),
    (MenuAction::ShowGauge(GaugeKind::Cpu), "CPU"),
    (MenuAction::ShowGauge(GaugeKind::Gpu), "GPU"),
    (MenuAction::ShowGauge(GaugeKind::Memory), "Memory"),
    (MenuAction::ShowGauge(GaugeKind::Power), "Power"),
    (MenuAction::NextPet, "Next pet"),
    (MenuAction::Ask, "Ask"),
    (MenuAction::Quit, "Quit"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuButton {
    pub action: MenuAction,
    pub label: &'static str,
    pub area: Area,
}

/// The control menu: a bordered column of buttons with a gauge strip below.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlMenu {
    area: Area,
    buttons: Vec<MenuButton>,
    gauge: Option<GaugeKind>,
}

impl ControlMenu {
    pub const WIDTH: u16 = 22;
    /// Rows under the buttons reserved for the gauge.
    pub const GAUGE_ROWS: u16 = 3;

    /// Open to the right of `anchor` (the pet), kept on screen.
    pub fn open_beside(anchor: Area, surface: (u16, u16)) -> Self {
        let height = 2 + BUTTONS.len() as u16 + Self::GAUGE_ROWS;
        let area = Area::new(anchor.right().saturating_add(2), anchor.y, Self::WIDTH, height).fit_within(surface);
        let buttons = BUTTONS
            .iter()
            .enumerate()
            .map(|(i, (action, label))| MenuButton {
                action: *action,
                label: *label,
                area: Area::new(area.x + 1, area.y + 1 + i as u16, area.width.saturating_sub(2), 1),
            })
            .filter(|b| b.area.bottom() < area.bottom())
            .collect();
        Self { area, buttons, gauge: None }
    }

    pub fn area(&self) -> Area {
        self.area
    }

    pub fn buttons(&self) -> &[MenuButton] {
        &self.buttons
    }

    pub fn gauge(&self) -> Option<GaugeKind> {
        self.gauge
    }

    pub fn show_gauge(&mut self, kind: GaugeKind) {
        self.gauge = Some(kind);
    }

    /// Cells under the buttons where the gauge is drawn.
    pub fn gauge_area(&self) -> Area {
        let top = self.buttons.last().map_or(self.area.y + 1, |b| b.area.bottom());
        Area::new(
            self.area.x + 1,
            top,
            self.area.width.saturating_sub(2),
            self.area.bottom().saturating_sub(1).saturating_sub(top),
        )
    }

    pub fn action_at(&self, x: u16, y: u16) -> Option<MenuAction> {
        self.buttons.iter().find(|b| b.area.contains(x, y)).map(|b| b.action)
    }
}
