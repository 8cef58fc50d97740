use ratatui::Frame;
use ratatui::layout::{Position, Rect};
use ratatui::style::{Color, Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Gauge, Paragraph, Wrap};
use unicode_width::UnicodeWidthStr;

use deskpet_core::config::Theme;
use deskpet_core::runtime::FrameView;
use deskpet_core::ui::{Area, ControlMenu, GaugeBand, PromptInput, UiMode, gauge_band};

/// Rows at the bottom reserved for the status line.
pub const STATUS_ROWS: u16 = 1;

const BUBBLE_MAX_WIDTH: u16 = 34;
const NOTE: &str = "♪";

struct Palette {
    bg: Color,
    fg: Color,
    dim: Color,
    accent: Color,
}

fn palette(theme: Theme) -> Palette {
    match theme {
        Theme::Dark => Palette { bg: Color::Black, fg: Color::White, dim: Color::DarkGray, accent: Color::Cyan },
        Theme::Light => Palette { bg: Color::White, fg: Color::Black, dim: Color::Gray, accent: Color::Blue },
    }
}

fn band_color(band: GaugeBand) -> Color {
    match band {
        GaugeBand::Low => Color::Green,
        GaugeBand::Elevated => Color::Yellow,
        GaugeBand::Critical => Color::Red,
    }
}

fn rect(a: Area) -> Rect {
    Rect::new(a.x, a.y, a.width, a.height)
}

pub fn draw(f: &mut Frame, view: &FrameView<'_>) {
    let colors = palette(view.theme);
    let screen = f.area();
    f.render_widget(Block::default().style(Style::default().bg(colors.bg).fg(colors.fg)), screen);

    let stage = Rect::new(screen.x, screen.y, screen.width, screen.height.saturating_sub(STATUS_ROWS));
    draw_pet(f, view, stage);
    if let Some(text) = view.bubble {
        draw_bubble(f, text, view.pet_area, stage, &colors);
    }
    match view.overlay {
        UiMode::Idle => {}
        UiMode::MenuOpen(menu) => draw_menu(f, menu, view, stage, &colors),
        UiMode::PromptOpen(prompt) => draw_prompt(f, prompt, stage, &colors),
    }

    let status = Rect::new(screen.x, stage.bottom(), screen.width, STATUS_ROWS.min(screen.height));
    draw_status(f, view, status, &colors);
}

fn draw_pet(f: &mut Frame, view: &FrameView<'_>, stage: Rect) {
    let area = rect(view.pet_area).intersection(stage);
    if area.is_empty() {
        return;
    }
    let (r, g, b) = view.tint;
    let lines: Vec<Line> = view.sprite_rows.iter().map(|row| Line::raw(row.as_str())).collect();
    f.render_widget(Paragraph::new(lines).style(Style::default().fg(Color::Rgb(r, g, b))), area);

    if view.speaking {
        let note = Rect::new(area.right(), area.y, 1, 1).intersection(stage);
        if !note.is_empty() {
            f.render_widget(Paragraph::new(NOTE).fg(Color::Rgb(r, g, b)), note);
        }
    }
}

fn draw_bubble(f: &mut Frame, text: &str, pet: Area, stage: Rect, colors: &Palette) {
    let area = bubble_area(text, pet, (stage.width, stage.height)).intersection(stage);
    if area.is_empty() {
        return;
    }
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(colors.dim));
    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(text).block(block).wrap(Wrap { trim: true }).style(Style::default().bg(colors.bg).fg(colors.fg)),
        area,
    );
}

/// Bubble rectangle: above the pet when there is room, else below it.
fn bubble_area(text: &str, pet: Area, surface: (u16, u16)) -> Rect {
    let inner_max = BUBBLE_MAX_WIDTH.saturating_sub(2) as usize;
    let inner = text.width().clamp(1, inner_max);
    let rows = greedy_wrap_rows(text, inner);
    let width = inner as u16 + 2;
    let height = rows + 2;

    let x = (pet.x + pet.width / 2).saturating_sub(width / 2);
    let y = if pet.y >= height { pet.y - height } else { pet.bottom() };
    let fitted = Area::new(x, y, width, height).fit_within(surface);
    rect(fitted)
}

fn draw_menu(f: &mut Frame, menu: &ControlMenu, view: &FrameView<'_>, stage: Rect, colors: &Palette) {
    let area = rect(menu.area()).intersection(stage);
    if area.is_empty() {
        return;
    }
    f.render_widget(Clear, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(format!(" {} ", view.pet_name))
        .style(Style::default().bg(colors.bg).fg(colors.fg))
        .border_style(Style::default().fg(colors.accent));
    f.render_widget(block, area);

    for button in menu.buttons() {
        let selected = matches!(button.action, deskpet_core::ui::MenuAction::ShowGauge(k) if menu.gauge() == Some(k));
        let style = if selected { Style::default().fg(colors.accent).bold() } else { Style::default() };
        let label = Line::from(vec![Span::styled("› ", Style::default().fg(colors.dim)), Span::styled(button.label, style)]);
        let target = rect(button.area).intersection(stage);
        if !target.is_empty() {
            f.render_widget(Paragraph::new(label), target);
        }
    }

    let gauge_area = rect(menu.gauge_area()).intersection(stage);
    if gauge_area.is_empty() {
        return;
    }
    match menu.gauge() {
        Some(kind) => {
            let percent = kind.percent(&view.telemetry);
            let gauge = Gauge::default()
                .block(Block::default().borders(Borders::TOP).title(kind.label()))
                .gauge_style(Style::default().fg(band_color(gauge_band(percent))).bg(colors.bg))
                .percent(percent.round() as u16)
                .label(kind.readout(&view.telemetry));
            f.render_widget(gauge, gauge_area);
        }
        None => {
            let hint = Paragraph::new(format!("mood: {}", view.mood)).fg(colors.dim);
            f.render_widget(hint, gauge_area);
        }
    }
}

fn draw_prompt(f: &mut Frame, prompt: &PromptInput, stage: Rect, colors: &Palette) {
    let area = rect(prompt.area()).intersection(stage);
    if area.is_empty() {
        return;
    }
    f.render_widget(Clear, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(" Ask me anything ")
        .style(Style::default().bg(colors.bg).fg(colors.fg))
        .border_style(Style::default().fg(colors.accent));
    let line = Line::from(vec![Span::raw("> "), Span::raw(prompt.text())]);
    f.render_widget(Paragraph::new(line).block(block), area);

    let cursor_x = area.x + 1 + "> ".width() as u16 + prompt.text().width() as u16;
    if cursor_x < area.right().saturating_sub(1) {
        f.set_cursor_position(Position::new(cursor_x, area.y + 1));
    }
}

fn draw_status(f: &mut Frame, view: &FrameView<'_>, area: Rect, colors: &Palette) {
    if area.is_empty() {
        return;
    }
    let t = &view.telemetry;
    let text = format!(
        " {}  |  {}  |  cpu {:.0}%  gpu {:.0}%  mem {:.0}%  {:.0}°C  |  right-click/m: menu  q: quit",
        view.pet_name,
        view.mood,
        t.cpu_usage,
        t.gpu_usage,
        t.mem_usage,
        t.max_temp(),
    );
    let para = Paragraph::new(Line::from(Span::styled(text, Style::default().fg(colors.dim))));
    f.render_widget(para, area);
}

/// Count visual rows for a single unwrapped string using greedy wrap.
/// Each character is placed on the current row; if it doesn't fit, a new row starts.
fn greedy_wrap_rows(s: &str, width: usize) -> u16 {
    if width == 0 {
        return 1;
    }
    let mut rows: u16 = 1;
    let mut col: usize = 0;
    for ch in s.chars() {
        let cw = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if cw == 0 {
            continue;
        }
        if col + cw > width {
            rows += 1;
            col = cw;
        } else {
            col += cw;
        }
    }
    rows
}
