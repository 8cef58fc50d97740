use super::geometry::Area;
use super::menu::{ControlMenu, MenuAction};
use super::prompt::PromptInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    Enter,
    Escape,
    Backspace,
    Char(char),
}

/// Raw input delivered to the frame loop by the frontend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiInput {
    Pointer { button: PointerButton, x: u16, y: u16 },
    Key(KeyInput),
    Resize { width: u16, height: u16 },
    Quit,
}

/// What the frame loop must do after an input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEffect {
    AskPet(String),
    ToggleTheme,
    NextPet,
    Quit,
}

/// Overlay mode. At most one of menu and prompt is open.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum UiMode {
    #[default]
    Idle,
    MenuOpen(ControlMenu),
    PromptOpen(PromptInput),
}

impl UiMode {
    pub fn name(&self) -> &'static str {
        match self {
            UiMode::Idle => "idle",
            UiMode::MenuOpen(_) => "menu",
            UiMode::PromptOpen(_) => "prompt",
        }
    }
}

/// Menu and prompt state machine.
///
/// Secondary click toggles the menu; `m` does the same from the keyboard and
/// `q` quits, except while typing in the prompt.
#[derive(Debug, Default)]
pub struct UiState {
    mode: UiMode,
}

impl UiState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> &UiMode {
        &self.mode
    }

    /// Apply one input. `anchor` is the pet's current cell area.
    pub fn handle(&mut self, input: UiInput, anchor: Area, surface: (u16, u16)) -> Option<UiEffect> {
        let before = self.mode.name();
        let effect = match std::mem::take(&mut self.mode) {
            UiMode::Idle => self.on_idle(input, anchor, surface),
            UiMode::MenuOpen(menu) => self.on_menu(menu, input, anchor, surface),
            UiMode::PromptOpen(prompt) => self.on_prompt(prompt, input),
        };
        if before != self.mode.name() {
            tracing::debug!(from = before, to = self.mode.name(), "overlay mode changed");
        }
        effect
    }

    fn on_idle(&mut self, input: UiInput, anchor: Area, surface: (u16, u16)) -> Option<UiEffect> {
        match input {
            UiInput::Pointer { button: PointerButton::Secondary, .. } | UiInput::Key(KeyInput::Char('m')) => {
                self.mode = UiMode::MenuOpen(ControlMenu::open_beside(anchor, surface));
                None
            }
            UiInput::Key(KeyInput::Char('q')) | UiInput::Quit => Some(UiEffect::Quit),
            _ => None,
        }
    }

    fn on_menu(&mut self, mut menu: ControlMenu, input: UiInput, anchor: Area, surface: (u16, u16)) -> Option<UiEffect> {
        match input {
            UiInput::Pointer { button: PointerButton::Primary, x, y } if menu.area().contains(x, y) => {
                let Some(action) = menu.action_at(x, y) else {
                    self.mode = UiMode::MenuOpen(menu);
                    return None;
                };
                match action {
                    MenuAction::ShowGauge(kind) => {
                        menu.show_gauge(kind);
                        self.mode = UiMode::MenuOpen(menu);
                        None
                    }
                    MenuAction::ToggleTheme => {
                        self.mode = UiMode::MenuOpen(menu);
                        Some(UiEffect::ToggleTheme)
                    }
                    MenuAction::NextPet => {
                        self.mode = UiMode::MenuOpen(menu);
                        Some(UiEffect::NextPet)
                    }
                    MenuAction::Ask => {
                        self.mode = UiMode::PromptOpen(PromptInput::open_above(anchor, surface));
                        None
                    }
                    MenuAction::Quit => Some(UiEffect::Quit),
                }
            }
            // any other click, or closing keys, dismiss the menu
            UiInput::Pointer { .. } | UiInput::Key(KeyInput::Escape) | UiInput::Key(KeyInput::Char('m')) => None,
            UiInput::Key(KeyInput::Char('q')) | UiInput::Quit => Some(UiEffect::Quit),
            UiInput::Resize { width, height } => {
                self.mode = UiMode::MenuOpen(Self::reopened(&menu, anchor, (width, height)));
                None
            }
            UiInput::Key(_) => {
                self.mode = UiMode::MenuOpen(menu);
                None
            }
        }
    }

    fn on_prompt(&mut self, mut prompt: PromptInput, input: UiInput) -> Option<UiEffect> {
        match input {
            UiInput::Key(KeyInput::Enter) => match prompt.submit() {
                Some(text) => Some(UiEffect::AskPet(text)),
                None => {
                    self.mode = UiMode::PromptOpen(prompt);
                    None
                }
            },
            UiInput::Key(KeyInput::Escape) => None,
            UiInput::Key(KeyInput::Backspace) => {
                prompt.backspace();
                self.mode = UiMode::PromptOpen(prompt);
                None
            }
            UiInput::Key(KeyInput::Char(c)) => {
                prompt.insert(c);
                self.mode = UiMode::PromptOpen(prompt);
                None
            }
            UiInput::Pointer { x, y, .. } if !prompt.area().contains(x, y) => None,
            UiInput::Quit => Some(UiEffect::Quit),
            UiInput::Pointer { .. } | UiInput::Resize { .. } => {
                self.mode = UiMode::PromptOpen(prompt);
                None
            }
        }
    }

    fn reopened(menu: &ControlMenu, anchor: Area, surface: (u16, u16)) -> ControlMenu {
        let mut fresh = ControlMenu::open_beside(anchor, surface);
        if let Some(kind) = menu.gauge() {
            fresh.show_gauge(kind);
        }
        fresh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::menu::GaugeKind;

    const PET: Area = Area::new(30, 10, 7, 6);
    const SURFACE: (u16, u16) = (100, 30);

    fn click(button: PointerButton, x: u16, y: u16) -> UiInput {
        UiInput::Pointer { button, x, y }
    }

    fn key(c: char) -> UiInput {
        UiInput::Key(KeyInput::Char(c))
    }

    fn open_menu(ui: &mut UiState) -> ControlMenu {
        assert_eq!(ui.handle(click(PointerButton::Secondary, 31, 11), PET, SURFACE), None);
        match ui.mode() {
            UiMode::MenuOpen(menu) => menu.clone(),
            other => panic!("expected menu, got {other:?}"),
        }
    }

    fn button(menu: &ControlMenu, action: MenuAction) -> (u16, u16) {
        let b = menu.buttons().iter().find(|b| b.action == action).unwrap();
        (b.area.x, b.area.y)
    }

    #[test]
    fn secondary_click_toggles_menu() {
        let mut ui = UiState::new();
        open_menu(&mut ui);
        ui.handle(click(PointerButton::Secondary, 0, 0), PET, SURFACE);
        assert_eq!(ui.mode(), &UiMode::Idle);
    }

    #[test]
    fn primary_click_on_idle_does_nothing() {
        let mut ui = UiState::new();
        assert_eq!(ui.handle(click(PointerButton::Primary, 31, 11), PET, SURFACE), None);
        assert_eq!(ui.mode(), &UiMode::Idle);
    }

    #[test]
    fn gauge_button_keeps_menu_open() {
        let mut ui = UiState::new();
        let menu = open_menu(&mut ui);
        let (x, y) = button(&menu, MenuAction::ShowGauge(GaugeKind::Memory));
        assert_eq!(ui.handle(click(PointerButton::Primary, x, y), PET, SURFACE), None);
        match ui.mode() {
            UiMode::MenuOpen(m) => assert_eq!(m.gauge(), Some(GaugeKind::Memory)),
            other => panic!("menu closed: {other:?}"),
        }
    }

    #[test]
    fn theme_and_pet_buttons_emit_effects() {
        let mut ui = UiState::new();
        let menu = open_menu(&mut ui);
        let (x, y) = button(&menu, MenuAction::ToggleTheme);
        assert_eq!(ui.handle(click(PointerButton::Primary, x, y), PET, SURFACE), Some(UiEffect::ToggleTheme));
        let (x, y) = button(&menu, MenuAction::NextPet);
        assert_eq!(ui.handle(click(PointerButton::Primary, x, y), PET, SURFACE), Some(UiEffect::NextPet));
        assert_eq!(ui.mode().name(), "menu");
    }

    #[test]
    fn click_outside_menu_closes_it() {
        let mut ui = UiState::new();
        open_menu(&mut ui);
        ui.handle(click(PointerButton::Primary, 0, 0), PET, SURFACE);
        assert_eq!(ui.mode(), &UiMode::Idle);
    }

    #[test]
    fn ask_flow_submits_trimmed_question() {
        let mut ui = UiState::new();
        let menu = open_menu(&mut ui);
        let (x, y) = button(&menu, MenuAction::Ask);
        ui.handle(click(PointerButton::Primary, x, y), PET, SURFACE);
        assert_eq!(ui.mode().name(), "prompt");

        // menu shortcuts are plain text while typing
        for c in " hello q".chars() {
            assert_eq!(ui.handle(key(c), PET, SURFACE), None);
        }
        ui.handle(UiInput::Key(KeyInput::Backspace), PET, SURFACE);
        ui.handle(UiInput::Key(KeyInput::Backspace), PET, SURFACE);
        let effect = ui.handle(UiInput::Key(KeyInput::Enter), PET, SURFACE);
        assert_eq!(effect, Some(UiEffect::AskPet("hello".into())));
        assert_eq!(ui.mode(), &UiMode::Idle);
    }

    #[test]
    fn empty_prompt_stays_open_and_escape_closes() {
        let mut ui = UiState::new();
        let menu = open_menu(&mut ui);
        let (x, y) = button(&menu, MenuAction::Ask);
        ui.handle(click(PointerButton::Primary, x, y), PET, SURFACE);
        assert_eq!(ui.handle(UiInput::Key(KeyInput::Enter), PET, SURFACE), None);
        assert_eq!(ui.mode().name(), "prompt");
        ui.handle(UiInput::Key(KeyInput::Escape), PET, SURFACE);
        assert_eq!(ui.mode(), &UiMode::Idle);
    }

    #[test]
    fn keyboard_shortcuts() {
        let mut ui = UiState::new();
        ui.handle(key('m'), PET, SURFACE);
        assert_eq!(ui.mode().name(), "menu");
        ui.handle(key('m'), PET, SURFACE);
        assert_eq!(ui.mode(), &UiMode::Idle);
        assert_eq!(ui.handle(key('q'), PET, SURFACE), Some(UiEffect::Quit));
    }

    #[test]
    fn quit_button_closes_menu() {
        let mut ui = UiState::new();
        let menu = open_menu(&mut ui);
        let (x, y) = button(&menu, MenuAction::Quit);
        assert_eq!(ui.handle(click(PointerButton::Primary, x, y), PET, SURFACE), Some(UiEffect::Quit));
        assert_eq!(ui.mode(), &UiMode::Idle);
    }

    #[test]
    fn resize_keeps_menu_and_gauge() {
        let mut ui = UiState::new();
        let menu = open_menu(&mut ui);
        let (x, y) = button(&menu, MenuAction::ShowGauge(GaugeKind::Cpu));
        ui.handle(click(PointerButton::Primary, x, y), PET, SURFACE);
        ui.handle(UiInput::Resize { width: 50, height: 20 }, PET, (50, 20));
        match ui.mode() {
            UiMode::MenuOpen(m) => {
                assert!(m.area().right() <= 50);
                assert_eq!(m.gauge(), Some(GaugeKind::Cpu));
            }
            other => panic!("menu closed: {other:?}"),
        }
    }
}
