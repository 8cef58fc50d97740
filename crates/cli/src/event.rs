use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind};
use tokio::sync::mpsc;

use deskpet_core::ui::{KeyInput, PointerButton, UiInput};

use crate::widgets::STATUS_ROWS;

/// Spawn the crossterm reader in a dedicated thread, forwarding mapped input
/// to the frame loop. The thread exits when `stop` is set or the loop is gone.
pub fn spawn(tx: mpsc::Sender<UiInput>, stop: Arc<AtomicBool>) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        while !stop.load(Ordering::Relaxed) {
            // 20ms poll keeps clicks responsive at 30 fps
            if !event::poll(Duration::from_millis(20)).unwrap_or(false) {
                continue;
            }
            let Ok(evt) = event::read() else { continue };
            let Some(input) = map_event(evt) else { continue };
            match tx.try_send(input) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => tracing::debug!("input queue full, event dropped"),
                Err(mpsc::error::TrySendError::Closed(_)) => break,
            }
        }
    })
}

/// Translate a terminal event into overlay input. Unhandled events map to `None`.
pub fn map_event(evt: Event) -> Option<UiInput> {
    match evt {
        Event::Key(key) => map_key(key),
        Event::Mouse(mouse) => {
            let button = match mouse.kind {
                MouseEventKind::Down(MouseButton::Left) => PointerButton::Primary,
                MouseEventKind::Down(MouseButton::Right) => PointerButton::Secondary,
                _ => return None,
            };
            Some(UiInput::Pointer { button, x: mouse.column, y: mouse.row })
        }
        Event::Resize(width, height) => Some(UiInput::Resize {
            width,
            height: height.saturating_sub(STATUS_ROWS),
        }),
        _ => None,
    }
}

fn map_key(key: KeyEvent) -> Option<UiInput> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    match (key.modifiers, key.code) {
        (KeyModifiers::CONTROL, KeyCode::Char('c')) => Some(UiInput::Quit),
        (_, KeyCode::Enter) => Some(UiInput::Key(KeyInput::Enter)),
        (_, KeyCode::Esc) => Some(UiInput::Key(KeyInput::Escape)),
        (_, KeyCode::Backspace) => Some(UiInput::Key(KeyInput::Backspace)),
        (m, KeyCode::Char(c)) if !m.contains(KeyModifiers::CONTROL) => Some(UiInput::Key(KeyInput::Char(c))),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::MouseEvent;

    fn mouse(kind: MouseEventKind) -> Event {
        Event::Mouse(MouseEvent { kind, column: 4, row: 7, modifiers: KeyModifiers::NONE })
    }

    #[test]
    fn keys_map_to_overlay_input() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(map_event(Event::Key(ctrl_c)), Some(UiInput::Quit));
        let a = KeyEvent::new(KeyCode::Char('A'), KeyModifiers::SHIFT);
        assert_eq!(map_event(Event::Key(a)), Some(UiInput::Key(KeyInput::Char('A'))));
        let esc = KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE);
        assert_eq!(map_event(Event::Key(esc)), Some(UiInput::Key(KeyInput::Escape)));
        let ctrl_x = KeyEvent::new(KeyCode::Char('x'), KeyModifiers::CONTROL);
        assert_eq!(map_event(Event::Key(ctrl_x)), None);
    }

    #[test]
    fn clicks_map_to_pointer_buttons() {
        assert_eq!(
            map_event(mouse(MouseEventKind::Down(MouseButton::Right))),
            Some(UiInput::Pointer { button: PointerButton::Secondary, x: 4, y: 7 })
        );
        assert_eq!(
            map_event(mouse(MouseEventKind::Down(MouseButton::Left))),
            Some(UiInput::Pointer { button: PointerButton::Primary, x: 4, y: 7 })
        );
        assert_eq!(map_event(mouse(MouseEventKind::Moved)), None);
    }

    #[test]
    fn resize_reserves_status_row() {
        assert_eq!(map_event(Event::Resize(100, 30)), Some(UiInput::Resize { width: 100, height: 29 }));
    }
}
