use super::geometry::Area;

/// Longest question the prompt accepts, in characters.
pub const PROMPT_MAX_CHARS: usize = 35;

/// Single-line text entry popup for asking the pet a question.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptInput {
    text: String,
    area: Area,
}

impl PromptInput {
    pub const WIDTH: u16 = PROMPT_MAX_CHARS as u16 + 5;
    pub const HEIGHT: u16 = 3;

    /// Open centred above `anchor` (the pet), kept on screen.
    pub fn open_above(anchor: Area, surface: (u16, u16)) -> Self {
        let center = anchor.x + anchor.width / 2;
        let x = center.saturating_sub(Self::WIDTH / 2);
        let y = anchor.y.saturating_sub(Self::HEIGHT + 1);
        Self {
            text: String::new(),
            area: Area::new(x, y, Self::WIDTH, Self::HEIGHT).fit_within(surface),
        }
    }

    pub fn area(&self) -> Area {
        self.area
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Append a printable character. Returns false when rejected.
    pub fn insert(&mut self, c: char) -> bool {
        if c.is_control() || self.text.chars().count() >= PROMPT_MAX_CHARS {
            return false;
        }
        self.text.push(c);
        true
    }

    pub fn backspace(&mut self) {
        self.text.pop();
    }

    /// Trimmed text, or `None` when there is nothing to send.
    pub fn submit(&self) -> Option<String> {
        let trimmed = self.text.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_owned())
    }
}
