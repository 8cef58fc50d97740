/// A rectangle of terminal cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Area {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Area {
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> u16 {
        self.x.saturating_add(self.width)
    }

    pub fn bottom(&self) -> u16 {
        self.y.saturating_add(self.height)
    }

    pub fn contains(&self, x: u16, y: u16) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Shift (and if needed shrink) so the area fits inside `surface`.
    pub fn fit_within(self, surface: (u16, u16)) -> Self {
        let width = self.width.min(surface.0);
        let height = self.height.min(surface.1);
        Self {
            x: self.x.min(surface.0 - width),
            y: self.y.min(surface.1 - height),
            width,
            height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_is_half_open() {
        let a = Area::new(2, 3, 4, 2);
        assert!(a.contains(2, 3));
        assert!(a.contains(5, 4));
        assert!(!a.contains(6, 4));
        assert!(!a.contains(5, 5));
        assert!(!a.contains(1, 3));
    }

    #[test]
    fn fit_within_shifts_then_shrinks() {
        assert_eq!(Area::new(70, 20, 20, 10).fit_within((80, 24)), Area::new(60, 14, 20, 10));
        assert_eq!(Area::new(5, 5, 100, 4).fit_within((80, 24)), Area::new(0, 5, 80, 4));
        assert_eq!(Area::new(5, 5, 3, 3).fit_within((0, 0)), Area::new(0, 0, 0, 0));
    }
}
