use std::time::{Duration, Instant};

/// Text for the speech bubble, sent from the speech actor to the frame loop.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayUpdate {
    /// Sequence number of the request that produced the text.
    pub seq: u64,
    pub text: String,
    pub duration: Duration,
}

#[derive(Debug, Clone, PartialEq)]
struct Shown {
    seq: u64,
    text: String,
    expires_at: Instant,
}

/// Speech bubble state. Owned by the frame loop, which is its only writer.
///
/// Updates carry the sequence number of their request; anything older than
/// the newest request already shown is dropped, so a late reply can never
/// replace text belonging to a newer request.
#[derive(Debug, Default)]
pub struct DisplayState {
    current: Option<Shown>,
    high_water: u64,
}

impl DisplayState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show `update` unless it is stale. Returns whether it was applied.
    pub fn apply(&mut self, update: DisplayUpdate, now: Instant) -> bool {
        if update.seq < self.high_water {
            tracing::debug!(seq = update.seq, newest = self.high_water, "dropping stale bubble text");
            return false;
        }
        self.high_water = update.seq;
        self.current = Some(Shown {
            seq: update.seq,
            text: update.text,
            expires_at: now + update.duration,
        });
        true
    }

    /// Clear the bubble once its timer has run out.
    pub fn expire(&mut self, now: Instant) {
        if self.current.as_ref().is_some_and(|s| now >= s.expires_at) {
            self.current = None;
        }
    }

    pub fn text(&self) -> Option<&str> {
        self.current.as_ref().map(|s| s.text.as_str())
    }

    pub fn current_seq(&self) -> Option<u64> {
        self.current.as_ref().map(|s| s.seq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(seq: u64, text: &str, secs: u64) -> DisplayUpdate {
        DisplayUpdate { seq, text: text.into(), duration: Duration::from_secs(secs) }
    }

    #[test]
    fn text_expires_after_duration() {
        let t0 = Instant::now();
        let mut d = DisplayState::new();
        assert!(d.apply(update(1, "hello", 5), t0));
        d.expire(t0 + Duration::from_secs(4));
        assert_eq!(d.text(), Some("hello"));
        d.expire(t0 + Duration::from_secs(5));
        assert_eq!(d.text(), None);
    }

    #[test]
    fn reply_replaces_its_own_placeholder() {
        let t0 = Instant::now();
        let mut d = DisplayState::new();
        d.apply(update(4, "thinking...", 10), t0);
        assert!(d.apply(update(4, "Beep boop.", 7), t0));
        assert_eq!(d.text(), Some("Beep boop."));
        assert_eq!(d.current_seq(), Some(4));
    }

    #[test]
    fn older_reply_cannot_overwrite_newer_request() {
        let t0 = Instant::now();
        let mut d = DisplayState::new();
        d.apply(update(7, "thinking...", 10), t0);
        assert!(!d.apply(update(6, "late answer", 7), t0));
        assert_eq!(d.text(), Some("thinking..."));

        // still stale after the bubble has cleared
        d.expire(t0 + Duration::from_secs(11));
        assert!(!d.apply(update(6, "late answer", 7), t0));
        assert_eq!(d.text(), None);
    }
}
