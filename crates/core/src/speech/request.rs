use crate::mood::Mood;
use crate::telemetry::TelemetrySnapshot;

/// What produced a request. Drives logging and display duration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestKind {
    Idle,
    MoodReaction(Mood),
    UserPrompt,
}

/// Context handed to the AI backend alongside the prompt.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AiContext {
    pub mood: Mood,
    pub pet_name: String,
    pub stats: Option<TelemetrySnapshot>,
}

impl AiContext {
    /// `key: value` lines, stats last.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("mood: {}", self.mood),
            format!("pet_name: {}", self.pet_name),
        ];
        if let Some(stats) = &self.stats {
            lines.extend(stats.context_lines().into_iter().map(|(k, v)| format!("{k}: {v}")));
        }
        lines
    }
}

/// One unit of speech work. Consumed exactly once by the speech actor.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechRequest {
    /// Assigned by the dispatcher; 0 until dispatched.
    pub seq: u64,
    pub kind: RequestKind,
    /// A scripted line, or the user's question when `is_ai_query`.
    pub text_or_prompt: String,
    pub is_ai_query: bool,
    pub context: AiContext,
    /// Spoken when the AI backend is off or fails.
    pub fallback_text: String,
}

impl SpeechRequest {
    /// A scripted line. With an AI backend the line is rephrased in character.
    pub fn scripted(kind: RequestKind, line: impl Into<String>, context: AiContext) -> Self {
        let line = line.into();
        Self {
            seq: 0,
            kind,
            text_or_prompt: line.clone(),
            is_ai_query: false,
            context,
            fallback_text: line,
        }
    }

    /// An explicit user question.
    pub fn prompt(prompt: impl Into<String>, fallback: impl Into<String>, context: AiContext) -> Self {
        Self {
            seq: 0,
            kind: RequestKind::UserPrompt,
            text_or_prompt: prompt.into(),
            is_ai_query: true,
            context,
            fallback_text: fallback.into(),
        }
    }
}

/// True when `text` has at least `min_chars` characters after trimming.
pub fn long_enough(text: &str, min_chars: usize) -> bool {
    text.trim().chars().count() >= min_chars
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_request_falls_back_to_itself() {
        let req = SpeechRequest::scripted(RequestKind::Idle, "Need help?", AiContext::default());
        assert!(!req.is_ai_query);
        assert_eq!(req.fallback_text, "Need help?");
        assert_eq!(req.seq, 0);
    }

    #[test]
    fn context_lines_include_stats_when_present() {
        let mut ctx = AiContext { mood: Mood::Bored, pet_name: "Clippy".into(), stats: None };
        assert_eq!(ctx.lines(), vec!["mood: BORED", "pet_name: Clippy"]);

        ctx.stats = Some(TelemetrySnapshot { cpu_usage: 42.4, ..Default::default() });
        let lines = ctx.lines();
        assert!(lines.contains(&"cpu: 42%".to_string()));
    }

    #[test]
    fn length_guard_counts_trimmed_chars() {
        assert!(!long_enough("  hi  ", 3));
        assert!(!long_enough("", 3));
        assert!(long_enough(" hey ", 3));
        assert!(long_enough("héé", 3));
    }
}
