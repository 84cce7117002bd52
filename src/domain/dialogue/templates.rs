//! Fixed tutor lines for moments that must not depend on generation.
//!
//! Opening, confirmation, fallback and restart wording is canned so the
//! tutor stays predictable exactly when the model pipeline is degraded
//! or unavailable.

/// Returns the opening message for a new session on the given question.
pub fn opening_message(question_prompt: &str) -> String {
    format!("{OPENING_LEAD_IN}\n\n{question_prompt}\n\n{OPENING_INSTRUCTIONS}")
}

/// Returns the line asking the student to repeat a poorly heard answer.
pub fn confirmation_request() -> &'static str {
    CONFIRMATION_REQUEST
}

/// Returns a neutral acknowledgement when analysis produced no signal.
pub fn acknowledgement() -> &'static str {
    ACKNOWLEDGEMENT
}

/// Returns the safe default used when generated content cannot be trusted.
pub fn safe_default() -> &'static str {
    SAFE_DEFAULT
}

/// Returns the notice sent after a stuck session is reset.
pub fn restart_notice() -> &'static str {
    RESTART_NOTICE
}

// ============================================================================
// Tutor Lines
// ============================================================================

const OPENING_LEAD_IN: &str =
    "Let's work through a problem together. Here is your question:";

const OPENING_INSTRUCTIONS: &str = "Talk me through your reasoning out loud, \
step by step. I'll listen without interrupting, and I'm here if you get stuck.";

const CONFIRMATION_REQUEST: &str = "I didn't catch that clearly. Could you \
say that part again?";

const ACKNOWLEDGEMENT: &str = "Okay, I'm following. Keep going.";

const SAFE_DEFAULT: &str = "I'm unable to determine a reliable answer to \
that from the material we're working with. Let's stay with what the question \
gives us. Can you walk me through your last step once more?";

const RESTART_NOTICE: &str = "It looks like we stalled, so I've reset our \
session. Say the word when you're ready to start again.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opening_embeds_the_question_prompt() {
        let message = opening_message("Explain why quicksort is O(n log n) on average.");
        assert!(message.contains("quicksort"));
        assert!(message.starts_with("Let's work through"));
        assert!(message.contains("out loud"));
    }

    #[test]
    fn safe_default_admits_uncertainty_without_guessing() {
        let line = safe_default();
        assert!(line.contains("unable to determine"));
        // The fallback must hand the turn back to the student
        assert!(line.ends_with('?'));
    }

    #[test]
    fn confirmation_asks_for_a_repeat() {
        assert!(confirmation_request().contains("again"));
    }

    #[test]
    fn restart_notice_mentions_the_reset() {
        assert!(restart_notice().contains("reset"));
    }
}
