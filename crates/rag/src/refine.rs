/// Replies the refinement hints consider uninformative even after the
/// low-confidence substitution has run.
const POOR_REPLIES: [&str; 4] = ["i don't know", "not found", "no data", "n/a"];

const MIN_USEFUL_CHARS: usize = 20;

/// Heuristic check for an unclear or incomplete answer; used to decide
/// whether to offer question-refinement tips alongside the reply.
pub fn is_response_poor(response: &str) -> bool {
    let normalized = response.trim().to_lowercase();
    if normalized.is_empty() {
        return true;
    }
    if POOR_REPLIES.contains(&normalized.as_str()) {
        return true;
    }
    normalized.chars().count() < MIN_USEFUL_CHARS
}

pub fn refinement_suggestions() -> &'static [&'static str] {
    &[
        "Try asking about a specific year or quarter.",
        "Ask for a financial metric (e.g., revenue, profit, expenses).",
        "Mention a section from the report like 'balance sheet' or 'cash flow'.",
        "Use clearer terms or rephrase the question.",
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_sentinel_replies_are_poor() {
        assert!(is_response_poor(""));
        assert!(is_response_poor("   "));
        assert!(is_response_poor("Not Found"));
        assert!(is_response_poor("n/a"));
    }

    #[test]
    fn short_replies_are_poor() {
        assert!(is_response_poor("150 Cr"));
    }

    #[test]
    fn substantive_replies_are_not_poor() {
        assert!(!is_response_poor(
            "Revenue for FY23 was 150 Cr, up 12% year over year."
        ));
    }

    #[test]
    fn suggestions_are_available() {
        assert!(!refinement_suggestions().is_empty());
    }
}
