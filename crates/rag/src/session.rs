use serde::{Deserialize, Serialize};

use finsight_index::EmbeddingIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    /// Capitalized label used in the exported transcript.
    pub fn label(&self) -> &'static str {
        match self {
            ChatRole::User => "User",
            ChatRole::Assistant => "Assistant",
        }
    }

    fn from_label(label: &str) -> Option<Self> {
        match label.to_lowercase().as_str() {
            "user" => Some(ChatRole::User),
            "assistant" => Some(ChatRole::Assistant),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

/// Everything derived from the current document. Replaced wholesale on a
/// new upload; there is no merge and no versioning.
pub struct DocumentState {
    pub filename: String,
    pub index: EmbeddingIndex,
    pub summary: String,
    pub insights: String,
}

/// The single mutable session context: the chat turn log plus the current
/// document state. One session owns both exclusively.
#[derive(Default)]
pub struct Session {
    turns: Vec<ChatTurn>,
    document: Option<DocumentState>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn document(&self) -> Option<&DocumentState> {
        self.document.as_ref()
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.turns.push(ChatTurn {
            role: ChatRole::User,
            content: content.into(),
        });
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.turns.push(ChatTurn {
            role: ChatRole::Assistant,
            content: content.into(),
        });
    }

    /// Discards any previous document state entirely. The chat log is kept;
    /// only reset clears it.
    pub fn install_document(&mut self, state: DocumentState) {
        self.document = Some(state);
    }

    pub fn reset(&mut self) {
        self.turns.clear();
        self.document = None;
    }

    /// Plain-text transcript: `Role: content` paragraphs.
    pub fn export_transcript(&self) -> String {
        self.turns
            .iter()
            .map(|turn| format!("{}: {}", turn.role.label(), turn.content))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn export_insights(&self) -> Option<String> {
        self.document
            .as_ref()
            .map(|doc| format!("{}\n\n{}", doc.summary, doc.insights))
    }
}

/// Inverse of `export_transcript`. A line starting with a role label opens a
/// new turn; other lines (including blanks) continue the current content.
pub fn parse_transcript(text: &str) -> Vec<ChatTurn> {
    let mut turns: Vec<ChatTurn> = Vec::new();
    for line in text.lines() {
        if let Some((label, rest)) = line.split_once(": ") {
            if let Some(role) = ChatRole::from_label(label) {
                turns.push(ChatTurn {
                    role,
                    content: rest.to_string(),
                });
                continue;
            }
        }
        if let Some(current) = turns.last_mut() {
            current.content.push('\n');
            current.content.push_str(line);
        }
    }
    for turn in &mut turns {
        turn.content = turn.content.trim().to_string();
    }
    turns
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcript_round_trips_in_order() {
        let mut session = Session::new();
        session.push_user("What was the revenue?");
        session.push_assistant("Revenue was 150 Cr.");
        session.push_user("And net profit?");
        session.push_assistant("Net profit was 20 Cr.");

        let exported = session.export_transcript();
        let parsed = parse_transcript(&exported);

        assert_eq!(parsed.len(), 4);
        for (original, recovered) in session.turns().iter().zip(&parsed) {
            assert_eq!(original.role, recovered.role);
            assert_eq!(original.content, recovered.content);
        }
    }

    #[test]
    fn multiline_content_survives_the_round_trip() {
        let mut session = Session::new();
        session.push_user("Summarize");
        session.push_assistant("- Revenue: 150 Cr\n- Profit: 20 Cr");

        let parsed = parse_transcript(&session.export_transcript());
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1].content, "- Revenue: 150 Cr\n- Profit: 20 Cr");
    }

    #[test]
    fn empty_transcript_parses_to_no_turns() {
        assert!(parse_transcript("").is_empty());
    }

    #[test]
    fn reset_clears_turns_and_document() {
        let mut session = Session::new();
        session.push_user("hello");
        session.reset();
        assert!(session.turns().is_empty());
        assert!(session.document().is_none());
        assert!(session.export_insights().is_none());
    }
}
