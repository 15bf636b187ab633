use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static REPEATED_NEWLINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{2,}").unwrap());
static REPEATED_SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]{2,}").unwrap());
static BLANK_PARAGRAPH: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[ \t]*\n").unwrap());

/// Normalizes extracted text before chunking: NFKC, dash and zero-width
/// cleanup, whitespace collapsing, blank paragraph removal.
pub fn clean_text(raw: &str) -> String {
    let mut text: String = raw.nfkc().collect();
    text = text
        .replace(['\u{2013}', '\u{2014}'], "-")
        .replace('\u{200b}', "")
        .replace("\r\n", "\n")
        .replace('\r', "\n");
    text = REPEATED_SPACES.replace_all(&text, " ").into_owned();
    text = BLANK_PARAGRAPH.replace_all(&text, "\n").into_owned();
    text = REPEATED_NEWLINES.replace_all(&text, "\n").into_owned();
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace_runs() {
        assert_eq!(clean_text("a  b\t\tc"), "a b c");
        assert_eq!(clean_text("line one\n\n\n\nline two"), "line one\nline two");
    }

    #[test]
    fn normalizes_dashes_and_zero_width() {
        assert_eq!(clean_text("2022\u{2013}2023"), "2022-2023");
        assert_eq!(clean_text("rev\u{200b}enue"), "revenue");
    }

    #[test]
    fn drops_blank_paragraphs() {
        assert_eq!(clean_text("alpha\n   \nbeta"), "alpha\nbeta");
    }

    #[test]
    fn trims_to_empty_for_whitespace_only_input() {
        assert_eq!(clean_text("  \n\t \n "), "");
    }
}
