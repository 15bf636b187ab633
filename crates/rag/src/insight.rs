use anyhow::Result as AnyResult;

use finsight_llm::LlmResponse;

/// Documents longer than this are summarized/extracted on a prefix only.
/// Known, accepted limitation.
pub const INSIGHT_CHAR_BUDGET: usize = 3000;

/// Failure marker for the insight functions, which return text in every
/// case; callers branch on this prefix instead of a Result.
pub const FAILURE_PREFIX: &str = "error:";

const SUMMARY_SYSTEM_PROMPT: &str = "You are a financial analyst. Your task is to summarize \
company documents such as annual reports, profit/loss statements, balance sheets, or cash \
flow summaries. Provide a clear, concise summary in plain English using bullet points or \
paragraphs.";

const METRICS_PROMPT: &str = "You are a financial analyst. Extract the following from the \
document:\n- Revenue\n- Net Profit\n- EBITDA\n- ROE\n- ROCE\n- YoY Growth or Decline (if \
available)\n\nReturn in key-value pairs in plain text format (e.g., Revenue: 150 Cr).";

/// One-shot plain-English summary of the document prefix. Never fails:
/// invocation errors come back as a `FAILURE_PREFIX` string.
pub fn summarize(
    text: &str,
    invoke: &impl Fn(Option<&str>, &str) -> AnyResult<LlmResponse>,
) -> String {
    let user = format!(
        "Summarize the following financial report:\n\n{}",
        truncate_chars(text, INSIGHT_CHAR_BUDGET)
    );
    match invoke(Some(SUMMARY_SYSTEM_PROMPT), &user) {
        Ok(response) => response.content.trim().to_string(),
        Err(err) => format!("{FAILURE_PREFIX} failed to generate summary: {err}"),
    }
}

/// Best-effort metric extraction as `key: value` lines of free text; no
/// structure is validated here.
pub fn extract_metrics(
    text: &str,
    invoke: &impl Fn(Option<&str>, &str) -> AnyResult<LlmResponse>,
) -> String {
    let user = format!(
        "{METRICS_PROMPT}\n\n{}",
        truncate_chars(text, INSIGHT_CHAR_BUDGET)
    );
    match invoke(None, &user) {
        Ok(response) => response.content.trim().to_string(),
        Err(err) => format!("{FAILURE_PREFIX} metric extraction failed: {err}"),
    }
}

pub fn is_failure(text: &str) -> bool {
    text.starts_with(FAILURE_PREFIX)
}

fn truncate_chars(text: &str, budget: usize) -> &str {
    match text.char_indices().nth(budget) {
        Some((offset, _)) => &text[..offset],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn ok_invoke(content: &str) -> impl Fn(Option<&str>, &str) -> AnyResult<LlmResponse> + '_ {
        move |_: Option<&str>, _: &str| {
            Ok(LlmResponse {
                content: content.to_string(),
                prompt_tokens: 0,
                completion_tokens: 0,
            })
        }
    }

    #[test]
    fn summary_returns_trimmed_model_output() {
        let summary = summarize("Revenue grew strongly.", &ok_invoke("  - Revenue grew.  "));
        assert_eq!(summary, "- Revenue grew.");
        assert!(!is_failure(&summary));
    }

    #[test]
    fn metrics_prompt_names_the_closed_metric_set() {
        let seen = RefCell::new(String::new());
        let invoke = |_: Option<&str>, user: &str| {
            *seen.borrow_mut() = user.to_string();
            Ok(LlmResponse {
                content: "Revenue: 150 Cr".to_string(),
                prompt_tokens: 0,
                completion_tokens: 0,
            })
        };
        extract_metrics("doc text", &invoke);
        let prompt = seen.into_inner();
        for metric in ["Revenue", "Net Profit", "EBITDA", "ROE", "ROCE", "YoY"] {
            assert!(prompt.contains(metric), "prompt missing {metric}");
        }
    }

    #[test]
    fn input_is_truncated_to_the_character_budget() {
        let long = "x".repeat(INSIGHT_CHAR_BUDGET * 2);
        let seen = RefCell::new(String::new());
        let invoke = |_: Option<&str>, user: &str| {
            *seen.borrow_mut() = user.to_string();
            Ok(LlmResponse {
                content: "ok".to_string(),
                prompt_tokens: 0,
                completion_tokens: 0,
            })
        };
        summarize(&long, &invoke);
        let sent = seen.into_inner();
        let body = sent.rsplit("\n\n").next().unwrap();
        assert_eq!(body.chars().count(), INSIGHT_CHAR_BUDGET);
    }

    #[test]
    fn truncation_respects_multibyte_boundaries() {
        let long = "\u{20b9}".repeat(INSIGHT_CHAR_BUDGET + 10);
        assert_eq!(
            truncate_chars(&long, INSIGHT_CHAR_BUDGET).chars().count(),
            INSIGHT_CHAR_BUDGET
        );
    }

    #[test]
    fn invocation_failure_becomes_a_marker_string_not_an_error() {
        let failing = |_: Option<&str>, _: &str| -> AnyResult<LlmResponse> {
            Err(anyhow::anyhow!("connection refused"))
        };
        let summary = summarize("text", &failing);
        assert!(is_failure(&summary));
        assert!(summary.contains("connection refused"));

        let metrics = extract_metrics("text", &failing);
        assert!(is_failure(&metrics));
        assert!(metrics.contains("connection refused"));
    }
}
