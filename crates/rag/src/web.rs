use reqwest::blocking::Client;
use serde_json::Value;
use std::env;
use thiserror::Error;

/// Static fallback for any search failure past the missing-key check.
pub const NO_RESULTS_FALLBACK: &str = "No relevant results found online.";

#[derive(Error, Debug)]
pub enum WebSearchError {
    #[error("SERPAPI_API_KEY is not set (web search requires a SerpAPI key)")]
    MissingApiKey,
}

/// One external search call returning the first organic-result snippet.
/// Auxiliary to the RAG path: a missing key is an actionable error, every
/// other failure degrades to the static fallback.
pub fn search_web(query: &str) -> Result<String, WebSearchError> {
    let api_key = env::var("SERPAPI_API_KEY").map_err(|_| WebSearchError::MissingApiKey)?;
    Ok(first_snippet(query, &api_key).unwrap_or_else(|| NO_RESULTS_FALLBACK.to_string()))
}

fn first_snippet(query: &str, api_key: &str) -> Option<String> {
    let response = Client::new()
        .get("https://serpapi.com/search")
        .query(&[("engine", "google"), ("q", query), ("api_key", api_key)])
        .send()
        .ok()?;
    if !response.status().is_success() {
        return None;
    }
    let body: Value = response.json().ok()?;
    body.get("organic_results")?
        .as_array()?
        .first()?
        .get("snippet")?
        .as_str()
        .map(|snippet| snippet.to_string())
}
