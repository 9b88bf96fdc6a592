//! Langbase API client and wire types.
//!
//! Both external collaborators (contradiction detection and historical
//! precedent lookup) are Langbase pipes reached through [`LangbaseClient`].

mod client;
mod types;


pub use client::LangbaseClient;
pub use types::*;

/// Extract JSON from a completion string, handling markdown code blocks.
///
/// Attempts extraction in this order:
/// 1. Raw JSON (fast path)
/// 2. ```json ... ``` code blocks
/// 3. ``` ... ``` code blocks
pub(crate) fn extract_json_from_completion(completion: &str) -> Result<&str, String> {
    let trimmed = completion.trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return Ok(trimmed);
    }

    if completion.contains("```json") {
        return completion
            .split("```json")
            .nth(1)
            .and_then(|s| s.split("```").next())
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| "Found ```json block but content was empty or malformed".to_string());
    }

    if completion.contains("```") {
        return completion
            .split("```")
            .nth(1)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| "Found ``` block but content was empty or malformed".to_string());
    }

    Err(format!(
        "No JSON found in response. First 100 chars: '{}'",
        completion.chars().take(100).collect::<String>()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_raw_json() {
        let input = r#"  {"contradictions": []}  "#;
        assert_eq!(
            extract_json_from_completion(input).unwrap(),
            r#"{"contradictions": []}"#
        );
    }

    #[test]
    fn test_extract_fenced_json() {
        let input = "Here you go:\n```json\n{\"a\": 1}\n```\nDone.";
        assert_eq!(extract_json_from_completion(input).unwrap(), "{\"a\": 1}");
    }

    #[test]
    fn test_extract_plain_fence() {
        let input = "```\n[1, 2]\n```";
        assert_eq!(extract_json_from_completion(input).unwrap(), "[1, 2]");
    }

    #[test]
    fn test_extract_empty_fence_is_error() {
        assert!(extract_json_from_completion("```json\n```").is_err());
    }

    #[test]
    fn test_extract_plain_text_is_error() {
        let err = extract_json_from_completion("no structure here").unwrap_err();
        assert!(err.contains("No JSON found"));
    }
}
