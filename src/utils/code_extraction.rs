//! Source extraction from generation service responses.
//!
//! The generation service answers with a JSON object whose payload lives in
//! one of several fields. The payload is usually markdown with the candidate
//! program inside a fenced code block:
//!
//! ````text
//! here:
//! ```python
//! def f(): pass
//! ```
//! done
//! ````
//!
//! Extraction never fails. If no fenced block is present the whole text is
//! returned and the sandbox decides whether it runs.
//!
//! # Example
//!
//! ```
//! use passk_eval::utils::code_extraction::extract_code;
//!
//! let text = "here:\n```python\ndef f(): pass\n```\ndone";
//! assert_eq!(extract_code(text), "def f(): pass");
//! assert_eq!(extract_code("def g(): pass"), "def g(): pass");
//! ```

use regex::Regex;
use serde_json::Value;

/// Response fields that may carry the generated source, in priority order.
///
/// `code_or_questions` is what the code-generation endpoint returns; `code`
/// is accepted at the same priority for services that use the short name.
pub const CODE_FIELDS: &[&str] = &["code_or_questions", "code"];

/// Field carrying a free-form answer (RAG query responses).
pub const ANSWER_FIELD: &str = "answer";

/// Field carrying raw completion text.
pub const TEXT_FIELD: &str = "text";

/// Picks the text payload out of a response object.
///
/// Code fields win over `answer`, which wins over `text`. Missing fields,
/// non-string values and empty strings are skipped. Returns an empty string
/// when nothing usable is present.
pub fn response_text(response: &Value) -> &str {
    CODE_FIELDS
        .iter()
        .copied()
        .chain([ANSWER_FIELD, TEXT_FIELD])
        .filter_map(|field| response.get(field).and_then(Value::as_str))
        .find(|text| !text.is_empty())
        .unwrap_or("")
}

/// Extracts the interior of the first fenced code block in `text`.
///
/// The opening fence may carry a language tag (`` ```python ``). Returns
/// `None` when no complete block is found.
pub fn extract_fenced_block(text: &str) -> Option<String> {
    let re = Regex::new(r"(?s)```(?:\w+)?\n(.*?)\n```").ok()?;
    let caps = re.captures(text)?;
    Some(caps.get(1)?.as_str().to_string())
}

/// Extracts candidate source code from free text.
///
/// Returns the fenced block interior when present, otherwise `text`
/// unchanged.
pub fn extract_code(text: &str) -> String {
    extract_fenced_block(text).unwrap_or_else(|| text.to_string())
}

/// Extracts candidate source code from a full response object.
pub fn extract_code_from_response(response: &Value) -> String {
    extract_code(response_text(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_fenced_python_block() {
        let text = "here:\n```python\ndef f(): pass\n```\ndone";
        assert_eq!(extract_code(text), "def f(): pass");
    }

    #[test]
    fn test_no_fence_returns_original() {
        let text = "def f():\n    return 1\n";
        assert_eq!(extract_code(text), text);
    }

    #[test]
    fn test_fence_without_language_tag() {
        let text = "```\nprint('hi')\n```";
        assert_eq!(extract_code(text), "print('hi')");
    }

    #[test]
    fn test_first_block_wins() {
        let text = "```python\na = 1\n```\nand\n```python\nb = 2\n```";
        assert_eq!(extract_code(text), "a = 1");
    }

    #[test]
    fn test_multiline_block_interior_preserved() {
        let text = "```python\ndef add(a, b):\n    \"\"\"Sum.\"\"\"\n    return a + b\n```";
        assert_eq!(
            extract_code(text),
            "def add(a, b):\n    \"\"\"Sum.\"\"\"\n    return a + b"
        );
    }

    #[test]
    fn test_unterminated_fence_returns_original() {
        let text = "```python\ndef f(): pass";
        assert_eq!(extract_code(text), text);
    }

    #[test]
    fn test_response_field_priority() {
        let resp = json!({
            "text": "from text",
            "answer": "from answer",
            "code_or_questions": "from code",
        });
        assert_eq!(response_text(&resp), "from code");

        let resp = json!({ "text": "from text", "answer": "from answer" });
        assert_eq!(response_text(&resp), "from answer");

        let resp = json!({ "text": "from text" });
        assert_eq!(response_text(&resp), "from text");
    }

    #[test]
    fn test_empty_fields_are_skipped() {
        let resp = json!({ "code_or_questions": "", "answer": null, "text": "fallback" });
        assert_eq!(response_text(&resp), "fallback");
    }

    #[test]
    fn test_missing_fields_yield_empty_string() {
        let resp = json!({ "notes": "nothing here" });
        assert_eq!(extract_code_from_response(&resp), "");
        assert_eq!(extract_code_from_response(&json!([1, 2, 3])), "");
    }

    #[test]
    fn test_extract_code_from_service_response() {
        let resp = json!({
            "code_or_questions": "```python\ndef add(a, b):\n    return a + b\n```",
            "notes": "Generated rule-based function add(a,b).",
        });
        assert_eq!(
            extract_code_from_response(&resp),
            "def add(a, b):\n    return a + b"
        );
    }
}
