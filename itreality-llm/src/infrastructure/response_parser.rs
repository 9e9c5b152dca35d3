//! JSON extraction from model output
//!
//! Models wrap JSON in code fences or surround it with prose even when told
//! not to. Candidates are tried in order: the whole trimmed text, a ```json
//! fence, any fence, then the first complete JSON object in the text.

use serde::de::DeserializeOwned;

use crate::domain::LlmError;

pub struct ResponseParser;

impl ResponseParser {
    pub fn parse_json<T: DeserializeOwned>(content: &str) -> Result<T, LlmError> {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Err(LlmError::InvalidResponse("empty model response".to_string()));
        }

        let mut last_error = None;
        for candidate in Self::candidates(trimmed) {
            match serde_json::from_str::<T>(&candidate) {
                Ok(parsed) => return Ok(parsed),
                Err(e) => last_error = Some(e),
            }
        }

        Err(LlmError::InvalidResponse(match last_error {
            Some(e) => format!("no valid JSON in model response: {e}"),
            None => "no valid JSON in model response".to_string(),
        }))
    }

    fn candidates(content: &str) -> Vec<String> {
        let mut candidates = vec![content.to_string()];
        candidates.extend(Self::fenced_block(content, Some("json")));
        candidates.extend(Self::fenced_block(content, None));
        candidates.extend(Self::first_json_object(content));
        candidates.dedup();
        candidates
    }

    /// Body of the first fenced block, optionally restricted to a language tag
    pub fn fenced_block(content: &str, language: Option<&str>) -> Option<String> {
        const FENCE: &str = "```";
        let mut rest = content;

        while let Some(start) = rest.find(FENCE) {
            let after = &rest[start + FENCE.len()..];
            let line_end = after.find('\n')?;
            let tag = after[..line_end].trim();
            let body = &after[line_end + 1..];
            let end = body.find(FENCE)?;

            if language.is_none_or(|lang| tag.eq_ignore_ascii_case(lang)) {
                return Some(body[..end].trim().to_string());
            }
            rest = &body[end + FENCE.len()..];
        }
        None
    }

    /// First `{` that starts a syntactically complete JSON value
    pub fn first_json_object(content: &str) -> Option<String> {
        content
            .char_indices()
            .filter(|(_, ch)| *ch == '{')
            .find_map(|(idx, _)| {
                let candidate = &content[idx..];
                let mut values =
                    serde_json::Deserializer::from_str(candidate).into_iter::<serde_json::Value>();
                match values.next() {
                    Some(Ok(_)) => Some(candidate[..values.byte_offset()].to_string()),
                    _ => None,
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Summary {
        owner_summary: String,
    }

    fn summary(text: &str) -> Summary {
        Summary {
            owner_summary: text.to_string(),
        }
    }

    #[test]
    fn test_parse_raw() {
        let parsed: Summary = ResponseParser::parse_json(r#" {"owner_summary": "ok"} "#).unwrap();
        assert_eq!(parsed, summary("ok"));
    }

    #[test]
    fn test_parse_json_fence_after_prose() {
        let content = "Here is the report:\n```json\n{\"owner_summary\": \"fenced\"}\n```\nThanks";
        let parsed: Summary = ResponseParser::parse_json(content).unwrap();
        assert_eq!(parsed, summary("fenced"));
    }

    #[test]
    fn test_skips_non_json_fence() {
        let content = "```text\nnot it\n```\n```json\n{\"owner_summary\": \"second\"}\n```";
        assert_eq!(
            ResponseParser::fenced_block(content, Some("json")).as_deref(),
            Some("{\"owner_summary\": \"second\"}")
        );
    }

    #[test]
    fn test_first_object_in_prose() {
        let content = "Sure! {\"owner_summary\": \"inline\"} Let me know {if} you need more.";
        let parsed: Summary = ResponseParser::parse_json(content).unwrap();
        assert_eq!(parsed, summary("inline"));
    }

    #[test]
    fn test_rejects_garbage() {
        let err = ResponseParser::parse_json::<Summary>("I cannot help with that.").unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse(_)));

        let err = ResponseParser::parse_json::<Summary>("   ").unwrap_err();
        assert!(err.to_string().contains("empty"));
    }
}
