//! Parsing of raw model answers.

use serde_json::Value;

use dqf_model::HeaderProposal;

use crate::error::OracleError;

/// Removes a surrounding Markdown code fence, if any.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().trim_end_matches("```").trim()
}

/// Extracts the chosen key from a resolution answer.
///
/// Accepts `{"canonical": "key"}`, a JSON string or bare text. Empty answers
/// mean the model declined.
pub fn parse_resolution(text: &str) -> Option<String> {
    let body = strip_code_fence(text);
    let answer = match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(object)) => object
            .get("canonical")
            .and_then(Value::as_str)
            .map(str::to_string)?,
        Ok(Value::String(key)) => key,
        Ok(Value::Null) => return None,
        _ => body.trim_matches(|c| c == '"' || c == '\'').to_string(),
    };
    let answer = answer.trim();
    (!answer.is_empty()).then(|| answer.to_string())
}

/// Parses a header proposal and normalizes its key to snake_case.
pub fn parse_proposal(text: &str) -> Result<HeaderProposal, OracleError> {
    let body = strip_code_fence(text);
    let mut proposal: HeaderProposal =
        serde_json::from_str(body).map_err(|err| OracleError::Parse(err.to_string()))?;
    proposal.key = snake_key(&proposal.key);
    if proposal.key.is_empty() {
        return Err(OracleError::Parse("proposal has an empty key".to_string()));
    }
    proposal.synonyms.retain(|synonym| !synonym.trim().is_empty());
    Ok(proposal)
}

/// Extracts a value suggestion; an empty answer means "unsure".
pub fn parse_suggestion(text: &str) -> Option<String> {
    let body = strip_code_fence(text).trim_matches('"').trim();
    (!body.is_empty()).then(|| body.to_string())
}

fn snake_key(raw: &str) -> String {
    let mut key = String::new();
    for c in raw.trim().chars() {
        if c.is_ascii_alphanumeric() {
            key.push(c.to_ascii_lowercase());
        } else if !key.is_empty() && !key.ends_with('_') {
            key.push('_');
        }
    }
    let key = key.trim_end_matches('_');
    key.trim_start_matches(|c: char| c.is_ascii_digit() || c == '_')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_fences() {
        assert_eq!(strip_code_fence("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fence("  plain "), "plain");
    }

    #[test]
    fn resolution_shapes() {
        assert_eq!(parse_resolution(r#"{"canonical": "quantity"}"#).as_deref(), Some("quantity"));
        assert_eq!(parse_resolution(r#""email""#).as_deref(), Some("email"));
        assert_eq!(parse_resolution("phone\n").as_deref(), Some("phone"));
        assert_eq!(parse_resolution(r#"{"canonical": ""}"#), None);
        assert_eq!(parse_resolution("null"), None);
        assert_eq!(parse_resolution(""), None);
    }

    #[test]
    fn proposal_key_is_snake_cased() {
        let proposal = parse_proposal(
            "```json\n{\"canonical\": \"Gift Note\", \"description\": \"Card message\", \"synonyms\": [\"gift msg\", \" \"]}\n```",
        )
        .expect("proposal");
        assert_eq!(proposal.key, "gift_note");
        assert_eq!(proposal.synonyms, vec!["gift msg".to_string()]);
        assert_eq!(proposal.description.as_deref(), Some("Card message"));
    }

    #[test]
    fn proposal_without_key_is_an_error() {
        assert!(parse_proposal(r#"{"canonical": "!!"}"#).is_err());
        assert!(parse_proposal("not json").is_err());
    }

    #[test]
    fn suggestion_trims_quotes() {
        assert_eq!(parse_suggestion("\"INR\"").as_deref(), Some("INR"));
        assert_eq!(parse_suggestion("   "), None);
    }
}
