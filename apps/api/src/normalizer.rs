//! Response Normalizer: turns raw model text into a strict JSON object.
//!
//! Models are told to answer with JSON only, but in practice they wrap it in
//! markdown fences, add a sentence before or after it, or stop mid-object when
//! they hit the output token limit. `normalize_reply` recovers the object when
//! one is there and reports a typed error when it isn't.
//!
//! `conform` is the second, schema-aware step: it deserializes the object into
//! an endpoint's typed schema and runs that schema's own checks.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

const FENCE: &str = "```";

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("Model returned an empty response")]
    EmptyReply,

    #[error("Could not find a valid JSON object in the model response")]
    NoJsonFound { raw: String },

    #[error("Invalid or truncated JSON from model: {source}")]
    InvalidJson {
        text: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Model response does not match the {schema} schema: {reason}")]
    SchemaMismatch { schema: &'static str, reason: String },
}

impl NormalizeError {
    /// The model text that failed to parse, when there is one to show.
    pub fn offending_text(&self) -> Option<&str> {
        match self {
            NormalizeError::NoJsonFound { raw } => Some(raw),
            NormalizeError::InvalidJson { text, .. } => Some(text),
            _ => None,
        }
    }
}

/// A typed shape a normalized reply must fit.
pub trait ReplySchema: DeserializeOwned {
    /// Human-readable schema name used in error details.
    const NAME: &'static str;

    /// Checks that serde cannot express (non-empty lists, value ranges).
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Extracts the JSON object from a raw model reply.
pub fn normalize_reply(raw: &str) -> Result<Map<String, Value>, NormalizeError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(NormalizeError::EmptyReply);
    }

    let text = strip_code_fence(text);

    if let Ok(object) = serde_json::from_str::<Map<String, Value>>(text) {
        return Ok(object);
    }

    let candidate = braced_span(text).ok_or_else(|| NormalizeError::NoJsonFound {
        raw: text.to_string(),
    })?;

    serde_json::from_str::<Map<String, Value>>(candidate).map_err(|source| {
        NormalizeError::InvalidJson {
            text: candidate.to_string(),
            source,
        }
    })
}

/// Deserializes a normalized object into `T` and runs its validation.
pub fn conform<T: ReplySchema>(object: Map<String, Value>) -> Result<T, NormalizeError> {
    let value: T = serde_json::from_value(Value::Object(object)).map_err(|e| {
        NormalizeError::SchemaMismatch {
            schema: T::NAME,
            reason: e.to_string(),
        }
    })?;

    value
        .validate()
        .map_err(|reason| NormalizeError::SchemaMismatch {
            schema: T::NAME,
            reason,
        })?;

    Ok(value)
}

/// Removes a surrounding ``` fence. Multi-line fences lose their first and
/// last line (which also drops a language tag such as `json`); a fence on a
/// single line loses only its markers.
fn strip_code_fence(text: &str) -> &str {
    if text.len() < FENCE.len() * 2 || !text.starts_with(FENCE) || !text.ends_with(FENCE) {
        return text;
    }

    match (text.find('\n'), text.rfind('\n')) {
        (Some(first), Some(last)) if first < last => text[first + 1..last].trim(),
        _ => text[FENCE.len()..text.len() - FENCE.len()].trim(),
    }
}

/// The inclusive span from the first `{` to the last `}`.
fn braced_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
