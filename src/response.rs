//! Response parser: extracts the result code from a CLI command response.
//!
//! The control-plane CLI answers every request with a JSON envelope:
//!
//! ```json
//! {"Response": {"command": "CREATEVOLUME",
//!               "result": {"status": {"code": 2010, "description": "..."}}}}
//! ```
//!
//! Some CLI builds print banner text around the JSON body, so a regex
//! fallback scans for the first `"code": <int>` field when the payload is
//! not clean JSON. A payload with no extractable code is a harness fault
//! (`MalformedResponse`), never a verdict.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::core::errors::{Result, SahError};

/// Raw payload of one CLI invocation, tagged with the command that produced it.
#[derive(Debug, Clone)]
pub struct CommandResponse {
    /// Command label for diagnostics (e.g. `CREATEVOLUME`).
    pub command: String,
    /// Raw stdout of the CLI invocation, verbatim.
    pub raw: String,
}

impl CommandResponse {
    /// Tag a raw payload with its originating command.
    #[must_use]
    pub fn new(command: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            raw: raw.into(),
        }
    }

    /// Extract the result code from this response.
    pub fn code(&self) -> Result<i64> {
        extract_code(&self.raw).ok_or_else(|| SahError::MalformedResponse {
            command: self.command.clone(),
            details: summarize(&self.raw),
        })
    }
}

static CODE_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""code"\s*:\s*(-?\d+)"#).expect("code-field regex is valid")
});

/// Pull a result code out of a raw payload, or `None` if absent.
///
/// JSON envelope lookup first (with and without the `Response` wrapper),
/// then the textual fallback.
#[must_use]
pub fn extract_code(raw: &str) -> Option<i64> {
    if let Ok(value) = serde_json::from_str::<Value>(raw.trim()) {
        if let Some(code) = code_from_envelope(&value) {
            return Some(code);
        }
        // Parsed as JSON but no status code anywhere: the textual fallback
        // cannot do better, the field genuinely is not there.
        return None;
    }

    CODE_FIELD
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn code_from_envelope(value: &Value) -> Option<i64> {
    let result = value
        .get("Response")
        .and_then(|r| r.get("result"))
        .or_else(|| value.get("result"))?;
    result.get("status")?.get("code")?.as_i64()
}

/// Truncate a payload for inclusion in error messages.
fn summarize(raw: &str) -> String {
    const MAX: usize = 120;
    let flat = raw.trim().replace('\n', " ");
    if flat.len() <= MAX {
        flat
    } else {
        let cut = flat
            .char_indices()
            .take_while(|(i, _)| *i < MAX)
            .last()
            .map_or(0, |(i, c)| i + c.len_utf8());
        format!("{}…", &flat[..cut])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENVELOPE: &str = r#"{"Response": {"command": "CREATEVOLUME", "rid": "7",
        "result": {"status": {"code": 2010, "description": "volume size not aligned"}}}}"#;

    #[test]
    fn extracts_code_from_envelope() {
        assert_eq!(extract_code(ENVELOPE), Some(2010));
    }

    #[test]
    fn extracts_code_without_response_wrapper() {
        let raw = r#"{"result": {"status": {"code": 0}}}"#;
        assert_eq!(extract_code(raw), Some(0));
    }

    #[test]
    fn extracts_code_from_noisy_payload() {
        let raw = format!("poseidonos-cli v1.2\nconnecting...\n{ENVELOPE}\nbye");
        assert_eq!(extract_code(&raw), Some(2010));
    }

    #[test]
    fn negative_codes_are_preserved() {
        let raw = r#"{"result": {"status": {"code": -19}}}"#;
        assert_eq!(extract_code(raw), Some(-19));
    }

    #[test]
    fn json_without_code_yields_none() {
        // Valid JSON but the status code field is absent.
        let raw = r#"{"Response": {"command": "CREATEVOLUME", "result": {"data": {}}}}"#;
        assert_eq!(extract_code(raw), None);
    }

    #[test]
    fn garbage_yields_none() {
        assert_eq!(extract_code("segmentation fault"), None);
        assert_eq!(extract_code(""), None);
    }

    #[test]
    fn response_code_maps_missing_code_to_malformed() {
        let resp = CommandResponse::new("CREATEVOLUME", "not a response");
        let err = resp.code().unwrap_err();
        assert_eq!(err.code(), "SAH-2001");
        assert!(err.to_string().contains("CREATEVOLUME"));
    }

    #[test]
    fn response_code_happy_path() {
        let resp = CommandResponse::new("CREATEVOLUME", ENVELOPE);
        assert_eq!(resp.code().unwrap(), 2010);
    }

    #[test]
    fn summary_truncates_long_payloads() {
        let long = "x".repeat(500);
        let resp = CommandResponse::new("MOUNTARRAY", long);
        let msg = resp.code().unwrap_err().to_string();
        assert!(msg.len() < 300, "error message should be bounded: {msg}");
    }
}
