//! JSON handling for portal search responses.

use anyhow::Result;
use serde::Deserialize;

/// One row of the search result: twelve cells in portal column order.
/// Cells are usually strings but the portal occasionally emits bare numbers,
/// so they stay raw JSON values until normalization.
pub type RawRow = Vec<serde_json::Value>;

/// Body of a `courseSearch_do.php` response.
///
/// The portal returns `count` on the total-count probe and `courselist` on
/// paging requests; both are absent when the verification code is rejected,
/// which callers must treat as a verification failure rather than a parse
/// failure.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub count: Option<Count>,
    #[serde(default)]
    pub courselist: Option<Vec<RawRow>>,
}

/// The portal is inconsistent about whether `count` is a number or a string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Count {
    Number(u64),
    Text(String),
}

impl Count {
    pub fn value(&self) -> Result<u64> {
        match self {
            Count::Number(n) => Ok(*n),
            Count::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("non-numeric count: {s:?}")),
        }
    }
}

/// Deserialize a response body, reporting the serde path and the start of
/// the body on failure instead of a bare "expected value at line 1".
/// The portal answers HTML error pages with status 200, so this sees plenty
/// of non-JSON input.
pub fn parse_response(body: &str) -> Result<SearchResponse> {
    let de = &mut serde_json::Deserializer::from_str(body);
    serde_path_to_error::deserialize(de).map_err(|err| {
        let path = err.path().to_string();
        let inner = err.into_inner();
        let snippet: String = body.chars().take(120).collect();
        if path.is_empty() || path == "." {
            anyhow::anyhow!("{inner}; body starts {snippet:?}")
        } else {
            anyhow::anyhow!("at `{path}`: {inner}; body starts {snippet:?}")
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_accepts_number_and_string() {
        let r = parse_response(r#"{"count": 42}"#).unwrap();
        assert_eq!(r.count.unwrap().value().unwrap(), 42);

        let r = parse_response(r#"{"count": "42"}"#).unwrap();
        assert_eq!(r.count.unwrap().value().unwrap(), 42);
    }

    #[test]
    fn missing_fields_deserialize_to_none() {
        let r = parse_response(r#"{"error": "bad vercode"}"#).unwrap();
        assert!(r.count.is_none());
        assert!(r.courselist.is_none());
    }

    #[test]
    fn courselist_keeps_raw_values() {
        let r = parse_response(r#"{"courselist": [["1", 4, null]]}"#).unwrap();
        let rows = r.courselist.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].len(), 3);
        assert_eq!(rows[0][0], serde_json::json!("1"));
        assert_eq!(rows[0][1], serde_json::json!(4));
    }

    #[test]
    fn html_body_reports_a_snippet() {
        let err = parse_response("<html>Service Unavailable</html>").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("<html>"), "got: {msg}");
    }

    #[test]
    fn mistyped_field_reports_the_path() {
        let err = parse_response(r#"{"courselist": 5}"#).unwrap_err();
        assert!(err.to_string().contains("courselist"), "got: {err}");
    }
}
