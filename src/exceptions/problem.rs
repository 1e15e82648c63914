//! Problem bodies for HTTP APIs (RFC 9457 shaped).

use http::StatusCode;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Keys every problem body carries; extension fields may not override them
pub const PROBLEM_FIELDS: [&str; 4] = ["status", "title", "detail", "type"];

#[allow(clippy::trivially_copy_pass_by_ref)] // serde requires &T signature
fn serialize_status_code<S>(status: &StatusCode, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u16(status.as_u16())
}

fn deserialize_status_code<'de, D>(deserializer: D) -> Result<StatusCode, D::Error>
where
    D: Deserializer<'de>,
{
    let code = u16::deserialize(deserializer)?;
    StatusCode::from_u16(code).map_err(serde::de::Error::custom)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[must_use]
pub struct Problem {
    #[serde(
        serialize_with = "serialize_status_code",
        deserialize_with = "deserialize_status_code"
    )]
    pub status: StatusCode,
    pub title: String,
    pub detail: String,
    /// A URI reference that identifies the problem type
    #[serde(rename = "type")]
    pub type_url: String,
    /// Exception-specific fields, flattened next to the fixed ones
    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

impl Problem {
    pub fn new(status: StatusCode, title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            status,
            title: title.into(),
            detail: detail.into(),
            type_url: "about:blank".to_owned(),
            extensions: Map::new(),
        }
    }

    pub fn with_type(mut self, type_url: impl Into<String>) -> Self {
        self.type_url = type_url.into();
        self
    }

    /// Add an extension field; the fixed problem fields are never replaced
    pub fn with_extension(mut self, name: impl Into<String>, value: Value) -> Self {
        let name = name.into();
        if !PROBLEM_FIELDS.contains(&name.as_str()) {
            self.extensions.insert(name, value);
        }
        self
    }
}

/// `ThrottleException` -> `Throttle Exception`
#[must_use]
pub fn default_title(class_name: &str) -> String {
    split_words(class_name).join(" ")
}

/// `ThrottleException` -> `<prefix>throttle-exception`
#[must_use]
pub fn default_type(prefix: &str, class_name: &str) -> String {
    let slug = split_words(class_name)
        .iter()
        .map(|word| word.to_lowercase())
        .collect::<Vec<_>>()
        .join("-");
    format!("{prefix}{slug}")
}

/// Split a camel-case identifier into words, keeping acronyms together
fn split_words(name: &str) -> Vec<String> {
    let chars: Vec<char> = name.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();
    for (i, &c) in chars.iter().enumerate() {
        if c == '_' || c == '-' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        let boundary = c.is_uppercase()
            && !current.is_empty()
            && (chars[i - 1].is_lowercase()
                || chars[i - 1].is_ascii_digit()
                || chars.get(i + 1).is_some_and(|next| next.is_lowercase()));
        if boundary {
            words.push(std::mem::take(&mut current));
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_problem_serializes_fixed_and_extra_fields() {
        let problem = Problem::new(StatusCode::FORBIDDEN, "Forbidden", "nope")
            .with_type("urn:problem-type:forbidden")
            .with_extension("custom_field", json!("value"))
            .with_extension("status", json!(999));
        let value = serde_json::to_value(&problem).unwrap();
        assert_eq!(
            value,
            json!({
                "status": 403,
                "title": "Forbidden",
                "detail": "nope",
                "type": "urn:problem-type:forbidden",
                "custom_field": "value",
            })
        );
    }

    #[test]
    fn test_problem_roundtrip_keeps_extensions() {
        let raw = json!({"status": 429, "title": "t", "detail": "d", "type": "x", "retry": 3});
        let problem: Problem = serde_json::from_value(raw).unwrap();
        assert_eq!(problem.status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(problem.extensions.get("retry"), Some(&json!(3)));
    }

    #[test]
    fn test_default_title_and_type() {
        assert_eq!(default_title("ThrottleException"), "Throttle Exception");
        assert_eq!(default_title("HTTPRedirectError"), "HTTP Redirect Error");
        assert_eq!(
            default_type("urn:problem-type:", "ProblemExistsDataclassException"),
            "urn:problem-type:problem-exists-dataclass-exception"
        );
    }
}
