use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::MockHttpError;

/// A registered request-to-response mapping.
///
/// Serializes to the WireMock mapping layout so rules can be stored as
/// mapping files:
///
/// ```json
/// {
///   "request": { "method": "POST", "url": "/batches", "bodyPatterns": [{ "equalToJson": "{\"a\":1}" }] },
///   "response": { "status": 201, "headers": { "Location": "/batches/1" }, "body": "..." }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StubRule {
    pub request: RequestPattern,
    pub response: ResponseDefinition,
}

/// Which requests a rule matches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestPattern {
    /// Uppercase HTTP method token
    pub method: String,
    /// Exact path plus optional query string
    pub url: String,
    /// Every pattern must match the request body
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub body_patterns: Vec<BodyPattern>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BodyPattern {
    /// Structural JSON equality; key order and whitespace are irrelevant
    #[serde(
        rename = "equalToJson",
        serialize_with = "to_json_text",
        deserialize_with = "json_or_json_text"
    )]
    EqualToJson(Value),
}

/// What a matching request receives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseDefinition {
    pub status: u16,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// Body template, may contain `${port}`
    #[serde(default)]
    pub body: String,
}

/// Write `equalToJson` as JSON text so string-valued matchers reload unchanged
fn to_json_text<S>(value: &Value, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_string())
}

/// Accept `equalToJson` either as embedded JSON or as a string holding JSON text
fn json_or_json_text<'de, D>(deserializer: D) -> Result<Value, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(text) => serde_json::from_str(&text).map_err(serde::de::Error::custom),
        other => Ok(other),
    }
}

impl StubRule {
    /// Create a rule matching `method` + `url` exactly and answering with
    /// `status` and `body`
    pub fn new(method: &str, url: &str, status: u16, body: impl Into<String>) -> Self {
        Self {
            request: RequestPattern {
                method: method.to_uppercase(),
                url: url.to_string(),
                body_patterns: Vec::new(),
            },
            response: ResponseDefinition {
                status,
                headers: BTreeMap::new(),
                body: body.into(),
            },
        }
    }

    /// Add a response header; a repeated name keeps the last value
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.response
            .headers
            .insert(name.to_string(), value.to_string());
        self
    }

    /// Add every header of `headers` to the response
    pub fn with_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.response
            .headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Require the request body to be JSON-equal to `expected`
    pub fn with_json_body(mut self, expected: Value) -> Self {
        self.request
            .body_patterns
            .push(BodyPattern::EqualToJson(expected));
        self
    }

    /// Parse `expected_json` and require the request body to equal it
    pub fn with_json_body_text(self, expected_json: &str) -> Result<Self, MockHttpError> {
        let expected: Value = serde_json::from_str(expected_json)
            .map_err(|e| MockHttpError::malformed_matcher(expected_json, e))?;
        Ok(self.with_json_body(expected))
    }

    /// Check that the embedded server can accept this rule
    pub fn validate(&self) -> Result<(), MockHttpError> {
        let method = &self.request.method;
        if method.is_empty() || http::Method::from_bytes(method.as_bytes()).is_err() {
            return Err(MockHttpError::InvalidMethod(method.clone()));
        }

        if !self.request.url.starts_with('/') {
            return Err(MockHttpError::InvalidUrl(self.request.url.clone()));
        }

        if http::StatusCode::from_u16(self.response.status).is_err() {
            return Err(MockHttpError::InvalidStatus(self.response.status));
        }

        for (name, value) in &self.response.headers {
            http::header::HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| MockHttpError::invalid_header(name, e))?;
            http::header::HeaderValue::from_str(value)
                .map_err(|e| MockHttpError::invalid_header(name, e))?;
        }

        Ok(())
    }
}

impl RequestPattern {
    /// Path component of `url`
    pub fn path(&self) -> &str {
        self.url
            .split_once('?')
            .map_or(self.url.as_str(), |(path, _)| path)
    }

    /// Query component of `url`, empty when absent
    pub fn query(&self) -> &str {
        self.url.split_once('?').map_or("", |(_, query)| query)
    }
}

impl fmt::Display for RequestPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)?;
        if !self.body_patterns.is_empty() {
            write!(f, " (+{} body pattern(s))", self.body_patterns.len())?;
        }
        Ok(())
    }
}
