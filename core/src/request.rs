//! Request descriptors: what one logical API call asks for.
//!
//! A descriptor names the endpoint path, the verb, an optional JSON body and
//! query parameters. Caller-supplied ids go in `segments`, which the engine
//! percent-encodes one segment each, never as raw path text. It is assembled with the `with_*` builders and is
//! read-only afterwards; the engine turns it into an `HttpRequest`.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::error::ClientError;
use crate::http::HttpMethod;

/// A query parameter value. Numbers and strings are both sent as text.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl fmt::Display for QueryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryValue::Text(s) => f.write_str(s),
            QueryValue::Integer(n) => write!(f, "{n}"),
            QueryValue::Float(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Text(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Text(value)
    }
}

impl From<i64> for QueryValue {
    fn from(value: i64) -> Self {
        QueryValue::Integer(value)
    }
}

impl From<u32> for QueryValue {
    fn from(value: u32) -> Self {
        QueryValue::Integer(i64::from(value))
    }
}

impl From<f64> for QueryValue {
    fn from(value: f64) -> Self {
        QueryValue::Float(value)
    }
}

/// Immutable description of one API call.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    method: HttpMethod,
    path: String,
    segments: Vec<String>,
    body: Option<Value>,
    params: Vec<(String, QueryValue)>,
}

impl RequestDescriptor {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            segments: Vec::new(),
            body: None,
            params: Vec::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// Append one path segment after `path`, e.g. a resource id.
    pub fn with_segment(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    /// Attach a JSON body. Serialization happens here so an unencodable
    /// payload fails before anything is sent.
    pub fn with_body<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ClientError> {
        let value = serde_json::to_value(body).map_err(|e| ClientError::InvalidRequest {
            message: format!("body serialization failed: {e}"),
        })?;
        self.body = Some(value);
        Ok(self)
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Add the parameter only when `value` is present.
    pub fn with_optional_param<V: Into<QueryValue>>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.with_param(key, value),
            None => self,
        }
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn params(&self) -> &[(String, QueryValue)] {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn query_values_render_as_text() {
        assert_eq!(QueryValue::from("asset").to_string(), "asset");
        assert_eq!(QueryValue::from(3u32).to_string(), "3");
        assert_eq!(QueryValue::from(-7i64).to_string(), "-7");
        assert_eq!(QueryValue::from(2.5).to_string(), "2.5");
    }

    #[test]
    fn builder_collects_params_and_body() {
        let desc = RequestDescriptor::post("/api/v1/categories")
            .with_body(&json!({"name": "Groceries"}))
            .unwrap()
            .with_param("page", 2u32)
            .with_optional_param("type", None::<&str>);

        assert_eq!(desc.method(), HttpMethod::Post);
        assert_eq!(desc.path(), "/api/v1/categories");
        assert_eq!(desc.body(), Some(&json!({"name": "Groceries"})));
        assert_eq!(desc.params(), &[("page".to_string(), QueryValue::Integer(2))]);
    }

    #[test]
    fn unserializable_body_is_rejected_up_front() {
        use std::collections::HashMap;
        // JSON object keys must be strings.
        let mut bad: HashMap<(u8, u8), u8> = HashMap::new();
        bad.insert((1, 2), 3);
        let err = RequestDescriptor::post("/x").with_body(&bad).unwrap_err();
        assert!(matches!(err, ClientError::InvalidRequest { .. }));
    }
}
