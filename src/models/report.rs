//! Execution report models
//!
//! Mirrors the JSON report written by the test-execution engine. Only the
//! fields the aggregator reads are modelled; everything else is ignored.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ScriptLocation;

/// Top-level engine report
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ExecutionReport {
    #[serde(default)]
    pub run: RunSection,
}

impl ExecutionReport {
    /// Aggregate assertion counts as reported by the engine
    pub fn assertions(&self) -> AssertionStats {
        self.run.stats.assertions
    }

    pub fn executions(&self) -> &[Execution] {
        &self.run.executions
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RunSection {
    #[serde(default)]
    pub stats: RunStats,
    #[serde(default)]
    pub executions: Vec<Execution>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RunStats {
    #[serde(default)]
    pub assertions: AssertionStats,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionStats {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub failed: u64,
}

/// One request execution inside a run
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Execution {
    #[serde(default)]
    pub item: ExecutionItem,
    #[serde(default)]
    pub request: ExecutedRequest,
    #[serde(default)]
    pub response: Option<ExecutedResponse>,
    #[serde(default)]
    pub assertions: Vec<AssertionRecord>,
    #[serde(default)]
    pub test_script: Vec<ScriptRecord>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ExecutionItem {
    #[serde(default)]
    pub name: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ExecutedRequest {
    #[serde(default)]
    pub url: RequestUrl,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub body: Option<Value>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RequestUrl {
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub host: Vec<String>,
    #[serde(default)]
    pub path: Vec<String>,
}

impl RequestUrl {
    /// Path segments joined by `/`
    pub fn resolved_path(&self) -> String {
        self.path.join("/")
    }

    /// Human-readable URI built from protocol, host and path segments
    pub fn display_uri(&self) -> String {
        let mut uri = String::new();
        if let Some(protocol) = &self.protocol {
            uri.push_str(protocol);
            uri.push_str("://");
        }
        uri.push_str(&self.host.join("."));
        uri.push('/');
        uri.push_str(&self.resolved_path());
        uri
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ExecutedResponse {
    #[serde(default)]
    pub stream: Option<ResponseStream>,
}

/// Response body as written by the engine.
///
/// The JSON reporter serializes Node buffers as `{"type": "Buffer", "data": [..]}`;
/// hand-written reports usually carry plain text.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseStream {
    Text(String),
    Buffer { data: Vec<u8> },
}

impl ResponseStream {
    pub fn text(&self) -> String {
        match self {
            ResponseStream::Text(s) => s.clone(),
            ResponseStream::Buffer { data } => String::from_utf8_lossy(data).into_owned(),
        }
    }

    /// Entries of the `Results` field when the stream is a JSON object carrying one.
    ///
    /// A non-array `Results` value is returned as a single entry.
    pub fn results(&self) -> Vec<Value> {
        let parsed: Value = match serde_json::from_str(&self.text()) {
            Ok(v) => v,
            Err(_) => return Vec::new(),
        };

        match parsed.get("Results") {
            Some(Value::Array(items)) => items.clone(),
            Some(Value::Null) | None => Vec::new(),
            Some(other) => vec![other.clone()],
        }
    }
}

/// Outcome of a single assertion
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AssertionRecord {
    #[serde(default)]
    pub assertion: String,
    #[serde(default)]
    pub skipped: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

/// A test-script entry, carrying an error when the script itself blew up
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ScriptRecord {
    #[serde(default)]
    pub error: Option<ScriptError>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptError {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default, alias = "source")]
    pub file_name: Option<String>,
    #[serde(default, alias = "line")]
    pub line_number: Option<u64>,
    #[serde(default)]
    pub stack: Option<String>,
}

impl ScriptError {
    pub fn location(&self) -> ScriptLocation {
        ScriptLocation {
            name: self.name.clone(),
            message: self.message.clone(),
            file: self.file_name.clone(),
            line: self.line_number,
            stack: self.stack.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display_uri() {
        let url = RequestUrl {
            protocol: Some("https".to_string()),
            host: vec!["api".into(), "example".into(), "com".into()],
            path: vec!["v1".into(), "widgets".into()],
        };
        assert_eq!(url.display_uri(), "https://api.example.com/v1/widgets");
        assert_eq!(url.resolved_path(), "v1/widgets");
    }

    #[test]
    fn test_parse_engine_report() {
        let raw = json!({
            "collection": { "info": { "name": "Tenacious" } },
            "run": {
                "stats": {
                    "iterations": { "total": 1, "pending": 0, "failed": 0 },
                    "assertions": { "total": 3, "pending": 0, "failed": 1 }
                },
                "executions": [{
                    "item": { "name": "List widgets" },
                    "request": {
                        "url": { "protocol": "https", "host": ["api", "example", "com"], "path": ["widgets"] },
                        "method": "GET"
                    },
                    "response": { "stream": { "type": "Buffer", "data": [123, 125] } },
                    "assertions": [
                        { "assertion": "status is 200", "skipped": false },
                        { "assertion": "has body", "skipped": false, "error": { "message": "expected body" } }
                    ],
                    "testScript": [{}]
                }]
            }
        });

        let report: ExecutionReport = serde_json::from_value(raw).unwrap();
        assert_eq!(report.assertions(), AssertionStats { total: 3, failed: 1 });
        assert_eq!(report.executions().len(), 1);

        let execution = &report.executions()[0];
        assert_eq!(execution.item.name, "List widgets");
        assert!(execution.assertions[1].error.is_some());
        assert!(execution.test_script[0].error.is_none());

        let stream = execution.response.as_ref().unwrap().stream.as_ref().unwrap();
        assert_eq!(stream.text(), "{}");
        assert!(stream.results().is_empty());
    }

    #[test]
    fn test_stream_results_field() {
        let stream = ResponseStream::Text(r#"{"Results": [{"id": 1}, {"id": 2}]}"#.to_string());
        assert_eq!(stream.results(), vec![json!({"id": 1}), json!({"id": 2})]);

        let not_json = ResponseStream::Text("<html>".to_string());
        assert!(not_json.results().is_empty());
    }

    #[test]
    fn test_script_error_location() {
        let err: ScriptError = serde_json::from_value(json!({
            "name": "TypeError",
            "message": "undefined is not a function",
            "fileName": "collection.js",
            "lineNumber": 7,
            "stack": "TypeError: undefined is not a function\n    at collection.js:7:3"
        }))
        .unwrap();

        let location = err.location();
        assert_eq!(location.name.as_deref(), Some("TypeError"));
        assert_eq!(location.message, "undefined is not a function");
        assert_eq!(location.file.as_deref(), Some("collection.js"));
        assert_eq!(location.line, Some(7));
        assert_eq!(
            location.stack.as_deref(),
            Some("TypeError: undefined is not a function\n    at collection.js:7:3")
        );
    }
}
