//! Code execution through the kernel `execute` endpoint: request/result types and the polling manager.

use std::{collections::BTreeMap, fmt, time::Duration};

use serde::{Deserialize, Serialize};

use crate::error::Result;

mod manager;
mod outputs;

pub use manager::ExecsManager;
pub use outputs::{OutputRecord, Outputs};

/// Submission body for `POST /api/kernels/{kernel_id}/execute`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRequest {
    pub code: String,
    pub silent: bool,
    pub store_history: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_expressions: Option<BTreeMap<String, String>>,
    pub allow_stdin: bool,
    pub stop_on_error: bool,
}

impl ExecutionRequest {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            silent: false,
            store_history: true,
            user_expressions: None,
            allow_stdin: false,
            stop_on_error: true,
        }
    }

    pub fn with_silent(self, silent: bool) -> Self {
        Self { silent, ..self }
    }

    pub fn with_store_history(self, store_history: bool) -> Self {
        Self { store_history, ..self }
    }

    pub fn with_user_expressions(self, user_expressions: BTreeMap<String, String>) -> Self {
        Self { user_expressions: Some(user_expressions), ..self }
    }

    pub fn with_stop_on_error(self, stop_on_error: bool) -> Self {
        Self { stop_on_error, ..self }
    }
}

/// Outcome reported by the kernel. `Error` means the user code raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Ok,
    Error,
    Aborted,
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ok => "ok",
            Self::Error => "error",
            Self::Aborted => "aborted",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub status: ExecutionStatus,
    #[serde(default)]
    pub execution_count: Option<i64>,
    #[serde(default, deserialize_with = "outputs::deserialize_outputs")]
    pub outputs: Outputs,
}

impl ExecutionResult {
    pub fn is_ok(&self) -> bool {
        self.status == ExecutionStatus::Ok
    }

    /// Outputs as records, decoding them first when the server sent them as text.
    pub fn parsed_outputs(&self) -> Result<Vec<OutputRecord>> {
        self.outputs.parse()
    }
}

/// Shortest delay the poll loop waits between two result requests.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How long to wait for a submitted execution, and how often to ask.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExecuteOptions {
    /// `None` waits until the server reports a result.
    pub timeout: Option<Duration>,
    pub poll_interval: Duration,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            timeout: None,
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl ExecuteOptions {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Values below [`MIN_POLL_INTERVAL`] are raised to it.
    pub fn poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval.max(MIN_POLL_INTERVAL);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_defaults_serialize_verbatim() {
        let body = serde_json::to_value(ExecutionRequest::new("print(1)")).unwrap();
        assert_eq!(
            body,
            json!({
                "code": "print(1)",
                "silent": false,
                "store_history": true,
                "allow_stdin": false,
                "stop_on_error": true
            })
        );
    }

    #[test]
    fn request_with_user_expressions() {
        let mut exprs = BTreeMap::new();
        exprs.insert("x".to_string(), "1 + 1".to_string());
        let req = ExecutionRequest::new("x = 1")
            .with_silent(true)
            .with_store_history(false)
            .with_user_expressions(exprs);
        let body = serde_json::to_value(&req).unwrap();
        assert_eq!(body["silent"], true);
        assert_eq!(body["store_history"], false);
        assert_eq!(body["user_expressions"]["x"], "1 + 1");
    }

    #[test]
    fn result_from_server_body() {
        let result: ExecutionResult = serde_json::from_value(json!({
            "status": "ok",
            "execution_count": 1,
            "outputs": [{"output_type": "stream", "name": "stdout", "text": "2\n"}]
        }))
        .unwrap();
        assert!(result.is_ok());
        assert_eq!(result.execution_count, Some(1));
        assert_eq!(
            result.parsed_outputs().unwrap(),
            vec![OutputRecord::Stream { name: "stdout".into(), text: "2\n".into() }]
        );
    }

    #[test]
    fn result_with_text_outputs_and_missing_fields() {
        let result: ExecutionResult = serde_json::from_value(json!({
            "status": "error",
            "outputs": "[{\"output_type\": \"error\", \"ename\": \"NameError\", \"evalue\": \"x\", \"traceback\": []}]"
        }))
        .unwrap();
        assert_eq!(result.status, ExecutionStatus::Error);
        assert_eq!(result.execution_count, None);
        assert!(result.parsed_outputs().unwrap()[0].is_error());

        let aborted: ExecutionResult =
            serde_json::from_value(json!({ "status": "aborted", "outputs": null })).unwrap();
        assert_eq!(aborted.status.to_string(), "aborted");
        assert!(aborted.parsed_outputs().unwrap().is_empty());
    }

    #[test]
    fn odd_output_record_keeps_status_and_count() {
        let result: ExecutionResult = serde_json::from_value(json!({
            "status": "ok",
            "execution_count": 5,
            "outputs": [
                {"output_type": "stream", "name": "stdout", "text": "a\n"},
                {"output_type": "update_display_data", "data": {"text/plain": "b"}, "metadata": {}}
            ]
        }))
        .unwrap();
        assert_eq!(result.status, ExecutionStatus::Ok);
        assert_eq!(result.execution_count, Some(5));
        assert!(result.parsed_outputs().is_err());
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!(serde_json::from_value::<ExecutionResult>(json!({ "status": "running" })).is_err());
    }

    #[test]
    fn execute_options_defaults() {
        let opts = ExecuteOptions::default();
        assert_eq!(opts.timeout, None);
        assert_eq!(opts.poll_interval, Duration::from_millis(100));
        let opts = opts.timeout(Duration::from_secs(5)).poll_interval(Duration::from_millis(20));
        assert_eq!(opts.timeout, Some(Duration::from_secs(5)));
        assert_eq!(opts.poll_interval, Duration::from_millis(20));
    }

    #[test]
    fn zero_poll_interval_is_raised() {
        let opts = ExecuteOptions::default().poll_interval(Duration::ZERO);
        assert_eq!(opts.poll_interval, MIN_POLL_INTERVAL);
    }
}
