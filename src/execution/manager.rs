use log::debug;
use serde_json::Value;
use tokio::time::{sleep, Instant};

use super::{ExecuteOptions, ExecutionRequest, ExecutionResult, MIN_POLL_INTERVAL};
use crate::error::{JupyterServerError, Result};
use crate::http::HttpClient;

/// Runs code through the (undocumented) kernel `execute` endpoint.
///
/// The server acknowledges a submission with `201 Created` and a `Location`
/// header; the result appears at that location once the kernel is done. The
/// manager keeps no state between calls, so concurrent executions on the same
/// kernel race at the server.
#[derive(Debug, Clone, Copy)]
pub struct ExecsManager<'a> {
    http: &'a HttpClient,
}

impl<'a> ExecsManager<'a> {
    pub fn new(http: &'a HttpClient) -> Self {
        Self { http }
    }

    /// Execute `code` with default request flags and wait for the result.
    ///
    /// ```no_run
    /// use jupyter_server_api::{ExecuteOptions, JupyterServerClient};
    ///
    /// # async fn run() -> jupyter_server_api::Result<()> {
    /// let client = JupyterServerClient::new("http://localhost:8888", Some("my-token"))?;
    /// let result = client
    ///     .execs()
    ///     .execute("kernel-id", "print('Hello, World!')", &ExecuteOptions::default())
    ///     .await?;
    /// println!("{} {:?}", result.status, result.parsed_outputs()?);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn execute(
        &self,
        kernel_id: &str,
        code: &str,
        options: &ExecuteOptions,
    ) -> Result<ExecutionResult> {
        self.execute_request(kernel_id, &ExecutionRequest::new(code), options)
            .await
    }

    /// Submit a fully specified request and wait for its result.
    ///
    /// Fails with [`JupyterServerError::InvalidResponse`] when the acknowledgment
    /// carries neither a result nor a `Location`, and with
    /// [`JupyterServerError::Timeout`] when `options.timeout` elapses first. A
    /// timeout does not stop the execution on the server.
    pub async fn execute_request(
        &self,
        kernel_id: &str,
        request: &ExecutionRequest,
        options: &ExecuteOptions,
    ) -> Result<ExecutionResult> {
        debug!("submitting execution to kernel {}", kernel_id);
        let ack = self.http.post_json(&execute_path(kernel_id), request).await?;

        // Some servers answer with the finished result directly.
        if let Some(result) = terminal_result(&ack.body)? {
            debug!("kernel {} completed synchronously ({})", kernel_id, result.status);
            return Ok(result);
        }

        let location = ack.location.ok_or_else(|| {
            JupyterServerError::InvalidResponse(format!(
                "Location header not found in response ({})",
                ack.status
            ))
        })?;
        let location = self.http.resolve_location(&location)?;

        self.poll_for_result(&location, options).await
    }

    /// Fetch a previously submitted execution's result. Does not poll.
    pub async fn get_execution_result(
        &self,
        kernel_id: &str,
        execution_id: &str,
    ) -> Result<ExecutionResult> {
        let body = self
            .http
            .get_json(&execution_path(kernel_id, execution_id))
            .await?;
        terminal_result(&body)?.ok_or_else(|| {
            JupyterServerError::InvalidResponse(format!(
                "execution {} on kernel {} has no status yet",
                execution_id, kernel_id
            ))
        })
    }

    async fn poll_for_result(
        &self,
        location: &str,
        options: &ExecuteOptions,
    ) -> Result<ExecutionResult> {
        let start = Instant::now();
        let mut attempt = 0u32;

        loop {
            if let Some(timeout) = options.timeout {
                if start.elapsed() >= timeout {
                    return Err(JupyterServerError::Timeout(timeout));
                }
            }

            attempt += 1;
            let body = self.http.get_json(location).await?;
            if let Some(result) = terminal_result(&body)? {
                debug!("{} finished after {} poll(s): {}", location, attempt, result.status);
                return Ok(result);
            }

            debug!("{} pending (poll {})", location, attempt);
            sleep(options.poll_interval.max(MIN_POLL_INTERVAL)).await;
        }
    }
}

fn execute_path(kernel_id: &str) -> String {
    format!("/api/kernels/{}/execute", kernel_id)
}

fn execution_path(kernel_id: &str, execution_id: &str) -> String {
    format!("/api/kernels/{}/executions/{}", kernel_id, execution_id)
}

/// A body carrying a `status` field is a finished execution; anything else is still pending.
fn terminal_result(body: &Value) -> Result<Option<ExecutionResult>> {
    match body.as_object() {
        Some(obj) if obj.contains_key("status") => {
            Ok(Some(serde_json::from_value(body.clone())?))
        }
        _ => Ok(None),
    }
}
