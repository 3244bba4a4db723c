//! Reqwest-based transport: authenticated GET/POST against a Jupyter Server base URL.

use std::{fmt, time::Duration};

use log::trace;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, LOCATION};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::config::Config;
use crate::error::{JupyterServerError, Result};

const USER_AGENT: &str = concat!("jupyter-server-api/", env!("CARGO_PKG_VERSION"));

/// Connection settings for a [`HttpClient`].
#[derive(Clone)]
pub struct ClientOptions {
    pub base_url: String,
    pub token: Option<String>,
    pub request_timeout: Duration,
    pub verify_ssl: bool,
}

impl ClientOptions {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            request_timeout: Duration::from_secs(30),
            verify_ssl: true,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self {
            base_url: cfg.server_url(),
            token: cfg.token(),
            request_timeout: cfg.request_timeout(),
            verify_ssl: cfg.verify_ssl(),
        }
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.token = if token.is_empty() { None } else { Some(token) };
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn verify_ssl(mut self, verify: bool) -> Self {
        self.verify_ssl = verify;
        self
    }
}

impl fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOptions")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("request_timeout", &self.request_timeout)
            .field("verify_ssl", &self.verify_ssl)
            .finish()
    }
}

/// What the submission endpoint answered: status, `Location` header and decoded body.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub location: Option<String>,
    pub body: Value,
}

#[derive(Debug, Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpClient {
    pub fn new(opts: &ClientOptions) -> Result<Self> {
        let base_url = normalize_base_url(&opts.base_url);
        reqwest::Url::parse(&base_url)
            .map_err(|e| JupyterServerError::Config(format!("invalid base URL '{}': {}", opts.base_url, e)))?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = &opts.token {
            let mut hv = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| JupyterServerError::Config(format!("invalid token: {}", e)))?;
            hv.set_sensitive(true);
            headers.insert(AUTHORIZATION, hv);
        }

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(opts.request_timeout)
            .danger_accept_invalid_certs(!opts.verify_ssl)
            .build()
            .map_err(|e| JupyterServerError::Config(e.to_string()))?;

        Ok(Self { http, base_url })
    }

    /// Base URL, always ending in exactly one `/`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Appends `path` to the base URL without dropping any base path prefix.
    /// Absolute `http(s)://` URLs are returned unchanged.
    pub fn build_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Turns a `Location` header value into a URL to poll.
    ///
    /// Absolute URLs are used as-is. A location that already starts with the
    /// base URL's path prefix is taken relative to the server origin; any other
    /// location is appended to the base URL like an API path.
    pub fn resolve_location(&self, location: &str) -> Result<String> {
        if location.starts_with("http://") || location.starts_with("https://") {
            return Ok(location.to_string());
        }
        let base = reqwest::Url::parse(&self.base_url)
            .map_err(|e| JupyterServerError::InvalidResponse(format!("bad location '{}': {}", location, e)))?;
        let prefix = base.path();
        if prefix != "/" && location.starts_with(prefix) {
            return base
                .join(location)
                .map(String::from)
                .map_err(|e| JupyterServerError::InvalidResponse(format!("bad location '{}': {}", location, e)));
        }
        Ok(self.build_url(location))
    }

    /// GET `path` and decode the body as JSON. An empty body decodes to `Value::Null`.
    pub async fn get_json(&self, path: &str) -> Result<Value> {
        let url = self.build_url(path);
        trace!("GET {}", url);
        let resp = self.http.get(&url).send().await?;
        let resp = check_status(resp, &url).await?;
        decode_body(resp).await
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let value = self.get_json(path).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// POST a JSON body and hand back the raw acknowledgment, headers included.
    pub async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<RawResponse> {
        let url = self.build_url(path);
        trace!("POST {}", url);
        let resp = self.http.post(&url).json(body).send().await?;
        let resp = check_status(resp, &url).await?;

        let status = resp.status().as_u16();
        let location = resp
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let body = decode_body(resp).await?;

        Ok(RawResponse { status, location, body })
    }
}

fn normalize_base_url(base_url: &str) -> String {
    format!("{}/", base_url.trim().trim_end_matches('/'))
}

async fn check_status(resp: reqwest::Response, url: &str) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let text = resp.text().await.unwrap_or_default();
    Err(JupyterServerError::from_status(status.as_u16(), url, text))
}

async fn decode_body(resp: reqwest::Response) -> Result<Value> {
    let text = resp.text().await?;
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn client(base_url: &str) -> HttpClient {
        HttpClient::new(&ClientOptions::new(base_url)).unwrap()
    }

    #[test]
    fn base_url_is_normalized() {
        assert_eq!(client("http://localhost:8888").base_url(), "http://localhost:8888/");
        assert_eq!(client("http://localhost:8888/").base_url(), "http://localhost:8888/");
        assert_eq!(client("http://localhost:8888///").base_url(), "http://localhost:8888/");
    }

    #[test]
    fn build_url_keeps_path_prefix() {
        let expected = "http://dsw-xxx:8890/dsw-xxx/api/contents/nb.ipynb";
        assert_eq!(client("http://dsw-xxx:8890/dsw-xxx/").build_url("/api/contents/nb.ipynb"), expected);
        assert_eq!(client("http://dsw-xxx:8890/dsw-xxx").build_url("/api/contents/nb.ipynb"), expected);

        let c = client("http://host:8888/jupyter/");
        for (path, expected) in [
            ("/api/kernels", "http://host:8888/jupyter/api/kernels"),
            ("/api/contents/", "http://host:8888/jupyter/api/contents/"),
            ("api/status", "http://host:8888/jupyter/api/status"),
        ] {
            assert_eq!(c.build_url(path), expected);
        }
    }

    #[test]
    fn absolute_urls_pass_through() {
        let c = client("http://host:8888/");
        assert_eq!(
            c.build_url("https://other:9999/api/kernels/k/executions/e"),
            "https://other:9999/api/kernels/k/executions/e"
        );
    }

    #[test]
    fn locations_keep_the_base_prefix() {
        let c = client("http://dsw-xxx:8890/dsw-xxx/");
        assert_eq!(
            c.resolve_location("/api/kernels/k1/executions/e1").unwrap(),
            "http://dsw-xxx:8890/dsw-xxx/api/kernels/k1/executions/e1"
        );

        let c = client("http://host:8888/user/alice");
        assert_eq!(
            c.resolve_location("/user/alice/api/kernels/k/executions/e").unwrap(),
            "http://host:8888/user/alice/api/kernels/k/executions/e"
        );
        assert_eq!(
            c.resolve_location("api/kernels/k/executions/e").unwrap(),
            "http://host:8888/user/alice/api/kernels/k/executions/e"
        );
        assert_eq!(
            c.resolve_location("https://other/api/x").unwrap(),
            "https://other/api/x"
        );
    }

    #[test]
    fn invalid_base_url_is_a_config_error() {
        let err = HttpClient::new(&ClientOptions::new("not a url")).unwrap_err();
        assert!(matches!(err, JupyterServerError::Config(_)));
    }

    #[test]
    fn options_debug_hides_token() {
        let opts = ClientOptions::new("http://h").token("secret-token");
        let dbg = format!("{:?}", opts);
        assert!(!dbg.contains("secret-token"));
        assert!(ClientOptions::new("http://h").token("").token.is_none());
    }

    #[tokio::test]
    async fn get_sends_bearer_token() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/kernels")
            .match_header("authorization", "Bearer test-token-123")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await;

        let c = HttpClient::new(&ClientOptions::new(server.url()).token("test-token-123")).unwrap();
        let value = c.get_json("/api/kernels").await.unwrap();
        assert_eq!(value, serde_json::json!([]));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn no_auth_header_without_token() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/status")
            .match_header("authorization", Matcher::Missing)
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        client(&server.url()).get_json("/api/status").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn empty_body_decodes_to_null() {
        let mut server = Server::new_async().await;
        let _m = server.mock("GET", "/pending").with_status(202).create_async().await;

        let value = client(&server.url()).get_json("/pending").await.unwrap();
        assert!(value.is_null());
    }

    #[tokio::test]
    async fn error_statuses_are_mapped() {
        let mut server = Server::new_async().await;
        let _a = server.mock("GET", "/missing").with_status(404).create_async().await;
        let _b = server
            .mock("GET", "/broken")
            .with_status(500)
            .with_body("internal")
            .create_async()
            .await;
        let _c = server.mock("GET", "/denied").with_status(403).create_async().await;

        let c = client(&server.url());
        assert!(c.get_json("/missing").await.unwrap_err().is_not_found());
        match c.get_json("/broken").await.unwrap_err() {
            JupyterServerError::Server { status, message } => {
                assert_eq!(status, 500);
                assert!(message.contains("internal"));
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(matches!(
            c.get_json("/denied").await.unwrap_err(),
            JupyterServerError::Authentication { status: 403, .. }
        ));
    }

    #[tokio::test]
    async fn malformed_json_is_invalid_response() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/garbage")
            .with_status(200)
            .with_body("{not json")
            .create_async()
            .await;

        let err = client(&server.url()).get_json("/garbage").await.unwrap_err();
        assert!(matches!(err, JupyterServerError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn post_returns_location_and_body() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/kernels/k1/execute")
            .match_body(Matcher::PartialJson(serde_json::json!({ "code": "1+1" })))
            .with_status(201)
            .with_header("location", "/api/kernels/k1/executions/e1")
            .create_async()
            .await;

        let resp = client(&server.url())
            .post_json("/api/kernels/k1/execute", &serde_json::json!({ "code": "1+1" }))
            .await
            .unwrap();
        assert_eq!(resp.status, 201);
        assert_eq!(resp.location.as_deref(), Some("/api/kernels/k1/executions/e1"));
        assert!(resp.body.is_null());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn connection_refused_is_a_connection_error() {
        // Nothing listens on port 9 on a test host.
        let err = client("http://127.0.0.1:9").get_json("/api/").await.unwrap_err();
        assert!(matches!(err, JupyterServerError::Connection(_)));
    }
}
