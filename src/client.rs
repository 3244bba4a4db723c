use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::Result;
use crate::execution::ExecsManager;
use crate::http::{ClientOptions, HttpClient};
use crate::kernels::KernelsManager;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerVersion {
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerStatus {
    #[serde(default)]
    pub started: Option<String>,
    #[serde(default)]
    pub last_activity: Option<String>,
    #[serde(default)]
    pub connections: u64,
    #[serde(default)]
    pub kernels: u64,
}

/// Entry point for talking to a Jupyter Server.
///
/// Managers borrow the client's transport, so one client can serve any number
/// of them.
#[derive(Clone)]
pub struct JupyterServerClient {
    http: HttpClient,
}

impl JupyterServerClient {
    pub fn new(base_url: &str, token: Option<&str>) -> Result<Self> {
        let mut opts = ClientOptions::new(base_url);
        if let Some(token) = token {
            opts = opts.token(token);
        }
        Self::with_options(&opts)
    }

    pub fn with_options(opts: &ClientOptions) -> Result<Self> {
        Ok(Self { http: HttpClient::new(opts)? })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::with_options(&ClientOptions::from_config(cfg))
    }

    pub fn base_url(&self) -> &str {
        self.http.base_url()
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    pub fn kernels(&self) -> KernelsManager<'_> {
        KernelsManager::new(&self.http)
    }

    pub fn execs(&self) -> ExecsManager<'_> {
        ExecsManager::new(&self.http)
    }

    pub async fn get_version(&self) -> Result<ServerVersion> {
        self.http.get("/api/").await
    }

    pub async fn get_status(&self) -> Result<ServerStatus> {
        self.http.get("/api/status").await
    }
}

impl fmt::Debug for JupyterServerClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JupyterServerClient(base_url={:?})", self.base_url())
    }
}
