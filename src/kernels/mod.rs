//! Read-only kernel listing. Starting, stopping and restarting kernels is not offered here.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::http::HttpClient;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kernel {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub last_activity: Option<String>,
    #[serde(default)]
    pub execution_state: Option<String>,
    #[serde(default)]
    pub connections: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct KernelsManager<'a> {
    http: &'a HttpClient,
}

impl<'a> KernelsManager<'a> {
    pub fn new(http: &'a HttpClient) -> Self {
        Self { http }
    }

    pub async fn list_kernels(&self) -> Result<Vec<Kernel>> {
        self.http.get("/api/kernels").await
    }

    pub async fn get_kernel(&self, kernel_id: &str) -> Result<Kernel> {
        self.http.get(&format!("/api/kernels/{}", kernel_id)).await
    }
}
