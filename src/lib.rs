//! Typed client for the Jupyter Server REST API.
//!
//! Besides kernel listing, the crate drives code execution through the
//! server's undocumented `POST /api/kernels/{kernel_id}/execute` endpoint:
//! the code is submitted, and the result is polled from the location the
//! server hands back.

pub mod client;
pub mod config;
pub mod error;
pub mod execution;
pub mod http;
pub mod kernels;

pub use client::{JupyterServerClient, ServerStatus, ServerVersion};
pub use config::Config;
pub use error::{JupyterServerError, Result};
pub use execution::{
    ExecsManager, ExecuteOptions, ExecutionRequest, ExecutionResult, ExecutionStatus, OutputRecord,
    Outputs, MIN_POLL_INTERVAL,
};
pub use http::ClientOptions;
pub use kernels::{Kernel, KernelsManager};
