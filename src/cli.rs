use clap::{Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(name = "jsapi", about = "Jupyter Server REST API client", version)]
pub struct Cli {
    /// Jupyter Server base URL (overrides JUPYTER_SERVER_URL).
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// API token (overrides JUPYTER_TOKEN).
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Skip TLS certificate verification.
    #[arg(long = "insecure", global = true)]
    pub insecure: bool,

    /// Log level filter for env_logger (overrides LOG_LEVEL).
    #[arg(long = "log-level", global = true)]
    pub log_level: Option<String>,

    /// Disable colored output.
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Show the server version.
    Version,

    /// Show server status (activity, connections, kernel count).
    Status,

    /// List running kernels.
    #[command(visible_alias = "lk")]
    Kernels,

    /// Show one kernel.
    Kernel {
        #[arg(value_name = "KERNEL_ID")]
        id: String,
    },

    /// Execute code in a running kernel and wait for the result.
    ///
    /// Code is read from stdin when it is piped and no CODE argument is given.
    Exec {
        /// Kernel to run in. Defaults to the first running kernel.
        #[arg(short = 'k', long)]
        kernel: Option<String>,

        /// Give up waiting after this many seconds (overrides EXECUTION_TIMEOUT).
        #[arg(long, value_parser = clap::value_parser!(f64))]
        timeout: Option<f64>,

        /// Seconds between result polls (overrides POLL_INTERVAL).
        #[arg(long = "poll-interval", value_parser = clap::value_parser!(f64))]
        poll_interval: Option<f64>,

        /// Print the raw result as JSON.
        #[arg(long)]
        json: bool,

        #[arg(value_name = "CODE")]
        code: Option<String>,
    },

    /// Fetch the result of a previously submitted execution.
    Result {
        #[arg(value_name = "KERNEL_ID")]
        kernel: String,

        #[arg(value_name = "EXECUTION_ID")]
        execution: String,

        /// Print the raw result as JSON.
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}
