mod cli;
mod printer;

use std::io::{self, Read};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use is_terminal::IsTerminal;
use log::debug;

use cli::Command;
use jupyter_server_api::{ClientOptions, Config, ExecuteOptions, ExecutionResult, JupyterServerClient};
use printer::TextPrinter;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = cli::Cli::parse();
    let cfg = Config::load();

    let level = args.log_level.clone().unwrap_or_else(|| cfg.log_level());
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&level)).init();
    debug!("config file: {}", cfg.config_path.display());

    // CLI flags override config
    let mut opts = ClientOptions::from_config(&cfg);
    if let Some(url) = &args.url {
        opts.base_url = url.clone();
    }
    if let Some(token) = &args.token {
        opts = opts.token(token.clone());
    }
    if args.insecure {
        opts = opts.verify_ssl(false);
    }
    let client = JupyterServerClient::with_options(&opts)
        .with_context(|| format!("cannot create client for {}", opts.base_url))?;

    let printer = TextPrinter { color: !args.no_color && io::stdout().is_terminal() };

    match args.command {
        Command::Version => {
            let v = client.get_version().await?;
            println!("{}", v.version);
        }
        Command::Status => {
            let s = client.get_status().await?;
            println!("{}", serde_json::to_string_pretty(&s)?);
        }
        Command::Kernels => {
            let kernels = client.kernels().list_kernels().await?;
            if kernels.is_empty() {
                eprintln!("No running kernels.");
            }
            printer.print_kernels(&kernels);
        }
        Command::Kernel { id } => {
            let kernel = client.kernels().get_kernel(&id).await?;
            printer.print_kernels(std::slice::from_ref(&kernel));
        }
        Command::Exec { kernel, timeout, poll_interval, json, code } => {
            let code = read_code(code)?;
            let kernel_id = match kernel {
                Some(id) => id,
                None => first_kernel(&client).await?,
            };

            let mut options = ExecuteOptions::default().poll_interval(cfg.poll_interval());
            if let Some(t) = timeout.map(seconds).transpose()?.or_else(|| cfg.execution_timeout()) {
                options = options.timeout(t);
            }
            if let Some(p) = poll_interval.map(seconds).transpose()? {
                options = options.poll_interval(p);
            }

            let result = client.execs().execute(&kernel_id, &code, &options).await?;
            return report(&printer, &result, json);
        }
        Command::Result { kernel, execution, json } => {
            let result = client.execs().get_execution_result(&kernel, &execution).await?;
            return report(&printer, &result, json);
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Code comes from the positional argument, or stdin when it is piped.
fn read_code(arg: Option<String>) -> Result<String> {
    if let Some(code) = arg {
        return Ok(code);
    }
    let stdin = io::stdin();
    if stdin.is_terminal() {
        bail!("Provide CODE as an argument or via stdin");
    }
    let mut buf = String::new();
    stdin.lock().read_to_string(&mut buf)?;
    if buf.trim().is_empty() {
        bail!("No code received on stdin");
    }
    Ok(buf)
}

async fn first_kernel(client: &JupyterServerClient) -> Result<String> {
    let kernels = client.kernels().list_kernels().await?;
    let kernel = kernels
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("No running kernels on {}; start one first or pass --kernel", client.base_url()))?;
    debug!("using kernel {} ({})", kernel.id, kernel.name);
    Ok(kernel.id)
}

fn seconds(value: f64) -> Result<Duration> {
    if !value.is_finite() || value <= 0.0 {
        bail!("expected a positive number of seconds, got {}", value);
    }
    Ok(Duration::from_secs_f64(value))
}

fn report(printer: &TextPrinter, result: &ExecutionResult, json: bool) -> Result<ExitCode> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else {
        let outputs = result.parsed_outputs()?;
        printer.print_result(result, &outputs);
    }
    Ok(if result.is_ok() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
