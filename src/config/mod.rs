use std::{
    collections::HashMap,
    env,
    fs,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
    time::Duration,
};

use directories::BaseDirs;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8888";

#[derive(Debug, Clone)]
pub struct Config {
    inner: HashMap<String, String>,
    pub config_path: PathBuf,
}

impl Config {
    pub fn load() -> Self {
        Self::load_from(default_config_path())
    }

    /// Defaults, overlaid by the rc file at `config_path`, overlaid by the environment.
    pub fn load_from(config_path: impl Into<PathBuf>) -> Self {
        let config_path = config_path.into();
        let mut map = default_map();

        if let Some(file_values) = read_rc_file(&config_path) {
            map.extend(file_values);
        }

        // Overlay environment variables (take precedence)
        for (k, v) in env::vars() {
            if is_config_key(&k) {
                map.insert(k, v);
            }
        }

        Self { inner: map, config_path }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        // ENV first
        if let Ok(v) = env::var(key) {
            return Some(v);
        }
        self.inner.get(key).cloned()
    }

    /// Like `get`, but blank values count as unset.
    pub fn get_non_empty(&self, key: &str) -> Option<String> {
        self.get(key).filter(|v| !v.trim().is_empty())
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key)
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
            .unwrap_or(false)
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.trim().parse::<u64>().ok())
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(|v| v.trim().parse::<f64>().ok())
    }

    /// Reads a value in (possibly fractional) seconds. Non-positive values count as unset.
    pub fn get_duration(&self, key: &str) -> Option<Duration> {
        self.get_f64(key)
            .filter(|s| s.is_finite() && *s > 0.0)
            .map(Duration::from_secs_f64)
    }

    pub fn server_url(&self) -> String {
        self.get_non_empty("JUPYTER_SERVER_URL")
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string())
    }

    pub fn token(&self) -> Option<String> {
        self.get_non_empty("JUPYTER_TOKEN")
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.get_u64("REQUEST_TIMEOUT").unwrap_or(30))
    }

    pub fn verify_ssl(&self) -> bool {
        self.get_bool("VERIFY_SSL")
    }

    pub fn poll_interval(&self) -> Duration {
        self.get_duration("POLL_INTERVAL")
            .unwrap_or(Duration::from_millis(100))
    }

    /// Unset means the execution workflow waits until the server reports a result.
    pub fn execution_timeout(&self) -> Option<Duration> {
        self.get_duration("EXECUTION_TIMEOUT")
    }

    pub fn log_level(&self) -> String {
        self.get_non_empty("LOG_LEVEL").unwrap_or_else(|| "warn".into())
    }
}

fn read_rc_file(path: &Path) -> Option<HashMap<String, String>> {
    let file = fs::File::open(path).ok()?;
    let mut values = HashMap::new();
    for line in BufReader::new(file).lines().map_while(Result::ok) {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((k, v)) = line.split_once('=') {
            values.insert(k.trim().to_string(), v.trim().to_string());
        }
    }
    Some(values)
}

fn is_config_key(k: &str) -> bool {
    const KEYS: &[&str] = &[
        "JUPYTER_SERVER_URL",
        "JUPYTER_TOKEN",
        "REQUEST_TIMEOUT",
        "VERIFY_SSL",
        "POLL_INTERVAL",
        "EXECUTION_TIMEOUT",
        "LOG_LEVEL",
    ];

    KEYS.contains(&k) || k.starts_with("JSAPI_") || k.starts_with("JUPYTER_")
}

fn default_config_path() -> PathBuf {
    let base = BaseDirs::new()
        .map(|b| b.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.config"));
    base.join("jupyter_server_api").join(".jsapirc")
}

fn default_map() -> HashMap<String, String> {
    let mut m = HashMap::new();

    m.insert("JUPYTER_SERVER_URL".into(), DEFAULT_SERVER_URL.into());
    m.insert("JUPYTER_TOKEN".into(), String::new());

    // Seconds
    m.insert("REQUEST_TIMEOUT".into(), "30".into());
    m.insert("POLL_INTERVAL".into(), "0.1".into());

    m.insert("VERIFY_SSL".into(), "true".into());
    m.insert("LOG_LEVEL".into(), "warn".into());

    m
}
