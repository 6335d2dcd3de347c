use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use serde::Deserialize;

/// Environment variable naming an optional YAML config file.
pub const CONFIG_ENV: &str = "SLUICE_CONFIG";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerSection,
    pub static_files: StaticFilesConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub listen_addr: String,
    /// Runtime worker threads, and the number of connections served at once.
    pub workers: usize,
    pub read_timeout_ms: u64,
    pub write_timeout_ms: u64,
    /// Ceiling on buffered request bytes before the request line must be complete.
    pub max_request_bytes: usize,
    /// How long a closing connection drains unread client bytes.
    pub linger_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    pub root: PathBuf,
    pub index: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:10080".to_string(),
            workers: 10,
            read_timeout_ms: 10_000,
            write_timeout_ms: 10_000,
            max_request_bytes: 4096,
            linger_ms: 200,
        }
    }
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            root: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            index: "index.html".to_string(),
        }
    }
}

impl ServerSection {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    pub fn linger(&self) -> Duration {
        Duration::from_millis(self.linger_ms)
    }
}

impl Config {
    /// Loads the process configuration.
    ///
    /// Reads the YAML file named by `SLUICE_CONFIG` if set, then applies the
    /// `LISTEN`, `ROOT`, `WORKERS` and `INDEX` environment overrides and
    /// validates the result.
    pub fn load() -> anyhow::Result<Self> {
        let mut cfg = match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };

        cfg.apply_overrides(|key| std::env::var(key).ok())?;
        cfg.validate()
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_yaml_str(&text).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn from_yaml_str(text: &str) -> anyhow::Result<Self> {
        let cfg = serde_yaml::from_str(text)?;
        Ok(cfg)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("LISTEN") {
            self.server.listen_addr = addr;
        }
        if let Some(root) = lookup("ROOT") {
            self.static_files.root = PathBuf::from(root);
        }
        if let Some(workers) = lookup("WORKERS") {
            self.server.workers = workers
                .trim()
                .parse()
                .with_context(|| format!("WORKERS is not a number: {workers:?}"))?;
        }
        if let Some(index) = lookup("INDEX") {
            self.static_files.index = index;
        }
        Ok(())
    }

    /// Checks limits and canonicalizes the served root.
    pub fn validate(mut self) -> anyhow::Result<Self> {
        if self.server.workers == 0 {
            bail!("server.workers must be at least 1");
        }
        if self.server.max_request_bytes < 16 {
            bail!(
                "server.max_request_bytes must be at least 16, got {}",
                self.server.max_request_bytes
            );
        }
        if self.server.read_timeout_ms == 0 || self.server.write_timeout_ms == 0 {
            bail!("server timeouts must be non-zero");
        }

        let index = &self.static_files.index;
        if index.is_empty() || index.contains(['/', '\\']) || index == "." || index == ".." {
            bail!("static_files.index must be a plain file name, got {index:?}");
        }

        let root = std::fs::canonicalize(&self.static_files.root).with_context(|| {
            format!("resolving served root {}", self.static_files.root.display())
        })?;
        if !root.is_dir() {
            bail!("served root {} is not a directory", root.display());
        }
        self.static_files.root = root;

        Ok(self)
    }
}
