//! Configuration system: TOML file + env var overrides + smart defaults.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, SahError};
use crate::core::paths::resolve_absolute_path;

/// Full harness configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
#[derive(Default)]
pub struct Config {
    pub target: TargetConfig,
    pub array: ArrayConfig,
    pub results: ResultsConfig,
    pub log: LogConfig,
}

/// External target process and CLI binary settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TargetConfig {
    /// Control-plane CLI binary invoked for every request.
    pub cli_bin: PathBuf,
    /// Extra arguments prepended to every CLI invocation (e.g. endpoint flags).
    pub cli_args: Vec<String>,
    /// Target process binary. Spawned by the harness when `spawn` is true.
    pub bin: PathBuf,
    /// Arguments for the spawned target process.
    pub bin_args: Vec<String>,
    /// Spawn the target process at run start. When false the harness attaches
    /// to an externally managed process via `pidfile`.
    pub spawn: bool,
    /// Pidfile of an externally managed target process (attach mode).
    pub pidfile: Option<PathBuf>,
    /// Milliseconds to wait after spawning before issuing setup commands.
    pub startup_wait_ms: u64,
    /// Grace period between SIGTERM and SIGKILL escalation.
    pub terminate_grace_ms: u64,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            cli_bin: PathBuf::from("poseidonos-cli"),
            cli_args: Vec::new(),
            bin: PathBuf::from("poseidonos"),
            bin_args: Vec::new(),
            spawn: true,
            pidfile: None,
            startup_wait_ms: 500,
            terminate_grace_ms: 3000,
        }
    }
}

/// Array under test.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ArrayConfig {
    /// Name of the array that setup creates and mounts.
    pub name: String,
    /// Buffer device passed to array creation.
    pub buffer_device: String,
    /// Data devices passed to array creation.
    pub data_devices: Vec<String>,
    /// RAID scheme for array creation.
    pub raid_type: String,
}

impl Default for ArrayConfig {
    fn default() -> Self {
        Self {
            name: "POSArray".to_string(),
            buffer_device: "uram0".to_string(),
            data_devices: vec![
                "unvme-ns-0".to_string(),
                "unvme-ns-1".to_string(),
                "unvme-ns-2".to_string(),
            ],
            raid_type: "RAID5".to_string(),
        }
    }
}

/// Verdict artifact placement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ResultsConfig {
    /// Directory holding one `<scenario>.result` artifact per scenario.
    pub dir: PathBuf,
}

impl Default for ResultsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("results"),
        }
    }
}

/// JSONL run log placement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LogConfig {
    /// Primary run log path.
    pub path: PathBuf,
    /// Optional fallback path used when the primary cannot be opened.
    pub fallback_path: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        let home_dir = env::var_os("HOME").map_or_else(|| PathBuf::from("."), PathBuf::from);
        Self {
            path: home_dir.join(".local/state/sah/runs.jsonl"),
            fallback_path: None,
        }
    }
}

impl Config {
    /// Default configuration path (`~/.config/sah/config.toml`).
    #[must_use]
    pub fn default_path() -> PathBuf {
        let home_dir = env::var_os("HOME").map_or_else(|| PathBuf::from("."), PathBuf::from);
        home_dir.join(".config/sah/config.toml")
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from the default
    /// path; defaults are used. An explicitly given path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| SahError::Io {
                path: path_buf.clone(),
                source,
            })?;
            let parsed: Self = toml::from_str(&raw)?;
            parsed
        } else if is_explicit_path {
            return Err(SahError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.apply_env_overrides()?;
        cfg.normalize_paths();
        cfg.validate()?;
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        set_env_path("SAH_CLI_BIN", &mut self.target.cli_bin);
        set_env_path("SAH_TARGET_BIN", &mut self.target.bin);
        set_env_bool("SAH_TARGET_SPAWN", &mut self.target.spawn)?;
        set_env_u64("SAH_TARGET_STARTUP_WAIT_MS", &mut self.target.startup_wait_ms)?;
        set_env_u64(
            "SAH_TARGET_TERMINATE_GRACE_MS",
            &mut self.target.terminate_grace_ms,
        )?;
        if let Some(raw) = env::var_os("SAH_TARGET_PIDFILE") {
            self.target.pidfile = Some(PathBuf::from(raw));
        }

        set_env_string("SAH_ARRAY_NAME", &mut self.array.name);
        set_env_path("SAH_RESULTS_DIR", &mut self.results.dir);
        set_env_path("SAH_LOG_PATH", &mut self.log.path);
        Ok(())
    }

    fn normalize_paths(&mut self) {
        self.results.dir = resolve_absolute_path(&self.results.dir);
    }

    /// Reject configurations that cannot drive a run.
    pub fn validate(&self) -> Result<()> {
        if self.target.cli_bin.as_os_str().is_empty() {
            return Err(SahError::InvalidConfig {
                details: "target.cli_bin must not be empty".to_string(),
            });
        }
        if self.array.name.is_empty() {
            return Err(SahError::InvalidConfig {
                details: "array.name must not be empty".to_string(),
            });
        }
        if self.target.terminate_grace_ms == 0 {
            return Err(SahError::InvalidConfig {
                details: "target.terminate_grace_ms must be > 0".to_string(),
            });
        }
        if !self.target.spawn && self.target.pidfile.is_none() {
            return Err(SahError::InvalidConfig {
                details: "attach mode (target.spawn = false) requires target.pidfile".to_string(),
            });
        }
        Ok(())
    }
}

// ──────────────────────── env helpers ────────────────────────

fn set_env_string(key: &str, slot: &mut String) {
    if let Ok(raw) = env::var(key)
        && !raw.is_empty()
    {
        *slot = raw;
    }
}

fn set_env_path(key: &str, slot: &mut PathBuf) {
    if let Some(raw) = env::var_os(key)
        && !raw.is_empty()
    {
        *slot = PathBuf::from(raw);
    }
}

fn set_env_bool(key: &str, slot: &mut bool) -> Result<()> {
    if let Ok(raw) = env::var(key) {
        *slot = match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => {
                return Err(SahError::InvalidConfig {
                    details: format!("{key} must be a boolean, got {raw:?}"),
                });
            }
        };
    }
    Ok(())
}

fn set_env_u64(key: &str, slot: &mut u64) -> Result<()> {
    if let Ok(raw) = env::var(key) {
        *slot = raw.parse().map_err(|_| SahError::InvalidConfig {
            details: format!("{key} must be an unsigned integer, got {raw:?}"),
        })?;
    }
    Ok(())
}

// ──────────────────────── tests ────────────────────────
