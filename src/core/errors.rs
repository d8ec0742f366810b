//! SAH-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, SahError>;

/// Top-level error type for the storage array harness.
#[derive(Debug, Error)]
pub enum SahError {
    #[error("[SAH-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[SAH-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[SAH-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[SAH-1101] unknown scenario: {name}")]
    UnknownScenario { name: String },

    #[error("[SAH-2001] malformed response for {command}: {details}")]
    MalformedResponse { command: String, details: String },

    #[error("[SAH-2101] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[SAH-3001] setup command {command} failed: {details}")]
    SetupFailure { command: String, details: String },

    #[error("[SAH-3002] CLI invocation of {command} failed: {details}")]
    CliInvocation { command: String, details: String },

    #[error("[SAH-3101] target process control failure: {details}")]
    ProcessControl { details: String },

    #[error("[SAH-3201] run interrupted before {stage}")]
    Interrupted { stage: &'static str },

    #[error("[SAH-4001] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[SAH-4900] runtime failure: {details}")]
    Runtime { details: String },
}

impl SahError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "SAH-1001",
            Self::MissingConfig { .. } => "SAH-1002",
            Self::ConfigParse { .. } => "SAH-1003",
            Self::UnknownScenario { .. } => "SAH-1101",
            Self::MalformedResponse { .. } => "SAH-2001",
            Self::Serialization { .. } => "SAH-2101",
            Self::SetupFailure { .. } => "SAH-3001",
            Self::CliInvocation { .. } => "SAH-3002",
            Self::ProcessControl { .. } => "SAH-3101",
            Self::Interrupted { .. } => "SAH-3201",
            Self::Io { .. } => "SAH-4001",
            Self::Runtime { .. } => "SAH-4900",
        }
    }

    /// Whether this error aborts a run before a verdict can exist.
    ///
    /// A failed assertion is a recorded FAIL verdict, not an error, so it
    /// never surfaces through this type. Process-control failures happen
    /// after the verdict is recorded and must not invalidate it.
    #[must_use]
    pub const fn aborts_run(&self) -> bool {
        !matches!(self, Self::ProcessControl { .. })
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<serde_json::Error> for SahError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for SahError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}
