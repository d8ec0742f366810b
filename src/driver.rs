//! Command driver: issues setup commands and the command under test against
//! the control-plane CLI.
//!
//! Only the command under test is surfaced to verdict logic. Setup responses
//! are judged here: a nonzero setup code is a harness-level `SetupFailure`,
//! never a test FAIL, because a broken precondition invalidates the
//! assertion that follows.

use std::path::PathBuf;
use std::process::Command;

use crate::core::config::{ArrayConfig, TargetConfig};
use crate::core::errors::{Result, SahError};
use crate::expectation::CODE_SUCCESS;
use crate::response::CommandResponse;

/// Typed surface of the control-plane CLI consumed by the harness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlRequest {
    /// Create a named array over buffer + data devices.
    CreateArray {
        name: String,
        buffer_device: String,
        data_devices: Vec<String>,
        raid_type: String,
    },
    /// Mount a previously created array.
    MountArray { name: String },
    /// Unmount an array.
    UnmountArray { name: String },
    /// Create a volume with an explicit size in bytes. The QoS fields carry
    /// empty strings when unconstrained, matching the CLI's call shape.
    CreateVolume {
        name: String,
        size_bytes: u64,
        max_iops: String,
        max_bw: String,
        array: String,
    },
    /// Ask the target to shut itself down.
    StopSystem,
}

impl ControlRequest {
    /// Wire-protocol command label, used in logs and error messages.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::CreateArray { .. } => "CREATEARRAY",
            Self::MountArray { .. } => "MOUNTARRAY",
            Self::UnmountArray { .. } => "UNMOUNTARRAY",
            Self::CreateVolume { .. } => "CREATEVOLUME",
            Self::StopSystem => "STOPSYSTEM",
        }
    }

    /// Argument vector appended to the CLI binary invocation.
    #[must_use]
    pub fn cli_args(&self) -> Vec<String> {
        match self {
            Self::CreateArray {
                name,
                buffer_device,
                data_devices,
                raid_type,
            } => vec![
                "array".into(),
                "create".into(),
                "--array-name".into(),
                name.clone(),
                "--buffer".into(),
                buffer_device.clone(),
                "--data-devs".into(),
                data_devices.join(","),
                "--raid".into(),
                raid_type.clone(),
            ],
            Self::MountArray { name } => vec![
                "array".into(),
                "mount".into(),
                "--array-name".into(),
                name.clone(),
            ],
            Self::UnmountArray { name } => vec![
                "array".into(),
                "unmount".into(),
                "--array-name".into(),
                name.clone(),
            ],
            Self::CreateVolume {
                name,
                size_bytes,
                max_iops,
                max_bw,
                array,
            } => vec![
                "volume".into(),
                "create".into(),
                "--volume-name".into(),
                name.clone(),
                "--size".into(),
                size_bytes.to_string(),
                "--maxiops".into(),
                max_iops.clone(),
                "--maxbw".into(),
                max_bw.clone(),
                "--array-name".into(),
                array.clone(),
            ],
            Self::StopSystem => vec!["system".into(), "stop".into(), "--force".into()],
        }
    }
}

/// Build the deterministic setup sequence that brings a named array into a
/// mounted, ready state.
#[must_use]
pub fn array_setup_sequence(array: &ArrayConfig) -> Vec<ControlRequest> {
    vec![
        ControlRequest::CreateArray {
            name: array.name.clone(),
            buffer_device: array.buffer_device.clone(),
            data_devices: array.data_devices.clone(),
            raid_type: array.raid_type.clone(),
        },
        ControlRequest::MountArray {
            name: array.name.clone(),
        },
    ]
}

/// Capability seam over the external CLI binary. One blocking call per
/// request; no two requests in flight at once.
pub trait ControlPlaneClient {
    /// Issue one request and return its raw response payload.
    fn issue(&mut self, request: &ControlRequest) -> Result<CommandResponse>;
}

/// `ControlPlaneClient` backed by the product's CLI binary.
#[derive(Debug, Clone)]
pub struct CliClient {
    bin: PathBuf,
    base_args: Vec<String>,
}

impl CliClient {
    /// Build a client from the target configuration.
    #[must_use]
    pub fn from_config(target: &TargetConfig) -> Self {
        Self {
            bin: target.cli_bin.clone(),
            base_args: target.cli_args.clone(),
        }
    }
}

impl ControlPlaneClient for CliClient {
    fn issue(&mut self, request: &ControlRequest) -> Result<CommandResponse> {
        let output = Command::new(&self.bin)
            .args(&self.base_args)
            .args(request.cli_args())
            .output()
            .map_err(|e| SahError::CliInvocation {
                command: request.label().to_string(),
                details: format!("{}: {e}", self.bin.display()),
            })?;

        if !output.status.success() {
            return Err(SahError::CliInvocation {
                command: request.label().to_string(),
                details: format!(
                    "CLI exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        Ok(CommandResponse::new(
            request.label(),
            String::from_utf8_lossy(&output.stdout).into_owned(),
        ))
    }
}

/// Sequences setup commands and the command under test over a client.
pub struct CommandDriver<C> {
    client: C,
}

impl<C: ControlPlaneClient> CommandDriver<C> {
    /// Wrap a client.
    pub const fn new(client: C) -> Self {
        Self { client }
    }

    /// Issue the setup sequence. Every setup response is checked: a failed
    /// invocation, a malformed response, or a nonzero code aborts the run
    /// with `SetupFailure`.
    pub fn run_setup(&mut self, setup: &[ControlRequest]) -> Result<()> {
        for request in setup {
            let response = self
                .client
                .issue(request)
                .map_err(|e| SahError::SetupFailure {
                    command: request.label().to_string(),
                    details: e.to_string(),
                })?;
            let code = response.code().map_err(|e| SahError::SetupFailure {
                command: request.label().to_string(),
                details: e.to_string(),
            })?;
            if code != CODE_SUCCESS {
                return Err(SahError::SetupFailure {
                    command: request.label().to_string(),
                    details: format!("setup response code {code}"),
                });
            }
        }
        Ok(())
    }

    /// Issue exactly one command under test and return its raw response.
    /// The response is not judged here.
    pub fn run_command_under_test(&mut self, request: &ControlRequest) -> Result<CommandResponse> {
        self.client.issue(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{ScriptedClient, envelope as ok_response};

    fn default_setup() -> Vec<ControlRequest> {
        array_setup_sequence(&ArrayConfig::default())
    }

    #[test]
    fn setup_issues_create_then_mount() {
        let client = ScriptedClient::new(vec![Ok(ok_response(0)), Ok(ok_response(0))]);
        let mut driver = CommandDriver::new(client);
        driver.run_setup(&default_setup()).unwrap();
        assert_eq!(driver.client.issued, vec!["CREATEARRAY", "MOUNTARRAY"]);
    }

    #[test]
    fn nonzero_setup_code_is_setup_failure() {
        let client = ScriptedClient::new(vec![Ok(ok_response(0)), Ok(ok_response(1234))]);
        let mut driver = CommandDriver::new(client);
        let err = driver.run_setup(&default_setup()).unwrap_err();
        assert_eq!(err.code(), "SAH-3001");
        assert!(err.to_string().contains("MOUNTARRAY"));
    }

    #[test]
    fn setup_invocation_error_is_setup_failure() {
        let client = ScriptedClient::new(vec![Err("connection refused".to_string())]);
        let mut driver = CommandDriver::new(client);
        let err = driver.run_setup(&default_setup()).unwrap_err();
        assert_eq!(err.code(), "SAH-3001");
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn malformed_setup_response_is_setup_failure() {
        let client = ScriptedClient::new(vec![Ok("garbage".to_string())]);
        let mut driver = CommandDriver::new(client);
        let err = driver.run_setup(&default_setup()).unwrap_err();
        assert_eq!(err.code(), "SAH-3001");
    }

    #[test]
    fn command_under_test_response_is_returned_unjudged() {
        // A rejection code in the CUT response is NOT an error here.
        let client = ScriptedClient::new(vec![Ok(ok_response(2010))]);
        let mut driver = CommandDriver::new(client);
        let response = driver
            .run_command_under_test(&ControlRequest::CreateVolume {
                name: "vol1".to_string(),
                size_bytes: 1_073_741_822,
                max_iops: String::new(),
                max_bw: String::new(),
                array: "POSArray".to_string(),
            })
            .unwrap();
        assert_eq!(response.code().unwrap(), 2010);
    }

    #[test]
    fn create_volume_args_match_cli_surface() {
        let request = ControlRequest::CreateVolume {
            name: "vol1".to_string(),
            size_bytes: 1_073_741_822,
            max_iops: String::new(),
            max_bw: String::new(),
            array: "POSArray".to_string(),
        };
        let args = request.cli_args();
        assert_eq!(args[0], "volume");
        assert_eq!(args[1], "create");
        let size_pos = args.iter().position(|a| a == "--size").unwrap();
        assert_eq!(args[size_pos + 1], "1073741822");
        // QoS fields travel as explicit empty strings.
        let iops_pos = args.iter().position(|a| a == "--maxiops").unwrap();
        assert_eq!(args[iops_pos + 1], "");
    }

    #[test]
    fn setup_sequence_uses_configured_array() {
        let mut array = ArrayConfig::default();
        array.name = "ARR7".to_string();
        let setup = array_setup_sequence(&array);
        assert_eq!(setup.len(), 2);
        assert!(matches!(
            &setup[1],
            ControlRequest::MountArray { name } if name == "ARR7"
        ));
    }
}
