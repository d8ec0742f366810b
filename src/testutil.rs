//! Shared test doubles for driver/runner unit tests.

use crate::core::errors::{Result, SahError};
use crate::driver::{ControlPlaneClient, ControlRequest};
use crate::response::CommandResponse;

/// Client returning canned payloads in issue order. `Err` entries simulate
/// failed CLI invocations.
pub struct ScriptedClient {
    responses: Vec<std::result::Result<String, String>>,
    pub issued: Vec<String>,
}

impl ScriptedClient {
    pub fn new(responses: Vec<std::result::Result<String, String>>) -> Self {
        Self {
            responses: {
                let mut r = responses;
                r.reverse();
                r
            },
            issued: Vec::new(),
        }
    }
}

impl ControlPlaneClient for ScriptedClient {
    fn issue(&mut self, request: &ControlRequest) -> Result<CommandResponse> {
        self.issued.push(request.label().to_string());
        match self.responses.pop().expect("script exhausted") {
            Ok(raw) => Ok(CommandResponse::new(request.label(), raw)),
            Err(details) => Err(SahError::CliInvocation {
                command: request.label().to_string(),
                details,
            }),
        }
    }
}

/// A well-formed response envelope carrying the given result code.
pub fn envelope(code: i64) -> String {
    format!(r#"{{"Response": {{"result": {{"status": {{"code": {code}}}}}}}}}"#)
}
