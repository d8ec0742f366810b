//! Run orchestration: one scenario, start to verdict, with guaranteed
//! target teardown.
//!
//! Stage order is fixed: clear stale artifact → setup → command under test →
//! parse → evaluate → record → terminate. Harness faults (setup failure,
//! malformed response, interrupt) abort before any artifact is written, so
//! artifact absence is itself a signal that the assertion never ran. The
//! `TargetProcess` guard is consumed by the run and terminates the target on
//! every exit path.

use std::path::PathBuf;

use serde::Serialize;

use crate::core::errors::{Result, SahError};
use crate::driver::{CommandDriver, ControlPlaneClient};
use crate::expectation::Verdict;
use crate::interrupt::InterruptGuard;
use crate::logger::jsonl::{RunEvent, RunLogEntry, RunLogger};
use crate::process::TargetProcess;
use crate::recorder::{VerdictRecord, VerdictRecorder};
use crate::scenario::Scenario;

/// Completed-run summary handed back to the CLI layer.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    /// Scenario identity.
    pub scenario: String,
    /// Recorded verdict.
    pub verdict: Verdict,
    /// Result code the verdict was computed from.
    pub code: i64,
    /// Where the artifact was written.
    pub artifact_path: PathBuf,
    /// Termination failure observed after the verdict was recorded, if any.
    /// Never invalidates the verdict.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub termination_warning: Option<String>,
}

/// Execute one scenario end to end.
///
/// `target` is consumed: whether the run completes, aborts, or panics, the
/// guard terminates the target process.
pub fn run_scenario<C: ControlPlaneClient>(
    scenario: &Scenario,
    client: C,
    mut target: TargetProcess,
    recorder: &VerdictRecorder,
    logger: &mut RunLogger,
    interrupt: &InterruptGuard,
) -> Result<RunOutcome> {
    // Stale-result invalidation happens before anything can fail, so an
    // aborted run leaves no artifact behind.
    recorder.clear(scenario.name)?;

    let mut start = RunLogEntry::new(RunEvent::RunStart, scenario.name);
    start.pid = Some(target.pid());
    logger.write(&start);

    let outcome = drive(scenario, client, recorder, logger, interrupt);

    match outcome {
        Ok((verdict, code, artifact_path)) => {
            let termination_warning = match target.terminate() {
                Ok(()) => {
                    logger.write(&RunLogEntry::new(RunEvent::TargetTerminated, scenario.name));
                    None
                }
                Err(e) => {
                    log_error(logger, scenario.name, &e);
                    Some(e.to_string())
                }
            };
            Ok(RunOutcome {
                scenario: scenario.name.to_string(),
                verdict,
                code,
                artifact_path,
                termination_warning,
            })
        }
        Err(e) => {
            log_error(logger, scenario.name, &e);
            // Explicit termination before the error propagates keeps the
            // teardown observable in the log; Drop remains the backstop.
            if let Err(term_err) = target.terminate() {
                log_error(logger, scenario.name, &term_err);
            } else {
                logger.write(&RunLogEntry::new(RunEvent::TargetTerminated, scenario.name));
            }
            Err(e)
        }
    }
}

fn drive<C: ControlPlaneClient>(
    scenario: &Scenario,
    client: C,
    recorder: &VerdictRecorder,
    logger: &mut RunLogger,
    interrupt: &InterruptGuard,
) -> Result<(Verdict, i64, PathBuf)> {
    let mut driver = CommandDriver::new(client);

    if interrupt.interrupted() {
        return Err(SahError::Interrupted { stage: "setup" });
    }
    driver.run_setup(&scenario.setup)?;
    logger.write(&RunLogEntry::new(RunEvent::SetupComplete, scenario.name));

    if interrupt.interrupted() {
        return Err(SahError::Interrupted {
            stage: "command under test",
        });
    }
    let response = driver.run_command_under_test(&scenario.command_under_test)?;
    let mut issued = RunLogEntry::new(RunEvent::CommandIssued, scenario.name);
    issued.command = Some(response.command.clone());
    logger.write(&issued);

    let code = response.code()?;
    let verdict = scenario.expectation.evaluate(code);

    let artifact_path = recorder.record(
        scenario.name,
        &VerdictRecord {
            verdict,
            code,
            raw_response: response.raw.clone(),
        },
    )?;

    let mut recorded = RunLogEntry::new(RunEvent::VerdictRecorded, scenario.name);
    recorded.code = Some(code);
    recorded.verdict = Some(verdict.label().to_string());
    logger.write(&recorded);

    Ok((verdict, code, artifact_path))
}

fn log_error(logger: &mut RunLogger, scenario: &str, error: &SahError) {
    let mut entry = RunLogEntry::new(RunEvent::Error, scenario);
    entry.error_code = Some(error.code().to_string());
    entry.details = Some(error.to_string());
    logger.write(&entry);
}
