//! Expectation evaluator: maps a result code plus a declared expectation to
//! a PASS/FAIL verdict.
//!
//! The code-to-polarity mapping is total and explicit: code 0 is success,
//! every nonzero code (positive or negative) is failure. There is no
//! "unknown" bucket — a payload without an extractable code never reaches
//! this module.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Result code indicating success on the control-plane wire protocol.
pub const CODE_SUCCESS: i64 = 0;

/// Success/failure polarity of a result code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    /// The operation was accepted.
    Success,
    /// The operation was rejected.
    Failure,
}

/// Total mapping from result code to polarity.
#[must_use]
pub const fn polarity_of(code: i64) -> Polarity {
    if code == CODE_SUCCESS {
        Polarity::Success
    } else {
        Polarity::Failure
    }
}

/// Declared expectation for the command under test.
///
/// Fixed at scenario-definition time; generalizes the single "expect the
/// call to be rejected" predicate so scenario variants can share the same
/// driver and recorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Expectation {
    /// The command under test must succeed (code 0).
    SuccessExpected,
    /// The command under test must be rejected (any nonzero code).
    FailureExpected,
    /// The command under test must return exactly this code.
    CodeEquals(i64),
}

impl Expectation {
    /// Evaluate a result code against this expectation.
    ///
    /// Pure: same `(code, expectation)` always yields the same verdict.
    #[must_use]
    pub const fn evaluate(self, code: i64) -> Verdict {
        let holds = match self {
            Self::SuccessExpected => matches!(polarity_of(code), Polarity::Success),
            Self::FailureExpected => matches!(polarity_of(code), Polarity::Failure),
            Self::CodeEquals(expected) => code == expected,
        };
        if holds { Verdict::Pass } else { Verdict::Fail }
    }
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SuccessExpected => write!(f, "success"),
            Self::FailureExpected => write!(f, "failure"),
            Self::CodeEquals(code) => write!(f, "code={code}"),
        }
    }
}

impl FromStr for Expectation {
    type Err = String;

    /// Parse `success`, `failure`, or `code=<int>` (CLI `--expect` values).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(Self::SuccessExpected),
            "failure" => Ok(Self::FailureExpected),
            other => other.strip_prefix("code=").map_or_else(
                || Err(format!("expected 'success', 'failure', or 'code=<int>', got {other:?}")),
                |raw| {
                    raw.parse()
                        .map(Self::CodeEquals)
                        .map_err(|_| format!("invalid code in expectation: {raw:?}"))
                },
            ),
        }
    }
}

/// Outcome of one assertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    /// The response matched the declared expectation.
    Pass,
    /// The response did not match the declared expectation.
    Fail,
}

impl Verdict {
    /// Label written into result artifacts.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
