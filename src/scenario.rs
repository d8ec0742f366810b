//! Scenario registry: named test definitions binding a setup sequence, one
//! command under test, and a declared expectation.

use crate::core::config::ArrayConfig;
use crate::driver::{ControlRequest, array_setup_sequence};
use crate::expectation::Expectation;

/// One gibibyte — the volume-size alignment boundary enforced by the target.
pub const SIZE_1GIB: u64 = 1024 * 1024 * 1024;

/// A named test run definition.
#[derive(Debug, Clone)]
pub struct Scenario {
    /// Identity; the result artifact is keyed by this name.
    pub name: &'static str,
    /// One-line description for listings.
    pub summary: &'static str,
    /// Commands that bring the target into a known state.
    pub setup: Vec<ControlRequest>,
    /// The single command whose response is judged.
    pub command_under_test: ControlRequest,
    /// Declared expectation for the command under test.
    pub expectation: Expectation,
}

/// Volume creation sized 2 bytes short of the 1 GiB boundary. The target
/// must reject the misaligned size, so the expectation is failure.
#[must_use]
pub fn create_vol_size_align_error(array: &ArrayConfig) -> Scenario {
    Scenario {
        name: "create_vol_size_align_error",
        summary: "volume sized 1 GiB - 2 bytes must be rejected as misaligned",
        setup: array_setup_sequence(array),
        command_under_test: create_volume(array, SIZE_1GIB - 2),
        expectation: Expectation::FailureExpected,
    }
}

/// Volume creation sized exactly one alignment unit. The boundary case: an
/// aligned size must be accepted, distinguishing it from the misaligned run.
#[must_use]
pub fn create_vol_size_aligned(array: &ArrayConfig) -> Scenario {
    Scenario {
        name: "create_vol_size_aligned",
        summary: "volume sized exactly 1 GiB must be accepted",
        setup: array_setup_sequence(array),
        command_under_test: create_volume(array, SIZE_1GIB),
        expectation: Expectation::SuccessExpected,
    }
}

fn create_volume(array: &ArrayConfig, size_bytes: u64) -> ControlRequest {
    ControlRequest::CreateVolume {
        name: "vol1".to_string(),
        size_bytes,
        max_iops: String::new(),
        max_bw: String::new(),
        array: array.name.clone(),
    }
}

/// All built-in scenarios against a given array.
#[must_use]
pub fn builtin_scenarios(array: &ArrayConfig) -> Vec<Scenario> {
    vec![
        create_vol_size_align_error(array),
        create_vol_size_aligned(array),
    ]
}

/// Look a scenario up by name.
#[must_use]
pub fn find_scenario(name: &str, array: &ArrayConfig) -> Option<Scenario> {
    builtin_scenarios(array).into_iter().find(|s| s.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expectation::Expectation;

    #[test]
    fn misaligned_scenario_is_two_bytes_short() {
        let scenario = create_vol_size_align_error(&ArrayConfig::default());
        match &scenario.command_under_test {
            ControlRequest::CreateVolume {
                name, size_bytes, ..
            } => {
                assert_eq!(name, "vol1");
                assert_eq!(*size_bytes, 1_073_741_822);
                assert_eq!(*size_bytes, SIZE_1GIB - 2);
            }
            other => panic!("unexpected command under test: {other:?}"),
        }
        assert_eq!(scenario.expectation, Expectation::FailureExpected);
    }

    #[test]
    fn boundary_scenarios_have_opposite_expectations() {
        let array = ArrayConfig::default();
        let misaligned = create_vol_size_align_error(&array);
        let aligned = create_vol_size_aligned(&array);
        assert_ne!(misaligned.expectation, aligned.expectation);

        let size_of = |s: &Scenario| match &s.command_under_test {
            ControlRequest::CreateVolume { size_bytes, .. } => *size_bytes,
            other => panic!("unexpected command under test: {other:?}"),
        };
        assert_eq!(size_of(&aligned) - size_of(&misaligned), 2);
    }

    #[test]
    fn setup_precedes_command_under_test() {
        let scenario = create_vol_size_align_error(&ArrayConfig::default());
        assert_eq!(scenario.setup.len(), 2);
        assert_eq!(scenario.setup[0].label(), "CREATEARRAY");
        assert_eq!(scenario.setup[1].label(), "MOUNTARRAY");
    }

    #[test]
    fn find_scenario_by_name() {
        let array = ArrayConfig::default();
        assert!(find_scenario("create_vol_size_align_error", &array).is_some());
        assert!(find_scenario("create_vol_size_aligned", &array).is_some());
        assert!(find_scenario("no_such_scenario", &array).is_none());
    }

    #[test]
    fn scenario_names_are_unique() {
        let scenarios = builtin_scenarios(&ArrayConfig::default());
        let names: std::collections::HashSet<&str> =
            scenarios.iter().map(|s| s.name).collect();
        assert_eq!(names.len(), scenarios.len());
    }
}
