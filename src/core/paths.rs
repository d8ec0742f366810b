//! Path utilities: normalization and result-artifact path derivation.

use std::env;
use std::path::{Component, Path, PathBuf};

/// Resolve a path to an absolute, normalized path.
///
/// Uses `fs::canonicalize` when the path exists; otherwise makes the path
/// absolute relative to CWD and resolves `..`/`.` components syntactically.
pub fn resolve_absolute_path(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
    };

    if let Ok(canonical) = std::fs::canonicalize(&absolute) {
        return canonical;
    }

    normalize_syntactic(&absolute)
}

fn normalize_syntactic(path: &Path) -> PathBuf {
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::Prefix(..) | Component::RootDir | Component::Normal(_) => {
                components.push(component);
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if let Some(Component::Normal(_)) = components.last() {
                    components.pop();
                }
            }
        }
    }
    components.into_iter().collect()
}

/// Derive the result-artifact path for a scenario identity.
///
/// The scenario name is sanitized so that one artifact file maps to one
/// scenario and a hostile name cannot escape the results directory.
pub fn artifact_path(results_dir: &Path, scenario: &str) -> PathBuf {
    results_dir.join(format!("{}.result", sanitize_scenario_name(scenario)))
}

/// Map a scenario name onto a filesystem-safe identifier.
pub fn sanitize_scenario_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_existing_path_canonically() {
        let cwd = env::current_dir().unwrap();
        let resolved = resolve_absolute_path(Path::new("."));
        assert_eq!(resolved, std::fs::canonicalize(&cwd).unwrap());
    }

    #[test]
    fn normalizes_nonexistent_path_syntactically() {
        let input = Path::new("/nonexistent/foo/../bar");
        assert!(std::fs::canonicalize(input).is_err());
        assert_eq!(resolve_absolute_path(input), Path::new("/nonexistent/bar"));
    }

    #[test]
    fn artifact_path_uses_result_suffix() {
        let path = artifact_path(Path::new("/tmp/results"), "create_vol_size_align_error");
        assert_eq!(
            path,
            Path::new("/tmp/results/create_vol_size_align_error.result")
        );
    }

    #[test]
    fn hostile_scenario_names_cannot_escape() {
        let path = artifact_path(Path::new("/tmp/results"), "../../etc/passwd");
        assert!(path.starts_with("/tmp/results"));
        assert_eq!(sanitize_scenario_name("../../etc/passwd"), "______etc_passwd");
    }

    #[test]
    fn sanitize_keeps_word_characters() {
        assert_eq!(
            sanitize_scenario_name("create_vol-size.align error"),
            "create_vol-size_align_error"
        );
    }
}
