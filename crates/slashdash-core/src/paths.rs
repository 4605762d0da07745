use crate::error::{Result, SlashdashError};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const SLASHDASH_DIR: &str = ".slashdash";
pub const CONFIG_FILE: &str = ".slashdash/config.yaml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn slashdash_dir(root: &Path) -> PathBuf {
    root.join(SLASHDASH_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

// ---------------------------------------------------------------------------
// Command name validation
// ---------------------------------------------------------------------------

static COMMAND_NAME_RE: OnceLock<Regex> = OnceLock::new();

fn command_name_re() -> &'static Regex {
    COMMAND_NAME_RE.get_or_init(|| Regex::new(r"^[a-z]+(?:-[a-z]+)*$").unwrap())
}

/// Canonical command names are lowercase words joined by single hyphens,
/// e.g. `analyze-data`.
pub fn validate_command_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > 64 || !command_name_re().is_match(name) {
        return Err(SlashdashError::InvalidCommandName(name.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_command_names() {
        for name in ["analyze-data", "list", "search-content", "full-work-flow"] {
            validate_command_name(name).unwrap_or_else(|_| panic!("expected valid: {name}"));
        }
    }

    #[test]
    fn invalid_command_names() {
        for name in [
            "",
            "-leading",
            "trailing-",
            "double--dash",
            "Upper-Case",
            "with space",
            "under_score",
            "digits-123",
        ] {
            assert!(
                validate_command_name(name).is_err(),
                "expected invalid: {name}"
            );
        }
    }

    #[test]
    fn path_helpers() {
        let root = Path::new("/tmp/proj");
        assert_eq!(
            config_path(root),
            PathBuf::from("/tmp/proj/.slashdash/config.yaml")
        );
        assert_eq!(slashdash_dir(root), PathBuf::from("/tmp/proj/.slashdash"));
    }
}
