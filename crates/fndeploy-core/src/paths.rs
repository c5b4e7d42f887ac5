use crate::error::{DeployError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const CONFIG_DIR: &str = ".config/fndeploy";
pub const CONFIG_FILE: &str = "config.yaml";
pub const LOCKS_DIR: &str = ".cache/fndeploy/locks";
pub const FALLBACK_LOCKS_DIR: &str = "fndeploy-locks";

pub const PACKAGES_DIR: &str = "packages";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

/// `~/.config/fndeploy/config.yaml`
pub fn default_config_path() -> Result<PathBuf> {
    let home = home::home_dir().ok_or(DeployError::HomeNotFound)?;
    Ok(home.join(CONFIG_DIR).join(CONFIG_FILE))
}

/// `~/.cache/fndeploy/locks`, or `<temp>/fndeploy-locks` without a home directory.
pub fn default_lock_dir() -> PathBuf {
    lock_dir_for(home::home_dir())
}

fn lock_dir_for(home: Option<PathBuf>) -> PathBuf {
    match home {
        Some(home) => home.join(LOCKS_DIR),
        None => std::env::temp_dir().join(FALLBACK_LOCKS_DIR),
    }
}

/// `<project>/packages/<package>/<action>`
pub fn action_dir(project_root: &Path, package: &str, action: &str) -> PathBuf {
    project_root.join(PACKAGES_DIR).join(package).join(action)
}

/// Map an arbitrary lock key onto a safe file name.
pub fn lock_file_name(key: &str) -> String {
    let safe: String = key
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{safe}.lock")
}

// ---------------------------------------------------------------------------
// Name validation
// ---------------------------------------------------------------------------

static NAME_RE: OnceLock<Regex> = OnceLock::new();

fn name_re() -> &'static Regex {
    NAME_RE.get_or_init(|| {
        Regex::new(r"^[a-z0-9][a-z0-9_\-]*[a-z0-9]$|^[a-z0-9]$").expect("name regex is valid")
    })
}

/// Package and action names become directory names and URL segments.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > 64 || !name_re().is_match(name) {
        return Err(DeployError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Labels are matched against whitespace-separated listing columns, so they
/// may not contain whitespace themselves.
pub fn validate_label(label: &str) -> Result<()> {
    if label.trim().is_empty() || label.chars().any(char::is_whitespace) {
        return Err(DeployError::InvalidLabel(label.to_string()));
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
    fn valid_names() {
        for name in ["sample", "hello", "my-func_2", "x"] {
            validate_name(name).unwrap_or_else(|_| panic!("expected valid: {name}"));
        }
    }

    #[test]
    fn invalid_names() {
        for name in ["", "-lead", "trail-", "has space", "Upper", "a/b", "../x"] {
            assert!(validate_name(name).is_err(), "expected invalid: {name}");
        }
    }

    #[test]
    fn labels_reject_whitespace() {
        assert!(validate_label("demo").is_ok());
        assert!(validate_label("Demo-NS_1").is_ok());
        assert!(validate_label("").is_err());
        assert!(validate_label("two words").is_err());
        assert!(validate_label("tab\there").is_err());
    }

    #[test]
    fn action_dir_layout() {
        let root = Path::new("/tmp/doctl-serverless-x/mcp-func-abc123");
        assert_eq!(
            action_dir(root, "sample", "hello"),
            PathBuf::from("/tmp/doctl-serverless-x/mcp-func-abc123/packages/sample/hello")
        );
    }

    #[test]
    fn lock_dir_is_per_user() {
        assert_eq!(
            lock_dir_for(Some(PathBuf::from("/home/ada"))),
            PathBuf::from("/home/ada/.cache/fndeploy/locks")
        );
        assert_ne!(
            lock_dir_for(Some(PathBuf::from("/home/ada"))),
            lock_dir_for(Some(PathBuf::from("/home/grace")))
        );
        assert_eq!(
            lock_dir_for(None),
            std::env::temp_dir().join("fndeploy-locks")
        );
    }

    #[test]
    fn lock_file_names_are_flat() {
        assert_eq!(lock_file_name("fn-1234-abcd"), "fn-1234-abcd.lock");
        assert_eq!(lock_file_name("a/b c"), "a_b_c.lock");
    }
}
