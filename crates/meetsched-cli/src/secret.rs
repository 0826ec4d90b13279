//! Secret reference resolver.
//!
//! Values in `config.toml` (and the matching flags) can point at secrets
//! stored elsewhere:
//!
//! - `pass::path/in/store` runs `pass show path/in/store`, first line wins
//! - `env::VAR_NAME` reads `$VAR_NAME`
//! - anything else is used verbatim

use std::process::Command;

use tracing::debug;

/// Resolves a value that may carry a secret reference prefix.
pub fn resolve(value: &str) -> Result<String, String> {
    if let Some(path) = value.strip_prefix("pass::") {
        resolve_pass(path)
    } else if let Some(var) = value.strip_prefix("env::") {
        std::env::var(var).map_err(|_| format!("environment variable `{}` is not set", var))
    } else {
        Ok(value.to_string())
    }
}

/// Resolves an optional value, keeping `None` as is.
pub fn resolve_opt(value: Option<&str>) -> Result<Option<String>, String> {
    value.map(resolve).transpose()
}

fn resolve_pass(path: &str) -> Result<String, String> {
    debug!(entry = path, "reading secret from pass");
    let output = Command::new("pass")
        .arg("show")
        .arg(path)
        .output()
        .map_err(|e| format!("failed to run `pass show {}`: {}", path, e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!(
            "`pass show {}` failed ({}): {}",
            path,
            output.status,
            stderr.trim()
        ));
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(str::to_string)
        .ok_or_else(|| format!("`pass show {}` produced no output", path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_values_pass_through() {
        assert_eq!(resolve("").unwrap(), "");
        assert_eq!(
            resolve("http://localhost:3000/auth/google").unwrap(),
            "http://localhost:3000/auth/google"
        );
        assert_eq!(resolve_opt(None).unwrap(), None);
    }

    #[test]
    fn env_reference() {
        unsafe {
            std::env::set_var("_MEETSCHED_TEST_SECRET", "s3cret");
        }
        assert_eq!(resolve("env::_MEETSCHED_TEST_SECRET").unwrap(), "s3cret");
        assert_eq!(
            resolve_opt(Some("env::_MEETSCHED_TEST_SECRET")).unwrap(),
            Some("s3cret".to_string())
        );
        unsafe {
            std::env::remove_var("_MEETSCHED_TEST_SECRET");
        }
    }

    #[test]
    fn env_reference_missing() {
        let err = resolve("env::_MEETSCHED_NOT_SET_4711").unwrap_err();
        assert!(err.contains("not set"));
    }

    #[test]
    fn pass_reference_failure() {
        // Fails either because `pass` is missing or the entry is.
        assert!(resolve("pass::meetsched/does/not/exist/4711").is_err());
    }
}
