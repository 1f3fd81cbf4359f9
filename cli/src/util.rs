use std::io::Read;
use std::path::PathBuf;

use serde::Serialize;
use serde_json::json;

pub fn to_pretty_json(value: &impl Serialize) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| {
        json!({ "error": "serialization_failed", "message": e.to_string() }).to_string()
    })
}

pub fn print_json(value: &impl Serialize) {
    println!("{}", to_pretty_json(value));
}

/// Structured error on stderr. Returns `exit_code` for the caller to pass on.
pub fn report_error(error: &str, message: &str, docs_hint: Option<&str>, exit_code: i32) -> i32 {
    let mut err = json!({
        "error": error,
        "message": message
    });
    if let Some(hint) = docs_hint {
        err["docs_hint"] = json!(hint);
    }
    eprintln!("{}", to_pretty_json(&err));
    exit_code
}

/// Directory holding the learner profile; `--profile-dir` wins over the default.
pub fn profile_dir(explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(|| {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("eai")
    })
}

/// Read text from a file path or stdin (when path is "-").
pub fn read_text(path: &str) -> Result<String, String> {
    if path == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| format!("Failed to read stdin: {e}"))?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path).map_err(|e| format!("Failed to read file '{path}': {e}"))
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{profile_dir, read_text};

    #[test]
    fn explicit_profile_dir_wins() {
        assert_eq!(
            profile_dir(Some(PathBuf::from("/tmp/eai-test"))),
            PathBuf::from("/tmp/eai-test")
        );
        assert!(profile_dir(None).ends_with("eai"));
    }

    #[test]
    fn read_text_reports_missing_file() {
        let err = read_text("/definitely/not/here.json").unwrap_err();
        assert!(err.contains("/definitely/not/here.json"));
    }
}
