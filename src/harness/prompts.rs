//! Prompt records and the JSONL prompt file.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::HarnessError;
use crate::generation::DEFAULT_LANGUAGE;

/// One evaluation prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptRecord {
    /// Unique prompt identifier.
    pub id: String,
    /// Task description sent to the generation service.
    pub prompt: String,
    /// Target language of the generated code.
    #[serde(default = "default_language")]
    pub language: String,
    /// Test script that imports the generated module.
    pub test_script: PathBuf,
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

/// Loads every prompt record from a JSONL file.
///
/// Blank lines are skipped. An unreadable file or a line that does not decode
/// into a [`PromptRecord`] is fatal. Relative test script paths that do not
/// exist from the working directory are resolved against the prompt file's
/// directory.
pub fn load_prompts(path: &Path) -> Result<Vec<PromptRecord>, HarnessError> {
    let file = File::open(path).map_err(|source| HarnessError::PromptFile {
        path: path.to_path_buf(),
        source,
    })?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new(""));

    let mut records = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|source| HarnessError::PromptFile {
            path: path.to_path_buf(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }

        let mut record: PromptRecord = serde_json::from_str(&line)
            .map_err(|source| HarnessError::MalformedRecord { line: idx + 1, source })?;
        record.test_script = resolve_test_script(&record.test_script, base_dir);
        records.push(record);
    }

    debug!(count = records.len(), path = %path.display(), "Loaded prompt records");
    Ok(records)
}

fn resolve_test_script(script: &Path, base_dir: &Path) -> PathBuf {
    if script.is_absolute() || script.exists() {
        return script.to_path_buf();
    }
    let candidate = base_dir.join(script);
    if candidate.exists() {
        candidate
    } else {
        script.to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_prompts_with_default_language() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("prompts.jsonl");
        fs::write(
            &path,
            concat!(
                r#"{"id": "add", "prompt": "Write add(a, b)", "test_script": "/abs/test_add.py"}"#,
                "\n\n",
                r#"{"id": "rev", "prompt": "Reverse a string", "language": "python3", "test_script": "/abs/test_rev.py"}"#,
                "\n",
            ),
        )
        .unwrap();

        let records = load_prompts(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "add");
        assert_eq!(records[0].language, "python");
        assert_eq!(records[1].language, "python3");
        assert_eq!(records[1].test_script, PathBuf::from("/abs/test_rev.py"));
    }

    #[test]
    fn test_malformed_line_is_fatal_with_line_number() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("prompts.jsonl");
        fs::write(
            &path,
            concat!(
                r#"{"id": "ok", "prompt": "p", "test_script": "t.py"}"#,
                "\n",
                r#"{"id": "missing-fields"}"#,
                "\n",
            ),
        )
        .unwrap();

        let err = load_prompts(&path).unwrap_err();
        assert!(matches!(err, HarnessError::MalformedRecord { line: 2, .. }));
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let err = load_prompts(Path::new("/nonexistent/prompts.jsonl")).unwrap_err();
        assert!(matches!(err, HarnessError::PromptFile { .. }));
    }

    #[test]
    fn test_relative_script_resolved_against_prompt_dir() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("passk_test_resolve_add.py"), "pass\n").unwrap();
        let path = temp.path().join("prompts.jsonl");
        fs::write(
            &path,
            r#"{"id": "add", "prompt": "p", "test_script": "passk_test_resolve_add.py"}"#,
        )
        .unwrap();

        let records = load_prompts(&path).unwrap();
        assert_eq!(
            records[0].test_script,
            temp.path().join("passk_test_resolve_add.py")
        );
    }

    #[test]
    fn test_unresolvable_relative_script_kept_as_is() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("prompts.jsonl");
        fs::write(
            &path,
            r#"{"id": "x", "prompt": "p", "test_script": "nowhere/test_x.py"}"#,
        )
        .unwrap();

        let records = load_prompts(&path).unwrap();
        assert_eq!(records[0].test_script, PathBuf::from("nowhere/test_x.py"));
    }
}
