//! `run_python_analysis`: execute model-written Python in a child process.
//!
//! The code never runs inside this process. The child gets a cleared
//! environment, the scratch directory as working directory, and a wall-clock
//! limit. This is process isolation only; there is no syscall or network
//! filtering.

use anyhow::anyhow;
use serde::Deserialize;
use tokio::process::Command;

use super::process::{run_with_timeout, tail, SAFE_PATH};
use crate::config::ToolConfig;
use crate::error::ToolError;

const TOOL: &str = "run_python_analysis";

const ANSWER_MARKER: &str = "__ANSWER__\n";
const NO_ANSWER_MARKER: &str = "__NO_ANSWER__";

/// Reads the user code from stdin, runs it with `pd` preloaded when pandas is
/// installed, and reports the `answer` variable after a marker line. Anything
/// the code prints goes to stderr so it cannot be mistaken for the answer.
const RUNNER: &str = r#"
import contextlib
import sys

scope = {"__name__": "__analysis__"}
try:
    import pandas as pd
    scope["pd"] = pd
except ImportError:
    pass

code = sys.stdin.read()
with contextlib.redirect_stdout(sys.stderr):
    exec(compile(code, "<analysis>", "exec"), scope)

if "answer" in scope:
    sys.stdout.write("__ANSWER__\n" + str(scope["answer"]))
else:
    sys.stdout.write("__NO_ANSWER__")
"#;

#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisArgs {
    pub code: String,
}

pub async fn run_python_analysis(config: &ToolConfig, args: &AnalysisArgs) -> Result<String, ToolError> {
    tokio::fs::create_dir_all(&config.scratch_dir)
        .await
        .map_err(|e| ToolError::execution(TOOL, e))?;

    let mut cmd = Command::new(&config.python_bin);
    cmd.arg("-c")
        .arg(RUNNER)
        .current_dir(&config.scratch_dir)
        .env_clear()
        .env("PATH", SAFE_PATH)
        .env("PYTHONDONTWRITEBYTECODE", "1");

    tracing::debug!(code_len = args.code.len(), "Running analysis code");

    let output = run_with_timeout(&mut cmd, Some(args.code.as_bytes()), config.timeout)
        .await
        .map_err(|e| ToolError::execution(TOOL, e))?;

    if !output.status.success() {
        return Err(ToolError::execution(
            TOOL,
            anyhow!(
                "Execution Error (exit code {}): {}",
                output.status.code().unwrap_or(-1),
                tail(&output.stderr, 2000)
            ),
        ));
    }

    read_answer(&String::from_utf8_lossy(&output.stdout))
        .ok_or_else(|| ToolError::execution(TOOL, anyhow!("analysis runner produced no result")))
}

/// Extract the answer from the runner's stdout.
fn read_answer(stdout: &str) -> Option<String> {
    if let Some((_, answer)) = stdout.split_once(ANSWER_MARKER) {
        return Some(answer.to_string());
    }
    if stdout.contains(NO_ANSWER_MARKER) {
        return Some("Code ran but no 'answer' variable was set.".to_string());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answer_follows_marker() {
        assert_eq!(read_answer("__ANSWER__\n42").as_deref(), Some("42"));
        assert_eq!(
            read_answer("__ANSWER__\nline one\nline two").as_deref(),
            Some("line one\nline two")
        );
    }

    #[test]
    fn missing_answer_is_reported_as_text() {
        assert_eq!(
            read_answer("__NO_ANSWER__").as_deref(),
            Some("Code ran but no 'answer' variable was set.")
        );
        assert_eq!(read_answer(""), None);
    }

    #[cfg(unix)]
    mod subprocess {
        use super::super::*;
        use std::os::unix::fs::PermissionsExt;

        use tempfile::TempDir;

        /// Install a stand-in interpreter that swallows stdin and prints `stdout`.
        fn fake_python(dir: &TempDir, script_body: &str) -> String {
            let path = dir.path().join("fake-python");
            std::fs::write(&path, format!("#!/bin/sh\ncat > /dev/null\n{}\n", script_body)).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path.to_string_lossy().into_owned()
        }

        fn config(dir: &TempDir, python_bin: String) -> ToolConfig {
            let mut config = ToolConfig::new(dir.path().join("scratch"));
            config.python_bin = python_bin;
            config
        }

        #[tokio::test]
        async fn returns_answer_from_child() {
            let dir = TempDir::new().unwrap();
            let bin = fake_python(&dir, r"printf '__ANSWER__\n7'");
            let result = run_python_analysis(&config(&dir, bin), &AnalysisArgs { code: "answer = 7".into() })
                .await
                .expect("analysis");
            assert_eq!(result, "7");
        }

        #[tokio::test]
        async fn failing_code_is_execution_error() {
            let dir = TempDir::new().unwrap();
            let bin = fake_python(&dir, "echo 'NameError: x' >&2; exit 1");
            let err = run_python_analysis(&config(&dir, bin), &AnalysisArgs { code: "x".into() })
                .await
                .unwrap_err();
            assert!(err.to_string().contains("NameError"), "{err}");
        }

        #[tokio::test]
        async fn missing_interpreter_is_execution_error() {
            let dir = TempDir::new().unwrap();
            let err = run_python_analysis(
                &config(&dir, "no-such-python-3f9c".into()),
                &AnalysisArgs { code: "answer = 1".into() },
            )
            .await
            .unwrap_err();
            assert!(matches!(err, ToolError::Execution { .. }));
        }
    }
}
