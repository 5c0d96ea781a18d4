//! `format_file`: run Prettier over a file in place.

use std::path::Path;

use anyhow::anyhow;
use serde::Deserialize;
use tokio::process::Command;

use super::process::{run_with_timeout, tail};
use crate::config::ToolConfig;
use crate::error::ToolError;

const TOOL: &str = "format_file";

#[derive(Debug, Clone, Deserialize)]
pub struct FormatFileArgs {
    pub filepath: String,
}

pub async fn format_file(config: &ToolConfig, args: &FormatFileArgs) -> Result<String, ToolError> {
    if !Path::new(&args.filepath).is_file() {
        return Err(ToolError::execution(
            TOOL,
            anyhow!("{} is not a file", args.filepath),
        ));
    }

    tracing::info!(file = %args.filepath, "Formatting file");

    let mut cmd = Command::new(&config.prettier_bin);
    cmd.arg("--write").arg(&args.filepath);

    let output = run_with_timeout(&mut cmd, None, config.timeout)
        .await
        .map_err(|e| ToolError::execution(TOOL, e))?;

    if !output.status.success() {
        return Err(ToolError::execution(
            TOOL,
            anyhow!(
                "Prettier failed (exit code {}): {}",
                output.status.code().unwrap_or(-1),
                tail(&output.stderr, 2000)
            ),
        ));
    }

    Ok(format!("Formatted {} using Prettier.", args.filepath))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    use tempfile::TempDir;

    fn fake_prettier(dir: &TempDir, body: &str) -> ToolConfig {
        let bin = dir.path().join("fake-prettier");
        std::fs::write(&bin, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&bin, std::fs::Permissions::from_mode(0o755)).unwrap();
        let mut config = ToolConfig::new(dir.path().to_path_buf());
        config.prettier_bin = bin.to_string_lossy().into_owned();
        config
    }

    #[tokio::test]
    async fn passes_write_flag_and_path() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("README.md");
        std::fs::write(&target, "#  Title").unwrap();
        // Records its arguments into the target file.
        let config = fake_prettier(&dir, r#"echo "$1" > "$2""#);

        let result = format_file(
            &config,
            &FormatFileArgs {
                filepath: target.to_string_lossy().into_owned(),
            },
        )
        .await
        .expect("format");

        assert!(result.starts_with("Formatted "));
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "--write\n");
    }

    #[tokio::test]
    async fn non_zero_exit_is_execution_error() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("bad.js");
        std::fs::write(&target, "let = ;").unwrap();
        let config = fake_prettier(&dir, "echo 'SyntaxError' >&2; exit 2");

        let err = format_file(
            &config,
            &FormatFileArgs {
                filepath: target.to_string_lossy().into_owned(),
            },
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("SyntaxError"), "{err}");
    }

    #[tokio::test]
    async fn missing_file_is_rejected_before_spawning() {
        let dir = TempDir::new().unwrap();
        let config = ToolConfig::new(dir.path().to_path_buf());
        let err = format_file(
            &config,
            &FormatFileArgs {
                filepath: dir.path().join("nope.md").to_string_lossy().into_owned(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ToolError::Execution { .. }));
    }
}
