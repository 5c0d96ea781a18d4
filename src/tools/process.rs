//! Subprocess execution with a wall-clock limit.

use std::io::ErrorKind;
use std::process::{Output, Stdio};
use std::time::Duration;

use anyhow::anyhow;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Search path handed to children whose environment has been cleared.
pub const SAFE_PATH: &str = "/usr/local/bin:/usr/bin:/bin";

/// Spawn `cmd`, feed it `stdin`, and collect its output.
///
/// Feeding stdin counts against `timeout` too. The child is killed if it
/// outlives it. A child that exits without reading all of its input is not
/// an error; its own exit status and stderr are returned.
pub async fn run_with_timeout(
    cmd: &mut Command,
    stdin: Option<&[u8]>,
    timeout: Duration,
) -> anyhow::Result<Output> {
    let program = cmd.as_std().get_program().to_string_lossy().into_owned();

    cmd.stdin(if stdin.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    })
    .stdout(Stdio::piped())
    .stderr(Stdio::piped())
    .kill_on_drop(true);

    let mut child = cmd.spawn().map_err(|e| match e.kind() {
        ErrorKind::NotFound => anyhow!("{} is not installed or not on PATH", program),
        _ => anyhow!("Failed to start {}: {}", program, e),
    })?;

    let pipe = child.stdin.take();
    let feed = async move {
        if let (Some(input), Some(mut pipe)) = (stdin, pipe) {
            match pipe.write_all(input).await {
                Err(e) if e.kind() != ErrorKind::BrokenPipe => return Err(e),
                _ => {}
            }
            // Dropping the pipe closes the child's stdin.
        }
        Ok(())
    };

    let (fed, output) = tokio::time::timeout(timeout, async move {
        tokio::join!(feed, child.wait_with_output())
    })
    .await
    .map_err(|_| anyhow!("{} timed out after {} seconds", program, timeout.as_secs()))?;

    let output = output.map_err(|e| anyhow!("Failed to wait for {}: {}", program, e))?;
    fed.map_err(|e| anyhow!("Failed to write stdin of {}: {}", program, e))?;
    Ok(output)
}

/// Last `max_len` bytes of a process stream, for error messages.
pub fn tail(bytes: &[u8], max_len: usize) -> String {
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim();
    if text.len() <= max_len {
        return text.to_string();
    }
    let mut start = text.len() - max_len;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    format!("... {}", &text[start..])
}
