//! Thin wrappers around the two external binaries the CLI shells out to: the 3D-city
//! importer (bulk file import into the `lod2`/`lod3` schemas) and the DBMS CLI (CSV
//! bulk-copy of TABULA reference tables). Both are explicitly out of scope for the
//! core's own logic (spec §1/§6) — these exist only so `--create-db`/`--reset-citydb`
//! have something to invoke. Grounded on the teacher's `async-process`-based child
//! process handling, since `tokio`'s own `process` feature carries a known bug the
//! teacher works around the same way.
use anyhow::Context;
use futures::io::{AsyncBufReadExt, AsyncRead, BufReader};
use futures::StreamExt;

/// Runs `cmd` to completion, capturing and forwarding its stdout/stderr lines to
/// `tracing` rather than letting them bypass the log sink (spec §7: "no partial
/// results are hidden").
pub async fn run_capturing(name: &str, cmd: &mut async_process::Command) -> anyhow::Result<()> {
    cmd.stdout(std::process::Stdio::piped());
    cmd.stderr(std::process::Stdio::piped());

    tracing::debug!(program = ?cmd.get_program(), "invoking external tool {name}");

    let mut child = cmd.spawn().with_context(|| format!("failed to spawn {name}"))?;
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let out = async {
        if let Some(stdout) = stdout {
            forward_lines(name, "stdout", stdout).await;
        }
    };
    let err = async {
        if let Some(stderr) = stderr {
            forward_lines(name, "stderr", stderr).await;
        }
    };
    let wait = child.status();

    let (_, _, status) = futures::join!(out, err, wait);
    let status = status.with_context(|| format!("failed waiting on {name}"))?;
    anyhow::ensure!(status.success(), "{name} exited with {status}");
    Ok(())
}

async fn forward_lines(name: &str, stream: &str, reader: impl AsyncRead + Unpin) {
    let mut lines = BufReader::new(reader).lines();
    while let Some(Ok(line)) = lines.next().await {
        tracing::info!(tool = name, stream, "{line}");
    }
}
