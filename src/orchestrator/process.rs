//! Running the watched command.

use crate::error::ExecutionError;
use crate::orchestrator::signal::StopSignal;
use async_trait::async_trait;
use std::io;
use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::mpsc;

/// Runs a command to completion and returns its combined output.
///
/// Implementations must give up promptly once `stop` fires, returning
/// [`ExecutionError::Cancelled`].
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, argv: &[String], stop: &StopSignal) -> Result<String, ExecutionError>;
}

/// Spawns the command as a child process.
///
/// stdin is detached (the TUI owns the terminal), stdout and stderr are merged
/// in the order chunks arrive. The child is killed if the stop signal fires
/// mid-run.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, argv: &[String], stop: &StopSignal) -> Result<String, ExecutionError> {
        let command = argv.join(" ");
        let Some((program, args)) = argv.split_first() else {
            return Err(ExecutionError::Spawn {
                command,
                source: io::Error::new(io::ErrorKind::InvalidInput, "empty command"),
            });
        };

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ExecutionError::Spawn {
                command: command.clone(),
                source,
            })?;
        tracing::debug!(pid = child.id(), %command, "command started");

        let (chunk_tx, mut chunk_rx) = mpsc::unbounded_channel::<io::Result<Vec<u8>>>();
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(pump(stdout, chunk_tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(pump(stderr, chunk_tx.clone()));
        }
        drop(chunk_tx);

        let finished = async {
            let mut combined = Vec::new();
            let mut read_err = None;
            while let Some(chunk) = chunk_rx.recv().await {
                match chunk {
                    Ok(bytes) => combined.extend_from_slice(&bytes),
                    Err(e) => {
                        read_err.get_or_insert(e);
                    }
                }
            }
            // A truncated capture is not a successful run.
            let status = match read_err {
                Some(e) => Err(e),
                None => child.wait().await,
            };
            (status, combined)
        };

        tokio::select! {
            (status, combined) = finished => {
                let status = status.map_err(|source| ExecutionError::Io {
                    command: command.clone(),
                    source,
                })?;
                let output = String::from_utf8_lossy(&combined).into_owned();
                if status.success() {
                    Ok(output)
                } else {
                    Err(ExecutionError::Failed { command, status, output })
                }
            }
            _ = stop.cancelled() => {
                // `child` is dropped on return; kill_on_drop takes it down.
                tracing::debug!(%command, "command cancelled");
                Err(ExecutionError::Cancelled)
            }
        }
    }
}

/// Forward everything read from `reader` until EOF. A read error is
/// forwarded too and ends the stream.
async fn pump<R>(mut reader: R, tx: mpsc::UnboundedSender<io::Result<Vec<u8>>>)
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; 8192];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                if tx.send(Ok(buf[..n].to_vec())).is_err() {
                    break;
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "reading command output failed");
                let _ = tx.send(Err(e));
                break;
            }
        }
    }
}
