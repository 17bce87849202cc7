//! Child process execution with an optional deadline.

use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::service::{ServiceError, ServiceResult};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Captured result of a finished child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code; `-1` when the process was ended by a signal.
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// Run `program` with `args`, capturing stdout and stderr.
///
/// With a `timeout`, the child is killed once the deadline passes and
/// [`ServiceError::Timeout`] is returned. Both pipes are drained on helper
/// threads while the parent waits.
pub fn run(program: &Path, args: &[String], timeout: Option<Duration>) -> ServiceResult<ProcessOutput> {
    let tool = program.display().to_string();
    debug!(%tool, ?args, "Running");

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| ServiceError::Spawn {
            tool: tool.clone(),
            source,
        })?;

    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let status = match timeout {
        Some(limit) => match wait_until(&mut child, Instant::now() + limit) {
            Ok(Some(status)) => status,
            Ok(None) => {
                warn!(%tool, timeout_secs = limit.as_secs(), "Killing process after timeout");
                let _ = child.kill();
                let _ = child.wait();
                return Err(ServiceError::Timeout {
                    tool,
                    timeout: limit,
                });
            }
            Err(source) => return Err(ServiceError::Spawn { tool, source }),
        },
        None => child
            .wait()
            .map_err(|source| ServiceError::Spawn {
                tool: tool.clone(),
                source,
            })?,
    };

    Ok(ProcessOutput {
        code: status.code().unwrap_or(-1),
        stdout: collect(stdout),
        stderr: collect(stderr),
    })
}

fn wait_until(
    child: &mut Child,
    deadline: Instant,
) -> std::io::Result<Option<std::process::ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<Vec<u8>>> {
    pipe.map(|mut reader| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = reader.read_to_end(&mut buf);
            buf
        })
    })
}

fn collect(handle: Option<JoinHandle<Vec<u8>>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}
