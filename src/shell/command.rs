//! Installer script invocation.

use crate::error::{MonitorkitError, Result};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

/// How often a timed run checks whether the child has exited.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How long to keep reading output once the script has exited.
const OUTPUT_GRACE: Duration = Duration::from_millis(500);

/// Captured result of one script run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptOutput {
    /// Exit code (None if killed by signal).
    pub exit_code: Option<i32>,

    /// Standard output.
    pub stdout: String,

    /// Standard error.
    pub stderr: String,
}

impl ScriptOutput {
    /// Create a result with the given exit code and no output.
    pub fn with_code(code: i32) -> Self {
        Self {
            exit_code: Some(code),
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    /// Whether the script exited with code 0.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Stdout and stderr joined by a newline, trimmed.
    pub fn combined_output(&self) -> String {
        format!("{}\n{}", self.stdout.trim_end(), self.stderr.trim_end())
            .trim()
            .to_string()
    }
}

/// Runs a named installer script with positional arguments.
///
/// Implementations return `Err` only when the script could not be run to
/// completion (missing, not executable, timed out). A non-zero exit is a
/// normal `Ok` result.
pub trait ScriptRunner {
    fn run(&mut self, script: &str, args: &[String]) -> Result<ScriptOutput>;
}

/// Runs scripts from a fixed directory as direct child processes.
///
/// Arguments are passed without a shell, so they need no quoting.
#[derive(Debug, Clone)]
pub struct SbinScriptRunner {
    scripts_dir: PathBuf,
    timeout: Option<Duration>,
}

impl SbinScriptRunner {
    /// Create a runner for scripts in `scripts_dir`.
    pub fn new(scripts_dir: impl Into<PathBuf>) -> Self {
        Self {
            scripts_dir: scripts_dir.into(),
            timeout: None,
        }
    }

    /// Kill scripts that run longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Directory scripts are resolved against.
    pub fn scripts_dir(&self) -> &Path {
        &self.scripts_dir
    }

    fn wait(&self, script: &str, child: &mut Child) -> Result<ExitStatus> {
        let Some(timeout) = self.timeout else {
            return child.wait().map_err(|e| spawn_error(script, e));
        };

        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = child.try_wait().map_err(|e| spawn_error(script, e))? {
                return Ok(status);
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                return Err(MonitorkitError::ScriptTimedOut {
                    script: script.to_string(),
                    seconds: timeout.as_secs(),
                });
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl ScriptRunner for SbinScriptRunner {
    fn run(&mut self, script: &str, args: &[String]) -> Result<ScriptOutput> {
        let path = self.scripts_dir.join(script);
        tracing::debug!("Running {} with {} argument(s)", path.display(), args.len());

        let mut child = Command::new(&path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| spawn_error(script, e))?;

        // Drain both pipes on their own threads so a chatty script cannot
        // block on a full pipe while we wait for it.
        let (tx, rx) = mpsc::channel();
        if let Some(out) = child.stdout.take() {
            drain(out, Stream::Stdout, tx.clone());
        }
        if let Some(err) = child.stderr.take() {
            drain(err, Stream::Stderr, tx.clone());
        }
        drop(tx);

        let status = self.wait(script, &mut child)?;
        let (stdout, stderr) = collect(&rx, Instant::now() + OUTPUT_GRACE);

        tracing::debug!("{} exited with {:?}", script, status.code());

        Ok(ScriptOutput {
            exit_code: status.code(),
            stdout,
            stderr,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Stdout,
    Stderr,
}

fn drain<R: Read + Send + 'static>(
    mut reader: R,
    stream: Stream,
    tx: Sender<(Stream, Vec<u8>)>,
) {
    thread::spawn(move || {
        let mut buf = [0u8; 4096];
        loop {
            match reader.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    if tx.send((stream, buf[..n].to_vec())).is_err() {
                        break;
                    }
                }
            }
        }
    });
}

/// Gather output until both pipes close or `until` passes.
///
/// A background process started by the script can inherit the pipes and
/// keep them open after the script itself has exited; its output is dropped.
fn collect(rx: &Receiver<(Stream, Vec<u8>)>, until: Instant) -> (String, String) {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();

    loop {
        match rx.recv_timeout(until.saturating_duration_since(Instant::now())) {
            Ok((Stream::Stdout, chunk)) => stdout.extend_from_slice(&chunk),
            Ok((Stream::Stderr, chunk)) => stderr.extend_from_slice(&chunk),
            Err(RecvTimeoutError::Timeout) => {
                tracing::debug!("Output pipes still open after exit, not waiting further");
                break;
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    (
        String::from_utf8_lossy(&stdout).into_owned(),
        String::from_utf8_lossy(&stderr).into_owned(),
    )
}

fn spawn_error(script: &str, err: std::io::Error) -> MonitorkitError {
    MonitorkitError::ScriptSpawnFailed {
        script: script.to_string(),
        message: err.to_string(),
    }
}
