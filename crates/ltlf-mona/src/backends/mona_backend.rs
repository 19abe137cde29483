use std::io::{self, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, warn};
use wait_timeout::ChildExt;

use crate::program::MonaProgram;
use crate::solver::{MsoSolver, Verdict};

#[derive(Debug, Error)]
pub enum MonaError {
    #[error("MONA executable not found: {0}")]
    NotFound(String),
    #[error("MONA I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("MONA exited with status {status}: {stderr}")]
    Failed { status: i32, stderr: String },
    #[error("MONA timed out after {0:?}")]
    Timeout(Duration),
    #[error("Failed to parse MONA output: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonaConfig {
    pub command: PathBuf,
    /// Passed before the program file.
    pub args: Vec<String>,
    /// `None` waits for as long as MONA runs.
    pub timeout: Option<Duration>,
}

impl Default for MonaConfig {
    fn default() -> Self {
        Self {
            command: PathBuf::from("mona"),
            args: vec!["-q".to_string()],
            timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl MonaConfig {
    pub fn with_command(mut self, command: impl Into<PathBuf>) -> Self {
        self.command = command.into();
        self
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn without_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }
}

/// Runs the `mona` executable on programs written to temporary files.
#[derive(Debug, Clone, Default)]
pub struct MonaBackend {
    config: MonaConfig,
}

impl MonaBackend {
    pub fn new(config: MonaConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MonaConfig {
        &self.config
    }

    /// Decide the program stored at `path`.
    pub fn check_file(&self, path: &Path) -> Result<Verdict, MonaError> {
        let started = Instant::now();
        let output = self.run(path)?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() {
            return Err(MonaError::Failed {
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        let verdict = parse_verdict(&stdout)?;
        debug!(%verdict, elapsed = ?started.elapsed(), "MONA finished");
        Ok(verdict)
    }

    fn run(&self, path: &Path) -> Result<Output, MonaError> {
        let mut cmd = Command::new(&self.config.command);
        cmd.args(&self.config.args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        info!(command = %self.config.command.display(), file = %path.display(), "spawning MONA");
        let mut child = cmd.spawn().map_err(|e| match e.kind() {
            ErrorKind::NotFound => MonaError::NotFound(self.config.command.display().to_string()),
            _ => MonaError::Io(e),
        })?;

        // Both pipes are drained while waiting; a full pipe would stall MONA.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = match self.config.timeout {
            None => child.wait()?,
            Some(timeout) => match child.wait_timeout(timeout)? {
                Some(status) => status,
                None => {
                    warn!(?timeout, "MONA timed out; killing it");
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(MonaError::Timeout(timeout));
                }
            },
        };
        Ok(Output {
            status,
            stdout: collect(stdout)?,
            stderr: collect(stderr)?,
        })
    }
}

type Reader = JoinHandle<io::Result<Vec<u8>>>;

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Reader {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            pipe.read_to_end(&mut buf)?;
        }
        Ok(buf)
    })
}

fn collect(reader: Reader) -> Result<Vec<u8>, MonaError> {
    match reader.join() {
        Ok(bytes) => Ok(bytes?),
        Err(_) => Err(MonaError::Io(io::Error::other("MONA output reader panicked"))),
    }
}

impl MsoSolver for MonaBackend {
    type Error = MonaError;

    fn check(&mut self, program: &MonaProgram) -> Result<Verdict, MonaError> {
        let mut file = tempfile::Builder::new()
            .prefix("ltlf-")
            .suffix(".mona")
            .tempfile()?;
        write!(file, "{program}")?;
        file.flush()?;
        let result = self.check_file(file.path());
        let _ = file.close();
        result
    }
}

/// Read the verdict line of `mona -q` output.
///
/// Valid and unsatisfiable programs are reported directly; anything else
/// comes with a satisfying example.
pub fn parse_verdict(stdout: &str) -> Result<Verdict, MonaError> {
    if stdout.contains("Formula is valid") {
        Ok(Verdict::Valid)
    } else if stdout.contains("Formula is unsatisfiable") {
        Ok(Verdict::Unsatisfiable)
    } else if stdout.contains("satisfying example") {
        Ok(Verdict::Satisfiable)
    } else {
        let first = stdout.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
        Err(MonaError::Parse(format!("no verdict in output (first line: {first:?})")))
    }
}
