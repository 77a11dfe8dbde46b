//! Boundary to the external aeroelastic solver process.
//!
//! The solver is a black box: it receives a bulk-data file inside a working
//! directory and is expected to leave a result listing (`<stem>.f06`) next to
//! it. [`SolverRunner`] is the seam the analyzer calls; [`ProcessRunner`]
//! spawns a real executable with a bounded timeout.

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Interval between exit checks while the solver runs
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Stdout fragments that mark coarse solver progress
const PROGRESS_MARKERS: [&str; 5] = [
    "BEGIN",
    "EIGENVALUE",
    "FLUTTER",
    "FATAL",
    "END OF JOB",
];

#[derive(Error, Debug)]
pub enum ExternalSolverError {
    #[error("solver executable not found: {0}")]
    ExecutableNotFound(PathBuf),

    #[error("bulk-data file not found: {0}")]
    InputNotFound(PathBuf),

    #[error("solver exited with status {}", .code.map_or("unknown".to_string(), |c| c.to_string()))]
    NonZeroExit { code: Option<i32> },

    #[error("solver did not finish within {secs} s and was killed")]
    Timeout { secs: u64 },

    #[error("solver finished but produced no result listing at {0}")]
    MissingOutput(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// How to launch the solver. The bulk-data file name is appended to `args`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverInvocation {
    pub executable: PathBuf,
    pub args: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for SolverInvocation {
    fn default() -> Self {
        Self {
            executable: PathBuf::from("nastran"),
            args: vec!["scr=yes".to_string(), "batch=no".to_string()],
            timeout_secs: 3600,
        }
    }
}

/// Outcome of one solver run.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverRun {
    pub listing: PathBuf,
    /// Stdout lines that matched a progress marker
    pub progress: Vec<String>,
    pub elapsed: Duration,
}

pub trait SolverRunner: Send + Sync {
    /// Runs the solver on `bulk_data` inside `work_dir` and blocks until the
    /// result listing exists or the run fails.
    fn run(&self, bulk_data: &Path, work_dir: &Path) -> Result<SolverRun, ExternalSolverError>;
}

/// Result listing the solver writes for `bulk_data` inside `work_dir`.
pub fn listing_path(bulk_data: &Path, work_dir: &Path) -> PathBuf {
    let stem = bulk_data
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "job".to_string());
    work_dir.join(format!("{stem}.f06"))
}

pub struct ProcessRunner {
    invocation: SolverInvocation,
}

impl ProcessRunner {
    pub fn new(invocation: SolverInvocation) -> Self {
        Self { invocation }
    }

    pub fn invocation(&self) -> &SolverInvocation {
        &self.invocation
    }
}

impl SolverRunner for ProcessRunner {
    fn run(&self, bulk_data: &Path, work_dir: &Path) -> Result<SolverRun, ExternalSolverError> {
        if !bulk_data.is_file() {
            return Err(ExternalSolverError::InputNotFound(bulk_data.to_path_buf()));
        }
        let file_name = bulk_data
            .file_name()
            .ok_or_else(|| ExternalSolverError::InputNotFound(bulk_data.to_path_buf()))?;

        let started = Instant::now();
        let mut child = Command::new(&self.invocation.executable)
            .args(&self.invocation.args)
            .arg(file_name)
            .current_dir(work_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|err| match err.kind() {
                std::io::ErrorKind::NotFound => {
                    ExternalSolverError::ExecutableNotFound(self.invocation.executable.clone())
                }
                _ => ExternalSolverError::Io(err),
            })?;

        // Drained on its own thread so a chatty solver never blocks on a full pipe.
        let scanner = child.stdout.take().map(|stdout| {
            thread::spawn(move || {
                BufReader::new(stdout)
                    .lines()
                    .map_while(|line| line.ok())
                    .filter(|line| PROGRESS_MARKERS.iter().any(|m| line.contains(m)))
                    .map(|line| line.trim().to_string())
                    .collect::<Vec<_>>()
            })
        });

        let timeout = Duration::from_secs(self.invocation.timeout_secs);
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if started.elapsed() >= timeout {
                let killed = child.kill().and_then(|()| child.wait());
                // the pipe closes with the child, so the scanner finishes
                if let Some(handle) = scanner {
                    let _ = handle.join();
                }
                killed?;
                return Err(ExternalSolverError::Timeout {
                    secs: self.invocation.timeout_secs,
                });
            }
            thread::sleep(POLL_INTERVAL);
        };

        let progress = scanner
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();
        if !status.success() {
            return Err(ExternalSolverError::NonZeroExit {
                code: status.code(),
            });
        }

        let listing = listing_path(bulk_data, work_dir);
        if !listing.is_file() {
            return Err(ExternalSolverError::MissingOutput(listing));
        }
        Ok(SolverRun {
            listing,
            progress,
            elapsed: started.elapsed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_sits_next_to_the_deck() {
        let path = listing_path(Path::new("/tmp/run/panel.bdf"), Path::new("/tmp/run"));
        assert_eq!(path, PathBuf::from("/tmp/run/panel.f06"));
    }

    #[test]
    fn missing_input_is_reported_before_spawning() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ProcessRunner::new(SolverInvocation::default());
        let err = runner
            .run(&dir.path().join("absent.bdf"), dir.path())
            .unwrap_err();
        assert!(matches!(err, ExternalSolverError::InputNotFound(_)));
    }

    #[test]
    fn missing_executable_is_a_typed_error() {
        let dir = tempfile::tempdir().unwrap();
        let deck = dir.path().join("panel.bdf");
        std::fs::write(&deck, "ENDDATA\n").unwrap();
        let runner = ProcessRunner::new(SolverInvocation {
            executable: PathBuf::from("definitely-not-a-flutter-solver"),
            args: Vec::new(),
            timeout_secs: 5,
        });
        let err = runner.run(&deck, dir.path()).unwrap_err();
        assert!(matches!(err, ExternalSolverError::ExecutableNotFound(_)));
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_and_missing_output() {
        let dir = tempfile::tempdir().unwrap();
        let deck = dir.path().join("panel.bdf");
        std::fs::write(&deck, "ENDDATA\n").unwrap();

        let failing = ProcessRunner::new(SolverInvocation {
            executable: PathBuf::from("sh"),
            args: vec!["-c".to_string(), "exit 3".to_string()],
            timeout_secs: 10,
        });
        assert!(matches!(
            failing.run(&deck, dir.path()),
            Err(ExternalSolverError::NonZeroExit { code: Some(3) })
        ));

        let silent = ProcessRunner::new(SolverInvocation {
            executable: PathBuf::from("sh"),
            args: vec!["-c".to_string(), "echo BEGIN".to_string()],
            timeout_secs: 10,
        });
        assert!(matches!(
            silent.run(&deck, dir.path()),
            Err(ExternalSolverError::MissingOutput(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn slow_solver_is_killed_on_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let deck = dir.path().join("panel.bdf");
        std::fs::write(&deck, "ENDDATA\n").unwrap();
        let runner = ProcessRunner::new(SolverInvocation {
            executable: PathBuf::from("sh"),
            args: vec!["-c".to_string(), "exec sleep 30".to_string()],
            timeout_secs: 0,
        });
        let started = Instant::now();
        assert!(matches!(
            runner.run(&deck, dir.path()),
            Err(ExternalSolverError::Timeout { secs: 0 })
        ));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[cfg(unix)]
    #[test]
    fn timeout_waits_for_output_scanner() {
        let dir = tempfile::tempdir().unwrap();
        let deck = dir.path().join("panel.bdf");
        std::fs::write(&deck, "ENDDATA\n").unwrap();
        let runner = ProcessRunner::new(SolverInvocation {
            executable: PathBuf::from("sh"),
            args: vec!["-c".to_string(), "echo 'BEGIN RUN'; exec sleep 30".to_string()],
            timeout_secs: 1,
        });
        let started = Instant::now();
        assert!(matches!(
            runner.run(&deck, dir.path()),
            Err(ExternalSolverError::Timeout { secs: 1 })
        ));
        // returning at all means the scanner saw end of stream and was joined
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[cfg(unix)]
    #[test]
    fn successful_run_reports_listing_and_progress() {
        let dir = tempfile::tempdir().unwrap();
        let deck = dir.path().join("panel.bdf");
        std::fs::write(&deck, "ENDDATA\n").unwrap();
        // `sh -c script name deck` binds the deck to $1
        let runner = ProcessRunner::new(SolverInvocation {
            executable: PathBuf::from("sh"),
            args: vec![
                "-c".to_string(),
                "echo 'BEGIN RUN'; echo noise; echo 'END OF JOB' > \"${1%.bdf}.f06\"; echo 'END OF JOB'"
                    .to_string(),
                "solver".to_string(),
            ],
            timeout_secs: 10,
        });
        let run = runner.run(&deck, dir.path()).unwrap();
        assert_eq!(run.listing, dir.path().join("panel.f06"));
        assert_eq!(run.progress, vec!["BEGIN RUN", "END OF JOB"]);
    }
}
