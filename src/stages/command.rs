use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tokio::process::Command;
use tokio::time::timeout;

/// How to start an external stage: a program plus any fixed leading
/// arguments (e.g. the script for an interpreter).
#[derive(Debug, Clone)]
pub struct Launcher {
    pub program: PathBuf,
    pub prefix: Vec<OsString>,
}

impl Launcher {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            prefix: Vec::new(),
        }
    }

    pub fn with_prefix(program: impl Into<PathBuf>, prefix: Vec<OsString>) -> Self {
        Self {
            program: program.into(),
            prefix,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error("failed to start {program:?}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{status}")]
    Exited {
        status: ExitStatus,
        stdout: String,
        stderr: String,
    },
    #[error("no result after {0:?}")]
    TimedOut(Duration),
    #[error("lost track of child process: {0}")]
    Wait(#[source] std::io::Error),
}

/// Captured output of a successful run
#[derive(Debug)]
pub struct StageOutput {
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

/// Run `launcher` with `args` and wait at most `limit` for it to exit.
///
/// A zero exit status is success. On timeout the child is killed when its
/// handle is dropped (`kill_on_drop`).
pub async fn run(
    label: &str,
    launcher: &Launcher,
    args: Vec<OsString>,
    limit: Duration,
) -> Result<StageOutput, StageError> {
    let started = Instant::now();

    let mut cmd = Command::new(&launcher.program);
    cmd.args(&launcher.prefix)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    tracing::debug!("{}: spawning {:?} {:?} {:?}", label, launcher.program, launcher.prefix, args);
    let child = cmd.spawn().map_err(|source| StageError::Spawn {
        program: launcher.program.clone(),
        source,
    })?;

    let output = match timeout(limit, child.wait_with_output()).await {
        Ok(result) => result.map_err(StageError::Wait)?,
        Err(_) => {
            tracing::error!("{}: no result after {:?}, killing child", label, limit);
            return Err(StageError::TimedOut(limit));
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    if !output.status.success() {
        tracing::error!("{}: {}", label, output.status);
        if !stdout.is_empty() {
            tracing::error!("{} stdout: {}", label, stdout.trim_end());
        }
        if !stderr.is_empty() {
            tracing::error!("{} stderr: {}", label, stderr.trim_end());
        }
        return Err(StageError::Exited {
            status: output.status,
            stdout,
            stderr,
        });
    }

    let elapsed = started.elapsed();
    tracing::debug!("{}: finished in {:?}", label, elapsed);
    if !stdout.is_empty() {
        tracing::debug!("{} stdout: {}", label, stdout.trim_end());
    }
    Ok(StageOutput {
        stdout,
        stderr,
        elapsed,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use std::path::Path;

    use super::*;
    use crate::workspace::tests::scratch_dir;

    /// Write a `/bin/sh` script that records each invocation in
    /// `<dir>/<name>.calls` before running `body`.
    pub(crate) fn counting_script(dir: &Path, name: &str, body: &str) -> Launcher {
        let script = dir.join(format!("{}.sh", name));
        let calls = dir.join(format!("{}.calls", name));
        std::fs::write(
            &script,
            format!("echo \"$@\" >> '{}'\n{}\n", calls.display(), body),
        )
        .unwrap();
        Launcher::with_prefix("/bin/sh", vec![script.into_os_string()])
    }

    /// Number of times a `counting_script` ran
    pub(crate) fn invocations(dir: &Path, name: &str) -> usize {
        std::fs::read_to_string(dir.join(format!("{}.calls", name)))
            .map(|s| s.lines().count())
            .unwrap_or(0)
    }

    #[tokio::test]
    async fn zero_exit_is_success() {
        let dir = scratch_dir("cmd-ok");
        let launcher = counting_script(&dir, "ok", "echo hello; echo warn >&2");
        let out = run("test", &launcher, vec!["a".into()], Duration::from_secs(10))
            .await
            .unwrap();
        assert_eq!(out.stdout.trim(), "hello");
        assert_eq!(out.stderr.trim(), "warn");
        assert_eq!(invocations(&dir, "ok"), 1);
    }

    #[tokio::test]
    async fn nonzero_exit_carries_both_streams() {
        let dir = scratch_dir("cmd-fail");
        let launcher = counting_script(
            &dir,
            "fail",
            "echo 'loading model'; echo 'model missing' >&2; exit 3",
        );
        let err = run("test", &launcher, vec![], Duration::from_secs(10))
            .await
            .unwrap_err();
        match err {
            StageError::Exited {
                status,
                stdout,
                stderr,
            } => {
                assert_eq!(status.code(), Some(3));
                assert_eq!(stdout.trim(), "loading model");
                assert!(stderr.contains("model missing"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    /// Alive and not yet a zombie, per `/proc/<pid>/stat`
    fn is_running(pid: &str) -> bool {
        match std::fs::read_to_string(format!("/proc/{}/stat", pid)) {
            Ok(stat) => stat
                .rsplit(')')
                .next()
                .is_some_and(|rest| !rest.trim_start().starts_with('Z')),
            Err(_) => false,
        }
    }

    #[tokio::test]
    async fn slow_child_times_out_and_is_killed() {
        let dir = scratch_dir("cmd-slow");
        let pid_file = dir.join("pid");
        let launcher = counting_script(
            &dir,
            "slow",
            &format!("echo $$ > '{}'\nexec sleep 5", pid_file.display()),
        );
        let started = Instant::now();
        let err = run("test", &launcher, vec![], Duration::from_millis(300))
            .await
            .unwrap_err();
        assert!(matches!(err, StageError::TimedOut(d) if d == Duration::from_millis(300)));
        assert!(started.elapsed() < Duration::from_secs(4));

        let pid = std::fs::read_to_string(&pid_file).unwrap();
        let pid = pid.trim();
        let deadline = Instant::now() + Duration::from_secs(2);
        while is_running(pid) && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(!is_running(pid), "child {pid} outlived its timeout");
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let launcher = Launcher::new("/nonexistent/cutout-api/tool");
        let err = run("test", &launcher, vec![], Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, StageError::Spawn { .. }));
    }
}
