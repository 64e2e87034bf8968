// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! External renderer invocation.
//!
//! The renderer is an opaque executable called once per image as
//! `program [args..] <config> <camera file> <scene> <output dir>`.

use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::error::{Error, Result};

/// Files handed to one renderer run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderJob {
    pub config: PathBuf,
    pub camera: PathBuf,
    pub scene: PathBuf,
    pub output: PathBuf,
}

/// Blocking renderer stage with timeout and bounded retries
#[derive(Debug, Clone)]
pub struct RendererStage {
    pub program: PathBuf,
    /// Arguments placed before the job paths (e.g. a runner script)
    pub args: Vec<String>,
    pub timeout: Duration,
    /// Additional attempts after the first failure
    pub retries: u32,
    pub poll_interval: Duration,
}

impl RendererStage {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: Duration::from_secs(3600),
            retries: 0,
            poll_interval: Duration::from_millis(100),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    fn command(&self, job: &RenderJob) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg(&job.config)
            .arg(&job.camera)
            .arg(&job.scene)
            .arg(&job.output);
        cmd
    }

    /// Run the renderer for `job`, retrying failed attempts.
    pub fn render(&self, job: &RenderJob) -> Result<()> {
        let attempts = self.retries + 1;
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            debug!(attempt, output = %job.output.display(), "Starting renderer");
            match self.run_once(job) {
                Ok(status) if status.success() => {
                    info!(output = %job.output.display(), "Render finished");
                    return Ok(());
                }
                Ok(status) => last_error = format!("renderer exited with {}", status),
                Err(message) => last_error = message,
            }
            warn!(attempt, attempts, error = %last_error, "Render attempt failed");
        }

        Err(Error::Render {
            attempts,
            message: last_error,
        })
    }

    fn run_once(&self, job: &RenderJob) -> std::result::Result<ExitStatus, String> {
        let mut child = self
            .command(job)
            .spawn()
            .map_err(|e| format!("failed to start {}: {}", self.program.display(), e))?;
        self.wait_with_timeout(&mut child)
    }

    fn wait_with_timeout(&self, child: &mut Child) -> std::result::Result<ExitStatus, String> {
        let started = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) if started.elapsed() >= self.timeout => {
                    // kill can fail if the child exited in between; reap either way
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(format!("renderer timed out after {:?}", self.timeout));
                }
                Ok(None) => thread::sleep(self.poll_interval),
                Err(e) => return Err(format!("failed to wait for renderer: {}", e)),
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn job(dir: &std::path::Path) -> RenderJob {
        RenderJob {
            config: dir.join("config.yaml"),
            camera: dir.join("cam_pos.txt"),
            scene: dir.join("scene.json"),
            output: dir.join("output0"),
        }
    }

    #[test]
    fn test_successful_render() {
        let dir = tempfile::tempdir().unwrap();
        RendererStage::new("true").render(&job(dir.path())).unwrap();
    }

    #[test]
    fn test_failure_counts_attempts() {
        let dir = tempfile::tempdir().unwrap();
        let err = RendererStage::new("false")
            .with_retries(2)
            .render(&job(dir.path()))
            .unwrap_err();
        match err {
            Error::Render { attempts, .. } => assert_eq!(attempts, 3),
            other => panic!("Expected render error, got {:?}", other),
        }
    }

    #[test]
    fn test_job_paths_follow_args() {
        let dir = tempfile::tempdir().unwrap();
        let job = job(dir.path());
        // `sh -c 'script' argv0 args..`: the script sees the job paths as $1..$4
        RendererStage::new("sh")
            .with_args(["-c", "mkdir -p \"$4\" && cp \"$1\" \"$4/config\"", "render"])
            .render(&RenderJob {
                config: dir.path().join("in.yaml"),
                ..job.clone()
            })
            .unwrap_err();

        std::fs::write(dir.path().join("in.yaml"), "version: 3").unwrap();
        RendererStage::new("sh")
            .with_args(["-c", "mkdir -p \"$4\" && cp \"$1\" \"$4/config\"", "render"])
            .render(&RenderJob {
                config: dir.path().join("in.yaml"),
                ..job.clone()
            })
            .unwrap();
        let copied = std::fs::read_to_string(job.output.join("config")).unwrap();
        assert_eq!(copied, "version: 3");
    }

    #[test]
    fn test_timeout_kills_renderer() {
        let dir = tempfile::tempdir().unwrap();
        let started = Instant::now();
        let err = RendererStage::new("sh")
            .with_args(["-c", "sleep 30", "render"])
            .with_timeout(Duration::from_millis(200))
            .render(&job(dir.path()))
            .unwrap_err();
        assert!(matches!(err, Error::Render { attempts: 1, .. }));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_missing_program_is_render_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = RendererStage::new(dir.path().join("no-such-renderer"))
            .render(&job(dir.path()))
            .unwrap_err();
        assert!(matches!(err, Error::Render { .. }));
    }
}
