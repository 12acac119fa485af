// crates/render/src/supervisor.rs
//! Spawning and supervision of the external rendering executable.
//!
//! One supervisor task owns each spawned `Child` exclusively. Stdout is
//! pumped in raw chunks through the [`ProgressExtractor`] and into a
//! bounded diagnostic tail; stderr is retained verbatim. On exit the
//! task resolves the job to a single terminal event — unless the job
//! was cancelled first, in which case the late exit notification is
//! dropped (the registry entry is already gone and cancellation already
//! published the terminal event).

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use animatic_types::{CancelResponse, JobId, RenderEvent, RenderJob};
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::sync::oneshot;

use crate::bridge::EventBridge;
use crate::progress::ProgressExtractor;
use crate::registry::{JobEntry, JobRegistry, RegistryError};

/// How much trailing stdout is retained for failure diagnostics.
const STDOUT_TAIL_CHARS: usize = 1000;

#[derive(Debug, Error)]
pub enum StartRenderError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// How the external renderer is invoked.
///
/// `program` plus any fixed leading `args` (the packaged build ships the
/// renderer as a script run by a bundled interpreter), followed by the
/// job's input and output paths as positional arguments.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl RendererConfig {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Resolve the renderer from `ANIMATIC_RENDERER`, falling back to a
    /// `animatic-renderer` on the PATH.
    pub fn from_env() -> Self {
        let program = std::env::var_os("ANIMATIC_RENDERER")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("animatic-renderer"));
        Self::new(program)
    }
}

/// Outcome of a cancellation request. `NotFound` is informational, not
/// an error: the job either never existed or already resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    Cancelled,
    NotFound,
}

impl From<CancelOutcome> for CancelResponse {
    fn from(outcome: CancelOutcome) -> Self {
        match outcome {
            CancelOutcome::Cancelled => CancelResponse {
                success: true,
                error: None,
            },
            CancelOutcome::NotFound => CancelResponse {
                success: false,
                error: Some("Process not found".to_string()),
            },
        }
    }
}

/// Orchestrates render jobs: spawns the renderer, tracks live jobs in
/// the registry, and publishes lifecycle events on the bridge.
pub struct RenderManager {
    registry: Arc<JobRegistry>,
    bridge: EventBridge,
    renderer: RendererConfig,
}

impl RenderManager {
    pub fn new(renderer: RendererConfig) -> Self {
        Self {
            registry: Arc::new(JobRegistry::new()),
            bridge: EventBridge::default(),
            renderer,
        }
    }

    /// The registry of live jobs.
    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    /// Subscribe to progress and terminal events for all jobs.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<RenderEvent> {
        self.bridge.subscribe()
    }

    /// Start a render for `job`.
    ///
    /// The job is registered before the process produces any output. A
    /// duplicate id is rejected to the caller with no side effects; a
    /// spawn failure is reported as a terminal `Error` event (not to the
    /// caller), matching how every other fault resolves a job.
    pub fn start_render(&self, job: RenderJob) -> Result<(), StartRenderError> {
        let (kill_tx, kill_rx) = oneshot::channel();
        self.registry
            .register(job.id.clone(), JobEntry::new(kill_tx))?;

        let mut command = Command::new(&self.renderer.program);
        command
            .args(&self.renderer.args)
            .arg(&job.input_path)
            .arg(&job.output_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                self.registry.deregister(&job.id);
                tracing::error!(job_id = %job.id, error = %e, "failed to spawn renderer");
                self.bridge.publish(RenderEvent::Error {
                    job_id: job.id,
                    error: format!("Spawn error: {e}"),
                });
                return Ok(());
            }
        };

        tracing::info!(
            job_id = %job.id,
            pid = child.id(),
            input = %job.input_path.display(),
            output = %job.output_path.display(),
            "render started"
        );

        let registry = Arc::clone(&self.registry);
        let bridge = self.bridge.clone();
        tokio::spawn(supervise(registry, bridge, job, child, kill_rx));
        Ok(())
    }

    /// Cancel a live job.
    ///
    /// Deregisters immediately and unconditionally, signals the process
    /// best-effort, and publishes the job's single terminal event. The
    /// process's own later exit notification finds no registry entry and
    /// is dropped by the supervisor.
    pub fn cancel(&self, job_id: &str) -> CancelOutcome {
        match self.registry.deregister(job_id) {
            Some(entry) => {
                if !entry.kill() {
                    // Supervisor already past its select; its exit path
                    // will see the missing entry and stay silent.
                    tracing::debug!(%job_id, "cancel raced process exit");
                }
                tracing::info!(%job_id, "render cancelled");
                self.bridge.publish(RenderEvent::Error {
                    job_id: job_id.to_string(),
                    error: "Render cancelled".to_string(),
                });
                CancelOutcome::Cancelled
            }
            None => {
                tracing::debug!(%job_id, "cancel for unknown job");
                CancelOutcome::NotFound
            }
        }
    }

    /// Terminate every live job, idempotently. Invoked on application
    /// exit and when the last window closes. Individual kill failures
    /// are logged and swallowed so one stuck process cannot block the
    /// rest of teardown.
    pub fn shutdown_all(&self) {
        let drained = self.registry.drain();
        if drained.is_empty() {
            return;
        }
        tracing::info!(count = drained.len(), "terminating live renders");
        for (job_id, entry) in drained {
            if !entry.kill() {
                tracing::warn!(%job_id, "render process already gone at shutdown");
            }
            self.bridge.publish(RenderEvent::Error {
                job_id,
                error: "Application shutting down".to_string(),
            });
        }
    }
}

/// Supervise one spawned renderer until it exits or is killed.
async fn supervise(
    registry: Arc<JobRegistry>,
    bridge: EventBridge,
    job: RenderJob,
    mut child: Child,
    mut kill_rx: oneshot::Receiver<()>,
) {
    let stdout_task = tokio::spawn(pump_stdout(
        child.stdout.take(),
        Arc::clone(&registry),
        bridge.clone(),
        job.id.clone(),
    ));
    let stderr_task = tokio::spawn(pump_stderr(child.stderr.take()));

    let status = tokio::select! {
        status = child.wait() => status,
        _ = &mut kill_rx => {
            // Whoever sent the kill already deregistered the job and
            // published its terminal event; nothing to report here.
            if let Err(e) = child.start_kill() {
                tracing::warn!(job_id = %job.id, error = %e, "kill signal failed");
            }
            let _ = child.wait().await;
            let _ = stdout_task.await;
            let _ = stderr_task.await;
            return;
        }
    };

    // Pipes hit EOF once the process is gone, so the pumps finish.
    let stdout_tail = stdout_task.await.unwrap_or_default();
    let stderr_text = stderr_task.await.unwrap_or_default();

    // Deregistration decides the cancel/exit race: if the entry is
    // already gone this exit notification is a no-op.
    if registry.deregister(&job.id).is_none() {
        tracing::debug!(job_id = %job.id, "exit after deregistration, dropped");
        return;
    }

    match status {
        Ok(status) if status.success() => {
            tracing::info!(job_id = %job.id, "render complete");
            bridge.publish(RenderEvent::Complete {
                job_id: job.id,
                output_path: job.output_path,
            });
        }
        Ok(status) => {
            let error = failure_diagnostics(&stderr_text, &stdout_tail, status.code());
            tracing::warn!(job_id = %job.id, code = ?status.code(), "render failed");
            bridge.publish(RenderEvent::Error {
                job_id: job.id,
                error,
            });
        }
        Err(e) => {
            tracing::error!(job_id = %job.id, error = %e, "failed to wait on renderer");
            bridge.publish(RenderEvent::Error {
                job_id: job.id,
                error: format!("Failed to wait on render process: {e}"),
            });
        }
    }
}

/// Read stdout in chunks, publishing progress observations and keeping
/// a bounded tail for diagnostics.
///
/// Publication is gated on the job still being registered: after
/// cancellation or shutdown the pipe keeps draining (the process may
/// take a moment to die) but nothing more is published for the id.
async fn pump_stdout(
    stdout: Option<ChildStdout>,
    registry: Arc<JobRegistry>,
    bridge: EventBridge,
    job_id: JobId,
) -> String {
    let Some(mut stdout) = stdout else {
        return String::new();
    };
    let mut extractor = ProgressExtractor::new();
    let mut tail = OutputTail::new(STDOUT_TAIL_CHARS);
    let mut buf = [0u8; 4096];
    loop {
        match stdout.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                let chunk = String::from_utf8_lossy(&buf[..n]);
                tail.push(&chunk);
                for obs in extractor.push(&chunk) {
                    if !registry.contains(&job_id) {
                        break;
                    }
                    bridge.publish(RenderEvent::Progress {
                        job_id: job_id.clone(),
                        stage: obs.stage,
                        percent: obs.percent,
                    });
                }
            }
            Err(e) => {
                tracing::warn!(%job_id, error = %e, "stdout read failed");
                break;
            }
        }
    }
    tail.into_string()
}

/// Accumulate stderr verbatim. Never parsed for progress.
async fn pump_stderr(stderr: Option<ChildStderr>) -> String {
    let Some(mut stderr) = stderr else {
        return String::new();
    };
    let mut acc = String::new();
    let mut buf = [0u8; 4096];
    loop {
        match stderr.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => acc.push_str(&String::from_utf8_lossy(&buf[..n])),
            Err(e) => {
                tracing::warn!(error = %e, "stderr read failed");
                break;
            }
        }
    }
    acc
}

/// Best-effort diagnostic for a failed render: stderr if it says
/// anything, else the stdout tail, else the bare exit code.
fn failure_diagnostics(stderr: &str, stdout_tail: &str, code: Option<i32>) -> String {
    if !stderr.trim().is_empty() {
        return stderr.to_string();
    }
    if !stdout_tail.trim().is_empty() {
        return stdout_tail.to_string();
    }
    match code {
        Some(code) => format!("Process exited with code {code}"),
        None => "Process terminated by signal".to_string(),
    }
}

/// Rolling buffer keeping the last `limit` characters of a stream.
struct OutputTail {
    limit: usize,
    buf: String,
}

impl OutputTail {
    fn new(limit: usize) -> Self {
        Self {
            limit,
            buf: String::new(),
        }
    }

    fn push(&mut self, chunk: &str) {
        self.buf.push_str(chunk);
        if self.buf.len() > self.limit {
            let mut cut = self.buf.len() - self.limit;
            while !self.buf.is_char_boundary(cut) {
                cut += 1;
            }
            self.buf.drain(..cut);
        }
    }

    fn into_string(self) -> String {
        self.buf
    }
}
