// src/session/process.rs
// One spawned wrapped-process session: child handle, stream readers, menu
// latch, and paced scripted stdin writes.

use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::{mpsc, oneshot};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::error::{EngineError, Result};

use super::stream::{lock_capture, spawn_line_reader, MarkerScanner};
use super::types::{SessionConfig, SessionState, StreamSource};

/// A live wrapped-process session.
///
/// Owns exactly one child process, its captured-output buffer, the stdin
/// write half, and the one-shot menu latch. The child, buffer, and latch are
/// acquired together at spawn and released together on every exit path;
/// `kill_on_drop` backstops abnormal unwinds.
pub struct DriverSession {
    /// Session ID
    pub id: String,
    child: Child,
    stdin: Option<ChildStdin>,
    capture: Arc<Mutex<String>>,
    menu_latch: Option<oneshot::Receiver<String>>,
    failed: Arc<AtomicBool>,
    state: SessionState,
    config: SessionConfig,
    /// Unix timestamp when spawned
    pub spawned_at: i64,
    exit_code: Option<i32>,
    /// Reader and scanner tasks, drained together with the exit event so the
    /// capture is complete before any outcome is assembled
    io_tasks: Vec<tokio::task::JoinHandle<()>>,
}

impl DriverSession {
    /// Spawn the wrapped process and start both stream readers plus the
    /// marker scanner pump.
    pub fn spawn(config: SessionConfig) -> Result<Self> {
        let id = format!("ds_{}", uuid::Uuid::new_v4());
        info!(session_id = %id, command = %config.command, "Spawning wrapped process");

        let mut cmd = Command::new(&config.command);
        cmd.args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(ref dir) = config.working_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|source| EngineError::Spawn {
            command: config.command.clone(),
            source,
        })?;

        let stdin = child.stdin.take();
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EngineError::Protocol("child stdout was not captured".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| EngineError::Protocol("child stderr was not captured".to_string()))?;

        let capture = Arc::new(Mutex::new(String::new()));
        let failed = Arc::new(AtomicBool::new(false));
        let (latch_tx, latch_rx) = oneshot::channel();

        let (chunk_tx, chunk_rx) = mpsc::channel(256);
        let stdout_reader = spawn_line_reader(stdout, StreamSource::Stdout, chunk_tx.clone());
        let stderr_reader = spawn_line_reader(stderr, StreamSource::Stderr, chunk_tx);
        let scanner = MarkerScanner::new(capture.clone(), latch_tx, failed.clone());
        let pump = scanner.spawn_pump(chunk_rx);

        Ok(Self {
            id,
            child,
            stdin,
            capture,
            menu_latch: Some(latch_rx),
            failed,
            state: SessionState::AwaitingMenu,
            config,
            spawned_at: chrono::Utc::now().timestamp(),
            exit_code: None,
            io_tasks: vec![stdout_reader, stderr_reader, pump],
        })
    }

    /// Await the one-shot menu latch and return everything captured up to
    /// the prompt. Consumes the latch; a second call is a protocol error.
    pub async fn wait_for_menu(&mut self) -> Result<String> {
        let latch = self
            .menu_latch
            .take()
            .ok_or_else(|| EngineError::Protocol("menu latch already awaited".to_string()))?;

        match latch.await {
            Ok(captured) => {
                self.state = SessionState::Selecting;
                Ok(captured)
            }
            // The scanner dropped the latch: streams closed before the
            // prompt ever appeared.
            Err(_) => Err(EngineError::MenuClosed),
        }
    }

    /// Write the numeric menu selection. Permitted only after the menu
    /// prompt has been observed.
    pub async fn select(&mut self, index: usize) -> Result<()> {
        self.ensure_writable(&[SessionState::Selecting], "menu selection")?;
        debug!(session_id = %self.id, index, "Writing menu selection");
        self.write_line(&index.to_string()).await?;
        self.state = SessionState::SupplyingParameters;
        Ok(())
    }

    /// Write one parameter value, in declaration order.
    pub async fn supply(&mut self, value: &str) -> Result<()> {
        self.ensure_writable(&[SessionState::SupplyingParameters], "parameter value")?;
        debug!(session_id = %self.id, "Writing parameter value");
        self.write_line(value).await
    }

    /// Write the terminal exit selection after the configured grace delay,
    /// letting the wrapped process finish any in-flight work first.
    pub async fn finish(&mut self, exit_index: usize) -> Result<()> {
        self.ensure_writable(
            &[SessionState::Selecting, SessionState::SupplyingParameters],
            "exit selection",
        )?;
        sleep(self.config.exit_grace).await;
        debug!(session_id = %self.id, exit_index, "Writing exit selection");
        self.write_line(&exit_index.to_string()).await?;
        self.state = SessionState::AwaitingExit;
        Ok(())
    }

    /// Await process exit. The exit event is the single source of truth for
    /// completion; repeated calls return the recorded code.
    pub async fn wait_exit(&mut self) -> Result<i32> {
        if let Some(code) = self.exit_code {
            return Ok(code);
        }

        let status = self.child.wait().await?;
        // Process exit closes both pipes; drain the readers and scanner so
        // the capture holds every line before any outcome is assembled.
        for task in self.io_tasks.drain(..) {
            let _ = task.await;
        }
        let code = status.code().unwrap_or(-1);
        self.exit_code = Some(code);
        self.state = if self.has_failed() {
            SessionState::Failed
        } else {
            SessionState::Completed
        };
        info!(session_id = %self.id, code, "Wrapped process exited");
        Ok(code)
    }

    /// Forcibly terminate the wrapped process.
    pub async fn kill(&mut self) -> Result<()> {
        warn!(session_id = %self.id, "Killing wrapped process");
        self.child.kill().await?;
        self.state = SessionState::Failed;
        Ok(())
    }

    /// Snapshot of everything captured so far from both streams.
    pub fn capture_snapshot(&self) -> String {
        lock_capture(&self.capture).clone()
    }

    /// True once the fatal-exception marker has been observed.
    pub fn has_failed(&self) -> bool {
        self.failed.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// A write before its prompt has been observed is a protocol violation
    /// and is rejected, never silently dropped.
    fn ensure_writable(&self, permitted: &[SessionState], what: &str) -> Result<()> {
        if self.has_failed() {
            return Err(EngineError::Protocol(format!(
                "refusing {} write: wrapped process raised an exception",
                what
            )));
        }
        if !permitted.contains(&self.state) {
            return Err(EngineError::Protocol(format!(
                "refusing {} write in state {}",
                what,
                self.state.as_str()
            )));
        }
        Ok(())
    }

    async fn write_line(&mut self, line: &str) -> Result<()> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| EngineError::Protocol("child stdin is closed".to_string()))?;
        stdin.write_all(line.as_bytes()).await?;
        stdin.write_all(b"\n").await?;
        stdin.flush().await?;
        // The wrapped process reads sequentially and emits its next prompt
        // only after processing this line.
        sleep(self.config.write_delay).await;
        Ok(())
    }
}
