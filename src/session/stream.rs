// src/session/stream.rs
// Stream readers and the protocol marker scanner.
//
// Stdout and stderr are consumed by two independently progressing reader
// tasks feeding one channel; a pump task appends every chunk to the
// session's captured buffer and scans it for protocol markers. The buffer is
// written only here and read only by the scanner and final outcome assembly.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace};

use crate::menu::MENU_QUESTION;

use super::types::{StreamChunk, StreamSource};

/// Fatal-exception marker in the wrapped process's output
pub const EXCEPTION_MARKER: &str = "Exception:";

/// Source extension that must co-occur with the exception marker
pub const SOURCE_EXTENSION: &str = ".compact";

pub(crate) fn lock_capture(capture: &Mutex<String>) -> MutexGuard<'_, String> {
    capture.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Spawn a task reading one stream line by line into the chunk channel.
///
/// A slow or blocked peer reader never stalls this one; both feed the same
/// channel independently.
pub fn spawn_line_reader<R>(
    reader: R,
    source: StreamSource,
    tx: mpsc::Sender<StreamChunk>,
) -> tokio::task::JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(text)) = lines.next_line().await {
            trace!(?source, line = %text, "Captured line");
            if tx.send(StreamChunk { source, text }).await.is_err() {
                debug!(?source, "Chunk receiver dropped, stopping reader");
                break;
            }
        }
        debug!(?source, "Stream reader finished");
    })
}

/// Scans captured chunks for protocol markers.
///
/// Marker priority per chunk: menu prompt, then fatal exception. The menu
/// latch fires at most once per session no matter how often the prompt text
/// recurs in the stream.
pub struct MarkerScanner {
    capture: Arc<Mutex<String>>,
    menu_latch: Option<oneshot::Sender<String>>,
    failed: Arc<AtomicBool>,
}

impl MarkerScanner {
    pub fn new(
        capture: Arc<Mutex<String>>,
        menu_latch: oneshot::Sender<String>,
        failed: Arc<AtomicBool>,
    ) -> Self {
        Self {
            capture,
            menu_latch: Some(menu_latch),
            failed,
        }
    }

    /// Spawn the pump: drain the chunk channel until both readers close.
    pub fn spawn_pump(mut self, mut rx: mpsc::Receiver<StreamChunk>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(chunk) = rx.recv().await {
                self.ingest(&chunk);
            }
            debug!("Marker scanner finished");
        })
    }

    fn ingest(&mut self, chunk: &StreamChunk) {
        let snapshot = {
            let mut capture = lock_capture(&self.capture);
            capture.push_str(&chunk.text);
            capture.push('\n');
            capture.clone()
        };

        if chunk.text.contains(MENU_QUESTION) {
            if let Some(latch) = self.menu_latch.take() {
                debug!("Menu prompt observed, firing latch");
                // Deliver everything captured so far; the orchestrator scans
                // prior lines for the numeric index.
                let _ = latch.send(snapshot);
            }
            return;
        }

        // The marker and the source location usually arrive on separate
        // lines, so the co-occurrence check covers the whole capture, not
        // just the chunk at hand.
        if !self.failed.load(Ordering::SeqCst)
            && snapshot.contains(EXCEPTION_MARKER)
            && snapshot.contains(SOURCE_EXTENSION)
        {
            debug!("Exception marker observed, marking session failed");
            self.failed.store(true, Ordering::SeqCst);
        }
    }
}

/// Extract the fatal-exception text from captured output: everything from
/// the marker onward, provided the recognized source extension co-occurs.
pub fn extract_exception(captured: &str) -> Option<String> {
    let at = captured.find(EXCEPTION_MARKER)?;
    if !captured.contains(SOURCE_EXTENSION) {
        return None;
    }
    Some(captured[at..].trim_end().to_string())
}
