//! Background recognition thread.
//!
//! The game loop hands finished traces to a [`RecognizerWorker`] and polls
//! for results once per frame, so a slow recognition never stalls drawing.
//! The worker shares its [`Recognizer`] through an `Arc`; reloading models on
//! that recognizer from another thread takes effect on the next trace.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, trace};

use crate::error::SpellError;
use crate::recognizer::Recognizer;
use crate::shape::{Sample, Shape};

// ════════════════════════════════════════════════════════════════════════════
// WorkerCommand — sent to the recognition thread
// ════════════════════════════════════════════════════════════════════════════

pub enum WorkerCommand {
    /// Recognize one trace.
    Recognize(GestureTrace),
    /// Terminate the thread.
    Quit,
}

/// One finished gesture, tagged so results can be matched to requests.
#[derive(Clone, Debug)]
pub struct GestureTrace {
    pub id:      u64,
    pub samples: Vec<Sample>,
}

// ════════════════════════════════════════════════════════════════════════════
// RecognitionEvent — sent back to the caller
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug)]
pub struct RecognitionEvent {
    pub id:      u64,
    pub outcome: Result<Shape, SpellError>,
}

// ════════════════════════════════════════════════════════════════════════════
// RecognizerWorker — handle to the thread
// ════════════════════════════════════════════════════════════════════════════

pub struct RecognizerWorker {
    cmd_tx:    Sender<WorkerCommand>,
    result_rx: Receiver<RecognitionEvent>,
    handle:    Option<JoinHandle<()>>,
}

impl RecognizerWorker {
    /// Spawn the recognition thread.
    pub fn spawn(recognizer: Arc<Recognizer>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel::<WorkerCommand>();
        let (result_tx, result_rx) = mpsc::channel::<RecognitionEvent>();

        let handle = thread::spawn(move || worker_thread(recognizer, cmd_rx, result_tx));

        RecognizerWorker { cmd_tx, result_rx, handle: Some(handle) }
    }

    /// Queue a trace.  Returns `false` if the thread has already stopped.
    pub fn submit(&self, id: u64, samples: Vec<Sample>) -> bool {
        self.cmd_tx
            .send(WorkerCommand::Recognize(GestureTrace { id, samples }))
            .is_ok()
    }

    pub fn quit(&self) {
        let _ = self.cmd_tx.send(WorkerCommand::Quit);
    }

    /// Drain any finished results (non-blocking).
    pub fn drain_results(&self) -> Vec<RecognitionEvent> {
        let mut out = Vec::new();
        while let Ok(e) = self.result_rx.try_recv() { out.push(e); }
        out
    }

    /// Block for the next result, up to `timeout`.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<RecognitionEvent> {
        match self.result_rx.recv_timeout(timeout) {
            Ok(e) => Some(e),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }
}

impl Drop for RecognizerWorker {
    fn drop(&mut self) {
        self.quit();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// worker_thread — the actual loop
// ════════════════════════════════════════════════════════════════════════════

fn worker_thread(
    recognizer: Arc<Recognizer>,
    cmd_rx:     Receiver<WorkerCommand>,
    result_tx:  Sender<RecognitionEvent>,
) {
    debug!("recognition worker started");
    while let Ok(cmd) = cmd_rx.recv() {
        match cmd {
            WorkerCommand::Recognize(GestureTrace { id, samples }) => {
                let outcome = recognizer.recognize(&samples);
                trace!(id, ok = outcome.is_ok(), "trace done");
                if result_tx.send(RecognitionEvent { id, outcome }).is_err() {
                    break;
                }
            }
            WorkerCommand::Quit => break,
        }
    }
    debug!("recognition worker stopped");
}
