//! Speech synthesis collaborator
//!
//! Utterances are queued to a single worker task so speaking never blocks
//! the conversation. `stop` only drops speech that has not started yet.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::{Error, Result};

/// Speaks text aloud
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Speak `text`, returning once playback has finished
    async fn speak(&self, text: &str) -> Result<()>;
}

/// Speaks through a platform speech program (`espeak`, `say`, SAPI)
#[derive(Debug, Clone, Default)]
pub struct ProcessSynthesizer {
    command: Option<String>,
}

impl ProcessSynthesizer {
    /// Create a synthesizer, optionally overriding the speech program
    ///
    /// The override receives the text as its last argument.
    #[must_use]
    pub const fn new(command: Option<String>) -> Self {
        Self { command }
    }
}

#[async_trait]
impl Synthesizer for ProcessSynthesizer {
    async fn speak(&self, text: &str) -> Result<()> {
        let mut command = if let Some(custom) = &self.command {
            let mut parts = custom.split_whitespace();
            let program = parts
                .next()
                .ok_or_else(|| Error::Tts("empty TTS command".to_string()))?;
            let mut c = tokio::process::Command::new(program);
            c.args(parts).arg(text);
            c
        } else if cfg!(target_os = "windows") {
            let script = format!(
                "Add-Type -AssemblyName System.Speech; \
                 (New-Object System.Speech.Synthesis.SpeechSynthesizer).Speak('{}')",
                text.replace('\'', "''")
            );
            let mut c = tokio::process::Command::new("powershell");
            c.args(["-NoProfile", "-Command", &script]);
            c
        } else if cfg!(target_os = "macos") {
            let mut c = tokio::process::Command::new("say");
            c.arg(text);
            c
        } else {
            let mut c = tokio::process::Command::new("espeak");
            c.arg(text);
            c
        };

        let status = command
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .await
            .map_err(|e| Error::Tts(format!("failed to start speech program: {e}")))?;

        if !status.success() {
            return Err(Error::Tts(format!(
                "speech program exited with code {}",
                status.code().unwrap_or(-1)
            )));
        }

        Ok(())
    }
}

/// Discards speech; used in text mode
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentSynthesizer;

#[async_trait]
impl Synthesizer for SilentSynthesizer {
    async fn speak(&self, _text: &str) -> Result<()> {
        Ok(())
    }
}

/// Queue of pending utterances in front of a [`Synthesizer`]
pub struct Speaker {
    tx: mpsc::UnboundedSender<(u64, String)>,
    generation: Arc<AtomicU64>,
    pending: watch::Receiver<usize>,
    pending_tx: Arc<watch::Sender<usize>>,
    worker: JoinHandle<()>,
}

impl Speaker {
    /// Spawn the speaking worker
    #[must_use]
    pub fn spawn(synthesizer: Arc<dyn Synthesizer>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<(u64, String)>();
        let generation = Arc::new(AtomicU64::new(0));
        let (pending_tx, pending) = watch::channel(0usize);
        let pending_tx = Arc::new(pending_tx);

        let worker_generation = Arc::clone(&generation);
        let worker_pending = Arc::clone(&pending_tx);
        let worker = tokio::spawn(async move {
            while let Some((queued_at, text)) = rx.recv().await {
                if queued_at == worker_generation.load(Ordering::SeqCst) {
                    tracing::debug!(text = %text, "speaking");
                    if let Err(e) = synthesizer.speak(&text).await {
                        tracing::warn!(error = %e, "speech failed");
                    }
                } else {
                    tracing::debug!(text = %text, "dropping stopped speech");
                }
                worker_pending.send_modify(|n| *n = n.saturating_sub(1));
            }
        });

        Self {
            tx,
            generation,
            pending,
            pending_tx,
            worker,
        }
    }

    /// Queue text for speaking
    pub fn say(&self, text: impl Into<String>) {
        let text = text.into();
        if text.trim().is_empty() {
            return;
        }

        self.pending_tx.send_modify(|n| *n += 1);
        let generation = self.generation.load(Ordering::SeqCst);
        if self.tx.send((generation, text)).is_err() {
            tracing::warn!("speaker worker has stopped");
            self.pending_tx.send_modify(|n| *n = n.saturating_sub(1));
        }
    }

    /// Drop queued speech that has not started
    pub fn stop(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        tracing::debug!("stop speaking requested");
    }

    /// Whether speech is queued or playing
    #[must_use]
    pub fn is_busy(&self) -> bool {
        *self.pending.borrow() > 0
    }

    /// Wait until the queue is drained
    pub async fn wait_idle(&self) {
        self.idle().await;
    }

    /// Future resolving once the queue is drained, detached from `self`
    pub fn idle(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut pending = self.pending.clone();
        async move {
            // a closed channel means the worker is gone, which is idle too
            let _ = pending.wait_for(|n| *n == 0).await;
        }
    }

    /// Speak everything queued, then stop the worker
    pub async fn finish(self) {
        drop(self.tx);
        if let Err(e) = self.worker.await {
            tracing::warn!(error = %e, "speaker worker panicked");
        }
    }
}

impl std::fmt::Debug for Speaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Speaker")
            .field("pending", &*self.pending.borrow())
            .finish_non_exhaustive()
    }
}
