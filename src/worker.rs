//! Conversation worker thread
//!
//! Moves the orchestrator onto a dedicated thread with a command channel
//! in front of it. One thread owns the orchestrator exclusively, which
//! keeps history mutation single-writer without locks; observers follow
//! along through the update feed.
//!
//! An in-flight backend call is not cancellable: `shutdown` takes effect
//! between commands, after the current send returns.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::orchestrator::Orchestrator;

/// Commands accepted by the conversation thread
#[derive(Debug)]
pub enum ConversationCommand {
    /// Process one user message
    Send { text: String, streaming: bool },
    /// Replace the backend (resets history)
    SwitchBackend(Backend),
    /// Clear history and any recorded error
    Reset,
    /// Clear the recorded error only
    ClearError,
    /// Stop the thread after the current command
    Shutdown,
}

/// Handle to a running conversation thread
pub struct ConversationHandle {
    handle: Option<JoinHandle<()>>,
    commands: Sender<ConversationCommand>,
    shutdown: Arc<AtomicBool>,
}

/// Spawn the conversation thread, transferring orchestrator ownership
///
/// Attach an update feed (`Orchestrator::update_feed`) before spawning if
/// you want to observe turns; the handle exposes no direct history access.
pub fn spawn_conversation(mut orchestrator: Orchestrator) -> ConversationHandle {
    let shutdown = Arc::new(AtomicBool::new(false));
    let thread_shutdown = shutdown.clone();
    let (tx, rx) = channel::<ConversationCommand>();

    let handle = std::thread::Builder::new()
        .name("mimir-conversation".to_string())
        .spawn(move || {
            info!("conversation thread started");
            loop {
                if thread_shutdown.load(Ordering::SeqCst) {
                    break;
                }
                match rx.recv_timeout(Duration::from_millis(50)) {
                    Ok(ConversationCommand::Send { text, streaming }) => {
                        if let Err(e) = orchestrator.send(&text, streaming) {
                            warn!(error = %e, "send failed");
                        }
                    }
                    Ok(ConversationCommand::SwitchBackend(backend)) => {
                        orchestrator.switch_backend(backend);
                    }
                    Ok(ConversationCommand::Reset) => orchestrator.reset(),
                    Ok(ConversationCommand::ClearError) => orchestrator.clear_error(),
                    Ok(ConversationCommand::Shutdown) => break,
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            info!("conversation thread stopped");
        })
        .ok();

    ConversationHandle {
        handle,
        commands: tx,
        shutdown,
    }
}

impl ConversationHandle {
    /// Queue a user message; false if the thread is gone
    pub fn send(&self, text: impl Into<String>, streaming: bool) -> bool {
        self.commands
            .send(ConversationCommand::Send {
                text: text.into(),
                streaming,
            })
            .is_ok()
    }

    /// Queue a backend switch (resets history)
    pub fn switch_backend(&self, backend: Backend) -> bool {
        self.commands
            .send(ConversationCommand::SwitchBackend(backend))
            .is_ok()
    }

    /// Queue a history reset
    pub fn reset(&self) -> bool {
        self.commands.send(ConversationCommand::Reset).is_ok()
    }

    /// Queue an error clear
    pub fn clear_error(&self) -> bool {
        self.commands.send(ConversationCommand::ClearError).is_ok()
    }

    /// Whether the conversation thread is still running
    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Request shutdown; queued commands ahead of it still run
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        let _ = self.commands.send(ConversationCommand::Shutdown);
    }

    /// Wait up to `timeout` for the thread to exit
    pub fn join_timeout(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            match &self.handle {
                Some(h) if !h.is_finished() => std::thread::sleep(Duration::from_millis(25)),
                _ => break,
            }
        }
        match self.handle.take() {
            Some(h) if h.is_finished() => {
                let _ = h.join();
                true
            }
            Some(h) => {
                debug!("conversation thread still running at join timeout");
                self.handle = Some(h);
                false
            }
            None => true,
        }
    }
}

impl Drop for ConversationHandle {
    fn drop(&mut self) {
        self.shutdown();
        let _ = self.join_timeout(Duration::from_secs(1));
    }
}
