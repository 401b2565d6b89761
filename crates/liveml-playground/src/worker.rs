//! SessionHandle: a session owned by a dedicated worker thread.
//!
//! Threading model:
//! - The worker owns the `Session` and is the only thread that touches it
//! - Requests are queued on one channel and served in arrival order, so
//!   executes and resets never interleave
//! - Each request carries its own reply channel
//! - A caller that waits longer than the reply timeout trips the session's
//!   cancel token and then collects the interrupted result
//!
//! The worker runs on its own large stack because evaluation recursion
//! uses the native stack.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use liveml_eval::{CancelToken, Session, SessionError, UnitOutput, PRELUDE};
use liveml_types::Syntax;
use log::*;

use crate::backend::Evaluate;
use crate::config::PlaygroundConfig;
use crate::error::PlaygroundError;

type Reply<T> = Sender<Result<T, SessionError>>;

enum Request {
    Execute {
        canonical: String,
        display: Syntax,
        reply: Reply<Vec<UnitOutput>>,
    },
    Reset {
        reply: Reply<()>,
    },
}

pub struct SessionHandle {
    requests: Sender<Request>,
    cancel: CancelToken,
    reply_timeout: Option<Duration>,
}

impl SessionHandle {
    /// Start a worker running a session with the standard prelude.
    pub fn spawn(config: &PlaygroundConfig) -> Result<Self, PlaygroundError> {
        Self::spawn_with_prelude(config, PRELUDE)
    }

    /// Start a worker whose session baseline is `prelude`.
    ///
    /// Returns once the prelude has run. A failing prelude still yields a
    /// handle; its requests report the session as unavailable.
    pub fn spawn_with_prelude(
        config: &PlaygroundConfig,
        prelude: impl Into<String>,
    ) -> Result<Self, PlaygroundError> {
        let (request_tx, request_rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::sync_channel(1);
        let session_config = config.session;
        let prelude = prelude.into();

        thread::Builder::new()
            .name("liveml-session".to_string())
            .stack_size(config.worker_stack_bytes)
            .spawn(move || {
                let session = Session::with_prelude(session_config, prelude);
                if ready_tx.send(session.cancel_token()).is_err() {
                    return;
                }
                run(session, request_rx);
            })?;

        let cancel = ready_rx.recv().map_err(|_| PlaygroundError::WorkerStopped)?;
        info!(
            "session worker spawned ({} MiB stack)",
            config.worker_stack_bytes / (1024 * 1024)
        );
        Ok(Self {
            requests: request_tx,
            cancel,
            reply_timeout: config.reply_timeout(),
        })
    }

    /// Interrupts whatever the worker is running now.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    fn request<T>(&self, make: impl FnOnce(Reply<T>) -> Request) -> Result<T, SessionError> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.requests
            .send(make(reply_tx))
            .map_err(|_| worker_stopped())?;

        let reply = match self.reply_timeout {
            None => reply_rx.recv().ok(),
            Some(timeout) => match reply_rx.recv_timeout(timeout) {
                Ok(reply) => Some(reply),
                Err(RecvTimeoutError::Timeout) => {
                    warn!("session did not answer within {timeout:?}, interrupting it");
                    // Repeated, since a cancel that lands before the worker
                    // starts the request is cleared by it.
                    loop {
                        self.cancel.cancel();
                        match reply_rx.recv_timeout(timeout) {
                            Ok(reply) => break Some(reply),
                            Err(RecvTimeoutError::Timeout) => continue,
                            Err(RecvTimeoutError::Disconnected) => break None,
                        }
                    }
                }
                Err(RecvTimeoutError::Disconnected) => None,
            },
        };
        reply.unwrap_or_else(|| Err(worker_stopped()))
    }
}

impl Evaluate for SessionHandle {
    fn execute(
        &mut self,
        canonical: &str,
        display: Syntax,
    ) -> Result<Vec<UnitOutput>, SessionError> {
        self.request(|reply| Request::Execute {
            canonical: canonical.to_string(),
            display,
            reply,
        })
    }

    fn reset(&mut self) -> Result<(), SessionError> {
        self.request(|reply| Request::Reset { reply })
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        // Stop any running snippet; the worker exits once the request
        // channel closes.
        self.cancel.cancel();
    }
}

fn worker_stopped() -> SessionError {
    SessionError::Unavailable("session worker stopped".to_string())
}

fn run(mut session: Session, requests: Receiver<Request>) {
    info!("session worker started");
    for request in requests {
        let delivered = match request {
            Request::Execute {
                canonical,
                display,
                reply,
            } => {
                trace!("executing {} bytes", canonical.len());
                reply.send(session.execute_as(&canonical, display)).is_ok()
            }
            Request::Reset { reply } => reply.send(session.reset()).is_ok(),
        };
        if !delivered {
            debug!("caller went away before the reply was sent");
        }
    }
    info!("session worker stopped");
}
