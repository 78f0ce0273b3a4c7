//! Narrative collaborator boundary.
//!
//! The engine talks to a generative narrator through a channel pair
//! serviced by a dedicated worker thread; the render loop only ever does
//! non-blocking sends and `try_recv` polls, so a slow narrator can never
//! stall a frame. A single [`SendGate`] serializes the channel: at most
//! one request is in flight, later ones are refused until it resolves.

use std::sync::mpsc;
use std::thread;

use log::error;

use crate::world::WorldData;

pub mod llm;
pub mod prompts;
pub mod scripted;

pub use llm::LlmNarrator;
pub use scripted::ScriptedNarrator;

#[derive(Debug, thiserror::Error)]
pub enum NarrativeError {
    #[error("narrative transport failed: {0}")]
    Transport(String),
    #[error("malformed world payload: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("narrative service returned an empty response")]
    Empty,
    #[error("narrative worker is gone")]
    WorkerGone,
    #[error("configuration: {0}")]
    Config(String),
}

/// What the engine can ask of the narrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Regenerate the world (level transition or initial load).
    GenerateWorld { prompt: String },
    /// A player-driven narrative turn, e.g. an attack declaration.
    SendTurn { message: String },
    /// Best-effort movement telemetry; failures are logged and dropped.
    Telemetry { line: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    WorldGen,
    Turn,
    Telemetry,
}

impl Request {
    pub fn kind(&self) -> RequestKind {
        match self {
            Request::GenerateWorld { .. } => RequestKind::WorldGen,
            Request::SendTurn { .. } => RequestKind::Turn,
            Request::Telemetry { .. } => RequestKind::Telemetry,
        }
    }
}

/// Narrator replies, tagged to match [`Request`].
#[derive(Debug)]
pub enum Response {
    World(Result<WorldData, NarrativeError>),
    Turn(Result<String, NarrativeError>),
    Telemetry(Result<String, NarrativeError>),
}

/// At-most-one-in-flight guard for the narrative channel. An explicit
/// two-state machine instead of a loose boolean: `Pending` remembers what
/// kind of request it is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SendGate {
    #[default]
    Idle,
    Pending(RequestKind),
}

impl SendGate {
    pub fn is_idle(&self) -> bool {
        matches!(self, SendGate::Idle)
    }

    /// Try to occupy the gate; `false` means a request is already out.
    pub fn acquire(&mut self, kind: RequestKind) -> bool {
        if self.is_idle() {
            *self = SendGate::Pending(kind);
            true
        } else {
            false
        }
    }

    pub fn release(&mut self) {
        *self = SendGate::Idle;
    }
}

/// The narrator as implemented by a backend: an HTTP client against a
/// generative-text service, or the offline scripted stand-in. Runs on the
/// worker thread, never on the render thread.
pub trait Narrator: Send + 'static {
    fn generate_world(
        &mut self,
        prompt: &str,
    ) -> impl Future<Output = Result<WorldData, NarrativeError>> + Send;

    fn send_turn(
        &mut self,
        message: &str,
    ) -> impl Future<Output = Result<String, NarrativeError>> + Send;

    fn send_telemetry(
        &mut self,
        line: &str,
    ) -> impl Future<Output = Result<String, NarrativeError>> + Send;
}

/// Engine-side handle: request sender, response receiver and the gate.
pub struct NarrativeLink {
    tx: mpsc::Sender<Request>,
    rx: mpsc::Receiver<Response>,
    gate: SendGate,
}

impl NarrativeLink {
    /// Spawn the worker thread that owns `narrator` and a current-thread
    /// async runtime, and wire it to a fresh link. Requests are serviced
    /// strictly one at a time, in order.
    pub fn spawn<N: Narrator>(mut narrator: N) -> Self {
        let (req_tx, req_rx) = mpsc::channel::<Request>();
        let (res_tx, res_rx) = mpsc::channel::<Response>();

        thread::spawn(move || {
            let rt = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    error!("narrative worker failed to start: {e}");
                    return;
                }
            };

            while let Ok(req) = req_rx.recv() {
                let res = match req {
                    Request::GenerateWorld { prompt } => {
                        Response::World(rt.block_on(narrator.generate_world(&prompt)))
                    }
                    Request::SendTurn { message } => {
                        Response::Turn(rt.block_on(narrator.send_turn(&message)))
                    }
                    Request::Telemetry { line } => {
                        Response::Telemetry(rt.block_on(narrator.send_telemetry(&line)))
                    }
                };
                if res_tx.send(res).is_err() {
                    break; // engine side went away
                }
            }
        });

        Self::from_channels(req_tx, res_rx)
    }

    /// Wire a link over raw channels. Used by the worker spawn and by
    /// tests that play the narrator side themselves.
    pub fn from_channels(tx: mpsc::Sender<Request>, rx: mpsc::Receiver<Response>) -> Self {
        Self {
            tx,
            rx,
            gate: SendGate::default(),
        }
    }

    pub fn is_idle(&self) -> bool {
        self.gate.is_idle()
    }

    /// Dispatch a request unless one is already outstanding. Returns
    /// whether the request was actually sent.
    pub fn request(&mut self, req: Request) -> bool {
        if !self.gate.acquire(req.kind()) {
            return false;
        }
        if self.tx.send(req).is_err() {
            // worker is gone; do not leave the gate stuck
            self.gate.release();
            return false;
        }
        true
    }

    /// Non-blocking poll for a finished response; frees the gate when one
    /// arrives. A dead worker resolves the outstanding request with an
    /// error instead of wedging the gate forever.
    pub fn poll(&mut self) -> Option<Response> {
        match self.rx.try_recv() {
            Ok(res) => {
                self.gate.release();
                Some(res)
            }
            Err(mpsc::TryRecvError::Empty) => None,
            Err(mpsc::TryRecvError::Disconnected) => {
                let pending = match self.gate {
                    SendGate::Pending(kind) => kind,
                    SendGate::Idle => return None,
                };
                self.gate.release();
                Some(match pending {
                    RequestKind::WorldGen => Response::World(Err(NarrativeError::WorkerGone)),
                    RequestKind::Turn => Response::Turn(Err(NarrativeError::WorkerGone)),
                    RequestKind::Telemetry => Response::Telemetry(Err(NarrativeError::WorkerGone)),
                })
            }
        }
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_refuses_second_request_until_release() {
        let mut gate = SendGate::default();
        assert!(gate.acquire(RequestKind::WorldGen));
        assert!(!gate.acquire(RequestKind::Telemetry));
        assert_eq!(gate, SendGate::Pending(RequestKind::WorldGen));
        gate.release();
        assert!(gate.acquire(RequestKind::Telemetry));
    }

    #[test]
    fn link_serializes_requests() {
        let (req_tx, req_rx) = mpsc::channel();
        let (res_tx, res_rx) = mpsc::channel();
        let mut link = NarrativeLink::from_channels(req_tx, res_rx);

        assert!(link.request(Request::Telemetry { line: "a".into() }));
        assert!(!link.request(Request::Telemetry { line: "b".into() }));
        assert_eq!(req_rx.try_iter().count(), 1);

        res_tx.send(Response::Telemetry(Ok(String::new()))).unwrap();
        assert!(link.poll().is_some());
        assert!(link.is_idle());
        assert!(link.request(Request::Telemetry { line: "c".into() }));
    }

    #[test]
    fn dead_worker_does_not_wedge_the_gate() {
        let (req_tx, req_rx) = mpsc::channel();
        let (_res_tx, res_rx) = mpsc::channel::<Response>();
        let mut link = NarrativeLink::from_channels(req_tx, res_rx);
        drop(req_rx);
        assert!(!link.request(Request::SendTurn { message: "hi".into() }));
        assert!(link.is_idle());
    }
}
