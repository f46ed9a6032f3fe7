//! Streaming transcription session
//!
//! One persistent duplex connection per session: resampled audio goes out
//! as binary frames, transcript fragments come back as text frames. The
//! lifecycle is an explicit state machine driven by typed events; the
//! socket driver lives in `client`.
//!
//! There is no reconnect and no backoff anywhere in here. A transport
//! failure tears the session down and the user starts a new one.

use thiserror::Error;

use crate::audio::CaptureError;

mod client;

pub use client::{run_session, SessionConfig};

/// Session-level failures surfaced to the user
#[derive(Error, Debug)]
pub enum StreamingError {
    #[error(transparent)]
    Device(#[from] CaptureError),
    #[error("transport error: {0}")]
    Transport(String),
}

/// Connection lifecycle. `Closing` covers teardown; a finished session
/// returns to `Idle` and may be started again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Streaming,
    Closing,
}

/// What the transport reports into the state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Handshake completed; capture may now be requested
    Opened,
    /// A transcript fragment arrived
    Fragment(String),
    /// The transport failed
    Errored(String),
    /// The server closed the connection
    Closed,
}

/// Tracks one session's position in the lifecycle
///
/// The driver owns the sockets and the capture session; this type only
/// decides which transitions are real and which are no-ops, so the rules
/// stay testable without any I/O.
pub struct SessionState {
    state: ConnectionState,
    capture_active: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            state: ConnectionState::Idle,
            capture_active: false,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn capture_active(&self) -> bool {
        self.capture_active
    }

    /// User action: begin a session. Returns false when one is already
    /// underway, in which case nothing changes.
    pub fn begin_connect(&mut self) -> bool {
        if self.state != ConnectionState::Idle {
            return false;
        }
        self.state = ConnectionState::Connecting;
        true
    }

    /// Apply a transport event. Returns true when the event demands
    /// teardown and this call is the one that starts it.
    pub fn on_event(&mut self, event: &SessionEvent) -> bool {
        match event {
            SessionEvent::Opened => {
                if self.state == ConnectionState::Connecting {
                    self.state = ConnectionState::Streaming;
                }
                false
            }
            SessionEvent::Fragment(_) => false,
            SessionEvent::Errored(_) | SessionEvent::Closed => self.begin_close(),
        }
    }

    /// The microphone was acquired
    pub fn capture_attached(&mut self) {
        self.capture_active = true;
    }

    /// User action: start teardown. Returns true exactly once per
    /// session; later calls (user stop racing a transport error, say)
    /// are no-ops.
    pub fn begin_close(&mut self) -> bool {
        match self.state {
            ConnectionState::Idle | ConnectionState::Closing => false,
            _ => {
                self.state = ConnectionState::Closing;
                true
            }
        }
    }

    /// Teardown finished; capture and transport are released
    pub fn finish_close(&mut self) {
        self.capture_active = false;
        self.state = ConnectionState::Idle;
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_idle() {
        let session = SessionState::new();
        assert_eq!(session.state(), ConnectionState::Idle);
        assert!(!session.capture_active());
    }

    #[test]
    fn test_start_while_active_is_a_no_op() {
        let mut session = SessionState::new();

        assert!(session.begin_connect());
        assert_eq!(session.state(), ConnectionState::Connecting);

        // A second start changes nothing, in any active state.
        assert!(!session.begin_connect());
        assert_eq!(session.state(), ConnectionState::Connecting);

        session.on_event(&SessionEvent::Opened);
        assert!(!session.begin_connect());
        assert_eq!(session.state(), ConnectionState::Streaming);
    }

    #[test]
    fn test_open_only_applies_while_connecting() {
        let mut session = SessionState::new();
        session.on_event(&SessionEvent::Opened);
        assert_eq!(session.state(), ConnectionState::Idle);
    }

    #[test]
    fn test_fragments_do_not_change_state() {
        let mut session = SessionState::new();
        session.begin_connect();
        session.on_event(&SessionEvent::Opened);

        let teardown = session.on_event(&SessionEvent::Fragment(" hello".into()));
        assert!(!teardown);
        assert_eq!(session.state(), ConnectionState::Streaming);
    }

    #[test]
    fn test_stop_while_idle_is_a_no_op() {
        let mut session = SessionState::new();
        assert!(!session.begin_close());
        assert_eq!(session.state(), ConnectionState::Idle);
    }

    #[test]
    fn test_transport_error_starts_teardown_exactly_once() {
        let mut session = SessionState::new();
        session.begin_connect();
        session.on_event(&SessionEvent::Opened);
        session.capture_attached();

        assert!(session.on_event(&SessionEvent::Errored("reset by peer".into())));
        assert_eq!(session.state(), ConnectionState::Closing);

        // A racing user stop or server close finds teardown underway.
        assert!(!session.begin_close());
        assert!(!session.on_event(&SessionEvent::Closed));

        session.finish_close();
        assert_eq!(session.state(), ConnectionState::Idle);
        assert!(!session.capture_active());
    }

    #[test]
    fn test_server_close_starts_teardown() {
        let mut session = SessionState::new();
        session.begin_connect();
        session.on_event(&SessionEvent::Opened);

        assert!(session.on_event(&SessionEvent::Closed));
        assert_eq!(session.state(), ConnectionState::Closing);
    }

    #[test]
    fn test_session_is_restartable_after_close() {
        let mut session = SessionState::new();
        session.begin_connect();
        session.on_event(&SessionEvent::Opened);
        session.capture_attached();
        session.begin_close();
        session.finish_close();

        assert!(session.begin_connect());
        assert_eq!(session.state(), ConnectionState::Connecting);
    }
}
