//! Socket driver for one streaming session
//!
//! Connects, requests the microphone only once the handshake is done, and
//! then loops over four sources: outgoing audio blocks, incoming frames,
//! Ctrl-C and the optional session limit. Transcript fragments are
//! persisted and echoed as they arrive.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_tungstenite::tokio::{connect_async, ConnectStream};
use async_tungstenite::tungstenite::Message;
use async_tungstenite::WebSocketStream;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use super::{SessionEvent, SessionState, StreamingError};
use crate::audio::{snapshot_slot, AudioCaptureSession};
use crate::protocol::encode_audio_frame;
use crate::transcript::TranscriptStore;
use crate::visualizer::VisualizerSampler;

type WsStream = WebSocketStream<ConnectStream>;

pub struct SessionConfig {
    pub url: String,
    /// None streams until interrupted
    pub max_duration: Option<Duration>,
    pub show_meter: bool,
}

/// Run one streaming session to completion
pub async fn run_session(config: SessionConfig, transcript: &mut TranscriptStore) -> Result<()> {
    let mut session = SessionState::new();
    session.begin_connect();

    eprintln!("connecting to {}", config.url);
    let ws = tokio::select! {
        connected = connect(&config.url) => connected?,
        _ = tokio::signal::ctrl_c() => {
            // Stop while connecting abandons the attempt; no session starts.
            eprintln!("cancelled");
            session.begin_close();
            session.finish_close();
            return Ok(());
        }
    };
    session.on_event(&SessionEvent::Opened);

    // The microphone is requested only after the handshake. Without it
    // the connection is useless, so a capture failure closes it again.
    let connection_open = Arc::new(AtomicBool::new(true));
    let slot = snapshot_slot();
    let (block_tx, mut block_rx) = mpsc::unbounded_channel();

    let mut capture =
        match AudioCaptureSession::start(block_tx, connection_open.clone(), slot.clone()) {
            Ok(capture) => capture,
            Err(e) => {
                session.begin_close();
                let mut ws = ws;
                let _ = ws.close(None).await;
                session.finish_close();
                return Err(StreamingError::from(e).into());
            }
        };
    session.capture_attached();
    eprintln!(
        "capturing at {} Hz; Ctrl-C stops the session",
        capture.sample_rate()
    );

    let meter = config
        .show_meter
        .then(|| VisualizerSampler::start(slot.clone()));

    let (mut sink, mut source) = ws.split();

    let limit = async {
        match config.max_duration {
            Some(duration) => tokio::time::sleep(duration).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(limit);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut result: Result<()> = Ok(());

    loop {
        tokio::select! {
            block = block_rx.recv() => {
                let Some(block) = block else { break };
                let frame = encode_audio_frame(&block);
                if let Err(e) = sink.send(Message::Binary(frame)).await {
                    let reason = e.to_string();
                    session.on_event(&SessionEvent::Errored(reason.clone()));
                    result = Err(StreamingError::Transport(reason).into());
                    break;
                }
            }
            incoming = source.next() => {
                let event = match incoming {
                    Some(Ok(message)) => match classify(message) {
                        Some(event) => event,
                        None => continue,
                    },
                    Some(Err(e)) => SessionEvent::Errored(e.to_string()),
                    None => SessionEvent::Closed,
                };

                if let SessionEvent::Fragment(fragment) = &event {
                    if let Err(e) = transcript.append(fragment) {
                        result = Err(e);
                        break;
                    }
                    print!("{fragment}");
                    let _ = std::io::stdout().flush();
                }

                if session.on_event(&event) {
                    if let SessionEvent::Errored(reason) = event {
                        result = Err(StreamingError::Transport(reason).into());
                    } else {
                        eprintln!();
                        eprintln!("server closed the connection");
                    }
                    break;
                }
            }
            _ = &mut ctrl_c => {
                eprintln!();
                eprintln!("stopping");
                session.begin_close();
                break;
            }
            _ = &mut limit => {
                eprintln!();
                eprintln!("session limit reached");
                session.begin_close();
                break;
            }
        }
    }

    // Teardown, in dependency order: stop forwarding blocks, release the
    // device, cancel the meter, then close the transport. Reentry is safe;
    // whichever path got here first already moved the state to Closing.
    connection_open.store(false, Ordering::Release);
    capture.stop();
    if let Some(meter) = meter {
        meter.stop().await;
    }
    session.begin_close();
    let _ = sink.close().await;
    session.finish_close();

    result
}

async fn connect(url: &str) -> Result<WsStream, StreamingError> {
    let (stream, _response) = connect_async(url)
        .await
        .map_err(|e| StreamingError::Transport(e.to_string()))?;
    Ok(stream)
}

/// Translate a socket frame into a session event. Control frames carry
/// nothing the state machine cares about.
fn classify(message: Message) -> Option<SessionEvent> {
    match message {
        Message::Text(fragment) => Some(SessionEvent::Fragment(fragment)),
        Message::Close(_) => Some(SessionEvent::Closed),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_frames_become_fragments() {
        let event = classify(Message::Text(" hello there".into()));
        assert_eq!(event, Some(SessionEvent::Fragment(" hello there".into())));
    }

    #[test]
    fn test_close_frames_become_closed() {
        assert_eq!(classify(Message::Close(None)), Some(SessionEvent::Closed));
    }

    #[test]
    fn test_control_frames_are_ignored() {
        assert_eq!(classify(Message::Ping(Vec::new())), None);
        assert_eq!(classify(Message::Pong(Vec::new())), None);
        assert_eq!(classify(Message::Binary(vec![0x00])), None);
    }
}
