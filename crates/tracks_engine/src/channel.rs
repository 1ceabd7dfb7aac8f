//! Progress stream for one import job.
//!
//! A channel walks `Disconnected -> Connecting -> Open -> Closed`. The socket is
//! driven by a spawned task; every event it emits is checked against the shared
//! state under the same lock that [`ProgressChannel::close`] takes, so once
//! `close` returns nothing more is delivered for that channel.

use std::sync::{Arc, Mutex, MutexGuard};

use engine_logging::{engine_debug, engine_info, engine_warn};
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::protocol::{decode_server_message, ServerMessage};
use crate::{ChannelEvent, EngineEvent, EventSink, Generation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Disconnected,
    Connecting,
    Open,
    Closed,
}

pub struct ProgressChannel {
    generation: Generation,
    state: Arc<Mutex<ChannelState>>,
    cancel: CancellationToken,
}

impl ProgressChannel {
    pub fn new(generation: Generation) -> Self {
        Self {
            generation,
            state: Arc::new(Mutex::new(ChannelState::Disconnected)),
            cancel: CancellationToken::new(),
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn state(&self) -> ChannelState {
        *lock(&self.state)
    }

    /// Starts connecting to `url`; the task id is sent as the first frame.
    ///
    /// Must be called from within a tokio runtime. Only a `Disconnected`
    /// channel connects; later calls are ignored.
    pub fn connect(&mut self, url: &Url, task_id: String, sink: Arc<dyn EventSink>) {
        {
            let mut state = lock(&self.state);
            if *state != ChannelState::Disconnected {
                return;
            }
            *state = ChannelState::Connecting;
        }

        let link = Link {
            generation: self.generation,
            state: self.state.clone(),
            sink,
        };
        let url = url.to_string();
        let cancel = self.cancel.clone();
        engine_info!(
            "progress channel {} connecting to {}",
            self.generation,
            url
        );
        tokio::spawn(run_channel(url, task_id, cancel, link));
    }

    /// Idempotent; a never-connected channel is left untouched.
    pub fn close(&mut self) {
        {
            let mut state = lock(&self.state);
            match *state {
                ChannelState::Disconnected | ChannelState::Closed => return,
                ChannelState::Connecting | ChannelState::Open => *state = ChannelState::Closed,
            }
        }
        // The task sends a close frame on its own and then ends.
        self.cancel.cancel();
        engine_debug!("progress channel {} closed", self.generation);
    }
}

impl Drop for ProgressChannel {
    fn drop(&mut self) {
        self.close();
    }
}

/// Holds at most one live channel; opening replaces (and first closes) the old one.
pub struct ChannelSlot {
    url: Url,
    current: Option<ProgressChannel>,
}

impl ChannelSlot {
    pub fn new(url: Url) -> Self {
        Self { url, current: None }
    }

    pub fn open(&mut self, generation: Generation, task_id: String, sink: Arc<dyn EventSink>) {
        self.close();
        let mut channel = ProgressChannel::new(generation);
        channel.connect(&self.url, task_id, sink);
        self.current = Some(channel);
    }

    pub fn close(&mut self) {
        if let Some(mut channel) = self.current.take() {
            channel.close();
        }
    }
}

struct Link {
    generation: Generation,
    state: Arc<Mutex<ChannelState>>,
    sink: Arc<dyn EventSink>,
}

impl Link {
    fn emit(&self, event: ChannelEvent) -> bool {
        let state = lock(&self.state);
        if *state == ChannelState::Closed {
            return false;
        }
        self.sink.emit(EngineEvent::Channel {
            generation: self.generation,
            event,
        });
        true
    }

    fn mark_open(&self) -> bool {
        let mut state = lock(&self.state);
        if *state == ChannelState::Closed {
            return false;
        }
        *state = ChannelState::Open;
        true
    }

    /// Terminal transition for a connection that ended without `close()`.
    fn finish(&self) {
        let mut state = lock(&self.state);
        if *state == ChannelState::Closed {
            return;
        }
        *state = ChannelState::Closed;
        self.sink.emit(EngineEvent::Channel {
            generation: self.generation,
            event: ChannelEvent::Closed,
        });
    }
}

enum Step {
    Cancelled,
    Frame(Option<Result<Message, tokio_tungstenite::tungstenite::Error>>),
}

async fn run_channel(url: String, task_id: String, cancel: CancellationToken, link: Link) {
    let connected = tokio::select! {
        biased;
        _ = cancel.cancelled() => return,
        result = tokio_tungstenite::connect_async(url.as_str()) => result,
    };

    let mut socket = match connected {
        Ok((socket, _response)) => socket,
        Err(err) => {
            engine_warn!("progress channel {} failed to connect: {}", link.generation, err);
            link.emit(ChannelEvent::TransportError(err.to_string()));
            link.finish();
            return;
        }
    };

    if !link.mark_open() {
        let _ = socket.close(None).await;
        return;
    }

    if let Err(err) = socket.send(Message::Text(task_id.into())).await {
        engine_warn!("progress channel {} failed to send task id: {}", link.generation, err);
        link.emit(ChannelEvent::TransportError(err.to_string()));
        link.finish();
        return;
    }

    loop {
        let step = tokio::select! {
            biased;
            _ = cancel.cancelled() => Step::Cancelled,
            frame = socket.next() => Step::Frame(frame),
        };

        match step {
            Step::Cancelled => {
                let _ = socket.close(None).await;
                return;
            }
            Step::Frame(None) | Step::Frame(Some(Ok(Message::Close(_)))) => break,
            Step::Frame(Some(Err(err))) => {
                engine_warn!("progress channel {} transport error: {}", link.generation, err);
                link.emit(ChannelEvent::TransportError(err.to_string()));
                break;
            }
            Step::Frame(Some(Ok(Message::Text(text)))) => match decode_server_message(&text) {
                Ok(ServerMessage::Progress(percent)) => {
                    engine_debug!("progress channel {}: {}%", link.generation, percent);
                    link.emit(ChannelEvent::Progress(percent));
                }
                Ok(ServerMessage::Completed { tracks_created }) => {
                    engine_info!(
                        "progress channel {} completed, {} tracks created",
                        link.generation,
                        tracks_created
                    );
                    link.emit(ChannelEvent::Completed { tracks_created });
                    let _ = socket.close(None).await;
                    break;
                }
                Err(err) => {
                    engine_warn!("progress channel {} ignoring message: {}", link.generation, err);
                }
            },
            Step::Frame(Some(Ok(_))) => {}
        }
    }

    link.finish();
}

fn lock(state: &Mutex<ChannelState>) -> MutexGuard<'_, ChannelState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
