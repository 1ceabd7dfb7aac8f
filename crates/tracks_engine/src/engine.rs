use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use engine_logging::{engine_error, engine_info};
use thiserror::Error;
use tokio::sync::mpsc as async_mpsc;

use crate::api::{ReqwestTrackApi, TrackApi};
use crate::channel::ChannelSlot;
use crate::inference::InferenceDriver;
use crate::sink::ChannelEventSink;
use crate::{ClientSettings, EngineEvent, EventSink, FetchError, Generation, TrackId};

enum EngineCommand {
    LoadTracks,
    Upload {
        generation: Generation,
        file_name: String,
        bytes: Vec<u8>,
    },
    OpenChannel {
        generation: Generation,
        task_id: String,
    },
    CloseChannel,
    InferYears {
        track_ids: Vec<TrackId>,
    },
}

/// The engine thread has exited and no further events will arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("engine thread stopped")]
pub struct EngineStopped;

/// Runs all IO on one background thread with a single-threaded runtime.
///
/// Dropping the handle stops the loop and closes any live channel.
pub struct EngineHandle {
    cmd_tx: async_mpsc::UnboundedSender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(settings: ClientSettings) -> Result<Self, FetchError> {
        let api: Arc<dyn TrackApi> = Arc::new(ReqwestTrackApi::new(settings.clone())?);
        Self::with_api(settings, api)
    }

    /// Same as [`EngineHandle::new`] with a caller-supplied API implementation.
    pub fn with_api(settings: ClientSettings, api: Arc<dyn TrackApi>) -> Result<Self, FetchError> {
        let progress_url = settings.progress_endpoint()?;
        let (cmd_tx, cmd_rx) = async_mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel();
        let sink: Arc<dyn EventSink> = Arc::new(ChannelEventSink::new(event_tx));
        let driver = Arc::new(
            InferenceDriver::new(api.clone()).with_concurrency(settings.inference_concurrency),
        );

        thread::spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(err) => {
                    engine_error!("failed to start engine runtime: {}", err);
                    return;
                }
            };
            let slot = ChannelSlot::new(progress_url);
            runtime.block_on(run_loop(cmd_rx, api, driver, slot, sink));
        });

        Ok(Self { cmd_tx, event_rx })
    }

    pub fn load_tracks(&self) {
        self.send(EngineCommand::LoadTracks);
    }

    pub fn upload(&self, generation: Generation, file_name: impl Into<String>, bytes: Vec<u8>) {
        self.send(EngineCommand::Upload {
            generation,
            file_name: file_name.into(),
            bytes,
        });
    }

    pub fn open_channel(&self, generation: Generation, task_id: impl Into<String>) {
        self.send(EngineCommand::OpenChannel {
            generation,
            task_id: task_id.into(),
        });
    }

    pub fn close_channel(&self) {
        self.send(EngineCommand::CloseChannel);
    }

    pub fn infer_years(&self, track_ids: Vec<TrackId>) {
        self.send(EngineCommand::InferYears { track_ids });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    /// `Ok(None)` when nothing arrived within `timeout`.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<EngineEvent>, EngineStopped> {
        match self.event_rx.recv_timeout(timeout) {
            Ok(event) => Ok(Some(event)),
            Err(mpsc::RecvTimeoutError::Timeout) => Ok(None),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(EngineStopped),
        }
    }

    fn send(&self, command: EngineCommand) {
        let _ = self.cmd_tx.send(command);
    }
}

async fn run_loop(
    mut cmd_rx: async_mpsc::UnboundedReceiver<EngineCommand>,
    api: Arc<dyn TrackApi>,
    driver: Arc<InferenceDriver>,
    mut slot: ChannelSlot,
    sink: Arc<dyn EventSink>,
) {
    while let Some(command) = cmd_rx.recv().await {
        match command {
            EngineCommand::LoadTracks => {
                let api = api.clone();
                let sink = sink.clone();
                tokio::spawn(async move {
                    let result = api.list_tracks().await;
                    sink.emit(EngineEvent::TracksLoaded(result));
                });
            }
            EngineCommand::Upload {
                generation,
                file_name,
                bytes,
            } => {
                let api = api.clone();
                let sink = sink.clone();
                engine_info!(
                    "upload generation={} file={} bytes={}",
                    generation,
                    file_name,
                    bytes.len()
                );
                tokio::spawn(async move {
                    let result = api.upload(&file_name, bytes).await;
                    sink.emit(EngineEvent::UploadFinished { generation, result });
                });
            }
            EngineCommand::OpenChannel {
                generation,
                task_id,
            } => slot.open(generation, task_id, sink.clone()),
            EngineCommand::CloseChannel => slot.close(),
            EngineCommand::InferYears { track_ids } => {
                let driver = driver.clone();
                let sink = sink.clone();
                tokio::spawn(async move {
                    driver.run_all(track_ids, sink.as_ref()).await;
                });
            }
        }
    }

    slot.close();
    engine_info!("engine loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle_with_dead_thread() -> EngineHandle {
        let (cmd_tx, _cmd_rx) = async_mpsc::unbounded_channel();
        let (_event_tx, event_rx) = mpsc::channel::<EngineEvent>();
        EngineHandle { cmd_tx, event_rx }
    }

    #[test]
    fn stopped_thread_is_reported_instead_of_timing_out() {
        let handle = handle_with_dead_thread();
        let started = std::time::Instant::now();
        assert_eq!(
            handle.recv_timeout(Duration::from_secs(5)).unwrap_err(),
            EngineStopped
        );
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn idle_engine_times_out_with_no_event() {
        let (cmd_tx, _cmd_rx) = async_mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel::<EngineEvent>();
        let handle = EngineHandle { cmd_tx, event_rx };
        assert_eq!(handle.recv_timeout(Duration::from_millis(10)).unwrap(), None);
        drop(event_tx);
    }
}
