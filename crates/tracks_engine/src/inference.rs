use std::sync::Arc;

use engine_logging::{engine_info, engine_warn};
use futures_util::{stream, StreamExt};

use crate::{EngineEvent, EventSink, InferenceSummary, TrackApi, TrackId};

/// Issues year-inference triggers with a bounded number in flight (one by default).
///
/// A failed trigger is reported and the run moves on; every id gets exactly one
/// request. Results are reported in input order.
pub struct InferenceDriver {
    api: Arc<dyn TrackApi>,
    concurrency: usize,
}

impl InferenceDriver {
    pub fn new(api: Arc<dyn TrackApi>) -> Self {
        Self {
            api,
            concurrency: 1,
        }
    }

    pub fn with_concurrency(mut self, limit: usize) -> Self {
        self.concurrency = limit.max(1);
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub async fn run_all(&self, track_ids: Vec<TrackId>, sink: &dyn EventSink) -> InferenceSummary {
        let mut summary = InferenceSummary {
            requested: track_ids.len(),
            ..InferenceSummary::default()
        };
        engine_info!(
            "year inference for {} tracks (concurrency {})",
            summary.requested,
            self.concurrency
        );

        let api = &self.api;
        let mut results = stream::iter(track_ids)
            .map(|track_id| async move { (track_id, api.trigger_inference(track_id).await) })
            .buffered(self.concurrency);

        while let Some((track_id, result)) = results.next().await {
            match &result {
                Ok(ack) => {
                    summary.accepted += 1;
                    engine_info!("year inference started for track {}: {:?}", track_id, ack.task_id);
                }
                Err(err) => {
                    summary.failed += 1;
                    engine_warn!("year inference failed for track {}: {}", track_id, err);
                }
            }
            sink.emit(EngineEvent::InferenceItem { track_id, result });
        }

        sink.emit(EngineEvent::InferenceFinished(summary.clone()));
        summary
    }
}
