use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use url::Url;

use crate::{ClientSettings, FailureKind, FetchError, InferenceAck, TrackId, TrackRecord};

/// Multipart field name expected by the upload endpoint.
const UPLOAD_FIELD: &str = "file";

/// Request/response side of the track library server.
#[async_trait::async_trait]
pub trait TrackApi: Send + Sync {
    async fn list_tracks(&self) -> Result<Vec<TrackRecord>, FetchError>;

    /// Uploads a library file and returns the task id of the import job.
    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, FetchError>;

    async fn trigger_inference(&self, track_id: TrackId) -> Result<InferenceAck, FetchError>;
}

#[derive(Debug, Deserialize)]
struct UploadAccepted {
    task_id: String,
}

#[derive(Debug, Deserialize)]
struct AckBody {
    task_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ReqwestTrackApi {
    settings: ClientSettings,
    client: reqwest::Client,
}

impl ReqwestTrackApi {
    pub fn new(settings: ClientSettings) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { settings, client })
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Vec<u8>, FetchError> {
        let response = request.send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let body = response.bytes().await.map_err(map_reqwest_error)?;
        Ok(body.to_vec())
    }

    fn url(&self, path: &str) -> Result<Url, FetchError> {
        self.settings.endpoint(path)
    }
}

#[async_trait::async_trait]
impl TrackApi for ReqwestTrackApi {
    async fn list_tracks(&self) -> Result<Vec<TrackRecord>, FetchError> {
        let url = self.url("tracks")?;
        let body = self.send(self.client.get(url)).await?;
        serde_json::from_slice(&body)
            .map_err(|err| FetchError::new(FailureKind::MalformedResponse, err.to_string()))
    }

    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, FetchError> {
        let url = self.url("upload")?;
        let part = Part::bytes(bytes).file_name(file_name.to_string());
        let form = Form::new().part(UPLOAD_FIELD, part);

        let body = self.send(self.client.post(url).multipart(form)).await?;
        let accepted: UploadAccepted = serde_json::from_slice(&body)
            .map_err(|err| FetchError::new(FailureKind::MalformedResponse, err.to_string()))?;
        if accepted.task_id.trim().is_empty() {
            return Err(FetchError::new(
                FailureKind::MalformedResponse,
                "empty task_id",
            ));
        }
        Ok(accepted.task_id)
    }

    async fn trigger_inference(&self, track_id: TrackId) -> Result<InferenceAck, FetchError> {
        let url = self.url(&format!("infer_year/{track_id}"))?;
        let body = self.send(self.client.post(url)).await?;
        // The ack is informational only; an unreadable body still means accepted.
        let task_id = serde_json::from_slice::<AckBody>(&body)
            .ok()
            .and_then(|ack| ack.task_id);
        Ok(InferenceAck { task_id })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}
