use std::time::Duration;

use url::Url;

use crate::{FailureKind, FetchError};

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/";

#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Root of the HTTP API; always ends with `/`.
    pub base_url: Url,
    /// Progress stream endpoint; derived from `base_url` when unset.
    pub progress_url: Option<Url>,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Maximum inference triggers in flight.
    pub inference_concurrency: usize,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base url"),
            progress_url: None,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            inference_concurrency: 1,
        }
    }
}

impl ClientSettings {
    pub fn with_base_url(base_url: &str) -> Result<Self, FetchError> {
        Ok(Self {
            base_url: parse_base(base_url)?,
            ..Self::default()
        })
    }

    pub fn endpoint(&self, path: &str) -> Result<Url, FetchError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))
    }

    /// `ws://<host>/ws` for `http://<host>/`, `wss://` for `https://`.
    pub fn progress_endpoint(&self) -> Result<Url, FetchError> {
        if let Some(url) = &self.progress_url {
            return Ok(url.clone());
        }
        let mut url = self.endpoint("ws")?;
        let scheme = match url.scheme() {
            "http" => "ws",
            "https" => "wss",
            other => {
                return Err(FetchError::new(
                    FailureKind::InvalidUrl,
                    format!("unsupported scheme {other}"),
                ))
            }
        };
        url.set_scheme(scheme).map_err(|()| {
            FetchError::new(FailureKind::InvalidUrl, "cannot switch to websocket scheme")
        })?;
        Ok(url)
    }
}

pub(crate) fn parse_base(raw: &str) -> Result<Url, FetchError> {
    let mut url =
        Url::parse(raw).map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_are_relative_to_base_path() {
        let settings = ClientSettings::with_base_url("http://localhost:8000/api").unwrap();
        assert_eq!(
            settings.endpoint("/tracks").unwrap().as_str(),
            "http://localhost:8000/api/tracks"
        );
        assert_eq!(
            settings.progress_endpoint().unwrap().as_str(),
            "ws://localhost:8000/api/ws"
        );
    }

    #[test]
    fn https_maps_to_wss() {
        let settings = ClientSettings::with_base_url("https://music.example").unwrap();
        assert_eq!(
            settings.progress_endpoint().unwrap().as_str(),
            "wss://music.example/ws"
        );
    }

    #[test]
    fn explicit_progress_url_wins() {
        let settings = ClientSettings {
            progress_url: Some(Url::parse("ws://127.0.0.1:9/ws").unwrap()),
            ..ClientSettings::default()
        };
        assert_eq!(
            settings.progress_endpoint().unwrap().as_str(),
            "ws://127.0.0.1:9/ws"
        );
    }

    #[test]
    fn rejects_garbage_base() {
        let err = ClientSettings::with_base_url("not a url").unwrap_err();
        assert_eq!(err.kind, FailureKind::InvalidUrl);
    }
}
