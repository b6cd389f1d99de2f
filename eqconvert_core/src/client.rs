use crate::protocol::{ContentHash, GraphSpl, GraphSplDetails, SpeakerEq, TargetFormat, UploadOutcome};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("backend request failed: status={status} body={body}")]
    BadStatus { status: StatusCode, body: String },
    #[error("backend response parse failed: {0}")]
    Parse(String),
}

/// One file handed to the upload endpoint.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// The backend REST surface, one method per operation.
///
/// `HttpBackend` is the production implementation; tests drive the session
/// through a mock.
#[allow(async_fn_in_trait)]
pub trait Backend {
    async fn upload(&self, files: Vec<UploadFile>) -> Result<Vec<UploadOutcome>, ClientError>;

    async fn speakers(&self) -> Result<Vec<String>, ClientError>;

    async fn brands(&self) -> Result<Vec<String>, ClientError>;

    async fn speaker_eqdata(&self, speaker: &str) -> Result<Vec<SpeakerEq>, ClientError>;

    /// Fetch a single-hash conversion target. The raw JSON value is returned
    /// so the converter can interpret the format's response shape.
    async fn eq_target(
        &self,
        format: TargetFormat,
        hash: &ContentHash,
    ) -> Result<serde_json::Value, ClientError>;

    /// Fetch the dual-hash room correction target.
    async fn eq_target_room(
        &self,
        left: &ContentHash,
        right: &ContentHash,
    ) -> Result<serde_json::Value, ClientError>;

    async fn graph_spl(&self, hash: &ContentHash) -> Result<GraphSpl, ClientError>;

    async fn graph_spl_details(&self, hash: &ContentHash) -> Result<GraphSplDetails, ClientError>;
}

pub struct HttpBackend {
    http: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// `base_url` includes the API version prefix, e.g.
    /// `http://127.0.0.1:8000/v1`.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(http_timeout())
            .gzip(true)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ClientError> {
        let response = self
            .http
            .get(self.url(path))
            .query(query)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::BadStatus { status, body });
        }
        response
            .json::<T>()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))
    }
}

fn http_timeout() -> Duration {
    let env = std::env::var("EQCONVERT_HTTP_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok());
    let secs = env.unwrap_or(30).clamp(5, 120);
    Duration::from_secs(secs)
}

impl Backend for HttpBackend {
    async fn upload(&self, files: Vec<UploadFile>) -> Result<Vec<UploadOutcome>, ClientError> {
        let mut form = reqwest::multipart::Form::new();
        for file in files {
            form = form.part(
                "files",
                reqwest::multipart::Part::bytes(file.bytes).file_name(file.filename),
            );
        }
        let response = self
            .http
            .post(self.url("/eq/upload"))
            .multipart(form)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::BadStatus { status, body });
        }
        response
            .json::<Vec<UploadOutcome>>()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))
    }

    async fn speakers(&self) -> Result<Vec<String>, ClientError> {
        self.get_json("/speakers", &[]).await
    }

    async fn brands(&self) -> Result<Vec<String>, ClientError> {
        self.get_json("/brands", &[]).await
    }

    async fn speaker_eqdata(&self, speaker: &str) -> Result<Vec<SpeakerEq>, ClientError> {
        self.get_json(&format!("/speaker/{speaker}/eqdata"), &[]).await
    }

    async fn eq_target(
        &self,
        format: TargetFormat,
        hash: &ContentHash,
    ) -> Result<serde_json::Value, ClientError> {
        let path = format!("/eq/target/{}", format.endpoint());
        self.get_json(&path, &[("hash", hash.as_str())]).await
    }

    async fn eq_target_room(
        &self,
        left: &ContentHash,
        right: &ContentHash,
    ) -> Result<serde_json::Value, ClientError> {
        self.get_json(
            "/eq/target/rme_totalmix_room",
            &[("hash_left", left.as_str()), ("hash_right", right.as_str())],
        )
        .await
    }

    async fn graph_spl(&self, hash: &ContentHash) -> Result<GraphSpl, ClientError> {
        self.get_json("/eq/graph_spl", &[("hash", hash.as_str())]).await
    }

    async fn graph_spl_details(&self, hash: &ContentHash) -> Result<GraphSplDetails, ClientError> {
        self.get_json("/eq/graph_spl_details", &[("hash", hash.as_str())])
            .await
    }
}
