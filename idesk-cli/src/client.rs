//! HTTP client for idesk-api
//!
//! Feed responses are decoded as they arrive: each network chunk goes
//! through an [`NdjsonDecoder`], so records are available before the server
//! has finished sending.

use futures::stream::{BoxStream, StreamExt};
use idesk_common::api::{ErrorResponse, PatchResponse, RoundPatch, StatusPatch};
use idesk_common::ndjson::NdjsonDecoder;
use idesk_common::report::Report;
use idesk_common::MismatchRecord;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

const USER_AGENT: &str = concat!("idesk/", env!("CARGO_PKG_VERSION"));

/// Default server address, matching the service's default bind
pub const DEFAULT_SERVER: &str = "http://127.0.0.1:5730";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rejected locally: {0}")]
    Rejected(String),
}

/// Records decoded from an NDJSON response, in arrival order
pub type FeedStream<T> = BoxStream<'static, Result<T, ClientError>>;

/// Query for `GET /api/reports`
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_field: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `GET /api/mismatches`
    pub async fn mismatches(&self) -> Result<FeedStream<MismatchRecord>, ClientError> {
        let response = self.http.get(self.url("/api/mismatches")).send().await?;
        Ok(decode_feed(check_response(response).await?))
    }

    /// `GET /api/validations`, optionally restricted to a received-date substring
    pub async fn validations(&self, date: Option<&str>) -> Result<FeedStream<Value>, ClientError> {
        let mut request = self.http.get(self.url("/api/validations"));
        if let Some(date) = date {
            request = request.query(&[("date", date)]);
        }
        let response = request.send().await?;
        Ok(decode_feed(check_response(response).await?))
    }

    /// `PATCH /api/mismatches`
    pub async fn patch_rounds(&self, patch: &RoundPatch) -> Result<PatchResponse, ClientError> {
        self.patch("/api/mismatches", patch).await
    }

    /// `PATCH /api/validations`
    pub async fn patch_status(&self, patch: &StatusPatch) -> Result<PatchResponse, ClientError> {
        self.patch("/api/validations", patch).await
    }

    /// `GET /api/reports`
    pub async fn report(&self, query: &ReportQuery) -> Result<Report, ClientError> {
        let response = self
            .http
            .get(self.url("/api/reports"))
            .query(query)
            .send()
            .await?;
        Ok(check_response(response).await?.json().await?)
    }

    async fn patch<B: Serialize>(&self, path: &str, body: &B) -> Result<PatchResponse, ClientError> {
        let response = self.http.patch(self.url(path)).json(body).send().await?;
        Ok(check_response(response).await?.json().await?)
    }
}

/// Turn a non-success response into [`ClientError::Api`]
///
/// The message comes from the `{"error": ..}` body when there is one.
pub async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|e| e.error)
        .unwrap_or(body);

    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}

/// Decode a streaming NDJSON body
///
/// A transport error is yielded once and ends the stream.
pub fn decode_feed<T>(response: reqwest::Response) -> FeedStream<T>
where
    T: DeserializeOwned + Send + 'static,
{
    let feed = async_stream::stream! {
        let mut decoder = NdjsonDecoder::<T>::new();
        let mut chunks = response.bytes_stream();
        let mut failed = false;

        while let Some(chunk) = chunks.next().await {
            match chunk {
                Ok(bytes) => {
                    for record in decoder.push(&bytes) {
                        yield Ok(record);
                    }
                }
                Err(e) => {
                    failed = true;
                    yield Err(ClientError::from(e));
                    break;
                }
            }
        }

        if !failed {
            if decoder.skipped() > 0 {
                warn!("Skipped {} unparseable feed lines", decoder.skipped());
            }
            if let Some(record) = decoder.finish() {
                yield Ok(record);
            }
            debug!("Feed complete");
        }
    };

    feed.boxed()
}
