//! NDJSON response body
//!
//! The body is driven by the client: each poll pulls at most one record from
//! the store cursor, so a slow reader holds the cursor back instead of
//! filling memory. A disconnect drops the body, which drops the cursor.

use std::io;

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use futures::{Stream, StreamExt};
use idesk_common::ndjson::{self, encode_line};
use serde::Serialize;
use tracing::{debug, error};

/// Stream every item of `records` as one NDJSON line
///
/// A store error after the headers are sent cannot change the status code
/// any more. It is logged and the body fails, so the transfer is cut off
/// without its terminating chunk and clients see an incomplete response
/// rather than a short but well-formed feed.
pub fn ndjson_response<S, T>(feed: &'static str, records: S, cache_control: &'static str) -> Response
where
    S: Stream<Item = idesk_common::Result<T>> + Send + 'static,
    T: Serialize + Send + 'static,
{
    let lines = async_stream::stream! {
        let mut records = Box::pin(records);
        let mut sent = 0usize;
        let mut failed = false;

        while let Some(item) = records.next().await {
            let line = item.and_then(|record| encode_line(&record));
            match line {
                Ok(line) => {
                    sent += 1;
                    yield Ok::<Bytes, io::Error>(Bytes::from(line));
                }
                Err(e) => {
                    error!("{} feed aborted after {} records: {}", feed, sent, e);
                    failed = true;
                    yield Err(io::Error::other(e.to_string()));
                    break;
                }
            }
        }

        if !failed {
            debug!("{} feed finished: {} records", feed, sent);
        }
    };

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(ndjson::CONTENT_TYPE)),
            (header::CACHE_CONTROL, HeaderValue::from_static(cache_control)),
        ],
        Body::from_stream(lines),
    )
        .into_response()
}
