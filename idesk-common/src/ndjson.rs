//! Newline-delimited JSON framing
//!
//! Producers write one compact JSON value per line. Consumers receive bytes
//! in arbitrary chunks, so [`NdjsonDecoder`] buffers the trailing partial
//! line (possibly ending mid UTF-8 sequence) until its newline arrives.
//! Lines that fail to parse are logged and skipped without ending the feed.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::Result;

/// Media type for NDJSON responses
pub const CONTENT_TYPE: &str = "application/x-ndjson";

/// Serialize `value` as one NDJSON line, trailing newline included
pub fn encode_line<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut line = serde_json::to_vec(value)?;
    line.push(b'\n');
    Ok(line)
}

/// Incremental NDJSON decoder
#[derive(Debug)]
pub struct NdjsonDecoder<T> {
    buffer: Vec<u8>,
    skipped: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Default for NdjsonDecoder<T> {
    fn default() -> Self {
        Self {
            buffer: Vec::new(),
            skipped: 0,
            _marker: PhantomData,
        }
    }
}

impl<T: DeserializeOwned> NdjsonDecoder<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk; returns every value completed by it, in order
    pub fn push(&mut self, chunk: &[u8]) -> Vec<T> {
        self.buffer.extend_from_slice(chunk);

        let Some(last_newline) = self.buffer.iter().rposition(|&b| b == b'\n') else {
            return Vec::new();
        };

        let complete: Vec<u8> = self.buffer.drain(..=last_newline).collect();
        complete
            .split(|&b| b == b'\n')
            .filter_map(|line| self.parse_line(line))
            .collect()
    }

    /// End of input: parse whatever unterminated line is left
    pub fn finish(mut self) -> Option<T> {
        let rest = std::mem::take(&mut self.buffer);
        self.parse_line(&rest)
    }

    /// Number of non-blank lines dropped as unparseable so far
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Bytes held back waiting for a newline
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    fn parse_line(&mut self, line: &[u8]) -> Option<T> {
        let line = line.trim_ascii();
        if line.is_empty() {
            return None;
        }

        match serde_json::from_slice(line) {
            Ok(value) => Some(value),
            Err(e) => {
                self.skipped += 1;
                warn!("Failed to parse NDJSON line ({} bytes): {}", line.len(), e);
                None
            }
        }
    }
}
