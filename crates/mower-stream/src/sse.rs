//! Server-sent events transport.
//!
//! Opens `GET {base_url}{endpoint}` with `Accept: text/event-stream` and turns
//! the chunked body into a stream of event payloads.
//!
//! Framing handled by `SseDecoder`:
//! - lines end in LF or CRLF, a blank line dispatches the pending event
//! - `data:` lines accumulate and are joined with `\n`
//! - lines starting with `:` are comments (keep-alives)
//! - only unnamed events and `event: message` are delivered
//! - `id` and `retry` are ignored since there is no replay or auto-reconnect
//! - a line or event longer than the decoder limit fails the stream

use crate::error::{StreamError, StreamResult};
use crate::transport::{ConnectFuture, MessageStream, Transport};
use futures_util::{FutureExt, Stream, StreamExt};
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use reqwest::Client;
use std::collections::VecDeque;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default cap on one pending line and on one event's accumulated data.
pub const DEFAULT_MAX_LINE_LEN: usize = 1024 * 1024;

/// SSE transport configuration.
#[derive(Debug, Clone)]
pub struct SseConfig {
    /// Base URL the endpoints are appended to (e.g. "http://mower.local:4006").
    pub base_url: String,
    /// TCP connect timeout.
    pub connect_timeout_ms: u64,
}

impl Default for SseConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:4006".to_string(),
            connect_timeout_ms: 5000,
        }
    }
}

/// `Transport` over HTTP server-sent events.
#[derive(Debug, Clone)]
pub struct SseTransport {
    client: Client,
    base_url: String,
}

impl SseTransport {
    /// Create a new SSE transport.
    ///
    /// Only the connect phase is bounded: the body of an event stream never
    /// completes, so no total request timeout is set.
    pub fn new(config: SseConfig) -> StreamResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .build()
            .map_err(|e| StreamError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url_for(&self, endpoint: &str) -> String {
        if endpoint.starts_with('/') {
            format!("{}{}", self.base_url, endpoint)
        } else {
            format!("{}/{}", self.base_url, endpoint)
        }
    }
}

impl Transport for SseTransport {
    fn connect(&self, endpoint: &str) -> ConnectFuture {
        let client = self.client.clone();
        let url = self.url_for(endpoint);

        async move {
            info!(url = %url, "Opening event stream");

            let response = client
                .get(&url)
                .header(ACCEPT, "text/event-stream")
                .header(CACHE_CONTROL, "no-cache")
                .send()
                .await
                .map_err(|e| StreamError::ConnectionFailed(format!("HTTP request failed: {e}")))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(StreamError::HttpStatus {
                    status: status.as_u16(),
                    body,
                });
            }

            debug!(url = %url, "Event stream open");
            Ok(sse_messages(response.bytes_stream()))
        }
        .boxed()
    }
}

/// Adapt a chunked byte stream into a stream of SSE event payloads.
///
/// A read error is yielded once and ends the stream.
pub fn sse_messages<S, B, E>(bytes: S) -> MessageStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let state = (bytes.boxed(), SseDecoder::new(), VecDeque::new(), false);

    futures_util::stream::unfold(
        state,
        |(mut bytes, mut decoder, mut pending, mut done)| async move {
            loop {
                if let Some(message) = pending.pop_front() {
                    return Some((Ok(message), (bytes, decoder, pending, done)));
                }
                if done {
                    return None;
                }
                match bytes.next().await {
                    Some(Ok(chunk)) => match decoder.feed(chunk.as_ref()) {
                        Ok(messages) => pending.extend(messages),
                        Err(e) => {
                            done = true;
                            pending.clear();
                            return Some((Err(e), (bytes, decoder, pending, done)));
                        }
                    },
                    Some(Err(e)) => {
                        done = true;
                        let err = StreamError::ReadFailed(e.to_string());
                        return Some((Err(err), (bytes, decoder, pending, done)));
                    }
                    // An unterminated trailing event is dropped.
                    None => done = true,
                }
            }
        },
    )
    .boxed()
}

/// Incremental `text/event-stream` parser.
#[derive(Debug)]
pub struct SseDecoder {
    buf: Vec<u8>,
    data: Vec<String>,
    data_len: usize,
    event: Option<String>,
    max_line_len: usize,
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self::with_max_line_len(DEFAULT_MAX_LINE_LEN)
    }
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_line_len(max_line_len: usize) -> Self {
        Self {
            buf: Vec::new(),
            data: Vec::new(),
            data_len: 0,
            event: None,
            max_line_len,
        }
    }

    /// Feed a chunk of bytes; returns the payloads of every event completed
    /// by it, in order.
    ///
    /// Fails with `ReadFailed` once an unterminated line or the data of one
    /// event exceeds the limit. The decoder is unusable afterwards.
    pub fn feed(&mut self, chunk: &[u8]) -> StreamResult<Vec<String>> {
        self.buf.extend_from_slice(chunk);

        let mut out = Vec::new();
        // Multi-byte UTF-8 sequences never contain b'\n', so splitting on it
        // before decoding is safe across chunk boundaries.
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            let line = String::from_utf8_lossy(&line);
            if let Some(message) = self.process_line(&line) {
                out.push(message);
            }
            if self.data_len > self.max_line_len {
                return Err(self.overflow("event data"));
            }
        }

        if self.buf.len() > self.max_line_len {
            return Err(self.overflow("line"));
        }
        Ok(out)
    }

    fn overflow(&mut self, what: &str) -> StreamError {
        warn!(limit = self.max_line_len, what, "Event stream exceeded size limit");
        self.buf.clear();
        self.data.clear();
        self.data_len = 0;
        StreamError::ReadFailed(format!("{what} exceeds {} bytes", self.max_line_len))
    }

    fn process_line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "data" => {
                self.data_len += value.len();
                self.data.push(value.to_string());
            }
            "event" => self.event = Some(value.to_string()),
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<String> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        let payload = self.data.join("\n");
        self.data.clear();
        self.data_len = 0;

        match event.as_deref() {
            None | Some("") | Some("message") => Some(payload),
            Some(other) => {
                debug!(event = other, "Ignoring named event");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoder_single_event() {
        let mut decoder = SseDecoder::new();
        assert_eq!(decoder.feed(b"data: {\"A\":1}\n\n").unwrap(), vec!["{\"A\":1}"]);
    }

    #[test]
    fn test_decoder_event_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"da").unwrap().is_empty());
        assert!(decoder.feed(b"ta: hel").unwrap().is_empty());
        assert!(decoder.feed(b"lo\r\n").unwrap().is_empty());
        assert_eq!(decoder.feed(b"\r\n").unwrap(), vec!["hello"]);
    }

    #[test]
    fn test_decoder_multiline_data_and_comments() {
        let mut decoder = SseDecoder::new();
        let out = decoder.feed(b": keep-alive\n\ndata:first\ndata: second\n\n").unwrap();
        assert_eq!(out, vec!["first\nsecond"]);
    }

    #[test]
    fn test_decoder_message_event_name() {
        let mut decoder = SseDecoder::new();
        let out = decoder
            .feed(b"event:message\ndata:{}\n\nevent: ping\ndata: x\n\ndata: y\n\n")
            .unwrap();
        assert_eq!(out, vec!["{}", "y"]);
    }

    #[test]
    fn test_decoder_ignores_id_and_retry() {
        let mut decoder = SseDecoder::new();
        let out = decoder.feed(b"id: 7\nretry: 1000\ndata: z\n\n").unwrap();
        assert_eq!(out, vec!["z"]);
    }

    #[test]
    fn test_decoder_utf8_split_inside_code_point() {
        let mut decoder = SseDecoder::new();
        let bytes = "data: 24.5°C\n\n".as_bytes();
        // split inside the two byte '°'
        let cut = bytes.iter().position(|&b| b == 0xC2).unwrap() + 1;
        assert!(decoder.feed(&bytes[..cut]).unwrap().is_empty());
        assert_eq!(decoder.feed(&bytes[cut..]).unwrap(), vec!["24.5°C"]);
    }

    #[test]
    fn test_decoder_rejects_unterminated_long_line() {
        let mut decoder = SseDecoder::with_max_line_len(16);
        assert!(decoder.feed(b"data: 0123456789").unwrap().is_empty());
        let err = decoder.feed(b"abcdef").unwrap_err();
        assert!(matches!(err, StreamError::ReadFailed(ref m) if m.contains("16 bytes")));
    }

    #[test]
    fn test_decoder_rejects_oversized_event_data() {
        let mut decoder = SseDecoder::with_max_line_len(16);
        // each line fits, the event as a whole does not
        assert!(decoder.feed(b"data: 0123456789
").unwrap().is_empty());
        assert!(decoder.feed(b"data: 0123456789
").is_err());
    }

    #[test]
    fn test_decoder_limit_allows_complete_events() {
        let mut decoder = SseDecoder::with_max_line_len(16);
        for _ in 0..4 {
            assert_eq!(decoder.feed(b"data: 0123456789

").unwrap(), vec!["0123456789"]);
        }
    }

    #[tokio::test]
    async fn test_sse_messages_fails_on_endless_line() {
        let chunk = vec![b'x'; DEFAULT_MAX_LINE_LEN + 1];
        let chunks: Vec<Result<Vec<u8>, std::io::Error>> = vec![
            Ok(b"data: a\n\n".to_vec()),
            Ok(chunk),
            Ok(b"\ndata: never\n\n".to_vec()),
        ];
        let messages: Vec<_> = sse_messages(futures_util::stream::iter(chunks))
            .collect()
            .await;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].as_ref().unwrap(), "a");
        assert!(matches!(messages[1], Err(StreamError::ReadFailed(_))));
    }

    #[tokio::test]
    async fn test_sse_messages_drops_unterminated_tail() {
        let chunks: Vec<Result<&'static [u8], std::io::Error>> =
            vec![Ok(&b"data: a\n\n"[..]), Ok(&b"data: b\n"[..])];
        let messages: Vec<_> = sse_messages(futures_util::stream::iter(chunks))
            .collect()
            .await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].as_ref().unwrap(), "a");
    }

    #[tokio::test]
    async fn test_sse_messages_read_error_ends_stream() {
        let chunks: Vec<Result<&'static [u8], std::io::Error>> = vec![
            Ok(&b"data: a\n\n"[..]),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
            Ok(&b"data: never\n\n"[..]),
        ];
        let messages: Vec<_> = sse_messages(futures_util::stream::iter(chunks))
            .collect()
            .await;
        assert_eq!(messages.len(), 2);
        assert!(matches!(messages[1], Err(StreamError::ReadFailed(_))));
    }

    #[test]
    fn test_url_for() {
        let transport = SseTransport::new(SseConfig {
            base_url: "http://mower.local:4006/".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            transport.url_for("/api/openmower/subscribe/gps"),
            "http://mower.local:4006/api/openmower/subscribe/gps"
        );
        assert_eq!(transport.url_for("status"), "http://mower.local:4006/status");
    }
}
