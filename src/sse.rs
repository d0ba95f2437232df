//! Server-Sent Events (SSE) processing for streaming chat replies.
//!
//! This module turns the raw byte stream of `POST /api/chat` into a stream of
//! [`StreamEvent`]s.  Bytes are buffered until a full line is available, so an
//! event record split across network chunks (even inside a multi-byte UTF-8
//! character) is reassembled rather than lost.  Lines that are not well-formed
//! `data:` records are dropped without ending the stream.

use std::collections::VecDeque;

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};

use crate::observability::{STREAM_BYTES, STREAM_ERRORS, STREAM_EVENTS, STREAM_MALFORMED};
use crate::{Error, Result, StreamEvent};

/// SSE field marker for event payloads.
const DATA_PREFIX: &str = "data:";

/// Payload some servers send instead of a typed done record.
const DONE_SENTINEL: &str = "[DONE]";

/// Splits a byte stream into lines, carrying any trailing partial line over to
/// the next chunk.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: Vec<u8>,
}

impl LineDecoder {
    /// Creates an empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `chunk` and returns every line it completed, without the line
    /// terminator.  Lines that are not valid UTF-8 are dropped.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);
        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.buffer[start..].iter().position(|b| *b == b'\n') {
            let end = start + offset;
            if let Some(line) = decode_line(&self.buffer[start..end]) {
                lines.push(line);
            }
            start = end + 1;
        }
        self.buffer.drain(..start);
        lines
    }

    /// Returns the unterminated remainder, if any, and resets the decoder.
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.buffer);
        decode_line(&rest)
    }

    /// Number of bytes waiting for a line terminator.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

fn decode_line(bytes: &[u8]) -> Option<String> {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => Some(text.to_string()),
        Err(err) => {
            tracing::debug!(error = %err, "dropping SSE line with invalid UTF-8");
            STREAM_MALFORMED.click();
            None
        }
    }
}

/// Parse one SSE line into an event.
///
/// Returns `None` for blank lines, comments, non-data fields and malformed
/// payloads.
pub fn parse_line(line: &str) -> Option<StreamEvent> {
    let payload = line.strip_prefix(DATA_PREFIX)?.trim();
    if payload.is_empty() {
        return None;
    }
    if payload == DONE_SENTINEL {
        return Some(StreamEvent::Done);
    }
    match serde_json::from_str::<StreamEvent>(payload) {
        Ok(event) => Some(event),
        Err(err) => {
            tracing::debug!(error = %err, payload, "dropping malformed SSE record");
            STREAM_MALFORMED.click();
            None
        }
    }
}

/// Process a stream of bytes into a stream of chat events.
///
/// The returned stream is lazy, finite and not restartable.  A transport error
/// is yielded once as [`Error::Streaming`] and ends the stream.
pub fn process_sse<S, E>(byte_stream: S) -> impl Stream<Item = Result<StreamEvent>> + Send
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Unpin + Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    let state = SseState {
        stream: byte_stream,
        decoder: LineDecoder::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(event) = state.pending.pop_front() {
                STREAM_EVENTS.click();
                return Some((Ok(event), state));
            }
            if state.finished {
                return None;
            }

            match state.stream.next().await {
                Some(Ok(bytes)) => {
                    STREAM_BYTES.count(bytes.len() as u64);
                    for line in state.decoder.push(&bytes) {
                        state.pending.extend(parse_line(&line));
                    }
                }
                Some(Err(err)) => {
                    STREAM_ERRORS.click();
                    state.finished = true;
                    let err = Error::streaming(
                        format!("Error in HTTP stream: {err}"),
                        Some(Box::new(err)),
                    );
                    return Some((Err(err), state));
                }
                None => {
                    state.finished = true;
                    if let Some(line) = state.decoder.finish() {
                        state.pending.extend(parse_line(&line));
                    }
                }
            }
        }
    })
}

struct SseState<S> {
    stream: S,
    decoder: LineDecoder,
    pending: VecDeque<StreamEvent>,
    finished: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    type ByteChunks = stream::Iter<std::vec::IntoIter<std::result::Result<Bytes, io::Error>>>;

    fn chunks(parts: &[&[u8]]) -> ByteChunks {
        let items: Vec<_> = parts
            .iter()
            .map(|part| Ok(Bytes::copy_from_slice(part)))
            .collect();
        stream::iter(items)
    }

    async fn collect(parts: &[&[u8]]) -> Vec<Result<StreamEvent>> {
        process_sse(chunks(parts)).collect().await
    }

    #[tokio::test]
    async fn parse_token_and_done() {
        let events = collect(&[
            b"data: {\"type\":\"token\",\"content\":\"Great\"}\n\ndata: {\"type\":\"done\"}\n\n",
        ])
        .await;
        let events: Vec<_> = events.into_iter().map(|e| e.unwrap()).collect();
        assert_eq!(events, vec![StreamEvent::token("Great"), StreamEvent::Done]);
    }

    #[tokio::test]
    async fn handle_split_event() {
        let events = collect(&[
            b"data: {\"type\":\"tok",
            b"en\",\"content\":\"ok\"}\n",
            b"\n",
        ])
        .await;
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], Ok(StreamEvent::Token { content }) if content == "ok"));
    }

    #[tokio::test]
    async fn handle_split_utf8_character() {
        let line = "data: {\"type\":\"token\",\"content\":\"5 km \u{2713}\"}\n".as_bytes();
        // Split inside the three-byte check mark.
        let cut = line.len() - 5;
        let events = collect(&[&line[..cut], &line[cut..]]).await;
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0].as_ref().unwrap(),
            &StreamEvent::token("5 km \u{2713}")
        );
    }

    #[tokio::test]
    async fn malformed_line_does_not_end_stream() {
        let events = collect(&[
            b"data: {malformed\n",
            b"data: {\"type\":\"token\",\"content\":\"ok\"}\n",
        ])
        .await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].as_ref().unwrap(), &StreamEvent::token("ok"));
    }

    #[tokio::test]
    async fn unknown_type_and_other_fields_are_skipped() {
        let events = collect(&[
            b": keep-alive\nevent: message\nid: 7\ndata: {\"type\":\"ping\"}\ndata:\n",
            b"data: {\"type\":\"error\",\"message\":\"quota\"}\r\n",
        ])
        .await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].as_ref().unwrap(), &StreamEvent::error("quota"));
    }

    #[tokio::test]
    async fn trailing_line_without_newline_is_flushed() {
        let events = collect(&[b"data: {\"type\":\"done\"}"]).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].as_ref().unwrap(), &StreamEvent::Done);
    }

    #[tokio::test]
    async fn transport_error_ends_stream() {
        let items: Vec<std::result::Result<Bytes, io::Error>> = vec![
            Ok(Bytes::from_static(b"data: {\"type\":\"token\",\"content\":\"a\"}\n")),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset")),
            Ok(Bytes::from_static(b"data: {\"type\":\"token\",\"content\":\"b\"}\n")),
        ];
        let events: Vec<_> = process_sse(stream::iter(items)).collect().await;
        assert_eq!(events.len(), 2);
        assert!(events[0].is_ok());
        assert!(matches!(&events[1], Err(e) if e.is_streaming()));
    }

    #[test]
    fn line_decoder_keeps_partial_line() {
        let mut decoder = LineDecoder::new();
        assert!(decoder.push(b"data: a").is_empty());
        assert_eq!(decoder.pending(), 7);
        assert_eq!(decoder.push(b"bc\r\ndata: d"), vec!["data: abc".to_string()]);
        assert_eq!(decoder.finish(), Some("data: d".to_string()));
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn line_decoder_drops_invalid_utf8() {
        let mut decoder = LineDecoder::new();
        let lines = decoder.push(b"data: \xff\xfe\ndata: fine\n");
        assert_eq!(lines, vec!["data: fine".to_string()]);
    }

    #[test]
    fn parse_line_accepts_missing_space_and_done_sentinel() {
        assert_eq!(
            parse_line("data:{\"type\":\"token\",\"content\":\" job\"}"),
            Some(StreamEvent::token(" job"))
        );
        assert_eq!(parse_line("data: [DONE]"), Some(StreamEvent::Done));
        assert_eq!(parse_line("event: token"), None);
        assert_eq!(parse_line(""), None);
    }
}
