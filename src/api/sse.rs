//! Server-sent event decoding for streamed consult replies
//!
//! The backend streams one JSON object per line:
//!
//! ```text
//! data: {"text": "Hello"}
//! data: {"text": " there"}
//! data: [DONE]
//! ```
//!
//! [`SseDecoder`] turns raw body chunks into [`SseEvent`]s, buffering bytes
//! until a full line is available so multi-byte characters split across
//! chunks decode correctly. [`ConsultStream`] wraps a decoded body as a
//! pull-based sequence of text fragments.

use std::collections::VecDeque;
use std::fmt::Display;
use std::pin::Pin;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::Deserialize;

use crate::error::{Result, SilError};

/// Marker that ends a consult stream normally
const DONE_MARKER: &str = "[DONE]";

/// Prefix of every payload line
const DATA_PREFIX: &str = "data: ";

/// One decoded line of the stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    /// A text fragment to append to the reply
    Text(String),
    /// `data: [DONE]`
    Done,
}

#[derive(Debug, Deserialize)]
struct TextChunk {
    #[serde(default)]
    text: Option<String>,
}

/// Incremental line decoder
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one body chunk and return the events completed by it
    ///
    /// # Examples
    ///
    /// ```
    /// use sil_consult::api::sse::{SseDecoder, SseEvent};
    ///
    /// let mut decoder = SseDecoder::new();
    /// assert!(decoder.push(b"data: {\"text\": \"Hi\"").is_empty());
    /// assert_eq!(decoder.push(b"}\n"), vec![SseEvent::Text("Hi".to_string())]);
    /// assert_eq!(decoder.push(b"data: [DONE]\n"), vec![SseEvent::Done]);
    /// ```
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(event) = parse_line(&line[..line.len() - 1]) {
                events.push(event);
            }
        }
        events
    }

    /// Decode whatever is left once the body has ended
    pub fn finish(&mut self) -> Option<SseEvent> {
        let rest = std::mem::take(&mut self.buffer);
        parse_line(&rest)
    }
}

/// Parse one line; non-data lines and malformed JSON yield nothing
fn parse_line(raw: &[u8]) -> Option<SseEvent> {
    let line = String::from_utf8_lossy(raw);
    let line = line.trim_end_matches('\r');
    let data = line.strip_prefix(DATA_PREFIX)?;

    if data == DONE_MARKER {
        return Some(SseEvent::Done);
    }

    match serde_json::from_str::<TextChunk>(data) {
        Ok(chunk) => chunk
            .text
            .filter(|text| !text.is_empty())
            .map(SseEvent::Text),
        Err(e) => {
            tracing::debug!("Skipping malformed stream line: {}", e);
            None
        }
    }
}

/// Boxed fragment sequence
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Pull-based sequence of reply fragments
///
/// Each fragment is produced only when the caller asks for the next one.
/// The sequence is finite and not restartable: after `None`, an error, or
/// [`ConsultStream::close`], every further call returns `None`. Closing (or
/// dropping) the stream drops the underlying response and releases the
/// connection.
pub struct ConsultStream {
    inner: Option<FragmentStream>,
}

impl std::fmt::Debug for ConsultStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsultStream")
            .field("closed", &self.inner.is_none())
            .finish()
    }
}

struct DecodeState<S> {
    bytes: Pin<Box<S>>,
    decoder: SseDecoder,
    pending: VecDeque<String>,
    failure: Option<SilError>,
    finished: bool,
}

impl ConsultStream {
    /// Wrap an already-decoded fragment sequence
    pub fn new(fragments: impl Stream<Item = Result<String>> + Send + 'static) -> Self {
        Self {
            inner: Some(Box::pin(fragments)),
        }
    }

    /// Decode a raw SSE response body
    ///
    /// A transport error while reading surfaces as [`SilError::Stream`]
    /// after the fragments decoded before it.
    pub fn from_bytes<S, E>(bytes: S) -> Self
    where
        S: Stream<Item = std::result::Result<Bytes, E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let state = DecodeState {
            bytes: Box::pin(bytes),
            decoder: SseDecoder::new(),
            pending: VecDeque::new(),
            failure: None,
            finished: false,
        };

        let fragments = futures::stream::unfold(state, |mut st| async move {
            loop {
                if let Some(text) = st.pending.pop_front() {
                    return Some((Ok(text), st));
                }
                if let Some(err) = st.failure.take() {
                    return Some((Err(anyhow::Error::from(err)), st));
                }
                if st.finished {
                    return None;
                }

                match st.bytes.next().await {
                    Some(Ok(chunk)) => {
                        for event in st.decoder.push(&chunk) {
                            match event {
                                SseEvent::Text(text) => st.pending.push_back(text),
                                SseEvent::Done => {
                                    st.finished = true;
                                    break;
                                }
                            }
                        }
                    }
                    Some(Err(e)) => {
                        tracing::warn!("Consult stream broke: {}", e);
                        st.finished = true;
                        st.failure = Some(SilError::Stream(e.to_string()));
                    }
                    None => {
                        st.finished = true;
                        if let Some(SseEvent::Text(text)) = st.decoder.finish() {
                            st.pending.push_back(text);
                        }
                    }
                }
            }
        });

        Self::new(fragments)
    }

    /// Next fragment, or `None` once the stream has ended
    pub async fn next_fragment(&mut self) -> Option<Result<String>> {
        let inner = self.inner.as_mut()?;
        match inner.next().await {
            Some(Ok(text)) => Some(Ok(text)),
            Some(Err(e)) => {
                self.inner = None;
                Some(Err(e))
            }
            None => {
                self.inner = None;
                None
            }
        }
    }

    /// Stop consuming and release the connection
    pub fn close(&mut self) {
        if self.inner.take().is_some() {
            tracing::debug!("Consult stream closed by consumer");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(chunks: &[&str]) -> ConsultStream {
        let items: Vec<std::result::Result<Bytes, String>> = chunks
            .iter()
            .map(|c| Ok(Bytes::from(c.to_string())))
            .collect();
        ConsultStream::from_bytes(futures::stream::iter(items))
    }

    async fn collect(mut stream: ConsultStream) -> (Vec<String>, Option<anyhow::Error>) {
        let mut out = Vec::new();
        while let Some(item) = stream.next_fragment().await {
            match item {
                Ok(text) => out.push(text),
                Err(e) => return (out, Some(e)),
            }
        }
        (out, None)
    }

    #[test]
    fn test_decoder_skips_non_data_and_malformed_lines() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(
            b": comment\nevent: message\ndata: {not json}\ndata: {\"text\": \"ok\"}\n",
        );
        assert_eq!(events, vec![SseEvent::Text("ok".to_string())]);
    }

    #[test]
    fn test_decoder_handles_crlf_and_empty_text() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(b"data: {\"text\": \"\"}\r\ndata: {\"text\": \"a\"}\r\n");
        assert_eq!(events, vec![SseEvent::Text("a".to_string())]);
    }

    #[test]
    fn test_decoder_joins_multibyte_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        let line = "data: {\"text\": \"피부\"}\n".as_bytes();
        let (a, b) = line.split_at(18);
        assert!(decoder.push(a).is_empty());
        assert_eq!(decoder.push(b), vec![SseEvent::Text("피부".to_string())]);
    }

    #[test]
    fn test_decoder_finish_parses_trailing_line() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: {\"text\": \"tail\"}").is_empty());
        assert_eq!(decoder.finish(), Some(SseEvent::Text("tail".to_string())));
        assert_eq!(decoder.finish(), None);
    }

    #[tokio::test]
    async fn test_stream_yields_fragments_until_done() {
        let stream = body(&[
            "data: {\"text\": \"Hi\"}\n",
            "data: {\"text\": \" there\"}\ndata: {\"text\": \"!\"}\n",
            "data: [DONE]\ndata: {\"text\": \"ignored\"}\n",
        ]);
        let (fragments, err) = collect(stream).await;
        assert_eq!(fragments, vec!["Hi", " there", "!"]);
        assert!(err.is_none());
    }

    #[tokio::test]
    async fn test_stream_skips_malformed_line_without_aborting() {
        let stream = body(&["data: {\"text\": \"a\"}\ndata: {oops\ndata: {\"text\": \"b\"}\n"]);
        let (fragments, err) = collect(stream).await;
        assert_eq!(fragments, vec!["a", "b"]);
        assert!(err.is_none());
    }

    #[tokio::test]
    async fn test_stream_error_after_partial_fragments() {
        let items: Vec<std::result::Result<Bytes, String>> = vec![
            Ok(Bytes::from("data: {\"text\": \"Hi\"}\n")),
            Err("connection reset".to_string()),
        ];
        let mut stream = ConsultStream::from_bytes(futures::stream::iter(items));

        assert_eq!(stream.next_fragment().await.unwrap().unwrap(), "Hi");
        let err = stream.next_fragment().await.unwrap().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SilError>(),
            Some(SilError::Stream(_))
        ));
        assert!(stream.is_closed());
        assert!(stream.next_fragment().await.is_none());
    }

    #[tokio::test]
    async fn test_close_stops_iteration() {
        let mut stream = body(&["data: {\"text\": \"a\"}\ndata: {\"text\": \"b\"}\n"]);
        assert_eq!(stream.next_fragment().await.unwrap().unwrap(), "a");
        stream.close();
        assert!(stream.is_closed());
        assert!(stream.next_fragment().await.is_none());
    }

    #[tokio::test]
    async fn test_new_wraps_plain_fragments() {
        let mut stream = ConsultStream::new(futures::stream::iter(vec![Ok("x".to_string())]));
        assert_eq!(stream.next_fragment().await.unwrap().unwrap(), "x");
        assert!(stream.next_fragment().await.is_none());
    }
}
