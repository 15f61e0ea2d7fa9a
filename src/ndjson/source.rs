use std::pin::{Pin, pin};

use futures::{Stream, StreamExt};
use serde::de::DeserializeOwned;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::NdjsonError;

const READ_CHUNK_SIZE: usize = 16 * 1024;

/// Lazy, single-pass sequence of decoded records. Dropping it releases the
/// underlying reader or response body.
pub type RecordStream<T> = Pin<Box<dyn Stream<Item = Result<T, NdjsonError>> + Send>>;

/// Incremental UTF-8 decoder that tolerates chunks split mid-character.
///
/// Invalid sequences become U+FFFD; a trailing incomplete sequence is held
/// back until the next chunk arrives. One leading byte-order mark is dropped.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
    started: bool,
}

impl Utf8Decoder {
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);

        let mut text = String::new();
        let mut input = &self.pending[..];
        loop {
            match std::str::from_utf8(input) {
                Ok(valid) => {
                    text.push_str(valid);
                    input = &[];
                    break;
                }
                Err(e) => {
                    let (valid, rest) = input.split_at(e.valid_up_to());
                    text.push_str(&String::from_utf8_lossy(valid));
                    match e.error_len() {
                        Some(len) => {
                            text.push(char::REPLACEMENT_CHARACTER);
                            input = &rest[len..];
                        }
                        None => {
                            input = rest;
                            break;
                        }
                    }
                }
            }
        }

        self.pending = input.to_vec();
        self.strip_bom(text)
    }

    fn strip_bom(&mut self, text: String) -> String {
        if self.started || text.is_empty() {
            return text;
        }
        self.started = true;
        match text.strip_prefix('\u{FEFF}') {
            Some(rest) => rest.to_string(),
            None => text,
        }
    }

    /// Flushes at end of input. Leftover bytes are an incomplete character.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            String::new()
        } else {
            self.pending.clear();
            char::REPLACEMENT_CHARACTER.to_string()
        }
    }
}

/// Splits decoded text on `\n`, carrying a partial line across pushes.
#[derive(Debug, Default)]
pub struct LineSplitter {
    buffer: String,
}

impl LineSplitter {
    pub fn push(&mut self, text: &str) -> Vec<String> {
        self.buffer.push_str(text);
        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.find('\n') {
            let mut line: String = self.buffer.drain(..=pos).collect();
            line.pop();
            lines.push(line);
        }
        lines
    }

    /// Whatever is left after the final newline, emitted as the last line.
    pub fn finish(&mut self) -> String {
        std::mem::take(&mut self.buffer)
    }
}

fn parse_line<T: DeserializeOwned>(line: &str, line_number: usize) -> Result<Option<T>, NdjsonError> {
    if line.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(line)
        .map(Some)
        .map_err(|source| NdjsonError::Parse {
            line: line_number,
            source,
        })
}

/// Decodes a byte-chunk stream into records: UTF-8 decode, split on
/// newlines, parse each non-blank line as JSON.
///
/// Records come out in line order. The first non-blank line that is not
/// valid JSON, or the first read error, ends the stream with an `Err`.
pub fn decode_ndjson<S, B, E, T>(chunks: S) -> impl Stream<Item = Result<T, NdjsonError>>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::error::Error + Send + Sync + 'static,
    T: DeserializeOwned,
{
    async_stream::try_stream! {
        let mut chunks = pin!(chunks);
        let mut decoder = Utf8Decoder::default();
        let mut splitter = LineSplitter::default();
        let mut line_number = 0;

        while let Some(chunk) = chunks.next().await {
            let chunk = chunk.map_err(|e| NdjsonError::Read(Box::new(e)))?;
            let text = decoder.decode(chunk.as_ref());
            for line in splitter.push(&text) {
                line_number += 1;
                if let Some(record) = parse_line(&line, line_number)? {
                    yield record;
                }
            }
        }

        let tail = decoder.finish();
        let mut remaining = splitter.push(&tail);
        remaining.push(splitter.finish());
        for line in remaining {
            line_number += 1;
            if let Some(record) = parse_line(&line, line_number)? {
                yield record;
            }
        }
    }
}

/// Reads `reader` in chunks and decodes it as NDJSON.
pub fn from_reader<R, T>(reader: R) -> RecordStream<T>
where
    R: AsyncRead + Unpin + Send + 'static,
    T: DeserializeOwned + Send + 'static,
{
    let chunks = async_stream::stream! {
        let mut reader = reader;
        let mut buf = vec![0u8; READ_CHUNK_SIZE];
        loop {
            match reader.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => yield Ok(buf[..n].to_vec()),
                Err(e) => {
                    yield Err(e);
                    break;
                }
            }
        }
    };
    Box::pin(decode_ndjson(chunks))
}

/// Decodes an HTTP response body as NDJSON while it is still arriving.
pub fn from_response<T>(response: reqwest::Response) -> RecordStream<T>
where
    T: DeserializeOwned + Send + 'static,
{
    Box::pin(decode_ndjson(response.bytes_stream()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use serde::Deserialize;
    use std::convert::Infallible;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::task::{Context, Poll};
    use tokio::io::ReadBuf;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        url: String,
    }

    fn chunked(parts: &[&'static str]) -> impl Stream<Item = Result<&'static [u8], Infallible>> {
        stream::iter(parts.to_vec().into_iter().map(|p| Ok(p.as_bytes())))
    }

    async fn collect(parts: &[&'static str]) -> Vec<Result<Item, NdjsonError>> {
        decode_ndjson(chunked(parts)).collect().await
    }

    fn urls(results: Vec<Result<Item, NdjsonError>>) -> Vec<String> {
        results
            .into_iter()
            .map(|r| r.expect("record").url)
            .collect()
    }

    #[test]
    fn test_decoder_handles_character_split_across_chunks() {
        let bytes = "é€".as_bytes();
        let mut decoder = Utf8Decoder::default();
        let mut text = String::new();
        for b in bytes {
            text.push_str(&decoder.decode(std::slice::from_ref(b)));
        }
        text.push_str(&decoder.finish());
        assert_eq!(text, "é€");
    }

    #[test]
    fn test_decoder_replaces_invalid_and_truncated_bytes() {
        let mut decoder = Utf8Decoder::default();
        assert_eq!(decoder.decode(b"a\xffb\xe2\x82"), "a\u{FFFD}b");
        assert_eq!(decoder.finish(), "\u{FFFD}");
    }

    #[test]
    fn test_decoder_drops_only_the_leading_bom() {
        let mut decoder = Utf8Decoder::default();
        assert_eq!(decoder.decode(b"\xEF\xBB"), "");
        assert_eq!(decoder.decode(b"\xBFa\xEF\xBB\xBF"), "a\u{FEFF}");
        assert_eq!(decoder.decode(b"\xEF\xBB\xBFb"), "\u{FEFF}b");
    }

    #[tokio::test]
    async fn test_bom_prefixed_stream_decodes() {
        let chunks = stream::iter(vec![Ok::<_, Infallible>(
            b"\xEF\xBB\xBF{\"url\":\"a\"}\n{\"url\":\"b\"}\n".to_vec(),
        )]);
        let results: Vec<Result<Item, _>> = decode_ndjson(chunks).collect().await;
        assert_eq!(urls(results), vec!["a", "b"]);
    }

    #[test]
    fn test_splitter_buffers_partial_lines() {
        let mut splitter = LineSplitter::default();
        assert_eq!(splitter.push("ab"), Vec::<String>::new());
        assert_eq!(splitter.push("c\nde\n\nf"), vec!["abc", "de", ""]);
        assert_eq!(splitter.finish(), "f");
        assert_eq!(splitter.finish(), "");
    }

    #[tokio::test]
    async fn test_blank_lines_are_skipped() {
        let results = collect(&["{\"url\":\"a\"}\n\n{\"url\":\"b\"}\n"]).await;
        assert_eq!(urls(results), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_unterminated_last_line_is_flushed() {
        let results = collect(&["{\"url\":\"a\"}\n\n{\"url\":\"b\"}\n{\"url\":\"c\"}"]).await;
        assert_eq!(urls(results), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_line_split_across_chunks() {
        let results = collect(&["{\"ur", "l\":\"a\"}\n{\"url\"", ":\"b\"}\r\n   \n"]).await;
        assert_eq!(urls(results), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_malformed_line_is_fatal() {
        let results = collect(&["{\"url\":\"a\"", "\n{\"url\":\"b\"}\n"]).await;
        assert_eq!(results.len(), 1);
        match &results[0] {
            Err(NdjsonError::Parse { line, .. }) => assert_eq!(*line, 1),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_records_before_a_bad_line_are_delivered() {
        let results = collect(&["{\"url\":\"a\"}\n\nnot json\n{\"url\":\"b\"}\n"]).await;
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].as_ref().expect("first").url, "a");
        assert!(matches!(results[1], Err(NdjsonError::Parse { line: 3, .. })));
    }

    #[tokio::test]
    async fn test_read_error_ends_the_stream() {
        let chunks = stream::iter(vec![
            Ok(b"{\"url\":\"a\"}\n".to_vec()),
            Err(std::io::Error::other("connection reset")),
            Ok(b"{\"url\":\"b\"}\n".to_vec()),
        ]);
        let results: Vec<Result<Item, _>> = decode_ndjson(chunks).collect().await;
        assert_eq!(results.len(), 2);
        assert!(matches!(results[1], Err(NdjsonError::Read(_))));
    }

    struct TrackedReader {
        data: std::io::Cursor<Vec<u8>>,
        released: Arc<AtomicBool>,
    }

    impl AsyncRead for TrackedReader {
        fn poll_read(
            mut self: Pin<&mut Self>,
            cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<std::io::Result<()>> {
            Pin::new(&mut self.data).poll_read(cx, buf)
        }
    }

    impl Drop for TrackedReader {
        fn drop(&mut self) {
            self.released.store(true, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_early_exit_releases_the_reader() {
        let released = Arc::new(AtomicBool::new(false));
        let reader = TrackedReader {
            data: std::io::Cursor::new(b"{\"url\":\"a\"}\n{\"url\":\"b\"}\n".to_vec()),
            released: Arc::clone(&released),
        };

        let mut records = from_reader::<_, Item>(reader);
        let first = records.next().await.expect("one item").expect("record");
        assert_eq!(first.url, "a");
        assert!(!released.load(Ordering::SeqCst));

        drop(records);
        assert!(released.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_from_reader_reads_everything() {
        let reader = std::io::Cursor::new(b"{\"url\":\"a\"}\n{\"url\":\"b\"}".to_vec());
        let results: Vec<_> = from_reader::<_, Item>(reader).collect().await;
        assert_eq!(urls(results), vec!["a", "b"]);
    }
}
