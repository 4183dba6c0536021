//! Stream-based sample source.
//!
//! Receives newline-delimited JSON payloads from an async byte stream, such
//! as a TCP connection to a sensor gateway.

use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::sync::mpsc;

use lumenwatch_core::SampleDecoder;
use lumenwatch_types::{current_timestamp_ms, MalformedSample};

use super::{Polled, SampleSource};

/// Longest accepted line, newline excluded.
const MAX_LINE_BYTES: usize = 64 * 1024;

#[derive(Debug)]
enum StreamItem {
    Sample(Polled),
    Closed(String),
}

/// A source that decodes samples from an async reader.
///
/// A background task reads one payload per line; `poll()` never blocks.
///
/// # Example
///
/// ```
/// use std::io::Cursor;
/// use lumenwatch::StreamSource;
///
/// # tokio_test::block_on(async {
/// let data = b"1850\n1750\n";
/// let source = StreamSource::spawn(Cursor::new(data.to_vec()), "example");
/// # });
/// ```
#[derive(Debug)]
pub struct StreamSource {
    receiver: mpsc::Receiver<StreamItem>,
    description: String,
    last_error: Option<String>,
}

impl StreamSource {
    /// Spawn a reader task using the default decoder.
    pub fn spawn<R>(reader: R, description: &str) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        Self::spawn_with_decoder(reader, description, SampleDecoder::default())
    }

    pub fn spawn_with_decoder<R>(reader: R, description: &str, decoder: SampleDecoder) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(64);

        tokio::spawn(async move {
            let mut reader = BufReader::new(reader);
            let mut line = Vec::new();

            loop {
                let item = match read_line_bounded(&mut reader, &mut line).await {
                    Ok(LineRead::Eof) => {
                        let _ = tx.send(StreamItem::Closed("Connection closed".to_string())).await;
                        break;
                    }
                    Ok(LineRead::TooLong) => StreamItem::Sample(Err(MalformedSample::Syntax(
                        format!("line exceeds {} bytes", MAX_LINE_BYTES),
                    ))),
                    Ok(LineRead::Line) => match std::str::from_utf8(&line) {
                        Ok(text) if text.trim().is_empty() => continue,
                        Ok(text) => StreamItem::Sample(decoder.decode(text, current_timestamp_ms())),
                        Err(e) => StreamItem::Sample(Err(MalformedSample::Syntax(e.to_string()))),
                    },
                    Err(e) => {
                        let _ = tx.send(StreamItem::Closed(format!("Read error: {}", e))).await;
                        break;
                    }
                };

                if tx.send(item).await.is_err() {
                    // Receiver dropped
                    break;
                }
            }
        });

        Self {
            receiver: rx,
            description: format!("stream: {}", description),
            last_error: None,
        }
    }
}

enum LineRead {
    Line,
    TooLong,
    Eof,
}

/// Read one `\n`-terminated line into `buf` without buffering more than
/// [`MAX_LINE_BYTES`]. An oversized line is consumed through its newline
/// and reported as [`LineRead::TooLong`].
async fn read_line_bounded<R>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<LineRead>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    let limit = MAX_LINE_BYTES as u64 + 1;
    if (&mut *reader).take(limit).read_until(b'\n', buf).await? == 0 {
        return Ok(LineRead::Eof);
    }
    if buf.last() == Some(&b'\n') || buf.len() <= MAX_LINE_BYTES {
        return Ok(LineRead::Line);
    }

    loop {
        buf.clear();
        let n = (&mut *reader).take(limit).read_until(b'\n', buf).await?;
        if n == 0 || buf.last() == Some(&b'\n') {
            break;
        }
    }
    buf.clear();
    Ok(LineRead::TooLong)
}

impl SampleSource for StreamSource {
    fn poll(&mut self) -> Option<Polled> {
        loop {
            match self.receiver.try_recv() {
                Ok(StreamItem::Sample(polled)) => {
                    self.last_error = match &polled {
                        Ok(_) => None,
                        Err(e) => Some(format!("Parse error: {}", e)),
                    };
                    return Some(polled);
                }
                Ok(StreamItem::Closed(reason)) => {
                    self.last_error = Some(reason);
                }
                Err(mpsc::error::TryRecvError::Empty) => return None,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    if self.last_error.is_none() {
                        self.last_error = Some("Stream disconnected".to_string());
                    }
                    return None;
                }
            }
        }
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}
