//! Line-oriented JSONL reading.
//!
//! [`JsonlReader`] wraps any async reader, tracks 1-based line numbers for
//! diagnostics, and offers two ways to decode records: strict
//! ([`JsonlReader::read_record`]) and resilient
//! ([`JsonlReader::stream_resilient`]).

use crate::error::{Error, Result};
use crate::warning::{Warning, WarningCollector};
use futures::stream::{self, Stream};
use serde::de::DeserializeOwned;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

const BOM: char = '\u{feff}';

/// One raw line as read from the source, before any JSON decoding.
enum RawLine {
    /// Decoded text with the trailing newline removed.
    Text(String),
    /// The line was not valid UTF-8.
    InvalidUtf8,
}

/// Async reader for JSONL (JSON Lines) data.
///
/// # Examples
///
/// ```no_run
/// use beadgraph_jsonl::reader::JsonlReader;
/// use tokio::fs::File;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let file = File::open("beads.jsonl").await?;
/// let mut reader = JsonlReader::new(file);
/// while let Some(value) = reader.read_record::<serde_json::Value>().await? {
///     println!("line {}: {value}", reader.line_number());
/// }
/// # Ok(())
/// # }
/// ```
pub struct JsonlReader<R> {
    reader: BufReader<R>,
    /// 1-based number of the last line read, 0 before the first read.
    line_number: usize,
}

impl<R: AsyncRead + Unpin> JsonlReader<R> {
    /// Creates a new `JsonlReader` wrapping the given async reader.
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            line_number: 0,
        }
    }

    /// Returns the 1-based number of the last line read (0 before any read).
    #[must_use]
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Reads the next physical line, or `None` at end of input.
    async fn next_line(&mut self) -> Result<Option<RawLine>> {
        let mut buf = Vec::new();
        let read = self.reader.read_until(b'\n', &mut buf).await?;
        if read == 0 {
            return Ok(None);
        }
        self.line_number += 1;

        while matches!(buf.last(), Some(b'\n' | b'\r')) {
            buf.pop();
        }

        let Ok(mut text) = String::from_utf8(buf) else {
            return Ok(Some(RawLine::InvalidUtf8));
        };
        if self.line_number == 1 && text.starts_with(BOM) {
            text.remove(0);
        }
        Ok(Some(RawLine::Text(text)))
    }

    /// Reads and decodes the next non-blank record.
    ///
    /// # Errors
    ///
    /// Fails on the first line that cannot be read or decoded.
    pub async fn read_record<T: DeserializeOwned>(&mut self) -> Result<Option<T>> {
        loop {
            match self.next_line().await? {
                None => return Ok(None),
                Some(RawLine::InvalidUtf8) => {
                    return Err(Error::Io(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        format!("line {} is not valid UTF-8", self.line_number),
                    )));
                }
                Some(RawLine::Text(text)) => {
                    if text.trim().is_empty() {
                        continue;
                    }
                    return serde_json::from_str(&text)
                        .map(Some)
                        .map_err(|source| Error::Json {
                            line_number: self.line_number,
                            source,
                        });
                }
            }
        }
    }

    /// Turns the reader into a stream that yields only parseable records.
    ///
    /// Every skipped line is recorded in the returned [`WarningCollector`].
    /// An IO failure ends the stream after recording a warning for the line
    /// that could not be read.
    pub fn stream_resilient<T: DeserializeOwned>(
        self,
    ) -> (impl Stream<Item = T>, WarningCollector) {
        self.stream_validated(|_: &T| Ok(()))
    }

    /// Like [`stream_resilient`](Self::stream_resilient), but also drops
    /// records that `validate` rejects, recording a
    /// [`Warning::SkippedLine`] with the returned reason.
    pub fn stream_validated<T, F>(self, validate: F) -> (impl Stream<Item = T>, WarningCollector)
    where
        T: DeserializeOwned,
        F: Fn(&T) -> std::result::Result<(), String> + Clone,
    {
        let collector = WarningCollector::new();
        let sink = collector.clone();

        let records = stream::unfold(self, move |mut reader| {
            let sink = sink.clone();
            let validate = validate.clone();
            async move {
                loop {
                    let line = match reader.next_line().await {
                        Ok(Some(line)) => line,
                        Ok(None) => return None,
                        Err(e) => {
                            sink.add(Warning::SkippedLine {
                                line_number: reader.line_number + 1,
                                reason: format!("read failed: {e}"),
                            });
                            return None;
                        }
                    };
                    let line_number = reader.line_number;

                    let text = match line {
                        RawLine::Text(text) => text,
                        RawLine::InvalidUtf8 => {
                            sink.add(Warning::SkippedLine {
                                line_number,
                                reason: "invalid UTF-8".to_string(),
                            });
                            continue;
                        }
                    };
                    if text.trim().is_empty() {
                        continue;
                    }

                    match serde_json::from_str::<T>(&text) {
                        Ok(record) => match validate(&record) {
                            Ok(()) => return Some((record, reader)),
                            Err(reason) => {
                                tracing::warn!(line_number, %reason, "Skipping invalid record");
                                sink.add(Warning::SkippedLine { line_number, reason });
                            }
                        },
                        Err(e) => {
                            tracing::warn!(line_number, error = %e, "Skipping malformed JSONL line");
                            sink.add(Warning::MalformedJson {
                                line_number,
                                error: e.to_string(),
                            });
                        }
                    }
                }
            }
        });

        (records, collector)
    }
}
