//! File-based sample source.
//!
//! Polls a JSON file holding either one payload or an array of payloads.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde_json::Value;

use lumenwatch_core::SampleDecoder;
use lumenwatch_types::{current_timestamp_ms, MalformedSample};

use super::{Polled, SampleSource};

/// A source that reads samples from a JSON file.
///
/// The file is re-read only when its modification time advances. An array
/// is queued element by element so each entry is ingested in order.
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    description: String,
    decoder: SampleDecoder,
    last_error: Option<String>,
    last_modified: Option<SystemTime>,
    pending: VecDeque<Polled>,
}

impl FileSource {
    /// Create a new file source for the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self::with_decoder(path, SampleDecoder::default())
    }

    pub fn with_decoder<P: AsRef<Path>>(path: P, decoder: SampleDecoder) -> Self {
        let path = path.as_ref().to_path_buf();
        let description = format!("file: {}", path.display());
        Self {
            path,
            description,
            decoder,
            last_error: None,
            last_modified: None,
            pending: VecDeque::new(),
        }
    }

    /// Returns the path being monitored.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn modified_time(&self) -> Option<SystemTime> {
        fs::metadata(&self.path).ok()?.modified().ok()
    }

    /// Read the file and queue every payload it holds.
    fn read_file(&mut self) -> bool {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                self.last_error = Some(format!("Read error: {}", e));
                return false;
            }
        };

        let now = current_timestamp_ms();
        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Array(items)) => {
                self.pending.extend(
                    items
                        .iter()
                        .map(|item| self.decoder.decode_value(item, now)),
                );
            }
            Ok(value) => self.pending.push_back(self.decoder.decode_value(&value, now)),
            Err(e) => {
                self.pending
                    .push_back(Err(MalformedSample::Syntax(e.to_string())));
            }
        }
        self.last_error = None;
        true
    }
}

impl SampleSource for FileSource {
    fn poll(&mut self) -> Option<Polled> {
        if self.pending.is_empty() {
            let current_modified = self.modified_time();

            let file_changed = match (&self.last_modified, &current_modified) {
                (None, _) => true,
                (Some(_), None) => false,
                (Some(last), Some(current)) => current > last,
            };

            if file_changed && self.read_file() {
                self.last_modified = current_modified;
            }
        }

        let polled = self.pending.pop_front()?;
        if let Err(e) = &polled {
            self.last_error = Some(format!("Parse error: {}", e));
        }
        Some(polled)
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}
