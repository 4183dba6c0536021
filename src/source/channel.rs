//! Channel-based sample source.
//!
//! Receives already-decoded updates through a tokio mpsc channel, for
//! producers living in the same process.

use tokio::sync::mpsc;

use lumenwatch_types::SampleUpdate;

use super::{Polled, SampleSource};

/// A source fed by an in-process producer.
///
/// # Example
///
/// ```
/// use lumenwatch::ChannelSource;
///
/// let (tx, source) = ChannelSource::create("gateway");
/// ```
#[derive(Debug)]
pub struct ChannelSource {
    receiver: mpsc::Receiver<SampleUpdate>,
    description: String,
    last_error: Option<String>,
}

impl ChannelSource {
    /// Wrap an existing receiver.
    pub fn new(receiver: mpsc::Receiver<SampleUpdate>, source_description: &str) -> Self {
        Self {
            receiver,
            description: format!("channel: {}", source_description),
            last_error: None,
        }
    }

    /// Create a sender and the source it feeds.
    pub fn create(source_description: &str) -> (mpsc::Sender<SampleUpdate>, Self) {
        let (tx, rx) = mpsc::channel(64);
        (tx, Self::new(rx, source_description))
    }
}

impl SampleSource for ChannelSource {
    fn poll(&mut self) -> Option<Polled> {
        match self.receiver.try_recv() {
            Ok(update) => Some(Ok(update)),
            Err(mpsc::error::TryRecvError::Empty) => None,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                self.last_error = Some("All producers dropped".to_string());
                None
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
