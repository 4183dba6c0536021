//! Sample source abstraction.
//!
//! A source delivers `(previous, value)` updates for one sensor channel.
//! Decoding happens at this boundary: anything that is not a finite number
//! comes back as a [`MalformedSample`] and never reaches the detector.

mod channel;
mod file;
mod stream;

pub use channel::ChannelSource;
pub use file::FileSource;
pub use stream::StreamSource;

use std::fmt::Debug;

use lumenwatch_types::{MalformedSample, SampleUpdate};

/// Result of decoding one payload from a source.
pub type Polled = Result<SampleUpdate, MalformedSample>;

/// Trait for receiving sample updates from various backends.
///
/// # Example
///
/// ```
/// use lumenwatch::{FileSource, SampleSource};
///
/// let mut source = FileSource::new("light.json");
/// while let Some(polled) = source.poll() {
///     match polled {
///         Ok(update) => println!("light = {}", update.value),
///         Err(e) => eprintln!("skipped: {}", e),
///     }
/// }
/// ```
pub trait SampleSource: Send + Debug {
    /// Take the next pending update, if any.
    ///
    /// Returns `None` when nothing new is available. Must not block.
    fn poll(&mut self) -> Option<Polled>;

    /// Human-readable description of the source.
    fn description(&self) -> &str;

    /// The error seen on the last poll, if any.
    fn error(&self) -> Option<&str>;
}
