//! One-shot window export for the presentation layer.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use thiserror::Error;

use lumenwatch_core::ChannelMonitor;
use lumenwatch_types::WindowExport;

use crate::source::SampleSource;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to write export: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode export: {0}")]
    Json(#[from] serde_json::Error),
}

/// Ingest whatever `source` has pending into `monitor` without notifying.
///
/// Malformed samples are skipped. Returns the number ingested.
pub fn ingest_pending(source: &mut dyn SampleSource, monitor: &ChannelMonitor) -> usize {
    let mut ingested = 0;
    while let Some(polled) = source.poll() {
        match polled {
            Ok(update) => {
                if let Some(event) = monitor.ingest(update) {
                    tracing::debug!(?event, "Threshold event during export (not notified)");
                }
                ingested += 1;
            }
            Err(e) => tracing::warn!("Skipping malformed sample: {}", e),
        }
    }
    ingested
}

/// Read everything from `source` and write the resulting window as JSON.
pub fn export_to_file(
    source: &mut dyn SampleSource,
    monitor: &ChannelMonitor,
    path: &Path,
) -> Result<WindowExport, ExportError> {
    let ingested = ingest_pending(source, monitor);
    let export = monitor.export();

    let json = serde_json::to_string_pretty(&export)?;
    let mut file = File::create(path)?;
    file.write_all(json.as_bytes())?;

    tracing::info!(
        samples = ingested,
        path = %path.display(),
        "Exported window"
    );
    Ok(export)
}
