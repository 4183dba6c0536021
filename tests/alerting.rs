//! End-to-end: file samples through the pipeline into an in-memory mailbox.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use lumenwatch::{run_until, AlertPipeline, FileSource, Settings};
use lumenwatch_core::ChannelMonitor;
use lumenwatch_notify::{MemoryTransport, NotificationDispatcher, TransportFailure};
use lumenwatch_types::DetectorState;
use tempfile::NamedTempFile;

fn settings() -> Settings {
    let mut settings = Settings::default();
    settings.capacity = 3;
    settings.mail.user = "alerts@example.com".to_string();
    settings.mail.recipient = "ops@example.com".to_string();
    settings
}

fn samples(values: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{}", values).unwrap();
    file
}

async fn run_file(
    file: &NamedTempFile,
    transport: Arc<MemoryTransport>,
) -> (Arc<ChannelMonitor>, Vec<lumenwatch::DispatchOutcome>) {
    let settings = settings();
    let monitor = Arc::new(ChannelMonitor::new(settings.monitor_config()).unwrap());
    let dispatcher =
        Arc::new(NotificationDispatcher::new(transport, settings.mail_settings()).unwrap());
    let (pipeline, mut rx) = AlertPipeline::new(monitor.clone(), dispatcher);

    let mut source = FileSource::new(file.path());
    run_until(
        &mut source,
        &pipeline,
        Duration::from_millis(10),
        tokio::time::sleep(Duration::from_millis(200)),
    )
    .await;

    drop(pipeline);
    let mut outcomes = Vec::new();
    while let Some(outcome) = rx.recv().await {
        outcomes.push(outcome);
    }
    (monitor, outcomes)
}

#[tokio::test]
async fn one_alert_per_crossing() {
    let file = samples("[1900, 1850, 1750, 1700, 1650, 1900, 1750]");
    let transport = Arc::new(MemoryTransport::new());

    let (monitor, outcomes) = run_file(&file, transport.clone()).await;

    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|o| o.is_success()));
    assert_eq!(transport.sent().len(), 2);

    let stats = monitor.statistics();
    assert_eq!((stats.min, stats.max, stats.current), (1650.0, 1900.0, 1750.0));
    assert_eq!(monitor.state(), DetectorState::Below);
}

#[tokio::test]
async fn malformed_samples_do_not_disturb_detection() {
    let file = samples(r#"[1850, "offline", null, 1750]"#);
    let transport = Arc::new(MemoryTransport::new());

    let (monitor, outcomes) = run_file(&file, transport.clone()).await;

    assert_eq!(outcomes.len(), 1);
    let crossing = outcomes[0].event.as_crossing().unwrap();
    assert_eq!(crossing.previous_value.get(), 1850.0);
    assert_eq!(crossing.new_value.get(), 1750.0);
    assert_eq!(monitor.snapshot().len(), 2);
}

#[tokio::test]
async fn verification_failure_is_reported_without_sending() {
    let file = samples("[1850, 1750]");
    let transport = Arc::new(
        MemoryTransport::new().fail_verify(TransportFailure::new("Invalid login").code("EAUTH")),
    );

    let (monitor, outcomes) = run_file(&file, transport.clone()).await;

    assert_eq!(outcomes.len(), 1);
    let err = outcomes[0].result.as_ref().unwrap_err();
    assert_eq!(err.kind(), "verification");
    assert_eq!(err.code(), Some("EAUTH"));
    assert!(transport.sent().is_empty());
    assert_eq!(monitor.state(), DetectorState::Below);
}
