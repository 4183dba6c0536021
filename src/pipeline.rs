//! Wiring between a sample source, the channel monitor and the dispatcher.
//!
//! Ingestion is synchronous: the detector transition and the window push
//! finish before [`AlertPipeline::ingest`] returns. Delivery runs on a
//! spawned task, so a slow or hung transport never holds up the next
//! sample. Every delivery result is published as a [`DispatchOutcome`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use lumenwatch_core::ChannelMonitor;
use lumenwatch_notify::{DispatchError, DispatchResult, NotificationDispatcher};
use lumenwatch_types::{MalformedSample, SampleUpdate, ThresholdEvent};

use crate::source::SampleSource;

/// The delivery result for one threshold event.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub event: ThresholdEvent,
    pub result: Result<DispatchResult, DispatchError>,
}

impl DispatchOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// One channel's detection and notification path.
#[derive(Debug, Clone)]
pub struct AlertPipeline {
    monitor: Arc<ChannelMonitor>,
    dispatcher: Arc<NotificationDispatcher>,
    notify_recovery: bool,
    outcomes: mpsc::UnboundedSender<DispatchOutcome>,
}

impl AlertPipeline {
    /// Create a pipeline and the receiver its outcomes are published on.
    pub fn new(
        monitor: Arc<ChannelMonitor>,
        dispatcher: Arc<NotificationDispatcher>,
    ) -> (Self, mpsc::UnboundedReceiver<DispatchOutcome>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let pipeline = Self {
            monitor,
            dispatcher,
            notify_recovery: false,
            outcomes: tx,
        };
        (pipeline, rx)
    }

    /// Also dispatch recovery notices.
    pub fn with_recovery_notifications(mut self, enabled: bool) -> Self {
        self.notify_recovery = enabled;
        self
    }

    pub fn monitor(&self) -> &Arc<ChannelMonitor> {
        &self.monitor
    }

    /// Feed one update through the monitor and start delivery for any event.
    ///
    /// Must be called from within a tokio runtime. The returned handle
    /// completes once the delivery attempt has finished.
    pub fn ingest(&self, update: SampleUpdate) -> Option<(ThresholdEvent, Option<JoinHandle<()>>)> {
        let event = self.monitor.ingest(update)?;

        let handle = match event {
            ThresholdEvent::Crossing(_) => Some(self.spawn_dispatch(event)),
            ThresholdEvent::Recovery(_) if self.notify_recovery => Some(self.spawn_dispatch(event)),
            ThresholdEvent::Recovery(_) => {
                tracing::info!(
                    channel = self.monitor.channel(),
                    value = update.value.get(),
                    "Light level recovered"
                );
                None
            }
        };

        Some((event, handle))
    }

    /// Record a sample the source could not decode.
    ///
    /// Detector state is left untouched.
    pub fn skip(&self, error: &MalformedSample) {
        tracing::warn!(
            channel = self.monitor.channel(),
            "Skipping malformed sample: {}",
            error
        );
    }

    fn spawn_dispatch(&self, event: ThresholdEvent) -> JoinHandle<()> {
        let dispatcher = self.dispatcher.clone();
        let outcomes = self.outcomes.clone();
        let channel = self.monitor.channel().to_string();

        tokio::spawn(async move {
            let result = match &event {
                ThresholdEvent::Crossing(crossing) => dispatcher.notify_crossing(crossing).await,
                ThresholdEvent::Recovery(recovery) => dispatcher.notify_recovery(recovery).await,
            };

            match &result {
                Ok(ok) => tracing::info!(
                    channel = %channel,
                    message_id = ok.message_id.as_deref().unwrap_or("-"),
                    "Notification delivered"
                ),
                Err(e) => tracing::error!(
                    channel = %channel,
                    kind = e.kind(),
                    "Notification failed: {}",
                    e
                ),
            }

            // Nobody listening is fine.
            let _ = outcomes.send(DispatchOutcome { event, result });
        })
    }
}

/// Poll `source` every `refresh` and feed the pipeline until Ctrl-C.
pub async fn run(
    source: &mut dyn SampleSource,
    pipeline: &AlertPipeline,
    refresh: Duration,
) -> std::io::Result<()> {
    run_until(source, pipeline, refresh, tokio::signal::ctrl_c()).await
}

/// Like [`run`], stopping when `shutdown` resolves.
pub async fn run_until<F, T>(
    source: &mut dyn SampleSource,
    pipeline: &AlertPipeline,
    refresh: Duration,
    shutdown: F,
) -> T
where
    F: Future<Output = T>,
{
    tracing::info!(
        source = source.description(),
        channel = pipeline.monitor().channel(),
        threshold = pipeline.monitor().threshold(),
        "Watching for low light"
    );

    let mut ticker = tokio::time::interval(refresh);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    let mut last_error: Option<String> = None;

    loop {
        tokio::select! {
            output = &mut shutdown => {
                tracing::info!("Shutting down");
                return output;
            }
            _ = ticker.tick() => {
                drain(source, pipeline);

                let error = source.error().map(str::to_string);
                if error != last_error {
                    if let Some(e) = &error {
                        tracing::warn!(source = source.description(), "Source error: {}", e);
                    }
                    last_error = error;
                }
            }
        }
    }
}

/// Ingest everything the source has pending.
pub fn drain(source: &mut dyn SampleSource, pipeline: &AlertPipeline) -> usize {
    let mut ingested = 0;
    while let Some(polled) = source.poll() {
        match polled {
            Ok(update) => {
                pipeline.ingest(update);
                ingested += 1;
            }
            Err(e) => pipeline.skip(&e),
        }
    }
    ingested
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ChannelSource;
    use lumenwatch_core::MonitorConfig;
    use lumenwatch_notify::{MailSettings, MemoryTransport, TransportFailure};
    use lumenwatch_types::{DetectorState, Reading};

    fn update(value: f64, ts: u64) -> SampleUpdate {
        SampleUpdate::new(None, Reading::new(value).unwrap(), ts)
    }

    fn pipeline(
        transport: Arc<MemoryTransport>,
    ) -> (AlertPipeline, mpsc::UnboundedReceiver<DispatchOutcome>) {
        let monitor =
            Arc::new(ChannelMonitor::new(MonitorConfig::new("sensors/light", 1800.0, 5)).unwrap());
        let dispatcher = Arc::new(
            NotificationDispatcher::new(
                transport,
                MailSettings::new("alerts@example.com", "ops@example.com"),
            )
            .unwrap(),
        );
        AlertPipeline::new(monitor, dispatcher)
    }

    #[tokio::test]
    async fn test_crossing_dispatches_once() {
        let transport = Arc::new(MemoryTransport::new());
        let (pipeline, mut outcomes) = pipeline(transport.clone());

        assert!(pipeline.ingest(update(1850.0, 1)).is_none());
        let (event, handle) = pipeline.ingest(update(1750.0, 2)).unwrap();
        assert!(event.as_crossing().is_some());
        handle.unwrap().await.unwrap();

        // Still below: no second alert
        assert!(pipeline.ingest(update(1700.0, 3)).is_none());

        let outcome = outcomes.recv().await.unwrap();
        assert!(outcome.is_success());
        assert_eq!(transport.sent().len(), 1);
        assert!(outcomes.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_failed_delivery_keeps_detector_transitioned() {
        let transport =
            Arc::new(MemoryTransport::new().fail_send(TransportFailure::new("Message rejected")));
        let (pipeline, mut outcomes) = pipeline(transport.clone());

        pipeline.ingest(update(1850.0, 1));
        let (_, handle) = pipeline.ingest(update(1750.0, 2)).unwrap();
        handle.unwrap().await.unwrap();

        let outcome = outcomes.recv().await.unwrap();
        assert!(matches!(outcome.result, Err(DispatchError::Delivery(_))));

        assert_eq!(pipeline.monitor().state(), DetectorState::Below);
        assert!(pipeline.ingest(update(1740.0, 3)).is_none());
        assert_eq!(transport.send_attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_delivery_does_not_block_ingest() {
        let transport = Arc::new(MemoryTransport::new().with_delay(Duration::from_secs(30)));
        let (pipeline, mut outcomes) = pipeline(transport.clone());

        pipeline.ingest(update(1850.0, 1));
        pipeline.ingest(update(1750.0, 2));

        // The window keeps moving while delivery is pending.
        pipeline.ingest(update(1900.0, 3));
        pipeline.ingest(update(1600.0, 4));
        assert_eq!(pipeline.monitor().snapshot().len(), 4);

        let first = outcomes.recv().await.unwrap();
        let second = outcomes.recv().await.unwrap();
        assert!(first.is_success() && second.is_success());
        assert_eq!(transport.sent().len(), 2);
    }

    #[tokio::test]
    async fn test_recovery_not_dispatched_by_default() {
        let transport = Arc::new(MemoryTransport::new());
        let (pipeline, _outcomes) = pipeline(transport.clone());

        pipeline.ingest(update(1750.0, 1));
        let (event, handle) = pipeline.ingest(update(1850.0, 2)).unwrap();
        assert!(matches!(event, ThresholdEvent::Recovery(_)));
        assert!(handle.is_none());
    }

    #[tokio::test]
    async fn test_recovery_dispatched_when_enabled() {
        let transport = Arc::new(MemoryTransport::new());
        let (pipeline, mut outcomes) = pipeline(transport.clone());
        let pipeline = pipeline.with_recovery_notifications(true);

        pipeline.ingest(update(1750.0, 1));
        pipeline.ingest(update(1850.0, 2));

        let outcome = outcomes.recv().await.unwrap();
        assert!(matches!(outcome.event, ThresholdEvent::Recovery(_)));
        assert_eq!(transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_drain_skips_malformed_samples() {
        let transport = Arc::new(MemoryTransport::new());
        let (pipeline, _outcomes) = pipeline(transport);

        let data = "1850\n\"dim\"\nnull\n1900\n";
        let mut source = crate::source::StreamSource::spawn(std::io::Cursor::new(data), "test");
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(drain(&mut source, &pipeline), 2);
        assert_eq!(pipeline.monitor().detector().observed(), 2);
        assert_eq!(pipeline.monitor().statistics().current, 1900.0);
    }

    #[tokio::test]
    async fn test_run_until_stops_on_shutdown() {
        let transport = Arc::new(MemoryTransport::new());
        let (pipeline, mut outcomes) = pipeline(transport.clone());

        let (tx, mut source) = ChannelSource::create("test");
        tx.send(update(1850.0, 1)).await.unwrap();
        tx.send(update(1750.0, 2)).await.unwrap();

        let shutdown = tokio::time::sleep(Duration::from_millis(100));
        run_until(&mut source, &pipeline, Duration::from_millis(10), shutdown).await;

        let outcome = outcomes.recv().await.unwrap();
        assert!(outcome.event.as_crossing().is_some());
        assert_eq!(transport.sent().len(), 1);
    }
}
