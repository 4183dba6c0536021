use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use lumenwatch::{AlertPipeline, FileSource, Overrides, SampleSource, Settings, StreamSource};
use lumenwatch_core::{ChannelMonitor, SampleDecoder};
use lumenwatch_notify::{MailTransport, MemoryTransport, NotificationDispatcher};

#[derive(Parser, Debug)]
#[command(name = "lumenwatch")]
#[command(about = "Low-light alerting for an IoT light sensor")]
struct Args {
    /// Path to a JSON file holding the latest sample (or an array of samples)
    #[arg(short, long, default_value = "light.json", conflicts_with = "connect")]
    file: PathBuf,

    /// Connect to a TCP endpoint streaming newline-delimited samples (host:port)
    #[arg(short, long, conflicts_with = "file")]
    connect: Option<String>,

    /// Configuration file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Alert threshold (overrides configuration)
    #[arg(short, long)]
    threshold: Option<f64>,

    /// Rolling window capacity (overrides configuration)
    #[arg(long)]
    capacity: Option<usize>,

    /// Poll interval in milliseconds
    #[arg(short, long, default_value = "1000")]
    refresh: u64,

    /// Record notifications in memory instead of sending them
    #[arg(long)]
    dry_run: bool,

    /// Ingest the file once, write the window export to this path and exit
    #[arg(short, long, conflicts_with = "connect")]
    export: Option<PathBuf>,

    /// Send a test message and print the diagnostic report as JSON
    #[arg(long)]
    diagnose: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let overrides = Overrides {
        threshold: args.threshold,
        capacity: args.capacity,
    };
    let settings = Settings::load(args.config.as_deref(), &overrides)?;

    let monitor = Arc::new(ChannelMonitor::new(settings.monitor_config())?);
    let decoder = SampleDecoder::new(settings.field.clone());

    // Handle export mode (no runtime, no notifications)
    if let Some(export_path) = &args.export {
        let mut source = FileSource::with_decoder(&args.file, decoder);
        let export = lumenwatch::export_to_file(&mut source, &monitor, export_path)?;
        println!(
            "Exported {} samples ({}) to: {}",
            export.points.len(),
            export.status_label,
            export_path.display()
        );
        return Ok(());
    }

    let transport: Arc<dyn MailTransport> = if args.dry_run {
        Arc::new(MemoryTransport::new())
    } else {
        settings.mail.build_transport()?
    };
    let dispatcher = Arc::new(
        NotificationDispatcher::new(transport, settings.mail_settings())
            .context("Invalid mail settings")?,
    );

    let rt = tokio::runtime::Runtime::new()?;

    if args.diagnose {
        let report = rt.block_on(dispatcher.diagnostic_report());
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let (pipeline, outcomes) = AlertPipeline::new(monitor, dispatcher);
    let pipeline = pipeline.with_recovery_notifications(settings.notify_recovery);
    let refresh = Duration::from_millis(args.refresh);

    rt.block_on(async move {
        // Outcomes are already logged by the pipeline; keep the channel drained.
        let mut outcomes = outcomes;
        tokio::spawn(async move { while outcomes.recv().await.is_some() {} });

        let mut source: Box<dyn SampleSource> = match &args.connect {
            Some(addr) => {
                tracing::info!("Connecting to {}...", addr);
                let stream = tokio::net::TcpStream::connect(addr)
                    .await
                    .with_context(|| format!("Failed to connect to {}", addr))?;
                Box::new(StreamSource::spawn_with_decoder(stream, addr, decoder))
            }
            None => Box::new(FileSource::with_decoder(&args.file, decoder)),
        };

        lumenwatch::run(source.as_mut(), &pipeline, refresh).await?;

        let stats = pipeline.monitor().statistics();
        tracing::info!(
            min = stats.min,
            max = stats.max,
            avg = stats.avg,
            current = stats.current,
            "Final window statistics"
        );
        Ok::<_, anyhow::Error>(())
    })
}
