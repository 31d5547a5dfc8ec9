//! Frame info recorder driven by a synthetic 30 fps capture stream

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use color_eyre::{eyre::eyre, Result};
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use frameinfo::{utils, Config, FrameInfoRecorder, PhaseChannel, PixelFormat};

const FPS: u64 = 30;
const FRAME_COUNT: u64 = 300;
const WIDTH: u32 = 640;
const HEIGHT: u32 = 480;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling and logging
    color_eyre::install()?;
    init_tracing()?;

    info!("Frame info recorder launching...");

    // Load configuration
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = Config::load(config_path.as_deref())?;
    info!("Using output root: {:?}", config.output.root);

    let phase_channel = PhaseChannel::bounded(config.recorder.phase_channel_capacity);
    let phase_rx = phase_channel.receiver();
    let (failed_tx, mut failed_rx) = watch::channel(false);

    let recorder = Arc::new(
        FrameInfoRecorder::builder(config, utils::default_session_id())
            .phase_channel(phase_channel)
            .on_failure(move |err| {
                error!("Frame info recording failed: {}", err);
                let _ = failed_tx.send(true);
            })
            .build()?,
    );

    // Spawn phase consumer
    let consumer = tokio::spawn(async move {
        match phase_rx.recv_async().await {
            Ok(phase) => {
                let n = phase.durations.len().max(1) as i64;
                let mean = phase.durations.iter().sum::<i64>() / n;
                info!(
                    "Phase report at {}: {} durations, mean {} ns",
                    phase.timestamp,
                    phase.durations.len(),
                    mean
                );
            }
            Err(_) => info!("No phase report produced"),
        }
    });

    // Synthetic capture loop
    let frame = Bytes::from(nv21_gradient(WIDTH, HEIGHT));
    let started = Instant::now();
    let mut ticker = tokio::time::interval(Duration::from_nanos(1_000_000_000 / FPS));
    for _ in 0..FRAME_COUNT {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping capture");
                break;
            }
            _ = failed_rx.changed() => {
                warn!("Recording failed, stopping capture");
                break;
            }
        }

        let timestamp = started.elapsed().as_nanos() as i64;
        if let Err(e) = recorder.submit_timestamp_and_image(
            timestamp,
            frame.clone(),
            WIDTH,
            HEIGHT,
            PixelFormat::Nv21,
            90,
        ) {
            warn!("Frame dropped: {}", e);
        }
    }

    // Drain the backlog off the async runtime
    let closing = recorder.clone();
    tokio::task::spawn_blocking(move || closing.close())
        .await
        .map_err(|e| eyre!("close task failed: {}", e))??;

    consumer.abort();
    let stats = recorder.stats();
    info!(
        "Frame info recorder shutting down: {} recorded, {} images, {} rejected",
        stats.frames_recorded, stats.images_written, stats.frames_rejected
    );
    Ok(())
}

fn init_tracing() -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("frameinfo=info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .finish();

    #[cfg(feature = "profiling")]
    let subscriber = {
        use tracing_subscriber::layer::SubscriberExt;
        subscriber.with(tracing_tracy::TracyLayer::default())
    };

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Horizontal luma ramp with neutral chroma
fn nv21_gradient(width: u32, height: u32) -> Vec<u8> {
    let (w, h) = (width as usize, height as usize);
    let mut data = Vec::with_capacity(w * h * 3 / 2);
    for _ in 0..h {
        data.extend((0..w).map(|x| (x * 255 / w.max(1)) as u8));
    }
    data.resize(w * h * 3 / 2, 128);
    data
}
