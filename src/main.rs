//! shoutstream - Net-radio playback demo binary
//!
//! Connects to a Shoutcast-style stream URL and plays it on the default (or
//! named) audio device. Runs until the stream fails, Enter is pressed, or the
//! process is interrupted.

use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shoutstream::audio::{CpalSink, SymphoniaDecoderFactory};
use shoutstream::{DispatchThread, NoKeepAwake, Settings, StreamController, StreamUrl};

/// Command-line arguments for shoutstream
#[derive(Parser, Debug)]
#[command(name = "shoutstream")]
#[command(about = "Net-radio stream player")]
#[command(version)]
struct Args {
    /// Stream URL (http://host[:port]/path)
    url: String,

    /// Advertised stream bitrate in kbps (sizes the stream buffer)
    #[arg(short, long, default_value = "128", env = "SHOUTSTREAM_BITRATE")]
    bitrate: u32,

    /// Optional TOML settings file
    #[arg(short, long, env = "SHOUTSTREAM_CONFIG")]
    config: Option<PathBuf>,

    /// Output device name (default device when omitted)
    #[arg(short, long, env = "SHOUTSTREAM_DEVICE")]
    device: Option<String>,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shoutstream=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let settings = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            toml::from_str(&text)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?
        }
        None => Settings::default(),
    };

    let url: StreamUrl = args.url.parse().context("Invalid stream URL")?;
    info!("Playing {} at {} kbps", url, args.bitrate);

    let controller = StreamController::with_settings(Arc::new(DispatchThread::new()), settings);

    // Either a fatal stream error or Enter on stdin ends the session.
    let (done_tx, done_rx) = mpsc::channel::<&'static str>();

    let error_tx = done_tx.clone();
    controller.set_error_listener(Some(Arc::new(move || {
        let _ = error_tx.send("stream error");
    })));
    controller.set_buffering_listener(Some(Arc::new(|is_buffering| {
        if is_buffering {
            println!("Buffering...");
        } else {
            println!("Playing.");
        }
    })));

    let sink = match args.device {
        Some(name) => CpalSink::with_device(name),
        None => CpalSink::new(),
    };

    controller
        .start(
            url,
            args.bitrate,
            Box::new(SymphoniaDecoderFactory::new()),
            Box::new(sink),
            Box::new(NoKeepAwake),
        )
        .context("Failed to start streaming")?;

    thread::spawn(move || {
        let mut line = String::new();
        let _ = std::io::stdin().read_line(&mut line);
        let _ = done_tx.send("stopped");
    });

    let reason = done_rx.recv().unwrap_or("stopped");
    info!("Shutting down ({})", reason);
    controller.cancel();
    Ok(())
}
