use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use video_test as vt;

#[derive(Parser, Debug)]
#[command(
    name = "vt",
    version,
    about = "Synthetic color-bar video source",
    disable_help_subcommand = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List registered drivers and their declared modes
    List {
        /// Print as JSON
        #[arg(long, action = ArgAction::SetTrue)]
        json: bool,
    },
    /// Validate a YAML frame configuration
    Check {
        /// Path to the YAML file
        #[arg(long)]
        config: PathBuf,
    },
    /// Pull frames from the source
    Run {
        /// Frame width in pixels (even)
        #[arg(long, default_value_t = 640)]
        width: u32,
        /// Frame height in pixels
        #[arg(long, default_value_t = 480)]
        height: u32,
        /// Frames per second
        #[arg(long, default_value_t = 30.0)]
        fps: f32,
        /// YAML frame configuration; overrides width/height/fps
        #[arg(long)]
        config: Option<PathBuf>,
        /// Stop after this many frames (0 = until closed)
        #[arg(long, default_value_t = 30u64)]
        frames: u64,
        /// Append raw planar Y, Cb, Cr of every frame to this file
        #[arg(long)]
        out: Option<PathBuf>,
        /// Close the session from a second thread after this many milliseconds
        #[arg(long)]
        close_after_ms: Option<u64>,
        /// Print Prometheus metrics when done
        #[arg(long, action = ArgAction::SetTrue)]
        metrics: bool,
    },
}

fn main() -> Result<()> {
    setup_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::List { json } => list(json),
        Commands::Check { config } => check(&config),
        Commands::Run {
            width,
            height,
            fps,
            config,
            frames,
            out,
            close_after_ms,
            metrics,
        } => {
            let frame_config = match config {
                Some(path) => vt::load_frame_config(path)?,
                None => vt::FrameConfig::new(width, height, fps),
            };
            run(
                &frame_config,
                frames,
                out.as_deref(),
                close_after_ms,
                metrics,
            )
        }
    }
}

fn setup_tracing() {
    // Best-effort; avoid panics if already set
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn registry() -> Result<vt::DriverRegistry> {
    let mut registry = vt::DriverRegistry::new();
    vt::register(&mut registry)?;
    Ok(registry)
}

fn list(json: bool) -> Result<()> {
    let registry = registry()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&registry.list())?);
        return Ok(());
    }
    for driver in registry.list() {
        println!("{}\t{:?}", driver.label, driver.device_type);
        for mode in &driver.capabilities {
            println!(
                "\t{}x{}@{}\t{:?}",
                mode.width, mode.height, mode.frame_rate, mode.pixel_format
            );
        }
    }
    Ok(())
}

fn check(path: &Path) -> Result<()> {
    let config = vt::load_frame_config(path)?;
    let declared = vt::capabilities().iter().any(|p| p.matches(&config));
    println!(
        "ok: {}x{}@{} period={:?} declared={declared}",
        config.width,
        config.height,
        config.frame_rate,
        config.period()
    );
    Ok(())
}

fn run(
    config: &vt::FrameConfig,
    frames: u64,
    out: Option<&Path>,
    close_after_ms: Option<u64>,
    with_metrics: bool,
) -> Result<()> {
    let registry = registry()?;
    let mut session = registry.open(vt::DRIVER_LABEL)?;
    if with_metrics {
        session = session.with_metrics(vt::SourceMetrics::new()?);
    }
    let mut reader = session.video_record(config)?;

    if let Some(ms) = close_after_ms {
        let handle = session.closer();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(ms));
            if !handle.is_closed() {
                info!(after_ms = ms, "closing session");
                handle.close();
            }
        });
    }

    let mut sink = match out {
        Some(path) => Some(BufWriter::new(File::create(path)?)),
        None => None,
    };

    let mut last: Option<Instant> = None;
    let mut count = 0u64;
    while frames == 0 || count < frames {
        let frame = match reader.read()? {
            vt::Pull::Frame(frame) => frame,
            vt::Pull::EndOfStream => {
                info!(count, "end of stream");
                break;
            }
        };
        let now = Instant::now();
        let gap_ms = last
            .map(|t| now.duration_since(t).as_secs_f64() * 1000.0)
            .unwrap_or(0.0);
        last = Some(now);
        let ts = frame
            .timestamp()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default();
        println!("{}\t{ts}\tgap_ms={gap_ms:.2}", frame.sequence());
        if let Some(w) = sink.as_mut() {
            for plane in frame.planes() {
                w.write_all(plane.data)?;
            }
        }
        frame.release();
        count += 1;
    }

    if let Some(mut w) = sink {
        w.flush()?;
    }
    session.close();
    if count < frames {
        warn!(count, requested = frames, "stream ended early");
    }
    if let Some(metrics) = session.metrics() {
        print!("{}", metrics.encode_text());
    }
    Ok(())
}
