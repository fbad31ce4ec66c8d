//! demo - end-to-end synthetic run of the poolwatch pipeline
//!
//! Renders a scripted scenario (swimmer active, then motionless past the
//! alert threshold), runs the full monitor over it unpaced, and prints the
//! run summary plus the alerts that landed in the store.

use anyhow::{anyhow, Result};
use clap::Parser;

use poolwatch::{
    builtin_registry, AlertSink, AlertWriter, LogNotifier, Monitor, MonitorSettings,
    SqliteAlertStore, SyntheticConfig, SyntheticSource,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Length of the synthetic run in seconds.
    #[arg(long, default_value_t = 15)]
    seconds: u64,

    /// Frames per second of the synthetic feed.
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Seconds of swimming before the subject goes motionless.
    #[arg(long, default_value_t = 3)]
    active_seconds: u64,

    /// Alert database for this run.
    #[arg(long, default_value = "demo_poolwatch.db")]
    db_path: String,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    if args.fps == 0 {
        return Err(anyhow!("fps must be >= 1"));
    }

    let total_frames = args.seconds.saturating_mul(args.fps as u64);
    let source = SyntheticSource::new(SyntheticConfig {
        fps: args.fps,
        total_frames: Some(total_frames),
        subject_visible: true,
        still_after: Some(args.active_seconds.saturating_mul(args.fps as u64)),
        ..SyntheticConfig::default()
    });

    let registry = builtin_registry();
    let detector = registry.create_default()?;
    let store = SqliteAlertStore::open(&args.db_path)?;
    let writer = AlertWriter::spawn(Box::new(store), Box::new(LogNotifier));

    let monitor = Monitor::new(source, detector, writer, MonitorSettings::default());
    let summary = monitor.run()?;

    println!(
        "processed {} frames; emitted {} alerts; final level {:?}",
        summary.frames, summary.alerts_emitted, summary.final_level
    );

    let mut store = SqliteAlertStore::open(&args.db_path)?;
    for alert in store.list_recent(10)? {
        println!(
            "{} - {}: {}",
            alert.created_at, alert.alert_type, alert.details
        );
    }
    Ok(())
}
