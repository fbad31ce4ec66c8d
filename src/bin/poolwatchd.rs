//! poolwatchd - drowning-risk monitoring daemon
//!
//! This daemon:
//! 1. Ingests frames from the configured source
//! 2. Runs motion detection on every frame
//! 3. Runs the person detector on every Nth frame (bounded timeout)
//! 4. Fuses both signals into a risk level per frame
//! 5. Persists deduplicated alerts to the alert store, off the hot path
//! 6. Announces alerts over the configured notification channel

use anyhow::{anyhow, Result};
use std::sync::atomic::Ordering;

use poolwatch::config::{PoolwatchConfig, SourceSettings};
use poolwatch::{
    builtin_registry, AlertWriter, LogNotifier, Monitor, MqttNotifier, Notifier, SqliteAlertStore,
    SyntheticConfig, SyntheticSource,
};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = PoolwatchConfig::load()?;

    let store = SqliteAlertStore::open(&cfg.db_path)?;
    let notifier: Box<dyn Notifier> = match &cfg.mqtt {
        Some(settings) => Box::new(MqttNotifier::connect(settings)?),
        None => {
            log::info!("no mqtt broker configured, alerts go to the log");
            Box::new(LogNotifier)
        }
    };

    let registry = builtin_registry();
    let mut detector = registry.create(&cfg.detector.name)?;
    detector.warm_up()?;

    let source = source_from_settings(&cfg.source)?;
    let writer = AlertWriter::spawn(Box::new(store), notifier);
    let monitor = Monitor::new(source, detector, writer, cfg.monitor_settings(true));

    let stop = monitor.stop_flag();
    ctrlc::set_handler(move || {
        stop.store(true, Ordering::SeqCst);
    })?;

    log::info!(
        "poolwatchd running. source={} detector={} alerts to {}",
        cfg.source.url,
        cfg.detector.name,
        cfg.db_path
    );

    let summary = monitor.run()?;
    log::info!(
        "monitor stopped: {} frames, {} alerts, final level {:?}",
        summary.frames,
        summary.alerts_emitted,
        summary.final_level
    );
    Ok(())
}

fn source_from_settings(settings: &SourceSettings) -> Result<SyntheticSource> {
    if !settings.url.starts_with("stub://") {
        return Err(anyhow!(
            "unsupported source url '{}': this build ships the stub:// source only",
            settings.url
        ));
    }
    Ok(SyntheticSource::new(SyntheticConfig {
        width: settings.width,
        height: settings.height,
        fps: settings.fps,
        total_frames: None,
        subject_visible: true,
        still_after: settings.still_after,
    }))
}
