//! The per-feed monitor loop and the off-path alert writer.
//!
//! One `Monitor` owns one feed end to end: frame intake, motion diffing,
//! sampled classification, risk update, and alert dispatch all run in
//! lockstep on a single thread, which guarantees frame ordering and that
//! risk state is never mutated concurrently. Multiple camera feeds get
//! multiple `Monitor` instances; there are no shared globals.
//!
//! Alert persistence and notification are the one thing taken off the hot
//! path: emitted alerts go over a bounded channel to a dedicated writer
//! thread. A full queue drops the alert with a warning - the alerting side
//! never applies backpressure to frame intake. The single writer thread
//! keeps alert writes ordered.

use anyhow::{anyhow, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::alert::{Alert, AlertDispatcher};
use crate::detect::{PersonDetector, SampledClassifier};
use crate::frame::Frame;
use crate::ingest::FrameSource;
use crate::motion::{FrameDiffer, MotionSample};
use crate::notify::Notifier;
use crate::risk::{RiskLevel, RiskStateMachine};
use crate::storage::AlertSink;

const ALERT_QUEUE_DEPTH: usize = 32;
const APPEND_RETRY_BACKOFF: Duration = Duration::from_millis(250);
const STATUS_LOG_INTERVAL: Duration = Duration::from_secs(5);

/// Runtime knobs for one monitor instance.
#[derive(Clone, Debug)]
pub struct MonitorSettings {
    /// Run the person detector on every Nth frame.
    pub sample_interval: u64,
    /// Per-pixel luma delta (0-255) above which a pixel counts as changed.
    pub motion_threshold: u8,
    /// Motionless time after which a present subject escalates to Alert.
    pub alert_after: Duration,
    /// Upper bound on a single detector invocation.
    pub detector_timeout: Duration,
    /// When set, pace the loop to one frame per interval (live feeds).
    /// Unset for replay and tests: the loop runs as fast as the source.
    pub frame_interval: Option<Duration>,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            sample_interval: 30,
            motion_threshold: 25,
            alert_after: Duration::from_secs(10),
            detector_timeout: Duration::from_millis(500),
            frame_interval: None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct MonitorSummary {
    pub frames: u64,
    pub alerts_emitted: u64,
    pub final_level: RiskLevel,
}

/// Spawns the thread that persists and announces alerts.
pub struct AlertWriter;

impl AlertWriter {
    pub fn spawn(
        mut sink: Box<dyn AlertSink>,
        mut notifier: Box<dyn Notifier>,
    ) -> AlertWriterHandle {
        let (tx, rx) = mpsc::sync_channel::<Alert>(ALERT_QUEUE_DEPTH);
        let join = std::thread::spawn(move || {
            while let Ok(alert) = rx.recv() {
                persist_and_notify(sink.as_mut(), notifier.as_mut(), &alert);
            }
        });
        AlertWriterHandle {
            tx: Some(tx),
            join: Some(join),
        }
    }
}

fn persist_and_notify(sink: &mut dyn AlertSink, notifier: &mut dyn Notifier, alert: &Alert) {
    if let Err(first) = sink.append(alert) {
        log::warn!("alert append failed: {}; retrying once", first);
        std::thread::sleep(APPEND_RETRY_BACKOFF);
        if let Err(second) = sink.append(alert) {
            log::warn!("alert append failed after retry, dropping record: {}", second);
        }
    }
    if let Err(e) = notifier.notify(alert) {
        log::warn!("notification via '{}' failed: {}", notifier.name(), e);
    }
}

pub struct AlertWriterHandle {
    tx: Option<SyncSender<Alert>>,
    join: Option<JoinHandle<()>>,
}

impl AlertWriterHandle {
    /// Queue an alert for persistence. Never blocks: a full queue or a dead
    /// writer drops the alert with a log line.
    pub fn submit(&self, alert: Alert) {
        let Some(tx) = &self.tx else {
            return;
        };
        match tx.try_send(alert) {
            Ok(()) => {}
            Err(TrySendError::Full(alert)) => {
                log::warn!("alert queue full, dropping {}", alert.alert_type);
            }
            Err(TrySendError::Disconnected(alert)) => {
                log::error!("alert writer stopped, dropping {}", alert.alert_type);
            }
        }
    }

    /// Close the queue and wait for queued alerts to drain.
    pub fn stop(mut self) -> Result<()> {
        self.tx.take();
        if let Some(join) = self.join.take() {
            join.join()
                .map_err(|_| anyhow!("alert writer thread panicked"))?;
        }
        Ok(())
    }
}

impl Drop for AlertWriterHandle {
    fn drop(&mut self) {
        self.tx.take();
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

/// Single-threaded cooperative monitor loop over one frame stream.
pub struct Monitor<S: FrameSource> {
    source: S,
    differ: FrameDiffer,
    sampler: SampledClassifier,
    risk: RiskStateMachine,
    dispatcher: AlertDispatcher,
    writer: AlertWriterHandle,
    settings: MonitorSettings,
    stop: Arc<AtomicBool>,
}

impl<S: FrameSource> Monitor<S> {
    pub fn new(
        source: S,
        detector: Box<dyn PersonDetector>,
        writer: AlertWriterHandle,
        settings: MonitorSettings,
    ) -> Self {
        let differ = FrameDiffer::new(settings.motion_threshold);
        let sampler = SampledClassifier::new(
            detector,
            settings.sample_interval,
            settings.detector_timeout,
        );
        let risk = RiskStateMachine::new(settings.alert_after);
        Self {
            source,
            differ,
            sampler,
            risk,
            dispatcher: AlertDispatcher::new(),
            writer,
            settings,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag checked once per frame; set it (e.g. from a signal handler) to
    /// stop the loop promptly.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    /// Drive the loop until end of stream or a stop request, then drain the
    /// alert writer. Both terminations are graceful; per-frame errors are
    /// logged and skipped, never fatal.
    pub fn run(mut self) -> Result<MonitorSummary> {
        let mut summary = MonitorSummary::default();
        let run_result = self.pump(&mut summary);
        let drain_result = self.writer.stop();
        run_result?;
        drain_result?;
        Ok(summary)
    }

    fn pump(&mut self, summary: &mut MonitorSummary) -> Result<()> {
        log::info!(
            "monitor running: detector '{}', sampling every {} frames, motion threshold {}, alert after {:?}",
            self.sampler.detector_name(),
            self.settings.sample_interval,
            self.settings.motion_threshold,
            self.settings.alert_after
        );

        let mut prev: Option<Frame> = None;
        let mut last_status = Instant::now();

        loop {
            if self.stop.load(Ordering::SeqCst) {
                log::info!("stop requested, shutting down monitor");
                return Ok(());
            }

            let frame_started = Instant::now();
            let Some(frame) = self.source.next_frame()? else {
                log::info!("frame source exhausted after {} frames", summary.frames);
                return Ok(());
            };
            summary.frames += 1;

            let motion = match prev.as_ref() {
                Some(prev_frame) => match self.differ.diff(prev_frame, &frame) {
                    Ok(sample) => sample,
                    Err(e) => {
                        // Input error: this frame is skipped, the stream
                        // continues against the new frame.
                        log::warn!("skipping frame {}: {}", frame.index, e);
                        prev = Some(frame);
                        continue;
                    }
                },
                None => MotionSample::still(&frame),
            };

            let presence = self.sampler.maybe_classify(&frame);
            let level = self.risk.update(&motion, presence.as_ref());
            log::debug!(
                "frame {} level={:?} motion={} regions={}",
                frame.index,
                level,
                motion.motion_detected,
                motion.diff_magnitude
            );

            if let Some(alert) = self.dispatcher.on_level(level, self.risk.state()) {
                log::warn!(
                    "alert raised at frame {} ({}): {}",
                    frame.index,
                    alert.alert_type,
                    alert.details
                );
                summary.alerts_emitted += 1;
                self.writer.submit(alert);
            }

            summary.final_level = level;
            prev = Some(frame);

            if last_status.elapsed() >= STATUS_LOG_INTERVAL {
                log::info!(
                    "status: frames={} level={:?} detector_invocations={}",
                    summary.frames,
                    level,
                    self.sampler.invocations()
                );
                last_status = Instant::now();
            }

            if let Some(interval) = self.settings.frame_interval {
                let elapsed = frame_started.elapsed();
                if elapsed < interval {
                    std::thread::sleep(interval - elapsed);
                }
            }
        }
    }
}
