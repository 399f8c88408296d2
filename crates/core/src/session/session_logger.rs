use std::collections::BTreeMap;
use std::time::Instant;

/// Observer for frame-loop events: per-stage timings, per-frame metrics
/// and status lines.
///
/// Lets the CLI print progress while tests and embedders stay silent,
/// without the frame loop knowing which.
pub trait SessionLogger: Send {
    /// Called once per processed frame with the published face count.
    fn frame(&mut self, index: usize, face_count: usize);

    /// Time spent in one stage (`capture`, `detect`, `associate`, `render`).
    fn timing(&mut self, stage: &str, duration_ms: f64);

    fn metric(&mut self, name: &str, value: f64);

    fn info(&mut self, message: &str);

    /// End-of-session report. Default: no-op.
    fn summary(&self) {}
}

pub struct NullSessionLogger;

impl SessionLogger for NullSessionLogger {
    fn frame(&mut self, _index: usize, _face_count: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct RunningStat {
    count: usize,
    total: f64,
    max: f64,
}

impl RunningStat {
    fn record(&mut self, value: f64) {
        self.count += 1;
        self.total += value;
        self.max = if self.count == 1 {
            value
        } else {
            self.max.max(value)
        };
    }

    fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total / self.count as f64
        }
    }
}

/// Logs through the `log` crate: a progress line every `every_frames`
/// frames plus a summary with per-stage mean/max timings and throughput.
pub struct LogSessionLogger {
    every_frames: usize,
    frames: usize,
    last_face_count: usize,
    stages: BTreeMap<String, RunningStat>,
    metrics: BTreeMap<String, RunningStat>,
    started: Instant,
}

impl LogSessionLogger {
    pub fn new(every_frames: usize) -> Self {
        Self {
            every_frames: every_frames.max(1),
            frames: 0,
            last_face_count: 0,
            stages: BTreeMap::new(),
            metrics: BTreeMap::new(),
            started: Instant::now(),
        }
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn stage_mean_ms(&self, stage: &str) -> Option<f64> {
        self.stages.get(stage).map(RunningStat::mean)
    }

    pub fn stage_max_ms(&self, stage: &str) -> Option<f64> {
        self.stages.get(stage).map(|s| s.max)
    }

    pub fn metric_mean(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).map(RunningStat::mean)
    }

    /// Formatted summary, or `None` before the first frame.
    pub fn summary_text(&self) -> Option<String> {
        if self.frames == 0 {
            return None;
        }

        let secs = self.started.elapsed().as_secs_f64();
        let mut lines = vec![format!(
            "Session summary: {} frames in {secs:.1}s, {} face(s) tracked at exit",
            self.frames, self.last_face_count
        )];

        for (stage, stat) in &self.stages {
            lines.push(format!(
                "  {stage:10} mean {:6.2}ms  max {:6.2}ms",
                stat.mean(),
                stat.max
            ));
        }
        for (name, stat) in &self.metrics {
            lines.push(format!("  {name}: mean {:.2}, max {:.0}", stat.mean(), stat.max));
        }
        if secs > 0.0 {
            lines.push(format!("  {:.1} frames/s", self.frames as f64 / secs));
        }

        Some(lines.join("\n"))
    }
}

impl Default for LogSessionLogger {
    fn default() -> Self {
        Self::new(30)
    }
}

impl SessionLogger for LogSessionLogger {
    fn frame(&mut self, index: usize, face_count: usize) {
        self.frames += 1;
        if face_count != self.last_face_count {
            log::debug!(
                "Frame {index}: tracked faces {} -> {face_count}",
                self.last_face_count
            );
        }
        self.last_face_count = face_count;
        if self.frames % self.every_frames == 0 {
            log::info!("Processed {} frames, {face_count} face(s) tracked", self.frames);
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.stages
            .entry(stage.to_string())
            .or_default()
            .record(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics.entry(name.to_string()).or_default().record(value);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_text() {
            log::info!("\n{text}");
        }
    }
}
