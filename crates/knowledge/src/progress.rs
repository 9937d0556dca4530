//! Structured progress reporting for corpus builds.
//!
//! Emits incremental events while documents are discovered, parsed,
//! chunked, embedded and written to the index.

use std::sync::Arc;
use std::time::Instant;

/// Progress event emitted during a build.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    /// Phase of the operation: "discover", "parse", "chunk", "embed", "index"
    pub phase: String,

    /// Current progress (files read, chunks embedded, etc.)
    pub current: u64,

    /// Total expected work (if known)
    pub total: Option<u64>,

    /// Percentage complete (0.0 - 100.0)
    pub percentage: Option<f64>,

    /// Human-readable message
    pub message: String,

    /// Seconds since the reporter was created
    pub elapsed_secs: Option<f64>,
}

impl ProgressEvent {
    pub fn new(
        phase: impl Into<String>,
        current: u64,
        total: Option<u64>,
        message: impl Into<String>,
    ) -> Self {
        let percentage =
            total.map(|t| if t > 0 { (current as f64 / t as f64) * 100.0 } else { 0.0 });

        Self {
            phase: phase.into(),
            current,
            total,
            percentage,
            message: message.into(),
            elapsed_secs: None,
        }
    }

    pub fn with_elapsed(mut self, elapsed_secs: f64) -> Self {
        self.elapsed_secs = Some(elapsed_secs);
        self
    }

    /// Format as a simple user-facing line.
    pub fn format_simple(&self) -> String {
        let progress = match self.total {
            Some(total) => format!("{}/{}", self.current, total),
            None => format!("{}", self.current),
        };

        let pct = self
            .percentage
            .map(|p| format!(" ({:.0}%)", p))
            .unwrap_or_default();

        format!("[{}] {}{} - {}", self.phase, progress, pct, self.message)
    }
}

/// Callback for progress events.
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Progress reporter that emits events through a callback.
#[derive(Clone)]
pub struct ProgressReporter {
    callback: Option<ProgressCallback>,
    start_time: Arc<Instant>,
}

impl ProgressReporter {
    pub fn new(callback: ProgressCallback) -> Self {
        Self {
            callback: Some(callback),
            start_time: Arc::new(Instant::now()),
        }
    }

    /// A reporter that drops every event.
    pub fn noop() -> Self {
        Self {
            callback: None,
            start_time: Arc::new(Instant::now()),
        }
    }

    pub fn emit(&self, event: ProgressEvent) {
        if let Some(callback) = &self.callback {
            let elapsed = self.start_time.elapsed().as_secs_f64();
            let event = event.with_elapsed(elapsed);

            tracing::debug!(
                phase = %event.phase,
                current = event.current,
                total = ?event.total,
                message = %event.message,
                elapsed_secs = elapsed,
                "Progress event"
            );

            callback(event);
        }
    }

    pub fn discover(&self, current: u64, total: Option<u64>, path: &str) {
        self.emit(ProgressEvent::new(
            "discover",
            current,
            total,
            format!("scanning {}", path),
        ));
    }

    pub fn parse(&self, current: u64, total: Option<u64>, file: &str) {
        self.emit(ProgressEvent::new(
            "parse",
            current,
            total,
            format!("reading {}", file),
        ));
    }

    pub fn chunk(&self, current: u64, total: Option<u64>, chunks_created: usize) {
        self.emit(ProgressEvent::new(
            "chunk",
            current,
            total,
            format!("{} chunks created", chunks_created),
        ));
    }

    pub fn embed(&self, current: u64, total: Option<u64>, model: &str) {
        self.emit(ProgressEvent::new(
            "embed",
            current,
            total,
            format!("model={}", model),
        ));
    }

    pub fn index(&self, current: u64, total: Option<u64>) {
        self.emit(ProgressEvent::new(
            "index",
            current,
            total,
            "writing index",
        ));
    }

    pub fn complete(&self, message: &str) {
        self.emit(ProgressEvent::new("complete", 1, Some(1), message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_progress_event_format() {
        let event = ProgressEvent::new("embed", 32, Some(64), "model=trigram-v1");
        assert_eq!(event.format_simple(), "[embed] 32/64 (50%) - model=trigram-v1");
    }

    #[test]
    fn test_progress_reporter_emit() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();

        let reporter = ProgressReporter::new(Arc::new(move |event| {
            sink.lock().unwrap().push(event);
        }));

        reporter.chunk(2, Some(4), 17);

        let captured = events.lock().unwrap();
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].phase, "chunk");
        assert_eq!(captured[0].message, "17 chunks created");
        assert!(captured[0].elapsed_secs.is_some());
    }

    #[test]
    fn test_noop_reporter() {
        ProgressReporter::noop().index(1, None);
    }
}
