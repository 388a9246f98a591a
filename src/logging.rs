//! Tracing setup for both front-ends.
//!
//! Line mode writes compact events to stderr. The full-screen console cannot
//! share the terminal with a stderr writer, so it installs [`CaptureLayer`]
//! instead and drains the buffered lines into its diagnostics pane.

use std::collections::VecDeque;
use std::fmt::Write as _;
use std::sync::{Arc, Mutex};

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Lines kept before the oldest diagnostics are discarded.
const DIAGNOSTIC_CAPACITY: usize = 500;

/// Install a stderr subscriber. `RUST_LOG` wins over `level` when set.
/// Subsequent calls are no-ops.
pub fn init_stderr(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}

/// Install a subscriber that buffers formatted events for the console.
pub fn init_console(level: &str) -> DiagnosticLog {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let log = DiagnosticLog::default();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(CaptureLayer::new(log.clone()))
        .try_init();

    log
}

/// One formatted diagnostic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: Level,
    pub text: String,
}

/// Thread-safe ring of captured diagnostics, shared between the layer and
/// whoever drains it.
#[derive(Clone, Default)]
pub struct DiagnosticLog {
    lines: Arc<Mutex<VecDeque<Diagnostic>>>,
}

impl DiagnosticLog {
    fn push(&self, diagnostic: Diagnostic) {
        if let Ok(mut lines) = self.lines.lock() {
            if lines.len() == DIAGNOSTIC_CAPACITY {
                lines.pop_front();
            }
            lines.push_back(diagnostic);
        }
    }

    /// Remove and return everything captured since the last drain.
    pub fn drain(&self) -> Vec<Diagnostic> {
        self.lines
            .lock()
            .map(|mut lines| lines.drain(..).collect())
            .unwrap_or_default()
    }
}

/// Layer that formats each event as `message key=value ...`.
pub struct CaptureLayer {
    log: DiagnosticLog,
}

impl CaptureLayer {
    pub fn new(log: DiagnosticLog) -> Self {
        Self { log }
    }
}

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);
        self.log.push(Diagnostic {
            level: *event.metadata().level(),
            text: visitor.finish(),
        });
    }
}

#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: String,
}

impl LineVisitor {
    fn finish(self) -> String {
        if self.fields.is_empty() {
            self.message
        } else if self.message.is_empty() {
            self.fields
        } else {
            format!("{} {}", self.message, self.fields)
        }
    }
}

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.push_field(field, value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.push_field(field, format!("{value:?}"));
        }
    }
}

impl LineVisitor {
    fn push_field(&mut self, field: &Field, value: impl std::fmt::Display) {
        if !self.fields.is_empty() {
            self.fields.push(' ');
        }
        let _ = write!(self.fields, "{}={}", field.name(), value);
    }
}
