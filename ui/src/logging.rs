use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use casedesk_core::targets;
use tracing::Subscriber;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::Context;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{reload, EnvFilter, Layer, Registry};

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub sequence: u64,
    pub timestamp: SystemTime,
    pub level: tracing::Level,
    pub target: String,
    pub message: String,
}

impl LogEntry {
    /// Wall-clock time of day in UTC as `HH:MM:SS`.
    pub fn clock(&self) -> String {
        let secs = self
            .timestamp
            .duration_since(UNIX_EPOCH)
            .map(|duration| duration.as_secs())
            .unwrap_or(0);
        let day = secs % 86_400;
        format!("{:02}:{:02}:{:02}", day / 3600, (day / 60) % 60, day % 60)
    }

    pub fn format_line(&self) -> String {
        format!(
            "{} {:<5} {:<8} {}",
            self.clock(),
            self.level.as_str(),
            self.target,
            self.message
        )
    }
}

#[derive(Debug, Default)]
struct LogBuffer {
    entries: VecDeque<LogEntry>,
    next_sequence: u64,
}

/// Bounded, shareable ring buffer of captured log events.
#[derive(Debug, Clone)]
pub struct LogStore {
    inner: Arc<Mutex<LogBuffer>>,
    capacity: usize,
}

impl LogStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(LogBuffer {
                entries: VecDeque::with_capacity(capacity),
                next_sequence: 0,
            })),
            capacity,
        }
    }

    fn push(&self, timestamp: SystemTime, level: tracing::Level, target: &str, message: String) {
        if let Ok(mut guard) = self.inner.lock() {
            if guard.entries.len() >= self.capacity {
                guard.entries.pop_front();
            }
            let sequence = guard.next_sequence;
            guard.next_sequence += 1;
            guard.entries.push_back(LogEntry {
                sequence,
                timestamp,
                level,
                target: target.to_string(),
                message,
            });
        }
    }

    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.entries_after(None)
    }

    /// Entries newer than `sequence`, or everything when `None`.
    pub fn entries_after(&self, sequence: Option<u64>) -> Vec<LogEntry> {
        let Ok(guard) = self.inner.lock() else {
            return Vec::new();
        };
        guard
            .entries
            .iter()
            .filter(|entry| sequence.is_none_or(|last| entry.sequence > last))
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        if let Ok(mut guard) = self.inner.lock() {
            guard.entries.clear();
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub const ALL: [LogLevel; 5] = [
        LogLevel::Error,
        LogLevel::Warn,
        LogLevel::Info,
        LogLevel::Debug,
        LogLevel::Trace,
    ];

    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        LogLevel::ALL
            .into_iter()
            .find(|level| level.to_string().eq_ignore_ascii_case(value.trim()))
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Error => f.write_str("Error"),
            LogLevel::Warn => f.write_str("Warn"),
            LogLevel::Info => f.write_str("Info"),
            LogLevel::Debug => f.write_str("Debug"),
            LogLevel::Trace => f.write_str("Trace"),
        }
    }
}

pub type ReloadHandle = reload::Handle<EnvFilter, Registry>;

fn level_filter(level: LogLevel) -> EnvFilter {
    // Dependencies stay at warn so the console only shows dashboard events.
    let base = EnvFilter::default()
        .add_directive(LevelFilter::WARN.into())
        .add_directive(level_directive("casedesk", level));
    targets::ALL
        .iter()
        .fold(base, |filter, target| filter.add_directive(level_directive(target, level)))
}

fn level_directive(target: &str, level: LogLevel) -> tracing_subscriber::filter::Directive {
    format!("{target}={}", level.to_level_filter())
        .parse()
        .unwrap_or_else(|_| level.to_level_filter().into())
}

pub fn init_logging(store: LogStore, level: LogLevel) -> ReloadHandle {
    let (reload_layer, handle) = reload::Layer::new(level_filter(level));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_ansi(false);

    let subscriber = Registry::default()
        .with(reload_layer)
        .with(LogCaptureLayer::new(store))
        .with(fmt_layer);

    let _ = tracing::subscriber::set_global_default(subscriber);

    handle
}

pub fn apply_log_level(handle: &ReloadHandle, level: LogLevel) {
    let new_filter = level_filter(level);
    let _ = handle.modify(|filter| {
        *filter = new_filter;
    });
}

struct LogCaptureLayer {
    store: LogStore,
}

impl LogCaptureLayer {
    fn new(store: LogStore) -> Self {
        Self { store }
    }
}

impl<S> Layer<S> for LogCaptureLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let message = match visitor.message {
            Some(message) if visitor.fields.is_empty() => message,
            Some(message) => format!("{message} {}", visitor.fields.join(" ")),
            None => visitor.fields.join(" "),
        };

        self.store
            .push(SystemTime::now(), *metadata.level(), metadata.target(), message);
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    fields: Vec<String>,
}

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn fmt::Debug) {
        let value = format!("{value:?}");
        if field.name() == "message" {
            self.message = Some(value.trim_matches('"').to_string());
        } else {
            self.fields
                .push(format!("{}={}", field.name(), value.trim_matches('"')));
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.fields.push(format!("{}={value}", field.name()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_drops_oldest_and_keeps_sequence() {
        let store = LogStore::new(2);
        for index in 0..3 {
            store.push(
                SystemTime::now(),
                tracing::Level::INFO,
                "records",
                format!("event {index}"),
            );
        }

        let entries = store.snapshot();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].sequence, 1);
        assert_eq!(entries[1].message, "event 2");

        let newer = store.entries_after(Some(1));
        assert_eq!(newer.len(), 1);
        assert_eq!(newer[0].sequence, 2);
    }

    #[test]
    fn capture_layer_records_message_and_fields() {
        let store = LogStore::new(8);
        let subscriber = Registry::default().with(LogCaptureLayer::new(store.clone()));

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(target: "gateway", status = 503, "GET surveys failed");
        });

        let entries = store.snapshot();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].target, "gateway");
        assert_eq!(entries[0].level, tracing::Level::WARN);
        assert_eq!(entries[0].message, "GET surveys failed status=503");
    }

    #[test]
    fn level_filter_covers_every_dashboard_target() {
        let store = LogStore::new(16);
        let subscriber = Registry::default()
            .with(level_filter(LogLevel::Debug))
            .with(LogCaptureLayer::new(store.clone()));

        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!(target: targets::GATEWAY, "dashboard event");
            tracing::debug!(target: targets::RECORDS, "dashboard event");
            tracing::debug!(target: targets::CONFIG, "dashboard event");
            tracing::debug!(target: targets::UI, "dashboard event");
            tracing::debug!(target: "hyper::client", "dependency chatter");
        });

        let captured: Vec<String> = store
            .snapshot()
            .into_iter()
            .map(|entry| entry.target)
            .collect();
        assert_eq!(captured, targets::ALL.map(str::to_string).to_vec());
    }

    #[test]
    fn log_level_parses_display_names() {
        assert_eq!(LogLevel::parse("debug"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::parse("verbose"), None);
        assert_eq!(LogLevel::default(), LogLevel::Info);
    }

    #[test]
    fn clock_formats_time_of_day() {
        let entry = LogEntry {
            sequence: 0,
            timestamp: UNIX_EPOCH + std::time::Duration::from_secs(86_400 + 3_723),
            level: tracing::Level::INFO,
            target: "ui".to_string(),
            message: "ready".to_string(),
        };
        assert_eq!(entry.clock(), "01:02:03");
        assert!(entry.format_line().ends_with("ready"));
    }
}
