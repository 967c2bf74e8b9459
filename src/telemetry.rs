//! Fire-and-forget analytics
//!
//! The simulation never waits on or inspects the sink; failures are the
//! sink's problem.

use serde_json::Value;

pub trait AnalyticsSink {
    fn log_event(&mut self, name: &str, params: Value);
}

/// Drops everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl AnalyticsSink for NullSink {
    fn log_event(&mut self, _name: &str, _params: Value) {}
}

/// Records events in order
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub events: Vec<(String, Value)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, name: &str) -> usize {
        self.events.iter().filter(|(n, _)| n == name).count()
    }
}

impl AnalyticsSink for MemorySink {
    fn log_event(&mut self, name: &str, params: Value) {
        log::trace!("analytics: {} {}", name, params);
        self.events.push((name.to_string(), params));
    }
}

/// Forwards events to the `log` facade at debug level
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl AnalyticsSink for LogSink {
    fn log_event(&mut self, name: &str, params: Value) {
        log::debug!("analytics: {} {}", name, params);
    }
}
