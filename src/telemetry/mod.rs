//! Telemetry sink - error and recovery records for observability
//!
//! The headless stand-in for the engine's debug overlay. Controllers
//! push records into an injected sink; binaries use the tracing-backed
//! sink, tests use the collecting sink and assert on its log.

use std::cell::RefCell;
use std::rc::Rc;

use ahash::AHashMap;
use serde::Serialize;

use crate::controller::recovery::ErrorKind;
use crate::core::types::{EntityId, Vec3};

/// One reported error
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    pub bot: Option<EntityId>,
    pub kind: ErrorKind,
    pub message: String,
    pub location: Vec3,
    /// Simulation time of the report, seconds
    pub timestamp: f64,
}

/// One recovery attempt and its outcome
#[derive(Debug, Clone, Serialize)]
pub struct RecoveryRecord {
    pub bot: Option<EntityId>,
    pub kind: ErrorKind,
    pub succeeded: bool,
    pub timestamp: f64,
}

/// Receiver for controller telemetry
pub trait TelemetrySink {
    fn record_error(&mut self, record: ErrorRecord);
    fn record_recovery(&mut self, record: RecoveryRecord);
}

/// Discards everything
#[derive(Debug, Default)]
pub struct NullSink;

impl TelemetrySink for NullSink {
    fn record_error(&mut self, _record: ErrorRecord) {}
    fn record_recovery(&mut self, _record: RecoveryRecord) {}
}

/// Forwards records to the tracing subscriber
#[derive(Debug, Default)]
pub struct TracingSink;

impl TelemetrySink for TracingSink {
    fn record_error(&mut self, record: ErrorRecord) {
        tracing::error!(
            bot = ?record.bot,
            kind = %record.kind,
            message = %record.message,
            timestamp = record.timestamp,
            "telemetry: error"
        );
    }

    fn record_recovery(&mut self, record: RecoveryRecord) {
        tracing::warn!(
            bot = ?record.bot,
            kind = %record.kind,
            succeeded = record.succeeded,
            timestamp = record.timestamp,
            "telemetry: recovery attempt"
        );
    }
}

/// Everything the collecting sink has seen
#[derive(Debug, Default)]
pub struct TelemetryLog {
    pub errors: Vec<ErrorRecord>,
    pub recoveries: Vec<RecoveryRecord>,
}

/// Aggregate recovery figures derived from a log
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecoveryStats {
    pub attempts: usize,
    pub successes: usize,
    pub failures: usize,
}

impl TelemetryLog {
    pub fn recovery_stats(&self) -> RecoveryStats {
        let successes = self.recoveries.iter().filter(|r| r.succeeded).count();
        RecoveryStats {
            attempts: self.recoveries.len(),
            successes,
            failures: self.recoveries.len() - successes,
        }
    }

    /// Error report counts per kind
    pub fn error_counts(&self) -> AHashMap<ErrorKind, usize> {
        let mut counts = AHashMap::new();
        for record in &self.errors {
            *counts.entry(record.kind).or_insert(0) += 1;
        }
        counts
    }
}

/// Keeps every record in a shared log, for tests and the soak runner
///
/// Clones share the same log; controllers are single-threaded (one tick
/// driver), so interior mutability is enough.
#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    log: Rc<RefCell<TelemetryLog>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle onto the log this sink writes into
    pub fn log(&self) -> Rc<RefCell<TelemetryLog>> {
        Rc::clone(&self.log)
    }
}

impl TelemetrySink for CollectingSink {
    fn record_error(&mut self, record: ErrorRecord) {
        self.log.borrow_mut().errors.push(record);
    }

    fn record_recovery(&mut self, record: RecoveryRecord) {
        self.log.borrow_mut().recoveries.push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(kind: ErrorKind, succeeded: bool) -> RecoveryRecord {
        RecoveryRecord {
            bot: None,
            kind,
            succeeded,
            timestamp: 0.0,
        }
    }

    #[test]
    fn test_collecting_sink_shares_log() {
        let sink = CollectingSink::new();
        let log = sink.log();
        let mut cloned = sink.clone();
        cloned.record_recovery(record(ErrorKind::NavigationMissing, true));
        assert_eq!(log.borrow().recoveries.len(), 1);
    }

    #[test]
    fn test_recovery_stats() {
        let mut sink = CollectingSink::new();
        sink.record_recovery(record(ErrorKind::NavigationMissing, true));
        sink.record_recovery(record(ErrorKind::AssetMissing, false));
        sink.record_recovery(record(ErrorKind::PerceptionError, true));

        let stats = sink.log().borrow().recovery_stats();
        assert_eq!(
            stats,
            RecoveryStats {
                attempts: 3,
                successes: 2,
                failures: 1
            }
        );
    }
}
