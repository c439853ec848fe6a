//! Unit tests for log.rs
//!
//! Tests LogSeverity, LogEntry, DefaultLogger, and the global Log facade.

use crate::log::{DefaultLogger, Log, LogEntry, LogSeverity, Logger};
use serial_test::serial;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

fn entry(severity: LogSeverity, file: Option<&'static str>, line: Option<u32>) -> LogEntry {
    LogEntry {
        severity,
        timestamp: SystemTime::now(),
        source: "galaxy3d::LogTest".to_string(),
        message: format!("{:?} message", severity),
        file,
        line,
    }
}

/// Captures entries so tests can inspect what reached the logger
struct CaptureLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        // Other tests may log concurrently; keep only this module's entries
        if entry.source == "galaxy3d::LogTest" {
            self.entries.lock().unwrap().push(entry.clone());
        }
    }
}

fn install_capture() -> Arc<Mutex<Vec<LogEntry>>> {
    let entries = Arc::new(Mutex::new(Vec::new()));
    Log::set_logger(CaptureLogger { entries: entries.clone() });
    entries
}

// ============================================================================
// LOG SEVERITY TESTS
// ============================================================================

#[test]
fn test_log_severity_ordering() {
    assert!(LogSeverity::Trace < LogSeverity::Debug);
    assert!(LogSeverity::Debug < LogSeverity::Info);
    assert!(LogSeverity::Info < LogSeverity::Warn);
    assert!(LogSeverity::Warn < LogSeverity::Error);
}

#[test]
fn test_log_severity_debug_names() {
    assert_eq!(format!("{:?}", LogSeverity::Trace), "Trace");
    assert_eq!(format!("{:?}", LogSeverity::Warn), "Warn");
}

// ============================================================================
// DEFAULT LOGGER TESTS
// ============================================================================

#[test]
fn test_default_logger_all_severities() {
    let logger = DefaultLogger;
    for severity in [
        LogSeverity::Trace,
        LogSeverity::Debug,
        LogSeverity::Info,
        LogSeverity::Warn,
        LogSeverity::Error,
    ] {
        logger.log(&entry(severity, None, None));
        logger.log(&entry(severity, Some("render_graph.rs"), Some(42)));
    }
}

#[test]
fn test_logger_trait_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<DefaultLogger>();
}

// ============================================================================
// GLOBAL FACADE TESTS
// ============================================================================

#[test]
#[serial]
fn test_log_facade_routes_to_custom_logger() {
    let entries = install_capture();
    Log::set_min_severity(LogSeverity::Trace);

    crate::rg_debug!("galaxy3d::LogTest", "acquired {} targets", 3);
    crate::rg_error!("galaxy3d::LogTest", "failed");

    {
        let captured = entries.lock().unwrap();
        assert_eq!(captured.len(), 2);
        assert_eq!(captured[0].severity, LogSeverity::Debug);
        assert_eq!(captured[0].message, "acquired 3 targets");
        assert!(captured[0].file.is_none());
        assert_eq!(captured[1].severity, LogSeverity::Error);
        assert!(captured[1].file.is_some());
        assert!(captured[1].line.is_some());
    }

    Log::set_min_severity(LogSeverity::Info);
    Log::reset_logger();
}

#[test]
#[serial]
fn test_log_facade_min_severity_filters() {
    let entries = install_capture();
    Log::set_min_severity(LogSeverity::Warn);

    crate::rg_info!("galaxy3d::LogTest", "dropped");
    crate::rg_warn!("galaxy3d::LogTest", "kept");

    {
        let captured = entries.lock().unwrap();
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].message, "kept");
    }
    assert!(!Log::enabled(LogSeverity::Info));
    assert!(Log::enabled(LogSeverity::Error));

    Log::set_min_severity(LogSeverity::Info);
    Log::reset_logger();
}
