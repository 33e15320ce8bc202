//! Integration tests for the engine logging facade
//!
//! Exercises the exported macros and `Engine` from outside the crate.
//! No GPU required.
//!
//! Run with: cargo test --test logging_integration_tests

use lumen_engine::lumen::{Config, Engine, Error, Result};
use lumen_engine::lumen::log::{Logger, LogEntry, LogSeverity, ScopedTask};
use lumen_engine::{engine_trace, engine_info, engine_warn, engine_bail};
use std::sync::{Arc, Mutex};
use serial_test::serial;

// ============================================================================
// TEST LOGGER IMPLEMENTATION
// ============================================================================

/// Captures entries for verification
struct TestLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl TestLogger {
    fn install() -> Arc<Mutex<Vec<LogEntry>>> {
        let entries = Arc::new(Mutex::new(Vec::new()));
        Engine::set_logger(Self { entries: entries.clone() });
        entries
    }
}

impl Logger for TestLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

fn acquire_image(available: bool) -> Result<u32> {
    if !available {
        engine_bail!("lumen::app", "no image available for slot {}", 1);
    }
    Ok(0)
}

// ============================================================================
// MACRO TESTS
// ============================================================================

#[test]
#[serial]
fn test_integration_macros_reach_custom_logger() {
    let entries = TestLogger::install();

    engine_info!("lumen::app", "window {}x{}", 1280, 720);
    engine_warn!("lumen::app", "swapchain out of date");

    {
        let captured = entries.lock().unwrap();
        assert_eq!(captured.len(), 2);
        assert_eq!(captured[0].severity, LogSeverity::Info);
        assert_eq!(captured[0].source, "lumen::app");
        assert_eq!(captured[0].message, "window 1280x720");
        assert_eq!(captured[0].file, None);
        assert_eq!(captured[1].severity, LogSeverity::Warn);
    }

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_integration_bail_logs_with_location() {
    let entries = TestLogger::install();

    let result = acquire_image(false);

    assert_eq!(
        result,
        Err(Error::BackendError("no image available for slot 1".to_string()))
    );
    {
        let captured = entries.lock().unwrap();
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].severity, LogSeverity::Error);
        assert!(captured[0].file.is_some_and(|f| f.ends_with("logging_integration_tests.rs")));
        assert!(captured[0].line.is_some());
    }
    assert_eq!(acquire_image(true), Ok(0));

    Engine::reset_logger();
}

// ============================================================================
// CONFIGURATION TESTS
// ============================================================================

#[test]
#[serial]
fn test_integration_config_filters_severity() {
    let entries = TestLogger::install();
    Engine::configure(&Config {
        log_severity: LogSeverity::Warn,
        ..Config::default()
    });

    engine_trace!("lumen::app", "[frame 1] before update");
    engine_info!("lumen::app", "renderer ready");
    engine_warn!("lumen::app", "frame skipped");

    {
        let captured = entries.lock().unwrap();
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].message, "frame skipped");
    }

    Engine::reset_logger();
    assert_eq!(Engine::min_severity(), LogSeverity::Trace);
}

#[test]
#[serial]
fn test_integration_scoped_task_brackets_work() {
    let entries = TestLogger::install();

    {
        let _task = ScopedTask::begin("lumen::app", "Asset upload");
        engine_info!("lumen::app", "uploading");
    }

    {
        let captured = entries.lock().unwrap();
        assert_eq!(captured.len(), 3);
        assert!(captured[0].message.contains("Asset upload"));
        assert_eq!(captured[1].message, "uploading");
        assert!(captured[2].message.contains("Asset upload"));
        assert!(captured[2].message.contains("finished"));
    }

    Engine::reset_logger();
}
