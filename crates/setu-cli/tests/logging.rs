use std::fs;

use setu_cli::logging::{LogConfig, LogFormat, init_logging};
use tempfile::TempDir;

// Installs the global subscriber, so this binary holds a single test.
#[test]
fn writes_json_events_to_log_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("setu.log");
    let config = LogConfig::from_verbosity(1)
        .with_format(LogFormat::Json)
        .with_ansi(false)
        .with_log_file(Some(path.clone()));
    init_logging(&config).unwrap();

    tracing::warn!(requests = 3, "batch finished");
    tracing::debug!("filtered out");

    let contents = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 1);
    let event: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(event["level"], "WARN");
    assert_eq!(event["fields"]["message"], "batch finished");
    assert_eq!(event["fields"]["requests"], 3);
}
