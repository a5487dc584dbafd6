//! Integration tests for logging setup

use core_fs::logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
use core_fs::ConfigError;

#[test]
fn test_logging_initializes_once() {
    // A global subscriber can only be set once per process; this binary
    // holds the single test that does it.
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Debug)
        .with_target(false);
    init_logging(config.clone()).unwrap();

    let err = init_logging(config).unwrap_err();
    assert!(matches!(err, ConfigError::Logging(_)));
    assert!(err.to_string().starts_with("Logging error:"));

    // Dispatch logging must not disturb normal operation.
    let fs = core_fs::Fs::new(
        core_fs::FsConfig::builder()
            .detect_primary_runtime(false)
            .build()
            .unwrap(),
    );
    assert!(fs.cwd().is_ok());
}
