use std::io::Write;

use super::*;

#[test]
fn test_default_config() {
    let config = Config::default();
    assert_eq!(config.log.level, LogLevel::Info);
    assert_eq!(config.dump.format, DumpFormat::Text);
    assert_eq!(config.dump.graph_name, "lazy_ir");
}

#[test]
fn test_from_ron() {
    let config =
        Config::from_ron(r#"(log: (level: debug), dump: (format: dot, graph_name: "g"))"#).unwrap();
    assert_eq!(config.log.level, LogLevel::Debug);
    assert_eq!(config.dump.format, DumpFormat::Dot);
    assert_eq!(config.dump.graph_name, "g");
}

#[test]
fn test_partial_file_keeps_defaults() {
    let config = Config::from_ron("(dump: (format: dot))").unwrap();
    assert_eq!(config.log, LogConfig::default());
    assert_eq!(config.dump.format, DumpFormat::Dot);
    assert_eq!(config.dump.graph_name, "lazy_ir");

    assert_eq!(Config::from_ron("()").unwrap(), Config::default());
}

#[test]
fn test_bad_ron() {
    assert!(matches!(
        Config::from_ron("(log: (level: loud))"),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn test_override_log_level() {
    let mut config = Config::default();
    config.override_log_level("WARNING").unwrap();
    assert_eq!(config.log.level, LogLevel::Warn);

    let err = config.override_log_level("chatty").unwrap_err();
    assert_eq!(err.to_string(), "Invalid log level: chatty");
    assert_eq!(config.log.level, LogLevel::Warn);
}

#[test]
fn test_load_config_file() {
    let mut file = tempfile::Builder::new().suffix(".ron").tempfile().unwrap();
    writeln!(file, "(log: (level: error))").unwrap();

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.log.level, LogLevel::Error);
}

#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        load_config(&dir.path().join("missing.ron")),
        Err(ConfigError::Io(_))
    ));
}

#[test]
fn test_log_level_order_and_text() {
    assert!(LogLevel::Debug < LogLevel::Info);
    assert!(LogLevel::Warn < LogLevel::Error);
    assert_eq!(" Info ".parse::<LogLevel>(), Ok(LogLevel::Info));
    assert_eq!(LogLevel::Warn.to_string(), "warn");
    assert_eq!(tracing::Level::from(LogLevel::Error), tracing::Level::ERROR);
}
