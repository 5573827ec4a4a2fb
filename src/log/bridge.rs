use crate::log::error::LogError;
use crate::log::level::LogLevel;
use crate::log::level_resolver::LoggerIdentity;
use crate::log::log_record::{CallSite, LogEvent};
use crate::log::manager::LogManager;
use crate::log::appender::LogAppender;
use std::sync::Arc;

/// `log` 门面到 LogManager 的桥接
///
/// 记录的 target 作为 logger 身份参与级别解析，`trace` 映射为 verbose。
pub struct LogBridge {
    manager: Arc<LogManager>,
}

impl LogBridge {
    pub fn new(manager: Arc<LogManager>) -> Self {
        Self { manager }
    }

    /// 安装为 `log` 的全局 logger，只能成功一次
    pub fn install(manager: Arc<LogManager>) -> Result<(), LogError> {
        ::log::set_boxed_logger(Box::new(Self::new(manager)))
            .map_err(|e| LogError::Config(e.to_string()))?;
        ::log::set_max_level(::log::LevelFilter::Trace);
        Ok(())
    }

    fn threshold(&self, target: &str) -> LogLevel {
        self.manager
            .resolver()
            .resolve(&LoggerIdentity::from_path(target))
    }
}

/// `log` 级别到本地级别
pub fn map_level(level: ::log::Level) -> LogLevel {
    match level {
        ::log::Level::Trace => LogLevel::Verbose,
        ::log::Level::Debug => LogLevel::Debug,
        ::log::Level::Info => LogLevel::Info,
        ::log::Level::Warn => LogLevel::Warn,
        ::log::Level::Error => LogLevel::Error,
    }
}

impl ::log::Log for LogBridge {
    fn enabled(&self, metadata: &::log::Metadata<'_>) -> bool {
        map_level(metadata.level()).is_enabled_for(self.threshold(metadata.target()))
    }

    fn log(&self, record: &::log::Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let mut event = LogEvent::new(map_level(record.level()), record.args().to_string());
        if let (Some(file), Some(line)) = (record.file(), record.line()) {
            event = event.with_call_site(CallSite::new(record.target(), file, line));
        }
        self.manager.dispatch(&event);
    }

    fn flush(&self) {
        if let Err(e) = self.manager.file_sink().flush() {
            tracing::warn!(error = %e, "log bridge flush failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::appender::ConsoleAppenderConfig;
    use crate::log::level_resolver::LevelOverride;
    use crate::log::log_file::LogFile;
    use crate::log::manager::LogManagerConfig;
    use ::log::Log;
    use chrono::Local;
    use std::time::Duration;
    use tempfile::TempDir;

    fn bridge(dir: &TempDir) -> LogBridge {
        let manager = LogManager::new(LogManagerConfig {
            log_dir: dir.path().to_string_lossy().to_string(),
            level: LogLevel::Debug,
            level_overrides: vec![LevelOverride::package("noisy", LogLevel::Error)],
            file_format: "%L %C %f:%l %m%n".to_string(),
            catch_crash: false,
            enable_external_config: false,
            poll_interval: Duration::from_millis(10),
            console: ConsoleAppenderConfig {
                enabled: false,
                ..Default::default()
            },
            ..Default::default()
        })
        .unwrap();
        LogBridge::new(manager)
    }

    #[test]
    fn test_map_level() {
        assert_eq!(map_level(::log::Level::Trace), LogLevel::Verbose);
        assert_eq!(map_level(::log::Level::Error), LogLevel::Error);
    }

    #[test]
    fn test_routes_records() {
        let dir = TempDir::new().unwrap();
        let bridge = bridge(&dir);

        bridge.log(
            &::log::Record::builder()
                .args(format_args!("from log"))
                .level(::log::Level::Info)
                .target("app::net")
                .file(Some("src/net.rs"))
                .line(Some(9))
                .build(),
        );
        // 阈值 Debug，Debug 不输出
        bridge.log(
            &::log::Record::builder()
                .args(format_args!("too low"))
                .level(::log::Level::Debug)
                .target("app::net")
                .build(),
        );
        // noisy 包阈值为 Error
        bridge.log(
            &::log::Record::builder()
                .args(format_args!("muted"))
                .level(::log::Level::Warn)
                .target("noisy::x")
                .build(),
        );
        bridge.flush();

        let path = LogFile::for_day(dir.path(), Local::now().date_naive()).path;
        let content = std::fs::read_to_string(path).unwrap();
        assert_eq!(content.trim_end(), "I app::net net.rs:   9 from log");
    }
}
