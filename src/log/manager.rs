use crate::cfg::properties::ExternalConfig;
use crate::cfg::serde_duration::{serde_as, HumanDur};
use crate::log::appender::{
    ConsoleAppender, ConsoleAppenderConfig, FileSink, FileSinkConfig, LogAppender,
};
use crate::log::crash::{CrashDrain, CrashDrainConfig};
use crate::log::error::LogError;
use crate::log::formatter::{validate_time_format, PatternFormatter, PatternFormatterConfig};
use crate::log::level::LogLevel;
use crate::log::level_resolver::{LevelOverride, LevelResolver, LoggerIdentity};
use crate::log::log_record::{LogEvent, QueuedRecord};
use crate::log::logger::Logger;
use crate::log::retention::{RetentionManager, RetentionPolicy, RetentionTimer};
use anyhow::{anyhow, Context};
use garde::Validate;
use serde::Deserialize;
use smart_default::SmartDefault;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// 外部配置文件名，默认位于日志目录的上一级
pub const EXTERNAL_CONFIG_FILE_NAME: &str = "log.config";

/// 日志系统初始化配置
#[serde_as]
#[derive(Debug, Clone, Deserialize, SmartDefault, Validate, PartialEq)]
#[serde(default)]
pub struct LogManagerConfig {
    /// 日志 TAG，用于 `%T`
    #[default = "daylog"]
    #[garde(length(min = 1))]
    pub tag: String,

    /// 全局级别阈值，只输出严格高于阈值的日志
    #[default(LogLevel::All)]
    #[garde(skip)]
    pub level: LogLevel,

    /// `%d` 的时间格式（strftime 语法）
    #[default = "%Y-%m-%d %H:%M:%S%.3f"]
    #[garde(custom(check_time_format))]
    pub time_format: String,

    /// 终端日志模板
    #[default = "[%c][%M]%m%n"]
    #[garde(length(min = 1))]
    pub terminal_format: String,

    /// 文件日志模板
    #[default = "%d  %p  %L  %T(%l): [%c][%M]%m%n"]
    #[garde(length(min = 1))]
    pub file_format: String,

    /// 应用标识，用于 `%p`
    #[garde(skip)]
    pub app_id: String,

    /// 日志目录
    #[default = "logs"]
    #[garde(length(min = 1))]
    pub log_dir: String,

    /// 最多保留天数，<= 0 关闭按天清理
    #[default = 7]
    #[garde(skip)]
    pub max_save_days: i64,

    /// 日志总大小上限（字节），<= 0 关闭按大小清理
    #[default(-1)]
    #[garde(skip)]
    pub max_save_size: i64,

    /// 是否在 panic 时排空日志
    #[default = true]
    #[garde(skip)]
    pub catch_crash: bool,

    /// 是否写日志文件
    #[default = true]
    #[garde(skip)]
    pub write_to_file: bool,

    /// 是否读取外部配置文件
    #[default = true]
    #[garde(skip)]
    pub enable_external_config: bool,

    /// 外部配置文件路径，默认 `<log_dir>/../log.config`
    #[garde(skip)]
    pub external_config_path: Option<String>,

    /// 类/包级别覆盖
    #[garde(skip)]
    pub level_overrides: Vec<LevelOverride>,

    /// 定时清理间隔
    #[serde_as(as = "HumanDur")]
    #[default(Duration::from_secs(3600))]
    #[garde(custom(check_non_zero))]
    pub retention_interval: Duration,

    /// 文件写入线程的轮询间隔
    #[serde_as(as = "HumanDur")]
    #[default(Duration::from_millis(500))]
    #[garde(custom(check_non_zero))]
    pub poll_interval: Duration,

    /// panic 时等待排空的轮询间隔
    #[serde_as(as = "HumanDur")]
    #[default(Duration::from_millis(100))]
    #[garde(custom(check_non_zero))]
    pub crash_poll_interval: Duration,

    /// panic 排空后是否以退出码 101 结束进程
    #[default = false]
    #[garde(skip)]
    pub exit_on_crash: bool,

    /// 终端输出配置
    #[garde(skip)]
    pub console: ConsoleAppenderConfig,
}

fn check_time_format(value: &str, _ctx: &()) -> garde::Result {
    validate_time_format(value).map_err(garde::Error::new)
}

fn check_non_zero(value: &Duration, _ctx: &()) -> garde::Result {
    if value.is_zero() {
        return Err(garde::Error::new("must be greater than zero"));
    }
    Ok(())
}

impl LogManagerConfig {
    /// 从配置文件加载，按扩展名选择 json/json5/yaml/toml
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LogError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        Self::parse(&content, &ext)
            .with_context(|| format!("parse {}", path.display()))
            .map_err(|e| LogError::Config(format!("{:#}", e)))
    }

    fn parse(content: &str, ext: &str) -> anyhow::Result<Self> {
        match ext {
            "json" => Ok(serde_json::from_str(content)?),
            "json5" => Ok(json5::from_str(content)?),
            "yaml" | "yml" => Ok(serde_yaml::from_str(content)?),
            "toml" => Ok(toml::from_str(content)?),
            _ => Err(anyhow!("不支持的文件格式: {}", ext)),
        }
    }

    /// 外部配置文件路径
    pub fn external_config_path(&self) -> PathBuf {
        match &self.external_config_path {
            Some(path) => PathBuf::from(path),
            // 按字面取上一级，日志目录此时可能还不存在
            None => Path::new(&self.log_dir)
                .parent()
                .unwrap_or_else(|| Path::new(""))
                .join(EXTERNAL_CONFIG_FILE_NAME),
        }
    }
}

/// 日志系统上下文
///
/// 持有格式化器、级别解析器、终端输出、文件写入和清理任务，
/// 由 [`LogManager::logger`] 创建的 [`Logger`] 共享同一个实例。
pub struct LogManager {
    config: LogManagerConfig,
    resolver: LevelResolver,
    terminal_formatter: PatternFormatter,
    file_formatter: Arc<PatternFormatter>,
    console: ConsoleAppender,
    sink: Arc<FileSink>,
    retention: Arc<RetentionManager>,
    timer: Mutex<Option<RetentionTimer>>,
}

impl LogManager {
    /// 初始化日志系统
    ///
    /// 依次读取外部配置、校验配置、执行一次启动清理并启动定时清理，
    /// 开启 `catch_crash` 时安装 panic 钩子。
    pub fn new(config: LogManagerConfig) -> Result<Arc<Self>, LogError> {
        let mut config = config;
        if config.enable_external_config {
            let path = config.external_config_path();
            match ExternalConfig::load(&path) {
                Ok(Some(external)) => {
                    tracing::debug!(path = %path.display(), "external log config applied");
                    external.apply_to(&mut config);
                }
                Ok(None) => {}
                Err(e) => tracing::warn!(error = %format!("{:#}", e), "external log config ignored"),
            }
        }
        config.validate()?;

        let resolver = LevelResolver::with_overrides(config.level, &config.level_overrides);
        let formatter_config = |pattern: &str| PatternFormatterConfig {
            pattern: pattern.to_string(),
            tag: config.tag.clone(),
            time_format: config.time_format.clone(),
            app_id: config.app_id.clone(),
        };
        let terminal_formatter = PatternFormatter::from(formatter_config(&config.terminal_format));
        let file_formatter = Arc::new(PatternFormatter::from(formatter_config(&config.file_format)));

        let sink = Arc::new(FileSink::from(FileSinkConfig {
            log_dir: config.log_dir.clone(),
            enabled: config.write_to_file,
            poll_interval: config.poll_interval,
        }));

        let retention = Arc::new(RetentionManager::new(
            &config.log_dir,
            RetentionPolicy::from_limits(config.max_save_days, config.max_save_size),
        ));
        if retention.policy().is_enabled() {
            if let Err(e) = retention.run_now() {
                tracing::warn!(error = %format!("{:#}", e), "startup log cleanup failed");
            }
        }
        // 不写文件时只做启动清理
        let timer = if retention.policy().is_enabled() && config.write_to_file {
            Some(RetentionTimer::start(
                Arc::clone(&retention),
                config.retention_interval,
            )?)
        } else {
            None
        };

        if config.catch_crash {
            CrashDrain::new(
                CrashDrainConfig {
                    poll_interval: config.crash_poll_interval,
                    exit_on_crash: config.exit_on_crash,
                },
                Arc::clone(&sink),
                Arc::clone(&retention),
                Arc::clone(&file_formatter),
            )
            .install();
        }

        let console = ConsoleAppender::from(config.console.clone());
        Ok(Arc::new(Self {
            config,
            resolver,
            terminal_formatter,
            file_formatter,
            console,
            sink,
            retention,
            timer: Mutex::new(timer),
        }))
    }

    /// 为指定身份创建 logger，级别在创建时解析
    pub fn logger(self: &Arc<Self>, identity: LoggerIdentity) -> Logger {
        let level = self.resolver.resolve(&identity);
        Logger::attached(identity, level, Arc::clone(self))
    }

    /// 以类型名为身份创建 logger
    pub fn logger_for<T: ?Sized>(self: &Arc<Self>) -> Logger {
        self.logger(LoggerIdentity::of::<T>())
    }

    /// 生效的配置（已合并外部配置）
    pub fn config(&self) -> &LogManagerConfig {
        &self.config
    }

    pub fn resolver(&self) -> &LevelResolver {
        &self.resolver
    }

    pub fn file_sink(&self) -> &Arc<FileSink> {
        &self.sink
    }

    pub fn retention(&self) -> &Arc<RetentionManager> {
        &self.retention
    }

    /// 定时清理是否在运行
    pub fn has_retention_timer(&self) -> bool {
        self.timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// 输出一条已通过级别过滤的事件：终端同步输出，文件异步写入
    pub fn dispatch(&self, event: &LogEvent) {
        if self.console.is_enabled() {
            let text = self.terminal_formatter.render_event(event);
            if let Err(e) = self
                .console
                .append(QueuedRecord::new(event.level, event.timestamp, text))
            {
                tracing::warn!(error = %e, "terminal log output failed");
            }
        }

        let text = self.file_formatter.render_event(event);
        self.sink
            .enqueue(QueuedRecord::new(event.level, event.timestamp, text));
    }

    /// 等待已入队的日志写完
    pub fn flush(&self) -> anyhow::Result<()> {
        self.console.flush()?;
        self.sink.flush()
    }

    /// 停止定时清理并有序关闭文件写入，返回是否在超时前排空
    pub fn shutdown(&self, timeout: Duration) -> bool {
        let timer = self
            .timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(mut timer) = timer {
            timer.stop();
        }
        let _ = self.console.flush();
        self.sink.shutdown(timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::level_resolver::OverrideScope;
    use tempfile::TempDir;

    fn test_config(dir: &Path) -> LogManagerConfig {
        LogManagerConfig {
            log_dir: dir.join("logs").to_string_lossy().to_string(),
            catch_crash: false,
            poll_interval: Duration::from_millis(10),
            console: ConsoleAppenderConfig {
                enabled: false,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_default_config() {
        let config = LogManagerConfig::default();
        assert_eq!(config.tag, "daylog");
        assert_eq!(config.level, LogLevel::All);
        assert_eq!(config.time_format, "%Y-%m-%d %H:%M:%S%.3f");
        assert_eq!(config.terminal_format, "[%c][%M]%m%n");
        assert_eq!(config.file_format, "%d  %p  %L  %T(%l): [%c][%M]%m%n");
        assert_eq!(config.log_dir, "logs");
        assert_eq!(config.max_save_days, 7);
        assert_eq!(config.max_save_size, -1);
        assert!(config.catch_crash);
        assert!(config.write_to_file);
        assert!(config.enable_external_config);
        assert_eq!(config.retention_interval, Duration::from_secs(3600));
        assert_eq!(config.poll_interval, Duration::from_millis(500));
        assert_eq!(config.crash_poll_interval, Duration::from_millis(100));
        assert!(!config.exit_on_crash);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let config = LogManagerConfig {
            tag: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = LogManagerConfig {
            time_format: "%Q".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = LogManagerConfig {
            poll_interval: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_deserialize_json5() {
        let config: LogManagerConfig = json5::from_str(
            r#"{
                tag: "svc",
                level: "info",
                max_save_days: 0,
                max_save_size: 1048576,
                poll_interval: "50ms",
                level_overrides: [
                    { scope: "package", key: "app::net", level: "warn" },
                ],
                console: { target: "stdout" },
            }"#,
        )
        .unwrap();

        assert_eq!(config.tag, "svc");
        assert_eq!(config.level, LogLevel::Info);
        assert_eq!(config.max_save_size, 1048576);
        assert_eq!(config.poll_interval, Duration::from_millis(50));
        assert_eq!(config.level_overrides[0].scope, OverrideScope::Package);
        assert_eq!(config.file_format, LogManagerConfig::default().file_format);
    }

    #[test]
    fn test_from_file_by_extension() {
        let dir = TempDir::new().unwrap();

        let yaml = dir.path().join("log.yaml");
        std::fs::write(&yaml, "tag: y\nretention_interval: 30m\n").unwrap();
        let config = LogManagerConfig::from_file(&yaml).unwrap();
        assert_eq!(config.tag, "y");
        assert_eq!(config.retention_interval, Duration::from_secs(1800));

        let toml = dir.path().join("log.toml");
        std::fs::write(&toml, "tag = \"t\"\nmax_save_days = 3\n").unwrap();
        assert_eq!(LogManagerConfig::from_file(&toml).unwrap().max_save_days, 3);

        let json = dir.path().join("log.json");
        std::fs::write(&json, r#"{"app_id": "demo"}"#).unwrap();
        assert_eq!(LogManagerConfig::from_file(&json).unwrap().app_id, "demo");

        let ini = dir.path().join("log.ini");
        std::fs::write(&ini, "tag=x").unwrap();
        assert!(matches!(
            LogManagerConfig::from_file(&ini),
            Err(LogError::Config(_))
        ));
        assert!(matches!(
            LogManagerConfig::from_file(dir.path().join("missing.json")),
            Err(LogError::Io(_))
        ));
    }

    #[test]
    fn test_external_config_path() {
        let config = LogManagerConfig {
            log_dir: "/data/app/logs".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.external_config_path(),
            PathBuf::from("/data/app/log.config")
        );

        let config = LogManagerConfig {
            log_dir: "logs".to_string(),
            ..Default::default()
        };
        assert_eq!(config.external_config_path(), PathBuf::from("log.config"));

        let config = LogManagerConfig {
            external_config_path: Some("/etc/app/log.config".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.external_config_path(),
            PathBuf::from("/etc/app/log.config")
        );
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let dir = TempDir::new().unwrap();
        let config = LogManagerConfig {
            file_format: String::new(),
            ..test_config(dir.path())
        };
        assert!(matches!(LogManager::new(config), Err(LogError::Config(_))));
    }

    #[test]
    fn test_external_config_overrides_init_values() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("log.config"),
            "LOG_LEVEL=warn\nLOG_TAG=ext\nPACKAGE_LOG_LEVEL=app::db:verbose\n",
        )
        .unwrap();

        let manager = LogManager::new(test_config(dir.path())).unwrap();
        assert_eq!(manager.config().tag, "ext");
        assert_eq!(manager.resolver().global(), LogLevel::Warn);
        assert_eq!(
            manager
                .resolver()
                .resolve(&LoggerIdentity::from_path("app::db::Pool")),
            LogLevel::Verbose
        );
        manager.shutdown(Duration::from_secs(1));
    }

    #[test]
    fn test_external_config_found_before_log_dir_exists() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("log.config"), "LOG_TAG=first\n").unwrap();
        assert!(!dir.path().join("logs").exists());

        let manager = LogManager::new(test_config(dir.path())).unwrap();
        assert_eq!(manager.config().tag, "first");
        manager.shutdown(Duration::from_secs(1));
    }

    #[test]
    fn test_retention_timer_only_when_writing_files() {
        let dir = TempDir::new().unwrap();
        let logs = dir.path().join("logs");
        std::fs::create_dir_all(&logs).unwrap();
        let old = logs.join("2000-01-01.log");
        std::fs::write(&old, "old").unwrap();

        let manager = LogManager::new(LogManagerConfig {
            write_to_file: false,
            ..test_config(dir.path())
        })
        .unwrap();
        // 启动清理照常执行
        assert!(!old.exists());
        assert!(!manager.has_retention_timer());
        manager.shutdown(Duration::from_secs(1));

        let manager = LogManager::new(test_config(dir.path())).unwrap();
        assert!(manager.has_retention_timer());
        manager.shutdown(Duration::from_secs(1));
        assert!(!manager.has_retention_timer());
    }

    #[test]
    fn test_external_config_can_be_disabled() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("log.config"), "LOG_TAG=ext\n").unwrap();

        let manager = LogManager::new(LogManagerConfig {
            enable_external_config: false,
            ..test_config(dir.path())
        })
        .unwrap();
        assert_eq!(manager.config().tag, "daylog");
        manager.shutdown(Duration::from_secs(1));
    }

    #[test]
    fn test_startup_retention() {
        let dir = TempDir::new().unwrap();
        let logs = dir.path().join("logs");
        std::fs::create_dir_all(&logs).unwrap();
        let old = logs.join("2000-01-01.log");
        std::fs::write(&old, "old").unwrap();

        let manager = LogManager::new(test_config(dir.path())).unwrap();
        assert!(!old.exists());
        manager.shutdown(Duration::from_secs(1));
    }

    #[test]
    fn test_dispatch_writes_file_record() {
        let dir = TempDir::new().unwrap();
        let manager = LogManager::new(LogManagerConfig {
            file_format: "%L|%m%n".to_string(),
            ..test_config(dir.path())
        })
        .unwrap();

        let event = LogEvent::new(LogLevel::Info, "hello");
        let day = event.timestamp.date_naive();
        manager.dispatch(&event);
        manager.flush().unwrap();

        let path = crate::log::log_file::LogFile::for_day(&dir.path().join("logs"), day).path;
        let content = std::fs::read_to_string(path).unwrap();
        assert_eq!(content, format!("I|hello{}", crate::log::formatter::LINE_ENDING));
        assert!(manager.shutdown(Duration::from_secs(1)));
    }
}
