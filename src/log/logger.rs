use crate::log::level::LogLevel;
use crate::log::level_resolver::LoggerIdentity;
use crate::log::log_record::{CallSite, ErrorTrace, LogEvent};
use crate::log::manager::LogManager;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// 绑定身份的日志器
///
/// 所有输出方法都带 `#[track_caller]`，记录的文件和行号是调用者的位置。
/// 未关联 [`LogManager`] 的 logger（日志系统未初始化时获得）不会输出，
/// 每次调用都在诊断通道上提示。
pub struct Logger {
    identity: LoggerIdentity,
    level: AtomicU8,
    manager: Option<Arc<LogManager>>,
}

impl Logger {
    pub(crate) fn attached(identity: LoggerIdentity, level: LogLevel, manager: Arc<LogManager>) -> Self {
        Self {
            identity,
            level: AtomicU8::new(level.ordinal()),
            manager: Some(manager),
        }
    }

    /// 未关联日志系统的 logger
    pub fn detached(identity: LoggerIdentity) -> Self {
        Self {
            identity,
            level: AtomicU8::new(LogLevel::None.ordinal()),
            manager: None,
        }
    }

    pub fn identity(&self) -> &LoggerIdentity {
        &self.identity
    }

    pub fn is_attached(&self) -> bool {
        self.manager.is_some()
    }

    /// 当前级别阈值
    pub fn level(&self) -> LogLevel {
        LogLevel::from_ordinal(self.level.load(Ordering::Relaxed)).unwrap_or(LogLevel::None)
    }

    pub fn set_level(&self, level: LogLevel) {
        self.level.store(level.ordinal(), Ordering::Relaxed);
    }

    /// 该级别的日志是否会输出
    pub fn is_enabled(&self, level: LogLevel) -> bool {
        level.is_enabled_for(self.level())
    }

    /// 通用输出入口，`method` 由日志宏填入
    #[track_caller]
    pub fn log_at(
        &self,
        level: LogLevel,
        message: impl Into<String>,
        error: Option<ErrorTrace>,
        method: Option<&str>,
    ) {
        let Some(manager) = &self.manager else {
            tracing::warn!(
                logger = %self.identity.full_name,
                level = %level,
                content = %message.into(),
                "log system not initialized, message dropped"
            );
            return;
        };
        if !self.is_enabled(level) {
            return;
        }

        let mut call_site = CallSite::caller(self.identity.full_name.clone());
        if let Some(method) = method {
            call_site = call_site.with_method(method);
        }
        let mut event = LogEvent::new(level, message).with_call_site(call_site);
        if let Some(error) = error {
            event = event.with_error(error);
        }
        manager.dispatch(&event);
    }

    #[track_caller]
    pub fn verbose(&self, message: impl Into<String>) {
        self.log_at(LogLevel::Verbose, message, None, None);
    }

    #[track_caller]
    pub fn debug(&self, message: impl Into<String>) {
        self.log_at(LogLevel::Debug, message, None, None);
    }

    #[track_caller]
    pub fn info(&self, message: impl Into<String>) {
        self.log_at(LogLevel::Info, message, None, None);
    }

    #[track_caller]
    pub fn warn(&self, message: impl Into<String>) {
        self.log_at(LogLevel::Warn, message, None, None);
    }

    #[track_caller]
    pub fn error(&self, message: impl Into<String>) {
        self.log_at(LogLevel::Error, message, None, None);
    }

    #[track_caller]
    pub fn verbose_with<E>(&self, message: impl Into<String>, err: &E)
    where
        E: std::error::Error + ?Sized,
    {
        self.log_at(LogLevel::Verbose, message, Some(ErrorTrace::from_error(err)), None);
    }

    #[track_caller]
    pub fn debug_with<E>(&self, message: impl Into<String>, err: &E)
    where
        E: std::error::Error + ?Sized,
    {
        self.log_at(LogLevel::Debug, message, Some(ErrorTrace::from_error(err)), None);
    }

    #[track_caller]
    pub fn info_with<E>(&self, message: impl Into<String>, err: &E)
    where
        E: std::error::Error + ?Sized,
    {
        self.log_at(LogLevel::Info, message, Some(ErrorTrace::from_error(err)), None);
    }

    #[track_caller]
    pub fn warn_with<E>(&self, message: impl Into<String>, err: &E)
    where
        E: std::error::Error + ?Sized,
    {
        self.log_at(LogLevel::Warn, message, Some(ErrorTrace::from_error(err)), None);
    }

    #[track_caller]
    pub fn error_with<E>(&self, message: impl Into<String>, err: &E)
    where
        E: std::error::Error + ?Sized,
    {
        self.log_at(LogLevel::Error, message, Some(ErrorTrace::from_error(err)), None);
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("identity", &self.identity)
            .field("level", &self.level())
            .field("attached", &self.is_attached())
            .finish()
    }
}
