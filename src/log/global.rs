use crate::log::error::LogError;
use crate::log::level_resolver::LoggerIdentity;
use crate::log::logger::Logger;
use crate::log::manager::{LogManager, LogManagerConfig};
use once_cell::sync::Lazy;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

/// 全局 LogManager
///
/// 初始化失败或尚未初始化时为 None，此时获得的 logger 不会输出。
static GLOBAL_LOG_MANAGER: Lazy<RwLock<Option<Arc<LogManager>>>> =
    Lazy::new(|| RwLock::new(None));

/// 初始化全局日志系统
///
/// ```ignore
/// daylog::log::global::init(LogManagerConfig {
///     log_dir: "/data/app/logs".to_string(),
///     ..Default::default()
/// })?;
/// ```
pub fn init(config: LogManagerConfig) -> Result<Arc<LogManager>, LogError> {
    let mut global = GLOBAL_LOG_MANAGER
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    if global.is_some() {
        return Err(LogError::AlreadyInitialized);
    }

    let manager = LogManager::new(config).map_err(|e| {
        tracing::error!(error = %e, "log system initialization failed");
        e
    })?;
    *global = Some(Arc::clone(&manager));
    Ok(manager)
}

/// 获取全局 LogManager
pub fn manager() -> Option<Arc<LogManager>> {
    GLOBAL_LOG_MANAGER
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// 是否已初始化
pub fn is_initialized() -> bool {
    manager().is_some()
}

/// 获取 logger，未初始化时返回不输出的 logger
pub fn get_logger(identity: LoggerIdentity) -> Logger {
    match manager() {
        Some(manager) => manager.logger(identity),
        None => Logger::detached(identity),
    }
}

/// 关闭全局日志系统，返回是否在超时前排空
pub fn shutdown(timeout: Duration) -> Result<bool, LogError> {
    let manager = GLOBAL_LOG_MANAGER
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .take()
        .ok_or(LogError::NotInitialized)?;
    Ok(manager.shutdown(timeout))
}
