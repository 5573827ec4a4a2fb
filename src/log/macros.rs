//! 日志宏
//!
//! 宏在调用处展开，除文件和行号外还会记录所在函数名（`%M`）。
//!
//! ```ignore
//! use daylog::{info, error};
//!
//! let logger = daylog::logger!();
//! info!(logger, "listening on {}", addr);
//! error!(logger, error: err, "connect {} failed", addr);
//! ```

/// 当前函数名（不含路径）
#[macro_export]
macro_rules! function_name {
    () => {{
        fn __daylog_here() {}
        fn __daylog_type_name<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        let name = __daylog_type_name(__daylog_here);
        let name = name.strip_suffix("::__daylog_here").unwrap_or(name);
        let mut name = name;
        while let Some(outer) = name.strip_suffix("::{{closure}}") {
            name = outer;
        }
        name.rsplit("::").next().unwrap_or(name)
    }};
}

/// 从全局日志系统获取 logger
///
/// - `logger!()`：以当前模块路径为身份
/// - `logger!(Type)`：以类型名为身份
#[macro_export]
macro_rules! logger {
    () => {
        $crate::log::global::get_logger($crate::log::LoggerIdentity::from_path(
            ::std::module_path!(),
        ))
    };
    ($ty:ty) => {
        $crate::log::global::get_logger($crate::log::LoggerIdentity::of::<$ty>())
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __daylog_log {
    ($level:expr, $logger:expr, error: $err:expr, $($arg:tt)+) => {
        $logger.log_at(
            $level,
            ::std::format!($($arg)+),
            ::std::option::Option::Some($crate::log::ErrorTrace::from_error(&$err)),
            ::std::option::Option::Some($crate::function_name!()),
        )
    };
    ($level:expr, $logger:expr, $($arg:tt)+) => {
        $logger.log_at(
            $level,
            ::std::format!($($arg)+),
            ::std::option::Option::None,
            ::std::option::Option::Some($crate::function_name!()),
        )
    };
}

/// 记录 VERBOSE 级别日志
#[macro_export]
macro_rules! verbose {
    ($logger:expr, $($arg:tt)+) => {
        $crate::__daylog_log!($crate::log::LogLevel::Verbose, $logger, $($arg)+)
    };
}

/// 记录 DEBUG 级别日志
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::__daylog_log!($crate::log::LogLevel::Debug, $logger, $($arg)+)
    };
}

/// 记录 INFO 级别日志
///
/// ```ignore
/// info!(logger, "user {} logged in", user_id);
/// ```
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::__daylog_log!($crate::log::LogLevel::Info, $logger, $($arg)+)
    };
}

/// 记录 WARN 级别日志
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::__daylog_log!($crate::log::LogLevel::Warn, $logger, $($arg)+)
    };
}

/// 记录 ERROR 级别日志，可以附带错误
///
/// ```ignore
/// error!(logger, error: err, "query failed");
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::__daylog_log!($crate::log::LogLevel::Error, $logger, $($arg)+)
    };
}
