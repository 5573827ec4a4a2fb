use crate::log::level::LogLevel;
use chrono::{DateTime, Local, NaiveDate};
use std::panic::Location;
use std::path::Path;

/// 调用点信息
///
/// Rust 没有运行时栈遍历，调用点由 logger 绑定的身份（类名）、
/// `#[track_caller]` 捕获的文件和行号，以及宏捕获的函数名组成。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    /// 完整类名（类型路径或模块路径）
    pub class_name: String,
    /// 函数名（仅在使用日志宏时可用）
    pub method: Option<String>,
    /// 源文件路径
    pub file: String,
    /// 行号
    pub line: u32,
}

impl CallSite {
    pub fn new(class_name: impl Into<String>, file: impl Into<String>, line: u32) -> Self {
        Self {
            class_name: class_name.into(),
            method: None,
            file: file.into(),
            line,
        }
    }

    /// 以调用者位置创建调用点
    ///
    /// 经过 `#[track_caller]` 链传递后，得到的是 logger 之外的第一个调用位置。
    #[track_caller]
    pub fn caller(class_name: impl Into<String>) -> Self {
        let location = Location::caller();
        Self::new(class_name, location.file(), location.line())
    }

    /// 设置函数名
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// 简单类名：去掉泛型参数后的最后一段路径
    pub fn simple_class_name(&self) -> &str {
        let base = self
            .class_name
            .split('<')
            .next()
            .unwrap_or(&self.class_name);
        base.rsplit("::").next().unwrap_or(base)
    }

    /// 源文件名（不含目录）
    pub fn file_name(&self) -> &str {
        Path::new(&self.file)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(&self.file)
    }
}

/// 错误跟踪信息
///
/// 第一行为错误本身，之后每个 `source()` 各占一行 `Caused by: ...`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorTrace {
    text: String,
}

impl ErrorTrace {
    /// 从标准错误类型构造，沿 `source()` 链展开
    pub fn from_error<E: std::error::Error + ?Sized>(err: &E) -> Self {
        let mut text = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            text.push_str("\nCaused by: ");
            text.push_str(&cause.to_string());
            source = cause.source();
        }
        Self { text }
    }

    /// 从 anyhow 错误构造
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        let mut chain = err.chain();
        let mut text = chain.next().map(|e| e.to_string()).unwrap_or_default();
        for cause in chain {
            text.push_str("\nCaused by: ");
            text.push_str(&cause.to_string());
        }
        Self { text }
    }

    /// 直接使用已渲染好的跟踪文本
    pub fn from_text(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// 按行迭代跟踪文本
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.split('\n').map(|line| line.trim_end_matches('\r'))
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

/// 日志事件
#[derive(Debug, Clone)]
pub struct LogEvent {
    /// 日志级别
    pub level: LogLevel,
    /// 时间戳
    pub timestamp: DateTime<Local>,
    /// 日志消息
    pub message: String,
    /// 关联的错误
    pub error: Option<ErrorTrace>,
    /// 调用点
    pub call_site: Option<CallSite>,
    /// 产生日志的线程名
    pub thread_name: String,
}

impl LogEvent {
    /// 创建新的日志事件，时间戳和线程名取自当前线程
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            timestamp: Local::now(),
            message: message.into(),
            error: None,
            call_site: None,
            thread_name: current_thread_name(),
        }
    }

    pub fn with_error(mut self, error: ErrorTrace) -> Self {
        self.error = Some(error);
        self
    }

    pub fn with_call_site(mut self, call_site: CallSite) -> Self {
        self.call_site = Some(call_site);
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Local>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_thread_name(mut self, thread_name: impl Into<String>) -> Self {
        self.thread_name = thread_name.into();
        self
    }
}

/// 等待写入文件的日志记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedRecord {
    pub level: LogLevel,
    pub timestamp: DateTime<Local>,
    pub text: String,
}

impl QueuedRecord {
    pub fn new(level: LogLevel, timestamp: DateTime<Local>, text: impl Into<String>) -> Self {
        Self {
            level,
            timestamp,
            text: text.into(),
        }
    }

    /// 记录所属的日历日（本地时区）
    pub fn day(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }
}

/// 当前线程名，未命名线程使用线程 ID
pub(crate) fn current_thread_name() -> String {
    let thread = std::thread::current();
    match thread.name() {
        Some(name) => name.to_string(),
        None => format!("{:?}", thread.id()),
    }
}
