use crate::log::appender::FileSink;
use crate::log::formatter::PatternFormatter;
use crate::log::level::LogLevel;
use crate::log::log_record::{current_thread_name, CallSite, ErrorTrace, LogEvent, QueuedRecord};
use crate::log::retention::RetentionManager;
use std::any::Any;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::panic::{self, PanicHookInfo};
use std::sync::Arc;
use std::time::Duration;

/// panic 排空后退出进程使用的退出码
pub const CRASH_EXIT_CODE: i32 = 101;

const MAIN_THREAD_NAME: &str = "main";

/// CrashDrain 配置
#[derive(Debug, Clone, PartialEq)]
pub struct CrashDrainConfig {
    pub poll_interval: Duration,
    pub exit_on_crash: bool,
}

/// 一次 panic 的描述
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrashReport {
    pub thread_name: String,
    pub message: String,
    pub file: Option<String>,
    pub line: u32,
    pub column: u32,
    pub backtrace: Option<String>,
}

impl CrashReport {
    pub fn from_panic(info: &PanicHookInfo<'_>) -> Self {
        let backtrace = Backtrace::capture();
        let backtrace = match backtrace.status() {
            BacktraceStatus::Captured => Some(backtrace.to_string()),
            _ => None,
        };
        let location = info.location();
        Self {
            thread_name: current_thread_name(),
            message: payload_message(info.payload()),
            file: location.map(|l| l.file().to_string()),
            line: location.map(|l| l.line()).unwrap_or(0),
            column: location.map(|l| l.column()).unwrap_or(0),
            backtrace,
        }
    }

    fn to_event(&self) -> LogEvent {
        let mut trace = match &self.file {
            Some(file) => format!("panicked at {}:{}:{}", file, self.line, self.column),
            None => "panicked at unknown location".to_string(),
        };
        if let Some(backtrace) = &self.backtrace {
            trace.push('\n');
            trace.push_str(backtrace.trim_end());
        }

        let mut event = LogEvent::new(
            LogLevel::Error,
            format!(
                "thread '{}' panicked: {}",
                self.thread_name, self.message
            ),
        )
        .with_thread_name(self.thread_name.clone())
        .with_error(ErrorTrace::from_text(trace));
        if let Some(file) = &self.file {
            event = event.with_call_site(
                CallSite::new(std::any::type_name::<CrashDrain>(), file.clone(), self.line)
                    .with_method("panic"),
            );
        }
        event
    }
}

fn payload_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Box<dyn Any>".to_string()
    }
}

/// panic 时的日志排空
///
/// 写入一条诊断记录（不受级别过滤）并阻塞等待队列排空，
/// 在写文件线程自身 panic 时跳过等待。
///
/// 钩子无法区分之后会被 `catch_unwind` 或线程 join 接住的 panic，
/// 因此只有主线程 panic 或开启 `exit_on_crash` 时才视为致命：
/// 拒绝后续记录并同步执行一次清理。其余 panic 之后照常记录日志。
pub struct CrashDrain {
    config: CrashDrainConfig,
    sink: Arc<FileSink>,
    retention: Arc<RetentionManager>,
    formatter: Arc<PatternFormatter>,
}

impl CrashDrain {
    pub fn new(
        config: CrashDrainConfig,
        sink: Arc<FileSink>,
        retention: Arc<RetentionManager>,
        formatter: Arc<PatternFormatter>,
    ) -> Self {
        Self {
            config,
            sink,
            retention,
            formatter,
        }
    }

    /// 这次 panic 之后进程是否会结束
    pub fn is_fatal(&self, report: &CrashReport) -> bool {
        self.config.exit_on_crash || report.thread_name == MAIN_THREAD_NAME
    }

    /// 执行排空流程，返回时队列已排空（写文件线程自身 panic 时除外）
    pub fn drain(&self, report: &CrashReport) {
        let fatal = self.is_fatal(report);
        let event = report.to_event();
        let text = self.formatter.render_event(&event);
        self.sink
            .enqueue(QueuedRecord::new(LogLevel::Error, event.timestamp, text));
        if fatal {
            self.sink.reject_new_records();
        }

        if self.sink.is_consumer_thread() {
            tracing::error!("file sink consumer panicked, drain skipped");
        } else {
            // 不设超时
            self.sink.wait_until_drained(self.config.poll_interval, None);
        }

        if !fatal {
            return;
        }
        if let Err(e) = self.retention.run_now() {
            tracing::warn!(error = %format!("{:#}", e), "log cleanup after panic failed");
        }
    }

    /// 安装为进程的 panic 钩子，原有钩子在排空后继续调用
    pub fn install(self) {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            self.drain(&CrashReport::from_panic(info));
            previous(info);
            if self.config.exit_on_crash {
                std::process::exit(CRASH_EXIT_CODE);
            }
        }));
    }
}
