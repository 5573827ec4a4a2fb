use crate::log::appender::LogAppender;
use crate::log::level::LogLevel;
use crate::log::log_record::QueuedRecord;
use anyhow::Result;
use colored::Colorize;
use serde::Deserialize;
use smart_default::SmartDefault;
use std::io::{self, Write};

/// 终端输出目标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    Stdout,
    #[default]
    Stderr,
}

/// ConsoleAppender 配置
#[derive(Debug, Clone, Deserialize, SmartDefault, PartialEq)]
#[serde(default)]
pub struct ConsoleAppenderConfig {
    /// 是否输出到终端
    #[default = true]
    pub enabled: bool,

    /// 输出目标
    pub target: Target,

    /// 是否按级别着色
    #[default = false]
    pub colored: bool,
}

/// 终端输出器
///
/// 同步写出终端格式的日志，文本末尾没有换行时补一个换行
pub struct ConsoleAppender {
    config: ConsoleAppenderConfig,
}

impl ConsoleAppender {
    pub fn new(config: ConsoleAppenderConfig) -> Self {
        Self { config }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    fn write_to(&self, out: &mut dyn Write, record: &QueuedRecord) -> io::Result<()> {
        let body = record.text.trim_end_matches(['\r', '\n']);
        if self.config.colored {
            writeln!(out, "{}", colorize(record.level, body))?;
        } else {
            writeln!(out, "{}", body)?;
        }
        out.flush()
    }
}

fn colorize(level: LogLevel, text: &str) -> colored::ColoredString {
    match level {
        LogLevel::Error => text.red(),
        LogLevel::Warn => text.yellow(),
        LogLevel::Info => text.green(),
        LogLevel::Debug => text.cyan(),
        LogLevel::Verbose | LogLevel::All | LogLevel::None => text.dimmed(),
    }
}

impl LogAppender for ConsoleAppender {
    fn append(&self, record: QueuedRecord) -> Result<()> {
        if !self.config.enabled {
            return Ok(());
        }
        match self.config.target {
            Target::Stdout => self.write_to(&mut io::stdout().lock(), &record)?,
            Target::Stderr => self.write_to(&mut io::stderr().lock(), &record)?,
        }
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        match self.config.target {
            Target::Stdout => io::stdout().flush()?,
            Target::Stderr => io::stderr().flush()?,
        }
        Ok(())
    }
}

crate::impl_from!(ConsoleAppenderConfig => ConsoleAppender);
