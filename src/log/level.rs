use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// 日志级别
///
/// 级别从低到高依次为 `None < All < Verbose < Debug < Info < Warn < Error`，
/// 作为阈值使用时，只有序号严格大于阈值序号的日志才会输出。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// 不设置级别
    None = 0,
    /// 全部日志
    All = 1,
    /// 最详细的日志
    Verbose = 2,
    /// 调试信息
    Debug = 3,
    /// 一般信息
    Info = 4,
    /// 警告信息
    Warn = 5,
    /// 错误信息
    Error = 6,
}

impl LogLevel {
    /// 级别序号
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    /// 从序号还原级别，超出范围返回 None
    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        match ordinal {
            0 => Some(LogLevel::None),
            1 => Some(LogLevel::All),
            2 => Some(LogLevel::Verbose),
            3 => Some(LogLevel::Debug),
            4 => Some(LogLevel::Info),
            5 => Some(LogLevel::Warn),
            6 => Some(LogLevel::Error),
            _ => None,
        }
    }

    /// 单字母级别代码，用于 `%L`
    pub fn code(self) -> &'static str {
        match self {
            LogLevel::None => "",
            LogLevel::All => "A",
            LogLevel::Verbose => "V",
            LogLevel::Debug => "D",
            LogLevel::Info => "I",
            LogLevel::Warn => "W",
            LogLevel::Error => "E",
        }
    }

    /// 判断在给定阈值下该级别的日志是否输出
    ///
    /// 采用严格大于比较：阈值为 `Verbose` 时 `Verbose` 日志本身不会输出。
    pub fn is_enabled_for(self, threshold: LogLevel) -> bool {
        self.ordinal() > threshold.ordinal()
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        let name = lower.strip_suffix("_level").unwrap_or(&lower);
        match name {
            "none" => Ok(LogLevel::None),
            "all" | "a" => Ok(LogLevel::All),
            "verbose" | "v" => Ok(LogLevel::Verbose),
            "debug" | "d" => Ok(LogLevel::Debug),
            "info" | "i" => Ok(LogLevel::Info),
            "warn" | "w" => Ok(LogLevel::Warn),
            "error" | "e" => Ok(LogLevel::Error),
            _ => Err(format!("invalid log level: {}", s)),
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::None => write!(f, "NONE"),
            LogLevel::All => write!(f, "ALL"),
            LogLevel::Verbose => write!(f, "VERBOSE"),
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}
