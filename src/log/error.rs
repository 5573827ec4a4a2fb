use thiserror::Error;

/// 日志系统错误
#[derive(Error, Debug)]
pub enum LogError {
    #[error("配置错误: {0}")]
    Config(String),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("日志系统未初始化")]
    NotInitialized,

    #[error("日志系统已初始化")]
    AlreadyInitialized,
}

impl From<garde::Report> for LogError {
    fn from(report: garde::Report) -> Self {
        LogError::Config(report.to_string())
    }
}

/// 外部配置文件中无法解析的行
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("第 {line_no} 行无法解析: {line} ({reason})")]
pub struct ConfigLineError {
    pub line_no: usize,
    pub line: String,
    pub reason: String,
}
