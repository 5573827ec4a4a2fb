//! 日志模块
//!
//! 将分级日志调用渲染为文本，终端同步输出，文件由单独的线程按天写入，
//! 并按天数或总大小清理旧文件。进程 panic 时先把队列中的日志写完再退出。
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use daylog::log::{LogManager, LogManagerConfig};
//! use daylog::{error, info};
//!
//! struct Server;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config: LogManagerConfig = json5::from_str(r#"
//!         {
//!             tag: "demo",
//!             level: "debug",
//!             log_dir: "/tmp/demo/logs",
//!             max_save_days: 3,
//!         }
//!     "#)?;
//!
//!     let manager = LogManager::new(config)?;
//!     let logger = manager.logger_for::<Server>();
//!
//!     logger.info("server started");
//!     info!(logger, "listening on {}", 8080);
//!
//!     let err = std::io::Error::new(std::io::ErrorKind::Other, "refused");
//!     error!(logger, error: err, "connect failed");
//!
//!     manager.shutdown(std::time::Duration::from_secs(5));
//!     Ok(())
//! }
//! ```

pub mod appender;
pub mod bridge;
pub mod crash;
pub mod error;
pub mod formatter;
pub mod global;
pub mod level;
pub mod level_resolver;
pub mod log_file;
pub mod log_record;
pub mod logger;
pub mod macros;
pub mod manager;
pub mod retention;

pub use appender::{ConsoleAppender, ConsoleAppenderConfig, FileSink, FileSinkConfig, LogAppender, WriteQueue};
pub use bridge::LogBridge;
pub use crash::{CrashDrain, CrashDrainConfig, CrashReport};
pub use error::{ConfigLineError, LogError};
pub use formatter::{PatternFormatter, PatternFormatterConfig};
pub use level::LogLevel;
pub use level_resolver::{LevelOverride, LevelResolver, LoggerIdentity, OverrideScope};
pub use log_file::LogFile;
pub use log_record::{CallSite, ErrorTrace, LogEvent, QueuedRecord};
pub use logger::Logger;
pub use manager::{LogManager, LogManagerConfig};
pub use retention::{RetentionManager, RetentionPolicy, RetentionReport, RetentionTimer};
