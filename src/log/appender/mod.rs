mod console_appender;
mod file_sink;
mod trait_;
mod write_queue;

pub use console_appender::{ConsoleAppender, ConsoleAppenderConfig, Target};
pub use file_sink::{FileSink, FileSinkConfig, CONSUMER_THREAD_NAME};
pub use trait_::LogAppender;
pub use write_queue::WriteQueue;
