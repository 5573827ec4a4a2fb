use crate::log::log_record::QueuedRecord;
use anyhow::Result;

/// 日志输出器 trait
///
/// 负责将格式化后的日志输出到目标介质，调用方不能被阻塞在慢速 I/O 上
pub trait LogAppender: Send + Sync {
    /// 输出日志
    fn append(&self, record: QueuedRecord) -> Result<()>;

    /// 刷新缓冲区（默认实现为空操作）
    fn flush(&self) -> Result<()> {
        Ok(())
    }
}
