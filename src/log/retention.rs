use crate::log::log_file::{date_key, list_log_files, LogFile};
use anyhow::{Context, Result};
use chrono::{Days, Local, NaiveDate};
use crossbeam::channel::{bounded, RecvTimeoutError, Sender};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// 清理线程名
pub const RETENTION_THREAD_NAME: &str = "daylog-retention";

/// 日志保留策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetentionPolicy {
    /// 不清理
    Disabled,
    /// 保留最近 N 天
    Days(u64),
    /// 总大小上限（字节）
    Size(u64),
}

impl RetentionPolicy {
    /// 按配置选择策略，天数优先于大小，非正数视为关闭
    pub fn from_limits(max_save_days: i64, max_save_size: i64) -> Self {
        if max_save_days > 0 {
            RetentionPolicy::Days(max_save_days as u64)
        } else if max_save_size > 0 {
            RetentionPolicy::Size(max_save_size as u64)
        } else {
            RetentionPolicy::Disabled
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, RetentionPolicy::Disabled)
    }
}

/// 一次清理的结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetentionReport {
    pub deleted: Vec<PathBuf>,
    pub freed_bytes: u64,
}

/// 日志文件清理
#[derive(Debug, Clone)]
pub struct RetentionManager {
    dir: PathBuf,
    policy: RetentionPolicy,
}

impl RetentionManager {
    pub fn new(dir: impl Into<PathBuf>, policy: RetentionPolicy) -> Self {
        Self {
            dir: dir.into(),
            policy,
        }
    }

    pub fn policy(&self) -> RetentionPolicy {
        self.policy
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 以本地日期执行一次清理
    pub fn run_now(&self) -> Result<RetentionReport> {
        self.run_once(Local::now().date_naive())
    }

    /// 以指定日期为"今天"执行一次清理
    pub fn run_once(&self, today: NaiveDate) -> Result<RetentionReport> {
        let report = match self.policy {
            RetentionPolicy::Disabled => RetentionReport::default(),
            RetentionPolicy::Days(days) => self.delete_by_days(today, days)?,
            RetentionPolicy::Size(cap) => self.delete_by_size(cap)?,
        };
        if !report.deleted.is_empty() {
            tracing::info!(
                dir = %self.dir.display(),
                files = report.deleted.len(),
                freed_bytes = report.freed_bytes,
                "expired log files deleted"
            );
        }
        Ok(report)
    }

    fn delete_by_days(&self, today: NaiveDate, days: u64) -> Result<RetentionReport> {
        let mut report = RetentionReport::default();
        let Some(cutoff) = today.checked_sub_days(Days::new(days)) else {
            return Ok(report);
        };
        let cutoff = date_key(cutoff);

        for file in self.list()? {
            if file.date_key.as_str() > cutoff.as_str() {
                continue;
            }
            let size = file_size(&file.path);
            match std::fs::remove_file(&file.path) {
                Ok(()) => {
                    report.freed_bytes += size;
                    report.deleted.push(file.path);
                }
                Err(e) => {
                    tracing::warn!(path = %file.path.display(), error = %e, "failed to delete log file");
                }
            }
        }

        Ok(report)
    }

    fn delete_by_size(&self, cap: u64) -> Result<RetentionReport> {
        let mut report = RetentionReport::default();
        let files: Vec<(LogFile, u64)> = self
            .list()?
            .into_iter()
            .map(|file| {
                let size = file_size(&file.path);
                (file, size)
            })
            .collect();

        let mut total: u64 = files.iter().map(|(_, size)| size).sum();
        if total <= cap {
            return Ok(report);
        }

        // 文件名按日期定长命名，名字顺序即时间顺序
        let target = cap / 2;
        for (file, size) in files {
            if total <= target {
                break;
            }
            if let Err(e) = std::fs::remove_file(&file.path) {
                tracing::warn!(path = %file.path.display(), error = %e, "failed to delete log file, size cleanup stopped");
                break;
            }
            total = total.saturating_sub(size);
            report.freed_bytes += size;
            report.deleted.push(file.path);
        }

        Ok(report)
    }

    fn list(&self) -> Result<Vec<LogFile>> {
        list_log_files(&self.dir)
            .with_context(|| format!("list log dir {}", self.dir.display()))
    }
}

fn file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

/// 定时清理
///
/// 每次清理完成后才开始下一轮计时，通过 channel 停止。
pub struct RetentionTimer {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl RetentionTimer {
    pub fn start(manager: Arc<RetentionManager>, interval: Duration) -> std::io::Result<Self> {
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let handle = thread::Builder::new()
            .name(RETENTION_THREAD_NAME.to_string())
            .spawn(move || loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        if let Err(e) = manager.run_now() {
                            tracing::warn!(error = %e, "scheduled log cleanup failed");
                        }
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })?;

        Ok(Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    /// 停止定时器并等待线程退出
    pub fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.thread().id() != thread::current().id() && handle.join().is_err() {
                tracing::error!("log cleanup thread panicked");
            }
        }
    }
}

impl Drop for RetentionTimer {
    fn drop(&mut self) {
        // 只通知，不等待
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
    }
}
