use crate::cfg::serde_duration::{serde_as, HumanDur};
use crate::log::appender::{LogAppender, WriteQueue};
use crate::log::log_file::LogFile;
use crate::log::log_record::QueuedRecord;
use anyhow::{anyhow, Result};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use smart_default::SmartDefault;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
#[cfg(test)]
use std::sync::atomic::AtomicUsize;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// 消费线程名
pub const CONSUMER_THREAD_NAME: &str = "daylog-file-sink";

/// `flush` 等待队列排空的上限
const FLUSH_TIMEOUT: Duration = Duration::from_secs(10);

/// FileSink 配置
#[serde_as]
#[derive(Debug, Clone, Deserialize, SmartDefault, PartialEq)]
#[serde(default)]
pub struct FileSinkConfig {
    /// 日志目录
    #[default = "logs"]
    pub log_dir: String,

    /// 是否写文件，关闭后所有记录都会被拒绝
    #[default = true]
    pub enabled: bool,

    /// 队列为空时消费线程的轮询间隔
    #[serde_as(as = "HumanDur")]
    #[default(Duration::from_millis(500))]
    pub poll_interval: Duration,
}

struct SinkState {
    dir: PathBuf,
    enabled: bool,
    poll_interval: Duration,
    queue: WriteQueue,
    running: AtomicBool,
    stopping: AtomicBool,
    worker: Mutex<Option<JoinHandle<()>>>,
    #[cfg(test)]
    spawned: AtomicUsize,
}

/// 按天切分的文件输出器
///
/// 生产者只在入队时短暂持锁；唯一的消费线程在第一次入队时懒启动，
/// 按记录自身时间戳所在的日历日写入 `<log_dir>/YYYY-MM-DD.log`，
/// 每条记录写完立即刷盘。IO 失败时消费线程退出且不自动重启，
/// 之后的第一次入队会重新拉起一个新的消费线程。
pub struct FileSink {
    state: Arc<SinkState>,
}

impl FileSink {
    pub fn new(config: FileSinkConfig) -> Self {
        Self {
            state: Arc::new(SinkState {
                dir: PathBuf::from(&config.log_dir),
                enabled: config.enabled,
                poll_interval: config.poll_interval,
                queue: WriteQueue::new(),
                running: AtomicBool::new(false),
                stopping: AtomicBool::new(false),
                worker: Mutex::new(None),
                #[cfg(test)]
                spawned: AtomicUsize::new(0),
            }),
        }
    }

    pub fn log_dir(&self) -> &Path {
        &self.state.dir
    }

    /// 入队一条记录，返回是否被接收
    ///
    /// 写文件被关闭或已收到拒绝请求时，记录被丢弃并在诊断通道上提示。
    pub fn enqueue(&self, record: QueuedRecord) -> bool {
        if !self.state.enabled {
            tracing::debug!("file logging disabled, record dropped");
            return false;
        }
        if !self.state.queue.push(record) {
            tracing::warn!("file sink is shutting down, record dropped");
            return false;
        }
        self.ensure_consumer();
        true
    }

    /// 停止接收新记录，已入队的记录继续写出
    pub fn reject_new_records(&self) {
        self.state.queue.close();
    }

    pub fn is_rejecting(&self) -> bool {
        self.state.queue.is_closed()
    }

    /// 消费线程是否在运行
    pub fn is_running(&self) -> bool {
        self.state.running.load(Ordering::Acquire)
    }

    /// 所有已入队记录是否都已写出
    pub fn is_drained(&self) -> bool {
        self.state.queue.is_drained()
    }

    pub fn pending(&self) -> usize {
        self.state.queue.pending()
    }

    /// 当前线程是否为消费线程
    pub fn is_consumer_thread(&self) -> bool {
        thread::current().name() == Some(CONSUMER_THREAD_NAME)
    }

    /// 轮询等待队列排空，`timeout` 为 None 时一直等待
    ///
    /// 返回是否已排空
    pub fn wait_until_drained(&self, poll: Duration, timeout: Option<Duration>) -> bool {
        let start = Instant::now();
        loop {
            if self.is_drained() {
                return true;
            }
            if let Some(timeout) = timeout {
                if start.elapsed() >= timeout {
                    return false;
                }
            }
            thread::sleep(poll);
        }
    }

    /// 有序关闭：拒绝新记录，等待排空，停止并回收消费线程
    ///
    /// 返回是否在超时前排空
    pub fn shutdown(&self, timeout: Duration) -> bool {
        self.reject_new_records();
        let drained = self.wait_until_drained(self.state.poll_interval, Some(timeout));
        self.state.stopping.store(true, Ordering::Release);

        if drained && !self.is_consumer_thread() {
            let handle = self
                .state
                .worker
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
            if let Some(handle) = handle {
                if handle.join().is_err() {
                    tracing::error!("file sink consumer panicked");
                }
            }
        } else if !drained {
            tracing::warn!(
                pending = self.pending(),
                "file sink not drained before shutdown timeout"
            );
        }

        drained
    }

    fn ensure_consumer(&self) {
        if self.state.stopping.load(Ordering::Acquire) {
            return;
        }
        if self
            .state
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        let state = Arc::clone(&self.state);
        let spawned = thread::Builder::new()
            .name(CONSUMER_THREAD_NAME.to_string())
            .spawn(move || {
                if let Err(e) = consume(&state) {
                    tracing::error!(dir = %state.dir.display(), error = %e, "file sink consumer stopped");
                }
                state.running.store(false, Ordering::Release);
            });

        match spawned {
            Ok(handle) => {
                #[cfg(test)]
                self.state.spawned.fetch_add(1, Ordering::AcqRel);
                // 旧句柄对应的线程已经退出，直接替换
                *self
                    .state
                    .worker
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner) = Some(handle);
            }
            Err(e) => {
                self.state.running.store(false, Ordering::Release);
                tracing::error!(error = %e, "failed to spawn file sink consumer");
            }
        }
    }
}

/// 当前打开的日文件
struct DayFile {
    day: NaiveDate,
    writer: BufWriter<File>,
}

impl DayFile {
    fn open(dir: &Path, day: NaiveDate) -> io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(LogFile::for_day(dir, day).path)?;
        Ok(Self {
            day,
            writer: BufWriter::new(file),
        })
    }

    fn write(&mut self, text: &str) -> io::Result<()> {
        self.writer.write_all(text.as_bytes())?;
        self.writer.flush()
    }
}

fn consume(state: &SinkState) -> io::Result<()> {
    let mut current = DayFile::open(&state.dir, Local::now().date_naive())?;

    loop {
        match state.queue.pop() {
            Some(record) => {
                let result = write_record(&state.dir, &mut current, &record);
                // 写失败的记录同样计为已处理，避免排空等待永远不结束
                state.queue.complete();
                result?;
            }
            None => {
                if state.stopping.load(Ordering::Acquire) {
                    return current.writer.flush();
                }
                thread::sleep(state.poll_interval);
            }
        }
    }
}

fn write_record(dir: &Path, current: &mut DayFile, record: &QueuedRecord) -> io::Result<()> {
    let day = record.day();
    if day != current.day {
        current.writer.flush()?;
        // 旧文件在替换时关闭
        *current = DayFile::open(dir, day)?;
    }
    current.write(&record.text)
}

impl LogAppender for FileSink {
    fn append(&self, record: QueuedRecord) -> Result<()> {
        self.enqueue(record);
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        if self.wait_until_drained(self.state.poll_interval, Some(FLUSH_TIMEOUT)) {
            Ok(())
        } else {
            Err(anyhow!(
                "file sink still has {} pending records",
                self.pending()
            ))
        }
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        // 让消费线程在队列空后退出，不阻塞 drop
        self.state.stopping.store(true, Ordering::Release);
    }
}

crate::impl_from!(FileSinkConfig => FileSink);
