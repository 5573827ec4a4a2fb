use crate::log::log_record::QueuedRecord;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// 待写入记录队列
///
/// 无界 FIFO。`pending` 在入队时加一，只有在记录写入并刷盘
/// （或因 IO 失败丢弃）后才减一，因此 `is_drained` 表示"全部处理完成"，
/// 而不仅仅是"已出队"。关闭后入队一律失败，已入队的记录照常取出。
#[derive(Debug, Default)]
pub struct WriteQueue {
    records: Mutex<VecDeque<QueuedRecord>>,
    pending: AtomicUsize,
    closed: AtomicBool,
}

impl WriteQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// 入队，队列已关闭时返回 false
    pub fn push(&self, record: QueuedRecord) -> bool {
        let mut records = self.lock();
        // 与 close 在同一把锁内判断
        if self.closed.load(Ordering::Acquire) {
            return false;
        }
        self.pending.fetch_add(1, Ordering::AcqRel);
        records.push_back(record);
        true
    }

    /// 关闭队列，返回后不会再有记录入队
    pub fn close(&self) {
        let _records = self.lock();
        self.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// 取出队首记录
    pub fn pop(&self) -> Option<QueuedRecord> {
        self.lock().pop_front()
    }

    /// 标记一条已出队的记录处理完成
    pub fn complete(&self) {
        // 不会减到 0 以下
        let _ = self
            .pending
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
    }

    /// 尚未出队的记录数
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// 尚未处理完成的记录数
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    pub fn is_drained(&self) -> bool {
        self.pending() == 0
    }

    // panic 钩子里也要能拿到锁
    fn lock(&self) -> MutexGuard<'_, VecDeque<QueuedRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::level::LogLevel;
    use chrono::Local;
    use std::sync::Arc;
    use std::thread;

    fn record(text: &str) -> QueuedRecord {
        QueuedRecord::new(LogLevel::Info, Local::now(), text)
    }

    #[test]
    fn test_fifo_order() {
        let queue = WriteQueue::new();
        queue.push(record("a"));
        queue.push(record("b"));
        queue.push(record("c"));

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.pop().unwrap().text, "a");
        assert_eq!(queue.pop().unwrap().text, "b");
        assert_eq!(queue.pop().unwrap().text, "c");
        assert!(queue.pop().is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_drained_only_after_complete() {
        let queue = WriteQueue::new();
        assert!(queue.is_drained());

        queue.push(record("a"));
        let _ = queue.pop();
        // 已出队但未写完
        assert!(queue.is_empty());
        assert!(!queue.is_drained());

        queue.complete();
        assert!(queue.is_drained());

        queue.complete();
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn test_push_fails_after_close() {
        let queue = WriteQueue::new();
        assert!(queue.push(record("a")));
        queue.close();
        assert!(queue.is_closed());
        assert!(!queue.push(record("b")));

        // 关闭前的记录仍可取出
        assert_eq!(queue.pending(), 1);
        assert_eq!(queue.pop().unwrap().text, "a");
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_close_races_with_producers() {
        let queue = Arc::new(WriteQueue::new());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    let mut accepted = 0usize;
                    while queue.push(record(&format!("{}", t))) {
                        accepted += 1;
                    }
                    accepted
                })
            })
            .collect();

        thread::sleep(std::time::Duration::from_millis(5));
        queue.close();
        let pending_at_close = queue.pending();

        let accepted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        // close 返回后没有任何入队成功
        assert_eq!(accepted, pending_at_close);
        assert_eq!(queue.pending(), pending_at_close);
        assert_eq!(queue.len(), pending_at_close);
    }

    #[test]
    fn test_concurrent_producers_keep_per_thread_order() {
        let queue = Arc::new(WriteQueue::new());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    for i in 0..100 {
                        queue.push(record(&format!("{}:{}", t, i)));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(queue.pending(), 400);
        let mut last = [-1i32; 4];
        while let Some(r) = queue.pop() {
            let (t, i) = r.text.split_once(':').unwrap();
            let (t, i): (usize, i32) = (t.parse().unwrap(), i.parse().unwrap());
            assert!(i > last[t]);
            last[t] = i;
            queue.complete();
        }
        assert!(queue.is_drained());
    }
}
