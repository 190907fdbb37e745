//! 采集缓冲区
//!
//! 多生产者安全的 FIFO 队列。生产者只在入队瞬间持有锁，不会等待消费者；
//! 批处理调度器是唯一的消费者，一次性取走当前全部记录。

use std::collections::VecDeque;

use parking_lot::Mutex;
use ruleflow_shared::observability::metrics;

use crate::error::{Result, RuleError};

/// 采集缓冲区
pub struct IngestBuffer<T> {
    queue: Mutex<VecDeque<T>>,
    /// 容量上限，None 表示不限制
    capacity: Option<usize>,
}

impl<T> IngestBuffer<T> {
    /// 创建不限容量的缓冲区
    pub fn unbounded() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            capacity: None,
        }
    }

    /// 创建有容量上限的缓冲区
    pub fn with_capacity(capacity: Option<usize>) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            capacity,
        }
    }

    /// 追加一条记录
    ///
    /// 只有在设置了容量上限且已满时才会失败。
    pub fn add(&self, record: T) -> Result<()> {
        let depth = {
            let mut queue = self.queue.lock();
            if let Some(capacity) = self.capacity.filter(|c| queue.len() >= *c) {
                metrics::record_ingest_rejected();
                return Err(RuleError::BufferFull { capacity });
            }
            queue.push_back(record);
            queue.len()
        };

        metrics::set_ingest_buffer_depth(depth);
        Ok(())
    }

    /// 取走当前缓冲的全部记录，按入队顺序返回
    pub fn drain_all(&self) -> Vec<T> {
        let drained = std::mem::take(&mut *self.queue.lock());
        metrics::set_ingest_buffer_depth(0);
        Vec::from(drained)
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }
}

impl<T> Default for IngestBuffer<T> {
    fn default() -> Self {
        Self::unbounded()
    }
}
