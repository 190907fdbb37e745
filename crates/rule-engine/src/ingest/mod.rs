//! 异步采集管道
//!
//! 生产者写入采集缓冲区，批处理调度器定期取走并送入规则编排器，
//! 结果以原子替换的方式发布到结果缓存。

pub mod buffer;
pub mod cache;
pub mod record;
pub mod scheduler;

pub use buffer::IngestBuffer;
pub use cache::{PublishedResults, ResultsCache};
pub use record::ComfortReading;
pub use scheduler::{BatchScheduler, CycleReport};
