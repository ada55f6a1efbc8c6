//! Sincronização: wait queues e pend/unpend

pub mod pend;
pub mod waitqueue;

pub use waitqueue::{WaitQueue, WaitQueueId, WaitQueueTable};
