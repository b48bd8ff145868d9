//! Command Queue - FIFO shared between producer threads and the simulation thread
//!
//! One mutex guards both enqueue and the dequeue-and-detach step. The
//! consumer executes what it popped after the lock is released, so a
//! command may enqueue further commands without deadlocking.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What to do when a bounded queue is full
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Refuse the new command
    #[default]
    Reject,
    /// Evict the oldest pending command to make room
    DropOldest,
}

/// Queue configuration
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Maximum pending commands; `None` means unbounded
    pub max_depth: Option<usize>,
    /// Behaviour once `max_depth` is reached
    pub overflow: OverflowPolicy,
}

impl QueueConfig {
    /// Unbounded queue
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Bounded queue with the given overflow policy
    pub fn bounded(max_depth: usize, overflow: OverflowPolicy) -> Self {
        Self {
            max_depth: Some(max_depth),
            overflow,
        }
    }
}

/// Error returned when a command cannot be enqueued
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("Command queue is full ({depth} pending)")]
    Full { depth: usize },
}

struct Shared<C> {
    items: Mutex<VecDeque<C>>,
    config: QueueConfig,
    dropped: AtomicU64,
}

impl<C> Shared<C> {
    fn push(&self, command: C) -> Result<(), QueueError> {
        let mut items = self.items.lock();

        if let Some(max_depth) = self.config.max_depth {
            if items.len() >= max_depth {
                match self.config.overflow {
                    OverflowPolicy::Reject => {
                        return Err(QueueError::Full { depth: items.len() });
                    }
                    OverflowPolicy::DropOldest => {
                        if items.pop_front().is_some() {
                            self.dropped.fetch_add(1, Ordering::Relaxed);
                            log::warn!("Command queue full at {}, dropped oldest command", max_depth);
                        }
                        if max_depth == 0 {
                            return Err(QueueError::Full { depth: 0 });
                        }
                    }
                }
            }
        }

        items.push_back(command);
        Ok(())
    }
}

/// Multi-producer FIFO of commands
pub struct CommandQueue<C> {
    shared: Arc<Shared<C>>,
}

impl<C: Send> CommandQueue<C> {
    /// Create a queue with the given configuration
    pub fn new(config: QueueConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                items: Mutex::new(VecDeque::new()),
                config,
                dropped: AtomicU64::new(0),
            }),
        }
    }

    /// Create an unbounded queue
    pub fn unbounded() -> Self {
        Self::new(QueueConfig::unbounded())
    }

    /// Append a command
    pub fn push(&self, command: C) -> Result<(), QueueError> {
        self.shared.push(command)
    }

    /// Detach the oldest command. The lock is released before returning.
    pub fn pop(&self) -> Option<C> {
        self.shared.items.lock().pop_front()
    }

    /// Get pending count
    pub fn len(&self) -> usize {
        self.shared.items.lock().len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.shared.items.lock().is_empty()
    }

    /// Discard all pending commands, returning how many were discarded
    pub fn clear(&self) -> usize {
        let mut items = self.shared.items.lock();
        let count = items.len();
        items.clear();
        count
    }

    /// Commands evicted by [`OverflowPolicy::DropOldest`]
    pub fn dropped(&self) -> u64 {
        self.shared.dropped.load(Ordering::Relaxed)
    }

    /// Get the configuration
    pub fn config(&self) -> &QueueConfig {
        &self.shared.config
    }

    /// Create a producer handle
    pub fn sender(&self) -> QueueSender<C> {
        QueueSender {
            shared: self.shared.clone(),
        }
    }
}

impl<C: Send> Default for CommandQueue<C> {
    fn default() -> Self {
        Self::unbounded()
    }
}

/// Producer side of a [`CommandQueue`]
pub struct QueueSender<C> {
    shared: Arc<Shared<C>>,
}

impl<C: Send> QueueSender<C> {
    /// Append a command
    pub fn push(&self, command: C) -> Result<(), QueueError> {
        self.shared.push(command)
    }
}

impl<C> Clone for QueueSender<C> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}
