//! User notifications (toasts)

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Sink for user-visible messages
pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Pending toasts, drained by the next rendered response
#[derive(Debug)]
pub struct ToastQueue {
    toasts: Mutex<VecDeque<Toast>>,
    capacity: usize,
}

impl ToastQueue {
    pub const DEFAULT_CAPACITY: usize = 20;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            toasts: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    fn toasts(&self) -> MutexGuard<'_, VecDeque<Toast>> {
        self.toasts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push(&self, kind: ToastKind, message: &str) {
        let mut toasts = self.toasts();
        // oldest toasts go first when nobody renders them
        while toasts.len() >= self.capacity {
            toasts.pop_front();
        }
        toasts.push_back(Toast {
            kind,
            message: message.to_string(),
            created_at: Utc::now(),
        });
    }

    /// Take every pending toast, oldest first
    pub fn drain(&self) -> Vec<Toast> {
        self.toasts().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.toasts().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ToastQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for ToastQueue {
    fn success(&self, message: &str) {
        log::info!(target: "invoiceweb::notify", "{}", message);
        self.push(ToastKind::Success, message);
    }

    fn error(&self, message: &str) {
        log::warn!(target: "invoiceweb::notify", "{}", message);
        self.push(ToastKind::Error, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_in_order() {
        let queue = ToastQueue::new();
        queue.success("saved");
        queue.error("failed");

        let toasts = queue.drain();
        assert_eq!(toasts.len(), 2);
        assert_eq!(toasts[0].kind, ToastKind::Success);
        assert_eq!(toasts[1].message, "failed");
        assert!(queue.is_empty());
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let queue = ToastQueue::with_capacity(2);
        queue.success("a");
        queue.success("b");
        queue.success("c");
        let messages: Vec<String> = queue.drain().into_iter().map(|t| t.message).collect();
        assert_eq!(messages, vec!["b", "c"]);
    }
}
