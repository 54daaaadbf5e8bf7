//! Last-status board for flow inspection.
//!
//! Build and search paths write a human-readable line here on every exit,
//! so a UI can show the last error without unwinding the call.

use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct StatusBoard {
    inner: Arc<Mutex<Option<String>>>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current status.
    pub fn set(&self, message: impl Into<String>) {
        *self.inner.lock() = Some(message.into());
    }

    pub fn clear(&self) {
        *self.inner.lock() = None;
    }

    /// Latest status, if any path has written one.
    pub fn get(&self) -> Option<String> {
        self.inner.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_write_wins_across_clones() {
        let board = StatusBoard::new();
        let shared = board.clone();
        board.set("Connected");
        shared.set("Search failed: timeout");
        assert_eq!(board.get().as_deref(), Some("Search failed: timeout"));
        board.clear();
        assert!(shared.get().is_none());
    }
}
