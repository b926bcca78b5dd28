//! Bounded linear undo/redo history.
//!
//! [`History`] tracks `{ past, present, future }` for any cloneable value.
//! It is purely local and synchronous: every method is a plain state
//! transition with no I/O.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Default maximum number of undoable states kept in `past`.
pub const DEFAULT_HISTORY_DEPTH: usize = 50;

/// Tuning for a [`History`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Maximum number of undoable states kept in `past`.
    pub max_depth: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_HISTORY_DEPTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct History<T> {
    past: VecDeque<T>,
    present: T,
    future: Vec<T>,
    max_depth: usize,
}

impl<T: Clone + PartialEq> History<T> {
    /// Start a history at `present` with the default depth.
    pub fn new(present: T) -> Self {
        Self::with_depth(present, DEFAULT_HISTORY_DEPTH)
    }

    /// Start a history keeping at most `max_depth` undoable states (minimum 1).
    pub fn with_depth(present: T, max_depth: usize) -> Self {
        Self {
            past: VecDeque::new(),
            present,
            future: Vec::new(),
            max_depth: max_depth.max(1),
        }
    }

    pub fn with_config(present: T, config: HistoryConfig) -> Self {
        Self::with_depth(present, config.max_depth)
    }

    pub fn present(&self) -> &T {
        &self.present
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.past.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.future.len()
    }

    /// Record a new present value.
    ///
    /// Identical values are ignored. Otherwise the old present moves to
    /// `past` (dropping the oldest entry beyond the depth bound) and the redo
    /// branch is discarded. Returns `true` if the state changed.
    pub fn set(&mut self, value: T) -> bool {
        if value == self.present {
            return false;
        }
        let previous = std::mem::replace(&mut self.present, value);
        self.past.push_back(previous);
        while self.past.len() > self.max_depth {
            self.past.pop_front();
        }
        self.future.clear();
        true
    }

    /// Step back one state. Returns `false` if there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        match self.past.pop_back() {
            Some(previous) => {
                let current = std::mem::replace(&mut self.present, previous);
                self.future.push(current);
                true
            }
            None => false,
        }
    }

    /// Step forward one state. Returns `false` if there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        match self.future.pop() {
            Some(next) => {
                let current = std::mem::replace(&mut self.present, next);
                self.past.push_back(current);
                true
            }
            None => false,
        }
    }

    /// Replace the present and forget both stacks (a different document was loaded).
    pub fn reset(&mut self, value: T) {
        self.present = value;
        self.past.clear();
        self.future.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_pushes_and_clears_future() {
        let mut h = History::new(0);
        assert!(h.set(1));
        assert!(h.set(2));
        assert!(h.undo());
        assert_eq!(*h.present(), 1);
        assert!(h.can_redo());
        assert!(h.set(5));
        assert!(!h.can_redo());
        assert_eq!(h.undo_depth(), 2);
    }

    #[test]
    fn identical_value_is_ignored() {
        let mut h = History::new("a".to_string());
        assert!(!h.set("a".to_string()));
        assert!(!h.can_undo());
    }

    #[test]
    fn undo_and_redo_on_empty_stacks_are_noops() {
        let mut h = History::new(3);
        assert!(!h.undo());
        assert!(!h.redo());
        assert_eq!(*h.present(), 3);
    }

    #[test]
    fn depth_bound_drops_oldest() {
        let mut h = History::with_depth(0, 3);
        for v in 1..=5 {
            h.set(v);
        }
        assert_eq!(h.undo_depth(), 3);
        while h.undo() {}
        assert_eq!(*h.present(), 2);
    }

    #[test]
    fn config_sets_depth() {
        let h = History::with_config(0, HistoryConfig { max_depth: 0 });
        assert_eq!(h.max_depth(), 1);
        assert_eq!(HistoryConfig::default().max_depth, DEFAULT_HISTORY_DEPTH);
    }

    #[test]
    fn default_depth_is_fifty() {
        let mut h = History::new(0);
        for v in 1..=80 {
            h.set(v);
        }
        assert_eq!(h.max_depth(), DEFAULT_HISTORY_DEPTH);
        assert_eq!(h.undo_depth(), 50);
    }

    #[test]
    fn k_undos_then_k_redos_restore_present() {
        for k in 0..=10 {
            let mut h = History::with_depth(0, 10);
            for v in 1..=12 {
                h.set(v);
            }
            let before = *h.present();
            for _ in 0..k {
                assert!(h.undo());
            }
            for _ in 0..k {
                assert!(h.redo());
            }
            assert_eq!(*h.present(), before, "k={k}");
        }
    }

    #[test]
    fn set_after_undos_discards_undone_states() {
        let mut h = History::new(0);
        h.set(1);
        h.set(2);
        h.set(3);
        h.undo();
        h.undo();
        h.set(9);
        assert!(!h.redo());
        assert!(h.undo());
        assert_eq!(*h.present(), 1);
    }

    #[test]
    fn reset_clears_both_stacks() {
        let mut h = History::new(0);
        h.set(1);
        h.set(2);
        h.undo();
        h.reset(100);
        assert_eq!(*h.present(), 100);
        assert!(!h.can_undo());
        assert!(!h.can_redo());
    }
}
