// src/history.rs
//! Undo/redo history of whole-buffer snapshots
//!
//! Every trim pushes the buffer it replaced onto the undo stack and discards
//! the redo stack. Undo and redo move the current buffer to the opposite
//! stack, so an undo followed by a redo (or the reverse) lands back on the
//! exact same buffer.

use std::mem;

use crate::audio::trim::trim_buffer;
use crate::audio::types::{PcmBuffer, TrimRange};

/// Two stacks of buffer snapshots, most recent last
#[derive(Debug, Clone, Default)]
pub struct EditHistory {
    /// Buffers that an undo can restore
    undo_stack: Vec<PcmBuffer>,

    /// Buffers that a redo can restore
    redo_stack: Vec<PcmBuffer>,

    /// Maximum undo depth; `None` keeps everything
    limit: Option<usize>,
}

impl EditHistory {
    /// Create an empty history with an optional undo depth cap
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            limit,
        }
    }

    /// Apply a trim to `current`, remembering the old buffer
    ///
    /// The replaced buffer goes on the undo stack and the redo stack is
    /// cleared: a new edit discards any undone future.
    pub fn record_trim(&mut self, current: &mut PcmBuffer, range: &TrimRange) {
        let trimmed = trim_buffer(current, range);
        let previous = mem::replace(current, trimmed);

        self.undo_stack.push(previous);
        self.redo_stack.clear();
        self.enforce_limit();

        tracing::debug!(
            undo_depth = self.undo_stack.len(),
            "Recorded trim"
        );
    }

    /// Restore the previous buffer into `current`
    ///
    /// Returns `false` and leaves everything untouched when there is nothing
    /// to undo.
    pub fn undo(&mut self, current: &mut PcmBuffer) -> bool {
        let Some(previous) = self.undo_stack.pop() else {
            return false;
        };

        let newer = mem::replace(current, previous);
        self.redo_stack.push(newer);
        true
    }

    /// Re-apply the most recently undone buffer into `current`
    ///
    /// Returns `false` and leaves everything untouched when there is nothing
    /// to redo.
    pub fn redo(&mut self, current: &mut PcmBuffer) -> bool {
        let Some(next) = self.redo_stack.pop() else {
            return false;
        };

        let older = mem::replace(current, next);
        self.undo_stack.push(older);
        true
    }

    /// Clear both stacks
    pub fn reset(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Change the undo depth cap, dropping the oldest entries if needed
    pub fn set_limit(&mut self, limit: Option<usize>) {
        self.limit = limit;
        self.enforce_limit();
    }

    /// Drop the oldest undo entries beyond the cap
    fn enforce_limit(&mut self) {
        if let Some(limit) = self.limit {
            if self.undo_stack.len() > limit {
                let excess = self.undo_stack.len() - limit;
                self.undo_stack.drain(..excess);
                tracing::debug!(dropped = excess, "Undo history trimmed to limit");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(frames: usize) -> PcmBuffer {
        let left: Vec<f32> = (0..frames).map(|i| i as f32 / frames as f32).collect();
        let right: Vec<f32> = left.iter().map(|s| -s).collect();
        PcmBuffer::new(100, vec![left, right]).unwrap()
    }

    #[test]
    fn test_record_trim_pushes_previous_and_clears_redo() {
        let mut history = EditHistory::default();
        let original = ramp(200);
        let mut current = original.clone();

        history.record_trim(&mut current, &TrimRange::new(0.5, 1.5));
        assert_eq!(current.frame_count(), 100);
        assert_eq!(history.undo_depth(), 1);

        assert!(history.undo(&mut current));
        assert_eq!(current, original);
        assert!(history.can_redo());

        history.record_trim(&mut current, &TrimRange::new(0.0, 1.0));
        assert!(!history.can_redo());
        let before_redo = current.clone();
        assert!(!history.redo(&mut current));
        assert_eq!(current, before_redo);
    }

    #[test]
    fn test_undo_on_empty_history_is_noop() {
        let mut history = EditHistory::default();
        let mut current = ramp(50);
        let before = current.clone();

        assert!(!history.undo(&mut current));

        assert_eq!(current, before);
        assert_eq!(history.redo_depth(), 0);
    }

    #[test]
    fn test_redo_on_empty_history_is_noop() {
        let mut history = EditHistory::default();
        let mut current = ramp(50);

        assert!(!history.redo(&mut current));
        assert_eq!(history.undo_depth(), 0);
    }

    #[test]
    fn test_n_trims_then_n_undos_restore_original() {
        let mut history = EditHistory::default();
        let original = ramp(1000);
        let mut current = original.clone();

        for _ in 0..5 {
            history.record_trim(&mut current, &TrimRange::new(0.5, 100.0));
        }
        assert_eq!(current.frame_count(), 1000 - 5 * 50);

        for _ in 0..5 {
            assert!(history.undo(&mut current));
        }
        assert_eq!(current, original);
        assert!(!history.can_undo());
        assert_eq!(history.redo_depth(), 5);
    }

    #[test]
    fn test_undo_redo_pairs_are_inverse() {
        let mut history = EditHistory::default();
        let mut current = ramp(400);
        history.record_trim(&mut current, &TrimRange::new(0.0, 3.0));
        history.record_trim(&mut current, &TrimRange::new(1.0, 3.0));
        history.record_trim(&mut current, &TrimRange::new(0.2, 1.2));

        let snapshot = current.clone();
        assert!(history.undo(&mut current));
        assert!(history.redo(&mut current));
        assert_eq!(current, snapshot);

        assert!(history.undo(&mut current));
        assert!(history.undo(&mut current));
        let middle = current.clone();
        assert!(history.redo(&mut current));
        assert!(history.undo(&mut current));
        assert_eq!(current, middle);
    }

    #[test]
    fn test_limit_drops_oldest_entries() {
        let mut history = EditHistory::new(Some(2));
        let original = ramp(1000);
        let mut current = original.clone();

        for _ in 0..4 {
            history.record_trim(&mut current, &TrimRange::new(0.1, 100.0));
        }
        assert_eq!(history.undo_depth(), 2);

        assert!(history.undo(&mut current));
        assert!(history.undo(&mut current));
        assert!(!history.undo(&mut current));
        // oldest reachable state is after the second trim
        assert_eq!(current.frame_count(), 1000 - 2 * 10);
    }

    #[test]
    fn test_zero_limit_keeps_no_undo() {
        let mut history = EditHistory::new(Some(0));
        let mut current = ramp(100);

        history.record_trim(&mut current, &TrimRange::new(0.1, 1.0));

        assert!(!history.can_undo());
        assert_eq!(current.frame_count(), 90);
    }

    #[test]
    fn test_set_limit_shrinks_existing_stack() {
        let mut history = EditHistory::default();
        let mut current = ramp(1000);
        for _ in 0..3 {
            history.record_trim(&mut current, &TrimRange::new(0.1, 100.0));
        }

        history.set_limit(Some(1));

        assert_eq!(history.undo_depth(), 1);
        assert_eq!(history.limit(), Some(1));
    }

    #[test]
    fn test_reset_clears_both_stacks() {
        let mut history = EditHistory::default();
        let mut current = ramp(300);
        history.record_trim(&mut current, &TrimRange::new(0.5, 2.0));
        history.record_trim(&mut current, &TrimRange::new(0.5, 1.0));
        history.undo(&mut current);

        history.reset();

        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }
}
