//! Undo/redo history.
//!
//! A linear list of document snapshots with a cursor on the current one.
//! Snapshots share element payloads with the live document (see
//! `sk_core::document`), so a record costs one pointer list per layer.
//!
//! Only completed actions are committed: a drag commits once on pointer-up,
//! never per frame.

use sk_core::Snapshot;

#[derive(Debug, Clone)]
pub struct HistoryRecord {
    /// Short description for UI ("stroke", "move", ...).
    pub label: String,
    pub snapshot: Snapshot,
}

pub struct History {
    records: Vec<HistoryRecord>,
    /// Index of the record matching the live document.
    cursor: usize,
    /// Maximum number of records kept, seed included.
    max_depth: usize,
}

impl History {
    /// History holding only `seed`, so that undo at the start is a no-op.
    pub fn new(seed: Snapshot, max_depth: usize) -> Self {
        Self {
            records: vec![HistoryRecord {
                label: "open".to_string(),
                snapshot: seed,
            }],
            cursor: 0,
            max_depth: max_depth.max(1),
        }
    }

    /// Drop everything and start over from `seed` (document load).
    pub fn reset(&mut self, seed: Snapshot) {
        *self = Self::new(seed, self.max_depth);
    }

    /// Record a completed action. Redoable records past the cursor are
    /// discarded; the oldest record is dropped once the depth limit is hit.
    pub fn commit(&mut self, label: &str, snapshot: Snapshot) {
        self.records.truncate(self.cursor + 1);
        self.records.push(HistoryRecord {
            label: label.to_string(),
            snapshot,
        });
        if self.records.len() > self.max_depth {
            self.records.remove(0);
        }
        self.cursor = self.records.len() - 1;
        log::debug!("history: commit `{label}` ({} records)", self.records.len());
    }

    /// Step back. Returns the record to restore, or `None` at the seed.
    pub fn undo(&mut self) -> Option<&HistoryRecord> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        self.records.get(self.cursor)
    }

    /// Step forward. Returns the record to restore, or `None` at the top.
    pub fn redo(&mut self) -> Option<&HistoryRecord> {
        if self.cursor + 1 >= self.records.len() {
            return None;
        }
        self.cursor += 1;
        self.records.get(self.cursor)
    }

    pub fn current(&self) -> &HistoryRecord {
        &self.records[self.cursor]
    }

    /// Label of the action an undo would revert.
    pub fn undo_label(&self) -> Option<&str> {
        (self.cursor > 0).then(|| self.records[self.cursor].label.as_str())
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.records.len()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sk_core::{Color, Document};

    fn snap(bg: Color) -> Snapshot {
        Document::new("h", 10, 10, bg).snapshot()
    }

    fn gray(v: u8) -> Color {
        Color::rgb(v, v, v)
    }

    #[test]
    fn seeded_history_cannot_undo() {
        let mut h = History::new(snap(gray(0)), 10);
        assert!(!h.can_undo());
        assert!(h.undo().is_none());
        assert!(h.redo().is_none());
        assert_eq!(h.len(), 1);
    }

    #[test]
    fn undo_redo_walk_the_records() {
        let mut h = History::new(snap(gray(0)), 10);
        h.commit("one", snap(gray(1)));
        h.commit("two", snap(gray(2)));

        assert_eq!(h.undo_label(), Some("two"));
        assert_eq!(h.undo().unwrap().snapshot.background, gray(1));
        assert_eq!(h.undo().unwrap().snapshot.background, gray(0));
        assert!(h.undo().is_none());

        assert_eq!(h.redo().unwrap().label, "one");
        assert_eq!(h.redo().unwrap().label, "two");
        assert!(h.redo().is_none());
    }

    #[test]
    fn commit_after_undo_truncates() {
        let mut h = History::new(snap(gray(0)), 10);
        h.commit("one", snap(gray(1)));
        h.commit("two", snap(gray(2)));
        h.undo();
        h.undo();
        h.commit("three", snap(gray(3)));

        assert_eq!(h.len(), 2);
        assert!(!h.can_redo());
        assert!(h.redo().is_none());
        assert_eq!(h.current().label, "three");
    }

    #[test]
    fn depth_limit_drops_oldest() {
        let mut h = History::new(snap(gray(0)), 3);
        for i in 1..=5 {
            h.commit("step", snap(gray(i)));
        }
        assert_eq!(h.len(), 3);
        assert_eq!(h.cursor(), 2);
        assert_eq!(h.undo().unwrap().snapshot.background, gray(4));
        assert_eq!(h.undo().unwrap().snapshot.background, gray(3));
        assert!(h.undo().is_none());
    }
}
