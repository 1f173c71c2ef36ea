// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{ArticleField, ArticleId};

/// One reversible field edit, keyed by article identity rather than by row
/// position so replay survives re-sorting and filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub id: ArticleId,
    pub field: ArticleField,
    pub previous: String,
    pub next: String,
}

/// Linear undo/redo stacks owned by a single editor instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditHistory {
    undo: Vec<HistoryEntry>,
    redo: Vec<HistoryEntry>,
}

impl EditHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a fresh edit. Any redo branch is discarded.
    pub fn record(&mut self, entry: HistoryEntry) {
        self.undo.push(entry);
        self.redo.clear();
    }

    /// Pops the newest undo entry and moves it onto the redo stack.
    pub fn take_undo(&mut self) -> Option<HistoryEntry> {
        let entry = self.undo.pop()?;
        self.redo.push(entry.clone());
        Some(entry)
    }

    /// Pops the newest redo entry and moves it back onto the undo stack.
    pub fn take_redo(&mut self) -> Option<HistoryEntry> {
        let entry = self.redo.pop()?;
        self.undo.push(entry.clone());
        Some(entry)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_entries(&self) -> &[HistoryEntry] {
        &self.undo
    }

    pub fn redo_entries(&self) -> &[HistoryEntry] {
        &self.redo
    }
}
