// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! The article grid: cursor, row selection, and edit history.
//!
//! [`TableEditor`] owns no I/O. Every operation returns [`GridEvent`]s; the
//! caller persists [`GridEvent::Persist`] updates and feeds fresh article
//! lists back through [`TableEditor::set_records`].

use anyhow::{Result, bail};
use std::collections::BTreeSet;
use tracing::debug;

use crate::{Article, ArticleField, ArticleId, EditHistory, FieldUpdate, HistoryEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitMode {
    UserEdit,
    HistoryReplay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellCursor {
    pub row: usize,
    pub field: ArticleField,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridCommand {
    MoveUp,
    MoveDown,
    MoveFieldLeft,
    MoveFieldRight,
    ExtendUp,
    ExtendDown,
    CopyFromAbove,
    Undo,
    Redo,
    ToggleRowSelection,
    SelectAll,
    ClearSelection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridStatus {
    NothingToUndo,
    NothingToRedo,
    Undone(ArticleField),
    Redone(ArticleField),
    NoRowAbove,
    CopiedFromAbove(ArticleField),
    SelectionCleared,
    AllSelected(usize),
}

impl GridStatus {
    pub fn message(&self) -> String {
        match self {
            Self::NothingToUndo => "nothing to undo".to_owned(),
            Self::NothingToRedo => "nothing to redo".to_owned(),
            Self::Undone(field) => format!("undid {} edit", field.label()),
            Self::Redone(field) => format!("redid {} edit", field.label()),
            Self::NoRowAbove => "no row above".to_owned(),
            Self::CopiedFromAbove(field) => format!("copied {} from row above", field.label()),
            Self::SelectionCleared => "selection cleared".to_owned(),
            Self::AllSelected(count) => format!("{count} rows selected"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridEvent {
    CursorMoved(CellCursor),
    CursorCleared,
    /// Selected ids in display order.
    SelectionChanged(Vec<ArticleId>),
    CellActivated {
        id: ArticleId,
        field: ArticleField,
    },
    Persist(FieldUpdate),
    Status(GridStatus),
}

#[derive(Debug, Clone, Default)]
pub struct TableEditor {
    rows: Vec<Article>,
    cursor: Option<CellCursor>,
    anchor: usize,
    /// Selection as it stood when the current shift gesture began.
    gesture_base: Option<BTreeSet<ArticleId>>,
    selection: BTreeSet<ArticleId>,
    history: EditHistory,
}

impl TableEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[Article] {
        &self.rows
    }

    pub fn cursor(&self) -> Option<CellCursor> {
        self.cursor
    }

    pub fn anchor_row(&self) -> Option<usize> {
        self.cursor.map(|_| self.anchor)
    }

    pub fn history(&self) -> &EditHistory {
        &self.history
    }

    pub fn selected_article(&self) -> Option<&Article> {
        self.cursor.and_then(|cursor| self.rows.get(cursor.row))
    }

    pub fn is_active_row(&self, index: usize) -> bool {
        self.cursor.is_some_and(|cursor| cursor.row == index)
    }

    pub fn is_selected(&self, id: ArticleId) -> bool {
        self.selection.contains(&id)
    }

    pub fn selected_ids(&self) -> Vec<ArticleId> {
        self.rows
            .iter()
            .map(|row| row.id)
            .filter(|id| self.selection.contains(id))
            .collect()
    }

    /// Replaces the displayed rows with the latest list from the store and
    /// reconciles cursor and selection against it.
    pub fn set_records(&mut self, rows: Vec<Article>) -> Vec<GridEvent> {
        self.rows = rows;
        let mut events = Vec::new();
        let len = self.rows.len();

        match self.cursor {
            _ if len == 0 => {
                self.anchor = 0;
                self.gesture_base = None;
                if self.cursor.take().is_some() {
                    events.push(GridEvent::CursorCleared);
                }
            }
            None => {
                let cursor = CellCursor {
                    row: 0,
                    field: ArticleField::NAVIGABLE[0],
                };
                self.cursor = Some(cursor);
                self.anchor = 0;
                events.push(GridEvent::CursorMoved(cursor));
            }
            Some(mut cursor) if cursor.row >= len => {
                cursor.row = len - 1;
                self.cursor = Some(cursor);
                events.push(GridEvent::CursorMoved(cursor));
            }
            Some(_) => {}
        }
        self.anchor = self.anchor.min(len.saturating_sub(1));

        let present: BTreeSet<ArticleId> = self.rows.iter().map(|row| row.id).collect();
        if let Some(base) = self.gesture_base.as_mut() {
            base.retain(|id| present.contains(id));
        }
        let before = self.selection.len();
        self.selection.retain(|id| present.contains(id));
        if self.selection.len() != before {
            events.push(GridEvent::SelectionChanged(self.selected_ids()));
        }

        debug!(rows = len, cursor = ?self.cursor, "grid records reconciled");
        events
    }

    pub fn apply(&mut self, command: GridCommand) -> Vec<GridEvent> {
        match command {
            GridCommand::MoveUp => self.move_row(-1),
            GridCommand::MoveDown => self.move_row(1),
            GridCommand::MoveFieldLeft => self.move_field(-1),
            GridCommand::MoveFieldRight => self.move_field(1),
            GridCommand::ExtendUp => self.extend_row(-1),
            GridCommand::ExtendDown => self.extend_row(1),
            GridCommand::CopyFromAbove => self.copy_from_above(),
            GridCommand::Undo => self.undo(),
            GridCommand::Redo => self.redo(),
            GridCommand::ToggleRowSelection => self.toggle_row_selection(),
            GridCommand::SelectAll => {
                self.gesture_base = None;
                self.selection = self.rows.iter().map(|row| row.id).collect();
                vec![
                    GridEvent::SelectionChanged(self.selected_ids()),
                    GridEvent::Status(GridStatus::AllSelected(self.selection.len())),
                ]
            }
            GridCommand::ClearSelection => {
                self.gesture_base = None;
                self.selection.clear();
                vec![
                    GridEvent::SelectionChanged(Vec::new()),
                    GridEvent::Status(GridStatus::SelectionCleared),
                ]
            }
        }
    }

    /// Pointer selection. Non-navigable columns keep the current field but
    /// still report the activated cell so side panels can react.
    pub fn click_cell(&mut self, row: usize, field: ArticleField) -> Vec<GridEvent> {
        let Some(article) = self.rows.get(row) else {
            return Vec::new();
        };
        let id = article.id;
        let field_for_cursor = if field.is_navigable() {
            field
        } else {
            self.cursor
                .map(|cursor| cursor.field)
                .unwrap_or(ArticleField::NAVIGABLE[0])
        };
        let cursor = CellCursor {
            row,
            field: field_for_cursor,
        };
        self.cursor = Some(cursor);
        self.anchor = row;
        self.gesture_base = None;
        vec![
            GridEvent::CursorMoved(cursor),
            GridEvent::CellActivated { id, field },
        ]
    }

    /// Records a field edit and emits the write for the store. The write is
    /// emitted even when the value is unchanged.
    pub fn commit(
        &mut self,
        id: ArticleId,
        field: ArticleField,
        value: &str,
        mode: CommitMode,
    ) -> Vec<GridEvent> {
        let current = self
            .rows
            .iter()
            .find(|row| row.id == id)
            .map(|row| row.field_text(field))
            .unwrap_or_default();

        if mode == CommitMode::UserEdit && current != value {
            self.history.record(HistoryEntry {
                id,
                field,
                previous: current,
                next: value.to_owned(),
            });
        }

        let normalized = field.normalize(value);
        if let Some(row) = self.rows.iter_mut().find(|row| row.id == id) {
            row.set_field(field, normalized.clone());
        }

        debug!(id = id.get(), field = field.as_str(), ?mode, "commit");
        vec![GridEvent::Persist(FieldUpdate {
            id,
            field,
            value: normalized,
        })]
    }

    pub fn undo(&mut self) -> Vec<GridEvent> {
        let Some(entry) = self.history.take_undo() else {
            return vec![GridEvent::Status(GridStatus::NothingToUndo)];
        };
        let mut events = self.commit(
            entry.id,
            entry.field,
            &entry.previous,
            CommitMode::HistoryReplay,
        );
        events.push(GridEvent::Status(GridStatus::Undone(entry.field)));
        events
    }

    pub fn redo(&mut self) -> Vec<GridEvent> {
        let Some(entry) = self.history.take_redo() else {
            return vec![GridEvent::Status(GridStatus::NothingToRedo)];
        };
        let mut events = self.commit(entry.id, entry.field, &entry.next, CommitMode::HistoryReplay);
        events.push(GridEvent::Status(GridStatus::Redone(entry.field)));
        events
    }

    /// Writes `value` into `field` of every selected row. Each row is its own
    /// undoable edit; nothing is written when validation fails.
    pub fn bulk_apply(&mut self, field: ArticleField, value: &str) -> Result<Vec<GridEvent>> {
        if value.is_empty() {
            bail!("enter a {} value before applying it to rows", field.label());
        }
        if self.selection.is_empty() {
            bail!("select rows first (shift+arrows or space), then apply");
        }

        let ids = self.selected_ids();
        debug!(field = field.as_str(), rows = ids.len(), "bulk apply");
        let mut events = Vec::with_capacity(ids.len());
        for id in ids {
            events.extend(self.commit(id, field, value, CommitMode::UserEdit));
        }
        Ok(events)
    }

    fn move_row(&mut self, delta: isize) -> Vec<GridEvent> {
        let Some(cursor) = self.step_row(delta) else {
            return Vec::new();
        };
        self.anchor = cursor.row;
        self.gesture_base = None;
        vec![GridEvent::CursorMoved(cursor)]
    }

    fn extend_row(&mut self, delta: isize) -> Vec<GridEvent> {
        let Some(start) = self.cursor else {
            return Vec::new();
        };
        if self.gesture_base.is_none() {
            self.anchor = start.row;
            self.gesture_base = Some(self.selection.clone());
        }
        let Some(cursor) = self.step_row(delta) else {
            return Vec::new();
        };

        let (low, high) = if self.anchor <= cursor.row {
            (self.anchor, cursor.row)
        } else {
            (cursor.row, self.anchor)
        };
        let mut selection = self.gesture_base.clone().unwrap_or_default();
        selection.extend(self.rows[low..=high].iter().map(|row| row.id));

        let mut events = vec![GridEvent::CursorMoved(cursor)];
        if selection != self.selection {
            self.selection = selection;
            events.push(GridEvent::SelectionChanged(self.selected_ids()));
        }
        events
    }

    fn step_row(&mut self, delta: isize) -> Option<CellCursor> {
        let mut cursor = self.cursor?;
        let max = self.rows.len().checked_sub(1)?;
        let next = (cursor.row as isize + delta).clamp(0, max as isize) as usize;
        cursor.row = next;
        self.cursor = Some(cursor);
        Some(cursor)
    }

    fn move_field(&mut self, delta: isize) -> Vec<GridEvent> {
        let Some(mut cursor) = self.cursor else {
            return Vec::new();
        };
        let fields = ArticleField::NAVIGABLE;
        let current = fields
            .iter()
            .position(|field| *field == cursor.field)
            .unwrap_or(0) as isize;
        let next = (current + delta).clamp(0, fields.len() as isize - 1) as usize;
        cursor.field = fields[next];
        self.cursor = Some(cursor);
        vec![GridEvent::CursorMoved(cursor)]
    }

    fn copy_from_above(&mut self) -> Vec<GridEvent> {
        let Some(cursor) = self.cursor else {
            return Vec::new();
        };
        if cursor.row == 0 {
            return vec![GridEvent::Status(GridStatus::NoRowAbove)];
        }
        let (Some(above), Some(current)) =
            (self.rows.get(cursor.row - 1), self.rows.get(cursor.row))
        else {
            return Vec::new();
        };

        let value = above.field_text(cursor.field);
        let id = current.id;
        let mut events = self.commit(id, cursor.field, &value, CommitMode::UserEdit);
        events.push(GridEvent::Status(GridStatus::CopiedFromAbove(cursor.field)));
        events
    }

    fn toggle_row_selection(&mut self) -> Vec<GridEvent> {
        let Some(article) = self.selected_article() else {
            return Vec::new();
        };
        let id = article.id;
        if !self.selection.remove(&id) {
            self.selection.insert(id);
        }
        if let Some(cursor) = self.cursor {
            self.anchor = cursor.row;
        }
        self.gesture_base = None;
        vec![GridEvent::SelectionChanged(self.selected_ids())]
    }
}

#[cfg(test)]
mod tests {
    use super::{CellCursor, CommitMode, GridCommand, GridEvent, GridStatus, TableEditor};
    use crate::{Article, ArticleField, ArticleId, FieldUpdate, HistoryEntry};

    fn article(id: i64, status: &str) -> Article {
        Article {
            id: ArticleId::new(id),
            title: format!("article {id}"),
            status: status.to_owned(),
            editor: None,
            content_source: None,
            memo: None,
            image_url: None,
            created_at: "2026-04-01".to_owned(),
            latest_comment: None,
        }
    }

    fn articles(count: i64) -> Vec<Article> {
        (1..=count).map(|id| article(id, "리뷰")).collect()
    }

    fn ids(values: &[i64]) -> Vec<ArticleId> {
        values.iter().copied().map(ArticleId::new).collect()
    }

    fn persisted(events: &[GridEvent]) -> Vec<FieldUpdate> {
        events
            .iter()
            .filter_map(|event| match event {
                GridEvent::Persist(update) => Some(update.clone()),
                _ => None,
            })
            .collect()
    }

    fn editor_with(rows: Vec<Article>) -> TableEditor {
        let mut editor = TableEditor::new();
        editor.set_records(rows);
        editor
    }

    fn move_to_row(editor: &mut TableEditor, row: usize) {
        for _ in 0..row {
            editor.apply(GridCommand::MoveDown);
        }
    }

    #[test]
    fn first_records_select_first_navigable_cell() {
        let mut editor = TableEditor::new();
        assert_eq!(editor.cursor(), None);

        let events = editor.set_records(articles(3));
        let expected = CellCursor {
            row: 0,
            field: ArticleField::CreatedAt,
        };
        assert_eq!(editor.cursor(), Some(expected));
        assert_eq!(events, vec![GridEvent::CursorMoved(expected)]);
    }

    #[test]
    fn emptying_records_clears_cursor_and_selection() {
        let mut editor = editor_with(articles(2));
        editor.apply(GridCommand::SelectAll);

        let events = editor.set_records(Vec::new());
        assert_eq!(editor.cursor(), None);
        assert!(editor.selected_ids().is_empty());
        assert_eq!(
            events,
            vec![
                GridEvent::CursorCleared,
                GridEvent::SelectionChanged(Vec::new())
            ]
        );
    }

    #[test]
    fn row_moves_stay_in_bounds() {
        let mut editor = editor_with(articles(4));
        let script = [
            GridCommand::MoveUp,
            GridCommand::MoveDown,
            GridCommand::MoveDown,
            GridCommand::MoveDown,
            GridCommand::MoveDown,
            GridCommand::MoveDown,
            GridCommand::MoveUp,
            GridCommand::MoveUp,
            GridCommand::MoveUp,
            GridCommand::MoveUp,
            GridCommand::MoveUp,
        ];
        for command in script {
            editor.apply(command);
            let row = editor.cursor().expect("cursor present").row;
            assert!(row < 4, "row {row} escaped bounds");
        }
        assert_eq!(editor.cursor().map(|cursor| cursor.row), Some(0));
    }

    #[test]
    fn field_moves_clamp_at_both_ends() {
        let mut editor = editor_with(articles(1));
        editor.apply(GridCommand::MoveFieldLeft);
        assert_eq!(
            editor.cursor().map(|cursor| cursor.field),
            Some(ArticleField::CreatedAt)
        );

        for _ in 0..6 {
            editor.apply(GridCommand::MoveFieldRight);
        }
        assert_eq!(
            editor.cursor().map(|cursor| cursor.field),
            Some(ArticleField::ContentSource)
        );
    }

    #[test]
    fn shrinking_records_clamps_row_and_keeps_field() {
        let mut editor = editor_with(articles(6));
        move_to_row(&mut editor, 5);
        editor.apply(GridCommand::MoveFieldRight);

        let events = editor.set_records(articles(3));
        let expected = CellCursor {
            row: 2,
            field: ArticleField::Editor,
        };
        assert_eq!(editor.cursor(), Some(expected));
        assert_eq!(events, vec![GridEvent::CursorMoved(expected)]);
    }

    #[test]
    fn refresh_drops_selected_ids_that_disappeared() {
        let mut editor = editor_with(articles(4));
        editor.apply(GridCommand::SelectAll);

        let remaining = vec![article(2, "리뷰"), article(4, "리뷰")];
        let events = editor.set_records(remaining);
        assert_eq!(editor.selected_ids(), ids(&[2, 4]));
        assert_eq!(events, vec![GridEvent::SelectionChanged(ids(&[2, 4]))]);
    }

    #[test]
    fn shift_extends_inclusive_range_from_anchor() {
        let mut editor = editor_with(articles(8));
        move_to_row(&mut editor, 2);
        assert_eq!(editor.anchor_row(), Some(2));

        for _ in 0..3 {
            editor.apply(GridCommand::ExtendDown);
        }
        assert_eq!(editor.cursor().map(|cursor| cursor.row), Some(5));
        assert_eq!(editor.selected_ids(), ids(&[3, 4, 5, 6]));

        editor.apply(GridCommand::MoveDown);
        assert_eq!(editor.anchor_row(), Some(6));
        assert_eq!(editor.selected_ids(), ids(&[3, 4, 5, 6]));
    }

    #[test]
    fn shift_range_normalizes_direction_and_can_shrink() {
        let mut editor = editor_with(articles(8));
        move_to_row(&mut editor, 4);

        editor.apply(GridCommand::ExtendUp);
        editor.apply(GridCommand::ExtendUp);
        assert_eq!(editor.selected_ids(), ids(&[3, 4, 5]));

        let events = editor.apply(GridCommand::ExtendDown);
        assert_eq!(editor.selected_ids(), ids(&[4, 5]));
        assert!(events.contains(&GridEvent::SelectionChanged(ids(&[4, 5]))));
    }

    #[test]
    fn new_shift_gesture_keeps_earlier_range() {
        let mut editor = editor_with(articles(10));
        editor.apply(GridCommand::ExtendDown);
        assert_eq!(editor.selected_ids(), ids(&[1, 2]));

        editor.apply(GridCommand::MoveDown);
        editor.apply(GridCommand::MoveDown);
        editor.apply(GridCommand::ExtendDown);
        assert_eq!(editor.selected_ids(), ids(&[1, 2, 4, 5]));

        editor.apply(GridCommand::ExtendUp);
        assert_eq!(editor.selected_ids(), ids(&[1, 2, 4]));
    }

    #[test]
    fn toggle_row_selection_flips_cursor_row() {
        let mut editor = editor_with(articles(3));
        editor.apply(GridCommand::MoveDown);

        let events = editor.apply(GridCommand::ToggleRowSelection);
        assert_eq!(events, vec![GridEvent::SelectionChanged(ids(&[2]))]);
        assert!(editor.is_selected(ArticleId::new(2)));

        editor.apply(GridCommand::ToggleRowSelection);
        assert!(editor.selected_ids().is_empty());
    }

    #[test]
    fn commit_with_changed_value_records_history_and_clears_redo() {
        let mut editor = editor_with(vec![article(1, "리뷰")]);
        editor.commit(ArticleId::new(1), ArticleField::Status, "초안", CommitMode::UserEdit);
        editor.undo();
        assert!(editor.history().can_redo());

        editor.commit(ArticleId::new(1), ArticleField::Status, "이미지", CommitMode::UserEdit);
        assert!(!editor.history().can_redo());
        assert_eq!(
            editor.history().undo_entries(),
            &[HistoryEntry {
                id: ArticleId::new(1),
                field: ArticleField::Status,
                previous: "리뷰".to_owned(),
                next: "이미지".to_owned(),
            }]
        );
    }

    #[test]
    fn commit_with_same_value_still_persists_without_history() {
        let mut editor = editor_with(vec![article(1, "리뷰")]);
        let events =
            editor.commit(ArticleId::new(1), ArticleField::Status, "리뷰", CommitMode::UserEdit);

        assert!(!editor.history().can_undo());
        assert_eq!(
            persisted(&events),
            vec![FieldUpdate {
                id: ArticleId::new(1),
                field: ArticleField::Status,
                value: Some("리뷰".to_owned()),
            }]
        );
    }

    #[test]
    fn commit_applies_value_locally_and_normalizes_empty_text() {
        let mut editor = editor_with(vec![article(1, "리뷰")]);
        editor.commit(ArticleId::new(1), ArticleField::Editor, "kim", CommitMode::UserEdit);
        assert_eq!(editor.rows()[0].editor.as_deref(), Some("kim"));

        let events = editor.commit(ArticleId::new(1), ArticleField::Editor, "", CommitMode::UserEdit);
        assert_eq!(editor.rows()[0].editor, None);
        assert_eq!(persisted(&events)[0].value, None);
    }

    #[test]
    fn undo_and_redo_restore_values_exactly() {
        let mut editor = editor_with(vec![article(1, "리뷰")]);
        editor.commit(ArticleId::new(1), ArticleField::Status, "업로드", CommitMode::UserEdit);

        let undone = editor.undo();
        assert_eq!(editor.rows()[0].status, "리뷰");
        assert_eq!(persisted(&undone)[0].value.as_deref(), Some("리뷰"));
        assert!(undone.contains(&GridEvent::Status(GridStatus::Undone(ArticleField::Status))));

        let redone = editor.redo();
        assert_eq!(editor.rows()[0].status, "업로드");
        assert_eq!(persisted(&redone)[0].value.as_deref(), Some("업로드"));
        assert_eq!(editor.history().undo_entries().len(), 1);
        assert!(editor.history().redo_entries().is_empty());
    }

    #[test]
    fn undo_and_redo_on_empty_stacks_are_noops() {
        let mut editor = editor_with(vec![article(1, "리뷰")]);
        assert_eq!(
            editor.undo(),
            vec![GridEvent::Status(GridStatus::NothingToUndo)]
        );
        assert_eq!(
            editor.redo(),
            vec![GridEvent::Status(GridStatus::NothingToRedo)]
        );
        assert_eq!(editor.rows()[0].status, "리뷰");
    }

    #[test]
    fn undo_targets_record_identity_after_reorder() {
        let mut editor = editor_with(vec![article(1, "리뷰"), article(2, "추천")]);
        editor.commit(ArticleId::new(2), ArticleField::Status, "업로드", CommitMode::UserEdit);

        let mut reordered = vec![article(2, "업로드"), article(1, "리뷰")];
        reordered.push(article(3, "초안"));
        editor.set_records(reordered);

        let events = editor.undo();
        assert_eq!(persisted(&events)[0].id, ArticleId::new(2));
        assert_eq!(editor.rows()[0].status, "추천");
        assert_eq!(editor.rows()[1].status, "리뷰");
    }

    #[test]
    fn undo_for_row_outside_current_list_still_persists() {
        let mut editor = editor_with(vec![article(1, "리뷰"), article(2, "추천")]);
        editor.commit(ArticleId::new(2), ArticleField::Status, "초안", CommitMode::UserEdit);
        editor.set_records(vec![article(1, "리뷰")]);

        let events = editor.undo();
        assert_eq!(
            persisted(&events),
            vec![FieldUpdate {
                id: ArticleId::new(2),
                field: ArticleField::Status,
                value: Some("추천".to_owned()),
            }]
        );
    }

    #[test]
    fn copy_from_above_commits_value_into_selected_row() {
        let mut editor = editor_with(vec![article(2, "추천"), article(1, "리뷰")]);
        editor.click_cell(1, ArticleField::Status);

        let events = editor.apply(GridCommand::CopyFromAbove);
        assert_eq!(
            persisted(&events),
            vec![FieldUpdate {
                id: ArticleId::new(1),
                field: ArticleField::Status,
                value: Some("추천".to_owned()),
            }]
        );
        assert_eq!(
            editor.history().undo_entries(),
            &[HistoryEntry {
                id: ArticleId::new(1),
                field: ArticleField::Status,
                previous: "리뷰".to_owned(),
                next: "추천".to_owned(),
            }]
        );
    }

    #[test]
    fn copy_from_above_on_first_row_is_noop() {
        let mut editor = editor_with(articles(2));
        let events = editor.apply(GridCommand::CopyFromAbove);
        assert_eq!(events, vec![GridEvent::Status(GridStatus::NoRowAbove)]);
        assert!(!editor.history().can_undo());
    }

    #[test]
    fn bulk_apply_rejects_empty_value_without_writes() {
        let mut editor = editor_with(articles(2));
        editor.apply(GridCommand::SelectAll);

        let error = editor
            .bulk_apply(ArticleField::Status, "")
            .expect_err("empty value should fail");
        assert!(error.to_string().contains("status value"));
        assert!(!editor.history().can_undo());
        assert_eq!(editor.rows()[0].status, "리뷰");
    }

    #[test]
    fn bulk_apply_rejects_empty_selection() {
        let mut editor = editor_with(articles(2));
        let error = editor
            .bulk_apply(ArticleField::Status, "업로드")
            .expect_err("empty selection should fail");
        assert!(error.to_string().contains("select rows first"));
    }

    #[test]
    fn bulk_apply_emits_one_write_per_selected_row() -> anyhow::Result<()> {
        let mut editor = editor_with(articles(3));
        editor.apply(GridCommand::ExtendDown);

        let events = editor.bulk_apply(ArticleField::Status, "업로드")?;
        let updates = persisted(&events);
        assert_eq!(updates.len(), 2);
        assert_eq!(
            updates.iter().map(|update| update.id).collect::<Vec<_>>(),
            ids(&[1, 2])
        );
        assert_eq!(editor.history().undo_entries().len(), 2);
        assert_eq!(editor.rows()[2].status, "리뷰");
        Ok(())
    }

    #[test]
    fn click_on_non_navigable_column_keeps_field_and_reports_activation() {
        let mut editor = editor_with(articles(3));
        editor.apply(GridCommand::MoveFieldRight);

        let events = editor.click_cell(2, ArticleField::Image);
        let expected = CellCursor {
            row: 2,
            field: ArticleField::Editor,
        };
        assert_eq!(
            events,
            vec![
                GridEvent::CursorMoved(expected),
                GridEvent::CellActivated {
                    id: ArticleId::new(3),
                    field: ArticleField::Image,
                },
            ]
        );
        assert!(editor.is_active_row(2));
        assert!(editor.click_cell(9, ArticleField::Title).is_empty());
    }
}
