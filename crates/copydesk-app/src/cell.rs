// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Single-cell display and in-place editing.
//!
//! A cell starts in display mode. Activating it switches to edit mode, where
//! every change yields a [`CellChange`] right away; persisting that change is
//! up to the caller. Blurring drops back to display mode without emitting
//! anything. Values are never validated here.

use time::{Date, Month};

use crate::{Article, ArticleField, STATUS_PIPELINE, format_iso_date, parse_iso_date};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellValue {
    Text(String),
    Number(i64),
    Null,
}

impl CellValue {
    pub fn from_field(article: &Article, field: ArticleField) -> Self {
        match article.field_value(field) {
            Some(value) => Self::Text(value.to_owned()),
            None => Self::Null,
        }
    }

    pub fn display(&self) -> String {
        match self {
            Self::Text(value) => value.clone(),
            Self::Number(value) => value.to_string(),
            Self::Null => String::new(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellKind {
    Text,
    Date,
    Select(Vec<String>),
}

impl CellKind {
    /// Editor kind for a column. `editors` supplies the assignee options.
    pub fn for_field(field: ArticleField, editors: &[String]) -> Self {
        match field {
            ArticleField::Status => Self::Select(
                STATUS_PIPELINE
                    .iter()
                    .map(|status| (*status).to_owned())
                    .collect(),
            ),
            ArticleField::Editor => Self::Select(editors.to_vec()),
            ArticleField::CreatedAt => Self::Date,
            ArticleField::Title
            | ArticleField::ContentSource
            | ArticleField::Memo
            | ArticleField::Image => Self::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellMode {
    Display,
    Editing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellChange {
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellEditor {
    kind: CellKind,
    mode: CellMode,
    buffer: String,
}

impl CellEditor {
    pub fn new(kind: CellKind, value: &CellValue) -> Self {
        Self {
            kind,
            mode: CellMode::Display,
            buffer: value.display(),
        }
    }

    pub fn kind(&self) -> &CellKind {
        &self.kind
    }

    pub fn mode(&self) -> CellMode {
        self.mode
    }

    pub fn is_editing(&self) -> bool {
        self.mode == CellMode::Editing
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn activate(&mut self) {
        self.mode = CellMode::Editing;
    }

    pub fn blur(&mut self) {
        self.mode = CellMode::Display;
    }

    /// Typed character. Select cells take their value from the option list
    /// only, so typing into them is ignored.
    pub fn input_char(&mut self, ch: char) -> Option<CellChange> {
        if !self.is_editing() || matches!(self.kind, CellKind::Select(_)) {
            return None;
        }
        self.buffer.push(ch);
        Some(self.change())
    }

    pub fn backspace(&mut self) -> Option<CellChange> {
        if !self.is_editing() || matches!(self.kind, CellKind::Select(_)) {
            return None;
        }
        self.buffer.pop()?;
        Some(self.change())
    }

    pub fn replace(&mut self, value: &str) -> Option<CellChange> {
        if !self.is_editing() {
            return None;
        }
        self.buffer = value.to_owned();
        Some(self.change())
    }

    pub fn next_option(&mut self) -> Option<CellChange> {
        self.cycle_option(1)
    }

    pub fn prev_option(&mut self) -> Option<CellChange> {
        self.cycle_option(-1)
    }

    fn cycle_option(&mut self, delta: isize) -> Option<CellChange> {
        if !self.is_editing() {
            return None;
        }
        let CellKind::Select(options) = &self.kind else {
            return None;
        };
        if options.is_empty() {
            return None;
        }

        let len = options.len() as isize;
        let next = match options.iter().position(|option| *option == self.buffer) {
            Some(current) => (current as isize + delta).rem_euclid(len) as usize,
            None if delta >= 0 => 0,
            None => options.len() - 1,
        };
        self.buffer = options[next].clone();
        Some(self.change())
    }

    /// Moves a date cell by whole days. Unparseable text stays untouched.
    pub fn step_days(&mut self, days: i64) -> Option<CellChange> {
        if !self.is_editing() || self.kind != CellKind::Date {
            return None;
        }
        let current = parse_iso_date(&self.buffer)?;
        let next = shift_date_by_days(current, days)?;
        self.buffer = format_iso_date(next);
        Some(self.change())
    }

    pub fn step_months(&mut self, months: i32) -> Option<CellChange> {
        if !self.is_editing() || self.kind != CellKind::Date {
            return None;
        }
        let current = parse_iso_date(&self.buffer)?;
        let next = shift_date_by_months(current, months)?;
        self.buffer = format_iso_date(next);
        Some(self.change())
    }

    fn change(&self) -> CellChange {
        CellChange {
            value: self.buffer.clone(),
        }
    }
}

pub fn shift_date_by_days(date: Date, days: i64) -> Option<Date> {
    date.checked_add(time::Duration::days(days))
}

pub fn shift_date_by_months(date: Date, months: i32) -> Option<Date> {
    let base_month = i32::from(date.month() as u8);
    let total_month = base_month - 1 + months;
    let year = date.year() + total_month.div_euclid(12);
    let month_number = (total_month.rem_euclid(12) + 1) as u8;
    let month = Month::try_from(month_number).ok()?;
    let max_day = last_day_of_month(year, month)?;
    Date::from_calendar_date(year, month, date.day().min(max_day)).ok()
}

fn last_day_of_month(year: i32, month: Month) -> Option<u8> {
    let (next_year, next_month) = if month == Month::December {
        (year + 1, Month::January)
    } else {
        (year, Month::try_from((month as u8) + 1).ok()?)
    };

    let first_next_month = Date::from_calendar_date(next_year, next_month, 1).ok()?;
    let last = first_next_month - time::Duration::days(1);
    Some(last.day())
}

#[cfg(test)]
mod tests {
    use super::{CellChange, CellEditor, CellKind, CellMode, CellValue, shift_date_by_months};
    use crate::ArticleField;
    use time::{Date, Month};

    fn change(value: &str) -> Option<CellChange> {
        Some(CellChange {
            value: value.to_owned(),
        })
    }

    #[test]
    fn starts_in_display_mode_and_ignores_input() {
        let mut cell = CellEditor::new(CellKind::Text, &CellValue::Text("draft".to_owned()));
        assert_eq!(cell.mode(), CellMode::Display);
        assert_eq!(cell.input_char('x'), None);
        assert_eq!(cell.buffer(), "draft");
    }

    #[test]
    fn every_keystroke_emits_a_change() {
        let mut cell = CellEditor::new(CellKind::Text, &CellValue::Null);
        cell.activate();
        assert_eq!(cell.input_char('a'), change("a"));
        assert_eq!(cell.input_char('b'), change("ab"));
        assert_eq!(cell.backspace(), change("a"));
        assert_eq!(cell.backspace(), change(""));
        assert_eq!(cell.backspace(), None);
    }

    #[test]
    fn blur_returns_to_display_without_change() {
        let mut cell = CellEditor::new(CellKind::Text, &CellValue::Text("x".to_owned()));
        cell.activate();
        cell.input_char('y');
        cell.blur();
        assert!(!cell.is_editing());
        assert_eq!(cell.buffer(), "xy");
    }

    #[test]
    fn select_cycles_options_and_wraps() {
        let kind = CellKind::for_field(ArticleField::Status, &[]);
        let mut cell = CellEditor::new(kind, &CellValue::Text("이미지".to_owned()));
        cell.activate();
        assert_eq!(cell.next_option(), change("업로드"));
        assert_eq!(cell.next_option(), change("리뷰"));
        assert_eq!(cell.prev_option(), change("업로드"));
        assert_eq!(cell.input_char('z'), None);
    }

    #[test]
    fn select_with_unknown_value_starts_from_ends() {
        let kind = CellKind::Select(vec!["kim".to_owned(), "lee".to_owned()]);
        let mut cell = CellEditor::new(kind.clone(), &CellValue::Text("park".to_owned()));
        cell.activate();
        assert_eq!(cell.next_option(), change("kim"));

        let mut cell = CellEditor::new(kind, &CellValue::Null);
        cell.activate();
        assert_eq!(cell.prev_option(), change("lee"));
    }

    #[test]
    fn empty_editor_options_do_not_change_value() {
        let kind = CellKind::for_field(ArticleField::Editor, &[]);
        let mut cell = CellEditor::new(kind, &CellValue::Text("kim".to_owned()));
        cell.activate();
        assert_eq!(cell.next_option(), None);
        assert_eq!(cell.buffer(), "kim");
    }

    #[test]
    fn date_cell_accepts_free_text_and_steps_days() {
        let mut cell = CellEditor::new(CellKind::Date, &CellValue::Text("2026-02-28".to_owned()));
        cell.activate();
        assert_eq!(cell.step_days(1), change("2026-03-01"));
        assert_eq!(cell.step_months(-1), change("2026-02-01"));

        cell.replace("soon");
        assert_eq!(cell.step_days(1), None);
        assert_eq!(cell.buffer(), "soon");
    }

    #[test]
    fn month_shift_clamps_to_end_of_month() {
        let jan_31 = Date::from_calendar_date(2026, Month::January, 31).expect("valid date");
        assert_eq!(
            shift_date_by_months(jan_31, 1),
            Some(Date::from_calendar_date(2026, Month::February, 28).expect("valid date"))
        );
    }

    #[test]
    fn number_and_null_values_display_verbatim() {
        assert_eq!(CellValue::Number(42).display(), "42");
        assert_eq!(CellValue::Null.display(), "");
        assert!(CellValue::Null.is_null());
        assert!(!CellValue::Text(String::new()).is_null());
    }
}
