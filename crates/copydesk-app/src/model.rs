// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::{Date, OffsetDateTime};

use crate::ids::*;

/// Pipeline statuses in workflow order. The status vocabulary is open: rows
/// may carry any other string and it is kept verbatim.
pub const STATUS_PIPELINE: [&str; 5] = ["리뷰", "추천", "초안", "이미지", "업로드"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ArticleField {
    Title,
    CreatedAt,
    Editor,
    Status,
    ContentSource,
    Memo,
    Image,
}

impl ArticleField {
    /// Column order as displayed.
    pub const ALL: [Self; 7] = [
        Self::Title,
        Self::CreatedAt,
        Self::Editor,
        Self::Status,
        Self::ContentSource,
        Self::Memo,
        Self::Image,
    ];

    /// Fields reachable with left/right navigation, in order.
    pub const NAVIGABLE: [Self; 4] = [
        Self::CreatedAt,
        Self::Editor,
        Self::Status,
        Self::ContentSource,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::CreatedAt => "created_at",
            Self::Editor => "editor",
            Self::Status => "status",
            Self::ContentSource => "content_source",
            Self::Memo => "memo",
            Self::Image => "image_url",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "title" => Some(Self::Title),
            "created_at" => Some(Self::CreatedAt),
            "editor" => Some(Self::Editor),
            "status" => Some(Self::Status),
            "content_source" => Some(Self::ContentSource),
            "memo" => Some(Self::Memo),
            "image_url" => Some(Self::Image),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::CreatedAt => "date",
            Self::Editor => "editor",
            Self::Status => "status",
            Self::ContentSource => "source",
            Self::Memo => "memo",
            Self::Image => "image",
        }
    }

    pub fn is_navigable(self) -> bool {
        Self::NAVIGABLE.contains(&self)
    }

    pub const fn is_nullable(self) -> bool {
        matches!(
            self,
            Self::Editor | Self::ContentSource | Self::Memo | Self::Image
        )
    }

    /// Empty input clears nullable fields; required fields keep the empty
    /// string.
    pub fn normalize(self, value: &str) -> Option<String> {
        if value.is_empty() && self.is_nullable() {
            None
        } else {
            Some(value.to_owned())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: ArticleId,
    pub title: String,
    pub status: String,
    pub editor: Option<String>,
    pub content_source: Option<String>,
    pub memo: Option<String>,
    pub image_url: Option<String>,
    /// Calendar date as `YYYY-MM-DD`. Kept as text so in-progress edits can be
    /// shown before they form a valid date.
    pub created_at: String,
    #[serde(default)]
    pub latest_comment: Option<String>,
}

impl Article {
    pub fn field_value(&self, field: ArticleField) -> Option<&str> {
        match field {
            ArticleField::Title => Some(self.title.as_str()),
            ArticleField::CreatedAt => Some(self.created_at.as_str()),
            ArticleField::Editor => self.editor.as_deref(),
            ArticleField::Status => Some(self.status.as_str()),
            ArticleField::ContentSource => self.content_source.as_deref(),
            ArticleField::Memo => self.memo.as_deref(),
            ArticleField::Image => self.image_url.as_deref(),
        }
    }

    pub fn field_text(&self, field: ArticleField) -> String {
        self.field_value(field).unwrap_or_default().to_owned()
    }

    pub fn set_field(&mut self, field: ArticleField, value: Option<String>) {
        match field {
            ArticleField::Title => self.title = value.unwrap_or_default(),
            ArticleField::CreatedAt => self.created_at = value.unwrap_or_default(),
            ArticleField::Editor => self.editor = value,
            ArticleField::Status => self.status = value.unwrap_or_default(),
            ArticleField::ContentSource => self.content_source = value,
            ArticleField::Memo => self.memo = value,
            ArticleField::Image => self.image_url = value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewArticle {
    pub title: String,
    pub status: String,
    pub editor: Option<String>,
    pub content_source: Option<String>,
    pub memo: Option<String>,
    pub image_url: Option<String>,
    pub created_at: Date,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub article_id: ArticleId,
    pub author: String,
    pub body: String,
    pub created_at: OffsetDateTime,
}

/// One field write headed for the record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldUpdate {
    pub id: ArticleId,
    pub field: ArticleField,
    pub value: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArticleSortKey {
    CreatedAt,
    Title,
    Status,
}

impl ArticleSortKey {
    pub const ALL: [Self; 3] = [Self::CreatedAt, Self::Title, Self::Status];

    pub const fn column(self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::Title => "title",
            Self::Status => "status",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleFilter {
    pub status: Option<String>,
    pub editor: Option<String>,
    pub search: Option<String>,
    pub sort: ArticleSortKey,
    pub direction: SortDirection,
}

impl Default for ArticleFilter {
    fn default() -> Self {
        Self {
            status: None,
            editor: None,
            search: None,
            sort: ArticleSortKey::CreatedAt,
            direction: SortDirection::Desc,
        }
    }
}

impl ArticleFilter {
    /// Search text with surrounding whitespace removed, or `None` when blank.
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppMode {
    Nav,
    EditCell,
    BulkPrompt,
    CommentPrompt,
    Search,
}

impl AppMode {
    /// Modes in which keystrokes belong to a text input instead of the grid.
    pub const fn captures_text(self) -> bool {
        !matches!(self, Self::Nav)
    }
}

pub fn parse_iso_date(raw: &str) -> Option<Date> {
    Date::parse(raw.trim(), &format_description!("[year]-[month]-[day]")).ok()
}

pub fn format_iso_date(value: Date) -> String {
    value
        .format(&format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| "1970-01-01".to_owned())
}

#[cfg(test)]
mod tests {
    use super::{Article, ArticleField, ArticleFilter, format_iso_date, parse_iso_date};
    use crate::ArticleId;
    use time::{Date, Month};

    fn sample() -> Article {
        Article {
            id: ArticleId::new(7),
            title: "Spring lineup".to_owned(),
            status: "리뷰".to_owned(),
            editor: Some("jiwoo".to_owned()),
            content_source: None,
            memo: None,
            image_url: None,
            created_at: "2026-03-02".to_owned(),
            latest_comment: None,
        }
    }

    #[test]
    fn field_names_round_trip_through_parse() {
        for field in ArticleField::ALL {
            assert_eq!(ArticleField::parse(field.as_str()), Some(field));
        }
        assert_eq!(ArticleField::parse("nope"), None);
    }

    #[test]
    fn navigable_order_excludes_title_memo_and_image() {
        assert!(!ArticleField::Title.is_navigable());
        assert!(!ArticleField::Memo.is_navigable());
        assert!(!ArticleField::Image.is_navigable());
        assert_eq!(ArticleField::NAVIGABLE[0], ArticleField::CreatedAt);
        assert_eq!(ArticleField::NAVIGABLE[3], ArticleField::ContentSource);
    }

    #[test]
    fn normalize_clears_only_nullable_fields() {
        assert_eq!(ArticleField::Editor.normalize(""), None);
        assert_eq!(ArticleField::Title.normalize(""), Some(String::new()));
        assert_eq!(ArticleField::Status.normalize("업로드"), Some("업로드".to_owned()));
    }

    #[test]
    fn set_field_updates_text_and_nullable_columns() {
        let mut article = sample();
        article.set_field(ArticleField::Editor, None);
        article.set_field(ArticleField::ContentSource, Some("wire".to_owned()));
        article.set_field(ArticleField::Status, None);

        assert_eq!(article.editor, None);
        assert_eq!(article.field_text(ArticleField::ContentSource), "wire");
        assert_eq!(article.status, "");
    }

    #[test]
    fn iso_date_parsing_requires_full_date() {
        let article = sample();
        assert_eq!(
            parse_iso_date(&article.created_at),
            Some(Date::from_calendar_date(2026, Month::March, 2).expect("valid date"))
        );
        assert_eq!(parse_iso_date("2026-3"), None);
    }

    #[test]
    fn iso_date_formatting_pads_components() {
        let date = Date::from_calendar_date(2026, Month::January, 5).expect("valid date");
        assert_eq!(format_iso_date(date), "2026-01-05");
    }

    #[test]
    fn filter_search_term_ignores_blank_input() {
        let mut filter = ArticleFilter::default();
        filter.search = Some("   ".to_owned());
        assert_eq!(filter.search_term(), None);
        filter.search = Some(" lineup ".to_owned());
        assert_eq!(filter.search_term(), Some("lineup"));
    }
}
