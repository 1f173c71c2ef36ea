// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use copydesk_app::{Article, ArticleId};
use std::path::PathBuf;
use time::{Date, Month};

pub fn temp_db_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let db_path = dir.path().join("copydesk.db");
    Ok((dir, db_path))
}

/// In-memory article with fixed content, for grid and export tests.
pub fn article(id: i64, title: &str, status: &str) -> Article {
    Article {
        id: ArticleId::new(id),
        title: title.to_owned(),
        status: status.to_owned(),
        editor: None,
        content_source: None,
        memo: None,
        image_url: None,
        created_at: format!("2026-06-{:02}", (id.rem_euclid(28)) + 1),
        latest_comment: None,
    }
}

pub fn fixture_date(year: i32, month: Month, day: u8) -> Result<Date> {
    Date::from_calendar_date(year, month, day)
        .with_context(|| format!("invalid fixture date {year}-{month}-{day}"))
}
