// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use std::io::Write;

use crate::{Article, ArticleId};

pub const CSV_HEADER: [&str; 8] = [
    "id",
    "title",
    "status",
    "editor",
    "content_source",
    "memo",
    "created_at",
    "latest_comment",
];

/// Writes articles as CSV in display order. A non-empty `selected` narrows
/// the export to those ids. Returns the number of data rows written.
pub fn export_articles_csv<W: Write>(
    writer: W,
    articles: &[Article],
    selected: &[ArticleId],
) -> Result<usize> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(CSV_HEADER).context("write csv header")?;

    let mut written = 0usize;
    for article in articles
        .iter()
        .filter(|article| selected.is_empty() || selected.contains(&article.id))
    {
        let id = article.id.to_string();
        csv.write_record([
            id.as_str(),
            article.title.as_str(),
            article.status.as_str(),
            article.editor.as_deref().unwrap_or(""),
            article.content_source.as_deref().unwrap_or(""),
            article.memo.as_deref().unwrap_or(""),
            article.created_at.as_str(),
            article.latest_comment.as_deref().unwrap_or(""),
        ])
        .with_context(|| format!("write csv row for article {id}"))?;
        written += 1;
    }

    csv.flush().context("flush csv output")?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::export_articles_csv;
    use crate::{Article, ArticleId};
    use anyhow::Result;

    fn article(id: i64, title: &str) -> Article {
        Article {
            id: ArticleId::new(id),
            title: title.to_owned(),
            status: "초안".to_owned(),
            editor: Some("kim".to_owned()),
            content_source: None,
            memo: Some("line one\nline two".to_owned()),
            image_url: None,
            created_at: "2026-05-01".to_owned(),
            latest_comment: None,
        }
    }

    #[test]
    fn exports_all_rows_with_quoting() -> Result<()> {
        let mut out = Vec::new();
        let count = export_articles_csv(
            &mut out,
            &[article(1, "Hello, world"), article(2, "Say \"hi\"")],
            &[],
        )?;
        let text = String::from_utf8(out)?;

        assert_eq!(count, 2);
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("id,title,status,editor,content_source,memo,created_at,latest_comment")
        );
        assert!(text.contains("1,\"Hello, world\",초안,kim,,\"line one\nline two\",2026-05-01,"));
        assert!(text.contains("\"Say \"\"hi\"\"\""));
        Ok(())
    }

    #[test]
    fn selection_limits_export_and_keeps_display_order() -> Result<()> {
        let mut out = Vec::new();
        let mut rows = [article(3, "c"), article(1, "a"), article(2, "b")];
        for row in &mut rows {
            row.memo = None;
        }
        let count = export_articles_csv(&mut out, &rows, &[ArticleId::new(2), ArticleId::new(3)])?;
        let text = String::from_utf8(out)?;

        assert_eq!(count, 2);
        let ids: Vec<&str> = text
            .lines()
            .skip(1)
            .filter_map(|line| line.split(',').next())
            .collect();
        assert_eq!(ids, vec!["3", "2"]);
        Ok(())
    }
}
