// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use copydesk_app::{
    Article, ArticleFilter, ArticleId, Comment, FieldUpdate, export_articles_csv,
};
use copydesk_db::Store;
use copydesk_remote::Client;
use copydesk_tui::{AppRuntime, ExportReport};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use time::macros::format_description;
use tracing::{debug, info};

/// Settings shared by both backends.
#[derive(Debug, Clone)]
pub struct DeskSettings {
    pub author: String,
    pub editors: Vec<String>,
    pub export_dir: PathBuf,
}

pub struct DbRuntime<'a> {
    store: &'a Store,
    settings: DeskSettings,
}

impl<'a> DbRuntime<'a> {
    pub fn new(store: &'a Store, settings: DeskSettings) -> Self {
        Self { store, settings }
    }
}

impl AppRuntime for DbRuntime<'_> {
    fn list_articles(&mut self, filter: &ArticleFilter) -> Result<Vec<Article>> {
        self.store.list_articles(filter)
    }

    fn update_field(&mut self, update: &FieldUpdate) -> Result<()> {
        self.store.update_article_field(update)
    }

    fn list_comments(&mut self, article_id: ArticleId) -> Result<Vec<Comment>> {
        self.store.list_comments(article_id)
    }

    fn add_comment(&mut self, article_id: ArticleId, body: &str) -> Result<()> {
        self.store
            .add_comment(article_id, &self.settings.author, body)
            .map(|_| ())
    }

    fn list_editors(&mut self) -> Result<Vec<String>> {
        let profiles = self.store.list_editors()?;
        Ok(merge_editors(&self.settings.editors, profiles))
    }

    fn export_csv(&mut self, rows: &[Article], selected: &[ArticleId]) -> Result<ExportReport> {
        let path = export_path(&self.settings.export_dir, OffsetDateTime::now_utc())?;
        write_export(&path, rows, selected)
    }
}

/// Articles served by the REST data service. Editor choices come from config
/// plus every editor seen in listed rows.
pub struct RemoteRuntime {
    client: Client,
    settings: DeskSettings,
    seen_editors: BTreeSet<String>,
}

impl RemoteRuntime {
    pub fn new(client: Client, settings: DeskSettings) -> Self {
        Self {
            client,
            settings,
            seen_editors: BTreeSet::new(),
        }
    }
}

impl AppRuntime for RemoteRuntime {
    fn list_articles(&mut self, filter: &ArticleFilter) -> Result<Vec<Article>> {
        let articles = self.client.list_articles(filter)?;
        self.seen_editors
            .extend(articles.iter().filter_map(|article| article.editor.clone()));
        Ok(articles)
    }

    fn update_field(&mut self, update: &FieldUpdate) -> Result<()> {
        self.client.update_field(update)
    }

    fn update_fields(&mut self, updates: &[FieldUpdate]) -> Vec<Result<()>> {
        self.client.update_fields(updates)
    }

    fn list_comments(&mut self, article_id: ArticleId) -> Result<Vec<Comment>> {
        self.client.list_comments(article_id)
    }

    fn add_comment(&mut self, article_id: ArticleId, body: &str) -> Result<()> {
        self.client
            .add_comment(article_id, &self.settings.author, body)
    }

    fn list_editors(&mut self) -> Result<Vec<String>> {
        if self.seen_editors.is_empty() {
            self.list_articles(&ArticleFilter::default())?;
        }
        Ok(merge_editors(
            &self.settings.editors,
            self.seen_editors.iter().cloned().collect(),
        ))
    }

    fn export_csv(&mut self, rows: &[Article], selected: &[ArticleId]) -> Result<ExportReport> {
        let path = export_path(&self.settings.export_dir, OffsetDateTime::now_utc())?;
        write_export(&path, rows, selected)
    }
}

/// Configured editors first, in config order, then any others sorted.
fn merge_editors(configured: &[String], discovered: Vec<String>) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(configured.len() + discovered.len());
    for editor in configured {
        if !merged.contains(editor) {
            merged.push(editor.clone());
        }
    }
    let mut extra: Vec<String> = discovered
        .into_iter()
        .filter(|editor| !merged.contains(editor))
        .collect();
    extra.sort();
    extra.dedup();
    merged.extend(extra);
    merged
}

fn export_path(dir: &Path, now: OffsetDateTime) -> Result<PathBuf> {
    let stamp = now
        .format(format_description!(
            "[year][month][day]-[hour][minute][second]"
        ))
        .context("format export timestamp")?;
    Ok(dir.join(format!("copydesk-articles-{stamp}.csv")))
}

pub fn write_export(path: &Path, rows: &[Article], selected: &[ArticleId]) -> Result<ExportReport> {
    let file =
        File::create(path).with_context(|| format!("create export file {}", path.display()))?;
    let count = export_articles_csv(BufWriter::new(file), rows, selected)
        .with_context(|| format!("write export file {}", path.display()))?;
    info!(rows = count, path = %path.display(), "exported articles");
    debug!(selected = selected.len(), "export selection");
    Ok(ExportReport {
        rows: count,
        path: path.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::{DbRuntime, DeskSettings, RemoteRuntime, export_path, merge_editors};
    use anyhow::{Result, anyhow};
    use copydesk_app::{ArticleField, ArticleFilter, FieldUpdate, NewArticle};
    use copydesk_db::Store;
    use copydesk_remote::Client;
    use copydesk_testkit::fixture_date;
    use copydesk_tui::AppRuntime;
    use std::path::{Path, PathBuf};
    use std::thread;
    use std::time::Duration;
    use time::Month;
    use time::macros::datetime;
    use tiny_http::{Method, Response, Server};

    fn settings(export_dir: &Path) -> DeskSettings {
        DeskSettings {
            author: "편집장".to_owned(),
            editors: vec!["이도윤".to_owned()],
            export_dir: export_dir.to_path_buf(),
        }
    }

    fn store_with_article() -> Result<Store> {
        let store = Store::open_memory()?;
        store.bootstrap()?;
        store.create_article(&NewArticle {
            title: "이어폰 리뷰".to_owned(),
            status: "리뷰".to_owned(),
            editor: None,
            content_source: Some("보도자료, 1차".to_owned()),
            memo: None,
            image_url: None,
            created_at: fixture_date(2026, Month::June, 1)?,
        })?;
        Ok(store)
    }

    #[test]
    fn merge_keeps_config_order_then_sorted_extras() {
        let merged = merge_editors(
            &["이도윤".to_owned(), "김하늘".to_owned()],
            vec!["최민준".to_owned(), "김하늘".to_owned(), "박서연".to_owned()],
        );
        assert_eq!(merged, vec!["이도윤", "김하늘", "박서연", "최민준"]);
    }

    #[test]
    fn export_path_is_timestamped() -> Result<()> {
        let path = export_path(Path::new("/tmp"), datetime!(2026-06-01 09:05:07 UTC))?;
        assert_eq!(
            path,
            PathBuf::from("/tmp/copydesk-articles-20260601-090507.csv")
        );
        Ok(())
    }

    #[test]
    fn db_runtime_writes_fields_and_comments_with_configured_author() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let store = store_with_article()?;
        let mut runtime = DbRuntime::new(&store, settings(temp.path()));

        let article = runtime
            .list_articles(&ArticleFilter::default())?
            .pop()
            .ok_or_else(|| anyhow!("article expected"))?;
        let results = runtime.update_fields(&[FieldUpdate {
            id: article.id,
            field: ArticleField::Status,
            value: Some("업로드".to_owned()),
        }]);
        assert!(results.iter().all(|result| result.is_ok()));

        runtime.add_comment(article.id, "확인 부탁")?;
        let comments = runtime.list_comments(article.id)?;
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].author, "편집장");

        let reloaded = store.get_article(article.id)?;
        assert_eq!(reloaded.status, "업로드");
        assert_eq!(reloaded.latest_comment.as_deref(), Some("확인 부탁"));
        Ok(())
    }

    #[test]
    fn db_runtime_editor_list_merges_profiles() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let store = store_with_article()?;
        store.upsert_profile("김하늘")?;
        store.upsert_profile("이도윤")?;
        let mut runtime = DbRuntime::new(&store, settings(temp.path()));

        assert_eq!(runtime.list_editors()?, vec!["이도윤", "김하늘"]);
        Ok(())
    }

    #[test]
    fn db_runtime_exports_csv_into_export_dir() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let store = store_with_article()?;
        let mut runtime = DbRuntime::new(&store, settings(temp.path()));

        let rows = runtime.list_articles(&ArticleFilter::default())?;
        let report = runtime.export_csv(&rows, &[])?;
        assert_eq!(report.rows, 1);
        assert!(report.path.starts_with(temp.path()));

        let written = std::fs::read_to_string(&report.path)?;
        let mut lines = written.lines();
        assert_eq!(
            lines.next(),
            Some("id,title,status,editor,content_source,memo,created_at,latest_comment")
        );
        assert_eq!(
            lines.next(),
            Some("1,이어폰 리뷰,리뷰,,\"보도자료, 1차\",,2026-06-01,")
        );
        Ok(())
    }

    #[test]
    fn remote_runtime_posts_comment_as_configured_author() -> Result<()> {
        let server =
            Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
        let addr = format!("http://{}", server.server_addr());

        let handle = thread::spawn(move || {
            let mut request = server.recv().expect("request expected");
            assert_eq!(request.method(), &Method::Post);
            let mut body = String::new();
            request
                .as_reader()
                .read_to_string(&mut body)
                .expect("read request body");
            let parsed: serde_json::Value = serde_json::from_str(&body).expect("json body");
            assert_eq!(parsed["author"], "편집장");
            request
                .respond(Response::empty(201))
                .expect("response should succeed");
        });

        let temp = tempfile::tempdir()?;
        let client = Client::new(&addr, "anon", Duration::from_secs(1))?;
        let mut runtime = RemoteRuntime::new(client, settings(temp.path()));
        runtime.add_comment(copydesk_app::ArticleId::new(3), "좋아요")?;

        handle.join().expect("server thread should join");
        Ok(())
    }
}
