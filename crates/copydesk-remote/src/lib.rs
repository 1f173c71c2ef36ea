// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Blocking client for the hosted article service, a PostgREST-style API
//! served under `<base_url>/rest/v1`.

use anyhow::{Context, Result, anyhow, bail};
use copydesk_app::{
    Article, ArticleFilter, ArticleId, Comment, CommentId, FieldUpdate, format_iso_date,
    parse_iso_date,
};
use reqwest::StatusCode;
use reqwest::blocking::{Client as HttpClient, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::thread;
use std::time::Duration;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{debug, warn};
use url::Url;

const REST_PREFIX: &str = "rest/v1";
// Embeds the newest comment of each article as `comments`.
const ARTICLE_SELECT: &str = "*,comments(body,created_at)";
const BULK_WORKERS: usize = 8;

#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    api_key: String,
    timeout: Duration,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            bail!("backend.base_url must not be empty");
        }
        Url::parse(&base_url)
            .with_context(|| format!("backend.base_url {base_url:?} is not a valid URL"))?;
        if api_key.trim().is_empty() {
            bail!("backend.api_key must not be empty -- copy the anon key from the service dashboard");
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            api_key: api_key.trim().to_owned(),
            timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn list_articles(&self, filter: &ArticleFilter) -> Result<Vec<Article>> {
        let url = articles_url(&self.base_url, filter)?;
        let response = self
            .authorized(self.http.get(url))
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }

        let rows: Vec<ArticleRow> = response.json().context("decode article list")?;
        debug!(count = rows.len(), "fetched articles");
        Ok(rows.into_iter().map(ArticleRow::into_article).collect())
    }

    pub fn update_field(&self, update: &FieldUpdate) -> Result<()> {
        let mut url = self.endpoint("articles")?;
        url.query_pairs_mut()
            .append_pair("id", &format!("eq.{}", update.id));

        let value = match &update.value {
            Some(value) => Value::String(value.clone()),
            None => Value::Null,
        };
        let mut body = Map::new();
        body.insert(update.field.as_str().to_owned(), value);

        let response = self
            .authorized(self.http.patch(url))
            .header("Prefer", "return=minimal")
            .json(&Value::Object(body))
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body)).with_context(|| {
                format!("update article {} {}", update.id, update.field.as_str())
            });
        }
        Ok(())
    }

    /// Sends updates concurrently, at most `BULK_WORKERS` in flight, and waits
    /// for all of them. Results line up with `updates`.
    pub fn update_fields(&self, updates: &[FieldUpdate]) -> Vec<Result<()>> {
        let mut results = Vec::with_capacity(updates.len());
        for chunk in updates.chunks(BULK_WORKERS) {
            thread::scope(|scope| {
                let handles: Vec<_> = chunk
                    .iter()
                    .map(|update| scope.spawn(move || self.update_field(update)))
                    .collect();
                results.extend(handles.into_iter().map(|handle| {
                    handle
                        .join()
                        .unwrap_or_else(|_| Err(anyhow!("update worker panicked")))
                }));
            });
        }
        results
            .into_iter()
        .inspect(|result| {
            if let Err(error) = result {
                warn!(%error, "bulk update failed");
            }
        })
        .collect()
    }

    pub fn list_comments(&self, article_id: ArticleId) -> Result<Vec<Comment>> {
        let mut url = self.endpoint("comments")?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("article_id", &format!("eq.{article_id}"))
            .append_pair("order", "created_at.asc,id.asc");

        let response = self
            .authorized(self.http.get(url))
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }

        let rows: Vec<CommentRow> = response.json().context("decode comment list")?;
        rows.into_iter().map(CommentRow::into_comment).collect()
    }

    pub fn add_comment(&self, article_id: ArticleId, author: &str, body: &str) -> Result<()> {
        if body.trim().is_empty() {
            bail!("comment is empty -- type a comment and retry");
        }
        let url = self.endpoint("comments")?;
        let payload = NewCommentRow {
            article_id: article_id.get(),
            author: author.trim(),
            body: body.trim(),
        };

        let response = self
            .authorized(self.http.post(url))
            .header("Prefer", "return=minimal")
            .json(&payload)
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }
        Ok(())
    }

    fn endpoint(&self, table: &str) -> Result<Url> {
        table_url(&self.base_url, table)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", self.api_key.as_str())
            .bearer_auth(&self.api_key)
    }
}

fn table_url(base_url: &str, table: &str) -> Result<Url> {
    let raw = format!("{base_url}/{REST_PREFIX}/{table}");
    Url::parse(&raw).with_context(|| format!("build request URL {raw:?}"))
}

/// Builds the article listing URL: filters become `eq.` operators, search
/// becomes a case-insensitive `or` over title and source.
pub fn articles_url(base_url: &str, filter: &ArticleFilter) -> Result<Url> {
    let mut url = table_url(base_url, "articles")?;
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("select", ARTICLE_SELECT);
        query.append_pair("comments.order", "created_at.desc,id.desc");
        query.append_pair("comments.limit", "1");
        query.append_pair(
            "order",
            &format!(
                "{}.{},id.desc",
                filter.sort.column(),
                filter.direction.as_str()
            ),
        );
        if let Some(status) = &filter.status {
            query.append_pair("status", &format!("eq.{status}"));
        }
        if let Some(editor) = &filter.editor {
            query.append_pair("editor", &format!("eq.{editor}"));
        }
        if let Some(term) = filter.search_term() {
            let term = sanitize_search(term);
            query.append_pair(
                "or",
                &format!("(title.ilike.*{term}*,content_source.ilike.*{term}*)"),
            );
        }
    }
    Ok(url)
}

// PostgREST treats these as syntax inside `or=(...)`.
fn sanitize_search(term: &str) -> String {
    term.chars()
        .filter(|ch| !matches!(ch, ',' | '(' | ')' | '*'))
        .collect()
}

fn connection_error(base_url: &str, error: reqwest::Error) -> anyhow::Error {
    anyhow!(
        "cannot reach {} -- check [backend].base_url and your network ({})",
        base_url,
        error
    )
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    if let Ok(parsed) = serde_json::from_str::<PostgrestError>(body)
        && let Some(message) = parsed.message
        && !message.is_empty()
    {
        return match parsed.hint.filter(|hint| !hint.is_empty()) {
            Some(hint) => anyhow!("server error ({}): {message} ({hint})", status.as_u16()),
            None => anyhow!("server error ({}): {message}", status.as_u16()),
        };
    }

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return anyhow!(
            "server rejected credentials ({}) -- check [backend].api_key",
            status.as_u16()
        );
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() && trimmed.len() < 100 && !trimmed.contains('{') {
        return anyhow!("server error ({}): {}", status.as_u16(), trimmed);
    }

    anyhow!("server returned {}", status.as_u16())
}

#[derive(Debug, Deserialize)]
struct PostgrestError {
    message: Option<String>,
    hint: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ArticleRow {
    id: i64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    editor: Option<String>,
    #[serde(default)]
    content_source: Option<String>,
    #[serde(default)]
    memo: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    comments: Vec<EmbeddedComment>,
}

#[derive(Debug, Deserialize)]
struct EmbeddedComment {
    body: String,
}

impl ArticleRow {
    fn into_article(self) -> Article {
        Article {
            id: ArticleId::new(self.id),
            title: self.title.unwrap_or_default(),
            status: self.status.unwrap_or_default(),
            editor: self.editor,
            content_source: self.content_source,
            memo: self.memo,
            image_url: self.image_url,
            created_at: self
                .created_at
                .map(|raw| normalize_created_at(&raw))
                .unwrap_or_default(),
            latest_comment: self.comments.into_iter().next().map(|comment| comment.body),
        }
    }
}

/// Hosted rows may carry a full timestamp; the grid edits the calendar date.
fn normalize_created_at(raw: &str) -> String {
    let date_part = raw.get(..10).unwrap_or(raw);
    match parse_iso_date(date_part) {
        Some(date) => format_iso_date(date),
        None => raw.to_owned(),
    }
}

#[derive(Debug, Deserialize)]
struct CommentRow {
    id: i64,
    article_id: i64,
    #[serde(default)]
    author: Option<String>,
    body: String,
    created_at: String,
}

impl CommentRow {
    fn into_comment(self) -> Result<Comment> {
        let created_at = OffsetDateTime::parse(&self.created_at, &Rfc3339)
            .with_context(|| format!("comment {} has invalid created_at", self.id))?;
        Ok(Comment {
            id: CommentId::new(self.id),
            article_id: ArticleId::new(self.article_id),
            author: self.author.unwrap_or_default(),
            body: self.body,
            created_at,
        })
    }
}

#[derive(Debug, Serialize)]
struct NewCommentRow<'a> {
    article_id: i64,
    author: &'a str,
    body: &'a str,
}
