// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use copydesk_app::{
    Article, ArticleFilter, ArticleId, Comment, CommentId, FieldUpdate, NewArticle,
    format_iso_date,
};
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::debug;

mod demo;
pub mod faker;

pub use demo::{DEMO_ARTICLE_COUNT, DEMO_SEED};
pub use faker::NewsroomFaker;

pub const APP_NAME: &str = "copydesk";

const REQUIRED_SCHEMA: &[(&str, &[&str])] = &[
    ("profiles", &["id", "display_name", "created_at"]),
    (
        "articles",
        &[
            "id",
            "title",
            "status",
            "editor",
            "content_source",
            "memo",
            "image_url",
            "created_at",
            "updated_at",
        ],
    ),
    (
        "comments",
        &["id", "article_id", "author", "body", "created_at"],
    ),
];

struct RequiredIndex {
    name: &'static str,
    create_sql: &'static str,
}

const REQUIRED_INDEXES: &[RequiredIndex] = &[
    RequiredIndex {
        name: "idx_articles_status",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_articles_status ON articles(status)",
    },
    RequiredIndex {
        name: "idx_comments_article_id",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_comments_article_id ON comments(article_id, created_at)",
    },
];

const ARTICLE_COLUMNS: &str = "
  a.id, a.title, a.status, a.editor, a.content_source, a.memo, a.image_url,
  a.created_at,
  (
    SELECT c.body FROM comments c
    WHERE c.article_id = a.id
    ORDER BY c.created_at DESC, c.id DESC
    LIMIT 1
  ) AS latest_comment
";

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let printable = path.to_string_lossy().to_string();
        validate_db_path(&printable)?;
        let conn = Connection::open(path)
            .with_context(|| format!("open database at {}", path.display()))?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory database")?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn raw_connection(&self) -> &Connection {
        &self.conn
    }

    pub fn bootstrap(&self) -> Result<()> {
        if has_user_tables(&self.conn)? {
            validate_schema(&self.conn)?;
        } else {
            self.conn
                .execute_batch(include_str!("sql/schema.sql"))
                .context("create schema")?;
        }

        ensure_required_indexes(&self.conn)
    }

    pub fn list_articles(&self, filter: &ArticleFilter) -> Result<Vec<Article>> {
        let mut sql = format!("SELECT {ARTICLE_COLUMNS} FROM articles a");
        let mut clauses = Vec::new();
        let mut values: Vec<String> = Vec::new();

        if let Some(status) = &filter.status {
            clauses.push("a.status = ?");
            values.push(status.clone());
        }
        if let Some(editor) = &filter.editor {
            clauses.push("a.editor = ?");
            values.push(editor.clone());
        }
        if let Some(term) = filter.search_term() {
            clauses.push("(a.title LIKE ? OR IFNULL(a.content_source, '') LIKE ?)");
            let pattern = format!("%{term}%");
            values.push(pattern.clone());
            values.push(pattern);
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(&format!(
            " ORDER BY a.{} {}, a.id DESC",
            filter.sort.column(),
            filter.direction.as_str().to_ascii_uppercase()
        ));

        let mut stmt = self.conn.prepare(&sql).context("prepare articles query")?;
        let rows = stmt
            .query_map(params_from_iter(values.iter()), article_from_row)
            .context("query articles")?;
        let articles = rows
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("collect articles")?;
        debug!(count = articles.len(), ?filter, "listed articles");
        Ok(articles)
    }

    pub fn get_article(&self, article_id: ArticleId) -> Result<Article> {
        self.conn
            .query_row(
                &format!("SELECT {ARTICLE_COLUMNS} FROM articles a WHERE a.id = ?"),
                params![article_id.get()],
                article_from_row,
            )
            .optional()
            .with_context(|| format!("load article {article_id}"))?
            .ok_or_else(|| anyhow!("article {article_id} not found -- refresh the list and retry"))
    }

    pub fn create_article(&self, article: &NewArticle) -> Result<ArticleId> {
        let now = now_rfc3339()?;
        self.conn
            .execute(
                "
                INSERT INTO articles (
                  title, status, editor, content_source, memo, image_url,
                  created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                ",
                params![
                    article.title,
                    article.status,
                    article.editor,
                    article.content_source,
                    article.memo,
                    article.image_url,
                    format_iso_date(article.created_at),
                    now,
                ],
            )
            .context("insert article")?;
        Ok(ArticleId::new(self.conn.last_insert_rowid()))
    }

    /// Writes a single column. Values are stored verbatim; the store does not
    /// second-guess what the grid committed.
    pub fn update_article_field(&self, update: &FieldUpdate) -> Result<()> {
        let now = now_rfc3339()?;
        let column = update.field.as_str();
        let value = match (&update.value, update.field.is_nullable()) {
            (Some(value), _) => Some(value.as_str()),
            (None, true) => None,
            (None, false) => Some(""),
        };
        let rows_affected = self
            .conn
            .execute(
                &format!("UPDATE articles SET {column} = ?, updated_at = ? WHERE id = ?"),
                params![value, now, update.id.get()],
            )
            .with_context(|| format!("update article {} {column}", update.id))?;
        if rows_affected == 0 {
            bail!(
                "article {} not found -- it may have been removed; refresh and retry",
                update.id
            );
        }
        debug!(id = update.id.get(), column, "article field updated");
        Ok(())
    }

    pub fn list_comments(&self, article_id: ArticleId) -> Result<Vec<Comment>> {
        let mut stmt = self
            .conn
            .prepare(
                "
                SELECT id, article_id, author, body, created_at
                FROM comments
                WHERE article_id = ?
                ORDER BY created_at ASC, id ASC
                ",
            )
            .context("prepare comments query")?;
        let rows = stmt
            .query_map(params![article_id.get()], |row| {
                let created_at_raw: String = row.get(4)?;
                Ok(Comment {
                    id: CommentId::new(row.get(0)?),
                    article_id: ArticleId::new(row.get(1)?),
                    author: row.get(2)?,
                    body: row.get(3)?,
                    created_at: parse_datetime(&created_at_raw).map_err(to_sql_error)?,
                })
            })
            .context("query comments")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect comments")
    }

    pub fn add_comment(&self, article_id: ArticleId, author: &str, body: &str) -> Result<CommentId> {
        if body.trim().is_empty() {
            bail!("comment is empty -- type a comment and retry");
        }
        if author.trim().is_empty() {
            bail!("comment author is required -- set [ui].author in the config");
        }
        let now = now_rfc3339()?;
        self.conn
            .execute(
                "INSERT INTO comments (article_id, author, body, created_at) VALUES (?, ?, ?, ?)",
                params![article_id.get(), author.trim(), body.trim(), now],
            )
            .with_context(|| format!("insert comment for article {article_id}"))?;
        Ok(CommentId::new(self.conn.last_insert_rowid()))
    }

    pub fn list_editors(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT display_name FROM profiles ORDER BY display_name ASC")
            .context("prepare profiles query")?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .context("query profiles")?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect profiles")
    }

    pub fn upsert_profile(&self, display_name: &str) -> Result<()> {
        let trimmed = display_name.trim();
        if trimmed.is_empty() {
            bail!("profile name must not be empty");
        }
        let now = now_rfc3339()?;
        self.conn
            .execute(
                "INSERT OR IGNORE INTO profiles (display_name, created_at) VALUES (?, ?)",
                params![trimmed, now],
            )
            .with_context(|| format!("insert profile {trimmed}"))?;
        Ok(())
    }
}

fn article_from_row(row: &Row<'_>) -> rusqlite::Result<Article> {
    Ok(Article {
        id: ArticleId::new(row.get(0)?),
        title: row.get(1)?,
        status: row.get(2)?,
        editor: row.get(3)?,
        content_source: row.get(4)?,
        memo: row.get(5)?,
        image_url: row.get(6)?,
        created_at: row.get(7)?,
        latest_comment: row.get(8)?,
    })
}

pub fn default_db_path() -> Result<PathBuf> {
    if let Some(override_path) = env::var_os("COPYDESK_DB_PATH") {
        return Ok(PathBuf::from(override_path));
    }

    let app_dir = data_dir()?;
    Ok(app_dir.join("copydesk.db"))
}

/// Per-user data directory, created on first use. Logs live here too.
pub fn data_dir() -> Result<PathBuf> {
    let data_root = dirs::data_local_dir().ok_or_else(|| {
        anyhow!("cannot resolve data directory; set COPYDESK_DB_PATH to a writable database path")
    })?;

    let app_dir = data_root.join(APP_NAME);
    fs::create_dir_all(&app_dir)
        .with_context(|| format!("create data directory {}", app_dir.display()))?;
    Ok(app_dir)
}

pub fn validate_db_path(path: &str) -> Result<()> {
    if path.is_empty() {
        bail!("database path must not be empty");
    }
    if path == ":memory:" {
        return Ok(());
    }

    if let Some(index) = path.find("://")
        && index > 0
    {
        let scheme = &path[..index];
        if scheme.chars().all(char::is_alphabetic) {
            bail!(
                "database path {path:?} looks like a URI ({scheme}://); pass a filesystem path instead"
            );
        }
    }

    if path.starts_with("file:") {
        bail!("database path {path:?} uses file: URI syntax; pass a plain filesystem path");
    }

    if path.contains('?') {
        bail!(
            "database path {path:?} contains '?'; remove query parameters and use a plain file path"
        );
    }

    Ok(())
}

fn has_user_tables(conn: &Connection) -> Result<bool> {
    let count: i64 = conn
        .query_row(
            "
            SELECT COUNT(*)
            FROM sqlite_master
            WHERE type = 'table'
              AND name NOT LIKE 'sqlite_%'
            ",
            [],
            |row| row.get(0),
        )
        .context("count user tables")?;
    Ok(count > 0)
}

fn validate_schema(conn: &Connection) -> Result<()> {
    for (table, required_columns) in REQUIRED_SCHEMA {
        if !table_exists(conn, table)? {
            bail!(
                "database is missing required table `{table}`; point [storage].db_path at a copydesk database"
            );
        }

        let columns = table_columns(conn, table)?;
        let missing: Vec<&str> = required_columns
            .iter()
            .copied()
            .filter(|column| !columns.contains(*column))
            .collect();

        if !missing.is_empty() {
            bail!(
                "table `{table}` is missing required columns: {}; recreate the database or add them",
                missing.join(", ")
            );
        }
    }

    Ok(())
}

fn ensure_required_indexes(conn: &Connection) -> Result<()> {
    for index in REQUIRED_INDEXES {
        conn.execute_batch(index.create_sql)
            .with_context(|| format!("ensure required index `{}`", index.name))?;
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let exists = conn
        .query_row(
            "
            SELECT EXISTS(
              SELECT 1
              FROM sqlite_master
              WHERE type = 'table' AND name = ?
            )
            ",
            params![table],
            |row| row.get::<_, i64>(0),
        )
        .with_context(|| format!("check table existence for {table}"))?;
    Ok(exists == 1)
}

fn table_columns(conn: &Connection, table: &str) -> Result<BTreeSet<String>> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table})"))
        .with_context(|| format!("inspect columns for {table}"))?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .with_context(|| format!("query column info for {table}"))?;

    rows.collect::<rusqlite::Result<BTreeSet<_>>>()
        .with_context(|| format!("collect columns for {table}"))
}

fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA foreign_keys = ON;
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        ",
    )
    .context("configure sqlite pragmas")
}

fn now_rfc3339() -> Result<String> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .context("format current timestamp")
}

fn parse_datetime(raw: &str) -> Result<OffsetDateTime> {
    OffsetDateTime::parse(raw, &Rfc3339).with_context(|| format!("unsupported datetime {raw:?}"))
}

fn to_sql_error(error: anyhow::Error) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            error.to_string(),
        )),
    )
}
