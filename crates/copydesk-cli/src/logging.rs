// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

const LOG_ENV: &str = "COPYDESK_LOG";
const LOG_FILE: &str = "copydesk.log";

/// Installs the global subscriber. Output goes to a daily rolling file under
/// `<data_dir>/logs` because the terminal belongs to the TUI. Keep the guard
/// alive until exit so buffered lines are flushed.
pub fn init(data_dir: &Path, level: &str) -> Result<WorkerGuard> {
    let env_value = std::env::var(LOG_ENV).ok();
    let filter = build_filter(env_value.as_deref(), level)?;

    let logs_dir = data_dir.join("logs");
    fs::create_dir_all(&logs_dir)
        .with_context(|| format!("create log directory {}", logs_dir.display()))?;

    let file_appender = tracing_appender::rolling::daily(&logs_dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(file_layer)
        .try_init()
        .context("install log subscriber")?;
    Ok(guard)
}

/// `COPYDESK_LOG` wins over the configured level when it is set and non-blank.
fn build_filter(env_value: Option<&str>, level: &str) -> Result<EnvFilter> {
    match env_value.map(str::trim).filter(|value| !value.is_empty()) {
        Some(directives) => EnvFilter::try_new(directives)
            .with_context(|| format!("invalid {LOG_ENV} value {directives:?}")),
        None => EnvFilter::try_new(level)
            .with_context(|| format!("invalid [log].level {level:?}; try info or debug")),
    }
}
