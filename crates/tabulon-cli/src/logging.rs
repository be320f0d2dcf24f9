// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! File-backed diagnostics. The interactive grid owns the terminal, so log
//! output never goes to stdout or stderr.

use crate::config::APP_NAME;
use anyhow::{Context, Result, anyhow};
use std::env;
use std::fs;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const LOG_ENV: &str = "TABULON_LOG";
const LOG_FILE_PREFIX: &str = "tabulon.log";

/// Installs the global subscriber when `TABULON_LOG` is set. The returned
/// guard flushes buffered lines on drop and must outlive the program's work.
pub fn init_logging() -> Result<Option<WorkerGuard>> {
    if env::var_os(LOG_ENV).is_none() {
        return Ok(None);
    }

    let filter = EnvFilter::try_from_env(LOG_ENV)
        .with_context(|| format!("parse {LOG_ENV} filter directives"))?;
    let dir = log_dir()?;
    fs::create_dir_all(&dir)
        .with_context(|| format!("create log directory {}", dir.display()))?;

    let appender = tracing_appender::rolling::daily(&dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true),
        )
        .try_init()
        .context("install log subscriber")?;

    tracing::debug!(dir = %dir.display(), "logging initialized");
    Ok(Some(guard))
}

pub fn log_dir() -> Result<PathBuf> {
    let cache_root = dirs::cache_dir()
        .ok_or_else(|| anyhow!("cannot resolve cache directory for {LOG_ENV} output"))?;
    Ok(cache_root.join(APP_NAME).join("logs"))
}
