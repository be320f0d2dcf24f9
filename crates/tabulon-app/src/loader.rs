// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::table::{Table, TableBuilder, TableOptions};
use crate::tokenizer::DEFAULT_DELIMITER;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

pub const STDIN_DESCRIPTION: &str = "stdin";

/// Delimiter implied by a file name, ignoring case: `.psv` is pipe, `.tsv`
/// is tab, anything else is comma.
pub fn guess_delimiter(path: &Path) -> char {
    let name = path.to_string_lossy().to_lowercase();
    if name.contains(".psv") {
        '|'
    } else if name.contains(".tsv") {
        '\t'
    } else {
        DEFAULT_DELIMITER
    }
}

pub fn describe_path(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Feeds every line of `reader` to the builder. Stops early once the builder
/// wants no more input.
pub fn feed_lines<R: BufRead>(builder: &mut TableBuilder, mut reader: R) -> Result<()> {
    builder.start_source();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .context("read input line")?;
        if read == 0 {
            return Ok(());
        }
        let line = trim_line_ending(&buf);
        let text = String::from_utf8_lossy(line);
        if !builder.push_line(&text)? {
            return Ok(());
        }
    }
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

impl Table {
    /// Loads every path in order into one table.
    pub fn read_files(paths: &[PathBuf], options: TableOptions) -> Result<Table> {
        let Some(first) = paths.first() else {
            anyhow::bail!("no input files given");
        };

        let mut options = options;
        if options.delimiter.is_none() {
            options.delimiter = Some(guess_delimiter(first));
        }

        let mut builder = TableBuilder::new(options, describe_path(first));
        tracing::info!(
            files = paths.len(),
            delimiter = %builder.delimiter().escape_default(),
            "loading input files"
        );
        for path in paths {
            if builder.is_exhausted() {
                tracing::debug!(path = %path.display(), "head cap reached; skipping file");
                break;
            }
            let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
            feed_lines(&mut builder, BufReader::new(file))
                .with_context(|| format!("load {}", path.display()))?;
        }
        Ok(builder.finish())
    }

    pub fn read_stdin(options: TableOptions) -> Result<Table> {
        let stdin = io::stdin();
        Self::read_reader(stdin.lock(), options, STDIN_DESCRIPTION)
    }

    /// Loads a single source from any buffered reader.
    pub fn read_reader<R: BufRead>(
        reader: R,
        options: TableOptions,
        description: &str,
    ) -> Result<Table> {
        let mut builder = TableBuilder::new(options, description);
        feed_lines(&mut builder, reader).with_context(|| format!("load {description}"))?;
        Ok(builder.finish())
    }
}
