// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::columns::RowReader;
use crate::error::{TableError, TableResult};
use crate::expr::{Expr, RowScope};
use crate::tokenizer::{DEFAULT_DELIMITER, Tokenizer};
use std::cmp::Ordering;
use unicode_width::UnicodeWidthStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn label(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TableOptions {
    pub skip: usize,
    pub head: Option<usize>,
    pub tail: Option<usize>,
    /// Inclusion substrings; a row must contain all of them.
    pub matches: Vec<String>,
    /// Exclusion substrings; a row containing any of them is dropped.
    pub excludes: Vec<String>,
    pub expr: Option<Expr>,
    pub columns: Vec<String>,
    pub delimiter: Option<char>,
    // characters, 0 = unlimited
    pub cell_limit: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    header: Vec<String>,
    content: Vec<Vec<String>>,
    limits: Vec<usize>,
    description: String,
}

impl Table {
    pub fn from_parts(
        header: Vec<String>,
        content: Vec<Vec<String>>,
        description: impl Into<String>,
    ) -> Self {
        let width = header.len();
        let content = content
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        let mut table = Self {
            header,
            content,
            limits: Vec::new(),
            description: description.into(),
        };
        table.calc_limits();
        table
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn content(&self) -> &[Vec<String>] {
        &self.content
    }

    pub fn row(&self, index: usize) -> Option<&[String]> {
        self.content.get(index).map(Vec::as_slice)
    }

    pub fn limits(&self) -> &[usize] {
        &self.limits
    }

    pub fn nrows(&self) -> usize {
        self.content.len()
    }

    pub fn ncols(&self) -> usize {
        self.header.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn find_column(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|column| column == name)
    }

    pub fn require_column(&self, name: &str) -> TableResult<usize> {
        self.find_column(name)
            .ok_or_else(|| TableError::UnknownColumn(name.to_owned()))
    }

    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &str> + '_ {
        self.content
            .iter()
            .filter_map(move |row| row.get(index).map(String::as_str))
    }

    /// First row after `from` holding `needle` in any cell, or `from` when
    /// nothing matches.
    pub fn search(&self, from: usize, needle: &str) -> usize {
        let start = from.saturating_add(1);
        (start..self.nrows())
            .find(|index| row_contains(&self.content[*index], needle))
            .unwrap_or(from)
    }

    /// Last row before `from` holding `needle` in any cell, or `from` when
    /// nothing matches.
    pub fn search_reverse(&self, from: usize, needle: &str) -> usize {
        (0..from.min(self.nrows()))
            .rev()
            .find(|index| row_contains(&self.content[*index], needle))
            .unwrap_or(from)
    }

    pub fn sort_by_column(&mut self, index: usize, direction: SortDirection) {
        if index >= self.ncols() {
            tracing::warn!(index, ncols = self.ncols(), "sort column out of range");
            return;
        }

        self.content.sort_by(|a, b| {
            let ordering = compare_cells(&a[index], &b[index]);
            match direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
        tracing::debug!(index, direction = direction.label(), "rows sorted");
    }

    fn calc_limits(&mut self) {
        let mut limits = self
            .header
            .iter()
            .map(|cell| cell.width())
            .collect::<Vec<_>>();
        for row in &self.content {
            for (limit, cell) in limits.iter_mut().zip(row) {
                *limit = (*limit).max(cell.width());
            }
        }
        self.limits = limits;
    }
}

fn row_contains(row: &[String], needle: &str) -> bool {
    row.iter().any(|cell| cell.contains(needle))
}

/// Numeric when both cells parse as `f64`, lexical otherwise. Mixed columns
/// rank empty cells first, then numbers, then other text, which keeps the
/// order total.
pub fn compare_cells(a: &str, b: &str) -> Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.total_cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) if b.is_empty() => Ordering::Greater,
        (Err(_), Ok(_)) if a.is_empty() => Ordering::Less,
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub lines: usize,
    pub skipped: usize,
    pub rejected: usize,
    pub accepted: usize,
}

/// Accumulates rows from one or more line sources into a [`Table`].
///
/// Call [`TableBuilder::start_source`] before the lines of every source; the
/// first post-skip line of each source is its header. The first source's
/// header becomes the table header and later sources are mapped onto it by
/// column name.
#[derive(Debug)]
pub struct TableBuilder {
    options: TableOptions,
    tokenizer: Tokenizer,
    description: String,
    header: Option<Vec<String>>,
    content: Vec<Vec<String>>,
    reader: Option<RowReader>,
    skip_remaining: usize,
    head_remaining: Option<usize>,
    exhausted: bool,
    stats: IngestStats,
}

impl TableBuilder {
    pub fn new(options: TableOptions, description: impl Into<String>) -> Self {
        let delimiter = options.delimiter.unwrap_or(DEFAULT_DELIMITER);
        let tokenizer = Tokenizer::new(delimiter).with_cell_limit(options.cell_limit);
        let head_remaining = options.head;
        Self {
            options,
            tokenizer,
            description: description.into(),
            header: None,
            content: Vec::new(),
            reader: None,
            skip_remaining: 0,
            head_remaining,
            exhausted: false,
            stats: IngestStats::default(),
        }
    }

    pub fn delimiter(&self) -> char {
        self.tokenizer.delimiter()
    }

    pub fn stats(&self) -> IngestStats {
        self.stats
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn start_source(&mut self) {
        let requested = if !self.options.columns.is_empty() {
            self.options.columns.clone()
        } else {
            self.header.clone().unwrap_or_default()
        };
        self.reader = Some(RowReader::new(self.tokenizer.clone(), requested));
        self.skip_remaining = self.options.skip;
    }

    /// Feeds one line of the current source. Returns `Ok(false)` once the
    /// head cap is reached and no further input is wanted.
    pub fn push_line(&mut self, line: &str) -> TableResult<bool> {
        if self.exhausted {
            return Ok(false);
        }
        self.stats.lines += 1;

        if self.skip_remaining > 0 {
            self.skip_remaining -= 1;
            self.stats.skipped += 1;
            return Ok(true);
        }

        if self.reader.is_none() {
            self.start_source();
        }
        let Some(reader) = self.reader.as_mut() else {
            return Ok(true);
        };

        let Some(row) = reader.parse_line(line)? else {
            if self.header.is_none() {
                let header = reader.header().to_vec();
                tracing::info!(columns = header.len(), "table header established");
                self.header = Some(header);
            }
            return Ok(true);
        };

        if !self.accepts(&row) {
            self.stats.rejected += 1;
            return Ok(true);
        }

        if let Some(remaining) = self.head_remaining.as_mut() {
            if *remaining == 0 {
                self.exhausted = true;
                return Ok(false);
            }
            *remaining -= 1;
        }

        self.content.push(row);
        self.stats.accepted += 1;

        if self.head_remaining == Some(0) {
            self.exhausted = true;
            tracing::debug!(rows = self.content.len(), "head cap reached");
            return Ok(false);
        }
        Ok(true)
    }

    pub fn ingest<I, S>(&mut self, lines: I) -> TableResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.start_source();
        for line in lines {
            if !self.push_line(line.as_ref())? {
                break;
            }
        }
        Ok(())
    }

    pub fn finish(self) -> Table {
        let mut content = self.content;
        if let Some(tail) = self.options.tail {
            let dropped = content.len().saturating_sub(tail);
            if dropped > 0 {
                content.drain(..dropped);
                tracing::debug!(dropped, "tail truncation applied");
            }
        }

        tracing::info!(
            lines = self.stats.lines,
            skipped = self.stats.skipped,
            rejected = self.stats.rejected,
            rows = content.len(),
            "ingestion finished"
        );
        Table::from_parts(self.header.unwrap_or_default(), content, self.description)
    }

    fn accepts(&self, row: &[String]) -> bool {
        let needs_line = !self.options.excludes.is_empty() || !self.options.matches.is_empty();
        if needs_line {
            let delimiter = self.tokenizer.delimiter().to_string();
            let line = row.join(delimiter.as_str());
            if self
                .options
                .excludes
                .iter()
                .any(|pattern| line.contains(pattern.as_str()))
            {
                return false;
            }
            if !self
                .options
                .matches
                .iter()
                .all(|pattern| line.contains(pattern.as_str()))
            {
                return false;
            }
        }

        match (&self.options.expr, &self.header) {
            (Some(expr), Some(header)) => expr.admits(&RowScope { header, row }),
            _ => true,
        }
    }
}

pub fn ingest<I, S>(lines: I, options: TableOptions, description: &str) -> TableResult<Table>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut builder = TableBuilder::new(options, description);
    builder.ingest(lines)?;
    Ok(builder.finish())
}
