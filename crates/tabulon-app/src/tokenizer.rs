// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Single-pass line splitter.
//!
//! A cell is quoted only when the quote character sits exactly at the start
//! of the cell. A quoted cell ends at the first `quote + delimiter` pair; if
//! there is none, at the next lone quote; if there is no quote at all, at the
//! end of the line. Doubled quotes are not unescaped.

pub const DEFAULT_DELIMITER: char = ',';
pub const DEFAULT_QUOTE: char = '"';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tokenizer {
    delimiter: char,
    quote: char,
    cell_limit: usize,
    quoted_delimiter: String,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(DEFAULT_DELIMITER)
    }
}

impl Tokenizer {
    pub fn new(delimiter: char) -> Self {
        Self::with_quote(delimiter, DEFAULT_QUOTE)
    }

    pub fn with_quote(delimiter: char, quote: char) -> Self {
        Self {
            delimiter,
            quote,
            cell_limit: 0,
            quoted_delimiter: format!("{quote}{delimiter}"),
        }
    }

    /// Caps every emitted cell at `limit` characters; 0 disables the cap.
    pub fn with_cell_limit(mut self, limit: usize) -> Self {
        self.cell_limit = limit;
        self
    }

    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    pub fn tokenize(&self, line: &str) -> Vec<String> {
        let mut row = Vec::new();
        let mut rest = line;

        while !rest.is_empty() {
            if let Some(body) = rest.strip_prefix(self.quote) {
                if let Some(end) = body.find(self.quoted_delimiter.as_str()) {
                    self.push_cell(&mut row, &body[..end]);
                    rest = &body[end + self.quoted_delimiter.len()..];
                } else if let Some(end) = body.find(self.quote) {
                    self.push_cell(&mut row, &body[..end]);
                    rest = &body[end + self.quote.len_utf8()..];
                } else {
                    // unterminated quote
                    self.push_cell(&mut row, body);
                    rest = "";
                }
            } else if let Some(end) = rest.find(self.delimiter) {
                self.push_cell(&mut row, &rest[..end]);
                rest = &rest[end + self.delimiter.len_utf8()..];
            } else {
                self.push_cell(&mut row, rest);
                rest = "";
            }
        }

        row
    }

    fn push_cell(&self, row: &mut Vec<String>, cell: &str) {
        row.push(truncate_chars(cell, self.cell_limit).to_owned());
    }
}

fn truncate_chars(cell: &str, limit: usize) -> &str {
    if limit == 0 {
        return cell;
    }
    match cell.char_indices().nth(limit) {
        Some((index, _)) => &cell[..index],
        None => cell,
    }
}
