// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::HashSet;
use std::io::{self, Write};
use tabulon_app::Table;
use unicode_width::UnicodeWidthStr;

/// Boxed text layout: every cell padded to its column limit and closed with
/// ` |`, the header followed by a dashed rule.
pub fn write_plaintext<W: Write>(out: &mut W, table: &Table) -> io::Result<()> {
    write_padded_row(out, table.header(), table.limits())?;

    let mut rule = String::new();
    for limit in table.limits() {
        rule.extend(std::iter::repeat_n('-', *limit));
        rule.push_str("-+");
    }
    writeln!(out, "{rule}")?;

    for row in table.content() {
        write_padded_row(out, row, table.limits())?;
    }
    Ok(())
}

fn write_padded_row<W: Write>(out: &mut W, row: &[String], limits: &[usize]) -> io::Result<()> {
    let mut line = String::new();
    for (cell, limit) in row.iter().zip(limits) {
        line.push_str(cell);
        line.extend(std::iter::repeat_n(' ', limit.saturating_sub(cell.width())));
        line.push_str(" |");
    }
    writeln!(out, "{line}")
}

/// Header and rows joined by `delimiter`. Cells are written verbatim.
pub fn write_delimited<W: Write>(out: &mut W, table: &Table, delimiter: char) -> io::Result<()> {
    let separator = delimiter.to_string();
    writeln!(out, "{}", table.header().join(separator.as_str()))?;
    for row in table.content() {
        writeln!(out, "{}", row.join(separator.as_str()))?;
    }
    Ok(())
}

pub fn write_list<W: Write>(out: &mut W, table: &Table, column: usize) -> io::Result<()> {
    for value in table.column_values(column) {
        writeln!(out, "{value}")?;
    }
    Ok(())
}

/// Distinct values of one column in first-seen order.
pub fn write_unique<W: Write>(out: &mut W, table: &Table, column: usize) -> io::Result<()> {
    let mut seen = HashSet::new();
    for value in table.column_values(column) {
        if seen.insert(value) {
            writeln!(out, "{value}")?;
        }
    }
    Ok(())
}
