// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    /// A requested output column is absent from a source header.
    ColumnNotFound(String),
    /// Header resolution produced no columns at all.
    NoColumns,
    /// A lookup by name on a loaded table failed.
    UnknownColumn(String),
}

impl std::fmt::Display for TableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ColumnNotFound(name) => write!(f, "specified column not found: {name}"),
            Self::NoColumns => f.write_str("none of the specified columns were found in the data"),
            Self::UnknownColumn(name) => write!(f, "no such column: {name}"),
        }
    }
}

impl std::error::Error for TableError {}

pub type TableResult<T> = std::result::Result<T, TableError>;
