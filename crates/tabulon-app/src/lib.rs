// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod columns;
pub mod error;
pub mod expr;
pub mod loader;
pub mod table;
pub mod tokenizer;
pub mod viewer;

pub use columns::{ColumnMap, RowReader};
pub use error::{TableError, TableResult};
pub use expr::{Expr, ExprError, RowScope, Scope, Value};
pub use loader::{STDIN_DESCRIPTION, guess_delimiter};
pub use table::{IngestStats, SortDirection, Table, TableBuilder, TableOptions, compare_cells, ingest};
pub use tokenizer::Tokenizer;
pub use viewer::{ScreenSize, ViewerCommand, ViewerEvent, ViewerMode, ViewerState};
