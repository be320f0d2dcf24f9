// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::error::{TableError, TableResult};
use crate::tokenizer::Tokenizer;

/// Projection from output column position to source cell position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    indices: Vec<usize>,
}

impl ColumnMap {
    pub fn identity(width: usize) -> Self {
        Self {
            indices: (0..width).collect(),
        }
    }

    /// Resolves `requested` against a discovered header row. An empty request
    /// adopts the discovered header verbatim. Every requested name must be
    /// present; the first matching source column wins.
    pub fn resolve(
        discovered: &[String],
        requested: &[String],
    ) -> TableResult<(Vec<String>, ColumnMap)> {
        if requested.is_empty() {
            if discovered.is_empty() {
                return Err(TableError::NoColumns);
            }
            return Ok((discovered.to_vec(), Self::identity(discovered.len())));
        }

        let mut header = Vec::with_capacity(requested.len());
        let mut indices = Vec::with_capacity(requested.len());
        for name in requested {
            let index = discovered
                .iter()
                .position(|candidate| candidate == name)
                .ok_or_else(|| TableError::ColumnNotFound(name.clone()))?;
            header.push(name.clone());
            indices.push(index);
        }

        if header.is_empty() {
            return Err(TableError::NoColumns);
        }
        Ok((header, Self { indices }))
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Projects a tokenized row; source cells past the end read as empty.
    pub fn project(&self, row: &[String]) -> Vec<String> {
        self.indices
            .iter()
            .map(|index| row.get(*index).cloned().unwrap_or_default())
            .collect()
    }
}

/// Tokenizes lines of one source. The first line parsed becomes the header
/// and fixes the column map; every later line is normalized through it.
#[derive(Debug, Clone)]
pub struct RowReader {
    tokenizer: Tokenizer,
    requested: Vec<String>,
    header: Vec<String>,
    map: Option<ColumnMap>,
}

impl RowReader {
    pub fn new(tokenizer: Tokenizer, requested: Vec<String>) -> Self {
        Self {
            tokenizer,
            requested,
            header: Vec::new(),
            map: None,
        }
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Returns `Ok(None)` for the header line and the normalized row for
    /// every line after it.
    pub fn parse_line(&mut self, line: &str) -> TableResult<Option<Vec<String>>> {
        let row = self.tokenizer.tokenize(line);
        match &self.map {
            Some(map) => Ok(Some(map.project(&row))),
            None => {
                let (header, map) = ColumnMap::resolve(&row, &self.requested)?;
                tracing::debug!(columns = header.len(), "header resolved");
                self.header = header;
                self.map = Some(map);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ColumnMap, RowReader};
    use crate::error::TableError;
    use crate::tokenizer::Tokenizer;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| (*value).to_owned()).collect()
    }

    #[test]
    fn empty_request_is_identity() {
        let (header, map) = ColumnMap::resolve(&strings(&["a", "b", "c"]), &[]).expect("resolve");
        assert_eq!(header, strings(&["a", "b", "c"]));
        assert_eq!(map.indices(), &[0, 1, 2]);
    }

    #[test]
    fn requested_columns_reorder() {
        let (header, map) =
            ColumnMap::resolve(&strings(&["c1", "c2", "c3"]), &strings(&["c2", "c1"]))
                .expect("resolve");
        assert_eq!(header, strings(&["c2", "c1"]));
        assert_eq!(map.project(&strings(&["x", "y", "z"])), strings(&["y", "x"]));
    }

    #[test]
    fn first_occurrence_wins() {
        let (_, map) = ColumnMap::resolve(&strings(&["a", "dup", "dup"]), &strings(&["dup"]))
            .expect("resolve");
        assert_eq!(map.indices(), &[1]);
    }

    #[test]
    fn missing_requested_column_is_an_error() {
        let error = ColumnMap::resolve(&strings(&["a", "b"]), &strings(&["a", "nope"]))
            .expect_err("missing column should fail");
        assert_eq!(error, TableError::ColumnNotFound("nope".to_owned()));
        assert!(error.to_string().contains("nope"));
    }

    #[test]
    fn empty_header_is_an_error() {
        let error = ColumnMap::resolve(&[], &[]).expect_err("no columns");
        assert_eq!(error, TableError::NoColumns);
    }

    #[test]
    fn short_rows_pad_and_long_rows_drop() {
        let map = ColumnMap::identity(3);
        assert_eq!(map.project(&strings(&["a"])), strings(&["a", "", ""]));
        assert_eq!(
            map.project(&strings(&["a", "b", "c", "d"])),
            strings(&["a", "b", "c"]),
        );
    }

    #[test]
    fn reader_consumes_header_then_normalizes() {
        let mut reader = RowReader::new(Tokenizer::default(), Vec::new());
        assert_eq!(reader.parse_line("h1,h2,h3").expect("header"), None);
        assert_eq!(reader.header(), strings(&["h1", "h2", "h3"]).as_slice());

        let cases = [
            ("content1,content2,content3", vec!["content1", "content2", "content3"]),
            ("short1,short2", vec!["short1", "short2", ""]),
            ("long1,long2,long3,long4", vec!["long1", "long2", "long3"]),
            (r#""quote1","quote2","quote3","quote4""#, vec!["quote1", "quote2", "quote3"]),
            (r#"long1,"long2","long3""#, vec!["long1", "long2", "long3"]),
            (r#"long1,"long2,long3"#, vec!["long1", "long2,long3", ""]),
        ];
        for (line, expected) in cases {
            let row = reader.parse_line(line).expect("row");
            assert_eq!(row, Some(strings(&expected)), "line {line:?}");
        }
        assert_eq!(reader.header().len(), 3);
    }

    #[test]
    fn reader_projects_requested_columns() {
        let mut reader = RowReader::new(Tokenizer::default(), strings(&["h3", "h1"]));
        reader.parse_line("h1,h2,h3").expect("header");
        assert_eq!(reader.header(), strings(&["h3", "h1"]).as_slice());
        assert_eq!(
            reader.parse_line("a,b,c").expect("row"),
            Some(strings(&["c", "a"])),
        );
        assert_eq!(
            reader.parse_line("a").expect("row"),
            Some(strings(&["", "a"])),
        );
    }

    #[test]
    fn reader_surfaces_missing_column_on_header() {
        let mut reader = RowReader::new(Tokenizer::default(), strings(&["zzz"]));
        let error = reader.parse_line("a,b").expect_err("should fail");
        assert_eq!(error, TableError::ColumnNotFound("zzz".to_owned()));
    }
}
