// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use tabulon_app::{
    Expr, ScreenSize, SortDirection, Table, TableError, TableOptions, Tokenizer, ViewerCommand,
    ViewerState, ingest,
};
use tabulon_testkit::{TRADE_COLUMNS, TradeFaker, ragged_document, write_fixture};

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_owned()).collect()
}

#[test]
fn ragged_file_loads_end_to_end() -> Result<()> {
    let (_dir, path) = write_fixture("ragged.csv", ragged_document())?;
    let table = Table::read_files(&[path], TableOptions::default())?;

    assert_eq!(table.description(), "ragged.csv");
    assert_eq!(table.header(), strings(&["h1", "h2", "h3"]).as_slice());
    assert_eq!(
        table.content(),
        &[
            strings(&["a", "b", "c"]),
            strings(&["x,y", "z", "w"]),
            strings(&["p", "q", ""]),
        ]
    );
    Ok(())
}

#[test]
fn head_and_tail_on_generated_trades() -> Result<()> {
    let document = TradeFaker::new(5).document(40, ',');
    let (_dir, path) = write_fixture("trades.csv", &document)?;
    let all = Table::read_files(std::slice::from_ref(&path), TableOptions::default())?;
    assert_eq!(all.nrows(), 40);
    assert_eq!(all.ncols(), TRADE_COLUMNS.len());

    let head = Table::read_files(
        std::slice::from_ref(&path),
        TableOptions {
            head: Some(1),
            ..TableOptions::default()
        },
    )?;
    assert_eq!(head.content(), &all.content()[..1]);

    let tail = Table::read_files(
        &[path],
        TableOptions {
            tail: Some(1),
            ..TableOptions::default()
        },
    )?;
    assert_eq!(tail.content(), &all.content()[39..]);
    Ok(())
}

#[test]
fn tsv_and_psv_delimiters_are_guessed() -> Result<()> {
    let mut faker = TradeFaker::new(8);
    let (_tsv_dir, tsv) = write_fixture("trades.tsv", &faker.document(5, '\t'))?;
    let (_psv_dir, psv) = write_fixture("trades.psv", &faker.document(5, '|'))?;

    for path in [tsv, psv] {
        let table = Table::read_files(&[path], TableOptions::default())?;
        assert_eq!(table.ncols(), TRADE_COLUMNS.len());
        assert_eq!(table.nrows(), 5);
        assert!(table.content().iter().all(|row| !row[6].is_empty()));
    }
    Ok(())
}

#[test]
fn multiple_files_share_one_header() -> Result<()> {
    let (_a_dir, first) = write_fixture("a.csv", "id,name\n1,ann\n")?;
    let (_b_dir, second) = write_fixture("b.csv", "name,id\nbob,2\n")?;

    let table = Table::read_files(&[first, second], TableOptions::default())?;
    assert_eq!(table.description(), "a.csv");
    assert_eq!(
        table.content(),
        &[strings(&["1", "ann"]), strings(&["2", "bob"])]
    );
    Ok(())
}

#[test]
fn skip_applies_to_every_file() -> Result<()> {
    let (_a_dir, first) = write_fixture("a.csv", "# export 1\nid\n1\n")?;
    let (_b_dir, second) = write_fixture("b.csv", "# export 2\nid\n2\n")?;

    let options = TableOptions {
        skip: 1,
        ..TableOptions::default()
    };
    let table = Table::read_files(&[first, second], options)?;
    assert_eq!(table.content(), &[strings(&["1"]), strings(&["2"])]);
    Ok(())
}

#[test]
fn missing_file_is_fatal_with_path_context() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let missing = dir.path().join("absent.csv");
    let error = Table::read_files(&[missing], TableOptions::default())
        .expect_err("missing file should fail");
    assert!(format!("{error:#}").contains("absent.csv"));
    Ok(())
}

#[test]
fn missing_requested_column_is_typed_error() -> Result<()> {
    let (_dir, path) = write_fixture("ragged.csv", ragged_document())?;
    let options = TableOptions {
        columns: strings(&["h1", "nope"]),
        ..TableOptions::default()
    };
    let error = Table::read_files(&[path], options).expect_err("should fail");
    assert_eq!(
        error.downcast_ref::<TableError>(),
        Some(&TableError::ColumnNotFound("nope".to_owned()))
    );
    Ok(())
}

#[test]
fn column_projection_is_independent_of_filter_and_sort() -> Result<()> {
    let document = TradeFaker::new(21).document(60, ',');
    let lines = document.lines().collect::<Vec<_>>();

    let full = ingest(lines.iter().copied(), TableOptions::default(), "full")?;
    let mut projected = ingest(
        lines.iter().copied(),
        TableOptions {
            columns: strings(&["price", "id"]),
            expr: Some(Expr::parse("side == 'BUY'")?),
            ..TableOptions::default()
        },
        "projected",
    )?;
    projected.sort_by_column(0, SortDirection::Desc);

    let price = full.require_column("price")?;
    let id = full.require_column("id")?;
    let side = full.require_column("side")?;
    for row in projected.content() {
        let source = full
            .content()
            .iter()
            .find(|candidate| candidate[id] == row[1])
            .expect("source row");
        assert_eq!(row[0], source[price]);
        assert_eq!(source[side], "BUY");
    }
    Ok(())
}

#[test]
fn emitted_rows_retokenize_to_the_same_cells() -> Result<()> {
    let document = TradeFaker::new(13).document(30, '|');
    let table = ingest(
        document.lines(),
        TableOptions {
            delimiter: Some('|'),
            ..TableOptions::default()
        },
        "trades",
    )?;

    let tokenizer = Tokenizer::new('|');
    for row in table.content() {
        let line = row.join("|");
        assert_eq!(&tokenizer.tokenize(&line), row);
    }
    Ok(())
}

#[test]
fn sorting_twice_matches_sorting_once() -> Result<()> {
    let document = TradeFaker::new(34).document(80, ',');
    let mut once = ingest(document.lines(), TableOptions::default(), "trades")?;
    for column in 0..once.ncols() {
        for direction in [SortDirection::Asc, SortDirection::Desc] {
            once.sort_by_column(column, direction);
            let mut twice = once.clone();
            twice.sort_by_column(column, direction);
            assert_eq!(once.content(), twice.content(), "column {column} {direction:?}");
        }
    }
    Ok(())
}

#[test]
fn viewer_search_miss_does_not_move() -> Result<()> {
    let document = TradeFaker::new(55).document(25, ',');
    let mut table = ingest(document.lines(), TableOptions::default(), "trades")?;
    let mut state = ViewerState::new(ScreenSize::new(120, 20));

    state.dispatch(ViewerCommand::MoveRow(7), &mut table);
    state.dispatch(ViewerCommand::OpenSearch, &mut table);
    for ch in "no such needle".chars() {
        state.dispatch(ViewerCommand::InputChar(ch), &mut table);
    }
    state.dispatch(ViewerCommand::SubmitSearch, &mut table);
    assert_eq!(state.yview, 7);

    state.dispatch(ViewerCommand::RepeatSearchReverse, &mut table);
    assert_eq!(state.yview, 7);
    Ok(())
}
