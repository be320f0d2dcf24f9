// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod render;

use anyhow::{Context, Result, bail};
use clap::Parser;
use config::Config;
use std::io::{self, Write};
use std::path::PathBuf;
use tabulon_app::{Expr, SortDirection, Table, TableOptions};

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

/// View and reshape CSV, TSV and PSV files.
#[derive(Debug, Clone, Parser)]
#[command(name = "tabulon", version)]
struct Cli {
    /// Input files, loaded in order into one table
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Read from standard input instead of files
    #[arg(short = 'S', long, conflicts_with = "files")]
    stdin: bool,

    /// Truncate every cell to N characters (0 = unlimited)
    #[arg(short = 'L', long = "limit", value_name = "N")]
    limit: Option<usize>,

    /// Keep only rows containing TEXT (repeatable; all must match)
    #[arg(short = 'm', long = "match", value_name = "TEXT")]
    matches: Vec<String>,

    /// Drop rows containing TEXT (repeatable)
    #[arg(short = 'x', long = "exclude", value_name = "TEXT")]
    excludes: Vec<String>,

    /// Keep only rows where EXPR is not false, e.g. `price > 10 and side == "BUY"`
    #[arg(short = 'e', long, value_name = "EXPR")]
    expr: Option<String>,

    /// Print an aligned plain-text table
    #[arg(short = 'p', long)]
    plain: bool,

    /// Print delimited output
    #[arg(short = 'C', long)]
    csv: bool,

    /// Skip N leading lines of every input
    #[arg(short = 's', long, value_name = "N", default_value_t = 0)]
    skip: usize,

    /// Input delimiter (default: guessed from the first file name)
    #[arg(short = 'd', long, value_name = "CHAR", value_parser = parse_delimiter)]
    delimiter: Option<char>,

    /// Output delimiter for --csv
    #[arg(short = 'D', long = "output-delimiter", value_name = "CHAR", value_parser = parse_delimiter)]
    output_delimiter: Option<char>,

    /// Keep the first N matching rows
    #[arg(short = 'H', long, value_name = "N")]
    head: Option<usize>,

    /// Keep the last N matching rows
    #[arg(short = 't', long, value_name = "N")]
    tail: Option<usize>,

    /// Print the values of one column
    #[arg(short = 'l', long = "list-column", value_name = "COLUMN")]
    list_column: Option<String>,

    /// Print the distinct values of one column
    #[arg(short = 'u', long, value_name = "COLUMN")]
    unique: Option<String>,

    /// Input is tab separated
    #[arg(long, conflicts_with_all = ["psv", "delimiter"])]
    tsv: bool,

    /// Input is pipe separated
    #[arg(long, conflicts_with = "delimiter")]
    psv: bool,

    /// Sort rows by COLUMN before output
    #[arg(long = "sort-column", value_name = "COLUMN")]
    sort_column: Option<String>,

    /// Sort descending
    #[arg(long, requires = "sort_column")]
    reverse: bool,

    /// Output only these columns, in this order (repeatable or comma separated)
    #[arg(short = 'c', long = "columns", value_name = "COLUMN", value_delimiter = ',')]
    columns: Vec<String>,

    /// Use a specific config path
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print the resolved config path and exit
    #[arg(long)]
    print_config_path: bool,

    /// Print a config template and exit
    #[arg(long)]
    print_example_config: bool,
}

fn parse_delimiter(raw: &str) -> Result<char, String> {
    if raw == "\\t" {
        return Ok('\t');
    }
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Ok(ch),
        _ => Err(format!("delimiter must be a single character, got {raw:?}")),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Source {
    Stdin,
    Files(Vec<PathBuf>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum OutputMode {
    List(String),
    Unique(String),
    Delimited,
    Plain,
    Interactive,
}

/// Everything validated up front, before any input is read or the terminal
/// is touched.
#[derive(Debug, Clone)]
struct RunPlan {
    source: Source,
    options: TableOptions,
    sort: Option<(String, SortDirection)>,
    output: OutputMode,
    output_delimiter: char,
}

impl RunPlan {
    fn from_cli(cli: &Cli, config: &Config) -> Result<Self> {
        if cli.head.is_some() && cli.tail.is_some() {
            bail!("both head and tail specified; they are mutually exclusive");
        }

        let source = if cli.stdin {
            Source::Stdin
        } else if cli.files.is_empty() {
            bail!("no input files given; pass one or more paths or use --stdin");
        } else {
            Source::Files(cli.files.clone())
        };

        let expr = cli
            .expr
            .as_deref()
            .map(Expr::parse)
            .transpose()
            .context("invalid --expr")?;

        let delimiter = if cli.tsv {
            Some('\t')
        } else if cli.psv {
            Some('|')
        } else {
            cli.delimiter.or_else(|| config.input_delimiter())
        };

        let options = TableOptions {
            skip: cli.skip,
            head: cli.head,
            tail: cli.tail,
            matches: cli.matches.clone(),
            excludes: cli.excludes.clone(),
            expr,
            columns: cli.columns.clone(),
            delimiter,
            cell_limit: cli.limit.unwrap_or_else(|| config.cell_limit()),
        };

        let output = if let Some(column) = &cli.list_column {
            OutputMode::List(column.clone())
        } else if let Some(column) = &cli.unique {
            OutputMode::Unique(column.clone())
        } else if cli.csv {
            OutputMode::Delimited
        } else if cli.plain || source == Source::Stdin {
            OutputMode::Plain
        } else {
            OutputMode::Interactive
        };

        let direction = if cli.reverse {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        };

        Ok(Self {
            source,
            options,
            sort: cli.sort_column.clone().map(|column| (column, direction)),
            output,
            output_delimiter: cli
                .output_delimiter
                .unwrap_or_else(|| config.output_delimiter()),
        })
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::default_path()?,
    };

    if cli.print_config_path {
        println!("{}", config_path.display());
        return Ok(());
    }

    if cli.print_example_config {
        print!("{}", Config::example_config(&config_path));
        return Ok(());
    }

    let config = Config::load(&config_path).with_context(|| {
        format!(
            "load config {}; run `tabulon --print-example-config` to generate a template",
            config_path.display()
        )
    })?;
    let _log_guard = logging::init_logging()?;

    let plan = RunPlan::from_cli(&cli, &config)?;
    tracing::debug!(output = ?plan.output, source = ?plan.source, "run plan ready");
    let table = load_table(&plan)?;
    execute(&plan, table)
}

fn load_table(plan: &RunPlan) -> Result<Table> {
    match &plan.source {
        Source::Stdin => Table::read_stdin(plan.options.clone()),
        Source::Files(paths) => Table::read_files(paths, plan.options.clone()),
    }
}

fn execute(plan: &RunPlan, mut table: Table) -> Result<()> {
    if let Some((column, direction)) = &plan.sort {
        let index = table.require_column(column)?;
        table.sort_by_column(index, *direction);
    }

    match &plan.output {
        OutputMode::Interactive => tabulon_tui::run_viewer(&mut table),
        OutputMode::List(column) => {
            let index = table.require_column(column)?;
            emit(|out| render::write_list(out, &table, index))
        }
        OutputMode::Unique(column) => {
            let index = table.require_column(column)?;
            emit(|out| render::write_unique(out, &table, index))
        }
        OutputMode::Delimited => {
            emit(|out| render::write_delimited(out, &table, plan.output_delimiter))
        }
        OutputMode::Plain => emit(|out| render::write_plaintext(out, &table)),
    }
}

/// Writes to stdout. A closed downstream pipe ends output quietly.
fn emit<F>(write: F) -> Result<()>
where
    F: FnOnce(&mut io::BufWriter<io::StdoutLock<'static>>) -> io::Result<()>,
{
    let mut out = io::BufWriter::new(io::stdout().lock());
    let result = write(&mut out).and_then(|()| out.flush());
    match result {
        Err(error) if error.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other.context("write output"),
    }
}

#[cfg(test)]
mod tests {
    use super::{Cli, OutputMode, RunPlan, Source};
    use crate::config::Config;
    use anyhow::Result;
    use clap::Parser;
    use std::path::PathBuf;
    use tabulon_app::SortDirection;

    fn plan(args: &[&str]) -> Result<RunPlan> {
        let cli = Cli::try_parse_from(std::iter::once("tabulon").chain(args.iter().copied()))?;
        RunPlan::from_cli(&cli, &Config::default())
    }

    #[test]
    fn defaults_to_interactive_file_view() -> Result<()> {
        let plan = plan(&["trades.csv"])?;
        assert_eq!(plan.source, Source::Files(vec![PathBuf::from("trades.csv")]));
        assert_eq!(plan.output, OutputMode::Interactive);
        assert_eq!(plan.output_delimiter, ',');
        assert_eq!(plan.options.delimiter, None);
        assert_eq!(plan.options.cell_limit, 0);
        assert!(plan.sort.is_none());
        Ok(())
    }

    #[test]
    fn stdin_renders_plain_by_default() -> Result<()> {
        let plan = plan(&["-S"])?;
        assert_eq!(plan.source, Source::Stdin);
        assert_eq!(plan.output, OutputMode::Plain);
        Ok(())
    }

    #[test]
    fn render_mode_precedence() -> Result<()> {
        assert_eq!(
            plan(&["-l", "a", "-u", "b", "-C", "-p", "f.csv"])?.output,
            OutputMode::List("a".to_owned())
        );
        assert_eq!(
            plan(&["-u", "b", "-C", "-p", "f.csv"])?.output,
            OutputMode::Unique("b".to_owned())
        );
        assert_eq!(plan(&["-C", "-p", "f.csv"])?.output, OutputMode::Delimited);
        assert_eq!(plan(&["-p", "f.csv"])?.output, OutputMode::Plain);
        Ok(())
    }

    #[test]
    fn head_and_tail_are_mutually_exclusive() {
        let error = plan(&["-H", "3", "-t", "2", "f.csv"]).expect_err("should fail");
        assert!(error.to_string().contains("mutually exclusive"));
    }

    #[test]
    fn negative_counts_are_rejected_by_the_parser() {
        assert!(plan(&["--head", "-1", "f.csv"]).is_err());
        assert!(plan(&["--tail=-4", "f.csv"]).is_err());
    }

    #[test]
    fn missing_input_is_an_error() {
        let error = plan(&[]).expect_err("should fail");
        assert!(error.to_string().contains("no input files"));
    }

    #[test]
    fn stdin_conflicts_with_files() {
        assert!(plan(&["-S", "f.csv"]).is_err());
    }

    #[test]
    fn filters_and_columns_flow_into_options() -> Result<()> {
        let plan = plan(&[
            "-m", "BUY", "-m", "XNAS", "-x", "void", "-c", "price,id", "-c", "venue", "-s", "2",
            "-L", "8", "-H", "5", "f.csv",
        ])?;
        assert_eq!(plan.options.matches, vec!["BUY", "XNAS"]);
        assert_eq!(plan.options.excludes, vec!["void"]);
        assert_eq!(plan.options.columns, vec!["price", "id", "venue"]);
        assert_eq!(plan.options.skip, 2);
        assert_eq!(plan.options.cell_limit, 8);
        assert_eq!(plan.options.head, Some(5));
        assert_eq!(plan.options.tail, None);
        Ok(())
    }

    #[test]
    fn expression_is_parsed_during_planning() -> Result<()> {
        let plan = plan(&["-e", "price > 10", "f.csv"])?;
        assert!(plan.options.expr.is_some());

        let error = super::RunPlan::from_cli(
            &Cli::try_parse_from(["tabulon", "-e", "price >", "f.csv"])?,
            &Config::default(),
        )
        .expect_err("bad expression");
        assert!(format!("{error:#}").contains("invalid --expr"));
        Ok(())
    }

    #[test]
    fn delimiter_flags() -> Result<()> {
        assert_eq!(plan(&["--tsv", "f"])?.options.delimiter, Some('\t'));
        assert_eq!(plan(&["--psv", "f"])?.options.delimiter, Some('|'));
        assert_eq!(plan(&["-d", ";", "f"])?.options.delimiter, Some(';'));
        assert_eq!(plan(&["-d", "\\t", "f"])?.options.delimiter, Some('\t'));
        assert_eq!(plan(&["-D", "|", "-C", "f"])?.output_delimiter, '|');
        assert!(plan(&["-d", ";;", "f"]).is_err());
        assert!(plan(&["--tsv", "--psv", "f"]).is_err());
        Ok(())
    }

    #[test]
    fn config_supplies_defaults_cli_overrides() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        std::fs::write(
            &path,
            "version = 1\n[input]\ndelimiter = \"|\"\ncell_limit = 4\n[output]\ndelimiter = \";\"\n",
        )?;
        let config = Config::load(&path)?;

        let cli = Cli::try_parse_from(["tabulon", "f.csv"])?;
        let from_config = RunPlan::from_cli(&cli, &config)?;
        assert_eq!(from_config.options.delimiter, Some('|'));
        assert_eq!(from_config.options.cell_limit, 4);
        assert_eq!(from_config.output_delimiter, ';');

        let cli = Cli::try_parse_from(["tabulon", "-d", ",", "-L", "0", "-D", "\t", "f.csv"])?;
        let overridden = RunPlan::from_cli(&cli, &config)?;
        assert_eq!(overridden.options.delimiter, Some(','));
        assert_eq!(overridden.options.cell_limit, 0);
        assert_eq!(overridden.output_delimiter, '\t');
        Ok(())
    }

    #[test]
    fn sort_column_and_reverse() -> Result<()> {
        let plan = plan(&["--sort-column", "price", "--reverse", "f.csv"])?;
        assert_eq!(plan.sort, Some(("price".to_owned(), SortDirection::Desc)));
        assert!(super::Cli::try_parse_from(["tabulon", "--reverse", "f.csv"]).is_err());
        Ok(())
    }
}
