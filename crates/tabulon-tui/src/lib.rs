// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::Paragraph;
use ratatui::{Frame, Terminal};
use std::io;
use tabulon_app::{
    ScreenSize, SortDirection, Table, ViewerCommand, ViewerEvent, ViewerMode, ViewerState,
};
use unicode_width::UnicodeWidthStr;

const PLACEHOLDER_ROW: &str = "~";

/// Raw mode and the alternate screen are released on every exit path.
pub fn run_viewer(table: &mut Table) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    if let Err(error) = execute!(stdout, terminal::EnterAlternateScreen) {
        let _ = disable_raw_mode();
        return Err(error).context("enter alternate screen");
    }

    let result = run_on_stdout(stdout, table);
    let restored = restore_terminal();
    result.and(restored)
}

fn run_on_stdout(stdout: io::Stdout, table: &mut Table) -> Result<()> {
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    let size = terminal.size().context("query terminal size")?;
    let mut state = ViewerState::new(ScreenSize::new(size.width, size.height));
    tracing::info!(
        rows = table.nrows(),
        cols = table.ncols(),
        width = size.width,
        height = size.height,
        "viewer started"
    );
    event_loop(&mut terminal, &mut state, table, || {
        event::read().context("read event")
    })
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    Ok(())
}

pub fn event_loop<B, F>(
    terminal: &mut Terminal<B>,
    state: &mut ViewerState,
    table: &mut Table,
    mut next_event: F,
) -> Result<()>
where
    B: Backend,
    F: FnMut() -> Result<Event>,
{
    loop {
        terminal
            .draw(|frame| render(frame, state, table))
            .context("draw frame")?;

        let command = match next_event()? {
            Event::Key(key) if key.kind != KeyEventKind::Release => {
                command_for_key(state.mode, key)
            }
            Event::Resize(width, height) => Some(ViewerCommand::Resize { width, height }),
            _ => None,
        };
        let Some(command) = command else {
            continue;
        };

        let events = state.dispatch(command, table);
        if events.contains(&ViewerEvent::QuitRequested) {
            tracing::info!("viewer closed");
            return Ok(());
        }
    }
}

pub fn command_for_key(mode: ViewerMode, key: KeyEvent) -> Option<ViewerCommand> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(ViewerCommand::Quit);
    }
    match mode {
        ViewerMode::Normal => normal_command_for_key(key),
        ViewerMode::Search | ViewerMode::SearchReverse => search_command_for_key(key),
    }
}

fn normal_command_for_key(key: KeyEvent) -> Option<ViewerCommand> {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => Some(ViewerCommand::Quit),
        KeyCode::Char('j') | KeyCode::Down => Some(ViewerCommand::MoveRow(1)),
        KeyCode::Char('k') | KeyCode::Up => Some(ViewerCommand::MoveRow(-1)),
        KeyCode::Char('h') | KeyCode::Left => Some(ViewerCommand::MoveColumn(-1)),
        KeyCode::Char('l') | KeyCode::Right => Some(ViewerCommand::MoveColumn(1)),
        KeyCode::Char(' ') | KeyCode::PageDown => Some(ViewerCommand::PageDown),
        KeyCode::Char('b') | KeyCode::PageUp => Some(ViewerCommand::PageUp),
        KeyCode::Char('g') | KeyCode::Home => Some(ViewerCommand::JumpFirstRow),
        KeyCode::Char('G') | KeyCode::End => Some(ViewerCommand::JumpLastRow),
        KeyCode::Char('0') => Some(ViewerCommand::JumpOrigin),
        KeyCode::Char('/') => Some(ViewerCommand::OpenSearch),
        KeyCode::Char('?') => Some(ViewerCommand::OpenSearchReverse),
        KeyCode::Char('s') => Some(ViewerCommand::Sort(SortDirection::Asc)),
        KeyCode::Char('S') => Some(ViewerCommand::Sort(SortDirection::Desc)),
        KeyCode::Char('n') => Some(ViewerCommand::RepeatSearch),
        KeyCode::Char('N') => Some(ViewerCommand::RepeatSearchReverse),
        _ => None,
    }
}

fn search_command_for_key(key: KeyEvent) -> Option<ViewerCommand> {
    match (key.code, key.modifiers) {
        (KeyCode::Enter, _) => Some(ViewerCommand::SubmitSearch),
        (KeyCode::Esc, _) => Some(ViewerCommand::AbortSearch),
        (KeyCode::Char('g'), modifiers) if modifiers.contains(KeyModifiers::CONTROL) => {
            Some(ViewerCommand::AbortSearch)
        }
        (KeyCode::Char('u'), modifiers) if modifiers.contains(KeyModifiers::CONTROL) => {
            Some(ViewerCommand::ClearInput)
        }
        (KeyCode::Char('h'), modifiers) if modifiers.contains(KeyModifiers::CONTROL) => {
            Some(ViewerCommand::DeleteChar)
        }
        (KeyCode::Backspace, _) | (KeyCode::Delete, _) => Some(ViewerCommand::DeleteChar),
        (KeyCode::Char(ch), modifiers)
            if !modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
                && !ch.is_control() =>
        {
            Some(ViewerCommand::InputChar(ch))
        }
        _ => None,
    }
}

pub fn render(frame: &mut Frame, state: &mut ViewerState, table: &Table) {
    state.clamp(table);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    let underlined = Style::default().add_modifier(Modifier::UNDERLINED);

    let header = row_line(table.header(), table.limits(), state.xview);
    frame.render_widget(Paragraph::new(header).style(underlined), chunks[0]);

    let body = (0..usize::from(chunks[1].height))
        .map(|offset| match table.row(state.yview + offset) {
            Some(row) => Line::from(row_line(row, table.limits(), state.xview)),
            None => Line::from(PLACEHOLDER_ROW),
        })
        .collect::<Vec<_>>();
    frame.render_widget(Paragraph::new(body), chunks[1]);

    frame.render_widget(
        Paragraph::new(state.status_text(table)).style(underlined),
        chunks[2],
    );
}

pub fn row_line(cells: &[String], limits: &[usize], xview: usize) -> String {
    let mut line = String::new();
    for (cell, limit) in cells.iter().zip(limits).skip(xview) {
        line.push_str(cell);
        let pad = (limit + 1).saturating_sub(cell.width());
        line.extend(std::iter::repeat_n(' ', pad));
    }
    line.truncate(line.trim_end().len());
    line
}
