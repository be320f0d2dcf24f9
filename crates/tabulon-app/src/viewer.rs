// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::table::{SortDirection, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewerMode {
    #[default]
    Normal,
    Search,
    SearchReverse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScreenSize {
    pub width: u16,
    pub height: u16,
}

impl ScreenSize {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerCommand {
    MoveRow(isize),
    MoveColumn(isize),
    PageDown,
    PageUp,
    JumpFirstRow,
    JumpLastRow,
    JumpOrigin,
    OpenSearch,
    OpenSearchReverse,
    Sort(SortDirection),
    RepeatSearch,
    RepeatSearchReverse,
    Quit,
    InputChar(char),
    DeleteChar,
    ClearInput,
    SubmitSearch,
    AbortSearch,
    Resize { width: u16, height: u16 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerEvent {
    ModeChanged(ViewerMode),
    ViewMoved { xview: usize, yview: usize },
    SearchChanged(String),
    SearchMatched(usize),
    SearchMissed(String),
    Sorted { column: usize, direction: SortDirection },
    Resized(ScreenSize),
    StatusUpdated(String),
    QuitRequested,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewerState {
    pub mode: ViewerMode,
    pub xview: usize,
    pub yview: usize,
    pub search: String,
    pub screen: ScreenSize,
    pub status_line: Option<String>,
}

impl ViewerState {
    pub fn new(screen: ScreenSize) -> Self {
        Self {
            screen,
            ..Self::default()
        }
    }

    pub fn dispatch(&mut self, command: ViewerCommand, table: &mut Table) -> Vec<ViewerEvent> {
        match command {
            ViewerCommand::Quit => return vec![ViewerEvent::QuitRequested],
            ViewerCommand::Resize { width, height } => {
                self.screen = ScreenSize::new(width, height);
                self.clamp(table);
                return vec![ViewerEvent::Resized(self.screen)];
            }
            _ => {}
        }

        match self.mode {
            ViewerMode::Normal => self.handle_normal(command, table),
            ViewerMode::Search | ViewerMode::SearchReverse => self.handle_search(command, table),
        }
    }

    pub fn clamp(&mut self, table: &Table) {
        self.xview = self.xview.min(table.ncols().saturating_sub(1));
        self.yview = self.yview.min(table.nrows().saturating_sub(1));
    }

    pub fn status_text(&self, table: &Table) -> String {
        match self.mode {
            ViewerMode::Normal => {
                let position = format!(
                    "{}: row={}/{} col={}/{} screen={},{}",
                    table.description(),
                    self.yview,
                    table.nrows(),
                    self.xview,
                    table.ncols(),
                    self.screen.height,
                    self.screen.width,
                );
                match &self.status_line {
                    Some(message) => format!("{position} {message}"),
                    None => position,
                }
            }
            ViewerMode::Search => format!("Search: {}", self.search),
            ViewerMode::SearchReverse => format!("Search reverse: {}", self.search),
        }
    }

    fn handle_normal(&mut self, command: ViewerCommand, table: &mut Table) -> Vec<ViewerEvent> {
        self.status_line = None;
        let page = self.page_size();

        match command {
            ViewerCommand::MoveRow(delta) => self.move_view(table, 0, delta),
            ViewerCommand::MoveColumn(delta) => self.move_view(table, delta, 0),
            ViewerCommand::PageDown => self.move_view(table, 0, page),
            ViewerCommand::PageUp => self.move_view(table, 0, -page),
            ViewerCommand::JumpFirstRow => {
                self.yview = 0;
                self.moved()
            }
            ViewerCommand::JumpLastRow => {
                self.yview = table.nrows().saturating_sub(usize::from(self.screen.height));
                self.clamp(table);
                self.moved()
            }
            ViewerCommand::JumpOrigin => {
                self.xview = 0;
                self.yview = 0;
                self.moved()
            }
            ViewerCommand::OpenSearch => self.enter_search(ViewerMode::Search),
            ViewerCommand::OpenSearchReverse => self.enter_search(ViewerMode::SearchReverse),
            ViewerCommand::Sort(direction) => self.sort(table, direction),
            ViewerCommand::RepeatSearch => self.repeat_search(table, ViewerMode::Search),
            ViewerCommand::RepeatSearchReverse => {
                self.repeat_search(table, ViewerMode::SearchReverse)
            }
            _ => Vec::new(),
        }
    }

    fn handle_search(&mut self, command: ViewerCommand, table: &mut Table) -> Vec<ViewerEvent> {
        match command {
            ViewerCommand::InputChar(ch) => {
                self.search.push(ch);
                vec![ViewerEvent::SearchChanged(self.search.clone())]
            }
            ViewerCommand::DeleteChar => {
                if self.search.pop().is_none() {
                    return Vec::new();
                }
                vec![ViewerEvent::SearchChanged(self.search.clone())]
            }
            ViewerCommand::ClearInput => {
                self.search.clear();
                vec![ViewerEvent::SearchChanged(String::new())]
            }
            ViewerCommand::SubmitSearch => {
                let direction = self.mode;
                self.mode = ViewerMode::Normal;
                let mut events = vec![ViewerEvent::ModeChanged(self.mode)];
                events.extend(self.run_search(table, direction));
                events
            }
            ViewerCommand::AbortSearch => {
                self.search.clear();
                self.mode = ViewerMode::Normal;
                vec![ViewerEvent::ModeChanged(self.mode)]
            }
            _ => Vec::new(),
        }
    }

    fn page_size(&self) -> isize {
        isize::try_from(self.screen.height.max(1)).unwrap_or(isize::MAX)
    }

    fn move_view(&mut self, table: &Table, dx: isize, dy: isize) -> Vec<ViewerEvent> {
        self.xview = offset(self.xview, dx);
        self.yview = offset(self.yview, dy);
        self.clamp(table);
        self.moved()
    }

    fn moved(&self) -> Vec<ViewerEvent> {
        vec![ViewerEvent::ViewMoved {
            xview: self.xview,
            yview: self.yview,
        }]
    }

    fn enter_search(&mut self, mode: ViewerMode) -> Vec<ViewerEvent> {
        self.mode = mode;
        self.search.clear();
        vec![ViewerEvent::ModeChanged(mode)]
    }

    fn sort(&mut self, table: &mut Table, direction: SortDirection) -> Vec<ViewerEvent> {
        let column = self.xview;
        let Some(name) = table.header().get(column).cloned() else {
            return Vec::new();
        };
        table.sort_by_column(column, direction);
        vec![
            ViewerEvent::Sorted { column, direction },
            self.set_status(&format!("sorted by {name} {}", direction.label())),
        ]
    }

    // n/N without a retained needle do nothing.
    fn repeat_search(&mut self, table: &Table, mode: ViewerMode) -> Vec<ViewerEvent> {
        if self.search.is_empty() {
            return Vec::new();
        }
        self.run_search(table, mode)
    }

    fn run_search(&mut self, table: &Table, mode: ViewerMode) -> Vec<ViewerEvent> {
        let found = match mode {
            ViewerMode::SearchReverse => table.search_reverse(self.yview, &self.search),
            _ => table.search(self.yview, &self.search),
        };
        if found == self.yview {
            let message = format!("not found: {}", self.search);
            tracing::debug!(needle = %self.search, "search missed");
            return vec![
                ViewerEvent::SearchMissed(self.search.clone()),
                self.set_status(&message),
            ];
        }

        self.yview = found;
        vec![ViewerEvent::SearchMatched(found)]
    }

    fn set_status(&mut self, message: &str) -> ViewerEvent {
        self.status_line = Some(message.to_owned());
        ViewerEvent::StatusUpdated(message.to_owned())
    }
}

fn offset(value: usize, delta: isize) -> usize {
    if delta < 0 {
        value.saturating_sub(delta.unsigned_abs())
    } else {
        value.saturating_add(delta.unsigned_abs())
    }
}
