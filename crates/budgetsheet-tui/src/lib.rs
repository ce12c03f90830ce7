// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use budgetsheet_app::{
    BudgetSheetEditor, Button, CellRef, ControlAction, Markers, SheetEvent, SheetStorage,
    SheetTable, TableCell,
};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap};
use std::io;
use std::time::Duration;
use time::OffsetDateTime;
use time::macros::format_description;
use tracing::{debug, warn};

const LABEL_COLUMN_WIDTH: u16 = 26;
const VALUE_COLUMN_WIDTH: u16 = 12;
const INPUT_CARET: &str = "▏";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewData {
    cursor: CellRef,
    input: Option<String>,
    status_line: Option<String>,
}

impl ViewData {
    pub fn cursor(&self) -> CellRef {
        self.cursor
    }

    /// Text being typed into the cursor cell, if any.
    pub fn input(&self) -> Option<&str> {
        self.input.as_deref()
    }

    pub fn status_line(&self) -> Option<&str> {
        self.status_line.as_deref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SheetKeyCommand {
    MoveRow(isize),
    MoveColumn(isize),
    JumpFirstRow,
    JumpLastRow,
    Press(ControlAction),
    BeginInput,
}

pub fn run_app<S: SheetStorage>(editor: &mut BudgetSheetEditor<S>) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::default();
    view_data.cursor = first_value_cell(editor.table(), editor.markers());

    let mut result = Ok(());
    loop {
        if let Err(error) = terminal.draw(|frame| render(frame, editor, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = event::poll(Duration::from_millis(120)).context("poll event")?;
        if has_event
            && let Event::Key(key) = event::read().context("read event")?
            && handle_key_event(editor, &mut view_data, key)
        {
            break;
        }
    }

    if editor.state().is_dirty() {
        warn!(key = %editor.key(), "quitting with unsaved edits");
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

/// Applies one key press. Returns true when the app should quit.
pub fn handle_key_event<S: SheetStorage>(
    editor: &mut BudgetSheetEditor<S>,
    view_data: &mut ViewData,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    // A failed save blocks the sheet until acknowledged.
    if editor.notice().is_some() {
        if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
            editor.take_notice();
        }
        return false;
    }

    if view_data.input.is_some() {
        handle_input_key(editor, view_data, key);
        return false;
    }

    let Some(command) = sheet_command_for_key(key) else {
        return false;
    };
    apply_sheet_command(editor, view_data, command);
    false
}

fn handle_input_key<S: SheetStorage>(
    editor: &mut BudgetSheetEditor<S>,
    view_data: &mut ViewData,
    key: KeyEvent,
) {
    let Some(buffer) = view_data.input.as_mut() else {
        return;
    };
    match key.code {
        KeyCode::Esc => {
            view_data.input = None;
            view_data.status_line = Some("edit cancelled".to_owned());
        }
        KeyCode::Enter => {
            let text = std::mem::take(buffer);
            view_data.input = None;
            let events = editor.input(view_data.cursor, &text);
            view_data.status_line = describe_events(&events).or_else(|| {
                editor
                    .state()
                    .is_dirty()
                    .then(|| "unsaved changes".to_owned())
            });
        }
        KeyCode::Backspace => {
            buffer.pop();
        }
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            buffer.push(ch);
        }
        _ => {}
    }
}

fn sheet_command_for_key(key: KeyEvent) -> Option<SheetKeyCommand> {
    match (key.code, key.modifiers) {
        (KeyCode::Char('j'), _) | (KeyCode::Down, _) => Some(SheetKeyCommand::MoveRow(1)),
        (KeyCode::Char('k'), _) | (KeyCode::Up, _) => Some(SheetKeyCommand::MoveRow(-1)),
        (KeyCode::Char('h'), _) | (KeyCode::Left, _) => Some(SheetKeyCommand::MoveColumn(-1)),
        (KeyCode::Char('l'), _) | (KeyCode::Right, _) | (KeyCode::Tab, _) => {
            Some(SheetKeyCommand::MoveColumn(1))
        }
        (KeyCode::Char('g'), _) => Some(SheetKeyCommand::JumpFirstRow),
        (KeyCode::Char('G'), _) => Some(SheetKeyCommand::JumpLastRow),
        (KeyCode::Char('e'), KeyModifiers::NONE) => {
            Some(SheetKeyCommand::Press(ControlAction::ToggleEdit))
        }
        (KeyCode::Char('s'), KeyModifiers::NONE) => {
            Some(SheetKeyCommand::Press(ControlAction::Save))
        }
        (KeyCode::Char('u'), KeyModifiers::NONE) => {
            Some(SheetKeyCommand::Press(ControlAction::Undo))
        }
        (KeyCode::Enter, _) | (KeyCode::Char('i'), KeyModifiers::NONE) => {
            Some(SheetKeyCommand::BeginInput)
        }
        _ => None,
    }
}

fn apply_sheet_command<S: SheetStorage>(
    editor: &mut BudgetSheetEditor<S>,
    view_data: &mut ViewData,
    command: SheetKeyCommand,
) {
    let table = editor.table();
    let last_row = table.rows.len().saturating_sub(1);
    let last_column = table.column_count().saturating_sub(1);
    match command {
        SheetKeyCommand::MoveRow(delta) => {
            view_data.cursor.row = view_data.cursor.row.saturating_add_signed(delta).min(last_row);
        }
        SheetKeyCommand::MoveColumn(delta) => {
            view_data.cursor.column = view_data
                .cursor
                .column
                .saturating_add_signed(delta)
                .min(last_column);
        }
        SheetKeyCommand::JumpFirstRow => view_data.cursor.row = 0,
        SheetKeyCommand::JumpLastRow => view_data.cursor.row = last_row,
        SheetKeyCommand::Press(action) => {
            let events = editor.press(action);
            view_data.status_line = if events.is_empty() {
                Some(format!("{} is disabled", action.as_str()))
            } else {
                describe_events(&events)
            };
        }
        SheetKeyCommand::BeginInput => {
            if !editor.state().is_editing() {
                view_data.status_line = Some("press e to edit".to_owned());
            } else if editor.accepts_input(view_data.cursor) {
                let current = editor
                    .table()
                    .cell(view_data.cursor)
                    .map(|cell| cell.text.clone())
                    .unwrap_or_default();
                view_data.input = Some(current);
                view_data.status_line = None;
            } else {
                view_data.status_line = Some("cell is locked".to_owned());
            }
        }
    }
    debug!(?command, row = view_data.cursor.row, column = view_data.cursor.column, "sheet key");
}

/// Save and undo outcomes win over the mode changes that accompany them.
fn describe_events(events: &[SheetEvent]) -> Option<String> {
    let outcome = events.iter().find_map(|event| match event {
        SheetEvent::Saved => Some(saved_message(OffsetDateTime::now_utc())),
        SheetEvent::SaveFailed(error) => Some(format!("save failed: {error}")),
        SheetEvent::Restored => Some("restored".to_owned()),
        _ => None,
    });
    outcome.or_else(|| {
        events.iter().find_map(|event| match event {
            SheetEvent::CellMarkedDirty(_) => Some("unsaved changes".to_owned()),
            SheetEvent::ModeChanged(mode) if mode.is_editing() => Some("editing".to_owned()),
            SheetEvent::ModeChanged(_) => Some("viewing".to_owned()),
            _ => None,
        })
    })
}

fn saved_message(at: OffsetDateTime) -> String {
    match at.format(format_description!("[hour]:[minute]:[second]")) {
        Ok(clock) => format!("saved {clock} UTC"),
        Err(_) => "saved".to_owned(),
    }
}

fn first_value_cell(table: &SheetTable, markers: &Markers) -> CellRef {
    let column = table
        .rows
        .first()
        .and_then(|row| {
            row.cells
                .iter()
                .position(|cell| !cell.has_class(&markers.label_column))
        })
        .unwrap_or(0);
    CellRef::new(0, column)
}

fn status_text<S: SheetStorage>(editor: &BudgetSheetEditor<S>, view_data: &ViewData) -> String {
    if editor.notice().is_some() {
        return "enter dismiss".to_owned();
    }
    let mode = editor.mode().label();
    let hints = if view_data.input.is_some() {
        "type | enter commit | esc cancel | ctrl+q"
    } else {
        "j/k/h/l g/G | e edit | s save | u undo | enter change cell | ctrl+q"
    };
    match &view_data.status_line {
        Some(status) => format!("{mode} | {status} | {hints}"),
        None => format!("{mode} | {hints}"),
    }
}

fn render<S: SheetStorage>(
    frame: &mut ratatui::Frame<'_>,
    editor: &BudgetSheetEditor<S>,
    view_data: &ViewData,
) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
            Constraint::Length(2),
        ])
        .split(frame.area());

    let page = editor.page();
    let title = if page.title.is_empty() {
        page.path.clone()
    } else {
        format!("{} ({})", page.title, page.path)
    };
    let heading = Paragraph::new(title).block(
        Block::default()
            .title("budgetsheet")
            .borders(Borders::ALL),
    );
    frame.render_widget(heading, layout[0]);

    render_table(frame, layout[1], editor, view_data);

    let controls = Paragraph::new(controls_line(editor))
        .block(Block::default().borders(Borders::ALL).title(editor.key().as_str()));
    frame.render_widget(controls, layout[2]);

    let status_widget = Paragraph::new(status_text(editor, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(status_widget, layout[3]);

    if let Some(notice) = editor.notice() {
        let area = centered_rect(60, 25, frame.area());
        frame.render_widget(Clear, area);
        let overlay = Paragraph::new(notice.to_owned())
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .title("save failed")
                    .borders(Borders::ALL)
                    .style(Style::default().fg(Color::Red)),
            );
        frame.render_widget(overlay, area);
    }
}

fn render_table<S: SheetStorage>(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    editor: &BudgetSheetEditor<S>,
    view_data: &ViewData,
) {
    let table = editor.table();
    let markers = editor.markers();
    let header = Row::new(header_labels(table)).style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    );
    let rows = table.rows.iter().enumerate().map(|(row_index, row)| {
        Row::new(row.cells.iter().enumerate().map(|(column, cell)| {
            let here = CellRef::new(row_index, column);
            let selected = here == view_data.cursor;
            let text = match (&view_data.input, selected) {
                (Some(buffer), true) => format!("{buffer}{INPUT_CARET}"),
                _ => cell.text.clone(),
            };
            Cell::from(text).style(cell_style(cell, markers, selected))
        }))
    });
    let widths = std::iter::once(Constraint::Length(LABEL_COLUMN_WIDTH)).chain(
        (1..table.column_count()).map(|_| Constraint::Length(VALUE_COLUMN_WIDTH)),
    );
    let widget = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("sheet [{}]", editor.mode().label())),
        );
    frame.render_widget(widget, area);
}

fn header_labels(table: &SheetTable) -> Vec<String> {
    if !table.header.is_empty() {
        return table.header.clone();
    }
    (0..table.column_count()).map(column_letter).collect()
}

fn column_letter(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(char::from(b'A' + (index % 26) as u8));
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.iter().rev().collect()
}

fn cell_style(cell: &TableCell, markers: &Markers, selected: bool) -> Style {
    let mut style = Style::default();
    if cell.has_class(&markers.label_column) {
        style = style.add_modifier(Modifier::BOLD);
    }
    if cell.has_class(&markers.editable_cell) {
        style = style.fg(Color::Cyan).add_modifier(Modifier::UNDERLINED);
    }
    if cell.has_class(&markers.dirty_cell) {
        style = style.fg(Color::Yellow);
    }
    if selected {
        style = style.add_modifier(Modifier::REVERSED);
    }
    style
}

fn controls_line<S: SheetStorage>(editor: &BudgetSheetEditor<S>) -> Line<'static> {
    let Some(container) = editor.controls() else {
        return Line::from(Span::styled(
            "no controls on this page",
            Style::default().fg(Color::DarkGray),
        ));
    };
    let markers = editor.markers();
    let mut spans = Vec::new();
    for button in &container.buttons {
        if !spans.is_empty() {
            spans.push(Span::raw(" "));
        }
        spans.push(Span::styled(
            format!("[{}]", button.label),
            button_style(button, markers),
        ));
    }
    Line::from(spans)
}

fn button_style(button: &Button, markers: &Markers) -> Style {
    if button.disabled {
        return Style::default().fg(Color::DarkGray);
    }
    if button.has_class(&markers.danger_button) {
        Style::default().fg(Color::Red)
    } else if button.has_class(&markers.secondary_button) {
        Style::default().fg(Color::White)
    } else {
        Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD)
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
