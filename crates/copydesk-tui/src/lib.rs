// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use copydesk_app::{
    AppCommand, AppEvent, AppMode, AppState, Article, ArticleField, ArticleFilter, ArticleId,
    CellEditor, CellKind, CellValue, Comment, CommitMode, FieldUpdate, GridCommand, GridEvent,
    SidePanel, TableEditor,
};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap};
use std::io;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use time::macros::format_description;
use tracing::{info, warn};

const COLUMN_SPACING: u16 = 1;
const EDIT_CARET: &str = "▏";
const IMAGE_MARK: &str = "▣";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    pub rows: usize,
    pub path: PathBuf,
}

/// Everything the front-end needs from the record store. Implementations
/// decide where articles live; the UI only sees these calls.
pub trait AppRuntime {
    fn list_articles(&mut self, filter: &ArticleFilter) -> Result<Vec<Article>>;
    fn update_field(&mut self, update: &FieldUpdate) -> Result<()>;
    /// Bulk writes. Results line up with `updates`; one failure does not stop
    /// the others.
    fn update_fields(&mut self, updates: &[FieldUpdate]) -> Vec<Result<()>> {
        updates
            .iter()
            .map(|update| self.update_field(update))
            .collect()
    }
    fn list_comments(&mut self, article_id: ArticleId) -> Result<Vec<Comment>>;
    fn add_comment(&mut self, article_id: ArticleId, body: &str) -> Result<()>;
    fn list_editors(&mut self) -> Result<Vec<String>>;
    fn export_csv(&mut self, rows: &[Article], selected: &[ArticleId]) -> Result<ExportReport>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Marker,
    Id,
    Field(ArticleField),
    LatestComment,
}

// A zero width fills whatever space is left.
const COLUMNS: [(Column, u16); 10] = [
    (Column::Marker, 2),
    (Column::Id, 4),
    (Column::Field(ArticleField::CreatedAt), 10),
    (Column::Field(ArticleField::Editor), 8),
    (Column::Field(ArticleField::Status), 6),
    (Column::Field(ArticleField::ContentSource), 22),
    (Column::Field(ArticleField::Title), 28),
    (Column::Field(ArticleField::Memo), 14),
    (Column::Field(ArticleField::Image), 3),
    (Column::LatestComment, 0),
];

#[derive(Debug, Clone)]
struct ActiveCell {
    id: ArticleId,
    field: ArticleField,
    editor: CellEditor,
}

#[derive(Debug, Clone)]
struct PromptState {
    field: Option<ArticleField>,
    target: Option<ArticleId>,
    editor: CellEditor,
}

#[derive(Debug, Clone, Default)]
struct ViewData {
    grid: TableEditor,
    editors: Vec<String>,
    active_cell: Option<ActiveCell>,
    prompt: Option<PromptState>,
    comments: Vec<Comment>,
    help_visible: bool,
    screen: Rect,
    scroll_offset: usize,
    status_token: u64,
}

struct ScreenAreas {
    header: Rect,
    table: Rect,
    panel: Option<Rect>,
    status: Rect,
}

pub fn run_app<R: AppRuntime>(state: &mut AppState, runtime: &mut R) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen, EnableMouseCapture)
        .context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::default();
    let (internal_tx, internal_rx) = mpsc::channel();

    match runtime.list_editors() {
        Ok(editors) => view_data.editors = editors,
        Err(error) => warn!(%error, "editor list unavailable"),
    }
    if let Err(error) = refresh_articles(state, runtime, &mut view_data) {
        state.dispatch(AppCommand::SetStatus(format!("load failed: {error}")));
    }

    let mut result = Ok(());
    loop {
        process_internal_events(state, &mut view_data, &internal_rx);

        match terminal.size() {
            Ok(size) => view_data.screen = Rect::new(0, 0, size.width, size.height),
            Err(error) => {
                result = Err(error).context("read terminal size");
                break;
            }
        }
        sync_scroll(state, &mut view_data);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = event::poll(Duration::from_millis(120)).context("poll event")?;
        if has_event {
            match event::read().context("read event")? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Event::Mouse(mouse) => {
                    handle_mouse_event(state, runtime, &mut view_data, &internal_tx, mouse);
                }
                _ => {}
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(
        io::stdout(),
        DisableMouseCapture,
        terminal::LeaveAlternateScreen
    )
    .context("leave alternate screen")?;
    result
}

fn process_internal_events(
    state: &mut AppState,
    view_data: &mut ViewData,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(AppCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_secs(4));
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    state.dispatch(AppCommand::SetStatus(message.into()));
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

fn handle_key_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if view_data.help_visible {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?')) {
            view_data.help_visible = false;
        }
        return false;
    }

    if !state.mode.captures_text() {
        handle_nav_key(state, runtime, view_data, internal_tx, key);
    } else if state.mode == AppMode::EditCell {
        handle_cell_edit_key(state, runtime, view_data, internal_tx, key);
    } else {
        handle_prompt_key(state, runtime, view_data, internal_tx, key);
    }
    false
}

fn grid_command_for_key(key: KeyEvent) -> Option<GridCommand> {
    match (key.code, key.modifiers) {
        (KeyCode::Down, modifiers) if modifiers.contains(KeyModifiers::SHIFT) => {
            Some(GridCommand::ExtendDown)
        }
        (KeyCode::Up, modifiers) if modifiers.contains(KeyModifiers::SHIFT) => {
            Some(GridCommand::ExtendUp)
        }
        (KeyCode::Char('J'), _) => Some(GridCommand::ExtendDown),
        (KeyCode::Char('K'), _) => Some(GridCommand::ExtendUp),
        (KeyCode::Char('z'), modifiers) if modifiers.contains(KeyModifiers::CONTROL) => {
            Some(GridCommand::Undo)
        }
        (KeyCode::Char('y'), modifiers) | (KeyCode::Char('r'), modifiers)
            if modifiers.contains(KeyModifiers::CONTROL) =>
        {
            Some(GridCommand::Redo)
        }
        (KeyCode::Char('d'), modifiers) if modifiers.contains(KeyModifiers::CONTROL) => {
            Some(GridCommand::CopyFromAbove)
        }
        (KeyCode::Char('a'), modifiers) if modifiers.contains(KeyModifiers::CONTROL) => {
            Some(GridCommand::SelectAll)
        }
        (KeyCode::Down, _) | (KeyCode::Char('j'), KeyModifiers::NONE) => {
            Some(GridCommand::MoveDown)
        }
        (KeyCode::Up, _) | (KeyCode::Char('k'), KeyModifiers::NONE) => Some(GridCommand::MoveUp),
        (KeyCode::Left, _) | (KeyCode::Char('h'), KeyModifiers::NONE) => {
            Some(GridCommand::MoveFieldLeft)
        }
        (KeyCode::Right, _) | (KeyCode::Char('l'), KeyModifiers::NONE) => {
            Some(GridCommand::MoveFieldRight)
        }
        (KeyCode::Char('u'), KeyModifiers::NONE) => Some(GridCommand::Undo),
        (KeyCode::Char('U'), _) => Some(GridCommand::Redo),
        (KeyCode::Char(' '), _) => Some(GridCommand::ToggleRowSelection),
        (KeyCode::Char('x'), KeyModifiers::NONE) => Some(GridCommand::ClearSelection),
        _ => None,
    }
}

fn handle_nav_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    if let Some(command) = grid_command_for_key(key) {
        let events = view_data.grid.apply(command);
        apply_grid_events(state, runtime, view_data, internal_tx, events);
        return;
    }

    match (key.code, key.modifiers) {
        (KeyCode::Enter, _) => begin_cell_edit(state, view_data, internal_tx),
        (KeyCode::Char('b'), KeyModifiers::NONE) => open_bulk_prompt(state, view_data, internal_tx),
        (KeyCode::Char('c'), KeyModifiers::NONE) => {
            toggle_comments_panel(state, runtime, view_data, internal_tx);
        }
        (KeyCode::Char('C'), _) => open_comment_prompt(state, view_data, internal_tx),
        (KeyCode::Char('i'), KeyModifiers::NONE) => {
            let Some(id) = view_data.grid.selected_article().map(|article| article.id) else {
                emit_status(state, view_data, internal_tx, "no article selected");
                return;
            };
            if state.panel == SidePanel::Image(id) {
                state.dispatch(AppCommand::ClosePanel);
            } else {
                state.dispatch(AppCommand::OpenImagePreview(id));
            }
        }
        (KeyCode::Char('/'), _) => {
            let current = state.filter.search.clone().unwrap_or_default();
            open_prompt(
                state,
                view_data,
                AppCommand::OpenSearch,
                PromptState {
                    field: None,
                    target: None,
                    editor: CellEditor::new(CellKind::Text, &CellValue::Text(current)),
                },
            );
        }
        (KeyCode::Char('f'), KeyModifiers::NONE) => dispatch_and_refresh(
            state,
            runtime,
            view_data,
            AppCommand::CycleStatusFilter,
            internal_tx,
        ),
        (KeyCode::Char('s'), KeyModifiers::NONE) => dispatch_and_refresh(
            state,
            runtime,
            view_data,
            AppCommand::CycleSort,
            internal_tx,
        ),
        (KeyCode::Char('F'), _) => dispatch_and_refresh(
            state,
            runtime,
            view_data,
            AppCommand::ClearFilters,
            internal_tx,
        ),
        (KeyCode::Char('r'), KeyModifiers::NONE) => {
            match refresh_articles(state, runtime, view_data) {
                Ok(()) => emit_status(state, view_data, internal_tx, "reloaded"),
                Err(error) => {
                    emit_status(state, view_data, internal_tx, format!("load failed: {error}"));
                }
            }
        }
        (KeyCode::Char('e'), KeyModifiers::NONE) => {
            export_rows(state, runtime, view_data, internal_tx);
        }
        (KeyCode::Char('?'), _) => view_data.help_visible = true,
        (KeyCode::Esc, _) => {
            if state.panel != SidePanel::Hidden {
                state.dispatch(AppCommand::ClosePanel);
            } else if !view_data.grid.selected_ids().is_empty() {
                let events = view_data.grid.apply(GridCommand::ClearSelection);
                apply_grid_events(state, runtime, view_data, internal_tx, events);
            }
        }
        _ => {}
    }
}

fn handle_mouse_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    mouse: MouseEvent,
) {
    if state.mode.captures_text() || view_data.help_visible {
        return;
    }

    let command = match mouse.kind {
        MouseEventKind::ScrollDown => Some(GridCommand::MoveDown),
        MouseEventKind::ScrollUp => Some(GridCommand::MoveUp),
        MouseEventKind::Down(MouseButton::Left) => None,
        _ => return,
    };
    if let Some(command) = command {
        let events = view_data.grid.apply(command);
        apply_grid_events(state, runtime, view_data, internal_tx, events);
        return;
    }

    let Some((row, column)) = hit_test(state, view_data, mouse.column, mouse.row) else {
        return;
    };
    let current_field = view_data
        .grid
        .cursor()
        .map(|cursor| cursor.field)
        .unwrap_or(ArticleField::NAVIGABLE[0]);
    let field = match column {
        Column::Field(field) => field,
        Column::Marker | Column::Id | Column::LatestComment => current_field,
    };
    let events = view_data.grid.click_cell(row, field);
    apply_grid_events(state, runtime, view_data, internal_tx, events);

    match column {
        Column::Marker => {
            let events = view_data.grid.apply(GridCommand::ToggleRowSelection);
            apply_grid_events(state, runtime, view_data, internal_tx, events);
        }
        Column::LatestComment => {
            if let Some(id) = view_data.grid.rows().get(row).map(|article| article.id) {
                open_comments_panel(state, runtime, view_data, internal_tx, id);
            }
        }
        Column::Id | Column::Field(_) => {}
    }
}

fn hit_test(state: &AppState, view_data: &ViewData, x: u16, y: u16) -> Option<(usize, Column)> {
    let table = screen_areas(view_data.screen, state.panel != SidePanel::Hidden).table;
    let inner_left = table.x + 1;
    let inner_right = (table.x + table.width).saturating_sub(1);
    let first_row_y = table.y + 2;
    let last_row_y = (table.y + table.height).saturating_sub(1);
    if x < inner_left || x >= inner_right || y < first_row_y || y >= last_row_y {
        return None;
    }

    let row = view_data.scroll_offset + usize::from(y - first_row_y);
    if row >= view_data.grid.rows().len() {
        return None;
    }
    Some((row, column_at(x - inner_left)?))
}

/// Column starts relative to the table's inner left edge. The fill column has
/// no fixed width.
fn column_spans() -> Vec<(Column, u16, Option<u16>)> {
    let mut start = 0u16;
    COLUMNS
        .iter()
        .map(|(column, width)| {
            let span = (*column, start, (*width > 0).then_some(*width));
            start = start.saturating_add(*width + COLUMN_SPACING);
            span
        })
        .collect()
}

fn column_at(offset: u16) -> Option<Column> {
    column_spans()
        .into_iter()
        .find(|(_, start, width)| match width {
            Some(width) => offset >= *start && offset < start + width,
            None => offset >= *start,
        })
        .map(|(column, _, _)| column)
}

fn apply_grid_events<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    events: Vec<GridEvent>,
) {
    let mut saved = false;
    for event in events {
        match event {
            GridEvent::Persist(update) => {
                saved |= persist_update(state, runtime, view_data, internal_tx, &update);
            }
            GridEvent::Status(status) => {
                emit_status(state, view_data, internal_tx, status.message());
            }
            GridEvent::CellActivated {
                id,
                field: ArticleField::Image,
            } => {
                state.dispatch(AppCommand::OpenImagePreview(id));
            }
            GridEvent::CursorMoved(_) => {
                follow_panel_to_cursor(state, runtime, view_data, internal_tx);
            }
            GridEvent::CursorCleared
            | GridEvent::SelectionChanged(_)
            | GridEvent::CellActivated { .. } => {}
        }
    }
    if saved {
        reload_after_write(state, runtime, view_data, internal_tx);
    }
}

/// Returns whether the write landed. A failed write keeps the optimistic value
/// on screen until the user reloads.
fn persist_update<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    update: &FieldUpdate,
) -> bool {
    let Err(error) = runtime.update_field(update) else {
        return true;
    };
    warn!(
        id = update.id.get(),
        field = update.field.as_str(),
        %error,
        "field update failed"
    );
    emit_status(
        state,
        view_data,
        internal_tx,
        format!("save failed: {error}; press r to reload"),
    );
    false
}

/// Re-reads the list so rows that no longer match the filter drop out and the
/// grid prunes its selection. An open cell editor closes if its row is gone.
fn reload_after_write<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    if let Err(error) = refresh_articles(state, runtime, view_data) {
        emit_status(
            state,
            view_data,
            internal_tx,
            format!("load failed: {error}"),
        );
        return;
    }
    if let Some(active) = &view_data.active_cell
        && !view_data.grid.rows().iter().any(|row| row.id == active.id)
    {
        view_data.active_cell = None;
        state.dispatch(AppCommand::ExitToNav);
    }
}

fn follow_panel_to_cursor<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let Some(id) = view_data.grid.selected_article().map(|article| article.id) else {
        return;
    };
    match state.panel {
        SidePanel::Comments(current) if current != id => {
            open_comments_panel(state, runtime, view_data, internal_tx, id);
        }
        SidePanel::Image(current) if current != id => {
            state.dispatch(AppCommand::OpenImagePreview(id));
        }
        _ => {}
    }
}

fn editor_kind(field: ArticleField, editors: &[String]) -> CellKind {
    match CellKind::for_field(field, editors) {
        CellKind::Select(options) if options.is_empty() => CellKind::Text,
        kind => kind,
    }
}

fn begin_cell_edit(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let (Some(cursor), Some(article)) = (view_data.grid.cursor(), view_data.grid.selected_article())
    else {
        emit_status(state, view_data, internal_tx, "no article selected");
        return;
    };
    let kind = editor_kind(cursor.field, &view_data.editors);
    let mut editor = CellEditor::new(kind, &CellValue::from_field(article, cursor.field));
    editor.activate();
    view_data.active_cell = Some(ActiveCell {
        id: article.id,
        field: cursor.field,
        editor,
    });
    state.dispatch(AppCommand::EnterEditMode);
}

fn handle_cell_edit_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let Some(active) = view_data.active_cell.as_mut() else {
        state.dispatch(AppCommand::ExitToNav);
        return;
    };

    let is_date = *active.editor.kind() == CellKind::Date;
    let change = match (key.code, key.modifiers) {
        (KeyCode::Esc | KeyCode::Enter | KeyCode::Tab, _) => {
            active.editor.blur();
            view_data.active_cell = None;
            state.dispatch(AppCommand::ExitToNav);
            return;
        }
        (KeyCode::Backspace, _) => active.editor.backspace(),
        (KeyCode::Down, _) if is_date => active.editor.step_days(1),
        (KeyCode::Up, _) if is_date => active.editor.step_days(-1),
        (KeyCode::PageDown, _) if is_date => active.editor.step_months(1),
        (KeyCode::PageUp, _) if is_date => active.editor.step_months(-1),
        (KeyCode::Down, _) => active.editor.next_option(),
        (KeyCode::Up, _) => active.editor.prev_option(),
        (KeyCode::Char('u'), modifiers) if modifiers.contains(KeyModifiers::CONTROL) => {
            active.editor.replace("")
        }
        (KeyCode::Char(ch), modifiers) if !modifiers.contains(KeyModifiers::CONTROL) => {
            active.editor.input_char(ch)
        }
        _ => None,
    };
    let Some(change) = change else {
        return;
    };

    let (id, field) = (active.id, active.field);
    let events = view_data
        .grid
        .commit(id, field, &change.value, CommitMode::UserEdit);
    apply_grid_events(state, runtime, view_data, internal_tx, events);
}

fn open_prompt(
    state: &mut AppState,
    view_data: &mut ViewData,
    command: AppCommand,
    mut prompt: PromptState,
) {
    prompt.editor.activate();
    view_data.prompt = Some(prompt);
    state.dispatch(command);
}

fn open_bulk_prompt(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let Some(cursor) = view_data.grid.cursor() else {
        emit_status(state, view_data, internal_tx, "no article selected");
        return;
    };
    let kind = editor_kind(cursor.field, &view_data.editors);
    open_prompt(
        state,
        view_data,
        AppCommand::OpenBulkPrompt,
        PromptState {
            field: Some(cursor.field),
            target: None,
            editor: CellEditor::new(kind, &CellValue::Null),
        },
    );
}

fn open_comment_prompt(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let target = match state.panel {
        SidePanel::Comments(id) => Some(id),
        _ => view_data.grid.selected_article().map(|article| article.id),
    };
    let Some(target) = target else {
        emit_status(state, view_data, internal_tx, "no article selected");
        return;
    };
    open_prompt(
        state,
        view_data,
        AppCommand::OpenCommentPrompt,
        PromptState {
            field: None,
            target: Some(target),
            editor: CellEditor::new(CellKind::Text, &CellValue::Null),
        },
    );
}

fn handle_prompt_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let Some(prompt) = view_data.prompt.as_mut() else {
        state.dispatch(AppCommand::ExitToNav);
        return;
    };

    match (key.code, key.modifiers) {
        (KeyCode::Esc, _) => {
            view_data.prompt = None;
            state.dispatch(AppCommand::ExitToNav);
        }
        (KeyCode::Enter, _) => submit_prompt(state, runtime, view_data, internal_tx),
        (KeyCode::Backspace, _) => {
            prompt.editor.backspace();
        }
        (KeyCode::Down | KeyCode::Tab, _) => {
            prompt.editor.next_option();
        }
        (KeyCode::Up | KeyCode::BackTab, _) => {
            prompt.editor.prev_option();
        }
        (KeyCode::Char(ch), modifiers) if !modifiers.contains(KeyModifiers::CONTROL) => {
            prompt.editor.input_char(ch);
        }
        _ => {}
    }
}

fn submit_prompt<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let Some(prompt) = view_data.prompt.clone() else {
        return;
    };
    let input = prompt.editor.buffer().to_owned();

    match state.mode {
        AppMode::BulkPrompt => {
            let Some(field) = prompt.field else {
                return;
            };
            // Validation failures keep the prompt open so the value can be fixed.
            match view_data.grid.bulk_apply(field, &input) {
                Ok(events) => {
                    view_data.prompt = None;
                    state.dispatch(AppCommand::ExitToNav);
                    run_bulk_writes(state, runtime, view_data, internal_tx, field, events);
                }
                Err(error) => emit_status(state, view_data, internal_tx, error.to_string()),
            }
        }
        AppMode::CommentPrompt => {
            let Some(id) = prompt.target else {
                return;
            };
            match runtime.add_comment(id, &input) {
                Ok(()) => {
                    view_data.prompt = None;
                    state.dispatch(AppCommand::ExitToNav);
                    state.dispatch(AppCommand::OpenComments(id));
                    if let Err(error) = refresh_articles(state, runtime, view_data) {
                        emit_status(
                            state,
                            view_data,
                            internal_tx,
                            format!("load failed: {error}"),
                        );
                        return;
                    }
                    emit_status(state, view_data, internal_tx, "comment added");
                }
                Err(error) => emit_status(state, view_data, internal_tx, error.to_string()),
            }
        }
        AppMode::Search => {
            view_data.prompt = None;
            dispatch_and_refresh(
                state,
                runtime,
                view_data,
                AppCommand::SetSearch(input),
                internal_tx,
            );
        }
        AppMode::Nav | AppMode::EditCell => {}
    }
}

fn run_bulk_writes<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    field: ArticleField,
    events: Vec<GridEvent>,
) {
    let mut updates = Vec::new();
    let mut other_events = Vec::new();
    for event in events {
        match event {
            GridEvent::Persist(update) => updates.push(update),
            other => other_events.push(other),
        }
    }

    let results = runtime.update_fields(&updates);
    let mut failed = 0usize;
    for (update, result) in updates.iter().zip(&results) {
        if let Err(error) = result {
            failed += 1;
            warn!(id = update.id.get(), field = field.as_str(), %error, "bulk update failed");
        }
    }
    info!(
        field = field.as_str(),
        rows = updates.len(),
        failed,
        "bulk apply finished"
    );
    apply_grid_events(state, runtime, view_data, internal_tx, other_events);

    let message = if failed == 0 {
        format!("set {} on {} rows", field.label(), updates.len())
    } else {
        format!(
            "{failed} of {} updates failed",
            updates.len()
        )
    };
    emit_status(state, view_data, internal_tx, message);
    if failed < updates.len() {
        reload_after_write(state, runtime, view_data, internal_tx);
    }
}

fn toggle_comments_panel<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    if matches!(state.panel, SidePanel::Comments(_)) {
        state.dispatch(AppCommand::ClosePanel);
        return;
    }
    let Some(id) = view_data.grid.selected_article().map(|article| article.id) else {
        emit_status(state, view_data, internal_tx, "no article selected");
        return;
    };
    open_comments_panel(state, runtime, view_data, internal_tx, id);
}

fn open_comments_panel<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    id: ArticleId,
) {
    match runtime.list_comments(id) {
        Ok(comments) => {
            view_data.comments = comments;
            state.dispatch(AppCommand::OpenComments(id));
        }
        Err(error) => emit_status(
            state,
            view_data,
            internal_tx,
            format!("comments failed to load: {error}"),
        ),
    }
}

fn export_rows<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let selected = view_data.grid.selected_ids();
    let message = match runtime.export_csv(view_data.grid.rows(), &selected) {
        Ok(report) => format!(
            "exported {} rows to {}",
            report.rows,
            report.path.display()
        ),
        Err(error) => format!("export failed: {error}"),
    };
    emit_status(state, view_data, internal_tx, message);
}

fn dispatch_and_refresh<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    command: AppCommand,
    internal_tx: &Sender<InternalEvent>,
) {
    let events = state.dispatch(command);
    if should_refresh_view(&events)
        && let Err(error) = refresh_articles(state, runtime, view_data)
    {
        emit_status(
            state,
            view_data,
            internal_tx,
            format!("load failed: {error}"),
        );
    }
    if events
        .iter()
        .any(|event| matches!(event, AppEvent::StatusUpdated(_)))
    {
        view_data.status_token = view_data.status_token.saturating_add(1);
        schedule_status_clear(internal_tx, view_data.status_token);
    }
}

fn should_refresh_view(events: &[AppEvent]) -> bool {
    events
        .iter()
        .any(|event| matches!(event, AppEvent::FilterChanged(_)))
}

fn refresh_articles<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
) -> Result<()> {
    let rows = runtime.list_articles(&state.filter)?;
    view_data.grid.set_records(rows);

    let panel_target = match state.panel {
        SidePanel::Comments(id) | SidePanel::Image(id) => Some(id),
        SidePanel::Hidden => None,
    };
    if let Some(id) = panel_target
        && !view_data.grid.rows().iter().any(|row| row.id == id)
    {
        state.dispatch(AppCommand::ClosePanel);
        view_data.comments.clear();
    } else if let SidePanel::Comments(id) = state.panel {
        view_data.comments = runtime.list_comments(id)?;
    }
    Ok(())
}

fn screen_areas(area: Rect, panel_open: bool) -> ScreenAreas {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(area);

    let (table, panel) = if panel_open {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(64), Constraint::Percentage(36)])
            .split(rows[1]);
        (columns[0], Some(columns[1]))
    } else {
        (rows[1], None)
    };

    ScreenAreas {
        header: rows[0],
        table,
        panel,
        status: rows[2],
    }
}

// Borders take two lines and the column header one more.
fn visible_row_capacity(table: Rect) -> usize {
    usize::from(table.height.saturating_sub(3)).max(1)
}

fn sync_scroll(state: &AppState, view_data: &mut ViewData) {
    let Some(cursor) = view_data.grid.cursor() else {
        view_data.scroll_offset = 0;
        return;
    };
    let table = screen_areas(view_data.screen, state.panel != SidePanel::Hidden).table;
    let capacity = visible_row_capacity(table);
    if cursor.row < view_data.scroll_offset {
        view_data.scroll_offset = cursor.row;
    } else if cursor.row >= view_data.scroll_offset + capacity {
        view_data.scroll_offset = cursor.row + 1 - capacity;
    }
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let areas = screen_areas(frame.area(), state.panel != SidePanel::Hidden);

    let header = Paragraph::new(header_text(state, view_data))
        .block(Block::default().title("copydesk").borders(Borders::ALL));
    frame.render_widget(header, areas.header);

    render_table(frame, areas.table, state, view_data);

    if let Some(panel_area) = areas.panel {
        let (title, body) = panel_text(state, view_data);
        let panel = Paragraph::new(body)
            .wrap(Wrap { trim: false })
            .block(Block::default().title(title).borders(Borders::ALL));
        frame.render_widget(panel, panel_area);
    }

    let status_widget = Paragraph::new(status_text(state, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status_widget, areas.status);

    if view_data.help_visible {
        let area = centered_rect(70, 70, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn render_table(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    state: &AppState,
    view_data: &ViewData,
) {
    let cursor_field = view_data.grid.cursor().map(|cursor| cursor.field);
    let header = Row::new(COLUMNS.iter().map(|(column, _)| {
        Cell::from(column_label(*column)).style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    }));

    let rows = view_data
        .grid
        .rows()
        .iter()
        .enumerate()
        .skip(view_data.scroll_offset)
        .take(visible_row_capacity(area))
        .map(|(index, article)| {
            let active_row = view_data.grid.is_active_row(index);
            let selected = view_data.grid.is_selected(article.id);
            let cells = COLUMNS
                .iter()
                .map(|(column, _)| {
                    let text = cell_text(state, view_data, index, article, *column);
                    let mut style = Style::default();
                    if selected {
                        style = style.fg(Color::Green);
                    }
                    if active_row {
                        style = style.bg(Color::DarkGray);
                    }
                    if active_row && matches!(column, Column::Field(field) if Some(*field) == cursor_field)
                    {
                        style = Style::default()
                            .fg(Color::Black)
                            .bg(Color::Cyan)
                            .add_modifier(Modifier::BOLD);
                    }
                    Cell::from(text).style(style)
                })
                .collect::<Vec<_>>();
            Row::new(cells)
        });

    let widths = COLUMNS
        .iter()
        .map(|(_, width)| {
            if *width == 0 {
                Constraint::Fill(1)
            } else {
                Constraint::Length(*width)
            }
        })
        .collect::<Vec<_>>();

    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(COLUMN_SPACING)
        .block(
            Block::default()
                .title(table_title(view_data))
                .borders(Borders::ALL),
        );
    frame.render_widget(table, area);
}

fn column_label(column: Column) -> &'static str {
    match column {
        Column::Marker => "",
        Column::Id => "id",
        Column::Field(field) => field.label(),
        Column::LatestComment => "latest comment",
    }
}

fn cell_text(
    state: &AppState,
    view_data: &ViewData,
    index: usize,
    article: &Article,
    column: Column,
) -> String {
    match column {
        Column::Marker => {
            let active = if view_data.grid.is_active_row(index) {
                '>'
            } else {
                ' '
            };
            let selected = if view_data.grid.is_selected(article.id) {
                '*'
            } else {
                ' '
            };
            format!("{active}{selected}")
        }
        Column::Id => CellValue::Number(article.id.get()).display(),
        Column::Field(ArticleField::Image) => {
            if article.image_url.is_some() {
                IMAGE_MARK.to_owned()
            } else {
                String::new()
            }
        }
        Column::Field(field) => {
            if state.mode == AppMode::EditCell
                && let Some(active) = &view_data.active_cell
                && active.id == article.id
                && active.field == field
            {
                return format!("{}{EDIT_CARET}", active.editor.buffer());
            }
            CellValue::from_field(article, field).display()
        }
        Column::LatestComment => article
            .latest_comment
            .as_deref()
            .and_then(|comment| comment.lines().next())
            .unwrap_or_default()
            .to_owned(),
    }
}

fn table_title(view_data: &ViewData) -> String {
    let total = view_data.grid.rows().len();
    let selected = view_data.grid.selected_ids().len();
    if selected == 0 {
        format!("articles ({total})")
    } else {
        format!("articles ({total}, {selected} selected)")
    }
}

fn header_text(state: &AppState, view_data: &ViewData) -> String {
    let filter = &state.filter;
    let status = filter.status.as_deref().unwrap_or("all");
    let editor = filter.editor.as_deref().unwrap_or("all");
    let search = filter.search_term().unwrap_or("-");
    let history = view_data.grid.history();
    format!(
        "status: {status} | editor: {editor} | search: {search} | sort: {} {} | undo {} / redo {}",
        filter.sort.column(),
        filter.direction.as_str(),
        history.undo_entries().len(),
        history.redo_entries().len(),
    )
}

fn panel_text(state: &AppState, view_data: &ViewData) -> (String, String) {
    match state.panel {
        SidePanel::Hidden => (String::new(), String::new()),
        SidePanel::Comments(id) => {
            let mut lines = Vec::new();
            if view_data.comments.is_empty() {
                lines.push("no comments yet".to_owned());
            }
            for comment in &view_data.comments {
                let stamp = comment
                    .created_at
                    .format(format_description!("[year]-[month]-[day] [hour]:[minute]"))
                    .unwrap_or_default();
                lines.push(format!("{} · {stamp}", comment.author));
                lines.push(comment.body.clone());
                lines.push(String::new());
            }
            lines.push("C add comment · c/esc close".to_owned());
            (format!("comments #{id}"), lines.join("\n"))
        }
        SidePanel::Image(id) => {
            let article = view_data.grid.rows().iter().find(|row| row.id == id);
            let body = match article {
                Some(article) => match &article.image_url {
                    Some(url) => format!("{}\n\n{url}\n\ni/esc close", article.title),
                    None => format!("{}\n\nno image attached\n\ni/esc close", article.title),
                },
                None => "article no longer listed".to_owned(),
            };
            (format!("image #{id}"), body)
        }
    }
}

fn status_text(state: &AppState, view_data: &ViewData) -> String {
    let mode = mode_label(state.mode);
    if matches!(
        state.mode,
        AppMode::BulkPrompt | AppMode::CommentPrompt | AppMode::Search
    ) && let Some(prompt) = &view_data.prompt
    {
        let label = match (state.mode, prompt.field) {
            (AppMode::BulkPrompt, Some(field)) => format!(
                "set {} on {} rows",
                field.label(),
                view_data.grid.selected_ids().len()
            ),
            (AppMode::CommentPrompt, _) => "comment".to_owned(),
            _ => "search".to_owned(),
        };
        let input = format!("{label}> {}{EDIT_CARET}", prompt.editor.buffer());
        let hint = if matches!(prompt.editor.kind(), CellKind::Select(_)) {
            "↑/↓ choose · enter apply · esc cancel"
        } else {
            "enter apply · esc cancel"
        };
        return match &state.status_line {
            Some(status) => format!("{mode} | {input} | {status}"),
            None => format!("{mode} | {input} | {hint}"),
        };
    }

    let hints = match state.mode {
        AppMode::EditCell => "type to edit | ↑/↓ option or day | pgup/pgdn month | enter/esc done",
        _ => {
            "j/k/h/l | J/K extend | space select | enter edit | b bulk | ctrl+d copy above | u/U undo/redo | c/C comments | i image | / f s F | e export | ? | ctrl+q"
        }
    };
    match &state.status_line {
        Some(status) => format!("{mode} | {status} | {hints}"),
        None => format!("{mode} | {hints}"),
    }
}

fn mode_label(mode: AppMode) -> &'static str {
    match mode {
        AppMode::Nav => "NAV",
        AppMode::EditCell => "EDIT",
        AppMode::BulkPrompt => "BULK",
        AppMode::CommentPrompt => "COMMENT",
        AppMode::Search => "SEARCH",
    }
}

fn help_overlay_text() -> &'static str {
    "j/k or ↑/↓      move row\n\
     h/l or ←/→      move field (date, editor, status, source)\n\
     J/K shift+↑/↓   extend selection from anchor\n\
     space           toggle row selection\n\
     ctrl+a / x      select all / clear selection\n\
     enter           edit cell (every keystroke saves)\n\
     b               apply a value to every selected row\n\
     ctrl+d          copy value from row above\n\
     u / ctrl+z      undo\n\
     U / ctrl+y      redo\n\
     c / C           comments panel / add comment\n\
     i               image preview\n\
     / f s F         search, status filter, sort, clear filters\n\
     e               export CSV (selection or all rows)\n\
     r               reload\n\
     ctrl+q          quit"
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
