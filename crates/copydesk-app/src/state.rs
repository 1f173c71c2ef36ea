// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{AppMode, ArticleFilter, ArticleId, ArticleSortKey, STATUS_PIPELINE, SortDirection};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidePanel {
    Hidden,
    Comments(ArticleId),
    Image(ArticleId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub mode: AppMode,
    pub filter: ArticleFilter,
    pub panel: SidePanel,
    pub status_line: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            mode: AppMode::Nav,
            filter: ArticleFilter::default(),
            panel: SidePanel::Hidden,
            status_line: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    EnterEditMode,
    ExitToNav,
    OpenBulkPrompt,
    OpenCommentPrompt,
    OpenSearch,
    OpenComments(ArticleId),
    OpenImagePreview(ArticleId),
    ClosePanel,
    CycleStatusFilter,
    CycleSort,
    SetSearch(String),
    ClearFilters,
    SetStatus(String),
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    ModeChanged(AppMode),
    PanelChanged(SidePanel),
    FilterChanged(ArticleFilter),
    StatusUpdated(String),
    StatusCleared,
}

impl AppState {
    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        match command {
            AppCommand::EnterEditMode => self.set_mode(AppMode::EditCell),
            AppCommand::ExitToNav => self.set_mode(AppMode::Nav),
            AppCommand::OpenBulkPrompt => self.set_mode(AppMode::BulkPrompt),
            AppCommand::OpenCommentPrompt => self.set_mode(AppMode::CommentPrompt),
            AppCommand::OpenSearch => self.set_mode(AppMode::Search),
            AppCommand::OpenComments(id) => self.set_panel(SidePanel::Comments(id)),
            AppCommand::OpenImagePreview(id) => self.set_panel(SidePanel::Image(id)),
            AppCommand::ClosePanel => self.set_panel(SidePanel::Hidden),
            AppCommand::CycleStatusFilter => {
                self.filter.status = next_status_filter(self.filter.status.as_deref());
                let label = match &self.filter.status {
                    Some(status) => format!("status filter: {status}"),
                    None => "status filter off".to_owned(),
                };
                vec![
                    AppEvent::FilterChanged(self.filter.clone()),
                    self.set_status(label),
                ]
            }
            AppCommand::CycleSort => {
                let keys = ArticleSortKey::ALL;
                let current = keys
                    .iter()
                    .position(|key| *key == self.filter.sort)
                    .unwrap_or(0);
                // Each key is visited descending, then ascending, before moving on.
                if self.filter.direction == SortDirection::Desc {
                    self.filter.direction = SortDirection::Asc;
                } else {
                    self.filter.sort = keys[(current + 1) % keys.len()];
                    self.filter.direction = SortDirection::Desc;
                }
                let label = format!(
                    "sort {} {}",
                    self.filter.sort.column(),
                    self.filter.direction.as_str()
                );
                vec![
                    AppEvent::FilterChanged(self.filter.clone()),
                    self.set_status(label),
                ]
            }
            AppCommand::SetSearch(term) => {
                let trimmed = term.trim();
                self.filter.search = (!trimmed.is_empty()).then(|| trimmed.to_owned());
                let mut events = vec![AppEvent::FilterChanged(self.filter.clone())];
                events.extend(self.set_mode(AppMode::Nav));
                events
            }
            AppCommand::ClearFilters => {
                self.filter = ArticleFilter::default();
                vec![
                    AppEvent::FilterChanged(self.filter.clone()),
                    self.set_status("filters cleared"),
                ]
            }
            AppCommand::SetStatus(message) => vec![self.set_status(&message)],
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }

    fn set_mode(&mut self, mode: AppMode) -> Vec<AppEvent> {
        self.mode = mode;
        vec![AppEvent::ModeChanged(mode)]
    }

    fn set_panel(&mut self, panel: SidePanel) -> Vec<AppEvent> {
        self.panel = panel;
        vec![AppEvent::PanelChanged(panel)]
    }

    fn set_status(&mut self, message: impl AsRef<str>) -> AppEvent {
        let message = message.as_ref().to_owned();
        self.status_line = Some(message.clone());
        AppEvent::StatusUpdated(message)
    }
}

fn next_status_filter(current: Option<&str>) -> Option<String> {
    let next_index = match current {
        None => 0,
        Some(status) => match STATUS_PIPELINE.iter().position(|known| *known == status) {
            Some(index) => index + 1,
            None => 0,
        },
    };
    STATUS_PIPELINE
        .get(next_index)
        .map(|status| (*status).to_owned())
}
