mod report;
mod search;

use crate::domain::AssetSnapshot;
use crate::infra::{SyncOutput, SyncReport};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::{Instant, SystemTime};
use thiserror::Error;

pub use report::{ReportRow, ReportSection, Tone, build_report, report_line_count};
pub use search::{SearchInput, owner_matches};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("terminal I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Clone, Debug, Default)]
pub struct AppData {
    pub snapshots: Vec<AssetSnapshot>,
    pub last_report: Option<SyncReport>,
    pub synced_at: Option<SystemTime>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SyncState {
    Idle,
    InFlight { generation: u64, started_at: Instant },
}

impl SyncState {
    pub fn is_in_flight(self) -> bool {
        matches!(self, Self::InFlight { .. })
    }
}

/// What a finished sync worker reports back. `Err` carries a listing failure, rendered
/// for the notice line.
pub type SyncResult = Result<SyncOutput, String>;

#[derive(Clone, Debug)]
pub struct AppModel {
    pub data: AppData,
    pub source_label: String,
    pub view: View,
    pub search: SearchInput,
    pub sync: SyncState,
    pub terminal_size: (u16, u16),
    pub notice: Option<String>,
    pub help_open: bool,
    next_generation: u64,
}

impl AppModel {
    pub fn new(source_label: String) -> Self {
        Self {
            data: AppData::default(),
            source_label,
            view: View::List(ListView::new(0)),
            search: SearchInput::new(),
            sync: SyncState::Idle,
            terminal_size: (0, 0),
            notice: None,
            help_open: false,
            next_generation: 1,
        }
    }

    pub fn with_terminal_size(mut self, width: u16, height: u16) -> Self {
        self.terminal_size = (width, height);
        self
    }

    pub fn with_notice(mut self, notice: Option<String>) -> Self {
        self.notice = notice;
        self
    }

    pub fn begin_sync(&mut self) -> Option<u64> {
        if self.sync.is_in_flight() {
            return None;
        }
        let generation = self.next_generation;
        self.next_generation += 1;
        self.sync = SyncState::InFlight {
            generation,
            started_at: Instant::now(),
        };
        Some(generation)
    }

    /// Applies a worker's result. Results from any generation other than the in-flight one
    /// are dropped.
    pub fn finish_sync(&mut self, generation: u64, result: SyncResult) {
        match self.sync {
            SyncState::InFlight {
                generation: current,
                ..
            } if current == generation => {}
            _ => {
                tracing::debug!(generation, "discarding stale sync result");
                return;
            }
        }
        self.sync = SyncState::Idle;

        match result {
            Ok(output) => {
                let notice = (!output.failures.is_empty()).then(|| {
                    format!(
                        "{} of {} snapshots failed to load.",
                        output.failures.len(),
                        output.report.resolved
                    )
                });
                self.data = AppData {
                    snapshots: output.snapshots,
                    last_report: Some(output.report),
                    synced_at: Some(SystemTime::now()),
                };
                self.search.clear();
                self.view = View::List(ListView::new(self.data.snapshots.len()));
                self.notice = notice;
            }
            Err(message) => {
                self.notice = Some(format!("Sync failed: {message}"));
            }
        }
    }

    pub fn detail_snapshot(&self) -> Option<&AssetSnapshot> {
        match &self.view {
            View::Detail(detail) => self.data.snapshots.get(detail.snapshot_index),
            View::List(_) => None,
        }
    }

    pub fn header(&self) -> HeaderSummary {
        let focus = match &self.view {
            View::Detail(detail) => self.data.snapshots.get(detail.snapshot_index),
            View::List(list) => list
                .filtered_indices
                .first()
                .and_then(|index| self.data.snapshots.get(*index)),
        };
        match focus {
            Some(snapshot) => HeaderSummary::for_snapshot(snapshot),
            None => HeaderSummary::neutral(),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HeaderSummary {
    pub owner_name: String,
    pub initials: String,
    pub last_updated: String,
}

impl HeaderSummary {
    pub fn neutral() -> Self {
        Self {
            owner_name: String::new(),
            initials: String::new(),
            last_updated: "Last updated: Never".to_string(),
        }
    }

    pub fn for_snapshot(snapshot: &AssetSnapshot) -> Self {
        let timestamp = snapshot
            .timestamp
            .as_deref()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or("Unknown");
        Self {
            owner_name: snapshot.owner_name.clone(),
            initials: owner_initials(&snapshot.owner_name),
            last_updated: format!("Last updated: {timestamp}"),
        }
    }
}

pub fn owner_initials(owner_name: &str) -> String {
    owner_name
        .split(' ')
        .filter_map(|part| part.chars().next())
        .take(2)
        .flat_map(char::to_uppercase)
        .collect()
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum View {
    List(ListView),
    Detail(DetailView),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ListView {
    pub filtered_indices: Vec<usize>,
    pub selected: usize,
}

impl ListView {
    pub fn new(total: usize) -> Self {
        Self {
            filtered_indices: (0..total).collect(),
            selected: 0,
        }
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.filtered_indices.get(self.selected).copied()
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DetailView {
    pub from_list: ListView,
    pub snapshot_index: usize,
    pub scroll: u16,
}

#[derive(Clone, Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Paste(String),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AppCommand {
    None,
    Quit,
    Sync { generation: u64 },
}

pub fn update(model: AppModel, event: AppEvent) -> (AppModel, AppCommand) {
    match event {
        AppEvent::Key(key) => update_on_key(model, key),
        AppEvent::Paste(text) => update_on_paste(model, text),
    }
}

fn update_on_key(mut model: AppModel, key: KeyEvent) -> (AppModel, AppCommand) {
    model.notice = None;
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    if ctrl && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q')) {
        return (model, AppCommand::Quit);
    }
    if (ctrl && key.code == KeyCode::Char('r')) || key.code == KeyCode::F(5) {
        return request_sync(model);
    }
    if key.code == KeyCode::F(1) {
        model.help_open = !model.help_open;
        return (model, AppCommand::None);
    }
    if model.help_open {
        if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')) {
            model.help_open = false;
        }
        return (model, AppCommand::None);
    }

    match model.view.clone() {
        View::List(view) => update_list(model, view, key),
        View::Detail(view) => update_detail(model, view, key),
    }
}

fn update_on_paste(mut model: AppModel, text: String) -> (AppModel, AppCommand) {
    if model.help_open {
        return (model, AppCommand::None);
    }
    model.search.insert_str(&text);
    (search_changed(model), AppCommand::None)
}

fn request_sync(mut model: AppModel) -> (AppModel, AppCommand) {
    match model.begin_sync() {
        Some(generation) => (model, AppCommand::Sync { generation }),
        None => {
            model.notice = Some("Sync already in progress.".to_string());
            (model, AppCommand::None)
        }
    }
}

fn update_list(mut model: AppModel, mut view: ListView, key: KeyEvent) -> (AppModel, AppCommand) {
    let last = view.filtered_indices.len().saturating_sub(1);
    match key.code {
        KeyCode::Enter => {
            let Some(snapshot_index) = view.selected_index() else {
                return (model, AppCommand::None);
            };
            model.view = View::Detail(DetailView {
                from_list: view,
                snapshot_index,
                scroll: 0,
            });
            return (model, AppCommand::None);
        }
        KeyCode::Esc => {
            if !model.search.is_empty() {
                model.search.clear();
                return (search_changed(model), AppCommand::None);
            }
        }
        KeyCode::Up => view.selected = view.selected.saturating_sub(1),
        KeyCode::Down => view.selected = (view.selected + 1).min(last),
        KeyCode::PageUp => {
            view.selected = view
                .selected
                .saturating_sub(page_step_list(model.terminal_size));
        }
        KeyCode::PageDown => {
            view.selected = (view.selected + page_step_list(model.terminal_size)).min(last);
        }
        KeyCode::Home => view.selected = 0,
        KeyCode::End => view.selected = last,
        KeyCode::Left => model.search.move_left(),
        KeyCode::Right => model.search.move_right(),
        KeyCode::Backspace => {
            if model.search.backspace() {
                return (search_changed(model), AppCommand::None);
            }
        }
        KeyCode::Delete => {
            if model.search.delete_forward() {
                return (search_changed(model), AppCommand::None);
            }
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            model.search.clear();
            return (search_changed(model), AppCommand::None);
        }
        KeyCode::Char(ch) if is_text_input(key, ch) => {
            model.search.insert_char(ch);
            return (search_changed(model), AppCommand::None);
        }
        _ => {}
    }
    model.view = View::List(view);
    (model, AppCommand::None)
}

fn update_detail(
    mut model: AppModel,
    mut view: DetailView,
    key: KeyEvent,
) -> (AppModel, AppCommand) {
    let max_scroll = detail_max_scroll(&model, &view);
    let page = page_step_detail(model.terminal_size);
    match key.code {
        KeyCode::Esc | KeyCode::Backspace | KeyCode::Left => {
            model.view = View::List(view.from_list);
            return (search_changed(model), AppCommand::None);
        }
        KeyCode::Up => view.scroll = view.scroll.saturating_sub(1),
        KeyCode::Down => view.scroll = view.scroll.saturating_add(1).min(max_scroll),
        KeyCode::PageUp => view.scroll = view.scroll.saturating_sub(page),
        KeyCode::PageDown => view.scroll = view.scroll.saturating_add(page).min(max_scroll),
        KeyCode::Home => view.scroll = 0,
        KeyCode::End => view.scroll = max_scroll,
        KeyCode::Char(ch) if is_text_input(key, ch) => {
            model.view = View::List(view.from_list);
            model.search.insert_char(ch);
            return (search_changed(model), AppCommand::None);
        }
        _ => {}
    }
    model.view = View::Detail(view);
    (model, AppCommand::None)
}

fn search_changed(mut model: AppModel) -> AppModel {
    let mut view = match &model.view {
        View::List(view) => view.clone(),
        View::Detail(view) => view.from_list.clone(),
    };
    apply_owner_filter(&model.data.snapshots, &model.search, &mut view);
    model.view = View::List(view);
    model
}

fn apply_owner_filter(snapshots: &[AssetSnapshot], search: &SearchInput, view: &mut ListView) {
    let needle = search.needle();
    view.filtered_indices = snapshots
        .iter()
        .enumerate()
        .filter_map(|(index, snapshot)| {
            owner_matches(&needle, &snapshot.owner_name).then_some(index)
        })
        .collect();

    if view.filtered_indices.is_empty() {
        view.selected = 0;
    } else {
        view.selected = view.selected.min(view.filtered_indices.len() - 1);
    }
}

fn is_text_input(key: KeyEvent, ch: char) -> bool {
    !ch.is_control()
        && !key.modifiers.contains(KeyModifiers::CONTROL)
        && !key.modifiers.contains(KeyModifiers::ALT)
}

fn detail_max_scroll(model: &AppModel, view: &DetailView) -> u16 {
    let Some(snapshot) = model.data.snapshots.get(view.snapshot_index) else {
        return 0;
    };
    let lines = report_line_count(&build_report(snapshot));
    let viewport = usize::from(detail_viewport_height(model.terminal_size));
    u16::try_from(lines.saturating_sub(viewport)).unwrap_or(u16::MAX)
}

fn inner_terminal_size(terminal_size: (u16, u16)) -> (u16, u16) {
    let (width, height) = terminal_size;
    if width < 40 || height < 12 {
        return (width, height);
    }
    (width.saturating_sub(4), height.saturating_sub(2))
}

/// Rows left for the body once the header (3), search box (3) and footer (1) are drawn.
pub fn body_height(terminal_size: (u16, u16)) -> u16 {
    let (_width, height) = inner_terminal_size(terminal_size);
    height.saturating_sub(7)
}

pub fn detail_viewport_height(terminal_size: (u16, u16)) -> u16 {
    body_height(terminal_size).saturating_sub(2) // block borders
}

fn page_step_list(terminal_size: (u16, u16)) -> usize {
    // two lines per row, inside a bordered block
    usize::from(body_height(terminal_size).saturating_sub(2) / 2).max(1)
}

fn page_step_detail(terminal_size: (u16, u16)) -> u16 {
    detail_viewport_height(terminal_size).saturating_sub(1).max(1)
}
