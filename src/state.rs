use std::collections::VecDeque;

use crate::dataset::{Dataset, Id};
use crate::filter::FilterCriteria;
use crate::view::{self, ViewMode, ViewTable};

const LOG_CAPACITY: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    Table,
    Filters,
}

/// One addressable row of the filter pane. List entries index into the
/// cached option vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterEntry {
    Year,
    MinDuration,
    MaxDuration,
    LocationMode,
    Location(usize),
    PlayerMode,
    Player(usize),
    Coop,
    Competitive,
    MinPlays,
}

pub struct AppState {
    pub dataset: Option<Dataset>,
    pub load_error: Option<String>,
    pub source_label: String,
    pub criteria: FilterCriteria,
    pub view_mode: ViewMode,
    pub table: Option<ViewTable>,
    pub selected: usize,
    pub detail_open: bool,
    pub pane: Pane,
    pub filter_cursor: usize,
    pub help_overlay: bool,
    pub status: String,
    pub logs: VecDeque<String>,
    // Threshold from the startup configuration; clear-filters restores it.
    startup_min_plays: u32,
    // Filter option lists, cached once per loaded dataset.
    years: Vec<String>,
    location_options: Vec<(Id, String)>,
    player_options: Vec<(Id, String)>,
}

impl AppState {
    pub fn new(source_label: String, min_plays: u32) -> Self {
        AppState {
            dataset: None,
            load_error: None,
            source_label,
            criteria: FilterCriteria {
                min_plays,
                ..FilterCriteria::default()
            },
            view_mode: ViewMode::Plays,
            table: None,
            selected: 0,
            detail_open: false,
            pane: Pane::Table,
            filter_cursor: 0,
            help_overlay: false,
            status: "Loading...".to_string(),
            logs: VecDeque::new(),
            startup_min_plays: min_plays,
            years: Vec::new(),
            location_options: Vec::new(),
            player_options: Vec::new(),
        }
    }

    /// Apply the outcome of a (re)load. A failure halts rendering until the
    /// next reload; no partial data is shown.
    pub fn set_load_result(&mut self, result: anyhow::Result<Dataset>) {
        match result {
            Ok(dataset) => {
                self.years = dataset.years();
                self.location_options = dataset.used_locations();
                self.player_options = dataset.players_sorted();
                let plays = dataset.plays.len();
                self.dataset = Some(dataset);
                self.load_error = None;
                let source = self.source_label.clone();
                self.push_log(format!("[INFO] Loaded {plays} plays from {source}"));
                self.recompute();
            }
            Err(err) => {
                self.dataset = None;
                self.table = None;
                self.years.clear();
                self.location_options.clear();
                self.player_options.clear();
                let msg = format!("{err:#}");
                self.status = format!("Error: {msg}");
                self.load_error = Some(msg);
                self.push_log("[WARN] Dataset load failed");
            }
        }
    }

    /// Re-run the whole pipeline against the current criteria. Idempotent;
    /// keeps the user's sort choice when the view did not change.
    pub fn recompute(&mut self) {
        let Some(dataset) = &self.dataset else {
            return;
        };
        let mut table = view::compute_view(dataset, &self.criteria, self.view_mode);
        if let Some(prev) = &self.table
            && prev.mode == table.mode
            && table.columns.iter().any(|c| c.key == prev.sort_key)
        {
            table.sort_key = prev.sort_key;
            table.sort_dir = prev.sort_dir;
            table.sort_rows();
        }
        self.status = format!(
            "Filtered: {} / {} plays",
            table.filtered_plays, table.total_plays
        );
        self.table = Some(table);
        self.clamp_selection();
    }

    pub fn set_view(&mut self, mode: ViewMode) {
        if self.view_mode != mode {
            self.view_mode = mode;
            self.detail_open = false;
            self.selected = 0;
            self.recompute();
        }
    }

    pub fn row_count(&self) -> usize {
        self.table.as_ref().map(|t| t.rows.len()).unwrap_or(0)
    }

    pub fn select_next(&mut self) {
        let len = self.row_count();
        if len > 0 && self.selected + 1 < len {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn clamp_selection(&mut self) {
        let len = self.row_count();
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }

    pub fn cycle_sort(&mut self) {
        if let Some(table) = &mut self.table {
            table.cycle_sort_key();
        }
    }

    pub fn toggle_sort_dir(&mut self) {
        if let Some(table) = &mut self.table {
            table.toggle_sort_dir();
        }
    }

    /// Selected game's breakdown, Games view only.
    pub fn open_detail(&mut self) {
        let has_detail = self
            .table
            .as_ref()
            .and_then(|t| t.rows.get(self.selected))
            .is_some_and(|row| row.detail.is_some());
        if has_detail {
            self.detail_open = true;
        }
    }

    pub fn close_detail(&mut self) {
        self.detail_open = false;
    }

    pub fn toggle_pane(&mut self) {
        self.pane = match self.pane {
            Pane::Table => Pane::Filters,
            Pane::Filters => Pane::Table,
        };
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        if self.logs.len() == LOG_CAPACITY {
            self.logs.pop_front();
        }
        self.logs.push_back(msg.into());
    }

    pub fn year_options(&self) -> &[String] {
        &self.years
    }

    pub fn location_options(&self) -> &[(Id, String)] {
        &self.location_options
    }

    pub fn player_options(&self) -> &[(Id, String)] {
        &self.player_options
    }

    /// The filter pane rows, top to bottom.
    pub fn filter_entries(&self) -> Vec<FilterEntry> {
        let mut entries = vec![
            FilterEntry::Year,
            FilterEntry::MinDuration,
            FilterEntry::MaxDuration,
            FilterEntry::LocationMode,
        ];
        entries.extend((0..self.location_options.len()).map(FilterEntry::Location));
        entries.push(FilterEntry::PlayerMode);
        entries.extend((0..self.player_options.len()).map(FilterEntry::Player));
        entries.push(FilterEntry::Coop);
        entries.push(FilterEntry::Competitive);
        entries.push(FilterEntry::MinPlays);
        entries
    }

    pub fn current_filter_entry(&self) -> Option<FilterEntry> {
        self.filter_entries().get(self.filter_cursor).copied()
    }

    pub fn filter_cursor_next(&mut self) {
        let len = self.filter_entries().len();
        if len > 0 && self.filter_cursor + 1 < len {
            self.filter_cursor += 1;
        }
    }

    pub fn filter_cursor_prev(&mut self) {
        self.filter_cursor = self.filter_cursor.saturating_sub(1);
    }

    /// Space/Enter on the focused filter row.
    pub fn filter_toggle(&mut self) {
        let Some(entry) = self.current_filter_entry() else {
            return;
        };
        match entry {
            FilterEntry::LocationMode => {
                self.criteria.location_mode = self.criteria.location_mode.toggled();
            }
            FilterEntry::PlayerMode => {
                self.criteria.player_mode = self.criteria.player_mode.toggled();
            }
            FilterEntry::Location(idx) => {
                if let Some(&(id, _)) = self.location_options.get(idx) {
                    toggle_membership(&mut self.criteria.locations, id);
                }
            }
            FilterEntry::Player(idx) => {
                if let Some(&(id, _)) = self.player_options.get(idx) {
                    toggle_membership(&mut self.criteria.players, id);
                }
            }
            FilterEntry::Coop => {
                self.criteria.include_coop = !self.criteria.include_coop;
            }
            FilterEntry::Competitive => {
                self.criteria.include_competitive = !self.criteria.include_competitive;
            }
            FilterEntry::Year
            | FilterEntry::MinDuration
            | FilterEntry::MaxDuration
            | FilterEntry::MinPlays => {}
        }
        self.recompute();
    }

    /// Left/right on the focused filter row: cycle the year, step the
    /// numeric fields, toggle everything else.
    pub fn filter_adjust(&mut self, delta: i64) {
        let Some(entry) = self.current_filter_entry() else {
            return;
        };
        match entry {
            FilterEntry::Year => self.cycle_year(delta),
            FilterEntry::MinDuration => {
                step_minutes(&mut self.criteria.min_duration_min, delta);
            }
            FilterEntry::MaxDuration => {
                step_minutes(&mut self.criteria.max_duration_min, delta);
            }
            FilterEntry::MinPlays => {
                let cur = i64::from(self.criteria.min_plays) + delta;
                self.criteria.min_plays = cur.max(0) as u32;
            }
            _ => {
                self.filter_toggle();
                return;
            }
        }
        self.recompute();
    }

    /// Backspace/Delete clears the focused filter row. For the duration
    /// bounds this is the only way back to "no constraint"; a bound of 0
    /// still excludes unknown durations.
    pub fn filter_clear_entry(&mut self) {
        let Some(entry) = self.current_filter_entry() else {
            return;
        };
        match entry {
            FilterEntry::Year => self.criteria.year = None,
            FilterEntry::MinDuration => self.criteria.min_duration_min = None,
            FilterEntry::MaxDuration => self.criteria.max_duration_min = None,
            FilterEntry::MinPlays => self.criteria.min_plays = 0,
            FilterEntry::Location(_) | FilterEntry::LocationMode => {
                self.criteria.locations.clear();
            }
            FilterEntry::Player(_) | FilterEntry::PlayerMode => {
                self.criteria.players.clear();
            }
            FilterEntry::Coop => self.criteria.include_coop = true,
            FilterEntry::Competitive => self.criteria.include_competitive = true,
        }
        self.recompute();
    }

    /// `o` shortcut: flip the OR/AND mode of the list section the filter
    /// cursor is in.
    pub fn toggle_focused_combinator(&mut self) {
        match self.current_filter_entry() {
            Some(FilterEntry::LocationMode | FilterEntry::Location(_)) => {
                self.criteria.location_mode = self.criteria.location_mode.toggled();
            }
            Some(FilterEntry::PlayerMode | FilterEntry::Player(_)) => {
                self.criteria.player_mode = self.criteria.player_mode.toggled();
            }
            _ => return,
        }
        self.recompute();
    }

    pub fn toggle_coop(&mut self) {
        self.criteria.include_coop = !self.criteria.include_coop;
        self.recompute();
    }

    pub fn toggle_competitive(&mut self) {
        self.criteria.include_competitive = !self.criteria.include_competitive;
        self.recompute();
    }

    fn cycle_year(&mut self, delta: i64) {
        // Position 0 is "all years", then the dataset's years ascending.
        let total = self.years.len() as i64 + 1;
        let current = match &self.criteria.year {
            None => 0,
            Some(y) => self
                .years
                .iter()
                .position(|cand| cand == y)
                .map(|i| i as i64 + 1)
                .unwrap_or(0),
        };
        let next = (current + delta).rem_euclid(total);
        self.criteria.year = if next == 0 {
            None
        } else {
            Some(self.years[(next - 1) as usize].clone())
        };
    }

    /// Reset every criterion without persisting anything. The threshold
    /// goes back to the startup configuration, discarding any in-session
    /// adjustment.
    pub fn clear_filters(&mut self) {
        self.criteria = FilterCriteria {
            min_plays: self.startup_min_plays,
            ..FilterCriteria::default()
        };
        self.push_log("[INFO] Filters cleared");
        self.recompute();
    }
}

fn toggle_membership(set: &mut Vec<Id>, id: Id) {
    if let Some(pos) = set.iter().position(|&x| x == id) {
        set.remove(pos);
    } else {
        set.push(id);
    }
}

const MINUTE_STEP: i64 = 5;

fn step_minutes(bound: &mut Option<u32>, delta: i64) {
    let cur = bound.map(i64::from).unwrap_or(0);
    let next = (cur + delta * MINUTE_STEP).max(0);
    *bound = Some(next as u32);
}
