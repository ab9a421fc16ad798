use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use bgstats_terminal::export;
use bgstats_terminal::source::{self, LoadSettings};
use bgstats_terminal::state::{AppState, FilterEntry, Pane};
use bgstats_terminal::view::{Column, ViewMode, ViewTable};

struct App {
    state: AppState,
    settings: LoadSettings,
    should_quit: bool,
}

impl App {
    fn new(settings: LoadSettings) -> Self {
        let mut state = AppState::new(settings.source.clone(), settings.min_plays);
        state.set_load_result(source::load_dataset(&settings));
        Self {
            state,
            settings,
            should_quit: false,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if self.state.help_overlay {
            self.state.help_overlay = false;
            return;
        }
        if self.state.detail_open {
            match key.code {
                KeyCode::Char('q') => self.should_quit = true,
                KeyCode::Char('b') | KeyCode::Esc | KeyCode::Enter => self.state.close_detail(),
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') => self.state.help_overlay = true,
            KeyCode::Char('1') => self.state.set_view(ViewMode::Plays),
            KeyCode::Char('2') => self.state.set_view(ViewMode::Players),
            KeyCode::Char('3') => self.state.set_view(ViewMode::Games),
            KeyCode::Char('4') => self.state.set_view(ViewMode::GameByPlayer),
            KeyCode::Tab | KeyCode::Char('f') => self.state.toggle_pane(),
            KeyCode::Char('c') => self.state.toggle_coop(),
            KeyCode::Char('C') => self.state.toggle_competitive(),
            KeyCode::Char('x') => self.state.clear_filters(),
            KeyCode::Char('R') => self.reload(),
            KeyCode::Char('e') => self.export_current_view(),
            _ => match self.state.pane {
                Pane::Table => self.on_table_key(key),
                Pane::Filters => self.on_filter_key(key),
            },
        }
    }

    fn on_table_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
            KeyCode::Char('s') => self.state.cycle_sort(),
            KeyCode::Char('S') => self.state.toggle_sort_dir(),
            KeyCode::Char('d') | KeyCode::Enter => self.state.open_detail(),
            _ => {}
        }
    }

    fn on_filter_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.state.filter_cursor_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.filter_cursor_prev(),
            KeyCode::Char(' ') | KeyCode::Enter => self.state.filter_toggle(),
            KeyCode::Char('o') => self.state.toggle_focused_combinator(),
            KeyCode::Char('h') | KeyCode::Left => self.state.filter_adjust(-1),
            KeyCode::Char('l') | KeyCode::Right => self.state.filter_adjust(1),
            KeyCode::Backspace | KeyCode::Delete => self.state.filter_clear_entry(),
            _ => {}
        }
    }

    fn reload(&mut self) {
        self.state.push_log("[INFO] Reloading dataset");
        self.state.set_load_result(source::load_dataset(&self.settings));
    }

    fn export_current_view(&mut self) {
        let Some(table) = &self.state.table else {
            self.state.push_log("[INFO] Nothing to export");
            return;
        };
        let path = export::default_export_path(table.mode);
        match export::export_view(&path, table) {
            Ok(rows) => {
                self.state
                    .push_log(format!("[INFO] Exported {rows} rows to {}", path.display()));
            }
            Err(err) => {
                self.state.push_log(format!("[WARN] Export failed: {err:#}"));
            }
        }
    }
}

fn main() -> io::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let settings = LoadSettings::from_env_and_args(std::env::args().skip(1));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let mut app = App::new(settings);
    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            app.on_key(key);
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(5),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    render_body(frame, chunks[1], &app.state);
    render_console(frame, chunks[2], &app.state);

    let footer = Paragraph::new(footer_text(&app.state));
    frame.render_widget(footer, chunks[3]);

    if app.state.detail_open {
        render_detail_overlay(frame, frame.size(), &app.state);
    }
    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let sort = state
        .table
        .as_ref()
        .map(|t| {
            let title = t
                .columns
                .iter()
                .find(|c| c.key == t.sort_key)
                .map(|c| c.title)
                .unwrap_or(t.sort_key);
            format!("{title} {}", t.sort_dir.arrow())
        })
        .unwrap_or_else(|| "-".to_string());
    let line1 = format!(
        "BGSTATS TERMINAL | {} | Sort: {sort} | Pane: {}",
        state.view_mode.label(),
        match state.pane {
            Pane::Table => "TABLE",
            Pane::Filters => "FILTERS",
        }
    );
    let line2 = format!("{} | {}", state.status, state.source_label);
    format!("{line1}\n{line2}")
}

fn footer_text(state: &AppState) -> String {
    match state.pane {
        Pane::Table => {
            "1-4 View | Tab Filters | j/k Move | s Sort | S Dir | Enter Detail | e Export | x Clear | R Reload | ? Help | q Quit"
                .to_string()
        }
        Pane::Filters => {
            "1-4 View | Tab Table | j/k Move | Space Toggle | o OR/AND | h/l Adjust | Bksp Clear field | x Clear all | ? Help | q Quit"
                .to_string()
        }
    }
}

fn render_body(frame: &mut Frame, area: Rect, state: &AppState) {
    if let Some(error) = &state.load_error {
        let msg = Paragraph::new(format!("Dataset load failed:\n{error}\n\nPress R to retry."))
            .style(Style::default().fg(Color::Red))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(msg, area);
        return;
    }

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(34), Constraint::Min(30)])
        .split(area);

    render_filter_pane(frame, columns[0], state);
    render_table(frame, columns[1], state);
}

fn render_filter_pane(frame: &mut Frame, area: Rect, state: &AppState) {
    let focused = state.pane == Pane::Filters;
    let block = Block::default()
        .title("Filters")
        .borders(Borders::ALL)
        .border_style(if focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        });
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let entries = state.filter_entries();
    let visible = inner.height as usize;
    let (start, end) = visible_range(state.filter_cursor, entries.len(), visible);

    for (i, idx) in (start..end).enumerate() {
        let row_area = Rect {
            x: inner.x,
            y: inner.y + i as u16,
            width: inner.width,
            height: 1,
        };
        let selected = focused && idx == state.filter_cursor;
        let style = if selected {
            Style::default().fg(Color::White).bg(Color::DarkGray)
        } else {
            Style::default()
        };
        let line = filter_entry_line(state, entries[idx]);
        frame.render_widget(Paragraph::new(line).style(style), row_area);
    }
}

fn filter_entry_line(state: &AppState, entry: FilterEntry) -> String {
    let c = &state.criteria;
    match entry {
        FilterEntry::Year => format!(
            "Year: {}",
            c.year.clone().unwrap_or_else(|| "all".to_string())
        ),
        FilterEntry::MinDuration => format!("Min time (min): {}", minutes_label(c.min_duration_min)),
        FilterEntry::MaxDuration => format!("Max time (min): {}", minutes_label(c.max_duration_min)),
        FilterEntry::LocationMode => format!("Locations [{}]", c.location_mode.label()),
        FilterEntry::Location(idx) => {
            let (id, name) = &state.location_options()[idx];
            format!("  [{}] {name}", mark(c.locations.contains(id)))
        }
        FilterEntry::PlayerMode => format!("Players [{}]", c.player_mode.label()),
        FilterEntry::Player(idx) => {
            let (id, name) = &state.player_options()[idx];
            format!("  [{}] {name}", mark(c.players.contains(id)))
        }
        FilterEntry::Coop => format!("[{}] Include coop", mark(c.include_coop)),
        FilterEntry::Competitive => format!("[{}] Include competitive", mark(c.include_competitive)),
        FilterEntry::MinPlays => format!("Min plays (lifetime): {}", c.min_plays),
    }
}

fn minutes_label(bound: Option<u32>) -> String {
    match bound {
        Some(v) => v.to_string(),
        None => "-".to_string(),
    }
}

fn mark(on: bool) -> &'static str {
    if on { "x" } else { " " }
}

fn render_table(frame: &mut Frame, area: Rect, state: &AppState) {
    let Some(table) = &state.table else {
        let empty = Paragraph::new("No data loaded").style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, area);
        return;
    };

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(area);

    let widths = column_widths(&table.columns);
    render_table_header(frame, sections[0], table, &widths);

    let list_area = sections[1];
    if table.rows.is_empty() {
        let empty =
            Paragraph::new("No rows match the filters").style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, list_area);
        return;
    }
    if list_area.height == 0 {
        return;
    }

    let visible = list_area.height as usize;
    let (start, end) = visible_range(state.selected, table.rows.len(), visible);

    for (i, idx) in (start..end).enumerate() {
        let row_area = Rect {
            x: list_area.x,
            y: list_area.y + i as u16,
            width: list_area.width,
            height: 1,
        };
        let selected = state.pane == Pane::Table && idx == state.selected;
        let row_style = if selected {
            Style::default().fg(Color::White).bg(Color::DarkGray)
        } else {
            Style::default()
        };
        if selected {
            frame.render_widget(Block::default().style(row_style), row_area);
        }

        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(widths.clone())
            .split(row_area);
        for (col_idx, column) in table.columns.iter().enumerate() {
            let text = table.cell_text(idx, column.key);
            render_cell_text(frame, cols[col_idx], &text, row_style);
        }
    }
}

fn render_table_header(frame: &mut Frame, area: Rect, table: &ViewTable, widths: &[Constraint]) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(widths.to_vec())
        .split(area);
    let style = Style::default().add_modifier(Modifier::BOLD);
    for (idx, column) in table.columns.iter().enumerate() {
        let title = if column.key == table.sort_key {
            format!("{} {}", column.title, table.sort_dir.arrow())
        } else {
            column.title.to_string()
        };
        render_cell_text(frame, cols[idx], &title, style);
    }
}

fn column_widths(columns: &[Column]) -> Vec<Constraint> {
    columns
        .iter()
        .map(|c| match c.key {
            "date" => Constraint::Length(20),
            "year" => Constraint::Length(6),
            "time" | "plays" | "wins" => Constraint::Length(11),
            "total_plays" | "distinct_games" | "distinct_players" => Constraint::Length(16),
            "hours" | "avg_min" | "winrate" => Constraint::Length(11),
            "players" | "winners" | "scores" => Constraint::Min(14),
            _ => Constraint::Min(12),
        })
        .collect()
}

fn render_cell_text(frame: &mut Frame, area: Rect, text: &str, style: Style) {
    let paragraph = Paragraph::new(text).style(style);
    frame.render_widget(paragraph, area);
}

fn render_console(frame: &mut Frame, area: Rect, state: &AppState) {
    let text = if state.logs.is_empty() {
        "No messages yet".to_string()
    } else {
        state
            .logs
            .iter()
            .rev()
            .take(3)
            .cloned()
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect::<Vec<_>>()
            .join("\n")
    };
    let console = Paragraph::new(text).block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, area);
}

fn render_detail_overlay(frame: &mut Frame, area: Rect, state: &AppState) {
    let Some(table) = &state.table else {
        return;
    };
    let Some(detail) = table
        .rows
        .get(state.selected)
        .and_then(|row| row.detail.as_ref())
    else {
        return;
    };

    let popup_area = centered_rect(70, 70, area);
    frame.render_widget(Clear, popup_area);
    let block = Block::default()
        .title(format!("{} - players", detail.title))
        .borders(Borders::ALL);
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);
    if inner.height < 2 || inner.width == 0 {
        return;
    }

    let widths: Vec<Constraint> = detail
        .columns
        .iter()
        .enumerate()
        .map(|(i, _)| {
            if i == 0 {
                Constraint::Min(14)
            } else {
                Constraint::Length(10)
            }
        })
        .collect();

    let header_area = Rect { height: 1, ..inner };
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(widths.clone())
        .split(header_area);
    let bold = Style::default().add_modifier(Modifier::BOLD);
    for (idx, column) in detail.columns.iter().enumerate() {
        render_cell_text(frame, cols[idx], column.title, bold);
    }

    let max_rows = (inner.height - 1) as usize;
    for (i, row) in detail.rows.iter().take(max_rows).enumerate() {
        let row_area = Rect {
            x: inner.x,
            y: inner.y + 1 + i as u16,
            width: inner.width,
            height: 1,
        };
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(widths.clone())
            .split(row_area);
        for (idx, column) in detail.columns.iter().enumerate() {
            let text = row
                .get(column.key)
                .map(|c| c.to_string())
                .unwrap_or_default();
            render_cell_text(frame, cols[idx], &text, Style::default());
        }
    }
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "BGStats Terminal - Help",
        "",
        "Views:",
        "  1  Plays    2  Players",
        "  3  Games    4  Game x Player",
        "",
        "Table:",
        "  j/k or ↑/↓   Move",
        "  s / S        Sort column / direction",
        "  Enter / d    Game detail (Games view)",
        "",
        "Filters (Tab or f to focus):",
        "  j/k          Move between fields",
        "  Space/Enter  Toggle selection",
        "  o            Toggle OR/AND for the focused list",
        "  h/l or ←/→   Adjust value",
        "  Backspace    Clear field",
        "",
        "Global:",
        "  c / C        Toggle coop / competitive plays",
        "  e  Export view to xlsx",
        "  x  Clear all filters",
        "  R  Reload dataset",
        "  q  Quit",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn visible_range(selected: usize, total: usize, visible: usize) -> (usize, usize) {
    if total == 0 || visible == 0 {
        return (0, 0);
    }
    if total <= visible {
        return (0, total);
    }

    let mut start = selected.saturating_sub(visible / 2);
    if start + visible > total {
        start = total - visible;
    }
    (start, start + visible)
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
