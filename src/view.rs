use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use crate::aggregate;
use crate::dataset::Dataset;
use crate::filter::{self, FilterCriteria};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Plays,
    Players,
    Games,
    GameByPlayer,
}

impl ViewMode {
    pub const ALL: [ViewMode; 4] = [
        ViewMode::Plays,
        ViewMode::Players,
        ViewMode::Games,
        ViewMode::GameByPlayer,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ViewMode::Plays => "PLAYS",
            ViewMode::Players => "PLAYERS",
            ViewMode::Games => "GAMES",
            ViewMode::GameByPlayer => "GAME x PLAYER",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub title: &'static str,
    pub key: &'static str,
}

const fn col(title: &'static str, key: &'static str) -> Column {
    Column { title, key }
}

/// Display values are strings and numbers only; no nested structure leaks
/// to the renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Int(i64),
    Float(f64),
}

impl Cell {
    /// Formatted numeric text ("0.8", "83.3%") still sorts numerically.
    fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Int(n) => Some(*n as f64),
            Cell::Float(f) => Some(*f),
            Cell::Text(s) => {
                let t = s.trim().trim_end_matches('%');
                if t.is_empty() { None } else { t.parse::<f64>().ok() }
            }
        }
    }

    /// Numbers before text so numeric columns with blank unknowns still
    /// order sensibly; blanks group together at the text end.
    pub fn compare(&self, other: &Cell) -> Ordering {
        match (self.as_number(), other.as_number()) {
            (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => self.to_string().cmp(&other.to_string()),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            Cell::Int(n) => write!(f, "{n}"),
            Cell::Float(v) => write!(f, "{v}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDir {
    Asc,
    Desc,
}

impl SortDir {
    pub fn toggled(self) -> SortDir {
        match self {
            SortDir::Asc => SortDir::Desc,
            SortDir::Desc => SortDir::Asc,
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            SortDir::Asc => "^",
            SortDir::Desc => "v",
        }
    }
}

pub type Cells = HashMap<&'static str, Cell>;

#[derive(Debug, Clone)]
pub struct ViewRow {
    pub cells: Cells,
    /// Games view only: the per-player breakdown, shown on demand.
    pub detail: Option<ViewDetail>,
}

#[derive(Debug, Clone)]
pub struct ViewDetail {
    pub title: String,
    pub columns: Vec<Column>,
    pub rows: Vec<Cells>,
}

#[derive(Debug, Clone)]
pub struct ViewTable {
    pub mode: ViewMode,
    pub columns: Vec<Column>,
    pub rows: Vec<ViewRow>,
    pub sort_key: &'static str,
    pub sort_dir: SortDir,
    pub filtered_plays: usize,
    pub total_plays: usize,
}

impl ViewTable {
    pub fn cell_text(&self, row: usize, key: &str) -> String {
        self.rows[row]
            .cells
            .get(key)
            .map(|c| c.to_string())
            .unwrap_or_default()
    }

    /// Advance the sort column, wrapping, keeping the direction.
    pub fn cycle_sort_key(&mut self) {
        let idx = self
            .columns
            .iter()
            .position(|c| c.key == self.sort_key)
            .unwrap_or(0);
        self.sort_key = self.columns[(idx + 1) % self.columns.len()].key;
        self.sort_rows();
    }

    pub fn toggle_sort_dir(&mut self) {
        self.sort_dir = self.sort_dir.toggled();
        self.sort_rows();
    }

    pub fn sort_rows(&mut self) {
        let key = self.sort_key;
        let dir = self.sort_dir;
        let empty = Cell::Text(String::new());
        self.rows.sort_by(|a, b| {
            let ca = a.cells.get(key).unwrap_or(&empty);
            let cb = b.cells.get(key).unwrap_or(&empty);
            match dir {
                SortDir::Asc => ca.compare(cb),
                SortDir::Desc => cb.compare(ca),
            }
        });
    }
}

/// The whole pipeline as a pure function: select, aggregate, format, apply
/// the view's default sort. No state is kept between calls.
pub fn compute_view(dataset: &Dataset, criteria: &FilterCriteria, mode: ViewMode) -> ViewTable {
    let plays = filter::select_plays(dataset, criteria);
    let neutral = filter::select_neutral_plays(dataset, criteria);
    let filtered_plays = plays.len();
    let total_plays = dataset.plays.len();

    let mut table = match mode {
        ViewMode::Plays => plays_table(dataset, &plays),
        ViewMode::Players => {
            players_table(&aggregate::player_rollup(dataset, &plays, &neutral, criteria.min_plays))
        }
        ViewMode::Games => games_table(&aggregate::game_rollup(dataset, &plays)),
        ViewMode::GameByPlayer => game_by_player_table(&aggregate::game_player_rollup(
            dataset,
            &plays,
            &neutral,
            criteria.min_plays,
        )),
    };
    table.filtered_plays = filtered_plays;
    table.total_plays = total_plays;
    table.sort_rows();
    table
}

fn plays_table(dataset: &Dataset, plays: &[&crate::dataset::Play]) -> ViewTable {
    let columns = vec![
        col("Date", "date"),
        col("Year", "year"),
        col("Game", "game"),
        col("Location", "location"),
        col("Time (min)", "time"),
        col("Players", "players"),
        col("Winners", "winners"),
        col("Scores", "scores"),
    ];
    let rows = aggregate::play_rows(dataset, plays)
        .into_iter()
        .map(|row| {
            let mut cells = Cells::new();
            cells.insert("date", Cell::Text(row.date));
            cells.insert("year", Cell::Text(row.year));
            cells.insert("game", Cell::Text(row.game));
            cells.insert("location", Cell::Text(row.location));
            cells.insert(
                "time",
                match row.duration_min {
                    Some(min) => Cell::Int(i64::from(min)),
                    None => Cell::Text(String::new()),
                },
            );
            cells.insert("players", Cell::Text(row.players));
            cells.insert("winners", Cell::Text(row.winners));
            cells.insert("scores", Cell::Text(row.scores));
            ViewRow { cells, detail: None }
        })
        .collect();
    new_table(ViewMode::Plays, columns, rows, "date", SortDir::Desc)
}

fn players_table(rows: &[aggregate::PlayerRow]) -> ViewTable {
    let columns = vec![
        col("Player", "player"),
        col("Plays", "plays"),
        col("Total plays", "total_plays"),
        col("Distinct games", "distinct_games"),
        col("Total (h)", "hours"),
        col("Wins", "wins"),
        col("Winrate", "winrate"),
    ];
    let rows = rows
        .iter()
        .map(|row| {
            let mut cells = Cells::new();
            cells.insert("player", Cell::Text(row.player.clone()));
            cells.insert("plays", Cell::Int(i64::from(row.plays)));
            cells.insert("total_plays", Cell::Int(i64::from(row.lifetime_plays)));
            cells.insert("distinct_games", Cell::Int(i64::from(row.distinct_games)));
            cells.insert("hours", Cell::Text(format!("{:.1}", row.hours())));
            cells.insert("wins", Cell::Int(i64::from(row.wins)));
            cells.insert("winrate", Cell::Text(format!("{:.1}%", row.winrate_pct())));
            ViewRow { cells, detail: None }
        })
        .collect();
    new_table(ViewMode::Players, columns, rows, "plays", SortDir::Desc)
}

fn games_table(rows: &[aggregate::GameRow]) -> ViewTable {
    let columns = vec![
        col("Game", "game"),
        col("Plays", "plays"),
        col("Total (h)", "hours"),
        col("Avg (min)", "avg_min"),
        col("Distinct players", "distinct_players"),
        col("Top performer", "top_performer"),
    ];
    let detail_columns = vec![
        col("Player", "player"),
        col("Plays", "plays"),
        col("Wins", "wins"),
        col("Winrate", "winrate"),
        col("Total (h)", "hours"),
    ];
    let rows = rows
        .iter()
        .map(|row| {
            let mut cells = Cells::new();
            cells.insert("game", Cell::Text(row.game.clone()));
            cells.insert("plays", Cell::Int(i64::from(row.plays)));
            cells.insert("hours", Cell::Text(format!("{:.1}", row.hours())));
            cells.insert("avg_min", Cell::Text(format!("{:.0}", row.avg_minutes())));
            cells.insert(
                "distinct_players",
                Cell::Int(i64::from(row.distinct_players)),
            );
            cells.insert(
                "top_performer",
                Cell::Text(row.top_performer.clone().unwrap_or_default()),
            );
            let detail_rows = row.breakdown.iter().map(game_player_cells).collect();
            ViewRow {
                cells,
                detail: Some(ViewDetail {
                    title: row.game.clone(),
                    columns: detail_columns.clone(),
                    rows: detail_rows,
                }),
            }
        })
        .collect();
    new_table(ViewMode::Games, columns, rows, "plays", SortDir::Desc)
}

fn game_by_player_table(rows: &[aggregate::GamePlayerRow]) -> ViewTable {
    let columns = vec![
        col("Game", "game"),
        col("Player", "player"),
        col("Plays", "plays"),
        col("Wins", "wins"),
        col("Winrate", "winrate"),
        col("Total (h)", "hours"),
    ];
    let rows = rows
        .iter()
        .map(|row| ViewRow {
            cells: game_player_cells(row),
            detail: None,
        })
        .collect();
    new_table(ViewMode::GameByPlayer, columns, rows, "plays", SortDir::Desc)
}

fn game_player_cells(row: &aggregate::GamePlayerRow) -> Cells {
    let mut cells = Cells::new();
    cells.insert("game", Cell::Text(row.game.clone()));
    cells.insert("player", Cell::Text(row.player.clone()));
    cells.insert("plays", Cell::Int(i64::from(row.plays)));
    cells.insert("wins", Cell::Int(i64::from(row.wins)));
    cells.insert("winrate", Cell::Text(format!("{:.1}%", row.winrate_pct())));
    cells.insert("hours", Cell::Text(format!("{:.1}", row.hours())));
    cells
}

fn new_table(
    mode: ViewMode,
    columns: Vec<Column>,
    rows: Vec<ViewRow>,
    sort_key: &'static str,
    sort_dir: SortDir,
) -> ViewTable {
    ViewTable {
        mode,
        columns,
        rows,
        sort_key,
        sort_dir,
        filtered_plays: 0,
        total_plays: 0,
    }
}
