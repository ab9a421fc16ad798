use std::cmp::Ordering;
use std::fs;
use std::path::PathBuf;

use bgstats_terminal::dataset::Dataset;
use bgstats_terminal::duration::DurationPolicy;
use bgstats_terminal::export::export_view;
use bgstats_terminal::filter::{Combinator, FilterCriteria};
use bgstats_terminal::state::{AppState, FilterEntry};
use bgstats_terminal::view::{Cell, SortDir, ViewMode, compute_view};

fn load_small() -> Dataset {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push("bgstats_small.json");
    let raw = fs::read_to_string(path).expect("fixture file should be readable");
    Dataset::from_json_str(&raw, DurationPolicy::TrustFieldKind).expect("fixture should parse")
}

fn keys(mode: ViewMode, ds: &Dataset) -> Vec<&'static str> {
    compute_view(ds, &FilterCriteria::default(), mode)
        .columns
        .iter()
        .map(|c| c.key)
        .collect()
}

#[test]
fn each_view_has_its_column_schema_and_default_sort() {
    let ds = load_small();
    assert_eq!(
        keys(ViewMode::Plays, &ds),
        ["date", "year", "game", "location", "time", "players", "winners", "scores"]
    );
    assert_eq!(
        keys(ViewMode::Players, &ds),
        ["player", "plays", "total_plays", "distinct_games", "hours", "wins", "winrate"]
    );
    assert_eq!(
        keys(ViewMode::Games, &ds),
        ["game", "plays", "hours", "avg_min", "distinct_players", "top_performer"]
    );
    assert_eq!(
        keys(ViewMode::GameByPlayer, &ds),
        ["game", "player", "plays", "wins", "winrate", "hours"]
    );

    let plays = compute_view(&ds, &FilterCriteria::default(), ViewMode::Plays);
    assert_eq!(plays.sort_key, "date");
    assert_eq!(plays.sort_dir, SortDir::Desc);
    for mode in [ViewMode::Players, ViewMode::Games, ViewMode::GameByPlayer] {
        let table = compute_view(&ds, &FilterCriteria::default(), mode);
        assert_eq!(table.sort_key, "plays");
        assert_eq!(table.sort_dir, SortDir::Desc);
    }
}

#[test]
fn plays_view_sorts_newest_first_and_formats_cells() {
    let ds = load_small();
    let table = compute_view(&ds, &FilterCriteria::default(), ViewMode::Plays);
    assert_eq!(table.filtered_plays, 5);
    assert_eq!(table.total_plays, 5);

    let dates: Vec<String> = (0..table.rows.len())
        .map(|i| table.cell_text(i, "date"))
        .collect();
    assert_eq!(
        dates,
        [
            "2025-07-01 18:00:00",
            "2025-06-10 20:15:00",
            "2025-04-20 01:59:36",
            "2025-01-05 14:00:00",
            "2024-11-02 19:30:00",
        ]
    );

    // Row 2 is the Catan play with parsed score totals.
    assert_eq!(table.cell_text(2, "game"), "Catan");
    assert_eq!(table.cell_text(2, "location"), "Home");
    assert_eq!(table.cell_text(2, "time"), "45");
    assert_eq!(table.cell_text(2, "players"), "Bob, Cara");
    assert_eq!(table.cell_text(2, "winners"), "Bob");
    assert_eq!(table.cell_text(2, "scores"), "47, 14");

    // Row 3 is the coop play: no location, unknown time, no scores.
    assert_eq!(table.cell_text(3, "location"), "");
    assert_eq!(table.cell_text(3, "time"), "");
    assert_eq!(table.cell_text(3, "scores"), "");
}

#[test]
fn players_view_formats_rates_and_hours() {
    let ds = load_small();
    let table = compute_view(&ds, &FilterCriteria::default(), ViewMode::Players);
    // Three players tie on plays; the stable sort keeps encounter order.
    let players: Vec<String> = (0..table.rows.len())
        .map(|i| table.cell_text(i, "player"))
        .collect();
    assert_eq!(players, ["Bob", "Cara", "Alice", "Player 4"]);

    assert_eq!(table.cell_text(0, "plays"), "3");
    assert_eq!(table.cell_text(0, "wins"), "2");
    assert_eq!(table.cell_text(0, "winrate"), "66.7%");
    // Bob: 45 + 90 minutes, the third play has no duration.
    assert_eq!(table.cell_text(0, "hours"), format!("{:.1}", 2.25));
    assert_eq!(table.cell_text(3, "winrate"), "0.0%");
}

#[test]
fn games_view_rows_carry_their_breakdown() {
    let ds = load_small();
    let table = compute_view(&ds, &FilterCriteria::default(), ViewMode::Games);
    assert_eq!(table.cell_text(0, "game"), "Catan");
    assert_eq!(table.cell_text(0, "plays"), "2");
    assert_eq!(table.cell_text(0, "distinct_players"), "4");
    // Alice won her only Catan play; a perfect winrate beats Bob's 1-of-2.
    assert_eq!(table.cell_text(0, "top_performer"), "Alice");

    let detail = table.rows[0].detail.as_ref().expect("games rows have detail");
    assert_eq!(detail.title, "Catan");
    assert_eq!(detail.rows.len(), 4);
    let detail_keys: Vec<&str> = detail.columns.iter().map(|c| c.key).collect();
    assert_eq!(detail_keys, ["player", "plays", "wins", "winrate", "hours"]);

    let flat = compute_view(&ds, &FilterCriteria::default(), ViewMode::GameByPlayer);
    let total_detail: usize = table
        .rows
        .iter()
        .map(|r| r.detail.as_ref().map_or(0, |d| d.rows.len()))
        .sum();
    assert_eq!(flat.rows.len(), total_detail);
    assert!(flat.rows.iter().all(|r| r.detail.is_none()));
}

#[test]
fn sort_controls_cycle_and_flip() {
    let ds = load_small();
    let mut table = compute_view(&ds, &FilterCriteria::default(), ViewMode::Players);
    table.cycle_sort_key();
    assert_eq!(table.sort_key, "total_plays");
    table.toggle_sort_dir();
    assert_eq!(table.sort_dir, SortDir::Asc);

    // Percentage text sorts numerically, not lexically.
    table.sort_key = "winrate";
    table.sort_dir = SortDir::Asc;
    table.sort_rows();
    let rates: Vec<String> = (0..table.rows.len())
        .map(|i| table.cell_text(i, "winrate"))
        .collect();
    assert_eq!(rates, ["0.0%", "33.3%", "66.7%", "66.7%"]);
}

#[test]
fn formatted_numeric_text_compares_as_numbers() {
    assert_eq!(
        Cell::Text("100.0%".into()).compare(&Cell::Text("66.7%".into())),
        Ordering::Greater
    );
    assert_eq!(
        Cell::Text("0.8".into()).compare(&Cell::Float(0.75)),
        Ordering::Greater
    );
    // Blank cells group after numbers.
    assert_eq!(
        Cell::Text(String::new()).compare(&Cell::Int(0)),
        Ordering::Less
    );
}

#[test]
fn filtered_counts_reflect_the_criteria() {
    let ds = load_small();
    let criteria = FilterCriteria {
        year: Some("2025".to_string()),
        ..FilterCriteria::default()
    };
    let table = compute_view(&ds, &criteria, ViewMode::Plays);
    assert_eq!(table.filtered_plays, 4);
    assert_eq!(table.total_plays, 5);
}

#[test]
fn app_state_tracks_loads_and_status() {
    let ds = load_small();
    let mut state = AppState::new("fixture".to_string(), 0);
    state.set_load_result(Ok(ds));
    assert_eq!(state.status, "Filtered: 5 / 5 plays");
    assert!(state.table.is_some());
    assert!(state.logs.iter().any(|l| l.contains("Loaded 5 plays")));

    state.criteria.year = Some("2024".to_string());
    state.recompute();
    assert_eq!(state.status, "Filtered: 1 / 5 plays");

    state.set_load_result(Err(anyhow::anyhow!("connection refused")));
    assert!(state.table.is_none());
    assert!(state.load_error.is_some());
    assert!(state.status.starts_with("Error:"));
}

#[test]
fn clear_filters_restores_the_startup_threshold() {
    let ds = load_small();
    let mut state = AppState::new("fixture".to_string(), 0);
    state.set_load_result(Ok(ds.clone()));

    // Raise the threshold through the filter pane, then clear.
    state.filter_cursor = state.filter_entries().len() - 1;
    assert_eq!(state.current_filter_entry(), Some(FilterEntry::MinPlays));
    state.filter_adjust(7);
    assert_eq!(state.criteria.min_plays, 7);
    state.criteria.year = Some("2025".to_string());

    state.clear_filters();
    assert_eq!(state.criteria.min_plays, 0);
    assert_eq!(state.criteria.year, None);

    // A threshold configured at startup comes back after a clear too.
    let mut state = AppState::new("fixture".to_string(), 3);
    state.set_load_result(Ok(ds));
    state.filter_cursor = state.filter_entries().len() - 1;
    state.filter_adjust(2);
    assert_eq!(state.criteria.min_plays, 5);
    state.clear_filters();
    assert_eq!(state.criteria.min_plays, 3);
}

#[test]
fn shortcut_keys_toggle_combinators_and_game_types() {
    let ds = load_small();
    let mut state = AppState::new("fixture".to_string(), 0);
    state.set_load_result(Ok(ds));
    let entries = state.filter_entries();

    // On a location row the shortcut flips the location combinator only.
    state.filter_cursor = entries
        .iter()
        .position(|e| matches!(e, FilterEntry::Location(_)))
        .expect("location rows exist");
    state.toggle_focused_combinator();
    assert_eq!(state.criteria.location_mode, Combinator::And);
    assert_eq!(state.criteria.player_mode, Combinator::Or);

    // On a player row it flips the player combinator.
    state.filter_cursor = entries
        .iter()
        .position(|e| matches!(e, FilterEntry::Player(_)))
        .expect("player rows exist");
    state.toggle_focused_combinator();
    assert_eq!(state.criteria.player_mode, Combinator::And);

    // Outside both lists it does nothing.
    state.filter_cursor = 0;
    assert_eq!(state.current_filter_entry(), Some(FilterEntry::Year));
    state.toggle_focused_combinator();
    assert_eq!(state.criteria.location_mode, Combinator::And);
    assert_eq!(state.criteria.player_mode, Combinator::And);

    state.toggle_coop();
    assert!(!state.criteria.include_coop);
    state.toggle_competitive();
    assert!(!state.criteria.include_competitive);
    state.toggle_coop();
    assert!(state.criteria.include_coop);
}

#[test]
fn export_writes_one_row_per_table_row() {
    let ds = load_small();
    let table = compute_view(&ds, &FilterCriteria::default(), ViewMode::Players);
    let path = std::env::temp_dir().join("bgstats_players_test_export.xlsx");
    let written = export_view(&path, &table).expect("export should succeed");
    assert_eq!(written, table.rows.len());
    assert!(path.exists());
    let _ = fs::remove_file(&path);
}
