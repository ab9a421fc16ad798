use std::fs;
use std::path::PathBuf;

use bgstats_terminal::dataset::Dataset;
use bgstats_terminal::duration::DurationPolicy;
use bgstats_terminal::filter::{
    Combinator, FilterCriteria, select_neutral_plays, select_plays,
};

fn load_small() -> Dataset {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push("bgstats_small.json");
    let raw = fs::read_to_string(path).expect("fixture file should be readable");
    Dataset::from_json_str(&raw, DurationPolicy::TrustFieldKind).expect("fixture should parse")
}

fn ids(plays: &[&bgstats_terminal::dataset::Play]) -> Vec<String> {
    plays.iter().map(|p| p.id.clone()).collect()
}

#[test]
fn no_criteria_selects_everything_in_order() {
    let ds = load_small();
    let criteria = FilterCriteria::default();
    assert_eq!(ids(&select_plays(&ds, &criteria)), ["p1", "p2", "p3", "p4", "p5"]);
}

#[test]
fn year_filter_matches_calendar_year() {
    let ds = load_small();
    let criteria = FilterCriteria {
        year: Some("2025".to_string()),
        ..FilterCriteria::default()
    };
    assert_eq!(ids(&select_plays(&ds, &criteria)), ["p1", "p3", "p4", "p5"]);
}

#[test]
fn duration_bounds_exclude_unknown_durations() {
    let ds = load_small();
    let criteria = FilterCriteria {
        min_duration_min: Some(50),
        ..FilterCriteria::default()
    };
    // p1 is 45, p3 is unknown; both excluded.
    assert_eq!(ids(&select_plays(&ds, &criteria)), ["p2", "p4", "p5"]);

    let criteria = FilterCriteria {
        min_duration_min: Some(50),
        max_duration_min: Some(100),
        ..FilterCriteria::default()
    };
    assert_eq!(ids(&select_plays(&ds, &criteria)), ["p2", "p5"]);

    // Bounds are inclusive.
    let criteria = FilterCriteria {
        min_duration_min: Some(45),
        max_duration_min: Some(45),
        ..FilterCriteria::default()
    };
    assert_eq!(ids(&select_plays(&ds, &criteria)), ["p1"]);
}

#[test]
fn location_or_matches_membership() {
    let ds = load_small();
    let criteria = FilterCriteria {
        locations: vec![3],
        ..FilterCriteria::default()
    };
    assert_eq!(ids(&select_plays(&ds, &criteria)), ["p1", "p5"]);

    let criteria = FilterCriteria {
        locations: vec![3, 4],
        ..FilterCriteria::default()
    };
    assert_eq!(ids(&select_plays(&ds, &criteria)), ["p1", "p2", "p5"]);
}

#[test]
fn location_and_with_two_locations_matches_nothing() {
    let ds = load_small();
    let criteria = FilterCriteria {
        locations: vec![3],
        location_mode: Combinator::And,
        ..FilterCriteria::default()
    };
    assert_eq!(ids(&select_plays(&ds, &criteria)), ["p1", "p5"]);

    // One play has one location, so AND over two can never hold.
    let criteria = FilterCriteria {
        locations: vec![3, 4],
        location_mode: Combinator::And,
        ..FilterCriteria::default()
    };
    assert!(select_plays(&ds, &criteria).is_empty());
}

#[test]
fn player_combinators_follow_set_semantics() {
    let ds = load_small();
    let criteria = FilterCriteria {
        players: vec![1],
        ..FilterCriteria::default()
    };
    assert_eq!(ids(&select_plays(&ds, &criteria)), ["p2", "p3", "p5"]);

    let criteria = FilterCriteria {
        players: vec![1, 2],
        ..FilterCriteria::default()
    };
    // OR: at least one participates.
    assert_eq!(ids(&select_plays(&ds, &criteria)), ["p1", "p2", "p3", "p5"]);

    let criteria = FilterCriteria {
        players: vec![1, 2],
        player_mode: Combinator::And,
        ..FilterCriteria::default()
    };
    // AND: every selected id participates.
    assert_eq!(ids(&select_plays(&ds, &criteria)), ["p2", "p3"]);
}

#[test]
fn game_type_toggles_exclude_whole_categories() {
    let ds = load_small();
    let criteria = FilterCriteria {
        include_coop: false,
        ..FilterCriteria::default()
    };
    // p3 (Pandemic) and p5 (Gloomhaven) are coop. The play against the
    // unknown game 999 counts as competitive.
    assert_eq!(ids(&select_plays(&ds, &criteria)), ["p1", "p2", "p4"]);

    let criteria = FilterCriteria {
        include_competitive: false,
        ..FilterCriteria::default()
    };
    assert_eq!(ids(&select_plays(&ds, &criteria)), ["p3", "p5"]);
}

#[test]
fn neutral_selection_ignores_game_type_only() {
    let ds = load_small();
    let criteria = FilterCriteria {
        year: Some("2025".to_string()),
        include_coop: false,
        ..FilterCriteria::default()
    };
    assert_eq!(ids(&select_plays(&ds, &criteria)), ["p1", "p4"]);
    // Neutral keeps year but drops the coop exclusion.
    assert_eq!(
        ids(&select_neutral_plays(&ds, &criteria)),
        ["p1", "p3", "p4", "p5"]
    );
}

#[test]
fn unparseable_dates_fail_a_year_filter() {
    let ds = Dataset::from_json_str(
        r#"{"plays": [{"uuid": "bad", "playDate": "whenever", "playerScores": []}]}"#,
        DurationPolicy::TrustFieldKind,
    )
    .expect("json should parse");
    let criteria = FilterCriteria {
        year: Some("2025".to_string()),
        ..FilterCriteria::default()
    };
    assert!(select_plays(&ds, &criteria).is_empty());
    // Without a year filter the play is still selectable.
    assert_eq!(select_plays(&ds, &FilterCriteria::default()).len(), 1);
}
