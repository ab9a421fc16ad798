use std::collections::{HashMap, HashSet};

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDateTime};
use serde_json::Value;

use crate::duration::{self, DurationPolicy};
use crate::score;

pub type Id = i64;

#[derive(Debug, Clone)]
pub struct Player {
    pub id: Id,
    pub name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Game {
    pub id: Id,
    pub name: Option<String>,
    pub cooperative: bool,
}

#[derive(Debug, Clone)]
pub struct Location {
    pub id: Id,
    pub name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PlayerScore {
    pub player_ref_id: Id,
    pub winner: bool,
    pub rank: Option<i64>,
    pub score_total: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct Play {
    pub id: String,
    pub date_raw: String,
    pub date: Option<NaiveDateTime>,
    pub game_ref_id: Option<Id>,
    pub location_ref_id: Option<Id>,
    pub duration_min: Option<u32>,
    pub uses_teams: bool,
    pub rating: Option<f64>,
    pub player_scores: Vec<PlayerScore>,
}

impl Play {
    pub fn year(&self) -> Option<i32> {
        self.date.map(|d| d.year())
    }

    /// Normalized `YYYY-MM-DD HH:MM:SS`, or the raw export string when the
    /// date never parsed.
    pub fn date_display(&self) -> String {
        match self.date {
            Some(d) => d.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => self.date_raw.clone(),
        }
    }

    pub fn participant_ids(&self) -> impl Iterator<Item = Id> + '_ {
        self.player_scores.iter().map(|ps| ps.player_ref_id)
    }
}

/// The loaded export plus id lookups. Built once per session, read-only
/// afterwards.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub players: Vec<Player>,
    pub games: Vec<Game>,
    pub locations: Vec<Location>,
    pub plays: Vec<Play>,
    players_by_id: HashMap<Id, usize>,
    games_by_id: HashMap<Id, usize>,
    locations_by_id: HashMap<Id, usize>,
}

impl Dataset {
    pub fn from_json_str(raw: &str, policy: DurationPolicy) -> Result<Dataset> {
        let value: Value =
            serde_json::from_str(raw.trim()).context("invalid bgstats export json")?;
        Ok(Dataset::from_value(&value, policy))
    }

    /// Never fails: missing arrays default to empty, malformed entries are
    /// skipped, malformed optional fields degrade to unknown.
    pub fn from_value(value: &Value, policy: DurationPolicy) -> Dataset {
        let players = array_of(value, "players")
            .iter()
            .filter_map(parse_player)
            .collect::<Vec<_>>();
        let games = array_of(value, "games")
            .iter()
            .filter_map(parse_game)
            .collect::<Vec<_>>();
        let locations = array_of(value, "locations")
            .iter()
            .filter_map(parse_location)
            .collect::<Vec<_>>();
        let plays = array_of(value, "plays")
            .iter()
            .enumerate()
            .filter_map(|(idx, v)| parse_play(idx, v, policy))
            .collect::<Vec<_>>();

        let players_by_id = index_by_id(players.iter().map(|p| p.id));
        let games_by_id = index_by_id(games.iter().map(|g| g.id));
        let locations_by_id = index_by_id(locations.iter().map(|l| l.id));

        Dataset {
            players,
            games,
            locations,
            plays,
            players_by_id,
            games_by_id,
            locations_by_id,
        }
    }

    pub fn player(&self, id: Id) -> Option<&Player> {
        self.players_by_id.get(&id).map(|&i| &self.players[i])
    }

    pub fn game(&self, id: Id) -> Option<&Game> {
        self.games_by_id.get(&id).map(|&i| &self.games[i])
    }

    pub fn location(&self, id: Id) -> Option<&Location> {
        self.locations_by_id.get(&id).map(|&i| &self.locations[i])
    }

    pub fn player_name(&self, id: Id) -> String {
        display_name(self.player(id).and_then(|p| p.name.as_deref()), "Player", id)
    }

    pub fn game_name(&self, id: Id) -> String {
        display_name(self.game(id).and_then(|g| g.name.as_deref()), "Game", id)
    }

    pub fn location_name(&self, id: Id) -> String {
        display_name(
            self.location(id).and_then(|l| l.name.as_deref()),
            "Location",
            id,
        )
    }

    /// Game-type classification for a play. A missing or unresolvable game
    /// counts as competitive.
    pub fn play_is_coop(&self, play: &Play) -> bool {
        play.game_ref_id
            .and_then(|id| self.game(id))
            .is_some_and(|g| g.cooperative)
    }

    /// Distinct play years, ascending, for the year filter options.
    pub fn years(&self) -> Vec<String> {
        let mut years: Vec<String> = self
            .plays
            .iter()
            .filter_map(|p| p.year())
            .collect::<HashSet<_>>()
            .into_iter()
            .map(|y| y.to_string())
            .collect();
        years.sort();
        years
    }

    /// Locations referenced by at least one play, sorted by display name.
    pub fn used_locations(&self) -> Vec<(Id, String)> {
        let used: HashSet<Id> = self.plays.iter().filter_map(|p| p.location_ref_id).collect();
        let mut out: Vec<(Id, String)> = used
            .into_iter()
            .map(|id| (id, self.location_name(id)))
            .collect();
        out.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));
        out
    }

    /// All known players, sorted by display name.
    pub fn players_sorted(&self) -> Vec<(Id, String)> {
        let mut out: Vec<(Id, String)> = self
            .players
            .iter()
            .map(|p| (p.id, self.player_name(p.id)))
            .collect();
        out.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));
        out
    }
}

fn display_name(name: Option<&str>, kind: &str, id: Id) -> String {
    match name {
        Some(n) if !n.trim().is_empty() => n.to_string(),
        _ => format!("{kind} {id}"),
    }
}

fn index_by_id(ids: impl Iterator<Item = Id>) -> HashMap<Id, usize> {
    ids.enumerate().map(|(i, id)| (id, i)).collect()
}

fn array_of<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    value
        .get(key)
        .and_then(|v| v.as_array())
        .map(|a| a.as_slice())
        .unwrap_or(&[])
}

fn parse_player(v: &Value) -> Option<Player> {
    Some(Player {
        id: as_id_any(v.get("id")?)?,
        name: non_empty_string(v.get("name")),
    })
}

fn parse_game(v: &Value) -> Option<Game> {
    Some(Game {
        id: as_id_any(v.get("id")?)?,
        name: non_empty_string(v.get("name")),
        cooperative: v.get("cooperative").is_some_and(as_truthy),
    })
}

fn parse_location(v: &Value) -> Option<Location> {
    Some(Location {
        id: as_id_any(v.get("id")?)?,
        name: non_empty_string(v.get("name")),
    })
}

fn parse_play(idx: usize, v: &Value, policy: DurationPolicy) -> Option<Play> {
    let obj = v.as_object()?;
    // A play without any id is still a play; identify it by position.
    let id = non_empty_string(obj.get("uuid"))
        .or_else(|| obj.get("id").and_then(as_id_any).map(|n| n.to_string()))
        .unwrap_or_else(|| format!("play-{idx}"));
    let date_raw = obj
        .get("playDate")
        .and_then(|d| d.as_str())
        .unwrap_or_default()
        .to_string();

    let player_scores = obj
        .get("playerScores")
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().filter_map(parse_player_score).collect())
        .unwrap_or_default();

    Some(Play {
        id,
        date: parse_play_date(&date_raw),
        date_raw,
        game_ref_id: obj.get("gameRefId").and_then(as_id_any),
        location_ref_id: obj.get("locationRefId").and_then(as_id_any),
        duration_min: duration::resolve_minutes(obj, policy),
        uses_teams: obj.get("usesTeams").is_some_and(as_truthy),
        rating: obj.get("rating").and_then(as_f64_any),
        player_scores,
    })
}

fn parse_player_score(v: &Value) -> Option<PlayerScore> {
    Some(PlayerScore {
        player_ref_id: as_id_any(v.get("playerRefId")?)?,
        winner: v.get("winner").is_some_and(as_truthy),
        rank: v.get("rank").and_then(as_i64_any),
        score_total: v
            .get("score")
            .and_then(|s| s.as_str())
            .and_then(score::score_total),
    })
}

fn parse_play_date(raw: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    for fmt in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    None
}

fn non_empty_string(v: Option<&Value>) -> Option<String> {
    let s = v?.as_str()?.trim();
    if s.is_empty() { None } else { Some(s.to_string()) }
}

/// Entity keys appear as numbers in most exports and as numeric strings in
/// older ones.
pub fn as_id_any(v: &Value) -> Option<Id> {
    as_i64_any(v)
}

pub fn as_i64_any(v: &Value) -> Option<i64> {
    if let Some(n) = v.as_i64() {
        return Some(n);
    }
    v.as_str()?.trim().parse::<i64>().ok()
}

pub fn as_f64_any(v: &Value) -> Option<f64> {
    if let Some(n) = v.as_f64() {
        return Some(n);
    }
    v.as_str()?.trim().parse::<f64>().ok()
}

/// Boolean-like flags in the export: bool, 0/1 numeric, or a small truthy
/// string vocabulary.
pub fn as_truthy(v: &Value) -> bool {
    if let Some(b) = v.as_bool() {
        return b;
    }
    if let Some(n) = v.as_i64() {
        return n != 0;
    }
    v.as_str().is_some_and(|s| {
        matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "yes" | "1"
        )
    })
}
