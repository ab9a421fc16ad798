use std::collections::{HashMap, HashSet};

use crate::dataset::{Dataset, Id, Play};
use crate::score;

#[derive(Debug, Clone)]
pub struct PlayRow {
    pub date: String,
    pub year: String,
    pub game: String,
    pub location: String,
    pub duration_min: Option<u32>,
    pub players: String,
    pub winners: String,
    pub scores: String,
}

#[derive(Debug, Clone)]
pub struct PlayerRow {
    pub player_id: Id,
    pub player: String,
    pub plays: u32,
    pub lifetime_plays: u32,
    pub wins: u32,
    pub distinct_games: u32,
    pub minutes: u64,
}

impl PlayerRow {
    pub fn winrate_pct(&self) -> f64 {
        winrate_pct(self.wins, self.plays)
    }

    pub fn hours(&self) -> f64 {
        self.minutes as f64 / 60.0
    }
}

#[derive(Debug, Clone)]
pub struct GamePlayerRow {
    pub game_id: Id,
    pub player_id: Id,
    pub game: String,
    pub player: String,
    pub plays: u32,
    pub wins: u32,
    pub minutes: u64,
}

impl GamePlayerRow {
    pub fn winrate_pct(&self) -> f64 {
        winrate_pct(self.wins, self.plays)
    }

    pub fn hours(&self) -> f64 {
        self.minutes as f64 / 60.0
    }
}

#[derive(Debug, Clone)]
pub struct GameRow {
    pub game_id: Id,
    pub game: String,
    pub plays: u32,
    pub minutes: u64,
    pub distinct_players: u32,
    pub top_performer: Option<String>,
    /// Per-player breakdown within this game, insertion order. The renderer
    /// shows it on demand.
    pub breakdown: Vec<GamePlayerRow>,
}

impl GameRow {
    pub fn hours(&self) -> f64 {
        self.minutes as f64 / 60.0
    }

    pub fn avg_minutes(&self) -> f64 {
        if self.plays == 0 {
            0.0
        } else {
            self.minutes as f64 / self.plays as f64
        }
    }
}

pub fn winrate_pct(wins: u32, plays: u32) -> f64 {
    if plays == 0 {
        0.0
    } else {
        100.0 * wins as f64 / plays as f64
    }
}

/// One row per filtered play, with resolved display names.
pub fn play_rows(dataset: &Dataset, plays: &[&Play]) -> Vec<PlayRow> {
    plays
        .iter()
        .map(|play| {
            let names: Vec<String> = play
                .participant_ids()
                .map(|id| dataset.player_name(id))
                .collect();
            let winners: Vec<String> = play
                .player_scores
                .iter()
                .filter(|ps| ps.winner)
                .map(|ps| dataset.player_name(ps.player_ref_id))
                .collect();
            PlayRow {
                date: play.date_display(),
                year: play.year().map(|y| y.to_string()).unwrap_or_default(),
                game: play
                    .game_ref_id
                    .map(|id| dataset.game_name(id))
                    .unwrap_or_default(),
                location: play
                    .location_ref_id
                    .map(|id| dataset.location_name(id))
                    .unwrap_or_default(),
                duration_min: play.duration_min,
                players: names.join(", "),
                winners: winners.join(", "),
                scores: scores_display(play),
            }
        })
        .collect()
}

/// Score totals joined in participant order; "-" keeps unknowns aligned
/// with the players column. All-unknown collapses to empty.
fn scores_display(play: &Play) -> String {
    if play.player_scores.iter().all(|ps| ps.score_total.is_none()) {
        return String::new();
    }
    play.player_scores
        .iter()
        .map(|ps| match ps.score_total {
            Some(total) => score::format_total(total),
            None => "-".to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

struct PlayerAcc {
    plays: u32,
    wins: u32,
    games: HashSet<Id>,
    minutes: u64,
}

/// Per-player rollup over the filtered set. A play's duration is attributed
/// in full to every participant. Lifetime counts come from the neutral set
/// and drive the minimum-plays threshold.
pub fn player_rollup(
    dataset: &Dataset,
    plays: &[&Play],
    neutral_plays: &[&Play],
    min_plays: u32,
) -> Vec<PlayerRow> {
    let lifetime = lifetime_play_counts(neutral_plays);

    let mut order: Vec<Id> = Vec::new();
    let mut accs: HashMap<Id, PlayerAcc> = HashMap::new();
    for play in plays {
        for ps in &play.player_scores {
            let acc = accs.entry(ps.player_ref_id).or_insert_with(|| {
                order.push(ps.player_ref_id);
                PlayerAcc {
                    plays: 0,
                    wins: 0,
                    games: HashSet::new(),
                    minutes: 0,
                }
            });
            acc.plays += 1;
            if ps.winner {
                acc.wins += 1;
            }
            if let Some(game_id) = play.game_ref_id {
                acc.games.insert(game_id);
            }
            if let Some(dur) = play.duration_min {
                acc.minutes += u64::from(dur);
            }
        }
    }

    order
        .into_iter()
        .map(|id| {
            let acc = &accs[&id];
            PlayerRow {
                player_id: id,
                player: dataset.player_name(id),
                plays: acc.plays,
                lifetime_plays: lifetime.get(&id).copied().unwrap_or(0),
                wins: acc.wins,
                distinct_games: acc.games.len() as u32,
                minutes: acc.minutes,
            }
        })
        .filter(|row| row.lifetime_plays >= min_plays)
        .collect()
}

/// Plays per player over a play set, every `PlayerScore` counted once.
pub fn lifetime_play_counts(plays: &[&Play]) -> HashMap<Id, u32> {
    let mut counts: HashMap<Id, u32> = HashMap::new();
    for play in plays {
        for id in play.participant_ids() {
            *counts.entry(id).or_insert(0) += 1;
        }
    }
    counts
}

struct GameAcc {
    plays: u32,
    minutes: u64,
    participants: HashSet<Id>,
    nested_order: Vec<Id>,
    nested: HashMap<Id, NestedAcc>,
}

struct NestedAcc {
    plays: u32,
    wins: u32,
    minutes: u64,
}

/// Per-game rollup with a nested per-player accumulator. Plays without a
/// game reference are skipped.
pub fn game_rollup(dataset: &Dataset, plays: &[&Play]) -> Vec<GameRow> {
    let mut order: Vec<Id> = Vec::new();
    let mut accs: HashMap<Id, GameAcc> = HashMap::new();

    for play in plays {
        let Some(game_id) = play.game_ref_id else {
            continue;
        };
        let acc = accs.entry(game_id).or_insert_with(|| {
            order.push(game_id);
            GameAcc {
                plays: 0,
                minutes: 0,
                participants: HashSet::new(),
                nested_order: Vec::new(),
                nested: HashMap::new(),
            }
        });
        acc.plays += 1;
        if let Some(dur) = play.duration_min {
            acc.minutes += u64::from(dur);
        }
        for ps in &play.player_scores {
            acc.participants.insert(ps.player_ref_id);
            let nested = acc.nested.entry(ps.player_ref_id).or_insert_with(|| {
                acc.nested_order.push(ps.player_ref_id);
                NestedAcc {
                    plays: 0,
                    wins: 0,
                    minutes: 0,
                }
            });
            nested.plays += 1;
            if ps.winner {
                nested.wins += 1;
            }
            if let Some(dur) = play.duration_min {
                nested.minutes += u64::from(dur);
            }
        }
    }

    order
        .into_iter()
        .map(|game_id| {
            let acc = &accs[&game_id];
            let game = dataset.game_name(game_id);
            let breakdown: Vec<GamePlayerRow> = acc
                .nested_order
                .iter()
                .map(|&player_id| {
                    let nested = &acc.nested[&player_id];
                    GamePlayerRow {
                        game_id,
                        player_id,
                        game: game.clone(),
                        player: dataset.player_name(player_id),
                        plays: nested.plays,
                        wins: nested.wins,
                        minutes: nested.minutes,
                    }
                })
                .collect();
            GameRow {
                game_id,
                game,
                plays: acc.plays,
                minutes: acc.minutes,
                distinct_players: acc.participants.len() as u32,
                top_performer: top_performer(&breakdown),
                breakdown,
            }
        })
        .collect()
}

/// Most wins, then higher winrate, then more plays; a full tie keeps the
/// first encountered, so the result is deterministic for a fixed input
/// order.
fn top_performer(breakdown: &[GamePlayerRow]) -> Option<String> {
    let mut best: Option<&GamePlayerRow> = None;
    for row in breakdown {
        let Some(current) = best else {
            best = Some(row);
            continue;
        };
        let beats = row.wins > current.wins
            || (row.wins == current.wins && row.winrate_pct() > current.winrate_pct())
            || (row.wins == current.wins
                && row.winrate_pct() == current.winrate_pct()
                && row.plays > current.plays);
        if beats {
            best = Some(row);
        }
    }
    best.map(|row| row.player.clone())
}

/// One row per (game, player) pair, flattened from the per-game nested
/// accumulators. The threshold reads the player's lifetime count.
pub fn game_player_rollup(
    dataset: &Dataset,
    plays: &[&Play],
    neutral_plays: &[&Play],
    min_plays: u32,
) -> Vec<GamePlayerRow> {
    let lifetime = lifetime_play_counts(neutral_plays);
    game_rollup(dataset, plays)
        .into_iter()
        .flat_map(|game| game.breakdown)
        .filter(|row| lifetime.get(&row.player_id).copied().unwrap_or(0) >= min_plays)
        .collect()
}
